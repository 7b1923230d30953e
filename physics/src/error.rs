use thiserror::Error;

/// Physics error type.
///
/// Only lifecycle-level failures are errors. Per-entity failures (bad
/// geometry, exhausted body capacity) surface as `None` handles plus a log
/// line so one broken entity never stops the rest of the scene.
#[derive(Error, Debug)]
pub enum PhysicsError {
    #[error("Physics backend not initialized")]
    NotInitialized,
    #[error("Physics backend already initialized")]
    AlreadyInitialized,
    #[error("Failed to initialize physics backend: {0}")]
    InitializationFailed(String),
    #[error("A simulation scene is already active")]
    SceneAlreadyActive,
    #[error("Cannot shut down while a simulation scene is active")]
    SceneStillActive,
    #[error("Unknown or stale scene handle")]
    UnknownScene,
    #[error("{count} bodies must be destroyed before the scene")]
    BodiesStillAlive { count: usize },
    #[error("Invalid physics world state: expected {expected}, found {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Invalid physics config: {0}")]
    Config(String),
    #[error("Failed to read physics config: {0}")]
    Io(#[from] std::io::Error),
}

pub type PhysicsResult<T> = Result<T, PhysicsError>;
