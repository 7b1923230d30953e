//! Command line arguments of the physics demo.

use std::path::PathBuf;

use clap::Parser;
use origin_physics::BackendKind;

/// Physics backend selection for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliBackend {
    /// rapier3d on a worker pool.
    Rapier,
    /// Sequential-impulse solver.
    Impulse,
}

impl From<CliBackend> for BackendKind {
    fn from(cli: CliBackend) -> Self {
        match cli {
            CliBackend::Rapier => BackendKind::Rapier,
            CliBackend::Impulse => BackendKind::Impulse,
        }
    }
}

/// Runs a demo scene headless and logs body statistics.
///
/// ```bash
/// physics_demo --scene stacking --backend impulse --frames 600
/// physics_demo --config demos/physics.toml --list
/// ```
#[derive(Parser, Debug)]
#[command(name = "physics_demo", version, about = "Origin physics demo")]
pub struct DemoArgs {
    /// Physics engine; overrides the config file.
    #[arg(long, value_enum)]
    pub backend: Option<CliBackend>,

    /// Path to a `physics.toml`.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Scene to run.
    #[arg(long, default_value = "balls")]
    pub scene: String,

    /// Frames to simulate before exiting.
    #[arg(long, default_value = "300")]
    pub frames: u32,

    /// Fixed time step in seconds.
    #[arg(long, default_value = "0.016666668")]
    pub dt: f32,

    /// Log statistics every N frames (0 disables).
    #[arg(long, default_value = "60")]
    pub report_every: u32,

    /// Print the available scenes and exit.
    #[arg(long)]
    pub list: bool,
}
