//! Tracy instrumentation.
//!
//! Build with `--features profiling` and attach the Tracy client to see spans
//! for every physics step and propagation pass. Without the feature all four
//! macros expand to nothing (or, for plots, to an evaluation of the value).
//!
//! ```ignore
//! fn simulate(&mut self) {
//!     origin_core::profile_function!();
//!     {
//!         origin_core::profile_scope!("physics: read poses");
//!     }
//!     origin_core::profile_plot!("physics bodies", self.bodies.len());
//! }
//! ```

#[cfg(feature = "profiling")]
pub use tracy_client::{self, frame_mark as tracy_frame_mark, plot as tracy_plot, span};

/// Ends a frame in Tracy's frame timeline.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! frame_mark {
    () => {
        $crate::profiling::tracy_frame_mark()
    };
}

#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! frame_mark {
    () => {};
}

/// Opens a named span that closes at the end of the enclosing block.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_scope {
    ($name:expr) => {
        let _profile_span = $crate::profiling::span!($name);
    };
}

#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_scope {
    ($name:expr) => {};
}

/// Opens a span named after the enclosing function.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_function {
    () => {
        let _profile_span = $crate::profiling::span!();
    };
}

#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_function {
    () => {};
}

/// Records a numeric sample on a Tracy plot. `$name` must be a string literal.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_plot {
    ($name:literal, $value:expr) => {
        $crate::profiling::tracy_plot!($name, $value as f64)
    };
}

#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_plot {
    ($name:literal, $value:expr) => {
        let _ = $value;
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn macros_expand_in_statement_position() {
        let bodies = 3usize;
        crate::profile_function!();
        crate::profile_scope!("physics: step");
        crate::profile_plot!("physics bodies", bodies);
        crate::frame_mark!();
    }
}
