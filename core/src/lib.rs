//! # Origin Core
//!
//! Shared building blocks for the Origin engine crates:
//!
//! - [`math`] - nalgebra type aliases and transform helpers
//! - [`profiling`] - Tracy instrumentation macros (no-ops unless the
//!   `profiling` feature is enabled)

pub mod math;
pub mod profiling;
