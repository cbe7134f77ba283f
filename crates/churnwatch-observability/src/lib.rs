//! # churnwatch-observability
//!
//! Tracing subscriber setup and span definitions shared by the churnwatch
//! crates and the monitor binary.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, init_tracing_with_filter};
