//! Host-facing services: OS appearance signal and logging setup.

pub mod appearance;
pub mod tracing_setup;
