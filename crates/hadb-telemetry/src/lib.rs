//! Logging setup and span helpers for synchronization jobs

pub mod attributes;
pub mod spans;
pub mod tracer;

pub use spans::{safe_serialize, synchronization_span};
pub use tracer::{init_telemetry, init_telemetry_with};
