//! Process-level helpers for the `hive-payment` binary.
//!
//! | Module | Description | Feature |
//! |--------|-------------|---------|
//! | [`shutdown`] | SIGINT/SIGTERM handling | - |
//! | [`telemetry`] | Log subscriber, optional OTLP span export | `telemetry` for OTLP |

pub mod shutdown;
pub mod telemetry;

pub use shutdown::*;
pub use telemetry::*;
