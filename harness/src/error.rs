//! Error types shared by the harness and its compute backends.

use std::fmt;

/// Errors that abort a verification or benchmark run.
///
/// A failed verification is not an error: it is reported through
/// [`crate::verify::VerificationReport::passed`] and
/// [`crate::runner::BenchmarkOutcome::VerificationFailed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BenchError {
    /// Malformed or missing workload parameters (bad config, missing
    /// shader metadata, shader that fails validation).
    Config(String),

    /// No compatible compute device could be acquired.
    DeviceUnavailable(String),

    /// A call into the compute backend failed mid-run.
    DeviceOperation(String),
}

impl BenchError {
    pub fn config(msg: impl Into<String>) -> Self {
        BenchError::Config(msg.into())
    }

    pub fn device_unavailable(msg: impl Into<String>) -> Self {
        BenchError::DeviceUnavailable(msg.into())
    }

    pub fn device_operation(msg: impl Into<String>) -> Self {
        BenchError::DeviceOperation(msg.into())
    }
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchError::Config(e) => write!(f, "configuration error: {}", e),
            BenchError::DeviceUnavailable(e) => write!(f, "no compute device available: {}", e),
            BenchError::DeviceOperation(e) => write!(f, "device operation failed: {}", e),
        }
    }
}

impl std::error::Error for BenchError {}

pub type Result<T> = std::result::Result<T, BenchError>;
