//! Error types for the bridge

use std::fmt;

/// Which of the two engine callbacks failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    OpacityTest,
    ApplyLighting,
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackKind::OpacityTest => f.write_str("opacity test"),
            CallbackKind::ApplyLighting => f.write_str("apply lighting"),
        }
    }
}

/// Boxed failure captured from a callable
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for settings and scan operations
#[derive(Debug, thiserror::Error)]
pub enum FovError {
    /// Malformed call arguments, detected before the engine is entered
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// First failure raised by a bound callable during a scan
    #[error("{kind} callback failed at ({x}, {y}): {source}")]
    Callback {
        kind: CallbackKind,
        x: i32,
        y: i32,
        #[source]
        source: BoxError,
    },

    #[error("Cannot change engine settings while a scan is in flight")]
    ScanInFlight,
}

impl FovError {
    pub fn is_callback(&self) -> bool {
        matches!(self, FovError::Callback { .. })
    }
}

pub type Result<T> = std::result::Result<T, FovError>;
