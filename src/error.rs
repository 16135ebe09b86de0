use thiserror::Error;

/// A native facility is not available on this machine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{facility} is not available: {reason}")]
pub struct Unsupported {
    pub facility: &'static str,
    pub reason: String,
}

impl Unsupported {
    pub fn new(facility: &'static str, reason: impl Into<String>) -> Self {
        Self {
            facility,
            reason: reason.into(),
        }
    }
}

/// Failure to resolve the application owning the focused window.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForegroundError {
    #[error("no window has focus")]
    NoForegroundWindow,
    #[error("failed to open process {pid}: {message}")]
    OpenProcess { pid: u32, message: String },
    #[error("failed to query image name of process {pid}: {message}")]
    QueryImageName { pid: u32, message: String },
    #[error("foreground query unavailable: {0}")]
    Unavailable(String),
}
