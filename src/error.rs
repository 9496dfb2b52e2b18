use std::time::Duration;

use thiserror::Error;

// Basic error handling with thiserror
#[derive(Error, Debug)]
pub enum ZidooError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Device answered with HTTP {0}")]
    HttpStatus(u16),

    #[error("Device is switching media (status 804)")]
    DeviceBusy,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing failed: {0}")]
    ParseFailed(#[from] serde_json::Error),

    #[error("No usable response from {endpoint} after {attempts} attempts")]
    DeviceOffline { endpoint: String, attempts: u32 },

    #[error("Device rejected {endpoint} with status {status}")]
    Rejected { endpoint: String, status: i64 },

    #[error("Not connected to device")]
    NotConnected,

    #[error("Invalid MAC address: {0}")]
    InvalidMacAddress(String),

    #[error("Unknown audio output: {0}")]
    UnknownOutput(String),

    #[error("Unknown remote key: {0}")]
    UnknownKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task panicked or cancelled")]
    TaskJoinError(#[from] tokio::task::JoinError),
}

impl ZidooError {
    /// Failures where no usable response was obtained from the device.
    /// These consume the transport retry budget.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ZidooError::Transport(_)
                | ZidooError::Timeout(_)
                | ZidooError::HttpStatus(_)
                | ZidooError::MalformedResponse(_)
                | ZidooError::ParseFailed(_)
                | ZidooError::Io(_)
        )
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, ZidooError::DeviceBusy)
    }

    /// True when the session was demoted because retries ran out.
    pub fn indicates_session_lost(&self) -> bool {
        matches!(self, ZidooError::DeviceOffline { .. } | ZidooError::DeviceBusy)
    }
}
