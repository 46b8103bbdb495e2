//! Scheduling service errors

use thiserror::Error;

/// Failure talking to the scheduling service
#[derive(Debug, Clone, Error)]
pub enum CalendlyError {
    /// Non-2xx response
    #[error("{method} {url} failed: {status} {body}")]
    Api {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    /// Connection failure or timeout
    #[error("{method} {url} failed: {message}")]
    Network {
        method: &'static str,
        url: String,
        message: String,
    },

    /// 2xx response that was not JSON
    #[error("{method} {url} returned an unreadable body: {message}")]
    Decode {
        method: &'static str,
        url: String,
        message: String,
    },
}

impl CalendlyError {
    /// HTTP status of an `Api` error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
