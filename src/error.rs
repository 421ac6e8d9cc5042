//! Errors raised by a conversion attempt.
//!
//! Every variant ends up as a single "Conversion failed: ..." status message;
//! none of them escape the session. Poll failures never use this type, they
//! are folded straight into the health and stats indicators.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The service could not be reached or the body could not be read.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// 2xx response whose body had zero length.
    #[error("Received empty PDF file")]
    EmptyPayload,

    /// The PDF arrived but could not be written to the download directory.
    #[error("Could not save '{}': {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A background task died before it produced a result.
    #[error("Background task failed: {0}")]
    Task(String),
}

impl ConvertError {
    /// Build an HTTP failure, preferring the service's own `error` text.
    pub fn http(status: reqwest::StatusCode, error_field: Option<String>) -> Self {
        let message = match error_field {
            Some(msg) if !msg.is_empty() => msg,
            _ => format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            ),
        };
        Self::Http {
            status: status.as_u16(),
            message,
        }
    }
}
