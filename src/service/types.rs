//! Wire types for the conversion service endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /api/convert-to-pdf`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    pub markdown_content: String,
    pub options: ConvertOptions,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConvertOptions {
    pub filename: String,
}

/// Error body returned by the service on non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `GET /health`. Only `status` and `error` matter to the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthBody {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl HealthBody {
    pub fn is_healthy(&self) -> bool {
        self.status.as_deref() == Some("healthy")
    }
}

/// Body of `GET /api/stats`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub active_processes: u64,
    #[serde(default)]
    pub processes: Vec<ProcessInfo>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProcessInfo {
    pub pid: ProcessId,
    /// Elapsed time in milliseconds.
    #[serde(default)]
    pub duration: f64,
}

/// The service reports pids as strings (`"go-1a2b3c4d"`) but numbers are
/// accepted too.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ProcessId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessId::Number(n) => write!(f, "{}", n),
            ProcessId::Text(s) => f.write_str(s),
        }
    }
}
