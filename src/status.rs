//! What the user sees about the service: status messages, the health
//! indicator and the stats line.

use std::time::{Duration, Instant};

use crate::service::StatsSnapshot;

/// Default lifetime of info and success messages.
pub const MESSAGE_TTL: Duration = Duration::from_millis(5000);

pub const STATS_UNAVAILABLE: &str = "Stats unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

impl MessageKind {
    /// Errors stay until the log is cleared.
    pub fn expires(self) -> bool {
        !matches!(self, MessageKind::Error)
    }
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub kind: MessageKind,
    pub text: String,
    pub posted_at: Instant,
}

/// Ordered, append-only list of status messages.
#[derive(Debug, Clone)]
pub struct StatusLog {
    messages: Vec<StatusMessage>,
    ttl: Duration,
}

impl Default for StatusLog {
    fn default() -> Self {
        Self::new(MESSAGE_TTL)
    }
}

impl StatusLog {
    pub fn new(ttl: Duration) -> Self {
        Self {
            messages: Vec::new(),
            ttl,
        }
    }

    pub fn push(&mut self, kind: MessageKind, text: impl Into<String>) {
        self.push_at(kind, text, Instant::now());
    }

    pub fn push_at(&mut self, kind: MessageKind, text: impl Into<String>, now: Instant) {
        self.messages.push(StatusMessage {
            kind,
            text: text.into(),
            posted_at: now,
        });
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Drop info/success messages older than the ttl.
    pub fn expire(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.messages.retain(|m| {
            !m.kind.expires() || now.saturating_duration_since(m.posted_at) < ttl
        });
    }

    pub fn messages(&self) -> &[StatusMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Checking,
    Healthy,
    Unhealthy,
}

/// Health indicator: exactly one state plus its message.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthIndicator {
    pub state: HealthState,
    pub message: String,
}

impl Default for HealthIndicator {
    fn default() -> Self {
        Self {
            state: HealthState::Checking,
            message: "Checking service...".to_string(),
        }
    }
}

/// Stats line content. A failed poll replaces any previous snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsDisplay {
    Loading,
    Snapshot(String),
    Unavailable,
}

impl StatsDisplay {
    pub fn from_snapshot(stats: &StatsSnapshot) -> Self {
        StatsDisplay::Snapshot(render_stats(stats))
    }

    pub fn text(&self) -> &str {
        match self {
            StatsDisplay::Loading => "Loading stats...",
            StatsDisplay::Snapshot(text) => text,
            StatsDisplay::Unavailable => STATS_UNAVAILABLE,
        }
    }
}

/// `Active processes: N [PID a (3s), PID b (1s)]`
pub fn render_stats(stats: &StatsSnapshot) -> String {
    let mut line = format!("Active processes: {}", stats.active_processes);
    if !stats.processes.is_empty() {
        let details = stats
            .processes
            .iter()
            .map(|p| format!("PID {} ({}s)", p.pid, (p.duration / 1000.0).round() as i64))
            .collect::<Vec<_>>()
            .join(", ");
        line.push_str(&format!(" [{}]", details));
    }
    line
}

/// Human-readable size rounded half-up to two decimals, trailing zeros
/// stripped.
///
/// Units stop at GB; anything larger stays in GB.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    const K: u64 = 1024;

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut index = 0;
    while index < UNITS.len() - 1 && bytes >= K.pow(index as u32 + 1) {
        index += 1;
    }

    // Half-up on exact ties: 1152 bytes is 1.13 KB, not 1.12
    let scaled = bytes as f64 / K.pow(index as u32) as f64;
    let rounded = (scaled * 100.0).round() / 100.0;
    let fixed = format!("{:.2}", rounded);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[index])
}
