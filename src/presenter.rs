//! Presentation port.
//!
//! The conversion session and the pollers never touch the terminal. They
//! report through [`Presenter`], and whichever front-end is running decides
//! how to show it: the TUI forwards everything over a channel, the headless
//! commands print to the console.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc::UnboundedSender;

use crate::status::{HealthState, MessageKind, StatsDisplay};

pub trait Presenter: Send + Sync {
    /// Busy/idle state of the convert action.
    fn set_converting(&self, converting: bool);

    fn clear_messages(&self);

    fn show_message(&self, kind: MessageKind, text: String);

    fn set_health(&self, state: HealthState, message: String);

    fn set_stats(&self, stats: StatsDisplay);

    /// A PDF landed on disk.
    fn file_saved(&self, _path: &Path) {}
}

/// Everything a background task can tell the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Converting(bool),
    ClearMessages,
    Message(MessageKind, String),
    Health(HealthState, String),
    Stats(StatsDisplay),
    Saved(PathBuf),
}

/// Forwards every call as a [`UiEvent`]. Sends to a closed channel are
/// dropped: the UI is gone and nobody is left to look.
#[derive(Debug, Clone)]
pub struct ChannelPresenter {
    tx: UnboundedSender<UiEvent>,
}

impl ChannelPresenter {
    pub fn new(tx: UnboundedSender<UiEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: UiEvent) {
        let _ = self.tx.send(event);
    }
}

impl Presenter for ChannelPresenter {
    fn set_converting(&self, converting: bool) {
        self.send(UiEvent::Converting(converting));
    }

    fn clear_messages(&self) {
        self.send(UiEvent::ClearMessages);
    }

    fn show_message(&self, kind: MessageKind, text: String) {
        self.send(UiEvent::Message(kind, text));
    }

    fn set_health(&self, state: HealthState, message: String) {
        self.send(UiEvent::Health(state, message));
    }

    fn set_stats(&self, stats: StatsDisplay) {
        self.send(UiEvent::Stats(stats));
    }

    fn file_saved(&self, path: &Path) {
        self.send(UiEvent::Saved(path.to_path_buf()));
    }
}

/// Prints to the terminal for the one-shot CLI commands.
#[derive(Debug, Default, Clone)]
pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn set_converting(&self, converting: bool) {
        tracing::debug!(converting, "conversion state changed");
    }

    fn clear_messages(&self) {}

    fn show_message(&self, kind: MessageKind, text: String) {
        match kind {
            MessageKind::Error => eprintln!("{}", text),
            MessageKind::Info | MessageKind::Success => println!("{}", text),
        }
    }

    fn set_health(&self, state: HealthState, message: String) {
        if state != HealthState::Checking {
            println!("{}", message);
        }
    }

    fn set_stats(&self, stats: StatsDisplay) {
        println!("{}", stats.text());
    }
}
