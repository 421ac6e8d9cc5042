use std::path::Path;
use std::sync::{Arc, Mutex};

use mdpdf_tui::presenter::{Presenter, UiEvent};
use mdpdf_tui::status::{HealthState, MessageKind, StatsDisplay};

/// Presenter that remembers every call, in order.
#[derive(Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingPresenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<(MessageKind, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Message(kind, text) => Some((kind, text)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Presenter for RecordingPresenter {
    fn set_converting(&self, converting: bool) {
        self.push(UiEvent::Converting(converting));
    }

    fn clear_messages(&self) {
        self.push(UiEvent::ClearMessages);
    }

    fn show_message(&self, kind: MessageKind, text: String) {
        self.push(UiEvent::Message(kind, text));
    }

    fn set_health(&self, state: HealthState, message: String) {
        self.push(UiEvent::Health(state, message));
    }

    fn set_stats(&self, stats: StatsDisplay) {
        self.push(UiEvent::Stats(stats));
    }

    fn file_saved(&self, path: &Path) {
        self.push(UiEvent::Saved(path.to_path_buf()));
    }
}

/// A local address with nothing listening on it.
pub fn dead_server_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
