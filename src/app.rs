use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::poller::Poller;
use crate::presenter::{ChannelPresenter, Presenter, UiEvent};
use crate::service::ServiceClient;
use crate::session::{ConversionController, Downloads};
use crate::status::{HealthIndicator, MessageKind, StatsDisplay, StatusLog};
use crate::theme::Theme;

pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Markdown,
    Filename,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
}

pub struct App {
    pub field: Field,
    pub popup: Popup,

    // Form inputs
    pub markdown: String,
    pub filename: String,

    // Mirrors the in-flight flag for rendering the convert button
    pub converting: bool,

    pub messages: StatusLog,
    pub health: HealthIndicator,
    pub stats: StatsDisplay,
    pub last_saved: Option<PathBuf>,

    pub server_url: String,
    pub download_dir: PathBuf,
    pub theme: Theme,
    notifications: bool,

    controller: ConversionController,
    poller: Poller,
    events: UnboundedReceiver<UiEvent>,
}

impl App {
    pub fn new(config: &AppConfig, client: ServiceClient, download_dir: PathBuf) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let presenter: Arc<dyn Presenter> = Arc::new(ChannelPresenter::new(tx));

        let poller = Poller::new(client.clone(), Arc::clone(&presenter));
        let controller = ConversionController::new(
            client.clone(),
            Downloads::new(download_dir.clone()),
            poller.clone(),
            presenter,
        )
        .with_stats_refresh_delay(config.stats_refresh_delay());

        Self {
            field: Field::Markdown,
            popup: Popup::None,

            markdown: String::new(),
            filename: String::new(),

            converting: false,

            messages: StatusLog::new(config.message_ttl()),
            health: HealthIndicator::default(),
            stats: StatsDisplay::Loading,
            last_saved: None,

            server_url: client.base_url().to_string(),
            download_dir,
            theme: Theme::from_config(config.theme.as_ref()),
            notifications: config.notifications,

            controller,
            poller,
            events,
        }
    }

    /// Start both poll loops; each polls once immediately.
    pub fn start_polling(
        &self,
        health_every: Duration,
        stats_every: Duration,
    ) -> (JoinHandle<()>, JoinHandle<()>) {
        (
            self.poller.spawn_health_loop(health_every),
            self.poller.spawn_stats_loop(stats_every),
        )
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.popup == Popup::Help {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Enter) {
                self.popup = Popup::None;
            }
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => self.submit(),
                KeyCode::Char('l') => self.clear_form(),
                KeyCode::Char('r') => self.refresh_stats(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::F(1) => self.popup = Popup::Help,
            KeyCode::Tab | KeyCode::BackTab => {
                self.field = match self.field {
                    Field::Markdown => Field::Filename,
                    Field::Filename => Field::Markdown,
                };
            }
            KeyCode::Enter => match self.field {
                Field::Markdown => self.markdown.push('\n'),
                // Enter in the filename field converts, like submitting a form
                Field::Filename => self.submit(),
            },
            KeyCode::Backspace => {
                match self.field {
                    Field::Markdown => self.markdown.pop(),
                    Field::Filename => self.filename.pop(),
                };
            }
            KeyCode::Char(c) => match self.field {
                Field::Markdown => self.markdown.push(c),
                Field::Filename => {
                    if !c.is_control() && c != '/' && c != '\\' {
                        self.filename.push(c);
                    }
                }
            },
            _ => {}
        }
    }

    /// Bracketed paste goes to the focused field.
    pub fn handle_paste(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        match self.field {
            Field::Markdown => self.markdown.push_str(&text),
            Field::Filename => self
                .filename
                .extend(text.chars().filter(|c| !c.is_control() && *c != '/' && *c != '\\')),
        }
    }

    /// Submit the form. Ignored while a conversion is running.
    pub fn submit(&mut self) {
        if let Err(outcome) = self.controller.spawn_submit(&self.markdown, &self.filename) {
            tracing::debug!(?outcome, "submit did not start a conversion");
        }
        self.drain_events();
    }

    /// Empties both inputs and the message log. A running conversion keeps
    /// going and still reports when it settles.
    pub fn clear_form(&mut self) {
        self.markdown.clear();
        self.filename.clear();
        self.messages.clear();
        self.field = Field::Markdown;
    }

    pub fn refresh_stats(&self) {
        self.poller.spawn_stats_refresh();
    }

    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Converting(converting) => self.converting = converting,
            UiEvent::ClearMessages => self.messages.clear(),
            UiEvent::Message(kind, text) => self.messages.push(kind, text),
            UiEvent::Health(state, message) => {
                self.health.state = state;
                self.health.message = message;
            }
            UiEvent::Stats(stats) => self.stats = stats,
            UiEvent::Saved(path) => {
                if self.notifications {
                    let body = format!("Saved {}", path.display());
                    if let Err(e) = notify("mdpdf", &body) {
                        tracing::warn!("Notification failed: {}", e);
                    }
                }
                self.last_saved = Some(path);
            }
        }
    }

    /// Apply everything background tasks reported since the last frame.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
        }
    }

    /// Run one event handler. If it panics, the app keeps running and the
    /// user sees a generic error message instead.
    pub fn guarded(&mut self, handler: impl FnOnce(&mut App)) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler(self))) {
            self.report_unexpected(panic_detail(&*payload));
        }
    }

    pub fn report_unexpected(&mut self, detail: &str) {
        tracing::error!("Unhandled UI error: {}", detail);
        self.messages.push(MessageKind::Error, UNEXPECTED_ERROR_MESSAGE);
    }

    pub fn tick(&mut self) {
        self.drain_events();
        self.messages.expire(Instant::now());
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("panic with a non-string payload")
}

fn notify(summary: &str, body: &str) -> Result<()> {
    notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .icon("application-pdf")
        .show()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::HealthState;

    fn app() -> App {
        let config = AppConfig::default();
        // Nothing listens here; none of these tests reach the network.
        let client = ServiceClient::new("http://127.0.0.1:9", None).unwrap();
        App::new(&config, client, std::env::temp_dir())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn typing_goes_to_focused_field() {
        let mut app = app();
        for c in "# Hi".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Tab));
        for c in "a/b".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Backspace));

        assert_eq!(app.markdown, "# Hi\n");
        assert_eq!(app.filename, "a");
        assert_eq!(app.field, Field::Filename);
    }

    #[test]
    fn empty_submit_shows_error_without_converting() {
        let mut app = app();
        app.markdown = "   \n ".to_string();
        app.handle_key(ctrl('s'));

        let messages = app.messages.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::Error);
        assert_eq!(messages[0].text, "Please enter some Markdown content to convert.");
        assert!(!app.converting);
    }

    #[test]
    fn clear_form_resets_inputs_and_messages() {
        let mut app = app();
        app.markdown = "text".into();
        app.filename = "x".into();
        app.field = Field::Filename;
        app.messages.push(MessageKind::Error, "old");

        app.handle_key(ctrl('l'));

        assert!(app.markdown.is_empty());
        assert!(app.filename.is_empty());
        assert!(app.messages.is_empty());
        assert_eq!(app.field, Field::Markdown);
    }

    #[test]
    fn paste_normalizes_line_endings() {
        let mut app = app();
        app.handle_paste("a\r\nb\rc");
        assert_eq!(app.markdown, "a\nb\nc");

        app.field = Field::Filename;
        app.handle_paste("my\nreport/v2");
        assert_eq!(app.filename, "myreportv2");
    }

    #[test]
    fn events_update_display_state() {
        let mut app = app();
        app.apply(UiEvent::Converting(true));
        app.apply(UiEvent::Message(MessageKind::Info, "Starting".into()));
        app.apply(UiEvent::Health(HealthState::Healthy, "ok".into()));
        app.apply(UiEvent::Stats(StatsDisplay::Unavailable));
        app.apply(UiEvent::Saved(PathBuf::from("/tmp/doc.pdf")));
        app.apply(UiEvent::ClearMessages);
        app.apply(UiEvent::Converting(false));

        assert!(!app.converting);
        assert!(app.messages.is_empty());
        assert_eq!(app.health.state, HealthState::Healthy);
        assert_eq!(app.stats.text(), "Stats unavailable");
        assert_eq!(app.last_saved, Some(PathBuf::from("/tmp/doc.pdf")));
    }

    #[test]
    fn help_popup_swallows_keys() {
        let mut app = app();
        app.handle_key(key(KeyCode::F(1)));
        assert_eq!(app.popup, Popup::Help);
        app.handle_key(key(KeyCode::Char('x')));
        assert!(app.markdown.is_empty());
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.popup, Popup::None);
    }

    #[test]
    fn panicking_handler_becomes_error_message() {
        let mut app = app();
        app.markdown = "kept".into();

        app.guarded(|_| panic!("boom"));
        app.guarded(|app| {
            app.markdown.push('!');
            panic!("{} failed", "handler");
        });

        let messages = app.messages.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages
            .iter()
            .all(|m| m.kind == MessageKind::Error && m.text == UNEXPECTED_ERROR_MESSAGE));

        // Still usable afterwards
        app.guarded(|app| app.handle_key(key(KeyCode::Char('x'))));
        assert_eq!(app.markdown, "kept!x");
        assert_eq!(app.messages.messages().len(), 2);
    }

    #[test]
    fn panic_detail_reads_string_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let literal: Box<dyn Any + Send> = Box::new("literal");
        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_detail(&*owned), "owned");
        assert_eq!(panic_detail(&*literal), "literal");
        assert_eq!(panic_detail(&*other), "panic with a non-string payload");
    }
}
