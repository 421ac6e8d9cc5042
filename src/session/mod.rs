//! Conversion session controller.
//!
//! A session is one conversion from submit to settle. At most one runs at a
//! time: the in-flight flag is claimed synchronously when the session is
//! created and released by [`InFlight`]'s `Drop`, so every exit path
//! (success, service error, empty body, panic) leaves the flag cleared and
//! the convert action idle again.

pub mod download;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::ConvertError;
use crate::poller::Poller;
use crate::presenter::Presenter;
use crate::service::{ConvertOptions, ConvertRequest, ServiceClient};
use crate::status::{format_file_size, MessageKind};

pub use download::Downloads;

pub const DEFAULT_FILENAME: &str = "document.pdf";

/// Delay before the one-shot stats poll that follows a successful conversion.
pub const STATS_REFRESH_DELAY: Duration = Duration::from_millis(1000);

pub const EMPTY_MARKDOWN_MESSAGE: &str = "Please enter some Markdown content to convert.";
pub const STARTING_MESSAGE: &str = "Starting PDF generation from Markdown...";
pub const UNEXPECTED_PROCESSING_ERROR: &str = "An unexpected error occurred during processing.";

/// Trimmed name, `document.pdf` when empty, `.pdf` appended when missing.
pub fn normalize_filename(raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else if name.ends_with(".pdf") {
        name.to_string()
    } else {
        format!("{}.pdf", name)
    }
}

/// Trimmed Markdown, rejected when nothing is left.
pub fn validate_markdown(raw: &str) -> Result<&str, ConvertError> {
    let content = raw.trim();
    if content.is_empty() {
        Err(ConvertError::Validation(EMPTY_MARKDOWN_MESSAGE.to_string()))
    } else {
        Ok(content)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Another conversion was already running.
    Ignored,
    /// Input failed validation; nothing was sent.
    Rejected,
    Saved(PathBuf),
    Failed(String),
}

/// Holds the in-flight flag for the lifetime of a session.
struct InFlight {
    flag: Arc<AtomicBool>,
    presenter: Arc<dyn Presenter>,
}

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>, presenter: &Arc<dyn Presenter>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        presenter.set_converting(true);
        Some(Self {
            flag: Arc::clone(flag),
            presenter: Arc::clone(presenter),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.presenter.set_converting(false);
    }
}

#[derive(Clone)]
pub struct ConversionController {
    client: ServiceClient,
    downloads: Downloads,
    poller: Poller,
    presenter: Arc<dyn Presenter>,
    in_flight: Arc<AtomicBool>,
    stats_refresh_delay: Duration,
}

impl ConversionController {
    pub fn new(
        client: ServiceClient,
        downloads: Downloads,
        poller: Poller,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            client,
            downloads,
            poller,
            presenter,
            in_flight: Arc::new(AtomicBool::new(false)),
            stats_refresh_delay: STATS_REFRESH_DELAY,
        }
    }

    pub fn with_stats_refresh_delay(mut self, delay: Duration) -> Self {
        self.stats_refresh_delay = delay;
        self
    }

    pub fn is_converting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn downloads(&self) -> &Downloads {
        &self.downloads
    }

    /// Claim the in-flight flag and validate input without awaiting.
    ///
    /// Returns `Err` with the outcome when nothing should run.
    pub fn begin(&self, markdown: &str, filename: &str) -> Result<Session, SubmitOutcome> {
        if self.is_converting() {
            tracing::debug!("Submit ignored: conversion already in flight");
            return Err(SubmitOutcome::Ignored);
        }

        let content = match validate_markdown(markdown) {
            Ok(content) => content,
            Err(e) => {
                self.presenter.show_message(MessageKind::Error, e.to_string());
                return Err(SubmitOutcome::Rejected);
            }
        };

        let guard = InFlight::acquire(&self.in_flight, &self.presenter)
            .ok_or(SubmitOutcome::Ignored)?;

        Ok(Session {
            _guard: guard,
            request: ConvertRequest {
                markdown_content: content.to_string(),
                options: ConvertOptions {
                    filename: normalize_filename(filename),
                },
            },
            controller: self.clone(),
        })
    }

    /// Run one conversion to completion on the current task.
    pub async fn submit(&self, markdown: &str, filename: &str) -> SubmitOutcome {
        match self.begin(markdown, filename) {
            Ok(session) => session.run().await,
            Err(outcome) => outcome,
        }
    }

    /// Run one conversion in the background.
    ///
    /// The session is claimed before this returns, so a second call made
    /// right after is ignored. A panic inside the session is reported as a
    /// generic error message; the handle then yields `None`.
    pub fn spawn_submit(
        &self,
        markdown: &str,
        filename: &str,
    ) -> Result<JoinHandle<Option<SubmitOutcome>>, SubmitOutcome> {
        let session = self.begin(markdown, filename)?;
        let presenter = Arc::clone(&self.presenter);
        let task = tokio::spawn(session.run());

        Ok(tokio::spawn(async move {
            match task.await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    tracing::error!("Conversion task failed: {}", e);
                    presenter.show_message(
                        MessageKind::Error,
                        UNEXPECTED_PROCESSING_ERROR.to_string(),
                    );
                    None
                }
            }
        }))
    }
}

/// A claimed conversion, ready to send.
pub struct Session {
    _guard: InFlight,
    request: ConvertRequest,
    controller: ConversionController,
}

impl Session {
    pub fn request(&self) -> &ConvertRequest {
        &self.request
    }

    pub async fn run(self) -> SubmitOutcome {
        let presenter = Arc::clone(&self.controller.presenter);
        presenter.clear_messages();
        presenter.show_message(MessageKind::Info, STARTING_MESSAGE.to_string());

        tracing::info!(
            filename = %self.request.options.filename,
            "Starting conversion for {} characters",
            self.request.markdown_content.chars().count()
        );

        match self.convert().await {
            Ok((path, size)) => {
                tracing::info!("PDF saved to {} ({} bytes)", path.display(), size);
                presenter.file_saved(&path);
                presenter.show_message(
                    MessageKind::Success,
                    format!(
                        "✅ PDF generated successfully! ({}) saved to {}",
                        format_file_size(size),
                        path.display()
                    ),
                );
                self.controller
                    .poller
                    .schedule_stats_refresh(self.controller.stats_refresh_delay);
                SubmitOutcome::Saved(path)
            }
            Err(e) => {
                tracing::warn!("Conversion failed: {}", e);
                presenter.show_message(MessageKind::Error, format!("Conversion failed: {}", e));
                SubmitOutcome::Failed(e.to_string())
            }
        }
    }

    async fn convert(&self) -> Result<(PathBuf, u64), ConvertError> {
        let payload = self.controller.client.convert(&self.request).await?;
        let size = payload.len() as u64;
        let path = self
            .controller
            .downloads
            .save(&self.request.options.filename, payload)
            .await?;
        Ok((path, size))
    }
}
