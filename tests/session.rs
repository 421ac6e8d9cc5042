mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mdpdf_tui::poller::Poller;
use mdpdf_tui::presenter::{Presenter, UiEvent};
use mdpdf_tui::service::ServiceClient;
use mdpdf_tui::session::{
    ConversionController, Downloads, SubmitOutcome, EMPTY_MARKDOWN_MESSAGE, STARTING_MESSAGE,
    UNEXPECTED_PROCESSING_ERROR,
};
use mdpdf_tui::status::{HealthState, MessageKind, StatsDisplay};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{any, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{dead_server_url, RecordingPresenter};

struct Harness {
    controller: ConversionController,
    recorder: Arc<RecordingPresenter>,
    dir: TempDir,
}

fn harness(base_url: &str) -> Harness {
    let recorder = RecordingPresenter::new();
    let presenter: Arc<dyn Presenter> = recorder.clone();
    let client = ServiceClient::new(base_url, None).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let poller = Poller::new(client.clone(), Arc::clone(&presenter));
    let controller = ConversionController::new(client, Downloads::new(dir.path()), poller, presenter)
        .with_stats_refresh_delay(Duration::from_millis(20));
    Harness {
        controller,
        recorder,
        dir,
    }
}

async fn mount_pdf(server: &MockServer, body: Vec<u8>, delay: Duration) {
    Mock::given(method("POST"))
        .and(path("/api/convert-to-pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(body)
                .set_delay(delay),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn successful_conversion_saves_pdf_and_refreshes_stats() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/convert-to-pdf"))
        .and(body_json(json!({
            "markdownContent": "# Hello",
            "options": { "filename": "report.pdf" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 1536]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "activeProcesses": 0,
            "processes": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    let outcome = h.controller.submit("  # Hello \n", "report").await;

    let expected = h.dir.path().join("report.pdf");
    assert_eq!(outcome, SubmitOutcome::Saved(expected.clone()));
    assert_eq!(std::fs::read(&expected).unwrap().len(), 1536);
    assert!(!h.controller.is_converting());

    let events = h.recorder.events();
    assert_eq!(events[0], UiEvent::Converting(true));
    assert_eq!(events[1], UiEvent::ClearMessages);
    assert_eq!(
        events[2],
        UiEvent::Message(MessageKind::Info, STARTING_MESSAGE.to_string())
    );
    assert_eq!(events[3], UiEvent::Saved(expected.clone()));
    match &events[4] {
        UiEvent::Message(MessageKind::Success, text) => {
            assert!(text.starts_with("✅ PDF generated successfully! (1.5 KB)"), "{}", text);
        }
        other => panic!("expected success message, got {:?}", other),
    }
    assert_eq!(events[5], UiEvent::Converting(false));

    // One-shot stats poll after the configured delay
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        h.recorder.events().last(),
        Some(&UiEvent::Stats(StatsDisplay::Snapshot(
            "Active processes: 0".to_string()
        )))
    );
}

#[tokio::test]
async fn submit_while_in_flight_is_a_no_op() {
    let server = MockServer::start().await;
    mount_pdf(&server, b"%PDF-1.7".to_vec(), Duration::from_millis(200)).await;

    let h = harness(&server.uri());
    let (first, second) = tokio::join!(
        h.controller.submit("# One", "one"),
        h.controller.submit("# Two", "two"),
    );

    assert!(matches!(first, SubmitOutcome::Saved(_)));
    assert_eq!(second, SubmitOutcome::Ignored);
    assert!(!h.controller.is_converting());

    // Ignored submits say nothing
    let converting_events = h
        .recorder
        .events()
        .into_iter()
        .filter(|e| matches!(e, UiEvent::Converting(true)))
        .count();
    assert_eq!(converting_events, 1);
}

#[tokio::test]
async fn spawned_submit_claims_the_session_immediately() {
    let server = MockServer::start().await;
    mount_pdf(&server, b"%PDF-1.7".to_vec(), Duration::from_millis(100)).await;

    let h = harness(&server.uri());
    let handle = h.controller.spawn_submit("# Doc", "").unwrap();
    assert!(h.controller.is_converting());
    assert_eq!(
        h.controller.spawn_submit("# Doc", "").unwrap_err(),
        SubmitOutcome::Ignored
    );

    let outcome = handle.await.unwrap();
    assert_eq!(
        outcome,
        Some(SubmitOutcome::Saved(h.dir.path().join("document.pdf")))
    );
    assert!(!h.controller.is_converting());

    // Free again once settled
    assert!(h.controller.begin("# Doc", "").is_ok());
}

#[tokio::test]
async fn whitespace_markdown_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    let outcome = h.controller.submit(" \n\t ", "report").await;

    assert_eq!(outcome, SubmitOutcome::Rejected);
    assert!(!h.controller.is_converting());
    assert_eq!(
        h.recorder.events(),
        vec![UiEvent::Message(
            MessageKind::Error,
            EMPTY_MARKDOWN_MESSAGE.to_string()
        )]
    );
}

#[tokio::test]
async fn empty_pdf_is_an_error_and_nothing_is_saved() {
    let server = MockServer::start().await;
    mount_pdf(&server, Vec::new(), Duration::ZERO).await;

    let h = harness(&server.uri());
    let outcome = h.controller.submit("# Empty", "empty").await;

    assert_eq!(
        outcome,
        SubmitOutcome::Failed("Received empty PDF file".to_string())
    );
    assert!(!h.controller.is_converting());
    assert_eq!(std::fs::read_dir(h.dir.path()).unwrap().count(), 0);

    let messages = h.recorder.messages();
    assert!(messages.iter().all(|(kind, _)| *kind != MessageKind::Success));
    assert_eq!(
        messages.last(),
        Some(&(
            MessageKind::Error,
            "Conversion failed: Received empty PDF file".to_string()
        ))
    );
    assert!(!h
        .recorder
        .events()
        .iter()
        .any(|e| matches!(e, UiEvent::Saved(_))));
}

#[tokio::test]
async fn service_error_field_is_shown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/convert-to-pdf"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "Typst compilation failed: unknown variable"
        })))
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    h.controller.submit("# Broken", "").await;

    assert_eq!(
        h.recorder.messages().last().unwrap().1,
        "Conversion failed: Typst compilation failed: unknown variable"
    );
    assert_eq!(h.recorder.events().last(), Some(&UiEvent::Converting(false)));
}

#[tokio::test]
async fn non_json_error_falls_back_to_status_line() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/convert-to-pdf"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    let outcome = h.controller.submit("# Doc", "").await;

    assert_eq!(
        outcome,
        SubmitOutcome::Failed("HTTP 503: Service Unavailable".to_string())
    );
    assert!(!h.controller.is_converting());
}

#[tokio::test]
async fn unreachable_service_still_releases_the_session() {
    let h = harness(&dead_server_url());
    let outcome = h.controller.submit("# Doc", "doc").await;

    assert!(matches!(outcome, SubmitOutcome::Failed(_)));
    assert!(!h.controller.is_converting());

    let events = h.recorder.events();
    assert_eq!(events.first(), Some(&UiEvent::Converting(true)));
    assert_eq!(events.last(), Some(&UiEvent::Converting(false)));
    let (kind, text) = h.recorder.messages().pop().unwrap();
    assert_eq!(kind, MessageKind::Error);
    assert!(text.starts_with("Conversion failed: "), "{}", text);
}

/// Records like `RecordingPresenter` but panics when shown an info message,
/// which happens inside the running session.
struct PanicOnInfo(Arc<RecordingPresenter>);

impl Presenter for PanicOnInfo {
    fn set_converting(&self, converting: bool) {
        self.0.set_converting(converting);
    }

    fn clear_messages(&self) {
        self.0.clear_messages();
    }

    fn show_message(&self, kind: MessageKind, text: String) {
        if kind == MessageKind::Info {
            panic!("presenter failed on {:?}", text);
        }
        self.0.show_message(kind, text);
    }

    fn set_health(&self, state: HealthState, message: String) {
        self.0.set_health(state, message);
    }

    fn set_stats(&self, stats: StatsDisplay) {
        self.0.set_stats(stats);
    }

    fn file_saved(&self, path: &Path) {
        self.0.file_saved(path);
    }
}

#[tokio::test]
async fn panic_inside_session_reports_generic_error_and_releases() {
    let recorder = RecordingPresenter::new();
    let presenter: Arc<dyn Presenter> = Arc::new(PanicOnInfo(recorder.clone()));
    // The panic happens before any request is sent
    let client = ServiceClient::new(&dead_server_url(), None).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let poller = Poller::new(client.clone(), Arc::clone(&presenter));
    let controller = ConversionController::new(client, Downloads::new(dir.path()), poller, presenter);

    let handle = controller.spawn_submit("# Doc", "doc").unwrap();
    assert_eq!(handle.await.unwrap(), None);

    assert!(!controller.is_converting());
    assert_eq!(
        recorder.messages(),
        vec![(MessageKind::Error, UNEXPECTED_PROCESSING_ERROR.to_string())]
    );
    assert_eq!(
        recorder.events().last(),
        Some(&UiEvent::Message(
            MessageKind::Error,
            UNEXPECTED_PROCESSING_ERROR.to_string()
        ))
    );
    assert!(recorder.events().contains(&UiEvent::Converting(false)));

    // A fresh submit is accepted again
    assert!(controller.spawn_submit("# Doc", "doc").is_ok());
}
