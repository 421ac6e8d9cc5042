use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::Show,
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mdpdf_tui::app::App;
use mdpdf_tui::config::AppConfig;
use mdpdf_tui::poller::Poller;
use mdpdf_tui::presenter::{ConsolePresenter, Presenter};
use mdpdf_tui::service::ServiceClient;
use mdpdf_tui::session::{ConversionController, Downloads, SubmitOutcome};
use mdpdf_tui::ui;

#[derive(Parser, Debug)]
#[command(name = "mdpdf")]
#[command(version)]
#[command(about = "A terminal front-end for a Markdown to PDF conversion service")]
struct Args {
    /// Base URL of the conversion service (overrides the config file)
    #[arg(long)]
    server: Option<String>,

    /// Directory PDFs are saved to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Convert a Markdown file without starting the TUI
    #[arg(short, long, value_name = "FILE")]
    convert: Option<PathBuf>,

    /// Output filename for --convert (defaults to the input name with .pdf)
    #[arg(short, long, requires = "convert")]
    output: Option<String>,

    /// Print service health and exit
    #[arg(long)]
    health: bool,

    /// Print service stats and exit
    #[arg(long)]
    stats: bool,
}

impl Args {
    fn is_headless(&self) -> bool {
        self.convert.is_some() || self.health || self.stats
    }

    /// `--output-dir`, else the configured or system download directory.
    fn download_dir(&self, config: &AppConfig) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| config.resolved_download_dir())
    }
}

/// Set while the alternate screen is up.
static TUI_ACTIVE: AtomicBool = AtomicBool::new(false);

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.is_headless());
    install_panic_hook();

    let config = AppConfig::load().unwrap_or_default();
    let server = args.server.clone().unwrap_or_else(|| config.server_url.clone());
    let client = ServiceClient::new(&server, config.request_timeout())
        .context("Failed to build HTTP client")?;

    // Handle CLI-only commands
    if args.health || args.stats {
        let presenter: Arc<dyn Presenter> = Arc::new(ConsolePresenter);
        let poller = Poller::new(client, presenter);
        if args.health {
            poller.check_health().await;
        }
        if args.stats {
            poller.refresh_stats().await;
        }
        return Ok(());
    }

    let download_dir = args.download_dir(&config);

    if let Some(input) = &args.convert {
        return convert_file(client, input, args.output.as_deref(), download_dir).await;
    }

    run_tui(&config, client, download_dir).await
}

fn init_logging(headless: bool) {
    let filter = tracing_subscriber::EnvFilter::from_default_env();

    if headless {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .with(filter)
            .init();
        return;
    }

    // The TUI owns the terminal, so logs go to a file
    match open_log_file() {
        Some(file) => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
            .with(filter)
            .init(),
        None => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::sink))
            .with(filter)
            .init(),
    }
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::cache_dir()?.join("mdpdf");
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("mdpdf.log"))
        .ok()
}

/// Log every panic. The default hook only prints for main-thread panics
/// outside the TUI: inside it, handler panics are caught and shown as a
/// status message, and `TerminalGuard` restores the screen for the rest.
/// Panics in background tasks are reported by the task supervisor.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("panic: {}", info);
        if std::thread::current().name() == Some("main") && !TUI_ACTIVE.load(Ordering::SeqCst) {
            default_hook(info);
        }
    }));
}

/// Raw mode + alternate screen for as long as it lives, including while
/// unwinding.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen, EnableBracketedPaste)?;
        TUI_ACTIVE.store(true, Ordering::SeqCst);
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        TUI_ACTIVE.store(false, Ordering::SeqCst);
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableBracketedPaste, Show);
        if std::thread::panicking() {
            eprintln!("mdpdf stopped after an unexpected error; details are in the log");
        }
    }
}

async fn convert_file(
    client: ServiceClient,
    input: &Path,
    output: Option<&str>,
    out_dir: PathBuf,
) -> Result<()> {
    let markdown = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file {}", input.display()))?;

    let filename = match output {
        Some(name) => name.to_string(),
        None => input
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| format!("{}.pdf", s))
            .unwrap_or_default(),
    };

    let presenter: Arc<dyn Presenter> = Arc::new(ConsolePresenter);
    let poller = Poller::new(client.clone(), Arc::clone(&presenter));
    let controller = ConversionController::new(client, Downloads::new(out_dir), poller, presenter);

    match controller.submit(&markdown, &filename).await {
        SubmitOutcome::Saved(_) => Ok(()),
        // The presenter already printed why
        _ => std::process::exit(1),
    }
}

async fn run_tui(config: &AppConfig, client: ServiceClient, download_dir: PathBuf) -> Result<()> {
    let _terminal = TerminalGuard::enter()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, client, download_dir);
    let (health_loop, stats_loop) =
        app.start_polling(config.health_interval(), config.stats_interval());

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    health_loop.abort();
    stats_loop.abort();

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.guarded(App::tick);
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('c') | KeyCode::Char('q')
                        if key.modifiers.contains(KeyModifiers::CONTROL) =>
                    {
                        return Ok(())
                    }
                    // A panicking handler becomes a status message
                    _ => app.guarded(|app| app.handle_key(key)),
                },
                Event::Paste(text) => app.guarded(|app| app.handle_paste(&text)),
                _ => {}
            }
        }
    }
}
