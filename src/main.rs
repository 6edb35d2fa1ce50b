//! Application entry point for the `fieldwatch` terminal dashboard.
//!
//! This binary orchestrates the startup sequence for the dashboard client:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Opening the on-disk client cache
//! - Mounting every page and either polling them (`watch`) or running a
//!   one-shot command against the backend
//!
//! # Environment Variables
//! - `API_BASE_URL` (**required**) – irrigation backend base URL
//! - `FIELDWATCH_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `FIELDWATCH_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config.rs` for the polling, cache and weather settings.
use std::{env, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use fieldwatch_dashboard::cache::{CacheKey, ClientCache, Theme};
use fieldwatch_dashboard::io::{HttpClient, ReqwestHttpClient};
use fieldwatch_dashboard::models::SensorReading;
use fieldwatch_dashboard::pages::analytics::export_csv;
use fieldwatch_dashboard::pages::irrigation::Outcome;
use fieldwatch_dashboard::{config, App};

#[derive(Parser)]
#[command(name = "fieldwatch")]
#[command(about = "Terminal dashboard for the smart-agriculture irrigation monitor")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll every page and redraw until Ctrl-C (default)
    Watch,
    /// Write the cached analytics history to a CSV file
    ExportCsv {
        #[arg(short, long, default_value = "sensor_history.csv")]
        out: PathBuf,
    },
    /// Switch the manual pump on or off (manual mode only)
    Pump { state: Switch },
    /// Enable or disable automatic irrigation
    AutoMode { state: Switch },
    /// Set the soil moisture threshold, in percent
    Threshold { percent: f64 },
    /// Set the colour theme
    Theme { theme: ThemeArg },
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
}

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let cfg = config::load_from_env()?;
    cfg.log_config();

    let cache = ClientCache::on_disk(&cfg.cache_dir)
        .with_context(|| format!("Failed to open cache at {}", cfg.cache_dir.display()))?;
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::with_timeout(cfg.http_timeout)?);
    let mut app = App::mount(&cfg, http, cache.clone());

    match args.command.unwrap_or(Command::Watch) {
        Command::Watch => watch(&mut app, &cfg).await,
        Command::ExportCsv { out } => {
            let history: Vec<SensorReading> = cache.get(CacheKey::AnalyticsData).unwrap_or_default();
            let rows = export_csv(&history, &out)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Exported {} readings to {}", rows, out.display());
            Ok(())
        }
        Command::Pump { state } => {
            app.irrigation.load().await;
            let outcome = app.irrigation.set_pump(matches!(state, Switch::On)).await;
            report(&app, outcome)
        }
        Command::AutoMode { state } => {
            app.irrigation.load().await;
            let outcome = app
                .irrigation
                .set_auto_mode(matches!(state, Switch::On))
                .await;
            report(&app, outcome)
        }
        Command::Threshold { percent } => {
            app.irrigation.load().await;
            let outcome = app.irrigation.update_threshold(percent).await;
            report(&app, outcome)
        }
        Command::Theme { theme } => {
            let theme = match theme {
                ThemeArg::Light => Theme::Light,
                ThemeArg::Dark => Theme::Dark,
            };
            cache.set_theme(theme)?;
            println!("Theme set to {:?}", theme);
            Ok(())
        }
    }
}

/// Poll and redraw until Ctrl-C, then stop every timer.
async fn watch(app: &mut App, cfg: &config::Config) -> Result<()> {
    // ---
    let color = use_color();
    app.irrigation.load().await;
    app.start(cfg);
    tracing::info!("Watching {} pages, Ctrl-C to quit", app.running());

    let mut redraw = tokio::time::interval(cfg.render_interval);
    loop {
        tokio::select! {
            _ = redraw.tick() => {
                println!("{}", app.render(color));
            }
            res = tokio::signal::ctrl_c() => {
                res.context("Failed to listen for Ctrl-C")?;
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    app.stop().await;
    Ok(())
}

/// Print the irrigation panel and map the outcome to an exit status.
fn report(app: &App, outcome: Outcome) -> Result<()> {
    // ---
    println!("{}", app.render_irrigation(use_color()));
    match outcome {
        Outcome::Saved => Ok(()),
        Outcome::Rejected => Err(anyhow!("Change refused")),
        Outcome::Failed => Err(anyhow!("Backend rejected the change")),
    }
}

/// Colors on when `FORCE_COLOR` says so, otherwise when stdout is a TTY.
fn use_color() -> bool {
    match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    }
}

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Output on stderr so rendered pages on stdout stay clean
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var
/// - Span event emission mode controlled by the `FIELDWATCH_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level from `RUST_LOG`, else the `FIELDWATCH_LOG_LEVEL` env var
///
/// This should be called once at application startup before any logging
/// or tracing macros are invoked.
fn init_tracing() {
    // ---
    let span_events = match env::var("FIELDWATCH_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stderr().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to FIELDWATCH_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("FIELDWATCH_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("{level},hyper=warn,reqwest=warn"))
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
