//! Locus CLI
//!
//! A terminal front end over `locus-core`:
//!
//! 1. **capture**: ask for location access, record the current position
//!    and print the full history.
//!
//! 2. **list**: print the history, as a table or as JSON.
//!
//! 3. **dark-mode**: show or change the persisted theme preference.
//!
//! Positions come from `--lat/--lon` (or `LOCUS_LAT`/`LOCUS_LON`); with
//! neither set a capture fails with "location unavailable".

mod permission;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, WrapErr};
use locus_core::platform::FixedLocationProvider;
use locus_core::{
    Accuracy, CancelToken, CaptureSnapshot, CaptureState, CoreConfig, LocationRecord, Locus,
    Position, PreferenceStore,
};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use permission::PromptPermissionGate;

const DATABASE_FILE: &str = "locations.db";
const PREFERENCES_FILE: &str = "preferences.json";

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "locus", version, about = "Record where you are, on demand")]
struct Args {
    /// Directory holding locations.db and preferences.json
    #[arg(long, env = "LOCUS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Accuracy hint: lowest, low, balanced, high, highest
    #[arg(long, default_value_t = Accuracy::High)]
    accuracy: Accuracy,

    /// Seconds to wait for a position fix (0 waits indefinitely)
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Debug logging for locus
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture the current position and print the history
    Capture {
        /// Latitude of the position to record
        #[arg(long, env = "LOCUS_LAT", allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude of the position to record
        #[arg(long, env = "LOCUS_LON", allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,

        /// Grant location access without prompting
        #[arg(short, long)]
        yes: bool,
    },

    /// Print every captured position, oldest first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show or change the theme preference
    DarkMode {
        #[arg(value_enum, default_value_t = DarkModeAction::Status)]
        action: DarkModeAction,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum DarkModeAction {
    On,
    Off,
    Toggle,
    Status,
}

impl Args {
    fn core_config(&self, data_dir: &std::path::Path) -> CoreConfig {
        CoreConfig {
            database_path: Some(data_dir.join(DATABASE_FILE)),
            accuracy: self.accuracy,
            location_timeout: match self.timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

/// Platform data directory, e.g. `~/.local/share/locus` on Linux
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("locus")
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let default_filter = if args.verbose {
        "warn,locus_core=debug,locus=debug"
    } else {
        "warn,locus_core=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let data_dir = args.data_dir.clone().unwrap_or_else(default_data_dir);
    tracing::debug!(data_dir = %data_dir.display(), "Resolved data directory");

    let preferences = Arc::new(PreferenceStore::open_or_memory(
        data_dir.join(PREFERENCES_FILE),
    ));

    let (position, assume_yes) = match &args.command {
        Command::Capture { lat, lon, yes } => {
            (lat.zip(*lon).map(|(lat, lon)| Position::new(lat, lon)), *yes)
        }
        _ => (None, false),
    };
    let provider = Arc::new(match position {
        Some(position) => FixedLocationProvider::at(position),
        None => FixedLocationProvider::new(),
    });
    let permissions = Arc::new(PromptPermissionGate::new(
        Arc::clone(&preferences),
        assume_yes,
    ));

    let locus = Locus::open(
        args.core_config(&data_dir),
        preferences,
        permissions,
        provider,
    )
    .wrap_err_with(|| format!("Failed to open Locus data in {}", data_dir.display()))?;

    let outcome = match args.command {
        Command::Capture { .. } => capture(&locus).await,
        Command::List { json } => list(&locus, json).await,
        Command::DarkMode { action } => {
            dark_mode(&locus, action);
            Ok(())
        }
    };

    locus.shutdown()?;
    outcome
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn capture(locus: &Locus) -> color_eyre::Result<()> {
    let controller = locus.controller();
    let mut alerts = controller.subscribe_alerts();

    let cancel = CancelToken::new();
    let interrupt = tokio::spawn(cancel_on_interrupt_during_fetch(
        controller.subscribe_state(),
        cancel.clone(),
        tokio::signal::ctrl_c,
    ));

    let result = controller.capture_with_cancel(&cancel).await;
    interrupt.abort();

    while let Ok(alert) = alerts.try_recv() {
        eprintln!("{}: {}", alert.title, alert.message);
        if alert.recoverable {
            eprintln!("Run the command again to retry.");
        }
    }

    let record = result.map_err(|e| eyre!("Capture failed ({})", e.code()))?;
    println!(
        "Captured #{} at {:.6}, {:.6}",
        record.id, record.latitude, record.longitude
    );

    let history = controller
        .snapshot()
        .locations
        .ok_or_else(|| eyre!("History was not loaded after capture"))?;
    print_table(&history);
    Ok(())
}

/// Turn an interrupt into a cancelled position fetch
///
/// The handler is only installed once the fetch starts, so Ctrl-C at the
/// permission prompt still ends the process the usual way.
async fn cancel_on_interrupt_during_fetch<F, Fut>(
    mut state: watch::Receiver<CaptureSnapshot>,
    cancel: CancelToken,
    interrupt: F,
) where
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if state
        .wait_for(|snapshot| snapshot.state == CaptureState::AcquiringLocation)
        .await
        .is_err()
    {
        return;
    }

    if interrupt().await.is_ok() {
        tracing::info!("Interrupted, cancelling the location request");
        cancel.cancel();
    }
}

async fn list(locus: &Locus, json: bool) -> color_eyre::Result<()> {
    let records = locus
        .controller()
        .refresh()
        .await
        .wrap_err("Failed to load the capture history")?;

    if json {
        println!("{}", serde_json::to_string_pretty(records.as_slice())?);
    } else {
        print_table(&records);
    }
    Ok(())
}

fn dark_mode(locus: &Locus, action: DarkModeAction) {
    let theme = locus.theme();
    let enabled = match action {
        DarkModeAction::On => theme.set_dark_mode(true),
        DarkModeAction::Off => theme.set_dark_mode(false),
        DarkModeAction::Toggle => theme.toggle(),
        DarkModeAction::Status => theme.dark_mode_enabled(),
    };
    println!("Dark mode: {}", if enabled { "on" } else { "off" });
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_table(records: &[LocationRecord]) {
    if records.is_empty() {
        println!("No locations captured yet.");
        return;
    }

    println!("{:>5}  {:>11}  {:>12}  {}", "ID", "LATITUDE", "LONGITUDE", "CAPTURED (UTC)");
    for record in records {
        println!(
            "{:>5}  {:>11.6}  {:>12.6}  {}",
            record.id,
            record.latitude,
            record.longitude,
            format_timestamp(record.captured_at)
        );
    }
}

fn format_timestamp(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}
