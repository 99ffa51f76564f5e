//! ShellGuard - Resource monitor and overload guard for the browser shell
//!
//! Samples CPU and memory on a fixed period, appends every reading to a
//! `Date;Hour;CPU;RAM` log, and asks the user whether to close the browser
//! when utilization crosses the configured thresholds.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod core;
mod persistence;
mod platform;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use single_instance::SingleInstance;
use tokio::runtime::Runtime;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::{LogNotifier, Monitor, MonitorBuilder, Settings};
use crate::persistence::{CsvLog, Database};
use crate::platform::{NativePrompt, ShutdownLifecycle};
use crate::ui::MonitorApp;

/// Application name constant
pub const APP_NAME: &str = "ShellGuard";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line overrides; they apply to this run only and are never saved
#[derive(Debug, Parser)]
#[command(name = "shellguard", version, about)]
struct Cli {
    /// Run without a window; prompts use native message boxes
    #[arg(long)]
    headless: bool,

    /// Sampling period in milliseconds
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Write the monitoring log to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(interval) = self.interval_ms {
            settings.sample_interval_ms = interval;
        }
        if let Some(path) = &self.log_file {
            settings.log_file = Some(path.clone());
        }
        if self.debug {
            settings.debug_logging = true;
        }
        settings.validate();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Ensure only one copy of ShellGuard is running
    let instance =
        SingleInstance::new(APP_NAME).context("Failed to create single instance lock")?;
    if !instance.is_single() {
        eprintln!("{} is already running!", APP_NAME);
        return Ok(());
    }

    let db = Database::new()?;
    db.initialize()?;

    // Logging is configured from settings, so load them first and report later
    let (mut settings, load_error) = match db.load_settings() {
        Ok(settings) => (settings.unwrap_or_default(), None),
        Err(e) => (Settings::default(), Some(e)),
    };
    cli.apply(&mut settings);

    init_logging(settings.debug_logging);
    info!("{} v{} starting...", APP_NAME, APP_VERSION);
    if let Some(e) = load_error {
        warn!("Stored settings unreadable, using defaults: {:#}", e);
    }

    match db.cleanup_history(settings.history_retention_days) {
        Ok(0) => {}
        Ok(count) => info!("Pruned {} old alerts", count),
        Err(e) => error!("Failed to prune alert history: {}", e),
    }

    let db = Arc::new(db);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("shellguard-worker")
        .build()
        .context("Failed to start async runtime")?;

    let builder = monitor_builder(&settings, Arc::clone(&db));
    let result = if cli.headless {
        run_headless(&runtime, builder)
    } else {
        run_gui(&runtime, db, settings, builder)
    };

    // a native dialog can still be blocking a worker; do not wait on it forever
    runtime.shutdown_timeout(Duration::from_secs(2));
    info!("{} shutting down", APP_NAME);
    result
}

/// Collaborators shared by the GUI and headless front ends
fn monitor_builder(settings: &Settings, db: Arc<Database>) -> MonitorBuilder {
    info!(
        backend = settings.metric_backend.label(),
        interval_ms = settings.sample_interval_ms,
        "Configuring monitor"
    );

    let log = CsvLog::new(settings.get_log_file());
    info!("Monitoring log at {:?}", log.path());

    Monitor::builder()
        .source(settings.metric_backend.build(settings.command_timeout()))
        .sink(Arc::new(log))
        .journal(db)
        .interval(settings.sample_interval())
        .thresholds(settings.thresholds())
}

fn run_headless(runtime: &Runtime, builder: MonitorBuilder) -> Result<()> {
    let lifecycle = Arc::new(ShutdownLifecycle::new());
    let terminated = lifecycle.notified();

    let monitor = builder
        .notifier(Arc::new(LogNotifier))
        .prompt(Arc::new(NativePrompt::new()))
        .lifecycle(lifecycle)
        .build()?;

    info!("Running headless, press Ctrl-C to stop");
    runtime.block_on(async move {
        let handle = monitor.start();

        tokio::select! {
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => info!("Interrupted"),
                Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
            },
            _ = terminated.notified() => info!("Browser terminated"),
        }

        handle.stop().await;
    });

    Ok(())
}

fn run_gui(
    runtime: &Runtime,
    db: Arc<Database>,
    settings: Settings,
    builder: MonitorBuilder,
) -> Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 720.0])
            .with_min_inner_size([720.0, 520.0])
            .with_icon(load_app_icon()),
        ..Default::default()
    };

    let handle = runtime.handle().clone();
    info!("Starting GUI...");
    eframe::run_native(
        &format!("{} v{}", APP_NAME, APP_VERSION),
        native_options,
        Box::new(move |cc| Ok(Box::new(MonitorApp::new(cc, handle, db, settings, builder)))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run application: {}", e))
}

/// Initialize the logging system
fn init_logging(debug: bool) {
    let default_filter = if debug {
        "shellguard=debug,eframe=warn,egui=warn,wgpu=error"
    } else {
        "shellguard=info,eframe=warn,egui=warn,wgpu=error"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Procedural window icon: an amber ring on a dark disc
fn load_app_icon() -> egui::IconData {
    let size = 64;
    let mut rgba = vec![0u8; size * size * 4];
    let half = size as f32 / 2.0;

    for y in 0..size {
        for x in 0..size {
            let idx = (y * size + x) * 4;
            let dist = ((x as f32 - half).powi(2) + (y as f32 - half).powi(2)).sqrt();

            let color = if dist < half - 14.0 {
                [24, 24, 37, 255]
            } else if dist < half - 4.0 {
                let t = (dist - (half - 14.0)) / 10.0;
                [245, (158.0 + t * 40.0) as u8, 11, 255]
            } else if dist < half - 2.0 {
                [24, 24, 37, 255]
            } else {
                continue;
            };
            rgba[idx..idx + 4].copy_from_slice(&color);
        }
    }

    egui::IconData {
        rgba,
        width: size as u32,
        height: size as u32,
    }
}
