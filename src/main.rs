// Copyright (c) 2026 radar-monitor contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! radar-monitor - device status board for wearable sensor telemetry

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use radar_monitor::{ApiClient, Config, Monitor, RestClient, SimulatedClient, VERSION};

/// Monitor the data status of wearable devices in a RADAR-CNS study
#[derive(Parser, Debug)]
#[command(name = "radar-monitor")]
#[command(version = VERSION)]
#[command(about = "Device status board for wearable sensor telemetry")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use a simulated upstream instead of the REST API
    #[arg(long)]
    demo: bool,

    /// REST API root URL
    #[arg(long)]
    api_url: Option<String>,

    /// Study to monitor
    #[arg(long)]
    study_id: Option<String>,

    /// Pause between polling cycles in milliseconds
    #[arg(long)]
    api_refresh: Option<u64>,

    /// Pause between consecutive API requests in milliseconds
    #[arg(long)]
    api_interval: Option<u64>,

    /// Status board refresh in milliseconds
    #[arg(long)]
    gui_refresh: Option<u64>,

    /// Samples kept per device and sensor, 0 for unbounded
    #[arg(long)]
    buffer_len: Option<usize>,

    /// Also show idle and disconnected devices
    #[arg(long)]
    show_all: bool,

    /// CSV device sheet with a MAC column
    #[arg(long)]
    devices: Option<PathBuf>,

    /// Device sheet column that replaces the MAC address on the board
    #[arg(long)]
    dev_replace: Option<String>,

    /// Log level when neither --debug nor --trace is given
    #[arg(long)]
    log_level: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if self.demo {
            config.demo_mode = true;
        }
        if let Some(url) = self.api_url {
            config.api.base_url = url;
        }
        if let Some(study) = self.study_id {
            config.api.study_id = study;
        }
        if let Some(ms) = self.api_refresh {
            config.monitor.api_refresh_ms = ms;
        }
        if let Some(ms) = self.api_interval {
            config.monitor.api_interval_ms = ms;
        }
        if let Some(ms) = self.gui_refresh {
            config.monitor.render_refresh_ms = ms;
        }
        if let Some(len) = self.buffer_len {
            config.monitor.buffer_len = len;
        }
        if self.show_all {
            config.monitor.show_all = true;
        }
        if let Some(path) = self.devices {
            config.devices.table = Some(path);
        }
        if let Some(column) = self.dev_replace {
            config.devices.replace_column = Some(column);
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
    }
}

fn log_level(args: &Args, config: &Config) -> Level {
    if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        args.log_level
            .as_deref()
            .unwrap_or(&config.log_level)
            .parse()
            .unwrap_or(Level::INFO)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)
        .with_context(|| format!("loading configuration from {:?}", config_path))?;

    // Initialize logging
    let level = log_level(&args, &config);
    let verbose = args.debug || args.trace;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(verbose)
        .with_line_number(verbose)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("radar-monitor v{}", VERSION);

    // Override with command line args
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    info!("Configuration loaded from {:?}", config_path);
    info!("Demo mode: {}", config.demo_mode);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config))
}

async fn run(config: Config) -> Result<()> {
    let client: Arc<dyn ApiClient> = if config.demo_mode {
        Arc::new(SimulatedClient::new(&config.api.study_id, config.demo_subjects))
    } else {
        Arc::new(RestClient::new(&config.api)?)
    };

    let show_all = config.monitor.show_all;
    let monitor = Arc::new(Monitor::new(config, client)?);
    let mut handles = monitor.start();
    handles.push(tokio::spawn(radar_monitor::ui::run_console(monitor.clone(), show_all)));

    info!("Press Ctrl+C to shutdown");
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received, cleaning up...");
    monitor.stop();
    for result in futures::future::join_all(handles).await {
        if let Err(e) = result {
            error!("Task ended abnormally: {}", e);
        }
    }

    info!("radar-monitor shutdown complete");
    Ok(())
}
