//! passpilotd - The PassPilot background service
//!
//! Wires together:
//! - Configuration loading
//! - The REST pass source
//! - The polling service (active passes, expiry checks, trial banner)
//! - Event output as newline-delimited JSON on stdout

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use passpilot_api::{Event, EventPayload, Notification};
use passpilot_client::{HttpPassSource, PassSource};
use passpilot_config::{Settings, load_config};
use passpilot_core::{
    ChannelSink, CoreEvent, PollingService, default_export_path, export_history,
};
use passpilot_util::{SystemClock, default_config_path, is_mock_time_active, now, pluralize};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// passpilotd - Hall pass expiry and trial monitoring
#[derive(Parser, Debug)]
#[command(name = "passpilotd")]
#[command(about = "Hall pass expiry and trial monitoring service", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/passpilot/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start monitoring and write events to stdout (default)
    Run,

    /// Run one expiry evaluation and one trial evaluation, then exit
    Check,

    /// Write the school's pass history as CSV
    Export {
        /// Output file (default: <export.output_dir>/passes-<school>-<time>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Writes events as one JSON object per line
struct EventWriter<W: Write> {
    out: W,
}

impl<W: Write> EventWriter<W> {
    fn new(out: W) -> Self {
        Self { out }
    }

    fn write(&mut self, payload: EventPayload) -> Result<()> {
        let line = serde_json::to_string(&Event::new(payload)).context("Failed to encode event")?;
        writeln!(self.out, "{}", line).context("Failed to write event")?;
        self.out.flush().context("Failed to flush event output")
    }
}

/// Main service state
struct Service {
    settings: Settings,
    source: Arc<dyn PassSource>,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let settings = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            base_url = %settings.api.base_url,
            school_id = ?settings.scope(),
            "Configuration loaded"
        );

        let source = HttpPassSource::new(
            &settings.api.base_url,
            settings.api.token(),
            settings.api.timeout,
        )
        .context("Failed to create REST client")?;

        Ok(Self {
            settings,
            source: Arc::new(source),
        })
    }

    async fn run(self) -> Result<()> {
        let mut writer = EventWriter::new(std::io::stdout());
        let (sink, mut notifications) = ChannelSink::new();

        let (mut polling, mut core_events) = PollingService::new(
            self.source.clone(),
            Arc::new(SystemClock),
            Arc::new(sink),
            self.settings.session.clone(),
            self.settings.polling,
            self.settings.notifications,
        );

        writer.write(EventPayload::ServiceStarted {
            school_id: polling.scope().cloned(),
        })?;

        if !polling.start() {
            warn!("Monitoring disabled; waiting for shutdown signal");
        }

        // Set up signal handlers
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup =
            signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }

                Some(notification) = notifications.recv() => {
                    writer.write(EventPayload::PassExpiringSoon(notification))?;
                }

                Some(event) = core_events.recv() => {
                    Self::handle_core_event(&mut writer, event)?;
                }
            }
        }

        // Stop polling before the final event so nothing follows it
        polling.shutdown().await;
        flush_pending(&mut writer, &mut notifications, &mut core_events)?;
        writer.write(EventPayload::Shutdown)?;

        info!("Shutdown complete");
        Ok(())
    }

    fn handle_core_event<W: Write>(writer: &mut EventWriter<W>, event: CoreEvent) -> Result<()> {
        if let CoreEvent::PollFailed { task, error } = &event {
            warn!(task, error = %error, "Polling task reported a failure");
        }
        writer.write(event.into())
    }

    async fn check(self) -> Result<()> {
        let (sink, _) = ChannelSink::new();
        let (polling, _) = PollingService::new(
            self.source.clone(),
            Arc::new(SystemClock),
            Arc::new(sink),
            self.settings.session.clone(),
            self.settings.polling,
            self.settings.notifications,
        );

        let report = polling.check_once().await.context("Check failed")?;

        println!("School: {} ({})", report.school.name, report.school.id);
        println!("Active passes: {}", report.active_passes);
        if report.notifications.is_empty() {
            println!("No passes expiring soon");
        }
        for notification in &report.notifications {
            println!("  [{}] {}", notification.title, notification.description);
        }

        println!(
            "Trial: {} remaining{}",
            pluralize(report.trial.days_remaining, "day"),
            if report.trial.is_expired { " (expired)" } else { "" }
        );
        match &report.banner {
            Some(banner) => println!("Banner: {} - {}", banner.title, banner.message),
            None => println!("Banner: hidden"),
        }

        Ok(())
    }

    async fn export(self, output: Option<PathBuf>) -> Result<()> {
        let Some(scope) = self.settings.scope().cloned() else {
            bail!("No school_id configured in [session]; nothing to export");
        };

        let path = output
            .unwrap_or_else(|| default_export_path(&self.settings.export.output_dir, &scope, now()));

        let summary = export_history(self.source.as_ref(), &scope, &path)
            .await
            .with_context(|| format!("Failed to export pass history to {:?}", path))?;

        println!(
            "Exported {} to {}",
            pluralize(summary.rows as i64, "pass"),
            path.display()
        );
        if summary.flagged > 0 {
            println!(
                "{} had inconsistent duration data (see log)",
                pluralize(summary.flagged as i64, "row")
            );
        }
        Ok(())
    }
}

/// Write whatever the tasks produced before they stopped
fn flush_pending<W: Write>(
    writer: &mut EventWriter<W>,
    notifications: &mut mpsc::UnboundedReceiver<Notification>,
    core_events: &mut mpsc::Receiver<CoreEvent>,
) -> Result<()> {
    while let Ok(notification) = notifications.try_recv() {
        writer.write(EventPayload::PassExpiringSoon(notification))?;
    }
    while let Ok(event) = core_events.try_recv() {
        Service::handle_core_event(writer, event)?;
    }
    Ok(())
}

fn init_logging(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match args.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        mock_time = is_mock_time_active(),
        "passpilotd starting"
    );

    let service = Service::new(&args)?;
    match args.command.unwrap_or(Command::Run) {
        Command::Run => service.run().await,
        Command::Check => service.check().await,
        Command::Export { output } => service.export(output).await,
    }
}
