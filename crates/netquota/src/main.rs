mod cli;
mod error;

use std::time::Duration;

use bytesize::ByteSize;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use netquota_api::{TelegramClient, TransportConfig};
use netquota_config::{ConfigFile, JsonStateStore};
use netquota_core::{Daemon, LocalClock, ProcNetDev, Services, SystemShutdown, TelegramNotifier};

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Only startup failures come back; the poll loop itself never returns.
    if let Err(err) = run(cli).await {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(error::EXIT_FAILURE);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let path = cli.config.unwrap_or_else(netquota_config::config_path);
    tracing::debug!(path = %path.display(), "loading config");

    let doc = netquota_config::load(&path).map_err(|e| CliError::from_config(e, &path))?;
    let transport = TransportConfig::default().with_timeout(Duration::from_secs(cli.timeout));
    let notifier = build_notifier(&doc, &transport);

    let config = doc.monitor_config();
    let state = doc.accounting_state();
    let services = Services {
        sampler: ProcNetDev::with_path(cli.net_dev),
        store: JsonStateStore::new(path, doc),
        notifier,
        host: SystemShutdown::default(),
        clock: LocalClock,
    };

    let mut daemon = Daemon::new(config, state, services);
    let interface = daemon.config().interface.clone();

    if cli.once {
        daemon
            .preflight()
            .map_err(|e| CliError::from_startup(e, &interface))?;
        let report = daemon.poll_once().await;
        let state = daemon.state();
        tracing::info!(
            interface = %interface,
            reset = report.reset,
            total_rx = %ByteSize::b(state.total_received),
            total_tx = %ByteSize::b(state.total_transmitted),
            shutdown = report.shutdown_invoked,
            "single poll complete"
        );
        return Ok(());
    }

    match daemon.run().await {
        Ok(never) => match never {},
        Err(e) => Err(CliError::from_startup(e, &interface)),
    }
}

/// Build the Telegram notifier, or one that fails every send when the
/// settings are incomplete. Alerts are then retried each poll while the
/// accounting carries on.
fn build_notifier(doc: &ConfigFile, transport: &TransportConfig) -> TelegramNotifier {
    let client = netquota_config::telegram_settings(&doc.message.telegram)
        .map_err(|e| e.to_string())
        .and_then(|settings| {
            TelegramClient::new(settings.api_url, settings.token, transport)
                .map(|client| (client, settings.chat_id))
                .map_err(|e| e.to_string())
        });

    match client {
        Ok((client, chat_id)) => TelegramNotifier::new(client, chat_id, doc.device.clone()),
        Err(reason) => {
            tracing::warn!(%reason, "Telegram alerts disabled until the config is fixed");
            TelegramNotifier::unconfigured(reason, doc.device.clone())
        }
    }
}
