mod api;
mod commands;
mod dispatch;
mod gateway;
#[cfg(test)]
mod test_support;

use anyhow::Context;
use clap::{Parser, Subcommand};
use courier_backend::{BackendClient, Endpoint, Verifier};
use courier_channels::whatsapp::WhatsAppChannel;
use courier_core::{
    config::{self, shellexpand, Config, CourierConfig},
    phone::PhoneNormalizer,
    traits::Channel,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "courier",
    version,
    about = "WhatsApp relay for login codes, notifications, and chat commands"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to WhatsApp and serve the HTTP API until Ctrl-C.
    Start,
    /// Print the effective configuration and exit.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load(&cli.config)?;
    cfg.apply_env(|key| std::env::var(key).ok());

    match cli.command {
        Commands::Start => {
            let _guard = init_logging(&cfg.courier)?;
            start(cfg).await?;
        }
        Commands::Check => check(&cli.config, &cfg)?,
    }

    Ok(())
}

/// Console logging, plus a daily rolling file when `log_dir` is set.
///
/// The returned guard flushes the file writer on drop; hold it for the
/// life of the process.
fn init_logging(
    cfg: &CourierConfig,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    let (file_layer, guard) = if cfg.log_dir.is_empty() {
        (None, None)
    } else {
        let dir = shellexpand(&cfg.log_dir);
        std::fs::create_dir_all(&dir).with_context(|| format!("failed to create {dir}"))?;
        let appender = tracing_appender::rolling::daily(&dir, "courier.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn start(cfg: Config) -> anyhow::Result<()> {
    info!("{} relay starting", cfg.courier.name);

    let channel: Arc<dyn Channel> = Arc::new(WhatsAppChannel::new(
        cfg.whatsapp.clone(),
        &cfg.courier.data_dir,
    ));

    let client = BackendClient::from_config(&cfg.backend)?;
    let gateway = Arc::new(gateway::Gateway::new(
        channel.clone(),
        Verifier::new(client),
        cfg.backend.purchase_link(),
    ));

    let inbound = channel.start().await?;
    let gateway_handle = tokio::spawn(gateway.run(inbound));

    let dispatcher = Arc::new(dispatch::Dispatcher::new(
        channel.clone(),
        PhoneNormalizer::from_config(&cfg.phone),
        cfg.courier.name.clone(),
    ));
    let state = api::ApiState::new(dispatcher, &cfg.backend.internal_key);

    let served = api::serve(&cfg.api, state, shutdown_signal()).await;

    info!("shutting down");
    if let Err(e) = channel.stop().await {
        error!("failed to stop {}: {e}", channel.name());
    }
    gateway_handle.abort();

    served.context("API server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for Ctrl-C: {e}");
    }
}

fn check(path: &str, cfg: &Config) -> anyhow::Result<()> {
    let client = BackendClient::from_config(&cfg.backend)?;

    println!("{} configuration check\n", cfg.courier.name);
    println!("Config: {path}");
    println!("Data dir: {}", shellexpand(&cfg.courier.data_dir));
    println!();
    println!("  verify (primary):   {}", client.verify_url(Endpoint::Primary));
    println!("  verify (secondary): {}", client.verify_url(Endpoint::Secondary));
    println!("  opt-out:            {}", client.opt_out_url());
    println!("  purchase link:      {}", cfg.backend.purchase_link());
    println!(
        "  internal key:       {}",
        if cfg.backend.internal_key.is_empty() {
            "not set (dispatch endpoints disabled)"
        } else {
            "set"
        }
    );
    println!("  timeout:            {}s", cfg.backend.request_timeout_secs);
    println!();
    println!(
        "  default country code: {} (numbers up to {} digits)",
        cfg.phone.default_country_code, cfg.phone.local_max_digits
    );
    println!("  listen:               {}:{}", cfg.api.host, cfg.api.port);
    println!(
        "  whatsapp:             {}",
        if cfg.whatsapp.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    Ok(())
}
