//! `tunnely-tui`: terminal account settings and voucher redemption.
//!
//! Built on [ratatui](https://ratatui.rs). The settings screen lists the
//! account rows; the voucher dialog overlays it and is driven by
//! `tunnely-core`'s [`VoucherDialogViewModel`](tunnely_core::VoucherDialogViewModel).
//!
//! Logs go to a file (default `<tmp>/tunnely-tui.log`) so they never
//! corrupt the terminal. A background connection bridge forwards service
//! and voucher state into the action loop.

mod action;
mod app;
mod component;
mod connection_bridge;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::Result;
use secrecy::SecretString;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use tunnely_config::Config;
use tunnely_core::{MessageCatalog, ServiceConfig};

use crate::app::App;
use crate::connection_bridge::ServiceSetup;

/// Terminal UI for tunnely account settings and voucher redemption.
#[derive(Parser, Debug)]
#[command(name = "tunnely-tui", version, about)]
struct Cli {
    /// Profile to use (defaults to the config's default profile)
    #[arg(short, long, env = "TUNNELY_PROFILE")]
    profile: Option<String>,

    /// Account service URL override
    #[arg(long, env = "TUNNELY_API_URL")]
    api_url: Option<String>,

    /// Account token override
    #[arg(long, env = "TUNNELY_ACCOUNT_TOKEN", hide_env = true)]
    account_token: Option<String>,

    /// Log file path (defaults to tunnely-tui.log in the temp directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Nothing may be logged to stdout/stderr while the
/// terminal is in raw mode. The guard must outlive the app.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tunnely_tui={log_level},tunnely_core={log_level}")));

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("tunnely-tui.log"));
    let temp_dir = std::env::temp_dir();
    let log_dir = log_file.parent().unwrap_or(temp_dir.as_path());
    let log_filename = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("tunnely-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Resolve the service setup. Priority: CLI flags > config profile.
fn resolve_setup(cli: &Cli, cfg: &Config, profile_name: &str) -> ServiceSetup {
    let mut profile = cfg
        .profiles
        .get(profile_name)
        .cloned()
        .unwrap_or_default();
    if let Some(url) = &cli.api_url {
        profile.api_url.clone_from(url);
    }

    let resolved = match cli.account_token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => tunnely_config::parse_api_url(&profile.api_url).map(|api_url| ServiceConfig {
            api_url,
            account_token: SecretString::from(token.to_owned()),
            ca_cert: profile.ca_cert.clone(),
            timeout: Duration::from_secs(profile.timeout.unwrap_or(cfg.defaults.timeout)),
        }),
        None => tunnely_config::profile_to_service_config(&profile, profile_name, &cfg.defaults),
    };

    match resolved {
        Ok(config) => ServiceSetup::Configured(Box::new(config)),
        Err(e) => {
            warn!(profile = profile_name, error = %e, "account service not configured");
            ServiceSetup::Unavailable(e.to_string())
        }
    }
}

fn load_config(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    tunnely_config::load_config_from(path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring unreadable config");
        Config::default()
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks go in before the terminal enters raw mode.
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    if let Err(e) = tunnely_config::extract_bundled_assets() {
        warn!(error = %e, "could not write bundled config example");
    }
    let cfg = load_config(&tunnely_config::config_path());
    let profile_name = cli
        .profile
        .clone()
        .unwrap_or_else(|| cfg.default_profile_name().to_owned());

    info!(profile = %profile_name, "starting tunnely-tui");

    let messages = cfg.message_catalog().unwrap_or_else(|e| {
        warn!(error = %e, "invalid [messages] overrides, using built-in text");
        MessageCatalog::english()
    });
    let setup = resolve_setup(&cli, &cfg, &profile_name);

    let mut app = App::new(profile_name, setup, Arc::new(messages));
    app.run().await?;

    Ok(())
}
