//! recaptcha-gate
//!
//! Command-line front end for the pooled reCAPTCHA verification client.
//!
//! # Architecture Overview
//!
//! ```text
//!   settings file (TOML)                 login attempt
//!          │                                   │
//!          ▼                                   ▼
//!   ┌─────────────┐  settings map   ┌──────────────────┐
//!   │   config    │────────────────▶│  ClientRegistry  │
//!   │loader/watch │                 │ (rebuild on diff)│
//!   └─────────────┘                 └────────┬─────────┘
//!                                            │
//!                        ┌───────────────────┼───────────────────┐
//!                        ▼                   ▼                   ▼
//!               ┌────────────────┐  ┌────────────────┐  ┌────────────────┐
//!               │ VerificationCl.│─▶│ ConnectionPool │◀─│ StatsReporter  │
//!               │  fail-open on  │  │ lease/connect/ │  │ every N secs   │
//!               │   timeouts     │  │ read deadlines │  │ log + gauges   │
//!               └────────────────┘  └───────┬────────┘  └────────────────┘
//!                                           │ HTTPS
//!                                           ▼
//!                               google.com/recaptcha/api/siteverify
//! ```

use std::error::Error;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use recaptcha_gate::config::loader::load_settings;
use recaptcha_gate::config::watcher::SettingsWatcher;
use recaptcha_gate::config::SiteCredentials;
use recaptcha_gate::observability::{logging, metrics};
use recaptcha_gate::verify::Endpoint;
use recaptcha_gate::{ClientRegistry, VerificationRequest};

#[derive(Parser)]
#[command(name = "recaptcha-gate")]
#[command(about = "Pooled reCAPTCHA verification client", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Verification endpoint (defaults to Google's siteverify)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a single response token
    Verify {
        /// Settings file (TOML, flat keys)
        #[arg(short, long)]
        settings: PathBuf,

        /// Token posted by the CAPTCHA widget
        #[arg(short, long)]
        token: String,

        /// Address of the user agent
        #[arg(long, default_value = "127.0.0.1")]
        remote_ip: String,

        /// Site secret; read from `siteSecret` when omitted
        #[arg(long)]
        secret: Option<String>,
    },
    /// Keep a client built from a watched settings file and report pool stats
    Watch {
        /// Settings file (TOML, flat keys)
        #[arg(short, long)]
        settings: PathBuf,

        /// Serve Prometheus metrics on this address
        #[arg(long)]
        metrics_address: Option<SocketAddr>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.json_logs);

    let mut registry = ClientRegistry::new();
    if let Some(raw) = &cli.endpoint {
        registry = registry.with_endpoint(Endpoint::parse(raw)?);
    }

    match cli.command {
        Commands::Verify {
            settings,
            token,
            remote_ip,
            secret,
        } => {
            let passed = run_verify(&registry, &settings, token, remote_ip, secret).await?;
            println!("{}", if passed { "passed" } else { "rejected" });
            if !passed {
                std::process::exit(1);
            }
        }
        Commands::Watch {
            settings,
            metrics_address,
        } => {
            if let Some(addr) = metrics_address {
                metrics::init_metrics(addr)?;
            }
            run_watch(&registry, &settings).await?;
        }
    }

    Ok(())
}

async fn run_verify(
    registry: &ClientRegistry,
    path: &Path,
    token: String,
    remote_ip: String,
    secret: Option<String>,
) -> Result<bool, Box<dyn Error>> {
    let settings = load_settings(path)?;
    let secret = match secret {
        Some(secret) => secret,
        None => {
            SiteCredentials::from_settings(&settings)
                .ok_or("settings file has no siteKey/siteSecret pair")?
                .site_secret
        }
    };

    let client = registry.get_or_create(&settings)?;
    Ok(client
        .verify(&VerificationRequest::new(token, remote_ip, secret))
        .await)
}

async fn run_watch(registry: &ClientRegistry, path: &Path) -> Result<(), Box<dyn Error>> {
    let settings = load_settings(path)?;
    registry.get_or_create(&settings)?;

    let (watcher, mut updates) = SettingsWatcher::new(path);
    let _watcher = watcher.starting_from(settings).run()?;

    loop {
        tokio::select! {
            Some(settings) = updates.recv() => {
                if let Err(e) = registry.get_or_create(&settings) {
                    tracing::warn!(error = %e, "Rejected settings update, keeping current client");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    if let Some(client) = registry.current() {
        client.pool().drain();
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
