use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Method;

use failover_client::backend::NotificationKind;
use failover_client::client::{self, init_tracing};
use failover_client::{Config, Profile, RequestOptions, RequestRouter};

#[derive(Parser)]
#[command(name = "failover-client", version, about = "HTTP client with primary/backup failover")]
struct Cli {
    /// Config file (default: ~/.config/failover-client/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Runtime profile: development or production
    #[arg(long, short = 'p', global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a request through the failover router
    Request {
        /// Path relative to the active base URL
        endpoint: String,
        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// Request body
        #[arg(short = 'd', long)]
        data: Option<String>,
        /// Extra header as 'Name: value' (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Bearer token for the Authorization header
        #[arg(long)]
        bearer: Option<String>,
    },
    /// Show resolved endpoints and routing state
    Status,
    /// Probe both endpoints' health
    Probe,
    /// Clear the persisted failover flag
    Reset,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let profile = Profile::select(cli.profile.as_deref(), &config)?;
    config.apply_env_overrides(profile)?;
    config.validate()?;

    match cli.command {
        Command::Request {
            endpoint,
            method,
            data,
            headers,
            bearer,
        } => {
            let router = client::bootstrap(&config, profile).await?;
            announce_transitions(&router);

            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .with_context(|| format!("invalid method '{}'", method))?;
            let mut options = RequestOptions::new(method);
            for header in &headers {
                let (name, value) = header
                    .split_once(':')
                    .with_context(|| format!("header '{}' is not 'Name: value'", header))?;
                options = options.header(name.trim(), value.trim())?;
            }
            if let Some(data) = data {
                options = options.body(data);
            }
            if let Some(token) = bearer {
                options = options.bearer(token);
            }

            match router.issue(&endpoint, &options).await {
                Ok(response) => {
                    println!("{} {}", response.status, response.url);
                    println!("{}", response.text());
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("Request failed: {}", e);
                    Ok(ExitCode::from(1))
                }
            }
        }
        Command::Status => {
            let router = client::build(&config, profile)?;
            let state = router.state();
            let persisted = state
                .persisted_failover()
                .context("failed to read persisted routing state")?;
            println!("profile:   {}", profile);
            println!("primary:   {}", state.endpoints().primary);
            println!(
                "backup:    {}",
                if state.endpoints().has_backup() {
                    state.endpoints().backup.as_str()
                } else {
                    "<none>"
                }
            );
            println!("timeout:   {}ms", state.endpoints().timeout_ms);
            println!("persisted: {}", if persisted { "backup" } else { "primary" });
            Ok(ExitCode::SUCCESS)
        }
        Command::Probe => {
            let router = client::build(&config, profile)?;
            let endpoints = router.state().endpoints().clone();
            let (primary, backup) = tokio::join!(
                router.prober().check(&endpoints.primary),
                router.prober().check(&endpoints.backup)
            );
            println!("primary {} {}", endpoints.primary, health_label(primary));
            println!("backup  {} {}", endpoints.backup, health_label(backup));
            Ok(ExitCode::SUCCESS)
        }
        Command::Reset => {
            let router = client::build(&config, profile)?;
            router
                .state()
                .clear_persisted()
                .context("failed to clear persisted failover flag")?;
            println!("Persisted failover flag cleared");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn announce_transitions(router: &RequestRouter) {
    router.state().subscribe(|n| match n.kind {
        NotificationKind::Failover => eprintln!("! switched to backup {}", n.endpoint),
        NotificationKind::Restore => eprintln!("! restored primary {}", n.endpoint),
    });
}

fn health_label(healthy: bool) -> &'static str {
    if healthy {
        "healthy"
    } else {
        "unreachable"
    }
}
