// SPDX-FileCopyrightText: 2026 Unito Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unito - command-line client for the Unito property-management portal.

mod contract;
mod login;
mod request;
mod status;
mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use unito_billing::PortalContext;
use unito_core::UnitoError;

/// Unito - command-line client for the property-management portal.
#[derive(Parser, Debug)]
#[command(name = "unito", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the usual locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and store the session credentials.
    Login {
        /// Account email address.
        #[arg(long)]
        email: String,
    },
    /// Drop the stored session credentials.
    Logout,
    /// Show subscription, contract and lock state.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Service contract commands.
    Contract {
        #[command(subcommand)]
        action: ContractCommand,
    },
    /// Send an authenticated request through the gateway.
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE).
        method: String,
        /// Endpoint path relative to the API root, e.g. /auth/profile/.
        endpoint: String,
        /// JSON request body.
        #[arg(long)]
        data: Option<String>,
    },
    /// Keep polling the subscription status until interrupted.
    Watch,
}

#[derive(Subcommand, Debug)]
enum ContractCommand {
    /// Show the current contract.
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Print the agreement text.
    Template,
    /// Sign the agreement.
    Sign {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Download all data held for this account as JSON.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Request cancellation, starting the notice period.
    Cancel {
        /// Reason recorded with the request.
        #[arg(long)]
        reason: Option<String>,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => unito_config::load_and_validate_path(path),
        None => unito_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            unito_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.client.log_level);

    let portal = match PortalContext::open(config).await {
        Ok(portal) => portal,
        Err(e) => {
            eprintln!("unito: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, &portal).await {
        eprintln!("unito: {e}");
        if e.is_session_expired() {
            eprintln!("Run `unito login --email <EMAIL>` to start a new session.");
        }
        std::process::exit(1);
    }
}

async fn run(command: Commands, portal: &PortalContext) -> Result<(), UnitoError> {
    match command {
        Commands::Login { email } => login::run_login(portal, &email).await,
        Commands::Logout => {
            login::run_logout(portal).await;
            Ok(())
        }
        Commands::Status { json, plain } => status::run_status(portal, json, plain).await,
        Commands::Contract { action } => match action {
            ContractCommand::Show { json } => contract::run_show(portal, json).await,
            ContractCommand::Template => contract::run_template(portal).await,
            ContractCommand::Sign { yes } => contract::run_sign(portal, yes).await,
            ContractCommand::Export { out } => contract::run_export(portal, out.as_deref()).await,
            ContractCommand::Cancel { reason, yes } => {
                contract::run_cancel(portal, reason.as_deref(), yes).await
            }
        },
        Commands::Request {
            method,
            endpoint,
            data,
        } => request::run_request(portal, &method, &endpoint, data.as_deref()).await,
        Commands::Watch => watch::run_watch(portal).await,
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("unito={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
