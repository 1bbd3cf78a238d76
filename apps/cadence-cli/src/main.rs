//! # cadence-cli
//!
//! Command-line interface for the Cadence access-control core.
//!
//! - `cadence deny/allow <user> <action>`: change a user's denials,
//!   optionally `--by` an authorizer holding control over them
//! - `cadence denials <user>`: list a user's current denials
//! - `cadence control grant/revoke/list`: manage delegated control
//! - `cadence check action/control`: run a guard assertion

mod commands;

use std::path::PathBuf;

use cadence_authz::{Action, Authorizing, AuthzConfig, UserId};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::Output;

/// Cadence CLI: inspect and change who may do what.
#[derive(Parser)]
#[command(name = "cadence", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".", global = true)]
    project_root: PathBuf,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forbid an action for a user.
    Deny {
        user: UserId,
        action: Action,
        /// Act as this authorizer; requires control over the user.
        #[arg(long)]
        by: Option<UserId>,
    },
    /// Permit a previously denied action.
    Allow {
        user: UserId,
        action: Action,
        /// Act as this authorizer; requires control over the user.
        #[arg(long)]
        by: Option<UserId>,
    },
    /// List a user's current denials.
    Denials { user: UserId },
    /// Manage delegated control.
    Control {
        #[command(subcommand)]
        command: commands::control::ControlCommands,
    },
    /// Run a guard assertion; exits non-zero when it fails.
    Check {
        #[command(subcommand)]
        command: commands::check::CheckCommands,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interfere with JSON on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("cadence_authz=info".parse()?)
                .add_directive("cadence=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let config = AuthzConfig::load(&project_root)?;
    tracing::debug!(db = %config.database_path.display(), "using authorization store");

    let authz = Authorizing::open(&config)?;
    let out = Output::new(cli.json);

    match &cli.command {
        Commands::Deny { user, action, by } => {
            commands::denial::deny(&authz, &out, user, *action, by.as_ref())
        }
        Commands::Allow { user, action, by } => {
            commands::denial::allow(&authz, &out, user, *action, by.as_ref())
        }
        Commands::Denials { user } => commands::denial::list(&authz, &out, user),
        Commands::Control { command } => commands::control::execute(command, &authz, &out),
        Commands::Check { command } => commands::check::execute(command, &authz, &out),
    }
}
