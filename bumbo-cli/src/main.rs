//! bumbo: timestamp-driven retrieve / merge / deploy for org projects.
//!
//! # Usage
//!
//! ```text
//! bumbo init [--project-dir <dir>]
//! bumbo retrieve -f ApexClass:Foo,Bar [-f LightningComponentBundle:card] [--json]
//! bumbo deploy   -f ApexClass:Foo [--target-org <alias>] [--json]
//! ```

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use bumbo_core::CoreError;
use bumbo_sync::SyncError;
use commands::{init::InitArgs, session::SessionArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "bumbo",
    version,
    about = "Retrieve, merge and deploy metadata components using timestamps",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Prepare the project: .forceignore globs and the .bumbo directory.
    Init(InitArgs),

    /// Retrieve components changed remotely and merge them into local files.
    Retrieve(SessionArgs),

    /// Retrieve and merge like `retrieve`, then deploy accepted components.
    Deploy(SessionArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Retrieve(args) => args.run(bumbo_sync::Flow::Retrieve),
        Commands::Deploy(args) => args.run(bumbo_sync::Flow::Deploy),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// `error[<code>]: <message>` for library errors, plain `error: ...` otherwise.
fn report(err: &anyhow::Error) {
    let code = err
        .chain()
        .find_map(|cause| {
            cause
                .downcast_ref::<SyncError>()
                .map(SyncError::code)
                .or_else(|| cause.downcast_ref::<CoreError>().map(CoreError::code))
        });
    match code {
        Some(code) => eprintln!("{}: {err:#}", format!("error[{code}]").red().bold()),
        None => eprintln!("{}: {err:#}", "error".red().bold()),
    }
}
