#![forbid(unsafe_code)]
#![deny(warnings, unused_must_use, dead_code, missing_debug_implementations)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

//! Command-line front end for typed client generation.

use std::ffi::OsString;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub mod commands;
pub mod config;

/// Environment variable holding the log level or a full filter spec.
pub const LOG_ENV: &str = "TYPED_CLIENT_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "typed-client",
    version,
    about = "Generate typed Python HTTP clients from service descriptions"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a client module from a service description
    Generate(commands::generate::GenerateArgs),
    /// Write the shared support module
    Support(commands::support::SupportArgs),
}

/// Parse `args` (program name first) and run the selected command.
///
/// Returns the process exit code.
pub fn run_cli<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => {
            init_tracing();
            match cli.command {
                Some(Commands::Generate(args)) => commands::generate::run(args),
                Some(Commands::Support(args)) => commands::support::run(args),
                None => {
                    let mut cmd = Cli::command();
                    let _ = cmd.print_help();
                    println!();
                    0
                }
            }
        }
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

fn init_tracing() {
    // TYPED_CLIENT_LOG is either a plain level ("debug") applied to both
    // crates, or a full filter spec like "typed_client_core=trace"
    let filter = match std::env::var(LOG_ENV) {
        Ok(level) if is_plain_level(&level) => {
            format!("typed_client_cli={level},typed_client_core={level}")
        }
        Ok(spec) => spec,
        Err(_) => "typed_client_cli=info,typed_client_core=info".to_string(),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already initialized.");
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
