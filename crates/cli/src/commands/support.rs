//! `typed-client support`: write the shared support module.

use std::path::PathBuf;

use clap::Args;
use tracing::info;
use typed_client_core::support_module_source;

use super::write_or_check;

const DEFAULT_OUTPUT: &str = "typed_client_support.py";

/// Arguments of `typed-client support`.
#[derive(Args, Debug, Clone)]
pub struct SupportArgs {
    /// Where to write the support module
    #[arg(long = "output-path", short = 'o', value_name = "PATH", default_value = DEFAULT_OUTPUT)]
    pub output_path: PathBuf,
    /// Make `raise_if_not_default_status` default to True in `_request`
    #[arg(long)]
    pub raise_if_not_default_status: bool,
    /// Compare with the file on disk instead of writing; fail on drift
    #[arg(long)]
    pub check: bool,
}

/// Run the command, returning the process exit code.
pub fn run(args: SupportArgs) -> i32 {
    match run_inner(&args) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn run_inner(args: &SupportArgs) -> Result<(), String> {
    let source = support_module_source(args.raise_if_not_default_status)
        .map_err(|err| err.to_string())?;
    write_or_check(&args.output_path, &source, args.check)?;
    if !args.check {
        info!(path = %args.output_path.display(), "Wrote support module.");
        println!("Wrote support module -> {}", args.output_path.display());
    }
    Ok(())
}
