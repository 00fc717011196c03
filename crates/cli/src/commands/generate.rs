//! `typed-client generate`: render a client module from a service description.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::{debug, info};
use typed_client_core::utils::to_snake_case;
use typed_client_core::{CallingConvention, DEFAULT_SUPPORT_MODULE, GenerateOptions, generate_from_json};

use super::write_or_check;
use crate::config::{self, FileConfig};

/// Arguments of `typed-client generate`.
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Service description JSON file, `-` for stdin
    #[arg(value_name = "DESCRIPTION")]
    pub description: PathBuf,
    /// Where to write the client module
    #[arg(long = "output-path", short = 'o', value_name = "PATH")]
    pub output_path: Option<PathBuf>,
    /// Client title, overriding the description's
    #[arg(long)]
    pub title: Option<String>,
    /// Generate `async def` methods on `httpx.AsyncClient`
    #[arg(long = "async", overrides_with = "no_async")]
    pub use_async: bool,
    /// Generate blocking methods even when the settings file enables async
    #[arg(long = "no-async", overrides_with = "use_async")]
    pub no_async: bool,
    /// Import types relative to this module path (repeatable)
    #[arg(long = "import-barrier", value_name = "MODULE")]
    pub import_barriers: Vec<String>,
    /// Import support definitions from the shared support module
    #[arg(long, overrides_with = "no_import_client_base")]
    pub import_client_base: bool,
    /// Inline support definitions even when the settings file says otherwise
    #[arg(long, overrides_with = "import_client_base")]
    pub no_import_client_base: bool,
    /// Dotted path of the shared support module
    #[arg(long, value_name = "MODULE")]
    pub support_module: Option<String>,
    /// Make `raise_if_not_default_status` default to True
    #[arg(long, overrides_with = "no_raise_if_not_default_status")]
    pub raise_if_not_default_status: bool,
    /// Keep `raise_if_not_default_status` defaulting to False
    #[arg(long, overrides_with = "raise_if_not_default_status")]
    pub no_raise_if_not_default_status: bool,
    /// Compare with the file on disk instead of writing; fail on drift
    #[arg(long)]
    pub check: bool,
    /// Settings file; defaults to `[tool.typed-client]` in ./pyproject.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Run the command, returning the process exit code.
pub fn run(args: GenerateArgs) -> i32 {
    match run_inner(&args) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn run_inner(args: &GenerateArgs) -> Result<(), String> {
    let cwd = std::env::current_dir()
        .map_err(|err| format!("Failed to resolve current directory: {err}"))?;
    let file = config::load(args.config.as_deref(), &cwd)?;
    let (options, output_path) = resolve(args, file);

    let json = read_description(&args.description)?;
    let client = generate_from_json(&json, &options).map_err(|err| err.to_string())?;
    let output_path =
        output_path.unwrap_or_else(|| PathBuf::from(format!("{}.py", to_snake_case(&client.class_name))));

    write_or_check(&output_path, &client.source, args.check)?;
    if !args.check {
        info!(
            class = %client.class_name,
            path = %output_path.display(),
            warnings = client.warnings.len(),
            "Generated client."
        );
        println!("Generated {} -> {}", client.class_name, output_path.display());
    }
    Ok(())
}

/// Merge flags over file settings; flags win.
fn resolve(args: &GenerateArgs, file: FileConfig) -> (GenerateOptions, Option<PathBuf>) {
    let use_async = switch(args.use_async, args.no_async)
        .or(file.use_async)
        .unwrap_or(false);
    let convention = if use_async {
        CallingConvention::Async
    } else {
        CallingConvention::Blocking
    };
    let import_barriers = if args.import_barriers.is_empty() {
        file.import_barrier
    } else {
        args.import_barriers.clone()
    };
    let options = GenerateOptions {
        title: args.title.clone().or(file.title),
        convention,
        import_barriers,
        import_client_base: switch(args.import_client_base, args.no_import_client_base)
            .or(file.import_client_base)
            .unwrap_or(false),
        support_module: args
            .support_module
            .clone()
            .or(file.support_module)
            .unwrap_or_else(|| DEFAULT_SUPPORT_MODULE.to_string()),
        raise_if_not_default_status: switch(
            args.raise_if_not_default_status,
            args.no_raise_if_not_default_status,
        )
        .or(file.raise_if_not_default_status)
        .unwrap_or(false),
    };
    debug!(?options, "Resolved generation options.");
    (options, args.output_path.clone().or(file.output_path))
}

/// A `--x` / `--no-x` pair; `None` when neither was given.
fn switch(on: bool, off: bool) -> Option<bool> {
    if on {
        Some(true)
    } else if off {
        Some(false)
    } else {
        None
    }
}

fn read_description(path: &Path) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut json = String::new();
        std::io::stdin()
            .read_to_string(&mut json)
            .map_err(|err| format!("Failed to read description from stdin: {err}"))?;
        return Ok(json);
    }
    fs::read_to_string(path)
        .map_err(|err| format!("Failed to read description {}: {err}", path.display()))
}
