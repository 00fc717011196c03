//! `typed-client` command-line entry point.

fn main() {
    std::process::exit(typed_client_cli::run_cli(std::env::args_os()));
}
