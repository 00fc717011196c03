//! End-to-end tests for the `typed-client` command line.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use typed_client_cli::run_cli;

const DESCRIPTION: &str = r#"{
    "title": "Birthday App",
    "endpoints": [{
        "name": "get_birthday",
        "path": "/birthday/{name}",
        "methods": ["GET"],
        "response_model": {"kind": "named", "module": "birthday_app", "name": "BirthdayData"},
        "responses": [{"status": 404, "model": {"kind": "named", "module": "birthday_app", "name": "GetBirthdayError"}}],
        "parameters": [{"name": "name", "in": "path", "type": {"kind": "builtin", "name": "str"}}]
    }]
}"#;

fn write_description(dir: &Path) -> String {
    let path = dir.join("api.json");
    fs::write(&path, DESCRIPTION).unwrap();
    path.display().to_string()
}

fn run(args: &[&str]) -> i32 {
    let mut argv = vec!["typed-client"];
    argv.extend_from_slice(args);
    run_cli(argv)
}

#[test]
fn test_generate_writes_client() {
    let dir = TempDir::new().unwrap();
    let description = write_description(dir.path());
    let output = dir.path().join("out").join("client.py");
    let output_arg = output.display().to_string();

    assert_eq!(run(&["generate", &description, "--output-path", &output_arg]), 0);

    let source = fs::read_to_string(&output).unwrap();
    assert!(source.contains("class BirthdayAppClient(ClientBase):"));
    assert!(source.contains("    def get_birthday(\n"));
    assert!(source.contains("from birthday_app import BirthdayData, GetBirthdayError\n"));
}

#[test]
fn test_check_detects_drift() {
    let dir = TempDir::new().unwrap();
    let description = write_description(dir.path());
    let output = dir.path().join("client.py");
    let output_arg = output.display().to_string();

    assert_eq!(run(&["generate", &description, "-o", &output_arg, "--check"]), 1);
    assert!(!output.exists());

    assert_eq!(run(&["generate", &description, "-o", &output_arg]), 0);
    assert_eq!(run(&["generate", &description, "-o", &output_arg, "--check"]), 0);

    fs::write(&output, "# edited\n").unwrap();
    assert_eq!(run(&["generate", &description, "-o", &output_arg, "--check"]), 1);
    assert_eq!(fs::read_to_string(&output).unwrap(), "# edited\n");
}

#[test]
fn test_failed_translation_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let description = dir.path().join("bad.json");
    fs::write(
        &description,
        r#"{"endpoints": [{"name": "both", "path": "/x", "methods": ["GET", "POST"]}]}"#,
    )
    .unwrap();
    let output = dir.path().join("client.py");

    let code = run(&[
        "generate",
        &description.display().to_string(),
        "-o",
        &output.display().to_string(),
    ]);
    assert_eq!(code, 1);
    assert!(!output.exists());

    assert_eq!(run(&["generate", "/definitely/missing.json", "-o", "x.py"]), 1);
}

#[test]
fn test_config_file_settings() {
    let dir = TempDir::new().unwrap();
    let description = write_description(dir.path());
    let output = dir.path().join("pets.py");
    let config = dir.path().join("typed-client.toml");
    fs::write(
        &config,
        format!(
            "output-path = {:?}\ntitle = \"Pets\"\nasync = true\nimport-client-base = true\n",
            output.display().to_string()
        ),
    )
    .unwrap();

    assert_eq!(
        run(&["generate", &description, "--config", &config.display().to_string()]),
        0
    );
    let source = fs::read_to_string(&output).unwrap();
    assert!(source.contains("class PetsClient(AsyncClientBase):"));
    assert!(source.contains("    async def get_birthday(\n"));
    assert!(source.contains("from typed_client_support import"));
    assert!(!source.contains("class ClientResult"));
}

#[test]
fn test_flags_switch_off_file_settings() {
    let dir = TempDir::new().unwrap();
    let description = write_description(dir.path());
    let output = dir.path().join("pets.py");
    let config = dir.path().join("typed-client.toml");
    fs::write(
        &config,
        "title = \"Pets\"\nasync = true\nimport-client-base = true\nraise-if-not-default-status = true\n",
    )
    .unwrap();
    let config_arg = config.display().to_string();
    let output_arg = output.display().to_string();

    let code = run(&[
        "generate",
        &description,
        "--config",
        &config_arg,
        "-o",
        &output_arg,
        "--no-async",
        "--no-import-client-base",
        "--no-raise-if-not-default-status",
    ]);
    assert_eq!(code, 0);
    let source = fs::read_to_string(&output).unwrap();
    assert!(source.contains("class PetsClient(ClientBase):"));
    assert!(source.contains("    def get_birthday(\n"));
    assert!(!source.contains("async def get_birthday("));
    assert!(source.contains("class ClientResult"));
    assert!(source.contains("raise_if_not_default_status: bool = False,"));

    let code = run(&[
        "generate",
        &description,
        "--config",
        &config_arg,
        "-o",
        &output_arg,
        "--no-async",
        "--async",
    ]);
    assert_eq!(code, 0);
    let source = fs::read_to_string(&output).unwrap();
    assert!(source.contains("class PetsClient(AsyncClientBase):"));
    assert!(source.contains("raise_if_not_default_status: bool = True,"));
}

#[test]
fn test_support_command() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("support.py");
    let output_arg = output.display().to_string();

    assert_eq!(run(&["support", "--output-path", &output_arg]), 0);
    let source = fs::read_to_string(&output).unwrap();
    assert!(source.contains("class ClientBase:"));
    assert!(source.contains("class AsyncClientBase:"));
    assert_eq!(run(&["support", "--output-path", &output_arg, "--check"]), 0);
}
