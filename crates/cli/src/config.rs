//! Generation settings read from TOML.
//!
//! Settings live under `[tool.typed-client]` in `pyproject.toml`, or at the
//! top level of a file passed with `--config`. Keys are kebab-case:
//!
//! ```toml
//! [tool.typed-client]
//! output-path = "client/api.py"
//! title = "Birthday App"
//! async = true
//! import-barrier = ["birthday_app"]
//! import-client-base = true
//! support-module = "client.support"
//! raise-if-not-default-status = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

/// Values from a config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    /// Where the client module is written
    pub output_path: Option<PathBuf>,
    /// Client title
    pub title: Option<String>,
    /// Async methods
    #[serde(rename = "async")]
    pub use_async: Option<bool>,
    /// Import barriers
    #[serde(default)]
    pub import_barrier: Vec<String>,
    /// Import support definitions from a shared module
    pub import_client_base: Option<bool>,
    /// Dotted path of the shared support module
    pub support_module: Option<String>,
    /// Default of `raise_if_not_default_status`
    pub raise_if_not_default_status: Option<bool>,
}

/// Load settings from `explicit`, or from `dir/pyproject.toml` when present.
///
/// A pyproject without a `[tool.typed-client]` table yields the defaults; an
/// explicit file must exist.
pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<FileConfig, String> {
    if let Some(path) = explicit {
        let contents = fs::read_to_string(path)
            .map_err(|err| format!("Failed to read config {}: {err}", path.display()))?;
        let value = parse(&contents, path)?;
        return from_table(value, path);
    }

    let pyproject = dir.join("pyproject.toml");
    if !pyproject.exists() {
        return Ok(FileConfig::default());
    }
    let contents = fs::read_to_string(&pyproject)
        .map_err(|err| format!("Failed to read {}: {err}", pyproject.display()))?;
    let value = parse(&contents, &pyproject)?;
    match value.get("tool").and_then(|tool| tool.get("typed-client")) {
        Some(section) => from_table(section.clone(), &pyproject),
        None => {
            debug!(path = %pyproject.display(), "No [tool.typed-client] section.");
            Ok(FileConfig::default())
        }
    }
}

fn parse(contents: &str, path: &Path) -> Result<toml::Value, String> {
    contents
        .parse()
        .map_err(|err| format!("Failed to parse {}: {err}", path.display()))
}

fn from_table(value: toml::Value, path: &Path) -> Result<FileConfig, String> {
    let config: FileConfig = value
        .try_into()
        .map_err(|err| format!("Invalid typed-client settings in {}: {err}", path.display()))?;
    debug!(path = %path.display(), ?config, "Loaded settings.");
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pyproject_section() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            r#"
[project]
name = "demo"

[tool.typed-client]
output-path = "client.py"
async = true
import-barrier = ["app", "app.models"]
raise-if-not-default-status = true
"#,
        )
        .unwrap();
        let config = load(None, dir.path()).unwrap();
        assert_eq!(config.output_path, Some(PathBuf::from("client.py")));
        assert_eq!(config.use_async, Some(true));
        assert_eq!(config.import_barrier, vec!["app", "app.models"]);
        assert_eq!(config.raise_if_not_default_status, Some(true));
        assert_eq!(config.title, None);
    }

    #[test]
    fn test_missing_pyproject_or_section() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load(None, dir.path()).unwrap(), FileConfig::default());
        fs::write(dir.path().join("pyproject.toml"), "[project]\nname = \"demo\"\n").unwrap();
        assert_eq!(load(None, dir.path()).unwrap(), FileConfig::default());
    }

    #[test]
    fn test_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("typed-client.toml");
        fs::write(&path, "title = \"Pets\"\nimport-client-base = true\n").unwrap();
        let config = load(Some(&path), Path::new("/nonexistent")).unwrap();
        assert_eq!(config.title.as_deref(), Some("Pets"));
        assert_eq!(config.import_client_base, Some(true));

        assert!(load(Some(&dir.path().join("missing.toml")), dir.path()).is_err());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("typed-client.toml");
        fs::write(&path, "output = \"x.py\"\n").unwrap();
        let err = load(Some(&path), dir.path()).unwrap_err();
        assert!(err.contains("Invalid typed-client settings"));
    }
}
