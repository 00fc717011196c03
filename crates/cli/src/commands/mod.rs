//! Subcommand implementations.

pub mod generate;
pub mod support;

use std::fs;
use std::path::Path;

use similar::TextDiff;
use tracing::debug;

/// Write `content` to `path`, or with `check`, compare instead and fail with a
/// unified diff when the file is missing or differs.
pub(crate) fn write_or_check(path: &Path, content: &str, check: bool) -> Result<(), String> {
    if check {
        let existing = match fs::read_to_string(path) {
            Ok(existing) => existing,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(format!("Failed to read {}: {err}", path.display())),
        };
        if existing == content {
            debug!(path = %path.display(), "Generated file is up to date.");
            return Ok(());
        }
        let name = path.display().to_string();
        let diff = TextDiff::from_lines(existing.as_str(), content)
            .unified_diff()
            .context_radius(3)
            .header(&format!("{name} (current)"), &format!("{name} (generated)"))
            .to_string();
        print!("{diff}");
        return Err(format!("{} is out of date", path.display()));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|err| format!("Failed to create {}: {err}", parent.display()))?;
    }
    fs::write(path, content).map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
    debug!(path = %path.display(), bytes = content.len(), "Wrote generated file.");
    Ok(())
}
