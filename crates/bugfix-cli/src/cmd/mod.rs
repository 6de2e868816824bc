pub mod config;
pub mod serve;

use anyhow::Result;
use bugfix_server::config::FileConfig;
use std::path::{Path, PathBuf};

/// Environment file read from the workspace root at startup.
pub const DOTENV_FILE: &str = ".env";

/// Anchor a relative `--config` path to the directory the command was run
/// from, so it means the same file before and after `serve` changes into
/// the workspace.
pub fn resolve_config_path(cwd: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(|p| cwd.join(p))
}

/// Load the settings file: an explicit `--config` path must exist, the
/// workspace default is optional.
pub fn load_file_config(root: &Path, explicit: Option<&Path>) -> Result<FileConfig> {
    let file = match explicit {
        Some(path) => FileConfig::load_from(path, false)?,
        None => FileConfig::load(root)?,
    };
    Ok(file)
}

/// Load `<root>/.env` into the process environment. Variables that are
/// already set keep their value. Returns the file path when one was loaded.
pub fn load_dotenv(root: &Path) -> Option<PathBuf> {
    let path = root.join(DOTENV_FILE);
    match dotenvy::from_path(&path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "loaded environment file");
            Some(path)
        }
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to load environment file");
            None
        }
    }
}
