use std::path::{Path, PathBuf};

use bugfix_server::config::CONFIG_FILE;

/// Resolve the workspace root the agent works in.
///
/// Priority:
/// 1. `--root` flag / `BUGFIX_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `bugfix.yaml`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_root_from(&cwd)
}

fn find_root_from(start: &Path) -> PathBuf {
    ancestor_with(start, |d| d.join(CONFIG_FILE).is_file())
        .or_else(|| ancestor_with(start, |d| d.join(".git").is_dir()))
        .unwrap_or_else(|| start.to_path_buf())
}

fn ancestor_with(start: &Path, probe: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    start.ancestors().find(|d| probe(d)).map(Path::to_path_buf)
}
