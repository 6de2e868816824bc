use claude_agent::{AgentConfig, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Optional per-workspace settings file.
pub const CONFIG_FILE: &str = "bugfix.yaml";
/// Custom instructions looked up in the workspace when none are configured.
pub const DEFAULT_INSTRUCTIONS_FILE: &str = "prompt.md";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_REPORT_PATH: &str = "./bugfix-report.md";
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_BRANCH: &str = "bugfix/auto-fix";
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const BUILTIN_INSTRUCTIONS: &str = include_str!("../../../prompts/instructions.md");

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("env {0} is not set")]
    MissingEnv(&'static str),

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

// ---------------------------------------------------------------------------
// FileConfig: bugfix.yaml
// ---------------------------------------------------------------------------

/// Contents of `bugfix.yaml`. Every field is optional; absent fields fall
/// back to the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub model: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub report_path: Option<String>,
    pub public_dir: Option<PathBuf>,
    pub instructions: Option<PathBuf>,
    pub branch: Option<String>,
    pub max_turns: Option<u32>,
    pub task_timeout_secs: Option<u64>,
    pub claude_path: Option<String>,
}

impl FileConfig {
    /// Load `<root>/bugfix.yaml`, or the defaults when the file is absent.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        Self::load_from(&root.join(CONFIG_FILE), true)
    }

    /// Load an explicit config path. A missing file is an error unless
    /// `optional` is set.
    pub fn load_from(path: &Path, optional: bool) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if optional && e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default())
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// ServerConfig: resolved settings for the HTTP layer
// ---------------------------------------------------------------------------

/// Resolved settings for the router. Relative paths are resolved against
/// `root`, which is also the agent's working directory.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub root: PathBuf,
    pub log_dir: PathBuf,
    /// Report path as reported to clients and handed to the agent.
    pub report_path: String,
    pub public_dir: PathBuf,
    pub branch: String,
}

impl ServerConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_file(root, &FileConfig::default())
    }

    pub fn from_file(root: impl Into<PathBuf>, file: &FileConfig) -> Self {
        Self {
            root: root.into(),
            log_dir: file
                .log_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            report_path: file
                .report_path
                .clone()
                .unwrap_or_else(|| DEFAULT_REPORT_PATH.to_string()),
            public_dir: file
                .public_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_DIR)),
            branch: file
                .branch
                .clone()
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
        }
    }

    pub fn public_path(&self, asset: &str) -> PathBuf {
        self.root.join(&self.public_dir).join(asset)
    }
}

// ---------------------------------------------------------------------------
// Agent settings
// ---------------------------------------------------------------------------

/// Read a required, non-empty environment variable.
pub fn require_env(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingEnv(name))
}

/// Custom instructions for the agent.
///
/// An explicitly configured file must exist. Otherwise `<root>/prompt.md` is
/// used when present, and the bundled instructions when not.
pub fn load_instructions(root: &Path, configured: Option<&Path>) -> Result<String, ConfigError> {
    let read = |path: PathBuf| {
        std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })
    };
    if let Some(p) = configured {
        return read(root.join(p));
    }
    let default = root.join(DEFAULT_INSTRUCTIONS_FILE);
    if default.is_file() {
        read(default)
    } else {
        Ok(BUILTIN_INSTRUCTIONS.to_string())
    }
}

/// Build the agent configuration from the file settings.
///
/// `model` overrides `file.model`; history is never persisted.
pub fn agent_config(
    root: &Path,
    file: &FileConfig,
    api_key: String,
    model: Option<String>,
) -> Result<AgentConfig, ConfigError> {
    let model = model
        .or_else(|| file.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let mut config = AgentConfig::new(api_key, model);
    config.instructions = Some(load_instructions(root, file.instructions.as_deref())?);
    config.persist_history = false;
    config.cwd = Some(root.to_path_buf());
    config.executable = file.claude_path.clone();
    config.max_turns = file.max_turns;
    config.timeout = file.task_timeout_secs.map(Duration::from_secs);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let file = FileConfig::load(dir.path()).unwrap();
        assert_eq!(file, FileConfig::default());
        let config = ServerConfig::from_file(dir.path(), &file);
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.report_path, "./bugfix-report.md");
        assert_eq!(config.branch, DEFAULT_BRANCH);
    }

    #[test]
    fn explicit_config_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = FileConfig::load_from(&dir.path().join("other.yaml"), false).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn yaml_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "model: claude-opus-4-1\nbranch: fix/log-triage\nlog_dir: uploads\nmax_turns: 30\n",
        )
        .unwrap();
        let file = FileConfig::load(dir.path()).unwrap();
        assert_eq!(file.max_turns, Some(30));
        let config = ServerConfig::from_file(dir.path(), &file);
        assert_eq!(config.branch, "fix/log-triage");
        assert_eq!(config.log_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "modle: typo\n").unwrap();
        let err = FileConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn instructions_prefer_workspace_prompt() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            load_instructions(dir.path(), None).unwrap(),
            BUILTIN_INSTRUCTIONS
        );
        std::fs::write(dir.path().join("prompt.md"), "custom steps").unwrap();
        assert_eq!(load_instructions(dir.path(), None).unwrap(), "custom steps");
    }

    #[test]
    fn configured_instructions_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = load_instructions(dir.path(), Some(Path::new("missing.md"))).unwrap_err();
        assert!(err.to_string().contains("missing.md"));
    }

    #[test]
    fn read_error_reports_its_cause_once() {
        let dir = TempDir::new().unwrap();
        let err = FileConfig::load_from(&dir.path().join("absent.yaml"), false).unwrap_err();
        assert!(!err.to_string().contains("os error"));

        let chain = format!("{:#}", anyhow::Error::from(err));
        assert_eq!(chain.matches("os error").count(), 1, "{chain}");
    }

    #[test]
    fn flag_model_beats_file_model() {
        let dir = TempDir::new().unwrap();
        let file = FileConfig {
            model: Some("from-file".into()),
            task_timeout_secs: Some(90),
            ..Default::default()
        };
        let config = agent_config(dir.path(), &file, "sk".into(), Some("from-flag".into())).unwrap();
        assert_eq!(config.model, "from-flag");
        assert_eq!(config.timeout, Some(Duration::from_secs(90)));
        assert!(!config.persist_history);

        let config = agent_config(dir.path(), &FileConfig::default(), "sk".into(), None).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
    }
}
