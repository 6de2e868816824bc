use anyhow::Result;
use bugfix_server::config::{self, ServerConfig, API_KEY_ENV};
use std::path::Path;

/// Print the settings `serve` would use. The credential is only reported as
/// present or missing.
pub fn run(root: &Path, config_path: Option<&Path>, model: Option<String>) -> Result<()> {
    let file = super::load_file_config(root, config_path)?;
    super::load_dotenv(root);
    let api_key = config::require_env(API_KEY_ENV).ok();
    let key_state = if api_key.is_some() { "set" } else { "missing" };

    let agent = config::agent_config(root, &file, api_key.unwrap_or_default(), model)?;
    let server = ServerConfig::from_file(root, &file);

    let out = serde_json::json!({
        "server": server,
        "agent": {
            "model": agent.model,
            "executable": agent.executable.as_deref().unwrap_or("claude"),
            "max_turns": agent.max_turns,
            "task_timeout_secs": agent.timeout.map(|t| t.as_secs()),
            "persist_history": agent.persist_history,
            "instructions_chars": agent.instructions.as_deref().map(str::len).unwrap_or(0),
        },
        API_KEY_ENV: key_state,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
