use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use futures::{Stream, StreamExt};

use crate::types::{Message, PermissionMode, QueryOptions, ResultMessage};
use crate::{query, ClaudeAgentError, Result};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const READ_ONLY_TOOLS: &[&str] = &["Read", "Glob", "Grep", "LS"];
const MUTATING_TOOLS: &[&str] = &["Edit", "MultiEdit", "Write", "Bash"];

// ─── ToolAccess ───────────────────────────────────────────────────────────

/// Which built-in tools are registered with the agent for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolAccess {
    /// File reading, directory listing and search only. Mutating tools are
    /// explicitly disallowed.
    ReadOnly,
    /// Read-only tools plus edit, write and shell.
    Full,
}

impl ToolAccess {
    pub fn allowed_tools(self) -> Vec<String> {
        let tools: Vec<&str> = match self {
            ToolAccess::ReadOnly => READ_ONLY_TOOLS.to_vec(),
            ToolAccess::Full => READ_ONLY_TOOLS.iter().chain(MUTATING_TOOLS).copied().collect(),
        };
        tools.into_iter().map(String::from).collect()
    }

    pub fn disallowed_tools(self) -> Vec<String> {
        match self {
            ToolAccess::ReadOnly => MUTATING_TOOLS.iter().map(|t| t.to_string()).collect(),
            ToolAccess::Full => Vec::new(),
        }
    }

    fn permission_mode(self) -> PermissionMode {
        match self {
            ToolAccess::ReadOnly => PermissionMode::DontAsk,
            ToolAccess::Full => PermissionMode::AcceptEdits,
        }
    }
}

// ─── AgentConfig ──────────────────────────────────────────────────────────

/// Everything needed to construct the agent once at startup.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Model provider credential, forwarded as `ANTHROPIC_API_KEY`.
    pub api_key: String,
    pub model: String,
    /// Custom instructions appended to the agent's system prompt.
    pub instructions: Option<String>,
    /// Keep conversation history on disk between tasks.
    pub persist_history: bool,
    /// Agent working directory; tools resolve relative paths against it.
    pub cwd: Option<PathBuf>,
    /// Path to the agent binary (default: `claude` on `PATH`).
    pub executable: Option<String>,
    pub max_turns: Option<u32>,
    /// Upper bound on one task. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl AgentConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            instructions: None,
            persist_history: false,
            cwd: None,
            executable: None,
            max_turns: None,
            timeout: None,
        }
    }
}

// ─── Dispatcher ───────────────────────────────────────────────────────────

/// Long-lived handle to the external agent.
///
/// Built once at process start and shared by every request. Holds no
/// per-task state; each [`dispatch`](Dispatcher::dispatch) spawns its own
/// subprocess.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: AgentConfig,
}

impl Dispatcher {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    /// Subprocess options for one task with the given tool access.
    pub fn options(&self, access: ToolAccess) -> QueryOptions {
        let mut env = HashMap::new();
        env.insert("ANTHROPIC_API_KEY".to_string(), self.config.api_key.clone());

        QueryOptions {
            model: Some(self.config.model.clone()),
            max_turns: self.config.max_turns,
            allowed_tools: access.allowed_tools(),
            disallowed_tools: access.disallowed_tools(),
            permission_mode: access.permission_mode(),
            append_system_prompt: self.config.instructions.clone(),
            cwd: self.config.cwd.clone(),
            env,
            path_to_executable: self.config.executable.clone(),
            no_session_persistence: !self.config.persist_history,
        }
    }

    /// Run one task instruction to completion and return the agent's text.
    ///
    /// Dropping the returned future kills the agent subprocess.
    pub async fn dispatch(&self, instruction: &str, access: ToolAccess) -> Result<String> {
        if instruction.trim().is_empty() {
            return Err(ClaudeAgentError::EmptyPrompt);
        }

        let stream = query(instruction, self.options(access));
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, collect_text(stream))
                .await
                .map_err(|_| ClaudeAgentError::Timeout(limit.as_secs()))?,
            None => collect_text(stream).await,
        }
    }
}

// ─── Fold ─────────────────────────────────────────────────────────────────

/// Fold an event stream into the task result.
///
/// Every `text` block of every assistant event is appended in arrival
/// order; all other events are ignored. A successful terminal event yields
/// the trimmed text. A terminal error event, a stream error, or a stream
/// that ends without a terminal event fails the task.
pub async fn collect_text<S>(stream: S) -> Result<String>
where
    S: Stream<Item = Result<Message>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut output = String::new();

    while let Some(msg) = stream.next().await {
        let msg = msg?;
        tracing::debug!(kind = msg.kind(), session = msg.session_id(), "agent event");
        match msg {
            Message::Assistant(m) => m.text_fragments().for_each(|t| output.push_str(t)),
            Message::Result(ResultMessage::Success(r)) => {
                tracing::info!(
                    session = %r.session_id,
                    turns = r.num_turns,
                    cost_usd = r.total_cost_usd,
                    "agent task complete"
                );
                return Ok(output.trim().to_string());
            }
            Message::Result(r) => {
                let detail = if r.errors().is_empty() {
                    format!("stopped after {} turns", r.num_turns())
                } else {
                    r.errors().join("; ")
                };
                return Err(ClaudeAgentError::Execution {
                    subtype: r.subtype().to_string(),
                    detail,
                });
            }
            _ => {}
        }
    }

    Err(ClaudeAgentError::Process(
        "stream ended without a result message".into(),
    ))
}

// ─── Tests ────────────────────────────────────────────────────────────────
