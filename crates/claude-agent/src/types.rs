use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

// ─── Event enum ───────────────────────────────────────────────────────────

/// One event from `claude --output-format stream-json`, discriminated by the
/// JSON `"type"` field.
///
/// Only the kinds the dispatcher reasons about are modelled. Lines with any
/// other `"type"` (`stream_event`, `rate_limit_event`, …) are skipped by the
/// process reader before they reach this enum.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    System(SystemMessage),
    Assistant(AssistantMessage),
    User(UserMessage),
    Result(ResultMessage),
    ToolProgress(ToolProgressMessage),
}

impl Message {
    pub fn session_id(&self) -> &str {
        match self {
            Message::System(m) => &m.session_id,
            Message::Assistant(m) => &m.session_id,
            Message::User(m) => &m.session_id,
            Message::Result(m) => m.session_id(),
            Message::ToolProgress(m) => &m.session_id,
        }
    }

    /// Short label used in debug logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::System(_) => "system",
            Message::Assistant(_) => "assistant",
            Message::User(_) => "user",
            Message::Result(_) => "result",
            Message::ToolProgress(_) => "tool_progress",
        }
    }
}

// ─── System ───────────────────────────────────────────────────────────────

/// `type = "system"`: further distinguished by `subtype`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemMessage {
    pub session_id: String,
    #[serde(flatten)]
    pub payload: SystemPayload,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum SystemPayload {
    /// First event of a task: model, registered tools, working directory.
    Init(SystemInit),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemInit {
    pub model: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub cwd: String,
    #[serde(default, alias = "permissionMode")]
    pub permission_mode: Option<String>,
}

// ─── Assistant ────────────────────────────────────────────────────────────

/// `type = "assistant"`: one model turn with its content blocks.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantMessage {
    pub message: AssistantContent,
    #[serde(default)]
    pub parent_tool_use_id: Option<String>,
    pub session_id: String,
}

impl AssistantMessage {
    /// The `text` blocks of this turn, in emission order.
    pub fn text_fragments(&self) -> impl Iterator<Item = &str> {
        self.message.content.iter().filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantContent {
    #[serde(default)]
    pub id: String,
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        /// Tool inputs vary per tool.
        input: serde_json::Value,
    },
    Thinking {
        thinking: String,
    },
    #[serde(other)]
    Other,
}

// ─── User (tool results) ──────────────────────────────────────────────────

/// `type = "user"`: tool results fed back to the model. Content is opaque
/// to the dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserMessage {
    pub message: serde_json::Value,
    #[serde(default)]
    pub parent_tool_use_id: Option<String>,
    pub session_id: String,
}

// ─── Result ───────────────────────────────────────────────────────────────

/// `type = "result"`: the terminal event of every task.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum ResultMessage {
    Success(ResultSuccess),
    ErrorDuringExecution(ResultError),
    ErrorMaxTurns(ResultError),
    ErrorMaxBudgetUsd(ResultError),
}

impl ResultMessage {
    pub fn session_id(&self) -> &str {
        match self {
            ResultMessage::Success(r) => &r.session_id,
            ResultMessage::ErrorDuringExecution(r)
            | ResultMessage::ErrorMaxTurns(r)
            | ResultMessage::ErrorMaxBudgetUsd(r) => &r.session_id,
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, ResultMessage::Success(_))
    }

    pub fn subtype(&self) -> &'static str {
        match self {
            ResultMessage::Success(_) => "success",
            ResultMessage::ErrorDuringExecution(_) => "error_during_execution",
            ResultMessage::ErrorMaxTurns(_) => "error_max_turns",
            ResultMessage::ErrorMaxBudgetUsd(_) => "error_max_budget_usd",
        }
    }

    pub fn num_turns(&self) -> u32 {
        match self {
            ResultMessage::Success(r) => r.num_turns,
            ResultMessage::ErrorDuringExecution(r)
            | ResultMessage::ErrorMaxTurns(r)
            | ResultMessage::ErrorMaxBudgetUsd(r) => r.num_turns,
        }
    }

    /// Error strings reported by the CLI. Empty for success.
    pub fn errors(&self) -> &[String] {
        match self {
            ResultMessage::Success(_) => &[],
            ResultMessage::ErrorDuringExecution(r)
            | ResultMessage::ErrorMaxTurns(r)
            | ResultMessage::ErrorMaxBudgetUsd(r) => &r.errors,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResultSuccess {
    pub session_id: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub num_turns: u32,
    #[serde(default)]
    pub total_cost_usd: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResultError {
    pub session_id: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub num_turns: u32,
    #[serde(default)]
    pub total_cost_usd: f64,
    #[serde(default)]
    pub errors: Vec<String>,
}

// ─── Tool progress ────────────────────────────────────────────────────────

/// `type = "tool_progress"`: emitted periodically while a tool is running.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolProgressMessage {
    pub tool_use_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub elapsed_time_seconds: f64,
    pub session_id: String,
}

// ─── QueryOptions ─────────────────────────────────────────────────────────

/// Options for one agent subprocess.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Model identifier (e.g. `"claude-sonnet-4-20250514"`)
    pub model: Option<String>,
    /// Maximum number of agentic turns before stopping with `error_max_turns`
    pub max_turns: Option<u32>,
    /// Tools the agent may call without prompting
    pub allowed_tools: Vec<String>,
    /// Tools the agent may never call
    pub disallowed_tools: Vec<String>,
    pub permission_mode: PermissionMode,
    /// Text appended to the default system prompt
    pub append_system_prompt: Option<String>,
    /// Working directory for the subprocess
    pub cwd: Option<PathBuf>,
    /// Extra environment for the subprocess (credential goes here)
    pub env: HashMap<String, String>,
    /// Path to the `claude` binary (default: `"claude"`)
    pub path_to_executable: Option<String>,
    /// Pass `--no-session-persistence`
    pub no_session_persistence: bool,
}

/// Permission mode: controls how tool executions are authorized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PermissionMode {
    #[default]
    Default,
    /// Auto-accept file edit operations
    AcceptEdits,
    /// Don't prompt; deny anything not pre-approved
    DontAsk,
}

impl PermissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::DontAsk => "dontAsk",
        }
    }
}
