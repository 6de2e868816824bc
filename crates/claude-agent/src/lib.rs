//! `claude-agent`: drives the Claude CLI as an external coding agent.
//!
//! The CLI is spawned with `--output-format stream-json` and its JSONL output
//! is exposed as a typed async stream. On top of that stream the
//! [`Dispatcher`] folds every assistant text fragment of one task into a
//! single result string.
//!
//! # Architecture
//!
//! ```text
//! Dispatcher      ← long-lived; owns credential, model, instructions
//!     │              builds QueryOptions per ToolAccess
//!     ▼
//! ClaudeProcess   ← spawns `claude --output-format stream-json …`
//!     │              prompt on stdin, JSONL on stdout
//!     ▼
//! QueryStream     ← futures::Stream<Item = Result<Message>>
//!     │              background task + mpsc channel, killed on drop
//!     ▼
//! collect_text    ← fold: assistant text blocks → trimmed String
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use claude_agent::{AgentConfig, Dispatcher, ToolAccess};
//!
//! let dispatcher = Dispatcher::new(AgentConfig::new(api_key, "claude-sonnet-4-20250514"));
//! let text = dispatcher
//!     .dispatch("Summarize ./logs/session-1.log", ToolAccess::ReadOnly)
//!     .await?;
//! ```

pub mod dispatch;
pub mod error;
pub mod types;

pub(crate) mod process;
pub mod stream;


pub use dispatch::{collect_text, AgentConfig, Dispatcher, ToolAccess, DEFAULT_MODEL};
pub use error::ClaudeAgentError;
pub use stream::QueryStream;
pub use types::{
    AssistantContent, AssistantMessage, ContentBlock, Message, PermissionMode, QueryOptions,
    ResultError, ResultMessage, ResultSuccess, SystemMessage, SystemPayload,
};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ClaudeAgentError>;

/// Start one agent task.
///
/// Returns a [`QueryStream`] that yields [`Message`] values as they arrive
/// from the subprocess. The stream terminates after the first
/// [`Message::Result`] or on process exit.
pub fn query(prompt: impl Into<String>, opts: QueryOptions) -> QueryStream {
    QueryStream::new(prompt.into(), opts)
}
