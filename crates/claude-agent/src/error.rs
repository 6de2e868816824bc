use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaudeAgentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse stream-json line: {source}\n  line: {line}")]
    Parse {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Process error: {0}")]
    Process(String),

    /// The agent reported a terminal error (`error_max_turns`, …).
    #[error("Agent task failed ({subtype}): {detail}")]
    Execution { subtype: String, detail: String },

    #[error("Task instruction is empty")]
    EmptyPrompt,

    #[error("Agent task timed out after {0}s")]
    Timeout(u64),
}
