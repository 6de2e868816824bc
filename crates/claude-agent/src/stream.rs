use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::process::ClaudeProcess;
use crate::types::{Message, QueryOptions};
use crate::Result;

// ─── QueryStream ──────────────────────────────────────────────────────────

/// An async stream of [`Message`]s from one agent subprocess.
///
/// A background task owns the [`ClaudeProcess`] and forwards events over an
/// mpsc channel until the terminal `Result` event or process exit. Dropping
/// the stream closes the receiver; the background task notices immediately
/// and kills the subprocess, so a cancelled HTTP request does not leave an
/// agent running.
pub struct QueryStream {
    rx: mpsc::Receiver<Result<Message>>,
}

impl QueryStream {
    pub(crate) fn new(prompt: String, opts: QueryOptions) -> Self {
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let process = match ClaudeProcess::spawn(&prompt, &opts).await {
                Ok(p) => p,
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            };
            pump(process, tx).await;
        });

        QueryStream { rx }
    }

    /// Wrap a raw receiver. Used by tests to inject fixed event sequences.
    #[cfg(test)]
    pub(crate) fn from_channel(rx: mpsc::Receiver<Result<Message>>) -> Self {
        Self { rx }
    }
}

/// Forward events from `process` to `tx` until a terminal event, EOF, or the
/// receiver going away.
pub(crate) async fn pump(mut process: ClaudeProcess, tx: mpsc::Sender<Result<Message>>) {
    let mut got_result = false;
    loop {
        let next = tokio::select! {
            _ = tx.closed() => {
                tracing::debug!("agent stream dropped by consumer; killing process");
                break;
            }
            next = process.next_message() => next,
        };
        match next {
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                break;
            }
            Ok(None) => break,
            Ok(Some(msg)) => {
                let is_terminal = matches!(msg, Message::Result(_));
                got_result |= is_terminal;
                if tx.send(Ok(msg)).await.is_err() || is_terminal {
                    break;
                }
            }
        }
    }

    // EOF without a terminal event: surface a non-zero exit and its stderr.
    if !got_result && !tx.is_closed() {
        if let Some(exit_err) = process.wait_exit_error().await {
            let _ = tx.send(Err(exit_err)).await;
        }
    }

    process.kill().await;
}

impl Stream for QueryStream {
    type Item = Result<Message>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResultMessage;
    use futures::StreamExt;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio::process::Command;

    /// Stream the lines of a temp file through `cat` as the mock agent.
    fn mock_stream(lines: &[&str]) -> (QueryStream, NamedTempFile) {
        let mut f = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(f, "{}", line).unwrap();
        }
        let mut cmd = Command::new("cat");
        cmd.arg(f.path());
        let process = ClaudeProcess::spawn_command(cmd).unwrap();

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(pump(process, tx));
        (QueryStream { rx }, f)
    }

    const INIT_LINE: &str = r#"{"type":"system","subtype":"init","session_id":"s1","model":"m","tools":[],"cwd":"/tmp"}"#;
    const TEXT_LINE: &str = r#"{"type":"assistant","session_id":"s1","parent_tool_use_id":null,"message":{"id":"m1","role":"assistant","content":[{"type":"text","text":"Found it."}],"model":"m"}}"#;
    const RESULT_LINE: &str = r#"{"type":"result","subtype":"success","session_id":"s1","result":"Found it.","duration_ms":1,"num_turns":1,"total_cost_usd":0.0}"#;

    #[tokio::test]
    async fn stream_yields_all_messages() {
        let (stream, _f) = mock_stream(&[INIT_LINE, TEXT_LINE, RESULT_LINE]);
        let messages: Vec<_> = stream.collect().await;
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| m.is_ok()));
    }

    #[tokio::test]
    async fn stream_terminates_after_result() {
        let (stream, _f) = mock_stream(&[INIT_LINE, RESULT_LINE, TEXT_LINE]);
        let messages: Vec<_> = stream.collect().await;
        assert_eq!(messages.len(), 2);
        let last = messages.last().unwrap().as_ref().unwrap();
        assert!(matches!(last, Message::Result(ResultMessage::Success(_))));
    }

    #[tokio::test]
    async fn stream_skips_blank_lines_and_unknown_types() {
        let (stream, _f) = mock_stream(&[
            INIT_LINE,
            "",
            "  ",
            r#"{"type":"rate_limit_event","session_id":"s1"}"#,
            RESULT_LINE,
        ]);
        let messages: Vec<_> = stream.collect().await;
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn stream_reports_malformed_line() {
        let (stream, _f) = mock_stream(&[INIT_LINE, "this is not json"]);
        let messages: Vec<_> = stream.collect().await;
        assert!(matches!(
            messages.last(),
            Some(Err(crate::ClaudeAgentError::Parse { .. }))
        ));
    }

    #[tokio::test]
    async fn known_type_with_unexpected_shape_is_a_parse_error() {
        let drifted = r#"{"type":"assistant","session_id":"s1","message":{"content":"flat text"}}"#;
        let (stream, _f) = mock_stream(&[INIT_LINE, drifted, RESULT_LINE]);
        let messages: Vec<_> = stream.collect().await;
        assert_eq!(messages.len(), 2);
        assert!(matches!(
            messages.last(),
            Some(Err(crate::ClaudeAgentError::Parse { .. }))
        ));
    }

    #[tokio::test]
    async fn dropping_the_stream_kills_the_agent() {
        let dir = tempfile::TempDir::new().unwrap();
        let pid_file = dir.path().join("pid");
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(format!("echo $$ > {}; exec sleep 30", pid_file.display()));
        let process = ClaudeProcess::spawn_command(cmd).unwrap();
        let (tx, rx) = mpsc::channel(32);
        let pump_task = tokio::spawn(pump(process, tx));
        let stream = QueryStream { rx };

        let mut pid = String::new();
        for _ in 0..100 {
            pid = std::fs::read_to_string(&pid_file).unwrap_or_default();
            if !pid.trim().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        let pid = pid.trim().to_string();
        assert!(!pid.is_empty(), "agent never started");

        drop(stream);
        tokio::time::timeout(std::time::Duration::from_secs(5), pump_task)
            .await
            .expect("pump did not stop after the stream was dropped")
            .unwrap();

        let alive = std::process::Command::new("kill")
            .arg("-0")
            .arg(&pid)
            .status()
            .unwrap()
            .success();
        assert!(!alive, "agent process {pid} still running");
    }

    #[tokio::test]
    async fn nonzero_exit_without_result_is_an_error() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo boom >&2; exit 3");
        let process = ClaudeProcess::spawn_command(cmd).unwrap();
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(pump(process, tx));

        let messages: Vec<_> = QueryStream { rx }.collect().await;
        assert_eq!(messages.len(), 1);
        let err = messages[0].as_ref().unwrap_err().to_string();
        assert!(err.contains("code 3"), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn missing_executable_fails_the_stream() {
        let opts = QueryOptions {
            path_to_executable: Some("/nonexistent/claude-binary".into()),
            ..Default::default()
        };
        let messages: Vec<_> = QueryStream::new("hi".into(), opts).collect().await;
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], Err(crate::ClaudeAgentError::Io(_))));
    }
}
