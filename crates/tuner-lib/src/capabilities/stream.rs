//! Push-to-pull adapter for remote command output
//!
//! The remote side writes whenever data arrives while the parser wants the
//! whole document, so the execution runs in its own task writing into one
//! end of an in-process pipe while the caller drains the other end. The
//! task owns the write end and closes it on every exit path; its status
//! comes back over a oneshot channel once the caller has read to EOF.

use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use super::AgentRuntime;
use crate::error::{ExecError, Result, TunerError};
use crate::models::AgentRef;

/// Maximum number of trailing output bytes kept in error messages
const TAIL_BYTES: usize = 256;

/// Everything the remote command wrote, plus how it ended
#[derive(Debug)]
pub struct CapturedOutput {
    pub bytes: Vec<u8>,
    pub status: std::result::Result<(), ExecError>,
}

impl CapturedOutput {
    pub fn succeeded(&self) -> bool {
        self.status.is_ok()
    }

    /// Hand out the bytes only if the command succeeded.
    ///
    /// On failure the drained output is summarized into the error instead
    /// of being returned for parsing.
    pub fn into_result(self, agent: &AgentRef) -> Result<Vec<u8>> {
        match self.status {
            Ok(()) => Ok(self.bytes),
            Err(source) => Err(TunerError::Execution {
                agent: agent.to_string(),
                drained: self.bytes.len(),
                tail: output_tail(&self.bytes),
                source,
            }),
        }
    }
}

/// Aborts the execution task if the caller goes away before it finishes
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run `command` in the agent and collect its combined output.
///
/// Dropping the returned future aborts the execution task, which closes the
/// write end of the pipe and tears down the remote session.
pub async fn capture_output(
    runtime: Arc<dyn AgentRuntime>,
    agent: AgentRef,
    command: Vec<String>,
    pipe_buffer_bytes: usize,
) -> CapturedOutput {
    let (mut writer, mut reader) = tokio::io::duplex(pipe_buffer_bytes.max(1));
    let (status_tx, status_rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let status = runtime.exec(&agent, &command, &mut writer).await;
        // EOF for the reader; the drop below covers a failed shutdown
        let _ = writer.shutdown().await;
        drop(writer);
        let _ = status_tx.send(status);
    });
    let _guard = AbortOnDrop(task);

    let mut bytes = Vec::new();
    if let Err(e) = reader.read_to_end(&mut bytes).await {
        return CapturedOutput {
            bytes,
            status: Err(ExecError::Io(e)),
        };
    }
    debug!(bytes = bytes.len(), "Drained remote command output");

    let status = status_rx.await.unwrap_or(Err(ExecError::Aborted));
    CapturedOutput { bytes, status }
}

/// Copy stdout and stderr into a single sink as data becomes available.
///
/// Both sources are polled concurrently so neither can stall the other.
pub async fn merge_streams<O, E, W>(mut stdout: O, mut stderr: E, sink: &mut W) -> std::io::Result<u64>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut out_buf = vec![0u8; 8192];
    let mut err_buf = vec![0u8; 8192];
    let mut out_open = true;
    let mut err_open = true;
    let mut total = 0u64;

    while out_open || err_open {
        tokio::select! {
            n = stdout.read(&mut out_buf), if out_open => {
                let n = n?;
                if n == 0 {
                    out_open = false;
                } else {
                    sink.write_all(&out_buf[..n]).await?;
                    total += n as u64;
                }
            }
            n = stderr.read(&mut err_buf), if err_open => {
                let n = n?;
                if n == 0 {
                    err_open = false;
                } else {
                    sink.write_all(&err_buf[..n]).await?;
                    total += n as u64;
                }
            }
        }
    }

    sink.flush().await?;
    Ok(total)
}

fn output_tail(bytes: &[u8]) -> String {
    let start = bytes.len().saturating_sub(TAIL_BYTES);
    String::from_utf8_lossy(&bytes[start..]).trim().to_string()
}
