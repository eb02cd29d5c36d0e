//! OS-process transport of the distribution protocol.
//!
//! Messages travel as JSON lines: notifications on the worker's stdout,
//! task assignments on its stdin. Unparseable lines (stray prints from the
//! host pipeline) are logged and ignored.

use std::{future::Future, process::Stdio};

use async_trait::async_trait;
use serde::Serialize;
use tokio::{
    io::{AsyncBufReadExt as _, AsyncWrite, AsyncWriteExt as _, BufReader, Lines},
    process::{Child, ChildStdin, ChildStdout, Command},
};

use super::{Notification, Task, Worker, WorkerError};

/// A worker running as a child process.
///
/// The child is killed when the handle drops, so breaking out of the
/// master loop tears the whole pool down.
#[derive(Debug)]
pub struct ProcessWorker {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl ProcessWorker {
    /// Spawns `command` as a worker with piped stdio.
    ///
    /// The command is expected to call [`serve()`] once started.
    pub fn spawn(command: &mut Command) -> Result<Self, WorkerError> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| WorkerError::Spawn { source })?;

        // Both pipes exist: we just requested them.
        let stdin = child.stdin.take().ok_or_else(|| WorkerError::Spawn {
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "worker stdin missing"),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| WorkerError::Spawn {
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "worker stdout missing"),
        })?;

        Ok(Self { child, stdin, stdout: BufReader::new(stdout).lines() })
    }

    /// Process ID of the underlying child, if it is still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

#[async_trait(?Send)]
impl Worker for ProcessWorker {
    async fn assign(&mut self, task: Task) -> Result<(), WorkerError> {
        send_line(&mut self.stdin, &task).await
    }

    async fn next(&mut self) -> Option<Notification> {
        loop {
            let line = self.stdout.next_line().await.ok()??;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(notification) => return Some(notification),
                Err(e) => tracing::warn!("ignoring unparseable worker output {line:?}: {e}"),
            }
        }
    }
}

/// Worker role of the protocol, run over this process's stdio.
///
/// Announces readiness, then runs `run_file` for every task received until
/// the master hangs up, announcing completion after each. Per-file
/// failures are the pipeline's business; they never break the serve loop.
pub async fn serve<F, Fut>(mut run_file: F) -> Result<(), WorkerError>
where
    F: FnMut(std::path::PathBuf) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut stdout = tokio::io::stdout();
    send_line(&mut stdout, &Notification::Ready).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(|source| WorkerError::Io { source })? {
        if line.trim().is_empty() {
            continue;
        }
        let task: Task = match serde_json::from_str(&line) {
            Ok(task) => task,
            Err(e) => {
                tracing::warn!("ignoring unparseable task {line:?}: {e}");
                continue;
            }
        };

        run_file(task.file).await;
        send_line(&mut stdout, &Notification::Done).await?;
    }

    Ok(())
}

async fn send_line<W, M>(sink: &mut W, message: &M) -> Result<(), WorkerError>
where
    W: AsyncWrite + Unpin,
    M: Serialize,
{
    let mut line =
        serde_json::to_vec(message).map_err(|source| WorkerError::Encode { source })?;
    line.push(b'\n');
    sink.write_all(&line).await.map_err(|source| WorkerError::Io { source })?;
    sink.flush().await.map_err(|source| WorkerError::Io { source })
}
