//! Master/worker task-distribution protocol.
//!
//! The master enumerates scenario files and hands them out one at a time:
//! a worker announces [`Notification::Ready`] once, then alternates between
//! receiving a [`Task`] and announcing [`Notification::Done`]. Work is
//! pulled, never pushed eagerly, so no file is dispatched to a worker
//! before its previous task completes, and every file goes to exactly one
//! worker exactly once.
//!
//! The master loop is generic over the [`Worker`] transport so the
//! protocol invariants stay testable in-memory; [`ProcessWorker`] is the
//! shipped transport, speaking JSON lines over a child process's stdio.
//! Workers are independent OS processes: no state is shared between them,
//! and each owns exactly one browser session at a time.

mod process;

use std::{cmp, future::Future, io, num::NonZeroUsize, path::PathBuf, thread};

use async_trait::async_trait;
use derive_more::{Display, Error};
use futures::{stream::FuturesUnordered, FutureExt as _, StreamExt as _};
use serde::{Deserialize, Serialize};

#[doc(inline)]
pub use self::process::{serve, ProcessWorker};

/// Worker-to-master notification.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Notification {
    /// The worker started and is awaiting its first task.
    Ready,

    /// The worker finished its current task.
    Done,
}

/// Master-to-worker task assignment: one scenario file.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Task {
    /// Scenario file to run.
    pub file: PathBuf,
}

/// Failure of the distribution transport itself.
///
/// Distinct from anything happening inside a scenario run: per-file
/// failures stay inside the worker and never surface here.
#[derive(Debug, Display, Error)]
pub enum WorkerError {
    /// Spawning a worker process failed.
    #[display("failed to spawn worker: {source}")]
    Spawn {
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Reading from or writing to a worker failed.
    #[display("worker transport failed: {source}")]
    Io {
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A protocol message could not be encoded.
    #[display("failed to encode protocol message: {source}")]
    Encode {
        /// Underlying serialization error.
        source: serde_json::Error,
    },
}

/// One side of the channel between the master and a single worker.
#[async_trait(?Send)]
pub trait Worker {
    /// Hands one task to the worker.
    async fn assign(&mut self, task: Task) -> Result<(), WorkerError>;

    /// Awaits the worker's next notification; [`None`] once it hung up.
    async fn next(&mut self) -> Option<Notification>;
}

/// Pool size for the requested parallelism: the larger of the machine's
/// available parallelism and the request.
#[must_use]
pub fn pool_size(requested: usize) -> usize {
    let available = thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1);
    cmp::max(available, requested)
}

/// Runs `files` with no parallelism, one full pipeline at a time,
/// in-process.
pub async fn run_sequential<F, Fut>(files: &[PathBuf], mut run_file: F)
where
    F: FnMut(PathBuf) -> Fut,
    Fut: Future<Output = ()>,
{
    for file in files {
        run_file(file.clone()).await;
    }
}

/// Master role of the protocol: distributes `files` over `workers` and
/// returns once every file has completed.
///
/// On each `ready` or `done` notification the sending worker is handed the
/// next unassigned file, if one remains. Termination happens exactly when
/// the completed count reaches the file count; a worker hanging up early
/// only stops that worker.
pub async fn distribute<W>(workers: Vec<W>, files: &[PathBuf]) -> Result<(), WorkerError>
where
    W: Worker + 'static,
{
    let total = files.len();
    if total == 0 {
        return Ok(());
    }

    let mut next_index = 0usize;
    let mut completed = 0usize;

    let mut inflight = FuturesUnordered::new();
    for (id, mut worker) in workers.into_iter().enumerate() {
        inflight.push(
            async move {
                let notification = worker.next().await;
                (id, worker, notification)
            }
            .boxed_local(),
        );
    }

    while let Some((id, mut worker, notification)) = inflight.next().await {
        let Some(notification) = notification else {
            tracing::debug!("worker {id} hung up");
            continue;
        };

        if notification == Notification::Done {
            completed += 1;
            if completed == total {
                break;
            }
        }

        if next_index < total {
            let task = Task { file: files[next_index].clone() };
            next_index += 1;
            tracing::debug!("assigning {} to worker {id}", task.file.display());
            worker.assign(task).await?;
        }

        inflight.push(
            async move {
                let notification = worker.next().await;
                (id, worker, notification)
            }
            .boxed_local(),
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::VecDeque, rc::Rc};

    use super::*;

    /// In-memory worker: one `Ready`, then a `Done` per assignment.
    struct Scripted {
        assigned: Rc<RefCell<Vec<PathBuf>>>,
        pending: VecDeque<Notification>,
    }

    impl Scripted {
        fn new(assigned: Rc<RefCell<Vec<PathBuf>>>) -> Self {
            Self { assigned, pending: VecDeque::from([Notification::Ready]) }
        }
    }

    #[async_trait(?Send)]
    impl Worker for Scripted {
        async fn assign(&mut self, task: Task) -> Result<(), WorkerError> {
            self.assigned.borrow_mut().push(task.file);
            self.pending.push_back(Notification::Done);
            Ok(())
        }

        async fn next(&mut self) -> Option<Notification> {
            self.pending.pop_front()
        }
    }

    fn files(count: usize) -> Vec<PathBuf> {
        (0..count).map(|i| PathBuf::from(format!("cases/{i:02}.yaml"))).collect()
    }

    #[tokio::test]
    async fn every_file_is_assigned_exactly_once() {
        let assigned = Rc::new(RefCell::new(Vec::new()));
        let workers: Vec<_> = (0..3).map(|_| Scripted::new(assigned.clone())).collect();
        let files = files(7);

        distribute(workers, &files).await.unwrap();

        let mut seen = assigned.borrow().clone();
        seen.sort();
        assert_eq!(seen, files);
    }

    #[tokio::test]
    async fn pool_larger_than_file_count_terminates() {
        let assigned = Rc::new(RefCell::new(Vec::new()));
        let workers: Vec<_> = (0..8).map(|_| Scripted::new(assigned.clone())).collect();
        let files = files(2);

        distribute(workers, &files).await.unwrap();
        assert_eq!(assigned.borrow().len(), 2);
    }

    #[tokio::test]
    async fn empty_file_set_returns_immediately() {
        let assigned = Rc::new(RefCell::new(Vec::new()));
        let workers = vec![Scripted::new(assigned.clone())];

        distribute(workers, &[]).await.unwrap();
        assert!(assigned.borrow().is_empty());
    }

    #[tokio::test]
    async fn single_worker_processes_all_files_in_order() {
        let assigned = Rc::new(RefCell::new(Vec::new()));
        let workers = vec![Scripted::new(assigned.clone())];
        let files = files(4);

        distribute(workers, &files).await.unwrap();
        // One worker pulls strictly sequentially, so order is preserved.
        assert_eq!(*assigned.borrow(), files);
    }

    #[test]
    fn pool_size_is_at_least_the_request() {
        assert!(pool_size(64) >= 64);
        assert!(pool_size(0) >= 1);
    }

    #[test]
    fn protocol_messages_have_stable_wire_shapes() {
        assert_eq!(
            serde_json::to_string(&Notification::Ready).unwrap(),
            r#"{"type":"ready"}"#,
        );
        assert_eq!(
            serde_json::to_string(&Notification::Done).unwrap(),
            r#"{"type":"done"}"#,
        );
        let task: Task = serde_json::from_str(r#"{"file":"cases/login.yaml"}"#).unwrap();
        assert_eq!(task.file, PathBuf::from("cases/login.yaml"));
    }

    #[tokio::test]
    async fn run_sequential_preserves_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let files = files(3);

        run_sequential(&files, |file| {
            let sink = sink.clone();
            async move { sink.borrow_mut().push(file) }
        })
        .await;

        assert_eq!(*seen.borrow(), files);
    }
}
