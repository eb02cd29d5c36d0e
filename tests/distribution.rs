//! Distribution protocol over real worker processes.
//!
//! Workers here are shell one-liners speaking the JSON-lines protocol:
//! announce readiness, log each assigned task, announce completion.

#![cfg(unix)]

use std::path::{Path, PathBuf};

use pagerunner::worker::{distribute, ProcessWorker, Task};
use tokio::process::Command;

/// Spawns a worker that appends every assignment to `log`.
fn echo_worker(log: &Path) -> ProcessWorker {
    let script = format!(
        "echo '{{\"type\":\"ready\"}}'; \
         while IFS= read -r line; do \
           printf '%s\\n' \"$line\" >> '{}'; \
           echo '{{\"type\":\"done\"}}'; \
         done",
        log.display(),
    );
    ProcessWorker::spawn(Command::new("sh").arg("-c").arg(script)).unwrap()
}

fn assigned_files(log: &Path) -> Vec<PathBuf> {
    let Ok(contents) = std::fs::read_to_string(log) else {
        return Vec::new();
    };
    contents
        .lines()
        .map(|line| serde_json::from_str::<Task>(line).unwrap().file)
        .collect()
}

fn files(count: usize) -> Vec<PathBuf> {
    (0..count).map(|i| PathBuf::from(format!("cases/{i:02}.yaml"))).collect()
}

#[tokio::test]
async fn two_processes_split_the_files_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let logs = [dir.path().join("a.log"), dir.path().join("b.log")];
    let workers: Vec<_> = logs.iter().map(|log| echo_worker(log)).collect();
    let files = files(6);

    distribute(workers, &files).await.unwrap();

    let mut seen: Vec<_> = logs.iter().flat_map(|log| assigned_files(log)).collect();
    seen.sort();
    assert_eq!(seen, files);
    // Both readiness announcements arrive before the queue drains, so
    // neither worker goes idle.
    for log in &logs {
        assert!(!assigned_files(log).is_empty());
    }
}

#[tokio::test]
async fn a_worker_that_never_reports_ready_is_left_out() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("live.log");
    let live = echo_worker(&log);
    let dead = ProcessWorker::spawn(Command::new("sh").arg("-c").arg("exit 0")).unwrap();
    let files = files(4);

    distribute(vec![dead, live], &files).await.unwrap();

    assert_eq!(assigned_files(&log), files);
}

#[tokio::test]
async fn blank_and_stray_worker_output_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("noisy.log");
    let script = format!(
        "echo; \
         echo 'warming up the browser'; \
         echo '{{\"type\":\"ready\"}}'; \
         while IFS= read -r line; do \
           printf '%s\\n' \"$line\" >> '{}'; \
           echo '{{\"type\":\"done\"}}'; \
         done",
        log.display(),
    );
    let worker = ProcessWorker::spawn(Command::new("sh").arg("-c").arg(script)).unwrap();
    let files = files(2);

    distribute(vec![worker], &files).await.unwrap();

    assert_eq!(assigned_files(&log), files);
}
