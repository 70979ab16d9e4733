// tests/shell_process.rs
//
// These tests spawn real `sh -c` processes.

mod common;
use crate::common::{fast_settings, init_tracing, with_timeout};

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use procqueue::errors::{ProcessError, TimeoutKind};
use procqueue::process::{ProcessHandle, ShellProcess};
use procqueue::queue::QueuedProcessor;
use procqueue::report::{BufferedSink, Reporter};
use procqueue::types::OutputStream;

type TestResult = Result<(), Box<dyn Error>>;
type Captured = Arc<Mutex<Vec<(OutputStream, String)>>>;

fn capture() -> (Captured, procqueue::process::OutputCallback) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);
    let callback = Box::new(move |stream: OutputStream, chunk: &str| {
        sink.lock().unwrap().push((stream, chunk.to_string()));
    });
    (captured, callback)
}

/// Poll until terminated, like the scheduler's tick does.
async fn poll_until_terminated(process: &mut ShellProcess) {
    while !process.is_terminated() {
        let _ = process.check_timeout();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn captures_stdout_stderr_and_exit_code() -> TestResult {
    with_timeout(async {
        init_tracing();

        let mut process = ShellProcess::new("echo out-line; echo err-line >&2; exit 3");
        assert!(!process.is_started());

        let (captured, callback) = capture();
        process.start(callback)?;
        assert!(process.is_started());

        poll_until_terminated(&mut process).await;

        assert!(!process.is_running());
        assert_eq!(process.exit_code(), Some(3));
        assert!(!process.is_successful());

        let captured = captured.lock().unwrap().clone();
        assert!(captured.contains(&(OutputStream::Out, "out-line".to_string())));
        assert!(captured.contains(&(OutputStream::Err, "err-line".to_string())));
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn invalid_utf8_output_does_not_kill_the_child() -> TestResult {
    with_timeout(async {
        init_tracing();

        let mut process = ShellProcess::new(
            "printf 'before\\n\\377\\n'; sleep 0.3; printf 'dos\\r\\n'; echo after; exit 0",
        );
        let (captured, callback) = capture();
        process.start(callback)?;

        poll_until_terminated(&mut process).await;

        assert_eq!(process.exit_code(), Some(0));
        let lines: Vec<String> = captured
            .lock()
            .unwrap()
            .iter()
            .map(|(_, line)| line.clone())
            .collect();
        assert_eq!(lines, vec!["before", "\u{FFFD}", "dos", "after"]);
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn env_and_working_directory_are_applied() -> TestResult {
    with_timeout(async {
        let dir = tempfile::tempdir()?;
        let mut process = ShellProcess::new("echo \"$GREETING\"; pwd")
            .env("GREETING", "hi there")
            .current_dir(dir.path());

        let (captured, callback) = capture();
        process.start(callback)?;
        poll_until_terminated(&mut process).await;

        assert_eq!(process.exit_code(), Some(0));
        let lines: Vec<String> = captured
            .lock()
            .unwrap()
            .iter()
            .map(|(_, line)| line.clone())
            .collect();
        assert_eq!(lines[0], "hi there");
        let expected_dir = dir.path().canonicalize()?;
        assert_eq!(std::path::Path::new(&lines[1]).canonicalize()?, expected_dir);
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn idle_timeout_kills_a_silent_process() -> TestResult {
    with_timeout(async {
        init_tracing();

        let mut process = ShellProcess::new("exec sleep 30");
        process.set_idle_timeout(Some(Duration::from_millis(200)));

        let (_captured, callback) = capture();
        process.start(callback)?;

        let mut timed_out = None;
        while !process.is_terminated() {
            if let Err(e) = process.check_timeout() {
                timed_out = Some(e);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        match timed_out {
            Some(ProcessError::TimedOut { kind, .. }) => assert_eq!(kind, TimeoutKind::Idle),
            other => panic!("expected idle timeout, got {other:?}"),
        }
        // Killed by a signal: no exit code.
        assert_eq!(process.exit_code(), None);
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn overall_timeout_fires_even_with_output() -> TestResult {
    with_timeout(async {
        let mut process = ShellProcess::new("while true; do echo tick; sleep 0.05; done");
        process.set_timeout(Some(Duration::from_millis(300)));
        process.set_idle_timeout(Some(Duration::from_secs(30)));

        let (_captured, callback) = capture();
        process.start(callback)?;

        let mut kinds = Vec::new();
        while !process.is_terminated() {
            if let Err(ProcessError::TimedOut { kind, .. }) = process.check_timeout() {
                kinds.push(kind);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(kinds, vec![TimeoutKind::Overall]);
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[test]
fn timeout_check_before_start_reports_not_started() {
    let mut process = ShellProcess::new("true");

    assert!(matches!(process.check_timeout(), Err(ProcessError::NotStarted)));
    assert!(!process.is_running());
    assert!(!process.is_terminated());
}

#[test]
fn start_outside_runtime_fails_and_terminates() {
    let mut process = ShellProcess::new("echo never");
    let (_captured, callback) = capture();

    let err = process.start(callback).expect_err("no runtime, no spawn");

    assert!(matches!(err, ProcessError::Spawn(_)));
    assert!(process.is_started());
    assert!(process.is_terminated());
    assert_eq!(process.exit_code(), None);
}

#[tokio::test]
async fn queued_processor_runs_real_processes_under_limit() -> TestResult {
    with_timeout(async {
        init_tracing();

        let sink = BufferedSink::default();
        let mut processor: QueuedProcessor<ShellProcess> =
            QueuedProcessor::new(Reporter::new(sink.clone()), fast_settings(6));

        let max_running = Arc::new(Mutex::new(0usize));
        let processes: Vec<(String, ShellProcess)> = [
            ("1", "sleep 0.3; echo 1"),
            ("2", "sleep 0.05; echo 2"),
            ("3", "echo 3"),
            ("6", "echo 6"),
            ("4", "echo 4"),
            ("5", "echo 5"),
            ("7", "sleep 0.05; echo 7"),
            ("8", "echo 8; exit 1"),
        ]
        .into_iter()
        .map(|(key, cmd)| (key.to_string(), ShellProcess::new(cmd)))
        .collect();

        processor.add_processes(processes, false)?;

        // Drive the loop by hand to observe the cap between phases.
        while !processor.collector().is_drained() {
            processor.start_batch();
            {
                let running = processor.collector().running().len();
                let mut max = max_running.lock().unwrap();
                *max = (*max).max(running);
            }
            processor.tick_every(0);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(*max_running.lock().unwrap(), 6);

        let out = sink.fetch();
        assert!(out.contains("STARTED ... 00:00 sek | 6 processes [1], [2], [3], [6], [4], [5]"));
        for key in ["1", "2", "3", "4", "5", "6", "7", "8"] {
            assert!(out.contains(&format!("OUT [{key}] {key}")), "missing output of {key}:\n{out}");
        }
        assert!(out.contains(" =DONE= ... 00:00 sek | 8/8 done"));

        let summary = processor.summary();
        assert_eq!(summary.total, 8);
        assert_eq!(summary.failed, vec!["8".to_string()]);
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn wait_drains_real_processes() -> TestResult {
    with_timeout(async {
        let sink = BufferedSink::default();
        let mut processor: QueuedProcessor<ShellProcess> =
            QueuedProcessor::new(Reporter::new(sink.clone()), fast_settings(2));

        let fired = Arc::new(Mutex::new(Vec::new()));
        {
            let fired = Arc::clone(&fired);
            processor.on_terminated(move |key, process| {
                fired.lock().unwrap().push((key.to_string(), process.exit_code()));
            });
        }

        processor.add_processes(
            (0..5).map(|i| (format!("p{i}"), ShellProcess::new(format!("echo {i}")))),
            false,
        )?;
        processor.wait().await;

        let fired = fired.lock().unwrap().clone();
        assert_eq!(fired.len(), 5);
        assert!(fired.iter().all(|(_, code)| *code == Some(0)));
        assert!(processor.summary().all_succeeded());
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}
