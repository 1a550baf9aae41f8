#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tubefetch::download::{
    DownloadRequest, DownloadWorker, Outcome, WorkerEvent, YtDlp, NO_MEDIA_MESSAGE,
};
use tubefetch::logging::RunLog;
use tubefetch::models::DownloadFormat;

const PRIVATE_ENTRY: &str =
    "[youtube] priv4te01: Private video. Sign in if you have been granted access to this video";

// Writing an executable while another test thread forks can leave it busy
// (ETXTBSY), so the cases in this file run one at a time.
static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// A stand-in `yt-dlp` that appends its arguments to `runs.txt` and then
/// executes `body`.
fn fake_ytdlp(dir: &Path, body: &str) -> PathBuf {
    let script = dir.join("yt-dlp");
    let runs = dir.join("runs.txt");
    fs::write(
        &script,
        format!("#!/bin/sh\necho \"$@\" >> '{}'\n{}\n", runs.display(), body),
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

fn runs(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("runs.txt"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn playlist(root: &Path) -> DownloadRequest {
    DownloadRequest::new(
        "https://www.youtube.com/playlist?list=PL0123456789",
        DownloadFormat::MP4,
        root,
    )
}

fn run_worker(request: DownloadRequest, program: &Path) -> Vec<WorkerEvent> {
    let (tx, rx) = mpsc::channel();
    let engine = Arc::new(YtDlp::new(program, None));
    let worker = DownloadWorker::start(request, engine, RunLog::disabled(), tx);
    worker.join();
    rx.try_iter().collect()
}

fn terminal(events: &[WorkerEvent]) -> Outcome {
    match events.last() {
        Some(WorkerEvent::Finished(outcome)) => outcome.clone(),
        other => panic!("run did not finish last: {:?}", other),
    }
}

fn skipped(events: &[WorkerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            WorkerEvent::Skipped(message) => Some(message.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn archived_playlist_with_private_entry_is_already_downloaded() {
    let _serial = serial();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("out");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join(".download-archive.txt"), "youtube abc123\n").unwrap();
    let program = fake_ytdlp(dir.path(), &format!("echo 'ERROR: {}' >&2\nexit 1", PRIVATE_ENTRY));

    let events = run_worker(playlist(&root), &program);

    assert_eq!(terminal(&events), Outcome::Completed(root));
    assert_eq!(skipped(&events), vec![PRIVATE_ENTRY.to_string()]);
    // Private entries are not worth a retry with another client.
    assert_eq!(runs(dir.path()).len(), 1);
}

#[test]
fn skipped_entries_without_archive_report_no_media() {
    let _serial = serial();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("out");
    let program = fake_ytdlp(dir.path(), &format!("echo 'ERROR: {}' >&2\nexit 1", PRIVATE_ENTRY));

    let events = run_worker(playlist(&root), &program);

    assert_eq!(terminal(&events), Outcome::Failed(NO_MEDIA_MESSAGE.to_string()));
    assert_eq!(runs(dir.path()).len(), 1);
}

#[test]
fn nonzero_exit_after_download_is_success() {
    let _serial = serial();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("out");
    let file = root.join("Video").join("001 - Video - Clip.mp4");
    let program = fake_ytdlp(
        dir.path(),
        &format!(
            "echo 'PROGRESS|downloading| 50.0%|1.00MiB/s|00:02|Clip|{file}'\n\
             echo 'PROGRESS|finished|100%|NA|NA|Clip|{file}'\n\
             echo 'ERROR: {private}' >&2\n\
             exit 1",
            file = file.display(),
            private = PRIVATE_ENTRY,
        ),
    );

    let events = run_worker(playlist(&root), &program);

    assert_eq!(terminal(&events), Outcome::Completed(root));
    assert!(events.contains(&WorkerEvent::FileDone(file)));
    assert!(events
        .iter()
        .any(|e| matches!(e, WorkerEvent::Progress(p) if p.percent == 50.0 && p.title == "Clip")));
    assert_eq!(skipped(&events), vec![PRIVATE_ENTRY.to_string()]);
}

#[test]
fn age_gate_retries_with_alternate_client() {
    let _serial = serial();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("out");
    let message = "[youtube] abc123: Sign in to confirm your age";
    let program = fake_ytdlp(dir.path(), &format!("echo 'ERROR: {}' >&2\nexit 1", message));

    let request = DownloadRequest::new("https://youtu.be/abc123", DownloadFormat::MP4, &root);
    let events = run_worker(request, &program);

    assert_eq!(terminal(&events), Outcome::Failed(message.to_string()));
    let runs = runs(dir.path());
    assert_eq!(runs.len(), 2);
    assert!(!runs[0].contains("player_client=ios;"));
    assert!(runs[1].contains("player_client=ios"));
}

#[test]
fn unexplained_failure_is_reported_without_retry() {
    let _serial = serial();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("out");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join(".download-archive.txt"), "youtube abc123\n").unwrap();
    let program = fake_ytdlp(
        dir.path(),
        "echo 'ERROR: Unable to download webpage: timed out' >&2\nexit 1",
    );

    let events = run_worker(playlist(&root), &program);

    assert_eq!(
        terminal(&events),
        Outcome::Failed("Unable to download webpage: timed out".to_string())
    );
    assert!(skipped(&events).is_empty());
    assert_eq!(runs(dir.path()).len(), 1);
}

#[test]
fn silent_nonzero_exit_fails() {
    let _serial = serial();
    let dir = tempfile::tempdir().unwrap();
    let program = fake_ytdlp(dir.path(), "exit 2");

    let events = run_worker(playlist(&dir.path().join("out")), &program);

    match terminal(&events) {
        Outcome::Failed(message) => assert!(message.starts_with("yt-dlp exited with"), "{}", message),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn missing_program_fails_to_start() {
    let _serial = serial();
    let dir = tempfile::tempdir().unwrap();

    let events = run_worker(playlist(&dir.path().join("out")), &dir.path().join("no-such-yt-dlp"));

    match terminal(&events) {
        Outcome::Failed(message) => {
            assert!(message.starts_with("failed to start the download engine"), "{}", message)
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn stop_kills_running_process() {
    let _serial = serial();
    let dir = tempfile::tempdir().unwrap();
    let program = fake_ytdlp(
        dir.path(),
        "while true; do\n  echo 'PROGRESS|downloading| 10.0%|1.00MiB/s|00:09|Clip|NA'\n  sleep 0.1\ndone",
    );

    let (tx, rx) = mpsc::channel();
    let engine = Arc::new(YtDlp::new(&program, None));
    let worker = DownloadWorker::start(playlist(&dir.path().join("out")), engine, RunLog::disabled(), tx);

    let first = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(matches!(first, WorkerEvent::Progress(_)));
    worker.stop();

    // The script never exits by itself, so finishing proves it was killed.
    let outcome = loop {
        match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            WorkerEvent::Finished(outcome) => break outcome,
            WorkerEvent::Progress(_) => {}
            other => panic!("unexpected event after stop: {:?}", other),
        }
    };
    assert_eq!(outcome, Outcome::Cancelled);
    worker.join();
    assert_eq!(runs(dir.path()).len(), 1);
}
