use log::Level;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use super::engine::{
    is_access_restricted, is_skip_message, Cancelled, Engine, EngineError, EngineHooks,
    EngineProgress, ProgressStatus,
};
use super::options::{EngineConfig, ALTERNATE_CLIENT};
use super::request::DownloadRequest;
use crate::logging::{RunLog, SinkGuard};
use crate::models::DownloadFormat;

pub const CANCELLED_MESSAGE: &str = "Cancelled by user";
pub const NO_MEDIA_MESSAGE: &str =
    "No media downloaded. Possibly unavailable formats or all entries skipped.";
pub const NO_TRANSCODER_MESSAGE: &str =
    "ffmpeg was not found. It is required to convert downloads to MP3.";

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub percent: f32,
    pub speed: String,
    pub eta: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Everything requested is on disk under this root, freshly or from an earlier run.
    Completed(PathBuf),
    Cancelled,
    Failed(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn message(&self) -> String {
        match self {
            Outcome::Completed(root) => root.to_string_lossy().to_string(),
            Outcome::Cancelled => CANCELLED_MESSAGE.to_string(),
            Outcome::Failed(message) => message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Progress(ProgressEvent),
    /// Absolute path of a media file the engine finished writing.
    FileDone(PathBuf),
    Skipped(String),
    Finished(Outcome),
}

struct RunHooks<'a> {
    cancel: &'a CancelToken,
    events: &'a Sender<WorkerEvent>,
    log: &'a RunLog,
    saw_download: bool,
}

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

impl EngineHooks for RunHooks<'_> {
    fn on_progress(&mut self, progress: EngineProgress) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        let EngineProgress {
            status,
            title,
            filename,
        } = progress;
        self.saw_download = true;

        match status {
            ProgressStatus::Downloading {
                percent,
                speed,
                eta,
            } => {
                self.log.record(
                    Level::Debug,
                    &format!("downloading: {} {:.1}% {} ETA {}", title, percent, speed, eta),
                );
                let _ = self.events.send(WorkerEvent::Progress(ProgressEvent {
                    percent,
                    speed,
                    eta,
                    title,
                }));
            }
            ProgressStatus::Finished => {
                self.log.info(format!("finished download stage: {}", title));
                let _ = self.events.send(WorkerEvent::Progress(ProgressEvent {
                    percent: 100.0,
                    speed: String::new(),
                    eta: String::new(),
                    title,
                }));
                if let Some(file) = filename {
                    let _ = self.events.send(WorkerEvent::FileDone(absolute(file)));
                }
            }
        }
        Ok(())
    }

    fn on_log(&mut self, level: Level, message: &str) {
        self.log.record(level, message);
    }
}

/// Forwards engine error records that look like skipped entries until the
/// guard drops or the run is cancelled.
fn attach_skip_sink(log: &RunLog, cancel: &CancelToken, events: &Sender<WorkerEvent>) -> SinkGuard {
    let cancel = cancel.clone();
    let events = Mutex::new(events.clone());
    log.attach(move |level, message| {
        if level != Level::Error || cancel.is_cancelled() || !is_skip_message(message) {
            return;
        }
        let events = events.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = events.send(WorkerEvent::Skipped(message.to_string()));
    })
}

fn conclude_primary(request: &DownloadRequest, log: &RunLog, cancel: &CancelToken, saw_download: bool) -> Outcome {
    if cancel.is_cancelled() {
        return Outcome::Cancelled;
    }
    if !saw_download {
        if !request.ignore_archive && request.archive_path().exists() {
            log.info("No new downloads, but the archive exists. Likely already downloaded.");
            return Outcome::Completed(request.root.clone());
        }
        return Outcome::Failed(NO_MEDIA_MESSAGE.to_string());
    }
    Outcome::Completed(request.root.clone())
}

/// Runs the primary attempt and, for access errors, one retry with the
/// alternate client.
pub fn run(
    request: &DownloadRequest,
    engine: &dyn Engine,
    log: &RunLog,
    cancel: &CancelToken,
    events: &Sender<WorkerEvent>,
) -> Outcome {
    log.info(format!("Starting download: {}", request.url));
    let _skips = attach_skip_sink(log, cancel, events);

    let transcoder = engine.transcoder();
    if request.format == DownloadFormat::MP3 && transcoder.is_none() {
        return Outcome::Failed(NO_TRANSCODER_MESSAGE.to_string());
    }
    if let Err(e) = fs::create_dir_all(&request.root) {
        return Outcome::Failed(format!(
            "Cannot create download folder {}: {}",
            request.root.display(),
            e
        ));
    }

    let config = EngineConfig::build(request, transcoder);
    let mut hooks = RunHooks {
        cancel,
        events,
        log,
        saw_download: false,
    };

    let error = match engine.download(&request.url, &config, &mut hooks) {
        Ok(()) => return conclude_primary(request, log, cancel, hooks.saw_download),
        Err(EngineError::Cancelled) => return Outcome::Cancelled,
        Err(e) => e.to_string(),
    };
    log.warn(format!("Main attempt error: {}", error));

    if cancel.is_cancelled() {
        return Outcome::Cancelled;
    }
    if !is_access_restricted(&error) {
        return Outcome::Failed(error);
    }

    log.info(format!("Attempting fallback with the {} client", ALTERNATE_CLIENT));
    match engine.download(&request.url, &config.with_alternate_client(), &mut hooks) {
        Ok(()) if hooks.saw_download => return Outcome::Completed(request.root.clone()),
        Ok(()) => log.warn("Fallback attempt downloaded nothing"),
        Err(EngineError::Cancelled) => return Outcome::Cancelled,
        Err(e) => log.warn(format!("Fallback error: {}", e)),
    }

    if cancel.is_cancelled() {
        Outcome::Cancelled
    } else {
        Outcome::Failed(error)
    }
}

/// One download run on its own thread.
pub struct DownloadWorker {
    cancel: CancelToken,
    log: RunLog,
    handle: Option<thread::JoinHandle<()>>,
}

fn report(log: &RunLog, outcome: &Outcome, root: &Path) {
    match outcome {
        Outcome::Completed(_) => log.info(format!("Download finished: {}", root.display())),
        Outcome::Cancelled => log.info(CANCELLED_MESSAGE),
        Outcome::Failed(message) => log.error(format!("Download failed: {}", message)),
    }
}

impl DownloadWorker {
    /// Starts the run and returns at once. Exactly one
    /// [`WorkerEvent::Finished`] is sent on `events`.
    pub fn start(
        request: DownloadRequest,
        engine: Arc<dyn Engine>,
        log: RunLog,
        events: Sender<WorkerEvent>,
    ) -> Self {
        let cancel = CancelToken::default();
        let token = cancel.clone();
        let thread_log = log.clone();
        let thread_events = events.clone();

        let spawned = thread::Builder::new()
            .name("download-worker".to_string())
            .spawn(move || {
                let outcome = run(&request, engine.as_ref(), &thread_log, &token, &thread_events);
                report(&thread_log, &outcome, &request.root);
                let _ = thread_events.send(WorkerEvent::Finished(outcome));
            });

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                let outcome = Outcome::Failed(format!("Could not start download thread: {}", e));
                log.error(outcome.message());
                let _ = events.send(WorkerEvent::Finished(outcome));
                None
            }
        };

        Self { cancel, log, handle }
    }

    /// Takes effect at the engine's next progress callback.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            self.log.info("stop requested by user");
            self.cancel.cancel();
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("download worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_messages() {
        assert!(Outcome::Completed("/v".into()).is_success());
        assert_eq!(Outcome::Completed("/v".into()).message(), "/v");
        assert_eq!(Outcome::Cancelled.message(), "Cancelled by user");
        assert!(!Outcome::Failed("x".into()).is_success());
    }

    #[test]
    fn token_is_shared() {
        let token = CancelToken::default();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
