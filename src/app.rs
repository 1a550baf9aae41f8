use eframe::egui;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{self, Settings, LOG_TAIL_LINES};
use crate::download::{DownloadRequest, DownloadWorker, Engine, Outcome, WorkerEvent, YtDlp};
use crate::localizations::Localizations;
use crate::logging::{self, RunLog};
use crate::models::{AppState, EntryStatus, ErrorReport, HistoryEntry};
use crate::ui::{self, UiAction};
use crate::validation::validate_url;

pub struct TubeFetchApp {
    pub state: AppState,
    settings: Settings,
    localizer: Localizations,
    engine: Option<Arc<dyn Engine>>,
    open_log: fn() -> RunLog,
    worker: Option<DownloadWorker>,
    events: Option<Receiver<WorkerEvent>>,
    log_path: Option<PathBuf>,
}

impl Default for TubeFetchApp {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

/// Makes sure the log file exists so a viewer can open it before the first run.
fn touch_log_file(path: &Path) -> bool {
    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir) {
            log::warn!("cannot create {}: {}", dir.display(), e);
            return false;
        }
    }
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(_) => true,
        Err(e) => {
            log::warn!("cannot create {}: {}", path.display(), e);
            false
        }
    }
}

impl TubeFetchApp {
    pub fn new(settings: Settings) -> Self {
        let localizer = Localizations::new();
        let mut state = AppState::new(&settings);
        state.status = localizer.text("status-ready");

        Self {
            state,
            settings,
            localizer,
            engine: None,
            open_log: RunLog::open_default,
            worker: None,
            events: None,
            log_path: None,
        }
    }

    /// Uses `engine` instead of locating yt-dlp, and `open_log` for each run's log.
    pub fn with_engine(mut self, engine: Arc<dyn Engine>, open_log: fn() -> RunLog) -> Self {
        self.engine = Some(engine);
        self.open_log = open_log;
        self
    }

    /// True from the click until the run's worker thread has ended and its
    /// final event was applied.
    pub fn is_running(&self) -> bool {
        self.state.is_downloading
            || self.worker.as_ref().map(DownloadWorker::is_running).unwrap_or(false)
    }

    fn engine(&mut self) -> anyhow::Result<Arc<dyn Engine>> {
        if let Some(engine) = &self.engine {
            return Ok(Arc::clone(engine));
        }
        let engine: Arc<dyn Engine> = Arc::new(YtDlp::locate()?);
        self.engine = Some(Arc::clone(&engine));
        Ok(engine)
    }

    fn build_request(&self, url: String) -> DownloadRequest {
        let root = match self.state.download_dir.trim() {
            "" => self.settings.default_root.clone(),
            dir => PathBuf::from(dir),
        };
        DownloadRequest::new(url, self.state.format, root)
            .max_height(self.state.max_height)
            .cookies(self.state.cookies_path.clone(), self.state.cookies_browser)
            .ignore_archive(self.state.ignore_archive)
    }

    pub fn start_download(&mut self) {
        if self.is_running() {
            return;
        }
        let url = match validate_url(&self.state.url) {
            Ok(url) => url,
            Err(e) => {
                log::info!("rejected url: {}", e);
                self.state.status = self.localizer.text(e.message_key());
                return;
            }
        };
        let request = self.build_request(url);
        self.begin(request);
    }

    fn begin(&mut self, request: DownloadRequest) {
        let engine = match self.engine() {
            Ok(engine) => engine,
            Err(e) => {
                log::error!("{:#}", e);
                let message = self.localizer.text("error-ytdlp-missing");
                self.state.status = message.clone();
                self.state.last_error = Some(message);
                return;
            }
        };

        let log = (self.open_log)();
        self.log_path = log.path().map(Path::to_path_buf);

        self.state
            .history
            .push_front(HistoryEntry::new(request.url.clone(), EntryStatus::Active));
        self.state.progress = 0.0;
        self.state.download_speed.clear();
        self.state.eta.clear();
        self.state.last_error = None;
        self.state.stats.reset();
        self.state.summary = None;
        self.state.is_downloading = true;
        self.state.stop_requested = false;
        self.state.last_request = Some(request.clone());

        let (tx, rx) = mpsc::channel();
        self.worker = Some(DownloadWorker::start(request, engine, log, tx));
        self.events = Some(rx);
    }

    pub fn stop_download(&mut self) {
        if let Some(worker) = &self.worker {
            if self.state.is_downloading {
                worker.stop();
                self.state.stop_requested = true;
                self.state.status = self.localizer.text("status-stopping");
            }
        }
    }

    /// Replays the last request with archive skipping on. The checkbox keeps
    /// whatever the user chose.
    pub fn resume_download(&mut self) {
        if self.is_running() {
            self.state.status = self.localizer.text("error-stop-first");
            return;
        }
        let Some(last) = &self.state.last_request else {
            self.state.status = self.localizer.text("error-nothing-to-resume");
            return;
        };
        let request = last.resumed();
        self.begin(request);
        if self.state.is_downloading {
            self.state.status = self.localizer.text("status-resuming");
        }
    }

    fn clear(&mut self) {
        self.state.url.clear();
        self.state.progress = 0.0;
    }

    fn current_log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .or_else(config::user_log_path)
            .unwrap_or_else(config::fallback_log_path)
    }

    fn open_log_file(&mut self) {
        let path = self.current_log_path();
        touch_log_file(&path);

        let spawned = if cfg!(target_os = "windows") {
            Command::new("cmd").arg("/C").arg("start").arg("").arg(&path).spawn()
        } else if cfg!(target_os = "macos") {
            Command::new("open").arg(&path).spawn()
        } else {
            Command::new("xdg-open").arg(&path).spawn()
        };
        if let Err(e) = spawned {
            log::warn!("cannot open log viewer: {}", e);
            let shown = path.to_string_lossy().to_string();
            self.state.status = self
                .localizer
                .format("log-location", &[("path", shown.as_str())]);
        }
    }

    /// Applies pending worker events. Returns text to put on the clipboard.
    pub fn drain_events(&mut self) -> Option<String> {
        let mut clipboard = None;
        let events: Vec<WorkerEvent> = match &self.events {
            Some(rx) => rx.try_iter().collect(),
            None => return None,
        };
        for event in events {
            if let Some(text) = self.apply_event(event) {
                clipboard = Some(text);
            }
        }
        clipboard
    }

    fn apply_event(&mut self, event: WorkerEvent) -> Option<String> {
        match event {
            WorkerEvent::Progress(progress) => {
                self.state.progress = progress.percent;
                let title = if progress.title.is_empty() {
                    self.localizer.text("status-downloading")
                } else {
                    progress.title
                };
                self.state.history.update_active(&title, progress.percent);
                if !self.state.stop_requested {
                    self.state.status = self.localizer.format(
                        "status-progress",
                        &[("speed", progress.speed.as_str()), ("eta", progress.eta.as_str())],
                    );
                }
                self.state.download_speed = progress.speed;
                self.state.eta = progress.eta;
                None
            }
            WorkerEvent::FileDone(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.to_string_lossy().to_string());
                self.state.history.insert_file(name);
                self.state.stats.completed += 1;
                None
            }
            WorkerEvent::Skipped(message) => {
                let text = message.trim();
                if !text.is_empty() {
                    self.state.stats.record_skip(text);
                    self.state.push_skipped(text.to_string());
                }
                None
            }
            WorkerEvent::Finished(outcome) => self.finish(outcome),
        }
    }

    fn finish(&mut self, outcome: Outcome) -> Option<String> {
        let mut clipboard = None;
        match &outcome {
            Outcome::Completed(_) => {
                self.state.history.finish_active(EntryStatus::Success);
                self.state.status = self.localizer.text("status-complete");
            }
            Outcome::Cancelled => {
                self.state.history.finish_active(EntryStatus::Error);
                self.state.status = self.localizer.text("status-stopped");
            }
            Outcome::Failed(message) => {
                self.state.history.finish_active(EntryStatus::Error);
                self.state.last_error = Some(message.clone());
                let log_tail = self
                    .log_path
                    .as_deref()
                    .map(|path| logging::read_tail(path, LOG_TAIL_LINES))
                    .unwrap_or_default();
                self.state.error_report = Some(ErrorReport {
                    message: message.clone(),
                    log_tail,
                });
                clipboard = Some(message.clone());
            }
        }

        self.state.progress = 0.0;
        self.state.download_speed.clear();
        self.state.eta.clear();
        self.state.is_downloading = false;
        self.state.stop_requested = false;
        self.events = None;
        if let Some(worker) = self.worker.take() {
            worker.join();
        }

        if let Some(request) = &self.state.last_request {
            self.state.summary = self.state.stats.summary(&request.archive_path());
        }
        clipboard
    }

    pub fn update_ui(&mut self, ctx: &egui::Context) {
        if let Some(text) = self.drain_events() {
            ctx.output_mut(|o| o.copied_text = text);
        }
        if self.state.is_downloading {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        let mut actions = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(self.localizer.text("app-title"));
            ui.add_space(10.0);

            let url_response = ui::render_url_input(ui, &mut self.state, &self.localizer);
            if url_response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                actions.push(UiAction::Download);
            }
            ui.add_space(6.0);
            ui::render_format_selector(ui, &mut self.state, &self.localizer);
            ui.add_space(6.0);
            ui::render_download_dir_selector(ui, &mut self.state, &self.localizer);
            ui.add_space(6.0);
            actions.extend(ui::render_extras(ui, &mut self.state, &self.localizer));
            ui.add_space(10.0);

            ui::render_history(ui, &self.state, &self.localizer);
            ui.add_space(6.0);
            ui::render_skipped(ui, &self.state, &self.localizer);
            ui.add_space(10.0);

            ui::render_status(ui, &self.state, &self.localizer);
            ui.add_space(10.0);
            actions.extend(ui::render_buttons(ui, &self.state, &self.localizer));
        });

        ui::render_browser_picker(ctx, &mut self.state, &self.localizer);
        ui::render_error_dialog(ctx, &mut self.state, &self.localizer);
        ui::render_summary_dialog(ctx, &mut self.state, &self.localizer);

        for action in actions {
            match action {
                UiAction::Download => self.start_download(),
                UiAction::Stop => self.stop_download(),
                UiAction::Resume => self.resume_download(),
                UiAction::Clear => self.clear(),
                UiAction::OpenLog => self.open_log_file(),
                UiAction::Exit => {
                    self.stop_download();
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            }
        }
    }
}

impl eframe::App for TubeFetchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_ui(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::{EngineConfig, EngineError, EngineHooks, EngineProgress, ProgressStatus};
    use crate::models::DownloadFormat;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Saves one file per attempt, or fails every attempt with `error`.
    struct OneShotEngine {
        error: Option<String>,
        seen: Mutex<Vec<EngineConfig>>,
    }

    impl Engine for OneShotEngine {
        fn download(&self, _url: &str, config: &EngineConfig, hooks: &mut dyn EngineHooks) -> Result<(), EngineError> {
            self.seen.lock().unwrap().push(config.clone());
            if let Some(error) = &self.error {
                hooks.on_log(log::Level::Error, &format!("[youtube] abc123: {}", error));
                return Err(EngineError::Failed(error.clone()));
            }
            hooks.on_progress(EngineProgress {
                status: ProgressStatus::Downloading {
                    percent: 50.0,
                    speed: "1MiB/s".into(),
                    eta: "00:01".into(),
                },
                title: "Clip".into(),
                filename: None,
            })?;
            hooks.on_progress(EngineProgress {
                status: ProgressStatus::Finished,
                title: "Clip".into(),
                filename: Some(PathBuf::from("/v/Video/001 - Video - Clip.mp4")),
            })?;
            Ok(())
        }

        fn transcoder(&self) -> Option<PathBuf> {
            None
        }
    }

    fn app(dir: &Path, error: Option<&str>) -> (TubeFetchApp, Arc<OneShotEngine>) {
        let engine = Arc::new(OneShotEngine {
            error: error.map(str::to_string),
            seen: Mutex::new(Vec::new()),
        });
        let mut app = TubeFetchApp::new(Settings::default()).with_engine(engine.clone(), RunLog::disabled);
        app.state.download_dir = dir.to_string_lossy().to_string();
        app.state.url = "https://youtu.be/abc123".to_string();
        (app, engine)
    }

    fn wait(app: &mut TubeFetchApp) -> Option<String> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut clipboard = None;
        while app.state.is_downloading {
            assert!(Instant::now() < deadline, "worker did not finish");
            if let Some(text) = app.drain_events() {
                clipboard = Some(text);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        clipboard
    }

    #[test]
    fn invalid_url_does_not_start() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, engine) = app(dir.path(), None);
        app.state.url = "https://vimeo.com/1".to_string();
        app.start_download();
        assert!(!app.state.is_downloading);
        assert_eq!(app.state.status, app.localizer.text("error-url-host"));
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn completed_run_updates_history_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _engine) = app(dir.path(), None);
        app.start_download();
        assert!(app.state.is_downloading);
        assert!(app.is_running());
        // A second click while running is ignored.
        app.start_download();

        assert_eq!(wait(&mut app), None);
        assert!(!app.is_running());
        let labels: Vec<String> = app.state.history.entries().iter().map(HistoryEntry::label).collect();
        assert_eq!(labels, vec!["✓ Clip", "✓ 001 - Video - Clip.mp4"]);
        assert_eq!(app.state.stats.completed, 1);
        let summary = app.state.summary.clone().unwrap();
        assert!(summary.starts_with("Completed: 1\nSkipped: 0"));
        assert!(summary.contains(".download-archive.txt"));
        assert!(app.state.error_report.is_none());
    }

    #[test]
    fn failure_copies_message_and_opens_report() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, engine) = app(dir.path(), Some("Private video"));
        app.start_download();

        assert_eq!(wait(&mut app), Some("Private video".to_string()));
        assert_eq!(app.state.last_error.as_deref(), Some("Private video"));
        assert_eq!(app.state.error_report.as_ref().unwrap().message, "Private video");
        assert_eq!(app.state.skipped.front().map(String::as_str), Some("[youtube] abc123: Private video"));
        assert_eq!(app.state.stats.skipped[0].reason, "Private video");
        assert_eq!(app.state.history.entries()[0].status, EntryStatus::Error);
        assert_eq!(engine.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn resume_forces_archive_but_keeps_checkbox() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, engine) = app(dir.path(), None);
        app.state.ignore_archive = true;
        app.state.format = DownloadFormat::MP4;
        app.start_download();
        wait(&mut app);

        app.resume_download();
        wait(&mut app);

        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].archive.is_none());
        assert!(seen[1].archive.is_some());
        assert!(app.state.ignore_archive);
        assert_eq!(app.state.last_request.as_ref().map(|r| r.ignore_archive), Some(false));
    }

    #[test]
    fn log_file_is_created_with_its_folder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");
        assert!(touch_log_file(&path));
        assert!(path.is_file());

        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        assert!(!touch_log_file(&blocker.join("logs").join("app.log")));
    }

    #[test]
    fn resume_without_history() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _engine) = app(dir.path(), None);
        app.resume_download();
        assert!(!app.state.is_downloading);
        assert_eq!(app.state.status, app.localizer.text("error-nothing-to-resume"));
    }
}
