use anyhow::Context;
use log::Level;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread;

use super::engine::{is_item_failure, Engine, EngineError, EngineHooks, EngineProgress, ProgressStatus};
use super::options::EngineConfig;
use crate::tools;

const PROGRESS_PREFIX: &str = "PROGRESS|";
const PROGRESS_TEMPLATE: &str = "download:PROGRESS|%(progress.status)s|%(progress._percent_str)s|\
%(progress._speed_str)s|%(progress._eta_str)s|%(info.title)s|%(progress.filename)s";

/// yt-dlp prints this for template fields it has no value for.
const MISSING: &str = "NA";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Progress(EngineProgress),
    Log(Level, String),
}

/// Drives the `yt-dlp` executable as a child process.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    ffmpeg: Option<PathBuf>,
}

fn field(value: &str) -> String {
    let value = value.trim();
    if value == MISSING {
        String::new()
    } else {
        value.to_string()
    }
}

fn parse_progress(rest: &str) -> Option<EngineProgress> {
    let (head, filename) = rest.rsplit_once('|')?;
    let mut parts = head.splitn(5, '|');
    let status = parts.next()?.trim();
    let percent = parts.next()?;
    let speed = parts.next()?;
    let eta = parts.next()?;
    let title = parts.next()?;

    let status = match status {
        "downloading" => ProgressStatus::Downloading {
            percent: percent
                .trim()
                .trim_end_matches('%')
                .parse::<f32>()
                .unwrap_or(0.0)
                .clamp(0.0, 100.0),
            speed: field(speed),
            eta: field(eta),
        },
        "finished" => ProgressStatus::Finished,
        _ => return None,
    };
    let filename = field(filename);
    Some(EngineProgress {
        status,
        title: field(title),
        filename: (!filename.is_empty()).then(|| PathBuf::from(filename)),
    })
}

pub fn parse_line(line: &str, stream: Stream) -> Option<ParsedLine> {
    let line = line.trim_end();
    if line.is_empty() {
        return None;
    }
    if let Some(rest) = line.strip_prefix(PROGRESS_PREFIX) {
        return parse_progress(rest).map(ParsedLine::Progress);
    }
    if let Some(message) = line.strip_prefix("ERROR: ") {
        return Some(ParsedLine::Log(Level::Error, message.to_string()));
    }
    if let Some(message) = line.strip_prefix("WARNING: ") {
        return Some(ParsedLine::Log(Level::Warn, message.to_string()));
    }
    let level = match stream {
        Stream::Stdout => Level::Debug,
        Stream::Stderr => Level::Info,
    };
    Some(ParsedLine::Log(level, line.to_string()))
}

fn spawn_reader<R>(source: R, stream: Stream, tx: Sender<(Stream, String)>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let reader = BufReader::new(source);
        for line in reader.lines() {
            let Ok(line) = line else { break };
            if tx.send((stream, line)).is_err() {
                break;
            }
        }
    });
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>, ffmpeg: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ffmpeg,
        }
    }

    /// Finds yt-dlp on `PATH` and ffmpeg via [`tools::locate_ffmpeg`].
    pub fn locate() -> anyhow::Result<Self> {
        let program = which::which("yt-dlp").context("yt-dlp not found in PATH")?;
        Ok(Self::new(program, tools::locate_ffmpeg()))
    }

    pub fn command(&self, url: &str, config: &EngineConfig) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("--quiet")
            .arg("--progress")
            .arg("--newline")
            .arg("--no-colors")
            .arg("--progress-template")
            .arg(PROGRESS_TEMPLATE)
            .args(config.to_args())
            .arg("--")
            .arg(url);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            command.creation_flags(CREATE_NO_WINDOW);
        }
        command
    }
}

impl Engine for YtDlp {
    fn download(
        &self,
        url: &str,
        config: &EngineConfig,
        hooks: &mut dyn EngineHooks,
    ) -> Result<(), EngineError> {
        let mut child = self
            .command(url, config)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let (tx, rx) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, Stream::Stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, Stream::Stderr, tx.clone());
        }
        drop(tx);

        let mut saw_download = false;
        let mut item_failures = 0usize;
        let mut attempt_error: Option<String> = None;

        for (stream, line) in rx {
            match parse_line(&line, stream) {
                Some(ParsedLine::Progress(progress)) => {
                    saw_download = true;
                    if hooks.on_progress(progress).is_err() {
                        if let Err(e) = child.kill() {
                            log::warn!("failed to kill yt-dlp: {}", e);
                        }
                        let _ = child.wait();
                        return Err(EngineError::Cancelled);
                    }
                }
                Some(ParsedLine::Log(level, message)) => {
                    if level == Level::Error {
                        if is_item_failure(&message) {
                            item_failures += 1;
                        } else {
                            attempt_error = Some(message.clone());
                        }
                    }
                    hooks.on_log(level, &message);
                }
                None => {}
            }
        }

        let status = child.wait()?;
        // With --ignore-errors yt-dlp exits non-zero whenever any entry
        // failed. That only fails the attempt when nothing was saved and no
        // per-entry error accounts for it.
        if status.success() || saw_download {
            return Ok(());
        }
        match attempt_error {
            Some(message) => Err(EngineError::Failed(message)),
            None if item_failures > 0 => {
                log::debug!("yt-dlp exited with {} after {} skipped entries", status, item_failures);
                Ok(())
            }
            None => Err(EngineError::Failed(format!("yt-dlp exited with {}", status))),
        }
    }

    fn transcoder(&self) -> Option<PathBuf> {
        self.ffmpeg.clone()
    }
}
