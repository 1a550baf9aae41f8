use std::path::PathBuf;

use super::request::DownloadRequest;
use crate::models::{Browser, DownloadFormat};

pub const CONCURRENT_FRAGMENTS: u32 = 5;
pub const HTTP_CHUNK_SIZE: u64 = 10 * 1024 * 1024;
pub const RETRIES: u32 = 30;
pub const FRAGMENT_RETRIES: u32 = 20;

pub const AUDIO_CODEC: &str = "mp3";
pub const AUDIO_QUALITY_KBPS: u32 = 320;

/// Standard rungs tried below the requested height, highest first.
pub const FALLBACK_HEIGHTS: [u32; 3] = [720, 480, 360];

const H264: &str = "[vcodec~='^(avc1|avc|h264)']";
const PLAYER_CLIENTS: [&str; 4] = ["web", "ios", "android", "tvhtml5"];
const EXTRACTOR_SKIP: [&str; 2] = ["dash", "hls"];
pub const ALTERNATE_CLIENT: &str = "ios";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieSource {
    File(PathBuf),
    Browser(Browser),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioExtract {
    pub codec: &'static str,
    pub quality_kbps: u32,
}

/// Options handed to the engine for a single attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub output_template: String,
    pub format: String,
    pub format_sort: Vec<String>,
    pub merge_output_format: Option<&'static str>,
    pub extract_audio: Option<AudioExtract>,
    pub retries: u32,
    pub fragment_retries: u32,
    pub concurrent_fragments: u32,
    /// Zero disables chunked HTTP requests.
    pub http_chunk_size: u64,
    pub headers: Vec<(&'static str, String)>,
    pub player_clients: Vec<String>,
    pub extractor_skip: Vec<String>,
    pub archive: Option<PathBuf>,
    pub ffmpeg_location: Option<PathBuf>,
    pub cookies: Option<CookieSource>,
    pub autonumber_start: u32,
    pub ignore_errors: bool,
    pub continue_partial: bool,
    pub overwrite: bool,
    pub geo_bypass: bool,
}

/// Format alternatives for a height bound, in the order the engine tries them.
pub fn video_format_ladder(mh: u32) -> Vec<String> {
    let mut formats = vec![
        format!("bestvideo[height={mh}]{H264}+bestaudio[ext=m4a]"),
        format!("bestvideo[height={mh}]+bestaudio"),
    ];
    for rung in FALLBACK_HEIGHTS.into_iter().filter(|rung| *rung < mh) {
        formats.push(format!("bestvideo[height={rung}]{H264}+bestaudio[ext=m4a]"));
        formats.push(format!("bestvideo[height={rung}]+bestaudio"));
    }
    formats.push(format!("bestvideo[height<={mh}]{H264}+bestaudio[ext=m4a]"));
    formats.push(format!("bestvideo[height<={mh}]+bestaudio"));
    formats.push("bestvideo+bestaudio".to_string());
    formats.push("best".to_string());
    formats
}

fn output_template(request: &DownloadRequest) -> String {
    request
        .root
        .join("%(playlist_title|Video)s")
        .join("%(playlist_index|autonumber)03d - %(playlist_title|Video)s - %(title)s.%(ext)s")
        .to_string_lossy()
        .to_string()
}

fn cookie_source(request: &DownloadRequest) -> Option<CookieSource> {
    match (&request.cookies_file, request.cookies_browser) {
        (Some(file), _) if file.exists() => Some(CookieSource::File(file.clone())),
        (_, Some(browser)) => Some(CookieSource::Browser(browser)),
        _ => None,
    }
}

impl EngineConfig {
    pub fn build(request: &DownloadRequest, ffmpeg_location: Option<PathBuf>) -> Self {
        let mh = request.height_bound();
        let (format, format_sort, merge_output_format, extract_audio) = match request.format {
            DownloadFormat::MP4 => (
                video_format_ladder(mh).join("/"),
                vec![
                    format!("res:{mh}"),
                    "vcodec:h264".to_string(),
                    "acodec:m4a".to_string(),
                ],
                Some("mp4"),
                None,
            ),
            DownloadFormat::MP3 => (
                "bestaudio/best".to_string(),
                Vec::new(),
                None,
                Some(AudioExtract {
                    codec: AUDIO_CODEC,
                    quality_kbps: AUDIO_QUALITY_KBPS,
                }),
            ),
        };

        Self {
            output_template: output_template(request),
            format,
            format_sort,
            merge_output_format,
            extract_audio,
            retries: RETRIES,
            fragment_retries: FRAGMENT_RETRIES,
            concurrent_fragments: CONCURRENT_FRAGMENTS,
            http_chunk_size: HTTP_CHUNK_SIZE,
            headers: vec![
                ("User-Agent", USER_AGENT.to_string()),
                ("Referer", "https://www.google.com/".to_string()),
                ("Origin", "https://www.youtube.com".to_string()),
                ("Accept-Language", "en-US,en;q=0.9".to_string()),
                ("Connection", "keep-alive".to_string()),
            ],
            player_clients: PLAYER_CLIENTS.iter().map(|c| c.to_string()).collect(),
            extractor_skip: EXTRACTOR_SKIP.iter().map(|s| s.to_string()).collect(),
            archive: (!request.ignore_archive).then(|| request.archive_path()),
            ffmpeg_location,
            cookies: cookie_source(request),
            autonumber_start: 1,
            ignore_errors: true,
            continue_partial: true,
            overwrite: false,
            geo_bypass: true,
        }
    }

    /// Copy used for the access-restricted retry: alternate client, no chunking.
    pub fn with_alternate_client(&self) -> Self {
        Self {
            player_clients: vec![ALTERNATE_CLIENT.to_string()],
            http_chunk_size: 0,
            ..self.clone()
        }
    }

    pub fn extractor_args(&self) -> String {
        let mut parts = Vec::new();
        if !self.player_clients.is_empty() {
            parts.push(format!("player_client={}", self.player_clients.join(",")));
        }
        if !self.extractor_skip.is_empty() {
            parts.push(format!("skip={}", self.extractor_skip.join(",")));
        }
        format!("youtube:{}", parts.join(";"))
    }

    /// yt-dlp command-line rendering of these options.
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--output".into(),
            self.output_template.clone(),
            "--autonumber-start".into(),
            self.autonumber_start.to_string(),
            "--yes-playlist".into(),
            "--format".into(),
            self.format.clone(),
        ];
        if !self.format_sort.is_empty() {
            args.push("--format-sort".into());
            args.push(self.format_sort.join(","));
        }
        if let Some(container) = self.merge_output_format {
            args.push("--merge-output-format".into());
            args.push(container.into());
        }
        if let Some(audio) = self.extract_audio {
            args.push("--extract-audio".into());
            args.push("--audio-format".into());
            args.push(audio.codec.into());
            args.push("--audio-quality".into());
            args.push(format!("{}K", audio.quality_kbps));
        }

        args.push("--retries".into());
        args.push(self.retries.to_string());
        args.push("--fragment-retries".into());
        args.push(self.fragment_retries.to_string());
        args.push("--concurrent-fragments".into());
        args.push(self.concurrent_fragments.to_string());
        if self.http_chunk_size > 0 {
            args.push("--http-chunk-size".into());
            args.push(self.http_chunk_size.to_string());
        }

        for (name, value) in &self.headers {
            args.push("--add-header".into());
            args.push(format!("{}:{}", name, value));
        }
        args.push("--extractor-args".into());
        args.push(self.extractor_args());

        if let Some(archive) = &self.archive {
            args.push("--download-archive".into());
            args.push(archive.to_string_lossy().to_string());
        }
        if let Some(dir) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".into());
            args.push(dir.to_string_lossy().to_string());
        }
        match &self.cookies {
            Some(CookieSource::File(file)) => {
                args.push("--cookies".into());
                args.push(file.to_string_lossy().to_string());
            }
            Some(CookieSource::Browser(browser)) => {
                args.push("--cookies-from-browser".into());
                args.push(browser.as_str().into());
            }
            None => {}
        }

        if self.ignore_errors {
            args.push("--ignore-errors".into());
        }
        if self.continue_partial {
            args.push("--continue".into());
        }
        args.push(if self.overwrite { "--force-overwrites" } else { "--no-overwrites" }.into());
        if self.geo_bypass {
            args.push("--geo-bypass".into());
        }
        args
    }
}
