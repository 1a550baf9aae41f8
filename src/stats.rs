use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRecord {
    pub id: String,
    pub reason: String,
    pub raw: String,
}

/// Counters for a single run, reset whenever a run starts.
#[derive(Debug, Default)]
pub struct RunStats {
    pub completed: usize,
    pub skipped: Vec<SkipRecord>,
}

const SUMMARY_SKIP_LIMIT: usize = 10;

fn skip_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\[youtube\]\s+([A-Za-z0-9_-]{6,})[: ]\s*(.*)").expect("valid skip pattern")
    })
}

/// Id of the playlist or video entry an engine error line names, if any.
pub fn item_id(text: &str) -> Option<&str> {
    skip_pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Pulls the item id out of an engine error line and maps known phrasings to
/// a short reason.
pub fn parse_skip(text: &str) -> SkipRecord {
    let mut id = None;
    let mut reason = text.to_string();
    if let Some(caps) = skip_pattern().captures(text) {
        id = caps.get(1).map(|m| m.as_str().to_string());
        if let Some(rest) = caps.get(2).filter(|m| !m.as_str().is_empty()) {
            reason = rest.as_str().to_string();
        }
    }

    let lower = reason.to_lowercase();
    let normalized = if lower.contains("private") {
        Some("Private video")
    } else if lower.contains("members only") {
        Some("Members only")
    } else if lower.contains("no video formats") || lower.contains("no formats") {
        Some("No downloadable formats")
    } else if lower.contains("http error 403") {
        Some("HTTP 403")
    } else if lower.contains("unavailable") {
        Some("Unavailable")
    } else {
        None
    };
    if let Some(normalized) = normalized {
        reason = normalized.to_string();
    }

    SkipRecord {
        id: id.unwrap_or_else(|| "?".to_string()),
        reason,
        raw: text.to_string(),
    }
}

impl RunStats {
    pub fn reset(&mut self) {
        self.completed = 0;
        self.skipped.clear();
    }

    pub fn record_skip(&mut self, text: &str) {
        self.skipped.push(parse_skip(text));
    }

    pub fn is_empty(&self) -> bool {
        self.completed == 0 && self.skipped.is_empty()
    }

    /// Post-run summary, or `None` when the run neither saved nor skipped anything.
    pub fn summary(&self, archive: &Path) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut lines = vec![
            format!("Completed: {}", self.completed),
            format!("Skipped: {}", self.skipped.len()),
        ];
        if !self.skipped.is_empty() {
            lines.push(String::new());
            lines.push(format!("Skipped items (first {}):", SUMMARY_SKIP_LIMIT));
            for skip in self.skipped.iter().take(SUMMARY_SKIP_LIMIT) {
                lines.push(format!("- {} : {}", skip.id, skip.reason));
            }
        }
        lines.push(String::new());
        lines.push(format!("Archive: {}", archive.display()));
        Some(lines.join("\n"))
    }
}
