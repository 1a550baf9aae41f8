use std::path::{Path, PathBuf};

fn ffmpeg_file_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "ffmpeg.exe"
    } else {
        "ffmpeg"
    }
}

/// Directory holding an ffmpeg binary: `PATH` first, then `ffmpeg/bin` next to
/// the executable, then `ffmpeg/bin` one level above it.
pub fn locate_ffmpeg() -> Option<PathBuf> {
    if let Ok(found) = which::which("ffmpeg") {
        if let Some(dir) = found.parent() {
            return Some(dir.to_path_buf());
        }
    }
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))?;
    find_bundled_ffmpeg(&exe_dir)
}

pub fn find_bundled_ffmpeg(exe_dir: &Path) -> Option<PathBuf> {
    let candidates = [
        exe_dir.join("ffmpeg").join("bin"),
        exe_dir.join("..").join("ffmpeg").join("bin"),
    ];
    candidates
        .into_iter()
        .find(|dir| dir.join(ffmpeg_file_name()).is_file())
}
