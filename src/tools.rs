use log::debug;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;

// @module: Spawning of external command line tools (pdftotext, ffprobe, ffmpeg, chromium)

/// Run a program to completion and capture its output.
///
/// The child is killed when the returned future is dropped, so wrapping this
/// call in a timeout never leaves a stray process behind.
pub async fn run_tool<I, S>(program: &str, args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args).kill_on_drop(true);
    debug!("Running {:?}", command.as_std());

    let output = command
        .output()
        .await
        .map_err(|e| format!("Failed to execute {}: {}", program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            filter_stderr(&stderr)
        ));
    }

    Ok(output)
}

/// Query the duration of a media file in seconds with ffprobe
pub async fn probe_duration(ffprobe: &str, path: &Path) -> Result<f64, String> {
    let output = run_tool(
        ffprobe,
        [
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-show_entries"),
            OsStr::new("format=duration"),
            OsStr::new("-of"),
            OsStr::new("default=noprint_wrappers=1:nokey=1"),
            path.as_os_str(),
        ],
    )
    .await?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let duration = stdout
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Failed to parse media duration: '{}'", stdout.trim()))?;

    if !duration.is_finite() || duration <= 0.0 {
        return Err(format!("Media duration is not positive: {}", duration));
    }

    Ok(duration)
}

/// Keep the informative tail of a tool's stderr.
///
/// ffmpeg and chromium print banners and progress noise before the actual error.
pub fn filter_stderr(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            !line.starts_with("ffmpeg version")
                && !line.starts_with("built with")
                && !line.starts_with("configuration:")
                && !line.starts_with("lib")
                && !line.starts_with("frame=")
        })
        .collect();

    let start = lines.len().saturating_sub(5);
    lines[start..].join(" | ")
}

/// Lines of an ffmpeg concat demuxer list.
///
/// Each entry is a file and an optional display duration in seconds.
pub fn concat_list<'a>(entries: impl IntoIterator<Item = (&'a Path, Option<f64>)>) -> String {
    let mut list = String::new();
    for (path, duration) in entries {
        let escaped = path.to_string_lossy().replace('\'', "'\\''");
        list.push_str(&format!("file '{}'\n", escaped));
        if let Some(duration) = duration {
            list.push_str(&format!("duration {:.3}\n", duration));
        }
    }
    list
}
