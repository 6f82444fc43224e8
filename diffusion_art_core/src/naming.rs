use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

const PROMPT_PREFIX_CHARS: usize = 20;
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Filesystem-safe prefix of a prompt: the first 20 characters, keeping only alphanumerics,
/// spaces, `-` and `_`, with trailing whitespace removed.
pub fn sanitize_prompt(prompt: &str) -> String {
    let safe: String = prompt
        .chars()
        .take(PROMPT_PREFIX_CHARS)
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    safe.trim_end().to_string()
}

/// `art_{prompt}_{W}x{H}_{timestamp}.png`
pub fn output_file_name<Tz: TimeZone>(
    prompt: &str,
    width: usize,
    height: usize,
    timestamp: &DateTime<Tz>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "art_{}_{width}x{height}_{}.png",
        sanitize_prompt(prompt),
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

/// `art_fallback_{timestamp}.png`
pub fn fallback_file_name<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("art_fallback_{}.png", timestamp.format(TIMESTAMP_FORMAT))
}

/// Join `name` onto `dir`, appending `_1`, `_2`, ... to the stem while the path is taken.
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (name, None),
    };
    (1..)
        .map(|i| match ext {
            Some(ext) => dir.join(format!("{stem}_{i}.{ext}")),
            None => dir.join(format!("{stem}_{i}")),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
