use std::time::{SystemTime, UNIX_EPOCH};

use url::Url;

use crate::domain::FetchError;

/// Get current Unix timestamp in seconds
pub fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// `[HH:MM:SS]` wall clock (UTC) for the given Unix timestamp
pub fn clock_stamp(timestamp: u64) -> String {
    let secs = timestamp % 86_400;
    format!(
        "[{:02}:{:02}:{:02}]",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Derive the on-disk name of a download from the last segment of its URL.
///
/// Traversal segments and separators are rejected outright; characters that
/// are merely awkward on some platforms are replaced.
pub fn file_name_from_url(url: &Url) -> Result<String, FetchError> {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    if segment.is_empty() {
        return Err(FetchError::InvalidFileName(format!(
            "{} has no final path segment",
            url
        )));
    }
    if segment == "." || segment == ".." || segment.contains(['/', '\\']) {
        return Err(FetchError::InvalidFileName(format!(
            "unsafe segment {:?}",
            segment
        )));
    }

    let name = sanitize_filename(segment);
    let name = name.trim_end_matches(['.', ' ']);
    if name.is_empty() || name.chars().all(|c| c == '.') {
        return Err(FetchError::InvalidFileName(format!(
            "unsafe segment {:?}",
            segment
        )));
    }
    Ok(name.to_string())
}

/// Human readable byte count, binary units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
