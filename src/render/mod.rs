//! Dashboard rendering.
//!
//! Rendering happens in two steps. Payloads from the API are written into a
//! [`ViewBindings`] table (one element per logical field, built once at
//! startup), and [`screen::compose`] turns that table into terminal text.
//! Fields a payload does not mention keep whatever the previous render left
//! there.

pub mod bindings;
pub mod dashboard;
pub mod screen;

use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::{DateTime, Local};
use regex::Regex;

pub use bindings::{Bar, Element, Field, Indicator, ListItem, ListView, Tone, ViewBindings};

// ---------------------------------------------------------------------------
// Usage bars
// ---------------------------------------------------------------------------

/// Fill colour of a usage bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarTier {
    Green,
    Amber,
    Red,
}

impl BarTier {
    /// Red above 80, amber above 60, green otherwise. Both bounds are strict.
    pub fn for_percent(percent: f64) -> Self {
        if percent > 80.0 {
            Self::Red
        } else if percent > 60.0 {
            Self::Amber
        } else {
            Self::Green
        }
    }
}

/// `42.5` → `"42.5%"`, `45.0` → `"45%"`. One decimal place at most.
pub fn format_percent(percent: f64) -> String {
    let rounded = (percent * 10.0).round() / 10.0;
    format!("{rounded}%")
}

// ---------------------------------------------------------------------------
// Durations, timestamps, sizes
// ---------------------------------------------------------------------------

/// Render seconds using the two coarsest units that apply.
///
/// `Nd Nh Nm` when there is at least a day (seconds are dropped), `Nh Nm`
/// with at least an hour, `Nm Ns` with at least a minute, `Ns` otherwise.
pub fn format_duration(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// RFC 3339 timestamp in local time, or the sanitized input if it does not
/// parse.
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(ts) => ts
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        Err(_) => sanitize_text(raw).into_owned(),
    }
}

/// Human-readable byte count with binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

// ---------------------------------------------------------------------------
// Untrusted text
// ---------------------------------------------------------------------------

/// Matches terminal escape sequences: CSI `\x1b[...X`, OSC `\x1b]...ST`,
/// charset selection `\x1b(B` and the remaining two-byte `\x1bX` escapes.
static ESCAPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)?|\x1b[()][A-B0-2]|\x1b[@-~]",
    )
    .expect("escape regex must compile")
});

/// Make server-provided text safe to print.
///
/// Alert messages, log lines, usernames and the like come from the backend
/// and are displayed verbatim, so escape sequences are removed and every
/// remaining control character becomes a space. Without this a log message
/// could move the cursor, recolour or clear the operator's terminal.
pub fn sanitize_text(raw: &str) -> Cow<'_, str> {
    let needs_work = raw.chars().any(char::is_control);
    if !needs_work {
        return Cow::Borrowed(raw);
    }

    let stripped = ESCAPE_RE.replace_all(raw, "");
    let cleaned: String = stripped
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    Cow::Owned(cleaned)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
