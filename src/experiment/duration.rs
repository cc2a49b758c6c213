//! Duration string parsing
//!
//! Experiment durations travel as `<int><unit>` strings where the unit is one
//! of `s`, `m`, `h` (e.g. `"30s"`, `"5m"`, `"1h"`).

use std::sync::OnceLock;

use regex::Regex;

use crate::{Error, Result};

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)([smh])$").expect("duration pattern is valid"))
}

/// Parse a duration string into seconds.
///
/// # Errors
///
/// Returns [`Error::InvalidDuration`] if the string does not match
/// `<int><s|m|h>` or the magnitude does not fit in a `u64`.
pub fn parse_duration(duration: &str) -> Result<u64> {
    let caps = duration_re()
        .captures(duration)
        .ok_or_else(|| Error::InvalidDuration(duration.to_string()))?;

    let value: u64 = caps[1]
        .parse()
        .map_err(|_| Error::InvalidDuration(duration.to_string()))?;

    let multiplier = match &caps[2] {
        "s" => 1,
        "m" => 60,
        _ => 3600,
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| Error::InvalidDuration(duration.to_string()))
}

/// Format a number of seconds back into the wire form, e.g. `90` → `"90s"`.
#[must_use]
pub fn format_seconds(seconds: u64) -> String {
    format!("{seconds}s")
}
