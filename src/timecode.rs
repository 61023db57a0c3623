//! Playback positions given on the command line.

use anyhow::{Result, anyhow};

/// Parse `90`, `1:30`, `00:01:30`, `00:01:30.5` or `00:01:30,500` into milliseconds
pub fn parse_position(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Empty position"));
    }

    let normalized = trimmed.replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();
    if parts.len() > 3 {
        return Err(anyhow!("Invalid position '{}': expected [[HH:]MM:]SS[.mmm]", input));
    }

    let (last, leading) = parts.split_last().ok_or_else(|| anyhow!("Empty position"))?;
    let seconds: f64 = last
        .parse()
        .map_err(|_| anyhow!("Invalid seconds in position '{}'", input))?;
    if !seconds.is_finite() || seconds < 0.0 || (!leading.is_empty() && seconds >= 60.0) {
        return Err(anyhow!("Invalid seconds in position '{}'", input));
    }

    let mut total_ms = (seconds * 1000.0).round() as u64;
    let mut unit_ms = 60_000;
    for (i, part) in leading.iter().rev().enumerate() {
        let value: u64 = part
            .parse()
            .map_err(|_| anyhow!("Invalid component '{}' in position '{}'", part, input))?;
        if i == 0 && leading.len() == 2 && value >= 60 {
            return Err(anyhow!("Minutes must be below 60 in position '{}'", input));
        }
        total_ms = value
            .checked_mul(unit_ms)
            .and_then(|component_ms| total_ms.checked_add(component_ms))
            .ok_or_else(|| anyhow!("Position '{}' is out of range", input))?;
        unit_ms = unit_ms.saturating_mul(60);
    }

    Ok(total_ms)
}

/// `HH:MM:SS.mmm`
pub fn format_position(ms: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        ms / 3_600_000,
        (ms % 3_600_000) / 60_000,
        (ms % 60_000) / 1_000,
        ms % 1_000
    )
}

/// Seconds as ffmpeg expects them on the command line, without trailing zeros
pub fn format_seconds(ms: u64) -> String {
    let whole = ms / 1000;
    let frac = ms % 1000;
    if frac == 0 {
        whole.to_string()
    } else {
        format!("{}.{:03}", whole, frac).trim_end_matches('0').to_string()
    }
}
