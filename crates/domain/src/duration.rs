/// Parses a `m:ss` / `mm:ss` track length into whole seconds.
///
/// Minutes may have any number of digits; seconds must be exactly two digits
/// in `00..=59`.
#[must_use]
pub fn parse_duration(text: &str) -> Option<u32> {
    let (minutes, seconds) = text.trim().split_once(':')?;
    if minutes.is_empty() || seconds.len() != 2 {
        return None;
    }
    if !minutes.bytes().chain(seconds.bytes()).all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    let minutes = minutes.parse::<u32>().ok()?;
    let seconds = seconds.parse::<u32>().ok()?;
    if seconds > 59 {
        return None;
    }

    minutes.checked_mul(60)?.checked_add(seconds)
}

/// Renders whole seconds as zero-padded `mm:ss`.
#[must_use]
pub fn format_duration(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
