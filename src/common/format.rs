use anyhow::{bail, Context, Result};
use colored::*;

use crate::scanner::RiskLevel;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;
const TB: u64 = GB * 1024;

/// Format bytes into human-readable size string
pub fn format_size(bytes: u64) -> String {
    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format size with color based on magnitude
pub fn format_size_colored(bytes: u64) -> ColoredString {
    let s = format_size(bytes);
    if bytes >= GB {
        s.red().bold()
    } else if bytes >= 100 * MB {
        s.yellow()
    } else {
        s.white()
    }
}

/// Signed size change, e.g. "+1.00 MB" / "-512 B" / "±0 B"
pub fn format_delta(delta: i64) -> String {
    match delta.signum() {
        1 => format!("+{}", format_size(delta.unsigned_abs())),
        -1 => format!("-{}", format_size(delta.unsigned_abs())),
        _ => "±0 B".to_string(),
    }
}

/// Growth in red, shrinkage in green
pub fn format_delta_colored(delta: i64) -> ColoredString {
    let s = format_delta(delta);
    match delta.signum() {
        1 => s.red(),
        -1 => s.green(),
        _ => s.dimmed(),
    }
}

/// Format item count with appropriate plural
pub fn format_count(count: usize) -> String {
    if count == 1 {
        "1 item".to_string()
    } else {
        format!("{} items", count)
    }
}

/// Format a path for display, replacing home directory with ~
pub fn format_path(path: &std::path::Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

/// Format duration in human-readable form
pub fn format_duration(secs: f64) -> String {
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{}m {:.0}s", mins, remaining)
    }
}

/// Colorize risk level
pub fn format_risk(risk: RiskLevel) -> ColoredString {
    match risk {
        RiskLevel::Safe => "Safe".green(),
        RiskLevel::Moderate => "Moderate".yellow(),
        RiskLevel::Risky => "Risky".red().bold(),
    }
}

/// Truncate a string to max length with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        ".".repeat(max_len)
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

/// Parse a size string like "100MB", "1G", "512k" or a plain byte count.
/// Units are 1024-based and case-insensitive.
pub fn parse_size(input: &str) -> Result<u64> {
    let s = input.trim();
    if s.is_empty() {
        bail!("empty size string");
    }

    let upper = s.to_ascii_uppercase();
    let suffixes: [(&str, u64); 9] = [
        ("TB", TB),
        ("GB", GB),
        ("MB", MB),
        ("KB", KB),
        ("T", TB),
        ("G", GB),
        ("M", MB),
        ("K", KB),
        ("B", 1),
    ];

    let (digits, mult) = suffixes
        .iter()
        .find_map(|(suffix, mult)| upper.strip_suffix(suffix).map(|rest| (rest.trim(), *mult)))
        .unwrap_or((upper.as_str(), 1));

    if digits.is_empty() {
        bail!("missing numeric value in {:?}", input);
    }
    let n: u64 = digits
        .parse()
        .with_context(|| format!("invalid size {:?}", input))?;
    n.checked_mul(mult)
        .with_context(|| format!("size {:?} is too large", input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(format_size(1073741824), "1.00 GB");
        assert_eq!(format_size(1099511627776), "1.00 TB");
    }

    #[test]
    fn test_format_delta() {
        assert_eq!(format_delta(0), "±0 B");
        assert_eq!(format_delta(1024), "+1.0 KB");
        assert_eq!(format_delta(-512), "-512 B");
        assert_eq!(format_delta(i64::MIN), format!("-{}", format_size(1u64 << 63)));
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0 items");
        assert_eq!(format_count(1), "1 item");
        assert_eq!(format_count(42), "42 items");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.5), "500ms");
        assert_eq!(format_duration(3.7), "3.7s");
        assert_eq!(format_duration(125.0), "2m 5s");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("abcd", 3), "...");
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("42").unwrap(), 42);
        assert_eq!(parse_size("512B").unwrap(), 512);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("100MB").unwrap(), 100 * 1024 * 1024);
        assert_eq!(parse_size("1g").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size(" 2T ").unwrap(), 2 * 1024_u64.pow(4));
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        assert!(parse_size("").is_err());
        assert!(parse_size("MB").is_err());
        assert!(parse_size("-5MB").is_err());
        assert!(parse_size("ten").is_err());
        assert!(parse_size("99999999999TB").is_err());
    }
}
