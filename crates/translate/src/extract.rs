//! Field extraction from line-oriented device output.
//!
//! Extraction never fails: a line that does not match is skipped and an
//! absent value is a valid outcome. Results always follow the line order of
//! the input text.
//!
//! Devices often print one logical record over several lines (a `router`
//! header followed by indented attributes). Folding such blocks into single
//! lines is done by the caller with [`realign`] or [`split_records`] before
//! extracting, and each reader documents which vendor quirk it handles.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashSet;
use std::net::Ipv4Addr;

/// Line preprocessing applied before matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Normalize {
    /// Match lines as printed
    #[default]
    None,
    /// Collapse runs of horizontal whitespace to one space and trim
    CollapseWhitespace,
}

impl Normalize {
    /// Apply the normalization to one line.
    pub fn apply(self, line: &str) -> Cow<'_, str> {
        match self {
            Self::None => Cow::Borrowed(line),
            Self::CollapseWhitespace => {
                Cow::Owned(line.split_whitespace().collect::<Vec<_>>().join(" "))
            }
        }
    }
}

/// Project every matching line through `project`, in line order.
///
/// The projector may return `None` to drop a line whose captures are present
/// but unusable (for example a number that does not parse).
pub fn extract_all<T, F>(
    text: &str,
    normalize: Normalize,
    pattern: &Regex,
    mut project: F,
) -> Vec<T>
where
    F: FnMut(&Captures<'_>) -> Option<T>,
{
    text.lines()
        .filter_map(|line| {
            let line = normalize.apply(line.trim_end_matches('\r'));
            pattern.captures(&line).and_then(|caps| project(&caps))
        })
        .collect()
}

/// First projected value, if any line matches.
pub fn extract_first<T, F>(
    text: &str,
    normalize: Normalize,
    pattern: &Regex,
    mut project: F,
) -> Option<T>
where
    F: FnMut(&Captures<'_>) -> Option<T>,
{
    text.lines().find_map(|line| {
        let line = normalize.apply(line.trim_end_matches('\r'));
        pattern.captures(&line).and_then(|caps| project(&caps))
    })
}

/// Named capture `group` of every matching line, duplicates removed.
///
/// The first occurrence of a key decides its position.
pub fn extract_keys(text: &str, normalize: Normalize, pattern: &Regex, group: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    extract_all(text, normalize, pattern, |caps| {
        caps.name(group).map(|m| m.as_str().trim().to_string())
    })
    .into_iter()
    .filter(|key| !key.is_empty() && seen.insert(key.clone()))
    .collect()
}

/// Named capture `group` of the first matching line.
pub fn extract_value(
    text: &str,
    normalize: Normalize,
    pattern: &Regex,
    group: &str,
) -> Option<String> {
    extract_first(text, normalize, pattern, |caps| {
        caps.name(group).map(|m| m.as_str().trim().to_string())
    })
}

/// Parsed named capture `group` of the first matching line.
///
/// Values that fail to parse are treated as absent.
pub fn extract_parsed<T: std::str::FromStr>(
    text: &str,
    normalize: Normalize,
    pattern: &Regex,
    group: &str,
) -> Option<T> {
    extract_first(text, normalize, pattern, |caps| {
        caps.name(group).and_then(|m| m.as_str().trim().parse().ok())
    })
}

// ============================================================================
// Block realignment
// ============================================================================

/// Group lines into records, each starting at a line matching `start`.
///
/// Lines before the first start line are dropped. Each record keeps its
/// original line breaks.
pub fn split_records(text: &str, start: &Regex) -> Vec<String> {
    let mut records: Vec<Vec<&str>> = Vec::new();
    for line in text.lines() {
        if start.is_match(line) {
            records.push(vec![line]);
        } else if let Some(current) = records.last_mut() {
            current.push(line);
        }
    }
    records.into_iter().map(|lines| lines.join("\n")).collect()
}

/// Fold every record (see [`split_records`]) into one line.
///
/// Continuation lines are trimmed and appended with a single space, so
///
/// ```text
/// ip vrf TEST
///  rd 65002:1
/// ```
///
/// becomes `ip vrf TEST rd 65002:1`.
pub fn realign(text: &str, start: &Regex) -> String {
    split_records(text, start)
        .iter()
        .map(|record| {
            record
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Indented lines following the first line that matches `header`.
///
/// The section ends at the next line with no leading whitespace. Returns the
/// empty string when the header is absent.
pub fn section_after(text: &str, header: &Regex) -> String {
    text.lines()
        .skip_while(|line| !header.is_match(line))
        .skip(1)
        .take_while(|line| line.starts_with([' ', '\t']))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Value helpers
// ============================================================================

/// Prefix length of a dotted-quad netmask (`255.255.255.0` → 24).
///
/// Non-contiguous or unparsable masks yield `None`.
pub fn mask_to_prefix(mask: &str) -> Option<u8> {
    let bits = u32::from(mask.trim().parse::<Ipv4Addr>().ok()?);
    let ones = bits.leading_ones();
    (bits.count_ones() == ones).then_some(ones as u8)
}

/// Strip one pair of surrounding double quotes.
pub fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
