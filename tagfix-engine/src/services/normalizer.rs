//! Text normalization and partial-date parsing
//!
//! Canonicalizes human-entered metadata so that two equivalent spellings
//! compare equal: Unicode NFKD decomposition, diacritic stripping, case
//! folding, and whitespace collapsing. All functions are pure.

use crate::models::DateComponents;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize text for comparison
///
/// NFKD-decomposes, drops combining marks (so "Björk" and "Bjork" agree),
/// lowercases, and collapses runs of whitespace to single spaces with the
/// ends trimmed. Not reversible; only used for equality and similarity.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether two strings are equal after normalization
pub fn are_equal(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Trim a value and treat blank as absent
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a partial date: `YYYY`, `YYYY-MM`, or `YYYY-MM-DD`
///
/// Any other shape (extra segments, non-numeric parts, out-of-range month or
/// day) yields `None`. Day-of-month validity beyond 1-31 is not checked; the
/// catalog is the authority on calendar correctness.
pub fn parse_date_components(text: &str) -> Option<DateComponents> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut parts = text.splitn(4, '-');

    let year_part = parts.next()?;
    if year_part.len() != 4 {
        return None;
    }
    let year: i32 = year_part.parse().ok()?;

    let month = match parts.next() {
        None => {
            return Some(DateComponents {
                year,
                month: None,
                day: None,
            })
        }
        Some(m) => {
            if m.len() != 2 {
                return None;
            }
            let month: u32 = m.parse().ok()?;
            if !(1..=12).contains(&month) {
                return None;
            }
            month
        }
    };

    let day = match parts.next() {
        None => {
            return Some(DateComponents {
                year,
                month: Some(month),
                day: None,
            })
        }
        Some(d) => {
            if d.len() != 2 {
                return None;
            }
            let day: u32 = d.parse().ok()?;
            if !(1..=31).contains(&day) {
                return None;
            }
            day
        }
    };

    // A fourth segment means the shape is not a date
    if parts.next().is_some() {
        return None;
    }

    Some(DateComponents {
        year,
        month: Some(month),
        day: Some(day),
    })
}
