//! Span-level text diffing
//!
//! Produces the `DiffPart` lists shown to operators alongside a modified
//! field. Short strings are diffed per character; long strings per word, so a
//! long description does not dissolve into single-character noise.
//!
//! The algorithm is a longest-common-subsequence walk over tokens with
//! adjacent same-kind tokens coalesced into spans. In a replaced region,
//! removed spans are emitted before added spans.

use crate::models::DiffPart;

/// Above this length (in chars, on either side) the differ switches from
/// character tokens to word tokens
const CHAR_DIFF_MAX_LEN: usize = 100;

/// Diff two strings into display spans
///
/// Chooses character-level tokens when `max(len) <= 100`, word-level above.
/// Equal inputs yield a single unchanged span (or nothing for two empties).
pub fn diff_parts(current: &str, source: &str) -> Vec<DiffPart> {
    let max_len = current.chars().count().max(source.chars().count());
    if max_len <= CHAR_DIFF_MAX_LEN {
        diff_chars(current, source)
    } else {
        diff_words(current, source)
    }
}

/// Character-level diff
pub fn diff_chars(current: &str, source: &str) -> Vec<DiffPart> {
    let a: Vec<String> = current.chars().map(String::from).collect();
    let b: Vec<String> = source.chars().map(String::from).collect();
    diff_tokens(&a, &b)
}

/// Word-level diff (whitespace runs are tokens of their own, so spacing
/// survives reassembly)
pub fn diff_words(current: &str, source: &str) -> Vec<DiffPart> {
    let a = tokenize_words(current);
    let b = tokenize_words(source);
    diff_tokens(&a, &b)
}

/// Split into alternating word and whitespace tokens
fn tokenize_words(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_is_ws: Option<bool> = None;

    for c in text.chars() {
        let is_ws = c.is_whitespace();
        if current_is_ws != Some(is_ws) && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        current_is_ws = Some(is_ws);
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// LCS diff over pre-tokenized inputs, coalesced into spans
fn diff_tokens(a: &[String], b: &[String]) -> Vec<DiffPart> {
    let table = lcs_suffix_table(a, b);

    let mut parts: Vec<DiffPart> = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            push_span(&mut parts, DiffPart::equal(&a[i]));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            push_span(&mut parts, DiffPart::removed(&a[i]));
            i += 1;
        } else {
            push_span(&mut parts, DiffPart::added(&b[j]));
            j += 1;
        }
    }
    while i < a.len() {
        push_span(&mut parts, DiffPart::removed(&a[i]));
        i += 1;
    }
    while j < b.len() {
        push_span(&mut parts, DiffPart::added(&b[j]));
        j += 1;
    }

    parts
}

/// `table[i][j]` = length of the LCS of `a[i..]` and `b[j..]`
fn lcs_suffix_table(a: &[String], b: &[String]) -> Vec<Vec<usize>> {
    let n = a.len();
    let m = b.len();
    let mut table = vec![vec![0usize; m + 1]; n + 1];

    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if a[i] == b[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    table
}

/// Append a one-token span, merging into the previous span when the kind
/// matches
fn push_span(parts: &mut Vec<DiffPart>, part: DiffPart) {
    if let Some(last) = parts.last_mut() {
        if last.added == part.added && last.removed == part.removed {
            last.value.push_str(&part.value);
            return;
        }
    }
    parts.push(part);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reassemble the current side (unchanged + removed spans)
    fn current_side(parts: &[DiffPart]) -> String {
        parts
            .iter()
            .filter(|p| !p.added)
            .map(|p| p.value.as_str())
            .collect()
    }

    /// Reassemble the source side (unchanged + added spans)
    fn source_side(parts: &[DiffPart]) -> String {
        parts
            .iter()
            .filter(|p| !p.removed)
            .map(|p| p.value.as_str())
            .collect()
    }

    #[test]
    fn test_equal_strings_single_span() {
        let parts = diff_parts("Abbey Road", "Abbey Road");
        assert_eq!(parts, vec![DiffPart::equal("Abbey Road")]);
    }

    #[test]
    fn test_remaster_suffix_is_added_span() {
        let parts = diff_parts("Abbey Road", "Abbey Road (Remastered)");

        assert!(parts
            .iter()
            .any(|p| p.added && p.value.contains("(Remastered)")));
        assert!(!parts.iter().any(|p| p.removed));
        assert_eq!(current_side(&parts), "Abbey Road");
        assert_eq!(source_side(&parts), "Abbey Road (Remastered)");
    }

    #[test]
    fn test_replacement_orders_removed_before_added() {
        let parts = diff_parts("abc", "axc");
        assert_eq!(
            parts,
            vec![
                DiffPart::equal("a"),
                DiffPart::removed("b"),
                DiffPart::added("x"),
                DiffPart::equal("c"),
            ]
        );
    }

    #[test]
    fn test_sides_reassemble_exactly() {
        let cases = [
            ("", "Something"),
            ("Something", ""),
            ("Come Together", "Here Comes the Sun"),
            ("Let It Be", "Let It Be... Naked"),
        ];
        for (a, b) in cases {
            let parts = diff_parts(a, b);
            assert_eq!(current_side(&parts), a, "current side for {:?}", (a, b));
            assert_eq!(source_side(&parts), b, "source side for {:?}", (a, b));
        }
    }

    #[test]
    fn test_long_strings_use_word_tokens() {
        let base = "the quick brown fox jumps over the lazy dog ".repeat(4);
        let current = format!("{}and stops", base);
        let source = format!("{}and sleeps", base);

        let parts = diff_parts(&current, &source);

        // Word-level: whole words change, not character fragments
        assert!(parts.iter().any(|p| p.removed && p.value == "stops"));
        assert!(parts.iter().any(|p| p.added && p.value == "sleeps"));
        assert_eq!(current_side(&parts), current);
        assert_eq!(source_side(&parts), source);
    }

    #[test]
    fn test_word_tokenizer_preserves_spacing() {
        let tokens = tokenize_words("two  spaces here");
        assert_eq!(tokens, vec!["two", "  ", "spaces", " ", "here"]);
    }
}
