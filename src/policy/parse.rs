//! Splitting model output into discrete recommendations.

use crate::domain::PolicyList;

/// Split `text` on list enumerators (`1.`, `12. ` ...) and return the trimmed,
/// non-empty fragments in order.
///
/// An enumerator must start a line (leading spaces allowed), and the period
/// must not be followed by another digit. Decimals such as `437.2` and years
/// ending a sentence stay inside their recommendation.
/// Text without any enumerator comes back as a single element.
pub fn parse_policies(text: &str) -> PolicyList {
    let mut fragments = Vec::new();
    let mut start = 0;
    for (at, end) in enumerators(text) {
        fragments.push(&text[start..at]);
        start = end;
    }
    fragments.push(&text[start..]);

    fragments
        .into_iter()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// Byte ranges `(start, end)` of every enumerator, `end` past any trailing whitespace.
fn enumerators(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() || !starts_line(bytes, i) {
            i += 1;
            continue;
        }

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        let is_enumerator = bytes.get(j) == Some(&b'.')
            && !bytes.get(j + 1).is_some_and(u8::is_ascii_digit);
        if !is_enumerator {
            i = j;
            continue;
        }

        let mut end = j + 1;
        while let Some(c) = text[end..].chars().next().filter(|c| c.is_whitespace()) {
            end += c.len_utf8();
        }
        found.push((i, end));
        i = end;
    }
    found
}

/// Only spaces or tabs sit between `i` and the start of its line.
fn starts_line(bytes: &[u8], i: usize) -> bool {
    bytes[..i]
        .iter()
        .rev()
        .find(|b| !matches!(b, b' ' | b'\t'))
        .is_none_or(|b| matches!(b, b'\n' | b'\r'))
}
