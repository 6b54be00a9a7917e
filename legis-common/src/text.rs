//! Text utilities: URL slugs, word-set similarity, truncation

use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Names whose word-set similarity falls below this are a significant change
pub const SIGNIFICANT_CHANGE_THRESHOLD: f64 = 0.7;

/// Build an ASCII URL slug
///
/// Text is NFKD-decomposed so accents split off as combining marks and
/// compatibility forms (ligatures, ordinals) become plain letters. Anything
/// left that is not an ASCII letter, digit, `_`, `-` or whitespace is dropped,
/// and runs of whitespace or hyphens become a single `-`.
///
/// ```
/// use legis_common::text::slugify;
/// assert_eq!(slugify("Não Binário"), "nao-binario");
/// assert_eq!(slugify("  Câmara aprova projeto!  "), "camara-aprova-projeto");
/// ```
pub fn slugify(value: &str) -> String {
    let mut cleaned = String::with_capacity(value.len());
    for c in value.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            cleaned.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() {
            cleaned.push(' ');
        }
    }

    let mut slug = String::with_capacity(cleaned.len());
    let mut pending_sep = false;
    for c in cleaned.trim().chars() {
        if c == '-' || c.is_whitespace() {
            pending_sep = true;
            continue;
        }
        if pending_sep && !slug.is_empty() {
            slug.push('-');
        }
        pending_sep = false;
        slug.push(c);
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Jaccard similarity of the whitespace-separated word sets of two strings
///
/// Inputs are lowercased and trimmed first. Two empty inputs have similarity 0.
pub fn word_jaccard(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();

    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count();
    intersection as f64 / union as f64
}

/// Whether a rename is large enough to warrant regenerating derived text
///
/// An empty previous name always counts as significant; names equal after
/// lowercasing and trimming never do; otherwise word-set similarity below
/// [`SIGNIFICANT_CHANGE_THRESHOLD`] is significant.
pub fn changed_significantly(previous: &str, current: &str) -> bool {
    if previous.is_empty() {
        return true;
    }

    let previous_norm = previous.trim().to_lowercase();
    let current_norm = current.trim().to_lowercase();
    if previous_norm == current_norm {
        return false;
    }

    if previous_norm.split_whitespace().next().is_none() {
        return true;
    }

    word_jaccard(&previous_norm, &current_norm) < SIGNIFICANT_CHANGE_THRESHOLD
}

/// Truncate to at most `max_chars` characters, ending with `...` when cut
pub fn truncate_with_ellipsis(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = value.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// First `max_chars` characters of a string
pub fn prefix_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Non-empty trimmed lines of a model answer
pub fn non_empty_lines(value: &str) -> Vec<String> {
    value
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
