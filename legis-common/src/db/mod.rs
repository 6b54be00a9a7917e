//! Database schema, models and queries

pub mod analyses;
pub mod charts;
pub mod choices;
pub mod dashboard;
pub mod deputies;
pub mod genders;
pub mod geography;
pub mod init;
pub mod news;
pub mod parties;
pub mod proposals;
pub mod speeches;
pub mod tasks;
pub mod users;
pub mod votings;

pub use choices::*;
pub use init::*;

/// Result of an upsert keyed on a natural key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl UpsertOutcome {
    pub fn from_existing(existed: bool) -> Self {
        if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        }
    }
}

/// Clause to append after every `LIKE ?` bound to a [`like_pattern`]
pub const LIKE_ESCAPE: &str = " ESCAPE '\\'";

/// `%term%` pattern for LIKE filters; `None` for blank input
///
/// `\`, `%` and `_` in the term are escaped so they match literally.
pub fn like_pattern(term: Option<&str>) -> Option<String> {
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern(Some(" pec ")).as_deref(), Some("%pec%"));
        assert_eq!(like_pattern(Some("   ")), None);
        assert_eq!(like_pattern(None), None);
        assert_eq!(like_pattern(Some("100%")).as_deref(), Some("%100\\%%"));
        assert_eq!(like_pattern(Some("a_b\\c")).as_deref(), Some("%a\\_b\\\\c%"));
    }
}
