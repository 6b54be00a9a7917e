//! Operator-facing console report shared by the sync commands

use legis_common::db::UpsertOutcome;
use std::io::{self, Write};

/// Separator width of the sync summaries
pub const RULE: usize = 60;
/// Separator width of the migration and seeding summaries
pub const WIDE_RULE: usize = 70;

/// Created / updated / failed counters of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCounts {
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
}

impl SyncCounts {
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
        }
    }

    /// Items written (created + updated)
    pub fn processed(&self) -> usize {
        self.created + self.updated
    }

    pub fn log(&self, what: &str) {
        tracing::info!(
            created = self.created,
            updated = self.updated,
            errors = self.errors,
            "{} finished",
            what
        );
    }
}

/// Suffix printed after a `Processando ...` line
pub fn outcome_marker(outcome: UpsertOutcome) -> &'static str {
    match outcome {
        UpsertOutcome::Created => " ✓ Criado",
        UpsertOutcome::Updated => " ↻ Atualizado",
    }
}

pub fn rule(out: &mut dyn Write, width: usize) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(width))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut counts = SyncCounts::default();
        counts.record(UpsertOutcome::Created);
        counts.record(UpsertOutcome::Updated);
        counts.record(UpsertOutcome::Updated);
        counts.errors += 1;
        assert_eq!(counts.processed(), 3);
        assert_eq!(counts.updated, 2);
    }

    #[test]
    fn test_rule() {
        let mut out = Vec::new();
        rule(&mut out, 5).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "=====\n");
    }
}
