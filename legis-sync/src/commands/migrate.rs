//! `migrate-tipos-proposicao [--dry-run]`
//!
//! Moves proposals typed only by the legacy `tipo_legado` text to the
//! `tipo_id` foreign key. Among several types sharing a sigla the one with
//! the lowest numeric code is chosen.

use crate::report::{rule, WIDE_RULE};
use legis_common::db::proposals::{
    find_proposal_type_by_sigla, list_untyped_proposals, set_proposal_type, type_coverage, UntypedProposal,
};
use legis_common::Result;
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use std::io::Write;
use tracing::{info, warn};

/// Lines printed per category before going quiet
const VERBOSE_LINES: usize = 10;
/// Beyond the first lines, every Nth migration is still printed
const PROGRESS_EVERY: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub migrated: usize,
    pub not_found: usize,
    pub errors: usize,
    /// Distinct legacy siglas with no matching type, sorted
    pub unknown_siglas: BTreeSet<String>,
}

impl MigrationSummary {
    pub fn processed(&self) -> usize {
        self.migrated + self.not_found + self.errors
    }
}

enum Step {
    Migrated { sigla: String, cod: String },
    NotFound,
}

async fn migrate_one(pool: &SqlitePool, proposal: &UntypedProposal, dry_run: bool) -> Result<Step> {
    let Some(tipo) = find_proposal_type_by_sigla(pool, &proposal.tipo_legado).await? else {
        return Ok(Step::NotFound);
    };
    if !dry_run {
        set_proposal_type(pool, proposal.id, tipo.id).await?;
    }
    Ok(Step::Migrated {
        sigla: tipo.sigla,
        cod: tipo.cod,
    })
}

pub async fn migrate_proposal_types(
    pool: &SqlitePool,
    dry_run: bool,
    out: &mut dyn Write,
) -> Result<MigrationSummary> {
    if dry_run {
        writeln!(out, "MODO DRY-RUN: Nenhuma alteração será salva\n")?;
    }
    writeln!(out, "Iniciando migração dos tipos de proposição...\n")?;

    let candidates = list_untyped_proposals(pool).await?;
    writeln!(out, "Encontradas {} proposições para migrar\n", candidates.len())?;

    let mut summary = MigrationSummary::default();
    if candidates.is_empty() {
        writeln!(out, "Nenhuma proposição precisa ser migrada!")?;
        return Ok(summary);
    }
    info!(candidates = candidates.len(), dry_run, "Migrating legacy proposal types");

    for proposal in &candidates {
        match migrate_one(pool, proposal, dry_run).await {
            Ok(Step::Migrated { sigla, cod }) => {
                summary.migrated += 1;
                if summary.migrated <= VERBOSE_LINES || summary.migrated % PROGRESS_EVERY == 0 {
                    writeln!(out, "✓ Migrada: {} → {} (cod: {})", proposal, sigla, cod)?;
                }
            }
            Ok(Step::NotFound) => {
                summary.not_found += 1;
                summary.unknown_siglas.insert(proposal.tipo_legado.clone());
                if summary.not_found <= VERBOSE_LINES {
                    writeln!(
                        out,
                        "⚠ Tipo não encontrado: {} (Proposição {}: {}/{})",
                        proposal.tipo_legado, proposal.id, proposal.numero, proposal.ano
                    )?;
                }
            }
            Err(e) => {
                summary.errors += 1;
                warn!(proposal = proposal.id, "Type migration failed: {}", e);
                if summary.errors <= VERBOSE_LINES {
                    writeln!(out, "✗ Erro ao migrar proposição {}: {}", proposal.id, e)?;
                }
            }
        }
    }

    writeln!(out)?;
    rule(out, WIDE_RULE)?;
    if dry_run {
        writeln!(out, "MODO DRY-RUN - Nenhuma alteração foi salva")?;
    } else {
        writeln!(out, "Migração concluída!")?;
    }
    writeln!(out, "  • Proposições migradas: {}", summary.migrated)?;
    if summary.not_found > 0 {
        writeln!(out, "  • Tipos não encontrados: {}", summary.not_found)?;
        let siglas: Vec<&str> = summary.unknown_siglas.iter().map(String::as_str).collect();
        writeln!(out, "    Siglas não encontradas: {}", siglas.join(", "))?;
    }
    if summary.errors > 0 {
        writeln!(out, "  • Erros: {}", summary.errors)?;
    }
    writeln!(out, "  • Total processado: {}", summary.processed())?;
    rule(out, WIDE_RULE)?;

    if !dry_run && summary.migrated > 0 {
        let coverage = type_coverage(pool).await?;
        let without_pct = if coverage.total == 0 {
            0.0
        } else {
            100.0 - coverage.percent_with_type()
        };
        writeln!(out, "\nEstatísticas após migração:")?;
        writeln!(out, "  • Total de proposições: {}", coverage.total)?;
        writeln!(
            out,
            "  • Com tipo_proposicao: {} ({:.1}%)",
            coverage.with_type,
            coverage.percent_with_type()
        )?;
        writeln!(out, "  • Sem tipo_proposicao: {} ({:.1}%)", coverage.without_type, without_pct)?;
    }

    info!(
        migrated = summary.migrated,
        not_found = summary.not_found,
        errors = summary.errors,
        "Proposal type migration finished"
    );
    Ok(summary)
}
