//! `populate-sexo [--force]`

use crate::report::{rule, SyncCounts, WIDE_RULE};
use legis_common::ai::AnalysisService;
use legis_common::db::genders::{find_gender_by_sigla, list_genders, save_gender, Gender};
use legis_common::Result;
use sqlx::SqlitePool;
use std::io::Write;
use tracing::warn;

/// Seeded catalogue: sigla and name
pub const INITIAL_GENDERS: [(&str, &str); 3] = [("M", "Masculino"), ("F", "Feminino"), ("NB", "Não Binário")];

enum Seeded {
    Created(Gender),
    Updated,
    Skipped,
}

async fn seed_one(
    pool: &SqlitePool,
    ai: &AnalysisService,
    sigla: &str,
    nome: &str,
    force: bool,
) -> Result<Seeded> {
    match find_gender_by_sigla(pool, sigla).await? {
        Some(mut existing) if force => {
            existing.nome = nome.to_string();
            save_gender(pool, &mut existing, ai).await?;
            Ok(Seeded::Updated)
        }
        Some(_) => Ok(Seeded::Skipped),
        None => {
            let mut gender = Gender::new(sigla, nome);
            save_gender(pool, &mut gender, ai).await?;
            Ok(Seeded::Created(gender))
        }
    }
}

pub async fn populate_genders(
    pool: &SqlitePool,
    ai: &AnalysisService,
    force: bool,
    out: &mut dyn Write,
) -> Result<SyncCounts> {
    writeln!(out, "Iniciando população do modelo Sexo...\n")?;

    let mut counts = SyncCounts::default();
    for (sigla, nome) in INITIAL_GENDERS {
        match seed_one(pool, ai, sigla, nome, force).await {
            Ok(Seeded::Created(gender)) => {
                counts.created += 1;
                writeln!(out, "✓ Criado: {} - {}", sigla, nome)?;
                writeln!(out, "  Slug: {}", gender.slug)?;
                if !gender.descricao.is_empty() {
                    let preview: String = gender.descricao.chars().take(80).collect();
                    writeln!(out, "  Descrição: {}...", preview)?;
                }
            }
            Ok(Seeded::Updated) => {
                counts.updated += 1;
                writeln!(out, "✓ Atualizado: {} - {}", sigla, nome)?;
            }
            Ok(Seeded::Skipped) => {
                writeln!(out, "⚠ Já existe: {} - {} (use --force para atualizar)", sigla, nome)?;
            }
            Err(e) => {
                counts.errors += 1;
                warn!(sigla, "Gender seeding failed: {}", e);
                writeln!(out, "✗ Erro ao processar {}: {}", sigla, e)?;
            }
        }
    }

    let genders = list_genders(pool).await?;
    writeln!(out)?;
    rule(out, WIDE_RULE)?;
    writeln!(out, "População concluída!")?;
    writeln!(out, "  • Criados: {}", counts.created)?;
    writeln!(out, "  • Atualizados: {}", counts.updated)?;
    if counts.errors > 0 {
        writeln!(out, "  • Erros: {}", counts.errors)?;
    }
    writeln!(out, "  • Total de sexos no banco: {}", genders.len())?;
    rule(out, WIDE_RULE)?;

    if !genders.is_empty() {
        writeln!(out, "\nSexos cadastrados:")?;
        for gender in &genders {
            writeln!(out, "  • {} - {} (slug: {})", gender.sigla, gender.nome, gender.slug)?;
        }
    }

    counts.log("Gender seeding");
    Ok(counts)
}
