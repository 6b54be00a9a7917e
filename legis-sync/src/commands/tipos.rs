//! `sync-tipos-proposicao`

use crate::clients::CamaraClient;
use crate::report::{rule, SyncCounts, RULE};
use legis_common::db::proposals::upsert_proposal_type;
use legis_common::db::UpsertOutcome;
use legis_common::Result;
use sqlx::SqlitePool;
use std::io::Write;
use tracing::{error, warn};

pub async fn sync_proposal_types(
    pool: &SqlitePool,
    client: &CamaraClient,
    out: &mut dyn Write,
) -> Result<SyncCounts> {
    writeln!(out, "Iniciando sincronização dos tipos de proposição...")?;

    let types = match client.list_proposal_types().await {
        Ok(types) => types,
        Err(e) => {
            error!("Failed to fetch proposal types: {}", e);
            writeln!(out, "Erro ao obter tipos de proposição da API")?;
            return Ok(SyncCounts::default());
        }
    };
    writeln!(out, "Encontrados {} tipos de proposição na API", types.len())?;

    let mut counts = SyncCounts::default();
    for entry in &types {
        match upsert_proposal_type(pool, &entry.cod, &entry.sigla, &entry.nome, &entry.descricao).await {
            Ok(outcome) => {
                counts.record(outcome);
                match outcome {
                    UpsertOutcome::Created => writeln!(out, "✓ Criado: {} - {}", entry.sigla, entry.nome)?,
                    UpsertOutcome::Updated => writeln!(out, "  Atualizado: {} - {}", entry.sigla, entry.nome)?,
                }
            }
            Err(e) => {
                counts.errors += 1;
                warn!(cod = %entry.cod, "Proposal type sync failed: {}", e);
                writeln!(
                    out,
                    "✗ Erro ao processar tipo {} (cod: {}): {}",
                    entry.sigla, entry.cod, e
                )?;
            }
        }
    }

    writeln!(out)?;
    rule(out, RULE)?;
    writeln!(out, "Sincronização concluída!")?;
    writeln!(out, "  • Tipos criados: {}", counts.created)?;
    writeln!(out, "  • Tipos atualizados: {}", counts.updated)?;
    if counts.errors > 0 {
        writeln!(out, "  • Erros: {}", counts.errors)?;
    }
    writeln!(out, "  • Total processado: {}", counts.processed())?;
    rule(out, RULE)?;

    counts.log("Proposal type sync");
    Ok(counts)
}
