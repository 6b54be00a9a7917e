//! `sync-partidos [--detalhes]`

use crate::clients::camara::{CamaraClient, PartyDetail, PartyEntry};
use crate::report::{outcome_marker, rule, SyncCounts, RULE};
use chrono::NaiveDateTime;
use legis_common::db::parties::{count_parties, list_parties, update_party_details, upsert_party, PartyDetails, PartySummary};
use legis_common::db::UpsertOutcome;
use legis_common::{Error, Result};
use sqlx::SqlitePool;
use std::io::Write;
use tracing::{error, info, warn};

/// Party status timestamps look like `2025-04-08T14:44`
pub fn parse_status_date(raw: Option<&str>) -> Option<NaiveDateTime> {
    let raw = raw?.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").ok()
}

fn details_from(detail: &PartyDetail) -> PartyDetails {
    let status = detail.status.clone().unwrap_or_default();
    PartyDetails {
        status_data: parse_status_date(status.data.as_deref()),
        status_situacao: status.situacao,
        status_total_posse: status.total_posse,
        status_total_membros: status.total_membros,
        status_id_legislatura: status.id_legislatura,
        numero_eleitoral: detail.numero_eleitoral,
        url_logo: detail.url_logo.clone(),
        url_website: detail.url_web_site.clone(),
        url_facebook: detail.url_facebook.clone(),
    }
}

/// Upsert the summary, then the details when requested
///
/// A failed detail call keeps the stored summary; the error is handed back
/// so the caller can report it.
async fn sync_one(
    pool: &SqlitePool,
    client: &CamaraClient,
    entry: &PartyEntry,
    detalhes: bool,
) -> Result<(UpsertOutcome, Option<Error>)> {
    let outcome = upsert_party(
        pool,
        &PartySummary {
            id_partido: entry.id,
            sigla: entry.sigla.clone(),
            nome: entry.nome.clone(),
            uri: entry.uri.clone(),
        },
    )
    .await?;

    if !detalhes {
        return Ok((outcome, None));
    }
    match client.get_party(entry.id).await {
        Ok(detail) => {
            update_party_details(pool, entry.id, &details_from(&detail)).await?;
            Ok((outcome, None))
        }
        Err(e) => Ok((outcome, Some(e))),
    }
}

pub async fn sync_parties(
    pool: &SqlitePool,
    client: &CamaraClient,
    detalhes: bool,
    out: &mut dyn Write,
) -> Result<SyncCounts> {
    writeln!(out, "Iniciando sincronização de partidos...\n")?;
    writeln!(out, "Buscando lista de partidos da API...")?;

    let parties = match client.list_parties_all(&[("itens", "100".to_string())]).await {
        Ok(parties) => parties,
        Err(e) => {
            error!("Failed to fetch party list: {}", e);
            writeln!(out, "Erro ao buscar partidos da API")?;
            return Ok(SyncCounts::default());
        }
    };

    let total = parties.len();
    writeln!(out, "✓ {} partidos encontrados\n", total)?;
    info!(total, detalhes, "Syncing parties");

    let mut counts = SyncCounts::default();
    for (idx, entry) in parties.iter().enumerate() {
        write!(out, "[{}/{}] Processando {}...", idx + 1, total, entry.sigla)?;
        match sync_one(pool, client, entry, detalhes).await {
            Ok((outcome, None)) => {
                counts.record(outcome);
                writeln!(out, "{}", outcome_marker(outcome))?;
            }
            Ok((outcome, Some(e))) => {
                counts.record(outcome);
                counts.errors += 1;
                warn!(id_partido = entry.id, "Party details unavailable: {}", e);
                writeln!(out, "{} (sem detalhes: {})", outcome_marker(outcome), e)?;
            }
            Err(e) => {
                counts.errors += 1;
                warn!(id_partido = entry.id, "Party sync failed: {}", e);
                writeln!(out, " ✗ Erro: {}", e)?;
            }
        }
    }

    writeln!(out)?;
    rule(out, RULE)?;
    writeln!(out, "SINCRONIZAÇÃO CONCLUÍDA")?;
    rule(out, RULE)?;
    writeln!(out, "Total processado: {}", total)?;
    writeln!(out, "  • Criados: {}", counts.created)?;
    writeln!(out, "  • Atualizados: {}", counts.updated)?;
    if counts.errors > 0 {
        writeln!(out, "  • Erros: {}", counts.errors)?;
    }

    writeln!(out, "\nEstatísticas do banco de dados:")?;
    writeln!(out, "  • Total de partidos: {}", count_parties(pool).await?)?;
    writeln!(out, "\nPartidos cadastrados:")?;
    for party in list_parties(pool, Some(10)).await? {
        writeln!(out, "  • {} - {}", party.sigla, party.nome)?;
    }

    counts.log("Party sync");
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_status_date() {
        let expected = NaiveDate::from_ymd_opt(2025, 4, 8).unwrap().and_hms_opt(14, 44, 0);
        assert_eq!(parse_status_date(Some("2025-04-08T14:44")), expected);
        assert_eq!(parse_status_date(Some("08/04/2025")), None);
        assert_eq!(parse_status_date(Some("")), None);
        assert_eq!(parse_status_date(None), None);
    }
}
