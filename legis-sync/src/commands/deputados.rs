//! `sync-deputados [--detalhes] [--uf XX] [--partido SIGLA]`

use crate::clients::camara::{CamaraClient, DeputyDetail, DeputyEntry};
use crate::report::{outcome_marker, rule, SyncCounts, RULE};
use chrono::NaiveDate;
use legis_common::db::deputies::{count_deputies, update_deputy_details, upsert_deputy, DeputyDetails, DeputyFilter, DeputySummary};
use legis_common::db::genders::find_gender_by_sigla;
use legis_common::db::geography::{find_municipality_by_name, find_uf_by_sigla};
use legis_common::db::parties::find_party_by_sigla;
use legis_common::db::UpsertOutcome;
use legis_common::{Error, Result};
use sqlx::SqlitePool;
use std::io::Write;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default)]
pub struct DeputySyncOptions {
    pub detalhes: bool,
    pub uf: Option<String>,
    pub partido: Option<String>,
}

impl DeputySyncOptions {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("itens", "100".to_string())];
        if let Some(uf) = &self.uf {
            params.push(("siglaUf", uf.trim().to_uppercase()));
        }
        if let Some(partido) = &self.partido {
            params.push(("siglaPartido", partido.trim().to_string()));
        }
        params
    }
}

async fn summary_from(pool: &SqlitePool, entry: &DeputyEntry) -> Result<DeputySummary> {
    let uf_id = match entry.sigla_uf.as_str() {
        "" => None,
        sigla => find_uf_by_sigla(pool, sigla).await?.map(|uf| uf.id),
    };
    let partido_id = match entry.sigla_partido.as_str() {
        "" => None,
        sigla => find_party_by_sigla(pool, sigla).await?.map(|p| p.id),
    };

    Ok(DeputySummary {
        id_deputado: entry.id,
        nome: entry.nome.clone(),
        sigla_partido: entry.sigla_partido.clone(),
        uf_representacao_id: uf_id,
        partido_id,
        email: entry.email.clone(),
        url_foto: entry.url_foto.clone(),
    })
}

async fn details_from(pool: &SqlitePool, detail: &DeputyDetail) -> Result<DeputyDetails> {
    let sexo_id = match detail.sexo.trim() {
        "" => None,
        sigla => find_gender_by_sigla(pool, sigla).await?.and_then(|g| g.id),
    };

    let uf_nascimento = match detail.uf_nascimento.trim() {
        "" => None,
        sigla => find_uf_by_sigla(pool, sigla).await?,
    };
    let municipio_nascimento_id = match (&uf_nascimento, detail.municipio_nascimento.trim()) {
        (Some(uf), nome) if !nome.is_empty() => {
            find_municipality_by_name(pool, uf.id, nome).await?.map(|m| m.id)
        }
        _ => None,
    };

    let status = detail.ultimo_status.clone().unwrap_or_default();
    Ok(DeputyDetails {
        nome_civil: detail.nome_civil.clone(),
        cpf: detail.cpf.clone(),
        sexo_id,
        data_nascimento: detail
            .data_nascimento
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok()),
        municipio_nascimento_id,
        uf_nascimento_id: uf_nascimento.map(|uf| uf.id),
        situacao: status.situacao,
        condicao_eleitoral: status.condicao_eleitoral,
        url_website: detail.url_website.clone(),
    })
}

/// Upsert the summary, then the details when requested; a failed detail
/// call keeps the summary and hands the error back
async fn sync_one(
    pool: &SqlitePool,
    client: &CamaraClient,
    entry: &DeputyEntry,
    detalhes: bool,
) -> Result<(UpsertOutcome, Option<Error>)> {
    let outcome = upsert_deputy(pool, &summary_from(pool, entry).await?).await?;
    if !detalhes {
        return Ok((outcome, None));
    }

    match client.get_deputy(entry.id).await {
        Ok(detail) => {
            let details = details_from(pool, &detail).await?;
            update_deputy_details(pool, entry.id, &details).await?;
            Ok((outcome, None))
        }
        Err(e) => Ok((outcome, Some(e))),
    }
}

pub async fn sync_deputies(
    pool: &SqlitePool,
    client: &CamaraClient,
    options: &DeputySyncOptions,
    out: &mut dyn Write,
) -> Result<SyncCounts> {
    writeln!(out, "Iniciando sincronização de deputados...\n")?;
    writeln!(out, "Buscando lista de deputados da API...")?;

    let deputies = match client.list_deputies_all(&options.params()).await {
        Ok(deputies) => deputies,
        Err(e) => {
            error!("Failed to fetch deputy list: {}", e);
            writeln!(out, "Erro ao buscar deputados da API")?;
            return Ok(SyncCounts::default());
        }
    };

    let total = deputies.len();
    writeln!(out, "✓ {} deputados encontrados\n", total)?;
    info!(total, detalhes = options.detalhes, "Syncing deputies");

    let mut counts = SyncCounts::default();
    for (idx, entry) in deputies.iter().enumerate() {
        write!(out, "[{}/{}] Processando {}...", idx + 1, total, entry.nome)?;
        match sync_one(pool, client, entry, options.detalhes).await {
            Ok((outcome, None)) => {
                counts.record(outcome);
                writeln!(out, "{}", outcome_marker(outcome))?;
            }
            Ok((outcome, Some(e))) => {
                counts.record(outcome);
                counts.errors += 1;
                warn!(id_deputado = entry.id, "Deputy details unavailable: {}", e);
                writeln!(out, "{} (sem detalhes: {})", outcome_marker(outcome), e)?;
            }
            Err(e) => {
                counts.errors += 1;
                warn!(id_deputado = entry.id, "Deputy sync failed: {}", e);
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
    writeln!(
        out,
        "\n  • Total de deputados: {}",
        count_deputies(pool, &DeputyFilter::default()).await?
    )?;

    counts.log("Deputy sync");
    Ok(counts)
}
