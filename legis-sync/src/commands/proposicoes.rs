//! `sync-proposicoes [--ano N] [--sigla-tipo X] [--limite N] [--votacoes]`

use crate::clients::camara::{CamaraClient, ProposalDetail, VoteEntry, VotingEntry};
use crate::report::{outcome_marker, rule, SyncCounts, RULE};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use legis_common::db::deputies::load_deputy;
use legis_common::db::proposals::{
    find_proposal_type_by_cod, find_proposal_type_by_sigla, load_proposal, upsert_proposal, ProposalRecord,
};
use legis_common::db::votings::{load_voting, record_vote, refresh_voting_totals, upsert_voting, VotingRecord};
use legis_common::db::{UpsertOutcome, VoteChoice};
use legis_common::{Error, Result};
use sqlx::SqlitePool;
use std::io::Write;
use tracing::{debug, error, info, warn};

/// Public page of a proposal's procedural history
const TRAMITACAO_URL: &str = "https://www.camara.leg.br/proposicoesWeb/fichadetramitacao?idProposicao=";

#[derive(Debug, Clone, Default)]
pub struct ProposalSyncOptions {
    /// Presentation year; the current year when absent
    pub ano: Option<i64>,
    pub sigla_tipo: Option<String>,
    /// Stop after this many proposals
    pub limite: Option<usize>,
    /// Also sync the votings of each proposal and their votes
    pub votacoes: bool,
}

impl ProposalSyncOptions {
    fn year(&self) -> i64 {
        self.ano.unwrap_or_else(|| Local::now().year() as i64)
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("ano", self.year().to_string()),
            ("itens", "100".to_string()),
            ("ordem", "ASC".to_string()),
            ("ordenarPor", "id".to_string()),
        ];
        if let Some(sigla) = &self.sigla_tipo {
            params.push(("siglaTipo", sigla.trim().to_uppercase()));
        }
        params
    }
}

/// Date part of `2024-02-01T10:15` style timestamps
pub fn parse_presentation_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    let date = raw.get(..10)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Map the API's `tipoVoto` to a vote; anything unrecognised counts as absent
pub fn vote_choice(tipo_voto: &str) -> VoteChoice {
    match tipo_voto.trim() {
        "Sim" => VoteChoice::Sim,
        "Não" | "Nao" => VoteChoice::Nao,
        "Abstenção" | "Abstencao" => VoteChoice::Abstencao,
        "Obstrução" | "Obstrucao" => VoteChoice::Obstrucao,
        _ => VoteChoice::Ausente,
    }
}

/// Voting timestamp: `dataHoraRegistro`, else midnight of `data`
pub fn voting_timestamp(entry: &VotingEntry) -> Option<NaiveDateTime> {
    if let Some(raw) = entry.data_hora_registro.as_deref() {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M:%S") {
            return Some(ts);
        }
    }
    parse_presentation_date(entry.data.as_deref()).and_then(|d| d.and_hms_opt(0, 0, 0))
}

async fn record_from(pool: &SqlitePool, detail: &ProposalDetail, autor_id: Option<i64>) -> Result<ProposalRecord> {
    let by_cod = match detail.cod_tipo {
        Some(cod) => find_proposal_type_by_cod(pool, &cod.to_string()).await?,
        None => None,
    };
    let tipo = match by_cod {
        Some(tipo) => Some(tipo),
        None if !detail.sigla_tipo.is_empty() => find_proposal_type_by_sigla(pool, &detail.sigla_tipo).await?,
        None => None,
    };

    let data_apresentacao = parse_presentation_date(detail.data_apresentacao.as_deref()).ok_or_else(|| {
        Error::Parse(format!(
            "invalid dataApresentacao for proposal {}: {:?}",
            detail.id, detail.data_apresentacao
        ))
    })?;

    let status = detail.status_proposicao.clone().unwrap_or_default();
    Ok(ProposalRecord {
        id_proposicao: detail.id,
        tipo_id: tipo.map(|t| t.id),
        tipo_legado: detail.sigla_tipo.clone(),
        numero: detail.numero.unwrap_or_default(),
        ano: detail.ano.unwrap_or_else(|| data_apresentacao.year() as i64),
        ementa: detail.ementa.clone(),
        ementa_detalhada: detail.ementa_detalhada.clone(),
        data_apresentacao,
        status_proposicao: status.descricao_situacao,
        autor_id,
        url_inteiro_teor: detail.url_inteiro_teor.clone(),
        url_tramitacao: format!("{}{}", TRAMITACAO_URL, detail.id),
    })
}

async fn sync_votes(pool: &SqlitePool, voting_id: i64, votes: &[VoteEntry]) -> Result<usize> {
    let mut recorded = 0;
    for vote in votes {
        match load_deputy(pool, vote.deputado.id).await? {
            Some(deputy) => {
                record_vote(pool, voting_id, deputy.id, vote_choice(&vote.tipo_voto)).await?;
                recorded += 1;
            }
            None => debug!(id_deputado = vote.deputado.id, "Vote of unknown deputy skipped"),
        }
    }
    Ok(recorded)
}

async fn sync_votings(
    pool: &SqlitePool,
    client: &CamaraClient,
    proposal_pk: i64,
    id_proposicao: i64,
) -> Result<SyncCounts> {
    let mut counts = SyncCounts::default();

    for entry in client.list_proposal_votings(id_proposicao).await? {
        let Some(data) = voting_timestamp(&entry) else {
            counts.errors += 1;
            warn!(id_votacao = %entry.id, "Voting without a usable date skipped");
            continue;
        };

        let votes = match client.list_voting_votes(&entry.id).await {
            Ok(votes) => votes,
            Err(e) => {
                counts.errors += 1;
                warn!(id_votacao = %entry.id, "Failed to fetch votes: {}", e);
                continue;
            }
        };
        let record = VotingRecord {
            id_votacao: entry.id.clone(),
            proposal_id: proposal_pk,
            data,
            descricao: entry.descricao.clone(),
            tipo_votacao: String::new(),
            aprovacao: entry.aprovacao.map(|a| a != 0),
            votos_sim: 0,
            votos_nao: 0,
            votos_abstencao: 0,
        };
        counts.record(upsert_voting(pool, &record).await?);

        // Totals only count votes of deputies stored locally
        if let Some(voting) = load_voting(pool, &entry.id).await? {
            let recorded = sync_votes(pool, voting.id, &votes).await?;
            refresh_voting_totals(pool, voting.id).await?;
            debug!(id_votacao = %entry.id, recorded, "Votes recorded");
        }
    }
    Ok(counts)
}

/// Primary key of the first signatory that is a stored deputy
async fn resolve_author(pool: &SqlitePool, client: &CamaraClient, id_proposicao: i64) -> Result<Option<i64>> {
    let authors = match client.list_proposal_authors(id_proposicao).await {
        Ok(authors) => authors,
        Err(e) => {
            warn!(id_proposicao, "Failed to fetch authors: {}", e);
            return Ok(None);
        }
    };
    for id_deputado in authors.iter().filter_map(|a| a.deputy_id()) {
        if let Some(deputy) = load_deputy(pool, id_deputado).await? {
            return Ok(Some(deputy.id));
        }
    }
    Ok(None)
}

async fn sync_one(pool: &SqlitePool, client: &CamaraClient, id_proposicao: i64) -> Result<UpsertOutcome> {
    let detail = client.get_proposal(id_proposicao).await?;
    let autor_id = resolve_author(pool, client, id_proposicao).await?;
    let record = record_from(pool, &detail, autor_id).await?;
    upsert_proposal(pool, &record).await
}

pub async fn sync_proposals(
    pool: &SqlitePool,
    client: &CamaraClient,
    options: &ProposalSyncOptions,
    out: &mut dyn Write,
) -> Result<SyncCounts> {
    writeln!(out, "Iniciando sincronização de proposições de {}...\n", options.year())?;
    writeln!(out, "Buscando lista de proposições da API...")?;

    let mut proposals = match client.list_proposals_all(&options.params()).await {
        Ok(proposals) => proposals,
        Err(e) => {
            error!("Failed to fetch proposal list: {}", e);
            writeln!(out, "Erro ao buscar proposições da API")?;
            return Ok(SyncCounts::default());
        }
    };
    if let Some(limite) = options.limite {
        proposals.truncate(limite);
    }

    let total = proposals.len();
    writeln!(out, "✓ {} proposições encontradas\n", total)?;
    info!(total, ano = options.year(), votacoes = options.votacoes, "Syncing proposals");

    let mut counts = SyncCounts::default();
    let mut voting_counts = SyncCounts::default();
    for (idx, entry) in proposals.iter().enumerate() {
        let label = format!(
            "{} {}/{}",
            entry.sigla_tipo,
            entry.numero.unwrap_or_default(),
            entry.ano.unwrap_or_default()
        );
        write!(out, "[{}/{}] Processando {}...", idx + 1, total, label)?;
        match sync_one(pool, client, entry.id).await {
            Ok(outcome) => {
                counts.record(outcome);
                writeln!(out, "{}", outcome_marker(outcome))?;
            }
            Err(e) => {
                counts.errors += 1;
                warn!(id_proposicao = entry.id, "Proposal sync failed: {}", e);
                writeln!(out, " ✗ Erro: {}", e)?;
                continue;
            }
        }

        if options.votacoes {
            let Some(proposal) = load_proposal(pool, entry.id).await? else {
                continue;
            };
            match sync_votings(pool, client, proposal.id, entry.id).await {
                Ok(c) => {
                    voting_counts.created += c.created;
                    voting_counts.updated += c.updated;
                    voting_counts.errors += c.errors;
                }
                Err(e) => {
                    voting_counts.errors += 1;
                    warn!(id_proposicao = entry.id, "Voting sync failed: {}", e);
                    writeln!(out, "    ✗ Erro ao sincronizar votações: {}", e)?;
                }
            }
        }
    }

    writeln!(out)?;
    rule(out, RULE)?;
    writeln!(out, "SINCRONIZAÇÃO CONCLUÍDA")?;
    rule(out, RULE)?;
    writeln!(out, "Total processado: {}", total)?;
    writeln!(out, "  • Criadas: {}", counts.created)?;
    writeln!(out, "  • Atualizadas: {}", counts.updated)?;
    if counts.errors > 0 {
        writeln!(out, "  • Erros: {}", counts.errors)?;
    }
    if options.votacoes {
        writeln!(out, "\nVotações:")?;
        writeln!(out, "  • Criadas: {}", voting_counts.created)?;
        writeln!(out, "  • Atualizadas: {}", voting_counts.updated)?;
        if voting_counts.errors > 0 {
            writeln!(out, "  • Erros: {}", voting_counts.errors)?;
        }
        voting_counts.log("Voting sync");
    }

    counts.log("Proposal sync");
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_presentation_date() {
        assert_eq!(
            parse_presentation_date(Some("2024-02-01T10:15")),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
        assert_eq!(parse_presentation_date(Some("2024-02-01")), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(parse_presentation_date(Some("01/02/2024")), None);
        assert_eq!(parse_presentation_date(Some("2024")), None);
        assert_eq!(parse_presentation_date(None), None);
    }

    #[test]
    fn test_vote_choice() {
        assert_eq!(vote_choice("Sim"), VoteChoice::Sim);
        assert_eq!(vote_choice("Não"), VoteChoice::Nao);
        assert_eq!(vote_choice("Abstenção"), VoteChoice::Abstencao);
        assert_eq!(vote_choice("Obstrução"), VoteChoice::Obstrucao);
        assert_eq!(vote_choice("Artigo 17"), VoteChoice::Ausente);
        assert_eq!(vote_choice(""), VoteChoice::Ausente);
    }

    #[test]
    fn test_voting_timestamp_falls_back_to_date() {
        let entry = VotingEntry {
            id: "2438277-47".to_string(),
            data: Some("2024-05-14".to_string()),
            data_hora_registro: None,
            descricao: String::new(),
            aprovacao: Some(1),
        };
        let expected = NaiveDate::from_ymd_opt(2024, 5, 14).unwrap().and_hms_opt(0, 0, 0);
        assert_eq!(voting_timestamp(&entry), expected);

        let entry = VotingEntry {
            data_hora_registro: Some("2024-05-14T19:02:41".to_string()),
            ..entry
        };
        let expected = NaiveDate::from_ymd_opt(2024, 5, 14).unwrap().and_hms_opt(19, 2, 41);
        assert_eq!(voting_timestamp(&entry), expected);
    }

    #[test]
    fn test_params_default_to_current_year() {
        let options = ProposalSyncOptions {
            sigla_tipo: Some("pl".to_string()),
            ..Default::default()
        };
        let params = options.params();
        assert!(params.contains(&("ano", Local::now().year().to_string())));
        assert!(params.contains(&("siglaTipo", "PL".to_string())));
    }
}
