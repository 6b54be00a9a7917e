//! Parliamentary dashboard: per-deputy profiles, activity reports and comparisons

use super::votings::vote_tally_for_deputy;
use super::ReportPeriod;
use crate::{Error, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;

/// Most frequent themes / areas kept on a profile
const PROFILE_TOP_ENTRIES: usize = 5;
/// Proposals listed as highlights of a report
const REPORT_HIGHLIGHTS: i64 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ParliamentaryProfile {
    pub id: i64,
    pub deputy_id: i64,
    pub deputy_nome: String,
    pub total_votacoes: i64,
    pub presenca_votacoes: f64,
    pub votos_sim: i64,
    pub votos_nao: i64,
    pub votos_abstencao: i64,
    pub total_proposicoes: i64,
    pub proposicoes_aprovadas: i64,
    pub proposicoes_em_tramitacao: i64,
    pub total_discursos: i64,
    pub tempo_total_discurso: i64,
    pub areas_atuacao: Json<Vec<String>>,
    pub temas_frequentes: Json<Vec<String>>,
    pub ultima_atualizacao: NaiveDateTime,
}

impl std::fmt::Display for ParliamentaryProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Perfil de {}", self.deputy_nome)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ActivityReport {
    pub id: i64,
    pub deputy_id: i64,
    pub deputy_nome: String,
    pub periodo: ReportPeriod,
    pub data_inicio: NaiveDate,
    pub data_fim: NaiveDate,
    pub proposicoes_apresentadas: i64,
    pub votacoes_participadas: i64,
    pub discursos_realizados: i64,
    pub principais_atuacoes: Json<Vec<String>>,
    pub destaque_periodo: String,
    pub created_at: NaiveDateTime,
}

impl std::fmt::Display for ActivityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {} ({} a {})",
            self.deputy_nome,
            self.periodo.as_str(),
            self.data_inicio,
            self.data_fim
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct DeputyComparison {
    pub id: i64,
    pub nome: String,
    pub descricao: String,
    pub criterios: Json<Vec<String>>,
    pub resultados: Json<serde_json::Value>,
    pub created_at: NaiveDateTime,
}

const PROFILE_SELECT: &str = r#"
    SELECT p.id, p.deputy_id, d.nome AS deputy_nome, p.total_votacoes, p.presenca_votacoes,
           p.votos_sim, p.votos_nao, p.votos_abstencao, p.total_proposicoes,
           p.proposicoes_aprovadas, p.proposicoes_em_tramitacao, p.total_discursos,
           p.tempo_total_discurso, p.areas_atuacao, p.temas_frequentes, p.ultima_atualizacao
    FROM parliamentary_profiles p
    JOIN deputies d ON d.id = p.deputy_id
"#;

const REPORT_SELECT: &str = r#"
    SELECT r.id, r.deputy_id, d.nome AS deputy_nome, r.periodo, r.data_inicio, r.data_fim,
           r.proposicoes_apresentadas, r.votacoes_participadas, r.discursos_realizados,
           r.principais_atuacoes, r.destaque_periodo, r.created_at
    FROM activity_reports r
    JOIN deputies d ON d.id = r.deputy_id
"#;

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

pub async fn load_profile(pool: &SqlitePool, deputy_id: i64) -> Result<Option<ParliamentaryProfile>> {
    let sql = format!("{} WHERE p.deputy_id = ?", PROFILE_SELECT);
    let profile = sqlx::query_as::<_, ParliamentaryProfile>(&sql)
        .bind(deputy_id)
        .fetch_optional(pool)
        .await?;
    Ok(profile)
}

/// Profile of a deputy, created empty on first access
pub async fn get_or_create_profile(pool: &SqlitePool, deputy_id: i64) -> Result<ParliamentaryProfile> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO parliamentary_profiles (deputy_id, ultima_atualizacao, created_at)
        VALUES (?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(deputy_id)
    .execute(pool)
    .await?;

    load_profile(pool, deputy_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("deputy {}", deputy_id)))
}

/// Most frequent entries, ties broken alphabetically
fn most_frequent(items: impl IntoIterator<Item = String>, top: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() {
            *counts.entry(item).or_default() += 1;
        }
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(top).map(|(item, _)| item).collect()
}

/// Recompute a profile from stored votes, authored proposals and speeches
pub async fn refresh_profile(pool: &SqlitePool, deputy_id: i64) -> Result<ParliamentaryProfile> {
    get_or_create_profile(pool, deputy_id).await?;

    let tally = vote_tally_for_deputy(pool, deputy_id).await?;

    let (total_proposicoes, aprovadas, em_tramitacao): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COALESCE(SUM(situacao = 'APROVADA'), 0),
               COALESCE(SUM(situacao = 'EM_TRAMITACAO'), 0)
        FROM proposals
        WHERE autor_id = ?
        "#,
    )
    .bind(deputy_id)
    .fetch_one(pool)
    .await?;

    let total_discursos: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM speeches WHERE deputy_id = ?")
        .bind(deputy_id)
        .fetch_one(pool)
        .await?;

    let areas: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT COALESCE(t.sigla, p.tipo_legado)
        FROM proposals p
        LEFT JOIN proposal_types t ON t.id = p.tipo_id
        WHERE p.autor_id = ?
        "#,
    )
    .bind(deputy_id)
    .fetch_all(pool)
    .await?;

    let theme_lists: Vec<Json<Vec<String>>> = sqlx::query_scalar(
        r#"
        SELECT a.temas_principais
        FROM speech_analyses a
        JOIN speeches s ON s.id = a.speech_id
        WHERE s.deputy_id = ?
        "#,
    )
    .bind(deputy_id)
    .fetch_all(pool)
    .await?;
    let themes = theme_lists.into_iter().flat_map(|Json(list)| list);

    sqlx::query(
        r#"
        UPDATE parliamentary_profiles SET
            total_votacoes = ?,
            presenca_votacoes = ?,
            votos_sim = ?,
            votos_nao = ?,
            votos_abstencao = ?,
            total_proposicoes = ?,
            proposicoes_aprovadas = ?,
            proposicoes_em_tramitacao = ?,
            total_discursos = ?,
            areas_atuacao = ?,
            temas_frequentes = ?,
            ultima_atualizacao = CURRENT_TIMESTAMP
        WHERE deputy_id = ?
        "#,
    )
    .bind(tally.total)
    .bind(tally.presence_percent())
    .bind(tally.sim)
    .bind(tally.nao)
    .bind(tally.abstencao)
    .bind(total_proposicoes)
    .bind(aprovadas)
    .bind(em_tramitacao)
    .bind(total_discursos)
    .bind(Json(most_frequent(areas, PROFILE_TOP_ENTRIES)))
    .bind(Json(most_frequent(themes, PROFILE_TOP_ENTRIES)))
    .bind(deputy_id)
    .execute(pool)
    .await?;

    load_profile(pool, deputy_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("deputy {}", deputy_id)))
}

// ---------------------------------------------------------------------------
// Activity reports
// ---------------------------------------------------------------------------

/// First day of the `periodo` window that ends on `data_fim` (inclusive)
pub fn report_window_start(periodo: ReportPeriod, data_fim: NaiveDate) -> NaiveDate {
    data_fim - Duration::days(periodo.days() - 1)
}

/// Count a deputy's activity inside the window ending at `data_fim` and store it
pub async fn generate_activity_report(
    pool: &SqlitePool,
    deputy_id: i64,
    periodo: ReportPeriod,
    data_fim: NaiveDate,
) -> Result<ActivityReport> {
    let data_inicio = report_window_start(periodo, data_fim);

    let proposicoes: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM proposals WHERE autor_id = ? AND data_apresentacao BETWEEN ? AND ?",
    )
    .bind(deputy_id)
    .bind(data_inicio)
    .bind(data_fim)
    .fetch_one(pool)
    .await?;

    let votacoes: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM deputy_votes dv
        JOIN votings v ON v.id = dv.voting_id
        WHERE dv.deputy_id = ? AND dv.voto != 'AUSENTE' AND date(v.data) BETWEEN ? AND ?
        "#,
    )
    .bind(deputy_id)
    .bind(data_inicio)
    .bind(data_fim)
    .fetch_one(pool)
    .await?;

    let discursos: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM speeches WHERE deputy_id = ? AND date(data) BETWEEN ? AND ?",
    )
    .bind(deputy_id)
    .bind(data_inicio)
    .bind(data_fim)
    .fetch_one(pool)
    .await?;

    let atuacoes: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT COALESCE(t.sigla, p.tipo_legado) || ' ' || p.numero || '/' || p.ano || ': ' || p.ementa
        FROM proposals p
        LEFT JOIN proposal_types t ON t.id = p.tipo_id
        WHERE p.autor_id = ? AND p.data_apresentacao BETWEEN ? AND ?
        ORDER BY p.data_apresentacao DESC, p.id DESC
        LIMIT ?
        "#,
    )
    .bind(deputy_id)
    .bind(data_inicio)
    .bind(data_fim)
    .bind(REPORT_HIGHLIGHTS)
    .fetch_all(pool)
    .await?;

    let destaque = format!(
        "{} proposições apresentadas, {} votações, {} discursos",
        proposicoes, votacoes, discursos
    );

    let result = sqlx::query(
        r#"
        INSERT INTO activity_reports (
            deputy_id, periodo, data_inicio, data_fim, proposicoes_apresentadas,
            votacoes_participadas, discursos_realizados, principais_atuacoes, destaque_periodo,
            created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(deputy_id)
    .bind(periodo)
    .bind(data_inicio)
    .bind(data_fim)
    .bind(proposicoes)
    .bind(votacoes)
    .bind(discursos)
    .bind(Json(atuacoes))
    .bind(destaque)
    .execute(pool)
    .await?;

    let sql = format!("{} WHERE r.id = ?", REPORT_SELECT);
    let report = sqlx::query_as::<_, ActivityReport>(&sql)
        .bind(result.last_insert_rowid())
        .fetch_one(pool)
        .await?;
    Ok(report)
}

/// Latest reports across all deputies, by end date
pub async fn list_reports(pool: &SqlitePool, limit: i64) -> Result<Vec<ActivityReport>> {
    let sql = format!("{} ORDER BY r.data_fim DESC, r.id DESC LIMIT ?", REPORT_SELECT);
    let reports = sqlx::query_as::<_, ActivityReport>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(reports)
}

pub async fn list_reports_for_deputy(pool: &SqlitePool, deputy_id: i64, limit: i64) -> Result<Vec<ActivityReport>> {
    let sql = format!(
        "{} WHERE r.deputy_id = ? ORDER BY r.data_fim DESC, r.id DESC LIMIT ?",
        REPORT_SELECT
    );
    let reports = sqlx::query_as::<_, ActivityReport>(&sql)
        .bind(deputy_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(reports)
}

// ---------------------------------------------------------------------------
// Comparisons
// ---------------------------------------------------------------------------

pub async fn create_comparison(
    pool: &SqlitePool,
    nome: &str,
    descricao: &str,
    deputy_ids: &[i64],
    criterios: &[String],
) -> Result<i64> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO deputy_comparisons (nome, descricao, criterios, resultados, created_at, updated_at)
        VALUES (?, ?, ?, '{}', CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(nome)
    .bind(descricao)
    .bind(Json(criterios))
    .execute(&mut *tx)
    .await?;
    let id = result.last_insert_rowid();

    for deputy_id in deputy_ids {
        sqlx::query("INSERT OR IGNORE INTO deputy_comparison_members (comparison_id, deputy_id) VALUES (?, ?)")
            .bind(id)
            .bind(deputy_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(id)
}

/// Newest comparisons first
pub async fn list_comparisons(pool: &SqlitePool, limit: i64) -> Result<Vec<DeputyComparison>> {
    let comparisons = sqlx::query_as::<_, DeputyComparison>(
        r#"
        SELECT id, nome, descricao, criterios, resultados, created_at
        FROM deputy_comparisons
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(comparisons)
}

/// Names of the deputies in a comparison
pub async fn list_comparison_members(pool: &SqlitePool, comparison_id: i64) -> Result<Vec<String>> {
    let names = sqlx::query_scalar(
        r#"
        SELECT d.nome FROM deputies d
        JOIN deputy_comparison_members m ON m.deputy_id = d.id
        WHERE m.comparison_id = ?
        ORDER BY d.nome
        "#,
    )
    .bind(comparison_id)
    .fetch_all(pool)
    .await?;
    Ok(names)
}
