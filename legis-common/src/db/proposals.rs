//! Proposal types and proposals
//!
//! Proposals carry both the legacy free-text type (`tipo_legado`) and the
//! foreign key to [`ProposalType`] (`tipo_id`). The backfill queries at the
//! bottom of this module move rows from the former to the latter.

use super::{like_pattern, ProposalStatus, UpsertOutcome, LIKE_ESCAPE};
use crate::Result;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ProposalType {
    pub id: i64,
    pub cod: String,
    pub sigla: String,
    pub nome: String,
    pub descricao: String,
}

impl fmt::Display for ProposalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.sigla, self.nome)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Proposal {
    pub id: i64,
    pub id_proposicao: i64,
    pub tipo_id: Option<i64>,
    /// Sigla of `tipo_id`, joined in
    pub tipo_sigla: Option<String>,
    pub tipo_legado: String,
    pub numero: i64,
    pub ano: i64,
    pub ementa: String,
    pub ementa_detalhada: String,
    pub data_apresentacao: NaiveDate,
    pub situacao: ProposalStatus,
    pub status_proposicao: String,
    pub autor_id: Option<i64>,
    /// Name of `autor_id`, joined in
    pub autor_nome: Option<String>,
    pub url_inteiro_teor: String,
    pub url_tramitacao: String,
}

impl Proposal {
    /// Type sigla, falling back to the legacy text
    pub fn sigla(&self) -> &str {
        self.tipo_sigla.as_deref().unwrap_or(&self.tipo_legado)
    }
}

impl fmt::Display for Proposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.sigla(), self.numero, self.ano)
    }
}

/// Values written by proposal synchronization
#[derive(Debug, Clone)]
pub struct ProposalRecord {
    pub id_proposicao: i64,
    pub tipo_id: Option<i64>,
    pub tipo_legado: String,
    pub numero: i64,
    pub ano: i64,
    pub ementa: String,
    pub ementa_detalhada: String,
    pub data_apresentacao: NaiveDate,
    pub status_proposicao: String,
    pub autor_id: Option<i64>,
    pub url_inteiro_teor: String,
    pub url_tramitacao: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProposalFilter {
    /// Type sigla (matches the linked type or the legacy text)
    pub tipo: Option<String>,
    pub situacao: Option<ProposalStatus>,
    pub ano: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ProposalTypeFilter {
    /// Substring of the sigla
    pub sigla: Option<String>,
    pub nome: Option<String>,
    /// Free text over sigla, nome and descricao
    pub q: Option<String>,
}

const TYPE_COLUMNS: &str = "id, cod, sigla, nome, descricao";

const PROPOSAL_SELECT: &str = r#"
    SELECT p.id, p.id_proposicao, p.tipo_id, t.sigla AS tipo_sigla, p.tipo_legado, p.numero,
           p.ano, p.ementa, p.ementa_detalhada, p.data_apresentacao, p.situacao,
           p.status_proposicao, p.autor_id, d.nome AS autor_nome, p.url_inteiro_teor,
           p.url_tramitacao
    FROM proposals p
    LEFT JOIN proposal_types t ON t.id = p.tipo_id
    LEFT JOIN deputies d ON d.id = p.autor_id
"#;

const PROPOSAL_ORDER: &str = " ORDER BY p.data_apresentacao DESC, p.id DESC";

// ---------------------------------------------------------------------------
// Proposal types
// ---------------------------------------------------------------------------

pub async fn upsert_proposal_type(
    pool: &SqlitePool,
    cod: &str,
    sigla: &str,
    nome: &str,
    descricao: &str,
) -> Result<UpsertOutcome> {
    let existed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM proposal_types WHERE cod = ?")
        .bind(cod)
        .fetch_one(pool)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO proposal_types (cod, sigla, nome, descricao, created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(cod) DO UPDATE SET
            sigla = excluded.sigla,
            nome = excluded.nome,
            descricao = excluded.descricao,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(cod)
    .bind(sigla)
    .bind(nome)
    .bind(descricao)
    .execute(pool)
    .await?;

    Ok(UpsertOutcome::from_existing(existed > 0))
}

pub async fn load_proposal_type(pool: &SqlitePool, id: i64) -> Result<Option<ProposalType>> {
    let sql = format!("SELECT {} FROM proposal_types WHERE id = ?", TYPE_COLUMNS);
    let t = sqlx::query_as::<_, ProposalType>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(t)
}

pub async fn find_proposal_type_by_cod(pool: &SqlitePool, cod: &str) -> Result<Option<ProposalType>> {
    let sql = format!("SELECT {} FROM proposal_types WHERE cod = ?", TYPE_COLUMNS);
    let t = sqlx::query_as::<_, ProposalType>(&sql)
        .bind(cod)
        .fetch_optional(pool)
        .await?;
    Ok(t)
}

/// Type with this sigla and the lowest numeric `cod`
///
/// Several codes can share a sigla; the oldest (lowest) code wins.
pub async fn find_proposal_type_by_sigla(pool: &SqlitePool, sigla: &str) -> Result<Option<ProposalType>> {
    let sql = format!(
        "SELECT {} FROM proposal_types WHERE sigla = ? ORDER BY CAST(cod AS INTEGER), cod LIMIT 1",
        TYPE_COLUMNS
    );
    let t = sqlx::query_as::<_, ProposalType>(&sql)
        .bind(sigla)
        .fetch_optional(pool)
        .await?;
    Ok(t)
}

/// Other types sharing `sigla`, excluding `exclude_id`
pub async fn list_types_sharing_sigla(
    pool: &SqlitePool,
    sigla: &str,
    exclude_id: i64,
) -> Result<Vec<ProposalType>> {
    let sql = format!(
        "SELECT {} FROM proposal_types WHERE sigla = ? AND id != ? ORDER BY sigla, nome",
        TYPE_COLUMNS
    );
    let types = sqlx::query_as::<_, ProposalType>(&sql)
        .bind(sigla)
        .bind(exclude_id)
        .fetch_all(pool)
        .await?;
    Ok(types)
}

fn push_type_filter<'a>(builder: &mut QueryBuilder<'a, Sqlite>, filter: &'a ProposalTypeFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(pattern) = like_pattern(filter.sigla.as_deref()) {
        builder.push(" AND sigla LIKE ").push_bind(pattern).push(LIKE_ESCAPE);
    }
    if let Some(pattern) = like_pattern(filter.nome.as_deref()) {
        builder.push(" AND nome LIKE ").push_bind(pattern).push(LIKE_ESCAPE);
    }
    if let Some(pattern) = like_pattern(filter.q.as_deref()) {
        builder
            .push(" AND (sigla LIKE ")
            .push_bind(pattern.clone())
            .push(LIKE_ESCAPE)
            .push(" OR nome LIKE ")
            .push_bind(pattern.clone())
            .push(LIKE_ESCAPE)
            .push(" OR descricao LIKE ")
            .push_bind(pattern)
            .push(LIKE_ESCAPE)
            .push(")");
    }
}

pub async fn count_proposal_types(pool: &SqlitePool, filter: &ProposalTypeFilter) -> Result<i64> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM proposal_types");
    push_type_filter(&mut builder, filter);
    let count = builder.build_query_scalar().fetch_one(pool).await?;
    Ok(count)
}

/// Types matching `filter`, ordered by sigla then nome
pub async fn list_proposal_types(
    pool: &SqlitePool,
    filter: &ProposalTypeFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<ProposalType>> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM proposal_types", TYPE_COLUMNS));
    push_type_filter(&mut builder, filter);
    builder
        .push(" ORDER BY sigla, nome LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let types = builder.build_query_as::<ProposalType>().fetch_all(pool).await?;
    Ok(types)
}

pub async fn distinct_type_siglas(pool: &SqlitePool) -> Result<Vec<String>> {
    let siglas = sqlx::query_scalar("SELECT DISTINCT sigla FROM proposal_types ORDER BY sigla")
        .fetch_all(pool)
        .await?;
    Ok(siglas)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProposalTypeStats {
    pub total: i64,
    pub with_description: i64,
    pub without_description: i64,
    /// `(sigla, count)`, most frequent first, at most 10
    pub top_siglas: Vec<(String, i64)>,
}

pub async fn proposal_type_stats(pool: &SqlitePool) -> Result<ProposalTypeStats> {
    let (total, with_description): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN descricao != '' THEN 1 ELSE 0 END), 0) FROM proposal_types",
    )
    .fetch_one(pool)
    .await?;

    let top_siglas = sqlx::query_as(
        r#"
        SELECT sigla, COUNT(*) AS total
        FROM proposal_types
        GROUP BY sigla
        ORDER BY total DESC, sigla
        LIMIT 10
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(ProposalTypeStats {
        total,
        with_description,
        without_description: total - with_description,
        top_siglas,
    })
}

// ---------------------------------------------------------------------------
// Proposals
// ---------------------------------------------------------------------------

pub async fn upsert_proposal(pool: &SqlitePool, record: &ProposalRecord) -> Result<UpsertOutcome> {
    let existed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM proposals WHERE id_proposicao = ?")
        .bind(record.id_proposicao)
        .fetch_one(pool)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO proposals (
            id_proposicao, tipo_id, tipo_legado, numero, ano, ementa, ementa_detalhada,
            data_apresentacao, status_proposicao, autor_id, url_inteiro_teor, url_tramitacao,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(id_proposicao) DO UPDATE SET
            tipo_id = COALESCE(excluded.tipo_id, proposals.tipo_id),
            tipo_legado = excluded.tipo_legado,
            numero = excluded.numero,
            ano = excluded.ano,
            ementa = excluded.ementa,
            ementa_detalhada = excluded.ementa_detalhada,
            data_apresentacao = excluded.data_apresentacao,
            status_proposicao = excluded.status_proposicao,
            autor_id = COALESCE(excluded.autor_id, proposals.autor_id),
            url_inteiro_teor = excluded.url_inteiro_teor,
            url_tramitacao = excluded.url_tramitacao,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(record.id_proposicao)
    .bind(record.tipo_id)
    .bind(&record.tipo_legado)
    .bind(record.numero)
    .bind(record.ano)
    .bind(&record.ementa)
    .bind(&record.ementa_detalhada)
    .bind(record.data_apresentacao)
    .bind(&record.status_proposicao)
    .bind(record.autor_id)
    .bind(&record.url_inteiro_teor)
    .bind(&record.url_tramitacao)
    .execute(pool)
    .await?;

    Ok(UpsertOutcome::from_existing(existed > 0))
}

pub async fn set_proposal_status(pool: &SqlitePool, id: i64, situacao: ProposalStatus) -> Result<()> {
    sqlx::query("UPDATE proposals SET situacao = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(situacao)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn load_proposal(pool: &SqlitePool, id_proposicao: i64) -> Result<Option<Proposal>> {
    let sql = format!("{} WHERE p.id_proposicao = ?", PROPOSAL_SELECT);
    let proposal = sqlx::query_as::<_, Proposal>(&sql)
        .bind(id_proposicao)
        .fetch_optional(pool)
        .await?;
    Ok(proposal)
}

pub async fn load_proposal_by_pk(pool: &SqlitePool, id: i64) -> Result<Option<Proposal>> {
    let sql = format!("{} WHERE p.id = ?", PROPOSAL_SELECT);
    let proposal = sqlx::query_as::<_, Proposal>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(proposal)
}

fn push_proposal_filter<'a>(builder: &mut QueryBuilder<'a, Sqlite>, filter: &'a ProposalFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(tipo) = filter.tipo.as_deref().filter(|t| !t.is_empty()) {
        builder
            .push(" AND COALESCE(t.sigla, p.tipo_legado) = ")
            .push_bind(tipo);
    }
    if let Some(situacao) = filter.situacao {
        builder.push(" AND p.situacao = ").push_bind(situacao);
    }
    if let Some(ano) = filter.ano {
        builder.push(" AND p.ano = ").push_bind(ano);
    }
}

pub async fn count_proposals(pool: &SqlitePool, filter: &ProposalFilter) -> Result<i64> {
    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(*) FROM proposals p LEFT JOIN proposal_types t ON t.id = p.tipo_id",
    );
    push_proposal_filter(&mut builder, filter);
    let count = builder.build_query_scalar().fetch_one(pool).await?;
    Ok(count)
}

/// Proposals matching `filter`, newest first
pub async fn list_proposals(
    pool: &SqlitePool,
    filter: &ProposalFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Proposal>> {
    let mut builder = QueryBuilder::<Sqlite>::new(PROPOSAL_SELECT);
    push_proposal_filter(&mut builder, filter);
    builder
        .push(PROPOSAL_ORDER)
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let proposals = builder.build_query_as::<Proposal>().fetch_all(pool).await?;
    Ok(proposals)
}

pub async fn list_proposals_by_author(pool: &SqlitePool, deputy_id: i64, limit: i64) -> Result<Vec<Proposal>> {
    let sql = format!("{} WHERE p.autor_id = ?{} LIMIT ?", PROPOSAL_SELECT, PROPOSAL_ORDER);
    let proposals = sqlx::query_as::<_, Proposal>(&sql)
        .bind(deputy_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(proposals)
}

pub async fn list_proposals_by_type(pool: &SqlitePool, type_id: i64, limit: i64) -> Result<Vec<Proposal>> {
    let sql = format!("{} WHERE p.tipo_id = ?{} LIMIT ?", PROPOSAL_SELECT, PROPOSAL_ORDER);
    let proposals = sqlx::query_as::<_, Proposal>(&sql)
        .bind(type_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(proposals)
}

/// Case-insensitive substring match on `ementa`, newest first
pub async fn search_proposals_by_ementa(pool: &SqlitePool, query: &str, limit: i64) -> Result<Vec<Proposal>> {
    let Some(pattern) = like_pattern(Some(query)) else {
        return Ok(Vec::new());
    };
    let sql = format!(
        "{} WHERE p.ementa LIKE ?{}{} LIMIT ?",
        PROPOSAL_SELECT, LIKE_ESCAPE, PROPOSAL_ORDER
    );
    let proposals = sqlx::query_as::<_, Proposal>(&sql)
        .bind(pattern)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(proposals)
}

pub async fn distinct_proposal_years(pool: &SqlitePool) -> Result<Vec<i64>> {
    let years = sqlx::query_scalar("SELECT DISTINCT ano FROM proposals ORDER BY ano DESC")
        .fetch_all(pool)
        .await?;
    Ok(years)
}

// ---------------------------------------------------------------------------
// Legacy type backfill
// ---------------------------------------------------------------------------

/// Proposal still typed only by its legacy text
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct UntypedProposal {
    pub id: i64,
    pub tipo_legado: String,
    pub numero: i64,
    pub ano: i64,
}

impl fmt::Display for UntypedProposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.tipo_legado, self.numero, self.ano)
    }
}

/// Proposals with no `tipo_id` and a non-empty `tipo_legado`
pub async fn list_untyped_proposals(pool: &SqlitePool) -> Result<Vec<UntypedProposal>> {
    let rows = sqlx::query_as::<_, UntypedProposal>(
        r#"
        SELECT id, tipo_legado, numero, ano
        FROM proposals
        WHERE tipo_id IS NULL AND tipo_legado != ''
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn set_proposal_type(pool: &SqlitePool, proposal_id: i64, type_id: i64) -> Result<()> {
    sqlx::query("UPDATE proposals SET tipo_id = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(type_id)
        .bind(proposal_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCoverage {
    pub total: i64,
    pub with_type: i64,
    pub without_type: i64,
}

impl TypeCoverage {
    /// Share of proposals with a type, in percent
    pub fn percent_with_type(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.with_type as f64 * 100.0 / self.total as f64
    }
}

pub async fn type_coverage(pool: &SqlitePool) -> Result<TypeCoverage> {
    let (total, with_type): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(tipo_id) FROM proposals",
    )
    .fetch_one(pool)
    .await?;
    Ok(TypeCoverage {
        total,
        with_type,
        without_type: total - with_type,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::init_memory_database;

    pub(crate) fn record(id_proposicao: i64, legacy: &str, ementa: &str, date: (i32, u32, u32)) -> ProposalRecord {
        ProposalRecord {
            id_proposicao,
            tipo_id: None,
            tipo_legado: legacy.to_string(),
            numero: id_proposicao % 1000,
            ano: date.0 as i64,
            ementa: ementa.to_string(),
            ementa_detalhada: String::new(),
            data_apresentacao: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            status_proposicao: String::new(),
            autor_id: None,
            url_inteiro_teor: String::new(),
            url_tramitacao: String::new(),
        }
    }

    #[tokio::test]
    async fn test_lowest_cod_wins_for_shared_sigla() {
        let pool = init_memory_database().await.unwrap();
        upsert_proposal_type(&pool, "550", "PL", "Projeto de Lei (novo)", "").await.unwrap();
        upsert_proposal_type(&pool, "139", "PL", "Projeto de Lei", "").await.unwrap();
        upsert_proposal_type(&pool, "1000", "PL", "Projeto de Lei (outro)", "").await.unwrap();

        let chosen = find_proposal_type_by_sigla(&pool, "PL").await.unwrap().unwrap();
        assert_eq!(chosen.cod, "139");
        assert_eq!(chosen.to_string(), "PL - Projeto de Lei");

        let others = list_types_sharing_sigla(&pool, "PL", chosen.id).await.unwrap();
        assert_eq!(others.len(), 2);
    }

    #[tokio::test]
    async fn test_type_upsert_outcomes_and_stats() {
        let pool = init_memory_database().await.unwrap();
        assert_eq!(
            upsert_proposal_type(&pool, "139", "PL", "Projeto de Lei", "").await.unwrap(),
            UpsertOutcome::Created
        );
        assert_eq!(
            upsert_proposal_type(&pool, "139", "PL", "Projeto de Lei", "Norma ordinária").await.unwrap(),
            UpsertOutcome::Updated
        );
        upsert_proposal_type(&pool, "136", "PEC", "Proposta de Emenda à Constituição", "").await.unwrap();

        let stats = proposal_type_stats(&pool).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.with_description, 1);
        assert_eq!(stats.without_description, 1);
        assert_eq!(stats.top_siglas.len(), 2);

        let filter = ProposalTypeFilter { q: Some("emenda".into()), ..Default::default() };
        assert_eq!(count_proposal_types(&pool, &filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_proposal_listing_order_and_filters() {
        let pool = init_memory_database().await.unwrap();
        upsert_proposal(&pool, &record(1, "PL", "Educação digital", (2023, 1, 10))).await.unwrap();
        upsert_proposal(&pool, &record(2, "PEC", "Reforma tributária", (2024, 3, 5))).await.unwrap();
        upsert_proposal(&pool, &record(3, "PL", "Energia renovável", (2024, 6, 1))).await.unwrap();

        let all = list_proposals(&pool, &ProposalFilter::default(), 20, 0).await.unwrap();
        let ids: Vec<_> = all.iter().map(|p| p.id_proposicao).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(all[0].to_string(), "PL 3/2024");
        assert_eq!(all[0].situacao, ProposalStatus::EmTramitacao);

        let pl_2024 = ProposalFilter { tipo: Some("PL".into()), ano: Some(2024), ..Default::default() };
        assert_eq!(count_proposals(&pool, &pl_2024).await.unwrap(), 1);

        let found = search_proposals_by_ementa(&pool, "TRIBUT", 20).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id_proposicao, 2);
    }

    #[tokio::test]
    async fn test_wildcards_in_search_match_literally() {
        let pool = init_memory_database().await.unwrap();
        upsert_proposal(&pool, &record(1, "PL", "Reajuste de 100% no piso", (2024, 1, 10))).await.unwrap();
        upsert_proposal(&pool, &record(2, "PL", "Reajuste de 1000 reais", (2024, 1, 11))).await.unwrap();
        upsert_proposal(&pool, &record(3, "PL", "Cadastro de pessoa_fisica", (2024, 1, 12))).await.unwrap();
        upsert_proposal(&pool, &record(4, "PL", "Cadastro de pessoasfisicas", (2024, 1, 13))).await.unwrap();

        let found = search_proposals_by_ementa(&pool, "100%", 20).await.unwrap();
        let ids: Vec<_> = found.iter().map(|p| p.id_proposicao).collect();
        assert_eq!(ids, vec![1]);

        let found = search_proposals_by_ementa(&pool, "pessoa_f", 20).await.unwrap();
        let ids: Vec<_> = found.iter().map(|p| p.id_proposicao).collect();
        assert_eq!(ids, vec![3]);

        let filter = ProposalTypeFilter { q: Some("%".into()), ..Default::default() };
        upsert_proposal_type(&pool, "139", "PL", "Projeto de Lei", "").await.unwrap();
        assert_eq!(count_proposal_types(&pool, &filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_backfill_queries() {
        let pool = init_memory_database().await.unwrap();
        upsert_proposal_type(&pool, "139", "PL", "Projeto de Lei", "").await.unwrap();
        upsert_proposal(&pool, &record(1, "PL", "a", (2024, 1, 1))).await.unwrap();
        upsert_proposal(&pool, &record(2, "", "b", (2024, 1, 2))).await.unwrap();

        let untyped = list_untyped_proposals(&pool).await.unwrap();
        assert_eq!(untyped.len(), 1);
        assert_eq!(untyped[0].to_string(), "PL 1/2024");

        let pl = find_proposal_type_by_sigla(&pool, "PL").await.unwrap().unwrap();
        set_proposal_type(&pool, untyped[0].id, pl.id).await.unwrap();

        assert!(list_untyped_proposals(&pool).await.unwrap().is_empty());
        let coverage = type_coverage(&pool).await.unwrap();
        assert_eq!(coverage, TypeCoverage { total: 2, with_type: 1, without_type: 1 });
        assert!((coverage.percent_with_type() - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_resync_keeps_backfilled_type() {
        let pool = init_memory_database().await.unwrap();
        upsert_proposal_type(&pool, "139", "PL", "Projeto de Lei", "").await.unwrap();
        upsert_proposal(&pool, &record(1, "PL", "a", (2024, 1, 1))).await.unwrap();
        let pl = find_proposal_type_by_sigla(&pool, "PL").await.unwrap().unwrap();
        let proposal = load_proposal(&pool, 1).await.unwrap().unwrap();
        set_proposal_type(&pool, proposal.id, pl.id).await.unwrap();

        upsert_proposal(&pool, &record(1, "PL", "a (rev)", (2024, 1, 1))).await.unwrap();
        let proposal = load_proposal(&pool, 1).await.unwrap().unwrap();
        assert_eq!(proposal.tipo_id, Some(pl.id));
        assert_eq!(proposal.ementa, "a (rev)");
    }
}
