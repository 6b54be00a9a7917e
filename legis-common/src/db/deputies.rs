//! Deputies keyed by the Chamber's `id_deputado`

use super::{like_pattern, UpsertOutcome, LIKE_ESCAPE};
use crate::Result;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Deputy {
    pub id: i64,
    pub id_deputado: i64,
    pub nome: String,
    pub nome_civil: String,
    pub cpf: String,
    pub sexo_id: Option<i64>,
    pub data_nascimento: Option<NaiveDate>,
    pub municipio_nascimento_id: Option<i64>,
    pub uf_nascimento_id: Option<i64>,
    pub sigla_partido: String,
    pub partido_id: Option<i64>,
    pub uf_representacao_id: Option<i64>,
    /// Sigla of `uf_representacao_id`, joined in
    pub uf_sigla: Option<String>,
    pub situacao: String,
    pub condicao_eleitoral: String,
    pub email: String,
    pub url_website: String,
    pub url_foto: String,
}

impl fmt::Display for Deputy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}/{}",
            self.nome,
            self.sigla_partido,
            self.uf_sigla.as_deref().unwrap_or("")
        )
    }
}

/// Fields present in every deputy listing entry
#[derive(Debug, Clone, Default)]
pub struct DeputySummary {
    pub id_deputado: i64,
    pub nome: String,
    pub sigla_partido: String,
    pub uf_representacao_id: Option<i64>,
    pub partido_id: Option<i64>,
    pub email: String,
    pub url_foto: String,
}

/// Fields only present in the per-deputy detail response
#[derive(Debug, Clone, Default)]
pub struct DeputyDetails {
    pub nome_civil: String,
    pub cpf: String,
    pub sexo_id: Option<i64>,
    pub data_nascimento: Option<NaiveDate>,
    pub municipio_nascimento_id: Option<i64>,
    pub uf_nascimento_id: Option<i64>,
    pub situacao: String,
    pub condicao_eleitoral: String,
    pub url_website: String,
}

/// Filters of the deputy list page
#[derive(Debug, Clone, Default)]
pub struct DeputyFilter {
    pub partido: Option<String>,
    pub uf: Option<String>,
    pub nome: Option<String>,
}

const DEPUTY_SELECT: &str = r#"
    SELECT d.id, d.id_deputado, d.nome, d.nome_civil, d.cpf, d.sexo_id, d.data_nascimento,
           d.municipio_nascimento_id, d.uf_nascimento_id, d.sigla_partido, d.partido_id,
           d.uf_representacao_id, u.sigla AS uf_sigla, d.situacao, d.condicao_eleitoral,
           d.email, d.url_website, d.url_foto
    FROM deputies d
    LEFT JOIN ufs u ON u.id = d.uf_representacao_id
"#;

pub async fn upsert_deputy(pool: &SqlitePool, deputy: &DeputySummary) -> Result<UpsertOutcome> {
    let existed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM deputies WHERE id_deputado = ?")
        .bind(deputy.id_deputado)
        .fetch_one(pool)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO deputies (
            id_deputado, nome, sigla_partido, uf_representacao_id, partido_id, email, url_foto,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(id_deputado) DO UPDATE SET
            nome = excluded.nome,
            sigla_partido = excluded.sigla_partido,
            uf_representacao_id = excluded.uf_representacao_id,
            partido_id = excluded.partido_id,
            email = excluded.email,
            url_foto = excluded.url_foto,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(deputy.id_deputado)
    .bind(&deputy.nome)
    .bind(&deputy.sigla_partido)
    .bind(deputy.uf_representacao_id)
    .bind(deputy.partido_id)
    .bind(&deputy.email)
    .bind(&deputy.url_foto)
    .execute(pool)
    .await?;

    Ok(UpsertOutcome::from_existing(existed > 0))
}

pub async fn update_deputy_details(
    pool: &SqlitePool,
    id_deputado: i64,
    details: &DeputyDetails,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE deputies SET
            nome_civil = ?,
            cpf = ?,
            sexo_id = ?,
            data_nascimento = ?,
            municipio_nascimento_id = ?,
            uf_nascimento_id = ?,
            situacao = ?,
            condicao_eleitoral = ?,
            url_website = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id_deputado = ?
        "#,
    )
    .bind(&details.nome_civil)
    .bind(&details.cpf)
    .bind(details.sexo_id)
    .bind(details.data_nascimento)
    .bind(details.municipio_nascimento_id)
    .bind(details.uf_nascimento_id)
    .bind(&details.situacao)
    .bind(&details.condicao_eleitoral)
    .bind(&details.url_website)
    .bind(id_deputado)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_deputy(pool: &SqlitePool, id_deputado: i64) -> Result<Option<Deputy>> {
    let sql = format!("{} WHERE d.id_deputado = ?", DEPUTY_SELECT);
    let deputy = sqlx::query_as::<_, Deputy>(&sql)
        .bind(id_deputado)
        .fetch_optional(pool)
        .await?;
    Ok(deputy)
}

pub async fn load_deputy_by_pk(pool: &SqlitePool, id: i64) -> Result<Option<Deputy>> {
    let sql = format!("{} WHERE d.id = ?", DEPUTY_SELECT);
    let deputy = sqlx::query_as::<_, Deputy>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(deputy)
}

fn push_filter<'a>(builder: &mut QueryBuilder<'a, Sqlite>, filter: &'a DeputyFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(partido) = filter.partido.as_deref().filter(|p| !p.is_empty()) {
        builder.push(" AND d.sigla_partido = ").push_bind(partido);
    }
    if let Some(uf) = filter.uf.as_deref().filter(|u| !u.is_empty()) {
        builder.push(" AND u.sigla = ").push_bind(uf);
    }
    if let Some(pattern) = like_pattern(filter.nome.as_deref()) {
        builder.push(" AND d.nome LIKE ").push_bind(pattern).push(LIKE_ESCAPE);
    }
}

pub async fn count_deputies(pool: &SqlitePool, filter: &DeputyFilter) -> Result<i64> {
    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(*) FROM deputies d LEFT JOIN ufs u ON u.id = d.uf_representacao_id",
    );
    push_filter(&mut builder, filter);
    let count = builder.build_query_scalar().fetch_one(pool).await?;
    Ok(count)
}

/// Deputies matching `filter`, ordered by name
pub async fn list_deputies(
    pool: &SqlitePool,
    filter: &DeputyFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Deputy>> {
    let mut builder = QueryBuilder::<Sqlite>::new(DEPUTY_SELECT);
    push_filter(&mut builder, filter);
    builder
        .push(" ORDER BY d.nome, d.id LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let deputies = builder.build_query_as::<Deputy>().fetch_all(pool).await?;
    Ok(deputies)
}

/// Distinct non-empty party siglas carried by deputies
pub async fn distinct_party_siglas(pool: &SqlitePool) -> Result<Vec<String>> {
    let siglas = sqlx::query_scalar(
        "SELECT DISTINCT sigla_partido FROM deputies WHERE sigla_partido != '' ORDER BY sigla_partido",
    )
    .fetch_all(pool)
    .await?;
    Ok(siglas)
}

/// Distinct UF siglas that deputies represent
pub async fn distinct_uf_siglas(pool: &SqlitePool) -> Result<Vec<String>> {
    let siglas = sqlx::query_scalar(
        r#"
        SELECT DISTINCT u.sigla
        FROM deputies d
        JOIN ufs u ON u.id = d.uf_representacao_id
        ORDER BY u.sigla
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(siglas)
}

/// Primary keys of every deputy
pub async fn list_deputy_ids(pool: &SqlitePool) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar("SELECT id FROM deputies ORDER BY nome")
        .fetch_all(pool)
        .await?;
    Ok(ids)
}
