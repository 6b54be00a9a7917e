//! Regions, federative units and municipalities (IBGE codes as primary keys)

use super::UpsertOutcome;
use crate::Result;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Region {
    pub id: i64,
    pub sigla: String,
    pub nome: String,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.nome, self.sigla)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Uf {
    pub id: i64,
    pub sigla: String,
    pub nome: String,
    pub region_id: i64,
}

impl fmt::Display for Uf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.nome, self.sigla)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Municipality {
    pub id: i64,
    pub nome: String,
    pub uf_id: i64,
    pub is_capital: bool,
}

impl Municipality {
    /// `"Porto Velho/RO (Capital)"`
    pub fn display_with_uf(&self, uf_sigla: &str) -> String {
        if self.is_capital {
            format!("{}/{} (Capital)", self.nome, uf_sigla)
        } else {
            format!("{}/{}", self.nome, uf_sigla)
        }
    }
}

/// IBGE codes of the 27 state capitals
pub const CAPITAL_CODES: [i64; 27] = [
    1100205, // Porto Velho
    1200401, // Rio Branco
    1302603, // Manaus
    1400100, // Boa Vista
    1501402, // Belém
    1600303, // Macapá
    1721000, // Palmas
    2111300, // São Luís
    2211001, // Teresina
    2304400, // Fortaleza
    2408102, // Natal
    2507507, // João Pessoa
    2611606, // Recife
    2704302, // Maceió
    2800308, // Aracaju
    2927408, // Salvador
    3106200, // Belo Horizonte
    3205309, // Vitória
    3304557, // Rio de Janeiro
    3550308, // São Paulo
    4106902, // Curitiba
    4205407, // Florianópolis
    4314902, // Porto Alegre
    5002704, // Campo Grande
    5103403, // Cuiabá
    5208707, // Goiânia
    5300108, // Brasília
];

pub fn is_capital_code(municipality_id: i64) -> bool {
    CAPITAL_CODES.contains(&municipality_id)
}

/// UF code embedded in a municipality code (its first two digits)
pub fn uf_code_of_municipality(municipality_id: i64) -> Option<i64> {
    let digits = municipality_id.to_string();
    if digits.len() < 2 {
        return None;
    }
    digits[..2].parse().ok()
}

async fn exists(pool: &SqlitePool, table: &str, id: i64) -> Result<bool> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?", table);
    let count: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(pool).await?;
    Ok(count > 0)
}

pub async fn upsert_region(pool: &SqlitePool, region: &Region) -> Result<UpsertOutcome> {
    let existed = exists(pool, "regions", region.id).await?;

    sqlx::query(
        r#"
        INSERT INTO regions (id, sigla, nome, created_at, updated_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(id) DO UPDATE SET
            sigla = excluded.sigla,
            nome = excluded.nome,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(region.id)
    .bind(&region.sigla)
    .bind(&region.nome)
    .execute(pool)
    .await?;

    Ok(UpsertOutcome::from_existing(existed))
}

pub async fn upsert_uf(pool: &SqlitePool, uf: &Uf) -> Result<UpsertOutcome> {
    let existed = exists(pool, "ufs", uf.id).await?;

    sqlx::query(
        r#"
        INSERT INTO ufs (id, sigla, nome, region_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(id) DO UPDATE SET
            sigla = excluded.sigla,
            nome = excluded.nome,
            region_id = excluded.region_id,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(uf.id)
    .bind(&uf.sigla)
    .bind(&uf.nome)
    .bind(uf.region_id)
    .execute(pool)
    .await?;

    Ok(UpsertOutcome::from_existing(existed))
}

pub async fn upsert_municipality(
    pool: &SqlitePool,
    municipality: &Municipality,
) -> Result<UpsertOutcome> {
    let existed = exists(pool, "municipalities", municipality.id).await?;

    sqlx::query(
        r#"
        INSERT INTO municipalities (id, nome, uf_id, is_capital, created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(id) DO UPDATE SET
            nome = excluded.nome,
            uf_id = excluded.uf_id,
            is_capital = excluded.is_capital,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(municipality.id)
    .bind(&municipality.nome)
    .bind(municipality.uf_id)
    .bind(municipality.is_capital)
    .execute(pool)
    .await?;

    Ok(UpsertOutcome::from_existing(existed))
}

pub async fn region_exists(pool: &SqlitePool, id: i64) -> Result<bool> {
    exists(pool, "regions", id).await
}

pub async fn uf_exists(pool: &SqlitePool, id: i64) -> Result<bool> {
    exists(pool, "ufs", id).await
}

pub async fn find_uf_by_sigla(pool: &SqlitePool, sigla: &str) -> Result<Option<Uf>> {
    let uf = sqlx::query_as::<_, Uf>("SELECT id, sigla, nome, region_id FROM ufs WHERE sigla = ?")
        .bind(sigla.trim().to_uppercase())
        .fetch_optional(pool)
        .await?;
    Ok(uf)
}

pub async fn find_uf(pool: &SqlitePool, id: i64) -> Result<Option<Uf>> {
    let uf = sqlx::query_as::<_, Uf>("SELECT id, sigla, nome, region_id FROM ufs WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(uf)
}

/// Municipality in a UF matched by case-insensitive name
pub async fn find_municipality_by_name(
    pool: &SqlitePool,
    uf_id: i64,
    nome: &str,
) -> Result<Option<Municipality>> {
    let municipality = sqlx::query_as::<_, Municipality>(
        r#"
        SELECT id, nome, uf_id, is_capital
        FROM municipalities
        WHERE uf_id = ? AND lower(nome) = lower(?)
        LIMIT 1
        "#,
    )
    .bind(uf_id)
    .bind(nome.trim())
    .fetch_optional(pool)
    .await?;
    Ok(municipality)
}

pub async fn list_regions(pool: &SqlitePool) -> Result<Vec<Region>> {
    let regions = sqlx::query_as::<_, Region>("SELECT id, sigla, nome FROM regions ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(regions)
}

pub async fn list_ufs(pool: &SqlitePool) -> Result<Vec<Uf>> {
    let ufs = sqlx::query_as::<_, Uf>("SELECT id, sigla, nome, region_id FROM ufs ORDER BY nome")
        .fetch_all(pool)
        .await?;
    Ok(ufs)
}

/// Capital municipalities with their UF sigla, ordered by UF name
pub async fn list_capitals(pool: &SqlitePool) -> Result<Vec<(Municipality, String)>> {
    let rows: Vec<(i64, String, i64, bool, String)> = sqlx::query_as(
        r#"
        SELECT m.id, m.nome, m.uf_id, m.is_capital, u.sigla
        FROM municipalities m
        JOIN ufs u ON u.id = m.uf_id
        WHERE m.is_capital = 1
        ORDER BY u.nome
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, nome, uf_id, is_capital, sigla)| {
            (Municipality { id, nome, uf_id, is_capital }, sigla)
        })
        .collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GeographyCounts {
    pub regions: i64,
    pub ufs: i64,
    pub municipalities: i64,
    pub capitals: i64,
}

pub async fn count_geography(pool: &SqlitePool) -> Result<GeographyCounts> {
    let (regions, ufs, municipalities, capitals): (i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM regions),
            (SELECT COUNT(*) FROM ufs),
            (SELECT COUNT(*) FROM municipalities),
            (SELECT COUNT(*) FROM municipalities WHERE is_capital = 1)
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(GeographyCounts {
        regions,
        ufs,
        municipalities,
        capitals,
    })
}
