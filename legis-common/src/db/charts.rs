//! Aggregates behind the party distribution charts

use crate::Result;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

/// Party sigla with a count (deputies or authored proposals)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct PartyCount {
    pub id: i64,
    pub sigla: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UfCount {
    /// "N/D" for deputies without a represented UF
    pub uf: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyGeography {
    pub partido: String,
    pub ufs: Vec<UfCount>,
}

/// Parties with at least one linked deputy, largest first
pub async fn deputies_per_party(pool: &SqlitePool) -> Result<Vec<PartyCount>> {
    let rows = sqlx::query_as::<_, PartyCount>(
        r#"
        SELECT p.id, p.sigla, COUNT(d.id) AS total
        FROM parties p
        JOIN deputies d ON d.partido_id = p.id
        GROUP BY p.id, p.sigla
        ORDER BY total DESC, p.sigla
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Parties by number of proposals authored by their deputies
pub async fn proposals_per_party(pool: &SqlitePool, limit: i64) -> Result<Vec<PartyCount>> {
    let rows = sqlx::query_as::<_, PartyCount>(
        r#"
        SELECT p.id, p.sigla, COUNT(pr.id) AS total
        FROM parties p
        JOIN deputies d ON d.partido_id = p.id
        JOIN proposals pr ON pr.autor_id = d.id
        GROUP BY p.id, p.sigla
        ORDER BY total DESC, p.sigla
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// UFs with the most deputies of one party
pub async fn top_ufs_for_party(pool: &SqlitePool, party_id: i64, limit: i64) -> Result<Vec<UfCount>> {
    let rows: Vec<(Option<String>, i64)> = sqlx::query_as(
        r#"
        SELECT u.sigla, COUNT(d.id) AS total
        FROM deputies d
        LEFT JOIN ufs u ON u.id = d.uf_representacao_id
        WHERE d.partido_id = ?
        GROUP BY u.sigla
        ORDER BY total DESC, u.sigla
        LIMIT ?
        "#,
    )
    .bind(party_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(uf, total)| UfCount {
            uf: uf.unwrap_or_else(|| "N/D".to_string()),
            total,
        })
        .collect())
}

/// Top UFs for each of the given parties, in order
pub async fn party_geography(pool: &SqlitePool, parties: &[PartyCount], per_party: i64) -> Result<Vec<PartyGeography>> {
    let mut geography = Vec::with_capacity(parties.len());
    for party in parties {
        geography.push(PartyGeography {
            partido: party.sigla.clone(),
            ufs: top_ufs_for_party(pool, party.id, per_party).await?,
        });
    }
    Ok(geography)
}
