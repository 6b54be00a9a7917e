//! Political parties keyed by the Chamber's `id_partido`

use super::UpsertOutcome;
use crate::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Party {
    pub id: i64,
    pub id_partido: i64,
    pub sigla: String,
    pub nome: String,
    pub uri: String,
    pub status_data: Option<NaiveDateTime>,
    pub status_situacao: String,
    pub status_total_posse: Option<i64>,
    pub status_total_membros: Option<i64>,
    pub status_id_legislatura: Option<i64>,
    pub numero_eleitoral: Option<i64>,
    pub url_logo: String,
    pub url_website: String,
    pub url_facebook: String,
}

/// Fields present in every party listing entry
#[derive(Debug, Clone, Default)]
pub struct PartySummary {
    pub id_partido: i64,
    pub sigla: String,
    pub nome: String,
    pub uri: String,
}

/// Fields only present in the per-party detail response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartyDetails {
    pub status_data: Option<NaiveDateTime>,
    pub status_situacao: String,
    pub status_total_posse: Option<i64>,
    pub status_total_membros: Option<i64>,
    pub status_id_legislatura: Option<i64>,
    pub numero_eleitoral: Option<i64>,
    pub url_logo: String,
    pub url_website: String,
    pub url_facebook: String,
}

const PARTY_COLUMNS: &str = "id, id_partido, sigla, nome, uri, status_data, status_situacao, \
     status_total_posse, status_total_membros, status_id_legislatura, numero_eleitoral, \
     url_logo, url_website, url_facebook";

/// Insert or update the listing fields; detail fields are left untouched
pub async fn upsert_party(pool: &SqlitePool, party: &PartySummary) -> Result<UpsertOutcome> {
    let existed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM parties WHERE id_partido = ?")
        .bind(party.id_partido)
        .fetch_one(pool)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO parties (id_partido, sigla, nome, uri, created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(id_partido) DO UPDATE SET
            sigla = excluded.sigla,
            nome = excluded.nome,
            uri = excluded.uri,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(party.id_partido)
    .bind(&party.sigla)
    .bind(&party.nome)
    .bind(&party.uri)
    .execute(pool)
    .await?;

    Ok(UpsertOutcome::from_existing(existed > 0))
}

pub async fn update_party_details(
    pool: &SqlitePool,
    id_partido: i64,
    details: &PartyDetails,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE parties SET
            status_data = ?,
            status_situacao = ?,
            status_total_posse = ?,
            status_total_membros = ?,
            status_id_legislatura = ?,
            numero_eleitoral = ?,
            url_logo = ?,
            url_website = ?,
            url_facebook = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id_partido = ?
        "#,
    )
    .bind(details.status_data)
    .bind(&details.status_situacao)
    .bind(details.status_total_posse)
    .bind(details.status_total_membros)
    .bind(details.status_id_legislatura)
    .bind(details.numero_eleitoral)
    .bind(&details.url_logo)
    .bind(&details.url_website)
    .bind(&details.url_facebook)
    .bind(id_partido)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_party_by_sigla(pool: &SqlitePool, sigla: &str) -> Result<Option<Party>> {
    let sql = format!(
        "SELECT {} FROM parties WHERE upper(sigla) = upper(?) ORDER BY id_partido LIMIT 1",
        PARTY_COLUMNS
    );
    let party = sqlx::query_as::<_, Party>(&sql)
        .bind(sigla.trim())
        .fetch_optional(pool)
        .await?;
    Ok(party)
}

pub async fn load_party(pool: &SqlitePool, id_partido: i64) -> Result<Option<Party>> {
    let sql = format!("SELECT {} FROM parties WHERE id_partido = ?", PARTY_COLUMNS);
    let party = sqlx::query_as::<_, Party>(&sql)
        .bind(id_partido)
        .fetch_optional(pool)
        .await?;
    Ok(party)
}

/// Parties ordered by sigla, optionally limited
pub async fn list_parties(pool: &SqlitePool, limit: Option<i64>) -> Result<Vec<Party>> {
    let sql = format!(
        "SELECT {} FROM parties ORDER BY sigla LIMIT ?",
        PARTY_COLUMNS
    );
    let parties = sqlx::query_as::<_, Party>(&sql)
        .bind(limit.unwrap_or(-1))
        .fetch_all(pool)
        .await?;
    Ok(parties)
}

pub async fn count_parties(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM parties")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;
    use chrono::NaiveDate;

    fn pt() -> PartySummary {
        PartySummary {
            id_partido: 36844,
            sigla: "PT".into(),
            nome: "Partido dos Trabalhadores".into(),
            uri: "https://dadosabertos.camara.leg.br/api/v2/partidos/36844".into(),
        }
    }

    #[tokio::test]
    async fn test_upsert_party_keeps_details() {
        let pool = init_memory_database().await.unwrap();

        assert_eq!(upsert_party(&pool, &pt()).await.unwrap(), UpsertOutcome::Created);

        let details = PartyDetails {
            status_data: NaiveDate::from_ymd_opt(2023, 2, 1)
                .and_then(|d| d.and_hms_opt(10, 30, 0)),
            status_situacao: "Ativo".into(),
            status_total_membros: Some(68),
            numero_eleitoral: Some(13),
            ..Default::default()
        };
        update_party_details(&pool, 36844, &details).await.unwrap();

        assert_eq!(upsert_party(&pool, &pt()).await.unwrap(), UpsertOutcome::Updated);

        let loaded = load_party(&pool, 36844).await.unwrap().unwrap();
        assert_eq!(loaded.status_situacao, "Ativo");
        assert_eq!(loaded.status_total_membros, Some(68));
        assert_eq!(loaded.numero_eleitoral, Some(13));
        assert_eq!(loaded.status_data, details.status_data);
        assert_eq!(count_parties(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_party_by_sigla_is_case_insensitive() {
        let pool = init_memory_database().await.unwrap();
        upsert_party(&pool, &pt()).await.unwrap();

        assert!(find_party_by_sigla(&pool, "pt").await.unwrap().is_some());
        assert!(find_party_by_sigla(&pool, "PSOL").await.unwrap().is_none());
    }
}
