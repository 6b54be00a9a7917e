//! Plenary speeches

use super::UpsertOutcome;
use crate::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Speech {
    pub id: i64,
    pub id_discurso: String,
    pub deputy_id: i64,
    pub deputy_nome: String,
    pub data: NaiveDateTime,
    pub tipo_discurso: String,
    pub transcricao: String,
    pub sumario: String,
    pub url_audio: String,
    pub url_video: String,
}

#[derive(Debug, Clone)]
pub struct SpeechRecord {
    pub id_discurso: String,
    pub deputy_id: i64,
    pub data: NaiveDateTime,
    pub tipo_discurso: String,
    pub transcricao: String,
    pub sumario: String,
    pub url_audio: String,
    pub url_video: String,
}

const SPEECH_SELECT: &str = r#"
    SELECT s.id, s.id_discurso, s.deputy_id, d.nome AS deputy_nome, s.data, s.tipo_discurso,
           s.transcricao, s.sumario, s.url_audio, s.url_video
    FROM speeches s
    JOIN deputies d ON d.id = s.deputy_id
"#;

pub async fn upsert_speech(pool: &SqlitePool, speech: &SpeechRecord) -> Result<UpsertOutcome> {
    let existed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM speeches WHERE id_discurso = ?")
        .bind(&speech.id_discurso)
        .fetch_one(pool)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO speeches (
            id_discurso, deputy_id, data, tipo_discurso, transcricao, sumario, url_audio, url_video,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(id_discurso) DO UPDATE SET
            deputy_id = excluded.deputy_id,
            data = excluded.data,
            tipo_discurso = excluded.tipo_discurso,
            transcricao = excluded.transcricao,
            sumario = excluded.sumario,
            url_audio = excluded.url_audio,
            url_video = excluded.url_video,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&speech.id_discurso)
    .bind(speech.deputy_id)
    .bind(speech.data)
    .bind(&speech.tipo_discurso)
    .bind(&speech.transcricao)
    .bind(&speech.sumario)
    .bind(&speech.url_audio)
    .bind(&speech.url_video)
    .execute(pool)
    .await?;

    Ok(UpsertOutcome::from_existing(existed > 0))
}

pub async fn load_speech(pool: &SqlitePool, id: i64) -> Result<Option<Speech>> {
    let sql = format!("{} WHERE s.id = ?", SPEECH_SELECT);
    let speech = sqlx::query_as::<_, Speech>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(speech)
}

/// Speeches of a deputy, newest first
pub async fn list_speeches_by_deputy(pool: &SqlitePool, deputy_id: i64, limit: i64) -> Result<Vec<Speech>> {
    let sql = format!(
        "{} WHERE s.deputy_id = ? ORDER BY s.data DESC, s.id DESC LIMIT ?",
        SPEECH_SELECT
    );
    let speeches = sqlx::query_as::<_, Speech>(&sql)
        .bind(deputy_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(speeches)
}

pub async fn count_speeches_by_deputy(pool: &SqlitePool, deputy_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM speeches WHERE deputy_id = ?")
        .bind(deputy_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
