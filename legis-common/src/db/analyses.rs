//! Stored AI output: summaries, impact analyses, embeddings, speech analyses

use super::ImpactLevel;
use crate::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};

/// Short label of the joined proposal, e.g. `PL 1234/2024`
const PROPOSAL_LABEL_SQL: &str =
    "COALESCE(t.sigla, p.tipo_legado) || ' ' || p.numero || '/' || p.ano AS proposal_label";

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct AiSummary {
    pub id: i64,
    pub proposal_id: i64,
    pub id_proposicao: i64,
    pub proposal_label: String,
    pub resumo: String,
    pub resumo_executivo: String,
    pub principais_pontos: Json<Vec<String>>,
    pub modelo_ia: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ImpactAnalysis {
    pub id: i64,
    pub proposal_id: i64,
    pub id_proposicao: i64,
    pub proposal_label: String,
    pub nivel_impacto: ImpactLevel,
    pub descricao_impacto: String,
    pub areas_afetadas: Json<Vec<String>>,
    pub stakeholders: Json<Vec<String>>,
    pub impacto_economico: String,
    pub impacto_social: String,
    pub impacto_ambiental: String,
    pub impacto_juridico: String,
    pub modelo_ia: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct SpeechAnalysis {
    pub id: i64,
    pub speech_id: i64,
    pub sentimento: String,
    pub temas_principais: Json<Vec<String>>,
    pub entidades_mencionadas: Json<Vec<String>>,
    pub resumo: String,
    pub modelo_ia: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct NewSummary {
    pub proposal_id: i64,
    pub resumo: String,
    pub resumo_executivo: String,
    pub principais_pontos: Vec<String>,
    pub modelo_ia: String,
}

#[derive(Debug, Clone)]
pub struct NewImpactAnalysis {
    pub proposal_id: i64,
    pub nivel_impacto: ImpactLevel,
    pub descricao_impacto: String,
    pub areas_afetadas: Vec<String>,
    pub stakeholders: Vec<String>,
    pub impacto_economico: String,
    pub impacto_social: String,
    pub impacto_ambiental: String,
    pub impacto_juridico: String,
    pub modelo_ia: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewSpeechAnalysis {
    pub speech_id: i64,
    pub sentimento: String,
    pub temas_principais: Vec<String>,
    pub entidades_mencionadas: Vec<String>,
    pub resumo: String,
    pub modelo_ia: String,
}

fn summary_select() -> String {
    format!(
        r#"
        SELECT s.id, s.proposal_id, p.id_proposicao, {}, s.resumo, s.resumo_executivo,
               s.principais_pontos, s.modelo_ia, s.created_at
        FROM ai_summaries s
        JOIN proposals p ON p.id = s.proposal_id
        LEFT JOIN proposal_types t ON t.id = p.tipo_id
        "#,
        PROPOSAL_LABEL_SQL
    )
}

fn impact_select() -> String {
    format!(
        r#"
        SELECT a.id, a.proposal_id, p.id_proposicao, {}, a.nivel_impacto, a.descricao_impacto,
               a.areas_afetadas, a.stakeholders, a.impacto_economico, a.impacto_social,
               a.impacto_ambiental, a.impacto_juridico, a.modelo_ia, a.created_at
        FROM impact_analyses a
        JOIN proposals p ON p.id = a.proposal_id
        LEFT JOIN proposal_types t ON t.id = p.tipo_id
        "#,
        PROPOSAL_LABEL_SQL
    )
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

pub async fn insert_summary(pool: &SqlitePool, summary: &NewSummary) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO ai_summaries (
            proposal_id, resumo, resumo_executivo, principais_pontos, modelo_ia, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(summary.proposal_id)
    .bind(&summary.resumo)
    .bind(&summary.resumo_executivo)
    .bind(Json(&summary.principais_pontos))
    .bind(&summary.modelo_ia)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn load_summary(pool: &SqlitePool, id: i64) -> Result<Option<AiSummary>> {
    let sql = format!("{} WHERE s.id = ?", summary_select());
    let summary = sqlx::query_as::<_, AiSummary>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(summary)
}

pub async fn count_summaries(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM ai_summaries")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Summaries newest first
pub async fn list_summaries(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<AiSummary>> {
    let sql = format!(
        "{} ORDER BY s.created_at DESC, s.id DESC LIMIT ? OFFSET ?",
        summary_select()
    );
    let summaries = sqlx::query_as::<_, AiSummary>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(summaries)
}

pub async fn list_summaries_for_proposal(pool: &SqlitePool, proposal_id: i64) -> Result<Vec<AiSummary>> {
    let sql = format!(
        "{} WHERE s.proposal_id = ? ORDER BY s.created_at DESC, s.id DESC",
        summary_select()
    );
    let summaries = sqlx::query_as::<_, AiSummary>(&sql)
        .bind(proposal_id)
        .fetch_all(pool)
        .await?;
    Ok(summaries)
}

/// `(id, ementa)` of proposals that have no summary yet, newest first
pub async fn proposals_without_summary(pool: &SqlitePool, limit: i64) -> Result<Vec<(i64, String)>> {
    let rows = sqlx::query_as(
        r#"
        SELECT p.id, p.ementa
        FROM proposals p
        WHERE NOT EXISTS (SELECT 1 FROM ai_summaries s WHERE s.proposal_id = p.id)
        ORDER BY p.data_apresentacao DESC, p.id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Impact analyses
// ---------------------------------------------------------------------------

pub async fn insert_impact_analysis(pool: &SqlitePool, analysis: &NewImpactAnalysis) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO impact_analyses (
            proposal_id, nivel_impacto, descricao_impacto, areas_afetadas, stakeholders,
            impacto_economico, impacto_social, impacto_ambiental, impacto_juridico, modelo_ia,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(analysis.proposal_id)
    .bind(analysis.nivel_impacto)
    .bind(&analysis.descricao_impacto)
    .bind(Json(&analysis.areas_afetadas))
    .bind(Json(&analysis.stakeholders))
    .bind(&analysis.impacto_economico)
    .bind(&analysis.impacto_social)
    .bind(&analysis.impacto_ambiental)
    .bind(&analysis.impacto_juridico)
    .bind(&analysis.modelo_ia)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn load_impact_analysis(pool: &SqlitePool, id: i64) -> Result<Option<ImpactAnalysis>> {
    let sql = format!("{} WHERE a.id = ?", impact_select());
    let analysis = sqlx::query_as::<_, ImpactAnalysis>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(analysis)
}

pub async fn count_impact_analyses(pool: &SqlitePool, nivel: Option<ImpactLevel>) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM impact_analyses WHERE (? IS NULL OR nivel_impacto = ?)",
    )
    .bind(nivel)
    .bind(nivel)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Impact analyses newest first, optionally of one level
pub async fn list_impact_analyses(
    pool: &SqlitePool,
    nivel: Option<ImpactLevel>,
    limit: i64,
    offset: i64,
) -> Result<Vec<ImpactAnalysis>> {
    let sql = format!(
        "{} WHERE (? IS NULL OR a.nivel_impacto = ?) ORDER BY a.created_at DESC, a.id DESC LIMIT ? OFFSET ?",
        impact_select()
    );
    let analyses = sqlx::query_as::<_, ImpactAnalysis>(&sql)
        .bind(nivel)
        .bind(nivel)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(analyses)
}

pub async fn list_impact_analyses_for_proposal(
    pool: &SqlitePool,
    proposal_id: i64,
) -> Result<Vec<ImpactAnalysis>> {
    let sql = format!(
        "{} WHERE a.proposal_id = ? ORDER BY a.created_at DESC, a.id DESC",
        impact_select()
    );
    let analyses = sqlx::query_as::<_, ImpactAnalysis>(&sql)
        .bind(proposal_id)
        .fetch_all(pool)
        .await?;
    Ok(analyses)
}

// ---------------------------------------------------------------------------
// Semantic index
// ---------------------------------------------------------------------------

/// Store (or replace) the embedding of a proposal
pub async fn upsert_embedding(
    pool: &SqlitePool,
    proposal_id: i64,
    embedding: &[f32],
    texto_indexado: &str,
    modelo_embedding: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO semantic_index (
            proposal_id, embedding, texto_indexado, modelo_embedding, created_at, updated_at
        ) VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(proposal_id) DO UPDATE SET
            embedding = excluded.embedding,
            texto_indexado = excluded.texto_indexado,
            modelo_embedding = excluded.modelo_embedding,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(proposal_id)
    .bind(Json(embedding))
    .bind(texto_indexado)
    .bind(modelo_embedding)
    .execute(pool)
    .await?;
    Ok(())
}

/// `(proposal_id, embedding)` of every indexed proposal
pub async fn load_embeddings(pool: &SqlitePool) -> Result<Vec<(i64, Vec<f32>)>> {
    let rows: Vec<(i64, Json<Vec<f32>>)> =
        sqlx::query_as("SELECT proposal_id, embedding FROM semantic_index")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(id, Json(e))| (id, e)).collect())
}

pub async fn count_embeddings(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM semantic_index")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// `(id, ementa)` of proposals not yet indexed
pub async fn proposals_without_embedding(pool: &SqlitePool, limit: i64) -> Result<Vec<(i64, String)>> {
    let rows = sqlx::query_as(
        r#"
        SELECT p.id, p.ementa
        FROM proposals p
        WHERE NOT EXISTS (SELECT 1 FROM semantic_index i WHERE i.proposal_id = p.id)
        ORDER BY p.data_apresentacao DESC, p.id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Speech analyses
// ---------------------------------------------------------------------------

pub async fn insert_speech_analysis(pool: &SqlitePool, analysis: &NewSpeechAnalysis) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO speech_analyses (
            speech_id, sentimento, temas_principais, entidades_mencionadas, resumo, modelo_ia,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(analysis.speech_id)
    .bind(&analysis.sentimento)
    .bind(Json(&analysis.temas_principais))
    .bind(Json(&analysis.entidades_mencionadas))
    .bind(&analysis.resumo)
    .bind(&analysis.modelo_ia)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn list_speech_analyses(pool: &SqlitePool, speech_id: i64) -> Result<Vec<SpeechAnalysis>> {
    let analyses = sqlx::query_as::<_, SpeechAnalysis>(
        r#"
        SELECT id, speech_id, sentimento, temas_principais, entidades_mencionadas, resumo,
               modelo_ia, created_at
        FROM speech_analyses
        WHERE speech_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(speech_id)
    .fetch_all(pool)
    .await?;
    Ok(analyses)
}

/// `(id, transcricao)` of speeches without any analysis, newest first
pub async fn speeches_without_analysis(pool: &SqlitePool, limit: i64) -> Result<Vec<(i64, String)>> {
    let rows = sqlx::query_as(
        r#"
        SELECT s.id, s.transcricao
        FROM speeches s
        WHERE NOT EXISTS (SELECT 1 FROM speech_analyses a WHERE a.speech_id = s.id)
        ORDER BY s.data DESC, s.id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;
    use crate::db::proposals::{load_proposal, tests::record, upsert_proposal};

    async fn proposal_pk(pool: &SqlitePool, id_proposicao: i64) -> i64 {
        upsert_proposal(pool, &record(id_proposicao, "PL", "Educação digital", (2024, 2, 1)))
            .await
            .unwrap();
        load_proposal(pool, id_proposicao).await.unwrap().unwrap().id
    }

    #[tokio::test]
    async fn test_summary_round_trip_with_label() {
        let pool = init_memory_database().await.unwrap();
        let pk = proposal_pk(&pool, 1234).await;

        assert_eq!(proposals_without_summary(&pool, 10).await.unwrap().len(), 1);

        let id = insert_summary(
            &pool,
            &NewSummary {
                proposal_id: pk,
                resumo: "Resumo".into(),
                principais_pontos: vec!["1. Um".into(), "2. Dois".into()],
                modelo_ia: "gpt-3.5-turbo".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let summary = load_summary(&pool, id).await.unwrap().unwrap();
        assert_eq!(summary.proposal_label, "PL 234/2024");
        assert_eq!(summary.principais_pontos.0, vec!["1. Um", "2. Dois"]);
        assert!(proposals_without_summary(&pool, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_impact_level_filter() {
        let pool = init_memory_database().await.unwrap();
        let pk = proposal_pk(&pool, 1).await;

        for level in [ImpactLevel::Alto, ImpactLevel::Baixo, ImpactLevel::Alto] {
            insert_impact_analysis(
                &pool,
                &NewImpactAnalysis {
                    proposal_id: pk,
                    nivel_impacto: level,
                    descricao_impacto: "...".into(),
                    areas_afetadas: vec![],
                    stakeholders: vec![],
                    impacto_economico: String::new(),
                    impacto_social: String::new(),
                    impacto_ambiental: String::new(),
                    impacto_juridico: String::new(),
                    modelo_ia: "gpt-3.5-turbo".into(),
                },
            )
            .await
            .unwrap();
        }

        assert_eq!(count_impact_analyses(&pool, None).await.unwrap(), 3);
        assert_eq!(count_impact_analyses(&pool, Some(ImpactLevel::Alto)).await.unwrap(), 2);
        let baixo = list_impact_analyses(&pool, Some(ImpactLevel::Baixo), 20, 0).await.unwrap();
        assert_eq!(baixo.len(), 1);
        assert_eq!(baixo[0].nivel_impacto, ImpactLevel::Baixo);
    }

    #[tokio::test]
    async fn test_embedding_replaced_not_duplicated() {
        let pool = init_memory_database().await.unwrap();
        let pk = proposal_pk(&pool, 1).await;

        upsert_embedding(&pool, pk, &[0.1, 0.2], "texto", "text-embedding-ada-002").await.unwrap();
        upsert_embedding(&pool, pk, &[0.3, 0.4], "texto", "text-embedding-ada-002").await.unwrap();

        let embeddings = load_embeddings(&pool).await.unwrap();
        assert_eq!(embeddings, vec![(pk, vec![0.3, 0.4])]);
        assert!(proposals_without_embedding(&pool, 10).await.unwrap().is_empty());
    }
}
