//! `analisar [--proposicoes N] [--discursos N] [--embeddings]`
//!
//! Fills the AI tables for rows that have no analysis yet. Nothing is
//! written when no model is configured.

use crate::report::{rule, RULE};
use legis_common::ai::{normalize_sentiment, parse_impact_level, AnalysisService, SUMMARY_MAX_TOKENS};
use legis_common::db::analyses::{
    insert_impact_analysis, insert_speech_analysis, insert_summary, proposals_without_embedding,
    proposals_without_summary, speeches_without_analysis, upsert_embedding, NewImpactAnalysis, NewSpeechAnalysis,
    NewSummary,
};
use legis_common::Result;
use sqlx::SqlitePool;
use std::io::Write;
use tracing::{info, warn};

/// Token budget of the executive (short) summary
const EXECUTIVE_SUMMARY_MAX_TOKENS: u32 = 150;
const SPEECH_SUMMARY_MAX_TOKENS: u32 = 200;

#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    /// Proposals to summarise and analyse
    pub proposicoes: i64,
    /// Speeches to analyse
    pub discursos: i64,
    pub embeddings: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            proposicoes: 10,
            discursos: 10,
            embeddings: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisCounts {
    pub summaries: usize,
    pub impact_analyses: usize,
    pub speech_analyses: usize,
    pub embeddings: usize,
    pub failures: usize,
}

async fn analyse_proposal(pool: &SqlitePool, ai: &AnalysisService, proposal_id: i64, text: &str) -> Result<(bool, bool)> {
    let mut summarised = false;
    if let Some(resumo) = ai.generate_summary(text, SUMMARY_MAX_TOKENS).await {
        let resumo_executivo = ai
            .generate_summary(text, EXECUTIVE_SUMMARY_MAX_TOKENS)
            .await
            .unwrap_or_default();
        insert_summary(
            pool,
            &NewSummary {
                proposal_id,
                resumo,
                resumo_executivo,
                principais_pontos: ai.extract_key_points(text).await,
                modelo_ia: ai.chat_model().to_string(),
            },
        )
        .await?;
        summarised = true;
    }

    let mut analysed = false;
    if let Some(analysis) = ai.analyze_impact(text).await {
        insert_impact_analysis(
            pool,
            &NewImpactAnalysis {
                proposal_id,
                nivel_impacto: parse_impact_level(&analysis),
                descricao_impacto: analysis,
                areas_afetadas: ai.extract_themes(text).await,
                stakeholders: Vec::new(),
                impacto_economico: String::new(),
                impacto_social: String::new(),
                impacto_ambiental: String::new(),
                impacto_juridico: String::new(),
                modelo_ia: ai.chat_model().to_string(),
            },
        )
        .await?;
        analysed = true;
    }
    Ok((summarised, analysed))
}

async fn analyse_speech(pool: &SqlitePool, ai: &AnalysisService, speech_id: i64, text: &str) -> Result<bool> {
    let Some(answer) = ai.analyze_speech_sentiment(text).await else {
        return Ok(false);
    };
    let sentimento = normalize_sentiment(&answer).unwrap_or("Neutro").to_string();

    insert_speech_analysis(
        pool,
        &NewSpeechAnalysis {
            speech_id,
            sentimento,
            temas_principais: ai.extract_themes(text).await,
            entidades_mencionadas: Vec::new(),
            resumo: ai
                .generate_summary(text, SPEECH_SUMMARY_MAX_TOKENS)
                .await
                .unwrap_or_default(),
            modelo_ia: ai.chat_model().to_string(),
        },
    )
    .await?;
    Ok(true)
}

pub async fn run_analysis(
    pool: &SqlitePool,
    ai: &AnalysisService,
    options: &AnalysisOptions,
    out: &mut dyn Write,
) -> Result<AnalysisCounts> {
    let mut counts = AnalysisCounts::default();
    if !ai.is_enabled() {
        warn!("AI analysis requested without OPENAI_API_KEY");
        writeln!(out, "⚠ OPENAI_API_KEY não configurada: nenhuma análise foi gerada")?;
        return Ok(counts);
    }

    let proposals = proposals_without_summary(pool, options.proposicoes).await?;
    writeln!(out, "Analisando {} proposições...", proposals.len())?;
    for (proposal_id, text) in &proposals {
        match analyse_proposal(pool, ai, *proposal_id, text).await {
            Ok((summarised, analysed)) => {
                counts.summaries += summarised as usize;
                counts.impact_analyses += analysed as usize;
                if !(summarised && analysed) {
                    counts.failures += 1;
                }
            }
            Err(e) => {
                counts.failures += 1;
                warn!(proposal_id, "Proposal analysis failed: {}", e);
            }
        }
    }

    let speeches = speeches_without_analysis(pool, options.discursos).await?;
    writeln!(out, "Analisando {} discursos...", speeches.len())?;
    for (speech_id, text) in &speeches {
        match analyse_speech(pool, ai, *speech_id, text).await {
            Ok(true) => counts.speech_analyses += 1,
            Ok(false) => counts.failures += 1,
            Err(e) => {
                counts.failures += 1;
                warn!(speech_id, "Speech analysis failed: {}", e);
            }
        }
    }

    if options.embeddings {
        let pending = proposals_without_embedding(pool, options.proposicoes).await?;
        writeln!(out, "Indexando {} proposições...", pending.len())?;
        for (proposal_id, text) in &pending {
            match ai.generate_embedding(text).await {
                Some(embedding) => {
                    upsert_embedding(pool, *proposal_id, &embedding, text, ai.embedding_model()).await?;
                    counts.embeddings += 1;
                }
                None => counts.failures += 1,
            }
        }
    }

    writeln!(out)?;
    rule(out, RULE)?;
    writeln!(out, "ANÁLISE CONCLUÍDA")?;
    rule(out, RULE)?;
    writeln!(out, "  • Resumos: {}", counts.summaries)?;
    writeln!(out, "  • Análises de impacto: {}", counts.impact_analyses)?;
    writeln!(out, "  • Análises de discurso: {}", counts.speech_analyses)?;
    if options.embeddings {
        writeln!(out, "  • Embeddings: {}", counts.embeddings)?;
    }
    if counts.failures > 0 {
        writeln!(out, "  • Falhas: {}", counts.failures)?;
    }

    info!(
        summaries = counts.summaries,
        impact_analyses = counts.impact_analyses,
        speech_analyses = counts.speech_analyses,
        embeddings = counts.embeddings,
        failures = counts.failures,
        "AI analysis finished"
    );
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use legis_common::ai::{ChatModel, ChatRequest};
    use legis_common::db::analyses::{count_embeddings, count_summaries, list_impact_analyses_for_proposal};
    use legis_common::db::init_memory_database;
    use legis_common::db::proposals::{load_proposal, upsert_proposal, ProposalRecord};
    use legis_common::db::ImpactLevel;
    use std::sync::Arc;

    struct CannedModel;

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn complete(&self, _request: ChatRequest) -> legis_common::Result<String> {
            Ok("Impacto alto sobre o orçamento.\nSegundo ponto".to_string())
        }

        async fn embed(&self, _model: &str, _text: &str) -> legis_common::Result<Vec<f32>> {
            Ok(vec![0.1, 0.2, 0.3])
        }
    }

    async fn seed_proposal(pool: &SqlitePool) -> i64 {
        let record = ProposalRecord {
            id_proposicao: 2345001,
            tipo_id: None,
            tipo_legado: "PL".to_string(),
            numero: 1,
            ano: 2024,
            ementa: "Dispõe sobre o orçamento".to_string(),
            ementa_detalhada: String::new(),
            data_apresentacao: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            status_proposicao: String::new(),
            autor_id: None,
            url_inteiro_teor: String::new(),
            url_tramitacao: String::new(),
        };
        upsert_proposal(pool, &record).await.unwrap();
        load_proposal(pool, 2345001).await.unwrap().unwrap().id
    }

    #[tokio::test]
    async fn test_disabled_ai_writes_nothing() {
        let pool = init_memory_database().await.unwrap();
        seed_proposal(&pool).await;

        let mut out = Vec::new();
        let counts = run_analysis(&pool, &AnalysisService::disabled(), &AnalysisOptions::default(), &mut out)
            .await
            .unwrap();
        assert_eq!(counts, AnalysisCounts::default());
        assert_eq!(count_summaries(&pool).await.unwrap(), 0);
        assert!(String::from_utf8(out).unwrap().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn test_analysis_fills_missing_rows_once() {
        let pool = init_memory_database().await.unwrap();
        let proposal_id = seed_proposal(&pool).await;
        let ai = AnalysisService::new(Some(Arc::new(CannedModel) as Arc<dyn ChatModel>), "gpt-test", "embed-test");
        let options = AnalysisOptions {
            embeddings: true,
            ..Default::default()
        };

        let counts = run_analysis(&pool, &ai, &options, &mut Vec::new()).await.unwrap();
        assert_eq!(counts.summaries, 1);
        assert_eq!(counts.impact_analyses, 1);
        assert_eq!(counts.embeddings, 1);

        let analyses = list_impact_analyses_for_proposal(&pool, proposal_id).await.unwrap();
        assert_eq!(analyses[0].nivel_impacto, ImpactLevel::Alto);
        assert_eq!(count_embeddings(&pool).await.unwrap(), 1);

        let again = run_analysis(&pool, &ai, &options, &mut Vec::new()).await.unwrap();
        assert_eq!(again.summaries, 0);
        assert_eq!(again.embeddings, 0);
    }
}
