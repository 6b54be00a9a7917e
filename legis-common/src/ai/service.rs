//! Analysis operations built on a [`ChatModel`]
//!
//! Every operation degrades instead of failing: without a configured model
//! or when the call errors, a fixed fallback value is returned and the error
//! is logged.

use super::{prompts, ChatMessage, ChatModel, ChatRequest, OpenAiClient};
use crate::config::Config;
use crate::db::ImpactLevel;
use crate::text::{non_empty_lines, prefix_chars, truncate_with_ellipsis};
use crate::Result;
use std::sync::Arc;
use tracing::{error, warn};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const SUMMARY_MAX_TOKENS: u32 = 500;
pub const NO_API_KEY_SUMMARY: &str = "API Key não configurada";

/// Model used for gender catalogue descriptions
pub const GENDER_DESCRIPTION_MODEL: &str = "gpt-4.1-mini";
pub const GENDER_DESCRIPTION_MAX_CHARS: usize = 500;

#[derive(Clone)]
pub struct AnalysisService {
    model: Option<Arc<dyn ChatModel>>,
    chat_model: String,
    embedding_model: String,
}

impl AnalysisService {
    pub fn new(model: Option<Arc<dyn ChatModel>>, chat_model: &str, embedding_model: &str) -> Self {
        Self {
            model,
            chat_model: chat_model.to_string(),
            embedding_model: embedding_model.to_string(),
        }
    }

    /// Service with no model: every operation returns its fallback
    pub fn disabled() -> Self {
        Self::new(
            None,
            crate::config::DEFAULT_AI_MODEL,
            crate::config::DEFAULT_EMBEDDING_MODEL,
        )
    }

    /// Build from configuration; an OpenAI client is created only when an API key is set
    pub fn from_config(config: &Config) -> Result<Self> {
        let model = match &config.openai_api_key {
            Some(key) => {
                let client = OpenAiClient::new(&config.openai_base_url, key, config.http_timeout())?;
                Some(Arc::new(client) as Arc<dyn ChatModel>)
            }
            None => None,
        };
        Ok(Self::new(model, &config.ai_model, &config.embedding_model))
    }

    pub fn is_enabled(&self) -> bool {
        self.model.is_some()
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    async fn ask(
        &self,
        model: &dyn ChatModel,
        system: &str,
        prompt: String,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let request = ChatRequest {
            model: self.chat_model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            max_tokens,
            temperature,
        };
        Ok(model.complete(request).await?.trim().to_string())
    }

    /// Concise summary of a legislative text
    ///
    /// Returns the fixed "API Key não configurada" text when no model is
    /// configured, `None` when the call fails.
    pub async fn generate_summary(&self, text: &str, max_tokens: u32) -> Option<String> {
        let Some(model) = &self.model else {
            return Some(NO_API_KEY_SUMMARY.to_string());
        };

        match self
            .ask(model.as_ref(), prompts::LEGISLATIVE_ANALYST, prompts::summary(text), max_tokens, DEFAULT_TEMPERATURE)
            .await
        {
            Ok(summary) => Some(summary),
            Err(e) => {
                error!("Erro ao gerar resumo: {}", e);
                None
            }
        }
    }

    pub async fn analyze_impact(&self, text: &str) -> Option<String> {
        let model = self.model.as_ref()?;
        self.ask(model.as_ref(), prompts::IMPACT_ANALYST, prompts::impact(text), 800, DEFAULT_TEMPERATURE)
            .await
            .map_err(|e| error!("Erro ao analisar impacto: {}", e))
            .ok()
    }

    /// Key points as non-empty lines of the model answer
    pub async fn extract_key_points(&self, text: &str) -> Vec<String> {
        let Some(model) = &self.model else {
            return Vec::new();
        };
        match self
            .ask(model.as_ref(), prompts::LEGISLATIVE_ANALYST, prompts::key_points(text), 500, DEFAULT_TEMPERATURE)
            .await
        {
            Ok(answer) => non_empty_lines(&answer),
            Err(e) => {
                error!("Erro ao extrair pontos: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn analyze_speech_sentiment(&self, text: &str) -> Option<String> {
        let model = self.model.as_ref()?;
        self.ask(model.as_ref(), prompts::SENTIMENT_ANALYST, prompts::speech_sentiment(text), 100, 0.5)
            .await
            .map_err(|e| error!("Erro ao analisar sentimento: {}", e))
            .ok()
    }

    pub async fn extract_themes(&self, text: &str) -> Vec<String> {
        let Some(model) = &self.model else {
            return Vec::new();
        };
        match self
            .ask(model.as_ref(), prompts::CONTENT_ANALYST, prompts::themes(text), 200, DEFAULT_TEMPERATURE)
            .await
        {
            Ok(answer) => non_empty_lines(&answer),
            Err(e) => {
                error!("Erro ao extrair temas: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn generate_embedding(&self, text: &str) -> Option<Vec<f32>> {
        let model = self.model.as_ref()?;
        model
            .embed(&self.embedding_model, text)
            .await
            .map_err(|e| error!("Erro ao gerar embedding: {}", e))
            .ok()
    }

    /// Formal description for a gender catalogue entry, at most 500 characters
    ///
    /// Never fails: a missing key or a failed call produce a placeholder text.
    pub async fn describe_gender(&self, nome: &str) -> String {
        let Some(model) = &self.model else {
            return format!("Descrição de {} (API key não configurada)", nome);
        };

        let request = ChatRequest {
            model: GENDER_DESCRIPTION_MODEL.to_string(),
            messages: vec![
                ChatMessage::system(prompts::TERMINOLOGY_EXPERT),
                ChatMessage::user(prompts::gender_definition(nome)),
            ],
            max_tokens: 200,
            temperature: DEFAULT_TEMPERATURE,
        };

        match model.complete(request).await {
            Ok(answer) => truncate_with_ellipsis(answer.trim(), GENDER_DESCRIPTION_MAX_CHARS),
            Err(e) => {
                warn!(nome = %nome, "Gender description failed: {}", e);
                format!(
                    "Classificação de sexo/gênero: {}. (Erro ao gerar descrição: {})",
                    nome,
                    prefix_chars(&e.to_string(), 100)
                )
            }
        }
    }
}

/// Impact level named first in a free-text analysis; `Medio` when none is named
pub fn parse_impact_level(analysis: &str) -> ImpactLevel {
    let lowered = analysis.to_lowercase();
    let candidates = [
        ("baixo", ImpactLevel::Baixo),
        ("médio", ImpactLevel::Medio),
        ("medio", ImpactLevel::Medio),
        ("alto", ImpactLevel::Alto),
        ("crítico", ImpactLevel::Critico),
        ("critico", ImpactLevel::Critico),
    ];

    candidates
        .iter()
        .filter_map(|(word, level)| lowered.find(word).map(|pos| (pos, *level)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, level)| level)
        .unwrap_or(ImpactLevel::Medio)
}

/// Sentiment class named first in a model answer
pub fn normalize_sentiment(answer: &str) -> Option<&'static str> {
    let lowered = answer.to_lowercase();
    [
        ("positivo", "Positivo"),
        ("negativo", "Negativo"),
        ("neutro", "Neutro"),
        ("misto", "Misto"),
    ]
    .iter()
    .filter_map(|(word, label)| lowered.find(word).map(|pos| (pos, *label)))
    .min_by_key(|(pos, _)| *pos)
    .map(|(_, label)| label)
}

/// Cosine similarity; 0 for vectors of different length or zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Candidates ordered by descending similarity to `query`, keeping `top`
pub fn rank_by_similarity<T>(query: &[f32], candidates: Vec<(T, Vec<f32>)>, top: usize) -> Vec<(T, f32)> {
    let mut scored: Vec<(T, f32)> = candidates
        .into_iter()
        .map(|(item, embedding)| {
            let score = cosine_similarity(query, &embedding);
            (item, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays a fixed answer and records requests
    struct FixedModel {
        answer: std::result::Result<String, String>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl FixedModel {
        fn answering(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(answer.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for FixedModel {
        async fn complete(&self, request: ChatRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request);
            self.answer.clone().map_err(Error::Ai)
        }

        async fn embed(&self, _model: &str, _text: &str) -> Result<Vec<f32>> {
            match &self.answer {
                Ok(_) => Ok(vec![1.0, 0.0]),
                Err(e) => Err(Error::Ai(e.clone())),
            }
        }
    }

    fn service(model: Arc<FixedModel>) -> AnalysisService {
        AnalysisService::new(Some(model as Arc<dyn ChatModel>), "gpt-3.5-turbo", "text-embedding-ada-002")
    }

    #[tokio::test]
    async fn test_disabled_service_fallbacks() {
        let service = AnalysisService::disabled();

        assert_eq!(
            service.generate_summary("texto", SUMMARY_MAX_TOKENS).await.as_deref(),
            Some(NO_API_KEY_SUMMARY)
        );
        assert!(service.analyze_impact("texto").await.is_none());
        assert!(service.extract_key_points("texto").await.is_empty());
        assert!(service.analyze_speech_sentiment("texto").await.is_none());
        assert!(service.extract_themes("texto").await.is_empty());
        assert!(service.generate_embedding("texto").await.is_none());
        assert_eq!(
            service.describe_gender("Masculino").await,
            "Descrição de Masculino (API key não configurada)"
        );
    }

    #[tokio::test]
    async fn test_summary_request_shape() {
        let model = FixedModel::answering("  Resumo curto.  ");
        let service = service(model.clone());

        let summary = service.generate_summary("Dispõe sobre X", 500).await;
        assert_eq!(summary.as_deref(), Some("Resumo curto."));

        let requests = model.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.model, "gpt-3.5-turbo");
        assert_eq!(request.max_tokens, 500);
        assert_eq!(request.messages[0].content, prompts::LEGISLATIVE_ANALYST);
        assert!(request.messages[1].content.contains("Dispõe sobre X"));
    }

    #[tokio::test]
    async fn test_failure_returns_none() {
        let service = service(FixedModel::failing("boom"));
        assert!(service.generate_summary("x", 500).await.is_none());
        assert!(service.extract_themes("x").await.is_empty());
    }

    #[tokio::test]
    async fn test_key_points_split_into_lines() {
        let service = service(FixedModel::answering("1. Um\n\n2. Dois\n"));
        assert_eq!(service.extract_key_points("x").await, vec!["1. Um", "2. Dois"]);
    }

    #[tokio::test]
    async fn test_sentiment_uses_lower_temperature() {
        let model = FixedModel::answering("Positivo");
        let service = service(model.clone());
        service.analyze_speech_sentiment("discurso").await;

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[0].max_tokens, 100);
        assert!((requests[0].temperature - 0.5).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_describe_gender_truncates_and_uses_own_model() {
        let model = FixedModel::answering(&"a".repeat(800));
        let service = service(model.clone());

        let description = service.describe_gender("Feminino").await;
        assert_eq!(description.chars().count(), 500);
        assert!(description.ends_with("..."));

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[0].model, GENDER_DESCRIPTION_MODEL);
        assert_eq!(requests[0].max_tokens, 200);
    }

    #[tokio::test]
    async fn test_describe_gender_error_text() {
        let service = service(FixedModel::failing(&"e".repeat(300)));
        let description = service.describe_gender("Feminino").await;

        assert!(description.starts_with("Classificação de sexo/gênero: Feminino. (Erro ao gerar descrição: "));
        // "AI error: " prefix plus 90 of the message fit in the 100-char cut
        assert!(description.ends_with(&format!("AI error: {})", "e".repeat(90))));
    }

    #[test]
    fn test_parse_impact_level() {
        assert_eq!(parse_impact_level("Nível de impacto: Alto. Áreas..."), ImpactLevel::Alto);
        assert_eq!(parse_impact_level("1. Nível: CRÍTICO"), ImpactLevel::Critico);
        assert_eq!(parse_impact_level("impacto baixo, depois alto"), ImpactLevel::Baixo);
        assert_eq!(parse_impact_level("sem classificação"), ImpactLevel::Medio);
    }

    #[test]
    fn test_normalize_sentiment() {
        assert_eq!(normalize_sentiment("O discurso é predominantemente Negativo."), Some("Negativo"));
        assert_eq!(normalize_sentiment("MISTO"), Some("Misto"));
        assert_eq!(normalize_sentiment("indefinido"), None);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_rank_by_similarity() {
        let ranked = rank_by_similarity(
            &[1.0, 0.0],
            vec![("far", vec![0.0, 1.0]), ("near", vec![1.0, 0.1]), ("mid", vec![1.0, 1.0])],
            2,
        );
        let names: Vec<_> = ranked.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["near", "mid"]);
    }
}
