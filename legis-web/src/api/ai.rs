//! AI summaries, impact analyses and semantic search

use axum::{
    extract::{Path, Query, State},
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{debug, warn};

use legis_common::ai::rank_by_similarity;
use legis_common::db::analyses::{
    count_embeddings, count_impact_analyses, count_summaries, list_impact_analyses, list_summaries, load_embeddings,
    load_impact_analysis, load_summary, AiSummary, ImpactAnalysis,
};
use legis_common::db::proposals::{load_proposal_by_pk, search_proposals_by_ementa, Proposal};
use legis_common::db::ImpactLevel;
use legis_common::text::truncate_with_ellipsis;

use crate::api::legislative::{proposal_rows, PageQuery, PROPOSAL_HEADERS};
use crate::html::{escape, format_datetime, link, list_or_empty, non_empty, options, page, pagination_nav, table};
use crate::pagination::paginate;
use crate::{AppState, WebError, WebResult};

pub const ANALYSES_PER_PAGE: i64 = 20;
const INDEX_ITEMS: i64 = 10;
const SEARCH_RESULTS: usize = 20;

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/ia/", get(ai_index_page))
        .route("/ia/resumos/", get(summary_list_page))
        .route("/ia/resumos/:id/", get(summary_detail_page))
        .route("/ia/analises-impacto/", get(impact_list_page))
        .route("/ia/analises-impacto/:id/", get(impact_detail_page))
        .route("/ia/busca-semantica/", get(semantic_search_page))
}

fn summary_rows(summaries: &[AiSummary]) -> Vec<Vec<String>> {
    summaries
        .iter()
        .map(|s| {
            vec![
                link(&format!("/ia/resumos/{}/", s.id), &s.proposal_label),
                escape(&truncate_with_ellipsis(&s.resumo, 200)),
                escape(&s.modelo_ia),
                format_datetime(s.created_at),
            ]
        })
        .collect()
}

const SUMMARY_HEADERS: &[&str] = &["Proposição", "Resumo", "Modelo", "Gerado em"];

fn impact_rows(analyses: &[ImpactAnalysis]) -> Vec<Vec<String>> {
    analyses
        .iter()
        .map(|a| {
            vec![
                link(&format!("/ia/analises-impacto/{}/", a.id), &a.proposal_label),
                format!(r#"<span class="badge">{}</span>"#, escape(a.nivel_impacto.label())),
                escape(&truncate_with_ellipsis(&a.descricao_impacto, 200)),
                format_datetime(a.created_at),
            ]
        })
        .collect()
}

const IMPACT_HEADERS: &[&str] = &["Proposição", "Nível", "Descrição", "Gerado em"];

fn escaped_items(values: &[String]) -> Vec<String> {
    values.iter().map(|v| escape(v)).collect()
}

/// GET /ia/
pub async fn ai_index_page(State(state): State<AppState>) -> WebResult<Html<String>> {
    let summaries = list_summaries(&state.db, INDEX_ITEMS, 0).await?;
    let analyses = list_impact_analyses(&state.db, None, INDEX_ITEMS, 0).await?;
    let total_summaries = count_summaries(&state.db).await?;
    let total_analyses = count_impact_analyses(&state.db, None).await?;
    let total_embeddings = count_embeddings(&state.db).await?;

    let content = format!(
        r#"<div class="stats">
    <div class="stat"><strong>{total_summaries}</strong>Resumos</div>
    <div class="stat"><strong>{total_analyses}</strong>Análises de impacto</div>
    <div class="stat"><strong>{total_embeddings}</strong>Proposições indexadas</div>
</div>
<form class="filters" method="get" action="/ia/busca-semantica/">
    <label>Busca semântica <input name="q"></label>
    <button type="submit">Buscar</button>
</form>
<h2>Resumos recentes</h2>
{summaries}
<p>{all_summaries}</p>
<h2>Análises de impacto recentes</h2>
{analyses}
<p>{all_analyses}</p>"#,
        total_summaries = total_summaries,
        total_analyses = total_analyses,
        total_embeddings = total_embeddings,
        summaries = table(SUMMARY_HEADERS, &summary_rows(&summaries), "Nenhum resumo gerado."),
        all_summaries = link("/ia/resumos/", "Todos os resumos"),
        analyses = table(IMPACT_HEADERS, &impact_rows(&analyses), "Nenhuma análise gerada."),
        all_analyses = link("/ia/analises-impacto/", "Todas as análises"),
    );
    Ok(Html(page("Análises por IA", &content)))
}

/// GET /ia/resumos/
pub async fn summary_list_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> WebResult<Html<String>> {
    let total = count_summaries(&state.db).await?;
    let p = paginate(total, query.page.as_deref(), ANALYSES_PER_PAGE);
    let summaries = list_summaries(&state.db, p.per_page, p.offset).await?;

    let content = format!(
        "{}\n{}",
        table(SUMMARY_HEADERS, &summary_rows(&summaries), "Nenhum resumo gerado."),
        pagination_nav(&p, &[])
    );
    Ok(Html(page("Resumos gerados por IA", &content)))
}

/// GET /ia/resumos/{id}/
pub async fn summary_detail_page(State(state): State<AppState>, Path(id): Path<i64>) -> WebResult<Html<String>> {
    let summary = load_summary(&state.db, id)
        .await?
        .ok_or_else(|| WebError::NotFound("Resumo".to_string()))?;

    let content = format!(
        r#"<p>{proposal}</p>
<div class="card">
    <h2>Resumo executivo</h2>
    <p>{executivo}</p>
    <h2>Resumo</h2>
    <p>{resumo}</p>
</div>
<h2>Principais pontos</h2>
{pontos}
<p class="meta">Modelo {modelo}, gerado em {data}</p>"#,
        proposal = link(&format!("/proposicoes/{}/", summary.id_proposicao), &summary.proposal_label),
        executivo = escape(&summary.resumo_executivo),
        resumo = escape(&summary.resumo),
        pontos = list_or_empty(&escaped_items(&summary.principais_pontos), "Nenhum ponto extraído."),
        modelo = escape(&summary.modelo_ia),
        data = format_datetime(summary.created_at),
    );
    Ok(Html(page(&format!("Resumo: {}", summary.proposal_label), &content)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ImpactQuery {
    pub nivel: Option<String>,
    pub page: Option<String>,
}

/// GET /ia/analises-impacto/
pub async fn impact_list_page(
    State(state): State<AppState>,
    Query(query): Query<ImpactQuery>,
) -> WebResult<Html<String>> {
    let nivel_raw = non_empty(&query.nivel);
    let nivel = nivel_raw.map(str::parse::<ImpactLevel>).transpose()?;

    let total = count_impact_analyses(&state.db, nivel).await?;
    let p = paginate(total, query.page.as_deref(), ANALYSES_PER_PAGE);
    let analyses = list_impact_analyses(&state.db, nivel, p.per_page, p.offset).await?;

    let niveis: Vec<(String, String)> = ImpactLevel::ALL
        .iter()
        .map(|n| (n.as_str().to_string(), n.label().to_string()))
        .collect();
    let selected = nivel.map(|n| n.as_str());

    let content = format!(
        r#"<form class="filters" method="get">
    <label>Nível <select name="nivel">{niveis}</select></label>
    <button type="submit">Filtrar</button>
</form>
{table}
{nav}"#,
        niveis = options(&niveis, selected),
        table = table(IMPACT_HEADERS, &impact_rows(&analyses), "Nenhuma análise encontrada."),
        nav = pagination_nav(&p, &[("nivel", selected)]),
    );
    Ok(Html(page("Análises de Impacto", &content)))
}

/// GET /ia/analises-impacto/{id}/
pub async fn impact_detail_page(State(state): State<AppState>, Path(id): Path<i64>) -> WebResult<Html<String>> {
    let analysis = load_impact_analysis(&state.db, id)
        .await?
        .ok_or_else(|| WebError::NotFound("Análise de impacto".to_string()))?;

    let dimensions: Vec<Vec<String>> = [
        ("Econômico", &analysis.impacto_economico),
        ("Social", &analysis.impacto_social),
        ("Ambiental", &analysis.impacto_ambiental),
        ("Jurídico", &analysis.impacto_juridico),
    ]
    .iter()
    .filter(|(_, text)| !text.is_empty())
    .map(|(label, text)| vec![label.to_string(), escape(text)])
    .collect();

    let content = format!(
        r#"<p>{proposal} <span class="badge">{nivel}</span></p>
<div class="card"><p>{descricao}</p></div>
<h2>Áreas afetadas</h2>
{areas}
<h2>Partes interessadas</h2>
{stakeholders}
<h2>Impactos por dimensão</h2>
{dimensions}
<p class="meta">Modelo {modelo}, gerado em {data}</p>"#,
        proposal = link(&format!("/proposicoes/{}/", analysis.id_proposicao), &analysis.proposal_label),
        nivel = escape(analysis.nivel_impacto.label()),
        descricao = escape(&analysis.descricao_impacto),
        areas = list_or_empty(&escaped_items(&analysis.areas_afetadas), "Não identificadas."),
        stakeholders = list_or_empty(&escaped_items(&analysis.stakeholders), "Não identificadas."),
        dimensions = table(&["Dimensão", "Impacto"], &dimensions, "Sem detalhamento por dimensão."),
        modelo = escape(&analysis.modelo_ia),
        data = format_datetime(analysis.created_at),
    );
    Ok(Html(page(&format!("Impacto: {}", analysis.proposal_label), &content)))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Proposals most similar to `query`
///
/// Ranks stored embeddings when the AI is configured and an index exists;
/// otherwise, or when embedding the query fails, falls back to a substring
/// match on the ementa.
pub async fn semantic_search(state: &AppState, query: &str) -> WebResult<Vec<Proposal>> {
    if state.ai.is_enabled() && count_embeddings(&state.db).await? > 0 {
        if let Some(query_embedding) = state.ai.generate_embedding(query).await {
            let candidates = load_embeddings(&state.db).await?;
            let ranked = rank_by_similarity(&query_embedding, candidates, SEARCH_RESULTS);
            let mut proposals = Vec::with_capacity(ranked.len());
            for (proposal_pk, score) in ranked {
                debug!(proposal_pk, score, "Semantic match");
                if let Some(proposal) = load_proposal_by_pk(&state.db, proposal_pk).await? {
                    proposals.push(proposal);
                }
            }
            return Ok(proposals);
        }
        warn!("Query embedding failed, using text search");
    }

    Ok(search_proposals_by_ementa(&state.db, query, SEARCH_RESULTS as i64).await?)
}

/// GET /ia/busca-semantica/
pub async fn semantic_search_page(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> WebResult<Html<String>> {
    let q = non_empty(&query.q);
    let results = match q {
        Some(q) => semantic_search(&state, q).await?,
        None => Vec::new(),
    };

    let mode = if state.ai.is_enabled() {
        "Busca por similaridade semântica"
    } else {
        "Busca textual (IA não configurada)"
    };
    let body = match q {
        Some(_) => table(PROPOSAL_HEADERS, &proposal_rows(&results), "Nenhuma proposição encontrada."),
        None => String::new(),
    };

    let content = format!(
        r#"<form class="filters" method="get">
    <label>Consulta <input name="q" value="{q}"></label>
    <button type="submit">Buscar</button>
</form>
<p class="meta">{mode}</p>
{body}"#,
        q = escape(q.unwrap_or("")),
        mode = mode,
        body = body,
    );
    Ok(Html(page("Busca Semântica", &content)))
}
