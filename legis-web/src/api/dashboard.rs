//! Parliamentary dashboard pages

use axum::{
    extract::{Path, State},
    response::Html,
    routing::get,
    Router,
};

use legis_common::db::dashboard::{
    get_or_create_profile, list_comparison_members, list_comparisons, list_reports, list_reports_for_deputy,
    ActivityReport,
};
use legis_common::db::deputies::{count_deputies, list_deputies, load_deputy, DeputyFilter};
use legis_common::db::proposals::list_proposals_by_author;
use legis_common::db::speeches::list_speeches_by_deputy;
use legis_common::db::votings::vote_tally_for_deputy;

use crate::api::legislative::{proposal_rows, speech_rows, PROPOSAL_HEADERS, SPEECH_HEADERS};
use crate::html::{escape, format_date, link, list_or_empty, page, table};
use crate::{AppState, WebError, WebResult};

const INDEX_DEPUTIES: i64 = 10;
const PROFILE_ITEMS: i64 = 10;
const PROFILE_REPORTS: i64 = 5;
const COMPARISONS: i64 = 10;
const REPORTS: i64 = 50;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/painel/", get(dashboard_index_page))
        .route("/painel/perfil/:id_deputado/", get(profile_page))
        .route("/painel/comparar/", get(compare_page))
        .route("/painel/relatorios/", get(reports_page))
}

fn report_rows(reports: &[ActivityReport]) -> Vec<Vec<String>> {
    reports
        .iter()
        .map(|r| {
            vec![
                escape(&r.deputy_nome),
                escape(r.periodo.label()),
                format!("{} a {}", format_date(r.data_inicio), format_date(r.data_fim)),
                r.proposicoes_apresentadas.to_string(),
                r.votacoes_participadas.to_string(),
                r.discursos_realizados.to_string(),
                escape(&r.destaque_periodo),
            ]
        })
        .collect()
}

const REPORT_HEADERS: &[&str] = &[
    "Deputado",
    "Período",
    "Intervalo",
    "Proposições",
    "Votações",
    "Discursos",
    "Destaque",
];

/// GET /painel/
pub async fn dashboard_index_page(State(state): State<AppState>) -> WebResult<Html<String>> {
    let deputies = list_deputies(&state.db, &DeputyFilter::default(), INDEX_DEPUTIES, 0).await?;
    let items: Vec<String> = deputies
        .iter()
        .map(|d| link(&format!("/painel/perfil/{}/", d.id_deputado), &d.to_string()))
        .collect();

    let content = format!(
        r#"<h2>Perfis parlamentares</h2>
{deputies}
<p>{compare} | {reports}</p>"#,
        deputies = list_or_empty(&items, "Nenhum deputado cadastrado."),
        compare = link("/painel/comparar/", "Comparar deputados"),
        reports = link("/painel/relatorios/", "Relatórios de atividade"),
    );
    Ok(Html(page("Painel Parlamentar", &content)))
}

/// GET /painel/perfil/{id_deputado}/
pub async fn profile_page(
    State(state): State<AppState>,
    Path(id_deputado): Path<i64>,
) -> WebResult<Html<String>> {
    let deputy = load_deputy(&state.db, id_deputado)
        .await?
        .ok_or_else(|| WebError::NotFound("Deputado".to_string()))?;
    let profile = get_or_create_profile(&state.db, deputy.id).await?;
    let tally = vote_tally_for_deputy(&state.db, deputy.id).await?;
    let proposals = list_proposals_by_author(&state.db, deputy.id, PROFILE_ITEMS).await?;
    let speeches = list_speeches_by_deputy(&state.db, deputy.id, PROFILE_ITEMS).await?;
    let reports = list_reports_for_deputy(&state.db, deputy.id, PROFILE_REPORTS).await?;

    let temas: Vec<String> = profile.temas_frequentes.iter().map(|t| escape(t)).collect();
    let areas: Vec<String> = profile.areas_atuacao.iter().map(|a| escape(a)).collect();

    let content = format!(
        r#"<p>{deputy_link}</p>
<h2>Votações</h2>
<div class="stats">
    <div class="stat"><strong>{total}</strong>Votos registrados</div>
    <div class="stat"><strong>{presenca:.1}%</strong>Presença</div>
    <div class="stat"><strong>{sim}</strong>Sim</div>
    <div class="stat"><strong>{nao}</strong>Não</div>
    <div class="stat"><strong>{abstencao}</strong>Abstenção</div>
    <div class="stat"><strong>{obstrucao}</strong>Obstrução</div>
</div>
<h2>Produção legislativa</h2>
<div class="stats">
    <div class="stat"><strong>{total_proposicoes}</strong>Proposições</div>
    <div class="stat"><strong>{aprovadas}</strong>Aprovadas</div>
    <div class="stat"><strong>{em_tramitacao}</strong>Em tramitação</div>
    <div class="stat"><strong>{discursos}</strong>Discursos</div>
</div>
<h2>Temas frequentes</h2>
{temas}
<h2>Áreas de atuação</h2>
{areas}
<h2>Proposições recentes</h2>
{proposals}
<h2>Discursos recentes</h2>
{speeches}
<h2>Relatórios de atividade</h2>
{reports}
<p class="meta">Perfil atualizado em {atualizacao}</p>"#,
        deputy_link = link(&format!("/deputados/{}/", deputy.id_deputado), &deputy.to_string()),
        total = tally.total,
        presenca = tally.presence_percent(),
        sim = tally.sim,
        nao = tally.nao,
        abstencao = tally.abstencao,
        obstrucao = tally.obstrucao,
        total_proposicoes = profile.total_proposicoes,
        aprovadas = profile.proposicoes_aprovadas,
        em_tramitacao = profile.proposicoes_em_tramitacao,
        discursos = profile.total_discursos,
        temas = list_or_empty(&temas, "Sem temas identificados."),
        areas = list_or_empty(&areas, "Sem áreas identificadas."),
        proposals = table(PROPOSAL_HEADERS, &proposal_rows(&proposals), "Nenhuma proposição."),
        speeches = table(SPEECH_HEADERS, &speech_rows(&speeches), "Nenhum discurso."),
        reports = table(REPORT_HEADERS, &report_rows(&reports), "Nenhum relatório gerado."),
        atualizacao = profile.ultima_atualizacao.format("%d/%m/%Y %H:%M"),
    );
    Ok(Html(page(&profile.to_string(), &content)))
}

/// GET /painel/comparar/
pub async fn compare_page(State(state): State<AppState>) -> WebResult<Html<String>> {
    let filter = DeputyFilter::default();
    let total = count_deputies(&state.db, &filter).await?;
    let deputies = list_deputies(&state.db, &filter, total, 0).await?;
    let comparisons = list_comparisons(&state.db, COMPARISONS).await?;

    let mut comparison_rows = Vec::with_capacity(comparisons.len());
    for comparison in &comparisons {
        let members = list_comparison_members(&state.db, comparison.id).await?;
        comparison_rows.push(vec![
            escape(&comparison.nome),
            escape(&comparison.descricao),
            escape(&members.join(", ")),
            escape(&comparison.criterios.join(", ")),
        ]);
    }

    let deputy_rows: Vec<Vec<String>> = deputies
        .iter()
        .map(|d| {
            vec![
                link(&format!("/painel/perfil/{}/", d.id_deputado), &d.nome),
                escape(&d.sigla_partido),
                escape(d.uf_sigla.as_deref().unwrap_or("")),
            ]
        })
        .collect();

    let content = format!(
        r#"<h2>Comparações salvas</h2>
{comparisons}
<h2>Deputados ({total})</h2>
{deputies}"#,
        comparisons = table(
            &["Nome", "Descrição", "Deputados", "Critérios"],
            &comparison_rows,
            "Nenhuma comparação salva."
        ),
        total = total,
        deputies = table(&["Deputado", "Partido", "UF"], &deputy_rows, "Nenhum deputado cadastrado."),
    );
    Ok(Html(page("Comparar Deputados", &content)))
}

/// GET /painel/relatorios/
pub async fn reports_page(State(state): State<AppState>) -> WebResult<Html<String>> {
    let reports = list_reports(&state.db, REPORTS).await?;
    let content = table(REPORT_HEADERS, &report_rows(&reports), "Nenhum relatório gerado.");
    Ok(Html(page("Relatórios de Atividade", &content)))
}
