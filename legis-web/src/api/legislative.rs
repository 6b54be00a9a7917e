//! Deputies, proposals, votings and proposal types

use axum::{
    extract::{Path, Query, State},
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;

use legis_common::db::analyses::{list_impact_analyses_for_proposal, list_summaries_for_proposal};
use legis_common::db::deputies::{
    count_deputies, distinct_party_siglas, distinct_uf_siglas, list_deputies, load_deputy, DeputyFilter,
};
use legis_common::db::proposals::{
    count_proposal_types, count_proposals, distinct_proposal_years, distinct_type_siglas, list_proposal_types,
    list_proposals, list_proposals_by_author, list_proposals_by_type, list_types_sharing_sigla, load_proposal,
    load_proposal_by_pk, load_proposal_type, proposal_type_stats, Proposal, ProposalFilter, ProposalTypeFilter,
};
use legis_common::db::speeches::{list_speeches_by_deputy, Speech};
use legis_common::db::votings::{count_votings, list_votes_for_voting, list_votings, list_votings_for_proposal, load_voting, Voting};
use legis_common::db::ProposalStatus;
use legis_common::text::truncate_with_ellipsis;

use crate::html::{
    escape, format_date, format_datetime, link, list_or_empty, non_empty, options, page, pagination_nav, table,
};
use crate::pagination::paginate;
use crate::{AppState, WebError, WebResult};

pub const DEPUTIES_PER_PAGE: i64 = 20;
pub const PROPOSALS_PER_PAGE: i64 = 20;
pub const VOTINGS_PER_PAGE: i64 = 20;
pub const TYPES_PER_PAGE: i64 = 50;
/// Proposals and speeches shown on a deputy page
const DEPUTY_DETAIL_ITEMS: i64 = 10;
const TYPE_DETAIL_PROPOSALS: i64 = 10;
const EMENTA_PREVIEW_CHARS: usize = 160;

pub fn legislative_routes() -> Router<AppState> {
    Router::new()
        .route("/deputados/", get(deputy_list_page))
        .route("/deputados/:id_deputado/", get(deputy_detail_page))
        .route("/proposicoes/", get(proposal_list_page))
        .route("/proposicoes/:id_proposicao/", get(proposal_detail_page))
        .route("/votacoes/", get(voting_list_page))
        .route("/votacoes/:id_votacao/", get(voting_detail_page))
        .route("/tipos-proposicao/", get(type_list_page))
        .route("/tipos-proposicao/:id/", get(type_detail_page))
}

// ---------------------------------------------------------------------------
// Shared row renderers
// ---------------------------------------------------------------------------

pub(crate) fn proposal_rows(proposals: &[Proposal]) -> Vec<Vec<String>> {
    proposals
        .iter()
        .map(|p| {
            vec![
                link(&format!("/proposicoes/{}/", p.id_proposicao), &p.to_string()),
                escape(&truncate_with_ellipsis(&p.ementa, EMENTA_PREVIEW_CHARS)),
                escape(p.situacao.label()),
                format_date(p.data_apresentacao),
            ]
        })
        .collect()
}

pub(crate) const PROPOSAL_HEADERS: &[&str] = &["Proposição", "Ementa", "Situação", "Apresentação"];

pub(crate) fn speech_rows(speeches: &[Speech]) -> Vec<Vec<String>> {
    speeches
        .iter()
        .map(|s| {
            let resumo = if s.sumario.is_empty() { &s.transcricao } else { &s.sumario };
            vec![
                format_datetime(s.data),
                escape(&s.tipo_discurso),
                escape(&truncate_with_ellipsis(resumo, EMENTA_PREVIEW_CHARS)),
            ]
        })
        .collect()
}

pub(crate) const SPEECH_HEADERS: &[&str] = &["Data", "Tipo", "Sumário"];

fn approval_label(aprovacao: Option<bool>) -> &'static str {
    match aprovacao {
        Some(true) => "Aprovada",
        Some(false) => "Rejeitada",
        None => "Não informado",
    }
}

fn voting_rows(votings: &[Voting]) -> Vec<Vec<String>> {
    votings
        .iter()
        .map(|v| {
            vec![
                link(&format!("/votacoes/{}/", crate::html::encode(&v.id_votacao)), &v.id_votacao),
                format_datetime(v.data),
                escape(&truncate_with_ellipsis(&v.descricao, EMENTA_PREVIEW_CHARS)),
                approval_label(v.aprovacao).to_string(),
                format!("{} / {} / {}", v.votos_sim, v.votos_nao, v.votos_abstencao),
            ]
        })
        .collect()
}

const VOTING_HEADERS: &[&str] = &["Votação", "Data", "Descrição", "Resultado", "Sim / Não / Abst."];

fn as_options(values: Vec<String>) -> Vec<(String, String)> {
    values.into_iter().map(|v| (v.clone(), v)).collect()
}

// ---------------------------------------------------------------------------
// Deputies
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct DeputyQuery {
    pub partido: Option<String>,
    pub uf: Option<String>,
    pub page: Option<String>,
}

/// GET /deputados/
pub async fn deputy_list_page(
    State(state): State<AppState>,
    Query(query): Query<DeputyQuery>,
) -> WebResult<Html<String>> {
    let partido = non_empty(&query.partido);
    let uf = non_empty(&query.uf);
    let filter = DeputyFilter {
        partido: partido.map(str::to_string),
        uf: uf.map(str::to_string),
        nome: None,
    };

    let total = count_deputies(&state.db, &filter).await?;
    let p = paginate(total, query.page.as_deref(), DEPUTIES_PER_PAGE);
    let deputies = list_deputies(&state.db, &filter, p.per_page, p.offset).await?;

    let partidos = as_options(distinct_party_siglas(&state.db).await?);
    let ufs = as_options(distinct_uf_siglas(&state.db).await?);

    let rows: Vec<Vec<String>> = deputies
        .iter()
        .map(|d| {
            vec![
                link(&format!("/deputados/{}/", d.id_deputado), &d.nome),
                escape(&d.sigla_partido),
                escape(d.uf_sigla.as_deref().unwrap_or("")),
                escape(&d.situacao),
                escape(&d.email),
            ]
        })
        .collect();

    let content = format!(
        r#"<form class="filters" method="get">
    <label>Partido <select name="partido">{partidos}</select></label>
    <label>UF <select name="uf">{ufs}</select></label>
    <button type="submit">Filtrar</button>
</form>
{table}
{nav}"#,
        partidos = options(&partidos, partido),
        ufs = options(&ufs, uf),
        table = table(
            &["Nome", "Partido", "UF", "Situação", "E-mail"],
            &rows,
            "Nenhum deputado encontrado."
        ),
        nav = pagination_nav(&p, &[("partido", partido), ("uf", uf)]),
    );
    Ok(Html(page("Deputados", &content)))
}

/// GET /deputados/{id_deputado}/
pub async fn deputy_detail_page(
    State(state): State<AppState>,
    Path(id_deputado): Path<i64>,
) -> WebResult<Html<String>> {
    let deputy = load_deputy(&state.db, id_deputado)
        .await?
        .ok_or_else(|| WebError::NotFound("Deputado".to_string()))?;
    let proposals = list_proposals_by_author(&state.db, deputy.id, DEPUTY_DETAIL_ITEMS).await?;
    let speeches = list_speeches_by_deputy(&state.db, deputy.id, DEPUTY_DETAIL_ITEMS).await?;

    let photo = if deputy.url_foto.is_empty() {
        String::new()
    } else {
        format!(r#"<img src="{}" alt="{}" width="120">"#, escape(&deputy.url_foto), escape(&deputy.nome))
    };

    let content = format!(
        r#"<div class="card">
    {photo}
    <p><strong>Nome civil:</strong> {nome_civil}</p>
    <p><strong>Partido:</strong> {partido} &nbsp; <strong>UF:</strong> {uf}</p>
    <p><strong>Situação:</strong> {situacao} &nbsp; <strong>Condição eleitoral:</strong> {condicao}</p>
    <p><strong>E-mail:</strong> {email}</p>
    <p>{painel}</p>
</div>
<h2>Proposições</h2>
{proposals}
<h2>Discursos recentes</h2>
{speeches}"#,
        photo = photo,
        nome_civil = escape(&deputy.nome_civil),
        partido = escape(&deputy.sigla_partido),
        uf = escape(deputy.uf_sigla.as_deref().unwrap_or("")),
        situacao = escape(&deputy.situacao),
        condicao = escape(&deputy.condicao_eleitoral),
        email = escape(&deputy.email),
        painel = link(&format!("/painel/perfil/{}/", deputy.id_deputado), "Ver painel parlamentar"),
        proposals = table(PROPOSAL_HEADERS, &proposal_rows(&proposals), "Nenhuma proposição."),
        speeches = table(SPEECH_HEADERS, &speech_rows(&speeches), "Nenhum discurso."),
    );
    Ok(Html(page(&deputy.to_string(), &content)))
}

// ---------------------------------------------------------------------------
// Proposals
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ProposalQuery {
    pub tipo: Option<String>,
    pub situacao: Option<String>,
    pub ano: Option<String>,
    pub page: Option<String>,
}

impl ProposalQuery {
    fn filter(&self) -> WebResult<ProposalFilter> {
        let situacao = non_empty(&self.situacao)
            .map(str::parse::<ProposalStatus>)
            .transpose()?;
        let ano = non_empty(&self.ano)
            .map(|a| {
                a.parse::<i64>()
                    .map_err(|_| WebError::BadRequest(format!("Ano inválido: {}", a)))
            })
            .transpose()?;
        Ok(ProposalFilter {
            tipo: non_empty(&self.tipo).map(str::to_string),
            situacao,
            ano,
        })
    }
}

/// GET /proposicoes/
pub async fn proposal_list_page(
    State(state): State<AppState>,
    Query(query): Query<ProposalQuery>,
) -> WebResult<Html<String>> {
    let filter = query.filter()?;
    let total = count_proposals(&state.db, &filter).await?;
    let p = paginate(total, query.page.as_deref(), PROPOSALS_PER_PAGE);
    let proposals = list_proposals(&state.db, &filter, p.per_page, p.offset).await?;

    let tipos = as_options(distinct_type_siglas(&state.db).await?);
    let situacoes: Vec<(String, String)> = ProposalStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), s.label().to_string()))
        .collect();
    let anos: Vec<(String, String)> = distinct_proposal_years(&state.db)
        .await?
        .into_iter()
        .map(|a| (a.to_string(), a.to_string()))
        .collect();

    let tipo = non_empty(&query.tipo);
    let situacao = non_empty(&query.situacao);
    let ano = non_empty(&query.ano);

    let content = format!(
        r#"<form class="filters" method="get">
    <label>Tipo <select name="tipo">{tipos}</select></label>
    <label>Situação <select name="situacao">{situacoes}</select></label>
    <label>Ano <select name="ano">{anos}</select></label>
    <button type="submit">Filtrar</button>
</form>
{table}
{nav}"#,
        tipos = options(&tipos, tipo),
        situacoes = options(&situacoes, situacao.map(|s| s.to_uppercase()).as_deref()),
        anos = options(&anos, ano),
        table = table(PROPOSAL_HEADERS, &proposal_rows(&proposals), "Nenhuma proposição encontrada."),
        nav = pagination_nav(&p, &[("tipo", tipo), ("situacao", situacao), ("ano", ano)]),
    );
    Ok(Html(page("Proposições", &content)))
}

/// GET /proposicoes/{id_proposicao}/
pub async fn proposal_detail_page(
    State(state): State<AppState>,
    Path(id_proposicao): Path<i64>,
) -> WebResult<Html<String>> {
    let proposal = load_proposal(&state.db, id_proposicao)
        .await?
        .ok_or_else(|| WebError::NotFound("Proposição".to_string()))?;
    let votings = list_votings_for_proposal(&state.db, proposal.id).await?;
    let summaries = list_summaries_for_proposal(&state.db, proposal.id).await?;
    let analyses = list_impact_analyses_for_proposal(&state.db, proposal.id).await?;

    let autor = proposal
        .autor_nome
        .as_deref()
        .map(escape)
        .unwrap_or_else(|| "Não informado".to_string());

    let summary_items: Vec<String> = summaries
        .iter()
        .map(|s| {
            format!(
                "{} <span class=\"meta\">({}, {})</span> {}",
                escape(&truncate_with_ellipsis(&s.resumo, 300)),
                escape(&s.modelo_ia),
                format_datetime(s.created_at),
                link(&format!("/ia/resumos/{}/", s.id), "detalhes")
            )
        })
        .collect();
    let analysis_items: Vec<String> = analyses
        .iter()
        .map(|a| {
            format!(
                "<span class=\"badge\">{}</span> {} {}",
                escape(a.nivel_impacto.label()),
                escape(&truncate_with_ellipsis(&a.descricao_impacto, 300)),
                link(&format!("/ia/analises-impacto/{}/", a.id), "detalhes")
            )
        })
        .collect();

    let mut links = Vec::new();
    if !proposal.url_inteiro_teor.is_empty() {
        links.push(link(&proposal.url_inteiro_teor, "Inteiro teor"));
    }
    if !proposal.url_tramitacao.is_empty() {
        links.push(link(&proposal.url_tramitacao, "Tramitação na Câmara"));
    }

    let content = format!(
        r#"<div class="card">
    <p><strong>Ementa:</strong> {ementa}</p>
    <p>{ementa_detalhada}</p>
    <p><strong>Situação:</strong> {situacao} &nbsp; <strong>Status:</strong> {status}</p>
    <p><strong>Apresentação:</strong> {data} &nbsp; <strong>Autor:</strong> {autor}</p>
    <p>{links}</p>
</div>
<h2>Votações</h2>
{votings}
<h2>Resumos gerados por IA</h2>
{summaries}
<h2>Análises de impacto</h2>
{analyses}"#,
        ementa = escape(&proposal.ementa),
        ementa_detalhada = escape(&proposal.ementa_detalhada),
        situacao = escape(proposal.situacao.label()),
        status = escape(&proposal.status_proposicao),
        data = format_date(proposal.data_apresentacao),
        autor = autor,
        links = links.join(" | "),
        votings = table(VOTING_HEADERS, &voting_rows(&votings), "Nenhuma votação registrada."),
        summaries = list_or_empty(&summary_items, "Nenhum resumo disponível."),
        analyses = list_or_empty(&analysis_items, "Nenhuma análise disponível."),
    );
    Ok(Html(page(&proposal.to_string(), &content)))
}

// ---------------------------------------------------------------------------
// Votings
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// GET /votacoes/
pub async fn voting_list_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> WebResult<Html<String>> {
    let total = count_votings(&state.db).await?;
    let p = paginate(total, query.page.as_deref(), VOTINGS_PER_PAGE);
    let votings = list_votings(&state.db, p.per_page, p.offset).await?;

    let content = format!(
        "{}\n{}",
        table(VOTING_HEADERS, &voting_rows(&votings), "Nenhuma votação encontrada."),
        pagination_nav(&p, &[])
    );
    Ok(Html(page("Votações", &content)))
}

/// GET /votacoes/{id_votacao}/
pub async fn voting_detail_page(
    State(state): State<AppState>,
    Path(id_votacao): Path<String>,
) -> WebResult<Html<String>> {
    let voting = load_voting(&state.db, &id_votacao)
        .await?
        .ok_or_else(|| WebError::NotFound("Votação".to_string()))?;
    let proposal = load_proposal_by_pk(&state.db, voting.proposal_id).await?;
    let votes = list_votes_for_voting(&state.db, voting.id).await?;

    let proposal_link = proposal
        .map(|p| link(&format!("/proposicoes/{}/", p.id_proposicao), &p.to_string()))
        .unwrap_or_default();

    let rows: Vec<Vec<String>> = votes
        .iter()
        .map(|v| {
            vec![
                link(&format!("/deputados/{}/", v.id_deputado), &v.deputy_nome),
                escape(&v.sigla_partido),
                escape(v.voto.label()),
            ]
        })
        .collect();

    let content = format!(
        r#"<div class="card">
    <p><strong>Proposição:</strong> {proposal}</p>
    <p><strong>Descrição:</strong> {descricao}</p>
    <p><strong>Resultado:</strong> {resultado}</p>
</div>
<div class="stats">
    <div class="stat"><strong>{sim}</strong>Sim</div>
    <div class="stat"><strong>{nao}</strong>Não</div>
    <div class="stat"><strong>{abstencao}</strong>Abstenção</div>
</div>
<h2>Votos</h2>
{votes}"#,
        proposal = proposal_link,
        descricao = escape(&voting.descricao),
        resultado = approval_label(voting.aprovacao),
        sim = voting.votos_sim,
        nao = voting.votos_nao,
        abstencao = voting.votos_abstencao,
        votes = table(&["Deputado", "Partido", "Voto"], &rows, "Nenhum voto registrado."),
    );
    Ok(Html(page(&voting.to_string(), &content)))
}

// ---------------------------------------------------------------------------
// Proposal types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct TypeQuery {
    pub sigla: Option<String>,
    pub nome: Option<String>,
    pub q: Option<String>,
    pub page: Option<String>,
}

/// GET /tipos-proposicao/
pub async fn type_list_page(
    State(state): State<AppState>,
    Query(query): Query<TypeQuery>,
) -> WebResult<Html<String>> {
    let sigla = non_empty(&query.sigla);
    let nome = non_empty(&query.nome);
    let q = non_empty(&query.q);
    let filter = ProposalTypeFilter {
        sigla: sigla.map(str::to_string),
        nome: nome.map(str::to_string),
        q: q.map(str::to_string),
    };

    let total = count_proposal_types(&state.db, &filter).await?;
    let p = paginate(total, query.page.as_deref(), TYPES_PER_PAGE);
    let types = list_proposal_types(&state.db, &filter, p.per_page, p.offset).await?;
    let stats = proposal_type_stats(&state.db).await?;

    let rows: Vec<Vec<String>> = types
        .iter()
        .map(|t| {
            vec![
                link(&format!("/tipos-proposicao/{}/", t.id), &t.sigla),
                escape(&t.nome),
                escape(&t.cod),
                escape(&truncate_with_ellipsis(&t.descricao, EMENTA_PREVIEW_CHARS)),
            ]
        })
        .collect();
    let top: Vec<Vec<String>> = stats
        .top_siglas
        .iter()
        .map(|(sigla, count)| vec![escape(sigla), count.to_string()])
        .collect();

    let content = format!(
        r#"<div class="stats">
    <div class="stat"><strong>{total}</strong>Tipos cadastrados</div>
    <div class="stat"><strong>{with}</strong>Com descrição</div>
    <div class="stat"><strong>{without}</strong>Sem descrição</div>
</div>
<form class="filters" method="get">
    <label>Sigla <input name="sigla" value="{sigla}"></label>
    <label>Nome <input name="nome" value="{nome}"></label>
    <label>Busca <input name="q" value="{q}"></label>
    <button type="submit">Buscar</button>
</form>
{table}
{nav}
<h2>Siglas mais frequentes</h2>
{top}"#,
        total = stats.total,
        with = stats.with_description,
        without = stats.without_description,
        sigla = escape(sigla.unwrap_or("")),
        nome = escape(nome.unwrap_or("")),
        q = escape(q.unwrap_or("")),
        table = table(&["Sigla", "Nome", "Código", "Descrição"], &rows, "Nenhum tipo encontrado."),
        nav = pagination_nav(&p, &[("sigla", sigla), ("nome", nome), ("q", q)]),
        top = table(&["Sigla", "Tipos"], &top, "Nenhum tipo cadastrado."),
    );
    Ok(Html(page("Tipos de Proposição", &content)))
}

/// GET /tipos-proposicao/{id}/
pub async fn type_detail_page(State(state): State<AppState>, Path(id): Path<i64>) -> WebResult<Html<String>> {
    let tipo = load_proposal_type(&state.db, id)
        .await?
        .ok_or_else(|| WebError::NotFound("Tipo de proposição".to_string()))?;
    let same_sigla = list_types_sharing_sigla(&state.db, &tipo.sigla, tipo.id).await?;
    let proposals = list_proposals_by_type(&state.db, tipo.id, TYPE_DETAIL_PROPOSALS).await?;

    let others: Vec<String> = same_sigla
        .iter()
        .map(|t| link(&format!("/tipos-proposicao/{}/", t.id), &format!("{} (cód. {})", t, t.cod)))
        .collect();

    let content = format!(
        r#"<div class="card">
    <p><strong>Código:</strong> {cod}</p>
    <p><strong>Descrição:</strong> {descricao}</p>
</div>
<h2>Outros tipos com a sigla {sigla}</h2>
{others}
<h2>Proposições deste tipo</h2>
{proposals}"#,
        cod = escape(&tipo.cod),
        descricao = escape(&tipo.descricao),
        sigla = escape(&tipo.sigla),
        others = list_or_empty(&others, "Nenhum outro tipo com esta sigla."),
        proposals = table(PROPOSAL_HEADERS, &proposal_rows(&proposals), "Nenhuma proposição deste tipo."),
    );
    Ok(Html(page(&tipo.to_string(), &content)))
}
