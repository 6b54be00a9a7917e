//! Team task management
//!
//! Every handler takes [`CurrentUser`], so an anonymous request is answered
//! 401 before any query runs. Task lists are limited to the teams the user
//! belongs to.

use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::info;

use legis_common::db::proposals::load_proposal_by_pk;
use legis_common::db::tasks::{
    add_task_comment, count_member_tasks, create_task, is_team_member, list_assigned_tasks, list_attachments,
    list_member_tasks, list_task_comments, list_team_member_names, list_team_tasks, list_user_teams, load_task,
    load_team_for_member, set_task_status, NewTask, Task, TaskFilter,
};
use legis_common::db::{TaskPriority, TaskStatus};

use crate::auth::CurrentUser;
use crate::html::{escape, format_date, format_datetime, link, list_or_empty, non_empty, options, page, pagination_nav, table};
use crate::pagination::paginate;
use crate::{AppState, WebError, WebResult};

pub const TASKS_PER_PAGE: i64 = 20;
const INDEX_ITEMS: i64 = 10;
const TEAM_TASKS: i64 = 20;

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/gestao/", get(task_index_page))
        .route("/tarefas/", get(task_list_page).post(create_task_form))
        .route("/tarefas/:id/", get(task_detail_page))
        .route("/tarefas/:id/comentarios", post(add_comment_form))
        .route("/tarefas/:id/status", post(change_status_form))
        .route("/equipes/", get(team_list_page))
        .route("/equipes/:id/", get(team_detail_page))
}

fn status_options() -> Vec<(String, String)> {
    TaskStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), s.label().to_string()))
        .collect()
}

fn priority_options() -> Vec<(String, String)> {
    TaskPriority::ALL
        .iter()
        .map(|p| (p.as_str().to_string(), p.label().to_string()))
        .collect()
}

fn task_rows(tasks: &[Task]) -> Vec<Vec<String>> {
    tasks
        .iter()
        .map(|t| {
            vec![
                link(&format!("/tarefas/{}/", t.id), &t.titulo),
                escape(t.status.label()),
                escape(t.prioridade.label()),
                link(&format!("/equipes/{}/", t.team_id), &t.team_nome),
                escape(t.responsavel_username.as_deref().unwrap_or("-")),
                t.data_fim_prevista.map(format_date).unwrap_or_default(),
            ]
        })
        .collect()
}

const TASK_HEADERS: &[&str] = &["Tarefa", "Status", "Prioridade", "Equipe", "Responsável", "Prazo"];

/// GET /gestao/
pub async fn task_index_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> WebResult<Html<String>> {
    let assigned = list_assigned_tasks(&state.db, user.id, INDEX_ITEMS).await?;
    let team_tasks = list_member_tasks(&state.db, user.id, &TaskFilter::default(), INDEX_ITEMS, 0).await?;

    let content = format!(
        r#"<p>Olá, {username}.</p>
<h2>Minhas tarefas</h2>
{assigned}
<h2>Tarefas das minhas equipes</h2>
{team_tasks}
<p>{all_tasks} | {teams}</p>"#,
        username = escape(&user.username),
        assigned = table(TASK_HEADERS, &task_rows(&assigned), "Nenhuma tarefa atribuída a você."),
        team_tasks = table(TASK_HEADERS, &task_rows(&team_tasks), "Nenhuma tarefa nas suas equipes."),
        all_tasks = link("/tarefas/", "Todas as tarefas"),
        teams = link("/equipes/", "Minhas equipes"),
    );
    Ok(Html(page("Gestão de Tarefas", &content)))
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub status: Option<String>,
    pub prioridade: Option<String>,
    pub equipe: Option<String>,
    pub page: Option<String>,
}

fn parse_team_id(raw: &str) -> WebResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| WebError::BadRequest(format!("Equipe inválida: {}", raw)))
}

/// GET /tarefas/
pub async fn task_list_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<TaskQuery>,
) -> WebResult<Html<String>> {
    let status = non_empty(&query.status);
    let prioridade = non_empty(&query.prioridade);
    let equipe = non_empty(&query.equipe);
    let filter = TaskFilter {
        status: status.map(str::parse::<TaskStatus>).transpose()?,
        prioridade: prioridade.map(str::parse::<TaskPriority>).transpose()?,
        team_id: equipe.map(parse_team_id).transpose()?,
    };

    let total = count_member_tasks(&state.db, user.id, &filter).await?;
    let p = paginate(total, query.page.as_deref(), TASKS_PER_PAGE);
    let tasks = list_member_tasks(&state.db, user.id, &filter, p.per_page, p.offset).await?;
    let teams: Vec<(String, String)> = list_user_teams(&state.db, user.id)
        .await?
        .into_iter()
        .map(|t| (t.id.to_string(), t.nome))
        .collect();

    let status_code = filter.status.map(|s| s.as_str());
    let prioridade_code = filter.prioridade.map(|p| p.as_str());

    let content = format!(
        r#"<form class="filters" method="get">
    <label>Status <select name="status">{status_options}</select></label>
    <label>Prioridade <select name="prioridade">{priority_options}</select></label>
    <label>Equipe <select name="equipe">{team_options}</select></label>
    <button type="submit">Filtrar</button>
</form>
{table}
{nav}
<h2>Nova tarefa</h2>
<form class="card" method="post" action="/tarefas/">
    <label>Título <input name="titulo" required></label>
    <label>Descrição <textarea name="descricao"></textarea></label>
    <label>Equipe <select name="equipe">{team_options}</select></label>
    <label>Prioridade <select name="prioridade">{priority_options}</select></label>
    <label>Prazo <input type="date" name="data_fim_prevista"></label>
    <button type="submit">Criar</button>
</form>"#,
        status_options = options(&status_options(), status_code),
        priority_options = options(&priority_options(), prioridade_code),
        team_options = options(&teams, equipe),
        table = table(TASK_HEADERS, &task_rows(&tasks), "Nenhuma tarefa encontrada."),
        nav = pagination_nav(
            &p,
            &[("status", status_code), ("prioridade", prioridade_code), ("equipe", equipe)]
        ),
    );
    Ok(Html(page("Tarefas", &content)))
}

#[derive(Debug, Deserialize)]
pub struct NewTaskForm {
    pub titulo: String,
    #[serde(default)]
    pub descricao: String,
    pub equipe: String,
    pub prioridade: Option<String>,
    pub data_fim_prevista: Option<String>,
}

/// POST /tarefas/
pub async fn create_task_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<NewTaskForm>,
) -> WebResult<Redirect> {
    let team_id = parse_team_id(&form.equipe)?;
    if !is_team_member(&state.db, team_id, user.id).await? {
        return Err(WebError::NotFound("Equipe".to_string()));
    }

    let mut new_task = NewTask::new(&form.titulo, &form.descricao, team_id);
    new_task.criada_por_id = Some(user.id);
    if let Some(prioridade) = non_empty(&form.prioridade) {
        new_task.prioridade = prioridade.parse()?;
    }
    if let Some(prazo) = non_empty(&form.data_fim_prevista) {
        let date = NaiveDate::parse_from_str(prazo, "%Y-%m-%d")
            .map_err(|_| WebError::BadRequest(format!("Prazo inválido: {}", prazo)))?;
        new_task.data_fim_prevista = Some(date);
    }

    let task = create_task(&state.db, &new_task).await?;
    info!(task_id = task.id, team_id, user = %user.username, "Task created");
    Ok(Redirect::to(&format!("/tarefas/{}/", task.id)))
}

/// GET /tarefas/{id}/
pub async fn task_detail_page(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
) -> WebResult<Html<String>> {
    let task = load_task(&state.db, id)
        .await?
        .ok_or_else(|| WebError::NotFound("Tarefa".to_string()))?;
    let comments = list_task_comments(&state.db, task.id).await?;
    let attachments = list_attachments(&state.db, task.id).await?;
    let proposal = match task.proposal_id {
        Some(pk) => load_proposal_by_pk(&state.db, pk).await?,
        None => None,
    };

    let comment_items: Vec<String> = comments
        .iter()
        .map(|c| {
            format!(
                "<strong>{}</strong> <span class=\"meta\">{}</span><br>{}",
                escape(&c.autor_username),
                format_datetime(c.created_at),
                escape(&c.texto)
            )
        })
        .collect();
    let attachment_items: Vec<String> = attachments
        .iter()
        .map(|a| format!("{} <span class=\"meta\">{}</span>", escape(&a.nome_arquivo), escape(&a.arquivo)))
        .collect();

    let content = format!(
        r#"<div class="card">
    <p>{descricao}</p>
    <p><strong>Status:</strong> {status} &nbsp; <strong>Prioridade:</strong> {prioridade}</p>
    <p><strong>Equipe:</strong> {equipe} &nbsp; <strong>Responsável:</strong> {responsavel} &nbsp; <strong>Criada por:</strong> {criada_por}</p>
    <p><strong>Início:</strong> {inicio} &nbsp; <strong>Prazo:</strong> {prazo} &nbsp; <strong>Conclusão:</strong> {conclusao}</p>
    <p><strong>Proposição:</strong> {proposal}</p>
</div>
<form class="filters" method="post" action="/tarefas/{id}/status">
    <label>Alterar status <select name="status">{status_options}</select></label>
    <button type="submit">Salvar</button>
</form>
<h2>Comentários</h2>
{comments}
<form class="card" method="post" action="/tarefas/{id}/comentarios">
    <label>Comentário <textarea name="texto" required></textarea></label>
    <button type="submit">Comentar</button>
</form>
<h2>Anexos</h2>
{attachments}"#,
        id = task.id,
        descricao = escape(&task.descricao),
        status = escape(task.status.label()),
        prioridade = escape(task.prioridade.label()),
        equipe = link(&format!("/equipes/{}/", task.team_id), &task.team_nome),
        responsavel = escape(task.responsavel_username.as_deref().unwrap_or("-")),
        criada_por = escape(task.criada_por_username.as_deref().unwrap_or("-")),
        inicio = task.data_inicio.map(format_date).unwrap_or_default(),
        prazo = task.data_fim_prevista.map(format_date).unwrap_or_default(),
        conclusao = task.data_conclusao.map(format_date).unwrap_or_default(),
        proposal = proposal
            .map(|p| link(&format!("/proposicoes/{}/", p.id_proposicao), &p.to_string()))
            .unwrap_or_else(|| "-".to_string()),
        status_options = options(&status_options(), Some(task.status.as_str())),
        comments = list_or_empty(&comment_items, "Nenhum comentário."),
        attachments = list_or_empty(&attachment_items, "Nenhum anexo."),
    );
    Ok(Html(page(&task.titulo, &content)))
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub texto: String,
}

/// POST /tarefas/{id}/comentarios
pub async fn add_comment_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> WebResult<Redirect> {
    let task = load_task(&state.db, id)
        .await?
        .ok_or_else(|| WebError::NotFound("Tarefa".to_string()))?;
    add_task_comment(&state.db, task.id, user.id, &form.texto).await?;
    Ok(Redirect::to(&format!("/tarefas/{}/", task.id)))
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// POST /tarefas/{id}/status
pub async fn change_status_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> WebResult<Redirect> {
    let status: TaskStatus = form.status.parse()?;
    set_task_status(&state.db, id, status, Local::now().date_naive()).await?;
    info!(task_id = id, status = status.as_str(), user = %user.username, "Task status changed");
    Ok(Redirect::to(&format!("/tarefas/{}/", id)))
}

/// GET /equipes/
pub async fn team_list_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> WebResult<Html<String>> {
    let teams = list_user_teams(&state.db, user.id).await?;
    let rows: Vec<Vec<String>> = teams
        .iter()
        .map(|t| {
            vec![
                link(&format!("/equipes/{}/", t.id), &t.nome),
                escape(&t.descricao),
                escape(t.coordenador_username.as_deref().unwrap_or("-")),
            ]
        })
        .collect();

    let content = table(&["Equipe", "Descrição", "Coordenador"], &rows, "Você não participa de nenhuma equipe.");
    Ok(Html(page("Minhas Equipes", &content)))
}

/// GET /equipes/{id}/
pub async fn team_detail_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> WebResult<Html<String>> {
    let team = load_team_for_member(&state.db, id, user.id)
        .await?
        .ok_or_else(|| WebError::NotFound("Equipe".to_string()))?;
    let tasks = list_team_tasks(&state.db, team.id, TEAM_TASKS).await?;
    let members: Vec<String> = list_team_member_names(&state.db, team.id)
        .await?
        .iter()
        .map(|m| escape(m))
        .collect();

    let content = format!(
        r#"<div class="card">
    <p>{descricao}</p>
    <p><strong>Coordenador:</strong> {coordenador}</p>
</div>
<h2>Membros</h2>
{members}
<h2>Tarefas</h2>
{tasks}"#,
        descricao = escape(&team.descricao),
        coordenador = escape(team.coordenador_username.as_deref().unwrap_or("-")),
        members = list_or_empty(&members, "Nenhum membro."),
        tasks = table(TASK_HEADERS, &task_rows(&tasks), "Nenhuma tarefa."),
    );
    Ok(Html(page(&team.nome, &content)))
}
