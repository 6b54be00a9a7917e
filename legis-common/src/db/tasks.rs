//! Editorial teams, tasks, task comments and attachments

use super::{TaskPriority, TaskStatus, TASK_PRIORITY_RANK_SQL};
use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Team {
    pub id: i64,
    pub nome: String,
    pub descricao: String,
    pub coordenador_id: Option<i64>,
    pub coordenador_username: Option<String>,
    pub created_at: NaiveDateTime,
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.nome)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub titulo: String,
    pub descricao: String,
    pub status: TaskStatus,
    pub prioridade: TaskPriority,
    pub team_id: i64,
    pub team_nome: String,
    pub responsavel_id: Option<i64>,
    pub responsavel_username: Option<String>,
    pub criada_por_id: Option<i64>,
    pub criada_por_username: Option<String>,
    pub proposal_id: Option<i64>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim_prevista: Option<NaiveDate>,
    pub data_conclusao: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.titulo, self.status.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub titulo: String,
    pub descricao: String,
    pub status: TaskStatus,
    pub prioridade: TaskPriority,
    pub team_id: i64,
    pub responsavel_id: Option<i64>,
    pub criada_por_id: Option<i64>,
    pub proposal_id: Option<i64>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim_prevista: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(titulo: &str, descricao: &str, team_id: i64) -> Self {
        Self {
            titulo: titulo.to_string(),
            descricao: descricao.to_string(),
            status: TaskStatus::Pendente,
            prioridade: TaskPriority::Media,
            team_id,
            responsavel_id: None,
            criada_por_id: None,
            proposal_id: None,
            data_inicio: None,
            data_fim_prevista: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TaskComment {
    pub id: i64,
    pub task_id: i64,
    pub autor_id: i64,
    pub autor_username: String,
    pub texto: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Attachment {
    pub id: i64,
    pub task_id: i64,
    pub arquivo: String,
    pub nome_arquivo: String,
    pub uploaded_by_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

/// Filters of the task list
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub prioridade: Option<TaskPriority>,
    pub team_id: Option<i64>,
}

const TEAM_SELECT: &str = r#"
    SELECT tm.id, tm.nome, tm.descricao, tm.coordenador_id, u.username AS coordenador_username,
           tm.created_at
    FROM teams tm
    LEFT JOIN users u ON u.id = tm.coordenador_id
"#;

const TASK_SELECT: &str = r#"
    SELECT t.id, t.titulo, t.descricao, t.status, t.prioridade, t.team_id, tm.nome AS team_nome,
           t.responsavel_id, r.username AS responsavel_username,
           t.criada_por_id, c.username AS criada_por_username,
           t.proposal_id, t.data_inicio, t.data_fim_prevista, t.data_conclusao, t.created_at
    FROM tasks t
    JOIN teams tm ON tm.id = t.team_id
    LEFT JOIN users r ON r.id = t.responsavel_id
    LEFT JOIN users c ON c.id = t.criada_por_id
"#;

fn task_order() -> String {
    format!(" ORDER BY {} DESC, t.created_at DESC, t.id DESC", TASK_PRIORITY_RANK_SQL)
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

pub async fn create_team(
    pool: &SqlitePool,
    nome: &str,
    descricao: &str,
    coordenador_id: Option<i64>,
) -> Result<Team> {
    if nome.trim().is_empty() {
        return Err(Error::InvalidInput("team name must not be empty".to_string()));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO teams (nome, descricao, coordenador_id, created_at, updated_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(nome.trim())
    .bind(descricao)
    .bind(coordenador_id)
    .execute(pool)
    .await?;

    load_team(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| Error::NotFound(format!("team {}", nome)))
}

pub async fn add_team_member(pool: &SqlitePool, team_id: i64, user_id: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO team_members (team_id, user_id) VALUES (?, ?)")
        .bind(team_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn load_team(pool: &SqlitePool, id: i64) -> Result<Option<Team>> {
    let sql = format!("{} WHERE tm.id = ?", TEAM_SELECT);
    let team = sqlx::query_as::<_, Team>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(team)
}

pub async fn is_team_member(pool: &SqlitePool, team_id: i64, user_id: i64) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM team_members WHERE team_id = ? AND user_id = ?")
        .bind(team_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Team by id, visible only to its members
pub async fn load_team_for_member(pool: &SqlitePool, team_id: i64, user_id: i64) -> Result<Option<Team>> {
    if !is_team_member(pool, team_id, user_id).await? {
        return Ok(None);
    }
    load_team(pool, team_id).await
}

/// Teams the user belongs to, by name
pub async fn list_user_teams(pool: &SqlitePool, user_id: i64) -> Result<Vec<Team>> {
    let sql = format!(
        "{} JOIN team_members m ON m.team_id = tm.id WHERE m.user_id = ? ORDER BY tm.nome, tm.id",
        TEAM_SELECT
    );
    let teams = sqlx::query_as::<_, Team>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(teams)
}

pub async fn list_team_member_names(pool: &SqlitePool, team_id: i64) -> Result<Vec<String>> {
    let names = sqlx::query_scalar(
        r#"
        SELECT u.username FROM users u
        JOIN team_members m ON m.user_id = u.id
        WHERE m.team_id = ?
        ORDER BY u.username
        "#,
    )
    .bind(team_id)
    .fetch_all(pool)
    .await?;
    Ok(names)
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

pub async fn create_task(pool: &SqlitePool, task: &NewTask) -> Result<Task> {
    if task.titulo.trim().is_empty() {
        return Err(Error::InvalidInput("task title must not be empty".to_string()));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO tasks (
            titulo, descricao, status, prioridade, team_id, responsavel_id, criada_por_id,
            proposal_id, data_inicio, data_fim_prevista, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(task.titulo.trim())
    .bind(&task.descricao)
    .bind(task.status)
    .bind(task.prioridade)
    .bind(task.team_id)
    .bind(task.responsavel_id)
    .bind(task.criada_por_id)
    .bind(task.proposal_id)
    .bind(task.data_inicio)
    .bind(task.data_fim_prevista)
    .execute(pool)
    .await?;

    load_task(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| Error::NotFound(format!("task {}", task.titulo)))
}

pub async fn load_task(pool: &SqlitePool, id: i64) -> Result<Option<Task>> {
    let sql = format!("{} WHERE t.id = ?", TASK_SELECT);
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(task)
}

/// Change the status; `data_conclusao` follows CONCLUIDA
///
/// Completing sets it to `today` unless the task already has one; any other
/// status clears it.
pub async fn set_task_status(pool: &SqlitePool, id: i64, status: TaskStatus, today: NaiveDate) -> Result<()> {
    let conclusao = (status == TaskStatus::Concluida).then_some(today);
    let result = sqlx::query(
        r#"
        UPDATE tasks SET
            status = ?,
            data_conclusao = CASE WHEN ? IS NULL THEN NULL ELSE COALESCE(data_conclusao, ?) END,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(conclusao)
    .bind(conclusao)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("task {}", id)));
    }
    Ok(())
}

fn push_member_filter<'a>(builder: &mut QueryBuilder<'a, Sqlite>, user_id: i64, filter: &'a TaskFilter) {
    builder
        .push(" WHERE EXISTS (SELECT 1 FROM team_members m WHERE m.team_id = t.team_id AND m.user_id = ")
        .push_bind(user_id)
        .push(")");
    if let Some(status) = filter.status {
        builder.push(" AND t.status = ").push_bind(status);
    }
    if let Some(prioridade) = filter.prioridade {
        builder.push(" AND t.prioridade = ").push_bind(prioridade);
    }
    if let Some(team_id) = filter.team_id {
        builder.push(" AND t.team_id = ").push_bind(team_id);
    }
}

pub async fn count_member_tasks(pool: &SqlitePool, user_id: i64, filter: &TaskFilter) -> Result<i64> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tasks t");
    push_member_filter(&mut builder, user_id, filter);
    let count = builder.build_query_scalar().fetch_one(pool).await?;
    Ok(count)
}

/// Tasks of every team the user belongs to
pub async fn list_member_tasks(
    pool: &SqlitePool,
    user_id: i64,
    filter: &TaskFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Task>> {
    let mut builder = QueryBuilder::<Sqlite>::new(TASK_SELECT);
    push_member_filter(&mut builder, user_id, filter);
    builder
        .push(task_order())
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let tasks = builder.build_query_as::<Task>().fetch_all(pool).await?;
    Ok(tasks)
}

/// Tasks assigned to the user
pub async fn list_assigned_tasks(pool: &SqlitePool, user_id: i64, limit: i64) -> Result<Vec<Task>> {
    let sql = format!("{} WHERE t.responsavel_id = ?{} LIMIT ?", TASK_SELECT, task_order());
    let tasks = sqlx::query_as::<_, Task>(&sql)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(tasks)
}

pub async fn list_team_tasks(pool: &SqlitePool, team_id: i64, limit: i64) -> Result<Vec<Task>> {
    let sql = format!("{} WHERE t.team_id = ?{} LIMIT ?", TASK_SELECT, task_order());
    let tasks = sqlx::query_as::<_, Task>(&sql)
        .bind(team_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(tasks)
}

// ---------------------------------------------------------------------------
// Comments and attachments
// ---------------------------------------------------------------------------

pub async fn add_task_comment(pool: &SqlitePool, task_id: i64, autor_id: i64, texto: &str) -> Result<i64> {
    if texto.trim().is_empty() {
        return Err(Error::InvalidInput("comment must not be empty".to_string()));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO task_comments (task_id, autor_id, texto, created_at, updated_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(task_id)
    .bind(autor_id)
    .bind(texto.trim())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Comments of a task, oldest first
pub async fn list_task_comments(pool: &SqlitePool, task_id: i64) -> Result<Vec<TaskComment>> {
    let comments = sqlx::query_as::<_, TaskComment>(
        r#"
        SELECT c.id, c.task_id, c.autor_id, u.username AS autor_username, c.texto, c.created_at
        FROM task_comments c
        JOIN users u ON u.id = c.autor_id
        WHERE c.task_id = ?
        ORDER BY c.created_at, c.id
        "#,
    )
    .bind(task_id)
    .fetch_all(pool)
    .await?;
    Ok(comments)
}

/// Record an attachment; `arquivo` is a stored path, the file itself is not managed here
pub async fn add_attachment(
    pool: &SqlitePool,
    task_id: i64,
    arquivo: &str,
    nome_arquivo: &str,
    uploaded_by_id: Option<i64>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO task_attachments (task_id, arquivo, nome_arquivo, uploaded_by_id, created_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(task_id)
    .bind(arquivo)
    .bind(nome_arquivo)
    .bind(uploaded_by_id)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn list_attachments(pool: &SqlitePool, task_id: i64) -> Result<Vec<Attachment>> {
    let attachments = sqlx::query_as::<_, Attachment>(
        r#"
        SELECT id, task_id, arquivo, nome_arquivo, uploaded_by_id, created_at
        FROM task_attachments
        WHERE task_id = ?
        ORDER BY created_at, id
        "#,
    )
    .bind(task_id)
    .fetch_all(pool)
    .await?;
    Ok(attachments)
}
