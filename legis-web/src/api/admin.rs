//! Read-only admin browser over the registered models
//!
//! Only identifiers from [`MODELS`] are ever interpolated into SQL; request
//! values (`q`, filter values) are bound. `sort` must name one of the model's
//! list columns.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    response::Html,
    routing::get,
    Router,
};
use legis_common::db::{like_pattern, LIKE_ESCAPE};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;

use crate::auth::StaffUser;
use crate::html::{escape, link, options, page, pagination_nav, table};
use crate::pagination::{paginate, Pagination};
use crate::{AppState, WebError, WebResult};

pub const ADMIN_PER_PAGE: i64 = 20;

/// Column shown in a list, or a field filtered by equality
///
/// `expr` is SQL over the model table aliased as `t`.
#[derive(Debug, Clone, Copy)]
pub struct AdminColumn {
    pub name: &'static str,
    pub label: &'static str,
    pub expr: &'static str,
}

const fn col(name: &'static str, label: &'static str, expr: &'static str) -> AdminColumn {
    AdminColumn { name, label, expr }
}

#[derive(Debug, Clone, Copy)]
pub struct AdminModel {
    /// URL segment
    pub name: &'static str,
    pub label: &'static str,
    pub table: &'static str,
    pub columns: &'static [AdminColumn],
    /// Expressions matched with LIKE against `q`
    pub search: &'static [&'static str],
    pub filters: &'static [AdminColumn],
    /// Default sort column (one of `columns`)
    pub ordering: &'static str,
    pub descending: bool,
}

impl AdminModel {
    pub fn column(&self, name: &str) -> Option<&AdminColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

const UF_OF_DEPUTY: &str = "(SELECT sigla FROM ufs WHERE id = t.uf_representacao_id)";
const DEPUTY_NAME: &str = "(SELECT nome FROM deputies WHERE id = t.deputy_id)";
const PROPOSAL_LABEL: &str = "(SELECT COALESCE((SELECT sigla FROM proposal_types WHERE id = p.tipo_id), p.tipo_legado) \
     || ' ' || p.numero || '/' || p.ano FROM proposals p WHERE p.id = t.proposal_id)";

pub const MODELS: &[AdminModel] = &[
    AdminModel {
        name: "deputados",
        label: "Deputados",
        table: "deputies",
        columns: &[
            col("nome", "Nome", "t.nome"),
            col("sigla_partido", "Partido", "t.sigla_partido"),
            col("uf", "UF", UF_OF_DEPUTY),
            col("situacao", "Situação", "t.situacao"),
            col("id_deputado", "ID Câmara", "t.id_deputado"),
        ],
        search: &["t.nome", "t.nome_civil", "t.email"],
        filters: &[
            col("sigla_partido", "Partido", "t.sigla_partido"),
            col("uf", "UF", UF_OF_DEPUTY),
            col("situacao", "Situação", "t.situacao"),
        ],
        ordering: "nome",
        descending: false,
    },
    AdminModel {
        name: "partidos",
        label: "Partidos",
        table: "parties",
        columns: &[
            col("sigla", "Sigla", "t.sigla"),
            col("nome", "Nome", "t.nome"),
            col("id_partido", "ID Câmara", "t.id_partido"),
            col("status_situacao", "Situação", "t.status_situacao"),
            col("status_total_membros", "Membros", "t.status_total_membros"),
        ],
        search: &["t.sigla", "t.nome"],
        filters: &[col("status_situacao", "Situação", "t.status_situacao")],
        ordering: "sigla",
        descending: false,
    },
    AdminModel {
        name: "proposicoes",
        label: "Proposições",
        table: "proposals",
        columns: &[
            col(
                "tipo",
                "Tipo",
                "COALESCE((SELECT sigla FROM proposal_types WHERE id = t.tipo_id), t.tipo_legado)",
            ),
            col("numero", "Número", "t.numero"),
            col("ano", "Ano", "t.ano"),
            col("ementa", "Ementa", "t.ementa"),
            col("situacao", "Situação", "t.situacao"),
            col("data_apresentacao", "Apresentação", "t.data_apresentacao"),
        ],
        search: &["t.ementa", "t.ementa_detalhada"],
        filters: &[col("situacao", "Situação", "t.situacao"), col("ano", "Ano", "t.ano")],
        ordering: "data_apresentacao",
        descending: true,
    },
    AdminModel {
        name: "tipos-proposicao",
        label: "Tipos de proposição",
        table: "proposal_types",
        columns: &[
            col("sigla", "Sigla", "t.sigla"),
            col("nome", "Nome", "t.nome"),
            col("cod", "Código", "t.cod"),
            col("descricao", "Descrição", "t.descricao"),
        ],
        search: &["t.sigla", "t.nome", "t.descricao"],
        filters: &[col("sigla", "Sigla", "t.sigla")],
        ordering: "sigla",
        descending: false,
    },
    AdminModel {
        name: "votacoes",
        label: "Votações",
        table: "votings",
        columns: &[
            col("id_votacao", "Votação", "t.id_votacao"),
            col("proposicao", "Proposição", PROPOSAL_LABEL),
            col("data", "Data", "t.data"),
            col("descricao", "Descrição", "t.descricao"),
            col("aprovacao", "Aprovada", "t.aprovacao"),
            col("votos_sim", "Sim", "t.votos_sim"),
            col("votos_nao", "Não", "t.votos_nao"),
        ],
        search: &["t.id_votacao", "t.descricao"],
        filters: &[col("aprovacao", "Aprovada", "t.aprovacao")],
        ordering: "data",
        descending: true,
    },
    AdminModel {
        name: "votos",
        label: "Votos",
        table: "deputy_votes",
        columns: &[
            col("votacao", "Votação", "(SELECT id_votacao FROM votings WHERE id = t.voting_id)"),
            col("deputado", "Deputado", DEPUTY_NAME),
            col("voto", "Voto", "t.voto"),
            col("id", "ID", "t.id"),
        ],
        search: &[DEPUTY_NAME],
        filters: &[col("voto", "Voto", "t.voto")],
        ordering: "id",
        descending: true,
    },
    AdminModel {
        name: "discursos",
        label: "Discursos",
        table: "speeches",
        columns: &[
            col("deputado", "Deputado", DEPUTY_NAME),
            col("data", "Data", "t.data"),
            col("tipo_discurso", "Tipo", "t.tipo_discurso"),
            col("sumario", "Sumário", "t.sumario"),
        ],
        search: &["t.transcricao", "t.sumario"],
        filters: &[col("tipo_discurso", "Tipo", "t.tipo_discurso")],
        ordering: "data",
        descending: true,
    },
    AdminModel {
        name: "resumos-ia",
        label: "Resumos IA",
        table: "ai_summaries",
        columns: &[
            col("proposicao", "Proposição", PROPOSAL_LABEL),
            col("resumo", "Resumo", "t.resumo"),
            col("modelo_ia", "Modelo", "t.modelo_ia"),
            col("created_at", "Criado em", "t.created_at"),
        ],
        search: &["t.resumo", "t.resumo_executivo"],
        filters: &[col("modelo_ia", "Modelo", "t.modelo_ia")],
        ordering: "created_at",
        descending: true,
    },
    AdminModel {
        name: "analises-impacto",
        label: "Análises de impacto",
        table: "impact_analyses",
        columns: &[
            col("proposicao", "Proposição", PROPOSAL_LABEL),
            col("nivel_impacto", "Nível", "t.nivel_impacto"),
            col("descricao_impacto", "Descrição", "t.descricao_impacto"),
            col("created_at", "Criado em", "t.created_at"),
        ],
        search: &["t.descricao_impacto"],
        filters: &[col("nivel_impacto", "Nível", "t.nivel_impacto")],
        ordering: "created_at",
        descending: true,
    },
    AdminModel {
        name: "noticias",
        label: "Notícias",
        table: "news",
        columns: &[
            col("titulo", "Título", "t.titulo"),
            col("categoria", "Categoria", "(SELECT nome FROM news_categories WHERE id = t.categoria_id)"),
            col("status", "Status", "t.status"),
            col("destaque", "Destaque", "t.destaque"),
            col("visualizacoes", "Visualizações", "t.visualizacoes"),
            col("data_publicacao", "Publicação", "t.data_publicacao"),
        ],
        search: &["t.titulo", "t.conteudo", "t.resumo"],
        filters: &[col("status", "Status", "t.status"), col("destaque", "Destaque", "t.destaque")],
        ordering: "data_publicacao",
        descending: true,
    },
    AdminModel {
        name: "categorias",
        label: "Categorias",
        table: "news_categories",
        columns: &[
            col("nome", "Nome", "t.nome"),
            col("slug", "Slug", "t.slug"),
            col("cor", "Cor", "t.cor"),
        ],
        search: &["t.nome", "t.descricao"],
        filters: &[],
        ordering: "nome",
        descending: false,
    },
    AdminModel {
        name: "comentarios",
        label: "Comentários",
        table: "news_comments",
        columns: &[
            col("noticia", "Notícia", "(SELECT titulo FROM news WHERE id = t.news_id)"),
            col("autor", "Autor", "(SELECT username FROM users WHERE id = t.autor_id)"),
            col("texto", "Texto", "t.texto"),
            col("aprovado", "Aprovado", "t.aprovado"),
            col("created_at", "Criado em", "t.created_at"),
        ],
        search: &["t.texto"],
        filters: &[col("aprovado", "Aprovado", "t.aprovado")],
        ordering: "created_at",
        descending: true,
    },
    AdminModel {
        name: "equipes",
        label: "Equipes",
        table: "teams",
        columns: &[
            col("nome", "Nome", "t.nome"),
            col("descricao", "Descrição", "t.descricao"),
            col("coordenador", "Coordenador", "(SELECT username FROM users WHERE id = t.coordenador_id)"),
        ],
        search: &["t.nome", "t.descricao"],
        filters: &[],
        ordering: "nome",
        descending: false,
    },
    AdminModel {
        name: "tarefas",
        label: "Tarefas",
        table: "tasks",
        columns: &[
            col("titulo", "Título", "t.titulo"),
            col("status", "Status", "t.status"),
            col("prioridade", "Prioridade", "t.prioridade"),
            col("equipe", "Equipe", "(SELECT nome FROM teams WHERE id = t.team_id)"),
            col("responsavel", "Responsável", "(SELECT username FROM users WHERE id = t.responsavel_id)"),
            col("data_fim_prevista", "Prazo", "t.data_fim_prevista"),
            col("created_at", "Criada em", "t.created_at"),
        ],
        search: &["t.titulo", "t.descricao"],
        filters: &[col("status", "Status", "t.status"), col("prioridade", "Prioridade", "t.prioridade")],
        ordering: "created_at",
        descending: true,
    },
    AdminModel {
        name: "usuarios",
        label: "Usuários",
        table: "users",
        columns: &[
            col("username", "Usuário", "t.username"),
            col("email", "E-mail", "t.email"),
            col("is_staff", "Equipe", "t.is_staff"),
            col("is_superuser", "Superusuário", "t.is_superuser"),
        ],
        search: &["t.username", "t.email"],
        filters: &[
            col("is_staff", "Equipe", "t.is_staff"),
            col("is_superuser", "Superusuário", "t.is_superuser"),
        ],
        ordering: "username",
        descending: false,
    },
    AdminModel {
        name: "generos",
        label: "Gêneros",
        table: "genders",
        columns: &[
            col("sigla", "Sigla", "t.sigla"),
            col("nome", "Nome", "t.nome"),
            col("slug", "Slug", "t.slug"),
            col("descricao", "Descrição", "t.descricao"),
        ],
        search: &["t.sigla", "t.nome", "t.descricao"],
        filters: &[],
        ordering: "sigla",
        descending: false,
    },
    AdminModel {
        name: "ufs",
        label: "Unidades federativas",
        table: "ufs",
        columns: &[
            col("sigla", "Sigla", "t.sigla"),
            col("nome", "Nome", "t.nome"),
            col("regiao", "Região", "(SELECT nome FROM regions WHERE id = t.region_id)"),
        ],
        search: &["t.sigla", "t.nome"],
        filters: &[col("regiao", "Região", "(SELECT nome FROM regions WHERE id = t.region_id)")],
        ordering: "sigla",
        descending: false,
    },
    AdminModel {
        name: "municipios",
        label: "Municípios",
        table: "municipalities",
        columns: &[
            col("nome", "Nome", "t.nome"),
            col("uf", "UF", "(SELECT sigla FROM ufs WHERE id = t.uf_id)"),
            col("is_capital", "Capital", "t.is_capital"),
        ],
        search: &["t.nome"],
        filters: &[
            col("uf", "UF", "(SELECT sigla FROM ufs WHERE id = t.uf_id)"),
            col("is_capital", "Capital", "t.is_capital"),
        ],
        ordering: "nome",
        descending: false,
    },
    AdminModel {
        name: "perfis",
        label: "Perfis parlamentares",
        table: "parliamentary_profiles",
        columns: &[
            col("deputado", "Deputado", DEPUTY_NAME),
            col("total_votacoes", "Votações", "t.total_votacoes"),
            col("presenca_votacoes", "Presença (%)", "t.presenca_votacoes"),
            col("total_proposicoes", "Proposições", "t.total_proposicoes"),
            col("total_discursos", "Discursos", "t.total_discursos"),
            col("ultima_atualizacao", "Atualizado em", "t.ultima_atualizacao"),
        ],
        search: &[DEPUTY_NAME],
        filters: &[],
        ordering: "ultima_atualizacao",
        descending: true,
    },
    AdminModel {
        name: "relatorios",
        label: "Relatórios de atividade",
        table: "activity_reports",
        columns: &[
            col("deputado", "Deputado", DEPUTY_NAME),
            col("periodo", "Período", "t.periodo"),
            col("data_inicio", "Início", "t.data_inicio"),
            col("data_fim", "Fim", "t.data_fim"),
            col("proposicoes_apresentadas", "Proposições", "t.proposicoes_apresentadas"),
        ],
        search: &[DEPUTY_NAME, "t.destaque_periodo"],
        filters: &[col("periodo", "Período", "t.periodo")],
        ordering: "data_fim",
        descending: true,
    },
];

pub fn find_model(name: &str) -> Option<&'static AdminModel> {
    MODELS.iter().find(|m| m.name == name)
}

/// Parsed list parameters of one admin page
#[derive(Debug, Clone, Default)]
pub struct BrowseParams {
    pub q: Option<String>,
    pub page: Option<String>,
    pub sort: Option<String>,
    pub descending: Option<bool>,
    /// `(filter name, value)` for the model's filters present in the request
    pub filters: Vec<(&'static str, String)>,
}

impl BrowseParams {
    /// Pick the known keys out of the raw query map
    pub fn from_query(model: &AdminModel, query: &HashMap<String, String>) -> Self {
        let value = |key: &str| {
            query
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            q: value("q"),
            page: value("page"),
            sort: value("sort"),
            descending: value("order").map(|o| o.eq_ignore_ascii_case("desc")),
            filters: model
                .filters
                .iter()
                .filter_map(|f| value(f.name).map(|v| (f.name, v)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowsePage {
    pub pagination: Pagination,
    pub sort: &'static str,
    pub descending: bool,
    /// Cell text, one entry per model column
    pub rows: Vec<Vec<String>>,
}

fn push_where(builder: &mut QueryBuilder<'_, Sqlite>, model: &AdminModel, params: &BrowseParams) {
    builder.push(" WHERE 1 = 1");
    if let Some(pattern) = like_pattern(params.q.as_deref()) {
        if !model.search.is_empty() {
            builder.push(" AND (");
            for (i, expr) in model.search.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder
                    .push(*expr)
                    .push(" LIKE ")
                    .push_bind(pattern.clone())
                    .push(LIKE_ESCAPE);
            }
            builder.push(")");
        }
    }
    for (name, value) in &params.filters {
        if let Some(filter) = model.filters.iter().find(|f| f.name == *name) {
            builder
                .push(" AND CAST(")
                .push(filter.expr)
                .push(" AS TEXT) = ")
                .push_bind(value.clone());
        }
    }
}

/// Cell text; every list column is selected as TEXT, NULL is empty
fn cell_text(row: &SqliteRow, index: usize) -> String {
    row.try_get::<Option<String>, _>(index)
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// One page of a model's rows
pub async fn browse(pool: &SqlitePool, model: &'static AdminModel, params: &BrowseParams) -> WebResult<BrowsePage> {
    let sort_column = match params.sort.as_deref() {
        Some(name) => model
            .column(name)
            .ok_or_else(|| WebError::BadRequest(format!("Coluna inválida: {}", name)))?,
        None => model
            .column(model.ordering)
            .ok_or_else(|| WebError::Internal(format!("ordering of {} is not a column", model.name)))?,
    };
    let descending = match (&params.sort, params.descending) {
        (_, Some(desc)) => desc,
        (None, None) => model.descending,
        (Some(_), None) => false,
    };

    let mut count_query = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {} t", model.table));
    push_where(&mut count_query, model, params);
    let total: i64 = count_query
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .map_err(legis_common::Error::from)?;

    let pagination = paginate(total, params.page.as_deref(), ADMIN_PER_PAGE);

    let select: Vec<String> = model
        .columns
        .iter()
        .map(|c| format!("CAST({} AS TEXT) AS \"{}\"", c.expr, c.name))
        .collect();
    let mut list_query = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM {} t", select.join(", "), model.table));
    push_where(&mut list_query, model, params);
    list_query
        .push(format!(
            " ORDER BY {} {}, t.rowid",
            sort_column.expr,
            if descending { "DESC" } else { "ASC" }
        ))
        .push(" LIMIT ")
        .push_bind(pagination.per_page)
        .push(" OFFSET ")
        .push_bind(pagination.offset);

    let rows = list_query
        .build()
        .fetch_all(pool)
        .await
        .map_err(legis_common::Error::from)?;
    debug!(model = model.name, total, page = pagination.page, "Admin browse");

    Ok(BrowsePage {
        pagination,
        sort: sort_column.name,
        descending,
        rows: rows
            .iter()
            .map(|row| (0..model.columns.len()).map(|i| cell_text(row, i)).collect())
            .collect(),
    })
}

/// Distinct values of a filter expression, as text
async fn filter_values(pool: &SqlitePool, model: &AdminModel, filter: &AdminColumn) -> WebResult<Vec<String>> {
    let sql = format!(
        "SELECT DISTINCT CAST({expr} AS TEXT) AS v FROM {table} t WHERE {expr} IS NOT NULL ORDER BY v",
        expr = filter.expr,
        table = model.table
    );
    let values = sqlx::query_scalar(&sql)
        .fetch_all(pool)
        .await
        .map_err(legis_common::Error::from)?;
    Ok(values)
}

async fn count_rows(pool: &SqlitePool, model: &AdminModel) -> WebResult<i64> {
    let count = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", model.table))
        .fetch_one(pool)
        .await
        .map_err(legis_common::Error::from)?;
    Ok(count)
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/", get(admin_index_page))
        .route("/admin/:model/", get(admin_model_page))
}

/// GET /admin/
pub async fn admin_index_page(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
) -> WebResult<Html<String>> {
    let mut rows = Vec::with_capacity(MODELS.len());
    for model in MODELS {
        rows.push(vec![
            link(&format!("/admin/{}/", model.name), model.label),
            count_rows(&state.db, model).await?.to_string(),
        ]);
    }

    let content = format!(
        r#"<p class="meta">Conectado como {username}</p>
{models}"#,
        username = escape(&user.username),
        models = table(&["Modelo", "Registros"], &rows, "Nenhum modelo registrado."),
    );
    Ok(Html(page("Administração", &content)))
}

/// GET /admin/{model}/
pub async fn admin_model_page(
    State(state): State<AppState>,
    StaffUser(_user): StaffUser,
    Path(model_name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> WebResult<Html<String>> {
    let model = find_model(&model_name).ok_or_else(|| WebError::NotFound("Modelo".to_string()))?;
    let params = BrowseParams::from_query(model, &query);
    let result = browse(&state.db, model, &params).await?;

    let mut filter_controls = String::new();
    for filter in model.filters {
        let values: Vec<(String, String)> = filter_values(&state.db, model, filter)
            .await?
            .into_iter()
            .map(|v| (v.clone(), v))
            .collect();
        let current = params
            .filters
            .iter()
            .find(|(name, _)| *name == filter.name)
            .map(|(_, v)| v.as_str());
        filter_controls.push_str(&format!(
            r#"<label>{} <select name="{}">{}</select></label>"#,
            escape(filter.label),
            filter.name,
            options(&values, current)
        ));
    }

    let order = if result.descending { "desc" } else { "asc" };
    let mut nav_params: Vec<(&str, Option<&str>)> = vec![
        ("q", params.q.as_deref()),
        ("sort", Some(result.sort)),
        ("order", Some(order)),
    ];
    for (name, value) in &params.filters {
        nav_params.push((*name, Some(value.as_str())));
    }

    // Header links toggle the direction of the current sort column
    let headers: Vec<String> = model
        .columns
        .iter()
        .map(|c| {
            let next = if c.name == result.sort && !result.descending { "desc" } else { "asc" };
            let marker = match (c.name == result.sort, result.descending) {
                (true, true) => " ▼",
                (true, false) => " ▲",
                _ => "",
            };
            let mut href_params = vec![("q", params.q.as_deref()), ("sort", Some(c.name)), ("order", Some(next))];
            for (name, value) in &params.filters {
                href_params.push((*name, Some(value.as_str())));
            }
            format!(
                r#"<a href="{}">{}{}</a>"#,
                crate::html::query_string(&href_params, 1),
                escape(c.label),
                marker
            )
        })
        .collect();
    let rows: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| escape(cell)).collect())
        .collect();

    let content = format!(
        r#"<form class="filters" method="get">
    <label>Busca <input name="q" value="{q}"></label>
    {filters}
    <input type="hidden" name="sort" value="{sort}">
    <input type="hidden" name="order" value="{order}">
    <button type="submit">Filtrar</button>
</form>
{table}
{nav}
<p>{back}</p>"#,
        q = escape(params.q.as_deref().unwrap_or("")),
        filters = filter_controls,
        sort = result.sort,
        order = order,
        table = header_table(&headers, &rows),
        nav = pagination_nav(&result.pagination, &nav_params),
        back = link("/admin/", "Voltar"),
    );
    Ok(Html(page(model.label, &content)))
}

/// Like [`table`] but with headers already rendered as links
fn header_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return r#"<p class="empty">Nenhum registro encontrado.</p>"#.to_string();
    }
    let mut html = String::from("<table><thead><tr>");
    for header in headers {
        html.push_str(&format!("<th>{}</th>", header));
    }
    html.push_str("</tr></thead><tbody>");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", cell));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}
