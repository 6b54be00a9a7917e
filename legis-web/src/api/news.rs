//! Public news portal
//!
//! Only published articles are ever shown; drafts and archived articles
//! answer 404 on the detail page.

use axum::{
    extract::{Path, Query, State},
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::debug;

use legis_common::db::news::{
    count_published_news, find_category_by_slug, increment_views, list_approved_comments, list_categories,
    list_featured_news, list_news_deputies, list_news_proposals, list_published_news, list_related_news,
    list_tags_for_news, load_published_news, Category, News, NewsFilter,
};

use crate::html::{escape, format_datetime, link, list_or_empty, non_empty, options, page, pagination_nav};
use crate::pagination::paginate;
use crate::{AppState, WebError, WebResult};

pub const NEWS_PER_PAGE: i64 = 12;
const FEATURED_ITEMS: i64 = 3;
const RECENT_ITEMS: i64 = 10;
const RELATED_ITEMS: i64 = 4;

pub fn news_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(news_index_page))
        .route("/noticias/", get(news_list_page))
        .route("/noticia/:slug/", get(news_detail_page))
        .route("/categoria/:slug/", get(category_page))
}

fn category_badge(news: &News) -> String {
    match (&news.categoria_nome, &news.categoria_slug) {
        (Some(nome), Some(slug)) => format!(
            r#"<a class="badge" style="background: {}" href="/categoria/{}/">{}</a>"#,
            escape(news.categoria_cor.as_deref().unwrap_or("")),
            escape(slug),
            escape(nome)
        ),
        _ => String::new(),
    }
}

/// Card with title, category, date and summary
fn news_card(news: &News) -> String {
    let date = news.data_publicacao.map(format_datetime).unwrap_or_default();
    let resumo = if news.resumo.is_empty() { &news.subtitulo } else { &news.resumo };
    format!(
        r#"<div class="card">
    {badge}
    <h3>{title}</h3>
    <p class="meta">{date}</p>
    <p>{resumo}</p>
</div>"#,
        badge = category_badge(news),
        title = link(&format!("/noticia/{}/", news.slug), &news.titulo),
        date = date,
        resumo = escape(resumo),
    )
}

fn news_cards(news: &[News], empty: &str) -> String {
    if news.is_empty() {
        return format!(r#"<p class="empty">{}</p>"#, escape(empty));
    }
    news.iter().map(news_card).collect::<Vec<_>>().join("\n")
}

fn category_links(categories: &[Category]) -> String {
    let items: Vec<String> = categories
        .iter()
        .map(|c| link(&format!("/categoria/{}/", c.slug), &c.nome))
        .collect();
    list_or_empty(&items, "Nenhuma categoria.")
}

/// GET /
pub async fn news_index_page(State(state): State<AppState>) -> WebResult<Html<String>> {
    let featured = list_featured_news(&state.db, FEATURED_ITEMS).await?;
    let recent = list_published_news(&state.db, &NewsFilter::default(), RECENT_ITEMS, 0).await?;
    let categories = list_categories(&state.db).await?;

    let content = format!(
        r#"<h2>Destaques</h2>
{featured}
<h2>Últimas notícias</h2>
{recent}
<p>{all}</p>
<h2>Categorias</h2>
{categories}"#,
        featured = news_cards(&featured, "Nenhuma notícia em destaque."),
        recent = news_cards(&recent, "Nenhuma notícia publicada."),
        all = link("/noticias/", "Todas as notícias"),
        categories = category_links(&categories),
    );
    Ok(Html(page("Monitor Legislativo", &content)))
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub categoria: Option<String>,
    pub tag: Option<String>,
    pub q: Option<String>,
    pub page: Option<String>,
}

/// GET /noticias/
pub async fn news_list_page(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> WebResult<Html<String>> {
    let categoria = non_empty(&query.categoria);
    let tag = non_empty(&query.tag);
    let q = non_empty(&query.q);
    let filter = NewsFilter {
        categoria: categoria.map(str::to_string),
        tag: tag.map(str::to_string),
        q: q.map(str::to_string),
    };

    let total = count_published_news(&state.db, &filter).await?;
    let p = paginate(total, query.page.as_deref(), NEWS_PER_PAGE);
    let news = list_published_news(&state.db, &filter, p.per_page, p.offset).await?;
    let categories: Vec<(String, String)> = list_categories(&state.db)
        .await?
        .into_iter()
        .map(|c| (c.slug, c.nome))
        .collect();

    let content = format!(
        r#"<form class="filters" method="get">
    <label>Categoria <select name="categoria">{categories}</select></label>
    <label>Busca <input name="q" value="{q}"></label>
    <input type="hidden" name="tag" value="{tag}">
    <button type="submit">Filtrar</button>
</form>
{cards}
{nav}"#,
        categories = options(&categories, categoria),
        q = escape(q.unwrap_or("")),
        tag = escape(tag.unwrap_or("")),
        cards = news_cards(&news, "Nenhuma notícia encontrada."),
        nav = pagination_nav(&p, &[("categoria", categoria), ("tag", tag), ("q", q)]),
    );
    Ok(Html(page("Notícias", &content)))
}

/// GET /noticia/{slug}/
pub async fn news_detail_page(State(state): State<AppState>, Path(slug): Path<String>) -> WebResult<Html<String>> {
    let mut news = load_published_news(&state.db, &slug)
        .await?
        .ok_or_else(|| WebError::NotFound("Notícia".to_string()))?;
    news.visualizacoes = increment_views(&state.db, news.id).await?;
    debug!(slug = %news.slug, views = news.visualizacoes, "News viewed");

    let related = list_related_news(&state.db, &news, RELATED_ITEMS).await?;
    let comments = list_approved_comments(&state.db, news.id).await?;
    let tags = list_tags_for_news(&state.db, news.id).await?;
    let proposals = list_news_proposals(&state.db, news.id).await?;
    let deputies = list_news_deputies(&state.db, news.id).await?;

    let image = match &news.imagem_destaque {
        Some(src) if !src.is_empty() => format!(
            r#"<figure><img src="{}" alt="{}"><figcaption>{}</figcaption></figure>"#,
            escape(src),
            escape(&news.titulo),
            escape(&news.credito_imagem)
        ),
        _ => String::new(),
    };
    let tag_links: Vec<String> = tags
        .iter()
        .map(|t| link(&format!("/noticias/?tag={}", crate::html::encode(&t.slug)), &t.nome))
        .collect();
    let proposal_links: Vec<String> = proposals
        .iter()
        .map(|(id, label)| link(&format!("/proposicoes/{}/", id), label))
        .collect();
    let deputy_links: Vec<String> = deputies
        .iter()
        .map(|(id, nome)| link(&format!("/deputados/{}/", id), nome))
        .collect();
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
    let related_links: Vec<String> = related
        .iter()
        .map(|n| link(&format!("/noticia/{}/", n.slug), &n.titulo))
        .collect();

    let content = format!(
        r#"<p class="meta">{badge} {date} | {autor} | {views} visualizações</p>
<p><em>{subtitulo}</em></p>
{image}
<div class="card">{conteudo}</div>
<p>{tags}</p>
<h2>Proposições relacionadas</h2>
{proposals}
<h2>Deputados citados</h2>
{deputies}
<h2>Comentários</h2>
{comments}
<h2>Leia também</h2>
{related}"#,
        badge = category_badge(&news),
        date = news.data_publicacao.map(format_datetime).unwrap_or_default(),
        autor = escape(news.autor_username.as_deref().unwrap_or("Redação")),
        views = news.visualizacoes,
        subtitulo = escape(&news.subtitulo),
        image = image,
        conteudo = escape(&news.conteudo).replace('\n', "<br>"),
        tags = tag_links.join(" "),
        proposals = list_or_empty(&proposal_links, "Nenhuma proposição vinculada."),
        deputies = list_or_empty(&deputy_links, "Nenhum deputado vinculado."),
        comments = list_or_empty(&comment_items, "Nenhum comentário."),
        related = list_or_empty(&related_links, "Nenhuma notícia relacionada."),
    );
    Ok(Html(page(&news.titulo, &content)))
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub page: Option<String>,
}

/// GET /categoria/{slug}/
pub async fn category_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<CategoryQuery>,
) -> WebResult<Html<String>> {
    let category = find_category_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| WebError::NotFound("Categoria".to_string()))?;
    let filter = NewsFilter {
        categoria: Some(category.slug.clone()),
        ..NewsFilter::default()
    };

    let total = count_published_news(&state.db, &filter).await?;
    let p = paginate(total, query.page.as_deref(), NEWS_PER_PAGE);
    let news = list_published_news(&state.db, &filter, p.per_page, p.offset).await?;

    let content = format!(
        r#"<p>{descricao}</p>
{cards}
{nav}"#,
        descricao = escape(&category.descricao),
        cards = news_cards(&news, "Nenhuma notícia nesta categoria."),
        nav = pagination_nav(&p, &[]),
    );
    Ok(Html(page(&category.nome, &content)))
}
