//! News portal: categories, articles, tags and reader comments

use super::{like_pattern, NewsStatus, LIKE_ESCAPE};
use crate::text::slugify;
use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

pub const DEFAULT_CATEGORY_COLOR: &str = "#007bff";
pub const META_DESCRIPTION_MAX_CHARS: usize = 160;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub nome: String,
    pub slug: String,
    pub descricao: String,
    pub cor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct News {
    pub id: i64,
    pub titulo: String,
    pub slug: String,
    pub subtitulo: String,
    pub conteudo: String,
    pub resumo: String,
    pub categoria_id: Option<i64>,
    pub categoria_nome: Option<String>,
    pub categoria_slug: Option<String>,
    pub categoria_cor: Option<String>,
    pub autor_id: Option<i64>,
    pub autor_username: Option<String>,
    pub imagem_destaque: Option<String>,
    pub credito_imagem: String,
    pub status: NewsStatus,
    pub destaque: bool,
    pub meta_descricao: String,
    pub meta_keywords: String,
    pub visualizacoes: i64,
    pub data_publicacao: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewNews {
    pub titulo: String,
    /// Derived from the title when empty
    pub slug: String,
    pub subtitulo: String,
    pub conteudo: String,
    pub resumo: String,
    pub categoria_id: Option<i64>,
    pub autor_id: Option<i64>,
    pub imagem_destaque: Option<String>,
    pub credito_imagem: String,
    pub status: NewsStatus,
    pub destaque: bool,
    pub meta_descricao: String,
    pub meta_keywords: String,
    pub data_publicacao: Option<NaiveDateTime>,
}

impl NewNews {
    pub fn new(titulo: &str, conteudo: &str) -> Self {
        Self {
            titulo: titulo.to_string(),
            slug: String::new(),
            subtitulo: String::new(),
            conteudo: conteudo.to_string(),
            resumo: String::new(),
            categoria_id: None,
            autor_id: None,
            imagem_destaque: None,
            credito_imagem: String::new(),
            status: NewsStatus::Rascunho,
            destaque: false,
            meta_descricao: String::new(),
            meta_keywords: String::new(),
            data_publicacao: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub nome: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub news_id: i64,
    pub autor_id: i64,
    pub autor_username: String,
    pub texto: String,
    pub aprovado: bool,
    pub created_at: NaiveDateTime,
}

/// Filters of the public news list (published articles only)
#[derive(Debug, Clone, Default)]
pub struct NewsFilter {
    pub categoria: Option<String>,
    pub tag: Option<String>,
    /// Free text over title, content and summary
    pub q: Option<String>,
}

const CATEGORY_COLUMNS: &str = "id, nome, slug, descricao, cor";

const NEWS_SELECT: &str = r#"
    SELECT n.id, n.titulo, n.slug, n.subtitulo, n.conteudo, n.resumo, n.categoria_id,
           c.nome AS categoria_nome, c.slug AS categoria_slug, c.cor AS categoria_cor,
           n.autor_id, u.username AS autor_username, n.imagem_destaque, n.credito_imagem,
           n.status, n.destaque, n.meta_descricao, n.meta_keywords, n.visualizacoes,
           n.data_publicacao, n.created_at
    FROM news n
    LEFT JOIN news_categories c ON c.id = n.categoria_id
    LEFT JOIN users u ON u.id = n.autor_id
"#;

const NEWS_ORDER: &str = " ORDER BY n.data_publicacao DESC, n.created_at DESC, n.id DESC";

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Category by name, created with the given description and colour if missing
pub async fn get_or_create_category(
    pool: &SqlitePool,
    nome: &str,
    descricao: &str,
    cor: &str,
) -> Result<(Category, bool)> {
    let sql = format!("SELECT {} FROM news_categories WHERE nome = ?", CATEGORY_COLUMNS);
    if let Some(existing) = sqlx::query_as::<_, Category>(&sql)
        .bind(nome)
        .fetch_optional(pool)
        .await?
    {
        return Ok((existing, false));
    }

    let cor = if cor.is_empty() { DEFAULT_CATEGORY_COLOR } else { cor };
    let result = sqlx::query(
        r#"
        INSERT INTO news_categories (nome, slug, descricao, cor, created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(nome)
    .bind(slugify(nome))
    .bind(descricao)
    .bind(cor)
    .execute(pool)
    .await?;

    Ok((
        Category {
            id: result.last_insert_rowid(),
            nome: nome.to_string(),
            slug: slugify(nome),
            descricao: descricao.to_string(),
            cor: cor.to_string(),
        },
        true,
    ))
}

pub async fn find_category_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Category>> {
    let sql = format!("SELECT {} FROM news_categories WHERE slug = ?", CATEGORY_COLUMNS);
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(category)
}

pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<Category>> {
    let sql = format!("SELECT {} FROM news_categories ORDER BY nome", CATEGORY_COLUMNS);
    let categories = sqlx::query_as::<_, Category>(&sql).fetch_all(pool).await?;
    Ok(categories)
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

pub async fn create_news(pool: &SqlitePool, news: &NewNews) -> Result<News> {
    if news.meta_descricao.chars().count() > META_DESCRIPTION_MAX_CHARS {
        return Err(Error::InvalidInput(format!(
            "meta_descricao must have at most {} characters",
            META_DESCRIPTION_MAX_CHARS
        )));
    }
    let slug = if news.slug.trim().is_empty() {
        slugify(&news.titulo)
    } else {
        news.slug.trim().to_string()
    };

    let result = sqlx::query(
        r#"
        INSERT INTO news (
            titulo, slug, subtitulo, conteudo, resumo, categoria_id, autor_id, imagem_destaque,
            credito_imagem, status, destaque, meta_descricao, meta_keywords, data_publicacao,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(&news.titulo)
    .bind(&slug)
    .bind(&news.subtitulo)
    .bind(&news.conteudo)
    .bind(&news.resumo)
    .bind(news.categoria_id)
    .bind(news.autor_id)
    .bind(&news.imagem_destaque)
    .bind(&news.credito_imagem)
    .bind(news.status)
    .bind(news.destaque)
    .bind(&news.meta_descricao)
    .bind(&news.meta_keywords)
    .bind(news.data_publicacao)
    .execute(pool)
    .await?;

    load_news(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| Error::NotFound(format!("news {}", slug)))
}

/// Article by exact title, created from `news` if missing
pub async fn get_or_create_news_by_title(pool: &SqlitePool, news: &NewNews) -> Result<(News, bool)> {
    let sql = format!("{} WHERE n.titulo = ? LIMIT 1", NEWS_SELECT);
    if let Some(existing) = sqlx::query_as::<_, News>(&sql)
        .bind(&news.titulo)
        .fetch_optional(pool)
        .await?
    {
        return Ok((existing, false));
    }
    Ok((create_news(pool, news).await?, true))
}

pub async fn load_news(pool: &SqlitePool, id: i64) -> Result<Option<News>> {
    let sql = format!("{} WHERE n.id = ?", NEWS_SELECT);
    let news = sqlx::query_as::<_, News>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(news)
}

/// Published article by slug; drafts and archived articles are not visible
pub async fn load_published_news(pool: &SqlitePool, slug: &str) -> Result<Option<News>> {
    let sql = format!("{} WHERE n.slug = ? AND n.status = 'PUBLICADA'", NEWS_SELECT);
    let news = sqlx::query_as::<_, News>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(news)
}

/// Add one view; returns the new count
pub async fn increment_views(pool: &SqlitePool, id: i64) -> Result<i64> {
    let views = sqlx::query_scalar(
        "UPDATE news SET visualizacoes = visualizacoes + 1 WHERE id = ? RETURNING visualizacoes",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(views)
}

/// Published featured articles, newest first
pub async fn list_featured_news(pool: &SqlitePool, limit: i64) -> Result<Vec<News>> {
    let sql = format!(
        "{} WHERE n.status = 'PUBLICADA' AND n.destaque = 1{} LIMIT ?",
        NEWS_SELECT, NEWS_ORDER
    );
    let news = sqlx::query_as::<_, News>(&sql).bind(limit).fetch_all(pool).await?;
    Ok(news)
}

fn push_news_filter<'a>(builder: &mut QueryBuilder<'a, Sqlite>, filter: &'a NewsFilter) {
    builder.push(" WHERE n.status = 'PUBLICADA'");
    if let Some(slug) = filter.categoria.as_deref().filter(|s| !s.is_empty()) {
        builder.push(" AND c.slug = ").push_bind(slug);
    }
    if let Some(slug) = filter.tag.as_deref().filter(|s| !s.is_empty()) {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM news_tag_links l JOIN news_tags tg ON tg.id = l.tag_id \
                 WHERE l.news_id = n.id AND tg.slug = ",
            )
            .push_bind(slug)
            .push(")");
    }
    if let Some(pattern) = like_pattern(filter.q.as_deref()) {
        builder
            .push(" AND (n.titulo LIKE ")
            .push_bind(pattern.clone())
            .push(LIKE_ESCAPE)
            .push(" OR n.conteudo LIKE ")
            .push_bind(pattern.clone())
            .push(LIKE_ESCAPE)
            .push(" OR n.resumo LIKE ")
            .push_bind(pattern)
            .push(LIKE_ESCAPE)
            .push(")");
    }
}

pub async fn count_published_news(pool: &SqlitePool, filter: &NewsFilter) -> Result<i64> {
    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(*) FROM news n LEFT JOIN news_categories c ON c.id = n.categoria_id",
    );
    push_news_filter(&mut builder, filter);
    let count = builder.build_query_scalar().fetch_one(pool).await?;
    Ok(count)
}

/// Published articles matching `filter`, newest first
pub async fn list_published_news(
    pool: &SqlitePool,
    filter: &NewsFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<News>> {
    let mut builder = QueryBuilder::<Sqlite>::new(NEWS_SELECT);
    push_news_filter(&mut builder, filter);
    builder
        .push(NEWS_ORDER)
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let news = builder.build_query_as::<News>().fetch_all(pool).await?;
    Ok(news)
}

/// Other published articles of the same category (or also uncategorised)
pub async fn list_related_news(pool: &SqlitePool, news: &News, limit: i64) -> Result<Vec<News>> {
    let sql = format!(
        "{} WHERE n.status = 'PUBLICADA' AND n.categoria_id IS ? AND n.id != ?{} LIMIT ?",
        NEWS_SELECT, NEWS_ORDER
    );
    let related = sqlx::query_as::<_, News>(&sql)
        .bind(news.categoria_id)
        .bind(news.id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(related)
}

pub async fn link_news_proposal(pool: &SqlitePool, news_id: i64, proposal_id: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO news_proposals (news_id, proposal_id) VALUES (?, ?)")
        .bind(news_id)
        .bind(proposal_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn link_news_deputy(pool: &SqlitePool, news_id: i64, deputy_id: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO news_deputies (news_id, deputy_id) VALUES (?, ?)")
        .bind(news_id)
        .bind(deputy_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// `(id_proposicao, label)` of proposals linked to an article
pub async fn list_news_proposals(pool: &SqlitePool, news_id: i64) -> Result<Vec<(i64, String)>> {
    let rows = sqlx::query_as(
        r#"
        SELECT p.id_proposicao,
               COALESCE(t.sigla, p.tipo_legado) || ' ' || p.numero || '/' || p.ano
        FROM news_proposals np
        JOIN proposals p ON p.id = np.proposal_id
        LEFT JOIN proposal_types t ON t.id = p.tipo_id
        WHERE np.news_id = ?
        ORDER BY p.data_apresentacao DESC
        "#,
    )
    .bind(news_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// `(id_deputado, nome)` of deputies linked to an article
pub async fn list_news_deputies(pool: &SqlitePool, news_id: i64) -> Result<Vec<(i64, String)>> {
    let rows = sqlx::query_as(
        r#"
        SELECT d.id_deputado, d.nome
        FROM news_deputies nd
        JOIN deputies d ON d.id = nd.deputy_id
        WHERE nd.news_id = ?
        ORDER BY d.nome
        "#,
    )
    .bind(news_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

pub async fn get_or_create_tag(pool: &SqlitePool, nome: &str) -> Result<Tag> {
    sqlx::query("INSERT OR IGNORE INTO news_tags (nome, slug, created_at) VALUES (?, ?, CURRENT_TIMESTAMP)")
        .bind(nome)
        .bind(slugify(nome))
        .execute(pool)
        .await?;

    let tag = sqlx::query_as::<_, Tag>("SELECT id, nome, slug FROM news_tags WHERE nome = ?")
        .bind(nome)
        .fetch_one(pool)
        .await?;
    Ok(tag)
}

pub async fn tag_news(pool: &SqlitePool, tag_id: i64, news_id: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO news_tag_links (tag_id, news_id) VALUES (?, ?)")
        .bind(tag_id)
        .bind(news_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_tags_for_news(pool: &SqlitePool, news_id: i64) -> Result<Vec<Tag>> {
    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.id, t.nome, t.slug
        FROM news_tags t
        JOIN news_tag_links l ON l.tag_id = t.id
        WHERE l.news_id = ?
        ORDER BY t.nome
        "#,
    )
    .bind(news_id)
    .fetch_all(pool)
    .await?;
    Ok(tags)
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// New comments start unapproved
pub async fn add_comment(pool: &SqlitePool, news_id: i64, autor_id: i64, texto: &str) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO news_comments (news_id, autor_id, texto, aprovado, created_at, updated_at)
        VALUES (?, ?, ?, 0, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(news_id)
    .bind(autor_id)
    .bind(texto)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn approve_comment(pool: &SqlitePool, comment_id: i64) -> Result<()> {
    sqlx::query("UPDATE news_comments SET aprovado = 1, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(comment_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Approved comments of an article, newest first
pub async fn list_approved_comments(pool: &SqlitePool, news_id: i64) -> Result<Vec<Comment>> {
    let comments = sqlx::query_as::<_, Comment>(
        r#"
        SELECT c.id, c.news_id, c.autor_id, u.username AS autor_username, c.texto, c.aprovado,
               c.created_at
        FROM news_comments c
        JOIN users u ON u.id = c.autor_id
        WHERE c.news_id = ? AND c.aprovado = 1
        ORDER BY c.created_at DESC, c.id DESC
        "#,
    )
    .bind(news_id)
    .fetch_all(pool)
    .await?;
    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;
    use crate::db::users::tests::make_user;
    use chrono::NaiveDate;

    fn published(titulo: &str, categoria_id: Option<i64>, day: u32, destaque: bool) -> NewNews {
        NewNews {
            status: NewsStatus::Publicada,
            categoria_id,
            destaque,
            data_publicacao: NaiveDate::from_ymd_opt(2024, 5, day).and_then(|d| d.and_hms_opt(9, 0, 0)),
            ..NewNews::new(titulo, "Conteúdo")
        }
    }

    #[tokio::test]
    async fn test_category_get_or_create() {
        let pool = init_memory_database().await.unwrap();

        let (cat, created) = get_or_create_category(&pool, "Legislação", "Novas leis", "#dc3545").await.unwrap();
        assert!(created);
        assert_eq!(cat.slug, "legislacao");

        let (again, created) = get_or_create_category(&pool, "Legislação", "ignorado", "").await.unwrap();
        assert!(!created);
        assert_eq!(again.id, cat.id);

        let (plain, _) = get_or_create_category(&pool, "Outros", "", "").await.unwrap();
        assert_eq!(plain.cor, DEFAULT_CATEGORY_COLOR);
    }

    #[tokio::test]
    async fn test_only_published_news_listed() {
        let pool = init_memory_database().await.unwrap();
        create_news(&pool, &published("Publicada antiga", None, 1, false)).await.unwrap();
        create_news(&pool, &published("Publicada nova", None, 9, true)).await.unwrap();
        create_news(&pool, &NewNews::new("Rascunho", "x")).await.unwrap();

        let filter = NewsFilter::default();
        assert_eq!(count_published_news(&pool, &filter).await.unwrap(), 2);
        let listed = list_published_news(&pool, &filter, 12, 0).await.unwrap();
        assert_eq!(listed[0].titulo, "Publicada nova");

        assert!(load_published_news(&pool, "rascunho").await.unwrap().is_none());
        assert_eq!(list_featured_news(&pool, 3).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_filters_by_category_tag_and_text() {
        let pool = init_memory_database().await.unwrap();
        let (leg, _) = get_or_create_category(&pool, "Legislação", "", "").await.unwrap();
        let a = create_news(&pool, &published("Educação digital", Some(leg.id), 1, false)).await.unwrap();
        create_news(&pool, &published("Inflação", None, 2, false)).await.unwrap();

        let tag = get_or_create_tag(&pool, "Educação").await.unwrap();
        tag_news(&pool, tag.id, a.id).await.unwrap();

        let by_cat = NewsFilter { categoria: Some("legislacao".into()), ..Default::default() };
        assert_eq!(count_published_news(&pool, &by_cat).await.unwrap(), 1);

        let by_tag = NewsFilter { tag: Some("educacao".into()), ..Default::default() };
        assert_eq!(list_published_news(&pool, &by_tag, 12, 0).await.unwrap()[0].id, a.id);

        let by_text = NewsFilter { q: Some("inflação".into()), ..Default::default() };
        assert_eq!(count_published_news(&pool, &by_text).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_views_related_and_comments() {
        let pool = init_memory_database().await.unwrap();
        let (cat, _) = get_or_create_category(&pool, "Plenário", "", "").await.unwrap();
        let main = create_news(&pool, &published("Principal", Some(cat.id), 1, false)).await.unwrap();
        for i in 0..5 {
            create_news(&pool, &published(&format!("Relacionada {}", i), Some(cat.id), 2 + i, false))
                .await
                .unwrap();
        }
        create_news(&pool, &published("Sem categoria", None, 3, false)).await.unwrap();

        assert_eq!(increment_views(&pool, main.id).await.unwrap(), 1);
        assert_eq!(increment_views(&pool, main.id).await.unwrap(), 2);

        let related = list_related_news(&pool, &main, 4).await.unwrap();
        assert_eq!(related.len(), 4);
        assert!(related.iter().all(|n| n.categoria_id == Some(cat.id) && n.id != main.id));

        let reader = make_user(&pool, "leitor").await;
        let pending = add_comment(&pool, main.id, reader.id, "Ótima matéria").await.unwrap();
        assert!(list_approved_comments(&pool, main.id).await.unwrap().is_empty());
        approve_comment(&pool, pending).await.unwrap();
        let comments = list_approved_comments(&pool, main.id).await.unwrap();
        assert_eq!(comments[0].autor_username, "leitor");
    }

    #[tokio::test]
    async fn test_meta_description_limit() {
        let pool = init_memory_database().await.unwrap();
        let mut news = NewNews::new("Título", "x");
        news.meta_descricao = "m".repeat(161);
        assert!(matches!(create_news(&pool, &news).await, Err(Error::InvalidInput(_))));
    }
}
