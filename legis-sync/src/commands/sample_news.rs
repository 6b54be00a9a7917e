//! `create-sample-news`: demo categories and published articles

use crate::report::{rule, WIDE_RULE};
use chrono::Utc;
use legis_common::db::news::{get_or_create_category, get_or_create_news_by_title, NewNews};
use legis_common::db::users::{generate_salt, get_or_create_user, NewUser};
use legis_common::db::NewsStatus;
use legis_common::{Error, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::io::Write;
use tracing::info;

const SAMPLE_DATA: &str = include_str!("../../data/sample_news.toml");

pub const ADMIN_USERNAME: &str = "admin";
const ADMIN_EMAIL: &str = "admin@example.com";

#[derive(Debug, Deserialize)]
struct SampleData {
    categorias: Vec<SampleCategory>,
    noticias: Vec<SampleArticle>,
}

#[derive(Debug, Deserialize)]
struct SampleCategory {
    nome: String,
    cor: String,
    descricao: String,
}

#[derive(Debug, Deserialize)]
struct SampleArticle {
    titulo: String,
    subtitulo: String,
    resumo: String,
    conteudo: String,
    categoria: String,
    destaque: bool,
}

fn sample_data() -> Result<SampleData> {
    toml::from_str(SAMPLE_DATA).map_err(|e| Error::Parse(format!("sample news data: {}", e)))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories_created: usize,
    pub news_created: usize,
}

pub async fn create_sample_news(pool: &SqlitePool, out: &mut dyn Write) -> Result<SeedSummary> {
    let data = sample_data()?;
    let mut summary = SeedSummary::default();

    writeln!(out, "Criando categorias...")?;
    let mut categories = HashMap::new();
    for cat in &data.categorias {
        let (category, created) = get_or_create_category(pool, &cat.nome, &cat.descricao, &cat.cor).await?;
        if created {
            summary.categories_created += 1;
            writeln!(out, "Categoria \"{}\" criada", category.nome)?;
        }
        categories.insert(category.nome.clone(), category.id);
    }

    // Unusable password: the admin account is for authorship until set-password
    let (admin, admin_created) = get_or_create_user(
        pool,
        &NewUser {
            username: ADMIN_USERNAME.to_string(),
            email: ADMIN_EMAIL.to_string(),
            password: generate_salt(),
            is_staff: true,
            is_superuser: true,
        },
    )
    .await?;
    if admin_created {
        info!(user_id = admin.id, "Created admin user for sample news");
    }

    writeln!(out, "Criando notícias de exemplo...")?;
    let now = Utc::now().naive_utc();
    for article in &data.noticias {
        let categoria_id = categories
            .get(&article.categoria)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("categoria {}", article.categoria)))?;

        let mut news = NewNews::new(&article.titulo, &article.conteudo);
        news.subtitulo = article.subtitulo.clone();
        news.resumo = article.resumo.clone();
        news.categoria_id = Some(categoria_id);
        news.autor_id = Some(admin.id);
        news.status = NewsStatus::Publicada;
        news.destaque = article.destaque;
        news.data_publicacao = Some(now);

        let (news, created) = get_or_create_news_by_title(pool, &news).await?;
        if created {
            summary.news_created += 1;
            writeln!(out, "Notícia \"{}\" criada", news.titulo)?;
        }
    }

    rule(out, WIDE_RULE)?;
    writeln!(out, "Dados de exemplo criados com sucesso!")?;
    info!(
        categories = summary.categories_created,
        news = summary.news_created,
        "Sample news seeded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use legis_common::db::init_memory_database;
    use legis_common::db::news::{list_categories, list_featured_news};

    #[test]
    fn test_sample_data_parses() {
        let data = sample_data().unwrap();
        assert_eq!(data.categorias.len(), 5);
        assert_eq!(data.noticias.len(), 5);
        let featured = data.noticias.iter().filter(|n| n.destaque).count();
        assert_eq!(featured, 3);
        assert!(data.noticias[0].conteudo.starts_with("A Câmara dos Deputados aprovou"));
    }

    #[tokio::test]
    async fn test_seeding_twice_creates_nothing_new() {
        let pool = init_memory_database().await.unwrap();

        let first = create_sample_news(&pool, &mut Vec::new()).await.unwrap();
        assert_eq!(first, SeedSummary { categories_created: 5, news_created: 5 });

        let mut out = Vec::new();
        let second = create_sample_news(&pool, &mut out).await.unwrap();
        assert_eq!(second, SeedSummary::default());
        assert!(String::from_utf8(out).unwrap().contains("Dados de exemplo criados com sucesso!"));

        assert_eq!(list_categories(&pool).await.unwrap().len(), 5);
        assert_eq!(list_featured_news(&pool, 10).await.unwrap().len(), 3);
    }
}
