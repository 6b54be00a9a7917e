//! Gender catalogue with generated slugs and AI-written descriptions

use crate::ai::AnalysisService;
use crate::text::{changed_significantly, slugify};
use crate::Result;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct Gender {
    /// `None` until first saved
    pub id: Option<i64>,
    pub sigla: String,
    pub nome: String,
    pub descricao: String,
    pub slug: String,
    pub nome_anterior: String,
}

impl Gender {
    pub fn new(sigla: &str, nome: &str) -> Self {
        Self {
            sigla: sigla.to_string(),
            nome: nome.to_string(),
            ..Default::default()
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.sigla, self.nome)
    }
}

const GENDER_COLUMNS: &str = "id, sigla, nome, descricao, slug, nome_anterior";

/// Persist a gender, deriving slug and description first
///
/// The slug is regenerated when empty or when the name differs from
/// `nome_anterior`; the description is regenerated when the name changed
/// significantly. Afterwards `nome_anterior` equals `nome`.
pub async fn save_gender(pool: &SqlitePool, gender: &mut Gender, ai: &AnalysisService) -> Result<()> {
    if gender.slug.is_empty() || gender.nome != gender.nome_anterior {
        gender.slug = unique_slug(pool, &gender.nome, &gender.sigla, gender.id).await?;
    }

    if changed_significantly(&gender.nome_anterior, &gender.nome) {
        debug!(sigla = %gender.sigla, "Regenerating gender description");
        gender.descricao = ai.describe_gender(&gender.nome).await;
    }

    match gender.id {
        Some(id) => {
            sqlx::query(
                r#"
                UPDATE genders SET
                    sigla = ?, nome = ?, descricao = ?, slug = ?,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = ?
                "#,
            )
            .bind(&gender.sigla)
            .bind(&gender.nome)
            .bind(&gender.descricao)
            .bind(&gender.slug)
            .bind(id)
            .execute(pool)
            .await?;
        }
        None => {
            let result = sqlx::query(
                r#"
                INSERT INTO genders (sigla, nome, descricao, slug, nome_anterior, created_at, updated_at)
                VALUES (?, ?, ?, ?, '', CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
                "#,
            )
            .bind(&gender.sigla)
            .bind(&gender.nome)
            .bind(&gender.descricao)
            .bind(&gender.slug)
            .execute(pool)
            .await?;
            gender.id = Some(result.last_insert_rowid());
        }
    }

    gender.nome_anterior = gender.nome.clone();
    sqlx::query("UPDATE genders SET nome_anterior = ? WHERE id = ?")
        .bind(&gender.nome_anterior)
        .bind(gender.id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Slug of `nome`, suffixed `-1`, `-2`, ... until no other row uses it
async fn unique_slug(pool: &SqlitePool, nome: &str, sigla: &str, own_id: Option<i64>) -> Result<String> {
    let mut base = slugify(nome);
    if base.is_empty() {
        base = slugify(sigla);
    }

    let mut candidate = base.clone();
    let mut counter = 1;
    loop {
        let taken: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM genders WHERE slug = ? AND (? IS NULL OR id != ?)",
        )
        .bind(&candidate)
        .bind(own_id)
        .bind(own_id)
        .fetch_one(pool)
        .await?;

        if taken == 0 {
            return Ok(candidate);
        }
        candidate = format!("{}-{}", base, counter);
        counter += 1;
    }
}

pub async fn find_gender_by_sigla(pool: &SqlitePool, sigla: &str) -> Result<Option<Gender>> {
    let sql = format!("SELECT {} FROM genders WHERE sigla = ?", GENDER_COLUMNS);
    let gender = sqlx::query_as::<_, Gender>(&sql)
        .bind(sigla.trim().to_uppercase())
        .fetch_optional(pool)
        .await?;
    Ok(gender)
}

/// All genders ordered by sigla
pub async fn list_genders(pool: &SqlitePool) -> Result<Vec<Gender>> {
    let sql = format!("SELECT {} FROM genders ORDER BY sigla", GENDER_COLUMNS);
    let genders = sqlx::query_as::<_, Gender>(&sql).fetch_all(pool).await?;
    Ok(genders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    #[tokio::test]
    async fn test_first_save_sets_slug_description_and_previous_name() {
        let pool = init_memory_database().await.unwrap();
        let ai = AnalysisService::disabled();

        let mut gender = Gender::new("NB", "Não Binário");
        save_gender(&pool, &mut gender, &ai).await.unwrap();

        assert!(gender.id.is_some());
        assert_eq!(gender.slug, "nao-binario");
        assert_eq!(gender.descricao, "Descrição de Não Binário (API key não configurada)");
        assert_eq!(gender.nome_anterior, "Não Binário");

        let stored = find_gender_by_sigla(&pool, "nb").await.unwrap().unwrap();
        assert_eq!(stored, gender);
    }

    #[tokio::test]
    async fn test_minor_rename_keeps_description_but_updates_slug() {
        let pool = init_memory_database().await.unwrap();
        let ai = AnalysisService::disabled();

        let mut gender = Gender::new("NB", "pessoa nao binaria");
        save_gender(&pool, &mut gender, &ai).await.unwrap();
        gender.descricao = "manual".to_string();

        // 3 of 4 words shared: similarity 0.75
        gender.nome = "pessoa nao binaria x".to_string();
        save_gender(&pool, &mut gender, &ai).await.unwrap();

        assert_eq!(gender.descricao, "manual");
        assert_eq!(gender.slug, "pessoa-nao-binaria-x");
    }

    #[tokio::test]
    async fn test_significant_rename_regenerates_description() {
        let pool = init_memory_database().await.unwrap();
        let ai = AnalysisService::disabled();

        let mut gender = Gender::new("M", "Masculino");
        save_gender(&pool, &mut gender, &ai).await.unwrap();
        gender.descricao = "manual".to_string();

        gender.nome = "Homem".to_string();
        save_gender(&pool, &mut gender, &ai).await.unwrap();

        assert_eq!(gender.descricao, "Descrição de Homem (API key não configurada)");
    }

    #[tokio::test]
    async fn test_slug_collision_gets_suffix() {
        let pool = init_memory_database().await.unwrap();
        let ai = AnalysisService::disabled();

        let mut first = Gender::new("F", "Feminino");
        save_gender(&pool, &mut first, &ai).await.unwrap();
        let mut second = Gender::new("FE", "Feminino");
        save_gender(&pool, &mut second, &ai).await.unwrap();
        let mut third = Gender::new("FM", "Feminino");
        save_gender(&pool, &mut third, &ai).await.unwrap();

        assert_eq!(first.slug, "feminino");
        assert_eq!(second.slug, "feminino-1");
        assert_eq!(third.slug, "feminino-2");

        // Re-saving keeps its own slug
        save_gender(&pool, &mut first, &ai).await.unwrap();
        assert_eq!(first.slug, "feminino");
        assert_eq!(list_genders(&pool).await.unwrap().len(), 3);
    }
}
