//! User accounts with salted SHA-256 password hashes

use crate::{Error, Result};
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip)]
    pub password_salt: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, password_salt, is_staff, is_superuser";

/// Random 16-byte salt, hex encoded
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Hex SHA-256 of `salt` followed by `password`
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub async fn create_user(pool: &SqlitePool, user: &NewUser) -> Result<User> {
    let username = user.username.trim();
    if username.is_empty() {
        return Err(Error::InvalidInput("username must not be empty".to_string()));
    }

    let salt = generate_salt();
    let hash = hash_password(&salt, &user.password);

    let result = sqlx::query(
        r#"
        INSERT INTO users (
            username, email, password_hash, password_salt, is_staff, is_superuser, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(username)
    .bind(&user.email)
    .bind(&hash)
    .bind(&salt)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .execute(pool)
    .await?;

    load_user(pool, result.last_insert_rowid())
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {}", username)))
}

/// Existing user by username, or a newly created one; the flag tells which
pub async fn get_or_create_user(pool: &SqlitePool, user: &NewUser) -> Result<(User, bool)> {
    if let Some(existing) = find_user_by_username(pool, &user.username).await? {
        return Ok((existing, false));
    }
    Ok((create_user(pool, user).await?, true))
}

pub async fn set_password(pool: &SqlitePool, user_id: i64, password: &str) -> Result<()> {
    let salt = generate_salt();
    sqlx::query(
        "UPDATE users SET password_hash = ?, password_salt = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(hash_password(&salt, password))
    .bind(&salt)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn load_user(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_user_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(username.trim())
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// User whose password matches; `None` for unknown user or wrong password
pub async fn verify_credentials(pool: &SqlitePool, username: &str, password: &str) -> Result<Option<User>> {
    let Some(user) = find_user_by_username(pool, username).await? else {
        return Ok(None);
    };
    if user.password_hash.is_empty() {
        return Ok(None);
    }
    if hash_password(&user.password_salt, password) == user.password_hash {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::init_memory_database;

    pub(crate) async fn make_user(pool: &SqlitePool, username: &str) -> User {
        create_user(
            pool,
            &NewUser {
                username: username.to_string(),
                password: "segredo".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_hash_password_is_salted() {
        let a = hash_password("salt-a", "senha");
        let b = hash_password("salt-b", "senha");
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_eq!(a, hash_password("salt-a", "senha"));
        assert_eq!(generate_salt().len(), 32);
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let pool = init_memory_database().await.unwrap();
        let user = make_user(&pool, "editor").await;

        let ok = verify_credentials(&pool, "editor", "segredo").await.unwrap();
        assert_eq!(ok.map(|u| u.id), Some(user.id));
        assert!(verify_credentials(&pool, "editor", "errada").await.unwrap().is_none());
        assert!(verify_credentials(&pool, "ninguem", "segredo").await.unwrap().is_none());

        set_password(&pool, user.id, "nova").await.unwrap();
        assert!(verify_credentials(&pool, "editor", "nova").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_or_create_user() {
        let pool = init_memory_database().await.unwrap();
        let new_user = NewUser {
            username: "admin".into(),
            email: "admin@example.com".into(),
            password: "admin".into(),
            is_staff: true,
            is_superuser: true,
        };

        let (first, created) = get_or_create_user(&pool, &new_user).await.unwrap();
        assert!(created);
        assert!(first.is_staff);
        let (second, created) = get_or_create_user(&pool, &new_user).await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_empty_username_rejected() {
        let pool = init_memory_database().await.unwrap();
        let result = create_user(&pool, &NewUser::default()).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
