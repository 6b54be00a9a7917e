//! `create-user` and `add-team`

use legis_common::db::tasks::{add_team_member, create_team};
use legis_common::db::users::{create_user, find_user_by_username, NewUser, User};
use legis_common::{Error, Result};
use sqlx::SqlitePool;
use std::io::Write;
use tracing::info;

pub async fn create_user_command(pool: &SqlitePool, user: &NewUser, out: &mut dyn Write) -> Result<User> {
    if find_user_by_username(pool, &user.username).await?.is_some() {
        return Err(Error::InvalidInput(format!("usuário '{}' já existe", user.username.trim())));
    }
    let created = create_user(pool, user).await?;
    info!(user_id = created.id, staff = created.is_staff, "User created");
    writeln!(out, "✓ Usuário \"{}\" criado (id {})", created.username, created.id)?;
    Ok(created)
}

async fn require_user(pool: &SqlitePool, username: &str) -> Result<User> {
    find_user_by_username(pool, username)
        .await?
        .ok_or_else(|| Error::NotFound(format!("usuário '{}'", username)))
}

/// Create a team with an optional coordinator; the coordinator and every
/// listed member become members
pub async fn add_team_command(
    pool: &SqlitePool,
    nome: &str,
    descricao: &str,
    coordenador: Option<&str>,
    membros: &[String],
    out: &mut dyn Write,
) -> Result<i64> {
    let coordinator = match coordenador {
        Some(username) => Some(require_user(pool, username).await?),
        None => None,
    };
    let mut members = Vec::with_capacity(membros.len());
    for username in membros {
        members.push(require_user(pool, username).await?);
    }

    let team = create_team(pool, nome, descricao, coordinator.as_ref().map(|u| u.id)).await?;
    for member in coordinator.iter().chain(members.iter()) {
        add_team_member(pool, team.id, member.id).await?;
    }

    info!(team_id = team.id, members = members.len(), "Team created");
    writeln!(out, "✓ Equipe \"{}\" criada (id {})", team.nome, team.id)?;
    Ok(team.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use legis_common::db::init_memory_database;
    use legis_common::db::tasks::{is_team_member, load_team};

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "segredo".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_user_is_rejected() {
        let pool = init_memory_database().await.unwrap();
        create_user_command(&pool, &new_user("ana"), &mut Vec::new()).await.unwrap();
        let err = create_user_command(&pool, &new_user("ana"), &mut Vec::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_team_members_include_coordinator() {
        let pool = init_memory_database().await.unwrap();
        let ana = create_user_command(&pool, &new_user("ana"), &mut Vec::new()).await.unwrap();
        let bia = create_user_command(&pool, &new_user("bia"), &mut Vec::new()).await.unwrap();

        let team_id = add_team_command(&pool, "Redação", "", Some("ana"), &["bia".to_string()], &mut Vec::new())
            .await
            .unwrap();

        assert!(is_team_member(&pool, team_id, ana.id).await.unwrap());
        assert!(is_team_member(&pool, team_id, bia.id).await.unwrap());
        let team = load_team(&pool, team_id).await.unwrap().unwrap();
        assert_eq!(team.coordenador_username.as_deref(), Some("ana"));
    }

    #[tokio::test]
    async fn test_unknown_member_creates_no_team() {
        let pool = init_memory_database().await.unwrap();
        let err = add_team_command(&pool, "Redação", "", None, &["ghost".to_string()], &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(load_team(&pool, 1).await.unwrap().is_none());
    }
}
