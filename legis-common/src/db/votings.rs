//! Voting sessions and individual deputy votes

use super::{UpsertOutcome, VoteChoice};
use crate::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Voting {
    pub id: i64,
    pub id_votacao: String,
    pub proposal_id: i64,
    pub data: NaiveDateTime,
    pub descricao: String,
    pub tipo_votacao: String,
    pub aprovacao: Option<bool>,
    pub votos_sim: i64,
    pub votos_nao: i64,
    pub votos_abstencao: i64,
}

impl fmt::Display for Voting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Votação {} - {}", self.id_votacao, self.data.format("%d/%m/%Y"))
    }
}

#[derive(Debug, Clone)]
pub struct VotingRecord {
    pub id_votacao: String,
    pub proposal_id: i64,
    pub data: NaiveDateTime,
    pub descricao: String,
    pub tipo_votacao: String,
    pub aprovacao: Option<bool>,
    pub votos_sim: i64,
    pub votos_nao: i64,
    pub votos_abstencao: i64,
}

/// A vote joined with the deputy who cast it
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct DeputyVote {
    pub id: i64,
    pub voting_id: i64,
    pub deputy_id: i64,
    pub id_deputado: i64,
    pub deputy_nome: String,
    pub sigla_partido: String,
    pub voto: VoteChoice,
}

const VOTING_COLUMNS: &str = "id, id_votacao, proposal_id, data, descricao, tipo_votacao, \
     aprovacao, votos_sim, votos_nao, votos_abstencao";

pub async fn upsert_voting(pool: &SqlitePool, voting: &VotingRecord) -> Result<UpsertOutcome> {
    let existed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votings WHERE id_votacao = ?")
        .bind(&voting.id_votacao)
        .fetch_one(pool)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO votings (
            id_votacao, proposal_id, data, descricao, tipo_votacao, aprovacao,
            votos_sim, votos_nao, votos_abstencao, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(id_votacao) DO UPDATE SET
            proposal_id = excluded.proposal_id,
            data = excluded.data,
            descricao = excluded.descricao,
            tipo_votacao = excluded.tipo_votacao,
            aprovacao = excluded.aprovacao,
            votos_sim = excluded.votos_sim,
            votos_nao = excluded.votos_nao,
            votos_abstencao = excluded.votos_abstencao,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&voting.id_votacao)
    .bind(voting.proposal_id)
    .bind(voting.data)
    .bind(&voting.descricao)
    .bind(&voting.tipo_votacao)
    .bind(voting.aprovacao)
    .bind(voting.votos_sim)
    .bind(voting.votos_nao)
    .bind(voting.votos_abstencao)
    .execute(pool)
    .await?;

    Ok(UpsertOutcome::from_existing(existed > 0))
}

/// Record a deputy's vote; a second vote in the same session replaces the first
pub async fn record_vote(pool: &SqlitePool, voting_id: i64, deputy_id: i64, voto: VoteChoice) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO deputy_votes (voting_id, deputy_id, voto, created_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(voting_id, deputy_id) DO UPDATE SET voto = excluded.voto
        "#,
    )
    .bind(voting_id)
    .bind(deputy_id)
    .bind(voto)
    .execute(pool)
    .await?;
    Ok(())
}

/// Recompute a session's yes/no/abstention totals from its stored votes
pub async fn refresh_voting_totals(pool: &SqlitePool, voting_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE votings SET
            votos_sim = (SELECT COUNT(*) FROM deputy_votes WHERE voting_id = votings.id AND voto = 'SIM'),
            votos_nao = (SELECT COUNT(*) FROM deputy_votes WHERE voting_id = votings.id AND voto = 'NAO'),
            votos_abstencao = (SELECT COUNT(*) FROM deputy_votes WHERE voting_id = votings.id AND voto = 'ABSTENCAO'),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(voting_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn load_voting(pool: &SqlitePool, id_votacao: &str) -> Result<Option<Voting>> {
    let sql = format!("SELECT {} FROM votings WHERE id_votacao = ?", VOTING_COLUMNS);
    let voting = sqlx::query_as::<_, Voting>(&sql)
        .bind(id_votacao)
        .fetch_optional(pool)
        .await?;
    Ok(voting)
}

pub async fn count_votings(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM votings")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Votings newest first
pub async fn list_votings(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<Voting>> {
    let sql = format!(
        "SELECT {} FROM votings ORDER BY data DESC, id DESC LIMIT ? OFFSET ?",
        VOTING_COLUMNS
    );
    let votings = sqlx::query_as::<_, Voting>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(votings)
}

pub async fn list_votings_for_proposal(pool: &SqlitePool, proposal_id: i64) -> Result<Vec<Voting>> {
    let sql = format!(
        "SELECT {} FROM votings WHERE proposal_id = ? ORDER BY data DESC, id DESC",
        VOTING_COLUMNS
    );
    let votings = sqlx::query_as::<_, Voting>(&sql)
        .bind(proposal_id)
        .fetch_all(pool)
        .await?;
    Ok(votings)
}

/// Votes of a session ordered by deputy name
pub async fn list_votes_for_voting(pool: &SqlitePool, voting_id: i64) -> Result<Vec<DeputyVote>> {
    let votes = sqlx::query_as::<_, DeputyVote>(
        r#"
        SELECT v.id, v.voting_id, v.deputy_id, d.id_deputado, d.nome AS deputy_nome,
               d.sigla_partido, v.voto
        FROM deputy_votes v
        JOIN deputies d ON d.id = v.deputy_id
        WHERE v.voting_id = ?
        ORDER BY d.nome
        "#,
    )
    .bind(voting_id)
    .fetch_all(pool)
    .await?;
    Ok(votes)
}

/// Per-choice vote counts of one deputy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub total: i64,
    pub sim: i64,
    pub nao: i64,
    pub abstencao: i64,
    pub obstrucao: i64,
    pub ausente: i64,
}

impl VoteTally {
    /// Votes actually cast (anything but AUSENTE)
    pub fn present(&self) -> i64 {
        self.total - self.ausente
    }

    /// Presence in percent; 0 when the deputy has no recorded vote
    pub fn presence_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.present() as f64 * 100.0 / self.total as f64
    }
}

pub async fn vote_tally_for_deputy(pool: &SqlitePool, deputy_id: i64) -> Result<VoteTally> {
    let (total, sim, nao, abstencao, obstrucao, ausente): (i64, i64, i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COALESCE(SUM(voto = 'SIM'), 0),
            COALESCE(SUM(voto = 'NAO'), 0),
            COALESCE(SUM(voto = 'ABSTENCAO'), 0),
            COALESCE(SUM(voto = 'OBSTRUCAO'), 0),
            COALESCE(SUM(voto = 'AUSENTE'), 0)
        FROM deputy_votes
        WHERE deputy_id = ?
        "#,
    )
    .bind(deputy_id)
    .fetch_one(pool)
    .await?;

    Ok(VoteTally {
        total,
        sim,
        nao,
        abstencao,
        obstrucao,
        ausente,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::deputies::{tests::summary, upsert_deputy, load_deputy};
    use crate::db::init_memory_database;
    use crate::db::proposals::{load_proposal, tests::record, upsert_proposal};
    use chrono::NaiveDate;

    async fn seed(pool: &SqlitePool) -> (i64, i64) {
        upsert_proposal(pool, &record(10, "PL", "x", (2024, 1, 1))).await.unwrap();
        upsert_deputy(pool, &summary(1, "Ana", "PT", None)).await.unwrap();
        let proposal = load_proposal(pool, 10).await.unwrap().unwrap();
        let deputy = load_deputy(pool, 1).await.unwrap().unwrap();
        (proposal.id, deputy.id)
    }

    fn voting(id: &str, proposal_id: i64, day: u32) -> VotingRecord {
        VotingRecord {
            id_votacao: id.to_string(),
            proposal_id,
            data: NaiveDate::from_ymd_opt(2024, 3, day).unwrap().and_hms_opt(15, 0, 0).unwrap(),
            descricao: "Votação em plenário".into(),
            tipo_votacao: "Nominal".into(),
            aprovacao: Some(true),
            votos_sim: 300,
            votos_nao: 100,
            votos_abstencao: 5,
        }
    }

    #[tokio::test]
    async fn test_voting_display_and_order() {
        let pool = init_memory_database().await.unwrap();
        let (proposal_id, _) = seed(&pool).await;

        upsert_voting(&pool, &voting("2345-10", proposal_id, 5)).await.unwrap();
        upsert_voting(&pool, &voting("2345-11", proposal_id, 9)).await.unwrap();

        let votings = list_votings(&pool, 20, 0).await.unwrap();
        assert_eq!(votings[0].id_votacao, "2345-11");
        assert_eq!(votings[1].to_string(), "Votação 2345-10 - 05/03/2024");
        assert_eq!(count_votings(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_one_vote_per_deputy_per_session() {
        let pool = init_memory_database().await.unwrap();
        let (proposal_id, deputy_id) = seed(&pool).await;
        upsert_voting(&pool, &voting("v1", proposal_id, 5)).await.unwrap();
        let v = load_voting(&pool, "v1").await.unwrap().unwrap();

        record_vote(&pool, v.id, deputy_id, VoteChoice::Sim).await.unwrap();
        record_vote(&pool, v.id, deputy_id, VoteChoice::Nao).await.unwrap();

        let votes = list_votes_for_voting(&pool, v.id).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].voto, VoteChoice::Nao);
        assert_eq!(votes[0].deputy_nome, "Ana");
    }

    #[tokio::test]
    async fn test_totals_follow_stored_votes() {
        let pool = init_memory_database().await.unwrap();
        let (proposal_id, deputy_id) = seed(&pool).await;
        upsert_deputy(&pool, &summary(2, "Bruno", "PL", None)).await.unwrap();
        let other = load_deputy(&pool, 2).await.unwrap().unwrap();
        upsert_voting(&pool, &voting("v1", proposal_id, 5)).await.unwrap();
        let v = load_voting(&pool, "v1").await.unwrap().unwrap();
        assert_eq!(v.votos_sim, 300);

        record_vote(&pool, v.id, deputy_id, VoteChoice::Sim).await.unwrap();
        record_vote(&pool, v.id, other.id, VoteChoice::Abstencao).await.unwrap();
        refresh_voting_totals(&pool, v.id).await.unwrap();

        let v = load_voting(&pool, "v1").await.unwrap().unwrap();
        assert_eq!((v.votos_sim, v.votos_nao, v.votos_abstencao), (1, 0, 1));
    }

    #[tokio::test]
    async fn test_vote_tally_presence() {
        let pool = init_memory_database().await.unwrap();
        let (proposal_id, deputy_id) = seed(&pool).await;
        for (i, choice) in [VoteChoice::Sim, VoteChoice::Sim, VoteChoice::Abstencao, VoteChoice::Ausente]
            .into_iter()
            .enumerate()
        {
            let id = format!("v{}", i);
            upsert_voting(&pool, &voting(&id, proposal_id, 1 + i as u32)).await.unwrap();
            let v = load_voting(&pool, &id).await.unwrap().unwrap();
            record_vote(&pool, v.id, deputy_id, choice).await.unwrap();
        }

        let tally = vote_tally_for_deputy(&pool, deputy_id).await.unwrap();
        assert_eq!(tally.total, 4);
        assert_eq!(tally.sim, 2);
        assert_eq!(tally.ausente, 1);
        assert!((tally.presence_percent() - 75.0).abs() < f64::EPSILON);

        assert_eq!(VoteTally::default().presence_percent(), 0.0);
    }
}
