//! Legacy proposal type backfill on an on-disk database

use chrono::NaiveDate;
use legis_common::db::init_database;
use legis_common::db::proposals::{
    find_proposal_type_by_cod, load_proposal, type_coverage, upsert_proposal, upsert_proposal_type, ProposalRecord,
};
use legis_sync::commands::migrate::migrate_proposal_types;
use sqlx::SqlitePool;
use tempfile::TempDir;

fn record(id_proposicao: i64, legacy: &str) -> ProposalRecord {
    ProposalRecord {
        id_proposicao,
        tipo_id: None,
        tipo_legado: legacy.to_string(),
        numero: id_proposicao % 100,
        ano: 2023,
        ementa: format!("Ementa {}", id_proposicao),
        ementa_detalhada: String::new(),
        data_apresentacao: NaiveDate::from_ymd_opt(2023, 8, 1).unwrap(),
        status_proposicao: String::new(),
        autor_id: None,
        url_inteiro_teor: String::new(),
        url_tramitacao: String::new(),
    }
}

async fn seed(pool: &SqlitePool) {
    // "1000" sorts before "139" as text; the numeric order must win
    upsert_proposal_type(pool, "1000", "PL", "Projeto de Lei (novo)", "").await.unwrap();
    upsert_proposal_type(pool, "139", "PL", "Projeto de Lei", "").await.unwrap();
    upsert_proposal_type(pool, "136", "PEC", "Proposta de Emenda à Constituição", "").await.unwrap();

    for (id, legacy) in [(101, "PL"), (102, "PEC"), (103, "ZZZ"), (104, "AAA"), (105, "ZZZ"), (106, "")] {
        upsert_proposal(pool, &record(id, legacy)).await.unwrap();
    }
}

#[tokio::test]
async fn test_dry_run_then_migrate() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("legis.db")).await.unwrap();
    seed(&pool).await;

    let mut out = Vec::new();
    let dry = migrate_proposal_types(&pool, true, &mut out).await.unwrap();
    assert_eq!(dry.migrated, 2);
    assert_eq!(dry.not_found, 3);
    assert_eq!(dry.processed(), 5);
    assert_eq!(type_coverage(&pool).await.unwrap().with_type, 0);
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("MODO DRY-RUN: Nenhuma alteração será salva"));
    assert!(text.contains("Siglas não encontradas: AAA, ZZZ"));
    assert!(!text.contains("Estatísticas após migração"));

    let mut out = Vec::new();
    let summary = migrate_proposal_types(&pool, false, &mut out).await.unwrap();
    assert_eq!(summary.migrated, 2);

    let pl = find_proposal_type_by_cod(&pool, "139").await.unwrap().unwrap();
    let migrated = load_proposal(&pool, 101).await.unwrap().unwrap();
    assert_eq!(migrated.tipo_id, Some(pl.id));

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("✓ Migrada: PL 1/2023 → PL (cod: 139)"));
    assert!(text.contains("Com tipo_proposicao: 2 (33.3%)"));
    assert!(text.contains("Sem tipo_proposicao: 4 (66.7%)"));
}

#[tokio::test]
async fn test_nothing_to_migrate() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("legis.db")).await.unwrap();

    let mut out = Vec::new();
    let summary = migrate_proposal_types(&pool, false, &mut out).await.unwrap();
    assert_eq!(summary.processed(), 0);
    assert!(String::from_utf8(out)
        .unwrap()
        .contains("Nenhuma proposição precisa ser migrada!"));
}
