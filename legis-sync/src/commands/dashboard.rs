//! `atualizar-perfis` and `gerar-relatorios --periodo P [--ate YYYY-MM-DD]`

use chrono::NaiveDate;
use legis_common::db::dashboard::{generate_activity_report, refresh_profile, report_window_start};
use legis_common::db::deputies::list_deputy_ids;
use legis_common::db::ReportPeriod;
use legis_common::Result;
use sqlx::SqlitePool;
use std::io::Write;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCounts {
    pub done: usize,
    pub errors: usize,
}

pub async fn refresh_profiles(pool: &SqlitePool, out: &mut dyn Write) -> Result<BatchCounts> {
    let ids = list_deputy_ids(pool).await?;
    writeln!(out, "Atualizando perfis de {} deputados...", ids.len())?;

    let mut counts = BatchCounts::default();
    for id in ids {
        match refresh_profile(pool, id).await {
            Ok(_) => counts.done += 1,
            Err(e) => {
                counts.errors += 1;
                warn!(deputy_id = id, "Profile refresh failed: {}", e);
            }
        }
    }

    writeln!(out, "✓ Perfis atualizados: {}", counts.done)?;
    if counts.errors > 0 {
        writeln!(out, "✗ Erros: {}", counts.errors)?;
    }
    info!(done = counts.done, errors = counts.errors, "Profile refresh finished");
    Ok(counts)
}

pub async fn generate_reports(
    pool: &SqlitePool,
    periodo: ReportPeriod,
    data_fim: NaiveDate,
    out: &mut dyn Write,
) -> Result<BatchCounts> {
    let ids = list_deputy_ids(pool).await?;
    writeln!(
        out,
        "Gerando relatórios {} de {} a {} para {} deputados...",
        periodo.label().to_lowercase(),
        report_window_start(periodo, data_fim).format("%d/%m/%Y"),
        data_fim.format("%d/%m/%Y"),
        ids.len()
    )?;

    let mut counts = BatchCounts::default();
    for id in ids {
        match generate_activity_report(pool, id, periodo, data_fim).await {
            Ok(_) => counts.done += 1,
            Err(e) => {
                counts.errors += 1;
                warn!(deputy_id = id, "Report generation failed: {}", e);
            }
        }
    }

    writeln!(out, "✓ Relatórios gerados: {}", counts.done)?;
    if counts.errors > 0 {
        writeln!(out, "✗ Erros: {}", counts.errors)?;
    }
    info!(done = counts.done, errors = counts.errors, periodo = periodo.as_str(), "Report generation finished");
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use legis_common::db::dashboard::{list_reports, load_profile};
    use legis_common::db::deputies::{upsert_deputy, DeputySummary};
    use legis_common::db::init_memory_database;

    async fn seed_deputy(pool: &SqlitePool) -> i64 {
        upsert_deputy(
            pool,
            &DeputySummary {
                id_deputado: 204554,
                nome: "Ana Souza".to_string(),
                sigla_partido: "PT".to_string(),
                uf_representacao_id: None,
                partido_id: None,
                email: String::new(),
                url_foto: String::new(),
            },
        )
        .await
        .unwrap();
        list_deputy_ids(pool).await.unwrap()[0]
    }

    #[tokio::test]
    async fn test_refresh_creates_profiles() {
        let pool = init_memory_database().await.unwrap();
        let id = seed_deputy(&pool).await;

        let counts = refresh_profiles(&pool, &mut Vec::new()).await.unwrap();
        assert_eq!(counts, BatchCounts { done: 1, errors: 0 });
        let profile = load_profile(&pool, id).await.unwrap().unwrap();
        assert_eq!(profile.total_votacoes, 0);
    }

    #[tokio::test]
    async fn test_reports_for_every_deputy() {
        let pool = init_memory_database().await.unwrap();
        seed_deputy(&pool).await;

        let fim = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let mut out = Vec::new();
        generate_reports(&pool, ReportPeriod::Mensal, fim, &mut out).await.unwrap();

        let reports = list_reports(&pool, 10).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].data_inicio, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(String::from_utf8(out).unwrap().contains("01/06/2024 a 30/06/2024"));
    }
}
