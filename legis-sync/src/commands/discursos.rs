//! `sync-discursos [--deputado ID] [--inicio YYYY-MM-DD] [--fim YYYY-MM-DD]`

use crate::clients::camara::{CamaraClient, SpeechEntry};
use crate::report::{rule, SyncCounts, RULE};
use chrono::{NaiveDate, NaiveDateTime};
use legis_common::db::deputies::{list_deputy_ids, load_deputy, load_deputy_by_pk, Deputy};
use legis_common::db::speeches::{upsert_speech, SpeechRecord};
use legis_common::{Error, Result};
use sqlx::SqlitePool;
use std::io::Write;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct SpeechSyncOptions {
    /// Only this deputy (`id_deputado`); every stored deputy otherwise
    pub deputado: Option<i64>,
    pub inicio: Option<NaiveDate>,
    pub fim: Option<NaiveDate>,
}

impl SpeechSyncOptions {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("itens", "100".to_string())];
        if let Some(inicio) = self.inicio {
            params.push(("dataInicio", inicio.format("%Y-%m-%d").to_string()));
        }
        if let Some(fim) = self.fim {
            params.push(("dataFim", fim.format("%Y-%m-%d").to_string()));
        }
        params
    }
}

/// `dataHoraInicio` with or without seconds
pub fn parse_speech_start(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Speeches carry no id in the API; the deputy and start time identify one
pub fn speech_id(id_deputado: i64, data_hora_inicio: &str) -> String {
    format!("{}-{}", id_deputado, data_hora_inicio.trim())
}

fn record_from(deputy: &Deputy, entry: &SpeechEntry) -> Result<SpeechRecord> {
    let data = parse_speech_start(&entry.data_hora_inicio)
        .ok_or_else(|| Error::Parse(format!("invalid dataHoraInicio '{}'", entry.data_hora_inicio)))?;
    Ok(SpeechRecord {
        id_discurso: speech_id(deputy.id_deputado, &entry.data_hora_inicio),
        deputy_id: deputy.id,
        data,
        tipo_discurso: entry.tipo_discurso.clone(),
        transcricao: entry.transcricao.clone(),
        sumario: entry.sumario.clone(),
        url_audio: entry.url_audio.clone(),
        url_video: entry.url_video.clone(),
    })
}

async fn target_deputies(pool: &SqlitePool, options: &SpeechSyncOptions) -> Result<Vec<Deputy>> {
    if let Some(id_deputado) = options.deputado {
        let deputy = load_deputy(pool, id_deputado)
            .await?
            .ok_or_else(|| Error::NotFound(format!("deputado {}", id_deputado)))?;
        return Ok(vec![deputy]);
    }

    let mut deputies = Vec::new();
    for id in list_deputy_ids(pool).await? {
        if let Some(deputy) = load_deputy_by_pk(pool, id).await? {
            deputies.push(deputy);
        }
    }
    Ok(deputies)
}

pub async fn sync_speeches(
    pool: &SqlitePool,
    client: &CamaraClient,
    options: &SpeechSyncOptions,
    out: &mut dyn Write,
) -> Result<SyncCounts> {
    writeln!(out, "Iniciando sincronização de discursos...\n")?;

    let deputies = target_deputies(pool, options).await?;
    let total = deputies.len();
    info!(total, "Syncing speeches");

    let params = options.params();
    let mut counts = SyncCounts::default();
    for (idx, deputy) in deputies.iter().enumerate() {
        write!(out, "[{}/{}] {}...", idx + 1, total, deputy.nome)?;
        let entries = match client.list_deputy_speeches(deputy.id_deputado, &params).await {
            Ok(entries) => entries,
            Err(e) => {
                counts.errors += 1;
                warn!(id_deputado = deputy.id_deputado, "Failed to fetch speeches: {}", e);
                writeln!(out, " ✗ Erro: {}", e)?;
                continue;
            }
        };

        let mut stored = 0;
        for entry in &entries {
            let outcome = match record_from(deputy, entry) {
                Ok(record) => upsert_speech(pool, &record).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(outcome) => {
                    counts.record(outcome);
                    stored += 1;
                }
                Err(e) => {
                    counts.errors += 1;
                    warn!(id_deputado = deputy.id_deputado, "Speech sync failed: {}", e);
                }
            }
        }
        writeln!(out, " {} discursos", stored)?;
    }

    writeln!(out)?;
    rule(out, RULE)?;
    writeln!(out, "SINCRONIZAÇÃO CONCLUÍDA")?;
    rule(out, RULE)?;
    writeln!(out, "Deputados processados: {}", total)?;
    writeln!(out, "  • Discursos criados: {}", counts.created)?;
    writeln!(out, "  • Discursos atualizados: {}", counts.updated)?;
    if counts.errors > 0 {
        writeln!(out, "  • Erros: {}", counts.errors)?;
    }

    counts.log("Speech sync");
    Ok(counts)
}
