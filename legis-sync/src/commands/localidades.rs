//! `sync-ibge-localidades [--apenas-regioes] [--apenas-estados] [--apenas-municipios]`

use crate::clients::IbgeClient;
use crate::report::SyncCounts;
use legis_common::db::geography::{
    is_capital_code, region_exists, uf_code_of_municipality, uf_exists, upsert_municipality, upsert_region,
    upsert_uf, Municipality, Region, Uf,
};
use legis_common::db::UpsertOutcome;
use legis_common::Result;
use sqlx::SqlitePool;
use std::io::Write;
use tracing::{error, info, warn};

/// Progress line interval of the municipality phase
const MUNICIPALITY_PROGRESS_EVERY: usize = 500;

/// Phases selected on the command line; none selected means all of them
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalityPhases {
    pub regioes: bool,
    pub estados: bool,
    pub municipios: bool,
}

impl LocalityPhases {
    fn all(&self) -> bool {
        !(self.regioes || self.estados || self.municipios)
    }
}

/// Per-phase counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalitySummary {
    pub regions: SyncCounts,
    pub states: SyncCounts,
    pub municipalities: SyncCounts,
}

pub async fn sync_localities(
    pool: &SqlitePool,
    client: &IbgeClient,
    phases: LocalityPhases,
    out: &mut dyn Write,
) -> Result<LocalitySummary> {
    let mut summary = LocalitySummary::default();

    if phases.all() || phases.regioes {
        summary.regions = sync_regions(pool, client, out).await?;
    }
    if phases.all() || phases.estados {
        summary.states = sync_states(pool, client, out).await?;
    }
    if phases.all() || phases.municipios {
        summary.municipalities = sync_municipalities(pool, client, out).await?;
    }

    writeln!(out, "Sincronização concluída com sucesso!")?;
    info!(
        regions = summary.regions.processed(),
        states = summary.states.processed(),
        municipalities = summary.municipalities.processed(),
        "Locality sync finished"
    );
    Ok(summary)
}

async fn sync_regions(pool: &SqlitePool, client: &IbgeClient, out: &mut dyn Write) -> Result<SyncCounts> {
    writeln!(out, "Sincronizando regiões...")?;

    let regions = match client.list_regions().await {
        Ok(regions) => regions,
        Err(e) => {
            error!("Failed to fetch regions: {}", e);
            writeln!(out, "Erro ao obter regiões da API do IBGE")?;
            return Ok(SyncCounts::default());
        }
    };

    let mut counts = SyncCounts::default();
    for entry in &regions {
        let region = Region {
            id: entry.id,
            sigla: entry.sigla.clone(),
            nome: entry.nome.clone(),
        };
        let outcome = upsert_region(pool, &region).await?;
        counts.record(outcome);
        match outcome {
            UpsertOutcome::Created => writeln!(out, "Região \"{}\" criada", region.nome)?,
            UpsertOutcome::Updated => writeln!(out, "Região \"{}\" atualizada", region.nome)?,
        }
    }

    writeln!(out, "Total de regiões sincronizadas: {}", regions.len())?;
    Ok(counts)
}

async fn sync_states(pool: &SqlitePool, client: &IbgeClient, out: &mut dyn Write) -> Result<SyncCounts> {
    writeln!(out, "Sincronizando estados...")?;

    let states = match client.list_states().await {
        Ok(states) => states,
        Err(e) => {
            error!("Failed to fetch states: {}", e);
            writeln!(out, "Erro ao obter estados da API do IBGE")?;
            return Ok(SyncCounts::default());
        }
    };

    let mut counts = SyncCounts::default();
    for entry in &states {
        if !region_exists(pool, entry.regiao.id).await? {
            counts.errors += 1;
            warn!(state = entry.id, region = entry.regiao.id, "Region missing for state");
            writeln!(
                out,
                "Região {} não encontrada para o estado {}",
                entry.regiao.id, entry.nome
            )?;
            continue;
        }

        let uf = Uf {
            id: entry.id,
            sigla: entry.sigla.clone(),
            nome: entry.nome.clone(),
            region_id: entry.regiao.id,
        };
        let outcome = upsert_uf(pool, &uf).await?;
        counts.record(outcome);
        match outcome {
            UpsertOutcome::Created => writeln!(out, "Estado \"{}\" criado", uf.nome)?,
            UpsertOutcome::Updated => writeln!(out, "Estado \"{}\" atualizado", uf.nome)?,
        }
    }

    writeln!(out, "Total de estados sincronizados: {}", states.len())?;
    Ok(counts)
}

async fn sync_municipalities(pool: &SqlitePool, client: &IbgeClient, out: &mut dyn Write) -> Result<SyncCounts> {
    writeln!(out, "Sincronizando municípios...")?;
    writeln!(out, "Atenção: Este processo pode demorar alguns minutos...")?;

    let municipalities = match client.list_municipalities().await {
        Ok(municipalities) => municipalities,
        Err(e) => {
            error!("Failed to fetch municipalities: {}", e);
            writeln!(out, "Erro ao obter municípios da API do IBGE")?;
            return Ok(SyncCounts::default());
        }
    };

    let mut counts = SyncCounts::default();
    let mut synced = 0usize;
    for entry in &municipalities {
        let uf_id = match uf_code_of_municipality(entry.id) {
            Some(code) if uf_exists(pool, code).await? => code,
            code => {
                counts.errors += 1;
                writeln!(
                    out,
                    "Estado {} não encontrado para o município {}",
                    code.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string()),
                    entry.nome
                )?;
                continue;
            }
        };

        let municipality = Municipality {
            id: entry.id,
            nome: entry.nome.clone(),
            uf_id,
            is_capital: is_capital_code(entry.id),
        };
        counts.record(upsert_municipality(pool, &municipality).await?);

        synced += 1;
        if synced % MUNICIPALITY_PROGRESS_EVERY == 0 {
            writeln!(out, "Sincronizados {} municípios...", synced)?;
        }
    }

    writeln!(out, "Total de municípios sincronizados: {}", synced)?;
    Ok(counts)
}
