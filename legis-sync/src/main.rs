//! legis-sync - synchronization and maintenance CLI
//!
//! Pulls Chamber of Deputies and IBGE open data into the shared SQLite
//! database and runs the enrichment jobs the web pages read from.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use legis_common::ai::AnalysisService;
use legis_common::config::{CliOverrides, Config};
use legis_common::db::users::NewUser;
use legis_common::db::{init_database, ReportPeriod};
use legis_sync::clients::{CamaraClient, IbgeClient};
use legis_sync::commands::{
    analisar, dashboard, deputados, discursos, localidades, migrate, partidos, proposicoes, sample_news, sexo,
    tipos, users,
};

#[derive(Parser, Debug)]
#[command(name = "legis-sync")]
#[command(about = "Synchronization and maintenance commands for the legislative monitor")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "LEGIS_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sync political parties
    SyncPartidos {
        /// Also fetch each party's detail record
        #[arg(long)]
        detalhes: bool,
    },
    /// Sync deputies
    SyncDeputados {
        #[arg(long)]
        detalhes: bool,
        /// Only deputies of this UF
        #[arg(long)]
        uf: Option<String>,
        /// Only deputies of this party
        #[arg(long)]
        partido: Option<String>,
    },
    /// Sync the proposal type catalogue
    SyncTiposProposicao,
    /// Sync IBGE regions, states and municipalities
    SyncIbgeLocalidades {
        #[arg(long)]
        apenas_regioes: bool,
        #[arg(long)]
        apenas_estados: bool,
        #[arg(long)]
        apenas_municipios: bool,
    },
    /// Sync proposals of one year
    SyncProposicoes {
        #[arg(long)]
        ano: Option<i64>,
        #[arg(long)]
        sigla_tipo: Option<String>,
        #[arg(long)]
        limite: Option<usize>,
        /// Also sync votings and individual votes
        #[arg(long)]
        votacoes: bool,
    },
    /// Sync plenary speeches of stored deputies
    SyncDiscursos {
        /// Only this deputy (Chamber id)
        #[arg(long)]
        deputado: Option<i64>,
        #[arg(long)]
        inicio: Option<NaiveDate>,
        #[arg(long)]
        fim: Option<NaiveDate>,
    },
    /// Move legacy proposal types to the type foreign key
    MigrateTiposProposicao {
        /// Report without saving
        #[arg(long)]
        dry_run: bool,
    },
    /// Seed the gender catalogue (M, F, NB)
    PopulateSexo {
        /// Re-save existing entries
        #[arg(long)]
        force: bool,
    },
    /// Create demo news categories and articles
    CreateSampleNews,
    /// Generate AI summaries, impact and speech analyses
    Analisar {
        #[arg(long, default_value_t = 10)]
        proposicoes: i64,
        #[arg(long, default_value_t = 10)]
        discursos: i64,
        /// Also index proposals for semantic search
        #[arg(long)]
        embeddings: bool,
    },
    /// Recompute every parliamentary profile
    AtualizarPerfis,
    /// Generate activity reports for every deputy
    GerarRelatorios {
        /// SEMANAL, MENSAL, TRIMESTRAL or ANUAL
        #[arg(long)]
        periodo: ReportPeriod,
        /// Last day of the window (today when absent)
        #[arg(long)]
        ate: Option<NaiveDate>,
    },
    /// Create a user account
    CreateUser {
        username: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, env = "LEGIS_NEW_USER_PASSWORD")]
        password: String,
        #[arg(long)]
        staff: bool,
        #[arg(long)]
        superuser: bool,
    },
    /// Create a team
    AddTeam {
        nome: String,
        #[arg(long, default_value = "")]
        descricao: String,
        /// Coordinator username
        #[arg(long)]
        coordenador: Option<String>,
        /// Member usernames
        #[arg(long = "membro")]
        membros: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "legis_sync=info,legis_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    info!(
        "Starting legis-sync v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = Config::load(
        args.config.as_deref(),
        &CliOverrides {
            database_path: args.database.clone(),
            bind_addr: None,
        },
    )
    .context("Failed to load configuration")?;
    info!("Database: {}", config.database_path.display());

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to open database")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(args.command, &config, &pool, &mut out).await?;
    out.flush()?;
    Ok(())
}

fn camara(config: &Config) -> Result<CamaraClient> {
    CamaraClient::new(&config.camara_api_base_url, config.http_timeout()).context("Failed to build Câmara client")
}

async fn run(command: Command, config: &Config, pool: &sqlx::SqlitePool, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::SyncPartidos { detalhes } => {
            partidos::sync_parties(pool, &camara(config)?, detalhes, out).await?;
        }
        Command::SyncDeputados { detalhes, uf, partido } => {
            let options = deputados::DeputySyncOptions { detalhes, uf, partido };
            deputados::sync_deputies(pool, &camara(config)?, &options, out).await?;
        }
        Command::SyncTiposProposicao => {
            tipos::sync_proposal_types(pool, &camara(config)?, out).await?;
        }
        Command::SyncIbgeLocalidades {
            apenas_regioes,
            apenas_estados,
            apenas_municipios,
        } => {
            let ibge = IbgeClient::new(&config.ibge_api_base_url, config.http_timeout())
                .context("Failed to build IBGE client")?;
            let phases = localidades::LocalityPhases {
                regioes: apenas_regioes,
                estados: apenas_estados,
                municipios: apenas_municipios,
            };
            localidades::sync_localities(pool, &ibge, phases, out).await?;
        }
        Command::SyncProposicoes {
            ano,
            sigla_tipo,
            limite,
            votacoes,
        } => {
            let options = proposicoes::ProposalSyncOptions {
                ano,
                sigla_tipo,
                limite,
                votacoes,
            };
            proposicoes::sync_proposals(pool, &camara(config)?, &options, out).await?;
        }
        Command::SyncDiscursos { deputado, inicio, fim } => {
            let options = discursos::SpeechSyncOptions { deputado, inicio, fim };
            discursos::sync_speeches(pool, &camara(config)?, &options, out).await?;
        }
        Command::MigrateTiposProposicao { dry_run } => {
            migrate::migrate_proposal_types(pool, dry_run, out).await?;
        }
        Command::PopulateSexo { force } => {
            let ai = AnalysisService::from_config(config).context("Failed to build AI client")?;
            sexo::populate_genders(pool, &ai, force, out).await?;
        }
        Command::CreateSampleNews => {
            sample_news::create_sample_news(pool, out).await?;
        }
        Command::Analisar {
            proposicoes,
            discursos,
            embeddings,
        } => {
            let ai = AnalysisService::from_config(config).context("Failed to build AI client")?;
            let options = analisar::AnalysisOptions {
                proposicoes,
                discursos,
                embeddings,
            };
            analisar::run_analysis(pool, &ai, &options, out).await?;
        }
        Command::AtualizarPerfis => {
            dashboard::refresh_profiles(pool, out).await?;
        }
        Command::GerarRelatorios { periodo, ate } => {
            let data_fim = ate.unwrap_or_else(|| Local::now().date_naive());
            dashboard::generate_reports(pool, periodo, data_fim, out).await?;
        }
        Command::CreateUser {
            username,
            email,
            password,
            staff,
            superuser,
        } => {
            let user = NewUser {
                username,
                email,
                password,
                is_staff: staff || superuser,
                is_superuser: superuser,
            };
            users::create_user_command(pool, &user, out).await?;
        }
        Command::AddTeam {
            nome,
            descricao,
            coordenador,
            membros,
        } => {
            users::add_team_command(pool, &nome, &descricao, coordenador.as_deref(), &membros, out).await?;
        }
    }
    Ok(())
}
