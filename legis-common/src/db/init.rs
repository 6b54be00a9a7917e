//! Database initialization
//!
//! Creates the SQLite file on first run and brings the schema up to date.
//! Every statement is idempotent, so this runs on every start-up.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open (creating if needed) the database file and apply the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema (single connection)
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Apply every CREATE TABLE / CREATE INDEX statement
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Names of all tables created by [`create_schema`]
pub async fn list_tables(pool: &SqlitePool) -> Result<Vec<String>> {
    let names = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(names)
}

const SCHEMA: &[&str] = &[
    // Geography (IBGE)
    r#"
    CREATE TABLE IF NOT EXISTS regions (
        id INTEGER PRIMARY KEY,
        sigla TEXT NOT NULL UNIQUE,
        nome TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ufs (
        id INTEGER PRIMARY KEY,
        sigla TEXT NOT NULL UNIQUE,
        nome TEXT NOT NULL,
        region_id INTEGER NOT NULL REFERENCES regions(id) ON DELETE RESTRICT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS municipalities (
        id INTEGER PRIMARY KEY,
        nome TEXT NOT NULL,
        uf_id INTEGER NOT NULL REFERENCES ufs(id) ON DELETE RESTRICT,
        is_capital INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_municipalities_one_capital ON municipalities(uf_id) WHERE is_capital = 1",
    "CREATE INDEX IF NOT EXISTS idx_municipalities_nome ON municipalities(nome)",
    // Reference data
    r#"
    CREATE TABLE IF NOT EXISTS genders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sigla TEXT NOT NULL UNIQUE,
        nome TEXT NOT NULL,
        descricao TEXT NOT NULL DEFAULT '',
        slug TEXT NOT NULL UNIQUE,
        nome_anterior TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS parties (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        id_partido INTEGER NOT NULL UNIQUE,
        sigla TEXT NOT NULL,
        nome TEXT NOT NULL,
        uri TEXT NOT NULL DEFAULT '',
        status_data TIMESTAMP,
        status_situacao TEXT NOT NULL DEFAULT '',
        status_total_posse INTEGER,
        status_total_membros INTEGER,
        status_id_legislatura INTEGER,
        numero_eleitoral INTEGER,
        url_logo TEXT NOT NULL DEFAULT '',
        url_website TEXT NOT NULL DEFAULT '',
        url_facebook TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_parties_sigla ON parties(sigla)",
    r#"
    CREATE TABLE IF NOT EXISTS proposal_types (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        cod TEXT NOT NULL UNIQUE,
        sigla TEXT NOT NULL,
        nome TEXT NOT NULL,
        descricao TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_proposal_types_sigla ON proposal_types(sigla)",
    // Legislative activity
    r#"
    CREATE TABLE IF NOT EXISTS deputies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        id_deputado INTEGER NOT NULL UNIQUE,
        nome TEXT NOT NULL,
        nome_civil TEXT NOT NULL DEFAULT '',
        cpf TEXT NOT NULL DEFAULT '',
        sexo_id INTEGER REFERENCES genders(id) ON DELETE SET NULL,
        data_nascimento DATE,
        municipio_nascimento_id INTEGER REFERENCES municipalities(id) ON DELETE SET NULL,
        uf_nascimento_id INTEGER REFERENCES ufs(id) ON DELETE SET NULL,
        sigla_partido TEXT NOT NULL DEFAULT '',
        partido_id INTEGER REFERENCES parties(id) ON DELETE SET NULL,
        uf_representacao_id INTEGER REFERENCES ufs(id) ON DELETE RESTRICT,
        situacao TEXT NOT NULL DEFAULT '',
        condicao_eleitoral TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        url_website TEXT NOT NULL DEFAULT '',
        url_foto TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_deputies_nome ON deputies(nome)",
    "CREATE INDEX IF NOT EXISTS idx_deputies_sigla_partido ON deputies(sigla_partido)",
    r#"
    CREATE TABLE IF NOT EXISTS proposals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        id_proposicao INTEGER NOT NULL UNIQUE,
        tipo_id INTEGER REFERENCES proposal_types(id) ON DELETE RESTRICT,
        tipo_legado TEXT NOT NULL DEFAULT '',
        numero INTEGER NOT NULL,
        ano INTEGER NOT NULL,
        ementa TEXT NOT NULL,
        ementa_detalhada TEXT NOT NULL DEFAULT '',
        data_apresentacao DATE NOT NULL,
        situacao TEXT NOT NULL DEFAULT 'EM_TRAMITACAO'
            CHECK (situacao IN ('EM_TRAMITACAO', 'APROVADA', 'REJEITADA', 'ARQUIVADA', 'RETIRADA')),
        status_proposicao TEXT NOT NULL DEFAULT '',
        autor_id INTEGER REFERENCES deputies(id) ON DELETE SET NULL,
        url_inteiro_teor TEXT NOT NULL DEFAULT '',
        url_tramitacao TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_proposals_data ON proposals(data_apresentacao)",
    "CREATE INDEX IF NOT EXISTS idx_proposals_autor ON proposals(autor_id)",
    r#"
    CREATE TABLE IF NOT EXISTS votings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        id_votacao TEXT NOT NULL UNIQUE,
        proposal_id INTEGER NOT NULL REFERENCES proposals(id) ON DELETE CASCADE,
        data TIMESTAMP NOT NULL,
        descricao TEXT NOT NULL,
        tipo_votacao TEXT NOT NULL DEFAULT '',
        aprovacao INTEGER,
        votos_sim INTEGER NOT NULL DEFAULT 0,
        votos_nao INTEGER NOT NULL DEFAULT 0,
        votos_abstencao INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS deputy_votes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        voting_id INTEGER NOT NULL REFERENCES votings(id) ON DELETE CASCADE,
        deputy_id INTEGER NOT NULL REFERENCES deputies(id) ON DELETE CASCADE,
        voto TEXT NOT NULL
            CHECK (voto IN ('SIM', 'NAO', 'ABSTENCAO', 'OBSTRUCAO', 'AUSENTE')),
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (voting_id, deputy_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS speeches (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        id_discurso TEXT NOT NULL UNIQUE,
        deputy_id INTEGER NOT NULL REFERENCES deputies(id) ON DELETE CASCADE,
        data TIMESTAMP NOT NULL,
        tipo_discurso TEXT NOT NULL DEFAULT '',
        transcricao TEXT NOT NULL,
        sumario TEXT NOT NULL DEFAULT '',
        url_audio TEXT NOT NULL DEFAULT '',
        url_video TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    // AI analysis
    r#"
    CREATE TABLE IF NOT EXISTS ai_summaries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        proposal_id INTEGER NOT NULL REFERENCES proposals(id) ON DELETE CASCADE,
        resumo TEXT NOT NULL,
        resumo_executivo TEXT NOT NULL DEFAULT '',
        principais_pontos TEXT NOT NULL DEFAULT '[]',
        modelo_ia TEXT NOT NULL DEFAULT 'gpt-4o-mini',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS impact_analyses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        proposal_id INTEGER NOT NULL REFERENCES proposals(id) ON DELETE CASCADE,
        nivel_impacto TEXT NOT NULL
            CHECK (nivel_impacto IN ('BAIXO', 'MEDIO', 'ALTO', 'CRITICO')),
        descricao_impacto TEXT NOT NULL,
        areas_afetadas TEXT NOT NULL DEFAULT '[]',
        stakeholders TEXT NOT NULL DEFAULT '[]',
        impacto_economico TEXT NOT NULL DEFAULT '',
        impacto_social TEXT NOT NULL DEFAULT '',
        impacto_ambiental TEXT NOT NULL DEFAULT '',
        impacto_juridico TEXT NOT NULL DEFAULT '',
        modelo_ia TEXT NOT NULL DEFAULT 'gpt-4o-mini',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS semantic_index (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        proposal_id INTEGER NOT NULL UNIQUE REFERENCES proposals(id) ON DELETE CASCADE,
        embedding TEXT NOT NULL,
        texto_indexado TEXT NOT NULL,
        modelo_embedding TEXT NOT NULL DEFAULT 'text-embedding-ada-002',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS speech_analyses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        speech_id INTEGER NOT NULL REFERENCES speeches(id) ON DELETE CASCADE,
        sentimento TEXT NOT NULL DEFAULT '',
        temas_principais TEXT NOT NULL DEFAULT '[]',
        entidades_mencionadas TEXT NOT NULL DEFAULT '[]',
        resumo TEXT NOT NULL DEFAULT '',
        modelo_ia TEXT NOT NULL DEFAULT 'gpt-4o-mini',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    // Accounts
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL DEFAULT '',
        password_hash TEXT NOT NULL DEFAULT '',
        password_salt TEXT NOT NULL DEFAULT '',
        is_staff INTEGER NOT NULL DEFAULT 0,
        is_superuser INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    // News portal
    r#"
    CREATE TABLE IF NOT EXISTS news_categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nome TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        descricao TEXT NOT NULL DEFAULT '',
        cor TEXT NOT NULL DEFAULT '#007bff',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS news (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        titulo TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        subtitulo TEXT NOT NULL DEFAULT '',
        conteudo TEXT NOT NULL,
        resumo TEXT NOT NULL DEFAULT '',
        categoria_id INTEGER REFERENCES news_categories(id) ON DELETE SET NULL,
        autor_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
        imagem_destaque TEXT,
        credito_imagem TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'RASCUNHO'
            CHECK (status IN ('RASCUNHO', 'PUBLICADA', 'ARQUIVADA')),
        destaque INTEGER NOT NULL DEFAULT 0,
        meta_descricao TEXT NOT NULL DEFAULT '',
        meta_keywords TEXT NOT NULL DEFAULT '',
        visualizacoes INTEGER NOT NULL DEFAULT 0,
        data_publicacao TIMESTAMP,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS news_proposals (
        news_id INTEGER NOT NULL REFERENCES news(id) ON DELETE CASCADE,
        proposal_id INTEGER NOT NULL REFERENCES proposals(id) ON DELETE CASCADE,
        PRIMARY KEY (news_id, proposal_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS news_deputies (
        news_id INTEGER NOT NULL REFERENCES news(id) ON DELETE CASCADE,
        deputy_id INTEGER NOT NULL REFERENCES deputies(id) ON DELETE CASCADE,
        PRIMARY KEY (news_id, deputy_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS news_tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nome TEXT NOT NULL UNIQUE,
        slug TEXT NOT NULL UNIQUE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS news_tag_links (
        tag_id INTEGER NOT NULL REFERENCES news_tags(id) ON DELETE CASCADE,
        news_id INTEGER NOT NULL REFERENCES news(id) ON DELETE CASCADE,
        PRIMARY KEY (tag_id, news_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS news_comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        news_id INTEGER NOT NULL REFERENCES news(id) ON DELETE CASCADE,
        autor_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        texto TEXT NOT NULL,
        aprovado INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    // Task management
    r#"
    CREATE TABLE IF NOT EXISTS teams (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nome TEXT NOT NULL,
        descricao TEXT NOT NULL DEFAULT '',
        coordenador_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS team_members (
        team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        PRIMARY KEY (team_id, user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        titulo TEXT NOT NULL,
        descricao TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'PENDENTE'
            CHECK (status IN ('PENDENTE', 'EM_ANDAMENTO', 'EM_REVISAO', 'CONCLUIDA', 'CANCELADA')),
        prioridade TEXT NOT NULL DEFAULT 'MEDIA'
            CHECK (prioridade IN ('BAIXA', 'MEDIA', 'ALTA', 'URGENTE')),
        team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
        responsavel_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
        criada_por_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
        proposal_id INTEGER REFERENCES proposals(id) ON DELETE SET NULL,
        data_inicio DATE,
        data_fim_prevista DATE,
        data_conclusao DATE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS task_comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
        autor_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        texto TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS task_attachments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
        arquivo TEXT NOT NULL,
        nome_arquivo TEXT NOT NULL,
        uploaded_by_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    // Parliamentary dashboard
    r#"
    CREATE TABLE IF NOT EXISTS parliamentary_profiles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        deputy_id INTEGER NOT NULL UNIQUE REFERENCES deputies(id) ON DELETE CASCADE,
        total_votacoes INTEGER NOT NULL DEFAULT 0,
        presenca_votacoes REAL NOT NULL DEFAULT 0.0,
        votos_sim INTEGER NOT NULL DEFAULT 0,
        votos_nao INTEGER NOT NULL DEFAULT 0,
        votos_abstencao INTEGER NOT NULL DEFAULT 0,
        total_proposicoes INTEGER NOT NULL DEFAULT 0,
        proposicoes_aprovadas INTEGER NOT NULL DEFAULT 0,
        proposicoes_em_tramitacao INTEGER NOT NULL DEFAULT 0,
        total_discursos INTEGER NOT NULL DEFAULT 0,
        tempo_total_discurso INTEGER NOT NULL DEFAULT 0,
        areas_atuacao TEXT NOT NULL DEFAULT '[]',
        temas_frequentes TEXT NOT NULL DEFAULT '[]',
        ultima_atualizacao TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS activity_reports (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        deputy_id INTEGER NOT NULL REFERENCES deputies(id) ON DELETE CASCADE,
        periodo TEXT NOT NULL
            CHECK (periodo IN ('SEMANAL', 'MENSAL', 'TRIMESTRAL', 'ANUAL')),
        data_inicio DATE NOT NULL,
        data_fim DATE NOT NULL,
        proposicoes_apresentadas INTEGER NOT NULL DEFAULT 0,
        votacoes_participadas INTEGER NOT NULL DEFAULT 0,
        discursos_realizados INTEGER NOT NULL DEFAULT 0,
        principais_atuacoes TEXT NOT NULL DEFAULT '[]',
        destaque_periodo TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS deputy_comparisons (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nome TEXT NOT NULL,
        descricao TEXT NOT NULL DEFAULT '',
        criterios TEXT NOT NULL DEFAULT '[]',
        resultados TEXT NOT NULL DEFAULT '{}',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS deputy_comparison_members (
        comparison_id INTEGER NOT NULL REFERENCES deputy_comparisons(id) ON DELETE CASCADE,
        deputy_id INTEGER NOT NULL REFERENCES deputies(id) ON DELETE CASCADE,
        PRIMARY KEY (comparison_id, deputy_id)
    )
    "#,
];
