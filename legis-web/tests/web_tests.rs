//! Integration tests for legis-web pages
//!
//! Each test builds the router on an in-memory database and drives it with
//! `oneshot` requests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{NaiveDate, Utc};
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use tower::util::ServiceExt;

use legis_common::ai::{AnalysisService, ChatModel, ChatRequest};
use legis_common::config::{CliOverrides, Config, TomlConfig};
use legis_common::db::analyses::{insert_impact_analysis, insert_summary, upsert_embedding, NewImpactAnalysis, NewSummary};
use legis_common::db::dashboard::{generate_activity_report, load_profile};
use legis_common::db::deputies::{load_deputy, upsert_deputy, DeputySummary};
use legis_common::db::geography::{upsert_region, upsert_uf, Region, Uf};
use legis_common::db::init_memory_database;
use legis_common::db::news::{create_news, NewNews};
use legis_common::db::parties::{find_party_by_sigla, upsert_party, PartySummary};
use legis_common::db::proposals::{upsert_proposal, upsert_proposal_type, ProposalRecord};
use legis_common::db::tasks::{add_team_member, create_team};
use legis_common::db::users::{create_user, NewUser, User};
use legis_common::db::votings::{load_voting, record_vote, refresh_voting_totals, upsert_voting, VotingRecord};
use legis_common::db::{ImpactLevel, NewsStatus, ReportPeriod, VoteChoice};
use legis_web::{build_router, AppState};

/// Test helper: app on an empty in-memory database with AI disabled
async fn create_test_app() -> (Router, SqlitePool) {
    create_test_app_with_ai(AnalysisService::disabled()).await
}

async fn create_test_app_with_ai(ai: AnalysisService) -> (Router, SqlitePool) {
    let pool = init_memory_database()
        .await
        .expect("Failed to create in-memory database");
    let config = Config::from_sources(TomlConfig::default(), |_| None, &CliOverrides::default())
        .expect("Default configuration must load");
    let app = build_router(AppState::new(pool.clone(), config, ai));
    (app, pool)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn get_as(app: &Router, uri: &str, username: &str, password: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth(username, password))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

/// 25 deputies from RO: 13 in PT (odd numbers) and 12 in PL
async fn seed_deputies(pool: &SqlitePool) {
    upsert_region(
        pool,
        &Region {
            id: 1,
            sigla: "N".to_string(),
            nome: "Norte".to_string(),
        },
    )
    .await
    .unwrap();
    upsert_uf(
        pool,
        &Uf {
            id: 11,
            sigla: "RO".to_string(),
            nome: "Rondônia".to_string(),
            region_id: 1,
        },
    )
    .await
    .unwrap();

    for (id_partido, sigla, nome) in [(36844, "PT", "Partido dos Trabalhadores"), (37908, "PL", "Partido Liberal")] {
        upsert_party(
            pool,
            &PartySummary {
                id_partido,
                sigla: sigla.to_string(),
                nome: nome.to_string(),
                uri: String::new(),
            },
        )
        .await
        .unwrap();
    }
    let pt = find_party_by_sigla(pool, "PT").await.unwrap().unwrap();
    let pl = find_party_by_sigla(pool, "PL").await.unwrap().unwrap();

    for i in 1..=25 {
        let party = if i % 2 == 1 { &pt } else { &pl };
        upsert_deputy(
            pool,
            &DeputySummary {
                id_deputado: 1000 + i,
                nome: format!("Deputado {:02}", i),
                sigla_partido: party.sigla.clone(),
                uf_representacao_id: Some(11),
                partido_id: Some(party.id),
                ..DeputySummary::default()
            },
        )
        .await
        .unwrap();
    }
}

async fn seed_proposal_type(pool: &SqlitePool) -> i64 {
    upsert_proposal_type(pool, "139", "PL", "Projeto de Lei", "Proposição de lei ordinária")
        .await
        .unwrap();
    sqlx::query_scalar("SELECT id FROM proposal_types WHERE cod = '139'")
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn seed_proposal(pool: &SqlitePool, tipo_id: i64, id_proposicao: i64, numero: i64, ementa: &str) -> i64 {
    upsert_proposal(
        pool,
        &ProposalRecord {
            id_proposicao,
            tipo_id: Some(tipo_id),
            tipo_legado: "PL".to_string(),
            numero,
            ano: 2024,
            ementa: ementa.to_string(),
            ementa_detalhada: String::new(),
            data_apresentacao: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            status_proposicao: "Aguardando parecer".to_string(),
            autor_id: None,
            url_inteiro_teor: String::new(),
            url_tramitacao: String::new(),
        },
    )
    .await
    .unwrap();
    sqlx::query_scalar("SELECT id FROM proposals WHERE id_proposicao = ?")
        .bind(id_proposicao)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn seed_user(pool: &SqlitePool, username: &str, is_staff: bool) -> User {
    create_user(
        pool,
        &NewUser {
            username: username.to_string(),
            email: format!("{}@example.org", username),
            password: "senha123".to_string(),
            is_staff,
            ..NewUser::default()
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _pool) = create_test_app().await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "legis-web");
    assert_eq!(json["ai_enabled"], false);
}

#[tokio::test]
async fn test_deputy_list_filters_and_paginates() {
    let (app, pool) = create_test_app().await;
    seed_deputies(&pool).await;

    let (status, body) = get(&app, "/deputados/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Página 1 de 2 (25 itens)"));
    assert!(body.contains("Deputado 01"));

    let (_, body) = get(&app, "/deputados/?partido=PL").await;
    assert!(body.contains("(12 itens)"));

    let (_, body) = get(&app, "/deputados/?uf=RO&partido=PT").await;
    assert!(body.contains("(13 itens)"));
}

#[tokio::test]
async fn test_out_of_range_page_is_clamped() {
    let (app, pool) = create_test_app().await;
    seed_deputies(&pool).await;

    let (status, body) = get(&app, "/deputados/?page=99").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Página 2 de 2"));

    let (status, body) = get(&app, "/deputados/?page=abc").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Página 1 de 2"));
}

#[tokio::test]
async fn test_unknown_deputy_and_route_are_404() {
    let (app, _pool) = create_test_app().await;

    let (status, body) = get(&app, "/deputados/999999/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Deputado não encontrado(a)."));

    let (status, _) = get(&app, "/nao-existe/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_proposal_pages() {
    let (app, pool) = create_test_app().await;
    let tipo_id = seed_proposal_type(&pool).await;
    seed_proposal(&pool, tipo_id, 2_400_001, 1, "Dispõe sobre a saúde pública").await;

    let (status, body) = get(&app, "/proposicoes/2400001/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("PL 1/2024"));

    let (status, body) = get(&app, "/proposicoes/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("PL 1/2024"));

    let (status, _) = get(&app, "/proposicoes/?situacao=INEXISTENTE").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(&app, "/proposicoes/?ano=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("abc"));

    let (status, body) = get(&app, "/proposicoes/?ano=2024").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("PL 1/2024"));

    let (status, body) = get(&app, "/tipos-proposicao/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Projeto de Lei"));
}

#[tokio::test]
async fn test_party_chart_json() {
    let (app, pool) = create_test_app().await;
    seed_deputies(&pool).await;

    let (status, body) = get(&app, "/graficos/partidos.json").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["deputados_por_partido"]["labels"], serde_json::json!(["PT", "PL"]));
    assert_eq!(json["deputados_por_partido"]["data"], serde_json::json!([13, 12]));
    assert_eq!(json["deputados_por_partido"]["colors"].as_array().unwrap().len(), 2);
    assert_eq!(json["total_deputados"], 25);
    assert_eq!(json["total_partidos"], 2);
    assert_eq!(json["maior_partido"]["sigla"], "PT");
    assert_eq!(json["menor_partido"]["sigla"], "PL");
}

#[tokio::test]
async fn test_news_detail_counts_views_and_hides_drafts() {
    let (app, pool) = create_test_app().await;

    let mut published = NewNews::new("Câmara aprova orçamento", "Texto da notícia");
    published.slug = "camara-aprova-orcamento".to_string();
    published.status = NewsStatus::Publicada;
    published.data_publicacao = Some(Utc::now().naive_utc());
    create_news(&pool, &published).await.unwrap();

    let mut draft = NewNews::new("Rascunho interno", "Ainda não revisado");
    draft.slug = "rascunho-interno".to_string();
    create_news(&pool, &draft).await.unwrap();

    let (status, _) = get(&app, "/noticia/camara-aprova-orcamento/").await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = get(&app, "/noticia/camara-aprova-orcamento/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("2 visualizações"));

    let (status, _) = get(&app, "/noticia/rascunho-interno/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get(&app, "/noticias/").await;
    assert!(body.contains("Câmara aprova orçamento"));
    assert!(!body.contains("Rascunho interno"));
}

#[tokio::test]
async fn test_task_pages_require_login() {
    let (app, pool) = create_test_app().await;
    seed_user(&pool, "ana", false).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/gestao/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

    let (status, body) = get_as(&app, "/gestao/", "ana", "senha123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Olá, ana."));

    let (status, _) = get_as(&app, "/gestao/", "ana", "errada").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_task_redirects_to_detail() {
    let (app, pool) = create_test_app().await;
    let ana = seed_user(&pool, "ana", false).await;
    let team = create_team(&pool, "Saúde", "Acompanha a pauta da saúde", Some(ana.id))
        .await
        .unwrap();
    add_team_member(&pool, team.id, ana.id).await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/tarefas/")
        .header(header::AUTHORIZATION, basic_auth("ana", "senha123"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "titulo=Revisar+parecer&descricao=Ler+o+substitutivo&equipe={}&prioridade=ALTA",
            team.id
        )))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with("/tarefas/"));

    let (status, body) = get_as(&app, &location, "ana", "senha123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Revisar parecer"));

    let (_, body) = get_as(&app, "/tarefas/", "ana", "senha123").await;
    assert!(body.contains("Revisar parecer"));
}

#[tokio::test]
async fn test_team_detail_is_members_only() {
    let (app, pool) = create_test_app().await;
    let ana = seed_user(&pool, "ana", false).await;
    seed_user(&pool, "bruno", false).await;
    let team = create_team(&pool, "Educação", "", Some(ana.id)).await.unwrap();
    add_team_member(&pool, team.id, ana.id).await.unwrap();

    let uri = format!("/equipes/{}/", team.id);
    let (status, body) = get_as(&app, &uri, "ana", "senha123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Educação"));

    let (status, _) = get_as(&app, &uri, "bruno", "senha123").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_requires_staff() {
    let (app, pool) = create_test_app().await;
    seed_deputies(&pool).await;
    seed_user(&pool, "ana", false).await;
    seed_user(&pool, "carla", true).await;

    let (status, _) = get(&app, "/admin/").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get_as(&app, "/admin/", "ana", "senha123").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = get_as(&app, "/admin/", "carla", "senha123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("/admin/deputados/"));

    let (status, body) = get_as(&app, "/admin/deputados/?q=Deputado+01", "carla", "senha123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Deputado 01"));
    assert!(!body.contains("Deputado 02"));

    let (status, _) = get_as(&app, "/admin/inexistente/", "carla", "senha123").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_semantic_search_falls_back_to_text() {
    let (app, pool) = create_test_app().await;
    let tipo_id = seed_proposal_type(&pool).await;
    seed_proposal(&pool, tipo_id, 2_400_001, 1, "Dispõe sobre a saude indígena").await;
    seed_proposal(&pool, tipo_id, 2_400_002, 2, "Altera o código de trânsito").await;

    let (status, body) = get(&app, "/ia/busca-semantica/?q=saude").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Busca textual (IA não configurada)"));
    assert!(body.contains("PL 1/2024"));
    assert!(!body.contains("PL 2/2024"));
}

/// Embeds every query as the unit vector on the second axis
struct FixedEmbedding;

#[async_trait]
impl ChatModel for FixedEmbedding {
    async fn complete(&self, _request: ChatRequest) -> legis_common::Result<String> {
        Ok(String::new())
    }

    async fn embed(&self, _model: &str, _text: &str) -> legis_common::Result<Vec<f32>> {
        Ok(vec![0.0, 1.0])
    }
}

#[tokio::test]
async fn test_semantic_search_ranks_by_similarity() {
    let ai = AnalysisService::new(Some(Arc::new(FixedEmbedding)), "gpt-3.5-turbo", "text-embedding-ada-002");
    let (app, pool) = create_test_app_with_ai(ai).await;
    let tipo_id = seed_proposal_type(&pool).await;
    let far = seed_proposal(&pool, tipo_id, 2_400_010, 10, "Proposta distante").await;
    let near = seed_proposal(&pool, tipo_id, 2_400_020, 20, "Proposta próxima").await;
    upsert_embedding(&pool, far, &[1.0, 0.0], "Proposta distante", "text-embedding-ada-002")
        .await
        .unwrap();
    upsert_embedding(&pool, near, &[0.0, 1.0], "Proposta próxima", "text-embedding-ada-002")
        .await
        .unwrap();

    let (status, body) = get(&app, "/ia/busca-semantica/?q=qualquer").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Busca por similaridade semântica"));

    let near_pos = body.find("PL 20/2024").expect("closest proposal listed");
    if let Some(far_pos) = body.find("PL 10/2024") {
        assert!(near_pos < far_pos);
    }
}

#[tokio::test]
async fn test_voting_detail_shows_votes_and_totals() {
    let (app, pool) = create_test_app().await;
    seed_deputies(&pool).await;
    let tipo_id = seed_proposal_type(&pool).await;
    let proposal_id = seed_proposal(&pool, tipo_id, 2_400_001, 1, "Dispõe sobre a saúde pública").await;

    upsert_voting(
        &pool,
        &VotingRecord {
            id_votacao: "2400001-5".to_string(),
            proposal_id,
            data: NaiveDate::from_ymd_opt(2024, 5, 14).unwrap().and_hms_opt(19, 2, 41).unwrap(),
            descricao: "Aprovado o requerimento de urgência".to_string(),
            tipo_votacao: String::new(),
            aprovacao: Some(true),
            votos_sim: 0,
            votos_nao: 0,
            votos_abstencao: 0,
        },
    )
    .await
    .unwrap();
    let voting = load_voting(&pool, "2400001-5").await.unwrap().unwrap();
    for (id_deputado, choice) in [(1001, VoteChoice::Sim), (1002, VoteChoice::Nao), (1003, VoteChoice::Sim)] {
        let deputy = load_deputy(&pool, id_deputado).await.unwrap().unwrap();
        record_vote(&pool, voting.id, deputy.id, choice).await.unwrap();
    }
    refresh_voting_totals(&pool, voting.id).await.unwrap();

    let (status, body) = get(&app, "/votacoes/2400001-5/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Votação 2400001-5 - 14/05/2024"));
    assert!(body.contains("Aprovado o requerimento de urgência"));
    assert!(body.contains("PL 1/2024"));
    assert!(body.contains("<strong>2</strong>Sim"));
    assert!(body.contains("<strong>1</strong>Não"));
    assert!(body.contains("Deputado 02"));

    let (status, _) = get(&app, "/votacoes/9999-1/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ai_listings_and_impact_level_filter() {
    let (app, pool) = create_test_app().await;
    let tipo_id = seed_proposal_type(&pool).await;
    let first = seed_proposal(&pool, tipo_id, 2_400_001, 1, "Dispõe sobre a saúde pública").await;
    let second = seed_proposal(&pool, tipo_id, 2_400_002, 2, "Altera o código de trânsito").await;

    insert_summary(
        &pool,
        &NewSummary {
            proposal_id: first,
            resumo: "Amplia o atendimento básico".to_string(),
            resumo_executivo: "Mais postos de saúde".to_string(),
            principais_pontos: vec!["Postos".to_string()],
            modelo_ia: "gpt-3.5-turbo".to_string(),
        },
    )
    .await
    .unwrap();
    for (proposal_id, nivel, descricao) in [
        (first, ImpactLevel::Alto, "Afeta o orçamento da saúde"),
        (second, ImpactLevel::Baixo, "Ajuste de redação"),
    ] {
        insert_impact_analysis(
            &pool,
            &NewImpactAnalysis {
                proposal_id,
                nivel_impacto: nivel,
                descricao_impacto: descricao.to_string(),
                areas_afetadas: vec![],
                stakeholders: vec![],
                impacto_economico: String::new(),
                impacto_social: String::new(),
                impacto_ambiental: String::new(),
                impacto_juridico: String::new(),
                modelo_ia: "gpt-3.5-turbo".to_string(),
            },
        )
        .await
        .unwrap();
    }

    let (status, body) = get(&app, "/ia/resumos/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Amplia o atendimento básico"));
    assert!(body.contains("PL 1/2024"));

    let (status, body) = get(&app, "/ia/analises-impacto/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Afeta o orçamento da saúde"));
    assert!(body.contains("Ajuste de redação"));

    let (status, body) = get(&app, "/ia/analises-impacto/?nivel=ALTO").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Afeta o orçamento da saúde"));
    assert!(!body.contains("Ajuste de redação"));

    let (status, _) = get(&app, "/ia/analises-impacto/?nivel=EXTREMO").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_is_created_on_first_visit() {
    let (app, pool) = create_test_app().await;
    seed_deputies(&pool).await;
    let deputy = load_deputy(&pool, 1001).await.unwrap().unwrap();
    assert!(load_profile(&pool, deputy.id).await.unwrap().is_none());

    let (status, body) = get(&app, "/painel/perfil/1001/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Deputado 01"));
    assert!(body.contains("Nenhum relatório gerado."));
    assert!(load_profile(&pool, deputy.id).await.unwrap().is_some());

    // A second visit reuses the stored profile
    let (status, _) = get(&app, "/painel/perfil/1001/").await;
    assert_eq!(status, StatusCode::OK);
    let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM parliamentary_profiles")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(profiles, 1);

    let (status, _) = get(&app, "/painel/perfil/999999/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reports_page_lists_generated_reports() {
    let (app, pool) = create_test_app().await;
    seed_deputies(&pool).await;

    let (status, body) = get(&app, "/painel/relatorios/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Nenhum relatório gerado."));

    let deputy = load_deputy(&pool, 1002).await.unwrap().unwrap();
    let data_fim = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    generate_activity_report(&pool, deputy.id, ReportPeriod::Mensal, data_fim)
        .await
        .unwrap();

    let (status, body) = get(&app, "/painel/relatorios/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Deputado 02"));
    assert!(body.contains("Mensal"));
    assert!(body.contains("a 30/06/2024"));
    assert!(!body.contains("Nenhum relatório gerado."));
}
