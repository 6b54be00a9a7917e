//! IBGE locality sync against a mock API

use std::time::Duration;

use legis_common::db::geography::{count_geography, list_capitals};
use legis_common::db::init_memory_database;
use legis_sync::clients::IbgeClient;
use legis_sync::commands::localidades::{sync_localities, LocalityPhases};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mock_ibge() -> MockServer {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/regioes",
        json!([{"id": 1, "sigla": "N", "nome": "Norte"}]),
    )
    .await;
    mount_json(
        &server,
        "/estados",
        json!([
            {"id": 11, "sigla": "RO", "nome": "Rondônia", "regiao": {"id": 1, "sigla": "N", "nome": "Norte"}},
            {"id": 35, "sigla": "SP", "nome": "São Paulo", "regiao": {"id": 3, "sigla": "SE", "nome": "Sudeste"}}
        ]),
    )
    .await;
    mount_json(
        &server,
        "/municipios",
        json!([
            {"id": 1100205, "nome": "Porto Velho"},
            {"id": 1100015, "nome": "Alta Floresta D'Oeste"},
            {"id": 3550308, "nome": "São Paulo"}
        ]),
    )
    .await;
    server
}

#[tokio::test]
async fn test_full_sync_skips_orphans() {
    let server = mock_ibge().await;
    let client = IbgeClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let pool = init_memory_database().await.unwrap();

    let mut out = Vec::new();
    let summary = sync_localities(&pool, &client, LocalityPhases::default(), &mut out)
        .await
        .unwrap();

    assert_eq!(summary.regions.created, 1);
    assert_eq!(summary.states.created, 1);
    assert_eq!(summary.states.errors, 1);
    assert_eq!(summary.municipalities.created, 2);
    assert_eq!(summary.municipalities.errors, 1);

    let counts = count_geography(&pool).await.unwrap();
    assert_eq!((counts.regions, counts.ufs, counts.municipalities, counts.capitals), (1, 1, 2, 1));

    let capitals = list_capitals(&pool).await.unwrap();
    assert_eq!(capitals[0].0.nome, "Porto Velho");

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Região 3 não encontrada para o estado São Paulo"));
    assert!(text.contains("Estado 35 não encontrado para o município São Paulo"));
    assert!(text.ends_with("Sincronização concluída com sucesso!\n"));
}

#[tokio::test]
async fn test_single_phase_and_failed_phase() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/regioes"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let client = IbgeClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let pool = init_memory_database().await.unwrap();

    let phases = LocalityPhases {
        regioes: true,
        ..Default::default()
    };
    let mut out = Vec::new();
    let summary = sync_localities(&pool, &client, phases, &mut out).await.unwrap();

    assert_eq!(summary.regions.processed(), 0);
    assert_eq!(summary.states.processed(), 0);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Erro ao obter regiões da API do IBGE"));
    assert!(!text.contains("Sincronizando estados"));
}
