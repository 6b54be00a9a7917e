//! Chamber of Deputies sync commands against a mock API

use std::time::Duration;

use legis_common::db::deputies::{load_deputy, upsert_deputy, DeputySummary};
use legis_common::db::geography::{upsert_region, upsert_uf, Region, Uf};
use legis_common::db::init_memory_database;
use legis_common::db::parties::{count_parties, load_party};
use legis_common::db::proposals::{load_proposal, upsert_proposal_type};
use legis_common::db::speeches::list_speeches_by_deputy;
use legis_common::db::votings::{list_votes_for_voting, load_voting};
use legis_common::db::VoteChoice;
use legis_sync::clients::CamaraClient;
use legis_sync::commands::deputados::{sync_deputies, DeputySyncOptions};
use legis_sync::commands::discursos::{sync_speeches, SpeechSyncOptions};
use legis_sync::commands::partidos::sync_parties;
use legis_sync::commands::proposicoes::{sync_proposals, ProposalSyncOptions};
use legis_sync::commands::tipos::sync_proposal_types;
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> CamaraClient {
    CamaraClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_party_sync_follows_pages_and_keeps_summary_on_detail_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/partidos"))
        .and(query_param_is_missing("pagina"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dados": [{"id": 36844, "sigla": "PT", "nome": "Partido dos Trabalhadores", "uri": "u1"}],
            "links": [{"rel": "next", "href": format!("{}/partidos?pagina=2&itens=100", server.uri())}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/partidos"))
        .and(query_param("pagina", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dados": [{"id": 37906, "sigla": "PL", "nome": "Partido Liberal", "uri": "u2"}],
            "links": []
        })))
        .mount(&server)
        .await;
    mount_json(
        &server,
        "/partidos/36844",
        json!({"dados": {
            "id": 36844, "sigla": "PT", "nome": "Partido dos Trabalhadores",
            "status": {"data": "2025-04-08T14:44", "situacao": "Ativo", "totalPosse": "68",
                       "totalMembros": 67, "idLegislatura": 57},
            "numeroEleitoral": null, "urlLogo": "https://logo/pt.png", "urlWebSite": null,
            "urlFacebook": null
        }}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/partidos/37906"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let pool = init_memory_database().await.unwrap();
    let mut out = Vec::new();
    let counts = sync_parties(&pool, &client(&server), true, &mut out).await.unwrap();

    // PL's detail call fails but its summary is still stored
    assert_eq!(counts.created, 2);
    assert_eq!(counts.errors, 1);
    assert_eq!(count_parties(&pool).await.unwrap(), 2);

    let pt = load_party(&pool, 36844).await.unwrap().unwrap();
    assert_eq!(pt.status_situacao, "Ativo");
    assert_eq!(pt.status_total_posse, Some(68));
    assert_eq!(pt.url_logo, "https://logo/pt.png");
    assert!(pt.status_data.is_some());

    let pl = load_party(&pool, 37906).await.unwrap().unwrap();
    assert_eq!(pl.nome, "Partido Liberal");
    assert_eq!(pl.status_situacao, "");
    assert_eq!(pl.status_data, None);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("[1/2] Processando PT... ✓ Criado\n"));
    assert!(text.contains("[2/2] Processando PL... ✓ Criado (sem detalhes:"));

    // Without details both are only updated and PT keeps its details
    let counts = sync_parties(&pool, &client(&server), false, &mut Vec::new()).await.unwrap();
    assert_eq!((counts.created, counts.updated, counts.errors), (0, 2, 0));
    let pt = load_party(&pool, 36844).await.unwrap().unwrap();
    assert_eq!(pt.status_situacao, "Ativo");
}

#[tokio::test]
async fn test_pagination_stops_on_repeated_next_link() {
    let server = MockServer::start().await;
    let second = format!("{}/partidos?pagina=2&itens=100", server.uri());

    Mock::given(method("GET"))
        .and(path("/partidos"))
        .and(query_param_is_missing("pagina"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dados": [{"id": 36844, "sigla": "PT", "nome": "Partido dos Trabalhadores", "uri": "u1"}],
            "links": [{"rel": "next", "href": second}]
        })))
        .mount(&server)
        .await;
    // The second page points back at itself
    Mock::given(method("GET"))
        .and(path("/partidos"))
        .and(query_param("pagina", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dados": [{"id": 37906, "sigla": "PL", "nome": "Partido Liberal", "uri": "u2"}],
            "links": [{"rel": "self", "href": second}, {"rel": "next", "href": second}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let parties = client(&server).list_parties_all(&[]).await.unwrap();
    let siglas: Vec<&str> = parties.iter().map(|p| p.sigla.as_str()).collect();
    assert_eq!(siglas, vec!["PT", "PL"]);
}

#[tokio::test]
async fn test_deputy_detail_failure_keeps_summary() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/deputados",
        json!({"dados": [
            {"id": 204554, "nome": "Ana Souza", "siglaPartido": "PT", "siglaUf": "", "email": null, "urlFoto": null}
        ], "links": []}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/deputados/204554"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let pool = init_memory_database().await.unwrap();
    let options = DeputySyncOptions {
        detalhes: true,
        ..Default::default()
    };
    let mut out = Vec::new();
    let counts = sync_deputies(&pool, &client(&server), &options, &mut out).await.unwrap();

    assert_eq!((counts.created, counts.errors), (1, 1));
    let deputy = load_deputy(&pool, 204554).await.unwrap().unwrap();
    assert_eq!(deputy.nome, "Ana Souza");
    assert_eq!(deputy.nome_civil, "");
    assert!(String::from_utf8(out).unwrap().contains("(sem detalhes:"));
}

#[tokio::test]
async fn test_party_list_failure_changes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/partidos"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let pool = init_memory_database().await.unwrap();
    let mut out = Vec::new();
    let counts = sync_parties(&pool, &client(&server), false, &mut out).await.unwrap();

    assert_eq!(counts.processed(), 0);
    assert_eq!(count_parties(&pool).await.unwrap(), 0);
    assert!(String::from_utf8(out).unwrap().contains("Erro ao buscar partidos da API"));
}

#[tokio::test]
async fn test_deputy_sync_resolves_uf_and_unknown_party() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/deputados",
        json!({"dados": [
            {"id": 204554, "nome": "Ana Souza", "siglaPartido": "XYZ", "siglaUf": "RO",
             "email": "ana@camara.leg.br", "urlFoto": "https://foto/204554.jpg"}
        ], "links": []}),
    )
    .await;

    let pool = init_memory_database().await.unwrap();
    upsert_region(&pool, &Region { id: 1, sigla: "N".into(), nome: "Norte".into() })
        .await
        .unwrap();
    upsert_uf(&pool, &Uf { id: 11, sigla: "RO".into(), nome: "Rondônia".into(), region_id: 1 })
        .await
        .unwrap();

    let counts = sync_deputies(&pool, &client(&server), &DeputySyncOptions::default(), &mut Vec::new())
        .await
        .unwrap();
    assert_eq!(counts.created, 1);

    let deputy = load_deputy(&pool, 204554).await.unwrap().unwrap();
    assert_eq!(deputy.uf_representacao_id, Some(11));
    assert_eq!(deputy.partido_id, None);
    assert_eq!(deputy.sigla_partido, "XYZ");
}

#[tokio::test]
async fn test_proposal_type_sync_summary() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/referencias/proposicoes/siglaTipo",
        json!({"dados": [
            {"cod": "139", "sigla": "PL", "nome": "Projeto de Lei", "descricao": "Projeto de Lei"},
            {"cod": 136, "sigla": "PEC", "nome": "Proposta de Emenda à Constituição", "descricao": null}
        ], "links": []}),
    )
    .await;

    let pool = init_memory_database().await.unwrap();
    upsert_proposal_type(&pool, "139", "PL", "Projeto", "").await.unwrap();

    let mut out = Vec::new();
    let counts = sync_proposal_types(&pool, &client(&server), &mut out).await.unwrap();
    assert_eq!((counts.created, counts.updated), (1, 1));

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Encontrados 2 tipos de proposição na API"));
    assert!(text.contains("✓ Criado: PEC - Proposta de Emenda à Constituição"));
    assert!(text.contains("  Atualizado: PL - Projeto de Lei"));
    assert!(text.contains("Total processado: 2"));
}

#[tokio::test]
async fn test_proposal_sync_with_votings() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/proposicoes",
        json!({"dados": [
            {"id": 2438277, "siglaTipo": "PL", "codTipo": 139, "numero": 1087, "ano": 2024,
             "ementa": "Altera a legislação do imposto de renda"}
        ], "links": []}),
    )
    .await;
    mount_json(
        &server,
        "/proposicoes/2438277",
        json!({"dados": {
            "id": 2438277, "siglaTipo": "PL", "codTipo": 139, "numero": 1087, "ano": 2024,
            "ementa": "Altera a legislação do imposto de renda", "ementaDetalhada": null,
            "dataApresentacao": "2024-03-18T16:20",
            "statusProposicao": {"descricaoSituacao": "Aguardando Parecer", "descricaoTramitacao": "Recebimento"},
            "urlInteiroTeor": "https://teor/2438277"
        }}),
    )
    .await;
    mount_json(
        &server,
        "/proposicoes/2438277/votacoes",
        json!({"dados": [
            {"id": "2438277-47", "data": "2024-05-14", "dataHoraRegistro": "2024-05-14T19:02:41",
             "descricao": "Aprovado o projeto", "aprovacao": 1}
        ], "links": []}),
    )
    .await;
    mount_json(
        &server,
        "/proposicoes/2438277/autores",
        json!({"dados": [
            {"uri": "https://dadosabertos.camara.leg.br/api/v2/orgaos/180", "nome": "Comissão de Finanças",
             "ordemAssinatura": 1},
            {"uri": format!("{}/deputados/555", server.uri()), "nome": "Fora da base", "ordemAssinatura": 2},
            {"uri": format!("{}/deputados/204554", server.uri()), "nome": "Ana Souza", "ordemAssinatura": 3}
        ], "links": []}),
    )
    .await;
    mount_json(
        &server,
        "/votacoes/2438277-47/votos",
        json!({"dados": [
            {"tipoVoto": "Sim", "deputado_": {"id": 204554, "nome": "Ana Souza"}},
            {"tipoVoto": "Não", "deputado_": {"id": 999999, "nome": "Desconhecido"}}
        ], "links": []}),
    )
    .await;
    mount_json(
        &server,
        "/deputados",
        json!({"dados": [
            {"id": 204554, "nome": "Ana Souza", "siglaPartido": "PT", "siglaUf": "", "email": null, "urlFoto": null}
        ], "links": []}),
    )
    .await;

    let pool = init_memory_database().await.unwrap();
    let camara = client(&server);
    upsert_proposal_type(&pool, "139", "PL", "Projeto de Lei", "").await.unwrap();
    sync_deputies(&pool, &camara, &DeputySyncOptions::default(), &mut Vec::new())
        .await
        .unwrap();

    let options = ProposalSyncOptions {
        ano: Some(2024),
        votacoes: true,
        ..Default::default()
    };
    let counts = sync_proposals(&pool, &camara, &options, &mut Vec::new()).await.unwrap();
    assert_eq!(counts.created, 1);

    let proposal = load_proposal(&pool, 2438277).await.unwrap().unwrap();
    assert_eq!(proposal.tipo_sigla.as_deref(), Some("PL"));
    assert_eq!(proposal.tipo_legado, "PL");
    assert_eq!(proposal.status_proposicao, "Aguardando Parecer");
    assert_eq!(proposal.data_apresentacao.to_string(), "2024-03-18");

    // First signatory that is a stored deputy
    let ana = load_deputy(&pool, 204554).await.unwrap().unwrap();
    assert_eq!(proposal.autor_id, Some(ana.id));
    assert_eq!(proposal.autor_nome.as_deref(), Some("Ana Souza"));

    // Totals count only the votes that were stored
    let voting = load_voting(&pool, "2438277-47").await.unwrap().unwrap();
    assert_eq!(voting.aprovacao, Some(true));
    assert_eq!((voting.votos_sim, voting.votos_nao), (1, 0));

    // Only the stored deputy's vote is recorded
    let votes = list_votes_for_voting(&pool, voting.id).await.unwrap();
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].voto, VoteChoice::Sim);
}

#[tokio::test]
async fn test_speech_sync_window_and_failing_deputy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/deputados/204554/discursos"))
        .and(query_param("dataInicio", "2024-03-01"))
        .and(query_param("dataFim", "2024-03-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dados": [
                {"dataHoraInicio": "2024-03-05T14:02", "tipoDiscurso": "BREVES COMUNICAÇÕES",
                 "transcricao": "Senhor Presidente...", "sumario": "Defende a reforma tributária.",
                 "urlAudio": null, "urlVideo": "https://video/1"}
            ],
            "links": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/deputados/220000/discursos"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let pool = init_memory_database().await.unwrap();
    for (id_deputado, nome) in [(204554, "Ana Souza"), (220000, "Bruno Lima")] {
        let summary = DeputySummary {
            id_deputado,
            nome: nome.to_string(),
            sigla_partido: "PT".to_string(),
            ..Default::default()
        };
        upsert_deputy(&pool, &summary).await.unwrap();
    }

    let options = SpeechSyncOptions {
        deputado: None,
        inicio: NaiveDate::from_ymd_opt(2024, 3, 1),
        fim: NaiveDate::from_ymd_opt(2024, 3, 31),
    };
    let mut out = Vec::new();
    let counts = sync_speeches(&pool, &client(&server), &options, &mut out).await.unwrap();
    assert_eq!((counts.created, counts.updated, counts.errors), (1, 0, 1));

    let ana = load_deputy(&pool, 204554).await.unwrap().unwrap();
    let speeches = list_speeches_by_deputy(&pool, ana.id, 10).await.unwrap();
    assert_eq!(speeches.len(), 1);
    assert_eq!(speeches[0].id_discurso, "204554-2024-03-05T14:02");
    assert_eq!(speeches[0].sumario, "Defende a reforma tributária.");
    assert_eq!(speeches[0].url_audio, "");

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("[1/2] Ana Souza... 1 discursos"));
    assert!(text.contains("[2/2] Bruno Lima... ✗ Erro"));

    // Same window again: the synthetic id makes it an update
    let counts = sync_speeches(&pool, &client(&server), &options, &mut Vec::new()).await.unwrap();
    assert_eq!((counts.created, counts.updated), (0, 1));
}
