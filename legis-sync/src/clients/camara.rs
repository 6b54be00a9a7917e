//! Chamber of Deputies open-data API (`dadosabertos.camara.leg.br/api/v2`)
//!
//! Every response is wrapped as `{ "dados": ..., "links": [...] }`; listings
//! are paginated through the `next` link.

use super::{build_http_client, code_string, get_json, lenient_i64, null_as_empty};
use legis_common::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub dados: T,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl<T> Envelope<T> {
    /// `href` of the `next` page, if any
    pub fn next_page(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == "next")
            .map(|l| l.href.as_str())
    }

    /// `href` of this page itself, if the API sent one
    pub fn self_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == "self")
            .map(|l| l.href.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartyEntry {
    pub id: i64,
    pub sigla: String,
    pub nome: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub uri: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyStatus {
    pub data: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub situacao: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_posse: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_membros: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id_legislatura: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyDetail {
    pub id: i64,
    pub sigla: String,
    pub nome: String,
    pub status: Option<PartyStatus>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub numero_eleitoral: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url_logo: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url_web_site: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url_facebook: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeputyEntry {
    pub id: i64,
    pub nome: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sigla_partido: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sigla_uf: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url_foto: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeputyStatus {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub situacao: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub condicao_eleitoral: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeputyDetail {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nome_civil: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cpf: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sexo: String,
    pub data_nascimento: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub municipio_nascimento: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub uf_nascimento: String,
    #[serde(default)]
    pub ultimo_status: Option<DeputyStatus>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url_website: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProposalTypeEntry {
    #[serde(deserialize_with = "code_string")]
    pub cod: String,
    pub sigla: String,
    pub nome: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub descricao: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalEntry {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sigla_tipo: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub cod_tipo: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub numero: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub ano: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ementa: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalStatusInfo {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub descricao_situacao: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub descricao_tramitacao: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDetail {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sigla_tipo: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub cod_tipo: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub numero: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub ano: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ementa: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ementa_detalhada: String,
    pub data_apresentacao: Option<String>,
    #[serde(default)]
    pub status_proposicao: Option<ProposalStatusInfo>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url_inteiro_teor: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingEntry {
    pub id: String,
    pub data: Option<String>,
    pub data_hora_registro: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub descricao: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub aprovacao: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteDeputy {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nome: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteEntry {
    pub tipo_voto: String,
    #[serde(rename = "deputado_")]
    pub deputado: VoteDeputy,
}

/// One signatory of a proposal; deputies carry a `/deputados/{id}` uri
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorEntry {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub uri: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nome: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub ordem_assinatura: Option<i64>,
}

impl AuthorEntry {
    /// Deputy id from a `.../deputados/{id}` uri; `None` for other author kinds
    pub fn deputy_id(&self) -> Option<i64> {
        let (prefix, id) = self.uri.trim_end_matches('/').rsplit_once('/')?;
        if !prefix.ends_with("/deputados") {
            return None;
        }
        id.parse().ok()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechEntry {
    pub data_hora_inicio: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tipo_discurso: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub transcricao: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sumario: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url_audio: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url_video: String,
}

pub struct CamaraClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl CamaraClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Envelope<T>> {
        let url = format!("{}/{}", self.base_url, endpoint);
        get_json(&self.http_client, &url, params).await
    }

    /// Every item of a listing, following `next` links until exhausted
    async fn get_all<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Vec<T>> {
        let first: Envelope<Vec<T>> = self.get(endpoint, params).await?;
        let mut visited: HashSet<String> = first.self_link().map(str::to_string).into_iter().collect();
        let mut next = first.next_page().map(str::to_string);
        let mut items = first.dados;

        while let Some(url) = next {
            if !visited.insert(url.clone()) {
                tracing::warn!(endpoint = endpoint, url = %url, "Pagination link already fetched; stopping");
                break;
            }
            let page: Envelope<Vec<T>> = get_json(&self.http_client, &url, &[]).await?;
            next = page.next_page().map(str::to_string);
            items.extend(page.dados);
        }

        tracing::debug!(endpoint = endpoint, count = items.len(), "Fetched all pages");
        Ok(items)
    }

    pub async fn list_deputies(&self, params: &[(&str, String)]) -> Result<Envelope<Vec<DeputyEntry>>> {
        self.get("deputados", params).await
    }

    pub async fn list_deputies_all(&self, params: &[(&str, String)]) -> Result<Vec<DeputyEntry>> {
        self.get_all("deputados", params).await
    }

    pub async fn get_deputy(&self, id_deputado: i64) -> Result<DeputyDetail> {
        Ok(self.get(&format!("deputados/{}", id_deputado), &[]).await?.dados)
    }

    pub async fn list_proposals(&self, params: &[(&str, String)]) -> Result<Envelope<Vec<ProposalEntry>>> {
        self.get("proposicoes", params).await
    }

    pub async fn list_proposals_all(&self, params: &[(&str, String)]) -> Result<Vec<ProposalEntry>> {
        self.get_all("proposicoes", params).await
    }

    pub async fn get_proposal(&self, id_proposicao: i64) -> Result<ProposalDetail> {
        Ok(self.get(&format!("proposicoes/{}", id_proposicao), &[]).await?.dados)
    }

    pub async fn list_proposal_votings(&self, id_proposicao: i64) -> Result<Vec<VotingEntry>> {
        Ok(self
            .get(&format!("proposicoes/{}/votacoes", id_proposicao), &[])
            .await?
            .dados)
    }

    /// Signatories ordered by `ordemAssinatura`
    pub async fn list_proposal_authors(&self, id_proposicao: i64) -> Result<Vec<AuthorEntry>> {
        let mut authors: Vec<AuthorEntry> = self
            .get(&format!("proposicoes/{}/autores", id_proposicao), &[])
            .await?
            .dados;
        authors.sort_by_key(|a| a.ordem_assinatura.unwrap_or(i64::MAX));
        Ok(authors)
    }

    pub async fn get_voting(&self, id_votacao: &str) -> Result<serde_json::Value> {
        Ok(self.get(&format!("votacoes/{}", id_votacao), &[]).await?.dados)
    }

    pub async fn list_voting_votes(&self, id_votacao: &str) -> Result<Vec<VoteEntry>> {
        Ok(self.get(&format!("votacoes/{}/votos", id_votacao), &[]).await?.dados)
    }

    pub async fn list_deputy_speeches(&self, id_deputado: i64, params: &[(&str, String)]) -> Result<Vec<SpeechEntry>> {
        self.get_all(&format!("deputados/{}/discursos", id_deputado), params).await
    }

    pub async fn list_events(&self, params: &[(&str, String)]) -> Result<Vec<serde_json::Value>> {
        Ok(self.get("eventos", params).await?.dados)
    }

    pub async fn list_organs(&self, params: &[(&str, String)]) -> Result<Vec<serde_json::Value>> {
        Ok(self.get("orgaos", params).await?.dados)
    }

    pub async fn list_parties(&self, params: &[(&str, String)]) -> Result<Envelope<Vec<PartyEntry>>> {
        self.get("partidos", params).await
    }

    pub async fn list_parties_all(&self, params: &[(&str, String)]) -> Result<Vec<PartyEntry>> {
        self.get_all("partidos", params).await
    }

    pub async fn get_party(&self, id_partido: i64) -> Result<PartyDetail> {
        Ok(self.get(&format!("partidos/{}", id_partido), &[]).await?.dados)
    }

    pub async fn list_proposal_types(&self) -> Result<Vec<ProposalTypeEntry>> {
        Ok(self.get("referencias/proposicoes/siglaTipo", &[]).await?.dados)
    }
}
