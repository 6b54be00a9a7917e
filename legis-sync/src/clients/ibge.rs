//! IBGE localities API (`servicodados.ibge.gov.br/api/v1/localidades`)

use super::{build_http_client, get_json};
use legis_common::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct IbgeRegion {
    pub id: i64,
    pub sigla: String,
    pub nome: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IbgeState {
    pub id: i64,
    pub sigla: String,
    pub nome: String,
    pub regiao: IbgeRegion,
}

/// Municipality entry; the nested micro-region data is not used
#[derive(Debug, Clone, Deserialize)]
pub struct IbgeMunicipality {
    pub id: i64,
    pub nome: String,
}

pub struct IbgeClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl IbgeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        get_json(&self.http_client, &url, &[]).await
    }

    pub async fn list_regions(&self) -> Result<Vec<IbgeRegion>> {
        self.get("regioes").await
    }

    pub async fn list_states(&self) -> Result<Vec<IbgeState>> {
        self.get("estados").await
    }

    pub async fn get_state(&self, id: i64) -> Result<IbgeState> {
        self.get(&format!("estados/{}", id)).await
    }

    pub async fn list_state_municipalities(&self, state_id: i64) -> Result<Vec<IbgeMunicipality>> {
        self.get(&format!("estados/{}/municipios", state_id)).await
    }

    pub async fn list_municipalities(&self) -> Result<Vec<IbgeMunicipality>> {
        self.get("municipios").await
    }

    pub async fn get_municipality(&self, id: i64) -> Result<IbgeMunicipality> {
        self.get(&format!("municipios/{}", id)).await
    }
}
