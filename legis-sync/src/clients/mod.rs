//! REST clients for the Chamber of Deputies and IBGE open-data APIs
//!
//! Both clients issue plain GET requests and decode JSON. Failures are
//! returned to the caller, which logs and counts them; nothing is retried.

pub mod camara;
pub mod ibge;

pub use camara::CamaraClient;
pub use ibge::IbgeClient;

use legis_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

const USER_AGENT: &str = concat!("legis-sync/", env!("CARGO_PKG_VERSION"));

fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// GET `url` with query `params` and decode the JSON body
async fn get_json<T: DeserializeOwned>(
    http_client: &reqwest::Client,
    url: &str,
    params: &[(&str, String)],
) -> Result<T> {
    tracing::debug!(url = %url, "GET");

    let response = http_client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .query(params)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), url = %url, "Request rejected");
        return Err(Error::Api {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::Parse(format!("{}: {}", url, e)))
}

/// Integer that the APIs sometimes send as a JSON string ("5") or null
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Int(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Code that may arrive as a number or a string; always kept as text
pub(crate) fn code_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Int(n) => n.to_string(),
        Raw::Text(s) => s.trim().to_string(),
    })
}

/// String field that may be null
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
