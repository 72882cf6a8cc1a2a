//! `reqwest` transport for the reference fetch seam.
//!
//! One GET per batch against `{base_url}/v1/{collection}/{id,id,...}`. Timeouts
//! come from the client; there is no rate limiting or retry here.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::{ExternalRecord, RecordKind, ReferenceFetcher};
use crate::config::ApiConfig;
use crate::error::{Error, Result};

pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
    www_base_url: String,
}

impl HttpFetcher {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("fieldkit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Fetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            www_base_url: config.www_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReferenceFetcher for HttpFetcher {
    async fn fetch(&self, kind: RecordKind, ids: &[u64]) -> Result<Vec<ExternalRecord>> {
        debug_assert!(ids.len() <= kind.batch_ceiling());
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/v1/{}/{joined}", self.base_url, kind.api_path());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("{url}: {e}")))?;

        // Unknown ids come back as 404 for single-id requests.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(Error::Fetch(format!("{url}: HTTP {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Fetch(format!("{url}: {e}")))?;
        parse_results(kind, &body, &self.www_base_url)
    }
}

#[derive(Deserialize)]
struct ResultsPage {
    #[serde(default)]
    results: Vec<Value>,
}

/// Turn an API response body into records. Results without an id are skipped.
pub fn parse_results(kind: RecordKind, body: &str, www_base_url: &str) -> Result<Vec<ExternalRecord>> {
    let page: ResultsPage = serde_json::from_str(body)?;
    Ok(page
        .results
        .iter()
        .filter_map(|result| {
            let id = result.get("id")?.as_u64()?;
            Some(ExternalRecord {
                kind,
                id,
                display_name: display_name(kind, result).unwrap_or_else(|| id.to_string()),
                url: format!("{www_base_url}/{}/{id}", kind.web_path()),
            })
        })
        .collect())
}

fn display_name(kind: RecordKind, result: &Value) -> Option<String> {
    let field = |name: &str| result.get(name).and_then(Value::as_str).map(str::to_string);
    match kind {
        RecordKind::Place => field("display_name").or_else(|| field("name")),
        RecordKind::Project => field("title"),
        RecordKind::User => match (field("name"), field("login")) {
            (Some(name), Some(login)) if !name.is_empty() => Some(format!("{name} ({login})")),
            (_, login) => login,
        },
        RecordKind::Taxon => match (field("name"), field("preferred_common_name")) {
            (Some(name), Some(common)) => Some(format!("{common} ({name})")),
            (name, _) => name,
        },
    }
}
