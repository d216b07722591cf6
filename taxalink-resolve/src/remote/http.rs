//! JSON-over-HTTP client for a remote taxonomy authority
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use taxalink_core::config::RemoteConfig;
use taxalink_core::{TaxaError, TaxaResult, Taxon, TaxonId};
use tracing::debug;
use url::Url;

use super::RemoteAuthority;
use crate::resilience::{with_retry_async, RetryPolicy};

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    kind: &'a str,
    keys: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    db: Option<&'a str>,
    email: &'a str,
    tool: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    results: HashMap<String, Vec<Taxon>>,
}

/// Posts batches to `{base_url}/lookup` and reads `{"results": {key: [taxon, ..]}}`
pub struct HttpAuthority {
    client: Client,
    endpoint: Url,
    email: String,
    tool: String,
    retry: RetryPolicy,
}

impl HttpAuthority {
    pub fn new(base_url: &str, email: impl Into<String>) -> TaxaResult<Self> {
        let email = email.into();
        if email.trim().is_empty() {
            return Err(TaxaError::Configuration(
                "remote authority requires a contact email".to_string(),
            ));
        }

        let mut base = Url::parse(base_url)
            .map_err(|e| TaxaError::Configuration(format!("invalid remote url {}: {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("lookup")
            .map_err(|e| TaxaError::Configuration(format!("invalid remote url {}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TaxaError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            email,
            tool: "taxalink".to_string(),
            retry: RetryPolicy::for_network(),
        })
    }

    pub fn from_config(config: &RemoteConfig) -> TaxaResult<Self> {
        let base_url = config.base_url.as_deref().ok_or_else(|| {
            TaxaError::Configuration("remote.base_url is not set".to_string())
        })?;
        let email = config.email.as_deref().ok_or_else(|| {
            TaxaError::Configuration("remote.email is not set".to_string())
        })?;

        let mut authority = Self::new(base_url, email)?
            .with_tool(config.tool.clone())
            .with_retry_policy(RetryPolicy::from_config(config));
        authority.client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .build()
            .map_err(|e| TaxaError::Network(e.to_string()))?;
        Ok(authority)
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send_once(&self, request: &LookupRequest<'_>) -> anyhow::Result<LookupResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("timeout contacting {}", self.endpoint)
                } else if e.is_connect() {
                    anyhow!("connection to {} failed: {}", self.endpoint, e)
                } else {
                    anyhow!("request to {} failed: {}", self.endpoint, e)
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(anyhow!("rate limited (HTTP {})", status.as_u16()));
        }
        if status.is_server_error() {
            return Err(anyhow!("server error: HTTP {}", status.as_u16()));
        }
        if !status.is_success() {
            return Err(anyhow!("rejected request: HTTP {}", status.as_u16()));
        }

        response
            .json::<LookupResponse>()
            .await
            .map_err(|e| anyhow!("malformed response body: {}", e))
    }

    async fn post_batch(
        &self,
        kind: &str,
        keys: &[String],
        db: Option<&str>,
    ) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        let request = LookupRequest {
            kind,
            keys,
            db,
            email: &self.email,
            tool: &self.tool,
        };
        debug!("Remote {} lookup for {} keys at {}", kind, keys.len(), self.endpoint);

        let context = format!("remote {} lookup", kind);
        let response = with_retry_async(|| self.send_once(&request), &self.retry, &context)
            .await
            .map_err(|e| TaxaError::Network(format!("{:#}", e)))?;

        Ok(response.results)
    }
}

#[async_trait]
impl RemoteAuthority for HttpAuthority {
    async fn fetch_taxids(&self, taxids: &[TaxonId]) -> TaxaResult<HashMap<TaxonId, Vec<Taxon>>> {
        let keys: Vec<String> = taxids.iter().map(|id| id.to_string()).collect();
        let results = self.post_batch("taxid", &keys, None).await?;

        let mut found = HashMap::with_capacity(results.len());
        for (key, taxa) in results {
            let id = key.parse::<TaxonId>().map_err(|e| {
                TaxaError::Parse(format!("remote returned non-numeric taxid key {}: {}", key, e))
            })?;
            found.insert(id, taxa);
        }
        Ok(found)
    }

    async fn fetch_names(&self, names: &[String]) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        self.post_batch("name", names, None).await
    }

    async fn fetch_accessions(
        &self,
        accessions: &[String],
        db: &str,
    ) -> TaxaResult<HashMap<String, Vec<Taxon>>> {
        self.post_batch("accession", accessions, Some(db)).await
    }
}
