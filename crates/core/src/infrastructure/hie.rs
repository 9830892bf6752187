//! Health information exchange publication.

use super::{CONNECT_TIMEOUT, REQUEST_TIMEOUT};
use crate::{PcmError, PcmResult};
use async_trait::async_trait;

pub const FHIR_JSON: &str = "application/fhir+json";

#[async_trait]
pub trait HieClient: Send + Sync {
    /// Create or replace the Contract with this resource id.
    async fn publish_contract(&self, resource_id: &str, contract_json: String) -> PcmResult<()>;
}

/// Publishes resources with FHIR RESTful `update` (PUT) against the exchange base URL.
pub struct HttpHieClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHieClient {
    pub fn new(base_url: &str) -> PcmResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PcmError::Hie(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn contract_url(&self, resource_id: &str) -> String {
        format!("{}/Contract/{}", self.base_url, resource_id)
    }
}

#[async_trait]
impl HieClient for HttpHieClient {
    async fn publish_contract(&self, resource_id: &str, contract_json: String) -> PcmResult<()> {
        let url = self.contract_url(resource_id);
        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, FHIR_JSON)
            .header(reqwest::header::ACCEPT, FHIR_JSON)
            .body(contract_json)
            .send()
            .await
            .map_err(|e| PcmError::Hie(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PcmError::Hie(format!("{url} returned {status}: {body}")));
        }

        tracing::info!("published Contract/{resource_id} to HIE");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_url_is_fhir_update_endpoint() {
        let client = HttpHieClient::new("http://hie.local/fhir/").unwrap();
        assert_eq!(client.contract_url("c-1"), "http://hie.local/fhir/Contract/c-1");
    }

    #[tokio::test]
    async fn unreachable_exchange_is_an_hie_error() {
        let client = HttpHieClient::new("http://127.0.0.1:1").unwrap();
        let err = client
            .publish_contract("c-1", "{}".into())
            .await
            .expect_err("refused");
        assert!(matches!(err, PcmError::Hie(_)));
    }
}
