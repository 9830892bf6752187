//! E-signature provider client.
//!
//! The provider hosts an embeddable signing widget for a document and later hands back the
//! signed bytes. Failures are fatal to the current request; nothing is retried.

use super::{CONNECT_TIMEOUT, REQUEST_TIMEOUT};
use crate::config::SignatureConfig;
use crate::{PcmError, PcmResult};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Widget handed back by the provider for embedding in the patient's browser.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedWidgetCreationResult {
    /// Provider key of the document; used to fetch the signed copy.
    pub document_key: String,
    /// Script snippet that renders the widget.
    pub javascript: String,
}

#[async_trait]
pub trait SignatureService: Send + Sync {
    async fn create_embedded_widget(
        &self,
        document: &[u8],
        file_name: &str,
        document_name: &str,
        form_field_layer_template: Option<&str>,
        signer_email: &str,
    ) -> PcmResult<EmbeddedWidgetCreationResult>;

    async fn get_signed_document(&self, document_key: &str) -> PcmResult<Vec<u8>>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WidgetRequest<'a> {
    document_name: &'a str,
    file_name: &'a str,
    file_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    form_field_layer_template: Option<&'a str>,
    signer_email: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedDocumentResponse {
    file_content: String,
}

/// Client for the EchoSign REST API.
pub struct EchoSignSignatureService {
    client: reqwest::Client,
    base_url: reqwest::Url,
    api_key: String,
}

impl EchoSignSignatureService {
    pub fn new(cfg: &SignatureConfig) -> PcmResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PcmError::Signature(format!("failed to create HTTP client: {e}")))?;
        let base_url = reqwest::Url::parse(&cfg.base_url)
            .map_err(|e| PcmError::Signature(format!("invalid provider URL {}: {e}", cfg.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(PcmError::Signature(format!(
                "provider URL {} cannot carry a path",
                cfg.base_url
            )));
        }
        Ok(Self {
            client,
            base_url,
            api_key: cfg.api_key.clone(),
        })
    }

    /// Base URL extended with percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> reqwest::Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn widgets_url(&self) -> reqwest::Url {
        self.endpoint(&["widgets"])
    }

    fn signed_document_url(&self, document_key: &str) -> reqwest::Url {
        self.endpoint(&["agreements", document_key, "combinedDocument"])
    }

    async fn checked(response: reqwest::Response) -> PcmResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PcmError::Signature(format!(
            "provider returned {status}: {body}"
        )))
    }
}

#[async_trait]
impl SignatureService for EchoSignSignatureService {
    async fn create_embedded_widget(
        &self,
        document: &[u8],
        file_name: &str,
        document_name: &str,
        form_field_layer_template: Option<&str>,
        signer_email: &str,
    ) -> PcmResult<EmbeddedWidgetCreationResult> {
        let request = WidgetRequest {
            document_name,
            file_name,
            file_content: STANDARD.encode(document),
            form_field_layer_template,
            signer_email,
        };

        let response = self
            .client
            .post(self.widgets_url())
            .header("Access-Token", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PcmError::Signature(e.to_string()))?;

        let widget: EmbeddedWidgetCreationResult = Self::checked(response)
            .await?
            .json()
            .await
            .map_err(|e| PcmError::Signature(format!("invalid widget response: {e}")))?;

        tracing::info!(
            document_key = %widget.document_key,
            "created signing widget for {document_name}"
        );
        Ok(widget)
    }

    async fn get_signed_document(&self, document_key: &str) -> PcmResult<Vec<u8>> {
        let response = self
            .client
            .get(self.signed_document_url(document_key))
            .header("Access-Token", &self.api_key)
            .send()
            .await
            .map_err(|e| PcmError::Signature(e.to_string()))?;

        let body: SignedDocumentResponse = Self::checked(response)
            .await?
            .json()
            .await
            .map_err(|e| PcmError::Signature(format!("invalid document response: {e}")))?;

        STANDARD
            .decode(body.file_content)
            .map_err(|e| PcmError::Signature(format!("signed document is not base64: {e}")))
    }
}

/// Used when no e-signature provider is configured; every call fails.
pub struct DisabledSignatureService;

#[async_trait]
impl SignatureService for DisabledSignatureService {
    async fn create_embedded_widget(
        &self,
        _document: &[u8],
        _file_name: &str,
        _document_name: &str,
        _form_field_layer_template: Option<&str>,
        _signer_email: &str,
    ) -> PcmResult<EmbeddedWidgetCreationResult> {
        Err(PcmError::Signature("no e-signature provider configured".into()))
    }

    async fn get_signed_document(&self, _document_key: &str) -> PcmResult<Vec<u8>> {
        Err(PcmError::Signature("no e-signature provider configured".into()))
    }
}
