use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use pcm_core::constants::{DEFAULT_DATA_DIR, DEFAULT_POLICY_DOMAIN_ID};
use pcm_core::{PcmConfig, Services, StorageBackend};

/// Main entry point for the PCM application
///
/// Resolves configuration from the environment, wires every service and serves the REST API
/// (default: 0.0.0.0:3000).
///
/// # Environment Variables
/// - `PCM_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PCM_DATA_DIR`: directory for JSON record storage (default: "pcm_data")
/// - `PCM_STORAGE`: `memory` or `file` (default: "file")
/// - `PCM_POLICY_DOMAIN_ID`: OID of the policy domain
/// - `PCM_ECHOSIGN_URL`, `PCM_ECHOSIGN_API_KEY`: e-signature provider; signing is disabled if unset
/// - `PCM_HIE_URL`: FHIR endpoint of the HIE; `PCM_HIE_PUBLISH` enables publication on signing
/// - `PCM_CONSENT_ASSERTIONS`: comma-separated assertion names (default: "one-to-one")
/// - `API_KEY`: key callers must present in `x-api-key`
///
/// # Errors
/// Returns an error if:
/// - the logging configuration cannot be initialised,
/// - the configuration is invalid or a repository cannot be opened,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("pcm=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("PCM_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = Arc::new(config_from_env()?);
    let api_key = std::env::var("API_KEY").ok().filter(|k| !k.trim().is_empty());
    if api_key.is_none() {
        tracing::warn!("API_KEY not set; REST API is unauthenticated");
    }

    tracing::info!(
        storage = ?cfg.storage(),
        data_dir = %cfg.data_dir().display(),
        signing = cfg.signature().is_some(),
        hie_publish = cfg.hie_publish_enabled(),
        "++ Starting PCM REST on {}",
        rest_addr
    );

    let services = Services::from_config(cfg.clone())?;
    let app = router(AppState::new(cfg, services, api_key));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn config_from_env() -> anyhow::Result<PcmConfig> {
    let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

    let data_dir = PathBuf::from(var("PCM_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()));
    let storage: StorageBackend = match var("PCM_STORAGE") {
        Some(s) => s.parse()?,
        None => StorageBackend::File,
    };
    let domain = var("PCM_POLICY_DOMAIN_ID").unwrap_or_else(|| DEFAULT_POLICY_DOMAIN_ID.into());

    let mut cfg = PcmConfig::new(data_dir, storage, domain)?;

    match (var("PCM_ECHOSIGN_URL"), var("PCM_ECHOSIGN_API_KEY")) {
        (Some(url), Some(key)) => cfg = cfg.with_signature(url, key)?,
        (None, None) => {}
        _ => anyhow::bail!("PCM_ECHOSIGN_URL and PCM_ECHOSIGN_API_KEY must be set together"),
    }

    if let Some(url) = var("PCM_HIE_URL") {
        let publish = match var("PCM_HIE_PUBLISH") {
            Some(v) => v.parse::<bool>()?,
            None => false,
        };
        cfg = cfg.with_hie(url, publish)?;
    }

    if let Some(names) = var("PCM_CONSENT_ASSERTIONS") {
        cfg = cfg.with_consent_assertions(names.split(',').map(str::to_string).collect());
    }

    Ok(cfg)
}
