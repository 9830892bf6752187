//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services as an
//! `Arc<PcmConfig>`. Services never read environment variables during request handling.

use crate::constants::ONE_TO_ONE_ASSERTION;
use crate::{PcmError, PcmResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Where repositories keep their records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local maps; everything is lost on restart.
    Memory,
    /// One JSON file per record under the data directory.
    File,
}

impl FromStr for StorageBackend {
    type Err = PcmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "file" => Ok(StorageBackend::File),
            other => Err(PcmError::InvalidInput(format!(
                "unknown storage backend '{other}' (expected 'memory' or 'file')"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HieConfig {
    pub base_url: String,
    pub publish: bool,
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct PcmConfig {
    data_dir: PathBuf,
    storage: StorageBackend,
    policy_domain_id: String,
    signature: Option<SignatureConfig>,
    hie: Option<HieConfig>,
    consent_assertions: Vec<String>,
}

impl PcmConfig {
    /// Create a new `PcmConfig` with no external collaborators and the default assertion set.
    ///
    /// The policy domain id must be a dotted OID such as `2.16.840.1.113883.3.467`.
    pub fn new(
        data_dir: PathBuf,
        storage: StorageBackend,
        policy_domain_id: String,
    ) -> PcmResult<Self> {
        let policy_domain_id = policy_domain_id.trim().to_string();
        if !is_oid(&policy_domain_id) {
            return Err(PcmError::InvalidInput(format!(
                "policy domain id '{policy_domain_id}' is not an OID"
            )));
        }

        Ok(Self {
            data_dir,
            storage,
            policy_domain_id,
            signature: None,
            hie: None,
            consent_assertions: vec![ONE_TO_ONE_ASSERTION.to_string()],
        })
    }

    pub fn with_signature(mut self, base_url: String, api_key: String) -> PcmResult<Self> {
        if base_url.trim().is_empty() || api_key.trim().is_empty() {
            return Err(PcmError::InvalidInput(
                "e-signature url and api key must both be set".into(),
            ));
        }
        self.signature = Some(SignatureConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        });
        Ok(self)
    }

    pub fn with_hie(mut self, base_url: String, publish: bool) -> PcmResult<Self> {
        if base_url.trim().is_empty() {
            return Err(PcmError::InvalidInput("HIE url cannot be empty".into()));
        }
        self.hie = Some(HieConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            publish,
        });
        Ok(self)
    }

    /// Replace the assertion set. Names are validated when the assertions are built.
    pub fn with_consent_assertions(mut self, names: Vec<String>) -> Self {
        self.consent_assertions = names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn storage(&self) -> StorageBackend {
        self.storage
    }

    pub fn policy_domain_id(&self) -> &str {
        &self.policy_domain_id
    }

    pub fn signature(&self) -> Option<&SignatureConfig> {
        self.signature.as_ref()
    }

    pub fn hie(&self) -> Option<&HieConfig> {
        self.hie.as_ref()
    }

    /// True when completed consents should be published to the HIE.
    pub fn hie_publish_enabled(&self) -> bool {
        self.hie.as_ref().is_some_and(|h| h.publish)
    }

    pub fn consent_assertions(&self) -> &[String] {
        &self.consent_assertions
    }
}

fn is_oid(value: &str) -> bool {
    !value.is_empty()
        && value
            .split('.')
            .all(|arc| !arc.is_empty() && arc.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> PcmConfig {
        PcmConfig::new(
            PathBuf::from("/tmp/pcm"),
            StorageBackend::Memory,
            "2.16.840.1.113883.3.467".into(),
        )
        .expect("valid config")
    }

    #[test]
    fn rejects_non_oid_policy_domain() {
        for bad in ["", "abc", "1..2", "1.2."] {
            assert!(
                PcmConfig::new(PathBuf::new(), StorageBackend::Memory, bad.into()).is_err(),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn storage_backend_parses_case_insensitively() {
        assert_eq!("FILE".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert_eq!(" memory ".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn hie_publication_requires_flag() {
        let cfg = base()
            .with_hie("http://hie.local/fhir/".into(), false)
            .unwrap();
        assert!(!cfg.hie_publish_enabled());
        assert_eq!(cfg.hie().unwrap().base_url, "http://hie.local/fhir");

        let cfg = base().with_hie("http://hie.local".into(), true).unwrap();
        assert!(cfg.hie_publish_enabled());
    }

    #[test]
    fn default_assertions_are_one_to_one() {
        assert_eq!(base().consent_assertions(), ["one-to-one".to_string()]);
        let cfg = base().with_consent_assertions(vec![" ".into()]);
        assert!(cfg.consent_assertions().is_empty());
    }

    #[test]
    fn signature_requires_key() {
        assert!(base()
            .with_signature("http://sign.local".into(), "".into())
            .is_err());
    }
}
