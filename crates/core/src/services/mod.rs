//! Business services.
//!
//! Services hold their repositories and collaborators behind `Arc`s and are shared across
//! request handlers. Nothing here knows about HTTP.

pub mod allergy;
pub mod assertions;
pub mod check;
pub mod consent;
pub mod dto;
pub mod export;
pub mod fhir_service;
pub mod patient;
pub mod pdf;
pub mod policy_id;
pub mod reference;

use crate::config::PcmConfig;
use crate::infrastructure::hie::{HieClient, HttpHieClient};
use crate::infrastructure::signature::{
    DisabledSignatureService, EchoSignSignatureService, SignatureService,
};
use crate::repositories::open_repository;
use crate::PcmResult;
use std::sync::Arc;

pub use allergy::AllergyService;
pub use consent::ConsentService;
pub use patient::PatientService;
pub use reference::ReferenceCodeService;

/// Every service, wired from one configuration.
#[derive(Clone)]
pub struct Services {
    pub patients: Arc<PatientService>,
    pub consents: Arc<ConsentService>,
    pub allergies: Arc<AllergyService>,
    pub references: ReferenceCodeService,
}

impl Services {
    /// Open the configured repositories and build every service with its default collaborators.
    pub fn from_config(cfg: Arc<PcmConfig>) -> PcmResult<Self> {
        let signature: Arc<dyn SignatureService> = match cfg.signature() {
            Some(sig) => Arc::new(EchoSignSignatureService::new(sig)?),
            None => Arc::new(DisabledSignatureService),
        };
        let hie: Option<Arc<dyn HieClient>> = match cfg.hie() {
            Some(hie) => Some(Arc::new(HttpHieClient::new(&hie.base_url)?)),
            None => None,
        };
        Self::with_collaborators(cfg, signature, hie)
    }

    pub fn with_collaborators(
        cfg: Arc<PcmConfig>,
        signature: Arc<dyn SignatureService>,
        hie: Option<Arc<dyn HieClient>>,
    ) -> PcmResult<Self> {
        let patients = Arc::new(PatientService::new(open_repository(&cfg)?));
        let consents = Arc::new(ConsentService::new(
            cfg.clone(),
            open_repository(&cfg)?,
            patients.clone(),
            signature,
            hie,
        )?);
        let allergies = Arc::new(AllergyService::new(open_repository(&cfg)?));

        Ok(Self {
            patients,
            consents,
            allergies,
            references: ReferenceCodeService,
        })
    }
}
