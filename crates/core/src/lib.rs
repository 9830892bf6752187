//! # PCM Core
//!
//! Core business logic for patient consent management.
//!
//! This crate contains the consent lifecycle and everything it touches:
//! - Consent, patient and allergy records behind a pluggable repository (memory or JSON files)
//! - Conflict checks, post-save assertions and policy id generation
//! - XACML, CDA R2 and FHIR Contract exports of saved consents
//! - Electronic signature and HIE publication collaborators
//!
//! **No API concerns**: authentication and HTTP handlers belong in `api-rest` or `api-shared`.

pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod repositories;
pub mod services;

pub use config::{PcmConfig, StorageBackend};
pub use error::{PcmError, PcmResult};
pub use services::Services;
