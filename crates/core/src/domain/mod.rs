//! Persistent domain records.

pub mod allergy;
pub mod consent;
pub mod patient;
pub mod reference;

pub use allergy::Allergy;
pub use consent::{
    Consent, ConsentStage, RevocationType, SignedPdfConsent, SignedPdfConsentRevocation,
};
pub use patient::{IndividualProvider, OrganizationalProvider, Patient, Provider};
pub use reference::{CodedConcept, ReferenceKind};

/// Serde adapter storing optional binary content as base64 text.
pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => s.serialize_some(&STANDARD.encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|text| STANDARD.decode(text).map_err(serde::de::Error::custom))
            .transpose()
    }
}
