//! The consent aggregate and its e-signature sub-records.

use crate::constants::DOCUMENT_SIGNED;
use crate::domain::base64_bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Revocation classifier stamped onto a consent when a revocation is sent for signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevocationType {
    /// Records may still be shared in an emergency.
    #[serde(rename = "EMERGENCY ONLY")]
    EmergencyOnly,
    /// Records may never be shared.
    #[serde(rename = "NO NEVER")]
    NoNever,
}

impl RevocationType {
    pub fn as_str(self) -> &'static str {
        match self {
            RevocationType::EmergencyOnly => "EMERGENCY ONLY",
            RevocationType::NoNever => "NO NEVER",
        }
    }

    /// Recognise a revocation type; any other string is not a revocation type.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "EMERGENCY ONLY" => Some(RevocationType::EmergencyOnly),
            "NO NEVER" => Some(RevocationType::NoNever),
            _ => None,
        }
    }
}

impl fmt::Display for RevocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow stage of a consent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentStage {
    ConsentSaved,
    ConsentSigned,
    RevocationRevoked,
}

impl ConsentStage {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsentStage::ConsentSaved => "CONSENT_SAVED",
            ConsentStage::ConsentSigned => "CONSENT_SIGNED",
            ConsentStage::RevocationRevoked => "REVOCATION_REVOKED",
        }
    }

    /// Map a signed-document status string to the consent signing stage.
    pub fn from_signed_status(status: &str) -> Self {
        if status == DOCUMENT_SIGNED {
            ConsentStage::ConsentSigned
        } else {
            ConsentStage::ConsentSaved
        }
    }
}

impl fmt::Display for ConsentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one document sent through the e-signature workflow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPdfConsent {
    pub document_id: String,
    pub document_name_by_sender: String,
    pub document_message_by_sender: String,
    pub signer_email: String,
    pub document_signed_status: String,
    pub document_created_by: String,
    pub document_sent_out_for_signature_date_time: DateTime<Utc>,
    #[serde(default)]
    pub document_signed_date_time: Option<DateTime<Utc>>,
    #[serde(default, with = "base64_bytes")]
    pub content: Option<Vec<u8>>,
}

impl SignedPdfConsent {
    pub fn is_signed(&self) -> bool {
        self.document_signed_status == DOCUMENT_SIGNED
    }
}

/// A signed revocation carries the same workflow state as a signed consent.
pub type SignedPdfConsentRevocation = SignedPdfConsent;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consent {
    #[serde(default)]
    pub id: Option<u64>,
    pub patient_id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    // Provider sides hold NPIs.
    #[serde(default)]
    pub providers_permitted_to_disclose: BTreeSet<String>,
    #[serde(default)]
    pub organizational_providers_permitted_to_disclose: BTreeSet<String>,
    #[serde(default)]
    pub providers_disclosure_is_made_to: BTreeSet<String>,
    #[serde(default)]
    pub organizational_providers_disclosure_is_made_to: BTreeSet<String>,

    #[serde(default)]
    pub do_not_share_clinical_document_type_codes: BTreeSet<String>,
    #[serde(default)]
    pub do_not_share_clinical_document_section_type_codes: BTreeSet<String>,
    #[serde(default)]
    pub do_not_share_sensitivity_policy_codes: BTreeSet<String>,
    #[serde(default)]
    pub share_for_purpose_of_use_codes: BTreeSet<String>,

    /// Policy id shared by every exported artifact.
    pub consent_reference_id: String,
    #[serde(default)]
    pub exported_xacml_consent: Option<String>,
    #[serde(default)]
    pub xacml_pdf_consent_from: Option<String>,
    #[serde(default)]
    pub xacml_pdf_consent_to: Option<String>,
    #[serde(default)]
    pub exported_cdar2_consent: Option<String>,
    #[serde(default, with = "base64_bytes")]
    pub unsigned_pdf_consent: Option<Vec<u8>>,

    #[serde(default)]
    pub signed_pdf_consent: Option<SignedPdfConsent>,
    #[serde(default)]
    pub signed_pdf_consent_revoke: Option<SignedPdfConsentRevocation>,
    #[serde(default)]
    pub consent_revokation_type: Option<RevocationType>,

    pub created_at: DateTime<Utc>,
}

impl Consent {
    /// True while the consent holds signed PDF content; such a consent cannot be deleted.
    pub fn has_signed_content(&self) -> bool {
        self.signed_pdf_consent
            .as_ref()
            .is_some_and(|s| s.content.is_some())
    }

    pub fn disclosing_npis(&self) -> BTreeSet<String> {
        self.providers_permitted_to_disclose
            .union(&self.organizational_providers_permitted_to_disclose)
            .cloned()
            .collect()
    }

    pub fn recipient_npis(&self) -> BTreeSet<String> {
        self.providers_disclosure_is_made_to
            .union(&self.organizational_providers_disclosure_is_made_to)
            .cloned()
            .collect()
    }

    /// Full lifecycle stage, including completed revocation.
    pub fn stage(&self) -> ConsentStage {
        if self
            .signed_pdf_consent_revoke
            .as_ref()
            .is_some_and(SignedPdfConsent::is_signed)
        {
            return ConsentStage::RevocationRevoked;
        }
        match &self.signed_pdf_consent {
            Some(signed) => ConsentStage::from_signed_status(&signed.document_signed_status),
            None => ConsentStage::ConsentSaved,
        }
    }

    /// True when the validity windows share at least one day.
    pub fn overlaps_in_time(&self, other: &Consent) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn consent(patient_id: u64) -> Consent {
        Consent {
            id: None,
            patient_id,
            name: "Share with Dr Smith".into(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2027, 11, 1).unwrap(),
            providers_permitted_to_disclose: BTreeSet::new(),
            organizational_providers_permitted_to_disclose: ["1083949036".to_string()].into(),
            providers_disclosure_is_made_to: ["1174858088".to_string()].into(),
            organizational_providers_disclosure_is_made_to: BTreeSet::new(),
            do_not_share_clinical_document_type_codes: BTreeSet::new(),
            do_not_share_clinical_document_section_type_codes: BTreeSet::new(),
            do_not_share_sensitivity_policy_codes: ["ETH".to_string()].into(),
            share_for_purpose_of_use_codes: ["TREAT".to_string()].into(),
            consent_reference_id: "MRN-1:&2.16.840.1.113883.3.467&ISO:1083949036:1174858088:X"
                .into(),
            exported_xacml_consent: None,
            xacml_pdf_consent_from: None,
            xacml_pdf_consent_to: None,
            exported_cdar2_consent: None,
            unsigned_pdf_consent: None,
            signed_pdf_consent: None,
            signed_pdf_consent_revoke: None,
            consent_revokation_type: None,
            created_at: Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap(),
        }
    }

    pub fn signed(status: &str, content: Option<Vec<u8>>) -> SignedPdfConsent {
        SignedPdfConsent {
            document_id: "DOC-1".into(),
            document_name_by_sender: "Share with Dr Smith".into(),
            document_message_by_sender: "Please sign".into(),
            signer_email: "john.doe@example.com".into(),
            document_signed_status: status.into(),
            document_created_by: "Doe, John".into(),
            document_sent_out_for_signature_date_time: Utc
                .with_ymd_and_hms(2026, 10, 16, 10, 0, 0)
                .unwrap(),
            document_signed_date_time: None,
            content,
        }
    }
}
