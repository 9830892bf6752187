//! Static coded-concept lookup tables.
//!
//! Tables are compiled in and never mutated. Codes are looked up by value within a
//! [`ReferenceKind`].

use serde::Serialize;
use std::str::FromStr;

const LOINC: &str = "2.16.840.1.113883.6.1";
const ACT_CODE: &str = "2.16.840.1.113883.5.4";
const ACT_REASON: &str = "2.16.840.1.113883.5.8";
const HL7_V2_RESULT_STATUS: &str = "2.16.840.1.113883.12.123";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CodedConcept {
    pub code: &'static str,
    pub code_system: &'static str,
    pub code_system_name: &'static str,
    pub display_name: &'static str,
}

const fn concept(
    code: &'static str,
    code_system: &'static str,
    code_system_name: &'static str,
    display_name: &'static str,
) -> CodedConcept {
    CodedConcept {
        code,
        code_system,
        code_system_name,
        display_name,
    }
}

static CLINICAL_DOCUMENT_TYPES: &[CodedConcept] = &[
    concept("34133-9", LOINC, "LOINC", "Summarization of episode note"),
    concept("11506-3", LOINC, "LOINC", "Progress note"),
    concept("18842-5", LOINC, "LOINC", "Discharge summary"),
    concept("11488-4", LOINC, "LOINC", "Consultation note"),
    concept("34117-2", LOINC, "LOINC", "History and physical note"),
    concept("28570-0", LOINC, "LOINC", "Procedure note"),
];

static CLINICAL_DOCUMENT_SECTION_TYPES: &[CodedConcept] = &[
    concept("48765-2", LOINC, "LOINC", "Allergies, adverse reactions, alerts"),
    concept("10160-0", LOINC, "LOINC", "History of medication use"),
    concept("11450-4", LOINC, "LOINC", "Problem list"),
    concept("30954-2", LOINC, "LOINC", "Relevant diagnostic tests and/or laboratory data"),
    concept("47519-4", LOINC, "LOINC", "History of procedures"),
    concept("11369-6", LOINC, "LOINC", "History of immunization"),
];

static SENSITIVITY_POLICIES: &[CodedConcept] = &[
    concept("ETH", ACT_CODE, "ActCode", "Substance abuse information sensitivity"),
    concept("PSY", ACT_CODE, "ActCode", "Psychiatry information sensitivity"),
    concept("HIV", ACT_CODE, "ActCode", "HIV/AIDS information sensitivity"),
    concept("GDIS", ACT_CODE, "ActCode", "Genetic disease information sensitivity"),
    concept("SDV", ACT_CODE, "ActCode", "Sexual assault, abuse, or domestic violence information sensitivity"),
    concept("SEX", ACT_CODE, "ActCode", "Sexuality and reproductive health information sensitivity"),
];

static PURPOSES_OF_USE: &[CodedConcept] = &[
    concept("TREAT", ACT_REASON, "ActReason", "Treatment"),
    concept("ETREAT", ACT_REASON, "ActReason", "Emergency treatment"),
    concept("HPAYMT", ACT_REASON, "ActReason", "Healthcare payment"),
    concept("HOPERAT", ACT_REASON, "ActReason", "Healthcare operations"),
    concept("HRESCH", ACT_REASON, "ActReason", "Healthcare research"),
    concept("PATRQT", ACT_REASON, "ActReason", "Patient requested"),
];

static RESULT_STATUSES: &[CodedConcept] = &[
    concept("F", HL7_V2_RESULT_STATUS, "HL7 v2 Result Status", "Final"),
    concept("P", HL7_V2_RESULT_STATUS, "HL7 v2 Result Status", "Preliminary"),
    concept("C", HL7_V2_RESULT_STATUS, "HL7 v2 Result Status", "Corrected"),
    concept("X", HL7_V2_RESULT_STATUS, "HL7 v2 Result Status", "Cancelled"),
    concept("I", HL7_V2_RESULT_STATUS, "HL7 v2 Result Status", "Pending"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    ClinicalDocumentType,
    ClinicalDocumentSectionType,
    SensitivityPolicy,
    PurposeOfUse,
    ResultStatus,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 5] = [
        ReferenceKind::ClinicalDocumentType,
        ReferenceKind::ClinicalDocumentSectionType,
        ReferenceKind::SensitivityPolicy,
        ReferenceKind::PurposeOfUse,
        ReferenceKind::ResultStatus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceKind::ClinicalDocumentType => "clinical-document-type",
            ReferenceKind::ClinicalDocumentSectionType => "clinical-document-section-type",
            ReferenceKind::SensitivityPolicy => "sensitivity-policy",
            ReferenceKind::PurposeOfUse => "purpose-of-use",
            ReferenceKind::ResultStatus => "result-status",
        }
    }

    pub fn codes(self) -> &'static [CodedConcept] {
        match self {
            ReferenceKind::ClinicalDocumentType => CLINICAL_DOCUMENT_TYPES,
            ReferenceKind::ClinicalDocumentSectionType => CLINICAL_DOCUMENT_SECTION_TYPES,
            ReferenceKind::SensitivityPolicy => SENSITIVITY_POLICIES,
            ReferenceKind::PurposeOfUse => PURPOSES_OF_USE,
            ReferenceKind::ResultStatus => RESULT_STATUSES,
        }
    }

    pub fn find(self, code: &str) -> Option<&'static CodedConcept> {
        self.codes().iter().find(|c| c.code == code)
    }
}

impl FromStr for ReferenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReferenceKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown reference kind '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique_within_each_table() {
        for kind in ReferenceKind::ALL {
            let codes: HashSet<_> = kind.codes().iter().map(|c| c.code).collect();
            assert_eq!(codes.len(), kind.codes().len(), "{}", kind.as_str());
        }
    }

    #[test]
    fn kinds_parse_from_their_path_names() {
        for kind in ReferenceKind::ALL {
            assert_eq!(kind.as_str().parse::<ReferenceKind>(), Ok(kind));
        }
        assert!("allergen".parse::<ReferenceKind>().is_err());
    }

    #[test]
    fn find_looks_up_by_code() {
        let eth = ReferenceKind::SensitivityPolicy.find("ETH").unwrap();
        assert_eq!(eth.code_system, ACT_CODE);
        assert!(ReferenceKind::PurposeOfUse.find("ETH").is_none());
    }
}
