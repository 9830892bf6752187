//! Shared FHIR DSTU2 wire structures.
//!
//! Every struct rejects unknown keys so that drift between producer and consumer is caught at
//! parse time rather than silently dropped.

use crate::Coding;
use serde::{Deserialize, Serialize};

/// Any resource this crate reads or writes, discriminated by `resourceType`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "resourceType")]
pub(crate) enum ResourceWire {
    Patient(PatientWire),
    Practitioner(PractitionerWire),
    Organization(OrganizationWire),
    Contract(ContractWire),
}

impl ResourceWire {
    pub fn type_name(&self) -> &'static str {
        match self {
            ResourceWire::Patient(_) => "Patient",
            ResourceWire::Practitioner(_) => "Practitioner",
            ResourceWire::Organization(_) => "Organization",
            ResourceWire::Contract(_) => "Contract",
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct IdentifierWire {
    pub system: String,
    pub value: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct HumanNameWire {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub family: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ContactPointWire {
    pub system: String,
    pub value: String,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct PatientWire {
    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<IdentifierWire>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanNameWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPointWire>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(rename = "birthDate", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct PractitionerWire {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<IdentifierWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<HumanNameWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct OrganizationWire {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<IdentifierWire>,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct CodeableConceptWire {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ReferenceWire {
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct PeriodWire {
    pub start: String,
    pub end: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ContractActorWire {
    pub entity: ReferenceWire,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role: Vec<CodeableConceptWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ContractSignerWire {
    #[serde(rename = "type")]
    pub signer_type: Coding,
    pub party: ReferenceWire,
    pub signature: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ContractTermWire {
    #[serde(rename = "type")]
    pub term_type: CodeableConceptWire,
    #[serde(rename = "subType")]
    pub sub_type: CodeableConceptWire,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ContractWire {
    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contained: Vec<ResourceWire>,

    pub identifier: IdentifierWire,

    pub issued: String,

    pub applies: PeriodWire,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject: Vec<ReferenceWire>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<CodeableConceptWire>,

    #[serde(rename = "actionReason", default, skip_serializing_if = "Vec::is_empty")]
    pub action_reason: Vec<CodeableConceptWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actor: Vec<ContractActorWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signer: Vec<ContractSignerWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub term: Vec<ContractTermWire>,
}
