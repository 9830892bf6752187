//! Patients and the providers they have registered.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualProvider {
    pub npi: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub credential: Option<String>,
}

impl IndividualProvider {
    /// `Last, First`, as shown on consent documents.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationalProvider {
    pub npi: String,
    pub org_name: String,
}

/// A provider a patient can add to their list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provider {
    Individual(IndividualProvider),
    Organizational(OrganizationalProvider),
}

impl Provider {
    pub fn npi(&self) -> &str {
        match self {
            Provider::Individual(p) => &p.npi,
            Provider::Organizational(p) => &p.npi,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default)]
    pub id: Option<u64>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub enterprise_identifier: Option<String>,
    pub medical_record_number: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    /// HL7 v3 administrative gender code (`M`, `F`, `UN`).
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub individual_providers: Vec<IndividualProvider>,
    #[serde(default)]
    pub organizational_providers: Vec<OrganizationalProvider>,
}

impl Patient {
    pub fn individual_provider(&self, npi: &str) -> Option<&IndividualProvider> {
        self.individual_providers.iter().find(|p| p.npi == npi)
    }

    pub fn organizational_provider(&self, npi: &str) -> Option<&OrganizationalProvider> {
        self.organizational_providers.iter().find(|p| p.npi == npi)
    }

    pub fn has_provider(&self, npi: &str) -> bool {
        self.individual_provider(npi).is_some() || self.organizational_provider(npi).is_some()
    }
}
