use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A patient-reported allergy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allergy {
    #[serde(default)]
    pub id: Option<u64>,
    pub patient_id: u64,
    pub allergen: String,
    #[serde(default)]
    pub reaction: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    /// Code from the result status table.
    pub status_code: String,
    #[serde(default)]
    pub onset_date: Option<NaiveDate>,
}
