//! FHIR Contract wire model for consent publication.
//!
//! A consent is published as a DSTU2 `Contract`:
//! - the patient and every named provider travel as contained resources,
//! - disclosing providers are `INTERMEDIARY` actors, receiving providers `RECIPIENT` actors,
//! - purposes of use become `actionReason`s,
//! - every withheld (do-not-share) code becomes a `withhold` term,
//! - a completed e-signature becomes the patient's `signer` entry.

use crate::patient::{self, PatientData};
use crate::wire::{
    CodeableConceptWire, ContractActorWire, ContractSignerWire, ContractTermWire, ContractWire,
    HumanNameWire, IdentifierWire, OrganizationWire, PeriodWire, PractitionerWire, ReferenceWire,
    ResourceWire,
};
use crate::{parse_json, render_json, Coding, FhirError, FhirResult};
use chrono::{DateTime, NaiveDate, Utc};

const PATIENT_REF: &str = "#patient";
const NPI_SYSTEM: &str = "http://hl7.org/fhir/sid/us-npi";
const ACTOR_ROLE_SYSTEM: &str = "http://hl7.org/fhir/contractactorrole";
const TERM_TYPE_SYSTEM: &str = "http://hl7.org/fhir/contracttermtypecodes";
const SIGNER_TYPE_SYSTEM: &str = "http://hl7.org/fhir/contractsignertypecodes";
const CONSENT_SIGNATURE_CODE: &str = "1.2.840.10065.1.12.1.7";

// ============================================================================
// Public domain-level types
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorKind {
    Practitioner,
    Organization,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorRole {
    /// Provider permitted to disclose.
    Intermediary,
    /// Provider disclosure is made to.
    Recipient,
}

impl ActorRole {
    fn to_wire(self) -> &'static str {
        match self {
            ActorRole::Intermediary => "INTERMEDIARY",
            ActorRole::Recipient => "RECIPIENT",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "INTERMEDIARY" => Some(ActorRole::Intermediary),
            "RECIPIENT" => Some(ActorRole::Recipient),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractActor {
    pub npi: String,
    /// Display name; for practitioners the family name part is the whole string.
    pub name: String,
    pub kind: ActorKind,
    pub role: ActorRole,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractSignature {
    pub signed_at: DateTime<Utc>,
    pub signer_email: String,
}

/// Domain-level carrier for a consent contract (flat structure).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractData {
    /// Resource id (must be a valid FHIR id; see [`Contract::resource_id`]).
    pub id: String,
    /// Consent policy id, published as the contract identifier.
    pub policy_id: String,
    pub identifier_system: String,
    pub issued: DateTime<Utc>,
    pub applies_start: NaiveDate,
    pub applies_end: NaiveDate,
    pub contract_type: Option<Coding>,
    pub patient: PatientData,
    pub actors: Vec<ContractActor>,
    pub purposes_of_use: Vec<Coding>,
    pub withheld: Vec<Coding>,
    pub signature: Option<ContractSignature>,
}

// ============================================================================
// Public Contract operations
// ============================================================================

/// Contract resource operations.
pub struct Contract;

impl Contract {
    /// Derive a FHIR resource id (`[A-Za-z0-9\-\.]{1,64}`) from an arbitrary policy id.
    pub fn resource_id(policy_id: &str) -> String {
        let id: String = policy_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                    c
                } else {
                    '-'
                }
            })
            .take(64)
            .collect();
        if id.is_empty() {
            "contract".to_string()
        } else {
            id
        }
    }

    /// Parse a Contract resource from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the JSON does not match the wire schema, is not a `Contract`,
    /// lacks the contained patient, or references an actor that is not contained.
    pub fn parse(json_text: &str) -> FhirResult<ContractData> {
        match parse_json::<ResourceWire>(json_text, "Contract")? {
            ResourceWire::Contract(wire) => wire_to_domain(wire),
            other => Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Contract', got '{}'",
                other.type_name()
            ))),
        }
    }

    /// Render a Contract resource as JSON text.
    pub fn render(data: &ContractData) -> FhirResult<String> {
        render_json(&ResourceWire::Contract(domain_to_wire(data)), "contract")
    }
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn actor_local_id(actor: &ContractActor) -> String {
    match actor.kind {
        ActorKind::Practitioner => format!("practitioner-{}", actor.npi),
        ActorKind::Organization => format!("organization-{}", actor.npi),
    }
}

fn concept(coding: &Coding) -> CodeableConceptWire {
    CodeableConceptWire {
        coding: vec![coding.clone()],
        text: None,
    }
}

fn domain_to_wire(data: &ContractData) -> ContractWire {
    let mut patient_wire = patient::domain_to_wire(&data.patient);
    patient_wire.id = PATIENT_REF.trim_start_matches('#').to_string();

    let mut contained = vec![ResourceWire::Patient(patient_wire)];
    let mut actors = Vec::with_capacity(data.actors.len());

    for actor in &data.actors {
        let local_id = actor_local_id(actor);
        let identifier = vec![IdentifierWire {
            system: NPI_SYSTEM.into(),
            value: actor.npi.clone(),
        }];

        // The same provider may act on both sides; contain it once.
        let already_contained = contained.iter().any(|r| match r {
            ResourceWire::Practitioner(p) => p.id == local_id,
            ResourceWire::Organization(o) => o.id == local_id,
            _ => false,
        });
        if !already_contained {
            contained.push(match actor.kind {
                ActorKind::Practitioner => ResourceWire::Practitioner(PractitionerWire {
                    id: local_id.clone(),
                    identifier,
                    name: Some(HumanNameWire {
                        use_type: None,
                        family: vec![actor.name.clone()],
                        given: vec![],
                    }),
                }),
                ActorKind::Organization => ResourceWire::Organization(OrganizationWire {
                    id: local_id.clone(),
                    identifier,
                    name: actor.name.clone(),
                }),
            });
        }

        actors.push(ContractActorWire {
            entity: ReferenceWire {
                reference: format!("#{local_id}"),
                display: Some(actor.name.clone()),
            },
            role: vec![concept(&Coding {
                system: ACTOR_ROLE_SYSTEM.into(),
                code: actor.role.to_wire().into(),
                display: None,
            })],
        });
    }

    let signer = data
        .signature
        .iter()
        .map(|s| ContractSignerWire {
            signer_type: Coding {
                system: SIGNER_TYPE_SYSTEM.into(),
                code: CONSENT_SIGNATURE_CODE.into(),
                display: Some("Consent Signature".into()),
            },
            party: ReferenceWire {
                reference: PATIENT_REF.into(),
                display: Some(s.signer_email.clone()),
            },
            signature: s.signed_at.to_rfc3339(),
        })
        .collect();

    let term = data
        .withheld
        .iter()
        .map(|code| ContractTermWire {
            term_type: concept(&Coding {
                system: TERM_TYPE_SYSTEM.into(),
                code: "withhold".into(),
                display: None,
            }),
            sub_type: concept(code),
            text: code.display.as_ref().map(|d| format!("Do not share: {d}")),
        })
        .collect();

    ContractWire {
        id: data.id.clone(),
        contained,
        identifier: IdentifierWire {
            system: data.identifier_system.clone(),
            value: data.policy_id.clone(),
        },
        issued: data.issued.to_rfc3339(),
        applies: PeriodWire {
            start: data.applies_start.format("%Y-%m-%d").to_string(),
            end: data.applies_end.format("%Y-%m-%d").to_string(),
        },
        subject: vec![ReferenceWire {
            reference: PATIENT_REF.into(),
            display: None,
        }],
        contract_type: data.contract_type.as_ref().map(concept),
        action_reason: data.purposes_of_use.iter().map(concept).collect(),
        actor: actors,
        signer,
        term,
    }
}

fn parse_date(value: &str, field: &str) -> FhirResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| FhirError::Translation(format!("Invalid {field}: {e}")))
}

fn parse_instant(value: &str, field: &str) -> FhirResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| FhirError::Translation(format!("Invalid {field}: {e}")))
}

fn first_coding(concept: CodeableConceptWire, field: &str) -> FhirResult<Coding> {
    concept
        .coding
        .into_iter()
        .next()
        .ok_or_else(|| FhirError::InvalidInput(format!("{field} has no coding")))
}

fn wire_to_domain(wire: ContractWire) -> FhirResult<ContractData> {
    let mut patient = None;
    let mut contained_actors: Vec<(String, String, String, ActorKind)> = Vec::new();

    for resource in wire.contained {
        match resource {
            ResourceWire::Patient(p) => patient = Some(patient::wire_to_domain(p)?),
            ResourceWire::Practitioner(p) => {
                let npi = p.identifier.first().map(|i| i.value.clone()).unwrap_or_default();
                let name = p.name.map(|n| n.family.join(" ")).unwrap_or_default();
                contained_actors.push((p.id, npi, name, ActorKind::Practitioner));
            }
            ResourceWire::Organization(o) => {
                let npi = o.identifier.first().map(|i| i.value.clone()).unwrap_or_default();
                contained_actors.push((o.id, npi, o.name, ActorKind::Organization));
            }
            ResourceWire::Contract(_) => {
                return Err(FhirError::InvalidInput(
                    "Contract must not contain another Contract".into(),
                ))
            }
        }
    }

    let patient = patient
        .ok_or_else(|| FhirError::InvalidInput("Contract has no contained Patient".into()))?;

    let actors = wire
        .actor
        .into_iter()
        .map(|actor| -> FhirResult<ContractActor> {
            let local_id = actor.entity.reference.trim_start_matches('#');
            let (_, npi, name, kind) = contained_actors
                .iter()
                .find(|(id, ..)| id == local_id)
                .ok_or_else(|| {
                    FhirError::InvalidInput(format!(
                        "actor references {} which is not contained",
                        actor.entity.reference
                    ))
                })?;
            let role_code = actor
                .role
                .into_iter()
                .next()
                .map(|c| first_coding(c, "actor.role"))
                .transpose()?
                .ok_or_else(|| FhirError::InvalidInput("actor has no role".into()))?;
            let role = ActorRole::from_wire(&role_code.code).ok_or_else(|| {
                FhirError::InvalidInput(format!("unknown actor role {}", role_code.code))
            })?;
            Ok(ContractActor {
                npi: npi.clone(),
                name: name.clone(),
                kind: *kind,
                role,
            })
        })
        .collect::<FhirResult<Vec<_>>>()?;

    let signature = wire
        .signer
        .into_iter()
        .next()
        .map(|s| -> FhirResult<ContractSignature> {
            Ok(ContractSignature {
                signed_at: parse_instant(&s.signature, "signer.signature")?,
                signer_email: s.party.display.unwrap_or_default(),
            })
        })
        .transpose()?;

    Ok(ContractData {
        id: wire.id,
        policy_id: wire.identifier.value,
        identifier_system: wire.identifier.system,
        issued: parse_instant(&wire.issued, "issued")?,
        applies_start: parse_date(&wire.applies.start, "applies.start")?,
        applies_end: parse_date(&wire.applies.end, "applies.end")?,
        contract_type: wire
            .contract_type
            .map(|c| first_coding(c, "type"))
            .transpose()?,
        patient,
        actors,
        purposes_of_use: wire
            .action_reason
            .into_iter()
            .map(|c| first_coding(c, "actionReason"))
            .collect::<FhirResult<Vec<_>>>()?,
        withheld: wire
            .term
            .into_iter()
            .map(|t| first_coding(t.sub_type, "term.subType"))
            .collect::<FhirResult<Vec<_>>>()?,
        signature,
    })
}
