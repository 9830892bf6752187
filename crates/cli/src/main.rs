use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use pcm_core::constants::{DEFAULT_DATA_DIR, DEFAULT_POLICY_DOMAIN_ID};
use pcm_core::domain::ReferenceKind;
use pcm_core::services::ConsentService;
use pcm_core::{PcmConfig, Services, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pcm")]
#[command(about = "Patient consent management CLI")]
struct Cli {
    /// Directory holding the JSON record store
    #[arg(long, env = "PCM_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
    /// OID of the policy domain used in exports
    #[arg(long, env = "PCM_POLICY_DOMAIN_ID", default_value = DEFAULT_POLICY_DOMAIN_ID)]
    policy_domain_id: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Xacml,
    Cdar2,
    Fhir,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients
    Patients,
    /// List a patient's consents as YAML
    Consents {
        /// Patient id
        patient_id: u64,
    },
    /// Print the signing stage of a consent
    Stage {
        /// Consent id
        consent_id: u64,
    },
    /// Print an exported consent document
    Export {
        /// Consent id
        consent_id: u64,
        #[arg(long, value_enum, default_value = "xacml")]
        format: ExportFormat,
    },
    /// Check a consent validity window against today's date
    ValidateDates {
        /// Start date (YYYY-MM-DD)
        start: String,
        /// End date (YYYY-MM-DD)
        end: String,
    },
    /// Print a reference code table as YAML
    Reference {
        /// clinical-document-type, clinical-document-section-type, sensitivity-policy,
        /// purpose-of-use or result-status
        kind: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let open = || -> Result<Services, Box<dyn std::error::Error>> {
        let cfg = PcmConfig::new(
            cli.data_dir.clone(),
            StorageBackend::File,
            cli.policy_domain_id.clone(),
        )?;
        Ok(Services::from_config(Arc::new(cfg))?)
    };

    match cli.command {
        Some(Commands::Patients) => {
            let patients = open()?.patients.list_patients()?;
            if patients.is_empty() {
                println!("No patients found.");
            }
            for patient in patients {
                println!(
                    "ID: {}, Username: {}, Name: {}, {}, MRN: {}",
                    patient.id.unwrap_or_default(),
                    patient.username,
                    patient.last_name,
                    patient.first_name,
                    patient.medical_record_number
                );
            }
        }
        Some(Commands::Consents { patient_id }) => {
            let consents = open()?.consents.find_all_consents_dto_by_patient(patient_id)?;
            print!("{}", serde_yaml::to_string(&consents)?);
        }
        Some(Commands::Stage { consent_id }) => {
            let stage = open()?.consents.get_consent_signed_stage(consent_id)?;
            println!("{}", stage.as_str());
        }
        Some(Commands::Export { consent_id, format }) => {
            let services = open()?;
            let document = match format {
                ExportFormat::Xacml => services.consents.find_exported_xacml(consent_id)?,
                ExportFormat::Cdar2 => services.consents.find_exported_cdar2(consent_id)?,
                ExportFormat::Fhir => services.consents.render_fhir_contract(consent_id)?,
            };
            println!("{document}");
        }
        Some(Commands::ValidateDates { start, end }) => {
            let start: NaiveDate = start.parse()?;
            let end: NaiveDate = end.parse()?;
            if ConsentService::validate_consent_date(Some(start), Some(end)) {
                println!("valid");
            } else {
                println!("invalid: consent must start today or later and end after it starts");
                std::process::exit(1);
            }
        }
        Some(Commands::Reference { kind }) => {
            let kind: ReferenceKind = kind.parse()?;
            print!("{}", serde_yaml::to_string(kind.codes())?);
        }
        None => {
            println!("No command given. Use --help for usage.");
        }
    }

    Ok(())
}
