#[derive(Debug, thiserror::Error)]
pub enum PcmError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },
    #[error("the same provider cannot both disclose and receive disclosure")]
    DuplicateProviders,
    #[error("consent assertion '{assertion}' failed: {reason}")]
    Assertion {
        assertion: &'static str,
        reason: String,
    },
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to delete record file: {0}")]
    FileDelete(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
    #[error("repository lock poisoned")]
    LockPoisoned,

    #[error("export error: {0}")]
    Export(#[from] consent_export::ExportError),
    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),
    #[error("invalid text: {0}")]
    Text(#[from] pcm_types::TextError),
    #[error("failed to generate PDF: {0}")]
    Pdf(String),

    #[error("e-signature service error: {0}")]
    Signature(String),
    #[error("HIE publication failed: {0}")]
    Hie(String),
}

pub type PcmResult<T> = std::result::Result<T, PcmError>;
