//! Constants used throughout the PCM core crate.

/// Default directory for record storage when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "pcm_data";

/// Default assigning-authority OID for medical record numbers.
pub const DEFAULT_POLICY_DOMAIN_ID: &str = "2.16.840.1.113883.3.467";

/// Document signed status once the e-signature provider reports completion.
pub const DOCUMENT_SIGNED: &str = "SIGNED";

/// Document signed status while a signing widget is outstanding.
pub const DOCUMENT_UNSIGNED: &str = "UNSIGNED";

/// Appended to the consent name when a revocation is sent for signature.
pub const REVOCATION_NAME_SUFFIX: &str = " Revocation";

pub const CONSENT_DOCUMENT_MESSAGE: &str =
    "Please review and sign this consent to share your health information.";

pub const REVOCATION_DOCUMENT_MESSAGE: &str =
    "Please review and sign this revocation of your consent to share your health information.";

/// Name of the one-to-one consent assertion in `PCM_CONSENT_ASSERTIONS`.
pub const ONE_TO_ONE_ASSERTION: &str = "one-to-one";

/// Identifier system for provider NPIs in published resources.
pub const NPI_SYSTEM: &str = "http://hl7.org/fhir/sid/us-npi";
