//! Consent lifecycle: save, export, sign, revoke, delete.
//!
//! ## Lifecycle
//!
//! ```text
//! save_consent ──► CONSENT_SAVED ──create_consent_embedded_widget──► (UNSIGNED record)
//!                                  ──complete_consent_signing──────► CONSENT_SIGNED
//!                                  ──create_revocation_embedded_widget / complete_revocation_signing
//!                                                                   ► REVOCATION_REVOKED
//! ```
//!
//! A consent may be edited or deleted only until its signed document content is attached.

use crate::config::PcmConfig;
use crate::constants::{
    CONSENT_DOCUMENT_MESSAGE, DOCUMENT_SIGNED, DOCUMENT_UNSIGNED, REVOCATION_DOCUMENT_MESSAGE,
    REVOCATION_NAME_SUFFIX,
};
use crate::domain::{Consent, ConsentStage, ReferenceKind, RevocationType, SignedPdfConsent};
use crate::infrastructure::hie::HieClient;
use crate::infrastructure::signature::{EmbeddedWidgetCreationResult, SignatureService};
use crate::repositories::{consents_by_patient, Repository};
use crate::services::assertions::{assertions_from_names, ConsentAssertion};
use crate::services::check::{ConsentCheckService, OverlapConsentCheckService};
use crate::services::dto::{
    ConsentDto, ConsentListDto, ConsentPdfDto, ConsentRevokationPdfDto, PatientDto, SaveOutcome,
};
use crate::services::export::ConsentExportService;
use crate::services::fhir_service::FhirContractService;
use crate::services::patient::PatientService;
use crate::services::pdf::{ConsentPdfGenerator, TextPdfGenerator};
use crate::services::policy_id::{DefaultPolicyIdService, PolicyIdService};
use crate::services::reference::ReferenceCodeService;
use crate::{PcmError, PcmResult};
use chrono::{NaiveDate, Utc};
use pcm_types::NonEmptyText;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct ConsentService {
    consents: Arc<dyn Repository<Consent>>,
    patients: Arc<PatientService>,
    export: ConsentExportService,
    fhir: FhirContractService,
    pdf: Arc<dyn ConsentPdfGenerator>,
    signature: Arc<dyn SignatureService>,
    check: Arc<dyn ConsentCheckService>,
    policy_ids: Arc<dyn PolicyIdService>,
    assertions: Vec<Arc<dyn ConsentAssertion>>,
    references: ReferenceCodeService,
    publish_to_hie: bool,
}

impl ConsentService {
    /// Build the service with default collaborators and the configured assertion set.
    pub fn new(
        cfg: Arc<PcmConfig>,
        consents: Arc<dyn Repository<Consent>>,
        patients: Arc<PatientService>,
        signature: Arc<dyn SignatureService>,
        hie: Option<Arc<dyn HieClient>>,
    ) -> PcmResult<Self> {
        let domain = cfg.policy_domain_id();
        Ok(Self {
            consents,
            patients,
            export: ConsentExportService::new(domain),
            fhir: FhirContractService::new(domain, hie),
            pdf: Arc::new(TextPdfGenerator::default()),
            signature,
            check: Arc::new(OverlapConsentCheckService),
            policy_ids: Arc::new(DefaultPolicyIdService::new(domain)),
            assertions: assertions_from_names(cfg.consent_assertions())?,
            references: ReferenceCodeService,
            publish_to_hie: cfg.hie_publish_enabled(),
        })
    }

    pub fn with_check(mut self, check: Arc<dyn ConsentCheckService>) -> Self {
        self.check = check;
        self
    }

    pub fn with_policy_ids(mut self, policy_ids: Arc<dyn PolicyIdService>) -> Self {
        self.policy_ids = policy_ids;
        self
    }

    pub fn with_assertions(mut self, assertions: Vec<Arc<dyn ConsentAssertion>>) -> Self {
        self.assertions = assertions;
        self
    }

    pub fn with_pdf_generator(mut self, pdf: Arc<dyn ConsentPdfGenerator>) -> Self {
        self.pdf = pdf;
        self
    }

    // ------------------------------------------------------------------------
    // Saving
    // ------------------------------------------------------------------------

    /// Validate, export and persist a consent for a patient.
    ///
    /// The consent is written with exactly one repository save, after which every registered
    /// assertion runs once over the saved record. If any assertion fails the save is undone
    /// and the first assertion error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PcmError`] if:
    /// - the dates are missing, start in the past, or do not end after they start,
    /// - a provider side or the purposes of use are empty,
    /// - a named provider is not on the patient's list or appears on both sides,
    /// - a code is not in its reference table,
    /// - an update targets a consent that is unknown, foreign, or already sent for signature,
    /// - export, document generation, persistence or an assertion fails.
    pub fn save_consent(&self, dto: ConsentDto, patient_id: u64) -> PcmResult<SaveOutcome> {
        let (start_date, end_date) = match (dto.start_date, dto.end_date) {
            (Some(start), Some(end)) if Self::validate_consent_date(Some(start), Some(end)) => {
                (start, end)
            }
            _ => {
                return Err(PcmError::InvalidInput(
                    "consent must start today or later and end after it starts".into(),
                ))
            }
        };
        let name = NonEmptyText::new(&dto.name)?;
        Self::require_complete_terms(&dto)?;
        let patient = self.patients.find_patient_dto(patient_id)?;

        self.require_patient_providers(&dto, &patient)?;
        if Self::are_there_duplicates_in_two_sets(&dto.disclosing_npis(), &dto.recipient_npis()) {
            tracing::warn!(patient_id, "consent names a provider on both sides");
            return Err(PcmError::DuplicateProviders);
        }
        self.require_known_codes(&dto)?;

        let previous = match dto.id {
            Some(id) => {
                let existing = self.load(id)?;
                if existing.patient_id != patient_id {
                    return Err(PcmError::NotFound { kind: "consent", id });
                }
                if existing.signed_pdf_consent.is_some() {
                    return Err(PcmError::InvalidState(
                        "consent has been sent for signature and can no longer be edited".into(),
                    ));
                }
                Some(existing)
            }
            None => None,
        };

        let mut consent = Consent {
            id: dto.id,
            patient_id,
            name: name.to_string(),
            description: dto.description.clone().filter(|d| !d.trim().is_empty()),
            start_date,
            end_date,
            providers_permitted_to_disclose: dto.providers_permitted_to_disclose.clone(),
            organizational_providers_permitted_to_disclose: dto
                .organizational_providers_permitted_to_disclose
                .clone(),
            providers_disclosure_is_made_to: dto.providers_disclosure_is_made_to.clone(),
            organizational_providers_disclosure_is_made_to: dto
                .organizational_providers_disclosure_is_made_to
                .clone(),
            do_not_share_clinical_document_type_codes: dto
                .do_not_share_clinical_document_type_codes
                .clone(),
            do_not_share_clinical_document_section_type_codes: dto
                .do_not_share_clinical_document_section_type_codes
                .clone(),
            do_not_share_sensitivity_policy_codes: dto.do_not_share_sensitivity_policy_codes.clone(),
            share_for_purpose_of_use_codes: dto.share_for_purpose_of_use_codes.clone(),
            consent_reference_id: String::new(),
            exported_xacml_consent: None,
            xacml_pdf_consent_from: None,
            xacml_pdf_consent_to: None,
            exported_cdar2_consent: None,
            unsigned_pdf_consent: None,
            signed_pdf_consent: None,
            signed_pdf_consent_revoke: None,
            consent_revokation_type: None,
            created_at: previous
                .as_ref()
                .map(|p| p.created_at)
                .unwrap_or_else(Utc::now),
        };

        let existing = consents_by_patient(self.consents.as_ref(), patient_id)?;
        if let Some(conflict_id) = self.check.get_conflict_consent(&consent, &existing) {
            tracing::warn!(patient_id, conflict_id, "consent conflicts with an existing consent");
            return Ok(SaveOutcome::Conflict(conflict_id));
        }

        consent.consent_reference_id = self.policy_ids.generate_policy_id(&dto, &patient);
        let artifacts = self.export.export_all(&consent, &patient)?;
        consent.exported_xacml_consent = Some(artifacts.xacml);
        consent.xacml_pdf_consent_from = Some(artifacts.xacml_pdf_consent_from);
        consent.xacml_pdf_consent_to = Some(artifacts.xacml_pdf_consent_to);
        consent.exported_cdar2_consent = Some(artifacts.cdar2);
        consent.unsigned_pdf_consent = Some(self.pdf.generate_consent_pdf(&consent, &patient)?);

        let saved = self.consents.save(consent)?;
        let consent_id = saved_id(&saved)?;

        if let Err(e) = self.run_assertions(&saved) {
            match previous {
                Some(previous) => {
                    self.consents.save(previous)?;
                }
                None => {
                    self.consents.delete(consent_id)?;
                }
            }
            tracing::warn!(consent_id, "consent save rolled back: {e}");
            return Err(e);
        }

        tracing::info!(patient_id, consent_id, "consent saved");
        Ok(SaveOutcome::Saved(Box::new(saved)))
    }

    fn run_assertions(&self, consent: &Consent) -> PcmResult<()> {
        let mut first_error = None;
        for assertion in &self.assertions {
            if let Err(e) = assertion.assert_consent(consent) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Both provider sides and at least one purpose of use must be named.
    fn require_complete_terms(dto: &ConsentDto) -> PcmResult<()> {
        let missing = if dto.disclosing_npis().is_empty() {
            "a provider permitted to disclose"
        } else if dto.recipient_npis().is_empty() {
            "a provider disclosure is made to"
        } else if dto.share_for_purpose_of_use_codes.is_empty() {
            "a purpose of use"
        } else {
            return Ok(());
        };
        Err(PcmError::InvalidInput(format!("consent must name {missing}")))
    }

    fn require_patient_providers(&self, dto: &ConsentDto, patient: &PatientDto) -> PcmResult<()> {
        let individuals = dto
            .providers_permitted_to_disclose
            .iter()
            .chain(&dto.providers_disclosure_is_made_to);
        for npi in individuals {
            if !patient.individual_providers.iter().any(|p| &p.npi == npi) {
                return Err(PcmError::InvalidInput(format!(
                    "individual provider {npi} is not on the patient's provider list"
                )));
            }
        }

        let organizations = dto
            .organizational_providers_permitted_to_disclose
            .iter()
            .chain(&dto.organizational_providers_disclosure_is_made_to);
        for npi in organizations {
            if !patient.organizational_providers.iter().any(|p| &p.npi == npi) {
                return Err(PcmError::InvalidInput(format!(
                    "organizational provider {npi} is not on the patient's provider list"
                )));
            }
        }
        Ok(())
    }

    fn require_known_codes(&self, dto: &ConsentDto) -> PcmResult<()> {
        self.references.require_all(
            ReferenceKind::ClinicalDocumentType,
            &dto.do_not_share_clinical_document_type_codes,
        )?;
        self.references.require_all(
            ReferenceKind::ClinicalDocumentSectionType,
            &dto.do_not_share_clinical_document_section_type_codes,
        )?;
        self.references.require_all(
            ReferenceKind::SensitivityPolicy,
            &dto.do_not_share_sensitivity_policy_codes,
        )?;
        self.references
            .require_all(ReferenceKind::PurposeOfUse, &dto.share_for_purpose_of_use_codes)
    }

    /// Persist an existing consent entity.
    pub fn update_consent(&self, consent: Consent) -> PcmResult<Consent> {
        let id = consent
            .id
            .ok_or_else(|| PcmError::InvalidInput("consent id is required for update".into()))?;
        self.load(id)?;
        self.consents.save(consent)
    }

    pub fn save_consent_entity(&self, consent: Consent) -> PcmResult<Consent> {
        self.consents.save(consent)
    }

    /// Delete a consent unless it holds signed document content.
    ///
    /// Returns false, without touching the repository, for a signed or unknown consent.
    pub fn delete_consent(&self, id: u64) -> PcmResult<bool> {
        let Some(consent) = self.consents.find_one(id)? else {
            return Ok(false);
        };
        if consent.has_signed_content() {
            tracing::warn!(consent_id = id, "refusing to delete a signed consent");
            return Ok(false);
        }
        let deleted = self.consents.delete(id)?;
        if deleted {
            tracing::info!(consent_id = id, "consent deleted");
        }
        Ok(deleted)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn count_all_consents(&self) -> PcmResult<usize> {
        self.consents.count()
    }

    pub fn find_consent(&self, id: u64) -> PcmResult<Option<Consent>> {
        self.consents.find_one(id)
    }

    pub fn find_all_consents(&self) -> PcmResult<Vec<Consent>> {
        self.consents.find_all()
    }

    pub fn find_consent_entries(&self, first: usize, max: usize) -> PcmResult<Vec<Consent>> {
        self.consents.find_entries(first, max)
    }

    pub fn find_all_consents_dto_by_patient(&self, patient_id: u64) -> PcmResult<Vec<ConsentListDto>> {
        let patient = self.patients.find_patient_dto(patient_id)?;
        consents_by_patient(self.consents.as_ref(), patient_id)?
            .iter()
            .map(|c| self.to_list_dto(c, &patient))
            .collect()
    }

    fn to_list_dto(&self, consent: &Consent, patient: &PatientDto) -> PcmResult<ConsentListDto> {
        let provider_names = |npis: BTreeSet<String>| {
            npis.iter()
                .map(|npi| patient.provider_name(npi))
                .collect::<Vec<_>>()
        };
        let code_names = |kind: ReferenceKind, codes: &BTreeSet<String>| {
            codes
                .iter()
                .map(|code| self.references.display_name(kind, code))
                .collect::<Vec<_>>()
        };

        Ok(ConsentListDto {
            id: saved_id(consent)?,
            name: consent.name.clone(),
            description: consent.description.clone(),
            start_date: consent.start_date,
            end_date: consent.end_date,
            disclosing_provider_names: provider_names(consent.disclosing_npis()),
            recipient_provider_names: provider_names(consent.recipient_npis()),
            do_not_share_clinical_document_types: code_names(
                ReferenceKind::ClinicalDocumentType,
                &consent.do_not_share_clinical_document_type_codes,
            ),
            do_not_share_clinical_document_section_types: code_names(
                ReferenceKind::ClinicalDocumentSectionType,
                &consent.do_not_share_clinical_document_section_type_codes,
            ),
            do_not_share_sensitivity_policies: code_names(
                ReferenceKind::SensitivityPolicy,
                &consent.do_not_share_sensitivity_policy_codes,
            ),
            share_for_purposes_of_use: code_names(
                ReferenceKind::PurposeOfUse,
                &consent.share_for_purpose_of_use_codes,
            ),
            stage: consent.stage(),
            revocation_type: consent
                .consent_revokation_type
                .map(|t| t.as_str().to_string()),
        })
    }

    pub fn find_consent_dto(&self, id: u64) -> PcmResult<Option<ConsentDto>> {
        Ok(self.consents.find_one(id)?.map(|c| ConsentDto {
            id: c.id,
            name: c.name,
            description: c.description,
            start_date: Some(c.start_date),
            end_date: Some(c.end_date),
            providers_permitted_to_disclose: c.providers_permitted_to_disclose,
            organizational_providers_permitted_to_disclose: c
                .organizational_providers_permitted_to_disclose,
            providers_disclosure_is_made_to: c.providers_disclosure_is_made_to,
            organizational_providers_disclosure_is_made_to: c
                .organizational_providers_disclosure_is_made_to,
            do_not_share_clinical_document_type_codes: c.do_not_share_clinical_document_type_codes,
            do_not_share_clinical_document_section_type_codes: c
                .do_not_share_clinical_document_section_type_codes,
            do_not_share_sensitivity_policy_codes: c.do_not_share_sensitivity_policy_codes,
            share_for_purpose_of_use_codes: c.share_for_purpose_of_use_codes,
        }))
    }

    /// The consent document: signed content once attached, the unsigned rendering otherwise.
    pub fn find_consent_pdf_dto(&self, id: u64) -> PcmResult<ConsentPdfDto> {
        let consent = self.load(id)?;
        let patient = self.patients.find_patient_dto(consent.patient_id)?;
        let content = consent
            .signed_pdf_consent
            .as_ref()
            .and_then(|s| s.content.clone())
            .or_else(|| consent.unsigned_pdf_consent.clone())
            .ok_or_else(|| PcmError::InvalidState(format!("consent {id} has no document")))?;

        Ok(ConsentPdfDto {
            id,
            patient_id: consent.patient_id,
            consent_name: consent.name,
            filename: document_filename("consent", &patient, id),
            content,
        })
    }

    pub fn find_consent_revokation_pdf_dto(&self, id: u64) -> PcmResult<ConsentRevokationPdfDto> {
        let consent = self.load(id)?;
        Ok(ConsentRevokationPdfDto {
            consent_id: id,
            patient_id: consent.patient_id,
            revocation_type: consent
                .consent_revokation_type
                .map(|t| t.as_str().to_string()),
            content: consent.signed_pdf_consent_revoke.and_then(|r| r.content),
        })
    }

    pub fn is_consent_belong_to_this_user(&self, consent_id: u64, patient_id: u64) -> PcmResult<bool> {
        Ok(self
            .consents
            .find_one(consent_id)?
            .is_some_and(|c| c.patient_id == patient_id))
    }

    /// Stored XACML policy of a consent.
    pub fn find_exported_xacml(&self, id: u64) -> PcmResult<String> {
        self.load(id)?
            .exported_xacml_consent
            .ok_or_else(|| PcmError::InvalidState(format!("consent {id} has no XACML export")))
    }

    /// Stored CDA R2 consent directive of a consent.
    pub fn find_exported_cdar2(&self, id: u64) -> PcmResult<String> {
        self.load(id)?
            .exported_cdar2_consent
            .ok_or_else(|| PcmError::InvalidState(format!("consent {id} has no CDA R2 export")))
    }

    /// Current FHIR Contract rendering of a consent.
    pub fn render_fhir_contract(&self, id: u64) -> PcmResult<String> {
        let consent = self.load(id)?;
        let patient = self.patients.find_patient_dto(consent.patient_id)?;
        self.fhir.render_fhir_contract(&consent, &patient)
    }

    // ------------------------------------------------------------------------
    // Signing
    // ------------------------------------------------------------------------

    /// Attach a new, unsigned signature record for the consent document.
    pub fn sign_consent(&self, pdf: &ConsentPdfDto, document_id: &str) -> PcmResult<Consent> {
        let mut consent = self.load(pdf.id)?;
        let patient = self.patients.find_patient_dto(consent.patient_id)?;
        consent.signed_pdf_consent = Some(new_signature_record(
            document_id,
            &pdf.consent_name,
            CONSENT_DOCUMENT_MESSAGE,
            &patient,
        ));
        let saved = self.consents.save(consent)?;
        tracing::info!(consent_id = pdf.id, "consent sent out for signature");
        Ok(saved)
    }

    /// Attach a new, unsigned revocation record and stamp a recognised revocation type.
    pub fn sign_consent_revokation(
        &self,
        dto: &ConsentRevokationPdfDto,
        document_id: &str,
    ) -> PcmResult<Consent> {
        let mut consent = self.load(dto.consent_id)?;
        let patient = self.patients.find_patient_dto(consent.patient_id)?;
        let name = format!("{}{}", consent.name, REVOCATION_NAME_SUFFIX);

        if let Some(revocation_type) = dto.revocation_type.as_deref().and_then(RevocationType::parse) {
            consent.consent_revokation_type = Some(revocation_type);
        }
        consent.signed_pdf_consent_revoke = Some(new_signature_record(
            document_id,
            &name,
            REVOCATION_DOCUMENT_MESSAGE,
            &patient,
        ));

        let saved = self.consents.save(consent)?;
        tracing::info!(consent_id = dto.consent_id, "revocation sent out for signature");
        Ok(saved)
    }

    /// Open a signing widget for the consent document and record the pending signature.
    pub async fn create_consent_embedded_widget(
        &self,
        pdf: &ConsentPdfDto,
    ) -> PcmResult<EmbeddedWidgetCreationResult> {
        let consent = self.load(pdf.id)?;
        if consent.stage() != ConsentStage::ConsentSaved {
            return Err(PcmError::InvalidState(format!(
                "consent {} is already signed",
                pdf.id
            )));
        }
        let patient = self.patients.find_patient_dto(consent.patient_id)?;

        let widget = self
            .signature
            .create_embedded_widget(
                &pdf.content,
                &pdf.filename,
                &pdf.consent_name,
                None,
                &patient.email,
            )
            .await?;

        self.sign_consent(pdf, &widget.document_key)?;
        Ok(widget)
    }

    /// Open a signing widget for a revocation of a signed consent.
    ///
    /// The revocation document is generated when the request carries none.
    pub async fn create_revocation_embedded_widget(
        &self,
        dto: &ConsentRevokationPdfDto,
    ) -> PcmResult<EmbeddedWidgetCreationResult> {
        let consent = self.load(dto.consent_id)?;
        if consent.stage() != ConsentStage::ConsentSigned {
            return Err(PcmError::InvalidState(format!(
                "consent {} must be signed and not yet revoked",
                dto.consent_id
            )));
        }
        let patient = self.patients.find_patient_dto(consent.patient_id)?;
        let revocation_type = dto.revocation_type.as_deref().and_then(RevocationType::parse);

        let content = match &dto.content {
            Some(content) => content.clone(),
            None => self
                .pdf
                .generate_revocation_pdf(&consent, &patient, revocation_type)?,
        };
        let name = format!("{}{}", consent.name, REVOCATION_NAME_SUFFIX);

        let widget = self
            .signature
            .create_embedded_widget(
                &content,
                &document_filename("revocation", &patient, dto.consent_id),
                &name,
                None,
                &patient.email,
            )
            .await?;

        self.sign_consent_revokation(dto, &widget.document_key)?;
        Ok(widget)
    }

    /// Fetch the signed consent from the provider, mark it signed and publish it when enabled.
    pub async fn complete_consent_signing(&self, id: u64) -> PcmResult<Consent> {
        let mut consent = self.load(id)?;
        let document_id = pending_document_id(consent.signed_pdf_consent.as_ref(), id)?;
        let signed = self.signature.get_signed_document(&document_id).await?;

        if let Some(record) = consent.signed_pdf_consent.as_mut() {
            mark_signed(record, signed);
        }

        // Publish before storing: a failed publication must leave the signature pending.
        if self.publish_to_hie {
            let patient = self.patients.find_patient_dto(consent.patient_id)?;
            self.fhir.publish_consent_to_hie(&consent, &patient).await?;
        }
        let saved = self.consents.save(consent)?;
        tracing::info!(consent_id = id, "consent signed");
        Ok(saved)
    }

    pub async fn complete_revocation_signing(&self, id: u64) -> PcmResult<Consent> {
        let mut consent = self.load(id)?;
        let document_id = pending_document_id(consent.signed_pdf_consent_revoke.as_ref(), id)?;
        let signed = self.signature.get_signed_document(&document_id).await?;

        if let Some(record) = consent.signed_pdf_consent_revoke.as_mut() {
            mark_signed(record, signed);
        }
        let saved = self.consents.save(consent)?;
        tracing::info!(consent_id = id, "consent revoked");
        Ok(saved)
    }

    /// `CONSENT_SIGNED` when the consent document reports `SIGNED`, `CONSENT_SAVED` otherwise.
    pub fn get_consent_signed_stage(&self, id: u64) -> PcmResult<ConsentStage> {
        let consent = self.load(id)?;
        Ok(match &consent.signed_pdf_consent {
            Some(record) => ConsentStage::from_signed_status(&record.document_signed_status),
            None => ConsentStage::ConsentSaved,
        })
    }

    // ------------------------------------------------------------------------
    // Validation helpers
    // ------------------------------------------------------------------------

    /// Validate a consent window against today's UTC date.
    pub fn validate_consent_date(start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
        Self::validate_consent_date_on(start, end, Utc::now().date_naive())
    }

    /// False when either date is missing, the start is before `today`, or start ≥ end.
    pub fn validate_consent_date_on(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> bool {
        match (start, end) {
            (Some(start), Some(end)) => start >= today && start < end,
            _ => false,
        }
    }

    pub fn are_there_duplicates_in_two_sets<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> bool {
        !a.is_disjoint(b)
    }

    fn load(&self, id: u64) -> PcmResult<Consent> {
        self.consents
            .find_one(id)?
            .ok_or(PcmError::NotFound { kind: "consent", id })
    }
}

fn saved_id(consent: &Consent) -> PcmResult<u64> {
    consent
        .id
        .ok_or_else(|| PcmError::InvalidState("consent has no id".into()))
}

fn document_filename(prefix: &str, patient: &PatientDto, consent_id: u64) -> String {
    let clean = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    };
    format!(
        "{prefix}_{}_{}_{consent_id}.pdf",
        clean(&patient.last_name),
        clean(&patient.first_name)
    )
}

fn new_signature_record(
    document_id: &str,
    document_name: &str,
    message: &str,
    patient: &PatientDto,
) -> SignedPdfConsent {
    SignedPdfConsent {
        document_id: document_id.to_string(),
        document_name_by_sender: document_name.to_string(),
        document_message_by_sender: message.to_string(),
        signer_email: patient.email.clone(),
        document_signed_status: DOCUMENT_UNSIGNED.to_string(),
        document_created_by: patient.name_last_first(),
        document_sent_out_for_signature_date_time: Utc::now(),
        document_signed_date_time: None,
        content: None,
    }
}

fn pending_document_id(record: Option<&SignedPdfConsent>, consent_id: u64) -> PcmResult<String> {
    match record {
        None => Err(PcmError::InvalidState(format!(
            "consent {consent_id} has not been sent for signature"
        ))),
        Some(r) if r.is_signed() => Err(PcmError::InvalidState(format!(
            "document for consent {consent_id} is already signed"
        ))),
        Some(r) => Ok(r.document_id.clone()),
    }
}

fn mark_signed(record: &mut SignedPdfConsent, content: Vec<u8>) {
    record.document_signed_status = DOCUMENT_SIGNED.to_string();
    record.document_signed_date_time = Some(Utc::now());
    record.content = Some(content);
}
