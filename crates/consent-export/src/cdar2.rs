//! HL7 CDA R2 privacy consent directive rendering.

use crate::view::{ConsentExportView, ProviderKind, ProviderView};
use crate::{empty, end, into_string, start, text, xml_writer, ExportResult, XmlWriter, NPI_OID};

const LOINC_OID: &str = "2.16.840.1.113883.6.1";
const CONFIDENTIALITY_OID: &str = "2.16.840.1.113883.5.25";
const GENDER_OID: &str = "2.16.840.1.113883.5.1";
const CDA_TYPE_ID: &str = "2.16.840.1.113883.1.3";
const CONSENT_DIRECTIVE_TEMPLATE: &str = "2.16.840.1.113883.3.445.1";
const PRIVACY_CONSENT_CODE: &str = "57016-8";
const PRIVACY_CONSENT_DISPLAY: &str = "Privacy Policy Acknowledgement Document";

/// Render a consent as a CDA R2 consent directive document.
pub fn render_consent_directive(view: &ConsentExportView) -> ExportResult<String> {
    view.validate()?;

    let created = view.created_at.format("%Y%m%d%H%M%S+0000").to_string();
    let mut w = xml_writer()?;

    start(
        &mut w,
        "ClinicalDocument",
        &[
            ("xmlns", "urn:hl7-org:v3"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    empty(&mut w, "realmCode", &[("code", "US")])?;
    empty(
        &mut w,
        "typeId",
        &[("root", CDA_TYPE_ID), ("extension", "POCD_HD000040")],
    )?;
    empty(&mut w, "templateId", &[("root", CONSENT_DIRECTIVE_TEMPLATE)])?;
    empty(
        &mut w,
        "id",
        &[
            ("root", view.policy_domain_id.as_str()),
            ("extension", view.policy_id.as_str()),
        ],
    )?;
    empty(
        &mut w,
        "code",
        &[
            ("code", PRIVACY_CONSENT_CODE),
            ("codeSystem", LOINC_OID),
            ("codeSystemName", "LOINC"),
            ("displayName", PRIVACY_CONSENT_DISPLAY),
        ],
    )?;
    text(
        &mut w,
        "title",
        &[],
        &format!("Consent Directive: {}", view.consent_name),
    )?;
    empty(&mut w, "effectiveTime", &[("value", created.as_str())])?;
    empty(
        &mut w,
        "confidentialityCode",
        &[("code", "N"), ("codeSystem", CONFIDENTIALITY_OID)],
    )?;
    empty(&mut w, "languageCode", &[("code", "en-US")])?;

    write_record_target(&mut w, view)?;
    write_author(&mut w, view, &created)?;
    write_custodian(&mut w, view)?;
    write_service_event(&mut w, view)?;
    write_body(&mut w, view)?;

    end(&mut w, "ClinicalDocument")?;
    into_string(w)
}

fn write_person_name(w: &mut XmlWriter, given: &str, family: &str) -> ExportResult<()> {
    start(w, "name", &[])?;
    text(w, "given", &[], given)?;
    text(w, "family", &[], family)?;
    end(w, "name")
}

fn write_record_target(w: &mut XmlWriter, view: &ConsentExportView) -> ExportResult<()> {
    let patient = &view.patient;
    let telecom = format!("mailto:{}", patient.email);

    start(w, "recordTarget", &[])?;
    start(w, "patientRole", &[])?;
    empty(
        w,
        "id",
        &[
            ("root", view.policy_domain_id.as_str()),
            ("extension", patient.medical_record_number.as_str()),
        ],
    )?;
    empty(w, "telecom", &[("value", telecom.as_str())])?;

    start(w, "patient", &[])?;
    write_person_name(w, &patient.first_name, &patient.last_name)?;
    match patient.gender_code.as_deref() {
        Some(code) => empty(
            w,
            "administrativeGenderCode",
            &[("code", code), ("codeSystem", GENDER_OID)],
        )?,
        None => empty(w, "administrativeGenderCode", &[("nullFlavor", "UNK")])?,
    }
    match patient.birth_date {
        Some(birth_date) => {
            let value = birth_date.format("%Y%m%d").to_string();
            empty(w, "birthTime", &[("value", value.as_str())])?
        }
        None => empty(w, "birthTime", &[("nullFlavor", "UNK")])?,
    }
    end(w, "patient")?;

    end(w, "patientRole")?;
    end(w, "recordTarget")
}

fn write_author(w: &mut XmlWriter, view: &ConsentExportView, created: &str) -> ExportResult<()> {
    let patient = &view.patient;
    start(w, "author", &[])?;
    empty(w, "time", &[("value", created)])?;
    start(w, "assignedAuthor", &[])?;
    empty(
        w,
        "id",
        &[
            ("root", view.policy_domain_id.as_str()),
            ("extension", patient.medical_record_number.as_str()),
        ],
    )?;
    start(w, "assignedPerson", &[])?;
    write_person_name(w, &patient.first_name, &patient.last_name)?;
    end(w, "assignedPerson")?;
    end(w, "assignedAuthor")?;
    end(w, "author")
}

fn write_custodian(w: &mut XmlWriter, view: &ConsentExportView) -> ExportResult<()> {
    start(w, "custodian", &[])?;
    start(w, "assignedCustodian", &[])?;
    start(w, "representedCustodianOrganization", &[])?;
    empty(w, "id", &[("root", view.policy_domain_id.as_str())])?;
    text(w, "name", &[], "Patient Consent Management")?;
    end(w, "representedCustodianOrganization")?;
    end(w, "assignedCustodian")?;
    end(w, "custodian")
}

fn write_performer(w: &mut XmlWriter, provider: &ProviderView, function: &str) -> ExportResult<()> {
    start(w, "performer", &[("typeCode", "PRF")])?;
    empty(w, "functionCode", &[("code", function)])?;
    start(w, "assignedEntity", &[])?;
    empty(
        w,
        "id",
        &[("root", NPI_OID), ("extension", provider.npi.as_str())],
    )?;
    match provider.kind {
        ProviderKind::Individual => {
            start(w, "assignedPerson", &[])?;
            start(w, "name", &[])?;
            text(w, "family", &[], &provider.name)?;
            end(w, "name")?;
            end(w, "assignedPerson")?;
        }
        ProviderKind::Organization => {
            start(w, "representedOrganization", &[])?;
            text(w, "name", &[], &provider.name)?;
            end(w, "representedOrganization")?;
        }
    }
    end(w, "assignedEntity")?;
    end(w, "performer")
}

fn write_service_event(w: &mut XmlWriter, view: &ConsentExportView) -> ExportResult<()> {
    let low = view.start_date.format("%Y%m%d").to_string();
    let high = view.end_date.format("%Y%m%d").to_string();

    start(w, "documentationOf", &[])?;
    start(w, "serviceEvent", &[("classCode", "ACT")])?;
    for purpose in &view.purposes_of_use {
        empty(
            w,
            "code",
            &[
                ("code", purpose.code.as_str()),
                ("codeSystem", purpose.code_system.as_str()),
                ("displayName", purpose.display_name.as_str()),
            ],
        )?;
    }
    start(w, "effectiveTime", &[])?;
    empty(w, "low", &[("value", low.as_str())])?;
    empty(w, "high", &[("value", high.as_str())])?;
    end(w, "effectiveTime")?;
    for provider in &view.disclosing_providers {
        write_performer(w, provider, "INTERMEDIARY")?;
    }
    for provider in &view.recipient_providers {
        write_performer(w, provider, "RECIPIENT")?;
    }
    end(w, "serviceEvent")?;
    end(w, "documentationOf")
}

fn write_body(w: &mut XmlWriter, view: &ConsentExportView) -> ExportResult<()> {
    let patient_name = format!("{} {}", view.patient.first_name, view.patient.last_name);
    let from: Vec<&str> = view
        .disclosing_providers
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    let to: Vec<&str> = view
        .recipient_providers
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    let purposes: Vec<&str> = view
        .purposes_of_use
        .iter()
        .map(|c| c.display_name.as_str())
        .collect();

    start(w, "component", &[])?;
    start(w, "structuredBody", &[])?;
    start(w, "component", &[])?;
    start(w, "section", &[])?;
    text(w, "title", &[], "Consent Directive Details")?;
    start(w, "text", &[])?;
    start(w, "list", &[])?;
    for item in [
        format!("Patient: {patient_name}"),
        format!("Authorizes: {}", from.join(", ")),
        format!("To disclose to: {}", to.join(", ")),
        format!("For: {}", purposes.join(", ")),
        format!("Effective {} to {}", view.start_date, view.end_date),
    ] {
        text(w, "item", &[], &item)?;
    }
    end(w, "list")?;
    end(w, "text")?;

    let withheld = view
        .do_not_share_sensitivity_policies
        .iter()
        .chain(&view.do_not_share_document_types)
        .chain(&view.do_not_share_document_sections);
    for code in withheld {
        start(w, "entry", &[])?;
        start(
            w,
            "act",
            &[("classCode", "ACT"), ("moodCode", "DEF"), ("negationInd", "true")],
        )?;
        empty(
            w,
            "code",
            &[
                ("code", code.code.as_str()),
                ("codeSystem", code.code_system.as_str()),
                ("displayName", code.display_name.as_str()),
            ],
        )?;
        end(w, "act")?;
        end(w, "entry")?;
    }

    end(w, "section")?;
    end(w, "component")?;
    end(w, "structuredBody")?;
    end(w, "component")
}
