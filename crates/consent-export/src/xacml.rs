//! XACML 2.0 policy rendering.
//!
//! A consent becomes one policy whose target is the patient's record and whose permit rule
//! matches the disclosing (intermediary) and receiving (recipient) providers, the permitted
//! purposes of use, and the validity window. Every do-not-share code becomes a redaction
//! obligation fulfilled on permit.

use crate::view::{CodeView, ConsentExportView, ProviderView};
use crate::{empty, end, into_string, start, text, xml_writer, ExportResult, XmlWriter};

const POLICY_NS: &str = "urn:oasis:names:tc:xacml:2.0:policy:schema:os";
const PERMIT_OVERRIDES: &str =
    "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:permit-overrides";
const STRING_EQUAL: &str = "urn:oasis:names:tc:xacml:1.0:function:string-equal";
const STRING_TYPE: &str = "http://www.w3.org/2001/XMLSchema#string";
const DATE_TIME_TYPE: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
const RESOURCE_ID: &str = "urn:oasis:names:tc:xacml:1.0:resource:resource-id";
const ACTION_ID: &str = "urn:oasis:names:tc:xacml:1.0:action:action-id";
const RECIPIENT_SUBJECT: &str = "urn:oasis:names:tc:xacml:1.0:subject-category:recipient-subject";
const INTERMEDIARY_SUBJECT: &str =
    "urn:oasis:names:tc:xacml:1.0:subject-category:intermediary-subject";
const PURPOSE_OF_USE: &str = "urn:oasis:names:tc:xspa:1.0:subject:purposeofuse";
const CURRENT_DATE_TIME: &str = "urn:oasis:names:tc:xacml:1.0:environment:current-dateTime";
const OBLIGATION_REDACT_SENSITIVITY: &str = "urn:pcm:names:obligation:redact-sensitivity-code";
const OBLIGATION_REDACT_DOCUMENT_TYPE: &str = "urn:pcm:names:obligation:redact-document-type-code";
const OBLIGATION_REDACT_SECTION: &str = "urn:pcm:names:obligation:redact-document-section-code";
const OBLIGATION_TEXT: &str = "urn:oasis:names:tc:xacml:3.0:example:attribute:text";

/// XDS transactions a consent authorises.
const PERMITTED_ACTIONS: [&str; 2] = ["xdsquery", "xdsretrieve"];

/// Which provider side a policy names in its permit rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyScope {
    /// Both disclosing and receiving providers (the enforceable consent policy).
    Full,
    /// Only the providers permitted to disclose.
    DisclosingOnly,
    /// Only the providers disclosure is made to.
    RecipientOnly,
}

impl PolicyScope {
    fn policy_id_suffix(self) -> &'static str {
        match self {
            PolicyScope::Full => "",
            PolicyScope::DisclosingOnly => ":PDF-FROM",
            PolicyScope::RecipientOnly => ":PDF-TO",
        }
    }
}

/// Render the enforceable policy for a consent.
pub fn render_policy(view: &ConsentExportView) -> ExportResult<String> {
    render(view, PolicyScope::Full)
}

/// Render the policy attached to the signed PDF for the disclosing side.
pub fn render_pdf_consent_from(view: &ConsentExportView) -> ExportResult<String> {
    render(view, PolicyScope::DisclosingOnly)
}

/// Render the policy attached to the signed PDF for the receiving side.
pub fn render_pdf_consent_to(view: &ConsentExportView) -> ExportResult<String> {
    render(view, PolicyScope::RecipientOnly)
}

pub fn render(view: &ConsentExportView, scope: PolicyScope) -> ExportResult<String> {
    view.validate()?;

    let policy_id = format!("{}{}", view.policy_id, scope.policy_id_suffix());
    let mut w = xml_writer()?;

    start(
        &mut w,
        "Policy",
        &[
            ("xmlns", POLICY_NS),
            ("PolicyId", policy_id.as_str()),
            ("RuleCombiningAlgId", PERMIT_OVERRIDES),
        ],
    )?;
    text(&mut w, "Description", &[], &view.consent_name)?;

    write_policy_target(&mut w, view)?;
    write_permit_rule(&mut w, view, scope, &policy_id)?;
    let deny_rule_id = format!("{policy_id}:deny");
    empty(
        &mut w,
        "Rule",
        &[("Effect", "Deny"), ("RuleId", deny_rule_id.as_str())],
    )?;
    write_obligations(&mut w, view)?;

    end(&mut w, "Policy")?;
    into_string(w)
}

/// `<{kind}Match>` pairing a literal value with an attribute designator.
fn write_match(
    w: &mut XmlWriter,
    kind: &str,
    value: &str,
    attribute_id: &str,
) -> ExportResult<()> {
    let match_name = format!("{kind}Match");
    let designator = format!("{kind}AttributeDesignator");
    start(w, &match_name, &[("MatchId", STRING_EQUAL)])?;
    text(w, "AttributeValue", &[("DataType", STRING_TYPE)], value)?;
    empty(
        w,
        &designator,
        &[("AttributeId", attribute_id), ("DataType", STRING_TYPE)],
    )?;
    end(w, &match_name)
}

fn write_policy_target(w: &mut XmlWriter, view: &ConsentExportView) -> ExportResult<()> {
    let cx_id = view.patient_cx_id();

    start(w, "Target", &[])?;
    start(w, "Resources", &[])?;
    start(w, "Resource", &[])?;
    write_match(w, "Resource", &cx_id, RESOURCE_ID)?;
    end(w, "Resource")?;
    end(w, "Resources")?;

    start(w, "Actions", &[])?;
    for action in PERMITTED_ACTIONS {
        start(w, "Action", &[])?;
        write_match(w, "Action", action, ACTION_ID)?;
        end(w, "Action")?;
    }
    end(w, "Actions")?;
    end(w, "Target")
}

fn write_subjects(
    w: &mut XmlWriter,
    providers: &[ProviderView],
    category: &str,
) -> ExportResult<()> {
    for provider in providers {
        start(w, "Subject", &[])?;
        write_match(w, "Subject", &provider.npi, category)?;
        end(w, "Subject")?;
    }
    Ok(())
}

fn write_permit_rule(
    w: &mut XmlWriter,
    view: &ConsentExportView,
    scope: PolicyScope,
    policy_id: &str,
) -> ExportResult<()> {
    let permit_rule_id = format!("{policy_id}:permit");
    start(
        w,
        "Rule",
        &[("Effect", "Permit"), ("RuleId", permit_rule_id.as_str())],
    )?;
    start(w, "Target", &[])?;
    start(w, "Subjects", &[])?;
    if scope != PolicyScope::RecipientOnly {
        write_subjects(w, &view.disclosing_providers, INTERMEDIARY_SUBJECT)?;
    }
    if scope != PolicyScope::DisclosingOnly {
        write_subjects(w, &view.recipient_providers, RECIPIENT_SUBJECT)?;
    }
    end(w, "Subjects")?;
    end(w, "Target")?;

    let window_start = format!("{}T00:00:00Z", view.start_date.format("%Y-%m-%d"));
    let window_end = format!("{}T23:59:59Z", view.end_date.format("%Y-%m-%d"));

    start(w, "Condition", &[])?;
    start(
        w,
        "Apply",
        &[("FunctionId", "urn:oasis:names:tc:xacml:1.0:function:and")],
    )?;

    start(
        w,
        "Apply",
        &[(
            "FunctionId",
            "urn:oasis:names:tc:xacml:1.0:function:string-at-least-one-member-of",
        )],
    )?;
    empty(
        w,
        "SubjectAttributeDesignator",
        &[("AttributeId", PURPOSE_OF_USE), ("DataType", STRING_TYPE)],
    )?;
    start(
        w,
        "Apply",
        &[("FunctionId", "urn:oasis:names:tc:xacml:1.0:function:string-bag")],
    )?;
    for purpose in &view.purposes_of_use {
        text(w, "AttributeValue", &[("DataType", STRING_TYPE)], &purpose.code)?;
    }
    end(w, "Apply")?;
    end(w, "Apply")?;

    write_date_bound(
        w,
        "urn:oasis:names:tc:xacml:1.0:function:dateTime-greater-than-or-equal",
        &window_start,
    )?;
    write_date_bound(
        w,
        "urn:oasis:names:tc:xacml:1.0:function:dateTime-less-than-or-equal",
        &window_end,
    )?;

    end(w, "Apply")?;
    end(w, "Condition")?;
    end(w, "Rule")
}

fn write_date_bound(w: &mut XmlWriter, function: &str, value: &str) -> ExportResult<()> {
    start(w, "Apply", &[("FunctionId", function)])?;
    start(
        w,
        "Apply",
        &[(
            "FunctionId",
            "urn:oasis:names:tc:xacml:1.0:function:dateTime-one-and-only",
        )],
    )?;
    empty(
        w,
        "EnvironmentAttributeDesignator",
        &[("AttributeId", CURRENT_DATE_TIME), ("DataType", DATE_TIME_TYPE)],
    )?;
    end(w, "Apply")?;
    text(w, "AttributeValue", &[("DataType", DATE_TIME_TYPE)], value)?;
    end(w, "Apply")
}

fn write_obligations(w: &mut XmlWriter, view: &ConsentExportView) -> ExportResult<()> {
    let groups: [(&str, &[CodeView]); 3] = [
        (
            OBLIGATION_REDACT_SENSITIVITY,
            view.do_not_share_sensitivity_policies.as_slice(),
        ),
        (
            OBLIGATION_REDACT_DOCUMENT_TYPE,
            view.do_not_share_document_types.as_slice(),
        ),
        (
            OBLIGATION_REDACT_SECTION,
            view.do_not_share_document_sections.as_slice(),
        ),
    ];

    if groups.iter().all(|(_, codes)| codes.is_empty()) {
        return Ok(());
    }

    start(w, "Obligations", &[])?;
    for (obligation_id, codes) in groups {
        for code in codes {
            start(
                w,
                "Obligation",
                &[("ObligationId", obligation_id), ("FulfillOn", "Permit")],
            )?;
            text(
                w,
                "AttributeAssignment",
                &[("AttributeId", OBLIGATION_TEXT), ("DataType", STRING_TYPE)],
                &code.code,
            )?;
            end(w, "Obligation")?;
        }
    }
    end(w, "Obligations")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::fixtures::sample_view;
    use crate::ExportError;

    #[test]
    fn full_policy_names_patient_providers_and_window() {
        let xml = render_policy(&sample_view()).expect("render");

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("PolicyId=\"MRN-1:&amp;2.16.840.1.113883.3.467&amp;ISO:"));
        assert!(xml.contains("MRN-1^^^&amp;2.16.840.1.113883.3.467&amp;ISO"));
        assert!(xml.contains(">1083949036<"));
        assert!(xml.contains(">1174858088<"));
        assert!(xml.contains(INTERMEDIARY_SUBJECT));
        assert!(xml.contains(RECIPIENT_SUBJECT));
        assert!(xml.contains(">TREAT<"));
        assert!(xml.contains("2026-11-01T00:00:00Z"));
        assert!(xml.contains("2027-11-01T23:59:59Z"));
        assert!(xml.contains(">xdsquery<"));
    }

    #[test]
    fn consent_name_is_escaped() {
        let xml = render_policy(&sample_view()).expect("render");
        assert!(xml.contains("<Description>Share with &lt;Dr&gt; Smith &amp; Co</Description>"));
    }

    #[test]
    fn obligations_cover_do_not_share_codes() {
        let xml = render_policy(&sample_view()).expect("render");
        assert!(xml.contains(OBLIGATION_REDACT_SENSITIVITY));
        assert!(xml.contains(">ETH<"));
        assert!(xml.contains(OBLIGATION_REDACT_SECTION));
        assert!(xml.contains(">48765-2<"));
        assert!(!xml.contains(OBLIGATION_REDACT_DOCUMENT_TYPE));
    }

    #[test]
    fn obligations_omitted_when_everything_is_shared() {
        let mut view = sample_view();
        view.do_not_share_sensitivity_policies.clear();
        view.do_not_share_document_sections.clear();
        let xml = render_policy(&view).expect("render");
        assert!(!xml.contains("<Obligations>"));
    }

    #[test]
    fn pdf_scopes_restrict_subjects() {
        let from = render_pdf_consent_from(&sample_view()).expect("render from");
        assert!(from.contains(":PDF-FROM"));
        assert!(from.contains(INTERMEDIARY_SUBJECT));
        assert!(!from.contains(RECIPIENT_SUBJECT));

        let to = render_pdf_consent_to(&sample_view()).expect("render to");
        assert!(to.contains(":PDF-TO"));
        assert!(to.contains(RECIPIENT_SUBJECT));
        assert!(!to.contains(INTERMEDIARY_SUBJECT));
    }

    #[test]
    fn refuses_consent_without_purpose_of_use() {
        let mut view = sample_view();
        view.purposes_of_use.clear();
        assert!(matches!(
            render_policy(&view),
            Err(ExportError::NoPurposeOfUse)
        ));
    }
}
