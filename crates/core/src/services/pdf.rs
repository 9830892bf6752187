//! Consent and revocation documents.
//!
//! [`TextPdfGenerator`] writes a single-page PDF 1.4 file using the built-in Helvetica font.
//! Lines are wrapped at a fixed width and anything past the end of the page is cut off with a
//! marker line.

use crate::domain::{Consent, ReferenceKind, RevocationType};
use crate::services::dto::PatientDto;
use crate::services::reference::ReferenceCodeService;
use crate::PcmResult;
use std::collections::BTreeSet;
use std::fmt::Write as _;

pub trait ConsentPdfGenerator: Send + Sync {
    fn generate_consent_pdf(&self, consent: &Consent, patient: &PatientDto) -> PcmResult<Vec<u8>>;

    fn generate_revocation_pdf(
        &self,
        consent: &Consent,
        patient: &PatientDto,
        revocation_type: Option<RevocationType>,
    ) -> PcmResult<Vec<u8>>;
}

const WRAP_WIDTH: usize = 90;
const MAX_LINES: usize = 46;
const BODY_FONT_SIZE: u32 = 11;
const TITLE_FONT_SIZE: u32 = 16;

#[derive(Clone, Copy, Debug, Default)]
pub struct TextPdfGenerator {
    references: ReferenceCodeService,
}

impl TextPdfGenerator {
    fn names(&self, kind: ReferenceKind, codes: &BTreeSet<String>) -> String {
        if codes.is_empty() {
            return "(none)".to_string();
        }
        codes
            .iter()
            .map(|c| self.references.display_name(kind, c))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn consent_lines(&self, consent: &Consent, patient: &PatientDto) -> Vec<String> {
        let provider_names = |npis: BTreeSet<String>| {
            npis.iter()
                .map(|npi| format!("{} (NPI {npi})", patient.provider_name(npi)))
                .collect::<Vec<_>>()
                .join("; ")
        };

        vec![
            format!("Patient: {} {}", patient.first_name, patient.last_name),
            format!("Medical record number: {}", patient.medical_record_number),
            format!("Consent: {}", consent.name),
            format!("Consent reference: {}", consent.consent_reference_id),
            String::new(),
            format!("I authorize: {}", provider_names(consent.disclosing_npis())),
            format!("to disclose my health information to: {}", provider_names(consent.recipient_npis())),
            format!(
                "for these purposes: {}",
                self.names(ReferenceKind::PurposeOfUse, &consent.share_for_purpose_of_use_codes)
            ),
            String::new(),
            "Except for the following, which must not be shared:".to_string(),
            format!(
                "Sensitive information: {}",
                self.names(
                    ReferenceKind::SensitivityPolicy,
                    &consent.do_not_share_sensitivity_policy_codes
                )
            ),
            format!(
                "Document types: {}",
                self.names(
                    ReferenceKind::ClinicalDocumentType,
                    &consent.do_not_share_clinical_document_type_codes
                )
            ),
            format!(
                "Document sections: {}",
                self.names(
                    ReferenceKind::ClinicalDocumentSectionType,
                    &consent.do_not_share_clinical_document_section_type_codes
                )
            ),
            String::new(),
            format!(
                "This consent is effective from {} until {}.",
                consent.start_date.format("%B %-d, %Y"),
                consent.end_date.format("%B %-d, %Y")
            ),
            format!("Created {}.", consent.created_at.format("%Y-%m-%d %H:%M UTC")),
        ]
    }
}

impl ConsentPdfGenerator for TextPdfGenerator {
    fn generate_consent_pdf(&self, consent: &Consent, patient: &PatientDto) -> PcmResult<Vec<u8>> {
        Ok(render_document(
            "Consent to Share My Health Information",
            &self.consent_lines(consent, patient),
        ))
    }

    fn generate_revocation_pdf(
        &self,
        consent: &Consent,
        patient: &PatientDto,
        revocation_type: Option<RevocationType>,
    ) -> PcmResult<Vec<u8>> {
        let statement = match revocation_type {
            Some(RevocationType::EmergencyOnly) => {
                "I revoke this consent. My information may be shared only in a medical emergency."
            }
            Some(RevocationType::NoNever) => {
                "I revoke this consent. My information may never be shared, even in an emergency."
            }
            None => "I revoke this consent.",
        };
        let lines = vec![
            format!("Patient: {} {}", patient.first_name, patient.last_name),
            format!("Medical record number: {}", patient.medical_record_number),
            format!("Consent: {}", consent.name),
            format!("Consent reference: {}", consent.consent_reference_id),
            String::new(),
            statement.to_string(),
        ];
        Ok(render_document("Revocation of Consent", &lines))
    }
}

fn escape_pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn wrap(line: &str) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > WRAP_WIDTH {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn content_stream(title: &str, body: &[String]) -> String {
    let mut wrapped: Vec<String> = body.iter().flat_map(|l| wrap(l)).collect();
    if wrapped.len() > MAX_LINES {
        wrapped.truncate(MAX_LINES - 1);
        wrapped.push("[continued in the electronic record]".to_string());
    }

    let mut s = String::new();
    let _ = writeln!(s, "BT");
    let _ = writeln!(s, "/F1 {TITLE_FONT_SIZE} Tf");
    let _ = writeln!(s, "72 720 Td");
    let _ = writeln!(s, "({}) Tj", escape_pdf_text(title));
    let _ = writeln!(s, "/F1 {BODY_FONT_SIZE} Tf");
    let _ = writeln!(s, "14 TL");
    let _ = writeln!(s, "T* T*");
    for line in wrapped {
        let _ = writeln!(s, "({}) Tj T*", escape_pdf_text(&line));
    }
    let _ = writeln!(s, "ET");
    s
}

/// Assemble a one-page PDF with a correct cross-reference table.
fn render_document(title: &str, body: &[String]) -> Vec<u8> {
    let content = content_stream(title, body);
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        let _ = write!(pdf, "{} 0 obj\n{}\nendobj\n", i + 1, body);
    }

    let xref_offset = pdf.len();
    let _ = write!(pdf, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(pdf, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        pdf,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    );
    pdf.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::consent::fixtures::consent;
    use crate::services::dto::fixtures::patient_dto;

    fn text(bytes: &[u8]) -> String {
        String::from_utf8(bytes.to_vec()).expect("pdf output is ascii")
    }

    #[test]
    fn consent_pdf_lists_terms() {
        let pdf = text(
            &TextPdfGenerator::default()
                .generate_consent_pdf(&consent(1), &patient_dto(1))
                .unwrap(),
        );
        assert!(pdf.starts_with("%PDF-1.4\n"));
        assert!(pdf.ends_with("%%EOF\n"));
        assert!(pdf.contains("Valley Health Clinic \\(NPI 1083949036\\)"));
        assert!(pdf.contains("Smith, Jane"));
        assert!(pdf.contains("Treatment"));
        assert!(pdf.contains("Substance abuse information sensitivity"));
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let pdf = text(
            &TextPdfGenerator::default()
                .generate_consent_pdf(&consent(1), &patient_dto(1))
                .unwrap(),
        );
        let startxref: usize = pdf
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|n| n.parse().ok())
            .expect("startxref");
        assert!(pdf[startxref..].starts_with("xref\n0 6\n"));

        let entries: Vec<usize> = pdf[startxref..]
            .lines()
            .skip(3)
            .take(5)
            .map(|l| l[..10].parse().unwrap())
            .collect();
        for (i, offset) in entries.into_iter().enumerate() {
            assert!(pdf[offset..].starts_with(&format!("{} 0 obj", i + 1)));
        }
    }

    #[test]
    fn revocation_statement_follows_type() {
        let generator = TextPdfGenerator::default();
        let emergency = text(
            &generator
                .generate_revocation_pdf(
                    &consent(1),
                    &patient_dto(1),
                    Some(RevocationType::EmergencyOnly),
                )
                .unwrap(),
        );
        assert!(emergency.contains("only in a medical emergency"));

        let never = text(
            &generator
                .generate_revocation_pdf(&consent(1), &patient_dto(1), Some(RevocationType::NoNever))
                .unwrap(),
        );
        assert!(never.contains("never be shared"));
    }

    #[test]
    fn escapes_and_replaces_unsupported_characters() {
        assert_eq!(escape_pdf_text("a(b)\\c"), "a\\(b\\)\\\\c");
        assert_eq!(escape_pdf_text("Zoë"), "Zo?");
    }

    #[test]
    fn wraps_long_lines_on_word_boundaries() {
        let long = "word ".repeat(40);
        let lines = wrap(&long);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= WRAP_WIDTH));
        assert_eq!(wrap(""), vec![String::new()]);
    }
}
