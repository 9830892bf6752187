//! Consent export formats.
//!
//! This crate renders a resolved consent into the documents downstream systems consume:
//! - XACML 2.0 access-control policies (the enforceable form of the consent)
//! - HL7 CDA R2 privacy consent directives (the clinical-document form)
//!
//! It knows nothing about storage or services. Callers build a [`ConsentExportView`] with every
//! identifier and display name already resolved, and the renderers only translate it.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

pub mod cdar2;
pub mod view;
pub mod xacml;

pub use view::{CodeView, ConsentExportView, PatientView, ProviderKind, ProviderView};
pub use xacml::PolicyScope;

/// OID of the NPI identifier system.
pub const NPI_OID: &str = "2.16.840.1.113883.4.6";

/// Errors returned by the export renderers.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("consent has no provider permitted to disclose")]
    NoDisclosingProvider,

    #[error("consent has no provider to disclose to")]
    NoRecipientProvider,

    #[error("consent has no purpose of use")]
    NoPurposeOfUse,

    #[error("consent end date {end} is before start date {start}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Indented writer with the XML declaration already written.
fn xml_writer() -> ExportResult<XmlWriter> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    Ok(writer)
}

fn element<'a>(name: &'a str, attrs: &[(&'a str, &'a str)]) -> BytesStart<'a> {
    BytesStart::new(name).with_attributes(attrs.iter().copied())
}

fn start(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> ExportResult<()> {
    writer.write_event(Event::Start(element(name, attrs)))?;
    Ok(())
}

fn end(writer: &mut XmlWriter, name: &str) -> ExportResult<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn empty(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> ExportResult<()> {
    writer.write_event(Event::Empty(element(name, attrs)))?;
    Ok(())
}

/// `<name attrs>text</name>` with the text escaped.
fn text(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)], content: &str) -> ExportResult<()> {
    start(writer, name, attrs)?;
    writer.write_event(Event::Text(BytesText::new(content)))?;
    end(writer, name)
}

fn into_string(writer: XmlWriter) -> ExportResult<String> {
    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}
