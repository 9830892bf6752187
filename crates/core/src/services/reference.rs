use crate::domain::{CodedConcept, ReferenceKind};
use crate::{PcmError, PcmResult};
use std::collections::BTreeSet;

/// Read-only access to the static reference tables.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceCodeService;

impl ReferenceCodeService {
    pub fn list(&self, kind: ReferenceKind) -> &'static [CodedConcept] {
        kind.codes()
    }

    pub fn find(&self, kind: ReferenceKind, code: &str) -> Option<&'static CodedConcept> {
        kind.find(code)
    }

    /// Display name for a code, or the code itself when unknown.
    pub fn display_name(&self, kind: ReferenceKind, code: &str) -> String {
        kind.find(code)
            .map(|c| c.display_name.to_string())
            .unwrap_or_else(|| code.to_string())
    }

    /// Fails on the first code not present in the table.
    pub fn require_all(&self, kind: ReferenceKind, codes: &BTreeSet<String>) -> PcmResult<()> {
        match codes.iter().find(|code| kind.find(code).is_none()) {
            Some(unknown) => Err(PcmError::InvalidInput(format!(
                "unknown {} code '{unknown}'",
                kind.as_str()
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_code() {
        let svc = ReferenceCodeService;
        assert_eq!(svc.display_name(ReferenceKind::PurposeOfUse, "TREAT"), "Treatment");
        assert_eq!(svc.display_name(ReferenceKind::PurposeOfUse, "ZZZ"), "ZZZ");
    }

    #[test]
    fn require_all_names_the_unknown_code() {
        let svc = ReferenceCodeService;
        let codes: BTreeSet<String> = ["ETH".into(), "NOPE".into()].into();
        let err = svc
            .require_all(ReferenceKind::SensitivityPolicy, &codes)
            .unwrap_err();
        assert!(err.to_string().contains("NOPE"));
    }
}
