//! Post-save consent assertions.
//!
//! Assertions run once over every consent right after it is persisted. A failing assertion
//! rolls the save back.

use crate::constants::ONE_TO_ONE_ASSERTION;
use crate::domain::Consent;
use crate::{PcmError, PcmResult};
use std::sync::Arc;

pub trait ConsentAssertion: Send + Sync {
    fn name(&self) -> &'static str;

    fn assert_consent(&self, consent: &Consent) -> PcmResult<()>;
}

/// Exactly one provider may disclose and exactly one may receive.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsentOneToOneAssertion;

impl ConsentAssertion for ConsentOneToOneAssertion {
    fn name(&self) -> &'static str {
        ONE_TO_ONE_ASSERTION
    }

    fn assert_consent(&self, consent: &Consent) -> PcmResult<()> {
        let from = consent.disclosing_npis().len();
        let to = consent.recipient_npis().len();
        if from == 1 && to == 1 {
            return Ok(());
        }
        Err(PcmError::Assertion {
            assertion: self.name(),
            reason: format!(
                "expected one disclosing and one receiving provider, found {from} and {to}"
            ),
        })
    }
}

/// Build the assertion set named in configuration.
pub fn assertions_from_names(names: &[String]) -> PcmResult<Vec<Arc<dyn ConsentAssertion>>> {
    names
        .iter()
        .map(|name| match name.as_str() {
            ONE_TO_ONE_ASSERTION => Ok(Arc::new(ConsentOneToOneAssertion) as Arc<dyn ConsentAssertion>),
            other => Err(PcmError::InvalidInput(format!(
                "unknown consent assertion '{other}'"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::consent::fixtures::consent;

    #[test]
    fn one_to_one_accepts_single_parties() {
        assert!(ConsentOneToOneAssertion.assert_consent(&consent(1)).is_ok());
    }

    #[test]
    fn one_to_one_rejects_multiple_recipients() {
        let mut c = consent(1);
        c.organizational_providers_disclosure_is_made_to = ["1083949036".to_string()].into();
        let err = ConsentOneToOneAssertion.assert_consent(&c).unwrap_err();
        assert!(matches!(err, PcmError::Assertion { assertion: "one-to-one", .. }));
    }

    #[test]
    fn builds_named_assertions() {
        let set = assertions_from_names(&["one-to-one".into()]).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].name(), "one-to-one");
        assert!(assertions_from_names(&["many-to-many".into()]).is_err());
        assert!(assertions_from_names(&[]).unwrap().is_empty());
    }
}
