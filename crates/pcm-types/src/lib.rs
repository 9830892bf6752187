//! Validated primitive types shared across the PCM crates.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input was not a plausible email address
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    /// The input was not a ten digit National Provider Identifier
    #[error("invalid NPI: {0}")]
    InvalidNpi(String),
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An email address with a single `@`, a non-empty local part and a dotted domain.
///
/// Stored lowercased so that signer lookups compare equal regardless of input casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        let invalid = || TextError::InvalidEmail(trimmed.to_owned());

        let (local, domain) = trimmed.split_once('@').ok_or_else(invalid)?;
        if local.is_empty() || domain.contains('@') || trimmed.contains(char::is_whitespace) {
            return Err(invalid());
        }
        match domain.rsplit_once('.') {
            Some((host, tld)) if !host.is_empty() && !tld.is_empty() => {}
            _ => return Err(invalid()),
        }

        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// National Provider Identifier: exactly ten ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Npi(String);

impl Npi {
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.len() != 10 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TextError::InvalidNpi(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_newtype_impls {
    ($ty:ident, $ctor:ident) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::str::FromStr for $ty {
            type Err = TextError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::$ctor(s)
            }
        }

        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $ty::$ctor(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

string_newtype_impls!(NonEmptyText, new);
string_newtype_impls!(EmailAddress, parse);
string_newtype_impls!(Npi, parse);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_and_rejects_blank() {
        assert_eq!(NonEmptyText::new("  Consent A ").unwrap().as_str(), "Consent A");
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
    }

    #[test]
    fn email_is_lowercased() {
        let email = EmailAddress::parse("Patient@Example.COM").unwrap();
        assert_eq!(email.as_str(), "patient@example.com");
    }

    #[test]
    fn email_rejects_malformed_input() {
        for bad in ["", "no-at-sign", "@example.com", "a@b", "a@@b.com", "a b@c.com"] {
            assert!(EmailAddress::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn npi_requires_ten_digits() {
        assert!(Npi::parse("1234567890").is_ok());
        assert!(Npi::parse("123456789").is_err());
        assert!(Npi::parse("12345678901").is_err());
        assert!(Npi::parse("12345x7890").is_err());
    }

    #[test]
    fn deserialize_validates() {
        let npi: Npi = serde_json::from_str("\"1083949036\"").unwrap();
        assert_eq!(npi.as_str(), "1083949036");
        assert!(serde_json::from_str::<Npi>("\"abc\"").is_err());
    }
}
