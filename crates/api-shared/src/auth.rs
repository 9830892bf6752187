/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing API key")]
    Missing,
    #[error("invalid API key")]
    Invalid,
}

/// Validates the provided API key against the configured key.
///
/// Returns `Ok(())` if the key matches, or an error if it is invalid or missing.
pub fn validate_api_key(provided_key: Option<&str>, expected_key: &str) -> Result<(), AuthError> {
    match provided_key {
        None => Err(AuthError::Missing),
        Some(key) if key == expected_key => Ok(()),
        Some(_) => Err(AuthError::Invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_key() {
        assert_eq!(validate_api_key(Some("secret"), "secret"), Ok(()));
    }

    #[test]
    fn rejects_missing_or_wrong_key() {
        assert_eq!(validate_api_key(None, "secret"), Err(AuthError::Missing));
        assert_eq!(validate_api_key(Some("guess"), "secret"), Err(AuthError::Invalid));
    }
}
