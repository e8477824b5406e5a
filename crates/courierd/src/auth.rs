//! Shared-secret request authentication.

use std::fmt;

use thiserror::Error;

use courier_proto::RequestHeader;

/// Reasons a request header fails authentication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The header carried no token.
    #[error("request carried no auth token")]
    MissingToken,
    /// The header carried a token that does not match the shared secret.
    #[error("auth token does not match")]
    Mismatch,
}

/// Admits requests whose header token matches the configured secret.
#[derive(Clone)]
pub struct Authenticator {
    secret: String,
}

impl Authenticator {
    /// Builds an authenticator around the shared secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Checks the header token by exact string comparison.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingToken`] when no token is present and
    /// [`AuthError::Mismatch`] when it differs from the secret.
    pub fn check(&self, header: &RequestHeader) -> Result<(), AuthError> {
        match header.auth_token.as_deref() {
            None => Err(AuthError::MissingToken),
            Some(token) if token == self.secret => Ok(()),
            Some(_) => Err(AuthError::Mismatch),
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn header(token: Option<&str>) -> RequestHeader {
        RequestHeader {
            auth_token: token.map(str::to_owned),
            method: String::from("PING"),
            ..RequestHeader::default()
        }
    }

    #[rstest]
    #[case(Some("T"), Ok(()))]
    #[case(None, Err(AuthError::MissingToken))]
    #[case(Some("t"), Err(AuthError::Mismatch))]
    #[case(Some("T "), Err(AuthError::Mismatch))]
    #[case(Some(""), Err(AuthError::Mismatch))]
    fn compares_tokens_exactly(
        #[case] token: Option<&str>,
        #[case] expected: Result<(), AuthError>,
    ) {
        let auth = Authenticator::new("T");
        assert_eq!(auth.check(&header(token)), expected);
    }

    #[test]
    fn debug_output_hides_secret() {
        let rendered = format!("{:?}", Authenticator::new("hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
