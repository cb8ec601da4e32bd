//! Tokens issued by a successful sign-in and the sink that receives them.
//!
//! The library derives tokens once per handshake and hands them to a
//! [`CredentialSink`] owned by the caller. Persistence, refresh, and expiry
//! tracking all live behind that boundary.

use secrecy::SecretString;
use std::fmt;

/// Tokens issued by the identity service after a completed handshake.
///
/// Token material is wrapped in [`SecretString`] so it never appears in
/// `Debug` output or logs.
#[derive(Clone)]
pub struct AuthTokens {
    pub access_token: SecretString,
    pub id_token: SecretString,
    pub refresh_token: Option<SecretString>,
    /// Seconds until the access token expires.
    pub expires_in: u64,
    /// Token scheme, e.g. `Bearer`.
    pub token_type: String,
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthTokens")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Receives the tokens of a completed handshake.
///
/// Implementations must not fail; a sink that can fail should record the
/// problem itself rather than abort an already successful sign-in.
pub trait CredentialSink {
    fn store(&self, tokens: &AuthTokens);
}

/// Sink for callers that only want the return value of
/// [`sign_in`](crate::srp::SrpClient::sign_in).
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardTokens;

impl CredentialSink for DiscardTokens {
    fn store(&self, _tokens: &AuthTokens) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_token_material() {
        let tokens = AuthTokens {
            access_token: SecretString::from("access-secret".to_string()),
            id_token: SecretString::from("id-secret".to_string()),
            refresh_token: Some(SecretString::from("refresh-secret".to_string())),
            expires_in: 3600,
            token_type: "Bearer".to_string(),
        };

        let rendered = format!("{tokens:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("Bearer"));
        assert!(rendered.contains("3600"));
    }
}
