//! Error taxonomy for the handshake and the authorization resolver.
//!
//! Handshake failures abort the whole sign-in attempt; nothing is retried
//! internally. Resolver lookups only fail under
//! [`MissingRuleBehavior::Strict`](crate::authz::MissingRuleBehavior) —
//! otherwise an unusable candidate list degrades to
//! [`AuthorizationMode::None`](crate::authz::AuthorizationMode) and the
//! authorization failure is deferred to the request itself.

use crate::authz::Operation;
use thiserror::Error;

/// Failure of a single SRP sign-in attempt.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Underlying transport failure, wrapped with its cause. Retry policy
    /// belongs to the caller.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
    /// The password-verifier challenge omitted a required parameter.
    #[error("challenge missing parameter: {0}")]
    MissingChallengeParameter(&'static str),
    /// A challenge parameter was present but could not be decoded.
    #[error("malformed challenge parameter {name}: {reason}")]
    MalformedChallengeParameter {
        name: &'static str,
        reason: String,
    },
    /// The server ephemeral was divisible by the group modulus. A zero
    /// residue forces the shared secret to zero, so it is rejected rather
    /// than accepted.
    #[error("server ephemeral is divisible by the group modulus")]
    DegenerateServerEphemeral,
    /// The scrambling parameter `H(A, B)` hashed to zero.
    #[error("scrambling parameter hashed to zero")]
    ZeroScramble,
    /// Session key expansion failed.
    #[error("session key derivation failed")]
    KeyDerivation,
    /// The identity service issued a challenge this client does not speak.
    /// Unknown challenges are never guessed at.
    #[error("unsupported challenge type: {0}")]
    UnsupportedChallenge(String),
    /// The challenge timestamp could not be formatted.
    #[error("timestamp formatting failed")]
    Timestamp(#[from] time::error::Format),
}

/// Failure to resolve an authorization mode for an entity/operation pair.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolverError {
    /// No access rules were registered for the requested pair and the
    /// resolver was built with strict missing-rule behavior.
    #[error("no access rules for {entity} {operation}")]
    Unconfigured { entity: String, operation: Operation },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::Operation;

    #[test]
    fn transport_errors_keep_their_cause() {
        let err = AuthError::from(anyhow::anyhow!("connection refused"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn unconfigured_names_the_pair() {
        let err = ResolverError::Unconfigured {
            entity: "Post".to_string(),
            operation: Operation::Read,
        };
        assert_eq!(err.to_string(), "no access rules for Post read");
    }
}
