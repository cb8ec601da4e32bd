//! SRP handshake controller.
//!
//! Drives the two-round-trip sign-in: initiate with a fresh ephemeral,
//! answer the password-verifier challenge with a derived-key signature,
//! collect tokens. The password itself never crosses the wire; the server
//! only ever sees the public ephemeral and the challenge signature.
//!
//! Each [`SrpClient::sign_in`] call is one independent handshake. All key
//! material is owned by the call and dropped when it returns or when the
//! returned future is dropped, so concurrent sign-ins share nothing.

pub mod group;
pub mod key;
pub mod math;

use crate::credentials::{AuthTokens, CredentialSink, DiscardTokens};
use crate::error::AuthError;
use crate::srp::math::SrpEphemeral;
use crate::transport::{
    Challenge, IdentityTransport, InitiateOutcome, CHALLENGE_PASSWORD_VERIFIER,
    PARAM_PASSWORD_SIGNATURE, PARAM_SALT, PARAM_SECRET_BLOCK, PARAM_SRP_B, PARAM_TIMESTAMP,
    PARAM_USERNAME, PARAM_USER_ID,
};
use base64ct::{Base64, Encoding};
use num_bigint::BigUint;
use secrecy::SecretString;
use std::collections::HashMap;
use time::OffsetDateTime;
use tracing::debug;

/// Progress of one handshake attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandshakeState {
    Initiated,
    ChallengeReceived,
    Verified,
    Complete,
    Failed,
}

fn advance(state: &mut HandshakeState, next: HandshakeState) {
    debug!(from = ?state, to = ?next, "handshake transition");
    *state = next;
}

fn fail(state: &mut HandshakeState, error: AuthError) -> AuthError {
    advance(state, HandshakeState::Failed);
    error
}

/// Challenge parameters decoded into protocol form.
struct ChallengeMaterial {
    user_id: String,
    username: String,
    salt: BigUint,
    server_public: BigUint,
    secret_block: Vec<u8>,
    secret_block_b64: String,
}

impl ChallengeMaterial {
    fn extract(challenge: &Challenge) -> Result<Self, AuthError> {
        let salt = parse_hex(PARAM_SALT, challenge.parameter(PARAM_SALT)?)?;
        let server_public = parse_hex(PARAM_SRP_B, challenge.parameter(PARAM_SRP_B)?)?;
        let secret_block_b64 = challenge.parameter(PARAM_SECRET_BLOCK)?.to_string();
        let secret_block = Base64::decode_vec(&secret_block_b64).map_err(|err| {
            AuthError::MalformedChallengeParameter {
                name: PARAM_SECRET_BLOCK,
                reason: err.to_string(),
            }
        })?;
        let user_id = challenge.parameter(PARAM_USER_ID)?.to_string();
        let username = challenge.parameter(PARAM_USERNAME)?.to_string();

        Ok(Self {
            user_id,
            username,
            salt,
            server_public,
            secret_block,
            secret_block_b64,
        })
    }
}

fn parse_hex(name: &'static str, value: &str) -> Result<BigUint, AuthError> {
    BigUint::parse_bytes(value.as_bytes(), 16).ok_or_else(|| {
        AuthError::MalformedChallengeParameter {
            name,
            reason: "invalid hexadecimal".to_string(),
        }
    })
}

/// SRP sign-in client for one user pool.
///
/// The transport and the credential sink are injected; the client holds no
/// other state, so one instance can serve any number of concurrent
/// handshakes.
pub struct SrpClient<T, S = DiscardTokens> {
    transport: T,
    sink: S,
    pool_id: String,
}

impl<T: IdentityTransport> SrpClient<T> {
    /// Client that only returns tokens to the caller.
    pub fn new(transport: T, pool_id: impl Into<String>) -> Self {
        Self {
            transport,
            sink: DiscardTokens,
            pool_id: pool_id.into(),
        }
    }
}

impl<T: IdentityTransport, S: CredentialSink> SrpClient<T, S> {
    /// Client that also delivers tokens to `sink` once per successful
    /// handshake.
    pub fn with_sink(transport: T, pool_id: impl Into<String>, sink: S) -> Self {
        Self {
            transport,
            sink,
            pool_id: pool_id.into(),
        }
    }

    /// The pool name without its region prefix; part of the hashed
    /// identity on both sides of the protocol.
    fn pool_fragment(&self) -> &str {
        self.pool_id
            .split_once('_')
            .map_or(self.pool_id.as_str(), |(_, fragment)| fragment)
    }

    /// Runs one complete handshake.
    ///
    /// The returned future is the caller's handle on the attempt: await it
    /// for the tokens, drop it to abandon the handshake along with all of
    /// its key material. Nothing is retried internally.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Transport`] for network failures,
    /// [`AuthError::UnsupportedChallenge`] when the service asks for a
    /// challenge this client does not speak, and the protocol errors of
    /// [`key::derive_session_key`] for malformed or hostile challenge
    /// parameters.
    pub async fn sign_in(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<AuthTokens, AuthError> {
        let ephemeral = SrpEphemeral::generate();
        let mut state = HandshakeState::Initiated;
        debug!(username, "starting SRP handshake");

        let outcome = match self
            .transport
            .initiate(username, &ephemeral.public_hex())
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => return Err(fail(&mut state, AuthError::Transport(err))),
        };

        match outcome {
            InitiateOutcome::Tokens(tokens) => {
                // Some deployments answer initiate without a challenge.
                advance(&mut state, HandshakeState::Complete);
                self.sink.store(&tokens);
                Ok(tokens)
            }
            InitiateOutcome::Challenge(challenge)
                if challenge.name == CHALLENGE_PASSWORD_VERIFIER =>
            {
                advance(&mut state, HandshakeState::ChallengeReceived);
                match self
                    .answer_challenge(&mut state, password, &ephemeral, challenge)
                    .await
                {
                    Ok(tokens) => {
                        advance(&mut state, HandshakeState::Complete);
                        self.sink.store(&tokens);
                        Ok(tokens)
                    }
                    Err(err) => Err(fail(&mut state, err)),
                }
            }
            InitiateOutcome::Challenge(challenge) => Err(fail(
                &mut state,
                AuthError::UnsupportedChallenge(challenge.name),
            )),
        }
    }

    async fn answer_challenge(
        &self,
        state: &mut HandshakeState,
        password: &SecretString,
        ephemeral: &SrpEphemeral,
        challenge: Challenge,
    ) -> Result<AuthTokens, AuthError> {
        let material = ChallengeMaterial::extract(&challenge)?;

        let session_key = key::derive_session_key(
            self.pool_fragment(),
            &material.user_id,
            password,
            ephemeral,
            &material.server_public,
            &material.salt,
        )?;
        let timestamp = key::format_timestamp(OffsetDateTime::now_utc())?;
        let signature = key::compute_signature(
            self.pool_fragment(),
            &material.user_id,
            &session_key,
            &timestamp,
            &material.secret_block,
        );
        advance(state, HandshakeState::Verified);

        let responses = HashMap::from([
            (PARAM_USERNAME.to_string(), material.username),
            (PARAM_TIMESTAMP.to_string(), timestamp),
            (PARAM_PASSWORD_SIGNATURE.to_string(), signature),
            (PARAM_SECRET_BLOCK.to_string(), material.secret_block_b64),
        ]);

        self.transport
            .respond(&challenge.name, responses, challenge.session)
            .await
            .map_err(AuthError::Transport)
    }
}
