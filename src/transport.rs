//! Identity-service transport boundary.
//!
//! The handshake controller only needs two calls: `initiate` and `respond`,
//! both exchanging named parameter maps. [`IdentityTransport`] captures that
//! contract; [`HttpIdentityClient`] is the JSON-over-HTTP implementation.
//! Wire details beyond these two calls are the identity service's concern.

use crate::credentials::AuthTokens;
use crate::error::AuthError;
use anyhow::{anyhow, Result};
use reqwest::Client;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, info_span, Instrument};
use url::Url;

/// The one challenge type this client speaks.
pub const CHALLENGE_PASSWORD_VERIFIER: &str = "PASSWORD_VERIFIER";

/// Challenge parameter: password salt, hex.
pub const PARAM_SALT: &str = "SALT";
/// Challenge parameter: server public ephemeral, hex.
pub const PARAM_SRP_B: &str = "SRP_B";
/// Challenge parameter: opaque server state, base64.
pub const PARAM_SECRET_BLOCK: &str = "SECRET_BLOCK";
/// Challenge parameter: immutable user identifier.
pub const PARAM_USER_ID: &str = "USER_ID";
/// Challenge parameter and response: username as the service knows it.
pub const PARAM_USERNAME: &str = "USERNAME";
/// Response parameter: challenge timestamp.
pub const PARAM_TIMESTAMP: &str = "TIMESTAMP";
/// Response parameter: base64 challenge signature.
pub const PARAM_PASSWORD_SIGNATURE: &str = "PASSWORD_SIGNATURE";

/// A challenge returned by `initiate`: a name, named parameters, and an
/// opaque continuation token echoed back with the response.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub name: String,
    pub parameters: HashMap<String, String>,
    pub session: Option<String>,
}

impl Challenge {
    /// Looks up a required parameter.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingChallengeParameter`] naming the absent
    /// parameter.
    pub fn parameter(&self, name: &'static str) -> Result<&str, AuthError> {
        self.parameters
            .get(name)
            .map(String::as_str)
            .ok_or(AuthError::MissingChallengeParameter(name))
    }
}

/// Outcome of the initiate round trip: either the deployment allowed the
/// caller through without a challenge, or a challenge must be answered.
#[derive(Debug)]
pub enum InitiateOutcome {
    Tokens(AuthTokens),
    Challenge(Challenge),
}

/// Two-round-trip identity service contract consumed by the handshake
/// controller. Implementations carry their own endpoint and client
/// identity configuration.
#[allow(async_fn_in_trait)]
pub trait IdentityTransport {
    /// Starts an authentication attempt with the username and the client's
    /// public ephemeral (hex). No password material is ever part of this
    /// call.
    async fn initiate(&self, username: &str, srp_a_hex: &str) -> Result<InitiateOutcome>;

    /// Answers a challenge with named response parameters.
    async fn respond(
        &self,
        challenge_name: &str,
        responses: HashMap<String, String>,
        session: Option<String>,
    ) -> Result<AuthTokens>;
}

fn error_message(json_response: &Value) -> &str {
    json_response
        .get("errors")
        .and_then(|v| v.get(0))
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// # Errors
/// Returns an error if `url` cannot be parsed, has no host, or uses an unsupported scheme.
pub fn endpoint_url(url: &str, path: &str) -> Result<String> {
    let url = Url::parse(url)?;

    let scheme = url.scheme();

    let host = url
        .host()
        .ok_or_else(|| anyhow!("Error parsing URL: no host specified"))?
        .to_owned();

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => return Err(anyhow!("Error parsing URL: unsupported scheme {scheme}")),
        },
    };

    let endpoint_url = format!("{scheme}://{host}:{port}{path}");

    debug!("endpoint URL: {}", endpoint_url);

    Ok(endpoint_url)
}

#[derive(Debug, Deserialize)]
struct TokensBody {
    access_token: String,
    id_token: String,
    refresh_token: Option<String>,
    expires_in: u64,
    token_type: String,
}

impl From<TokensBody> for AuthTokens {
    fn from(body: TokensBody) -> Self {
        Self {
            access_token: SecretString::from(body.access_token),
            id_token: SecretString::from(body.id_token),
            refresh_token: body.refresh_token.map(SecretString::from),
            expires_in: body.expires_in,
            token_type: body.token_type,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChallengeBody {
    name: String,
    #[serde(default)]
    parameters: HashMap<String, String>,
    session: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthResponseBody {
    tokens: Option<TokensBody>,
    challenge: Option<ChallengeBody>,
}

/// JSON-over-HTTP identity transport.
///
/// Talks to `POST {base}/v1/auth/initiate` and
/// `POST {base}/v1/auth/challenge`.
pub struct HttpIdentityClient {
    client: Client,
    base_url: String,
    client_id: String,
}

impl HttpIdentityClient {
    /// Builds a client for the identity service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            client_id: client_id.into(),
        })
    }

    async fn post_auth(&self, path: &str, span_name: &str, payload: Value) -> Result<AuthResponseBody> {
        let url = endpoint_url(&self.base_url, path)?;

        let span = info_span!(
            "identity.request",
            operation = span_name,
            http.method = "POST",
            url = %url
        );
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let json_response: Value = response.json().await?;

            return Err(anyhow!(
                "{} - {}, {}",
                url,
                status,
                error_message(&json_response)
            ));
        }

        Ok(response.json().await?)
    }
}

impl IdentityTransport for HttpIdentityClient {
    async fn initiate(&self, username: &str, srp_a_hex: &str) -> Result<InitiateOutcome> {
        let payload = json!({
            "client_id": self.client_id,
            "username": username,
            "srp_a": srp_a_hex,
        });

        let body = self.post_auth("/v1/auth/initiate", "initiate", payload).await?;

        if let Some(challenge) = body.challenge {
            return Ok(InitiateOutcome::Challenge(Challenge {
                name: challenge.name,
                parameters: challenge.parameters,
                session: challenge.session,
            }));
        }
        let tokens = body
            .tokens
            .ok_or_else(|| anyhow!("Error parsing JSON response: no challenge or tokens found"))?;
        Ok(InitiateOutcome::Tokens(tokens.into()))
    }

    async fn respond(
        &self,
        challenge_name: &str,
        responses: HashMap<String, String>,
        session: Option<String>,
    ) -> Result<AuthTokens> {
        let payload = json!({
            "client_id": self.client_id,
            "challenge_name": challenge_name,
            "responses": responses,
            "session": session,
        });

        let body = self.post_auth("/v1/auth/challenge", "respond", payload).await?;

        let tokens = body
            .tokens
            .ok_or_else(|| anyhow!("Error parsing JSON response: no tokens found"))?;
        Ok(tokens.into())
    }
}
