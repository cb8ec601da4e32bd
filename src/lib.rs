//! # Aliro (SRP Sign-in & Authorization Mode Selection)
//!
//! `aliro` is the client-side identity library for user-pool backed APIs.
//! It solves two independent problems:
//!
//! ## Authentication (SRP)
//!
//! Sign-in uses the **Secure Remote Password** protocol: the password never
//! leaves the process. The client sends a fresh public ephemeral, answers
//! the service's password-verifier challenge with a signature keyed by the
//! derived session key, and collects tokens.
//!
//! - **Zero knowledge:** only the public ephemeral and the challenge
//!   signature cross the wire.
//! - **Per-attempt state:** every [`srp::SrpClient::sign_in`] call owns its
//!   ephemeral and session key and drops both when it resolves; concurrent
//!   handshakes share nothing.
//! - **No guessing:** a challenge type this client does not speak fails the
//!   attempt by name instead of being silently accepted.
//!
//! The identity service is reached through the [`transport::IdentityTransport`]
//! boundary; [`transport::HttpIdentityClient`] is the JSON-over-HTTP
//! implementation. Issued tokens go to a caller-owned
//! [`credentials::CredentialSink`].
//!
//! ## Authorization (mode resolution)
//!
//! APIs configured with several authorization mechanisms need a per-request
//! decision. [`authz::ModeResolver`] builds a one-time cache from
//! schema-derived [`authz::AccessRule`]s — priority-ordered, deduplicated
//! candidates per (entity type, operation) — and picks the first mechanism
//! whose credentials are currently available. Rules are never re-evaluated
//! on the request path.

pub mod authz;
pub mod credentials;
pub mod error;
pub mod srp;
pub mod transport;

pub use authz::{
    AccessRule, AccessStrategy, AuthorizationMode, CredentialProbe, EntitySchema,
    MissingRuleBehavior, ModeResolver, Operation,
};
pub use credentials::{AuthTokens, CredentialSink, DiscardTokens};
pub use error::{AuthError, ResolverError};
pub use srp::SrpClient;
pub use transport::{HttpIdentityClient, IdentityTransport};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
