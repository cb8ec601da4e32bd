//! Session-key derivation and challenge signing.
//!
//! The math follows SRP-6a over the group in [`crate::srp::group`]. The
//! password enters only the private exponent `x`; it is never part of any
//! message, and the derived key lives exactly as long as the signature step
//! needs it.

use crate::error::AuthError;
use crate::srp::group::{self, to_unsigned_bytes};
use crate::srp::math::{mod_pow, SrpEphemeral};
use base64ct::{Base64, Encoding};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use num_traits::Zero;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::fmt;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// HKDF info string binding derived keys to this protocol.
pub const SESSION_KEY_INFO: &[u8] = b"srp session derived key";

/// Length of the derived session key in bytes.
pub const SESSION_KEY_LEN: usize = 16;

/// Shared secret derived from one handshake. Consumed by the signature step
/// and dropped with it.
pub struct SessionKey([u8; SESSION_KEY_LEN]);

impl SessionKey {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("SessionKey(redacted)")
    }
}

/// The scrambling parameter `u = H(PAD(A) || PAD(B))`.
#[must_use]
pub fn scramble(client_public: &BigUint, server_public: &BigUint) -> BigUint {
    let mut digest = Sha256::new();
    digest.update(to_unsigned_bytes(client_public));
    digest.update(to_unsigned_bytes(server_public));
    BigUint::from_bytes_be(&digest.finalize())
}

/// The private exponent `x = H(PAD(salt) || H(pool || user_id || ":" || password))`.
fn private_exponent(
    pool_fragment: &str,
    user_id: &str,
    password: &SecretString,
    salt: &BigUint,
) -> BigUint {
    let mut identity = Sha256::new();
    identity.update(pool_fragment.as_bytes());
    identity.update(user_id.as_bytes());
    identity.update(b":");
    identity.update(password.expose_secret().as_bytes());
    let identity_hash = identity.finalize();

    let mut outer = Sha256::new();
    outer.update(to_unsigned_bytes(salt));
    outer.update(identity_hash);
    BigUint::from_bytes_be(&outer.finalize())
}

/// Expands the shared group element into the fixed-width session key.
pub(crate) fn expand_session_key(
    scramble: &BigUint,
    shared_secret: &BigUint,
) -> Result<SessionKey, AuthError> {
    let hkdf = Hkdf::<Sha256>::new(
        Some(&to_unsigned_bytes(scramble)),
        &to_unsigned_bytes(shared_secret),
    );
    let mut key = [0u8; SESSION_KEY_LEN];
    hkdf.expand(SESSION_KEY_INFO, &mut key)
        .map_err(|_| AuthError::KeyDerivation)?;
    Ok(SessionKey(key))
}

/// Derives the shared session key from the server's challenge material.
///
/// Computes `S = (B - k * g^x)^(a + u * x) mod N` and expands it through
/// HKDF-SHA256. Deterministic given its inputs and the ephemeral generated
/// earlier in the same handshake.
///
/// # Errors
///
/// Returns [`AuthError::DegenerateServerEphemeral`] when `B mod N == 0` —
/// a server value that would collapse the shared secret and indicates a
/// downgrade or impersonation attempt — and [`AuthError::ZeroScramble`]
/// when `H(A, B)` is zero.
pub fn derive_session_key(
    pool_fragment: &str,
    user_id: &str,
    password: &SecretString,
    ephemeral: &SrpEphemeral,
    server_public: &BigUint,
    salt: &BigUint,
) -> Result<SessionKey, AuthError> {
    let group = group::params();

    let server_residue = server_public % &group.modulus;
    if server_residue.is_zero() {
        return Err(AuthError::DegenerateServerEphemeral);
    }

    let u = scramble(ephemeral.public(), server_public);
    if u.is_zero() {
        return Err(AuthError::ZeroScramble);
    }

    let x = private_exponent(pool_fragment, user_id, password, salt);
    let g_x = mod_pow(&group.generator, &x, &group.modulus);
    let k_g_x = (&group.multiplier * g_x) % &group.modulus;

    // (B - k * g^x) lifted into the group before exponentiation.
    let base = (server_residue + &group.modulus - k_g_x) % &group.modulus;
    let exponent = ephemeral.private() + &u * &x;
    let shared_secret = mod_pow(&base, &exponent, &group.modulus);

    expand_session_key(&u, &shared_secret)
}

/// Computes the challenge signature: HMAC-SHA256 keyed by the session key
/// over pool fragment, user id, decoded secret block, and timestamp, in
/// that order. Returned base64-encoded.
#[must_use]
pub fn compute_signature(
    pool_fragment: &str,
    user_id: &str,
    session_key: &SessionKey,
    timestamp: &str,
    secret_block: &[u8],
) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(session_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(pool_fragment.as_bytes());
    mac.update(user_id.as_bytes());
    mac.update(secret_block);
    mac.update(timestamp.as_bytes());
    Base64::encode_string(&mac.finalize().into_bytes())
}

/// Formats a challenge timestamp, e.g. `Tue Nov 14 22:13:20 UTC 2023`.
///
/// The format is locale- and timezone-independent: always UTC, to the
/// second, day-of-month unpadded.
///
/// # Errors
///
/// Returns an error if the moment cannot be rendered with the fixed format.
pub fn format_timestamp(moment: OffsetDateTime) -> Result<String, AuthError> {
    let format = format_description!(
        "[weekday repr:short] [month repr:short] [day padding:none] [hour]:[minute]:[second] UTC [year]"
    );
    Ok(moment.to_offset(UtcOffset::UTC).format(format)?)
}
