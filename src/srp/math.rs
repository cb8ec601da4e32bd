//! Modular arithmetic and ephemeral generation for the handshake.

use crate::srp::group;
use num_bigint::{BigUint, RandBigInt};
use num_traits::Zero;
use rand::rngs::OsRng;

/// Bit width of the client's private ephemeral value.
pub const EPHEMERAL_BITS: u64 = 1024;

/// Modular exponentiation `base^exponent mod modulus`.
#[must_use]
pub fn mod_pow(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint {
    base.modpow(exponent, modulus)
}

/// The client half of the key agreement: a private random value `a` and its
/// public counterpart `A = g^a mod N`.
///
/// A fresh pair is generated per handshake attempt and dropped with the
/// handshake; neither half is ever persisted or logged.
pub struct SrpEphemeral {
    private: BigUint,
    public: BigUint,
}

impl SrpEphemeral {
    /// Generates a fresh ephemeral pair from the OS entropy source.
    ///
    /// # Panics
    ///
    /// Panics if the OS cannot supply cryptographically secure randomness;
    /// the handshake must not proceed without it.
    #[must_use]
    pub fn generate() -> Self {
        let group = group::params();
        let mut rng = OsRng;
        loop {
            let private = rng.gen_biguint(EPHEMERAL_BITS) % &group.modulus;
            if private.is_zero() {
                continue;
            }
            let public = mod_pow(&group.generator, &private, &group.modulus);
            if !public.is_zero() {
                return Self { private, public };
            }
        }
    }

    /// Builds the pair from a known private value. Used by tests that need
    /// a deterministic handshake.
    #[must_use]
    pub fn from_private(private: BigUint) -> Self {
        let group = group::params();
        let public = mod_pow(&group.generator, &private, &group.modulus);
        Self { private, public }
    }

    #[must_use]
    pub fn private(&self) -> &BigUint {
        &self.private
    }

    #[must_use]
    pub fn public(&self) -> &BigUint {
        &self.public
    }

    /// The public value as lowercase hex, the wire form of `SRP_A`.
    #[must_use]
    pub fn public_hex(&self) -> String {
        self.public.to_str_radix(16)
    }
}
