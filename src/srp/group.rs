//! The fixed SRP group and the byte encoding every protocol hash uses.
//!
//! The group is the 3072-bit prime from RFC 5054 appendix A with generator
//! 2. Both sides of the protocol hash big-endian byte encodings of group
//! elements; the encoding carries a leading zero octet whenever the top bit
//! is set, so values survive a round trip through signed big-integer
//! implementations on the server side unchanged.

use num_bigint::BigUint;
use num_traits::Zero;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// 3072-bit safe prime `N` from RFC 5054 appendix A, hexadecimal.
const MODULUS_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC74",
    "020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F1437",
    "4FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3DC2007CB8A163BF05",
    "98DA48361C55D39A69163FA8FD24CF5F83655D23DCA3AD961C62F356208552BB",
    "9ED529077096966D670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B",
    "E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF695581718",
    "3995497CEA956AE515D2261898FA051015728E5A8AAAC42DAD33170D04507A33",
    "A85521ABDF1CBA64ECFB850458DBEF0A8AEA71575D060C7DB3970F85A6E1E4C7",
    "ABF5AE8CDB0933D71E8C94E04A25619DCEE3D2261AD2EE6BF12FFA06D98A0864",
    "D87602733EC86A64521F2B18177B200CBBE117577A615D6C770988C0BAD946E2",
    "08E24FA074E5AB3143DB5BFCE0FD108E4B82D120A93AD2CAFFFFFFFFFFFFFFFF",
);

/// Parameters shared by every handshake: the modulus `N`, the generator
/// `g`, and the multiplier `k = H(PAD(N) || PAD(g))`.
pub struct GroupParams {
    pub modulus: BigUint,
    pub generator: BigUint,
    pub multiplier: BigUint,
}

/// Returns the process-wide group parameters, computed on first use.
pub fn params() -> &'static GroupParams {
    static PARAMS: OnceLock<GroupParams> = OnceLock::new();
    PARAMS.get_or_init(|| {
        let modulus = BigUint::parse_bytes(MODULUS_HEX.as_bytes(), 16)
            .expect("group modulus constant is valid hexadecimal");
        let generator = BigUint::from(2u8);

        let mut digest = Sha256::new();
        digest.update(to_unsigned_bytes(&modulus));
        digest.update(to_unsigned_bytes(&generator));
        let multiplier = BigUint::from_bytes_be(&digest.finalize());

        GroupParams {
            modulus,
            generator,
            multiplier,
        }
    })
}

/// Big-endian bytes of `value` with a leading zero octet when the top bit
/// is set. Zero encodes as a single zero octet.
#[must_use]
pub fn to_unsigned_bytes(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        return vec![0];
    }
    let bytes = value.to_bytes_be();
    match bytes.first() {
        Some(&first) if first & 0x80 != 0 => {
            let mut padded = Vec::with_capacity(bytes.len() + 1);
            padded.push(0);
            padded.extend_from_slice(&bytes);
            padded
        }
        _ => bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulus_is_3072_bits() {
        let group = params();
        assert_eq!(group.modulus.bits(), 3072);
        assert_eq!(group.generator, BigUint::from(2u8));
    }

    #[test]
    fn multiplier_is_reduced_and_nonzero() {
        let group = params();
        assert!(!group.multiplier.is_zero());
        assert!(group.multiplier < group.modulus);
    }

    #[test]
    fn high_bit_values_gain_a_sign_octet() {
        assert_eq!(to_unsigned_bytes(&BigUint::from(0x80u8)), vec![0, 0x80]);
        assert_eq!(to_unsigned_bytes(&BigUint::from(0x7Fu8)), vec![0x7F]);
        assert_eq!(to_unsigned_bytes(&BigUint::zero()), vec![0]);
    }

    #[test]
    fn encoding_round_trips() {
        let value = BigUint::parse_bytes(b"DEADBEEFCAFEBABE", 16).unwrap();
        let bytes = to_unsigned_bytes(&value);
        assert_eq!(BigUint::from_bytes_be(&bytes), value);
    }
}
