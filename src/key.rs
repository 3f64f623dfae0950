use ed25519_dalek::VerifyingKey as Ed25519VerifyingKey;
use rsa::{BigUint, RsaPublicKey, traits::PublicKeyParts};

use crate::error::{CertReadError, Result};
use crate::keyinfo::{EdwardsCurve, KeyInfo, NamedCurve};

/// Public keys that have a RustCrypto implementation.
///
/// Built from a decoded [`KeyInfo`]. DSA, Ed448 and curves other than
/// P-256, P-384 and P-521 have no counterpart here and are reported as
/// [`CertReadError::UnsupportedAlgorithm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(p256::PublicKey),
    EcdsaP384(p384::PublicKey),
    EcdsaP521(p521::PublicKey),
    Ed25519(Ed25519VerifyingKey),
}

fn invalid_point(curve: NamedCurve) -> CertReadError {
    CertReadError::InvalidKey(format!("point is not on {}", curve.name()))
}

impl PublicKey {
    pub fn from_key_info(info: &KeyInfo) -> Result<Self> {
        match info {
            KeyInfo::Rsa { modulus, exponent } => {
                let key = RsaPublicKey::new(
                    BigUint::from_bytes_be(modulus),
                    BigUint::from_bytes_be(exponent),
                )?;
                Ok(PublicKey::Rsa(key))
            }
            KeyInfo::Ec { curve, point } => match curve {
                NamedCurve::NistP256 => p256::PublicKey::from_sec1_bytes(point)
                    .map(PublicKey::EcdsaP256)
                    .map_err(|_| invalid_point(*curve)),
                NamedCurve::NistP384 => p384::PublicKey::from_sec1_bytes(point)
                    .map(PublicKey::EcdsaP384)
                    .map_err(|_| invalid_point(*curve)),
                NamedCurve::NistP521 => p521::PublicKey::from_sec1_bytes(point)
                    .map(PublicKey::EcdsaP521)
                    .map_err(|_| invalid_point(*curve)),
                other => Err(CertReadError::UnsupportedAlgorithm(other.name().to_string())),
            },
            KeyInfo::EdDsa {
                curve: EdwardsCurve::Ed25519,
                key,
            } => {
                let bytes: &[u8; 32] = key
                    .as_slice()
                    .try_into()
                    .map_err(|_| {
                        CertReadError::InvalidKey("Ed25519 key must be 32 octets".into())
                    })?;
                Ed25519VerifyingKey::from_bytes(bytes)
                    .map(PublicKey::Ed25519)
                    .map_err(|e| CertReadError::InvalidKey(e.to_string()))
            }
            KeyInfo::EdDsa { curve, .. } => Err(CertReadError::UnsupportedAlgorithm(
                curve.name().to_string(),
            )),
            KeyInfo::Dsa { .. } => Err(CertReadError::UnsupportedAlgorithm("dsa".to_string())),
        }
    }

    /// Size of the key in bits.
    pub fn bits(&self) -> usize {
        match self {
            PublicKey::Rsa(key) => key.n().bits(),
            PublicKey::EcdsaP256(_) | PublicKey::Ed25519(_) => 256,
            PublicKey::EcdsaP384(_) => 384,
            PublicKey::EcdsaP521(_) => 521,
        }
    }
}

impl TryFrom<&KeyInfo> for PublicKey {
    type Error = CertReadError;

    fn try_from(info: &KeyInfo) -> Result<Self> {
        PublicKey::from_key_info(info)
    }
}
