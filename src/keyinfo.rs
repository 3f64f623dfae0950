//! Conversion between canonical S-expression public keys and DER
//! SubjectPublicKeyInfo.
//!
//! | algorithm | S-expression | SubjectPublicKeyInfo |
//! |---|---|---|
//! | RSA | `(public-key (rsa (n ..) (e ..)))` | rsaEncryption, NULL, RSAPublicKey |
//! | DSA | `(public-key (dsa (p ..) (q ..) (g ..) (y ..)))` | dsa, Dss-Parms, INTEGER y |
//! | EC | `(public-key (ecc (curve "NIST P-256") (q ..)))` | ecPublicKey, namedCurve, point |
//! | EdDSA | `(public-key (ecc (curve Ed25519) (q ..)))` | id-Ed25519 / id-Ed448, raw key |
//!
//! Dispatch is a closed match over the algorithms above. Anything else is
//! rejected with [`CertReadError::UnsupportedAlgorithm`].

use std::fmt;

use const_oid::ObjectIdentifier;
use der::asn1::{AnyRef, BitStringRef, UintRef};
use der::{Decode, Encode, Sequence, Tag, Tagged};
use x509_cert::spki::{AlgorithmIdentifierRef, SubjectPublicKeyInfoRef};

use crate::cursor::decode_oid;
use crate::error::{CertReadError, Result};
use crate::oid;
use crate::sexp::Sexp;

/// Elliptic curves usable with ecPublicKey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedCurve {
    NistP256,
    NistP384,
    NistP521,
    Secp256k1,
    BrainpoolP256r1,
    BrainpoolP384r1,
    BrainpoolP512r1,
}

const NAMED_CURVES: [NamedCurve; 7] = [
    NamedCurve::NistP256,
    NamedCurve::NistP384,
    NamedCurve::NistP521,
    NamedCurve::Secp256k1,
    NamedCurve::BrainpoolP256r1,
    NamedCurve::BrainpoolP384r1,
    NamedCurve::BrainpoolP512r1,
];

impl NamedCurve {
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            NamedCurve::NistP256 => oid::SECP256R1,
            NamedCurve::NistP384 => oid::SECP384R1,
            NamedCurve::NistP521 => oid::SECP521R1,
            NamedCurve::Secp256k1 => oid::SECP256K1,
            NamedCurve::BrainpoolP256r1 => oid::BRAINPOOL_P256R1,
            NamedCurve::BrainpoolP384r1 => oid::BRAINPOOL_P384R1,
            NamedCurve::BrainpoolP512r1 => oid::BRAINPOOL_P512R1,
        }
    }

    /// The name written into S-expressions.
    pub fn name(&self) -> &'static str {
        match self {
            NamedCurve::NistP256 => "NIST P-256",
            NamedCurve::NistP384 => "NIST P-384",
            NamedCurve::NistP521 => "NIST P-521",
            NamedCurve::Secp256k1 => "secp256k1",
            NamedCurve::BrainpoolP256r1 => "brainpoolP256r1",
            NamedCurve::BrainpoolP384r1 => "brainpoolP384r1",
            NamedCurve::BrainpoolP512r1 => "brainpoolP512r1",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            NamedCurve::NistP256 => &["secp256r1", "prime256v1", "P-256", "nistp256"],
            NamedCurve::NistP384 => &["secp384r1", "P-384", "nistp384"],
            NamedCurve::NistP521 => &["secp521r1", "P-521", "nistp521"],
            _ => &[],
        }
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        NAMED_CURVES.into_iter().find(|curve| &curve.oid() == oid)
    }

    /// Accepts the S-expression name, the usual aliases or a dotted OID.
    pub fn from_name(name: &str) -> Option<Self> {
        NAMED_CURVES
            .into_iter()
            .find(|curve| curve.name() == name || curve.aliases().contains(&name))
            .or_else(|| {
                ObjectIdentifier::new(name)
                    .ok()
                    .and_then(|oid| Self::from_oid(&oid))
            })
    }

    /// Size of one field element in octets.
    pub fn field_len(&self) -> usize {
        match self {
            NamedCurve::NistP256 | NamedCurve::Secp256k1 | NamedCurve::BrainpoolP256r1 => 32,
            NamedCurve::NistP384 | NamedCurve::BrainpoolP384r1 => 48,
            NamedCurve::NistP521 => 66,
            NamedCurve::BrainpoolP512r1 => 64,
        }
    }

    fn check_point(&self, point: &[u8]) -> Result<()> {
        let expected = match point.first() {
            Some(0x04) => 1 + 2 * self.field_len(),
            Some(0x02 | 0x03) => 1 + self.field_len(),
            _ => {
                return Err(CertReadError::InvalidKey(format!(
                    "invalid point encoding on {}",
                    self.name()
                )));
            }
        };
        if point.len() != expected {
            return Err(CertReadError::InvalidKey(format!(
                "point of {} octets does not lie on {}",
                point.len(),
                self.name()
            )));
        }
        Ok(())
    }
}

/// Edwards curves usable with EdDSA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdwardsCurve {
    Ed25519,
    Ed448,
}

impl EdwardsCurve {
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            EdwardsCurve::Ed25519 => oid::ED25519,
            EdwardsCurve::Ed448 => oid::ED448,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EdwardsCurve::Ed25519 => "Ed25519",
            EdwardsCurve::Ed448 => "Ed448",
        }
    }

    pub fn key_len(&self) -> usize {
        match self {
            EdwardsCurve::Ed25519 => 32,
            EdwardsCurve::Ed448 => 57,
        }
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        [EdwardsCurve::Ed25519, EdwardsCurve::Ed448]
            .into_iter()
            .find(|curve| &curve.oid() == oid)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [EdwardsCurve::Ed25519, EdwardsCurve::Ed448]
            .into_iter()
            .find(|curve| {
                curve.name().eq_ignore_ascii_case(name) || curve.oid().to_string() == name
            })
    }
}

/// `Dss-Parms` from RFC 3279.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct DsaParameters<'a> {
    p: UintRef<'a>,
    q: UintRef<'a>,
    g: UintRef<'a>,
}

/// A decoded public key.
///
/// Integers are kept as unsigned big-endian magnitudes without leading zero
/// octets; points and Edwards keys are kept as their raw octets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInfo {
    Rsa {
        modulus: Vec<u8>,
        exponent: Vec<u8>,
    },
    Dsa {
        p: Vec<u8>,
        q: Vec<u8>,
        g: Vec<u8>,
        y: Vec<u8>,
    },
    Ec {
        curve: NamedCurve,
        point: Vec<u8>,
    },
    EdDsa {
        curve: EdwardsCurve,
        key: Vec<u8>,
    },
}

fn magnitude(bytes: &[u8], what: &str) -> Result<Vec<u8>> {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    if start == bytes.len() {
        return Err(CertReadError::InvalidKey(format!("{what} must not be zero")));
    }
    Ok(bytes[start..].to_vec())
}

/// Prefixes a zero octet when the high bit is set so the value reads as
/// positive.
fn signed_magnitude(bytes: &[u8]) -> Vec<u8> {
    match bytes.first() {
        Some(b) if b & 0x80 != 0 => {
            let mut out = Vec::with_capacity(bytes.len() + 1);
            out.push(0);
            out.extend_from_slice(bytes);
            out
        }
        _ => bytes.to_vec(),
    }
}

fn require_value<'s>(list: &'s Sexp, name: &str) -> Result<&'s [u8]> {
    list.find_value(name)
        .ok_or_else(|| CertReadError::malformed_sexp(0, format!("missing ({name} ...) element")))
}

impl KeyInfo {
    /// The algorithm OID written into the SubjectPublicKeyInfo.
    pub fn algorithm(&self) -> ObjectIdentifier {
        match self {
            KeyInfo::Rsa { .. } => oid::RSA_ENCRYPTION,
            KeyInfo::Dsa { .. } => oid::DSA,
            KeyInfo::Ec { .. } => oid::EC_PUBLIC_KEY,
            KeyInfo::EdDsa { curve, .. } => curve.oid(),
        }
    }

    /// Decodes a DER SubjectPublicKeyInfo.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let spki = SubjectPublicKeyInfoRef::from_der(der)?;
        let algorithm = spki.algorithm.oid;
        let params = spki.algorithm.parameters;
        let key_bits = spki
            .subject_public_key
            .as_bytes()
            .ok_or_else(|| CertReadError::malformed(0, "public key BIT STRING with unused bits"))?;

        let info = if algorithm == oid::RSA_ENCRYPTION {
            if params.is_some_and(|p| !(p.tag() == Tag::Null && p.value().is_empty())) {
                return Err(CertReadError::malformed(0, "rsaEncryption parameters must be NULL"));
            }
            let key = rsa::pkcs1::RsaPublicKey::from_der(key_bits)?;
            KeyInfo::Rsa {
                modulus: magnitude(key.modulus.as_bytes(), "modulus")?,
                exponent: magnitude(key.public_exponent.as_bytes(), "exponent")?,
            }
        } else if algorithm == oid::DSA {
            let params = params.ok_or_else(|| {
                CertReadError::InvalidKey("DSA key without domain parameters".into())
            })?;
            let params_der = params.to_der()?;
            let params = DsaParameters::from_der(&params_der)?;
            let y = UintRef::from_der(key_bits)?;
            KeyInfo::Dsa {
                p: magnitude(params.p.as_bytes(), "p")?,
                q: magnitude(params.q.as_bytes(), "q")?,
                g: magnitude(params.g.as_bytes(), "g")?,
                y: magnitude(y.as_bytes(), "y")?,
            }
        } else if algorithm == oid::EC_PUBLIC_KEY {
            let params =
                params.ok_or_else(|| CertReadError::InvalidKey("EC key without curve".into()))?;
            if params.tag() != Tag::ObjectIdentifier {
                return Err(CertReadError::UnsupportedAlgorithm(
                    "EC parameters other than namedCurve".to_string(),
                ));
            }
            let curve_oid = decode_oid(params.value(), 0)?;
            let curve = NamedCurve::from_oid(&curve_oid)
                .ok_or_else(|| CertReadError::UnsupportedAlgorithm(format!("curve {curve_oid}")))?;
            curve.check_point(key_bits)?;
            KeyInfo::Ec {
                curve,
                point: key_bits.to_vec(),
            }
        } else if let Some(curve) = EdwardsCurve::from_oid(&algorithm) {
            if params.is_some() {
                return Err(CertReadError::malformed(0, "EdDSA keys take no parameters"));
            }
            if key_bits.len() != curve.key_len() {
                return Err(CertReadError::InvalidKey(format!(
                    "{} key must be {} octets",
                    curve.name(),
                    curve.key_len()
                )));
            }
            KeyInfo::EdDsa {
                curve,
                key: key_bits.to_vec(),
            }
        } else {
            return Err(CertReadError::UnsupportedAlgorithm(algorithm.to_string()));
        };
        tracing::trace!(algorithm = %info.algorithm(), "decoded SubjectPublicKeyInfo");
        Ok(info)
    }

    /// Encodes the key as a DER SubjectPublicKeyInfo.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let null = AnyRef::new(Tag::Null, &[])?;
        let (parameters, key_bits): (Option<Vec<u8>>, Vec<u8>) = match self {
            KeyInfo::Rsa { modulus, exponent } => {
                let key = rsa::pkcs1::RsaPublicKey {
                    modulus: UintRef::new(modulus)?,
                    public_exponent: UintRef::new(exponent)?,
                };
                (Some(null.to_der()?), key.to_der()?)
            }
            KeyInfo::Dsa { p, q, g, y } => {
                let params = DsaParameters {
                    p: UintRef::new(p)?,
                    q: UintRef::new(q)?,
                    g: UintRef::new(g)?,
                };
                (Some(params.to_der()?), UintRef::new(y)?.to_der()?)
            }
            KeyInfo::Ec { curve, point } => {
                curve.check_point(point)?;
                (Some(curve.oid().to_der()?), point.clone())
            }
            KeyInfo::EdDsa { curve, key } => {
                if key.len() != curve.key_len() {
                    return Err(CertReadError::InvalidKey(format!(
                        "{} key must be {} octets",
                        curve.name(),
                        curve.key_len()
                    )));
                }
                (None, key.clone())
            }
        };

        let parameters = parameters.as_deref().map(AnyRef::from_der).transpose()?;
        let spki = SubjectPublicKeyInfoRef {
            algorithm: AlgorithmIdentifierRef {
                oid: self.algorithm(),
                parameters,
            },
            subject_public_key: BitStringRef::from_bytes(&key_bits)?,
        };
        Ok(spki.to_der()?)
    }

    /// Builds the `(public-key ...)` expression.
    pub fn to_sexp(&self) -> Sexp {
        let body = match self {
            KeyInfo::Rsa { modulus, exponent } => Sexp::list(vec![
                Sexp::atom("rsa"),
                Sexp::pair("n", signed_magnitude(modulus)),
                Sexp::pair("e", signed_magnitude(exponent)),
            ]),
            KeyInfo::Dsa { p, q, g, y } => Sexp::list(vec![
                Sexp::atom("dsa"),
                Sexp::pair("p", signed_magnitude(p)),
                Sexp::pair("q", signed_magnitude(q)),
                Sexp::pair("g", signed_magnitude(g)),
                Sexp::pair("y", signed_magnitude(y)),
            ]),
            KeyInfo::Ec { curve, point } => Sexp::list(vec![
                Sexp::atom("ecc"),
                Sexp::pair("curve", curve.name()),
                Sexp::pair("q", point),
            ]),
            KeyInfo::EdDsa { curve, key } => Sexp::list(vec![
                Sexp::atom("ecc"),
                Sexp::pair("curve", curve.name()),
                Sexp::pair("q", key),
            ]),
        };
        Sexp::list(vec![Sexp::atom("public-key"), body])
    }

    /// Canonical encoding of [`KeyInfo::to_sexp`].
    pub fn to_canon_sexp(&self) -> Vec<u8> {
        self.to_sexp().to_canonical()
    }

    /// Interprets a parsed `(public-key ...)` expression.
    pub fn from_sexp(sexp: &Sexp) -> Result<Self> {
        let items = match sexp.as_list() {
            Some([tag, body]) if tag.as_atom() == Some(b"public-key") => body,
            _ => return Err(CertReadError::malformed_sexp(0, "expected (public-key (<algo> ...))")),
        };
        let algorithm = items
            .tag()
            .ok_or_else(|| CertReadError::malformed_sexp(0, "missing algorithm name"))?;

        match algorithm {
            b"rsa" => Ok(KeyInfo::Rsa {
                modulus: magnitude(require_value(items, "n")?, "modulus")?,
                exponent: magnitude(require_value(items, "e")?, "exponent")?,
            }),
            b"dsa" => Ok(KeyInfo::Dsa {
                p: magnitude(require_value(items, "p")?, "p")?,
                q: magnitude(require_value(items, "q")?, "q")?,
                g: magnitude(require_value(items, "g")?, "g")?,
                y: magnitude(require_value(items, "y")?, "y")?,
            }),
            b"ecc" | b"ecdsa" => {
                let curve_name = std::str::from_utf8(require_value(items, "curve")?)
                    .map_err(|_| CertReadError::malformed_sexp(0, "curve name is not text"))?;
                let q = require_value(items, "q")?;
                if let Some(curve) = EdwardsCurve::from_name(curve_name) {
                    // A native Ed25519 point may carry a 0x40 prefix.
                    let key = match q {
                        [0x40, rest @ ..] if rest.len() == curve.key_len() => rest,
                        _ => q,
                    };
                    if key.len() != curve.key_len() {
                        return Err(CertReadError::InvalidKey(format!(
                            "{} key must be {} octets",
                            curve.name(),
                            curve.key_len()
                        )));
                    }
                    return Ok(KeyInfo::EdDsa {
                        curve,
                        key: key.to_vec(),
                    });
                }
                let curve = NamedCurve::from_name(curve_name).ok_or_else(|| {
                    CertReadError::UnsupportedAlgorithm(format!("curve {curve_name}"))
                })?;
                curve.check_point(q)?;
                Ok(KeyInfo::Ec {
                    curve,
                    point: q.to_vec(),
                })
            }
            other => Err(CertReadError::UnsupportedAlgorithm(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }

    /// Parses a canonical `(public-key ...)` expression.
    pub fn from_canon_sexp(sexp: &[u8]) -> Result<Self> {
        Self::from_sexp(&Sexp::parse(sexp)?)
    }
}

impl fmt::Display for KeyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sexp())
    }
}

/// Converts a canonical S-expression public key into a DER
/// SubjectPublicKeyInfo.
pub fn sexp_to_der(sexp: &[u8]) -> Result<Vec<u8>> {
    let info = KeyInfo::from_canon_sexp(sexp)?;
    tracing::debug!(algorithm = %info.algorithm(), "converting S-expression key to DER");
    info.to_der()
}

/// Converts a DER SubjectPublicKeyInfo into a canonical S-expression.
pub fn der_to_sexp(der: &[u8]) -> Result<Vec<u8>> {
    let info = KeyInfo::from_der(der)?;
    tracing::debug!(algorithm = %info.algorithm(), "converting DER key to S-expression");
    Ok(info.to_canon_sexp())
}

/// Checks that `sexp` survives DER -> S-expression -> DER unchanged and
/// returns the DER encoding.
pub fn check_round_trip(sexp: &[u8]) -> Result<Vec<u8>> {
    let der = sexp_to_der(sexp)?;
    let again = sexp_to_der(&der_to_sexp(&der)?)?;
    if der != again {
        return Err(CertReadError::RoundTripMismatch(format!(
            "re-encoded SubjectPublicKeyInfo differs ({} vs {} octets)",
            der.len(),
            again.len()
        )));
    }
    Ok(der)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const ED25519_SPKI: [u8; 44] = hex!(
        "302a300506032b6570032100"
        "4ae57ca4f2aebfe0ea98b66ad89c5b9324a8327ace170994fc8b4d2c384a08d7"
    );

    const P256_SPKI: [u8; 91] = hex!(
        "3059301306072a8648ce3d020106082a8648ce3d03010703420004"
        "3633efdcaeedf63f6355319763a2bd643e891e60ade037fb35f29373e59bd99e"
        "5da79fa99966c5d8cf6c9162e8d4f893d03a0a8ff8e2ee757c096c79c3aa5687"
    );

    fn canon(parts: &[&[u8]]) -> Vec<u8> {
        parts.concat()
    }

    #[test]
    fn test_ed25519_both_directions() {
        let sexp = der_to_sexp(&ED25519_SPKI).unwrap();
        let key = &ED25519_SPKI[12..];
        let expected = canon(&[b"(10:public-key(3:ecc(5:curve7:Ed25519)(1:q32:", key, b")))"]);
        assert_eq!(sexp, expected);
        assert_eq!(sexp_to_der(&sexp).unwrap(), ED25519_SPKI.to_vec());
    }

    #[test]
    fn test_ed25519_flags_and_prefix_accepted() {
        let key = &ED25519_SPKI[12..];
        let prefix = b"(10:public-key(3:ecc(5:curve7:Ed25519)(5:flags5:eddsa)(1:q33:\x40";
        let sexp = canon(&[prefix, key, b")))"]);
        assert_eq!(sexp_to_der(&sexp).unwrap(), ED25519_SPKI.to_vec());
    }

    #[test]
    fn test_p256_round_trip() {
        let info = KeyInfo::from_der(&P256_SPKI).unwrap();
        assert!(matches!(info, KeyInfo::Ec { curve: NamedCurve::NistP256, .. }));
        assert_eq!(info.to_der().unwrap(), P256_SPKI.to_vec());
        assert_eq!(info.to_string().split_whitespace().take(3).collect::<Vec<_>>(), vec![
            "(public-key",
            "(ecc",
            "(curve"
        ]);

        let sexp = info.to_canon_sexp();
        assert!(sexp.windows(10).any(|w| w == b"NIST P-256"));
        assert_eq!(check_round_trip(&sexp).unwrap(), P256_SPKI.to_vec());
    }

    #[test]
    fn test_curve_aliases() {
        let point = &P256_SPKI[26..];
        for name in ["prime256v1", "secp256r1", "NIST P-256", "1.2.840.10045.3.1.7"] {
            let sexp = canon(&[
                b"(10:public-key(3:ecc(5:curve",
                format!("{}:{name}", name.len()).as_bytes(),
                b")(1:q65:",
                point,
                b")))",
            ]);
            assert_eq!(sexp_to_der(&sexp).unwrap(), P256_SPKI.to_vec(), "{name}");
        }
    }

    #[test]
    fn test_rsa_small_key() {
        // 2-octet modulus with the high bit set, exponent 3
        let sexp = b"(10:public-key(3:rsa(1:n3:\x00\xc1\x01)(1:e1:\x03)))";
        let der = check_round_trip(sexp).unwrap();
        assert_eq!(
            der,
            hex!("301c300d06092a864886f70d0101010500030b003008020300c101020103").to_vec()
        );
        assert_eq!(der_to_sexp(&der).unwrap(), sexp.to_vec());

        // missing leading zero on input is normalised
        let loose = b"(10:public-key(3:rsa(1:n2:\xc1\x01)(1:e1:\x03)))";
        assert_eq!(sexp_to_der(loose).unwrap(), der);
    }

    #[test]
    fn test_rsa_absent_parameters_accepted() {
        let der = hex!("301a300b06092a864886f70d010101030b003008020300c101020103");
        let info = KeyInfo::from_der(&der).unwrap();
        assert_eq!(
            info,
            KeyInfo::Rsa {
                modulus: vec![0xc1, 0x01],
                exponent: vec![0x03]
            }
        );
    }

    #[test]
    fn test_dsa_round_trip() {
        let sexp = b"(10:public-key(3:dsa(1:p1:\x17)(1:q1:\x0b)(1:g1:\x02)(1:y2:\x00\x80)))";
        let der = check_round_trip(sexp).unwrap();
        let info = KeyInfo::from_der(&der).unwrap();
        assert_eq!(info.algorithm(), oid::DSA);
        assert_eq!(der_to_sexp(&der).unwrap(), sexp.to_vec());
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        // id-X25519 is not a signature key type handled here
        let der = hex!(
            "302a300506032b656e032100"
            "4ae57ca4f2aebfe0ea98b66ad89c5b9324a8327ace170994fc8b4d2c384a08d7"
        );
        assert!(matches!(
            KeyInfo::from_der(&der).unwrap_err(),
            CertReadError::UnsupportedAlgorithm(_)
        ));
        assert!(matches!(
            sexp_to_der(b"(10:public-key(3:elg(1:p1:\x17)))").unwrap_err(),
            CertReadError::UnsupportedAlgorithm(_)
        ));
        assert!(matches!(
            sexp_to_der(b"(10:public-key(3:ecc(5:curve9:sect163k1)(1:q1:\x04)))").unwrap_err(),
            CertReadError::UnsupportedAlgorithm(_)
        ));
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(matches!(
            sexp_to_der(b"(11:private-key(3:rsa))").unwrap_err(),
            CertReadError::MalformedSExpression { .. }
        ));
        assert!(matches!(
            sexp_to_der(b"(10:public-key(3:rsa(1:n1:\x05)))").unwrap_err(),
            CertReadError::MalformedSExpression { .. }
        ));
        assert!(KeyInfo::from_der(&ED25519_SPKI[..40]).unwrap_err().is_malformed());
        // point too short for the curve
        assert!(matches!(
            sexp_to_der(b"(10:public-key(3:ecc(5:curve10:NIST P-256)(1:q3:\x04\x01\x02)))")
                .unwrap_err(),
            CertReadError::InvalidKey(_)
        ));
    }
}
