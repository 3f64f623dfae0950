//! Error type for certificate and key decoding.

use der::asn1::ObjectIdentifier;
use thiserror::Error;

/// Represents errors that can occur while decoding certificates and keys.
///
/// Running out of elements in a sequence, running out of certificates in a
/// stream and an optional field that is not present are not errors: those
/// are reported as `Ok(None)` or as the end of an iterator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CertReadError {
    /// Structural DER violation: bad tag, length overrun, indefinite length.
    #[error("Malformed DER at offset {offset}: {reason}")]
    MalformedDer { offset: usize, reason: String },

    /// The input buffer ended in the middle of an element.
    #[error("Unexpected end of input at offset {0}")]
    UnexpectedEndOfInput(usize),

    /// The structure was understood but the algorithm is not handled.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Error in a canonical S-expression.
    #[error("Malformed S-expression at offset {offset}: {reason}")]
    MalformedSExpression { offset: usize, reason: String },

    /// A single extension failed to decode; other extensions are unaffected.
    #[error("Extension {oid}: {source}")]
    Extension {
        oid: ObjectIdentifier,
        source: Box<CertReadError>,
    },

    /// The certificate carries the same extension more than once.
    #[error("Duplicate extension {0}")]
    DuplicateExtension(ObjectIdentifier),

    /// Re-encoding a decoded value did not reproduce the original bytes.
    #[error("Round-trip mismatch: {0}")]
    RoundTripMismatch(String),

    /// The length field announces more data than the configured limit.
    #[error("Input of {len} bytes exceeds the limit of {limit} bytes")]
    InputTooLarge { len: usize, limit: usize },

    /// Key material that does not form a valid key.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Error from RSA operations.
    #[error("RSA error: {0}")]
    RsaError(String),

    /// Error while decoding PEM armor.
    #[error("PEM error: {0}")]
    PemError(String),

    /// Error reported by the byte source.
    #[error("Read error: {0}")]
    ReadError(String),
}

pub type Result<T> = std::result::Result<T, CertReadError>;

impl CertReadError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        CertReadError::MalformedDer {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_sexp(offset: usize, reason: impl Into<String>) -> Self {
        CertReadError::MalformedSExpression {
            offset,
            reason: reason.into(),
        }
    }

    /// Attributes this error to the extension identified by `oid`.
    pub(crate) fn in_extension(self, oid: ObjectIdentifier) -> Self {
        match self {
            err @ CertReadError::Extension { .. } => err,
            err => CertReadError::Extension {
                oid,
                source: Box::new(err),
            },
        }
    }

    /// Returns `true` for structural decode failures, looking through the
    /// per-extension wrapper.
    pub fn is_malformed(&self) -> bool {
        match self {
            CertReadError::MalformedDer { .. } | CertReadError::UnexpectedEndOfInput(_) => true,
            CertReadError::Extension { source, .. } => source.is_malformed(),
            _ => false,
        }
    }
}

impl From<der::Error> for CertReadError {
    /// Converts a `der::Error` into a `CertReadError`.
    fn from(err: der::Error) -> Self {
        let offset = err.position().map(|pos| u32::from(pos) as usize).unwrap_or(0);
        match err.kind() {
            der::ErrorKind::Incomplete { .. } => CertReadError::UnexpectedEndOfInput(offset),
            _ => CertReadError::malformed(offset, err.to_string()),
        }
    }
}

impl From<rsa::Error> for CertReadError {
    fn from(err: rsa::Error) -> Self {
        CertReadError::RsaError(err.to_string())
    }
}

impl From<pem::PemError> for CertReadError {
    fn from(err: pem::PemError) -> Self {
        CertReadError::PemError(err.to_string())
    }
}

impl From<std::io::Error> for CertReadError {
    fn from(err: std::io::Error) -> Self {
        CertReadError::ReadError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_wrapper_keeps_malformed_kind() {
        let oid = ObjectIdentifier::new_unwrap("2.5.29.15");
        let err = CertReadError::malformed(3, "length overrun").in_extension(oid);
        assert!(err.is_malformed());
        assert!(matches!(err, CertReadError::Extension { .. }));

        let rewrapped = err.clone().in_extension(ObjectIdentifier::new_unwrap("2.5.29.19"));
        assert_eq!(err, rewrapped);
    }

    #[test]
    fn test_unsupported_is_not_malformed() {
        let err = CertReadError::UnsupportedAlgorithm("1.2.3".to_string());
        assert!(!err.is_malformed());
    }
}
