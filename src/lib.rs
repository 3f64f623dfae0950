//! # CertRead - A Pure Rust X.509 Certificate Decoder
//!
//! CertRead decodes DER-encoded X.509 certificates into a read-only model and converts
//! public keys between the DER `SubjectPublicKeyInfo` structure and canonical
//! S-expressions. It is built on rustcrypto libraries; openssl is only used to
//! cross-check results in the test suite.
//!
//! ## Supported Key Types
//!
//! - **RSA**: any modulus size, `(public-key (rsa (n ..) (e ..)))`
//! - **DSA**: `(public-key (dsa (p ..) (q ..) (g ..) (y ..)))`
//! - **ECDSA**: NIST P-256, P-384, P-521, secp256k1 and the brainpool r1 curves
//! - **EdDSA**: Ed25519 and Ed448
//!
//! ## Key Features
//!
//! - **Lazy decoding**: names, extension values and keys are decoded when asked for
//! - **Offset-accurate errors**: every structural error carries the absolute offset
//! - **Local extension failures**: a broken extension does not spoil the others
//! - **Streams**: read any number of concatenated certificates from an [`std::io::Read`]
//! - **Bounded input**: size and nesting limits are checked before allocating
//!
//! ## Quick Start
//!
//! ### Inspecting a Certificate
//!
//! ```rust,no_run
//! use certread::cert::Certificate;
//!
//! # fn main() -> Result<(), certread::error::CertReadError> {
//! let der = std::fs::read("server.der")?;
//! let cert = Certificate::from_der(&der)?;
//!
//! println!("subject:  {}", cert.subject(0)?.unwrap_or_default());
//! println!("issuer:   {}", cert.issuer(0)?.unwrap_or_default());
//! println!("serial:   {}", cert.serial());
//! println!("validity: {} - {}", cert.validity().not_before, cert.validity().not_after);
//!
//! for ext in cert.extensions() {
//!     println!("extension {ext}");
//! }
//! if let Some(key_usage) = cert.key_usage()? {
//!     println!("key usage: {key_usage}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Converting Public Keys
//!
//! ```rust
//! use certread::keyinfo::{der_to_sexp, sexp_to_der};
//!
//! # fn main() -> Result<(), certread::error::CertReadError> {
//! let sexp = b"(10:public-key(3:rsa(1:n3:\x00\xc1\x01)(1:e1:\x03)))";
//! let der = sexp_to_der(sexp)?;
//! assert_eq!(der_to_sexp(&der)?, sexp.to_vec());
//! # Ok(())
//! # }
//! ```
//!
//! ### Reading a Certificate Stream
//!
//! ```rust,no_run
//! use certread::reader::CertReader;
//!
//! # fn main() -> Result<(), certread::error::CertReadError> {
//! let mut reader = CertReader::new(std::fs::File::open("chain.der")?);
//! while let Some(cert) = reader.read_certificate()? {
//!     println!("{}", cert.subject(0)?.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`error::CertReadError`]. The absence of an optional
//! field, the end of a sequence and the end of a stream are `Ok(None)`, never errors:
//!
//! ```rust
//! use certread::{cert::Certificate, error::CertReadError};
//!
//! match Certificate::from_der(&[0x30, 0x03, 0x02, 0x01]) {
//!     Ok(_) => println!("decoded"),
//!     Err(CertReadError::UnexpectedEndOfInput(offset)) => println!("truncated at {offset}"),
//!     Err(e) if e.is_malformed() => println!("malformed: {e}"),
//!     Err(e) => println!("other error: {e}"),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`cert`]: Certificate model, names, validity and typed extensions
//! - [`reader`]: Multi-certificate stream reader
//! - [`keyinfo`]: S-expression <-> SubjectPublicKeyInfo codec
//! - [`key`]: Typed rustcrypto public keys
//! - [`sexp`]: Canonical S-expressions
//! - [`cursor`]: Low-level DER cursor
//! - [`error`]: Error type

pub mod cert;
pub mod cursor;
pub mod error;
pub mod key;
pub mod keyinfo;
pub mod oid;
pub mod pem_utils;
pub mod reader;
pub mod sexp;

pub use cert::Certificate;
pub use error::{CertReadError, Result};
pub use keyinfo::{KeyInfo, der_to_sexp, sexp_to_der};
pub use pem_utils::certificates_from_pem;
pub use reader::CertReader;
