pub mod extensions;
pub mod name;
pub mod params;

use std::ops::Range;

use const_oid::ObjectIdentifier;
use extensions::{
    AccessDescription, AuthorityKeyIdentifier, BasicConstraints, CertificatePolicies,
    DistributionPoint, ExtendedKeyUsage, ExtensionSequence, FromX509Extension, IssuerAltName,
    KeyPurpose, KeyUsage, PolicyInformation, SequenceElement, SubjectAltName, SubjectKeyIdentifier,
    decode_extension,
};
use name::{DistinguishedName, Name};
use params::{DecodeOptions, Extension, Serial, Validity};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::cursor::{Cursor, TagClass, Tlv, bit_string_octets, decode_small_uint, tag};
use crate::error::{CertReadError, Result};
use crate::key::PublicKey;
use crate::keyinfo::KeyInfo;
use crate::oid;
use crate::sexp::Sexp;

/// An AlgorithmIdentifier: the OID and the complete encoding of the optional
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmIdentifier {
    pub oid: ObjectIdentifier,
    pub parameters: Option<Vec<u8>>,
}

impl AlgorithmIdentifier {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.enter_sequence()?;
        let oid = cursor.read_oid()?;
        let parameters = if cursor.at_end() {
            None
        } else {
            Some(cursor.read_raw_element()?.1.to_vec())
        };
        cursor.exit()?;
        Ok(Self { oid, parameters })
    }
}

/// Position of one extension in the certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ExtensionEntry {
    oid: ObjectIdentifier,
    critical: bool,
    offset: usize,
    length: usize,
}

/// A decoded X.509 certificate.
///
/// The certificate owns its DER image. Parsing records the position of
/// every field; names, extension values and the public key are decoded from
/// the image when they are requested, and the certificate never changes
/// after construction.
#[derive(Debug, Clone)]
pub struct Certificate {
    der: Vec<u8>,
    options: DecodeOptions,
    tbs: Range<usize>,
    version: u32,
    serial: Serial,
    tbs_signature_algorithm: AlgorithmIdentifier,
    issuer: Range<usize>,
    validity: Validity,
    subject: Range<usize>,
    spki: Range<usize>,
    extensions: Vec<ExtensionEntry>,
    signature_algorithm: AlgorithmIdentifier,
    signature: Range<usize>,
}

fn element_range(tlv: &Tlv) -> Range<usize> {
    tlv.header_offset..tlv.end()
}

fn expect_sequence(tlv: &Tlv, what: &str) -> Result<()> {
    if !tlv.is_universal(tag::SEQUENCE) || !tlv.constructed {
        return Err(CertReadError::malformed(
            tlv.header_offset,
            format!("{what} is not a SEQUENCE"),
        ));
    }
    Ok(())
}

impl Certificate {
    /// Parses a DER-encoded certificate with default options.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        Self::from_der_with_options(der, DecodeOptions::default())
    }

    pub fn from_der_with_options(der: &[u8], options: DecodeOptions) -> Result<Self> {
        if der.len() > options.max_certificate_len {
            return Err(CertReadError::InputTooLarge {
                len: der.len(),
                limit: options.max_certificate_len,
            });
        }
        Self::parse(der.to_vec(), options)
    }

    /// Parses the first `CERTIFICATE` block of a PEM document.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let der = crate::pem_utils::certificate_der_from_pem(pem)?;
        Self::from_der(&der)
    }

    pub(crate) fn parse(der: Vec<u8>, options: DecodeOptions) -> Result<Self> {
        let mut cursor = Cursor::new(&der).with_max_depth(options.max_depth);
        cursor.enter_sequence()?;

        let tbs_tlv = cursor.enter_sequence()?;
        let mut version = 0;
        if cursor.peek_tag()?.is_some_and(|t| t.is_context(0)) {
            let explicit = cursor.read_tag()?;
            cursor.enter(&explicit)?;
            let int = cursor.expect(TagClass::Universal, tag::INTEGER, false)?;
            version = decode_small_uint(cursor.read_content(&int)?, int.content_offset)?;
            cursor.exit()?;
            if version > 2 {
                return Err(CertReadError::malformed(
                    int.content_offset,
                    format!("unknown version {version}"),
                ));
            }
        }

        let serial_tlv = cursor.expect(TagClass::Universal, tag::INTEGER, false)?;
        let serial = Serial::new(cursor.read_content(&serial_tlv)?).map_err(|_| {
            CertReadError::malformed(serial_tlv.header_offset, "empty serial number")
        })?;

        let tbs_signature_algorithm = AlgorithmIdentifier::decode(&mut cursor)?;

        let (issuer_tlv, _) = cursor.read_raw_element()?;
        expect_sequence(&issuer_tlv, "issuer")?;
        let validity = Validity::decode(&mut cursor)?;
        let (subject_tlv, _) = cursor.read_raw_element()?;
        expect_sequence(&subject_tlv, "subject")?;
        let (spki_tlv, _) = cursor.read_raw_element()?;
        expect_sequence(&spki_tlv, "subjectPublicKeyInfo")?;

        let mut extensions = Vec::new();
        let mut last = 0;
        while let Some(field) = cursor.next_tag()? {
            if field.class != TagClass::ContextSpecific
                || field.number <= last
                || field.number > 3
            {
                return Err(CertReadError::malformed(
                    field.header_offset,
                    "unexpected field in TBSCertificate",
                ));
            }
            last = field.number;
            match field.number {
                // issuerUniqueID, subjectUniqueID
                1 | 2 => cursor.skip(field.content_len)?,
                _ => {
                    cursor.enter(&field)?;
                    extensions = parse_extensions(&mut cursor)?;
                    cursor.exit()?;
                }
            }
        }
        cursor.exit()?;

        let signature_algorithm = AlgorithmIdentifier::decode(&mut cursor)?;
        let sig_tlv = cursor.expect(TagClass::Universal, tag::BIT_STRING, false)?;
        bit_string_octets(cursor.read_content(&sig_tlv)?, sig_tlv.content_offset)?;
        cursor.exit()?;
        if !cursor.at_end() {
            return Err(CertReadError::malformed(
                cursor.offset(),
                "trailing data after certificate",
            ));
        }

        tracing::debug!(
            len = der.len(),
            version = version + 1,
            extensions = extensions.len(),
            "parsed certificate"
        );

        Ok(Self {
            tbs: element_range(&tbs_tlv),
            version,
            serial,
            tbs_signature_algorithm,
            issuer: element_range(&issuer_tlv),
            validity,
            subject: element_range(&subject_tlv),
            spki: element_range(&spki_tlv),
            extensions,
            signature_algorithm,
            signature: sig_tlv.content_offset + 1..sig_tlv.end(),
            options,
            der,
        })
    }

    /// The complete DER image.
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> String {
        crate::pem_utils::der_to_pem(&self.der, crate::pem_utils::CERTIFICATE_LABEL)
    }

    /// The encoded TBSCertificate, the part covered by the signature.
    pub fn tbs_der(&self) -> &[u8] {
        &self.der[self.tbs.clone()]
    }

    /// The version field as encoded: 0 for v1 (also when absent), 2 for v3.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn serial(&self) -> &Serial {
        &self.serial
    }

    /// The serial number in canonical `(<len>:<octets>)` form.
    pub fn serial_sexp(&self) -> Vec<u8> {
        self.serial.to_canon_sexp()
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    /// The outer signature algorithm.
    pub fn signature_algorithm(&self) -> &AlgorithmIdentifier {
        &self.signature_algorithm
    }

    /// The signature algorithm repeated inside the TBSCertificate.
    pub fn tbs_signature_algorithm(&self) -> &AlgorithmIdentifier {
        &self.tbs_signature_algorithm
    }

    /// The signature octets.
    pub fn signature_value(&self) -> &[u8] {
        &self.der[self.signature.clone()]
    }

    fn nested_cursor(&self, range: &Range<usize>) -> Cursor<'_> {
        Cursor::nested(&self.der[range.clone()], range.start).with_max_depth(self.options.max_depth)
    }

    pub fn issuer_dn(&self) -> Result<DistinguishedName> {
        DistinguishedName::decode(&mut self.nested_cursor(&self.issuer))
    }

    pub fn subject_dn(&self) -> Result<DistinguishedName> {
        DistinguishedName::decode(&mut self.nested_cursor(&self.subject))
    }

    /// Issuer rendering number `idx`: 0 is the RFC 2253 form of the issuer
    /// DN, later indices are the IssuerAltName entries that have an alias
    /// form. `Ok(None)` past the last rendering.
    pub fn issuer(&self, idx: usize) -> Result<Option<String>> {
        if idx == 0 {
            return self.issuer_dn().map(|dn| Some(dn.to_rfc2253()));
        }
        let names = self.get_extension::<IssuerAltName>()?.map(|ian| ian.0);
        Ok(nth_alias(names, idx - 1))
    }

    /// Subject rendering number `idx`, built like [`Certificate::issuer`]
    /// from the subject DN and SubjectAltName.
    pub fn subject(&self, idx: usize) -> Result<Option<String>> {
        if idx == 0 {
            return self.subject_dn().map(|dn| Some(dn.to_rfc2253()));
        }
        let names = self.get_extension::<SubjectAltName>()?.map(|san| san.0);
        Ok(nth_alias(names, idx - 1))
    }

    /// The DER SubjectPublicKeyInfo, exactly as found in the certificate.
    pub fn public_key_der(&self) -> &[u8] {
        &self.der[self.spki.clone()]
    }

    pub fn key_info(&self) -> Result<KeyInfo> {
        KeyInfo::from_der(self.public_key_der())
    }

    /// The subject public key as a typed RustCrypto key.
    pub fn typed_public_key(&self) -> Result<PublicKey> {
        PublicKey::from_key_info(&self.key_info()?)
    }

    /// The public key as a canonical S-expression. `Ok(None)` when the key
    /// algorithm is not one this crate models.
    pub fn public_key(&self) -> Result<Option<Vec<u8>>> {
        match self.key_info() {
            Ok(info) => Ok(Some(info.to_canon_sexp())),
            Err(CertReadError::UnsupportedAlgorithm(algorithm)) => {
                tracing::debug!(%algorithm, "public key algorithm not supported");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// The signature as a canonical `(sig-val ...)` expression.
    pub fn signature_value_sexp(&self) -> Result<Vec<u8>> {
        let algorithm = &self.signature_algorithm.oid;
        let value = self.signature_value();
        let body = if oid::in_arc(algorithm, oid::PKCS1) {
            Sexp::list(vec![Sexp::atom("rsa"), Sexp::pair("s", value)])
        } else if oid::in_arc(algorithm, oid::ECDSA_WITH_SHA2)
            || *algorithm == oid::ECDSA_WITH_SHA1
        {
            let (r, s) = self.signature_integers()?;
            Sexp::list(vec![Sexp::atom("ecdsa"), Sexp::pair("r", r), Sexp::pair("s", s)])
        } else if oid::in_arc(algorithm, oid::DSA_WITH_SHA2) || *algorithm == oid::DSA_WITH_SHA1 {
            let (r, s) = self.signature_integers()?;
            Sexp::list(vec![Sexp::atom("dsa"), Sexp::pair("r", r), Sexp::pair("s", s)])
        } else if *algorithm == oid::ED25519 || *algorithm == oid::ED448 {
            let (r, s) = value.split_at(value.len() / 2);
            Sexp::list(vec![Sexp::atom("eddsa"), Sexp::pair("r", r), Sexp::pair("s", s)])
        } else {
            return Err(CertReadError::UnsupportedAlgorithm(algorithm.to_string()));
        };
        Ok(Sexp::list(vec![Sexp::atom("sig-val"), body]).to_canonical())
    }

    /// Splits a `SEQUENCE { r INTEGER, s INTEGER }` signature.
    fn signature_integers(&self) -> Result<(&[u8], &[u8])> {
        let mut cursor = self.nested_cursor(&self.signature);
        cursor.enter_sequence()?;
        let r = cursor.read_universal(tag::INTEGER)?;
        let s = cursor.read_universal(tag::INTEGER)?;
        cursor.exit()?;
        if !cursor.at_end() {
            return Err(CertReadError::malformed(cursor.offset(), "trailing data after signature"));
        }
        Ok((r, s))
    }

    pub fn fingerprint_sha1(&self) -> [u8; 20] {
        Sha1::digest(&self.der).into()
    }

    pub fn fingerprint_sha256(&self) -> [u8; 32] {
        Sha256::digest(&self.der).into()
    }

    fn view(&self, entry: &ExtensionEntry) -> Extension<'_> {
        Extension {
            oid: entry.oid,
            critical: entry.critical,
            offset: entry.offset,
            length: entry.length,
            value: &self.der[entry.offset..entry.offset + entry.length],
        }
    }

    /// Extension number `idx` in encoded order, `None` past the last one.
    pub fn extension(&self, idx: usize) -> Option<Extension<'_>> {
        self.extensions.get(idx).map(|entry| self.view(entry))
    }

    /// All extensions in encoded order. Each call starts from the first.
    pub fn extensions(&self) -> impl Iterator<Item = Extension<'_>> {
        self.extensions.iter().map(|entry| self.view(entry))
    }

    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    /// Looks up the extension `oid`. A certificate that carries it more than
    /// once is rejected with [`CertReadError::DuplicateExtension`].
    pub fn find_extension(&self, oid: &ObjectIdentifier) -> Result<Option<Extension<'_>>> {
        let mut found = self.extensions().filter(|ext| &ext.oid == oid);
        let first = found.next();
        if found.next().is_some() {
            return Err(CertReadError::DuplicateExtension(*oid));
        }
        Ok(first)
    }

    /// Decodes extension `T`. `Ok(None)` when the certificate does not carry
    /// it.
    pub fn get_extension<T: FromX509Extension>(&self) -> Result<Option<T>> {
        self.find_extension(&T::OID)?
            .map(|ext| decode_extension(&ext, self.options.max_depth))
            .transpose()
    }

    /// Lazy view of a sequence-valued extension. `Ok(None)` when the
    /// certificate does not carry it.
    pub fn extension_sequence<T: SequenceElement>(
        &self,
        oid: &ObjectIdentifier,
    ) -> Result<Option<ExtensionSequence<'_, T>>> {
        self.find_extension(oid)?
            .map(|ext| ExtensionSequence::open(&ext, self.options.max_depth))
            .transpose()
    }

    fn sequence_element<T: SequenceElement>(
        &self,
        oid: &ObjectIdentifier,
        idx: usize,
    ) -> Result<Option<T>> {
        match self.extension_sequence::<T>(oid)? {
            Some(seq) => seq.get(idx),
            None => Ok(None),
        }
    }

    pub fn key_usage(&self) -> Result<Option<KeyUsage>> {
        self.get_extension()
    }

    pub fn basic_constraints(&self) -> Result<Option<BasicConstraints>> {
        self.get_extension()
    }

    /// Whether the certificate is a CA, and its path length limit. A
    /// certificate without BasicConstraints is not a CA.
    pub fn is_ca(&self) -> Result<(bool, Option<u32>)> {
        Ok(self
            .basic_constraints()?
            .map(|bc| (bc.is_ca, bc.max_path_length))
            .unwrap_or((false, None)))
    }

    pub fn subject_key_identifier(&self) -> Result<Option<SubjectKeyIdentifier>> {
        self.get_extension()
    }

    pub fn authority_key_identifier(&self) -> Result<Option<AuthorityKeyIdentifier>> {
        self.get_extension()
    }

    pub fn extended_key_usage(&self) -> Result<Option<ExtendedKeyUsage>> {
        self.get_extension()
    }

    /// Key purpose number `idx` of the Extended Key Usage extension.
    pub fn key_purpose(&self, idx: usize) -> Result<Option<KeyPurpose>> {
        self.sequence_element(&oid::EXT_KEY_USAGE, idx)
    }

    pub fn certificate_policies(&self) -> Result<Option<CertificatePolicies>> {
        self.get_extension()
    }

    /// Policy number `idx` of the Certificate Policies extension.
    pub fn policy(&self, idx: usize) -> Result<Option<PolicyInformation>> {
        self.sequence_element(&oid::CERTIFICATE_POLICIES, idx)
    }

    /// Distribution point number `idx` of the CRL Distribution Points
    /// extension.
    pub fn crl_distribution_point(&self, idx: usize) -> Result<Option<DistributionPoint>> {
        self.sequence_element(&oid::CRL_DISTRIBUTION_POINTS, idx)
    }

    /// Access description number `idx` of the Authority Information Access
    /// extension.
    pub fn authority_info_access(&self, idx: usize) -> Result<Option<AccessDescription>> {
        self.sequence_element(&oid::AUTHORITY_INFO_ACCESS, idx)
    }

    /// Access description number `idx` of the Subject Information Access
    /// extension.
    pub fn subject_info_access(&self, idx: usize) -> Result<Option<AccessDescription>> {
        self.sequence_element(&oid::SUBJECT_INFO_ACCESS, idx)
    }

    pub fn subject_alt_name(&self) -> Result<Option<Name>> {
        Ok(self.get_extension::<SubjectAltName>()?.map(|san| san.0))
    }

    pub fn issuer_alt_name(&self) -> Result<Option<Name>> {
        Ok(self.get_extension::<IssuerAltName>()?.map(|ian| ian.0))
    }
}

fn nth_alias(names: Option<Name>, idx: usize) -> Option<String> {
    names?.iter().filter_map(|name| name.alias_string()).nth(idx)
}

fn parse_extensions(cursor: &mut Cursor<'_>) -> Result<Vec<ExtensionEntry>> {
    cursor.enter_sequence()?;
    let mut entries = Vec::new();
    while let Some(seq) = cursor.next_tag()? {
        expect_sequence(&seq, "extension")?;
        cursor.enter(&seq)?;
        let oid = cursor.read_oid()?;
        let critical = match cursor.peek_tag()? {
            Some(t) if t.is_universal(tag::BOOLEAN) => cursor.read_bool()?,
            _ => false,
        };
        let value = cursor.expect(TagClass::Universal, tag::OCTET_STRING, false)?;
        cursor.skip(value.content_len)?;
        cursor.exit()?;
        tracing::trace!(
            %oid,
            critical,
            offset = value.content_offset,
            len = value.content_len,
            "extension"
        );
        entries.push(ExtensionEntry {
            oid,
            critical,
            offset: value.content_offset,
            length: value.content_len,
        });
    }
    cursor.exit()?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // Minimal v1 certificate: serial 0, empty names, one-octet key and
    // signature placeholders.
    fn minimal(version: &[u8], extensions: &[u8]) -> Vec<u8> {
        let mut tbs = Vec::new();
        tbs.extend_from_slice(version);
        tbs.extend_from_slice(&hex!("02 01 00"));
        tbs.extend_from_slice(&hex!("30 0a 06 08 2a 86 48 ce 3d 04 03 02"));
        tbs.extend_from_slice(&hex!("30 00"));
        tbs.extend_from_slice(&hex!(
            "30 1e"
            "17 0d 32 36 31 30 31 36 30 34 31 31 30 39 5a"
            "17 0d 33 36 31 30 31 33 30 34 31 31 30 39 5a"
        ));
        tbs.extend_from_slice(&hex!("30 00"));
        tbs.extend_from_slice(&hex!("30 0b 30 05 06 03 2b 65 70 03 02 00 01"));
        tbs.extend_from_slice(extensions);

        let mut body = sequence(&tbs);
        body.extend_from_slice(&hex!("30 0a 06 08 2a 86 48 ce 3d 04 03 02"));
        body.extend_from_slice(&hex!("03 09 00 30 06 02 01 01 02 01 02"));
        sequence(&body)
    }

    fn sequence(content: &[u8]) -> Vec<u8> {
        let mut der = vec![0x30];
        match content.len() {
            len @ 0..=0x7f => der.push(len as u8),
            len @ 0x80..=0xff => der.extend_from_slice(&[0x81, len as u8]),
            len => der.extend_from_slice(&[0x82, (len >> 8) as u8, len as u8]),
        }
        der.extend_from_slice(content);
        der
    }

    #[test]
    fn test_minimal_v1() {
        let cert = Certificate::from_der(&minimal(&[], &[])).unwrap();
        assert_eq!(cert.version(), 0);
        assert!(cert.serial().is_zero());
        assert_eq!(cert.serial_sexp(), b"(1:\x00)");
        assert_eq!(cert.issuer(0).unwrap().as_deref(), Some(""));
        assert_eq!(cert.subject(1).unwrap(), None);
        assert_eq!(cert.validity().not_before.to_string(), "20261016T041109");
        assert_eq!(cert.extension_count(), 0);
        assert_eq!(cert.extension(0), None);
        assert_eq!(cert.key_usage().unwrap(), None);
        assert_eq!(cert.is_ca().unwrap(), (false, None));
        // the one-octet placeholder is not a valid Ed25519 key
        assert!(matches!(cert.public_key().unwrap_err(), CertReadError::InvalidKey(_)));
        assert_eq!(
            cert.signature_value_sexp().unwrap(),
            b"(7:sig-val(5:ecdsa(1:r1:\x01)(1:s1:\x02)))".to_vec()
        );
    }

    #[test]
    fn test_extension_table_and_duplicates() {
        // [3] { SEQUENCE { KU critical 03 02 05 a0, SKI 04 01 aa, SKI 04 01 bb } }
        let exts = hex!(
            "a3 2a 30 28"
            "30 0e 06 03 55 1d 0f 01 01 ff 04 04 03 02 05 a0"
            "30 0a 06 03 55 1d 0e 04 03 04 01 aa"
            "30 0a 06 03 55 1d 0e 04 03 04 01 bb"
        );
        let der = minimal(&hex!("a0 03 02 01 02"), &exts);
        let cert = Certificate::from_der(&der).unwrap();
        assert_eq!(cert.version(), 2);
        assert_eq!(cert.extension_count(), 3);

        let first: Vec<_> = cert.extensions().collect();
        let second: Vec<_> = cert.extensions().collect();
        assert_eq!(first, second);

        let ku = cert.extension(0).unwrap();
        assert_eq!(ku.oid, oid::KEY_USAGE);
        assert!(ku.critical);
        assert_eq!(ku.value, &hex!("03 02 05 a0"));
        assert_eq!(&der[ku.offset..ku.offset + ku.length], ku.value);

        assert!(cert.key_usage().unwrap().is_some());
        assert_eq!(
            cert.subject_key_identifier().unwrap_err(),
            CertReadError::DuplicateExtension(oid::SUBJECT_KEY_IDENTIFIER)
        );
    }

    #[test]
    fn test_size_limit() {
        let der = minimal(&[], &[]);
        let options = DecodeOptions::builder().max_certificate_len(der.len() - 1).build();
        assert!(matches!(
            Certificate::from_der_with_options(&der, options).unwrap_err(),
            CertReadError::InputTooLarge { .. }
        ));
    }

    #[test]
    fn test_truncated_and_trailing() {
        let der = minimal(&[], &[]);
        assert!(matches!(
            Certificate::from_der(&der[..der.len() - 3]).unwrap_err(),
            CertReadError::UnexpectedEndOfInput(_)
        ));
        let mut trailing = der.clone();
        trailing.push(0);
        assert!(Certificate::from_der(&trailing).unwrap_err().is_malformed());
    }
}
