use std::fmt;
use std::marker::PhantomData;

use const_oid::ObjectIdentifier;
pub use der::flagset::FlagSet;
use der::flagset::flags;
pub use x509_cert::ext::pkix::KeyUsages;

use super::name::{GeneralName, Name, RelativeDistinguishedName, decode_string};
use super::params::{Extension, Serial};
use crate::cursor::{Cursor, DEFAULT_MAX_DEPTH, TagClass, decode_bit_flags, decode_small_uint, tag};
use crate::error::{CertReadError, Result};
use crate::oid;

/// Trait for decoding the value of an X.509 extension.
///
/// Implementors read from a cursor that covers exactly the content of the
/// `extnValue` OCTET STRING. Offsets in errors are absolute positions in the
/// certificate.
///
/// # Example
/// ```
/// use certread::cert::extensions::{BasicConstraints, FromX509Extension};
/// use certread::cert::params::Extension;
/// let value = [0x30, 0x06, 0x01, 0x01, 0xff, 0x02, 0x01, 0x01];
/// let ext = Extension {
///     oid: BasicConstraints::OID,
///     critical: true,
///     offset: 0,
///     length: 8,
///     value: &value,
/// };
/// let bc = BasicConstraints::from_extension(&ext).unwrap();
/// assert_eq!((bc.is_ca, bc.max_path_length), (true, Some(1)));
/// ```
pub trait FromX509Extension: Sized {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Decodes the extension value at the cursor.
    fn from_x509_extension_value(cursor: &mut Cursor<'_>) -> Result<Self>;

    /// Decodes `ext`, attributing any failure to the extension's OID.
    fn from_extension(ext: &Extension<'_>) -> Result<Self> {
        decode_extension(ext, DEFAULT_MAX_DEPTH)
    }
}

fn value_cursor<'a>(ext: &Extension<'a>, max_depth: usize) -> Result<Cursor<'a>> {
    if ext.value.is_empty() {
        return Err(CertReadError::malformed(ext.offset, "empty extension value"));
    }
    Ok(Cursor::nested(ext.value, ext.offset).with_max_depth(max_depth))
}

pub(crate) fn decode_extension<T: FromX509Extension>(
    ext: &Extension<'_>,
    max_depth: usize,
) -> Result<T> {
    let decode = || {
        let mut cursor = value_cursor(ext, max_depth)?;
        let value = T::from_x509_extension_value(&mut cursor)?;
        if !cursor.at_end() {
            return Err(CertReadError::malformed(
                cursor.offset(),
                "trailing data after extension value",
            ));
        }
        Ok(value)
    };
    decode().map_err(|err: CertReadError| {
        tracing::debug!(oid = %ext.oid, error = %err, "extension failed to decode");
        err.in_extension(ext.oid)
    })
}

/// An element of a `SEQUENCE SIZE (1..MAX) OF` extension.
pub trait SequenceElement: Sized {
    fn decode_element(cursor: &mut Cursor<'_>) -> Result<Self>;
}

/// Lazy, restartable view of the elements of a sequence-valued extension.
///
/// Elements are decoded one at a time as the iterator advances. After an
/// element fails to decode the iterator yields that error once and then
/// stops.
#[derive(Debug)]
pub struct ExtensionSequence<'a, T> {
    cursor: Cursor<'a>,
    oid: ObjectIdentifier,
    done: bool,
    _element: PhantomData<fn() -> T>,
}

impl<T> Clone for ExtensionSequence<'_, T> {
    fn clone(&self) -> Self {
        Self {
            cursor: self.cursor.clone(),
            oid: self.oid,
            done: self.done,
            _element: PhantomData,
        }
    }
}

impl<'a, T: SequenceElement> ExtensionSequence<'a, T> {
    pub(crate) fn open(ext: &Extension<'a>, max_depth: usize) -> Result<Self> {
        let open = || {
            let mut cursor = value_cursor(ext, max_depth)?;
            let seq = cursor.enter_sequence()?;
            if seq.end() != ext.offset + ext.value.len() {
                return Err(CertReadError::malformed(
                    seq.end(),
                    "trailing data after extension value",
                ));
            }
            if seq.content_len == 0 {
                return Err(CertReadError::malformed(seq.header_offset, "empty sequence"));
            }
            Ok(cursor)
        };
        let cursor = open().map_err(|err| err.in_extension(ext.oid))?;
        Ok(Self {
            cursor,
            oid: ext.oid,
            done: false,
            _element: PhantomData,
        })
    }

    /// Returns element `idx`, `Ok(None)` past the last element.
    pub fn get(&self, idx: usize) -> Result<Option<T>> {
        let mut elements = self.clone();
        for _ in 0..idx {
            match elements.next() {
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err),
                None => return Ok(None),
            }
        }
        elements.next().transpose()
    }

    /// Decodes every element, stopping at the first failure.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        self.clone().collect()
    }
}

impl<T: SequenceElement> Iterator for ExtensionSequence<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor.at_end() {
            return None;
        }
        let item = T::decode_element(&mut self.cursor).map_err(|err| err.in_extension(self.oid));
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

fn decode_sequence_of<T: SequenceElement>(cursor: &mut Cursor<'_>) -> Result<Vec<T>> {
    let seq = cursor.enter_sequence()?;
    let mut elements = Vec::new();
    while !cursor.at_end() {
        elements.push(T::decode_element(cursor)?);
    }
    if elements.is_empty() {
        return Err(CertReadError::malformed(seq.header_offset, "empty sequence"));
    }
    cursor.exit()?;
    Ok(elements)
}

/// Compares two lists as multisets: same elements, any order.
fn same_elements<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len()
        && a.iter().all(|x| {
            a.iter().filter(|y| *y == x).count() == b.iter().filter(|y| *y == x).count()
        })
}

/// Represents the Subject Key Identifier extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl FromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = oid::SUBJECT_KEY_IDENTIFIER;

    fn from_x509_extension_value(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self(cursor.read_universal(tag::OCTET_STRING)?.to_vec()))
    }
}

/// Represents the Authority Key Identifier (AKI) extension.
///
/// Identifies the public key corresponding to the private key used to sign
/// the certificate.
///
/// # Fields
/// * `key_identifier` - The key identifier.
/// * `authority_cert_issuer` - Names of the issuer's issuer.
/// * `authority_cert_serial_number` - The issuer's certificate serial number.
///
/// Each field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Option<Vec<u8>>,
    pub authority_cert_issuer: Option<Name>,
    pub authority_cert_serial_number: Option<Serial>,
}

impl FromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = oid::AUTHORITY_KEY_IDENTIFIER;

    fn from_x509_extension_value(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.enter_sequence()?;
        let mut aki = AuthorityKeyIdentifier::default();
        let mut last = None;
        while let Some(tlv) = cursor.next_tag()? {
            if tlv.class != TagClass::ContextSpecific || last.is_some_and(|n| tlv.number <= n) {
                return Err(CertReadError::malformed(
                    tlv.header_offset,
                    "unexpected field in AuthorityKeyIdentifier",
                ));
            }
            last = Some(tlv.number);
            match (tlv.number, tlv.constructed) {
                (0, false) => aki.key_identifier = Some(cursor.read_content(&tlv)?.to_vec()),
                (1, true) => aki.authority_cert_issuer = Some(Name::decode_tagged(cursor, &tlv)?),
                (2, false) => {
                    let content = cursor.read_content(&tlv)?;
                    let serial = Serial::new(content).map_err(|_| {
                        CertReadError::malformed(tlv.content_offset, "empty serial number")
                    })?;
                    aki.authority_cert_serial_number = Some(serial);
                }
                _ => {
                    return Err(CertReadError::malformed(
                        tlv.header_offset,
                        "unexpected field in AuthorityKeyIdentifier",
                    ));
                }
            }
        }
        cursor.exit()?;
        Ok(aki)
    }
}

/// Represents the Basic Constraints extension.
///
/// This extension indicates whether the certificate is a CA certificate and its path length.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed.
///   Only kept when `is_ca` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u32>,
}

impl FromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = oid::BASIC_CONSTRAINTS;

    fn from_x509_extension_value(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.enter_sequence()?;
        let mut bc = BasicConstraints::default();
        if cursor.peek_tag()?.is_some_and(|t| t.is_universal(tag::BOOLEAN)) {
            bc.is_ca = cursor.read_bool()?;
        }
        if let Some(tlv) = cursor.next_tag()? {
            if !tlv.is_universal(tag::INTEGER) {
                return Err(CertReadError::malformed(
                    tlv.header_offset,
                    "pathLenConstraint must be an INTEGER",
                ));
            }
            let path_len = decode_small_uint(cursor.read_content(&tlv)?, tlv.content_offset)?;
            if bc.is_ca {
                bc.max_path_length = Some(path_len);
            } else {
                tracing::trace!(path_len, "ignoring pathLenConstraint on a non-CA certificate");
            }
        }
        cursor.exit()?;
        Ok(bc)
    }
}

/// Represents the Key Usage extension.
///
/// This extension defines the purpose of the key contained in the certificate.
/// An empty bit string decodes to an empty set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl KeyUsage {
    pub fn contains(&self, usage: KeyUsages) -> bool {
        self.0.contains(usage)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = oid::KEY_USAGE;

    fn from_x509_extension_value(cursor: &mut Cursor<'_>) -> Result<Self> {
        let tlv = cursor.expect(TagClass::Universal, tag::BIT_STRING, false)?;
        let bits = decode_bit_flags(cursor.read_content(&tlv)?, tlv.content_offset, 9)?;
        Ok(Self(FlagSet::<KeyUsages>::new_truncated(bits as u16)))
    }
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.into_iter().map(|usage| format!("{usage:?}")).collect();
        f.write_str(&names.join(", "))
    }
}

/// A key purpose listed in the Extended Key Usage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPurpose {
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
    Other(ObjectIdentifier),
}

impl From<ObjectIdentifier> for KeyPurpose {
    fn from(value: ObjectIdentifier) -> Self {
        match value {
            const_oid::db::rfc5912::ID_KP_SERVER_AUTH => KeyPurpose::ServerAuth,
            const_oid::db::rfc5912::ID_KP_CLIENT_AUTH => KeyPurpose::ClientAuth,
            const_oid::db::rfc5912::ID_KP_CODE_SIGNING => KeyPurpose::CodeSigning,
            const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION => KeyPurpose::EmailProtection,
            const_oid::db::rfc5912::ID_KP_TIME_STAMPING => KeyPurpose::TimeStamping,
            const_oid::db::rfc5912::ID_KP_OCSP_SIGNING => KeyPurpose::OcspSigning,
            other => KeyPurpose::Other(other),
        }
    }
}

impl From<KeyPurpose> for ObjectIdentifier {
    fn from(value: KeyPurpose) -> Self {
        match value {
            KeyPurpose::ServerAuth => const_oid::db::rfc5912::ID_KP_SERVER_AUTH,
            KeyPurpose::ClientAuth => const_oid::db::rfc5912::ID_KP_CLIENT_AUTH,
            KeyPurpose::CodeSigning => const_oid::db::rfc5912::ID_KP_CODE_SIGNING,
            KeyPurpose::EmailProtection => const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION,
            KeyPurpose::TimeStamping => const_oid::db::rfc5912::ID_KP_TIME_STAMPING,
            KeyPurpose::OcspSigning => const_oid::db::rfc5912::ID_KP_OCSP_SIGNING,
            KeyPurpose::Other(oid) => oid,
        }
    }
}

impl SequenceElement for KeyPurpose {
    fn decode_element(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(cursor.read_oid()?.into())
    }
}

/// Represents the Extended Key Usage extension.
///
/// The encoded order is kept for display; equality ignores it.
#[derive(Debug, Clone, Default)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<KeyPurpose>,
}

impl PartialEq for ExtendedKeyUsage {
    fn eq(&self, other: &Self) -> bool {
        same_elements(&self.usage, &other.usage)
    }
}

impl FromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = oid::EXT_KEY_USAGE;

    fn from_x509_extension_value(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            usage: decode_sequence_of(cursor)?,
        })
    }
}

/// A qualifier attached to a certificate policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyQualifier {
    /// id-qt-cps
    CpsUri(String),
    /// id-qt-unotice
    UserNotice {
        organization: Option<String>,
        notice_numbers: Vec<u32>,
        explicit_text: Option<String>,
    },
    Other {
        oid: ObjectIdentifier,
        /// Complete DER encoding of the qualifier value.
        raw: Vec<u8>,
    },
}

fn read_display_text(cursor: &mut Cursor<'_>) -> Result<String> {
    let (tlv, content) = cursor.read_element()?;
    decode_string(&tlv, content)?
        .ok_or_else(|| CertReadError::malformed(tlv.header_offset, "DisplayText must be a string"))
}

impl PolicyQualifier {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.enter_sequence()?;
        let oid = cursor.read_oid()?;
        let qualifier = if oid == oid::QT_CPS {
            let tlv = cursor.expect(TagClass::Universal, tag::IA5_STRING, false)?;
            let content = cursor.read_content(&tlv)?;
            let uri = std::str::from_utf8(content)
                .map_err(|_| CertReadError::malformed(tlv.content_offset, "invalid CPS URI"))?;
            PolicyQualifier::CpsUri(uri.to_owned())
        } else if oid == oid::QT_UNOTICE {
            cursor.enter_sequence()?;
            let mut organization = None;
            let mut notice_numbers = Vec::new();
            let mut explicit_text = None;
            if cursor.peek_tag()?.is_some_and(|t| t.is_universal(tag::SEQUENCE)) {
                cursor.enter_sequence()?;
                organization = Some(read_display_text(cursor)?);
                cursor.enter_sequence()?;
                while !cursor.at_end() {
                    let tlv = cursor.expect(TagClass::Universal, tag::INTEGER, false)?;
                    let content = cursor.read_content(&tlv)?;
                    notice_numbers.push(decode_small_uint(content, tlv.content_offset)?);
                }
                cursor.exit()?;
                cursor.exit()?;
            }
            if !cursor.at_end() {
                explicit_text = Some(read_display_text(cursor)?);
            }
            cursor.exit()?;
            PolicyQualifier::UserNotice {
                organization,
                notice_numbers,
                explicit_text,
            }
        } else {
            let (_, raw) = cursor.read_raw_element()?;
            PolicyQualifier::Other { oid, raw: raw.to_vec() }
        };
        cursor.exit()?;
        Ok(qualifier)
    }
}

/// One entry of the Certificate Policies extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyInformation {
    pub policy_id: ObjectIdentifier,
    pub qualifiers: Vec<PolicyQualifier>,
}

impl SequenceElement for PolicyInformation {
    fn decode_element(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.enter_sequence()?;
        let policy_id = cursor.read_oid()?;
        let mut qualifiers = Vec::new();
        if !cursor.at_end() {
            let seq = cursor.enter_sequence()?;
            while !cursor.at_end() {
                qualifiers.push(PolicyQualifier::decode(cursor)?);
            }
            if qualifiers.is_empty() {
                return Err(CertReadError::malformed(
                    seq.header_offset,
                    "empty policy qualifier list",
                ));
            }
            cursor.exit()?;
        }
        cursor.exit()?;
        Ok(Self {
            policy_id,
            qualifiers,
        })
    }
}

/// Represents the Certificate Policies extension.
///
/// Equality ignores the order of policies.
#[derive(Debug, Clone, Default)]
pub struct CertificatePolicies(pub Vec<PolicyInformation>);

impl CertificatePolicies {
    pub fn policy_ids(&self) -> impl Iterator<Item = ObjectIdentifier> + '_ {
        self.0.iter().map(|p| p.policy_id)
    }
}

impl PartialEq for CertificatePolicies {
    fn eq(&self, other: &Self) -> bool {
        same_elements(&self.0, &other.0)
    }
}

impl FromX509Extension for CertificatePolicies {
    const OID: ObjectIdentifier = oid::CERTIFICATE_POLICIES;

    fn from_x509_extension_value(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self(decode_sequence_of(cursor)?))
    }
}

flags! {
    /// Revocation reasons a CRL distribution point is restricted to.
    pub enum CrlReason: u16 {
        Unspecified = 1 << 0,
        KeyCompromise = 1 << 1,
        CaCompromise = 1 << 2,
        AffiliationChanged = 1 << 3,
        Superseded = 1 << 4,
        CessationOfOperation = 1 << 5,
        CertificateHold = 1 << 6,
        PrivilegeWithdrawn = 1 << 7,
        AaCompromise = 1 << 8,
    }
}

/// The `distributionPoint` field of a CRL distribution point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistributionPointName {
    FullName(Name),
    NameRelativeToCrlIssuer(RelativeDistinguishedName),
}

/// One entry of the CRL Distribution Points extension.
///
/// # Fields
/// * `distribution_point` - Where the CRL can be found.
/// * `reasons` - Reasons covered by this CRL. `None` means no restriction;
///   a reasons field without any bit set is treated the same way.
/// * `crl_issuer` - Issuer of the CRL, when it is not the certificate issuer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionPoint {
    pub distribution_point: Option<DistributionPointName>,
    pub reasons: Option<FlagSet<CrlReason>>,
    pub crl_issuer: Option<Name>,
}

impl DistributionPoint {
    /// The `fullName` form of the distribution point, if present.
    pub fn full_name(&self) -> Option<&Name> {
        match &self.distribution_point {
            Some(DistributionPointName::FullName(name)) => Some(name),
            _ => None,
        }
    }
}

impl SequenceElement for DistributionPoint {
    fn decode_element(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.enter_sequence()?;
        let mut dp = DistributionPoint::default();
        let mut last = None;
        while let Some(tlv) = cursor.next_tag()? {
            if tlv.class != TagClass::ContextSpecific || last.is_some_and(|n| tlv.number <= n) {
                return Err(CertReadError::malformed(
                    tlv.header_offset,
                    "unexpected field in DistributionPoint",
                ));
            }
            last = Some(tlv.number);
            match (tlv.number, tlv.constructed) {
                (0, true) => {
                    cursor.enter(&tlv)?;
                    let choice = cursor.read_tag()?;
                    let name = match (choice.class, choice.number, choice.constructed) {
                        (TagClass::ContextSpecific, 0, true) => {
                            DistributionPointName::FullName(Name::decode_tagged(cursor, &choice)?)
                        }
                        (TagClass::ContextSpecific, 1, true) => {
                            DistributionPointName::NameRelativeToCrlIssuer(
                                RelativeDistinguishedName::decode_tagged(cursor, &choice)?,
                            )
                        }
                        _ => {
                            return Err(CertReadError::malformed(
                                choice.header_offset,
                                "invalid DistributionPointName",
                            ));
                        }
                    };
                    cursor.exit()?;
                    dp.distribution_point = Some(name);
                }
                (1, false) => {
                    let bits = decode_bit_flags(cursor.read_content(&tlv)?, tlv.content_offset, 9)?;
                    let reasons = FlagSet::<CrlReason>::new_truncated(bits as u16);
                    dp.reasons = (!reasons.is_empty()).then_some(reasons);
                }
                (2, true) => dp.crl_issuer = Some(Name::decode_tagged(cursor, &tlv)?),
                _ => {
                    return Err(CertReadError::malformed(
                        tlv.header_offset,
                        "unexpected field in DistributionPoint",
                    ));
                }
            }
        }
        cursor.exit()?;
        Ok(dp)
    }
}

/// Represents the CRL Distribution Points extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrlDistributionPoints(pub Vec<DistributionPoint>);

impl FromX509Extension for CrlDistributionPoints {
    const OID: ObjectIdentifier = oid::CRL_DISTRIBUTION_POINTS;

    fn from_x509_extension_value(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self(decode_sequence_of(cursor)?))
    }
}

/// One entry of the Authority or Subject Information Access extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDescription {
    pub access_method: ObjectIdentifier,
    pub access_location: GeneralName,
}

impl SequenceElement for AccessDescription {
    fn decode_element(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.enter_sequence()?;
        let access_method = cursor.read_oid()?;
        let access_location = GeneralName::decode(cursor)?;
        cursor.exit()?;
        Ok(Self {
            access_method,
            access_location,
        })
    }
}

/// Represents the Authority Information Access extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorityInfoAccess(pub Vec<AccessDescription>);

impl FromX509Extension for AuthorityInfoAccess {
    const OID: ObjectIdentifier = oid::AUTHORITY_INFO_ACCESS;

    fn from_x509_extension_value(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self(decode_sequence_of(cursor)?))
    }
}

/// Represents the Subject Information Access extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectInfoAccess(pub Vec<AccessDescription>);

impl FromX509Extension for SubjectInfoAccess {
    const OID: ObjectIdentifier = oid::SUBJECT_INFO_ACCESS;

    fn from_x509_extension_value(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self(decode_sequence_of(cursor)?))
    }
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// This extension specifies additional identities for the subject of the certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectAltName(pub Name);

impl FromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = oid::SUBJECT_ALT_NAME;

    fn from_x509_extension_value(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self(Name::decode(cursor)?))
    }
}

/// Represents the Issuer Alternative Name extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuerAltName(pub Name);

impl FromX509Extension for IssuerAltName {
    const OID: ObjectIdentifier = oid::ISSUER_ALT_NAME;

    fn from_x509_extension_value(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self(Name::decode(cursor)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn ext<'a>(oid: ObjectIdentifier, value: &'a [u8]) -> Extension<'a> {
        Extension {
            oid,
            critical: false,
            offset: 100,
            length: value.len(),
            value,
        }
    }

    #[test]
    fn test_basic_constraints_decoding() {
        let decode = |value: &[u8]| {
            BasicConstraints::from_extension(&ext(oid::BASIC_CONSTRAINTS, value)).unwrap()
        };
        let bc = decode(&hex!("30 06 01 01 ff 02 01 03"));
        assert!(bc.is_ca);
        assert_eq!(bc.max_path_length, Some(3));

        let bc = decode(&hex!("30 00"));
        assert_eq!(bc, BasicConstraints::default());

        // pathLenConstraint without cA
        let bc = decode(&hex!("30 03 02 01 02"));
        assert_eq!(bc.max_path_length, None);
    }

    #[test]
    fn test_authority_key_identifier_decoding() {
        // keyIdentifier only
        let aki = AuthorityKeyIdentifier::from_extension(&ext(
            oid::AUTHORITY_KEY_IDENTIFIER,
            &hex!("30 06 80 04 01 02 03 04"),
        ))
        .unwrap();
        assert_eq!(aki.key_identifier, Some(vec![1, 2, 3, 4]));
        assert_eq!(aki.authority_cert_issuer, None);
        assert_eq!(aki.authority_cert_serial_number, None);

        // issuer (dNSName) and serial, no keyIdentifier
        let aki = AuthorityKeyIdentifier::from_extension(&ext(
            oid::AUTHORITY_KEY_IDENTIFIER,
            &hex!("30 0b a1 06 82 04 61 2e 62 63 82 01 05"),
        ))
        .unwrap();
        assert_eq!(aki.key_identifier, None);
        let issuer = aki.authority_cert_issuer.unwrap();
        assert_eq!(issuer.get(0), Some(&GeneralName::DnsName("a.bc".to_string())));
        assert_eq!(aki.authority_cert_serial_number.unwrap().to_u64(), Some(5));

        // fields out of order
        let err = AuthorityKeyIdentifier::from_extension(&ext(
            oid::AUTHORITY_KEY_IDENTIFIER,
            &hex!("30 06 82 01 05 80 01 01"),
        ))
        .unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_key_usage_decoding() {
        let ku = KeyUsage::from_extension(&ext(oid::KEY_USAGE, &hex!("03 02 05 a0"))).unwrap();
        assert_eq!(ku, KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment));
        assert!(!ku.contains(KeyUsages::KeyCertSign));

        let ku = KeyUsage::from_extension(&ext(oid::KEY_USAGE, &hex!("03 03 07 80 80"))).unwrap();
        assert_eq!(ku, KeyUsage(KeyUsages::DigitalSignature | KeyUsages::DecipherOnly));

        let ku = KeyUsage::from_extension(&ext(oid::KEY_USAGE, &hex!("03 01 00"))).unwrap();
        assert!(ku.is_empty());
    }

    #[test]
    fn test_truncated_key_usage_is_malformed() {
        let err = KeyUsage::from_extension(&ext(oid::KEY_USAGE, &hex!("03 02 05"))).unwrap_err();
        assert!(err.is_malformed());
        match err {
            CertReadError::Extension { oid: failed, .. } => assert_eq!(failed, oid::KEY_USAGE),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_extension_value_is_malformed() {
        let err = KeyUsage::from_extension(&ext(oid::KEY_USAGE, &[])).unwrap_err();
        assert!(err.is_malformed());
        let err =
            ExtensionSequence::<KeyPurpose>::open(&ext(oid::EXT_KEY_USAGE, &[]), 32).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_extended_key_usage_order_insensitive() {
        // serverAuth, clientAuth
        let a = ExtendedKeyUsage::from_extension(&ext(
            oid::EXT_KEY_USAGE,
            &hex!("30 14 06 08 2b 06 01 05 05 07 03 01 06 08 2b 06 01 05 05 07 03 02"),
        ))
        .unwrap();
        let b = ExtendedKeyUsage::from_extension(&ext(
            oid::EXT_KEY_USAGE,
            &hex!("30 14 06 08 2b 06 01 05 05 07 03 02 06 08 2b 06 01 05 05 07 03 01"),
        ))
        .unwrap();
        assert_eq!(a.usage, vec![KeyPurpose::ServerAuth, KeyPurpose::ClientAuth]);
        assert_eq!(a, b);
        assert_ne!(a.usage, b.usage);

        let err =
            ExtendedKeyUsage::from_extension(&ext(oid::EXT_KEY_USAGE, &hex!("30 00"))).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_extension_sequence_by_index() {
        let value = hex!("30 14 06 08 2b 06 01 05 05 07 03 01 06 08 2b 06 01 05 05 07 03 09");
        let seq =
            ExtensionSequence::<KeyPurpose>::open(&ext(oid::EXT_KEY_USAGE, &value), 32).unwrap();
        assert_eq!(seq.get(0).unwrap(), Some(KeyPurpose::ServerAuth));
        assert_eq!(seq.get(1).unwrap(), Some(KeyPurpose::OcspSigning));
        assert_eq!(seq.get(2).unwrap(), None);
        let first: Vec<_> = seq.clone().collect::<Result<_>>().unwrap();
        let second = seq.to_vec().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_extension_sequence_stops_after_error() {
        // second element is not an OID
        let value = hex!("30 0d 06 08 2b 06 01 05 05 07 03 01 05 01 00");
        let mut seq =
            ExtensionSequence::<KeyPurpose>::open(&ext(oid::EXT_KEY_USAGE, &value), 32).unwrap();
        assert!(seq.next().unwrap().is_ok());
        assert!(seq.next().unwrap().unwrap_err().is_malformed());
        assert!(seq.next().is_none());
    }

    #[test]
    fn test_policies_with_qualifiers() {
        // 2.23.140.1.2.2 without qualifiers, 1.2.3 with CPS "http://x/" and a user notice
        let value = hex!(
            "30 3d"
            "30 08 06 06 67 81 0c 01 02 02"
            "30 31 06 02 2a 03 30 2b"
            "30 15 06 08 2b 06 01 05 05 07 02 01 16 09 68 74 74 70 3a 2f 2f 78 2f"
            "30 12 06 08 2b 06 01 05 05 07 02 02 30 06 0c 04 6e 6f 74 65"
        );
        let policies =
            CertificatePolicies::from_extension(&ext(oid::CERTIFICATE_POLICIES, &value)).unwrap();
        let ids: Vec<String> = policies.policy_ids().map(|o| o.to_string()).collect();
        assert_eq!(ids, vec!["2.23.140.1.2.2", "1.2.3"]);
        assert!(policies.0[0].qualifiers.is_empty());
        assert_eq!(policies.0[1].qualifiers[0], PolicyQualifier::CpsUri("http://x/".to_string()));
        assert_eq!(
            policies.0[1].qualifiers[1],
            PolicyQualifier::UserNotice {
                organization: None,
                notice_numbers: vec![],
                explicit_text: Some("note".to_string()),
            }
        );

        let reversed = CertificatePolicies(policies.0.iter().rev().cloned().collect());
        assert_eq!(policies, reversed);
    }

    #[test]
    fn test_distribution_point_reasons() {
        // fullName URI "http://c", reasons keyCompromise + caCompromise, cRLIssuer dNSName "a.bc"
        let value = hex!(
            "30 1c 30 1a"
            "a0 0c a0 0a 86 08 68 74 74 70 3a 2f 2f 63"
            "81 02 05 60"
            "a2 06 82 04 61 2e 62 63"
        );
        let dps =
            CrlDistributionPoints::from_extension(&ext(oid::CRL_DISTRIBUTION_POINTS, &value))
                .unwrap();
        let dp = &dps.0[0];
        assert_eq!(dp.full_name().and_then(Name::uri).as_deref(), Some("http://c"));
        assert_eq!(dp.reasons, Some(CrlReason::KeyCompromise | CrlReason::CaCompromise));
        assert_eq!(dp.crl_issuer.as_ref().map(Name::len), Some(1));

        // present but empty reasons field
        let value = hex!("30 13 30 11 a0 0c a0 0a 86 08 68 74 74 70 3a 2f 2f 63 81 01 00");
        let dps =
            CrlDistributionPoints::from_extension(&ext(oid::CRL_DISTRIBUTION_POINTS, &value))
                .unwrap();
        assert_eq!(dps.0[0].reasons, None);
        assert!(!dps.0[0].full_name().unwrap().is_empty());
    }

    #[test]
    fn test_access_descriptions() {
        // OCSP http://o
        let value = hex!("30 16 30 14 06 08 2b 06 01 05 05 07 30 01 86 08 68 74 74 70 3a 2f 2f 6f");
        let aia =
            AuthorityInfoAccess::from_extension(&ext(oid::AUTHORITY_INFO_ACCESS, &value)).unwrap();
        assert_eq!(aia.0[0].access_method, oid::AD_OCSP);
        assert_eq!(aia.0[0].access_location.uri().as_deref(), Some("http://o"));
    }

    #[test]
    fn test_trailing_data_is_malformed() {
        let decode = |value: &[u8]| {
            SubjectKeyIdentifier::from_extension(&ext(oid::SUBJECT_KEY_IDENTIFIER, value))
        };
        let err = decode(&hex!("04 01 aa 00")).unwrap_err();
        assert!(err.is_malformed());
        let ski = decode(&hex!("04 01 aa")).unwrap();
        assert_eq!(ski.0, vec![0xaa]);
    }
}
