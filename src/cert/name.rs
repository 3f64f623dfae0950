//! Distinguished Name and GeneralName decoding.
//!
//! Names are decoded on demand from the certificate buffer. A
//! [`DistinguishedName`] keeps its RDNs in encoded order and renders them in
//! RFC 2253 form; a [`Name`] is the `GeneralNames` list found in alternative
//! name, key identifier, distribution point and access description fields.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use const_oid::ObjectIdentifier;

use crate::cursor::{Cursor, TagClass, Tlv, decode_oid, tag};
use crate::error::{CertReadError, Result};

pub const CN: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
pub const SURNAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.4");
pub const SERIAL_NUMBER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.5");
pub const COUNTRY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
pub const LOCALITY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
pub const STATE_OR_PROVINCE_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
pub const STREET_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.9");
pub const ORGANIZATION_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
pub const ORGANIZATIONAL_UNIT_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
pub const TITLE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.12");
pub const GIVEN_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.42");
pub const INITIALS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.43");
pub const USER_ID: ObjectIdentifier = ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.1");
pub const DOMAIN_COMPONENT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.25");
pub const EMAIL_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

/// Short attribute names used in string renderings. Types not listed here are
/// rendered as a dotted OID with a hex-encoded value.
const SHORT_NAMES: &[(ObjectIdentifier, &str)] = &[
    (CN, "CN"),
    (SURNAME, "SN"),
    (SERIAL_NUMBER, "SERIALNUMBER"),
    (COUNTRY_NAME, "C"),
    (LOCALITY_NAME, "L"),
    (STATE_OR_PROVINCE_NAME, "ST"),
    (STREET_ADDRESS, "STREET"),
    (ORGANIZATION_NAME, "O"),
    (ORGANIZATIONAL_UNIT_NAME, "OU"),
    (TITLE, "T"),
    (GIVEN_NAME, "GN"),
    (INITIALS, "initials"),
    (USER_ID, "UID"),
    (DOMAIN_COMPONENT, "DC"),
    (EMAIL_ADDRESS, "EMAIL"),
];

fn short_name(oid: &ObjectIdentifier) -> Option<&'static str> {
    SHORT_NAMES
        .iter()
        .find_map(|(known, name)| (known == oid).then_some(*name))
}

/// The value of one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// One of the directory string types, converted to UTF-8.
    Text { tag: u32, text: String },
    /// Any other value, kept as its complete DER encoding.
    Raw(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTypeAndValue {
    pub oid: ObjectIdentifier,
    pub value: AttributeValue,
    /// Complete DER encoding of the value element.
    pub der: Vec<u8>,
}

impl AttributeTypeAndValue {
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            AttributeValue::Text { text, .. } => Some(text),
            AttributeValue::Raw(_) => None,
        }
    }

    fn write_rfc2253(&self, out: &mut String) {
        match (short_name(&self.oid), &self.value) {
            (Some(name), AttributeValue::Text { text, .. }) => {
                out.push_str(name);
                out.push('=');
                escape_rfc2253(text, out);
            }
            (Some(name), AttributeValue::Raw(_)) => {
                out.push_str(name);
                out.push_str("=#");
                out.push_str(&hex::encode_upper(&self.der));
            }
            (None, _) => {
                out.push_str(&self.oid.to_string());
                out.push_str("=#");
                out.push_str(&hex::encode_upper(&self.der));
            }
        }
    }
}

/// One RDN. Attributes keep their encoded order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeDistinguishedName(pub Vec<AttributeTypeAndValue>);

impl RelativeDistinguishedName {
    /// Decodes the attributes of a SET (or an IMPLICIT-tagged SET) whose
    /// header was just read. An RDN must hold at least one attribute.
    pub(crate) fn decode_tagged(cursor: &mut Cursor<'_>, set: &Tlv) -> Result<Self> {
        cursor.enter(set)?;
        let mut attributes = Vec::new();
        while let Some(seq) = cursor.next_tag()? {
            if !seq.is_universal(tag::SEQUENCE) || !seq.constructed {
                return Err(CertReadError::malformed(
                    seq.header_offset,
                    "attribute is not a SEQUENCE",
                ));
            }
            cursor.enter(&seq)?;
            let oid = cursor.read_oid()?;
            let (value_tlv, der) = cursor.read_raw_element()?;
            let content = &der[value_tlv.header_len()..];
            cursor.exit()?;
            let value = match decode_string(&value_tlv, content)? {
                Some(text) => AttributeValue::Text {
                    tag: value_tlv.number,
                    text,
                },
                None => AttributeValue::Raw(der.to_vec()),
            };
            attributes.push(AttributeTypeAndValue {
                oid,
                value,
                der: der.to_vec(),
            });
        }
        if attributes.is_empty() {
            return Err(CertReadError::malformed(set.header_offset, "empty RDN"));
        }
        cursor.exit()?;
        Ok(Self(attributes))
    }
}

/// An X.501 Name, a sequence of RDNs in encoded order. A name without RDNs is
/// valid and renders as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinguishedName(pub Vec<RelativeDistinguishedName>);

impl DistinguishedName {
    /// Decodes a `Name` element at the cursor position.
    pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.enter_sequence()?;
        let mut rdns = Vec::new();
        while let Some(set) = cursor.next_tag()? {
            if !set.is_universal(tag::SET) || !set.constructed {
                return Err(CertReadError::malformed(set.header_offset, "RDN is not a SET"));
            }
            rdns.push(RelativeDistinguishedName::decode_tagged(cursor, &set)?);
        }
        cursor.exit()?;
        Ok(Self(rdns))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all attributes in encoded order.
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeTypeAndValue> {
        self.0.iter().flat_map(|rdn| rdn.0.iter())
    }

    /// Returns the text of the first attribute of type `oid`.
    pub fn find(&self, oid: &ObjectIdentifier) -> Option<&str> {
        self.attributes()
            .find(|attr| &attr.oid == oid)
            .and_then(|attr| attr.as_text())
    }

    pub fn common_name(&self) -> Option<&str> {
        self.find(&CN)
    }

    /// Renders the name as described in RFC 2253: RDNs last to first,
    /// multi-valued RDNs joined with `+`.
    pub fn to_rfc2253(&self) -> String {
        let mut out = String::new();
        for (i, rdn) in self.0.iter().rev().enumerate() {
            if i > 0 {
                out.push(',');
            }
            for (j, attr) in rdn.0.iter().enumerate() {
                if j > 0 {
                    out.push('+');
                }
                attr.write_rfc2253(&mut out);
            }
        }
        out
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc2253())
    }
}

/// Converts the content of a universal string element to UTF-8. Returns
/// `None` for elements that are not one of the string types.
pub(crate) fn decode_string(tlv: &Tlv, content: &[u8]) -> Result<Option<String>> {
    if tlv.class != TagClass::Universal || tlv.constructed {
        return Ok(None);
    }
    let text = match tlv.number {
        tag::UTF8_STRING => std::str::from_utf8(content)
            .map(str::to_owned)
            .map_err(|_| CertReadError::malformed(tlv.content_offset, "invalid UTF8String"))?,
        tag::PRINTABLE_STRING
        | tag::IA5_STRING
        | tag::NUMERIC_STRING
        | tag::VISIBLE_STRING => ascii_or_latin1(content),
        tag::TELETEX_STRING => latin1(content),
        tag::BMP_STRING => {
            if content.len() % 2 != 0 {
                return Err(CertReadError::malformed(tlv.content_offset, "odd BMPString length"));
            }
            let units: Vec<u16> = content
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16(&units)
                .map_err(|_| CertReadError::malformed(tlv.content_offset, "invalid BMPString"))?
        }
        tag::UNIVERSAL_STRING => {
            if content.len() % 4 != 0 {
                return Err(CertReadError::malformed(
                    tlv.content_offset,
                    "UniversalString length not a multiple of four",
                ));
            }
            content
                .chunks_exact(4)
                .map(|c| char::from_u32(u32::from_be_bytes([c[0], c[1], c[2], c[3]])))
                .collect::<Option<String>>()
                .ok_or_else(|| {
                    CertReadError::malformed(tlv.content_offset, "invalid UniversalString")
                })?
        }
        _ => return Ok(None),
    };
    Ok(Some(text))
}

fn latin1(content: &[u8]) -> String {
    content.iter().map(|&b| char::from(b)).collect()
}

fn ascii_or_latin1(content: &[u8]) -> String {
    match std::str::from_utf8(content) {
        Ok(s) => s.to_owned(),
        Err(_) => latin1(content),
    }
}

fn escape_rfc2253(value: &str, out: &mut String) {
    let last = value.chars().count().saturating_sub(1);
    for (i, c) in value.chars().enumerate() {
        match c {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' => {
                out.push('\\');
                out.push(c);
            }
            '#' if i == 0 => out.push_str("\\#"),
            ' ' if i == 0 || i == last => out.push_str("\\ "),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\{:02X}", c as u32));
            }
            c => out.push(c),
        }
    }
}

/// One entry of a `GeneralNames` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneralName {
    Rfc822Name(String),
    DnsName(String),
    DirectoryName(DistinguishedName),
    UniformResourceIdentifier(String),
    IpAddress(Vec<u8>),
    RegisteredId(ObjectIdentifier),
    /// otherName, x400Address, ediPartyName or an unknown tag; `raw` is the
    /// element content.
    Other { tag: u32, raw: Vec<u8> },
}

impl GeneralName {
    /// Decodes one context-tagged GeneralName element at the cursor.
    pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        let tlv = cursor.read_tag()?;
        if tlv.class != TagClass::ContextSpecific {
            return Err(CertReadError::malformed(
                tlv.header_offset,
                "GeneralName must be context tagged",
            ));
        }
        let string_like = matches!(tlv.number, 1 | 2 | 6 | 7 | 8);
        if string_like && tlv.constructed {
            return Err(CertReadError::malformed(
                tlv.header_offset,
                format!("constructed encoding of GeneralName [{}]", tlv.number),
            ));
        }
        match tlv.number {
            1 | 2 | 6 => {
                let content = cursor.read_content(&tlv)?;
                let text = std::str::from_utf8(content)
                    .map_err(|_| CertReadError::malformed(tlv.content_offset, "invalid IA5String"))?
                    .to_owned();
                Ok(match tlv.number {
                    1 => GeneralName::Rfc822Name(text),
                    2 => GeneralName::DnsName(text),
                    _ => GeneralName::UniformResourceIdentifier(text),
                })
            }
            4 if tlv.constructed => {
                cursor.enter(&tlv)?;
                let dn = DistinguishedName::decode(cursor)?;
                cursor.exit()?;
                Ok(GeneralName::DirectoryName(dn))
            }
            7 => Ok(GeneralName::IpAddress(cursor.read_content(&tlv)?.to_vec())),
            8 => {
                let content = cursor.read_content(&tlv)?;
                Ok(GeneralName::RegisteredId(decode_oid(content, tlv.content_offset)?))
            }
            number => Ok(GeneralName::Other {
                tag: number,
                raw: cursor.read_content(&tlv)?.to_vec(),
            }),
        }
    }

    /// A URI for this name, where one can be formed.
    pub fn uri(&self) -> Option<String> {
        match self {
            GeneralName::UniformResourceIdentifier(uri) => Some(uri.clone()),
            GeneralName::Rfc822Name(mail) => Some(format!("mailto:{mail}")),
            _ => None,
        }
    }

    /// The alias form used when listing a certificate's alternative names:
    /// `<addr>` for mail addresses and canonical S-expressions for DNS names
    /// and URIs. Other variants have no alias form.
    pub fn alias_string(&self) -> Option<String> {
        match self {
            GeneralName::Rfc822Name(mail) => Some(format!("<{mail}>")),
            GeneralName::DnsName(dns) => Some(format!("(8:dns-name{}:{dns})", dns.len())),
            GeneralName::UniformResourceIdentifier(uri) => {
                Some(format!("(3:uri{}:{uri})", uri.len()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for GeneralName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneralName::Rfc822Name(mail) => write!(f, "email:{mail}"),
            GeneralName::DnsName(dns) => write!(f, "DNS:{dns}"),
            GeneralName::DirectoryName(dn) => write!(f, "DirName:{dn}"),
            GeneralName::UniformResourceIdentifier(uri) => write!(f, "URI:{uri}"),
            GeneralName::IpAddress(ip) => match ip.len() {
                4 => write!(f, "IP:{}", Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3])),
                16 => {
                    let mut octets = [0u8; 16];
                    octets.copy_from_slice(ip);
                    write!(f, "IP:{}", Ipv6Addr::from(octets))
                }
                _ => write!(f, "IP:{}", hex::encode(ip)),
            },
            GeneralName::RegisteredId(oid) => write!(f, "RID:{oid}"),
            GeneralName::Other { tag, raw } => write!(f, "othername[{tag}]:{}", hex::encode(raw)),
        }
    }
}

/// An ordered `GeneralNames` list. An empty list is a valid value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Name(Vec<GeneralName>);

impl Name {
    /// Decodes GeneralName elements until the end of the current boundary.
    pub fn decode_entries(cursor: &mut Cursor<'_>) -> Result<Self> {
        let mut names = Vec::new();
        while !cursor.at_end() {
            names.push(GeneralName::decode(cursor)?);
        }
        Ok(Self(names))
    }

    /// Decodes a `GeneralNames` SEQUENCE at the cursor.
    pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.enter_sequence()?;
        let names = Self::decode_entries(cursor)?;
        cursor.exit()?;
        Ok(names)
    }

    /// Decodes an IMPLICIT-tagged `GeneralNames` whose header was just read.
    pub(crate) fn decode_tagged(cursor: &mut Cursor<'_>, tlv: &Tlv) -> Result<Self> {
        cursor.enter(tlv)?;
        let names = Self::decode_entries(cursor)?;
        cursor.exit()?;
        Ok(names)
    }

    /// Returns the entry at `idx`, or `None` past the end of the list.
    pub fn get(&self, idx: usize) -> Option<&GeneralName> {
        self.0.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeneralName> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First entry that has a URI form.
    pub fn uri(&self) -> Option<String> {
        self.0.iter().find_map(GeneralName::uri)
    }

    pub fn into_vec(self) -> Vec<GeneralName> {
        self.0
    }
}

impl From<Vec<GeneralName>> for Name {
    fn from(names: Vec<GeneralName>) -> Self {
        Self(names)
    }
}

impl<'a> IntoIterator for &'a Name {
    type Item = &'a GeneralName;
    type IntoIter = std::slice::Iter<'a, GeneralName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // SEQUENCE { SET { C=DE } SET { O=Example Org } SET { OU=Testing + CN=Example Root CA } }
    const CA_NAME: [u8; 79] = hex!(
        "30 4d"
        "31 0b 30 09 06 03 55 04 06 13 02 44 45"
        "31 14 30 12 06 03 55 04 0a 0c 0b 45 78 61 6d 70 6c 65 20 4f 72 67"
        "31 28"
        "30 0e 06 03 55 04 0b 0c 07 54 65 73 74 69 6e 67"
        "30 16 06 03 55 04 03 0c 0f 45 78 61 6d 70 6c 65 20 52 6f 6f 74 20 43 41"
    );

    #[test]
    fn test_rfc2253_multi_valued_rdn() {
        let dn = DistinguishedName::decode(&mut Cursor::new(&CA_NAME)).unwrap();
        assert_eq!(dn.0.len(), 3);
        assert_eq!(dn.to_rfc2253(), "OU=Testing+CN=Example Root CA,O=Example Org,C=DE");
        assert_eq!(dn.common_name(), Some("Example Root CA"));
        assert_eq!(dn.find(&COUNTRY_NAME), Some("DE"));
    }

    #[test]
    fn test_empty_name_is_valid() {
        let dn = DistinguishedName::decode(&mut Cursor::new(&hex!("30 00"))).unwrap();
        assert!(dn.is_empty());
        assert_eq!(dn.to_rfc2253(), "");
    }

    #[test]
    fn test_empty_rdn_is_malformed() {
        let err = DistinguishedName::decode(&mut Cursor::new(&hex!("30 02 31 00"))).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_escaping_and_string_types() {
        // CN="a,b" as UTF8String, O=BMPString "Zü", 1.2.3.4=PrintableString "x"
        let der = hex!(
            "30 2a"
            "31 0c 30 0a 06 03 55 04 03 0c 03 61 2c 62"
            "31 0d 30 0b 06 03 55 04 0a 1e 04 00 5a 00 fc"
            "31 0b 30 09 06 03 2a 03 04 13 02 20 78"
        );
        let dn = DistinguishedName::decode(&mut Cursor::new(&der)).unwrap();
        assert_eq!(dn.find(&ORGANIZATION_NAME), Some("Zü"));
        assert_eq!(dn.to_rfc2253(), "1.2.3.4=#13022078,O=Zü,CN=a\\,b");

        let mut out = String::new();
        escape_rfc2253("#lead trail ", &mut out);
        assert_eq!(out, "\\#lead trail\\ ");
    }

    #[test]
    fn test_general_names() {
        // dNSName, rfc822Name, URI, iPAddress, registeredID
        let der = hex!(
            "30 24"
            "82 04 61 2e 62 63"
            "81 07 61 40 62 2e 74 65 73"
            "86 08 68 74 74 70 3a 2f 2f 78"
            "87 04 c0 00 02 07"
            "88 03 2a 03 04"
        );
        let names = Name::decode(&mut Cursor::new(&der)).unwrap();
        assert_eq!(names.len(), 5);
        assert_eq!(names.get(0), Some(&GeneralName::DnsName("a.bc".to_string())));
        assert_eq!(names.get(0).unwrap().alias_string().unwrap(), "(8:dns-name4:a.bc)");
        assert_eq!(names.get(1).unwrap().alias_string().unwrap(), "<a@b.tes>");
        assert_eq!(names.get(2).unwrap().alias_string().unwrap(), "(3:uri8:http://x)");
        assert_eq!(names.get(3).unwrap().to_string(), "IP:192.0.2.7");
        assert_eq!(names.get(4).unwrap().to_string(), "RID:1.2.3.4");
        assert_eq!(names.get(4).unwrap().alias_string(), None);
        assert_eq!(names.get(5), None);
        assert_eq!(names.uri().as_deref(), Some("mailto:a@b.tes"));
    }

    #[test]
    fn test_directory_name() {
        let mut der = vec![0xa4, CA_NAME.len() as u8];
        der.extend_from_slice(&CA_NAME);
        let name = GeneralName::decode(&mut Cursor::new(&der)).unwrap();
        match name {
            GeneralName::DirectoryName(dn) => assert_eq!(dn.common_name(), Some("Example Root CA")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_universal_tag_is_not_a_general_name() {
        let err = GeneralName::decode(&mut Cursor::new(&hex!("16 01 61"))).unwrap_err();
        assert!(err.is_malformed());
    }
}
