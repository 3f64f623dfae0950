//! Minimal stateful DER reader.
//!
//! A [`Cursor`] walks tag-length-value triples over a borrowed byte slice.
//! Constructed values are descended into with [`Cursor::enter`], which pushes
//! a length boundary, and left with [`Cursor::exit`], which checks that the
//! whole content was consumed. No read ever crosses the innermost boundary.
//!
//! Offsets reported in [`Tlv`] and in errors are absolute: they count from
//! the start of the outermost buffer (usually the certificate), also for
//! cursors created over a sub-range with [`Cursor::nested`].

use der::asn1::ObjectIdentifier;

use crate::error::{CertReadError, Result};

/// Default limit on the number of nested boundaries.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Universal tag numbers used by X.509.
pub mod tag {
    pub const BOOLEAN: u32 = 1;
    pub const INTEGER: u32 = 2;
    pub const BIT_STRING: u32 = 3;
    pub const OCTET_STRING: u32 = 4;
    pub const NULL: u32 = 5;
    pub const OBJECT_IDENTIFIER: u32 = 6;
    pub const UTF8_STRING: u32 = 12;
    pub const SEQUENCE: u32 = 16;
    pub const SET: u32 = 17;
    pub const NUMERIC_STRING: u32 = 18;
    pub const PRINTABLE_STRING: u32 = 19;
    pub const TELETEX_STRING: u32 = 20;
    pub const IA5_STRING: u32 = 22;
    pub const UTC_TIME: u32 = 23;
    pub const GENERALIZED_TIME: u32 = 24;
    pub const VISIBLE_STRING: u32 = 26;
    pub const UNIVERSAL_STRING: u32 = 28;
    pub const BMP_STRING: u32 = 30;
}

/// The class bits of an identifier octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

/// Header of one DER element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv {
    pub class: TagClass,
    pub constructed: bool,
    pub number: u32,
    /// Absolute offset of the identifier octet.
    pub header_offset: usize,
    /// Absolute offset of the first content octet.
    pub content_offset: usize,
    pub content_len: usize,
}

impl Tlv {
    pub fn is_universal(&self, number: u32) -> bool {
        self.class == TagClass::Universal && self.number == number
    }

    pub fn is_context(&self, number: u32) -> bool {
        self.class == TagClass::ContextSpecific && self.number == number
    }

    /// Absolute offset one past the last content octet.
    pub fn end(&self) -> usize {
        self.content_offset + self.content_len
    }

    pub fn header_len(&self) -> usize {
        self.content_offset - self.header_offset
    }
}

/// Stateful reader over a DER byte slice.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    base: usize,
    pos: usize,
    bounds: Vec<usize>,
    floor: usize,
    max_depth: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor over a complete buffer. Running off its end is
    /// reported as [`CertReadError::UnexpectedEndOfInput`].
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            base: 0,
            pos: 0,
            bounds: Vec::new(),
            floor: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Creates a cursor over a sub-range that starts at absolute offset
    /// `base`. The end of `data` acts as a boundary, so an element that runs
    /// past it is malformed rather than truncated.
    pub fn nested(data: &'a [u8], base: usize) -> Self {
        Self {
            data,
            base,
            pos: 0,
            bounds: vec![data.len()],
            floor: 1,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Absolute offset of the next unread octet.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn limit(&self) -> usize {
        self.bounds.last().copied().unwrap_or(self.data.len())
    }

    /// Number of bytes left before the innermost boundary.
    pub fn remaining(&self) -> usize {
        self.limit().saturating_sub(self.pos)
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.limit()
    }

    pub fn depth(&self) -> usize {
        self.bounds.len() - self.floor
    }

    fn overrun(&self, at: usize, what: &str) -> CertReadError {
        if self.bounds.is_empty() {
            CertReadError::UnexpectedEndOfInput(self.base + at)
        } else {
            CertReadError::malformed(
                self.base + at,
                format!("{what} crosses the enclosing boundary"),
            )
        }
    }

    fn byte_at(&self, at: usize) -> Result<u8> {
        if at >= self.limit() {
            return Err(self.overrun(at, "header"));
        }
        Ok(self.data[at])
    }

    fn decode_header(&self) -> Result<Tlv> {
        let start = self.pos;
        let mut at = start;

        let first = self.byte_at(at)?;
        at += 1;
        let class = match first >> 6 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        };
        let constructed = first & 0x20 != 0;
        let mut number = u32::from(first & 0x1f);
        if number == 0x1f {
            number = 0;
            loop {
                let b = self.byte_at(at)?;
                at += 1;
                if number > (u32::MAX >> 7) {
                    return Err(CertReadError::malformed(self.base + start, "tag number too large"));
                }
                number = (number << 7) | u32::from(b & 0x7f);
                if b & 0x80 == 0 {
                    break;
                }
            }
        }

        let first_len = self.byte_at(at)?;
        at += 1;
        let content_len = if first_len < 0x80 {
            usize::from(first_len)
        } else if first_len == 0x80 {
            return Err(CertReadError::malformed(self.base + start, "indefinite length"));
        } else {
            let count = usize::from(first_len & 0x7f);
            if count > 4 {
                return Err(CertReadError::malformed(self.base + start, "length field too large"));
            }
            let mut len = 0usize;
            for i in 0..count {
                let b = self.byte_at(at)?;
                if i == 0 && b == 0 {
                    return Err(CertReadError::malformed(self.base + start, "non-minimal length"));
                }
                len = (len << 8) | usize::from(b);
                at += 1;
            }
            if len < 0x80 {
                return Err(CertReadError::malformed(self.base + start, "non-minimal length"));
            }
            len
        };

        if content_len > self.limit() - at {
            return Err(self.overrun(at, "value"));
        }

        Ok(Tlv {
            class,
            constructed,
            number,
            header_offset: self.base + start,
            content_offset: self.base + at,
            content_len,
        })
    }

    /// Decodes the next header without consuming it. `None` at the end of
    /// the current boundary.
    pub fn peek_tag(&self) -> Result<Option<Tlv>> {
        if self.at_end() {
            return Ok(None);
        }
        self.decode_header().map(Some)
    }

    /// Reads the header of the next element and leaves the cursor at its
    /// content. Used inside fixed-arity structures, where running out of
    /// elements is an error.
    pub fn read_tag(&mut self) -> Result<Tlv> {
        if self.at_end() {
            return Err(if self.bounds.is_empty() {
                CertReadError::UnexpectedEndOfInput(self.offset())
            } else {
                CertReadError::malformed(self.offset(), "missing element")
            });
        }
        let tlv = self.decode_header()?;
        self.pos = tlv.content_offset - self.base;
        Ok(tlv)
    }

    /// Like [`Cursor::read_tag`] but reports the end of the current boundary
    /// as `None`, for enumeration loops.
    pub fn next_tag(&mut self) -> Result<Option<Tlv>> {
        if self.at_end() {
            return Ok(None);
        }
        self.read_tag().map(Some)
    }

    /// Descends into the content of the constructed element `tlv`, whose
    /// header was just read.
    pub fn enter(&mut self, tlv: &Tlv) -> Result<()> {
        if !tlv.constructed {
            return Err(CertReadError::malformed(tlv.header_offset, "expected a constructed value"));
        }
        if self.offset() != tlv.content_offset {
            return Err(CertReadError::malformed(
                self.offset(),
                "cursor is not at the element content",
            ));
        }
        if self.depth() >= self.max_depth {
            return Err(CertReadError::malformed(tlv.header_offset, "nesting too deep"));
        }
        self.bounds.push(tlv.end() - self.base);
        Ok(())
    }

    /// Leaves the innermost constructed element; all of its content must
    /// have been consumed.
    pub fn exit(&mut self) -> Result<()> {
        if self.bounds.len() <= self.floor {
            return Err(CertReadError::malformed(self.offset(), "no constructed value to leave"));
        }
        if !self.at_end() {
            return Err(CertReadError::malformed(
                self.offset(),
                "trailing data in constructed value",
            ));
        }
        self.bounds.pop();
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(self.overrun(self.pos, "read"));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    /// Reads the content of the element whose header was just read.
    pub fn read_content(&mut self, tlv: &Tlv) -> Result<&'a [u8]> {
        if self.offset() != tlv.content_offset {
            return Err(CertReadError::malformed(
                self.offset(),
                "cursor is not at the element content",
            ));
        }
        self.read_bytes(tlv.content_len)
    }

    /// Reads a whole element: its header and its content.
    pub fn read_element(&mut self) -> Result<(Tlv, &'a [u8])> {
        let tlv = self.read_tag()?;
        let content = self.read_content(&tlv)?;
        Ok((tlv, content))
    }

    /// Reads a whole element and returns its complete encoding, header
    /// included.
    pub fn read_raw_element(&mut self) -> Result<(Tlv, &'a [u8])> {
        let tlv = self.read_tag()?;
        self.skip(tlv.content_len)?;
        let start = tlv.header_offset - self.base;
        Ok((tlv, &self.data[start..start + tlv.header_len() + tlv.content_len]))
    }

    /// Reads the header of the next element and checks its tag.
    pub fn expect(&mut self, class: TagClass, number: u32, constructed: bool) -> Result<Tlv> {
        let tlv = self.read_tag()?;
        if tlv.class != class || tlv.number != number || tlv.constructed != constructed {
            return Err(CertReadError::malformed(
                tlv.header_offset,
                format!(
                    "unexpected tag {:?} {} (expected {:?} {})",
                    tlv.class, tlv.number, class, number
                ),
            ));
        }
        Ok(tlv)
    }

    /// Reads a SEQUENCE header and enters it.
    pub fn enter_sequence(&mut self) -> Result<Tlv> {
        let tlv = self.expect(TagClass::Universal, tag::SEQUENCE, true)?;
        self.enter(&tlv)?;
        Ok(tlv)
    }

    /// Reads the content of a primitive universal element.
    pub fn read_universal(&mut self, number: u32) -> Result<&'a [u8]> {
        let tlv = self.expect(TagClass::Universal, number, false)?;
        self.read_content(&tlv)
    }

    /// Returns a cursor over the content of `tlv`, which must lie in this
    /// cursor's buffer.
    pub fn child(&self, tlv: &Tlv) -> Result<Cursor<'a>> {
        let start = tlv
            .content_offset
            .checked_sub(self.base)
            .filter(|start| start + tlv.content_len <= self.data.len())
            .ok_or_else(|| {
                CertReadError::malformed(tlv.content_offset, "element outside of buffer")
            })?;
        Ok(Cursor::nested(&self.data[start..start + tlv.content_len], tlv.content_offset)
            .with_max_depth(self.max_depth.saturating_sub(self.depth())))
    }

    pub fn read_oid(&mut self) -> Result<ObjectIdentifier> {
        let tlv = self.expect(TagClass::Universal, tag::OBJECT_IDENTIFIER, false)?;
        let content = self.read_content(&tlv)?;
        decode_oid(content, tlv.content_offset)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let tlv = self.expect(TagClass::Universal, tag::BOOLEAN, false)?;
        match self.read_content(&tlv)? {
            [0x00] => Ok(false),
            [0xff] => Ok(true),
            [_] => Err(CertReadError::malformed(tlv.content_offset, "BOOLEAN TRUE must be 0xff")),
            _ => Err(CertReadError::malformed(tlv.content_offset, "BOOLEAN must be one octet")),
        }
    }
}

/// Decodes OBJECT IDENTIFIER content.
///
/// The subidentifiers are checked here and the value is rebuilt from its
/// arcs, so short identifiers such as `1.2.3` (content `2a 03`) decode.
pub fn decode_oid(content: &[u8], offset: usize) -> Result<ObjectIdentifier> {
    let invalid = |reason: &str| {
        CertReadError::malformed(offset, format!("invalid object identifier: {reason}"))
    };

    let mut subidentifiers = Vec::new();
    let mut value = 0u32;
    let mut continued = false;
    for &b in content {
        if !continued && b == 0x80 {
            return Err(invalid("subidentifier with a leading zero octet"));
        }
        if value > (u32::MAX >> 7) {
            return Err(invalid("arc too large"));
        }
        value = (value << 7) | u32::from(b & 0x7f);
        continued = b & 0x80 != 0;
        if !continued {
            subidentifiers.push(value);
            value = 0;
        }
    }
    if continued {
        return Err(invalid("truncated subidentifier"));
    }

    let (&first, rest) = subidentifiers
        .split_first()
        .ok_or_else(|| invalid("empty content"))?;
    let root = match first {
        0..=39 => [0, first],
        40..=79 => [1, first - 40],
        _ => [2, first - 80],
    };
    ObjectIdentifier::from_arcs(root.into_iter().chain(rest.iter().copied()))
        .map_err(|e| invalid(&e.to_string()))
}

/// Decodes a non-negative INTEGER that must fit in a `u32`.
pub fn decode_small_uint(content: &[u8], offset: usize) -> Result<u32> {
    match content.first() {
        None => return Err(CertReadError::malformed(offset, "empty INTEGER")),
        Some(b) if b & 0x80 != 0 => {
            return Err(CertReadError::malformed(offset, "negative INTEGER"));
        }
        _ => {}
    }
    let digits = match content.iter().position(|&b| b != 0) {
        Some(start) => &content[start..],
        None => return Ok(0),
    };
    if digits.len() > 4 {
        return Err(CertReadError::malformed(offset, "INTEGER out of range"));
    }
    Ok(digits.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
}

/// Decodes the content of a BIT STRING into its leading `max_bits` bits,
/// bit 0 being the most significant bit of the first content octet.
pub fn decode_bit_flags(content: &[u8], offset: usize, max_bits: usize) -> Result<u32> {
    let (&unused, bits) = content
        .split_first()
        .ok_or_else(|| CertReadError::malformed(offset, "BIT STRING without unused-bits octet"))?;
    if unused > 7 || (bits.is_empty() && unused != 0) {
        return Err(CertReadError::malformed(offset, "invalid unused-bits count in BIT STRING"));
    }
    let total = bits.len() * 8 - usize::from(unused);
    let mut flags = 0u32;
    for i in 0..total.min(max_bits).min(32) {
        if bits[i / 8] & (0x80 >> (i % 8)) != 0 {
            flags |= 1 << i;
        }
    }
    Ok(flags)
}

/// Returns the payload of a BIT STRING that must not have unused bits.
pub fn bit_string_octets(content: &[u8], offset: usize) -> Result<&[u8]> {
    match content.split_first() {
        Some((0, octets)) => Ok(octets),
        Some(_) => Err(CertReadError::malformed(offset, "BIT STRING with unused bits")),
        None => Err(CertReadError::malformed(offset, "BIT STRING without unused-bits octet")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_walk_sequence() {
        // SEQUENCE { INTEGER 5, NULL, OCTET STRING 'ab' }
        let data = hex!("30 09 02 01 05 05 00 04 02 61 62");
        let mut cursor = Cursor::new(&data);
        let seq = cursor.enter_sequence().unwrap();
        assert_eq!(seq.content_offset, 2);
        assert_eq!(seq.content_len, 9);

        assert_eq!(cursor.read_universal(tag::INTEGER).unwrap(), &[5]);
        let null = cursor.read_tag().unwrap();
        assert!(null.is_universal(tag::NULL));
        assert_eq!(null.content_len, 0);
        assert_eq!(cursor.read_content(&null).unwrap(), &[] as &[u8]);
        let (octets, content) = cursor.read_element().unwrap();
        assert_eq!(octets.content_offset, 9);
        assert_eq!(content, b"ab");

        assert!(cursor.at_end());
        assert_eq!(cursor.next_tag().unwrap(), None);
        cursor.exit().unwrap();
        assert!(cursor.at_end());
    }

    #[test]
    fn test_indefinite_length_rejected() {
        let data = hex!("30 80 02 01 05 00 00");
        let err = Cursor::new(&data).read_tag().unwrap_err();
        assert!(matches!(err, CertReadError::MalformedDer { offset: 0, .. }));
    }

    #[test]
    fn test_truncated_buffer_is_end_of_input() {
        let data = hex!("30 05 02 01");
        let err = Cursor::new(&data).read_tag().unwrap_err();
        assert_eq!(err, CertReadError::UnexpectedEndOfInput(2));

        let err = Cursor::new(&[]).read_tag().unwrap_err();
        assert_eq!(err, CertReadError::UnexpectedEndOfInput(0));
    }

    #[test]
    fn test_overrun_of_inner_boundary_is_malformed() {
        // The INTEGER claims three octets but the SEQUENCE only holds two more.
        let data = hex!("30 04 02 03 01 02 05 00");
        let mut cursor = Cursor::new(&data);
        cursor.enter_sequence().unwrap();
        let err = cursor.read_tag().unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(err, CertReadError::MalformedDer { .. }));
    }

    #[test]
    fn test_nested_cursor_reports_absolute_offsets() {
        let data = hex!("04 03 02 01 07");
        let mut outer = Cursor::new(&data);
        let octets = outer.read_tag().unwrap();
        let mut inner = outer.child(&octets).unwrap();
        let int = inner.read_tag().unwrap();
        assert_eq!(int.header_offset, 2);
        assert_eq!(int.content_offset, 4);
        assert_eq!(inner.read_content(&int).unwrap(), &[7]);
        assert!(inner.at_end());

        // Running past the end of a nested range is structural.
        let mut inner = Cursor::nested(&data[2..4], 2);
        assert!(matches!(inner.read_tag().unwrap_err(), CertReadError::MalformedDer { .. }));
    }

    #[test]
    fn test_exit_requires_consumed_content() {
        let data = hex!("30 03 02 01 05");
        let mut cursor = Cursor::new(&data);
        cursor.enter_sequence().unwrap();
        assert!(cursor.exit().is_err());
        cursor.skip(3).unwrap();
        cursor.exit().unwrap();
        assert!(cursor.exit().is_err());
    }

    #[test]
    fn test_missing_element_inside_structure() {
        let data = hex!("30 00");
        let mut cursor = Cursor::new(&data);
        cursor.enter_sequence().unwrap();
        assert!(matches!(cursor.read_tag().unwrap_err(), CertReadError::MalformedDer { .. }));
        assert_eq!(cursor.next_tag().unwrap(), None);
    }

    #[test]
    fn test_high_tag_number_and_long_length() {
        let mut data = vec![0x9f, 0x81, 0x00, 0x81, 0x80];
        data.extend(std::iter::repeat_n(0xaa, 0x80));
        let mut cursor = Cursor::new(&data);
        let tlv = cursor.read_tag().unwrap();
        assert_eq!(tlv.class, TagClass::ContextSpecific);
        assert_eq!(tlv.number, 128);
        assert_eq!(tlv.content_len, 128);
        assert_eq!(tlv.header_len(), 5);
    }

    #[test]
    fn test_non_minimal_length_rejected() {
        for data in [&hex!("04 81 01 aa")[..], &hex!("04 82 00 81")[..]] {
            let err = Cursor::new(data).read_tag().unwrap_err();
            assert!(matches!(err, CertReadError::MalformedDer { offset: 0, .. }), "{data:02x?}");
        }
    }

    #[test]
    fn test_boolean_encoding() {
        let data = hex!("01 01 ff 01 01 00 01 01 01 01 02 ff ff");
        let mut cursor = Cursor::new(&data);
        assert!(cursor.read_bool().unwrap());
        assert!(!cursor.read_bool().unwrap());
        assert!(matches!(
            cursor.read_bool().unwrap_err(),
            CertReadError::MalformedDer { offset: 8, .. }
        ));
    }

    #[test]
    fn test_depth_limit() {
        let data = hex!("30 04 30 02 30 00");
        let mut cursor = Cursor::new(&data).with_max_depth(2);
        cursor.enter_sequence().unwrap();
        cursor.enter_sequence().unwrap();
        assert!(cursor.enter_sequence().is_err());
    }

    #[test]
    fn test_small_uint() {
        assert_eq!(decode_small_uint(&[0], 0).unwrap(), 0);
        assert_eq!(decode_small_uint(&[0x00, 0xff], 0).unwrap(), 255);
        assert!(decode_small_uint(&[0xff], 0).is_err());
        assert!(decode_small_uint(&[], 0).is_err());
        assert!(decode_small_uint(&[1, 0, 0, 0, 0], 0).is_err());
    }

    #[test]
    fn test_bit_flags() {
        // digitalSignature and keyEncipherment
        assert_eq!(decode_bit_flags(&[0x05, 0xa0], 0, 9).unwrap(), 0b101);
        // decipherOnly lives in the second octet
        assert_eq!(decode_bit_flags(&[0x07, 0x00, 0x80], 0, 9).unwrap(), 1 << 8);
        assert_eq!(decode_bit_flags(&[0x00], 0, 9).unwrap(), 0);
        assert!(decode_bit_flags(&[], 0, 9).is_err());
        assert!(decode_bit_flags(&[0x08, 0x00], 0, 9).is_err());
        assert!(decode_bit_flags(&[0x01], 0, 9).is_err());
    }

    #[test]
    fn test_read_oid() {
        let data = hex!("06 03 55 1d 0f");
        let oid = Cursor::new(&data).read_oid().unwrap();
        assert_eq!(oid.to_string(), "2.5.29.15");

        // three arcs in two content octets
        let data = hex!("06 02 2a 03");
        let oid = Cursor::new(&data).read_oid().unwrap();
        assert_eq!(oid.to_string(), "1.2.3");
        assert_eq!(oid.as_bytes(), &[0x2a, 0x03]);

        let oid = decode_oid(&hex!("2a 86 48 86 f7 0d"), 0).unwrap();
        assert_eq!(oid.to_string(), "1.2.840.113549");
    }

    #[test]
    fn test_invalid_oid_encodings() {
        let cases: [&[u8]; 4] = [b"", &hex!("2a 83"), &hex!("2a 80 01"), &hex!("80 2a")];
        for content in cases {
            let err = decode_oid(content, 7).unwrap_err();
            assert!(matches!(err, CertReadError::MalformedDer { offset: 7, .. }), "{content:02x?}");
        }
    }
}
