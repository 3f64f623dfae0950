use std::fmt;

use bon::Builder;
use const_oid::ObjectIdentifier;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

use crate::cursor::{Cursor, DEFAULT_MAX_DEPTH, TagClass, tag};
use crate::error::{CertReadError, Result};

/// Default upper bound for the size of one certificate.
pub const DEFAULT_MAX_CERTIFICATE_LEN: usize = 256 * 1024;

/// Limits applied while decoding.
///
/// # Fields
/// * `max_certificate_len` - Largest accepted certificate, header included.
///   Checked against the outer length field before any buffer is allocated.
/// * `max_depth` - Deepest accepted nesting of constructed values.
///
/// # Example
/// ```
/// use certread::cert::params::DecodeOptions;
/// let options = DecodeOptions::builder().max_certificate_len(16 * 1024).build();
/// assert_eq!(options.max_depth, 32);
/// ```
#[derive(Clone, Copy, Debug, Builder, PartialEq, Eq)]
pub struct DecodeOptions {
    #[builder(default = DEFAULT_MAX_CERTIFICATE_LEN)]
    pub max_certificate_len: usize,
    #[builder(default = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions::builder().build()
    }
}

/// A UTC timestamp with second precision.
///
/// Displays as `YYYYMMDDTHHMMSS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoTime(PrimitiveDateTime);

impl IsoTime {
    /// Decodes a UTCTime or GeneralizedTime element at the cursor.
    pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        let tlv = cursor.read_tag()?;
        if tlv.class != TagClass::Universal || tlv.constructed {
            return Err(CertReadError::malformed(tlv.header_offset, "expected a time value"));
        }
        let content = cursor.read_content(&tlv)?;
        let malformed = |reason: &str| CertReadError::malformed(tlv.content_offset, reason);

        let (year, rest) = match tlv.number {
            tag::UTC_TIME => {
                if content.len() != 13 {
                    return Err(malformed("UTCTime must be YYMMDDHHMMSSZ"));
                }
                let yy = digits(&content[..2]).ok_or_else(|| malformed("invalid UTCTime"))?;
                let year = if yy >= 50 { 1900 + yy } else { 2000 + yy };
                (year, &content[2..])
            }
            tag::GENERALIZED_TIME => {
                if content.len() != 15 {
                    return Err(malformed("GeneralizedTime must be YYYYMMDDHHMMSSZ"));
                }
                let year =
                    digits(&content[..4]).ok_or_else(|| malformed("invalid GeneralizedTime"))?;
                (year, &content[4..])
            }
            _ => return Err(malformed("expected UTCTime or GeneralizedTime")),
        };
        if rest[10] != b'Z' {
            return Err(malformed("time must be expressed in UTC"));
        }
        let field =
            |i: usize| digits(&rest[i..i + 2]).ok_or_else(|| malformed("invalid time digits"));
        let (month, day) = (field(0)?, field(2)?);
        let (hour, minute, second) = (field(4)?, field(6)?, field(8)?);

        let month = Month::try_from(month as u8).map_err(|_| malformed("month out of range"))?;
        let date = Date::from_calendar_date(year as i32, month, day as u8)
            .map_err(|_| malformed("day out of range"))?;
        let time = Time::from_hms(hour as u8, minute as u8, second as u8)
            .map_err(|_| malformed("time of day out of range"))?;
        Ok(Self(PrimitiveDateTime::new(date, time)))
    }

    pub fn to_offset_date_time(&self) -> OffsetDateTime {
        self.0.assume_utc()
    }
}

fn digits(bytes: &[u8]) -> Option<u32> {
    bytes.iter().try_fold(0u32, |acc, &b| {
        b.is_ascii_digit().then(|| acc * 10 + u32::from(b - b'0'))
    })
}

impl fmt::Display for IsoTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (date, time) = (self.0.date(), self.0.time());
        write!(
            f,
            "{:04}{:02}{:02}T{:02}{:02}{:02}",
            date.year(),
            u8::from(date.month()),
            date.day(),
            time.hour(),
            time.minute(),
            time.second()
        )
    }
}

/// Certificate validity period.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: IsoTime,
    pub not_after: IsoTime,
}

impl Validity {
    pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.enter_sequence()?;
        let not_before = IsoTime::decode(cursor)?;
        let not_after = IsoTime::decode(cursor)?;
        cursor.exit()?;
        Ok(Self {
            not_before,
            not_after,
        })
    }
}

/// A certificate serial number, kept as the verbatim content octets of the
/// INTEGER (two's complement, minimal encoding as found in the certificate).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Serial(Vec<u8>);

impl Serial {
    pub fn new(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(CertReadError::malformed(0, "empty serial number"));
        }
        Ok(Self(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0[0] & 0x80 != 0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// The value as an unsigned integer, if it is non-negative and fits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.is_negative() {
            return None;
        }
        let start = self.0.iter().position(|&b| b != 0).unwrap_or(self.0.len());
        let magnitude = &self.0[start..];
        if magnitude.len() > 8 {
            return None;
        }
        Some(magnitude.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }

    /// Canonical length-prefixed form, `(<len>:<octets>)`.
    pub fn to_canon_sexp(&self) -> Vec<u8> {
        let mut out = format!("({}:", self.0.len()).into_bytes();
        out.extend_from_slice(&self.0);
        out.push(b')');
        out
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(&self.0))
    }
}

/// One entry of a certificate's extension table.
///
/// `offset` and `length` locate the extension value (the content of the
/// `extnValue` OCTET STRING) in the certificate's DER image, and `value`
/// borrows those bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extension<'a> {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    pub offset: usize,
    pub length: usize,
    pub value: &'a [u8],
}

impl fmt::Display for Extension<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.oid)?;
        if let Some(name) = crate::oid::describe(&self.oid) {
            write!(f, " ({name})")?;
        }
        write!(
            f,
            "{} at {} len {}",
            if self.critical { " critical" } else { "" },
            self.offset,
            self.length
        )
    }
}
