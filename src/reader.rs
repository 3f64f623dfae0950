//! Forward-only reader for a stream of concatenated DER certificates.
//!
//! The reader pulls one certificate at a time from any [`std::io::Read`]
//! source. Each certificate is buffered on its own; the outer length field
//! is checked against [`DecodeOptions::max_certificate_len`] before that
//! buffer is allocated.
//!
//! # Example
//! ```no_run
//! use certread::reader::CertReader;
//!
//! # fn main() -> Result<(), certread::error::CertReadError> {
//! let file = std::fs::File::open("chain.der")?;
//! for cert in CertReader::new(file) {
//!     let cert = cert?;
//!     println!("{}", cert.subject(0)?.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

use std::io::{ErrorKind, Read};

use crate::cert::Certificate;
use crate::cert::params::DecodeOptions;
use crate::error::{CertReadError, Result};

const SEQUENCE: u8 = 0x30;

pub struct CertReader<R> {
    source: R,
    options: DecodeOptions,
    offset: usize,
    count: usize,
    failed: bool,
}

impl<R: Read> CertReader<R> {
    pub fn new(source: R) -> Self {
        Self::with_options(source, DecodeOptions::default())
    }

    pub fn with_options(source: R, options: DecodeOptions) -> Self {
        Self {
            source,
            options,
            offset: 0,
            count: 0,
            failed: false,
        }
    }

    /// Number of certificates read so far.
    pub fn certificates_read(&self) -> usize {
        self.count
    }

    /// Stream offset of the next certificate.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    /// Reads the next certificate. `Ok(None)` when the stream ends cleanly
    /// before the first octet of a certificate; a stream that ends inside a
    /// certificate is [`CertReadError::UnexpectedEndOfInput`].
    pub fn read_certificate(&mut self) -> Result<Option<Certificate>> {
        let start = self.offset;
        let mut header = vec![0u8; 2];
        match self.fill(&mut header[..1])? {
            0 => {
                tracing::debug!(certificates = self.count, "end of certificate stream");
                return Ok(None);
            }
            _ => self.fill_exact(&mut header[1..])?,
        }
        if header[0] != SEQUENCE {
            return Err(CertReadError::malformed(start, "certificate is not a SEQUENCE"));
        }

        let content_len = match header[1] {
            len @ 0..=0x7f => usize::from(len),
            0x80 => return Err(CertReadError::malformed(start, "indefinite length")),
            first => {
                let count = usize::from(first & 0x7f);
                if count > 4 {
                    return Err(CertReadError::malformed(start, "length field too large"));
                }
                let mut octets = [0u8; 4];
                self.fill_exact(&mut octets[..count])?;
                header.extend_from_slice(&octets[..count]);
                let len = octets[..count]
                    .iter()
                    .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
                if octets[0] == 0 || len < 0x80 {
                    return Err(CertReadError::malformed(start, "non-minimal length encoding"));
                }
                len
            }
        };

        let limit = self.options.max_certificate_len;
        let total = match header.len().checked_add(content_len) {
            Some(total) if total <= limit => total,
            total => {
                return Err(CertReadError::InputTooLarge {
                    len: total.unwrap_or(usize::MAX),
                    limit,
                });
            }
        };

        let mut der = header;
        let header_len = der.len();
        der.resize(total, 0);
        self.fill_exact(&mut der[header_len..])?;

        let cert = Certificate::parse(der, self.options)?;
        tracing::debug!(
            index = self.count,
            offset = start,
            len = total,
            "read certificate from stream"
        );
        self.count += 1;
        Ok(Some(cert))
    }

    /// Reads until `buf` is full or the source is exhausted.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.source.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    self.offset += n;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(filled)
    }

    fn fill_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.fill(buf)? < buf.len() {
            return Err(CertReadError::UnexpectedEndOfInput(self.offset));
        }
        Ok(())
    }
}

impl<R: Read> Iterator for CertReader<R> {
    type Item = Result<Certificate>;

    /// Yields certificates until the stream ends. After an error the
    /// iterator stops, since the stream position is no longer at a
    /// certificate boundary.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.read_certificate().transpose();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}
