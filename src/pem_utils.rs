use crate::cert::Certificate;
use crate::error::{CertReadError, Result};

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new())
}

/// Convert the first block of a PEM‑encoded string to DER‑encoded bytes.
pub fn pem_to_der(pem_str: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str)?;
    Ok(pem.contents().to_vec())
}

/// Decode the `CERTIFICATE` block of a PEM‑encoded string.
pub fn certificate_der_from_pem(pem_str: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str)?;
    if pem.tag() != CERTIFICATE_LABEL {
        return Err(CertReadError::PemError(format!(
            "expected a {CERTIFICATE_LABEL} block, found {}",
            pem.tag()
        )));
    }
    Ok(pem.contents().to_vec())
}

/// Parse every `CERTIFICATE` block of a PEM bundle, in order. Blocks with
/// other labels are skipped.
pub fn certificates_from_pem(pem_str: &str) -> Result<Vec<Certificate>> {
    pem::parse_many(pem_str)?
        .iter()
        .filter(|block| block.tag() == CERTIFICATE_LABEL)
        .map(|block| Certificate::from_der(block.contents()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pem_round_trip() {
        let der = [0x30, 0x03, 0x02, 0x01, 0x05];
        let pem = der_to_pem(&der, CERTIFICATE_LABEL);
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
        assert_eq!(pem_to_der(&pem).unwrap(), der);
        assert_eq!(certificate_der_from_pem(&pem).unwrap(), der);
    }

    #[test]
    fn test_wrong_label() {
        let pem = der_to_pem(&[0x05, 0x00], "PUBLIC KEY");
        assert!(matches!(
            certificate_der_from_pem(&pem).unwrap_err(),
            CertReadError::PemError(_)
        ));
        assert!(certificates_from_pem(&pem).unwrap().is_empty());
    }

    #[test]
    fn test_not_pem() {
        assert!(matches!(pem_to_der("not pem").unwrap_err(), CertReadError::PemError(_)));
    }
}
