mod util;

use certread::cert::Certificate;
use certread::keyinfo::{der_to_sexp, sexp_to_der};
use openssl::nid::Nid;
use openssl::x509::X509;

const FIXTURES: [&str; 8] = [
    "ca.der",
    "rsa.der",
    "p384-v1.der",
    "ed25519.der",
    "ed448.der",
    "dsa.der",
    "zero.der",
    "emptyreasons.der",
];

fn common_name(name: &openssl::x509::X509NameRef) -> Option<String> {
    name.entries_by_nid(Nid::COMMONNAME)
        .next()
        .map(|entry| entry.data().to_string().unwrap())
}

#[test]
fn test_openssl_crate_matches_decoded_fields() {
    for fixture in FIXTURES {
        let der = util::load(fixture);
        let cert = Certificate::from_der(&der).unwrap();
        let x509 = X509::from_der(&der).expect("Failed to parse DER");

        // Check serial number
        let serial = x509.serial_number().to_bn().unwrap().to_vec();
        assert_eq!(
            cert.serial().to_u64(),
            Some(serial.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))),
            "{fixture}: serial number mismatch"
        );

        // Check version
        assert_eq!(x509.version() as u32, cert.version(), "{fixture}: version mismatch");

        // Check subject and issuer common names
        assert_eq!(
            common_name(x509.subject_name()).as_deref(),
            cert.subject_dn().unwrap().common_name(),
            "{fixture}: subject CN mismatch"
        );
        assert_eq!(
            common_name(x509.issuer_name()).as_deref(),
            cert.issuer_dn().unwrap().common_name(),
            "{fixture}: issuer CN mismatch"
        );

        // Check the public key bytes
        let spki = x509.public_key().unwrap().public_key_to_der().unwrap();
        assert_eq!(spki, cert.public_key_der(), "{fixture}: public key mismatch");

        // Check the signature
        assert_eq!(
            x509.signature().as_slice(),
            cert.signature_value(),
            "{fixture}: signature mismatch"
        );

        // Check the signature algorithm
        assert_eq!(
            x509.signature_algorithm().object().to_string(),
            x509_sig_name(&cert),
            "{fixture}: signature algorithm mismatch"
        );
    }
}

fn x509_sig_name(cert: &Certificate) -> String {
    let oid = cert.signature_algorithm().oid;
    openssl::asn1::Asn1Object::from_str(&oid.to_string())
        .unwrap()
        .to_string()
}

#[test]
fn test_openssl_crate_accepts_encoded_keys() {
    for fixture in FIXTURES {
        let cert = util::load_cert(fixture);
        let sexp = der_to_sexp(cert.public_key_der()).unwrap();
        let der = sexp_to_der(&sexp).unwrap();

        // Use the openssl crate to parse the re-encoded key
        let key = openssl::pkey::PKey::public_key_from_der(&der).expect("Failed to parse SPKI");
        assert_eq!(key.public_key_to_der().unwrap(), der, "{fixture}: SPKI mismatch");
    }
}

#[test]
fn test_openssl_crate_dates() {
    let der = util::load("rsa.der");
    let cert = Certificate::from_der(&der).unwrap();
    let x509 = X509::from_der(&der).unwrap();

    let not_before = openssl::asn1::Asn1Time::from_unix(
        cert.validity().not_before.to_offset_date_time().unix_timestamp(),
    )
    .unwrap();
    let not_after = openssl::asn1::Asn1Time::from_unix(
        cert.validity().not_after.to_offset_date_time().unix_timestamp(),
    )
    .unwrap();
    assert!(x509.not_before() == not_before, "notBefore mismatch");
    assert!(x509.not_after() == not_after, "notAfter mismatch");
}
