#![allow(dead_code)]

use std::path::{Path, PathBuf};

use certread::cert::Certificate;

pub const CA_SUBJECT: &str = "OU=Testing+CN=Example Root CA,O=Example Org,C=DE";
pub const RSA_SUBJECT: &str =
    "CN=www.example.test,O=Example Corp,L=San Francisco,ST=California,C=US";

pub fn data_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

/// Reads a fixture from `tests/data`.
pub fn load(name: &str) -> Vec<u8> {
    std::fs::read(data_path(name)).unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"))
}

pub fn load_cert(name: &str) -> Certificate {
    Certificate::from_der(&load(name)).unwrap_or_else(|e| panic!("failed to parse {name}: {e}"))
}
