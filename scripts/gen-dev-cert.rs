//! Self-signed relay certificate for local play
//!
//! `cargo run --manifest-path scripts/Cargo.toml [-- --force] [out_dir]`
//!
//! Browsers only accept `serverCertificateHashes` for certificates valid at
//! most 14 days, so rerun this every two weeks.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use ring::digest::{digest, SHA256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const DEFAULT_DIR: &str = "../certs";
const VALIDITY: Duration = Duration::from_secs(14 * 24 * 60 * 60);

type BoxError = Box<dyn std::error::Error>;

fn main() -> Result<(), BoxError> {
    let mut force = false;
    let mut out_dir = PathBuf::from(DEFAULT_DIR);
    for arg in std::env::args().skip(1) {
        if arg == "--force" {
            force = true;
        } else {
            out_dir = PathBuf::from(arg);
        }
    }

    let cert_file = out_dir.join("cert.pem");
    let key_file = out_dir.join("key.pem");

    if !force && cert_file.exists() && key_file.exists() {
        println!("Relay certificate already present in {}", out_dir.display());
        println!("Pass --force to replace it.\n");
        print_cert_hash(&cert_file)?;
        return Ok(());
    }

    fs::create_dir_all(&out_dir)?;

    let mut params =
        CertificateParams::new(vec!["localhost".to_string(), "127.0.0.1".to_string()])?;
    params.distinguished_name = DistinguishedName::new();
    params
        .distinguished_name
        .push(DnType::CommonName, "Brick Breaker Relay (dev)");

    let now = SystemTime::now();
    params.not_before = now.into();
    params.not_after = (now + VALIDITY).into();

    let key_pair = KeyPair::generate()?;
    let cert = params.self_signed(&key_pair)?;

    fs::write(&cert_file, cert.pem())?;
    fs::write(&key_file, key_pair.serialize_pem())?;
    println!("Wrote {} and {}\n", cert_file.display(), key_file.display());

    print_cert_hash(&cert_file)?;

    let spki = STANDARD.encode(digest(&SHA256, &key_pair.public_key_der()).as_ref());
    println!("Chrome flag:");
    println!("  --ignore-certificate-errors-spki-list={}\n", spki);

    println!("Relay .env:");
    println!("  TLS_CERT_PATH={}", cert_file.display());
    println!("  TLS_KEY_PATH={}", key_file.display());

    Ok(())
}

fn print_cert_hash(cert_file: &Path) -> Result<(), BoxError> {
    let parsed = pem::parse(fs::read_to_string(cert_file)?)?;
    let hash = STANDARD.encode(digest(&SHA256, parsed.contents()).as_ref());
    println!("serverCertificateHashes value (base64 SHA-256 of the DER):");
    println!("  {}\n", hash);
    Ok(())
}
