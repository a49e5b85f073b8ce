//! Self-signed RSA-4096 certificate generation and on-disk persistence.
//!
//! Modeled on `create_server.py`'s
//! `CertificateSetup`/`create_certificates` (which shells out to `openssl req`
//! with the same parameters: x509, RSA-4096, CN=localhost, 365 days). This
//! generates the key in-process via `rcgen`/`rsa` instead of spawning a
//! subprocess.

use std::path::Path;

use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use rsa::pkcs8::EncodePrivateKey;
use time::{Duration, OffsetDateTime};

use crate::error::FatalError;

const RSA_KEY_BITS: usize = 4096;
const VALIDITY_DAYS: i64 = 365;
const COMMON_NAME: &str = "localhost";

pub struct CertBundle {
    pub cert_pem: String,
    pub key_pem: String,
}

/// Loads `cert_path`/`key_path` if both exist, otherwise generates a fresh
/// self-signed bundle and writes it to those paths.
pub fn load_or_generate(cert_path: &Path, key_path: &Path) -> Result<CertBundle, FatalError> {
    if cert_path.exists() && key_path.exists() {
        let cert_pem = std::fs::read_to_string(cert_path)?;
        let key_pem = std::fs::read_to_string(key_path)?;
        return Ok(CertBundle { cert_pem, key_pem });
    }

    let bundle = generate_self_signed()?;
    std::fs::write(cert_path, &bundle.cert_pem)?;
    std::fs::write(key_path, &bundle.key_pem)?;
    Ok(bundle)
}

fn generate_self_signed() -> Result<CertBundle, FatalError> {
    let mut rng = rand::thread_rng();
    let rsa_key = rsa::RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
        .map_err(|err| FatalError::CertGeneration(err.to_string()))?;
    let pkcs8_der = rsa_key
        .to_pkcs8_der()
        .map_err(|err| FatalError::CertGeneration(err.to_string()))?;
    let key_pair = KeyPair::try_from(pkcs8_der.as_bytes())
        .map_err(|err| FatalError::CertGeneration(err.to_string()))?;

    let mut params = CertificateParams::new(vec![COMMON_NAME.to_string()])
        .map_err(|err| FatalError::CertGeneration(err.to_string()))?;
    let mut name = DistinguishedName::new();
    name.push(DnType::CommonName, COMMON_NAME);
    params.distinguished_name = name;
    params.not_before = OffsetDateTime::now_utc();
    params.not_after = params.not_before + Duration::days(VALIDITY_DAYS);

    let cert = params
        .self_signed(&key_pair)
        .map_err(|err| FatalError::CertGeneration(err.to_string()))?;

    Ok(CertBundle {
        cert_pem: cert.pem(),
        key_pem: key_pair.serialize_pem(),
    })
}
