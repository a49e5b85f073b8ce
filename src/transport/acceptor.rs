//! Builds the server-side `TlsAcceptor` from a (possibly freshly generated)
//! certificate bundle.
//!
//! Modeled on `examples/other_examples/bd00ff46_petstack-tokio_php__src-server-mod.rs.rs`'s
//! `load_tls_config` (`rustls_pemfile::certs`/`private_key` feeding
//! `ServerConfig::builder().with_no_client_auth().with_single_cert(...)`), and
//! on `create_server.py`'s `wrap_socket_tls`, which
//! never requires a client certificate either.

use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use super::cert::{self, CertBundle};
use crate::error::FatalError;

pub fn build(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, FatalError> {
    let CertBundle { cert_pem, key_pem } = cert::load_or_generate(cert_path, key_path)?;

    let certs: Vec<CertificateDer<'static>> =
        rustls_pemfile::certs(&mut BufReader::new(cert_pem.as_bytes()))
            .collect::<Result<_, _>>()
            .map_err(|err| FatalError::CertGeneration(err.to_string()))?;
    if certs.is_empty() {
        return Err(FatalError::CertGeneration(
            "no certificates found in cert.pem".to_string(),
        ));
    }

    let key: PrivateKeyDer<'static> =
        rustls_pemfile::private_key(&mut BufReader::new(key_pem.as_bytes()))
            .map_err(|err| FatalError::CertGeneration(err.to_string()))?
            .ok_or_else(|| FatalError::CertGeneration("no private key found in key.pem".to_string()))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|err| FatalError::CertGeneration(err.to_string()))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}
