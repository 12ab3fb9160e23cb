//! In-process TLS termination through OpenSSL

use crate::settings::TlsSettings;
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslFiletype, SslMethod};
use std::io;

/// Build the acceptor from the configured PEM key and certificate chain
///
/// # Errors
///
/// Returns an error if either file is missing or not valid PEM, or the key
/// does not match the certificate.
pub fn build_ssl_acceptor(tls: &TlsSettings) -> io::Result<SslAcceptorBuilder> {
    let mut builder = SslAcceptor::mozilla_intermediate(SslMethod::tls())
        .map_err(|e| io::Error::other(format!("Failed to create TLS acceptor: {e}")))?;

    builder
        .set_private_key_file(&tls.key_path, SslFiletype::PEM)
        .map_err(|e| io::Error::other(format!("Failed to load TLS key {}: {e}", tls.key_path)))?;
    builder
        .set_certificate_chain_file(&tls.cert_path)
        .map_err(|e| {
            io::Error::other(format!(
                "Failed to load TLS certificate {}: {e}",
                tls.cert_path
            ))
        })?;
    builder
        .check_private_key()
        .map_err(|e| io::Error::other(format!("TLS key does not match certificate: {e}")))?;

    Ok(builder)
}
