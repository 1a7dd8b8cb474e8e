//! TLS handshake probe.
//!
//! Connects to a server, completes a TLS handshake, and reports what was
//! negotiated along with the peer's certificate chain.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig, RootCertStore};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::error::{KeyKitError, Result};
use crate::inspect::CertReport;

/// Parameters for a TLS probe.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub host: String,
    pub port: u16,
    /// PEM bundle of trust anchors; platform store when absent.
    pub cafile: Option<PathBuf>,
    pub timeout: Duration,
}

impl ProbeOptions {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            cafile: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// What a completed handshake looked like.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub cipher_suite: String,
    pub alpn_protocol: Option<String>,
    pub peer_certificates: Vec<CertReport>,
}

impl std::fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "TLS probe of {}:{}", self.host, self.port)?;
        writeln!(f, "  Protocol:     {}", self.protocol_version)?;
        writeln!(f, "  Cipher Suite: {}", self.cipher_suite)?;
        writeln!(
            f,
            "  ALPN:         {}",
            self.alpn_protocol.as_deref().unwrap_or("(none)")
        )?;
        writeln!(f, "  Peer chain:   {} certificate(s)", self.peer_certificates.len())?;
        for (i, cert) in self.peer_certificates.iter().enumerate() {
            writeln!(f, "  [{i}] Subject:    {}", cert.subject)?;
            writeln!(f, "      Issuer:     {}", cert.issuer)?;
            writeln!(
                f,
                "      Not After:  {} ({} days)",
                cert.not_after, cert.days_until_expiry
            )?;
        }
        Ok(())
    }
}

/// Builds the trust store for a probe: either the caller's CA bundle or the
/// platform's native roots.
fn build_root_store(cafile: Option<&PathBuf>) -> Result<RootCertStore> {
    let mut root_store = RootCertStore::empty();

    match cafile {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let blocks = pem::parse_many(&text)?;
            let mut added = 0usize;
            for block in blocks {
                if block.tag() != crate::pem_utils::CERTIFICATE_LABEL {
                    continue;
                }
                let der = CertificateDer::from(block.contents().to_vec());
                root_store
                    .add(der)
                    .map_err(|e| KeyKitError::ProbeError(format!("Invalid CA certificate: {e}")))?;
                added += 1;
            }
            if added == 0 {
                return Err(KeyKitError::ProbeError(format!(
                    "No certificates found in {}",
                    path.display()
                )));
            }
        }
        None => {
            let native = rustls_native_certs::load_native_certs();
            for err in &native.errors {
                tracing::warn!("Certificate load error: {}", err);
            }
            for cert in native.certs {
                if let Err(e) = root_store.add(cert) {
                    tracing::warn!("Failed to add system certificate: {}", e);
                }
            }
            if root_store.is_empty() {
                return Err(KeyKitError::ProbeError(
                    "No usable trust anchors in the platform store".to_string(),
                ));
            }
        }
    }

    Ok(root_store)
}

/// Connects, completes the handshake, and reports the negotiated parameters.
pub async fn probe(options: &ProbeOptions) -> Result<ProbeReport> {
    tracing::debug!(host = %options.host, port = options.port, "starting TLS probe");

    let tcp_stream = tokio::time::timeout(
        options.timeout,
        TcpStream::connect((options.host.as_str(), options.port)),
    )
    .await
    .map_err(|_| {
        KeyKitError::ProbeError(format!(
            "Connection to {}:{} timed out",
            options.host, options.port
        ))
    })?
    .map_err(|e| {
        KeyKitError::ProbeError(format!(
            "Failed to connect to {}:{}: {e}",
            options.host, options.port
        ))
    })?;

    let root_store = build_root_store(options.cafile.as_ref())?;
    let client_config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let connector = TlsConnector::from(Arc::new(client_config));
    let server_name = ServerName::try_from(options.host.clone())
        .map_err(|e| KeyKitError::ProbeError(format!("Invalid hostname '{}': {e}", options.host)))?;

    let tls_stream = tokio::time::timeout(options.timeout, connector.connect(server_name, tcp_stream))
        .await
        .map_err(|_| {
            KeyKitError::ProbeError(format!(
                "TLS handshake with {}:{} timed out",
                options.host, options.port
            ))
        })?
        .map_err(|e| KeyKitError::ProbeError(format!("TLS handshake failed: {e}")))?;

    let (_, connection) = tls_stream.get_ref();

    let protocol_version = connection
        .protocol_version()
        .map(|v| format!("{v:?}"))
        .unwrap_or_else(|| "unknown".to_string());
    let cipher_suite = connection
        .negotiated_cipher_suite()
        .map(|s| format!("{:?}", s.suite()))
        .unwrap_or_else(|| "unknown".to_string());
    let alpn_protocol = connection
        .alpn_protocol()
        .map(|p| String::from_utf8_lossy(p).to_string());

    let peer_certificates = connection
        .peer_certificates()
        .unwrap_or_default()
        .iter()
        .filter_map(|der| crate::inspect::inspect_certificate(der.as_ref()).ok())
        .collect();

    tracing::info!(
        host = %options.host,
        port = options.port,
        protocol = %protocol_version,
        "TLS probe complete"
    );

    Ok(ProbeReport {
        host: options.host.clone(),
        port: options.port,
        protocol_version,
        cipher_suite,
        alpn_protocol,
        peer_certificates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cafile_with_no_certificates_is_an_error() {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "keykit-probe-empty-{}.pem",
            crate::secrets::random_hex(8)
        ));
        std::fs::write(&path, "not a pem file\n").unwrap();
        // parse_many returns no blocks for junk input, so the store stays empty.
        assert!(build_root_store(Some(&path)).is_err());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn cafile_with_a_certificate_builds_a_store() {
        use crate::cert::Certificate;
        use crate::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};
        use crate::key::{KeyPair, PublicKey};

        let key = KeyPair::generate_ecdsa_p256();
        let info = CertificationRequestInfo::builder()
            .subject(DistinguishedName::parse("CN=Probe Root").unwrap())
            .subject_public_key(PublicKey::from_key_pair(&key))
            .is_ca(true)
            .build();
        let cert = Certificate::new_self_signed(&info, &key, Validity::for_days(30)).unwrap();

        let mut path = std::env::temp_dir();
        path.push(format!(
            "keykit-probe-ca-{}.pem",
            crate::secrets::random_hex(8)
        ));
        std::fs::write(&path, cert.to_pem().unwrap()).unwrap();

        let store = build_root_store(Some(&path)).unwrap();
        assert_eq!(store.len(), 1);
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn refused_connections_surface_as_probe_errors() {
        // Port 1 on localhost is essentially guaranteed closed.
        let options = ProbeOptions {
            host: "127.0.0.1".to_string(),
            port: 1,
            cafile: None,
            timeout: Duration::from_secs(2),
        };
        let err = probe(&options).await.unwrap_err();
        assert!(matches!(err, KeyKitError::ProbeError(_)));
    }
}
