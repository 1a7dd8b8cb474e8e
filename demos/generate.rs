//! Generates a CA, then walks a CSR through issuance, printing each artifact.
//!
//! Run with: cargo run --example generate

use keykit::cert::extensions::ExtendedKeyUsageOption;
use keykit::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};
use keykit::cert::{Certificate, CertificateWithPrivateKey};
use keykit::csr::CertSigningRequest;
use keykit::issuer::Issuer;
use keykit::key::{KeyPair, PublicKey};

fn main() -> keykit::error::Result<()> {
    // The CA: an ECDSA key and a self-signed root certificate.
    let ca_key = KeyPair::generate_ecdsa_p256();
    let ca_info = CertificationRequestInfo::builder()
        .subject(DistinguishedName::parse("CN=My Test CA,O=Example")?)
        .subject_public_key(PublicKey::from_key_pair(&ca_key))
        .is_ca(true)
        .build();
    let ca = CertificateWithPrivateKey {
        cert: Certificate::new_self_signed(&ca_info, &ca_key, Validity::for_days(3650))?,
        key: ca_key,
    };

    println!("CA certificate:\n{}", ca.cert.to_pem()?);

    // The server: an Ed25519 key and a CSR naming its host.
    let server_key = KeyPair::generate_ed25519();
    let request_info = CertificationRequestInfo::builder()
        .subject(DistinguishedName::parse("CN=myserver.local")?)
        .subject_public_key(PublicKey::from_key_pair(&server_key))
        .usages(vec![ExtendedKeyUsageOption::ServerAuth])
        .build();
    let csr = CertSigningRequest::new(&request_info, &server_key)?;

    println!("Server CSR:\n{}", csr.to_pem()?);

    // Issuance: the CA checks the request signature and signs.
    csr.verify_signature()?;
    let server_cert = ca.issue(&csr.to_cert_info()?, Validity::for_days(825))?;

    println!("Server certificate:\n{}", server_cert.to_pem()?);

    let report = keykit::inspect::report_for_certificate(&server_cert)?;
    println!("{report}");

    Ok(())
}
