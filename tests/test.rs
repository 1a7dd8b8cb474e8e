mod util;

use keykit::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};
use keykit::error::Result;
use keykit::issuer::Issuer;
use keykit::key::{KeyPair, PublicKey};

/// Generates a Certificate Authority (CA) certificate and saves it as a PEM file.
#[test]
fn generate_ca_cert() -> Result<()> {
    let ca_cert_with_key = util::generate_ca_cert();

    use std::io::Write;
    std::fs::create_dir_all(".debug_certs")?;
    std::fs::File::create(".debug_certs/ca_cert.pem")?
        .write_all(ca_cert_with_key.cert.to_pem()?.as_bytes())?;

    let info = ca_cert_with_key.cert.to_cert_info()?;
    assert!(info.is_ca);
    assert_eq!(info.subject.common_name, "myca.local");
    Ok(())
}

/// Generates a server certificate signed by the CA and saves it as a PEM file.
#[test]
fn generate_server_cert() -> Result<()> {
    let ca_cert_with_key = util::generate_ca_cert();

    let server_key = KeyPair::generate_ecdsa_p256();
    let server_dn = DistinguishedName::builder()
        .common_name("server.myca.local".to_string())
        .build();

    let server_public_key = PublicKey::from_key_pair(&server_key);
    let server_cert_info = CertificationRequestInfo::builder()
        .subject(server_dn)
        .subject_public_key(server_public_key)
        .usages(vec![
            keykit::cert::extensions::ExtendedKeyUsageOption::ServerAuth,
        ])
        .build();

    let server_cert = ca_cert_with_key.issue(&server_cert_info, Validity::for_days(365))?;
    let server_cert_pem = server_cert.to_pem()?;

    use std::io::Write;
    std::fs::create_dir_all(".debug_certs")?;
    std::fs::File::create(".debug_certs/server_cert.pem")?.write_all(server_cert_pem.as_bytes())?;

    let info = server_cert.to_cert_info()?;
    assert!(!info.is_ca);
    assert_eq!(info.subject.common_name, "server.myca.local");
    assert_eq!(
        info.usages,
        vec![keykit::cert::extensions::ExtendedKeyUsageOption::ServerAuth]
    );

    // Serials are randomized per issuance.
    assert_ne!(
        server_cert.serial_number(),
        ca_cert_with_key.cert.serial_number()
    );
    Ok(())
}

/// Generates a client certificate signed by the CA and saves it as a PEM file.
#[test]
fn generate_client_cert() -> Result<()> {
    let ca_cert_with_key = util::generate_ca_cert();

    let client_key = KeyPair::generate_ecdsa_p256();
    let client_dn = DistinguishedName::builder()
        .common_name("client.myca.local".to_string())
        .build();

    let client_public_key = PublicKey::from_key_pair(&client_key);
    let client_cert_info = CertificationRequestInfo::builder()
        .subject(client_dn)
        .subject_public_key(client_public_key)
        .usages(vec![
            keykit::cert::extensions::ExtendedKeyUsageOption::ClientAuth,
        ])
        .build();

    let client_cert = ca_cert_with_key.issue(&client_cert_info, Validity::for_days(365))?;
    let client_cert_pem = client_cert.to_pem()?;

    use std::io::Write;
    std::fs::create_dir_all(".debug_certs")?;
    std::fs::File::create(".debug_certs/client_cert.pem")?.write_all(client_cert_pem.as_bytes())?;

    keykit::verify::verify_certificate(
        &client_cert,
        &ca_cert_with_key.cert,
        time::OffsetDateTime::now_utc(),
    )?;
    Ok(())
}
