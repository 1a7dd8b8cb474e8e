//! End-to-end flows: key -> CSR -> issued certificate -> verification and
//! inspection, the way the artifacts move between a subject and a CA.

mod util;

use keykit::cert::extensions::{ExtendedKeyUsageOption, SanEntry, SubjectAltName};
use keykit::cert::params::{
    CertificationRequestInfo, DistinguishedName, ExtensionParam, Validity,
};
use keykit::csr::CertSigningRequest;
use keykit::error::Result;
use keykit::issuer::Issuer;
use keykit::key::{KeyPair, PublicKey};
use regex::Regex;
use time::OffsetDateTime;

#[test]
fn csr_issuance_end_to_end() -> Result<()> {
    let ca = util::generate_ca_cert();

    // Subject side: key + CSR with SANs.
    let server_key = KeyPair::generate_ecdsa_p256();
    let san = SubjectAltName {
        entries: vec![
            SanEntry::Dns("server.myca.local".to_string()),
            SanEntry::Ip("192.0.2.10".parse().unwrap()),
        ],
    };
    let request_info = CertificationRequestInfo::builder()
        .subject(DistinguishedName::parse("CN=server.myca.local,O=keykit tests")?)
        .subject_public_key(PublicKey::from_key_pair(&server_key))
        .usages(vec![ExtendedKeyUsageOption::ServerAuth])
        .extensions(vec![ExtensionParam::from_extension(san, false)?])
        .build();
    let csr = CertSigningRequest::new(&request_info, &server_key)?;

    // The CSR survives a PEM round trip, as it would through a file handoff.
    let csr = CertSigningRequest::load(csr.to_pem()?.as_bytes())?;
    csr.verify_signature()?;

    // CA side: issue and verify.
    let cert = ca.issue(&csr.to_cert_info()?, Validity::for_days(365))?;
    keykit::verify::verify_certificate(&cert, &ca.cert, OffsetDateTime::now_utc())?;

    // The issued certificate carries what the CSR asked for.
    let report = keykit::inspect::report_for_certificate(&cert)?;
    assert!(report.subject_alt_names.contains(&"DNS:server.myca.local".to_string()));
    assert!(report.subject_alt_names.contains(&"IP:192.0.2.10".to_string()));
    assert_eq!(report.extended_key_usage, vec!["serverAuth"]);
    assert_eq!(report.issuer, "CN=myca.local, O=keykit tests");
    Ok(())
}

#[test]
fn inspection_output_matches_expected_fields() -> Result<()> {
    let ca = util::generate_ca_cert();
    let text = keykit::inspect::report_for_certificate(&ca.cert)?.to_string();

    let subject_re = Regex::new(r"Subject:\s+CN=myca\.local, O=keykit tests").unwrap();
    let serial_re = Regex::new(r"Serial:\s+([0-9A-F]{2}:){15}[0-9A-F]{2}").unwrap();
    let fingerprint_re = Regex::new(r"SHA-256 Fingerprint:\s+([0-9A-F]{2}:){31}[0-9A-F]{2}").unwrap();
    let not_after_re = Regex::new(r"Not After:\s+\d{4}-\d{2}-\d{2}T").unwrap();

    assert!(subject_re.is_match(&text), "missing subject in:\n{text}");
    assert!(serial_re.is_match(&text), "missing serial in:\n{text}");
    assert!(fingerprint_re.is_match(&text), "missing fingerprint in:\n{text}");
    assert!(not_after_re.is_match(&text), "missing notAfter in:\n{text}");
    Ok(())
}

#[test]
fn expired_certificates_are_reported_and_rejected() -> Result<()> {
    let ca = util::generate_ca_cert();

    let key = KeyPair::generate_ed25519();
    let info = CertificationRequestInfo::builder()
        .subject(DistinguishedName::parse("CN=stale.myca.local")?)
        .subject_public_key(PublicKey::from_key_pair(&key))
        .build();

    let now = OffsetDateTime::now_utc();
    let expired_validity = Validity {
        not_before: now - time::Duration::days(30),
        not_after: now - time::Duration::days(1),
    };
    let cert = ca.issue(&info, expired_validity)?;

    let report = keykit::inspect::report_for_certificate(&cert)?;
    assert!(report.days_until_expiry < 0);
    assert!(report.expires_within_days(0));
    assert!(report.expires_within_days(30));

    let err = keykit::verify::verify_certificate(&cert, &ca.cert, now).unwrap_err();
    assert!(err.to_string().contains("validity"));
    Ok(())
}

#[test]
fn issued_rsa_certificates_verify() -> Result<()> {
    let ca = util::generate_ca_cert();

    let rsa_key = KeyPair::generate_rsa(2048)?;
    let info = CertificationRequestInfo::builder()
        .subject(DistinguishedName::parse("CN=rsa.myca.local")?)
        .subject_public_key(PublicKey::from_key_pair(&rsa_key))
        .usages(vec![ExtendedKeyUsageOption::ClientAuth])
        .build();

    let cert = ca.issue(&info, Validity::for_days(90))?;
    keykit::verify::verify_certificate(&cert, &ca.cert, OffsetDateTime::now_utc())?;

    let report = keykit::inspect::report_for_certificate(&cert)?;
    assert_eq!(report.public_key_algorithm, "RSA-2048");
    Ok(())
}

#[test]
fn key_file_handoff_roundtrip() -> Result<()> {
    // A key written encrypted to disk comes back usable for issuance.
    let key = KeyPair::generate_ecdsa_p384();
    let pem = key.to_pkcs8_encrypted_pem("file handoff")?;

    let mut path = std::env::temp_dir();
    path.push(format!("keykit-lifecycle-{}.key", keykit::secrets::random_hex(8)));
    keykit::fsio::write_private(&path, pem.as_bytes())?;

    let restored = KeyPair::load(&keykit::fsio::read_input(path.to_str().unwrap())?, Some("file handoff"))?;
    assert_eq!(restored.algorithm_name(), "ECDSA P-384");

    let info = CertificationRequestInfo::builder()
        .subject(DistinguishedName::parse("CN=fromfile.myca.local")?)
        .subject_public_key(PublicKey::from_key_pair(&restored))
        .build();
    let csr = CertSigningRequest::new(&info, &restored)?;
    csr.verify_signature()?;

    std::fs::remove_file(&path)?;
    Ok(())
}
