use keykit::cert::extensions::ExtendedKeyUsageOption;
use keykit::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};
use keykit::cert::{Certificate, CertificateWithPrivateKey};
use keykit::key::{KeyPair, PublicKey};

pub fn generate_ca_cert() -> CertificateWithPrivateKey {
    let ca_key = KeyPair::generate_ecdsa_p256();

    let subject_dn = DistinguishedName::builder()
        .common_name("myca.local".to_string())
        .organization("keykit tests".to_string())
        .build();

    let subject_public_key = PublicKey::from_key_pair(&ca_key);

    let ca_cert_info = CertificationRequestInfo::builder()
        .subject(subject_dn.clone())
        .subject_public_key(subject_public_key)
        .usages(vec![
            ExtendedKeyUsageOption::ServerAuth,
            ExtendedKeyUsageOption::ClientAuth,
        ])
        .is_ca(true)
        .extensions(vec![])
        .build();

    CertificateWithPrivateKey {
        cert: Certificate::new_self_signed(&ca_cert_info, &ca_key, Validity::for_days(3650))
            .expect("CA generation should succeed"),
        key: ca_key,
    }
}
