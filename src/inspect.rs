//! Human- and machine-readable reports over keys, CSRs, and certificates.
//!
//! Every entry point accepts PEM or DER and renders either a text report
//! (`Display`) or JSON (`serde`).

use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::cert::extensions::{KeyUsage, SubjectAltName, ToAndFromX509Extension};
use crate::cert::{Certificate, SignatureAlgorithm};
use crate::csr::CertSigningRequest;
use crate::error::{KeyKitError, Result};
use crate::key::{KeyPair, PublicKey};

/// Inspection report for an X.509 certificate.
#[derive(Debug, Clone, Serialize)]
pub struct CertReport {
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub not_before: String,
    pub not_after: String,
    pub days_until_expiry: i64,
    pub is_ca: bool,
    pub signature_algorithm: String,
    pub public_key_algorithm: String,
    pub subject_alt_names: Vec<String>,
    pub key_usage: Vec<String>,
    pub extended_key_usage: Vec<String>,
    pub sha1_fingerprint: String,
    pub sha256_fingerprint: String,
}

impl CertReport {
    /// Whether the certificate expires within the next `days` days.
    ///
    /// An already-expired certificate reports true for any window.
    pub fn expires_within_days(&self, days: i64) -> bool {
        self.days_until_expiry <= days
    }
}

impl std::fmt::Display for CertReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Certificate:")?;
        writeln!(f, "  Subject:             {}", self.subject)?;
        writeln!(f, "  Issuer:              {}", self.issuer)?;
        writeln!(f, "  Serial:              {}", self.serial)?;
        writeln!(f, "  Not Before:          {}", self.not_before)?;
        writeln!(f, "  Not After:           {}", self.not_after)?;
        writeln!(f, "  Days Until Expiry:   {}", self.days_until_expiry)?;
        writeln!(f, "  CA:                  {}", yes_no(self.is_ca))?;
        writeln!(f, "  Signature Algorithm: {}", self.signature_algorithm)?;
        writeln!(f, "  Public Key:          {}", self.public_key_algorithm)?;
        if !self.subject_alt_names.is_empty() {
            writeln!(f, "  Subject Alt Names:   {}", self.subject_alt_names.join(", "))?;
        }
        if !self.key_usage.is_empty() {
            writeln!(f, "  Key Usage:           {}", self.key_usage.join(", "))?;
        }
        if !self.extended_key_usage.is_empty() {
            writeln!(f, "  Extended Key Usage:  {}", self.extended_key_usage.join(", "))?;
        }
        writeln!(f, "  SHA-1 Fingerprint:   {}", self.sha1_fingerprint)?;
        write!(f, "  SHA-256 Fingerprint: {}", self.sha256_fingerprint)
    }
}

/// Inspection report for a certification request.
#[derive(Debug, Clone, Serialize)]
pub struct CsrReport {
    pub subject: String,
    pub public_key_algorithm: String,
    pub signature_algorithm: String,
    pub subject_alt_names: Vec<String>,
    pub extended_key_usage: Vec<String>,
    pub requests_ca: bool,
    pub signature_valid: bool,
}

impl std::fmt::Display for CsrReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Certificate Request:")?;
        writeln!(f, "  Subject:             {}", self.subject)?;
        writeln!(f, "  Public Key:          {}", self.public_key_algorithm)?;
        writeln!(f, "  Signature Algorithm: {}", self.signature_algorithm)?;
        if !self.subject_alt_names.is_empty() {
            writeln!(f, "  Subject Alt Names:   {}", self.subject_alt_names.join(", "))?;
        }
        if !self.extended_key_usage.is_empty() {
            writeln!(f, "  Extended Key Usage:  {}", self.extended_key_usage.join(", "))?;
        }
        writeln!(f, "  Requests CA:         {}", yes_no(self.requests_ca))?;
        write!(
            f,
            "  Signature:           {}",
            if self.signature_valid { "valid" } else { "INVALID" }
        )
    }
}

/// Inspection report for a private or public key.
#[derive(Debug, Clone, Serialize)]
pub struct KeyReport {
    pub algorithm: String,
    /// SHA-256 over the SPKI encoding of the public half.
    pub public_key_fingerprint: String,
    pub private: bool,
}

impl std::fmt::Display for KeyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} Key:",
            if self.private { "Private" } else { "Public" }
        )?;
        writeln!(f, "  Algorithm:           {}", self.algorithm)?;
        write!(f, "  SHA-256 Fingerprint: {}", self.public_key_fingerprint)
    }
}

/// Builds a report from certificate input (PEM or DER).
pub fn inspect_certificate(data: &[u8]) -> Result<CertReport> {
    report_for_certificate(&Certificate::load(data)?)
}

/// Builds a report from an already-decoded certificate.
pub fn report_for_certificate(cert: &Certificate) -> Result<CertReport> {
    let der = cert.to_der()?;
    let info = cert.to_cert_info()?;
    let validity = cert.validity();
    let now = OffsetDateTime::now_utc();

    let issuer =
        crate::cert::params::DistinguishedName::from_x509_name(&cert.inner.tbs_certificate.issuer);

    let signature_algorithm = match SignatureAlgorithm::from_oid(cert.inner.signature_algorithm.oid)
    {
        Ok(alg) => alg.name().to_string(),
        Err(_) => cert.inner.signature_algorithm.oid.to_string(),
    };

    let mut subject_alt_names = Vec::new();
    let mut key_usage = Vec::new();
    for ext in &info.extensions {
        if ext.oid == SubjectAltName::OID {
            if let Ok(san) = ext.to_extension::<SubjectAltName>() {
                subject_alt_names = san.entries.iter().map(|e| e.to_string()).collect();
            }
        } else if ext.oid == KeyUsage::OID {
            if let Ok(ku) = ext.to_extension::<KeyUsage>() {
                key_usage = ku.flag_names().iter().map(|s| s.to_string()).collect();
            }
        }
    }

    Ok(CertReport {
        subject: info.subject.to_string(),
        issuer: issuer.to_string(),
        serial: colon_hex(&cert.serial_number()),
        not_before: format_time(validity.not_before)?,
        not_after: format_time(validity.not_after)?,
        days_until_expiry: (validity.not_after - now).whole_days(),
        is_ca: info.is_ca,
        signature_algorithm,
        public_key_algorithm: info.subject_public_key.algorithm_name(),
        subject_alt_names,
        key_usage,
        extended_key_usage: info.usages.iter().map(|u| u.name().to_string()).collect(),
        sha1_fingerprint: colon_hex(&Sha1::digest(&der)),
        sha256_fingerprint: colon_hex(&Sha256::digest(&der)),
    })
}

/// Builds a report from CSR input (PEM or DER).
pub fn inspect_csr(data: &[u8]) -> Result<CsrReport> {
    let csr = CertSigningRequest::load(data)?;
    let info = csr.to_cert_info()?;

    let signature_algorithm = match SignatureAlgorithm::from_oid(csr.inner.algorithm.oid) {
        Ok(alg) => alg.name().to_string(),
        Err(_) => csr.inner.algorithm.oid.to_string(),
    };

    let subject_alt_names = csr
        .subject_alt_name()?
        .map(|san| san.entries.iter().map(|e| e.to_string()).collect())
        .unwrap_or_default();

    Ok(CsrReport {
        subject: info.subject.to_string(),
        public_key_algorithm: info.subject_public_key.algorithm_name(),
        signature_algorithm,
        subject_alt_names,
        extended_key_usage: info.usages.iter().map(|u| u.name().to_string()).collect(),
        requests_ca: info.is_ca,
        signature_valid: csr.verify_signature().is_ok(),
    })
}

/// Builds a report from private key input (PEM or DER, any supported format).
pub fn inspect_private_key(data: &[u8], passphrase: Option<&str>) -> Result<KeyReport> {
    let key = KeyPair::load(data, passphrase)?;
    let public = PublicKey::from_key_pair(&key);
    Ok(KeyReport {
        algorithm: key.algorithm_name(),
        public_key_fingerprint: colon_hex(&Sha256::digest(public.to_spki_der()?)),
        private: true,
    })
}

/// Builds a report from public key input (SPKI PEM or DER).
pub fn inspect_public_key(data: &[u8]) -> Result<KeyReport> {
    let der = crate::pem_utils::to_der_expecting(data, crate::pem_utils::PUBLIC_KEY_LABEL)?;
    let public = PublicKey::from_spki_der(&der)?;
    Ok(KeyReport {
        algorithm: public.algorithm_name(),
        public_key_fingerprint: colon_hex(&Sha256::digest(public.to_spki_der()?)),
        private: false,
    })
}

fn format_time(at: OffsetDateTime) -> Result<String> {
    at.format(&Rfc3339)
        .map_err(|e| KeyKitError::EncodingError(format!("timestamp: {e}")))
}

/// Uppercase colon-separated hex, the conventional fingerprint rendering.
fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

fn yes_no(v: bool) -> &'static str {
    if v { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};

    fn self_signed() -> Certificate {
        let key = KeyPair::generate_ecdsa_p256();
        let info = CertificationRequestInfo::builder()
            .subject(DistinguishedName::parse("CN=inspect.local,O=Acme").unwrap())
            .subject_public_key(PublicKey::from_key_pair(&key))
            .usages(vec![
                crate::cert::extensions::ExtendedKeyUsageOption::ServerAuth,
            ])
            .is_ca(true)
            .build();
        Certificate::new_self_signed(&info, &key, Validity::for_days(90)).unwrap()
    }

    #[test]
    fn certificate_report_captures_identity_and_expiry() {
        let cert = self_signed();
        let report = inspect_certificate(cert.to_pem().unwrap().as_bytes()).unwrap();

        assert_eq!(report.subject, "CN=inspect.local, O=Acme");
        assert_eq!(report.subject, report.issuer);
        assert!(report.is_ca);
        assert_eq!(report.signature_algorithm, "ecdsa-with-SHA256");
        assert_eq!(report.public_key_algorithm, "ECDSA P-256");
        assert_eq!(report.extended_key_usage, vec!["serverAuth"]);
        assert!(report.key_usage.contains(&"keyCertSign".to_string()));

        assert!((89..=90).contains(&report.days_until_expiry));
        assert!(report.expires_within_days(90));
        assert!(!report.expires_within_days(30));

        // 20 bytes -> 20 hex pairs and 19 separators.
        assert_eq!(report.sha1_fingerprint.len(), 59);
        assert!(report.sha256_fingerprint.contains(':'));
    }

    #[test]
    fn report_accepts_der_input_too() {
        let cert = self_signed();
        let report = inspect_certificate(&cert.to_der().unwrap()).unwrap();
        assert_eq!(report.subject, "CN=inspect.local, O=Acme");
    }

    #[test]
    fn key_report_over_private_and_public_halves_agree() {
        let key = KeyPair::generate_ed25519();
        let private_report =
            inspect_private_key(key.to_pkcs8_pem().unwrap().as_bytes(), None).unwrap();
        let public_pem = PublicKey::from_key_pair(&key).to_spki_pem().unwrap();
        let public_report = inspect_public_key(public_pem.as_bytes()).unwrap();

        assert!(private_report.private);
        assert!(!public_report.private);
        assert_eq!(
            private_report.public_key_fingerprint,
            public_report.public_key_fingerprint
        );
    }

    #[test]
    fn text_rendering_mentions_the_subject() {
        let cert = self_signed();
        let report = report_for_certificate(&cert).unwrap();
        let text = report.to_string();
        assert!(text.contains("Subject:             CN=inspect.local, O=Acme"));
        assert!(text.contains("SHA-256 Fingerprint:"));
    }
}
