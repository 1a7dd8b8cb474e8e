//! Certificate verification against an issuing CA.
//!
//! Covers the single-issuer case: a leaf (or intermediate) checked directly
//! against the certificate that signed it. No path building, no revocation.

use der::Encode;
use time::OffsetDateTime;

use crate::cert::Certificate;
use crate::cert::extensions::{BasicConstraints, ToAndFromX509Extension};
use crate::error::{KeyKitError, Result};
use crate::key::PublicKey;

/// The reasons verification can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyFailure {
    /// The certificate's issuer DN does not match the CA's subject DN.
    IssuerMismatch { expected: String, found: String },
    /// The signature does not verify under the CA's public key.
    BadSignature,
    /// The certificate is outside its validity window.
    OutsideValidity,
    /// The signing certificate is not marked as a CA.
    SignerNotCa,
}

impl std::fmt::Display for VerifyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerifyFailure::IssuerMismatch { expected, found } => {
                write!(f, "issuer '{found}' does not match CA subject '{expected}'")
            }
            VerifyFailure::BadSignature => write!(f, "signature does not verify"),
            VerifyFailure::OutsideValidity => write!(f, "outside validity window"),
            VerifyFailure::SignerNotCa => write!(f, "signing certificate is not a CA"),
        }
    }
}

impl From<VerifyFailure> for KeyKitError {
    fn from(failure: VerifyFailure) -> Self {
        KeyKitError::VerificationError(failure.to_string())
    }
}

/// Verifies `cert` against the certificate that is claimed to have issued it.
///
/// Checks, in order: issuer/subject DN chaining, the CA bit on the issuer,
/// the signature over the TBS bytes, and that `at` falls inside the
/// certificate's validity window.
pub fn verify_certificate(
    cert: &Certificate,
    issuer_cert: &Certificate,
    at: OffsetDateTime,
) -> Result<()> {
    let issuer_dn = crate::cert::params::DistinguishedName::from_x509_name(
        &cert.inner.tbs_certificate.issuer,
    );
    let ca_subject_dn = crate::cert::params::DistinguishedName::from_x509_name(
        &issuer_cert.inner.tbs_certificate.subject,
    );
    if issuer_dn != ca_subject_dn {
        return Err(VerifyFailure::IssuerMismatch {
            expected: ca_subject_dn.to_string(),
            found: issuer_dn.to_string(),
        }
        .into());
    }

    let self_signed = cert.to_der()? == issuer_cert.to_der()?;
    if !self_signed && !is_ca(issuer_cert)? {
        return Err(VerifyFailure::SignerNotCa.into());
    }

    check_signature(cert, issuer_cert)?;

    if !cert.validity().contains(at) {
        return Err(VerifyFailure::OutsideValidity.into());
    }

    tracing::debug!(
        subject = %crate::cert::params::DistinguishedName::from_x509_name(
            &cert.inner.tbs_certificate.subject
        ),
        "certificate verified"
    );
    Ok(())
}

/// Verifies a self-signed certificate against its own key.
pub fn verify_self_signed(cert: &Certificate, at: OffsetDateTime) -> Result<()> {
    check_signature(cert, cert)?;
    if !cert.validity().contains(at) {
        return Err(VerifyFailure::OutsideValidity.into());
    }
    Ok(())
}

fn is_ca(cert: &Certificate) -> Result<bool> {
    let extensions = cert.inner.tbs_certificate.extensions.clone().unwrap_or_default();
    for ext in extensions {
        if ext.extn_id == BasicConstraints::OID {
            let bc = BasicConstraints::from_x509_extension_value(ext.extn_value.as_bytes())?;
            return Ok(bc.is_ca);
        }
    }
    Ok(false)
}

fn check_signature(cert: &Certificate, issuer_cert: &Certificate) -> Result<()> {
    let tbs_der = cert
        .inner
        .tbs_certificate
        .to_der()
        .map_err(|e| KeyKitError::EncodingError(e.to_string()))?;
    let issuer_key =
        PublicKey::from_x509spki(&issuer_cert.inner.tbs_certificate.subject_public_key_info)?;
    let signature = cert.inner.signature.raw_bytes();

    issuer_key
        .verify_signature(&tbs_der, signature)
        .map_err(|_| VerifyFailure::BadSignature.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::CertificateWithPrivateKey;
    use crate::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};
    use crate::issuer::Issuer;
    use crate::key::KeyPair;

    fn make_ca() -> CertificateWithPrivateKey {
        let key = KeyPair::generate_ecdsa_p256();
        let info = CertificationRequestInfo::builder()
            .subject(DistinguishedName::parse("CN=Verify Test CA").unwrap())
            .subject_public_key(PublicKey::from_key_pair(&key))
            .is_ca(true)
            .build();
        let cert = Certificate::new_self_signed(&info, &key, Validity::for_days(365)).unwrap();
        CertificateWithPrivateKey { cert, key }
    }

    fn issue_leaf(ca: &CertificateWithPrivateKey, validity: Validity) -> Certificate {
        let key = KeyPair::generate_ed25519();
        let info = CertificationRequestInfo::builder()
            .subject(DistinguishedName::parse("CN=leaf.local").unwrap())
            .subject_public_key(PublicKey::from_key_pair(&key))
            .build();
        ca.issue(&info, validity).unwrap()
    }

    #[test]
    fn issued_certificate_verifies_against_its_ca() {
        let ca = make_ca();
        let leaf = issue_leaf(&ca, Validity::for_days(30));
        verify_certificate(&leaf, &ca.cert, OffsetDateTime::now_utc()).unwrap();
    }

    #[test]
    fn verification_rejects_the_wrong_ca() {
        let ca = make_ca();
        let other_ca = make_ca();
        let leaf = issue_leaf(&ca, Validity::for_days(30));

        // Same subject DN on both CAs, so the failure is the signature.
        let err = verify_certificate(&leaf, &other_ca.cert, OffsetDateTime::now_utc());
        assert!(err.is_err());
    }

    #[test]
    fn verification_rejects_expired_certificates() {
        let ca = make_ca();
        let leaf = issue_leaf(&ca, Validity::for_days(30));
        let err = verify_certificate(
            &leaf,
            &ca.cert,
            OffsetDateTime::now_utc() + time::Duration::days(60),
        )
        .unwrap_err();
        assert!(err.to_string().contains("validity"));
    }

    #[test]
    fn verification_rejects_non_ca_signers() {
        let ca = make_ca();
        let leaf = issue_leaf(&ca, Validity::for_days(30));

        // A leaf cannot vouch for another certificate, even with matching DNs.
        let forged_issuer_key = KeyPair::generate_ecdsa_p256();
        let info = CertificationRequestInfo::builder()
            .subject(DistinguishedName::parse("CN=Verify Test CA").unwrap())
            .subject_public_key(PublicKey::from_key_pair(&forged_issuer_key))
            .build();
        let fake_ca =
            Certificate::new_self_signed(&info, &forged_issuer_key, Validity::for_days(30))
                .unwrap();

        let err = verify_certificate(&leaf, &fake_ca, OffsetDateTime::now_utc()).unwrap_err();
        assert!(err.to_string().contains("not a CA"));
    }

    #[test]
    fn self_signed_roots_verify_against_themselves() {
        let ca = make_ca();
        verify_self_signed(&ca.cert, OffsetDateTime::now_utc()).unwrap();
        verify_certificate(&ca.cert, &ca.cert, OffsetDateTime::now_utc()).unwrap();
    }
}
