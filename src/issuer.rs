use der::flagset::FlagSet;
use sha1::Sha1;
use x509_cert::certificate::CertificateInner;

use crate::cert::Certificate;
use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::AuthorityKeyIdentifier;
use crate::cert::extensions::BasicConstraints;
use crate::cert::extensions::ExtendedKeyUsage;
use crate::cert::extensions::ExtendedKeyUsageOption;
use crate::cert::extensions::KeyUsage;
use crate::cert::extensions::KeyUsages;
use crate::cert::extensions::SubjectKeyIdentifier;
use crate::cert::params::Validity;
use crate::cert::params::{CertificationRequestInfo, DistinguishedName, ExtensionParam};
use crate::error::{KeyKitError, Result};
use crate::key::KeyPair;
use crate::secrets;
use crate::tbs_certificate::TbsCertificate;

/// Represents an entity capable of issuing certificates.
pub trait Issuer {
    /// Returns the distinguished name of the issuer.
    fn issuer_name(&self) -> DistinguishedName;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Returns the serial number of the issuer's own certificate.
    fn serial_number(&self) -> Vec<u8>;

    /// Serial number for the next certificate this issuer signs.
    ///
    /// Self-signing issuers override this so the issued serial matches their
    /// own.
    fn next_serial(&self) -> Vec<u8> {
        secrets::random_serial()
    }

    /// Issues a certificate for the given request over the given validity
    /// period.
    ///
    /// The issued certificate carries BasicConstraints reflecting the
    /// request's `is_ca`, a SubjectKeyIdentifier for the subject key, an
    /// AuthorityKeyIdentifier naming this issuer, and KeyUsage/ExtendedKeyUsage
    /// derived from the requested usages. The serial number is freshly
    /// randomized.
    fn issue(
        &self,
        cert_request: &CertificationRequestInfo,
        validity: Validity,
    ) -> Result<Certificate> {
        let signature_algo = SignatureAlgorithm::for_key(self.signing_key());

        let issuer_spki = self.signing_key().as_spki()?;
        let issuer_key_id =
            <Sha1 as sha1::Digest>::digest(issuer_spki.subject_public_key.raw_bytes());
        let issuer_dn = self.issuer_name();

        let subject_spki = cert_request.subject_public_key.to_spki()?;
        let subject_key_id =
            <Sha1 as sha1::Digest>::digest(subject_spki.subject_public_key.raw_bytes());

        let authority_key_id = AuthorityKeyIdentifier {
            key_identifier: issuer_key_id.to_vec(),
            authority_cert_issuer: issuer_dn.clone(),
            authority_cert_serial_number: self.serial_number(),
        };

        let basic_constraints = BasicConstraints {
            is_ca: cert_request.is_ca,
            max_path_length: None,
        };

        let subject_key_identifier = SubjectKeyIdentifier {
            key_identifier: subject_key_id.to_vec(),
        };

        let mut extensions: Vec<ExtensionParam> = vec![
            ExtensionParam::from_extension(basic_constraints, true)?,
            ExtensionParam::from_extension(subject_key_identifier, false)?,
            ExtensionParam::from_extension(authority_key_id, false)?,
        ];

        let mut key_usage_flags: FlagSet<KeyUsages> = FlagSet::default();

        if cert_request.is_ca {
            key_usage_flags |= KeyUsages::KeyCertSign;
            key_usage_flags |= KeyUsages::CRLSign;
        }

        for usage in &cert_request.usages {
            match usage {
                ExtendedKeyUsageOption::ClientAuth
                | ExtendedKeyUsageOption::ServerAuth
                | ExtendedKeyUsageOption::EmailProtection => {
                    key_usage_flags |= KeyUsages::DigitalSignature;
                    key_usage_flags |= KeyUsages::KeyEncipherment;
                }
                ExtendedKeyUsageOption::CodeSigning
                | ExtendedKeyUsageOption::TimeStamping
                | ExtendedKeyUsageOption::OcspSigning => {
                    key_usage_flags |= KeyUsages::DigitalSignature;
                }
            }
        }

        if !key_usage_flags.is_empty() {
            let key_usage = KeyUsage(key_usage_flags);
            extensions.push(ExtensionParam::from_extension(key_usage, true)?);
        }

        if !cert_request.usages.is_empty() {
            let extended_key_usage = ExtendedKeyUsage {
                usage: cert_request.usages.clone(),
            };
            extensions.push(ExtensionParam::from_extension(extended_key_usage, true)?);
        }

        let combined_extensions = cert_request
            .extensions
            .iter()
            .cloned()
            .chain(extensions)
            .collect();

        let tbs_cert = TbsCertificate {
            serial_number: self.next_serial(),
            signature_algorithm: signature_algo.clone(),
            issuer: issuer_dn,
            validity,
            subject: cert_request.subject.clone(),
            subject_public_key: cert_request.subject_public_key.clone(),
            extensions: combined_extensions,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let tbs_der = tbs_cert.to_der()?;

        let signature = self.signing_key().sign_data(&tbs_der)?;

        let algorithm_id: x509_cert::spki::AlgorithmIdentifierOwned = signature_algo.into();
        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: algorithm_id,
            signature: der::asn1::BitString::from_bytes(&signature)
                .map_err(|e| KeyKitError::EncodingError(e.to_string()))?,
        };

        tracing::info!(
            subject = %cert_request.subject,
            is_ca = cert_request.is_ca,
            "issued certificate"
        );

        Ok(Certificate { inner: cert_inner })
    }
}
