//! PKCS#10 certification request handling.
//!
//! A CSR carries the subject, the subject's public key, and any requested
//! extensions (wrapped in the PKCS#9 `extensionRequest` attribute), all
//! self-signed by the subject key.

use der::asn1::SetOfVec;
use der::{Any, Decode, Encode};
use x509_cert::attr::Attribute;
use x509_cert::ext::Extension;
use x509_cert::request::{CertReq, CertReqInfo, Version};

use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::{
    BasicConstraints, ExtendedKeyUsage, SubjectAltName, ToAndFromX509Extension,
};
use crate::cert::params::{CertificationRequestInfo, DistinguishedName, ExtensionParam};
use crate::error::{KeyKitError, Result};
use crate::key::{KeyPair, PublicKey};
use crate::pem_utils::{self, CSR_LABEL};

/// OID of the PKCS#9 extensionRequest attribute.
const EXTENSION_REQUEST_OID: der::oid::ObjectIdentifier =
    der::oid::ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.14");

/// Represents a PKCS#10 certificate signing request.
#[derive(Debug, Clone)]
pub struct CertSigningRequest {
    /// The inner representation of the request.
    pub inner: CertReq,
}

impl CertSigningRequest {
    /// Builds and signs a CSR for the given request info.
    ///
    /// The request's extensions, extended key usages, and CA flag are all
    /// carried in a single `extensionRequest` attribute.
    pub fn new(cert_info: &CertificationRequestInfo, key: &KeyPair) -> Result<Self> {
        let mut requested: Vec<ExtensionParam> = cert_info.extensions.clone();

        if !cert_info.usages.is_empty() {
            let eku = ExtendedKeyUsage {
                usage: cert_info.usages.clone(),
            };
            requested.push(ExtensionParam::from_extension(eku, true)?);
        }

        if cert_info.is_ca {
            let bc = BasicConstraints {
                is_ca: true,
                max_path_length: None,
            };
            requested.push(ExtensionParam::from_extension(bc, true)?);
        }

        let mut attributes = SetOfVec::new();
        if !requested.is_empty() {
            let extensions = requested
                .iter()
                .map(|ext| {
                    Ok(Extension {
                        extn_id: ext.oid,
                        critical: ext.critical,
                        extn_value: der::asn1::OctetString::new(ext.value.clone())
                            .map_err(|e| KeyKitError::EncodingError(e.to_string()))?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let extensions_der = extensions
                .to_der()
                .map_err(|e| KeyKitError::EncodingError(e.to_string()))?;
            let value = Any::from_der(&extensions_der)
                .map_err(|e| KeyKitError::EncodingError(e.to_string()))?;

            let mut values = SetOfVec::new();
            values
                .insert_ordered(value)
                .map_err(|e| KeyKitError::EncodingError(e.to_string()))?;
            attributes
                .insert_ordered(Attribute {
                    oid: EXTENSION_REQUEST_OID,
                    values,
                })
                .map_err(|e| KeyKitError::EncodingError(e.to_string()))?;
        }

        let info = CertReqInfo {
            version: Version::V1,
            subject: cert_info.subject.as_x509_name()?,
            public_key: cert_info.subject_public_key.to_spki()?,
            attributes,
        };

        let info_der = info
            .to_der()
            .map_err(|e| KeyKitError::EncodingError(e.to_string()))?;
        let signature = key.sign_data(&info_der)?;

        let algorithm: x509_cert::spki::AlgorithmIdentifierOwned =
            SignatureAlgorithm::for_key(key).into();

        tracing::info!(subject = %cert_info.subject, "created certificate signing request");

        Ok(Self {
            inner: CertReq {
                info,
                algorithm,
                signature: der::asn1::BitString::from_bytes(&signature)
                    .map_err(|e| KeyKitError::EncodingError(e.to_string()))?,
            },
        })
    }

    /// Encodes the request into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| KeyKitError::EncodingError(e.to_string()))
    }

    /// Encodes the request into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        Ok(pem_utils::der_to_pem(&self.to_der()?, CSR_LABEL))
    }

    /// Decodes a request from DER bytes.
    pub fn from_der(der_bytes: &[u8]) -> Result<Self> {
        let inner =
            CertReq::from_der(der_bytes).map_err(|e| KeyKitError::DecodingError(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Decodes a request from PEM or DER input (auto-detected).
    pub fn load(data: &[u8]) -> Result<Self> {
        let der = pem_utils::to_der_expecting(data, CSR_LABEL)?;
        Self::from_der(&der)
    }

    /// The requested extensions, decoded from the extensionRequest attribute.
    ///
    /// A CSR without the attribute yields an empty list.
    pub fn requested_extensions(&self) -> Result<Vec<ExtensionParam>> {
        let Some(attr) = self
            .inner
            .info
            .attributes
            .iter()
            .find(|attr| attr.oid == EXTENSION_REQUEST_OID)
        else {
            return Ok(Vec::new());
        };

        let Some(value) = attr.values.iter().next() else {
            return Ok(Vec::new());
        };

        let value_der = value
            .to_der()
            .map_err(|e| KeyKitError::DecodingError(e.to_string()))?;
        let extensions = Vec::<Extension>::from_der(&value_der)
            .map_err(|e| KeyKitError::DecodingError(format!("extensionRequest: {e}")))?;

        Ok(extensions
            .iter()
            .map(|ext| ExtensionParam {
                oid: ext.extn_id,
                critical: ext.critical,
                value: ext.extn_value.as_bytes().to_vec(),
            })
            .collect())
    }

    /// The requested subject alternative names, if any.
    pub fn subject_alt_name(&self) -> Result<Option<SubjectAltName>> {
        for ext in self.requested_extensions()? {
            if ext.oid == SubjectAltName::OID {
                return Ok(Some(ext.to_extension()?));
            }
        }
        Ok(None)
    }

    /// Recovers issuance parameters from the request.
    ///
    /// Requested EKUs and the CA flag are folded back into the info so an
    /// [`crate::issuer::Issuer`] can sign it directly; remaining requested
    /// extensions ride along untouched.
    pub fn to_cert_info(&self) -> Result<CertificationRequestInfo> {
        let subject = DistinguishedName::from_x509_name(&self.inner.info.subject);
        let subject_public_key = PublicKey::from_x509spki(&self.inner.info.public_key)?;

        let mut usages = Vec::new();
        let mut is_ca = false;
        let mut extensions = Vec::new();

        for ext in self.requested_extensions()? {
            if ext.oid == ExtendedKeyUsage::OID {
                let eku: ExtendedKeyUsage = ext.to_extension()?;
                usages = eku.usage;
            } else if ext.oid == BasicConstraints::OID {
                let bc: BasicConstraints = ext.to_extension()?;
                is_ca = bc.is_ca;
            } else {
                extensions.push(ext);
            }
        }

        Ok(CertificationRequestInfo {
            subject,
            subject_public_key,
            usages,
            is_ca,
            extensions,
        })
    }

    /// Checks the request's self-signature against the embedded public key.
    pub fn verify_signature(&self) -> Result<()> {
        let info_der = self
            .inner
            .info
            .to_der()
            .map_err(|e| KeyKitError::EncodingError(e.to_string()))?;
        let public_key = PublicKey::from_x509spki(&self.inner.info.public_key)?;
        let signature = self.inner.signature.raw_bytes();
        public_key
            .verify_signature(&info_der, signature)
            .map_err(|_| {
                KeyKitError::CsrError(
                    "Request signature does not verify against its public key".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::extensions::SanEntry;

    fn request_info(key: &KeyPair) -> CertificationRequestInfo {
        let san = SubjectAltName {
            entries: vec![
                SanEntry::Dns("api.example.com".to_string()),
                SanEntry::Ip("192.0.2.7".parse().unwrap()),
            ],
        };
        CertificationRequestInfo::builder()
            .subject(DistinguishedName::parse("CN=api.example.com,O=Example").unwrap())
            .subject_public_key(PublicKey::from_key_pair(key))
            .usages(vec![crate::cert::extensions::ExtendedKeyUsageOption::ServerAuth])
            .extensions(vec![
                ExtensionParam::from_extension(san, false).unwrap(),
            ])
            .build()
    }

    #[test]
    fn csr_roundtrip_preserves_subject_and_extensions() {
        let key = KeyPair::generate_ecdsa_p256();
        let csr = CertSigningRequest::new(&request_info(&key), &key).unwrap();

        let pem = csr.to_pem().unwrap();
        assert!(pem.contains("BEGIN CERTIFICATE REQUEST"));

        let restored = CertSigningRequest::load(pem.as_bytes()).unwrap();
        restored.verify_signature().unwrap();

        let info = restored.to_cert_info().unwrap();
        assert_eq!(info.subject.common_name, "api.example.com");
        assert_eq!(
            info.usages,
            vec![crate::cert::extensions::ExtendedKeyUsageOption::ServerAuth]
        );
        assert!(!info.is_ca);

        let san = restored.subject_alt_name().unwrap().unwrap();
        assert_eq!(san.entries.len(), 2);
    }

    #[test]
    fn csr_without_attributes_has_no_requested_extensions() {
        let key = KeyPair::generate_ed25519();
        let info = CertificationRequestInfo::builder()
            .subject(DistinguishedName::parse("CN=bare").unwrap())
            .subject_public_key(PublicKey::from_key_pair(&key))
            .build();
        let csr = CertSigningRequest::new(&info, &key).unwrap();
        assert!(csr.requested_extensions().unwrap().is_empty());
        assert!(csr.subject_alt_name().unwrap().is_none());
    }

    #[test]
    fn tampered_csr_fails_verification() {
        let key = KeyPair::generate_ecdsa_p256();
        let other = KeyPair::generate_ecdsa_p256();
        let mut csr = CertSigningRequest::new(&request_info(&key), &key).unwrap();

        // Swap in an unrelated public key; the signature must no longer match.
        csr.inner.info.public_key = PublicKey::from_key_pair(&other).to_spki().unwrap();
        assert!(csr.verify_signature().is_err());
    }
}
