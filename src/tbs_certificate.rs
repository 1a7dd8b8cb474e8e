//! Assembly of the "To Be Signed" portion of an X.509 certificate.

use der::Encode;
use der::asn1::OctetString;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::serial_number::SerialNumber;

use crate::cert::SignatureAlgorithm;
use crate::cert::params::{DistinguishedName, ExtensionParam, Validity};
use crate::error::{KeyKitError, Result};
use crate::key::PublicKey;

/// The TBS portion of a certificate, in the crate's own vocabulary.
///
/// Holds everything needed to produce a valid v3 certificate body; signing
/// and outer assembly happen in [`crate::issuer`].
pub struct TbsCertificate {
    /// Certificate serial number
    pub serial_number: Vec<u8>,
    /// Certificate signature algorithm
    pub signature_algorithm: SignatureAlgorithm,
    /// Certificate issuer distinguished name
    pub issuer: DistinguishedName,
    /// Validity period
    pub validity: Validity,
    /// Certificate subject distinguished name
    pub subject: DistinguishedName,
    /// Subject's public key
    pub subject_public_key: PublicKey,
    /// Certificate extensions
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts into the `x509-cert` representation for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let algorithm_id: x509_cert::spki::AlgorithmIdentifierOwned =
            self.signature_algorithm.clone().into();

        let extensions = self
            .extensions
            .iter()
            .map(|ext| {
                Ok(x509_cert::ext::Extension {
                    extn_id: ext.oid,
                    critical: ext.critical,
                    extn_value: OctetString::new(ext.value.clone())
                        .map_err(|e| KeyKitError::EncodingError(e.to_string()))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // UTCTime covers dates through 2049, which all supported validity
        // horizons fall within.
        let not_before = x509_cert::time::Time::UtcTime(
            der::asn1::UtcTime::from_system_time(self.validity.not_before.into())
                .map_err(|e| KeyKitError::EncodingError(format!("notBefore: {e}")))?,
        );
        let not_after = x509_cert::time::Time::UtcTime(
            der::asn1::UtcTime::from_system_time(self.validity.not_after.into())
                .map_err(|e| KeyKitError::EncodingError(format!("notAfter: {e}")))?,
        );

        let validity = x509_cert::time::Validity {
            not_before,
            not_after,
        };

        let serial_number = SerialNumber::new(self.serial_number.as_slice())
            .map_err(|e| KeyKitError::EncodingError(format!("serial number: {e}")))?;

        let subject_public_key_info = self.subject_public_key.to_spki()?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: algorithm_id,
            issuer: self.issuer.as_x509_name()?,
            validity,
            subject: self.subject.as_x509_name()?,
            subject_public_key_info,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: Some(extensions),
        })
    }

    /// Reads a `TbsCertificate` back out of the `x509-cert` representation.
    pub fn from_tbs_certificate_inner(inner: TbsCertificateInner) -> Result<Self> {
        let issuer = DistinguishedName::from_x509_name(&inner.issuer);
        let subject = DistinguishedName::from_x509_name(&inner.subject);
        let subject_public_key = PublicKey::from_x509spki(&inner.subject_public_key_info)?;

        let extensions = inner
            .extensions
            .unwrap_or_default()
            .iter()
            .map(|ext| ExtensionParam {
                oid: ext.extn_id,
                critical: ext.critical,
                value: ext.extn_value.as_bytes().to_vec(),
            })
            .collect::<Vec<_>>();

        let not_before = decode_time(&inner.validity.not_before);
        let not_after = decode_time(&inner.validity.not_after);

        let signature_algorithm = SignatureAlgorithm::from_oid(inner.signature.oid)?;

        Ok(Self {
            serial_number: inner.serial_number.as_bytes().into(),
            signature_algorithm,
            issuer,
            validity: Validity {
                not_before,
                not_after,
            },
            subject,
            subject_public_key,
            extensions,
        })
    }

    /// Encodes into DER, ready for signing.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self
            .to_tbs_certificate_inner()?
            .to_der()
            .map_err(|e| KeyKitError::EncodingError(e.to_string()))?)
    }
}

pub(crate) fn decode_time(time: &x509_cert::time::Time) -> time::OffsetDateTime {
    match time {
        x509_cert::time::Time::UtcTime(ut) => time::OffsetDateTime::from(ut.to_system_time()),
        x509_cert::time::Time::GeneralTime(gt) => time::OffsetDateTime::from(gt.to_system_time()),
    }
}
