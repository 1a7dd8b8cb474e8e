use bon::Builder;
use const_oid::ObjectIdentifier;
use regex::Regex;
use time::Duration;
use time::OffsetDateTime;
use x509_cert::name::RdnSequence;

use super::extensions::ToAndFromX509Extension;
pub use crate::cert::extensions::ExtendedKeyUsage;
pub use crate::cert::extensions::ExtendedKeyUsageOption;
use crate::error::{KeyKitError, Result};
use crate::key::PublicKey;

/// Parameters for building an X.509 certificate or certification request.
///
/// # Fields
/// * `subject` - The distinguished name of the subject.
/// * `subject_public_key` - The public key of the subject.
/// * `usages` - A list of extended key usage options.
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `extensions` - Additional X.509 extensions.
#[derive(Clone, Debug, Builder)]
pub struct CertificationRequestInfo {
    pub subject: DistinguishedName,
    pub subject_public_key: PublicKey,
    #[builder(default)]
    pub usages: Vec<ExtendedKeyUsageOption>,
    #[builder(default)]
    pub is_ca: bool,
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
}

/// Distinguished name for certificate subjects and issuers.
///
/// Covers the six conventional attributes: CN, C, ST, L, O, OU.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// Parse an RFC 4514-style string such as `CN=server.local,O=Acme,C=US`.
    ///
    /// Attribute values containing commas are not supported.
    pub fn parse(input: &str) -> Result<Self> {
        let component = Regex::new(r"^\s*([A-Za-z]+)\s*=\s*(.+?)\s*$")
            .map_err(|e| KeyKitError::InvalidInput(e.to_string()))?;

        let mut dn = DistinguishedName::default();
        for part in input.split(',') {
            let caps = component.captures(part).ok_or_else(|| {
                KeyKitError::InvalidInput(format!("Malformed DN component: '{part}'"))
            })?;
            let value = caps[2].to_string();
            match caps[1].to_uppercase().as_str() {
                "CN" => dn.common_name = value,
                "C" => dn.country = Some(value),
                "ST" => dn.state = Some(value),
                "L" => dn.locality = Some(value),
                "O" => dn.organization = Some(value),
                "OU" => dn.organization_unit = Some(value),
                other => {
                    return Err(KeyKitError::InvalidInput(format!(
                        "Unsupported DN attribute: '{other}'"
                    )));
                }
            }
        }
        if dn.common_name.is_empty() {
            return Err(KeyKitError::InvalidInput(
                "Distinguished name must include a CN component".to_string(),
            ));
        }
        Ok(dn)
    }

    /// Converts the distinguished name to an X.509-compatible format.
    pub fn as_x509_name(&self) -> Result<x509_cert::name::DistinguishedName> {
        use core::str::FromStr;
        let mut components = vec![format!("CN={}", self.common_name)];
        if let Some(ou) = &self.organization_unit {
            components.push(format!("OU={ou}"));
        }
        if let Some(o) = &self.organization {
            components.push(format!("O={o}"));
        }
        if let Some(l) = &self.locality {
            components.push(format!("L={l}"));
        }
        if let Some(st) = &self.state {
            components.push(format!("ST={st}"));
        }
        if let Some(c) = &self.country {
            components.push(format!("C={c}"));
        }
        RdnSequence::from_str(&components.join(",")).map_err(|e| {
            KeyKitError::EncodingError(format!("Invalid distinguished name: {e}"))
        })
    }

    /// Creates a `DistinguishedName` from an X.509 name.
    ///
    /// Attributes outside the six supported ones are ignored.
    pub fn from_x509_name(x509dn: &x509_cert::name::DistinguishedName) -> Self {
        let mut dn = DistinguishedName::default();

        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let Some(value) = decode_attribute_value(&attr.value) else {
                    continue;
                };
                match attr.oid.to_string().as_str() {
                    "2.5.4.3" => dn.common_name = value,
                    "2.5.4.6" => dn.country = Some(value),
                    "2.5.4.8" => dn.state = Some(value),
                    "2.5.4.7" => dn.locality = Some(value),
                    "2.5.4.10" => dn.organization = Some(value),
                    "2.5.4.11" => dn.organization_unit = Some(value),
                    _ => {}
                }
            }
        }

        dn
    }
}

impl std::fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CN={}", self.common_name)?;
        for (key, value) in [
            ("OU", &self.organization_unit),
            ("O", &self.organization),
            ("L", &self.locality),
            ("ST", &self.state),
            ("C", &self.country),
        ] {
            if let Some(value) = value {
                write!(f, ", {key}={value}")?;
            }
        }
        Ok(())
    }
}

/// String forms an X.509 attribute value may arrive in.
fn decode_attribute_value(value: &der::Any) -> Option<String> {
    if let Ok(s) = value.decode_as::<String>() {
        return Some(s);
    }
    if let Ok(s) = value.decode_as::<der::asn1::PrintableStringRef<'_>>() {
        return Some(s.to_string());
    }
    if let Ok(s) = value.decode_as::<der::asn1::Ia5StringRef<'_>>() {
        return Some(s.to_string());
    }
    None
}

/// Certificate validity period.
///
/// Represents the `notBefore` and `notAfter` fields in a certificate.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    pub fn for_days(days: i64) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            not_before: now,
            not_after: now + Duration::days(days),
        }
    }

    /// Whether the period contains the given instant.
    pub fn contains(&self, at: OffsetDateTime) -> bool {
        self.not_before <= at && at <= self.not_after
    }

    /// Whether the period ends within `window` of the given instant.
    ///
    /// An already-expired period always reports true.
    pub fn expires_within(&self, at: OffsetDateTime, window: Duration) -> bool {
        self.not_after <= at + window
    }
}

/// Represents an X.509 extension as an opaque OID + DER value.
#[derive(Clone, Debug)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a typed extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: E, critical: bool) -> Result<Self> {
        let value = extension.to_x509_extension_value()?;
        Ok(Self {
            oid: E::OID,
            critical,
            value,
        })
    }

    /// Decodes this `ExtensionParam` into a typed extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dn_parse_and_display_roundtrip() {
        let dn = DistinguishedName::parse("CN=server.local, O=Acme Corp, C=US").unwrap();
        assert_eq!(dn.common_name, "server.local");
        assert_eq!(dn.organization.as_deref(), Some("Acme Corp"));
        assert_eq!(dn.country.as_deref(), Some("US"));
        assert_eq!(dn.to_string(), "CN=server.local, O=Acme Corp, C=US");
    }

    #[test]
    fn dn_parse_requires_cn() {
        assert!(DistinguishedName::parse("O=Acme").is_err());
        assert!(DistinguishedName::parse("CN=").is_err());
        assert!(DistinguishedName::parse("UID=zero").is_err());
    }

    #[test]
    fn dn_x509_roundtrip() {
        let dn = DistinguishedName::builder()
            .common_name("myca.local".to_string())
            .organization("Acme".to_string())
            .country("US".to_string())
            .build();
        let x509 = dn.as_x509_name().unwrap();
        let restored = DistinguishedName::from_x509_name(&x509);
        assert_eq!(restored.common_name, "myca.local");
        assert_eq!(restored.organization.as_deref(), Some("Acme"));
        assert_eq!(restored.country.as_deref(), Some("US"));
    }

    #[test]
    fn validity_window_checks() {
        let validity = Validity::for_days(30);
        let now = OffsetDateTime::now_utc();
        assert!(validity.contains(now));
        assert!(!validity.contains(now + Duration::days(31)));
        assert!(validity.expires_within(now, Duration::days(31)));
        assert!(!validity.expires_within(now, Duration::days(7)));

        let expired = Validity {
            not_before: now - Duration::days(10),
            not_after: now - Duration::days(1),
        };
        assert!(expired.expires_within(now, Duration::days(0)));
    }
}
