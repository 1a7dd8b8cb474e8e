//! PEM/DER conversion helpers shared by every artifact reader in the crate.

use crate::error::{KeyKitError, Result};

/// PEM label for X.509 certificates.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
/// PEM label for PKCS#10 certification requests.
pub const CSR_LABEL: &str = "CERTIFICATE REQUEST";
/// PEM label for unencrypted PKCS#8 private keys.
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
/// PEM label for PBES2-encrypted PKCS#8 private keys.
pub const ENCRYPTED_PRIVATE_KEY_LABEL: &str = "ENCRYPTED PRIVATE KEY";
/// PEM label for SubjectPublicKeyInfo public keys.
pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";
/// PEM label for legacy PKCS#1 RSA private keys.
pub const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
/// PEM label for legacy SEC1 EC private keys.
pub const EC_PRIVATE_KEY_LABEL: &str = "EC PRIVATE KEY";

/// Convert DER-encoded data into a PEM-encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new())
}

/// Convert a PEM-encoded string to DER-encoded bytes.
pub fn pem_to_der(pem_str: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str)?;
    Ok(pem.contents().to_vec())
}

/// Label of the first PEM block in the input.
pub fn pem_label(pem_str: &str) -> Result<String> {
    let pem = pem::parse(pem_str)?;
    Ok(pem.tag().to_string())
}

/// Whether the input looks like PEM text rather than raw DER.
pub fn looks_like_pem(data: &[u8]) -> bool {
    data.starts_with(b"-----BEGIN")
        || data
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .map(|i| data[i..].starts_with(b"-----BEGIN"))
            .unwrap_or(false)
}

/// Normalize artifact input to DER, expecting the given label when PEM.
///
/// Raw DER input passes through untouched.
pub fn to_der_expecting(data: &[u8], label: &str) -> Result<Vec<u8>> {
    if !looks_like_pem(data) {
        return Ok(data.to_vec());
    }
    let text = std::str::from_utf8(data)
        .map_err(|_| KeyKitError::DecodingError("PEM input is not valid UTF-8".to_string()))?;
    let pem = pem::parse(text)?;
    if pem.tag() != label {
        return Err(KeyKitError::DecodingError(format!(
            "Expected {} PEM block, got {}",
            label,
            pem.tag()
        )));
    }
    Ok(pem.contents().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pem_roundtrip_preserves_der() {
        let der = vec![0x30, 0x03, 0x02, 0x01, 0x01];
        let pem = der_to_pem(&der, CERTIFICATE_LABEL);
        assert!(pem.contains("BEGIN CERTIFICATE"));
        assert_eq!(pem_to_der(&pem).unwrap(), der);
    }

    #[test]
    fn sniffing_distinguishes_pem_from_der() {
        let der = vec![0x30, 0x03, 0x02, 0x01, 0x01];
        assert!(!looks_like_pem(&der));
        let pem = der_to_pem(&der, PRIVATE_KEY_LABEL);
        assert!(looks_like_pem(pem.as_bytes()));
        assert!(looks_like_pem(format!("\n  {pem}").as_bytes()));
    }

    #[test]
    fn label_mismatch_is_rejected() {
        let der = vec![0x30, 0x03, 0x02, 0x01, 0x01];
        let pem = der_to_pem(&der, CSR_LABEL);
        let err = to_der_expecting(pem.as_bytes(), CERTIFICATE_LABEL).unwrap_err();
        assert!(err.to_string().contains("CERTIFICATE REQUEST"));
    }
}
