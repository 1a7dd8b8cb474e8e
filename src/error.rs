//! Error types for the keykit library.

use thiserror::Error;

/// Represents errors that can occur in the keykit library.
#[derive(Debug, Error)]
pub enum KeyKitError {
    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error related to certificate operations.
    #[error("Certificate error: {0}")]
    CertificateError(String),

    /// Error related to certificate signing requests.
    #[error("CSR error: {0}")]
    CsrError(String),

    /// Signature creation or verification failure.
    #[error("Signature error: {0}")]
    SignatureError(String),

    /// Certificate verification failure with a definite reason.
    #[error("Verification failed: {0}")]
    VerificationError(String),

    /// TLS probe failure.
    #[error("Probe error: {0}")]
    ProbeError(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A specialized `Result` type for keykit operations.
pub type Result<T> = std::result::Result<T, KeyKitError>;

impl From<der::Error> for KeyKitError {
    fn from(err: der::Error) -> Self {
        KeyKitError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for KeyKitError {
    fn from(err: rsa::Error) -> Self {
        KeyKitError::KeyGenerationError(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for KeyKitError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        KeyKitError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::Error> for KeyKitError {
    fn from(err: pkcs8::Error) -> Self {
        KeyKitError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for KeyKitError {
    fn from(err: pkcs8::spki::Error) -> Self {
        KeyKitError::DecodingError(err.to_string())
    }
}

impl From<pem::PemError> for KeyKitError {
    fn from(err: pem::PemError) -> Self {
        KeyKitError::DecodingError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = KeyKitError::InvalidInput("bad subject".to_string());
        assert_eq!(err.to_string(), "Invalid input: bad subject");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KeyKitError>();
    }
}
