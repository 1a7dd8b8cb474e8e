//! Key generation, import/export, and signing primitives.
//!
//! Every key the toolkit handles is normalized into [`KeyPair`] (private) or
//! [`PublicKey`] (public), regardless of which on-disk encoding it came from:
//! PKCS#8 (plain or PBES2-encrypted), legacy PKCS#1 RSA, or legacy SEC1 EC.

use ed25519_dalek::SigningKey as Ed25519SigningKey;
use ed25519_dalek::VerifyingKey as Ed25519VerifyingKey;
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{SigningKey as P384SigningKey, VerifyingKey as P384VerifyingKey};
use p521::ecdsa::{SigningKey as P521SigningKey, VerifyingKey as P521VerifyingKey};
use pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use der::{Decode, Encode};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::{KeyKitError, Result};
use crate::pem_utils::{
    self, EC_PRIVATE_KEY_LABEL, ENCRYPTED_PRIVATE_KEY_LABEL, PRIVATE_KEY_LABEL, PUBLIC_KEY_LABEL,
    RSA_PRIVATE_KEY_LABEL,
};

/// Key algorithms the toolkit can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa2048,
    Rsa3072,
    Rsa4096,
    EcdsaP256,
    EcdsaP384,
    EcdsaP521,
    Ed25519,
}

impl std::str::FromStr for KeyAlgorithm {
    type Err = KeyKitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rsa2048" | "rsa" => Ok(KeyAlgorithm::Rsa2048),
            "rsa3072" => Ok(KeyAlgorithm::Rsa3072),
            "rsa4096" => Ok(KeyAlgorithm::Rsa4096),
            "p256" | "prime256v1" | "secp256r1" => Ok(KeyAlgorithm::EcdsaP256),
            "p384" | "secp384r1" => Ok(KeyAlgorithm::EcdsaP384),
            "p521" | "secp521r1" => Ok(KeyAlgorithm::EcdsaP521),
            "ed25519" => Ok(KeyAlgorithm::Ed25519),
            other => Err(KeyKitError::InvalidInput(format!(
                "Unknown key algorithm: '{other}'. Use rsa2048, rsa3072, rsa4096, p256, p384, p521, or ed25519"
            ))),
        }
    }
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            KeyAlgorithm::Rsa2048 => "rsa2048",
            KeyAlgorithm::Rsa3072 => "rsa3072",
            KeyAlgorithm::Rsa4096 => "rsa4096",
            KeyAlgorithm::EcdsaP256 => "p256",
            KeyAlgorithm::EcdsaP384 => "p384",
            KeyAlgorithm::EcdsaP521 => "p521",
            KeyAlgorithm::Ed25519 => "ed25519",
        };
        f.write_str(name)
    }
}

/// Supported private key types.
pub enum KeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    EcdsaP256 {
        signing_key: P256SigningKey,
        verifying_key: P256VerifyingKey,
    },
    EcdsaP384 {
        signing_key: P384SigningKey,
        verifying_key: P384VerifyingKey,
    },
    EcdsaP521 {
        signing_key: P521SigningKey,
        verifying_key: P521VerifyingKey,
    },
    Ed25519 {
        signing_key: Ed25519SigningKey,
    },
}

impl KeyPair {
    /// Generate a key pair for the given algorithm.
    pub fn generate(algorithm: KeyAlgorithm) -> Result<Self> {
        tracing::debug!(algorithm = %algorithm, "generating key pair");
        match algorithm {
            KeyAlgorithm::Rsa2048 => Self::generate_rsa(2048),
            KeyAlgorithm::Rsa3072 => Self::generate_rsa(3072),
            KeyAlgorithm::Rsa4096 => Self::generate_rsa(4096),
            KeyAlgorithm::EcdsaP256 => Ok(Self::generate_ecdsa_p256()),
            KeyAlgorithm::EcdsaP384 => Ok(Self::generate_ecdsa_p384()),
            KeyAlgorithm::EcdsaP521 => Ok(Self::generate_ecdsa_p521()),
            KeyAlgorithm::Ed25519 => Ok(Self::generate_ed25519()),
        }
    }

    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)?;
        let public = RsaPublicKey::from(&private);
        Ok(KeyPair::Rsa {
            private: Box::new(private),
            public,
        })
    }

    /// Generate an ECDSA P-256 key pair.
    pub fn generate_ecdsa_p256() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = P256SigningKey::random(&mut rng);
        let verifying_key = signing_key.verifying_key().to_owned();
        KeyPair::EcdsaP256 {
            signing_key,
            verifying_key,
        }
    }

    /// Generate an ECDSA P-384 key pair.
    pub fn generate_ecdsa_p384() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = P384SigningKey::random(&mut rng);
        let verifying_key = signing_key.verifying_key().to_owned();
        KeyPair::EcdsaP384 {
            signing_key,
            verifying_key,
        }
    }

    /// Generate an ECDSA P-521 key pair.
    pub fn generate_ecdsa_p521() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = P521SigningKey::random(&mut rng);
        let verifying_key = P521VerifyingKey::from(&signing_key);
        KeyPair::EcdsaP521 {
            signing_key,
            verifying_key,
        }
    }

    /// Generate an Ed25519 key pair.
    pub fn generate_ed25519() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = Ed25519SigningKey::generate(&mut rng);
        KeyPair::Ed25519 { signing_key }
    }

    /// Human-readable algorithm name, e.g. `RSA-2048` or `ECDSA P-256`.
    pub fn algorithm_name(&self) -> String {
        use rsa::traits::PublicKeyParts;
        match self {
            KeyPair::Rsa { private, .. } => format!("RSA-{}", private.size() * 8),
            KeyPair::EcdsaP256 { .. } => "ECDSA P-256".to_string(),
            KeyPair::EcdsaP384 { .. } => "ECDSA P-384".to_string(),
            KeyPair::EcdsaP521 { .. } => "ECDSA P-521".to_string(),
            KeyPair::Ed25519 { .. } => "Ed25519".to_string(),
        }
    }

    /// SubjectPublicKeyInfo for the key's public half.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        PublicKey::from_key_pair(self).to_spki()
    }

    /// Sign arbitrary data with the algorithm-appropriate scheme.
    ///
    /// RSA uses PKCS#1 v1.5 with SHA-256; ECDSA produces ASN.1 DER signatures
    /// with the curve-matched digest; Ed25519 is pure EdDSA.
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            KeyPair::Rsa { private, .. } => {
                use rsa::signature::{SignatureEncoding, Signer};
                let signing_key: rsa::pkcs1v15::SigningKey<sha2::Sha256> =
                    rsa::pkcs1v15::SigningKey::new(*private.clone());
                let signature = signing_key.sign(data);
                Ok(signature.to_vec())
            }
            KeyPair::EcdsaP256 { signing_key, .. } => {
                use p256::ecdsa::signature::Signer;
                let signature: p256::ecdsa::Signature = signing_key.sign(data);
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::EcdsaP384 { signing_key, .. } => {
                use p384::ecdsa::signature::Signer;
                let signature: p384::ecdsa::Signature = signing_key.sign(data);
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::EcdsaP521 { signing_key, .. } => {
                use p521::ecdsa::signature::Signer;
                let signature: p521::ecdsa::Signature = signing_key.sign(data);
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::Ed25519 { signing_key } => {
                use ed25519_dalek::Signer;
                let signature = signing_key.sign(data);
                Ok(signature.to_bytes().to_vec())
            }
        }
    }

    /// Export as unencrypted PKCS#8 DER.
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let doc = match self {
            KeyPair::Rsa { private, .. } => private.to_pkcs8_der(),
            KeyPair::EcdsaP256 { signing_key, .. } => signing_key.to_pkcs8_der(),
            KeyPair::EcdsaP384 { signing_key, .. } => signing_key.to_pkcs8_der(),
            KeyPair::EcdsaP521 { signing_key, .. } => {
                p521::SecretKey::from(signing_key.as_nonzero_scalar()).to_pkcs8_der()
            }
            KeyPair::Ed25519 { signing_key } => signing_key.to_pkcs8_der(),
        }?;
        Ok(doc.as_bytes().to_vec())
    }

    /// Export as unencrypted PKCS#8 PEM (`PRIVATE KEY`).
    pub fn to_pkcs8_pem(&self) -> Result<String> {
        Ok(pem_utils::der_to_pem(
            &self.to_pkcs8_der()?,
            PRIVATE_KEY_LABEL,
        ))
    }

    /// Export as PBES2-encrypted PKCS#8 DER under the given passphrase.
    pub fn to_pkcs8_encrypted_der(&self, passphrase: &str) -> Result<Vec<u8>> {
        let rng = rand_core::OsRng;
        let doc = match self {
            KeyPair::Rsa { private, .. } => private.to_pkcs8_encrypted_der(rng, passphrase),
            KeyPair::EcdsaP256 { signing_key, .. } => {
                signing_key.to_pkcs8_encrypted_der(rng, passphrase)
            }
            KeyPair::EcdsaP384 { signing_key, .. } => {
                signing_key.to_pkcs8_encrypted_der(rng, passphrase)
            }
            KeyPair::EcdsaP521 { signing_key, .. } => p521::SecretKey::from(
                signing_key.as_nonzero_scalar(),
            )
            .to_pkcs8_encrypted_der(rng, passphrase),
            KeyPair::Ed25519 { signing_key } => {
                signing_key.to_pkcs8_encrypted_der(rng, passphrase)
            }
        }?;
        Ok(doc.as_bytes().to_vec())
    }

    /// Export as PBES2-encrypted PKCS#8 PEM (`ENCRYPTED PRIVATE KEY`).
    pub fn to_pkcs8_encrypted_pem(&self, passphrase: &str) -> Result<String> {
        Ok(pem_utils::der_to_pem(
            &self.to_pkcs8_encrypted_der(passphrase)?,
            ENCRYPTED_PRIVATE_KEY_LABEL,
        ))
    }

    /// Import from unencrypted PKCS#8 DER, dispatching on the algorithm OID.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = pkcs8::PrivateKeyInfo::try_from(der)?;
        let oid = info.algorithm.oid;

        if oid == const_oid::db::rfc5912::RSA_ENCRYPTION {
            let private = RsaPrivateKey::from_pkcs8_der(der)?;
            let public = RsaPublicKey::from(&private);
            return Ok(KeyPair::Rsa {
                private: Box::new(private),
                public,
            });
        }

        if oid == const_oid::db::rfc5912::ID_EC_PUBLIC_KEY {
            let curve = info.algorithm.parameters_oid()?;
            return match curve {
                const_oid::db::rfc5912::SECP_256_R_1 => {
                    let signing_key = P256SigningKey::from_pkcs8_der(der)?;
                    let verifying_key = signing_key.verifying_key().to_owned();
                    Ok(KeyPair::EcdsaP256 {
                        signing_key,
                        verifying_key,
                    })
                }
                const_oid::db::rfc5912::SECP_384_R_1 => {
                    let signing_key = P384SigningKey::from_pkcs8_der(der)?;
                    let verifying_key = signing_key.verifying_key().to_owned();
                    Ok(KeyPair::EcdsaP384 {
                        signing_key,
                        verifying_key,
                    })
                }
                const_oid::db::rfc5912::SECP_521_R_1 => {
                    let secret = p521::SecretKey::from_pkcs8_der(der)?;
                    let signing_key = P521SigningKey::from_bytes(&secret.to_bytes())
                        .map_err(|e| KeyKitError::DecodingError(e.to_string()))?;
                    let verifying_key = P521VerifyingKey::from(&signing_key);
                    Ok(KeyPair::EcdsaP521 {
                        signing_key,
                        verifying_key,
                    })
                }
                other => Err(KeyKitError::DecodingError(format!(
                    "Unsupported EC curve OID: {other}"
                ))),
            };
        }

        if oid == const_oid::db::rfc8410::ID_ED_25519 {
            let signing_key = Ed25519SigningKey::from_pkcs8_der(der)?;
            return Ok(KeyPair::Ed25519 { signing_key });
        }

        Err(KeyKitError::DecodingError(format!(
            "Unsupported private key algorithm OID: {oid}"
        )))
    }

    /// Import from unencrypted PKCS#8 PEM.
    pub fn from_pkcs8_pem(pem_str: &str) -> Result<Self> {
        let der = pem_utils::to_der_expecting(pem_str.as_bytes(), PRIVATE_KEY_LABEL)?;
        Self::from_pkcs8_der(&der)
    }

    /// Import from PBES2-encrypted PKCS#8 DER.
    pub fn from_pkcs8_encrypted_der(der: &[u8], passphrase: &str) -> Result<Self> {
        let encrypted = pkcs8::EncryptedPrivateKeyInfo::try_from(der)?;
        let plain = encrypted
            .decrypt(passphrase)
            .map_err(|e| KeyKitError::DecodingError(format!("Key decryption failed: {e}")))?;
        Self::from_pkcs8_der(plain.as_bytes())
    }

    /// Import from PBES2-encrypted PKCS#8 PEM.
    pub fn from_pkcs8_encrypted_pem(pem_str: &str, passphrase: &str) -> Result<Self> {
        let der = pem_utils::to_der_expecting(pem_str.as_bytes(), ENCRYPTED_PRIVATE_KEY_LABEL)?;
        Self::from_pkcs8_encrypted_der(&der, passphrase)
    }

    /// Import a legacy PKCS#1 `RSA PRIVATE KEY` (DER).
    pub fn from_pkcs1_der(der: &[u8]) -> Result<Self> {
        let private = RsaPrivateKey::from_pkcs1_der(der)?;
        let public = RsaPublicKey::from(&private);
        Ok(KeyPair::Rsa {
            private: Box::new(private),
            public,
        })
    }

    /// Import a legacy SEC1 `EC PRIVATE KEY` (DER), trying each supported curve.
    ///
    /// SEC1 files name their curve in an inner parameter, so decoding against
    /// the wrong curve fails cleanly and the next one is tried.
    pub fn from_sec1_der(der: &[u8]) -> Result<Self> {
        if let Ok(secret) = p256::SecretKey::from_sec1_der(der) {
            let signing_key = P256SigningKey::from(&secret);
            let verifying_key = signing_key.verifying_key().to_owned();
            return Ok(KeyPair::EcdsaP256 {
                signing_key,
                verifying_key,
            });
        }
        if let Ok(secret) = p384::SecretKey::from_sec1_der(der) {
            let signing_key = P384SigningKey::from(&secret);
            let verifying_key = signing_key.verifying_key().to_owned();
            return Ok(KeyPair::EcdsaP384 {
                signing_key,
                verifying_key,
            });
        }
        if let Ok(secret) = p521::SecretKey::from_sec1_der(der) {
            let signing_key = P521SigningKey::from_bytes(&secret.to_bytes())
                .map_err(|e| KeyKitError::DecodingError(e.to_string()))?;
            let verifying_key = P521VerifyingKey::from(&signing_key);
            return Ok(KeyPair::EcdsaP521 {
                signing_key,
                verifying_key,
            });
        }
        Err(KeyKitError::DecodingError(
            "EC private key does not use a supported curve (P-256, P-384, P-521)".to_string(),
        ))
    }

    /// Load a private key from raw bytes, accepting PKCS#8 (plain or
    /// encrypted), PKCS#1, and SEC1, in PEM or DER.
    ///
    /// `passphrase` is only consulted for encrypted PKCS#8 input.
    pub fn load(data: &[u8], passphrase: Option<&str>) -> Result<Self> {
        if pem_utils::looks_like_pem(data) {
            let text = std::str::from_utf8(data).map_err(|_| {
                KeyKitError::DecodingError("PEM input is not valid UTF-8".to_string())
            })?;
            let label = pem_utils::pem_label(text)?;
            let der = pem_utils::pem_to_der(text)?;
            return match label.as_str() {
                PRIVATE_KEY_LABEL => Self::from_pkcs8_der(&der),
                ENCRYPTED_PRIVATE_KEY_LABEL => {
                    let passphrase = passphrase.ok_or_else(|| {
                        KeyKitError::InvalidInput(
                            "Key is encrypted; a passphrase is required".to_string(),
                        )
                    })?;
                    Self::from_pkcs8_encrypted_der(&der, passphrase)
                }
                RSA_PRIVATE_KEY_LABEL => Self::from_pkcs1_der(&der),
                EC_PRIVATE_KEY_LABEL => Self::from_sec1_der(&der),
                other => Err(KeyKitError::DecodingError(format!(
                    "Unexpected PEM label for a private key: {other}"
                ))),
            };
        }

        // Raw DER: try PKCS#8 first, then the legacy encodings.
        Self::from_pkcs8_der(data)
            .or_else(|_| match passphrase {
                Some(p) => Self::from_pkcs8_encrypted_der(data, p),
                None => Err(KeyKitError::DecodingError("not encrypted".to_string())),
            })
            .or_else(|_| Self::from_pkcs1_der(data))
            .or_else(|_| Self::from_sec1_der(data))
            .map_err(|_| {
                KeyKitError::DecodingError(
                    "Input is not a recognized private key encoding".to_string(),
                )
            })
    }
}

/// Supported public key types.
#[derive(Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(P256VerifyingKey),
    EcdsaP384(P384VerifyingKey),
    EcdsaP521(P521VerifyingKey),
    Ed25519(Ed25519VerifyingKey),
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublicKey::Rsa(key) => f.debug_tuple("Rsa").field(key).finish(),
            PublicKey::EcdsaP256(key) => f.debug_tuple("EcdsaP256").field(key).finish(),
            PublicKey::EcdsaP384(key) => f.debug_tuple("EcdsaP384").field(key).finish(),
            // `p521`'s `VerifyingKey` newtype does not implement `Debug`; show its
            // SEC1 encoded point, which is the same data a derived impl would print.
            PublicKey::EcdsaP521(key) => f
                .debug_tuple("EcdsaP521")
                .field(&key.to_encoded_point(false))
                .finish(),
            PublicKey::Ed25519(key) => f.debug_tuple("Ed25519").field(key).finish(),
        }
    }
}

impl PublicKey {
    /// Extract the public half of a key pair.
    pub fn from_key_pair(key_pair: &KeyPair) -> Self {
        match key_pair {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            KeyPair::EcdsaP256 { verifying_key, .. } => PublicKey::EcdsaP256(*verifying_key),
            KeyPair::EcdsaP384 { verifying_key, .. } => PublicKey::EcdsaP384(*verifying_key),
            KeyPair::EcdsaP521 { verifying_key, .. } => PublicKey::EcdsaP521(verifying_key.clone()),
            KeyPair::Ed25519 { signing_key } => PublicKey::Ed25519(signing_key.verifying_key()),
        }
    }

    /// Human-readable algorithm name.
    pub fn algorithm_name(&self) -> String {
        match self {
            PublicKey::Rsa(public) => {
                use rsa::traits::PublicKeyParts;
                format!("RSA-{}", public.size() * 8)
            }
            PublicKey::EcdsaP256(_) => "ECDSA P-256".to_string(),
            PublicKey::EcdsaP384(_) => "ECDSA P-384".to_string(),
            PublicKey::EcdsaP521(_) => "ECDSA P-521".to_string(),
            PublicKey::Ed25519(_) => "Ed25519".to_string(),
        }
    }

    /// Encode as a SubjectPublicKeyInfo structure.
    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let spki = match self {
            PublicKey::Rsa(public) => SubjectPublicKeyInfoOwned::from_key(public.clone()),
            PublicKey::EcdsaP256(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key)
            }
            PublicKey::EcdsaP384(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key)
            }
            PublicKey::EcdsaP521(verifying_key) => {
                // `p521`'s `VerifyingKey` newtype does not implement `EncodePublicKey`;
                // convert to `p521::PublicKey`, which encodes the identical SPKI.
                p521::PublicKey::from_affine(*verifying_key.as_affine())
                    .map_err(|_| x509_cert::spki::Error::KeyMalformed)
                    .and_then(SubjectPublicKeyInfoOwned::from_key)
            }
            PublicKey::Ed25519(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key)
            }
        }?;
        Ok(spki)
    }

    /// Encode as SPKI DER.
    pub fn to_spki_der(&self) -> Result<Vec<u8>> {
        Ok(self
            .to_spki()?
            .to_der()
            .map_err(|e| KeyKitError::EncodingError(e.to_string()))?)
    }

    /// Encode as SPKI PEM (`PUBLIC KEY`).
    pub fn to_spki_pem(&self) -> Result<String> {
        Ok(pem_utils::der_to_pem(&self.to_spki_der()?, PUBLIC_KEY_LABEL))
    }

    /// Decode from a SubjectPublicKeyInfo structure.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        use rsa::pkcs1::DecodeRsaPublicKey;

        let oid = spki.algorithm.oid;
        let key_bytes = spki.subject_public_key.raw_bytes();

        if oid == const_oid::db::rfc5912::RSA_ENCRYPTION {
            let public = RsaPublicKey::from_pkcs1_der(key_bytes)?;
            return Ok(PublicKey::Rsa(public));
        }

        if oid == const_oid::db::rfc5912::ID_EC_PUBLIC_KEY {
            // `spki.algorithm` is the owned `AlgorithmIdentifier<Any>`, which has no
            // `parameters_oid()`; decode the OID out of its `Any` parameters directly.
            let curve = spki
                .algorithm
                .parameters
                .as_ref()
                .ok_or_else(|| {
                    KeyKitError::DecodingError("EC SPKI is missing curve parameters".to_string())
                })?
                .decode_as::<const_oid::ObjectIdentifier>()?;
            return match curve {
                const_oid::db::rfc5912::SECP_256_R_1 => {
                    let verifying_key = P256VerifyingKey::from_sec1_bytes(key_bytes)
                        .map_err(|e| KeyKitError::DecodingError(e.to_string()))?;
                    Ok(PublicKey::EcdsaP256(verifying_key))
                }
                const_oid::db::rfc5912::SECP_384_R_1 => {
                    let verifying_key = P384VerifyingKey::from_sec1_bytes(key_bytes)
                        .map_err(|e| KeyKitError::DecodingError(e.to_string()))?;
                    Ok(PublicKey::EcdsaP384(verifying_key))
                }
                const_oid::db::rfc5912::SECP_521_R_1 => {
                    let verifying_key = P521VerifyingKey::from_sec1_bytes(key_bytes)
                        .map_err(|e| KeyKitError::DecodingError(e.to_string()))?;
                    Ok(PublicKey::EcdsaP521(verifying_key))
                }
                other => Err(KeyKitError::DecodingError(format!(
                    "Unsupported EC curve OID: {other}"
                ))),
            };
        }

        if oid == const_oid::db::rfc8410::ID_ED_25519 {
            let bytes: [u8; 32] = key_bytes.try_into().map_err(|_| {
                KeyKitError::DecodingError("Ed25519 public key must be 32 bytes".to_string())
            })?;
            let verifying_key = Ed25519VerifyingKey::from_bytes(&bytes)
                .map_err(|e| KeyKitError::DecodingError(e.to_string()))?;
            return Ok(PublicKey::Ed25519(verifying_key));
        }

        Err(KeyKitError::DecodingError(format!(
            "Unsupported public key algorithm OID: {oid}"
        )))
    }

    /// Decode from SPKI DER.
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let spki = SubjectPublicKeyInfoOwned::from_der(der)?;
        Self::from_x509spki(&spki)
    }

    /// Decode from SPKI PEM (`PUBLIC KEY`).
    pub fn from_spki_pem(pem_str: &str) -> Result<Self> {
        let der = pem_utils::to_der_expecting(pem_str.as_bytes(), PUBLIC_KEY_LABEL)?;
        Self::from_spki_der(&der)
    }

    /// Verify a signature produced by [`KeyPair::sign_data`].
    pub fn verify_signature(&self, data: &[u8], signature: &[u8]) -> Result<()> {
        match self {
            PublicKey::Rsa(public) => {
                use rsa::signature::Verifier;
                let verifying_key: rsa::pkcs1v15::VerifyingKey<sha2::Sha256> =
                    rsa::pkcs1v15::VerifyingKey::new(public.clone());
                let signature = rsa::pkcs1v15::Signature::try_from(signature)
                    .map_err(|e| KeyKitError::SignatureError(e.to_string()))?;
                verifying_key
                    .verify(data, &signature)
                    .map_err(|e| KeyKitError::SignatureError(e.to_string()))
            }
            PublicKey::EcdsaP256(verifying_key) => {
                use p256::ecdsa::signature::Verifier;
                let signature = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|e| KeyKitError::SignatureError(e.to_string()))?;
                verifying_key
                    .verify(data, &signature)
                    .map_err(|e| KeyKitError::SignatureError(e.to_string()))
            }
            PublicKey::EcdsaP384(verifying_key) => {
                use p384::ecdsa::signature::Verifier;
                let signature = p384::ecdsa::Signature::from_der(signature)
                    .map_err(|e| KeyKitError::SignatureError(e.to_string()))?;
                verifying_key
                    .verify(data, &signature)
                    .map_err(|e| KeyKitError::SignatureError(e.to_string()))
            }
            PublicKey::EcdsaP521(verifying_key) => {
                use p521::ecdsa::signature::Verifier;
                let signature = p521::ecdsa::Signature::from_der(signature)
                    .map_err(|e| KeyKitError::SignatureError(e.to_string()))?;
                verifying_key
                    .verify(data, &signature)
                    .map_err(|e| KeyKitError::SignatureError(e.to_string()))
            }
            PublicKey::Ed25519(verifying_key) => {
                use ed25519_dalek::Verifier;
                let signature = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|e| KeyKitError::SignatureError(e.to_string()))?;
                verifying_key
                    .verify(data, &signature)
                    .map_err(|e| KeyKitError::SignatureError(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pkcs8_roundtrip_ecdsa() {
        let key = KeyPair::generate_ecdsa_p256();
        let pem = key.to_pkcs8_pem().unwrap();
        assert!(pem.contains("BEGIN PRIVATE KEY"));
        let restored = KeyPair::from_pkcs8_pem(&pem).unwrap();
        assert_eq!(restored.algorithm_name(), "ECDSA P-256");
        assert_eq!(key.to_pkcs8_der().unwrap(), restored.to_pkcs8_der().unwrap());
    }

    #[test]
    fn pkcs8_roundtrip_ed25519() {
        let key = KeyPair::generate_ed25519();
        let der = key.to_pkcs8_der().unwrap();
        let restored = KeyPair::from_pkcs8_der(&der).unwrap();
        assert_eq!(restored.algorithm_name(), "Ed25519");
    }

    #[test]
    fn encrypted_pkcs8_requires_the_passphrase() {
        let key = KeyPair::generate_ecdsa_p256();
        let pem = key.to_pkcs8_encrypted_pem("correct horse").unwrap();
        assert!(pem.contains("BEGIN ENCRYPTED PRIVATE KEY"));

        assert!(KeyPair::from_pkcs8_encrypted_pem(&pem, "wrong").is_err());
        let restored = KeyPair::from_pkcs8_encrypted_pem(&pem, "correct horse").unwrap();
        assert_eq!(
            key.to_pkcs8_der().unwrap(),
            restored.to_pkcs8_der().unwrap()
        );
    }

    #[test]
    fn load_dispatches_on_pem_label() {
        let key = KeyPair::generate_ecdsa_p384();
        let pem = key.to_pkcs8_pem().unwrap();
        let loaded = KeyPair::load(pem.as_bytes(), None).unwrap();
        assert_eq!(loaded.algorithm_name(), "ECDSA P-384");

        let encrypted = key.to_pkcs8_encrypted_pem("pw").unwrap();
        assert!(KeyPair::load(encrypted.as_bytes(), None).is_err());
        assert!(KeyPair::load(encrypted.as_bytes(), Some("pw")).is_ok());
    }

    #[test]
    fn sign_and_verify_all_algorithms() {
        let message = b"keykit signing test";
        for key in [
            KeyPair::generate_ecdsa_p256(),
            KeyPair::generate_ecdsa_p384(),
            KeyPair::generate_ed25519(),
        ] {
            let signature = key.sign_data(message).unwrap();
            let public = PublicKey::from_key_pair(&key);
            public.verify_signature(message, &signature).unwrap();
            assert!(public.verify_signature(b"tampered", &signature).is_err());
        }
    }

    #[test]
    fn spki_roundtrip() {
        let key = KeyPair::generate_ed25519();
        let public = PublicKey::from_key_pair(&key);
        let pem = public.to_spki_pem().unwrap();
        assert!(pem.contains("BEGIN PUBLIC KEY"));
        let restored = PublicKey::from_spki_pem(&pem).unwrap();
        assert_eq!(restored.algorithm_name(), "Ed25519");
    }

    #[test]
    fn algorithm_parsing() {
        assert_eq!(
            "p256".parse::<KeyAlgorithm>().unwrap(),
            KeyAlgorithm::EcdsaP256
        );
        assert_eq!(
            "rsa4096".parse::<KeyAlgorithm>().unwrap(),
            KeyAlgorithm::Rsa4096
        );
        assert!("dsa".parse::<KeyAlgorithm>().is_err());
    }
}
