//! # keykit - A Pure Rust Key and Certificate Toolkit
//!
//! keykit is a toolkit for the everyday PKI chores that are conventionally
//! done by shelling out to an external crypto CLI: generating keys, creating
//! certificate signing requests, issuing and inspecting X.509 certificates,
//! converting between on-disk formats, minting random secrets, and test-driving
//! TLS endpoints. It is built entirely with rustcrypto libraries, with no
//! dependencies on ring or openssl.
//!
//! ## Supported Key Types
//!
//! - **RSA**: 2048, 3072, and 4096-bit keys
//! - **ECDSA**: P-256, P-384, and P-521 curves
//! - **Ed25519**: Edwards curve digital signature algorithm
//!
//! ## Supported Encodings
//!
//! - **PKCS#8**: plain and PBES2 passphrase-encrypted private keys
//! - **PKCS#1 / SEC1**: legacy RSA and EC private keys (import)
//! - **DER** and **PEM** for every artifact, auto-detected on input
//!
//! ## Quick Start
//!
//! ### Generating a Self-Signed Certificate
//!
//! ```rust,no_run
//! use keykit::{
//!     cert::{Certificate, params::{CertificationRequestInfo, DistinguishedName, Validity}},
//!     key::{KeyAlgorithm, KeyPair, PublicKey},
//! };
//!
//! # fn main() -> keykit::error::Result<()> {
//! let key = KeyPair::generate(KeyAlgorithm::EcdsaP256)?;
//!
//! let subject = DistinguishedName::parse("CN=example.com,O=Example Corp,C=US")?;
//! let cert_info = CertificationRequestInfo::builder()
//!     .subject(subject)
//!     .subject_public_key(PublicKey::from_key_pair(&key))
//!     .build();
//!
//! let certificate = Certificate::new_self_signed(&cert_info, &key, Validity::for_days(365))?;
//! println!("{}", certificate.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Running a CA: CSR in, Certificate out
//!
//! ```rust,no_run
//! use keykit::{
//!     cert::{Certificate, CertificateWithPrivateKey,
//!            params::{CertificationRequestInfo, DistinguishedName, Validity}},
//!     csr::CertSigningRequest,
//!     issuer::Issuer,
//!     key::{KeyPair, PublicKey},
//! };
//!
//! # fn main() -> keykit::error::Result<()> {
//! // The CA.
//! let ca_key = KeyPair::generate_ecdsa_p256();
//! let ca_info = CertificationRequestInfo::builder()
//!     .subject(DistinguishedName::parse("CN=Example CA,O=Example Corp")?)
//!     .subject_public_key(PublicKey::from_key_pair(&ca_key))
//!     .is_ca(true)
//!     .build();
//! let ca = CertificateWithPrivateKey {
//!     cert: Certificate::new_self_signed(&ca_info, &ca_key, Validity::for_days(3650))?,
//!     key: ca_key,
//! };
//!
//! // A subject requests a certificate...
//! let server_key = KeyPair::generate_ecdsa_p256();
//! let request_info = CertificationRequestInfo::builder()
//!     .subject(DistinguishedName::parse("CN=server.example.com")?)
//!     .subject_public_key(PublicKey::from_key_pair(&server_key))
//!     .build();
//! let csr = CertSigningRequest::new(&request_info, &server_key)?;
//!
//! // ...and the CA issues it.
//! csr.verify_signature()?;
//! let server_cert = ca.issue(&csr.to_cert_info()?, Validity::for_days(365))?;
//! println!("{}", server_cert.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Inspecting and Checking Expiry
//!
//! ```rust,no_run
//! # fn main() -> keykit::error::Result<()> {
//! let pem = std::fs::read("server.crt")?;
//! let report = keykit::inspect::inspect_certificate(&pem)?;
//! println!("{report}");
//! if report.expires_within_days(30) {
//!     eprintln!("renew soon: {} days left", report.days_until_expiry);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`]: Key generation, import/export, and signing primitives
//! - [`cert`]: Certificate parameters, extensions, and construction
//! - [`csr`]: PKCS#10 certification requests
//! - [`issuer`]: The [`issuer::Issuer`] trait and CA issuance
//! - [`inspect`]: Text and JSON reports over keys, CSRs, and certificates
//! - [`verify`]: Leaf-against-CA verification
//! - [`secrets`]: Random bytes, hex/base64 secrets, and passphrases
//! - [`probe`]: TLS handshake test client
//! - [`fsio`]: Artifact I/O with conventional permission bits
//! - [`pem_utils`]: PEM/DER conversion helpers
//! - [`error`]: Error types and the crate-wide `Result`

pub mod cert;
pub mod csr;
pub mod error;
pub mod fsio;
pub mod inspect;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod probe;
pub mod secrets;
pub mod tbs_certificate;
pub mod verify;
