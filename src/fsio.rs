//! Artifact file I/O with the conventional permission bits.
//!
//! Private key material lands on disk with mode 0600; certificates, public
//! keys, and CSRs with 0644.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::{KeyKitError, Result};
use crate::pem_utils;

/// The kinds of artifact the toolkit reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    PrivateKey,
    PublicKey,
    Certificate,
    Csr,
}

impl ArtifactKind {
    /// The conventional file extension for the artifact kind.
    pub fn conventional_extension(&self) -> &'static str {
        match self {
            ArtifactKind::PrivateKey => "key",
            ArtifactKind::PublicKey => "pub.pem",
            ArtifactKind::Certificate => "crt",
            ArtifactKind::Csr => "csr",
        }
    }

    /// Best-effort classification of a file: extension first, then the PEM
    /// label of its content.
    pub fn from_path(path: &Path) -> Result<Option<Self>> {
        let by_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| match ext {
                "key" => Some(ArtifactKind::PrivateKey),
                "crt" | "cer" => Some(ArtifactKind::Certificate),
                "csr" | "req" => Some(ArtifactKind::Csr),
                _ => None,
            });
        if let Some(kind) = by_extension {
            return Ok(Some(kind));
        }

        let data = fs::read(path)?;
        if !pem_utils::looks_like_pem(&data) {
            return Ok(None);
        }
        let text = std::str::from_utf8(&data)
            .map_err(|_| KeyKitError::DecodingError("PEM input is not valid UTF-8".to_string()))?;
        let kind = match pem_utils::pem_label(text)?.as_str() {
            pem_utils::PRIVATE_KEY_LABEL
            | pem_utils::ENCRYPTED_PRIVATE_KEY_LABEL
            | pem_utils::RSA_PRIVATE_KEY_LABEL
            | pem_utils::EC_PRIVATE_KEY_LABEL => Some(ArtifactKind::PrivateKey),
            pem_utils::PUBLIC_KEY_LABEL => Some(ArtifactKind::PublicKey),
            pem_utils::CERTIFICATE_LABEL => Some(ArtifactKind::Certificate),
            pem_utils::CSR_LABEL => Some(ArtifactKind::Csr),
            _ => None,
        };
        Ok(kind)
    }
}

/// Write private key material with owner-only permissions.
pub fn write_private(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600); // Owner read/write only
        fs::set_permissions(path, perms)?;
    }

    tracing::debug!(path = %path.display(), "wrote private artifact");
    Ok(())
}

/// Write public material (certificates, public keys, CSRs) world-readable.
pub fn write_public(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o644);
        fs::set_permissions(path, perms)?;
    }

    tracing::debug!(path = %path.display(), "wrote public artifact");
    Ok(())
}

/// Read an input argument: a file path, or `-` for stdin.
pub fn read_input(path: &str) -> Result<Vec<u8>> {
    if path == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        Ok(fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("keykit-fsio-{}-{name}", crate::secrets::random_hex(8)));
        path
    }

    #[test]
    #[cfg(unix)]
    fn private_writes_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let path = scratch_path("key.pem");
        write_private(&path, b"secret").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn public_writes_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let path = scratch_path("cert.pem");
        write_public(&path, b"cert").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn classification_prefers_extension_then_pem_label() {
        let keyed = scratch_path("server.key");
        fs::write(&keyed, b"whatever").unwrap();
        assert_eq!(
            ArtifactKind::from_path(&keyed).unwrap(),
            Some(ArtifactKind::PrivateKey)
        );
        fs::remove_file(&keyed).unwrap();

        let unlabeled = scratch_path("artifact.pem");
        let pem = crate::pem_utils::der_to_pem(&[0x30, 0x00], crate::pem_utils::CSR_LABEL);
        fs::write(&unlabeled, pem).unwrap();
        assert_eq!(
            ArtifactKind::from_path(&unlabeled).unwrap(),
            Some(ArtifactKind::Csr)
        );
        fs::remove_file(&unlabeled).unwrap();
    }
}
