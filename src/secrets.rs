//! Random secret generation backed by the operating system RNG.

use base64::prelude::*;
use rand_core::{OsRng, RngCore};

/// Characters used for generated passphrases.
const PASSPHRASE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Fill a buffer of `count` bytes from the OS RNG.
pub fn random_bytes(count: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; count];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// `count` random bytes as lowercase hex.
pub fn random_hex(count: usize) -> String {
    hex::encode(random_bytes(count))
}

/// `count` random bytes as standard base64.
pub fn random_base64(count: usize) -> String {
    BASE64_STANDARD.encode(random_bytes(count))
}

/// An alphanumeric passphrase of `len` characters.
///
/// Characters are drawn by rejection sampling so every charset member is
/// equally likely.
pub fn random_passphrase(len: usize) -> String {
    let charset_len = PASSPHRASE_CHARSET.len() as u32;
    // Largest multiple of the charset size that fits in a u32 draw.
    let zone = u32::MAX - u32::MAX % charset_len;

    let mut out = String::with_capacity(len);
    while out.len() < len {
        let draw = OsRng.next_u32();
        if draw < zone {
            out.push(PASSPHRASE_CHARSET[(draw % charset_len) as usize] as char);
        }
    }
    out
}

/// A random X.509 serial number: 16 bytes, positive, never zero.
pub fn random_serial() -> Vec<u8> {
    let mut bytes = [0u8; 16];
    loop {
        OsRng.fill_bytes(&mut bytes);
        bytes[0] &= 0x7F; // Ensure positive
        if bytes.iter().any(|b| *b != 0) {
            return bytes.to_vec();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_output_has_expected_length_and_alphabet() {
        let s = random_hex(32);
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn base64_output_decodes_to_requested_size() {
        let s = random_base64(24);
        assert_eq!(BASE64_STANDARD.decode(&s).unwrap().len(), 24);
    }

    #[test]
    fn passphrase_stays_in_charset() {
        let p = random_passphrase(48);
        assert_eq!(p.len(), 48);
        assert!(p.bytes().all(|b| PASSPHRASE_CHARSET.contains(&b)));
    }

    #[test]
    fn serials_are_positive_and_distinct() {
        let a = random_serial();
        let b = random_serial();
        assert_eq!(a.len(), 16);
        assert!(a[0] & 0x80 == 0);
        assert_ne!(a, b);
    }
}
