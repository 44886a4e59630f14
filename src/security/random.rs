//! CSPRNG helpers for secrets that end up in cookies and forms.

use rand::rngs::OsRng;
use rand::RngCore;

/// `num_bytes` of OS randomness, hex encoded (two chars per byte).
pub fn random_hex(num_bytes: usize) -> String {
    let mut bytes = vec![0u8; num_bytes];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_hex_length_and_alphabet() {
        let value = random_hex(32);
        assert_eq!(value.len(), 64);
        assert!(value.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_random_hex_differs() {
        assert_ne!(random_hex(16), random_hex(16));
    }
}
