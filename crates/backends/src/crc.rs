//! EEPROM checksum format: CRC-32 over `dataRegion || codeRegion`,
//! rendered as 8 lowercase hex ASCII bytes with no separator or prefix.
//! `crc32fast` implements the common IEEE 802.3 polynomial, which is
//! what "CRC-32" means absent other context.

pub fn checksum(data: &[u8], code: &[u8]) -> String {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.update(code);
    format!("{:08x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_deterministic() {
        let a = checksum(b"world", b"hello");
        let b = checksum(b"world", b"hello");
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert!(a.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    }

    #[test]
    fn checksum_is_order_sensitive() {
        assert_ne!(checksum(b"world", b"hello"), checksum(b"hello", b"world"));
    }
}
