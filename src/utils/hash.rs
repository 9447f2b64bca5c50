use crc32fast::Hasher;

pub fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

pub fn verify_checksum(bytes: &[u8], expected: u32) -> bool {
    checksum(bytes) == expected
}
