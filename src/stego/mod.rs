//! Bit-level plumbing between payload bytes and carrier samples.

pub mod lsb;

// ── Raw bit ↔ byte conversion ───────────────────────────────────────────
//
// No framing here: the payload header already says how many bytes follow.

/// Convert bytes to bits, most-significant bit of each byte first.
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<bool> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &b in bytes {
        for i in (0..8).rev() {
            bits.push(((b >> i) & 1) == 1);
        }
    }
    bits
}

/// Convert bits back to bytes, most-significant bit first.
/// Trailing bits that don't fill a full byte are discarded.
pub fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    bits.chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |b, &bit| (b << 1) | bit as u8))
        .collect()
}
