//! This module contains constant definitions used by other modules and crates.

/// Size of a RISC-V word, in bytes
pub const WORD_SIZE: usize = 4;

/// Default width of the guest address space, in bits
pub const DEFAULT_MEM_BITS: u32 = 28;

/// Default exclusive upper bound of the guest address space
pub const DEFAULT_MEM_SIZE: u32 = 1 << DEFAULT_MEM_BITS;

/// Maximum number of program headers accepted in a guest ELF; enforced before
/// the header table is allocated
pub const MAX_SEGMENTS: usize = 256;

/// Smallest supported proof-size tier: proofs of up to 2^10 cycles
pub const MIN_CYCLES_PO2: usize = 10;

/// Largest supported proof-size tier: proofs of up to 2^20 cycles
pub const MAX_CYCLES_PO2: usize = 20;

/// Number of digests in a method identifier, one per supported power-of-two
/// cycle tier from `MIN_CYCLES_PO2` to `MAX_CYCLES_PO2` inclusive
pub const CODE_DIGEST_COUNT: usize =
    log2_ceil((1 << MAX_CYCLES_PO2) / (1 << MIN_CYCLES_PO2)) + 1;

/// Number of u32 words in a digest
pub const DIGEST_WORDS: usize = 8;

/// Number of bytes in a digest
pub const DIGEST_BYTES: usize = DIGEST_WORDS * WORD_SIZE;

/// Returns the smallest `n` such that `2^n >= value`
pub const fn log2_ceil(value: usize) -> usize {
    let mut result = 0;
    while (1 << result) < value {
        result += 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log2_ceil() {
        assert_eq!(log2_ceil(1), 0);
        assert_eq!(log2_ceil(2), 1);
        assert_eq!(log2_ceil(3), 2);
        assert_eq!(log2_ceil(1024), 10);
        assert_eq!(log2_ceil(1025), 11);
    }

    #[test]
    fn test_digest_count_covers_all_tiers() {
        assert_eq!(CODE_DIGEST_COUNT, MAX_CYCLES_PO2 - MIN_CYCLES_PO2 + 1);
    }
}
