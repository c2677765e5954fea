//! Bit-string helpers used as the split criterion of the trees.
//!
//! Byte-string keys are compared as big-endian bit strings: bit position `p` addresses bit
//! `!p & 7` of byte `p >> 3`, so bit 0 is the most significant bit of the first byte. Reads past
//! the end of a slice yield zero bytes.

use std::cmp::Ordering;

use num_traits::PrimInt;

#[inline]
pub(crate) fn byte_at(key: &[u8], pos: usize) -> u8 {
    key.get(pos).copied().unwrap_or(0)
}

/// Returns the bit at position `pos` of `key` (0 or 1).
#[inline]
pub fn bit_at(key: &[u8], pos: usize) -> usize {
    ((byte_at(key, pos >> 3) >> (!pos & 7)) & 1) as usize
}

/// Returns the number of leading bits `a` and `b` have in common, looking at no more than `len`
/// bits. The first `ignore` bits are already known to be equal; the scan starts at the byte that
/// contains bit `ignore`.
pub fn equal_bits(a: &[u8], b: &[u8], ignore: usize, len: usize) -> usize {
    let mut pos = ignore & !7;
    while pos < len {
        let i = pos >> 3;
        let diff = byte_at(a, i) ^ byte_at(b, i);
        if diff != 0 {
            return (pos + diff.leading_zeros() as usize).min(len);
        }
        pos += 8;
    }
    len
}

/// Lexicographic comparison of `a` and `b` over bits `pos..len`. Bits before `pos` are assumed
/// equal.
pub fn cmp_bits(a: &[u8], b: &[u8], pos: usize, len: usize) -> Ordering {
    let diff_at = equal_bits(a, b, pos, len);
    if diff_at >= len {
        return Ordering::Equal;
    }
    bit_at(a, diff_at).cmp(&bit_at(b, diff_at))
}

/// Width of `K` in bits.
#[inline]
pub fn bit_width<K: PrimInt>() -> u32 {
    K::zero().count_zeros()
}

/// "Find last set": 1-based position of the highest set bit, 0 when `x` is zero.
#[inline]
pub fn fls<K: PrimInt>(x: K) -> u32 {
    bit_width::<K>() - x.leading_zeros()
}

/// `x >> n`, except that shifting by the full width (or more) yields zero instead of
/// overflowing.
#[inline]
pub fn shr_or_zero<K: PrimInt>(x: K, n: u32) -> K {
    if n >= bit_width::<K>() {
        K::zero()
    } else {
        x >> n as usize
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use crate::utils::bits::{bit_at, cmp_bits, equal_bits, fls, shr_or_zero};

    #[test]
    fn test_bit_at_is_msb_first() {
        let key = [0b1000_0001u8, 0b0100_0000];
        assert_eq!(bit_at(&key, 0), 1);
        assert_eq!(bit_at(&key, 1), 0);
        assert_eq!(bit_at(&key, 7), 1);
        assert_eq!(bit_at(&key, 9), 1);
        // Past the end reads as zero.
        assert_eq!(bit_at(&key, 100), 0);
    }

    #[test]
    fn test_equal_bits() {
        assert_eq!(equal_bits(b"ab", b"ab", 0, 16), 16);
        // 'a' = 0x61, 'c' = 0x63: differ at bit 6 of the second byte.
        assert_eq!(equal_bits(b"aa", b"ac", 0, 16), 14);
        assert_eq!(equal_bits(b"aa", b"ac", 8, 16), 14);
        // Capped by len.
        assert_eq!(equal_bits(b"aa", b"ac", 0, 12), 12);
        // First byte differs at the top bit.
        assert_eq!(equal_bits(&[0x80], &[0x00], 0, 8), 0);
        // Short keys are zero padded.
        assert_eq!(equal_bits(b"a", b"a\0", 0, 16), 16);
        assert_eq!(equal_bits(b"a", b"ab", 0, 16), 9);
    }

    #[test]
    fn test_cmp_bits() {
        assert_eq!(cmp_bits(b"ab", b"ab", 0, 16), Ordering::Equal);
        assert_eq!(cmp_bits(b"aa", b"ab", 0, 16), Ordering::Less);
        assert_eq!(cmp_bits(b"b", b"ab", 0, 16), Ordering::Greater);
        assert_eq!(cmp_bits(b"a", b"ab", 0, 16), Ordering::Less);
        // Differences beyond len don't count.
        assert_eq!(cmp_bits(b"az", b"ab", 0, 8), Ordering::Equal);
    }

    #[test]
    fn test_fls() {
        assert_eq!(fls(0u32), 0);
        assert_eq!(fls(1u32), 1);
        assert_eq!(fls(0x8000_0000u32), 32);
        assert_eq!(fls(6u8), 3);
        assert_eq!(fls(u64::MAX), 64);
    }

    #[test]
    fn test_shr_or_zero() {
        assert_eq!(shr_or_zero(0xffu32, 4), 0xf);
        assert_eq!(shr_or_zero(0xffff_ffffu32, 32), 0);
        assert_eq!(shr_or_zero(u64::MAX, 64), 0);
        assert_eq!(shr_or_zero(0x80u8, 7), 1);
    }
}
