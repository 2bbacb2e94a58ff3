//! util — битовые утилиты над 32-битными хеш-словами.
//!
//! Bit numbering: bit `i` denotes the value `1 << i`, so bit 0 is the least
//! significant bit. Every address computation in the crate (choice vector,
//! linear-hash addressing, query masks) uses this convention.
//!
//! All helpers are pure: they take a word by value and return a new one.

use crate::consts::MAX_BITS;

/// Hash word type.
pub type Bits = u32;

#[inline]
pub fn bit_is_set(word: Bits, i: u32) -> bool {
    debug_assert!((i as usize) < MAX_BITS, "bit index {} out of range", i);
    (word >> i) & 1 == 1
}

#[inline]
pub fn set_bit(word: Bits, i: u32) -> Bits {
    debug_assert!((i as usize) < MAX_BITS, "bit index {} out of range", i);
    word | (1 << i)
}

#[inline]
pub fn unset_bit(word: Bits, i: u32) -> Bits {
    debug_assert!((i as usize) < MAX_BITS, "bit index {} out of range", i);
    word & !(1 << i)
}

/// Mask with the lowest `n` bits set (all ones for `n >= 32`).
#[inline]
pub fn low_mask(n: u32) -> Bits {
    if n as usize >= MAX_BITS {
        Bits::MAX
    } else {
        (1 << n) - 1
    }
}

/// Keep only the lowest `n` bits of `word`.
#[inline]
pub fn low_bits(word: Bits, n: u32) -> Bits {
    word & low_mask(n)
}

/// Render a word most-significant bit first, in groups of eight.
pub fn bits_string(word: Bits) -> String {
    let mut s = String::with_capacity(MAX_BITS + 3);
    for i in (0..MAX_BITS as u32).rev() {
        s.push(if bit_is_set(word, i) { '1' } else { '0' });
        if i % 8 == 0 && i != 0 {
            s.push(' ');
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_unset_are_pure() {
        let w = 0b1010u32;
        assert_eq!(set_bit(w, 0), 0b1011);
        assert_eq!(unset_bit(w, 1), 0b1000);
        assert_eq!(w, 0b1010);
        assert!(bit_is_set(w, 3));
        assert!(!bit_is_set(w, 2));
        assert!(bit_is_set(set_bit(0, 31), 31));
    }

    #[test]
    fn low_bits_edges() {
        assert_eq!(low_bits(0xFFFF_FFFF, 0), 0);
        assert_eq!(low_bits(0xABCD_EF01, 8), 0x01);
        assert_eq!(low_bits(0xABCD_EF01, 31), 0x2BCD_EF01);
        assert_eq!(low_bits(0xABCD_EF01, 32), 0xABCD_EF01);
        assert_eq!(low_bits(0xABCD_EF01, 40), 0xABCD_EF01);
    }

    #[test]
    fn bits_string_is_msb_first() {
        assert_eq!(bits_string(1), "00000000 00000000 00000000 00000001");
        assert_eq!(bits_string(0x8000_0000), "10000000 00000000 00000000 00000000");
    }
}
