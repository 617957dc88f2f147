//! Bit-vector implementation.
//!
//! Bits are stored in [u64] blocks: populations reach tens of millions of
//! entries, so wide blocks keep `count_ones` and bulk operations cheap.
//! Any bits in the last block beyond `len()` are kept at 0; the codec
//! rejects encodings that violate this so a value has exactly one byte
//! representation.

use bytes::{Buf, BufMut};
use letsrevoke_codec::{EncodeSize, Error as CodecError, RangeCfg, Read, ReadExt as _, Write};
use std::fmt::{self, Debug, Formatter};

type Block = u64;

const BITS_PER_BLOCK: usize = Block::BITS as usize;

/// A vector of bits.
#[derive(Clone, PartialEq, Eq)]
pub struct BitVec {
    storage: Vec<Block>,
    num_bits: usize,
}

impl BitVec {
    /// Creates a `BitVec` with `size` bits, all 0.
    pub fn zeroes(size: usize) -> Self {
        Self {
            storage: vec![0; Self::num_blocks(size)],
            num_bits: size,
        }
    }

    /// Creates a `BitVec` with `size` bits, all 1.
    pub fn ones(size: usize) -> Self {
        let mut result = Self {
            storage: vec![Block::MAX; Self::num_blocks(size)],
            num_bits: size,
        };
        result.clear_trailing_bits();
        result
    }

    /// Returns the number of bits in the vector.
    #[inline]
    pub fn len(&self) -> usize {
        self.num_bits
    }

    /// Returns true if the vector contains no bits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_bits == 0
    }

    /// Gets the bit at `index`, or `None` if out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.num_bits {
            return None;
        }
        Some(self.storage[index / BITS_PER_BLOCK] & (1 << (index % BITS_PER_BLOCK)) != 0)
    }

    /// Sets the bit at `index` to 1.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn set(&mut self, index: usize) {
        assert!(index < self.num_bits, "index out of bounds");
        self.storage[index / BITS_PER_BLOCK] |= 1 << (index % BITS_PER_BLOCK);
    }

    /// Sets the bit at `index` to 0.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn clear(&mut self, index: usize) {
        assert!(index < self.num_bits, "index out of bounds");
        self.storage[index / BITS_PER_BLOCK] &= !(1 << (index % BITS_PER_BLOCK));
    }

    /// Returns the number of bits set to 1.
    pub fn count_ones(&self) -> usize {
        self.storage
            .iter()
            .map(|block| block.count_ones() as usize)
            .sum()
    }

    /// Returns the number of bits set to 0.
    pub fn count_zeros(&self) -> usize {
        self.num_bits - self.count_ones()
    }

    /// Performs a bitwise OR with `other`.
    ///
    /// # Panics
    ///
    /// Panics if the lengths don't match.
    pub fn or(&mut self, other: &BitVec) {
        assert_eq!(self.num_bits, other.num_bits, "length mismatch");
        for (a, b) in self.storage.iter_mut().zip(other.storage.iter()) {
            *a |= b;
        }
    }

    /// Performs a bitwise XOR with `other`.
    ///
    /// # Panics
    ///
    /// Panics if the lengths don't match.
    pub fn xor(&mut self, other: &BitVec) {
        assert_eq!(self.num_bits, other.num_bits, "length mismatch");
        for (a, b) in self.storage.iter_mut().zip(other.storage.iter()) {
            *a ^= b;
        }
    }

    /// Extends the vector to `new_len` bits, filling with 0.
    ///
    /// Does nothing if `new_len` is not larger than the current length.
    pub fn grow(&mut self, new_len: usize) {
        if new_len <= self.num_bits {
            return;
        }
        self.storage.resize(Self::num_blocks(new_len), 0);
        self.num_bits = new_len;
    }

    /// Iterates over the indices of set bits, in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.storage
            .iter()
            .enumerate()
            .flat_map(|(block_index, &block)| {
                let mut remaining = block;
                std::iter::from_fn(move || {
                    if remaining == 0 {
                        return None;
                    }
                    let offset = remaining.trailing_zeros() as usize;
                    remaining &= remaining - 1;
                    Some(block_index * BITS_PER_BLOCK + offset)
                })
            })
    }

    #[inline(always)]
    fn num_blocks(num_bits: usize) -> usize {
        num_bits.div_ceil(BITS_PER_BLOCK)
    }

    /// Clears bits in storage beyond the last valid bit. Returns true if any
    /// bits were cleared.
    fn clear_trailing_bits(&mut self) -> bool {
        let offset = self.num_bits % BITS_PER_BLOCK;
        if offset == 0 {
            return false;
        }
        let block = self.storage.last_mut().expect("storage is not empty");
        let old = *block;
        *block &= (1 << offset) - 1;
        *block != old
    }
}

impl Debug for BitVec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "BitVec[{} bits, {} set]", self.num_bits, self.count_ones())
    }
}

impl Write for BitVec {
    fn write(&self, buf: &mut impl BufMut) {
        self.num_bits.write(buf);
        for &block in &self.storage {
            block.write(buf);
        }
    }
}

impl Read for BitVec {
    type Cfg = RangeCfg<usize>;

    fn read_cfg(buf: &mut impl Buf, range: &Self::Cfg) -> Result<Self, CodecError> {
        let num_bits = usize::read_cfg(buf, range)?;
        let num_blocks = Self::num_blocks(num_bits);
        let mut storage = Vec::with_capacity(num_blocks);
        for _ in 0..num_blocks {
            storage.push(Block::read(buf)?);
        }
        let mut result = Self { storage, num_bits };
        if result.clear_trailing_bits() {
            return Err(CodecError::Invalid("BitVec", "trailing bits"));
        }
        Ok(result)
    }
}

impl EncodeSize for BitVec {
    fn encode_size(&self) -> usize {
        self.num_bits.encode_size() + self.storage.len() * (BITS_PER_BLOCK / 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use letsrevoke_codec::{Decode, Encode};

    #[test]
    fn test_zeroes_and_ones() {
        let zeroes = BitVec::zeroes(100);
        assert_eq!(zeroes.len(), 100);
        assert_eq!(zeroes.count_ones(), 0);

        let ones = BitVec::ones(100);
        assert_eq!(ones.count_ones(), 100);
        assert_eq!(ones.count_zeros(), 0);
    }

    #[test]
    fn test_set_get_clear() {
        let mut bv = BitVec::zeroes(130);
        bv.set(0);
        bv.set(64);
        bv.set(129);
        assert_eq!(bv.get(0), Some(true));
        assert_eq!(bv.get(1), Some(false));
        assert_eq!(bv.get(64), Some(true));
        assert_eq!(bv.get(129), Some(true));
        assert_eq!(bv.get(130), None);
        bv.clear(64);
        assert_eq!(bv.get(64), Some(false));
        assert_eq!(bv.count_ones(), 2);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn test_set_out_of_bounds() {
        let mut bv = BitVec::zeroes(10);
        bv.set(10);
    }

    #[test]
    fn test_or() {
        let mut a = BitVec::zeroes(70);
        let mut b = BitVec::zeroes(70);
        a.set(1);
        b.set(69);
        a.or(&b);
        assert_eq!(a.get(1), Some(true));
        assert_eq!(a.get(69), Some(true));
        assert_eq!(a.count_ones(), 2);
    }

    #[test]
    fn test_grow() {
        let mut bv = BitVec::zeroes(10);
        bv.set(9);
        bv.grow(200);
        assert_eq!(bv.len(), 200);
        assert_eq!(bv.get(9), Some(true));
        assert_eq!(bv.count_ones(), 1);
        bv.grow(100);
        assert_eq!(bv.len(), 200);
    }

    #[test]
    fn test_ones_iterator() {
        let mut bv = BitVec::zeroes(200);
        for index in [0, 63, 64, 127, 199] {
            bv.set(index);
        }
        let indices: Vec<usize> = bv.iter_ones().collect();
        assert_eq!(indices, vec![0, 63, 64, 127, 199]);
    }

    #[test]
    fn test_codec_round_trip() {
        let mut bv = BitVec::zeroes(130);
        bv.set(0);
        bv.set(128);
        let encoded = bv.encode();
        let decoded = BitVec::decode_cfg(encoded, &(0..=130).into()).unwrap();
        assert_eq!(decoded, bv);
    }

    #[test]
    fn test_codec_rejects_trailing_bits() {
        let bv = BitVec::zeroes(10);
        let mut encoded = bv.encode().to_vec();
        // Set storage bit 15 (beyond the tenth) in the big-endian block.
        let position = encoded.len() - 2;
        encoded[position] |= 0x80;
        assert!(matches!(
            BitVec::decode_cfg(&encoded[..], &(0..=10).into()),
            Err(CodecError::Invalid("BitVec", "trailing bits"))
        ));
    }

    #[test]
    fn test_codec_rejects_oversized() {
        let bv = BitVec::zeroes(1000);
        let encoded = bv.encode();
        assert!(matches!(
            BitVec::decode_cfg(encoded, &(0..=100).into()),
            Err(CodecError::InvalidLength(1000))
        ));
    }

    #[test]
    fn test_codec_empty() {
        let bv = BitVec::zeroes(0);
        let decoded = BitVec::decode_cfg(bv.encode(), &(0..=10).into()).unwrap();
        assert_eq!(decoded.len(), 0);
    }
}
