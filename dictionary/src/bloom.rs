//! Bloom filter over certificate identifiers.
//!
//! Hashing uses the Kirsch-Mitzenmacher optimization: `k` hash functions are
//! derived as `h1 + i * h2` from two 128-bit halves of a single SHA-256
//! digest, so each membership operation costs one hash invocation.

use crate::bitvec::BitVec;
use crate::Error;
use bytes::{Buf, BufMut};
use letsrevoke_codec::{
    EncodeSize, Error as CodecError, RangeCfg, Read, ReadExt as _, Write,
};
use letsrevoke_cryptography::sha256;
use std::num::{NonZeroU8, NonZeroUsize};

/// Upper bound on hash functions per filter; sizing never produces more.
pub const MAX_HASHERS: u8 = 32;

/// A Bloom filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BloomFilter {
    hashers: u8,
    bits: BitVec,
}

impl BloomFilter {
    /// Creates a filter with `hashers` hash functions over `bits` bits.
    pub fn new(hashers: NonZeroU8, bits: NonZeroUsize) -> Self {
        Self {
            hashers: hashers.get(),
            bits: BitVec::zeroes(bits.get()),
        }
    }

    /// Creates a filter sized for `capacity` items at a false-positive rate
    /// of `fp_numerator / fp_denominator`.
    ///
    /// Uses the standard sizing formulas `m = -n ln(p) / ln(2)^2` and
    /// `k = (m / n) ln(2)`.
    pub fn with_rate(
        capacity: usize,
        fp_numerator: u64,
        fp_denominator: u64,
    ) -> Result<Self, Error> {
        if fp_numerator == 0 || fp_numerator >= fp_denominator {
            return Err(Error::InvalidFalsePositiveRate);
        }
        let n = capacity.max(1) as f64;
        let p = fp_numerator as f64 / fp_denominator as f64;

        let ln2 = std::f64::consts::LN_2;
        let bits = ((-n * p.ln()) / (ln2 * ln2)).ceil() as usize;
        let bits = bits.max(64);
        let hashers = ((bits as f64 / n) * ln2).round() as u8;
        let hashers = hashers.clamp(1, MAX_HASHERS);

        Ok(Self {
            hashers,
            bits: BitVec::zeroes(bits),
        })
    }

    /// Inserts an item.
    pub fn insert(&mut self, item: &[u8]) {
        let len = self.bits.len() as u128;
        for hash in self.hashes(item) {
            self.bits.set((hash % len) as usize);
        }
    }

    /// Returns true if `item` is possibly in the filter, false if it is
    /// definitely not.
    pub fn contains(&self, item: &[u8]) -> bool {
        let len = self.bits.len() as u128;
        self.hashes(item)
            .all(|hash| self.bits.get((hash % len) as usize).unwrap_or(false))
    }

    /// Returns the number of bits in the filter.
    pub fn bits(&self) -> usize {
        self.bits.len()
    }

    /// Returns the number of hash functions.
    pub fn hashers(&self) -> u8 {
        self.hashers
    }

    fn hashes(&self, item: &[u8]) -> impl Iterator<Item = u128> {
        let digest = sha256::hash(item);
        let h1 = u128::from_be_bytes(digest[0..16].try_into().expect("digest is 32 bytes"));
        let h2 = u128::from_be_bytes(digest[16..32].try_into().expect("digest is 32 bytes"));
        (0..self.hashers).map(move |i| h1.wrapping_add(u128::from(i).wrapping_mul(h2)))
    }
}

impl Write for BloomFilter {
    fn write(&self, buf: &mut impl BufMut) {
        self.hashers.write(buf);
        self.bits.write(buf);
    }
}

impl Read for BloomFilter {
    type Cfg = (RangeCfg<usize>, RangeCfg<usize>);

    fn read_cfg(
        buf: &mut impl Buf,
        (hashers_cfg, bits_cfg): &Self::Cfg,
    ) -> Result<Self, CodecError> {
        let hashers = u8::read(buf)?;
        if hashers == 0 || !hashers_cfg.contains(&(hashers as usize)) {
            return Err(CodecError::Invalid("BloomFilter", "invalid hashers"));
        }
        let bits = BitVec::read_cfg(buf, bits_cfg)?;
        if bits.is_empty() {
            return Err(CodecError::Invalid("BloomFilter", "empty filter"));
        }
        Ok(Self { hashers, bits })
    }
}

impl EncodeSize for BloomFilter {
    fn encode_size(&self) -> usize {
        self.hashers.encode_size() + self.bits.encode_size()
    }
}
