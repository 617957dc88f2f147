//! Compressed revocation vector.
//!
//! The alternative encoding to the filter cascade: the revocation bit-vector
//! itself, compressed with zstd. Exact membership (no false positives at
//! all) at the cost of a larger artifact for sparse revocation sets. Vectors
//! for successive snapshots can be merged with [RevocationVector::apply_delta]
//! since revocations only accumulate.

use crate::{bitvec::BitVec, selector::RevocationSet, CertificateId, Error};
use bytes::{Buf, BufMut};
use letsrevoke_codec::{
    Decode as _, Encode as _, EncodeSize, Error as CodecError, RangeCfg, Read, Write,
};

/// Slack allowed between the declared bit count and the compressed payload
/// during decode, covering the length prefix and zstd framing.
const DECOMPRESS_SLACK: usize = 1024;

/// A revocation bit-vector, held uncompressed for queries with its
/// compressed form cached for encoding.
#[derive(Clone, Debug)]
pub struct RevocationVector {
    bits: BitVec,
    compressed: Vec<u8>,
}

impl RevocationVector {
    /// Builds a vector from a revocation set.
    pub fn from_set(revoked: &RevocationSet) -> Result<Self, Error> {
        Self::from_bits(revoked.bits.clone())
    }

    /// Builds a vector marking `indices` revoked over `len` entries.
    pub fn from_indices(
        indices: impl IntoIterator<Item = u64>,
        len: u64,
    ) -> Result<Self, Error> {
        let mut bits = BitVec::zeroes(len as usize);
        for index in indices {
            bits.set(index as usize);
        }
        Self::from_bits(bits)
    }

    fn from_bits(bits: BitVec) -> Result<Self, Error> {
        let compressed =
            zstd::bulk::compress(&bits.encode(), zstd::DEFAULT_COMPRESSION_LEVEL)?;
        Ok(Self { bits, compressed })
    }

    /// Returns true if `id` is revoked. Identifiers beyond the vector are
    /// not revoked.
    pub fn is_revoked(&self, id: &CertificateId) -> bool {
        usize::try_from(id.sequence())
            .ok()
            .and_then(|index| self.bits.get(index))
            .unwrap_or(false)
    }

    /// Returns the number of entries covered.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns true if the vector covers no entries.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Returns the number of revoked entries.
    pub fn revoked(&self) -> usize {
        self.bits.count_ones()
    }

    /// Merges `delta` into this vector (bitwise OR), growing it if the delta
    /// covers more entries.
    pub fn apply_delta(&mut self, delta: &RevocationVector) -> Result<(), Error> {
        if delta.bits.len() > self.bits.len() {
            self.bits.grow(delta.bits.len());
        }
        for index in delta.bits.iter_ones() {
            self.bits.set(index);
        }
        self.compressed =
            zstd::bulk::compress(&self.bits.encode(), zstd::DEFAULT_COMPRESSION_LEVEL)?;
        Ok(())
    }
}

impl PartialEq for RevocationVector {
    fn eq(&self, other: &Self) -> bool {
        // The compressed form is derived state.
        self.bits == other.bits
    }
}

impl Eq for RevocationVector {}

impl Write for RevocationVector {
    fn write(&self, buf: &mut impl BufMut) {
        self.bits.len().write(buf);
        self.compressed.write(buf);
    }
}

impl Read for RevocationVector {
    type Cfg = RangeCfg<usize>;

    fn read_cfg(buf: &mut impl Buf, range: &Self::Cfg) -> Result<Self, CodecError> {
        let num_bits = usize::read_cfg(buf, range)?;

        // The compressed payload can never usefully exceed the raw encoding.
        let raw_size = num_bits.div_ceil(8) + DECOMPRESS_SLACK;
        let compressed = Vec::<u8>::read_cfg(buf, &(0..=raw_size).into())?;

        let raw = zstd::bulk::decompress(&compressed, raw_size)
            .map_err(|_| CodecError::Invalid("RevocationVector", "decompression failed"))?;
        let bits = BitVec::decode_cfg(raw.as_slice(), &RangeCfg::exact(num_bits))?;
        Ok(Self { bits, compressed })
    }
}

impl EncodeSize for RevocationVector {
    fn encode_size(&self) -> usize {
        self.bits.len().encode_size() + self.compressed.encode_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        population::Population,
        selector::{select, SelectionPolicy},
    };
    use letsrevoke_codec::{Decode, Encode};

    fn vector(total: u64, percent: f64) -> RevocationVector {
        let population = Population::new(total, u64::MAX).unwrap();
        let revoked = select(&population, percent, &SelectionPolicy::Prefix).unwrap();
        RevocationVector::from_set(&revoked).unwrap()
    }

    #[test]
    fn test_exact_membership() {
        let vector = vector(1000, 10.0);
        for sequence in 0..100 {
            assert!(vector.is_revoked(&CertificateId::from_sequence(sequence)));
        }
        for sequence in 100..1000 {
            assert!(!vector.is_revoked(&CertificateId::from_sequence(sequence)));
        }
        // Beyond the vector.
        assert!(!vector.is_revoked(&CertificateId::from_sequence(100_000)));
    }

    #[test]
    fn test_from_indices() {
        let vector = RevocationVector::from_indices([3, 5, 7], 10).unwrap();
        assert_eq!(vector.revoked(), 3);
        assert!(vector.is_revoked(&CertificateId::from_sequence(5)));
        assert!(!vector.is_revoked(&CertificateId::from_sequence(4)));
    }

    #[test]
    fn test_apply_delta() {
        let mut base = RevocationVector::from_indices([1, 2], 10).unwrap();
        let delta = RevocationVector::from_indices([2, 8, 14], 20).unwrap();
        base.apply_delta(&delta).unwrap();
        assert_eq!(base.len(), 20);
        assert_eq!(base.revoked(), 4);
        for sequence in [1, 2, 8, 14] {
            assert!(base.is_revoked(&CertificateId::from_sequence(sequence)));
        }
    }

    #[test]
    fn test_codec_round_trip() {
        let vector = vector(100_000, 1.0);
        let encoded = vector.encode();
        // A prefix-revoked bitmap compresses far below the raw 12.5 KiB.
        assert!(encoded.len() < 2_000);
        let decoded = RevocationVector::decode_cfg(encoded, &(0..=100_000).into()).unwrap();
        assert_eq!(decoded, vector);
    }

    #[test]
    fn test_codec_rejects_oversized() {
        let vector = vector(10_000, 1.0);
        let encoded = vector.encode();
        assert!(RevocationVector::decode_cfg(encoded, &(0..=100).into()).is_err());
    }

    #[test]
    fn test_codec_rejects_truncated_payload() {
        let vector = vector(10_000, 1.0);
        let mut encoded = vector.encode().to_vec();
        encoded.truncate(encoded.len() - 4);
        assert!(RevocationVector::decode_cfg(&encoded[..], &(0..=10_000).into()).is_err());
    }
}
