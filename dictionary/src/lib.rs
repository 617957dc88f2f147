//! Build compact revocation dictionaries over certificate populations.
//!
//! The pipeline behind signed revocation dictionary production: model a
//! [Population] of certificate identifiers, [select] the revoked share, and
//! encode the result as a [RevocationDictionary] — either a Bloom-filter
//! [FilterCascade] (bounded false positives, zero false negatives) or a
//! compressed [RevocationVector] (exact, larger). Dictionaries answer
//! [RevocationDictionary::is_revoked] and encode to canonical bytes for
//! signing.
//!
//! All-valid and all-revoked populations short-circuit to constant-answer
//! markers instead of degenerate filters, so the 0% and 100% paths cost
//! nothing to build or ship.

use bytes::{Buf, BufMut};
use letsrevoke_codec::{
    EncodeSize, Error as CodecError, FixedSize, Read, ReadExt as _, Write,
};
use letsrevoke_cryptography::hex;
use std::fmt::{Debug, Display};
use thiserror::Error as ThisError;

pub mod bitvec;
pub use bitvec::BitVec;
pub mod bloom;
pub use bloom::BloomFilter;
pub mod cascade;
pub use cascade::{CascadeCfg, FilterCascade};
pub mod population;
pub use population::Population;
pub mod selector;
pub use selector::{revoked_count, select, RevocationSet, SelectionPolicy};
pub mod vector;
pub use vector::RevocationVector;

/// Default layer-0 false-positive bound: 1/4096 = 2^-12.
pub const DEFAULT_FP_RATE: (u64, u64) = (1, 4096);

/// Default bound on cascade depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Errors raised while building a dictionary.
#[derive(ThisError, Debug)]
pub enum Error {
    #[error("population of {requested} exceeds limit of {limit}")]
    PopulationTooLarge { requested: u64, limit: u64 },
    #[error("percent out of range: {0}")]
    InvalidPercent(f64),
    #[error("invalid false-positive rate")]
    InvalidFalsePositiveRate,
    #[error("cascade depth exceeded: {0}")]
    CascadeDepthExceeded(usize),
    #[error("compression failed: {0}")]
    Compression(#[from] std::io::Error),
}

/// An opaque fixed-width certificate identifier.
///
/// Synthetic populations derive identifiers from sequence numbers; the
/// big-endian encoding keeps identifier order identical to sequence order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct CertificateId([u8; 8]);

impl CertificateId {
    /// Derives the identifier of sequence number `sequence`.
    pub fn from_sequence(sequence: u64) -> Self {
        Self(sequence.to_be_bytes())
    }

    /// Returns the sequence number this identifier was derived from.
    pub fn sequence(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

impl AsRef<[u8]> for CertificateId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Write for CertificateId {
    fn write(&self, buf: &mut impl BufMut) {
        self.0.write(buf);
    }
}

impl Read for CertificateId {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &Self::Cfg) -> Result<Self, CodecError> {
        Ok(Self(<[u8; 8]>::read(buf)?))
    }
}

impl FixedSize for CertificateId {
    const SIZE: usize = 8;
}

impl Debug for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex(&self.0))
    }
}

impl Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex(&self.0))
    }
}

/// How a revocation set is encoded into a dictionary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodingPolicy {
    /// Bloom-filter cascade with the given layer-0 false-positive rate and
    /// depth bound.
    Cascade {
        fp_numerator: u64,
        fp_denominator: u64,
        max_depth: usize,
    },
    /// Compressed bitmap.
    Vector,
}

impl Default for EncodingPolicy {
    fn default() -> Self {
        Self::Cascade {
            fp_numerator: DEFAULT_FP_RATE.0,
            fp_denominator: DEFAULT_FP_RATE.1,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Decode-time bounds for a [RevocationDictionary].
#[derive(Clone, Copy, Debug)]
pub struct DictionaryCfg {
    /// Maximum bits accepted for any contained bit-vector.
    pub max_bits: usize,
    /// Maximum cascade layers accepted.
    pub max_depth: usize,
}

impl Default for DictionaryCfg {
    fn default() -> Self {
        Self {
            max_bits: 1 << 31,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A compact, immutable encoding of a revocation set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevocationDictionary {
    /// Nothing is revoked (0% short circuit).
    AllValid,
    /// Everything is revoked (100% short circuit).
    AllRevoked,
    /// Bloom-filter cascade.
    Cascade(FilterCascade),
    /// Compressed bitmap.
    Vector(RevocationVector),
}

impl RevocationDictionary {
    /// Builds a dictionary from a revocation set.
    ///
    /// Empty and full revocation sets yield the constant-answer markers
    /// regardless of `policy`.
    pub fn build(
        revoked: &RevocationSet,
        population: &Population,
        policy: &EncodingPolicy,
    ) -> Result<Self, Error> {
        if revoked.count() == 0 {
            return Ok(Self::AllValid);
        }
        if revoked.count() == population.len() {
            return Ok(Self::AllRevoked);
        }
        match policy {
            EncodingPolicy::Cascade {
                fp_numerator,
                fp_denominator,
                max_depth,
            } => Ok(Self::Cascade(FilterCascade::build(
                revoked,
                population,
                *fp_numerator,
                *fp_denominator,
                *max_depth,
            )?)),
            EncodingPolicy::Vector => Ok(Self::Vector(RevocationVector::from_set(revoked)?)),
        }
    }

    /// Returns true if `id` is revoked.
    ///
    /// Never a false negative. False positives are bounded by the encoding:
    /// zero for markers and vectors, the configured rate for cascades.
    pub fn is_revoked(&self, id: &CertificateId) -> bool {
        match self {
            Self::AllValid => false,
            Self::AllRevoked => true,
            Self::Cascade(cascade) => cascade.is_revoked(id),
            Self::Vector(vector) => vector.is_revoked(id),
        }
    }

    /// Returns the encoding name, for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AllValid => "all_valid",
            Self::AllRevoked => "all_revoked",
            Self::Cascade(_) => "cascade",
            Self::Vector(_) => "vector",
        }
    }
}

impl Write for RevocationDictionary {
    fn write(&self, buf: &mut impl BufMut) {
        match self {
            Self::AllValid => 0u8.write(buf),
            Self::AllRevoked => 1u8.write(buf),
            Self::Cascade(cascade) => {
                2u8.write(buf);
                cascade.write(buf);
            }
            Self::Vector(vector) => {
                3u8.write(buf);
                vector.write(buf);
            }
        }
    }
}

impl Read for RevocationDictionary {
    type Cfg = DictionaryCfg;

    fn read_cfg(buf: &mut impl Buf, cfg: &Self::Cfg) -> Result<Self, CodecError> {
        match u8::read(buf)? {
            0 => Ok(Self::AllValid),
            1 => Ok(Self::AllRevoked),
            2 => {
                let cascade_cfg = CascadeCfg {
                    max_depth: cfg.max_depth,
                    max_bits: cfg.max_bits,
                };
                Ok(Self::Cascade(FilterCascade::read_cfg(buf, &cascade_cfg)?))
            }
            3 => Ok(Self::Vector(RevocationVector::read_cfg(
                buf,
                &(0..=cfg.max_bits).into(),
            )?)),
            _ => Err(CodecError::Invalid("RevocationDictionary", "invalid tag")),
        }
    }
}

impl EncodeSize for RevocationDictionary {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::AllValid | Self::AllRevoked => 0,
            Self::Cascade(cascade) => cascade.encode_size(),
            Self::Vector(vector) => vector.encode_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use letsrevoke_codec::{Decode, DecodeExt, Encode};

    fn pipeline(total: u64, percent: f64, policy: &EncodingPolicy) -> RevocationDictionary {
        let population = Population::new(total, u64::MAX).unwrap();
        let revoked = select(&population, percent, &SelectionPolicy::Prefix).unwrap();
        RevocationDictionary::build(&revoked, &population, policy).unwrap()
    }

    #[test]
    fn test_zero_percent_short_circuit() {
        let dictionary = pipeline(100, 0.0, &EncodingPolicy::default());
        assert_eq!(dictionary, RevocationDictionary::AllValid);
        for sequence in 0..100 {
            assert!(!dictionary.is_revoked(&CertificateId::from_sequence(sequence)));
        }
    }

    #[test]
    fn test_hundred_percent_short_circuit() {
        let dictionary = pipeline(10, 100.0, &EncodingPolicy::default());
        assert_eq!(dictionary, RevocationDictionary::AllRevoked);
        for sequence in 0..10 {
            assert!(dictionary.is_revoked(&CertificateId::from_sequence(sequence)));
        }
    }

    #[test]
    fn test_empty_population_is_all_valid() {
        let dictionary = pipeline(0, 100.0, &EncodingPolicy::default());
        assert_eq!(dictionary, RevocationDictionary::AllValid);
    }

    #[test]
    fn test_cascade_no_false_negatives() {
        let population = Population::new(10_000, u64::MAX).unwrap();
        let revoked = select(
            &population,
            5.0,
            &SelectionPolicy::Sampled { seed: 11 },
        )
        .unwrap();
        let dictionary =
            RevocationDictionary::build(&revoked, &population, &EncodingPolicy::default())
                .unwrap();
        for index in revoked.indices() {
            assert!(dictionary.is_revoked(&population.id(index)));
        }
    }

    #[test]
    fn test_vector_policy() {
        let dictionary = pipeline(1000, 10.0, &EncodingPolicy::Vector);
        assert_eq!(dictionary.kind(), "vector");
        assert!(dictionary.is_revoked(&CertificateId::from_sequence(99)));
        assert!(!dictionary.is_revoked(&CertificateId::from_sequence(100)));
    }

    #[test]
    fn test_codec_round_trip_all_variants() {
        let cfg = DictionaryCfg::default();
        for dictionary in [
            pipeline(100, 0.0, &EncodingPolicy::default()),
            pipeline(100, 100.0, &EncodingPolicy::default()),
            pipeline(10_000, 1.0, &EncodingPolicy::default()),
            pipeline(10_000, 1.0, &EncodingPolicy::Vector),
        ] {
            let encoded = dictionary.encode();
            let decoded = RevocationDictionary::decode_cfg(encoded, &cfg).unwrap();
            assert_eq!(decoded, dictionary);
        }
    }

    #[test]
    fn test_codec_rejects_invalid_tag() {
        let buf = [9u8];
        assert!(matches!(
            RevocationDictionary::decode_cfg(&buf[..], &DictionaryCfg::default()),
            Err(CodecError::Invalid("RevocationDictionary", "invalid tag"))
        ));
    }

    #[test]
    fn test_certificate_id_round_trip() {
        let id = CertificateId::from_sequence(0xDEADBEEF);
        assert_eq!(id.sequence(), 0xDEADBEEF);
        let decoded = CertificateId::decode(id.encode()).unwrap();
        assert_eq!(decoded, id);
    }

    #[test]
    fn test_certificate_id_order_matches_sequence_order() {
        let a = CertificateId::from_sequence(1);
        let b = CertificateId::from_sequence(256);
        assert!(a < b);
    }
}
