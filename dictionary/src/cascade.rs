//! Layered Bloom-filter cascade.
//!
//! Layer 0 encodes the revoked set. Each subsequent layer encodes the false
//! positives the prior layer admits from the opposite side of the population,
//! so the sides alternate: even layers hold revoked-side candidates, odd
//! layers hold valid-side candidates. Construction stops when a layer admits
//! no false positives, which makes membership exact for every population
//! member: an identifier is revoked iff the number of consecutive layers
//! matching it is odd.
//!
//! Identifiers outside the population remain probabilistic: they report
//! revoked with probability bounded by the layer-0 false-positive rate.

use crate::{
    bloom::{BloomFilter, MAX_HASHERS},
    population::Population,
    selector::RevocationSet,
    CertificateId, Error,
};
use bytes::{Buf, BufMut};
use letsrevoke_codec::{EncodeSize, Error as CodecError, Read, ReadExt as _, Write};

/// False-positive rate of layers past the first. Coarse on purpose: deeper
/// layers hold geometrically fewer candidates, so precision there buys
/// nothing.
const DEEPER_LAYER_RATE: (u64, u64) = (1, 256);

/// Decode-time bounds for a [FilterCascade].
#[derive(Clone, Copy, Debug)]
pub struct CascadeCfg {
    /// Maximum number of layers accepted.
    pub max_depth: usize,
    /// Maximum bits accepted per layer.
    pub max_bits: usize,
}

/// A layered cascade of Bloom filters encoding a revocation set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterCascade {
    layers: Vec<BloomFilter>,
}

impl FilterCascade {
    /// Builds a cascade over `revoked` at a layer-0 false-positive rate of
    /// `fp_numerator / fp_denominator`.
    ///
    /// Construction is an explicit loop over an indexed layer list; the
    /// population is streamed per pass rather than materialized. Fails with
    /// [Error::CascadeDepthExceeded] if the candidate sets have not emptied
    /// after `max_depth` layers.
    pub fn build(
        revoked: &RevocationSet,
        population: &Population,
        fp_numerator: u64,
        fp_denominator: u64,
        max_depth: usize,
    ) -> Result<Self, Error> {
        let mut layers = Vec::new();

        // Candidates guaranteed to be inserted into the next layer. The
        // valid side starts as the whole complement of `revoked` and is only
        // materialized once filtered down by layer 0.
        let mut inside: Vec<u64> = revoked.indices().collect();
        let mut outside: Option<Vec<u64>> = None;

        while !inside.is_empty() {
            if layers.len() == max_depth {
                return Err(Error::CascadeDepthExceeded(max_depth));
            }
            let (fp_num, fp_den) = if layers.is_empty() {
                (fp_numerator, fp_denominator)
            } else {
                DEEPER_LAYER_RATE
            };
            let mut layer = BloomFilter::with_rate(inside.len(), fp_num, fp_den)?;
            for &index in &inside {
                layer.insert(population.id(index).as_ref());
            }

            // Whatever the new layer admits from the opposite side must be
            // re-filtered by the next layer.
            let survivors: Vec<u64> = match &outside {
                None => (0..population.len())
                    .filter(|&index| !revoked.contains(index))
                    .filter(|&index| layer.contains(population.id(index).as_ref()))
                    .collect(),
                Some(previous) => previous
                    .iter()
                    .copied()
                    .filter(|&index| layer.contains(population.id(index).as_ref()))
                    .collect(),
            };

            layers.push(layer);
            outside = Some(std::mem::take(&mut inside));
            inside = survivors;
        }

        Ok(Self { layers })
    }

    /// Returns true if `id` is revoked.
    ///
    /// Exact for population members; bounded false-positive probability for
    /// identifiers outside the population.
    pub fn is_revoked(&self, id: &CertificateId) -> bool {
        let mut matched = 0usize;
        for layer in &self.layers {
            if !layer.contains(id.as_ref()) {
                break;
            }
            matched += 1;
        }
        matched % 2 == 1
    }

    /// Returns the number of layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Returns the total number of filter bits across all layers.
    pub fn bits(&self) -> usize {
        self.layers.iter().map(BloomFilter::bits).sum()
    }
}

impl Write for FilterCascade {
    fn write(&self, buf: &mut impl BufMut) {
        (self.layers.len() as u8).write(buf);
        for layer in &self.layers {
            layer.write(buf);
        }
    }
}

impl Read for FilterCascade {
    type Cfg = CascadeCfg;

    fn read_cfg(buf: &mut impl Buf, cfg: &Self::Cfg) -> Result<Self, CodecError> {
        let depth = u8::read(buf)? as usize;
        if depth > cfg.max_depth {
            return Err(CodecError::Invalid("FilterCascade", "too many layers"));
        }
        let layer_cfg = (
            (1..=MAX_HASHERS as usize).into(),
            (1..=cfg.max_bits).into(),
        );
        let mut layers = Vec::with_capacity(depth);
        for _ in 0..depth {
            layers.push(BloomFilter::read_cfg(buf, &layer_cfg)?);
        }
        Ok(Self { layers })
    }
}

impl EncodeSize for FilterCascade {
    fn encode_size(&self) -> usize {
        1 + self
            .layers
            .iter()
            .map(EncodeSize::encode_size)
            .sum::<usize>()
    }
}
