//! Revocation selector.
//!
//! Marks an exact share of a population as revoked. Selection is always
//! reproducible: the default policy takes a prefix of the population, and the
//! sampled policy draws from a seeded RNG, so repeated identical requests
//! yield identical dictionaries.

use crate::{bitvec::BitVec, population::Population, Error};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// How revoked identifiers are chosen from a population.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// The first N identifiers in population order.
    Prefix,
    /// N identifiers sampled without replacement from a seeded RNG.
    Sampled { seed: u64 },
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::Prefix
    }
}

/// The subset of a population marked revoked.
///
/// Immutable once computed; represented as a bit per population index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevocationSet {
    pub(crate) bits: BitVec,
    count: u64,
}

impl RevocationSet {
    /// Returns the number of revoked identifiers.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns the size of the population the set was drawn from.
    pub fn population_len(&self) -> u64 {
        self.bits.len() as u64
    }

    /// Returns true if the identifier at `index` is revoked.
    pub fn contains(&self, index: u64) -> bool {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.bits.get(index))
            .unwrap_or(false)
    }

    /// Iterates over revoked population indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.bits.iter_ones().map(|index| index as u64)
    }
}

/// Returns the number of identifiers revoked at `percent` of `total`,
/// rounding half up.
pub fn revoked_count(percent: f64, total: u64) -> u64 {
    ((percent * total as f64) / 100.0).round() as u64
}

/// Selects `percent` percent of `population` as revoked.
///
/// `percent` must lie in `[0, 100]`; the revoked count is exactly
/// [revoked_count].
pub fn select(
    population: &Population,
    percent: f64,
    policy: &SelectionPolicy,
) -> Result<RevocationSet, Error> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(Error::InvalidPercent(percent));
    }
    let total = population.len();
    let count = revoked_count(percent, total);
    debug_assert!(count <= total);

    let mut bits = BitVec::zeroes(total as usize);
    match policy {
        SelectionPolicy::Prefix => {
            for index in 0..count {
                bits.set(index as usize);
            }
        }
        SelectionPolicy::Sampled { seed } => {
            // Floyd's sampling: exactly `count` distinct indices using
            // memory proportional to the selection, not the population.
            let mut rng = StdRng::seed_from_u64(*seed);
            for upper in (total - count)..total {
                let candidate = rng.gen_range(0..=upper);
                if bits.get(candidate as usize).expect("candidate in bounds") {
                    bits.set(upper as usize);
                } else {
                    bits.set(candidate as usize);
                }
            }
        }
    }
    Ok(RevocationSet { bits, count })
}
