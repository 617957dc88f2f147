//! Certificate population model.

use crate::{CertificateId, Error};

/// An ordered population of certificate identifiers.
///
/// Identifiers are derived from their position, so the population is never
/// materialized: holding one costs the same for ten entries as for ten
/// million. The same `total` always yields the same identifier sequence,
/// which keeps dictionary production reproducible.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Population {
    total: u64,
}

impl Population {
    /// Creates a population of `total` identifiers, bounded by `limit`.
    pub fn new(total: u64, limit: u64) -> Result<Self, Error> {
        if total > limit {
            return Err(Error::PopulationTooLarge {
                requested: total,
                limit,
            });
        }
        Ok(Self { total })
    }

    /// Returns the number of identifiers in the population.
    pub fn len(&self) -> u64 {
        self.total
    }

    /// Returns true if the population is empty.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Returns the identifier at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn id(&self, index: u64) -> CertificateId {
        assert!(index < self.total, "index out of bounds");
        CertificateId::from_sequence(index)
    }

    /// Iterates over all identifiers in population order.
    pub fn iter(&self) -> impl Iterator<Item = CertificateId> + '_ {
        (0..self.total).map(CertificateId::from_sequence)
    }
}
