//! Request pipeline: `Received -> Validating -> Building -> Signing ->
//! Completed | Rejected`.
//!
//! Validation is synchronous; invalid input is a client error and is never
//! retried. Building and signing run on a blocking worker under a deadline,
//! so a pathological request times out instead of hanging the server. Each
//! request is independent: the producer is cheap to clone and holds only
//! read-only configuration plus the signing key.

use crate::{
    srd::{RevocationMetadata, Srd, FORMAT_VERSION},
    Error,
};
use letsrevoke_cryptography::{ed25519::PrivateKey, ed25519::PublicKey, Signer as _};
use letsrevoke_dictionary::{
    select, EncodingPolicy, Population, RevocationDictionary, SelectionPolicy,
};
use std::{
    fmt::{self, Display},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};
use tracing::{debug, info, warn};

/// Raw request parameters, as parsed from the wire.
///
/// `total_certs` stays signed until validation so that negative values are
/// representable and rejected rather than mangled.
#[derive(Clone, Copy, Debug)]
pub struct Request {
    pub percent_revoked: f64,
    pub total_certs: i64,
}

/// Pipeline phase, surfaced in structured logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Received,
    Validating,
    Building,
    Signing,
    Completed,
    Rejected,
}

impl Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Validating => "validating",
            Self::Building => "building",
            Self::Signing => "signing",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Produces signed revocation dictionaries.
#[derive(Clone)]
pub struct Producer {
    signer: PrivateKey,
    max_population: u64,
    build_timeout: Duration,
    selection: SelectionPolicy,
    encoding: EncodingPolicy,
}

impl Producer {
    pub fn new(
        signer: PrivateKey,
        max_population: u64,
        build_timeout: Duration,
        selection: SelectionPolicy,
        encoding: EncodingPolicy,
    ) -> Self {
        Self {
            signer,
            max_population,
            build_timeout,
            selection,
            encoding,
        }
    }

    /// Returns the authority public key.
    pub fn public_key(&self) -> PublicKey {
        self.signer.public_key()
    }

    /// Returns the configured population limit.
    pub fn max_population(&self) -> u64 {
        self.max_population
    }

    /// Drives one request through the pipeline.
    pub async fn produce(&self, request: Request) -> Result<Srd, Error> {
        debug!(
            phase = %Phase::Received,
            total_certs = request.total_certs,
            percent_revoked = request.percent_revoked,
            "received request"
        );

        debug!(phase = %Phase::Validating, "validating parameters");
        let (total, percent) = match self.validate(&request) {
            Ok(params) => params,
            Err(err) => {
                info!(phase = %Phase::Rejected, error = %err, "rejected request");
                return Err(err);
            }
        };

        // Build and sign off the async runtime, bounded by the deadline. A
        // request that exceeds it is answered immediately; the worker is
        // left to finish and be discarded.
        let producer = self.clone();
        let started = Instant::now();
        let work = tokio::task::spawn_blocking(move || producer.build(total, percent));
        let result = match tokio::time::timeout(self.build_timeout, work).await {
            Err(_) => Err(Error::Timeout),
            Ok(Err(join)) => Err(Error::Internal(join.to_string())),
            Ok(Ok(result)) => result,
        };

        match &result {
            Ok(srd) => info!(
                phase = %Phase::Completed,
                total_certs = total,
                percent_revoked = percent,
                revoked = srd.metadata.revoked_count,
                dictionary = srd.dictionary.kind(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "produced srd"
            ),
            Err(err) => warn!(
                phase = %Phase::Rejected,
                total_certs = total,
                error = %err,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "failed to produce srd"
            ),
        }
        result
    }

    /// Range-checks raw parameters. `Validating -> Rejected` on failure.
    fn validate(&self, request: &Request) -> Result<(u64, f64), Error> {
        let total = u64::try_from(request.total_certs).map_err(|_| {
            Error::InvalidParameter(format!(
                "TotalCerts must be non-negative, got {}",
                request.total_certs
            ))
        })?;
        if total > self.max_population {
            return Err(Error::ResourceExceeded {
                requested: total,
                limit: self.max_population,
            });
        }
        let percent = request.percent_revoked;
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(Error::InvalidParameter(format!(
                "PercentRevoked must be in [0, 100], got {percent}"
            )));
        }
        Ok((total, percent))
    }

    /// `Building -> Signing -> Completed`, synchronously.
    fn build(&self, total: u64, percent: f64) -> Result<Srd, Error> {
        debug!(phase = %Phase::Building, total, percent, "building dictionary");
        let population = Population::new(total, self.max_population)?;
        let revoked = select(&population, percent, &self.selection)?;
        let dictionary = RevocationDictionary::build(&revoked, &population, &self.encoding)?;

        debug!(phase = %Phase::Signing, dictionary = dictionary.kind(), "signing dictionary");
        let metadata = RevocationMetadata {
            version: FORMAT_VERSION,
            total_certs: total,
            percent_revoked: percent,
            revoked_count: revoked.count(),
            generated_at: unix_ms(),
            authority: self.signer.public_key(),
        };
        Ok(Srd::sign(metadata, dictionary, &self.signer))
    }
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn producer(max_population: u64, build_timeout: Duration) -> Producer {
        Producer::new(
            PrivateKey::from_seed(0),
            max_population,
            build_timeout,
            SelectionPolicy::Prefix,
            EncodingPolicy::default(),
        )
    }

    fn request(total_certs: i64, percent_revoked: f64) -> Request {
        Request {
            total_certs,
            percent_revoked,
        }
    }

    #[tokio::test]
    async fn test_produce_full_revocation() {
        let producer = producer(10_000_000, Duration::from_secs(30));
        let srd = producer.produce(request(10, 100.0)).await.unwrap();
        assert_eq!(srd.metadata.revoked_count, 10);
        assert_eq!(srd.dictionary.kind(), "all_revoked");
        assert!(srd.verify(&producer.public_key()).is_ok());
    }

    #[tokio::test]
    async fn test_produce_no_revocation() {
        let producer = producer(10_000_000, Duration::from_secs(30));
        let srd = producer.produce(request(100, 0.0)).await.unwrap();
        assert_eq!(srd.metadata.revoked_count, 0);
        assert_eq!(srd.dictionary.kind(), "all_valid");
    }

    #[tokio::test]
    async fn test_produce_exact_count() {
        let producer = producer(10_000_000, Duration::from_secs(60));
        let srd = producer.produce(request(1_000_000, 1.0)).await.unwrap();
        assert_eq!(srd.metadata.revoked_count, 10_000);
        assert_eq!(srd.dictionary.kind(), "cascade");
    }

    #[tokio::test]
    async fn test_negative_total_rejected() {
        let producer = producer(10_000_000, Duration::from_secs(30));
        let err = producer.produce(request(-5, 10.0)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_oversized_total_rejected() {
        let producer = producer(1_000, Duration::from_secs(30));
        let err = producer.produce(request(1_001, 10.0)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::ResourceExceeded {
                requested: 1_001,
                limit: 1_000
            }
        ));
    }

    #[tokio::test]
    async fn test_percent_out_of_range_rejected() {
        let producer = producer(10_000_000, Duration::from_secs(30));
        for percent in [-0.1, 100.5, f64::NAN] {
            let err = producer.produce(request(100, percent)).await.unwrap_err();
            assert!(matches!(err, Error::InvalidParameter(_)));
        }
    }

    #[tokio::test]
    async fn test_deadline_enforced() {
        // A large build against a 1ms deadline must answer with Timeout
        // instead of hanging.
        let producer = producer(10_000_000, Duration::from_millis(1));
        let err = producer
            .produce(request(500_000, 10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }

    #[tokio::test]
    async fn test_identical_requests_identical_dictionaries() {
        let producer = producer(10_000_000, Duration::from_secs(30));
        let a = producer.produce(request(10_000, 2.0)).await.unwrap();
        let b = producer.produce(request(10_000, 2.0)).await.unwrap();
        assert_eq!(a.dictionary, b.dictionary);
    }
}
