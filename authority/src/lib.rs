//! Produce and verify signed revocation dictionaries over HTTP.
//!
//! The service behind `GET /ct/v1/revoke-and-produce-srd`: it models a
//! synthetic population of `TotalCerts` certificate identifiers, marks
//! `PercentRevoked` percent of them revoked, encodes the result compactly,
//! and signs the artifact so consumers can verify it offline.
//!
//! Requests are independent and stateless: nothing is shared between them
//! but the read-only signing key, so the pipeline runs fully parallel with
//! no locking. See [producer::Producer] for the pipeline itself and
//! [server::router] for the HTTP boundary.

pub mod config;
pub mod error;
pub mod metrics;
pub mod producer;
pub mod server;
pub mod srd;

pub use config::Config;
pub use error::Error;
pub use producer::{Phase, Producer, Request};
pub use server::{serve, State, REVOKE_AND_PRODUCE_SRD_PATH};
pub use srd::{RevocationMetadata, Srd, FORMAT_VERSION, SRD_NAMESPACE};
