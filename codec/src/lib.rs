//! Serialize revocation artifacts into canonical bytes.
//!
//! Every artifact the authority signs or ships over the wire is encoded with
//! this crate. The encoding is canonical: a value has exactly one byte
//! representation, so a signature over the encoded bytes commits to the value
//! itself. Decoding is built for untrusted input: every variable-length field
//! is read against a caller-supplied bound ([RangeCfg]) and any trailing or
//! malformed bytes fail the decode rather than being ignored.
//!
//! # Example
//!
//! ```
//! use bytes::{Buf, BufMut};
//! use letsrevoke_codec::{DecodeExt, Encode, EncodeSize, Error, Read, ReadExt, Write};
//!
//! #[derive(Debug, PartialEq)]
//! struct Record {
//!     sequence: u64,
//!     revoked: bool,
//! }
//!
//! impl Write for Record {
//!     fn write(&self, buf: &mut impl BufMut) {
//!         self.sequence.write(buf);
//!         self.revoked.write(buf);
//!     }
//! }
//!
//! impl Read for Record {
//!     type Cfg = ();
//!
//!     fn read_cfg(buf: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
//!         let sequence = u64::read(buf)?;
//!         let revoked = bool::read(buf)?;
//!         Ok(Self { sequence, revoked })
//!     }
//! }
//!
//! impl EncodeSize for Record {
//!     fn encode_size(&self) -> usize {
//!         self.sequence.encode_size() + self.revoked.encode_size()
//!     }
//! }
//!
//! let record = Record { sequence: 42, revoked: true };
//! let encoded = record.encode();
//! assert_eq!(Record::decode(encoded).unwrap(), record);
//! ```

pub mod codec;
pub mod config;
pub mod error;
mod primitives;
pub mod varint;

pub use codec::{Decode, DecodeExt, Encode, EncodeSize, FixedSize, Read, ReadExt, Write};
pub use config::RangeCfg;
pub use error::Error;
