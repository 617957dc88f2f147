//! Generate keys, sign revocation artifacts, and verify signatures.
//!
//! Signing is namespaced: the namespace is prepended to the message (with a
//! length delimiter, see [union_unique]) so a signature produced for one
//! context can never be replayed in another. The scheme sits behind the
//! [Signer]/[Verifier] traits so it can be rotated without touching any
//! encoding logic.

use thiserror::Error;

pub mod ed25519;
pub mod sha256;
pub use sha256::{hash, Digest};

/// Errors raised when parsing key or signature material.
#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("invalid private key length")]
    InvalidPrivateKeyLength,
    #[error("invalid public key length")]
    InvalidPublicKeyLength,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid signature length")]
    InvalidSignatureLength,
    #[error("invalid digest length")]
    InvalidDigestLength,
}

/// Produces signatures over messages that can be verified with a
/// corresponding [Verifier].
pub trait Signer: Clone + Send + Sync + 'static {
    /// The type of signature produced.
    type Signature;

    /// The corresponding public key type.
    type PublicKey: Verifier<Signature = Self::Signature>;

    /// Returns the public key corresponding to this signer.
    fn public_key(&self) -> Self::PublicKey;

    /// Signs `msg` under `namespace`.
    ///
    /// The message must not be pre-hashed; schemes that require hashing do it
    /// internally. The namespace must match at verification time.
    fn sign(&self, namespace: Option<&[u8]>, msg: &[u8]) -> Self::Signature;
}

/// Verifies signatures over messages.
pub trait Verifier {
    /// The type of signature verified.
    type Signature;

    /// Returns true if `sig` is a valid signature over `msg` under
    /// `namespace`.
    fn verify(&self, namespace: Option<&[u8]>, msg: &[u8], sig: &Self::Signature) -> bool;
}

/// Concatenates a namespace and a message, prepending a varint encoding of
/// the namespace length.
///
/// The delimiter makes the result collision-free across `(namespace, msg)`
/// pairs: no two distinct pairs produce the same bytes.
pub fn union_unique(namespace: &[u8], msg: &[u8]) -> Vec<u8> {
    let prefix = letsrevoke_codec::varint::size(namespace.len() as u64);
    let mut result = Vec::with_capacity(prefix + namespace.len() + msg.len());
    letsrevoke_codec::varint::write(namespace.len() as u64, &mut result);
    result.extend_from_slice(namespace);
    result.extend_from_slice(msg);
    result
}

/// Converts bytes to a lowercase hexadecimal string.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Converts a hexadecimal string to bytes.
pub fn from_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

/// Converts a hexadecimal string to bytes, stripping whitespace and an
/// optional `0x` prefix. Useful for pasting external test vectors verbatim.
pub fn from_hex_formatted(hex: &str) -> Option<Vec<u8>> {
    let stripped = hex.replace(['\t', '\n', '\r', ' '], "");
    let stripped = stripped.strip_prefix("0x").unwrap_or(&stripped);
    from_hex(stripped)
}
