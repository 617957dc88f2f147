//! The signed revocation dictionary artifact.
//!
//! The signature covers the canonical codec bytes of `{metadata,
//! dictionary}` under a domain-separation namespace, so altering any bit of
//! either invalidates it. Verification is a pure function of the artifact
//! and a public key, and fails closed: malformed bytes, truncation, a
//! version mismatch, or a foreign key all yield [Error::VerificationFailed]
//! (or a decode error upstream), never a partially trusted dictionary.

use crate::Error;
use bytes::{Buf, BufMut, BytesMut};
use letsrevoke_codec::{
    EncodeSize, Error as CodecError, FixedSize, Read, ReadExt as _, Write,
};
use letsrevoke_cryptography::{
    ed25519::{PrivateKey, PublicKey, Signature},
    Signer as _, Verifier as _,
};
use letsrevoke_dictionary::{DictionaryCfg, RevocationDictionary};

/// Domain-separation namespace for SRD signatures.
pub const SRD_NAMESPACE: &[u8] = b"_LETSREVOKE_SRD";

/// Current artifact format version.
pub const FORMAT_VERSION: u8 = 1;

/// Metadata bound into every signed revocation dictionary.
#[derive(Clone, Debug, PartialEq)]
pub struct RevocationMetadata {
    /// Artifact format version.
    pub version: u8,
    /// Size of the population the dictionary covers.
    pub total_certs: u64,
    /// Requested revocation percentage.
    pub percent_revoked: f64,
    /// Exact number of revoked identifiers.
    pub revoked_count: u64,
    /// Generation time, unix milliseconds.
    pub generated_at: u64,
    /// Public key of the producing authority.
    pub authority: PublicKey,
}

impl Write for RevocationMetadata {
    fn write(&self, buf: &mut impl BufMut) {
        self.version.write(buf);
        self.total_certs.write(buf);
        self.percent_revoked.write(buf);
        self.revoked_count.write(buf);
        self.generated_at.write(buf);
        self.authority.write(buf);
    }
}

impl Read for RevocationMetadata {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &Self::Cfg) -> Result<Self, CodecError> {
        let version = u8::read(buf)?;
        if version != FORMAT_VERSION {
            return Err(CodecError::Invalid(
                "RevocationMetadata",
                "unsupported version",
            ));
        }
        let total_certs = u64::read(buf)?;
        let percent_revoked = f64::read(buf)?;
        let revoked_count = u64::read(buf)?;
        let generated_at = u64::read(buf)?;
        let authority = PublicKey::read(buf)?;
        Ok(Self {
            version,
            total_certs,
            percent_revoked,
            revoked_count,
            generated_at,
            authority,
        })
    }
}

impl FixedSize for RevocationMetadata {
    const SIZE: usize =
        u8::SIZE + u64::SIZE + f64::SIZE + u64::SIZE + u64::SIZE + PublicKey::SIZE;
}

/// A signed revocation dictionary.
///
/// Self-contained and immutable: created once per request, returned to the
/// caller, never shared or mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Srd {
    pub metadata: RevocationMetadata,
    pub dictionary: RevocationDictionary,
    pub signature: Signature,
}

impl Srd {
    /// Signs `{metadata, dictionary}` with `signer`.
    pub fn sign(
        metadata: RevocationMetadata,
        dictionary: RevocationDictionary,
        signer: &PrivateKey,
    ) -> Self {
        let payload = Self::payload(&metadata, &dictionary);
        let signature = signer.sign(Some(SRD_NAMESPACE), &payload);
        Self {
            metadata,
            dictionary,
            signature,
        }
    }

    /// Verifies the artifact against `authority`.
    pub fn verify(&self, authority: &PublicKey) -> Result<(), Error> {
        if self.metadata.authority != *authority {
            return Err(Error::VerificationFailed);
        }
        let payload = Self::payload(&self.metadata, &self.dictionary);
        if !authority.verify(Some(SRD_NAMESPACE), &payload, &self.signature) {
            return Err(Error::VerificationFailed);
        }
        Ok(())
    }

    fn payload(metadata: &RevocationMetadata, dictionary: &RevocationDictionary) -> BytesMut {
        let mut buf = BytesMut::with_capacity(metadata.encode_size() + dictionary.encode_size());
        metadata.write(&mut buf);
        dictionary.write(&mut buf);
        buf
    }
}

impl Write for Srd {
    fn write(&self, buf: &mut impl BufMut) {
        self.metadata.write(buf);
        self.dictionary.write(buf);
        self.signature.write(buf);
    }
}

impl Read for Srd {
    type Cfg = DictionaryCfg;

    fn read_cfg(buf: &mut impl Buf, cfg: &Self::Cfg) -> Result<Self, CodecError> {
        let metadata = RevocationMetadata::read(buf)?;
        let dictionary = RevocationDictionary::read_cfg(buf, cfg)?;
        let signature = Signature::read(buf)?;
        Ok(Self {
            metadata,
            dictionary,
            signature,
        })
    }
}

impl EncodeSize for Srd {
    fn encode_size(&self) -> usize {
        self.metadata.encode_size() + self.dictionary.encode_size() + self.signature.encode_size()
    }
}
