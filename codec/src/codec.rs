//! Core codec traits.

use crate::error::Error;
use bytes::{Buf, BufMut, BytesMut};

/// Types that can be written (encoded) to a buffer.
pub trait Write {
    /// Encodes this value by appending to `buf`.
    fn write(&self, buf: &mut impl BufMut);
}

/// Types that can be read (decoded) from a buffer.
///
/// `Cfg` carries decode-time configuration, most commonly a [crate::RangeCfg]
/// bounding the size of any allocation driven by untrusted input. Types whose
/// decoding needs no configuration use `()`.
pub trait Read: Sized {
    /// Decode-time configuration.
    type Cfg;

    /// Reads a value from `buf`, consuming exactly the bytes it encodes.
    fn read_cfg(buf: &mut impl Buf, cfg: &Self::Cfg) -> Result<Self, Error>;
}

/// Types that know the exact length of their encoding.
///
/// `encode_size` MUST return the number of bytes [Write::write] appends.
pub trait EncodeSize {
    /// The length of the encoded value.
    fn encode_size(&self) -> usize;
}

/// Types with a constant encoded length.
pub trait FixedSize {
    /// The length of every encoded value of this type.
    const SIZE: usize;
}

impl<T: FixedSize> EncodeSize for T {
    fn encode_size(&self) -> usize {
        Self::SIZE
    }
}

/// Encoding entry point (blanket-implemented).
pub trait Encode: Write + EncodeSize {
    /// Encodes this value into a freshly allocated buffer.
    ///
    /// Panics if [Write::write] appends a different number of bytes than
    /// [EncodeSize::encode_size] promised.
    fn encode(&self) -> BytesMut {
        let size = self.encode_size();
        let mut buf = BytesMut::with_capacity(size);
        self.write(&mut buf);
        assert_eq!(buf.len(), size, "write() did not write expected bytes");
        buf
    }
}

impl<T: Write + EncodeSize> Encode for T {}

/// Decoding entry point (blanket-implemented): decodes a value and requires
/// the buffer to be fully consumed.
pub trait Decode: Read {
    /// Decodes a value from `buf`, failing if any bytes remain.
    fn decode_cfg(mut buf: impl Buf, cfg: &Self::Cfg) -> Result<Self, Error> {
        let result = Self::read_cfg(&mut buf, cfg)?;
        let remaining = buf.remaining();
        if remaining > 0 {
            return Err(Error::ExtraData(remaining));
        }
        Ok(result)
    }
}

impl<T: Read> Decode for T {}

/// Ergonomic read for types with no decode-time configuration.
pub trait ReadExt: Read<Cfg = ()> {
    /// Reads a value using the `()` config.
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        Self::read_cfg(buf, &())
    }
}

impl<T: Read<Cfg = ()>> ReadExt for T {}

/// Ergonomic decode for types with no decode-time configuration.
pub trait DecodeExt: Decode<Cfg = ()> {
    /// Decodes a value using the `()` config, requiring full consumption.
    fn decode(buf: impl Buf) -> Result<Self, Error> {
        Self::decode_cfg(buf, &())
    }
}

impl<T: Decode<Cfg = ()>> DecodeExt for T {}
