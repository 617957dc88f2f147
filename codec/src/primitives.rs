//! Codec implementations for primitive types.
//!
//! Fixed-width integers are encoded big-endian. `usize` is encoded as a
//! varint and always decoded against a [RangeCfg] because it almost always
//! drives an allocation.

use crate::{
    codec::{EncodeSize, FixedSize, Read, ReadExt, Write},
    config::RangeCfg,
    error::Error,
    varint,
};
use bytes::{Buf, BufMut};

macro_rules! impl_fixed_int {
    ($type:ty, $get:ident, $put:ident) => {
        impl Write for $type {
            #[inline]
            fn write(&self, buf: &mut impl BufMut) {
                buf.$put(*self);
            }
        }

        impl Read for $type {
            type Cfg = ();

            #[inline]
            fn read_cfg(buf: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
                if buf.remaining() < core::mem::size_of::<$type>() {
                    return Err(Error::EndOfBuffer);
                }
                Ok(buf.$get())
            }
        }

        impl FixedSize for $type {
            const SIZE: usize = core::mem::size_of::<$type>();
        }
    };
}

impl_fixed_int!(u8, get_u8, put_u8);
impl_fixed_int!(u16, get_u16, put_u16);
impl_fixed_int!(u32, get_u32, put_u32);
impl_fixed_int!(u64, get_u64, put_u64);
impl_fixed_int!(f64, get_f64, put_f64);

impl Write for bool {
    #[inline]
    fn write(&self, buf: &mut impl BufMut) {
        buf.put_u8(*self as u8);
    }
}

impl Read for bool {
    type Cfg = ();

    #[inline]
    fn read_cfg(buf: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(buf)? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(Error::InvalidBool),
        }
    }
}

impl FixedSize for bool {
    const SIZE: usize = 1;
}

impl<const N: usize> Write for [u8; N] {
    #[inline]
    fn write(&self, buf: &mut impl BufMut) {
        buf.put_slice(self);
    }
}

impl<const N: usize> Read for [u8; N] {
    type Cfg = ();

    #[inline]
    fn read_cfg(buf: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        if buf.remaining() < N {
            return Err(Error::EndOfBuffer);
        }
        let mut array = [0u8; N];
        buf.copy_to_slice(&mut array);
        Ok(array)
    }
}

impl<const N: usize> FixedSize for [u8; N] {
    const SIZE: usize = N;
}

impl Write for usize {
    #[inline]
    fn write(&self, buf: &mut impl BufMut) {
        varint::write(*self as u64, buf);
    }
}

impl Read for usize {
    type Cfg = RangeCfg<usize>;

    fn read_cfg(buf: &mut impl Buf, range: &Self::Cfg) -> Result<Self, Error> {
        let raw = varint::read(buf)?;
        let value = usize::try_from(raw).map_err(|_| Error::InvalidVarint)?;
        if !range.contains(&value) {
            return Err(Error::InvalidLength(value));
        }
        Ok(value)
    }
}

impl EncodeSize for usize {
    #[inline]
    fn encode_size(&self) -> usize {
        varint::size(*self as u64)
    }
}

impl Write for Vec<u8> {
    fn write(&self, buf: &mut impl BufMut) {
        self.len().write(buf);
        buf.put_slice(self);
    }
}

impl Read for Vec<u8> {
    type Cfg = RangeCfg<usize>;

    fn read_cfg(buf: &mut impl Buf, range: &Self::Cfg) -> Result<Self, Error> {
        let len = usize::read_cfg(buf, range)?;
        if buf.remaining() < len {
            return Err(Error::EndOfBuffer);
        }
        let mut bytes = vec![0u8; len];
        buf.copy_to_slice(&mut bytes);
        Ok(bytes)
    }
}

impl EncodeSize for Vec<u8> {
    fn encode_size(&self) -> usize {
        self.len().encode_size() + self.len()
    }
}
