//! Fixed-size binary encodings for the values that cross party boundaries.
//!
//! Every encoding here has a constant length so that all parties agree on it bit for bit:
//! G1 points use the 48-byte compressed form (including its flag bits), scalars use 32
//! little-endian bytes and must be reduced, and integers are big-endian.
//!
//! ```
//! # use mixer_crypto::wire::{Decode, Encode};
//! # use bls12_381::Scalar;
//! let bytes = Scalar::from(11u64).encode();
//! assert_eq!(Scalar::decode(&bytes).unwrap(), Scalar::from(11u64));
//! ```

use crate::{common::*, Error};
use bytes::{Buf, BufMut};

/// Types with a constant encoded length.
pub trait FixedSize {
    /// The encoded length in bytes.
    const SIZE: usize;
}

/// Types that can write themselves to a buffer.
pub trait Write {
    /// Append the encoding of `self` to the buffer.
    fn write(&self, buf: &mut impl BufMut);
}

/// Types that can be read back from a buffer.
pub trait Read: Sized {
    /// Consume an encoding of `Self` from the front of the buffer.
    fn read(buf: &mut impl Buf) -> Result<Self, Error>;
}

/// Encoding to an owned byte vector.
pub trait Encode: Write + FixedSize {
    /// Encode `self` into exactly [`FixedSize::SIZE`] bytes.
    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        self.write(&mut buf);
        buf
    }
}

impl<T: Write + FixedSize> Encode for T {}

/// Decoding from a byte slice holding exactly one value.
pub trait Decode: Read + FixedSize {
    /// Decode a value, rejecting input of the wrong length.
    fn decode(mut bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != Self::SIZE {
            return Err(Error::Encoding("unexpected length"));
        }
        Self::read(&mut bytes)
    }
}

impl<T: Read + FixedSize> Decode for T {}

fn ensure(buf: &impl Buf, len: usize) -> Result<(), Error> {
    if buf.remaining() < len {
        Err(Error::Encoding("truncated input"))
    } else {
        Ok(())
    }
}

impl FixedSize for G1Projective {
    const SIZE: usize = 48;
}

impl Write for G1Projective {
    fn write(&self, buf: &mut impl BufMut) {
        buf.put_slice(&G1Affine::from(self).to_compressed());
    }
}

impl Read for G1Projective {
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        ensure(buf, Self::SIZE)?;
        let mut bytes = [0u8; 48];
        buf.copy_to_slice(&mut bytes);
        let point: Option<G1Affine> = G1Affine::from_compressed(&bytes).into();
        point
            .map(G1Projective::from)
            .ok_or(Error::Encoding("invalid point"))
    }
}

impl FixedSize for Scalar {
    const SIZE: usize = 32;
}

impl Write for Scalar {
    fn write(&self, buf: &mut impl BufMut) {
        buf.put_slice(&self.to_bytes());
    }
}

impl Read for Scalar {
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        ensure(buf, Self::SIZE)?;
        let mut bytes = [0u8; 32];
        buf.copy_to_slice(&mut bytes);
        let scalar: Option<Scalar> = Scalar::from_bytes(&bytes).into();
        scalar.ok_or(Error::Encoding("unreduced scalar"))
    }
}

impl FixedSize for u32 {
    const SIZE: usize = 4;
}

impl Write for u32 {
    fn write(&self, buf: &mut impl BufMut) {
        buf.put_u32(*self);
    }
}

impl Read for u32 {
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        ensure(buf, Self::SIZE)?;
        Ok(buf.get_u32())
    }
}

impl<const N: usize> FixedSize for [u8; N] {
    const SIZE: usize = N;
}

impl<const N: usize> Write for [u8; N] {
    fn write(&self, buf: &mut impl BufMut) {
        buf.put_slice(self);
    }
}

impl<const N: usize> Read for [u8; N] {
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        ensure(buf, N)?;
        let mut bytes = [0u8; N];
        buf.copy_to_slice(&mut bytes);
        Ok(bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn point_encoding_is_compressed() {
        let encoded = G1Projective::generator().encode();
        assert_eq!(encoded.len(), 48);
        // Compression flag is the top bit of the first byte.
        assert_eq!(encoded[0] & 0x80, 0x80);
        assert_eq!(
            G1Projective::decode(&encoded).unwrap(),
            G1Projective::generator()
        );
    }

    #[test]
    fn truncated_and_padded_input_is_rejected() {
        let encoded = Scalar::from(7u64).encode();
        assert!(Scalar::decode(&encoded[..31]).is_err());
        let mut padded = encoded.clone();
        padded.push(0);
        assert!(Scalar::decode(&padded).is_err());
    }

    #[test]
    fn unreduced_scalar_is_rejected() {
        assert_eq!(
            Scalar::decode(&[0xff; 32]),
            Err(Error::Encoding("unreduced scalar"))
        );
    }

    #[test]
    fn garbage_point_is_rejected() {
        assert_eq!(
            G1Projective::decode(&[0xaa; 48]),
            Err(Error::Encoding("invalid point"))
        );
    }
}
