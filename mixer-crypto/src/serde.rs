//! Utilities for serializing and deserializing `mixer_crypto` types using Serde.
//!
//! [`SerializeElement`] looks to Serde like a "module" which can be used with the
//! `#[serde(with = "SerializeElement")]` syntax in order to add serialization/deserialization
//! functionality to `bls12_381` types which otherwise do not provide `Serialize` and `Deserialize`
//! implementations. Deserialization applies the same canonicity checks as the fixed-size
//! [`wire`](crate::wire) codec: points must be valid compressed G1 elements and scalars must be
//! reduced.

use crate::common::*;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Serialization/deserialization functionality for external `bls12_381` types.
///
/// G1 elements use the `bls12_381` crate's 48-byte compressed encoding; scalars use their 32-byte
/// little-endian encoding.
pub trait SerializeElement: Sized {
    /// Proxy serialization function telling serde how to serialize the implementing type.
    fn serialize<S>(this: &Self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer;

    /// Proxy deserialization function telling serde how to deserialize the implementing type.
    fn deserialize<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>;
}

impl SerializeElement for G1Affine {
    fn serialize<S>(this: &Self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_big_array::BigArray::serialize(&this.to_compressed(), serializer)
    }

    fn deserialize<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let maybe_g1: Option<G1Affine> =
            G1Affine::from_compressed(&serde_big_array::BigArray::deserialize(deserializer)?)
                .into();
        maybe_g1.ok_or_else(|| de::Error::custom("invalid element encoding"))
    }
}

impl SerializeElement for G1Projective {
    fn serialize<S>(this: &Self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        G1Affine::serialize(&this.into(), serializer)
    }

    fn deserialize<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        G1Affine::deserialize(deserializer).map(Into::into)
    }
}

impl SerializeElement for Scalar {
    fn serialize<S>(this: &Self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        this.to_bytes().serialize(serializer)
    }

    fn deserialize<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = <[u8; 32]>::deserialize(deserializer)?;
        let maybe_scalar: Option<Scalar> = Scalar::from_bytes(&bytes).into();
        maybe_scalar.ok_or_else(|| de::Error::custom("invalid scalar encoding"))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ff::Field;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Pair {
        #[serde(with = "SerializeElement")]
        point: G1Projective,
        #[serde(with = "SerializeElement")]
        scalar: Scalar,
    }

    #[test]
    fn elements_survive_bincode() {
        let mut rng = crate::test::rng();
        let pair = Pair {
            point: G1Projective::random(&mut rng),
            scalar: Scalar::random(&mut rng),
        };
        let bytes = bincode::serialize(&pair).unwrap();
        let decoded: Pair = bincode::deserialize(&bytes).unwrap();
        assert_eq!(pair, decoded);
    }

    #[derive(Debug, Deserialize)]
    struct Wrapped(#[serde(with = "SerializeElement")] Scalar);

    #[test]
    fn unreduced_scalar_is_rejected() {
        let bytes = bincode::serialize(&[0xffu8; 32]).unwrap();
        assert!(bincode::deserialize::<Wrapped>(&bytes).is_err());
    }
}
