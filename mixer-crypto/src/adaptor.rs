//! ECDSA-style signatures over G1 and adaptor pre-signatures locked to a witness point.
//!
//! A pre-signature on a message under witness point `Y = y·G` has the shape of an ECDSA signature
//! whose nonce point is `R = k·Y` rather than `k·G`. Anyone can check it against `Y`; only a holder
//! of `y` can turn it into a valid signature, by dividing `s` by `y`. Whoever sees both the
//! pre-signature and the completed signature learns `y`.
//!
//! ```
//! # use mixer_crypto::adaptor::SigningKey;
//! # use bls12_381::{G1Projective, Scalar};
//! # let mut rng = rand::thread_rng();
//! let signing_key = SigningKey::new(&mut rng);
//! let verification_key = signing_key.verification_key();
//! let witness = Scalar::from(11u64);
//! let witness_point = G1Projective::generator() * witness;
//!
//! let pre_signature = signing_key.pre_sign(&mut rng, b"pay", witness_point);
//! assert!(pre_signature.pre_verify(b"pay", witness_point, &verification_key));
//!
//! let signature = pre_signature.clone().complete(witness).unwrap();
//! assert!(verification_key.verify(b"pay", &signature));
//! assert_eq!(pre_signature.extract_witness(&signature, witness_point).unwrap(), witness);
//! ```

use crate::{
    common::*,
    proofs::{ChallengeBuilder, DleqProof, DleqStatement},
    serde::SerializeElement,
    wire::{FixedSize, Read, Write},
    Error,
};
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

const MESSAGE_DOMAIN: &[u8] = b"mixer-crypto/ecdsa/message/v1";

/// Digest of a message as a scalar.
fn message_digest(message: &[u8]) -> Scalar {
    ChallengeBuilder::with_domain(MESSAGE_DOMAIN)
        .with_bytes(message)
        .finish()
        .to_scalar()
}

/// The affine x-coordinate of a point, reduced modulo the group order.
fn x_coordinate(point: &G1Projective) -> Scalar {
    let mut uncompressed = G1Affine::from(point).to_uncompressed();
    // Strip the encoding flags from the top three bits.
    uncompressed[0] &= 0x1f;
    let mut wide = [0u8; 64];
    for (slot, byte) in wide.iter_mut().zip(uncompressed[..48].iter().rev()) {
        *slot = *byte;
    }
    Scalar::from_bytes_wide(&wide)
}

fn invert(scalar: Scalar) -> Option<Scalar> {
    scalar.invert().into()
}

/// A secret signing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKey(#[serde(with = "SerializeElement")] Scalar);

/// A public verification key, `sk·G`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKey(#[serde(with = "SerializeElement")] G1Projective);

/// An ordinary signature `(r, s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(with = "SerializeElement")]
    r: Scalar,
    #[serde(with = "SerializeElement")]
    s: Scalar,
}

/// A pre-signature that completes to a [`Signature`] given the discrete log of its witness point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptorPreSignature {
    #[serde(with = "SerializeElement")]
    r: Scalar,
    #[serde(with = "SerializeElement")]
    s: Scalar,
    /// `k·Y`.
    #[serde(with = "SerializeElement")]
    nonce_point: G1Projective,
    /// Shows `R = k·Y` shares its discrete log with the `k·G` a verifier reconstructs.
    proof: DleqProof,
}

impl SigningKey {
    /// Sample a fresh signing key.
    pub fn new(rng: &mut impl Rng) -> Self {
        Self(random_nonzero_scalar(rng))
    }

    /// The matching verification key.
    pub fn verification_key(&self) -> VerificationKey {
        VerificationKey(G1Projective::generator() * self.0)
    }

    /// Sign `message`.
    pub fn sign(&self, rng: &mut impl Rng, message: &[u8]) -> Signature {
        let e = message_digest(message);
        loop {
            let k = random_nonzero_scalar(&mut *rng);
            let r = x_coordinate(&(G1Projective::generator() * k));
            if let Some(s) = self.signing_equation(k, r, e) {
                return Signature { r, s };
            }
        }
    }

    /// Pre-sign `message` so that completion requires the discrete log of `witness_point`.
    pub fn pre_sign(
        &self,
        rng: &mut impl Rng,
        message: &[u8],
        witness_point: G1Projective,
    ) -> AdaptorPreSignature {
        let e = message_digest(message);
        loop {
            let k = random_nonzero_scalar(&mut *rng);
            let nonce_point = witness_point * k;
            let r = x_coordinate(&nonce_point);
            let s = match self.signing_equation(k, r, e) {
                Some(s) => s,
                None => continue,
            };
            let statement = DleqStatement {
                base: witness_point,
                over_generator: G1Projective::generator() * k,
                over_base: nonce_point,
            };
            return AdaptorPreSignature {
                r,
                s,
                nonce_point,
                proof: DleqProof::prove(rng, &statement, k),
            };
        }
    }

    /// `s = k⁻¹·(e + r·sk)`, or `None` when `r` or `s` is zero.
    fn signing_equation(&self, k: Scalar, r: Scalar, e: Scalar) -> Option<Scalar> {
        if r == Scalar::zero() {
            return None;
        }
        let s = invert(k)? * (e + r * self.0);
        if s == Scalar::zero() {
            None
        } else {
            Some(s)
        }
    }
}

impl VerificationKey {
    /// Wrap a public point, rejecting the identity.
    pub fn from_element(point: G1Projective) -> Result<Self, Error> {
        if bool::from(point.is_identity()) {
            return Err(Error::Setup("verification key is the identity"));
        }
        Ok(Self(point))
    }

    /// The public point.
    pub fn to_element(self) -> G1Projective {
        self.0
    }

    /// Verify an ordinary signature.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        match self.reconstruct_nonce(message, signature.r, signature.s) {
            Some(nonce) => x_coordinate(&nonce) == signature.r,
            None => false,
        }
    }

    /// `e·s⁻¹·G + r·s⁻¹·pk`, or `None` if it is undefined or the identity.
    fn reconstruct_nonce(&self, message: &[u8], r: Scalar, s: Scalar) -> Option<G1Projective> {
        if r == Scalar::zero() {
            return None;
        }
        let s_inverse = invert(s)?;
        let e = message_digest(message);
        let nonce = G1Projective::generator() * (e * s_inverse) + self.0 * (r * s_inverse);
        if bool::from(nonce.is_identity()) {
            None
        } else {
            Some(nonce)
        }
    }
}

impl AdaptorPreSignature {
    /// Check the pre-signature against `message`, `witness_point` and the signer's key.
    pub fn pre_verify(
        &self,
        message: &[u8],
        witness_point: G1Projective,
        verification_key: &VerificationKey,
    ) -> bool {
        if bool::from(self.nonce_point.is_identity()) || x_coordinate(&self.nonce_point) != self.r
        {
            return false;
        }
        let over_generator = match verification_key.reconstruct_nonce(message, self.r, self.s) {
            Some(point) => point,
            None => return false,
        };
        self.proof.verify(&DleqStatement {
            base: witness_point,
            over_generator,
            over_base: self.nonce_point,
        })
    }

    /// Complete into an ordinary signature with the witness `y`: `s' = s·y⁻¹`.
    pub fn complete(self, witness: Scalar) -> Result<Signature, Error> {
        let witness_inverse = invert(witness).ok_or(Error::InvalidWitness)?;
        Ok(Signature {
            r: self.r,
            s: self.s * witness_inverse,
        })
    }

    /// Recover the witness from a completion of this pre-signature: `y = s · s'⁻¹`.
    ///
    /// A completed signature may have had `s` negated after the fact, which flips the sign of the
    /// quotient; whichever of `±y` maps to `witness_point` is returned.
    pub fn extract_witness(
        &self,
        signature: &Signature,
        witness_point: G1Projective,
    ) -> Result<Scalar, Error> {
        if signature.r != self.r {
            return Err(Error::WitnessExtraction);
        }
        let y = self.s * invert(signature.s).ok_or(Error::WitnessExtraction)?;
        [y, -y]
            .iter()
            .copied()
            .find(|candidate| same_point(&(G1Projective::generator() * candidate), &witness_point))
            .ok_or(Error::WitnessExtraction)
    }

    /// The `r` component shared with every completion.
    pub fn r(&self) -> Scalar {
        self.r
    }
}

impl Signature {
    /// The `r` component.
    pub fn r(&self) -> Scalar {
        self.r
    }

    /// The `s` component.
    pub fn s(&self) -> Scalar {
        self.s
    }

    /// The signature with `s` negated, which verifies for the same message.
    pub fn negate(&self) -> Self {
        Self {
            r: self.r,
            s: -self.s,
        }
    }
}

impl FixedSize for Signature {
    const SIZE: usize = 2 * Scalar::SIZE;
}

impl Write for Signature {
    fn write(&self, buf: &mut impl BufMut) {
        self.r.write(buf);
        self.s.write(buf);
    }
}

impl Read for Signature {
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        Ok(Self {
            r: Scalar::read(buf)?,
            s: Scalar::read(buf)?,
        })
    }
}

impl FixedSize for AdaptorPreSignature {
    const SIZE: usize = 2 * Scalar::SIZE + G1Projective::SIZE + DleqProof::SIZE;
}

impl Write for AdaptorPreSignature {
    fn write(&self, buf: &mut impl BufMut) {
        self.r.write(buf);
        self.s.write(buf);
        self.nonce_point.write(buf);
        self.proof.write(buf);
    }
}

impl Read for AdaptorPreSignature {
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        Ok(Self {
            r: Scalar::read(buf)?,
            s: Scalar::read(buf)?,
            nonce_point: G1Projective::read(buf)?,
            proof: DleqProof::read(buf)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::{Decode, Encode};
    use ff::Field;

    struct Setup {
        signing_key: SigningKey,
        verification_key: VerificationKey,
        witness: Scalar,
        witness_point: G1Projective,
    }

    fn setup(rng: &mut impl Rng) -> Setup {
        let signing_key = SigningKey::new(&mut *rng);
        let witness = random_nonzero_scalar(&mut *rng);
        Setup {
            verification_key: signing_key.verification_key(),
            signing_key,
            witness,
            witness_point: G1Projective::generator() * witness,
        }
    }

    #[test]
    fn plain_signature_verifies() {
        let mut rng = crate::test::rng();
        let s = setup(&mut rng);
        let signature = s.signing_key.sign(&mut rng, b"escrow");
        assert!(s.verification_key.verify(b"escrow", &signature));
        assert!(!s.verification_key.verify(b"other", &signature));
        assert!(s.verification_key.verify(b"escrow", &signature.negate()));
    }

    #[test]
    fn adaptor_round_trip() {
        let mut rng = crate::test::rng();
        let s = setup(&mut rng);
        let pre = s.signing_key.pre_sign(&mut rng, b"escrow", s.witness_point);
        assert!(pre.pre_verify(b"escrow", s.witness_point, &s.verification_key));

        let signature = pre.clone().complete(s.witness).unwrap();
        assert!(s.verification_key.verify(b"escrow", &signature));
        assert_eq!(pre.extract_witness(&signature, s.witness_point), Ok(s.witness));
    }

    #[test]
    fn extraction_tolerates_negated_signature() {
        let mut rng = crate::test::rng();
        let s = setup(&mut rng);
        let pre = s.signing_key.pre_sign(&mut rng, b"escrow", s.witness_point);
        let negated = pre.clone().complete(s.witness).unwrap().negate();

        assert_eq!(pre.extract_witness(&negated, s.witness_point), Ok(s.witness));
    }

    #[test]
    fn pre_verify_rejects_other_witness_point() {
        let mut rng = crate::test::rng();
        let s = setup(&mut rng);
        let pre = s.signing_key.pre_sign(&mut rng, b"escrow", s.witness_point);
        let other = G1Projective::generator() * Scalar::random(&mut rng);

        assert!(!pre.pre_verify(b"escrow", other, &s.verification_key));
        assert!(!pre.pre_verify(b"other", s.witness_point, &s.verification_key));
        let stranger = SigningKey::new(&mut rng).verification_key();
        assert!(!pre.pre_verify(b"escrow", s.witness_point, &stranger));
    }

    #[test]
    fn completing_with_wrong_witness_does_not_verify() {
        let mut rng = crate::test::rng();
        let s = setup(&mut rng);
        let pre = s.signing_key.pre_sign(&mut rng, b"escrow", s.witness_point);

        let signature = pre.clone().complete(s.witness + Scalar::one()).unwrap();
        assert!(!s.verification_key.verify(b"escrow", &signature));
        assert_eq!(
            pre.extract_witness(&signature, s.witness_point),
            Err(Error::WitnessExtraction)
        );
        assert_eq!(pre.complete(Scalar::zero()), Err(Error::InvalidWitness));
    }

    #[test]
    fn extraction_rejects_unrelated_signature() {
        let mut rng = crate::test::rng();
        let s = setup(&mut rng);
        let pre = s.signing_key.pre_sign(&mut rng, b"escrow", s.witness_point);
        let unrelated = s.signing_key.sign(&mut rng, b"escrow");

        assert_eq!(
            pre.extract_witness(&unrelated, s.witness_point),
            Err(Error::WitnessExtraction)
        );
    }

    #[test]
    fn pre_signature_survives_the_wire() {
        let mut rng = crate::test::rng();
        let s = setup(&mut rng);
        let pre = s.signing_key.pre_sign(&mut rng, b"escrow", s.witness_point);

        let decoded = AdaptorPreSignature::decode(&pre.encode()).unwrap();
        assert!(decoded.pre_verify(b"escrow", s.witness_point, &s.verification_key));
    }
}
