//! Paillier encryption \[1\] with the homomorphisms the puzzle needs.
//!
//! Plaintexts are [`Scalar`]s lifted to integers. A ciphertext under modulus `N` is
//! `c = (1 + m·N)·ρᴺ mod N²`, so multiplying ciphertexts adds plaintexts and raising a ciphertext
//! to `β` multiplies its plaintext by `β`. Decryption returns the plaintext integer reduced modulo
//! the group order, which is exact as long as the integer never wraps modulo `N`: the additive
//! puzzle stays far below `N`, and the multiplicative puzzle requires `N > q^(hops+1)`.
//!
//! ```
//! # use mixer_crypto::encryption::EncryptionKeyPair;
//! # use bls12_381::Scalar;
//! # let mut rng = rand::thread_rng();
//! let keys = EncryptionKeyPair::generate(&mut rng, 512).unwrap();
//! let seven = keys.encryption_key().encrypt(&mut rng, Scalar::from(7u64));
//! let eleven = keys.encryption_key().add_plaintext(&seven, Scalar::from(4u64));
//! assert_eq!(keys.decryption_key().decrypt(&eleven).unwrap(), Scalar::from(11u64));
//! ```
//!
//! ## References
//!
//! 1. Pascal Paillier. "Public-key cryptosystems based on composite degree residuosity classes".
//!    EUROCRYPT 1999.

use crate::{
    common::*,
    proofs::{ChallengeBuilder, ChallengeInput},
    Error,
};
use glass_pumpkin::prime;
use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use tracing::debug;

/// Smallest modulus accepted by [`EncryptionKeyPair::generate`].
pub const MIN_MODULUS_BITS: u64 = 512;

/// Public encryption key: the modulus `N`.
///
/// Serialized as `N` alone; deserialization re-validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BigUint", into = "BigUint")]
pub struct EncryptionKey {
    modulus: BigUint,
    modulus_squared: BigUint,
}

/// Secret decryption key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptionKey {
    public: EncryptionKey,
    lambda: BigUint,
    mu: BigUint,
}

/// A matched encryption and decryption key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionKeyPair {
    decryption_key: DecryptionKey,
}

/// A Paillier ciphertext, an element of `Z*_{N²}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext(BigUint);

/// The randomness `ρ ∈ Z*_N` used in one encryption.
///
/// Kept by a relay so it can prove what it encrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce(BigUint);

impl EncryptionKeyPair {
    /// Generate a key pair whose modulus has exactly `modulus_bits` bits.
    pub fn generate(rng: &mut impl Rng, modulus_bits: u64) -> Result<Self, Error> {
        if modulus_bits < MIN_MODULUS_BITS || modulus_bits % 2 != 0 {
            return Err(Error::Setup("unsupported encryption modulus size"));
        }
        let (p, q) = loop {
            let p = generate_prime(&mut *rng, modulus_bits / 2)?;
            let q = generate_prime(&mut *rng, modulus_bits / 2)?;
            if p != q && (&p * &q).bits() == modulus_bits {
                break (p, q);
            }
        };
        Self::from_primes(&p, &q)
    }

    /// Build a key pair from the two secret primes.
    pub fn from_primes(p: &BigUint, q: &BigUint) -> Result<Self, Error> {
        let one = BigUint::one();
        let modulus = p * q;
        let lambda = (p - &one).lcm(&(q - &one));
        let mu = mod_inverse(&lambda, &modulus)
            .ok_or(Error::Setup("encryption primes do not form a valid modulus"))?;
        let public = EncryptionKey::from_modulus(modulus)?;
        debug!(bits = public.modulus_bits(), "generated encryption key pair");
        Ok(Self {
            decryption_key: DecryptionKey { public, lambda, mu },
        })
    }

    /// The public half of the pair.
    pub fn encryption_key(&self) -> &EncryptionKey {
        &self.decryption_key.public
    }

    /// The secret half of the pair.
    pub fn decryption_key(&self) -> &DecryptionKey {
        &self.decryption_key
    }
}

impl EncryptionKey {
    /// Wrap a public modulus.
    pub fn from_modulus(modulus: BigUint) -> Result<Self, Error> {
        if modulus.bits() < MIN_MODULUS_BITS || modulus.is_even() {
            return Err(Error::Setup("invalid encryption modulus"));
        }
        let modulus_squared = &modulus * &modulus;
        Ok(Self {
            modulus,
            modulus_squared,
        })
    }

    /// The bit length of `N`.
    pub fn modulus_bits(&self) -> u64 {
        self.modulus.bits()
    }

    pub(crate) fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub(crate) fn modulus_squared(&self) -> &BigUint {
        &self.modulus_squared
    }

    /// Encrypt `plaintext` under fresh randomness.
    pub fn encrypt(&self, rng: &mut impl Rng, plaintext: Scalar) -> Ciphertext {
        self.encrypt_with_nonce(rng, plaintext).0
    }

    /// Encrypt `plaintext` and return the randomness used.
    pub fn encrypt_with_nonce(&self, rng: &mut impl Rng, plaintext: Scalar) -> (Ciphertext, Nonce) {
        let nonce = self.random_unit(rng);
        let ciphertext = self.encrypt_integer(&scalar_to_integer(plaintext), &nonce);
        (ciphertext, Nonce(nonce))
    }

    /// Compute `(1 + m·N)·ρᴺ mod N²` for an integer plaintext.
    pub(crate) fn encrypt_integer(&self, plaintext: &BigUint, nonce: &BigUint) -> Ciphertext {
        let masked = nonce.modpow(&self.modulus, &self.modulus_squared);
        Ciphertext((self.shift(plaintext) * masked) % &self.modulus_squared)
    }

    /// Homomorphically add a known plaintext: `Enc(x) → Enc(x + Δ)`.
    pub fn add_plaintext(&self, ciphertext: &Ciphertext, delta: Scalar) -> Ciphertext {
        let shift = self.shift(&scalar_to_integer(delta));
        Ciphertext((&ciphertext.0 * shift) % &self.modulus_squared)
    }

    /// Homomorphically add two ciphertexts: `Enc(x) ⊗ Enc(y) = Enc(x + y)`.
    pub fn combine(&self, a: &Ciphertext, b: &Ciphertext) -> Ciphertext {
        Ciphertext((&a.0 * &b.0) % &self.modulus_squared)
    }

    /// Homomorphically scale a ciphertext: `Enc(x) → Enc(β·x)`.
    pub fn scale(&self, ciphertext: &Ciphertext, beta: Scalar) -> Ciphertext {
        Ciphertext(
            ciphertext
                .0
                .modpow(&scalar_to_integer(beta), &self.modulus_squared),
        )
    }

    /// Encode a ciphertext as `2·⌈bits(N)/8⌉` big-endian bytes.
    pub fn encode_ciphertext(&self, ciphertext: &Ciphertext) -> Vec<u8> {
        let width = self.ciphertext_len();
        let raw = ciphertext.0.to_bytes_be();
        let mut out = vec![0u8; width.saturating_sub(raw.len())];
        out.extend_from_slice(&raw);
        out
    }

    /// Decode a ciphertext produced by [`EncryptionKey::encode_ciphertext`].
    pub fn decode_ciphertext(&self, bytes: &[u8]) -> Result<Ciphertext, Error> {
        if bytes.len() != self.ciphertext_len() {
            return Err(Error::Encoding("unexpected ciphertext length"));
        }
        let ciphertext = Ciphertext(BigUint::from_bytes_be(bytes));
        if !self.is_valid(&ciphertext) {
            return Err(Error::Encoding("ciphertext outside the key's group"));
        }
        Ok(ciphertext)
    }

    /// Whether a ciphertext is a unit modulo `N²`.
    pub fn is_valid(&self, ciphertext: &Ciphertext) -> bool {
        ciphertext.0 < self.modulus_squared
            && !ciphertext.0.is_zero()
            && ciphertext.0.gcd(&self.modulus).is_one()
    }

    fn ciphertext_len(&self) -> usize {
        2 * ((self.modulus.bits() as usize + 7) / 8)
    }

    /// `(1 + N)^m mod N² = 1 + (m mod N)·N`.
    pub(crate) fn shift(&self, plaintext: &BigUint) -> BigUint {
        (BigUint::one() + (plaintext % &self.modulus) * &self.modulus) % &self.modulus_squared
    }

    /// Sample a uniform element of `Z*_N`.
    pub(crate) fn random_unit(&self, rng: &mut impl Rng) -> BigUint {
        loop {
            let candidate = rng.gen_biguint_below(&self.modulus);
            if !candidate.is_zero() && candidate.gcd(&self.modulus).is_one() {
                return candidate;
            }
        }
    }
}

impl TryFrom<BigUint> for EncryptionKey {
    type Error = Error;

    fn try_from(modulus: BigUint) -> Result<Self, Error> {
        Self::from_modulus(modulus)
    }
}

impl From<EncryptionKey> for BigUint {
    fn from(key: EncryptionKey) -> Self {
        key.modulus
    }
}

impl ChallengeInput for EncryptionKey {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume_bytes(self.modulus.to_bytes_be());
    }
}

impl DecryptionKey {
    /// The matching public key.
    pub fn encryption_key(&self) -> &EncryptionKey {
        &self.public
    }

    /// Decrypt to the plaintext integer reduced modulo the group order.
    pub fn decrypt(&self, ciphertext: &Ciphertext) -> Result<Scalar, Error> {
        if !self.public.is_valid(ciphertext) {
            return Err(Error::Decryption);
        }
        let n = &self.public.modulus;
        let raised = ciphertext.0.modpow(&self.lambda, &self.public.modulus_squared);
        let plaintext = ((raised - BigUint::one()) / n * &self.mu) % n;
        Ok(integer_to_scalar(&plaintext))
    }
}

impl Ciphertext {
    pub(crate) fn as_integer(&self) -> &BigUint {
        &self.0
    }
}

impl ChallengeInput for Ciphertext {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume_bytes(self.0.to_bytes_be());
    }
}

impl Nonce {
    pub(crate) fn as_integer(&self) -> &BigUint {
        &self.0
    }
}

/// The group order `q` as an integer.
pub(crate) fn group_order() -> BigUint {
    scalar_to_integer(-Scalar::one()) + BigUint::one()
}

/// Lift a scalar to its canonical integer in `[0, q)`.
pub(crate) fn scalar_to_integer(scalar: Scalar) -> BigUint {
    BigUint::from_bytes_le(&scalar.to_bytes())
}

/// Reduce an integer modulo `q`.
pub(crate) fn integer_to_scalar(integer: &BigUint) -> Scalar {
    let reduced = integer % group_order();
    let mut wide = [0u8; 64];
    for (slot, byte) in wide.iter_mut().zip(reduced.to_bytes_le()) {
        *slot = byte;
    }
    Scalar::from_bytes_wide(&wide)
}

fn mod_inverse(value: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    let value = BigInt::from(value.clone());
    let modulus = BigInt::from(modulus.clone());
    let egcd = value.extended_gcd(&modulus);
    if !egcd.gcd.is_one() {
        return None;
    }
    egcd.x.mod_floor(&modulus).to_biguint()
}

fn generate_prime(rng: &mut impl Rng, bits: u64) -> Result<BigUint, Error> {
    prime::from_rng(bits as usize, rng).map_err(|err| {
        debug!(error = %err, bits, "prime generation failed");
        Error::Setup("could not generate an encryption prime")
    })
}
