use std::fmt;

use alloy::{
    primitives::{Address, FixedBytes, B256},
    signers::local::PrivateKeySigner,
};
use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_ff::{BigInt, BigInteger, Field, PrimeField, Zero};
use avs_primitives::{SignerIdentity, BLS_PUBLIC_KEY_LEN, BLS_SIGNATURE_LEN};

use crate::errors::IdentityError;

const FIELD_LEN: usize = 32;

/// BN254 key pair with signatures in G1 and public keys in G2.
///
/// Points use the EVM precompile layout: big-endian coordinates, G1 as `x || y` and G2 as
/// `x.c1 || x.c0 || y.c1 || y.c0`.
pub struct BlsKeyPair {
    secret: Fr,
    public: G2Affine,
}

impl fmt::Debug for BlsKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlsKeyPair")
            .field("public", &self.public_key_bytes())
            .finish_non_exhaustive()
    }
}

impl BlsKeyPair {
    /// Loads a big-endian 32-byte secret scalar. It must be non-zero and below the group order.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, IdentityError> {
        if bytes.len() != FIELD_LEN {
            return Err(IdentityError::InvalidBlsKey(format!(
                "expected {FIELD_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let secret = Fr::from_be_bytes_mod_order(bytes);
        if secret.is_zero() || secret.into_bigint().to_bytes_be().as_slice() != bytes {
            return Err(IdentityError::InvalidBlsKey(
                "secret scalar is zero or not below the group order".to_owned(),
            ));
        }

        let public = (G2Affine::generator() * secret).into_affine();
        Ok(Self { secret, public })
    }

    pub fn public_key_bytes(&self) -> FixedBytes<BLS_PUBLIC_KEY_LEN> {
        g2_to_bytes(&self.public)
    }

    pub fn sign_digest(&self, digest: &B256) -> FixedBytes<BLS_SIGNATURE_LEN> {
        let signature = (hash_to_g1(digest) * self.secret).into_affine();
        g1_to_bytes(&signature)
    }
}

/// Checks a G1 signature over `digest` against a G2 public key.
pub fn verify_signature(public_key: &[u8], digest: &B256, signature: &[u8]) -> bool {
    let (Some(public_key), Some(signature)) = (g2_from_bytes(public_key), g1_from_bytes(signature))
    else {
        return false;
    };
    Bn254::pairing(signature, G2Affine::generator()) == Bn254::pairing(hash_to_g1(digest), public_key)
}

/// Try-and-increment from `x = digest mod p`, with `y = (x^3 + 3)^((p + 1) / 4)`.
///
/// Matches `BN254.hashToG1` in the middleware contracts that check aggregated signatures.
fn hash_to_g1(digest: &B256) -> G1Affine {
    let mut sqrt_exponent = Fq::MODULUS;
    let overflow = sqrt_exponent.add_with_carry(&BigInt::from(1u64));
    debug_assert!(!overflow);
    sqrt_exponent.div2();
    sqrt_exponent.div2();

    let curve_b = Fq::from(3u64);
    let mut x = Fq::from_be_bytes_mod_order(digest.as_slice());
    loop {
        let beta = x * x * x + curve_b;
        let y = beta.pow(sqrt_exponent);
        if y.square() == beta {
            return G1Affine::new_unchecked(x, y);
        }
        x += Fq::ONE;
    }
}

fn write_fq(out: &mut [u8], value: &Fq) {
    out.copy_from_slice(&value.into_bigint().to_bytes_be());
}

/// Parses a canonical big-endian base field element.
fn read_fq(bytes: &[u8]) -> Option<Fq> {
    let value = Fq::from_be_bytes_mod_order(bytes);
    (value.into_bigint().to_bytes_be().as_slice() == bytes).then_some(value)
}

fn g1_to_bytes(point: &G1Affine) -> FixedBytes<BLS_SIGNATURE_LEN> {
    let mut out = [0u8; BLS_SIGNATURE_LEN];
    if !point.infinity {
        write_fq(&mut out[..FIELD_LEN], &point.x);
        write_fq(&mut out[FIELD_LEN..], &point.y);
    }
    FixedBytes::from(out)
}

fn g2_to_bytes(point: &G2Affine) -> FixedBytes<BLS_PUBLIC_KEY_LEN> {
    let mut out = [0u8; BLS_PUBLIC_KEY_LEN];
    if !point.infinity {
        let coordinates = [point.x.c1, point.x.c0, point.y.c1, point.y.c0];
        for (chunk, value) in out.chunks_exact_mut(FIELD_LEN).zip(&coordinates) {
            write_fq(chunk, value);
        }
    }
    FixedBytes::from(out)
}

/// Rejects the point at infinity along with anything off the curve.
fn g1_from_bytes(bytes: &[u8]) -> Option<G1Affine> {
    if bytes.len() != BLS_SIGNATURE_LEN {
        return None;
    }
    let point = G1Affine::new_unchecked(
        read_fq(&bytes[..FIELD_LEN])?,
        read_fq(&bytes[FIELD_LEN..])?,
    );
    point.is_on_curve().then_some(point)
}

fn g2_from_bytes(bytes: &[u8]) -> Option<G2Affine> {
    if bytes.len() != BLS_PUBLIC_KEY_LEN {
        return None;
    }
    let mut coordinates = bytes.chunks_exact(FIELD_LEN).map(read_fq);
    let mut next = || coordinates.next().flatten();
    let (x_c1, x_c0, y_c1, y_c0) = (next()?, next()?, next()?, next()?);

    let point = G2Affine::new_unchecked(Fq2::new(x_c0, x_c1), Fq2::new(y_c0, y_c1));
    (point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()).then_some(point)
}

/// The keys and address an operator acts under.
///
/// Built once at startup and shared read-only afterwards.
pub struct OperatorIdentity {
    address: Address,
    bls: BlsKeyPair,
    tx_signer: PrivateKeySigner,
}

impl fmt::Debug for OperatorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorIdentity")
            .field("address", &self.address)
            .field("bls", &self.bls)
            .finish_non_exhaustive()
    }
}

impl OperatorIdentity {
    /// Builds the identity, checking `configured_address` (if any) against the ECDSA key.
    pub fn new(
        bls: BlsKeyPair,
        tx_signer: PrivateKeySigner,
        configured_address: Option<Address>,
    ) -> Result<Self, IdentityError> {
        let signer = tx_signer.address();
        if let Some(configured) = configured_address {
            if configured != signer {
                return Err(IdentityError::AddressMismatch { configured, signer });
            }
        }
        Ok(Self {
            address: signer,
            bls,
            tx_signer,
        })
    }

    pub fn ecdsa_signer_from_bytes(bytes: &[u8]) -> Result<PrivateKeySigner, IdentityError> {
        PrivateKeySigner::from_slice(bytes).map_err(|e| IdentityError::InvalidEcdsaKey(e.to_string()))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn bls(&self) -> &BlsKeyPair {
        &self.bls
    }

    pub fn tx_signer(&self) -> &PrivateKeySigner {
        &self.tx_signer
    }

    pub fn signer_identity(&self) -> SignerIdentity {
        SignerIdentity {
            address: self.address,
            bls_public_key: self.bls.public_key_bytes(),
        }
    }
}
