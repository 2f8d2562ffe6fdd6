//! Off-chain signed allowances (permit).
//!
//! A permit lets an owner grant an allowance without sending a transaction
//! themselves: they sign a digest off-chain and anyone may submit it. The
//! digest is domain-separated by chain id and token address so a signature
//! can never be replayed on another chain or another soul token, and every
//! field is length- or width-prefixed so preimages cannot collide.

use ed25519_dalek::{Signature, VerifyingKey};
use lib_types::{Address, Amount, PersonId};

use crate::errors::{TokenError, TokenResult};

/// Domain tag for permit digests (versioned for future migrations)
pub const PERMIT_DOMAIN_TAG: &[u8] = b"NILE_SOUL_PERMIT_V1";

/// Compute the digest an owner signs to grant an allowance.
///
/// Preimage layout (all integers big-endian):
///
/// ```text
/// "NILE_SOUL_PERMIT_V1" || chain_id:u64 || token:32 || person_id:16
///   || owner:32 || spender:32 || value:u128 || nonce:u64 || deadline:u64
/// ```
#[allow(clippy::too_many_arguments)]
pub fn permit_digest(
    chain_id: u64,
    token: &Address,
    person_id: &PersonId,
    owner: &Address,
    spender: &Address,
    value: Amount,
    nonce: u64,
    deadline: u64,
) -> [u8; 32] {
    let mut data = Vec::with_capacity(PERMIT_DOMAIN_TAG.len() + 8 + 32 + 16 + 32 + 32 + 16 + 8 + 8);
    data.extend_from_slice(PERMIT_DOMAIN_TAG);
    data.extend_from_slice(&chain_id.to_be_bytes());
    data.extend_from_slice(token.as_bytes());
    data.extend_from_slice(person_id.as_bytes());
    data.extend_from_slice(owner.as_bytes());
    data.extend_from_slice(spender.as_bytes());
    data.extend_from_slice(&value.to_be_bytes());
    data.extend_from_slice(&nonce.to_be_bytes());
    data.extend_from_slice(&deadline.to_be_bytes());

    *blake3::hash(&data).as_bytes()
}

/// Verify an ed25519 permit signature and return the signer's address.
///
/// The caller still has to check that the returned address equals the
/// permit's `owner`; this function only establishes who signed.
pub fn recover_signer(
    digest: &[u8; 32],
    key_bytes: &[u8; 32],
    signature_bytes: &[u8; 64],
) -> TokenResult<Address> {
    let key = VerifyingKey::from_bytes(key_bytes).map_err(|_| TokenError::InvalidSignature)?;
    let signature = Signature::from_bytes(signature_bytes);
    key.verify_strict(digest, &signature)
        .map_err(|_| TokenError::InvalidSignature)?;
    Ok(Address::from_public_key(key_bytes))
}
