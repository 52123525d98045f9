//! Account signing keys.
//!
//! Accounts sign with ed25519. The account address is derived from the
//! public key ([`AccAddress::from_public_key`]), which is what ties a
//! signature back to the `sender` a message names.

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use marketlink_types::{AccAddress, AddressCodec, MarketError, Result};
use rand::rngs::OsRng;

/// An account's ed25519 signing key.
pub struct AccountKey {
    signing_key: SigningKey,
}

impl AccountKey {
    /// Deterministic key from a 32-byte seed.
    #[must_use]
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Fresh key from the OS random source.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    #[must_use]
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    #[must_use]
    pub fn address(&self) -> AccAddress {
        AccAddress::from_public_key(&self.public_key())
    }

    /// The account address as text, in the codec's format.
    pub fn address_string(&self, codec: &dyn AddressCodec) -> Result<String> {
        codec.format(&self.address())
    }

    #[must_use]
    pub fn sign(&self, bytes: &[u8]) -> [u8; 64] {
        self.signing_key.sign(bytes).to_bytes()
    }
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountKey")
            .field("public_key", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

/// Verify an ed25519 signature.
///
/// # Errors
/// - `InvalidPublicKey` if `public_key` is not a valid curve point
/// - `InvalidSignature` if the signature does not verify
pub fn verify_signature(public_key: &[u8; 32], bytes: &[u8], signature: &[u8; 64]) -> Result<()> {
    let key = VerifyingKey::from_bytes(public_key).map_err(|e| MarketError::InvalidPublicKey {
        reason: e.to_string(),
    })?;
    key.verify(bytes, &Signature::from_bytes(signature))
        .map_err(|_| MarketError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use marketlink_types::Bech32Codec;

    use super::*;

    #[test]
    fn seed_is_deterministic() {
        let a = AccountKey::from_seed([1u8; 32]);
        let b = AccountKey::from_seed([1u8; 32]);
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(
            AccountKey::generate().public_key(),
            AccountKey::generate().public_key()
        );
    }

    #[test]
    fn sign_then_verify() {
        let key = AccountKey::from_seed([2u8; 32]);
        let sig = key.sign(b"close order-1");
        assert!(verify_signature(&key.public_key(), b"close order-1", &sig).is_ok());
    }

    #[test]
    fn tampered_bytes_fail() {
        let key = AccountKey::from_seed([2u8; 32]);
        let sig = key.sign(b"close order-1");
        assert_eq!(
            verify_signature(&key.public_key(), b"close order-2", &sig),
            Err(MarketError::InvalidSignature)
        );
    }

    #[test]
    fn wrong_key_fails() {
        let key = AccountKey::from_seed([2u8; 32]);
        let other = AccountKey::from_seed([3u8; 32]);
        let sig = key.sign(b"payload");
        assert_eq!(
            verify_signature(&other.public_key(), b"payload", &sig),
            Err(MarketError::InvalidSignature)
        );
    }

    #[test]
    fn address_string_uses_codec_prefix() {
        let key = AccountKey::from_seed([4u8; 32]);
        let text = key.address_string(&Bech32Codec::default()).unwrap();
        assert!(text.starts_with("cosmos1"));
        assert_eq!(Bech32Codec::default().parse(&text).unwrap(), key.address());
    }

    #[test]
    fn debug_hides_secret() {
        let key = AccountKey::from_seed([5u8; 32]);
        let dbg = format!("{key:?}");
        assert!(dbg.contains(&hex::encode(key.public_key())));
        assert!(!dbg.contains(&hex::encode([5u8; 32])));
    }
}
