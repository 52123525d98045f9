//! Account addresses and the codec that turns them into text and back.
//!
//! The market module never interprets address bytes. It only needs a way to
//! decode the `sender` string of an incoming command and compare the result
//! with the address derived from the signing key. [`AddressCodec`] is that
//! seam; [`Bech32Codec`] is the implementation used on chain.

use std::fmt;

use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{constants, ChainConfig, MarketError, Result};

// ---------------------------------------------------------------------------
// AccAddress
// ---------------------------------------------------------------------------

/// Raw account address bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccAddress(pub Vec<u8>);

impl AccAddress {
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Address of an ed25519 account: the first 20 bytes of `sha256(pubkey)`.
    #[must_use]
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        let hash = Sha256::digest(public_key);
        Self(hash[..constants::DERIVED_ADDR_LEN].to_vec())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(&self.0))
    }
}

/// Random 20-byte address for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl AccAddress {
    pub fn dummy() -> Self {
        Self(rand::random::<[u8; 20]>().to_vec())
    }
}

// ---------------------------------------------------------------------------
// AddressCodec
// ---------------------------------------------------------------------------

/// Converts between textual account identifiers and [`AccAddress`].
pub trait AddressCodec: Send + Sync {
    /// Decode a textual address.
    ///
    /// # Errors
    /// Returns [`MarketError::InvalidAddress`] with the decode failure reason.
    fn parse(&self, text: &str) -> Result<AccAddress>;

    /// Encode an address as text.
    fn format(&self, address: &AccAddress) -> Result<String>;
}

/// Bech32 address codec bound to a single human-readable prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bech32Codec {
    prefix: String,
}

impl Bech32Codec {
    /// Create a codec for the given prefix (e.g. `"cosmos"`).
    ///
    /// # Errors
    /// Returns [`MarketError::Configuration`] if the prefix is not a valid
    /// bech32 human-readable part.
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        let hrp = Hrp::parse(&prefix).map_err(|e| {
            MarketError::Configuration(format!("invalid bech32 prefix {prefix:?}: {e}"))
        })?;
        Ok(Self {
            prefix: hrp.to_lowercase(),
        })
    }

    /// Create a codec from the chain's account prefix.
    pub fn from_config(config: &ChainConfig) -> Result<Self> {
        Self::new(config.bech32_account_prefix.clone())
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for Bech32Codec {
    fn default() -> Self {
        Self {
            prefix: constants::DEFAULT_BECH32_ACCOUNT_PREFIX.to_string(),
        }
    }
}

impl AddressCodec for Bech32Codec {
    fn parse(&self, text: &str) -> Result<AccAddress> {
        if text.trim().is_empty() {
            return Err(MarketError::invalid_address(
                "empty address string is not allowed",
            ));
        }

        // Classic bech32 checksum only; bech32m strings are rejected.
        let checked = CheckedHrpstring::new::<Bech32>(text)
            .map_err(|e| MarketError::invalid_address(format!("decoding bech32 failed: {e}")))?;

        let got = checked.hrp().to_lowercase();
        if got != self.prefix {
            return Err(MarketError::invalid_address(format!(
                "invalid Bech32 prefix; expected {}, got {got}",
                self.prefix
            )));
        }

        let data: Vec<u8> = checked.byte_iter().collect();
        verify_address_format(&data)?;
        Ok(AccAddress(data))
    }

    fn format(&self, address: &AccAddress) -> Result<String> {
        verify_address_format(address.as_bytes())?;
        let hrp = Hrp::parse(&self.prefix)
            .map_err(|e| MarketError::Configuration(format!("invalid bech32 prefix: {e}")))?;
        bech32::encode::<Bech32>(hrp, address.as_bytes())
            .map_err(|e| MarketError::invalid_address(format!("encoding bech32 failed: {e}")))
    }
}

/// Length rules every decoded address must satisfy.
fn verify_address_format(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(MarketError::invalid_address("addresses cannot be empty"));
    }
    if bytes.len() > constants::MAX_ADDR_LEN {
        return Err(MarketError::invalid_address(format!(
            "address max length is {}, got {}",
            constants::MAX_ADDR_LEN,
            bytes.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> Bech32Codec {
        Bech32Codec::default()
    }

    #[test]
    fn format_then_parse_recovers_bytes() {
        let addr = AccAddress::from_bytes([7u8; 20]);
        let text = codec().format(&addr).unwrap();
        assert!(text.starts_with("cosmos1"), "Got: {text}");
        assert_eq!(codec().parse(&text).unwrap(), addr);
    }

    #[test]
    fn uppercase_address_accepted() {
        let text = codec().format(&AccAddress::from_bytes([9u8; 20])).unwrap();
        let upper = text.to_uppercase();
        assert_eq!(codec().parse(&upper).unwrap().as_bytes(), &[9u8; 20]);
    }

    #[test]
    fn empty_string_rejected() {
        let err = codec().parse("").unwrap_err();
        assert!(matches!(err, MarketError::InvalidAddress { .. }));
        assert!(format!("{err}").contains("empty address string"));
    }

    #[test]
    fn garbage_rejected() {
        let err = codec().parse("not-an-address").unwrap_err();
        assert!(matches!(err, MarketError::InvalidAddress { .. }));
    }

    #[test]
    fn bad_checksum_rejected() {
        let mut text = codec().format(&AccAddress::from_bytes([1u8; 20])).unwrap();
        let last = text.pop().unwrap();
        text.push(if last == 'q' { 'p' } else { 'q' });
        assert!(matches!(
            codec().parse(&text),
            Err(MarketError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn wrong_prefix_rejected() {
        let osmo = Bech32Codec::new("osmo").unwrap();
        let text = osmo.format(&AccAddress::from_bytes([3u8; 20])).unwrap();
        let err = codec().parse(&text).unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("expected cosmos, got osmo"), "Got: {msg}");
    }

    #[test]
    fn empty_payload_rejected() {
        let hrp = Hrp::parse("cosmos").unwrap();
        let text = bech32::encode::<Bech32>(hrp, &[]).unwrap();
        let err = codec().parse(&text).unwrap_err();
        assert!(format!("{err}").contains("cannot be empty"));
    }

    #[test]
    fn bech32m_checksum_rejected() {
        let hrp = Hrp::parse("cosmos").unwrap();
        let text = bech32::encode::<bech32::Bech32m>(hrp, &[0x42u8; 20]).unwrap();
        assert!(text.starts_with("cosmos1"));
        assert!(matches!(
            codec().parse(&text),
            Err(MarketError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn oversized_payload_rejected() {
        let hrp = Hrp::parse("cosmos").unwrap();
        let payload = vec![1u8; constants::MAX_ADDR_LEN + 1];
        let text = bech32::encode::<Bech32>(hrp, &payload).unwrap();
        let err = codec().parse(&text).unwrap_err();
        assert!(matches!(err, MarketError::InvalidAddress { .. }));
        assert!(format!("{err}").contains("max length is 255"), "Got: {err}");
    }

    #[test]
    fn max_length_payload_allowed() {
        let hrp = Hrp::parse("cosmos").unwrap();
        let payload = vec![1u8; constants::MAX_ADDR_LEN];
        let text = bech32::encode::<Bech32>(hrp, &payload).unwrap();
        assert_eq!(codec().parse(&text).unwrap().len(), constants::MAX_ADDR_LEN);
    }

    #[test]
    fn thirty_two_byte_addresses_allowed() {
        let addr = AccAddress::from_bytes([5u8; 32]);
        let text = codec().format(&addr).unwrap();
        assert_eq!(codec().parse(&text).unwrap(), addr);
    }

    #[test]
    fn invalid_prefix_is_configuration_error() {
        assert!(matches!(
            Bech32Codec::new(""),
            Err(MarketError::Configuration(_))
        ));
    }

    #[test]
    fn public_key_derivation_is_twenty_bytes() {
        let a = AccAddress::from_public_key(&[1u8; 32]);
        let b = AccAddress::from_public_key(&[1u8; 32]);
        let c = AccAddress::from_public_key(&[2u8; 32]);
        assert_eq!(a.len(), 20);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_is_upper_hex() {
        let addr = AccAddress::from_bytes([0xab, 0x01]);
        assert_eq!(addr.to_string(), "AB01");
    }
}
