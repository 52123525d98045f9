//! Configuration types for the chain and its market module.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{constants, Bech32Codec, MarketError, Result};

/// Chain-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain identifier, bound into every sign doc.
    pub chain_id: String,
    /// Human-readable part of account addresses (e.g. `"cosmos"`).
    pub bech32_account_prefix: String,
    /// Market module configuration.
    #[serde(default)]
    pub market: MarketModuleConfig,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: constants::DEFAULT_CHAIN_ID.to_string(),
            bech32_account_prefix: constants::DEFAULT_BECH32_ACCOUNT_PREFIX.to_string(),
            market: MarketModuleConfig::default(),
        }
    }
}

impl ChainConfig {
    /// Check the configuration for internal consistency.
    ///
    /// # Errors
    /// Returns [`MarketError::Configuration`] on an empty chain id, an
    /// invalid bech32 prefix, or an invalid market section.
    pub fn validate(&self) -> Result<()> {
        if self.chain_id.trim().is_empty() {
            return Err(MarketError::Configuration("chain_id must not be empty".into()));
        }
        Bech32Codec::new(self.bech32_account_prefix.clone())?;
        self.market.validate()
    }
}

/// Market module configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketModuleConfig {
    /// Port the module is bound to.
    pub port_id: String,
    /// Channels opened on that port.
    pub channels: Vec<ChannelConfig>,
    /// Furthest a close packet may time out, relative to block time.
    pub max_timeout_window_ns: u64,
}

impl Default for MarketModuleConfig {
    fn default() -> Self {
        Self {
            port_id: constants::DEFAULT_PORT_ID.to_string(),
            channels: Vec::new(),
            max_timeout_window_ns: constants::DEFAULT_MAX_TIMEOUT_WINDOW_NS,
        }
    }
}

impl MarketModuleConfig {
    /// Look up a configured channel on this module's port.
    #[must_use]
    pub fn channel(&self, port_id: &str, channel_id: &str) -> Option<&ChannelConfig> {
        if port_id != self.port_id {
            return None;
        }
        self.channels.iter().find(|c| c.channel_id == channel_id)
    }

    fn validate(&self) -> Result<()> {
        if self.port_id.trim().is_empty() {
            return Err(MarketError::Configuration("market.port_id must not be empty".into()));
        }
        if self.max_timeout_window_ns == 0 {
            return Err(MarketError::Configuration(
                "market.max_timeout_window_ns must be positive".into(),
            ));
        }
        let mut seen = HashSet::new();
        for channel in &self.channels {
            if channel.channel_id.trim().is_empty() {
                return Err(MarketError::Configuration("channel_id must not be empty".into()));
            }
            if !seen.insert(channel.channel_id.as_str()) {
                return Err(MarketError::Configuration(format!(
                    "duplicate channel {}",
                    channel.channel_id
                )));
            }
        }
        Ok(())
    }
}

/// Delivery ordering of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelOrdering {
    /// Packets are delivered in sequence order.
    Ordered,
    /// Packets may be delivered in any order.
    Unordered,
}

impl fmt::Display for ChannelOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordered => write!(f, "ORDERED"),
            Self::Unordered => write!(f, "UNORDERED"),
        }
    }
}

/// One channel end on the market port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub channel_id: String,
    pub counterparty_port_id: String,
    pub counterparty_channel_id: String,
    pub ordering: ChannelOrdering,
}

impl ChannelConfig {
    /// Unordered channel to the counterparty's market port.
    #[must_use]
    pub fn unordered(channel_id: impl Into<String>, counterparty_channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            counterparty_port_id: constants::DEFAULT_PORT_ID.to_string(),
            counterparty_channel_id: counterparty_channel_id.into(),
            ordering: ChannelOrdering::Unordered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_channel() -> ChainConfig {
        let mut cfg = ChainConfig::default();
        cfg.market.channels.push(ChannelConfig::unordered("channel-0", "channel-7"));
        cfg
    }

    #[test]
    fn defaults() {
        let cfg = ChainConfig::default();
        assert_eq!(cfg.chain_id, "marketlink-1");
        assert_eq!(cfg.bech32_account_prefix, "cosmos");
        assert_eq!(cfg.market.port_id, "market");
        assert!(cfg.market.channels.is_empty());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn channel_lookup_requires_matching_port() {
        let cfg = config_with_channel();
        assert!(cfg.market.channel("market", "channel-0").is_some());
        assert!(cfg.market.channel("transfer", "channel-0").is_none());
        assert!(cfg.market.channel("market", "channel-1").is_none());
    }

    #[test]
    fn empty_chain_id_rejected() {
        let mut cfg = ChainConfig::default();
        cfg.chain_id = " ".into();
        assert!(matches!(cfg.validate(), Err(MarketError::Configuration(_))));
    }

    #[test]
    fn bad_prefix_rejected() {
        let mut cfg = ChainConfig::default();
        cfg.bech32_account_prefix = String::new();
        assert!(matches!(cfg.validate(), Err(MarketError::Configuration(_))));
    }

    #[test]
    fn duplicate_channel_rejected() {
        let mut cfg = config_with_channel();
        cfg.market.channels.push(ChannelConfig::unordered("channel-0", "channel-9"));
        let err = cfg.validate().unwrap_err();
        assert!(format!("{err}").contains("duplicate channel channel-0"));
    }

    #[test]
    fn zero_timeout_window_rejected() {
        let mut cfg = ChainConfig::default();
        cfg.market.max_timeout_window_ns = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = config_with_channel();
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"UNORDERED\""));
        let back: ChainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.market.channels.len(), 1);
        assert_eq!(back.market.channels[0].counterparty_channel_id, "channel-7");
        assert_eq!(back.market.channels[0].ordering, ChannelOrdering::Unordered);
    }

    #[test]
    fn market_section_optional_in_json() {
        let json = r#"{"chain_id":"test-1","bech32_account_prefix":"osmo"}"#;
        let cfg: ChainConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.market.port_id, "market");
        assert!(cfg.validate().is_ok());
    }
}
