//! # MsgSendClose: the close-order command envelope
//!
//! "Close order `order_id` over channel `(port, channel_id)`, and give up if
//! the packet is still in flight at `timeout_timestamp`."
//!
//! ## Lifecycle
//!
//! ```text
//!   new() ──▶ validate_basic() ──▶ sign_bytes() ──▶ signed tx ──▶ router
//!                                                                   │
//!                                      packet on (port, channel) ◀──┘
//! ```
//!
//! Construction never fails and checks nothing. `validate_basic` only checks
//! that `sender` decodes; the channel and timeout are checked by the handler
//! and relay when the packet is sent.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{canonical, constants, timeout, AccAddress, AddressCodec, Msg, Result};

/// Signed request to close an order on a counterparty chain.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MsgSendClose {
    /// Account that owns the order and signs the command.
    pub sender: String,
    /// Local port of the channel the close packet travels on.
    pub port: String,
    /// Channel on `port`.
    pub channel_id: String,
    /// Absolute packet deadline in nanoseconds since the UNIX epoch.
    /// Encoded as a decimal string on the wire.
    #[serde_as(as = "DisplayFromStr")]
    pub timeout_timestamp: u64,
    /// Order to close. Opaque here.
    pub order_id: String,
}

impl MsgSendClose {
    #[must_use]
    pub fn new(
        sender: impl Into<String>,
        port: impl Into<String>,
        channel_id: impl Into<String>,
        timeout_timestamp: u64,
        order_id: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            port: port.into(),
            channel_id: channel_id.into(),
            timeout_timestamp,
            order_id: order_id.into(),
        }
    }

    /// Envelope that times out [`constants::DEFAULT_PACKET_TIMEOUT_NS`]
    /// after `now_ns`.
    #[must_use]
    pub fn with_default_timeout(
        sender: impl Into<String>,
        port: impl Into<String>,
        channel_id: impl Into<String>,
        order_id: impl Into<String>,
        now_ns: u64,
    ) -> Self {
        let deadline = timeout::deadline_after(
            now_ns,
            Duration::from_nanos(constants::DEFAULT_PACKET_TIMEOUT_NS),
        );
        Self::new(sender, port, channel_id, deadline, order_id)
    }

    /// Always [`constants::ROUTER_KEY`].
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn route(&self) -> &'static str {
        constants::ROUTER_KEY
    }

    /// Always `"Close"`.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn kind(&self) -> &'static str {
        constants::KIND_CLOSE
    }

    /// Canonical JSON of the envelope: sorted keys, no whitespace,
    /// `timeout_timestamp` as a decimal string.
    pub fn sign_bytes(&self) -> Result<Vec<u8>> {
        canonical::to_canonical_json(self)
    }

    /// Check that `sender` decodes to an address.
    ///
    /// # Errors
    /// Returns [`crate::MarketError::InvalidAddress`] with the decode reason.
    pub fn validate_basic(&self, codec: &dyn AddressCodec) -> Result<()> {
        codec.parse(&self.sender).map(|_| ())
    }

    /// The single address that must sign this envelope.
    ///
    /// Safe to call on an unvalidated envelope: an undecodable sender is
    /// reported as [`crate::MarketError::InvalidAddress`].
    pub fn signers(&self, codec: &dyn AddressCodec) -> Result<Vec<AccAddress>> {
        Ok(vec![codec.parse(&self.sender)?])
    }
}

impl Msg for MsgSendClose {
    fn route(&self) -> &'static str {
        MsgSendClose::route(self)
    }

    fn kind(&self) -> &'static str {
        MsgSendClose::kind(self)
    }

    fn amino_name(&self) -> &'static str {
        constants::AMINO_NAME_SEND_CLOSE
    }

    fn validate_basic(&self, codec: &dyn AddressCodec) -> Result<()> {
        MsgSendClose::validate_basic(self, codec)
    }

    fn signers(&self, codec: &dyn AddressCodec) -> Result<Vec<AccAddress>> {
        MsgSendClose::signers(self, codec)
    }

    fn sign_bytes(&self) -> Result<Vec<u8>> {
        MsgSendClose::sign_bytes(self)
    }
}

/// Envelope from a random valid sender. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl MsgSendClose {
    pub fn dummy() -> Self {
        let sender = crate::Bech32Codec::default()
            .format(&AccAddress::dummy())
            .expect("20-byte address always encodes");
        Self::new(
            sender,
            constants::DEFAULT_PORT_ID,
            "channel-0",
            1_700_000_000_000_000_000,
            format!("order-{}", rand::random::<u32>()),
        )
    }
}
