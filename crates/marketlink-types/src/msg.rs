//! The message abstraction shared by the router and module handlers.
//!
//! A message knows which module must handle it ([`Msg::route`]), a label for
//! its kind, how to check its own structure, who must sign it, and the
//! canonical bytes those signers sign. It does **not** know how it is
//! executed; that is a [`MsgHandler`]'s job.

use serde::{Deserialize, Serialize};

use crate::{AccAddress, Acknowledgement, AddressCodec, MsgSendClose, Packet, PacketOutcome, Result};

/// A routable, signable command.
pub trait Msg {
    /// Route key of the module that handles this message.
    fn route(&self) -> &'static str;

    /// Short label for the message kind.
    fn kind(&self) -> &'static str;

    /// Type name under which this message is embedded in a sign doc.
    fn amino_name(&self) -> &'static str;

    /// Stateless structural checks.
    fn validate_basic(&self, codec: &dyn AddressCodec) -> Result<()>;

    /// Addresses that must sign a transaction carrying this message.
    fn signers(&self, codec: &dyn AddressCodec) -> Result<Vec<AccAddress>>;

    /// Canonical bytes of this message alone.
    fn sign_bytes(&self) -> Result<Vec<u8>>;
}

/// Every message the market module accepts.
///
/// Serialized amino-style: `{"type":"market/SendClose","value":{...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum MarketMsg {
    #[serde(rename = "market/SendClose")]
    SendClose(MsgSendClose),
}

impl MarketMsg {
    fn inner(&self) -> &dyn Msg {
        match self {
            Self::SendClose(m) => m,
        }
    }
}

impl From<MsgSendClose> for MarketMsg {
    fn from(msg: MsgSendClose) -> Self {
        Self::SendClose(msg)
    }
}

impl Msg for MarketMsg {
    fn route(&self) -> &'static str {
        self.inner().route()
    }

    fn kind(&self) -> &'static str {
        self.inner().kind()
    }

    fn amino_name(&self) -> &'static str {
        self.inner().amino_name()
    }

    fn validate_basic(&self, codec: &dyn AddressCodec) -> Result<()> {
        self.inner().validate_basic(codec)
    }

    fn signers(&self, codec: &dyn AddressCodec) -> Result<Vec<AccAddress>> {
        self.inner().signers(codec)
    }

    fn sign_bytes(&self) -> Result<Vec<u8>> {
        self.inner().sign_bytes()
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Block-level facts a handler may depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecContext {
    pub chain_id: String,
    pub block_height: u64,
    /// Block time in nanoseconds since the UNIX epoch.
    pub block_time_ns: u64,
}

impl ExecContext {
    #[must_use]
    pub fn new(chain_id: impl Into<String>, block_height: u64, block_time_ns: u64) -> Self {
        Self {
            chain_id: chain_id.into(),
            block_height,
            block_time_ns,
        }
    }
}

/// A typed, attributed event emitted by a handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<(String, String)>,
}

impl Event {
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((key.into(), value.to_string()));
        self
    }

    /// First value recorded under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Result of handling one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgResponse {
    /// Sequence of the packet the handler sent, if any.
    pub sequence: Option<u64>,
    pub events: Vec<Event>,
}

/// A module's message handler.
///
/// The router calls [`check`](MsgHandler::check) for every message of a
/// transaction before it calls [`handle`](MsgHandler::handle) for any of
/// them. A message that passes `check` must not fail in `handle`.
pub trait MsgHandler: Send {
    /// Reject `msg` without touching module state.
    fn check(&self, _ctx: &ExecContext, _msg: &MarketMsg, _signer: &AccAddress) -> Result<()> {
        Ok(())
    }

    /// Execute `msg`, already validated and authorized for `signer`.
    fn handle(&mut self, ctx: &ExecContext, msg: &MarketMsg, signer: &AccAddress)
    -> Result<MsgResponse>;
}

/// Relay callbacks for packets a module sent.
pub trait PacketHandler: Send {
    /// The counterparty acknowledged `packet`.
    fn on_acknowledgement(&mut self, packet: &Packet, ack: &Acknowledgement)
    -> Result<PacketOutcome>;

    /// The relay reports `packet` as timed out at `now_ns`.
    fn on_timeout(&mut self, packet: &Packet, now_ns: u64) -> Result<PacketOutcome>;

    /// Time out every pending packet whose deadline passed at `now_ns`.
    fn expire_elapsed(&mut self, now_ns: u64) -> Vec<PacketOutcome>;
}

/// A module that both handles messages and owns the packets they send.
pub trait Module: MsgHandler + PacketHandler {}

impl<T: MsgHandler + PacketHandler> Module for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants, Bech32Codec};

    #[test]
    fn market_msg_delegates_route_and_kind() {
        let msg = MarketMsg::from(MsgSendClose::dummy());
        assert_eq!(msg.route(), constants::ROUTER_KEY);
        assert_eq!(msg.kind(), "Close");
        assert_eq!(msg.amino_name(), "market/SendClose");
    }

    #[test]
    fn market_msg_wire_format() {
        let inner = MsgSendClose::new("cosmos1xyz", "market", "channel-0", 5, "order-1");
        let json = serde_json::to_value(MarketMsg::from(inner.clone())).unwrap();
        assert_eq!(json["type"], "market/SendClose");
        assert_eq!(json["value"]["order_id"], "order-1");
        assert_eq!(json["value"]["timeout_timestamp"], "5");

        let back: MarketMsg = serde_json::from_value(json).unwrap();
        assert_eq!(back, MarketMsg::SendClose(inner));
    }

    #[test]
    fn market_msg_delegates_validation() {
        let codec = Bech32Codec::default();
        let msg = MarketMsg::from(MsgSendClose::new("bogus", "market", "channel-0", 1, "o"));
        assert!(msg.validate_basic(&codec).is_err());
        assert!(msg.signers(&codec).is_err());
    }

    #[test]
    fn event_attributes() {
        let ev = Event::new("send_close").attr("order_id", "o-1").attr("sequence", 3);
        assert_eq!(ev.get("order_id"), Some("o-1"));
        assert_eq!(ev.get("sequence"), Some("3"));
        assert_eq!(ev.get("missing"), None);
    }
}
