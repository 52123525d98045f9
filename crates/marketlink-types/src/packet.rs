//! # Packets: the cross-chain continuation of a close command
//!
//! Once a `MsgSendClose` is routed, its only lasting effect is a packet on
//! `(port, channel)` carrying [`ClosePacketData`].
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  acknowledgement   ┌──────────────┐
//!   │ PENDING ├───────────────────▶│ ACKNOWLEDGED │
//!   └────┬────┘                    └──────────────┘
//!        │ timeout elapsed
//!        ▼
//!   ┌───────────┐
//!   │ TIMED_OUT │
//!   └───────────┘
//! ```
//!
//! Both outcomes are terminal. Nothing is retried automatically; a client
//! that still wants the order closed signs a new command with a fresh
//! timeout.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as, DisplayFromStr};
use sha2::{Digest, Sha256};

use crate::{canonical, MarketError, Result};

/// Lifecycle state of a sent packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketState {
    /// Sent; waiting for an acknowledgement or the timeout.
    Pending,
    /// The counterparty acknowledged the packet.
    Acknowledged,
    /// The timeout elapsed without an acknowledgement.
    TimedOut,
}

impl PacketState {
    /// Can a packet in this state move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Acknowledged | Self::TimedOut)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for PacketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Acknowledged => write!(f, "ACKNOWLEDGED"),
            Self::TimedOut => write!(f, "TIMED_OUT"),
        }
    }
}

// ---------------------------------------------------------------------------
// Packet payloads
// ---------------------------------------------------------------------------

/// Payload of a close packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosePacketData {
    pub order_id: String,
    /// Bech32 address of the account that signed the close.
    pub sender: String,
}

impl ClosePacketData {
    #[must_use]
    pub fn new(order_id: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            sender: sender.into(),
        }
    }

    /// The counterparty cannot close an unnamed order.
    pub fn validate_basic(&self) -> Result<()> {
        if self.order_id.trim().is_empty() {
            return Err(MarketError::InvalidMessage {
                reason: "close packet order_id must not be empty".into(),
            });
        }
        if self.sender.trim().is_empty() {
            return Err(MarketError::InvalidMessage {
                reason: "close packet sender must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Every payload the market port sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketPacketData {
    ClosePacket(ClosePacketData),
}

impl MarketPacketData {
    /// Canonical wire bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        canonical::to_canonical_json(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// A packet as committed by the sending chain.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub sequence: u64,
    pub source_port: String,
    pub source_channel: String,
    pub destination_port: String,
    pub destination_channel: String,
    #[serde_as(as = "Hex")]
    pub data: Vec<u8>,
    #[serde_as(as = "DisplayFromStr")]
    pub timeout_timestamp: u64,
}

impl Packet {
    /// Commitment stored by the sender and checked on ack/timeout:
    /// `sha256(timeout_be || revision_number_be || revision_height_be || sha256(data))`.
    ///
    /// Close packets are bounded by timestamp only, so both height fields
    /// are zero.
    #[must_use]
    pub fn commitment(&self) -> [u8; 32] {
        let data_hash = Sha256::digest(&self.data);
        let mut hasher = Sha256::new();
        hasher.update(self.timeout_timestamp.to_be_bytes());
        hasher.update(0u64.to_be_bytes());
        hasher.update(0u64.to_be_bytes());
        hasher.update(data_hash);
        hasher.finalize().into()
    }

    /// Decode the payload.
    pub fn market_data(&self) -> Result<MarketPacketData> {
        MarketPacketData::from_bytes(&self.data)
    }
}

/// Where a packet ended up after a relay callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketOutcome {
    pub port: String,
    pub channel: String,
    pub sequence: u64,
    pub state: PacketState,
    /// Present once the packet is acknowledged.
    pub acknowledgement: Option<Acknowledgement>,
}

// ---------------------------------------------------------------------------
// Acknowledgements
// ---------------------------------------------------------------------------

/// Success payload of a close acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosePacketAck {
    pub order_id: String,
}

/// Acknowledgement written by the counterparty:
/// `{"result":{...}}` on success, `{"error":"..."}` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acknowledgement {
    Result(ClosePacketAck),
    Error(String),
}

impl Acknowledgement {
    #[must_use]
    pub fn success(order_id: impl Into<String>) -> Self {
        Self::Result(ClosePacketAck {
            order_id: order_id.into(),
        })
    }

    #[must_use]
    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error(reason.into())
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Result(_))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        canonical::to_canonical_json(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_packet() -> Packet {
        let data = MarketPacketData::ClosePacket(ClosePacketData::new("order-1", "cosmos1abc"));
        Packet {
            sequence: 1,
            source_port: "market".into(),
            source_channel: "channel-0".into(),
            destination_port: "market".into(),
            destination_channel: "channel-7".into(),
            data: data.to_bytes().unwrap(),
            timeout_timestamp: 1_000,
        }
    }

    #[test]
    fn state_transitions_valid() {
        assert!(PacketState::Pending.can_transition_to(PacketState::Acknowledged));
        assert!(PacketState::Pending.can_transition_to(PacketState::TimedOut));
    }

    #[test]
    fn terminal_states_are_final() {
        for terminal in [PacketState::Acknowledged, PacketState::TimedOut] {
            assert!(terminal.is_terminal());
            for target in [
                PacketState::Pending,
                PacketState::Acknowledged,
                PacketState::TimedOut,
            ] {
                assert!(!terminal.can_transition_to(target), "{terminal} -> {target}");
            }
        }
        assert!(!PacketState::Pending.is_terminal());
    }

    #[test]
    fn packet_data_wire_format() {
        let data = MarketPacketData::ClosePacket(ClosePacketData::new("order-1", "cosmos1abc"));
        assert_eq!(
            String::from_utf8(data.to_bytes().unwrap()).unwrap(),
            r#"{"close_packet":{"order_id":"order-1","sender":"cosmos1abc"}}"#
        );
        let back = MarketPacketData::from_bytes(&data.to_bytes().unwrap()).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn empty_order_id_rejected() {
        let data = ClosePacketData::new(" ", "cosmos1abc");
        assert!(matches!(
            data.validate_basic(),
            Err(MarketError::InvalidMessage { .. })
        ));
    }

    #[test]
    fn empty_sender_rejected() {
        let err = ClosePacketData::new("order-1", "").validate_basic().unwrap_err();
        assert!(matches!(err, MarketError::InvalidMessage { .. }));
        assert!(format!("{err}").contains("sender"), "Got: {err}");
        assert!(ClosePacketData::new("order-1", "cosmos1abc").validate_basic().is_ok());
    }

    #[test]
    fn commitment_deterministic_and_binds_timeout() {
        let p = make_packet();
        assert_eq!(p.commitment(), p.commitment());

        let mut later = p.clone();
        later.timeout_timestamp += 1;
        assert_ne!(p.commitment(), later.commitment());
    }

    #[test]
    fn commitment_binds_data() {
        let p = make_packet();
        let mut tampered = p.clone();
        tampered.data[2] ^= 0x01;
        assert_ne!(p.commitment(), tampered.commitment());
    }

    #[test]
    fn commitment_ignores_routing_fields() {
        let p = make_packet();
        let mut other = p.clone();
        other.destination_channel = "channel-99".into();
        assert_eq!(p.commitment(), other.commitment());
    }

    #[test]
    fn acknowledgement_wire_format() {
        let ok = Acknowledgement::success("order-1");
        assert_eq!(
            String::from_utf8(ok.to_bytes().unwrap()).unwrap(),
            r#"{"result":{"order_id":"order-1"}}"#
        );
        assert!(ok.is_success());

        let err = Acknowledgement::from_bytes(br#"{"error":"order not found"}"#).unwrap();
        assert_eq!(err, Acknowledgement::error("order not found"));
        assert!(!err.is_success());
    }

    #[test]
    fn packet_serde_uses_hex_and_string_timeout() {
        let p = make_packet();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["timeout_timestamp"], "1000");
        assert_eq!(json["data"], hex::encode(&p.data));
        let back: Packet = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
        assert!(matches!(
            back.market_data().unwrap(),
            MarketPacketData::ClosePacket(_)
        ));
    }
}
