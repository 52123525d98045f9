//! Packet tracker: sequence assignment, commitments, and the
//! PENDING → ACKNOWLEDGED | TIMED_OUT lifecycle of every packet this chain
//! sends.
//!
//! ## Rules
//!
//! - **Bounded**: a packet is only sent if its timeout is non-zero and still
//!   in the future (`now < timeout`)
//! - **Committed**: the tracker stores `Packet::commitment()`; an
//!   acknowledgement or timeout is accepted only for a packet that matches it
//! - **Terminal**: once acknowledged or timed out, a packet never moves again
//! - **Ordered channels**: acknowledgements arrive in sequence order
//! - **No retries**: a timed-out packet stays timed out

use std::collections::{BTreeMap, HashMap};

use marketlink_types::{
    constants, timeout, Acknowledgement, ChannelConfig, ChannelOrdering, MarketError, Packet,
    PacketOutcome, PacketState, Result,
};

/// Identifies a sent packet: `(source port, source channel, sequence)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct PacketKey {
    pub port: String,
    pub channel: String,
    pub sequence: u64,
}

impl PacketKey {
    #[must_use]
    pub fn of(packet: &Packet) -> Self {
        Self {
            port: packet.source_port.clone(),
            channel: packet.source_channel.clone(),
            sequence: packet.sequence,
        }
    }
}

struct TrackedPacket {
    packet: Packet,
    commitment: [u8; 32],
    ordering: ChannelOrdering,
    state: PacketState,
    acknowledgement: Option<Acknowledgement>,
}

impl TrackedPacket {
    fn outcome(&self) -> PacketOutcome {
        PacketOutcome {
            port: self.packet.source_port.clone(),
            channel: self.packet.source_channel.clone(),
            sequence: self.packet.sequence,
            state: self.state,
            acknowledgement: self.acknowledgement.clone(),
        }
    }

    fn transition(&mut self, target: PacketState) -> Result<()> {
        if !self.state.can_transition_to(target) {
            return Err(MarketError::InvalidPacketTransition {
                from: self.state,
                to: target,
            });
        }
        self.state = target;
        Ok(())
    }
}

/// Tracks every packet sent from this chain until it reaches a terminal
/// state.
#[derive(Default)]
pub struct PacketTracker {
    next_sequence: HashMap<(String, String), u64>,
    packets: BTreeMap<PacketKey, TrackedPacket>,
}

impl PacketTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a packet with this timeout may be sent at `now_ns`.
    ///
    /// # Errors
    /// - `InvalidTimeout` if `timeout_timestamp` is zero
    /// - `TimeoutElapsed` if `now_ns >= timeout_timestamp`
    pub fn check_timeout(timeout_timestamp: u64, now_ns: u64) -> Result<()> {
        if timeout_timestamp == 0 {
            return Err(MarketError::InvalidTimeout {
                reason: "timeout_timestamp must be non-zero".into(),
            });
        }
        if timeout::has_elapsed(timeout_timestamp, now_ns) {
            return Err(MarketError::TimeoutElapsed {
                timeout: timeout_timestamp,
                now: now_ns,
            });
        }
        Ok(())
    }

    /// Commit a new packet on `(port, channel)` and return it.
    ///
    /// Fails exactly when [`PacketTracker::check_timeout`] does.
    pub fn send_packet(
        &mut self,
        port: &str,
        channel: &ChannelConfig,
        timeout_timestamp: u64,
        data: Vec<u8>,
        now_ns: u64,
    ) -> Result<Packet> {
        Self::check_timeout(timeout_timestamp, now_ns)?;

        let next = self
            .next_sequence
            .entry((port.to_string(), channel.channel_id.clone()))
            .or_insert(constants::INITIAL_PACKET_SEQUENCE);
        let sequence = *next;
        *next += 1;

        let packet = Packet {
            sequence,
            source_port: port.to_string(),
            source_channel: channel.channel_id.clone(),
            destination_port: channel.counterparty_port_id.clone(),
            destination_channel: channel.counterparty_channel_id.clone(),
            data,
            timeout_timestamp,
        };
        let commitment = packet.commitment();

        tracing::debug!(
            port,
            channel = %channel.channel_id,
            sequence,
            timeout = ?timeout::to_datetime(timeout_timestamp),
            commitment = %hex::encode(commitment),
            "Packet sent"
        );

        self.packets.insert(
            PacketKey::of(&packet),
            TrackedPacket {
                packet: packet.clone(),
                commitment,
                ordering: channel.ordering,
                state: PacketState::Pending,
                acknowledgement: None,
            },
        );
        Ok(packet)
    }

    /// Record the counterparty's acknowledgement of `packet`.
    ///
    /// An error acknowledgement is still an acknowledgement: the packet
    /// becomes `Acknowledged` and the outcome carries the error.
    pub fn acknowledge(&mut self, packet: &Packet, ack: &Acknowledgement) -> Result<PacketOutcome> {
        let key = PacketKey::of(packet);
        self.verify(&key, packet)?;

        if let Some(expected) = self.ordered_ack_blocker(&key) {
            return Err(MarketError::OutOfOrderAcknowledgement {
                expected,
                actual: key.sequence,
            });
        }

        let tracked = self.tracked_mut(&key)?;
        tracked.transition(PacketState::Acknowledged)?;
        tracked.acknowledgement = Some(ack.clone());

        tracing::info!(
            port = %key.port,
            channel = %key.channel,
            sequence = key.sequence,
            success = ack.is_success(),
            "Packet acknowledged"
        );
        Ok(tracked.outcome())
    }

    /// Record that `packet` timed out, as observed at `now_ns`.
    ///
    /// # Errors
    /// Returns `TimeoutNotReached` if the deadline has not passed.
    pub fn time_out(&mut self, packet: &Packet, now_ns: u64) -> Result<PacketOutcome> {
        let key = PacketKey::of(packet);
        self.verify(&key, packet)?;

        let tracked = self.tracked_mut(&key)?;
        if !timeout::has_elapsed(tracked.packet.timeout_timestamp, now_ns) {
            return Err(MarketError::TimeoutNotReached {
                timeout: tracked.packet.timeout_timestamp,
                now: now_ns,
            });
        }
        tracked.transition(PacketState::TimedOut)?;

        tracing::warn!(
            port = %key.port,
            channel = %key.channel,
            sequence = key.sequence,
            timeout = tracked.packet.timeout_timestamp,
            now = now_ns,
            "Packet timed out"
        );
        Ok(tracked.outcome())
    }

    /// Move every pending packet whose timeout elapsed at `now_ns` to
    /// `TimedOut`. Returned in key order.
    pub fn expire_elapsed(&mut self, now_ns: u64) -> Vec<PacketOutcome> {
        let mut expired = Vec::new();
        for (key, tracked) in &mut self.packets {
            if tracked.state == PacketState::Pending
                && timeout::has_elapsed(tracked.packet.timeout_timestamp, now_ns)
            {
                tracked.state = PacketState::TimedOut;
                tracing::warn!(
                    port = %key.port,
                    channel = %key.channel,
                    sequence = key.sequence,
                    "Packet expired"
                );
                expired.push(tracked.outcome());
            }
        }
        expired
    }

    /// Drop every packet in a terminal state. Returns how many were dropped.
    pub fn prune_terminal(&mut self) -> usize {
        let before = self.packets.len();
        self.packets.retain(|_, t| !t.state.is_terminal());
        before - self.packets.len()
    }

    #[must_use]
    pub fn state(&self, port: &str, channel: &str, sequence: u64) -> Option<PacketState> {
        self.packets
            .get(&PacketKey {
                port: port.to_string(),
                channel: channel.to_string(),
                sequence,
            })
            .map(|t| t.state)
    }

    #[must_use]
    pub fn packet(&self, key: &PacketKey) -> Option<&Packet> {
        self.packets.get(key).map(|t| &t.packet)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.packets
            .values()
            .filter(|t| t.state == PacketState::Pending)
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Sequence the next packet on `(port, channel)` will get.
    #[must_use]
    pub fn next_sequence(&self, port: &str, channel: &str) -> u64 {
        self.next_sequence
            .get(&(port.to_string(), channel.to_string()))
            .copied()
            .unwrap_or(constants::INITIAL_PACKET_SEQUENCE)
    }

    fn tracked_mut(&mut self, key: &PacketKey) -> Result<&mut TrackedPacket> {
        self.packets
            .get_mut(key)
            .ok_or_else(|| MarketError::PacketNotFound {
                port: key.port.clone(),
                channel: key.channel.clone(),
                sequence: key.sequence,
            })
    }

    /// The packet must be known and byte-identical to what was committed.
    fn verify(&mut self, key: &PacketKey, packet: &Packet) -> Result<()> {
        let tracked = self.tracked_mut(key)?;
        if tracked.commitment != packet.commitment() {
            return Err(MarketError::CommitmentMismatch {
                sequence: key.sequence,
            });
        }
        Ok(())
    }

    /// On an ordered channel, the lowest still-pending sequence if it is
    /// not `key`.
    fn ordered_ack_blocker(&self, key: &PacketKey) -> Option<u64> {
        let tracked = self.packets.get(key)?;
        if tracked.ordering != ChannelOrdering::Ordered || tracked.state != PacketState::Pending {
            return None;
        }
        let first_pending = self
            .packets
            .iter()
            .filter(|(k, t)| {
                k.port == key.port && k.channel == key.channel && t.state == PacketState::Pending
            })
            .map(|(k, _)| k.sequence)
            .next()?;
        (first_pending != key.sequence).then_some(first_pending)
    }
}
