//! Close-order module. Turns an authorized [`MsgSendClose`] into a
//! committed close packet, and receives the relay's callbacks for it.
//!
//! ```text
//! MsgSendClose ──► channel lookup ──► timeout window ──► ClosePacketData
//!                                                              │
//!                                   PacketTracker::send_packet ◄┘
//! ```
//!
//! `check` runs every step up to the send, so the router can vet all
//! messages of a transaction before any packet is committed.

use marketlink_types::{
    constants, AccAddress, Acknowledgement, ChannelConfig, ClosePacketData, Event, ExecContext,
    MarketError, MarketModuleConfig, MarketMsg, MarketPacketData, MsgHandler, MsgResponse,
    MsgSendClose, Packet, PacketHandler, PacketOutcome, Result,
};

use crate::PacketTracker;

/// The market module's handler for close commands.
pub struct CloseOrderHandler {
    config: MarketModuleConfig,
    tracker: PacketTracker,
}

impl CloseOrderHandler {
    #[must_use]
    pub fn new(config: MarketModuleConfig) -> Self {
        Self {
            config,
            tracker: PacketTracker::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &MarketModuleConfig {
        &self.config
    }

    #[must_use]
    pub fn tracker(&self) -> &PacketTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut PacketTracker {
        &mut self.tracker
    }

    /// Every check `send_close` makes, without sending. Returns the
    /// channel and the encoded packet data.
    fn prepare(
        &self,
        ctx: &ExecContext,
        msg: &MsgSendClose,
    ) -> Result<(&ChannelConfig, Vec<u8>)> {
        let channel = self
            .config
            .channel(&msg.port, &msg.channel_id)
            .ok_or_else(|| MarketError::UnknownChannel {
                port: msg.port.clone(),
                channel: msg.channel_id.clone(),
            })?;

        let max = ctx
            .block_time_ns
            .saturating_add(self.config.max_timeout_window_ns);
        if msg.timeout_timestamp > max {
            return Err(MarketError::TimeoutTooFar {
                timeout: msg.timeout_timestamp,
                max,
            });
        }
        PacketTracker::check_timeout(msg.timeout_timestamp, ctx.block_time_ns)?;

        let data = ClosePacketData::new(&msg.order_id, &msg.sender);
        data.validate_basic()?;
        let bytes = MarketPacketData::ClosePacket(data).to_bytes()?;
        Ok((channel, bytes))
    }

    fn send_close(
        &mut self,
        ctx: &ExecContext,
        msg: &MsgSendClose,
        signer: &AccAddress,
    ) -> Result<MsgResponse> {
        let (channel, bytes) = self.prepare(ctx, msg)?;
        let channel = channel.clone();
        let packet = self.tracker.send_packet(
            &msg.port,
            &channel,
            msg.timeout_timestamp,
            bytes,
            ctx.block_time_ns,
        )?;

        tracing::info!(
            order_id = %msg.order_id,
            signer = %signer,
            channel = %packet.source_channel,
            sequence = packet.sequence,
            height = ctx.block_height,
            "Close order sent"
        );

        let event = Event::new(constants::EVENT_SEND_CLOSE)
            .attr("order_id", &msg.order_id)
            .attr("sender", &msg.sender)
            .attr("port", &packet.source_port)
            .attr("channel", &packet.source_channel)
            .attr("sequence", packet.sequence)
            .attr("destination_port", &packet.destination_port)
            .attr("destination_channel", &packet.destination_channel)
            .attr("timeout_timestamp", packet.timeout_timestamp)
            .attr("data_hex", hex::encode(&packet.data));

        Ok(MsgResponse {
            sequence: Some(packet.sequence),
            events: vec![event],
        })
    }
}

impl MsgHandler for CloseOrderHandler {
    fn check(&self, ctx: &ExecContext, msg: &MarketMsg, _signer: &AccAddress) -> Result<()> {
        match msg {
            MarketMsg::SendClose(close) => self.prepare(ctx, close).map(|_| ()),
        }
    }

    fn handle(
        &mut self,
        ctx: &ExecContext,
        msg: &MarketMsg,
        signer: &AccAddress,
    ) -> Result<MsgResponse> {
        match msg {
            MarketMsg::SendClose(close) => self.send_close(ctx, close, signer),
        }
    }
}

impl PacketHandler for CloseOrderHandler {
    fn on_acknowledgement(
        &mut self,
        packet: &Packet,
        ack: &Acknowledgement,
    ) -> Result<PacketOutcome> {
        if let Acknowledgement::Error(reason) = ack {
            tracing::warn!(
                sequence = packet.sequence,
                %reason,
                "Counterparty rejected close order"
            );
        }
        self.tracker.acknowledge(packet, ack)
    }

    fn on_timeout(&mut self, packet: &Packet, now_ns: u64) -> Result<PacketOutcome> {
        self.tracker.time_out(packet, now_ns)
    }

    fn expire_elapsed(&mut self, now_ns: u64) -> Vec<PacketOutcome> {
        self.tracker.expire_elapsed(now_ns)
    }
}
