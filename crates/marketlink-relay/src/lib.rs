//! # marketlink-relay
//!
//! **Packet plane**: the close-order module and the lifecycle of the packets
//! it sends.
//!
//! ## Architecture
//!
//! The router hands an authorized [`MsgSendClose`](marketlink_types::MsgSendClose)
//! to [`CloseOrderHandler`], which:
//! 1. Resolves the configured channel on the message's port
//! 2. Bounds the timeout by the module's maximum window
//! 3. Encodes the close packet data
//! 4. Commits the packet in the [`PacketTracker`] under the next sequence
//! 5. Emits a `send_close` event carrying everything a relayer needs
//!
//! The relayer later reports an acknowledgement or a timeout. Either one is
//! final; a timed-out close is never resent. The signer may submit a new
//! `MsgSendClose` with a fresh timeout.

pub mod handler;
pub mod tracker;

pub use handler::CloseOrderHandler;
pub use tracker::{PacketKey, PacketTracker};
