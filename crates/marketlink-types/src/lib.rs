//! # marketlink-types
//!
//! Shared types, errors, and configuration for **marketlink**, the
//! cross-chain market module's command layer.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Close command**: [`MsgSendClose`] with canonical sign bytes, structural
//!   validation, route binding, and signer derivation
//! - **Message model**: [`Msg`], [`MarketMsg`], [`MsgHandler`],
//!   [`PacketHandler`], [`Module`], [`ExecContext`], [`MsgResponse`],
//!   [`Event`]
//! - **Addresses**: [`AccAddress`], [`AddressCodec`], [`Bech32Codec`]
//! - **Packets**: [`Packet`], [`MarketPacketData`], [`ClosePacketData`],
//!   [`Acknowledgement`], [`PacketState`], [`PacketOutcome`]
//! - **Canonical encoding**: [`canonical`]
//! - **Timeouts**: [`timeout`]
//! - **Configuration**: [`ChainConfig`], [`MarketModuleConfig`],
//!   [`ChannelConfig`]
//! - **Errors**: [`MarketError`] with `ML_ERR_` prefix codes
//! - **Constants**: module name, route key, defaults

pub mod address;
pub mod canonical;
pub mod close;
pub mod config;
pub mod constants;
pub mod error;
pub mod msg;
pub mod packet;
pub mod timeout;

pub use address::*;
pub use close::*;
pub use config::*;
pub use error::*;
pub use msg::*;
pub use packet::*;

// `canonical`, `timeout` and `constants` are accessed by path
// (e.g. `marketlink_types::timeout::has_elapsed`).
