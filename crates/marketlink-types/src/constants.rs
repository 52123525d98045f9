//! System-wide constants for the marketlink market module.

/// Name of the market module.
pub const MODULE_NAME: &str = "market";

/// Route key every market message is dispatched under.
pub const ROUTER_KEY: &str = MODULE_NAME;

/// Default IBC port the market module binds to.
pub const DEFAULT_PORT_ID: &str = "market";

/// Message kind label for the close-order command.
pub const KIND_CLOSE: &str = "Close";

/// Amino-style type name used when a `MsgSendClose` is embedded in a sign doc.
pub const AMINO_NAME_SEND_CLOSE: &str = "market/SendClose";

/// Default bech32 human-readable part for account addresses.
pub const DEFAULT_BECH32_ACCOUNT_PREFIX: &str = "cosmos";

/// Default chain identifier.
pub const DEFAULT_CHAIN_ID: &str = "marketlink-1";

/// Maximum decoded account address length in bytes.
pub const MAX_ADDR_LEN: usize = 255;

/// Length of an address derived from an ed25519 public key.
pub const DERIVED_ADDR_LEN: usize = 20;

/// Default upper bound on how far in the future a close packet may time out
/// (one hour, in nanoseconds).
pub const DEFAULT_MAX_TIMEOUT_WINDOW_NS: u64 = 60 * 60 * 1_000_000_000;

/// Default relative timeout clients use when they have no preference
/// (ten minutes, in nanoseconds).
pub const DEFAULT_PACKET_TIMEOUT_NS: u64 = 10 * 60 * 1_000_000_000;

/// First sequence number assigned on a fresh channel.
pub const INITIAL_PACKET_SEQUENCE: u64 = 1;

/// Event type emitted when a close packet is sent.
pub const EVENT_SEND_CLOSE: &str = "send_close";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
