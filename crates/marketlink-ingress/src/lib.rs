//! # marketlink-ingress
//!
//! **Transaction ingress**: account keys, sign docs, replay protection, and
//! message routing.
//!
//! ## Architecture
//!
//! 1. **AccountKey**: ed25519 keys whose public key derives the account address
//! 2. **Tx / SignDoc**: what is signed (messages + chain id + account number + sequence)
//! 3. **AccountRegistry**: account numbers and next expected sequence
//! 4. **RouteTable**: immutable route → module and port → route bindings
//! 5. **Router**: validates, authenticates, and dispatches
//!
//! ## Transaction Flow
//!
//! ```text
//! client: MsgSendClose → Tx::sign(key, chain_id, ...) → Router.deliver_tx()
//!     → validate_basic → signer derivation → signature check → module.handle()
//! ```
//!
//! No message reaches a module without a verified signature from the
//! address it names as sender.

pub mod account_key;
pub mod accounts;
pub mod route_table;
pub mod router;
pub mod tx;

pub use account_key::{verify_signature, AccountKey};
pub use accounts::{AccountRegistry, AccountState};
pub use route_table::{RouteTable, RouteTableBuilder};
pub use router::Router;
pub use tx::{SignDoc, Tx};
