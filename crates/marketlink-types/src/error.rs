//! Error types for marketlink.
//!
//! All errors use the `ML_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Address errors
//! - 2xx: Message / transaction errors
//! - 3xx: Routing errors
//! - 4xx: Packet / relay errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::PacketState;

/// Central error enum for all marketlink operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    // =================================================================
    // Address Errors (1xx)
    // =================================================================
    /// The address string could not be decoded into an account address.
    #[error("ML_ERR_100: Invalid address: {reason}")]
    InvalidAddress { reason: String },

    // =================================================================
    // Message / Transaction Errors (2xx)
    // =================================================================
    /// The message failed a structural check.
    #[error("ML_ERR_200: Invalid message: {reason}")]
    InvalidMessage { reason: String },

    /// A transaction carried no messages.
    #[error("ML_ERR_201: Transaction contains no messages")]
    EmptyTx,

    /// The signing key does not belong to the address the messages name.
    #[error("ML_ERR_202: Signer mismatch: expected {expected}, got {actual}")]
    SignerMismatch { expected: String, actual: String },

    /// The ed25519 signature over the sign doc did not verify.
    #[error("ML_ERR_203: Signature verification failed")]
    InvalidSignature,

    /// The transaction sequence does not match the account's next sequence.
    #[error("ML_ERR_204: Account sequence mismatch: expected {expected}, got {actual}")]
    SequenceMismatch { expected: u64, actual: u64 },

    /// The transaction names a different account number than the registry.
    #[error("ML_ERR_205: Account number mismatch: expected {expected}, got {actual}")]
    AccountNumberMismatch { expected: u64, actual: u64 },

    /// The public key bytes are not a valid ed25519 point.
    #[error("ML_ERR_206: Invalid public key: {reason}")]
    InvalidPublicKey { reason: String },

    // =================================================================
    // Routing Errors (3xx)
    // =================================================================
    /// No handler is registered for this route.
    #[error("ML_ERR_300: No handler registered for route: {0}")]
    UnknownRoute(String),

    /// A handler was registered twice for the same route.
    #[error("ML_ERR_301: Route already registered: {0}")]
    DuplicateRoute(String),

    // =================================================================
    // Packet / Relay Errors (4xx)
    // =================================================================
    /// The `(port, channel)` pair is not a channel this module knows.
    #[error("ML_ERR_400: Unknown channel {port}/{channel}")]
    UnknownChannel { port: String, channel: String },

    /// A zero timeout would leave the packet unbounded.
    #[error("ML_ERR_401: Invalid packet timeout: {reason}")]
    InvalidTimeout { reason: String },

    /// The timeout had already passed at send time.
    #[error("ML_ERR_402: Packet timeout {timeout} already elapsed at {now}")]
    TimeoutElapsed { timeout: u64, now: u64 },

    /// The timeout lies further in the future than the module allows.
    #[error("ML_ERR_403: Packet timeout {timeout} exceeds maximum {max}")]
    TimeoutTooFar { timeout: u64, max: u64 },

    /// No commitment is stored for this packet.
    #[error("ML_ERR_404: Packet not found: {port}/{channel}#{sequence}")]
    PacketNotFound {
        port: String,
        channel: String,
        sequence: u64,
    },

    /// The delivered packet does not match the stored commitment.
    #[error("ML_ERR_405: Packet commitment mismatch for sequence {sequence}")]
    CommitmentMismatch { sequence: u64 },

    /// A timeout was reported before the deadline passed.
    #[error("ML_ERR_406: Packet timeout {timeout} not reached at {now}")]
    TimeoutNotReached { timeout: u64, now: u64 },

    /// Illegal lifecycle transition (e.g. acknowledging a timed-out packet).
    #[error("ML_ERR_407: Invalid packet transition: {from} -> {to}")]
    InvalidPacketTransition { from: PacketState, to: PacketState },

    /// An ordered channel received an acknowledgement ahead of an earlier
    /// pending packet.
    #[error("ML_ERR_408: Out-of-order acknowledgement: expected sequence {expected}, got {actual}")]
    OutOfOrderAcknowledgement { expected: u64, actual: u64 },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("ML_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("ML_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (missing fields, bad prefix, duplicates).
    #[error("ML_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, MarketError>;

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl MarketError {
    /// Shorthand for an [`MarketError::InvalidAddress`] with the given reason.
    pub fn invalid_address(reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = MarketError::invalid_address("decoding bech32 failed");
        let msg = format!("{err}");
        assert!(msg.starts_with("ML_ERR_100"), "Got: {msg}");
        assert!(msg.contains("decoding bech32 failed"));
    }

    #[test]
    fn sequence_mismatch_display() {
        let err = MarketError::SequenceMismatch {
            expected: 4,
            actual: 2,
        };
        let msg = format!("{err}");
        assert!(msg.contains("ML_ERR_204"));
        assert!(msg.contains('4'));
        assert!(msg.contains('2'));
    }

    #[test]
    fn packet_transition_display() {
        let err = MarketError::InvalidPacketTransition {
            from: PacketState::TimedOut,
            to: PacketState::Acknowledged,
        };
        let msg = format!("{err}");
        assert!(msg.contains("ML_ERR_407"));
        assert!(msg.contains("TIMED_OUT"));
        assert!(msg.contains("ACKNOWLEDGED"));
    }

    #[test]
    fn serde_json_error_maps_to_serialization() {
        let err: MarketError = serde_json::from_str::<u64>("nope").unwrap_err().into();
        assert!(matches!(err, MarketError::Serialization(_)));
    }

    #[test]
    fn all_errors_have_ml_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(MarketError::EmptyTx),
            Box::new(MarketError::InvalidSignature),
            Box::new(MarketError::UnknownRoute("bank".into())),
            Box::new(MarketError::CommitmentMismatch { sequence: 3 }),
            Box::new(MarketError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("ML_ERR_"),
                "Error missing ML_ERR_ prefix: {msg}"
            );
        }
    }
}
