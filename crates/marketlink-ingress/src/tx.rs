//! Signed transactions and the sign doc their signature covers.
//!
//! The signature covers the canonical JSON of a [`SignDoc`]: the messages
//! plus the chain id, account number and sequence. Binding the chain id
//! stops cross-chain replay; binding the sequence stops same-chain replay.

use marketlink_types::{canonical, MarketMsg, Result};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as, DisplayFromStr};

use crate::AccountKey;

/// What a transaction's signer actually signs.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignDoc {
    #[serde_as(as = "DisplayFromStr")]
    pub account_number: u64,
    pub chain_id: String,
    pub memo: String,
    pub msgs: Vec<MarketMsg>,
    #[serde_as(as = "DisplayFromStr")]
    pub sequence: u64,
}

impl SignDoc {
    /// Canonical JSON; the bytes that are signed and verified.
    pub fn sign_bytes(&self) -> Result<Vec<u8>> {
        canonical::to_canonical_json(self)
    }
}

/// A single-signer transaction.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub msgs: Vec<MarketMsg>,
    pub memo: String,
    #[serde_as(as = "DisplayFromStr")]
    pub account_number: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub sequence: u64,
    #[serde_as(as = "Hex")]
    pub public_key: [u8; 32],
    #[serde_as(as = "Hex")]
    pub signature: [u8; 64],
}

impl Tx {
    /// Build and sign a transaction for `chain_id`.
    pub fn sign(
        key: &AccountKey,
        chain_id: &str,
        account_number: u64,
        sequence: u64,
        msgs: Vec<MarketMsg>,
        memo: impl Into<String>,
    ) -> Result<Self> {
        let memo = memo.into();
        let doc = SignDoc {
            account_number,
            chain_id: chain_id.to_string(),
            memo: memo.clone(),
            msgs,
            sequence,
        };
        let signature = key.sign(&doc.sign_bytes()?);
        Ok(Self {
            msgs: doc.msgs,
            memo,
            account_number,
            sequence,
            public_key: key.public_key(),
            signature,
        })
    }

    /// Rebuild the sign doc as the verifier on `chain_id` sees it.
    #[must_use]
    pub fn sign_doc(&self, chain_id: &str) -> SignDoc {
        SignDoc {
            account_number: self.account_number,
            chain_id: chain_id.to_string(),
            memo: self.memo.clone(),
            msgs: self.msgs.clone(),
            sequence: self.sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use marketlink_types::MsgSendClose;

    use super::*;
    use crate::verify_signature;

    fn make_tx(key: &AccountKey) -> Tx {
        let msg = MsgSendClose::new("cosmos1abc", "market", "channel-0", 9, "order-1");
        Tx::sign(key, "marketlink-1", 3, 0, vec![msg.into()], "").unwrap()
    }

    #[test]
    fn sign_doc_layout() {
        let doc = SignDoc {
            account_number: 3,
            chain_id: "marketlink-1".into(),
            memo: String::new(),
            msgs: vec![MsgSendClose::new("s", "p", "c", 9, "o").into()],
            sequence: 0,
        };
        assert_eq!(
            String::from_utf8(doc.sign_bytes().unwrap()).unwrap(),
            concat!(
                r#"{"account_number":"3","chain_id":"marketlink-1","memo":"","#,
                r#""msgs":[{"type":"market/SendClose","value":{"channel_id":"c","order_id":"o","#,
                r#""port":"p","sender":"s","timeout_timestamp":"9"}}],"sequence":"0"}"#
            )
        );
    }

    #[test]
    fn signature_covers_sign_doc() {
        let key = AccountKey::from_seed([7u8; 32]);
        let tx = make_tx(&key);
        let bytes = tx.sign_doc("marketlink-1").sign_bytes().unwrap();
        assert!(verify_signature(&tx.public_key, &bytes, &tx.signature).is_ok());
    }

    #[test]
    fn other_chain_id_breaks_signature() {
        let key = AccountKey::from_seed([7u8; 32]);
        let tx = make_tx(&key);
        let bytes = tx.sign_doc("other-chain").sign_bytes().unwrap();
        assert!(verify_signature(&tx.public_key, &bytes, &tx.signature).is_err());
    }

    #[test]
    fn serde_roundtrip_keeps_signature_valid() {
        let key = AccountKey::from_seed([8u8; 32]);
        let tx = make_tx(&key);
        let json = serde_json::to_string(&tx).unwrap();
        assert!(json.contains(&hex::encode(tx.public_key)));
        let back: Tx = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
        let bytes = back.sign_doc("marketlink-1").sign_bytes().unwrap();
        assert!(verify_signature(&back.public_key, &bytes, &back.signature).is_ok());
    }
}
