//! Router: the hard gate between a submitted transaction and a module.
//!
//! ## Delivery pipeline
//!
//! ```text
//! Tx → non-empty → validate_basic (each msg) → route exists (each msg)
//!    → single signer == address(public_key) → account number / sequence
//!    → ed25519 over SignDoc → register account, sequence += 1
//!    → module.check (each msg) → module.handle (each msg)
//! ```
//!
//! Every step before the signature verifies is read-only: a rejected
//! transaction leaves no account behind and can be fixed and resubmitted
//! with the same sequence. Once the sequence is consumed, every message is
//! checked by its module before any of them runs, so a transaction either
//! runs all of its messages or none.
//!
//! The router also forwards relay callbacks (acknowledgement, timeout) to
//! the module bound to the packet's source port.

use marketlink_types::{
    AccAddress, Acknowledgement, AddressCodec, Bech32Codec, ChainConfig, ExecContext,
    MarketError, Msg, MsgHandler, MsgResponse, Packet, PacketHandler, PacketOutcome, Result,
};

use crate::{verify_signature, AccountRegistry, RouteTable, Tx};

/// Authenticates transactions and dispatches their messages.
pub struct Router {
    codec: Box<dyn AddressCodec>,
    accounts: AccountRegistry,
    routes: RouteTable,
}

impl Router {
    #[must_use]
    pub fn new(codec: impl AddressCodec + 'static, routes: RouteTable) -> Self {
        Self {
            codec: Box::new(codec),
            accounts: AccountRegistry::new(),
            routes,
        }
    }

    /// Router for a validated chain configuration.
    pub fn from_config(config: &ChainConfig, routes: RouteTable) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(Bech32Codec::from_config(config)?, routes))
    }

    #[must_use]
    pub fn codec(&self) -> &dyn AddressCodec {
        self.codec.as_ref()
    }

    #[must_use]
    pub fn accounts(&self) -> &AccountRegistry {
        &self.accounts
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Authenticate `tx` and run its messages.
    ///
    /// Returns one response per message, in message order.
    pub fn deliver_tx(&mut self, ctx: &ExecContext, tx: &Tx) -> Result<Vec<MsgResponse>> {
        let signer = match self.authenticate(ctx, tx) {
            Ok(signer) => signer,
            Err(err) => {
                tracing::warn!(
                    chain_id = %ctx.chain_id,
                    height = ctx.block_height,
                    public_key = %hex::encode(tx.public_key),
                    sequence = tx.sequence,
                    error = %err,
                    "Transaction rejected"
                );
                return Err(err);
            }
        };

        self.accounts.register(&signer);
        self.accounts.increment_sequence(&signer);

        for msg in &tx.msgs {
            if let Err(err) = self.routes.module_mut(msg.route())?.check(ctx, msg, &signer) {
                tracing::warn!(
                    route = msg.route(),
                    kind = msg.kind(),
                    signer = %signer,
                    error = %err,
                    "Message rejected by module"
                );
                return Err(err);
            }
        }

        let mut responses = Vec::with_capacity(tx.msgs.len());
        for msg in &tx.msgs {
            let module = self.routes.module_mut(msg.route())?;
            let response = module.handle(ctx, msg, &signer)?;
            tracing::debug!(
                route = msg.route(),
                kind = msg.kind(),
                signer = %signer,
                sequence = ?response.sequence,
                "Message dispatched"
            );
            responses.push(response);
        }
        Ok(responses)
    }

    /// Read-only checks that run before the sequence is consumed; returns
    /// the single authorized signer.
    fn authenticate(&self, ctx: &ExecContext, tx: &Tx) -> Result<AccAddress> {
        if tx.msgs.is_empty() {
            return Err(MarketError::EmptyTx);
        }

        for msg in &tx.msgs {
            msg.validate_basic(self.codec.as_ref())?;
            if !self.routes.contains(msg.route()) {
                return Err(MarketError::UnknownRoute(msg.route().to_string()));
            }
        }

        let signer = self.single_signer(tx)?;

        let key_address = AccAddress::from_public_key(&tx.public_key);
        if key_address != signer {
            return Err(MarketError::SignerMismatch {
                expected: self.display(&signer),
                actual: self.display(&key_address),
            });
        }

        self.accounts
            .check(&signer, tx.account_number, tx.sequence)?;

        let sign_bytes = tx.sign_doc(&ctx.chain_id).sign_bytes()?;
        verify_signature(&tx.public_key, &sign_bytes, &tx.signature)?;

        Ok(signer)
    }

    /// Every message must name the same signer.
    fn single_signer(&self, tx: &Tx) -> Result<AccAddress> {
        let mut signer: Option<AccAddress> = None;
        for msg in &tx.msgs {
            for addr in msg.signers(self.codec.as_ref())? {
                match &signer {
                    None => signer = Some(addr),
                    Some(first) if *first == addr => {}
                    Some(first) => {
                        return Err(MarketError::SignerMismatch {
                            expected: self.display(first),
                            actual: self.display(&addr),
                        });
                    }
                }
            }
        }
        signer.ok_or_else(|| MarketError::Internal("message declared no signers".into()))
    }

    fn display(&self, address: &AccAddress) -> String {
        self.codec
            .format(address)
            .unwrap_or_else(|_| address.to_string())
    }

    // ---------------------------------------------------------------------
    // Relay callbacks
    // ---------------------------------------------------------------------

    /// Forward an acknowledgement to the module that sent `packet`.
    pub fn acknowledge_packet(
        &mut self,
        packet: &Packet,
        ack: &Acknowledgement,
    ) -> Result<PacketOutcome> {
        self.routes
            .module_for_port_mut(&packet.source_port)?
            .on_acknowledgement(packet, ack)
    }

    /// Forward a timeout to the module that sent `packet`.
    pub fn timeout_packet(&mut self, packet: &Packet, now_ns: u64) -> Result<PacketOutcome> {
        self.routes
            .module_for_port_mut(&packet.source_port)?
            .on_timeout(packet, now_ns)
    }

    /// Let every module time out its elapsed packets.
    pub fn expire_packets(&mut self, now_ns: u64) -> Vec<PacketOutcome> {
        self.routes
            .modules_mut()
            .flat_map(|m| m.expire_elapsed(now_ns))
            .collect()
    }
}
