//! # Settlement Orchestrator
//!
//! Drives wallet, signer and VSP through one user action at a time. A
//! [`Session`] owns the wallet and signer handles and is borrowed mutably
//! for every operation, so two flows can never interleave on one device.
//!
//! ## Ticket purchase
//!
//! ```text
//!  1  wallet: construct split + tickets                    Constructed
//!  2  decode split, every output is ours, sign             SplitSigned
//!  3  publish split                                        SplitPublished
//!  4  per ticket: decode, map outputs, sign                TicketSigned
//!                 publish                                  TicketPublished
//!  5  settle delay
//!  6  per ticket: signed fee address request               FeeRequested
//!                 (already paid ─▶ FeeAlreadyPaid)
//!  7  construct fee tx to the quoted address, sign,
//!     submit with voting key and vote choices
//!  8  VSP accepts                                          FeePaid
//! ```
//!
//! The record is written to the journal after every step. Published
//! transactions are never rolled back: a failure after step 3 leaves funds
//! on-chain and fee negotiation can be picked up again with
//! [`Session::resume_fee_negotiation`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::{Phase, PhaseContext, SettlementError};
use super::journal::PurchaseJournal;
use super::state::{PurchaseRecord, TicketProgress, TicketPurchaseState, TicketStage};
use crate::codec::{raw_to_hex, Hash};
use crate::config::{
    NetworkParams, DEFAULT_MIN_CONFIRMATIONS, DEFAULT_RELAY_FEE, DEFAULT_SETTLE_DELAY,
};
use crate::signer::{DerivationPath, MessageSignature, SignRequest, Signer};
use crate::stake::{pool_ticket_fee, PoolFeeRate};
use crate::translate::{build_sign_request, build_ticket_sign_request, TranslateError};
use crate::transaction::{index_by_hash, DecodedTransaction, InputTransactions};
use crate::vsp::{FeeAddressRequest, PayFeeRequest, SignedBody, VspError, VspService};
use crate::wallet::{
    get_input_transactions, AccountBalance, PaymentOutput, TicketRequest, WalletService,
};

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

/// Per-session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Wallet account funds are drawn from.
    pub account: u32,
    /// Confirmations required of inputs the wallet selects.
    pub min_conf: u32,
    /// Whether [`Session::transfer`] broadcasts what it signs.
    pub publish: bool,
    /// Pause between publishing tickets and asking the VSP for a fee.
    pub settle_delay: Duration,
    /// Relay fee in atoms per kB, for pool fee projections.
    pub relay_fee: u64,
    /// Agenda choices submitted with the fee.
    pub vote_choices: BTreeMap<String, String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            account: 0,
            min_conf: DEFAULT_MIN_CONFIRMATIONS,
            publish: false,
            settle_delay: DEFAULT_SETTLE_DELAY,
            relay_fee: DEFAULT_RELAY_FEE,
            vote_choices: BTreeMap::new(),
        }
    }
}

/// A transaction signed by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: Vec<u8>,
    /// Set when the transaction was published.
    pub published: Option<Hash>,
}

/// A message signature and whether the wallet accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSignature {
    pub address: String,
    /// Base64 compact signature.
    pub signature: String,
    pub verified: bool,
}

/// Snapshot of the wallet and what a ticket would cost right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletStatus {
    pub balance: AccountBalance,
    pub best_height: u32,
    pub ticket_price: u64,
    pub pool_fee_rate: PoolFeeRate,
    /// Pool fee for a ticket bought at `ticket_price` and `best_height`.
    pub pool_fee: u64,
}

/// Outcome of fee negotiation for one ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeOutcome {
    Paid,
    AlreadyPaid,
}

/// A published ticket and what the VSP needs to hear about it.
struct PublishedTicket {
    index: usize,
    hash: Hash,
    ticket_hex: String,
    parent_hex: String,
    reward_path: DerivationPath,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One operator's connection to a wallet and a signer.
pub struct Session<W, S> {
    wallet: W,
    signer: S,
    params: NetworkParams,
    options: SessionOptions,
    journal: Option<PurchaseJournal>,
}

impl<W, S> Session<W, S>
where
    W: WalletService,
    S: Signer,
{
    pub fn new(wallet: W, signer: S, params: NetworkParams) -> Self {
        Self {
            wallet,
            signer,
            params,
            options: SessionOptions::default(),
            journal: None,
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_journal(mut self, journal: PurchaseJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    // -- Queries ------------------------------------------------------------

    /// Balance, chain height, ticket price and the pool fee `rate` implies.
    pub async fn status(&mut self, rate: PoolFeeRate) -> Result<WalletStatus, SettlementError> {
        let balance = self
            .wallet
            .balance(self.options.account, self.options.min_conf)
            .await
            .phase(Phase::Query)?;
        let best_height = self.wallet.best_block_height().await.phase(Phase::Query)?;
        let ticket_price = self.wallet.ticket_price().await.phase(Phase::Query)?;
        let pool_fee = pool_ticket_fee(
            ticket_price,
            self.options.relay_fee,
            u64::from(best_height),
            rate,
            &self.params,
        );

        Ok(WalletStatus {
            balance,
            best_height,
            ticket_price,
            pool_fee_rate: rate,
            pool_fee,
        })
    }

    /// Fetches every transaction `tx` spends from.
    pub async fn get_input_transactions(
        &mut self,
        tx: &DecodedTransaction,
    ) -> Result<InputTransactions, SettlementError> {
        get_input_transactions(&self.wallet, tx)
            .await
            .phase(Phase::ResolveInputs)
    }

    /// Derives (and optionally displays) the address at `path`.
    pub async fn get_address(
        &mut self,
        path: &DerivationPath,
        show_display: bool,
    ) -> Result<String, SettlementError> {
        self.signer
            .get_address(path, &self.params.coin_name, show_display)
            .await
            .phase(Phase::Query)
    }

    /// Extended public key of `account`.
    pub async fn get_public_key(&mut self, account: u32) -> Result<String, SettlementError> {
        let path = DerivationPath::account(self.params.coin_type, account);
        self.signer
            .get_public_key(&path, &self.params.coin_name)
            .await
            .phase(Phase::Query)
    }

    /// Signs `message` on the device and has the wallet check the result.
    ///
    /// A signature the wallet rejects is reported, not raised.
    pub async fn sign_message_verified(
        &mut self,
        path: &DerivationPath,
        message: &str,
    ) -> Result<VerifiedSignature, SettlementError> {
        let signed = self
            .signer
            .sign_message(path, message.as_bytes(), &self.params.coin_name)
            .await
            .phase(Phase::SignMessage)?;
        let signature = signed.to_base64();

        let verified = self
            .wallet
            .verify_message(&signed.address, message, &signature)
            .await
            .phase(Phase::VerifyMessage)?;
        if verified {
            info!(address = %signed.address, "message signature verified");
        } else {
            warn!(address = %signed.address, "wallet rejected message signature");
        }

        Ok(VerifiedSignature {
            address: signed.address,
            signature,
            verified,
        })
    }

    // -- Transfers ----------------------------------------------------------

    /// Builds, signs and (if configured) publishes a payment.
    pub async fn transfer(
        &mut self,
        outputs: &[PaymentOutput],
    ) -> Result<SignedTransaction, SettlementError> {
        let account = self.options.account;
        let raw = self
            .construct_and_sign(account, outputs, Phase::Construct, Phase::Sign, None)
            .await?;

        let published = if self.options.publish {
            let hash = self
                .wallet
                .publish_transaction(&raw)
                .await
                .phase(Phase::Publish)?;
            info!(tx_hash = %hash, "transaction published");
            Some(hash)
        } else {
            None
        };

        Ok(SignedTransaction { raw, published })
    }

    /// construct → decode → resolve inputs → translate → sign.
    async fn construct_and_sign(
        &mut self,
        account: u32,
        outputs: &[PaymentOutput],
        construct_phase: Phase,
        sign_phase: Phase,
        ticket: Option<Hash>,
    ) -> Result<Vec<u8>, SettlementError> {
        let constructed = self
            .wallet
            .construct_transaction(account, self.options.min_conf, outputs)
            .await
            .phase_for(construct_phase, ticket)?;
        let tx = self
            .wallet
            .decode_transaction(&constructed.unsigned_tx)
            .await
            .phase_for(Phase::Decode, ticket)?;
        let input_txs = get_input_transactions(&self.wallet, &tx)
            .await
            .phase_for(Phase::ResolveInputs, ticket)?;

        let request = build_sign_request(
            &tx,
            &input_txs,
            &constructed.change_indices(),
            &self.wallet,
            &self.params,
        )
        .await
        .phase_for(Phase::Translate, ticket)?;

        self.sign(&request, sign_phase, ticket).await
    }

    async fn sign(
        &mut self,
        request: &SignRequest,
        phase: Phase,
        ticket: Option<Hash>,
    ) -> Result<Vec<u8>, SettlementError> {
        debug!(%phase, inputs = request.inputs.len(), outputs = request.outputs.len(), "signing");
        self.signer
            .sign_transaction(request)
            .await
            .phase_for(phase, ticket)
    }

    // -- Ticket purchase ----------------------------------------------------

    /// Buys tickets and pays the VSP fee for each of them.
    ///
    /// On error the record is marked failed (with the phase) and persisted
    /// before the error is returned.
    pub async fn purchase_ticket<V>(
        &mut self,
        vsp: &V,
        request: &TicketRequest,
    ) -> Result<PurchaseRecord, SettlementError>
    where
        V: VspService + ?Sized,
    {
        let mut record = PurchaseRecord::new(
            self.params.name.clone(),
            request.account,
            request.num_tickets as usize,
        );
        info!(purchase_id = %record.id, tickets = request.num_tickets, "ticket purchase started");

        match self.run_purchase(vsp, request, &mut record).await {
            Ok(()) => {
                info!(purchase_id = %record.id, state = %record.state(), "ticket purchase settled");
                Ok(record)
            }
            Err(err) => self.abort(record, err),
        }
    }

    /// Requests and pays the VSP fee for a ticket that is already on-chain.
    pub async fn resume_fee_negotiation<V>(
        &mut self,
        vsp: &V,
        ticket_hash: &Hash,
        voting_key: &str,
    ) -> Result<PurchaseRecord, SettlementError>
    where
        V: VspService + ?Sized,
    {
        let mut record =
            PurchaseRecord::resumed(self.params.name.clone(), self.options.account, *ticket_hash);
        info!(purchase_id = %record.id, ticket = %ticket_hash, "resuming fee negotiation");

        let result = async {
            self.persist(&record)?;
            let published = self.load_published_ticket(ticket_hash).await?;
            self.negotiate_fee(vsp, &mut record, &published, voting_key).await?;
            record.settle();
            self.persist(&record)
        }
        .await;

        match result {
            Ok(()) => Ok(record),
            Err(err) => self.abort(record, err),
        }
    }

    fn abort(
        &self,
        mut record: PurchaseRecord,
        err: SettlementError,
    ) -> Result<PurchaseRecord, SettlementError> {
        warn!(
            purchase_id = %record.id,
            phase = ?err.phase(),
            error = %err,
            "ticket purchase failed"
        );
        record.fail(err.phase(), err.to_string());
        if let Err(journal_err) = self.persist(&record) {
            warn!(purchase_id = %record.id, error = %journal_err, "failed to journal failure");
        }
        Err(err)
    }

    fn persist(&self, record: &PurchaseRecord) -> Result<(), SettlementError> {
        if let Some(journal) = &self.journal {
            journal.put(record)?;
        }
        Ok(())
    }

    async fn run_purchase<V>(
        &mut self,
        vsp: &V,
        request: &TicketRequest,
        record: &mut PurchaseRecord,
    ) -> Result<(), SettlementError>
    where
        V: VspService + ?Sized,
    {
        // 1. Construct.
        if request.num_tickets == 0 {
            return Err(SettlementError::NoTickets);
        }
        let purchase = self
            .wallet
            .construct_tickets(request)
            .await
            .phase(Phase::Construct)?;
        if purchase.tickets.is_empty() {
            return Err(SettlementError::NoTickets);
        }
        if purchase.tickets.len() != record.tickets.len() {
            record
                .tickets
                .resize(purchase.tickets.len(), TicketProgress::pending());
        }
        self.persist(record)?;

        // 2. Sign the split. Every split output funds one of our tickets.
        let split = self
            .wallet
            .decode_transaction(&purchase.split_tx)
            .await
            .phase(Phase::Decode)?;
        let split_inputs = get_input_transactions(&self.wallet, &split)
            .await
            .phase(Phase::ResolveInputs)?;
        let split_request = build_sign_request(
            &split,
            &split_inputs,
            &split.all_output_indices(),
            &self.wallet,
            &self.params,
        )
        .await
        .phase(Phase::Translate)?;
        let signed_split = self.sign(&split_request, Phase::SignSplit, None).await?;
        record.advance(TicketPurchaseState::SplitSigned);
        self.persist(record)?;

        // 3. Publish the split.
        let split_hash = self
            .wallet
            .publish_transaction(&signed_split)
            .await
            .phase(Phase::PublishSplit)?;
        if split_hash != split.hash {
            return Err(SettlementError::UnexpectedTransaction {
                tx: split_hash,
                reason: format!("published split does not match decoded {}", split.hash),
            });
        }
        record.split_hash = Some(split_hash);
        record.advance(TicketPurchaseState::SplitPublished);
        self.persist(record)?;
        info!(purchase_id = %record.id, tx_hash = %split_hash, "split published");

        // 4. Sign and publish each ticket against the split.
        let parent_hex = raw_to_hex(&signed_split);
        let parents = index_by_hash(vec![split]);
        let mut published = Vec::with_capacity(purchase.tickets.len());
        for (index, unsigned) in purchase.tickets.iter().enumerate() {
            let ticket = self
                .wallet
                .decode_transaction(&unsigned.0)
                .await
                .phase(Phase::Decode)?;
            record.tickets[index].hash = Some(ticket.hash);
            let p = self
                .sign_and_publish_ticket(&ticket, &parents, &parent_hex, index, record)
                .await?;
            published.push(p);
        }
        record.advance(TicketPurchaseState::TicketPublished);
        self.persist(record)?;

        // 5. Let the VSP's node see the tickets.
        debug!(purchase_id = %record.id, delay = ?self.options.settle_delay, "waiting before fee negotiation");
        tokio::time::sleep(self.options.settle_delay).await;

        // 6-8. Fee negotiation, ticket by ticket.
        for ticket in &published {
            self.negotiate_fee(vsp, record, ticket, &purchase.voting_key)
                .await?;
        }
        record.settle();
        self.persist(record)
    }

    async fn sign_and_publish_ticket(
        &mut self,
        ticket: &DecodedTransaction,
        parents: &InputTransactions,
        parent_hex: &str,
        index: usize,
        record: &mut PurchaseRecord,
    ) -> Result<PublishedTicket, SettlementError> {
        let hash = ticket.hash;
        if ticket.inputs.len() != 1 {
            return Err(SettlementError::UnexpectedTransaction {
                tx: hash,
                reason: format!("ticket has {} inputs, expected 1", ticket.inputs.len()),
            });
        }

        let request = build_ticket_sign_request(ticket, parents, &self.wallet, &self.params)
            .await
            .ticket_phase(Phase::Translate, hash)?;
        let reward_path = commitment_path(&request, hash)?;

        let signed = self.sign(&request, Phase::SignTicket, Some(hash)).await?;
        record.tickets[index].stage = TicketStage::Signed;
        record.advance(TicketPurchaseState::TicketSigned);
        self.persist(record)?;

        let published_hash = self
            .wallet
            .publish_transaction(&signed)
            .await
            .ticket_phase(Phase::PublishTicket, hash)?;
        if published_hash != hash {
            return Err(SettlementError::UnexpectedTransaction {
                tx: published_hash,
                reason: format!("published ticket does not match decoded {hash}"),
            });
        }
        record.tickets[index].stage = TicketStage::Published;
        self.persist(record)?;
        info!(purchase_id = %record.id, ticket = %hash, "ticket published");

        Ok(PublishedTicket {
            index,
            hash,
            ticket_hex: raw_to_hex(&signed),
            parent_hex: parent_hex.to_string(),
            reward_path,
        })
    }

    /// Rebuilds what fee negotiation needs from the wallet's copy of a
    /// published ticket.
    async fn load_published_ticket(&mut self, hash: &Hash) -> Result<PublishedTicket, SettlementError> {
        let hash = *hash;
        let ticket_raw = self
            .wallet
            .get_transaction(&hash)
            .await
            .ticket_phase(Phase::ResolveInputs, hash)?;
        let ticket = self
            .wallet
            .decode_transaction(&ticket_raw)
            .await
            .ticket_phase(Phase::Decode, hash)?;
        let funding = match ticket.inputs.as_slice() {
            [only] => only.prev_hash,
            other => {
                return Err(SettlementError::UnexpectedTransaction {
                    tx: hash,
                    reason: format!("ticket has {} inputs, expected 1", other.len()),
                })
            }
        };
        let parent_raw = self
            .wallet
            .get_transaction(&funding)
            .await
            .ticket_phase(Phase::ResolveInputs, hash)?;

        let outputs = crate::translate::to_ticket_outputs(&ticket, &self.wallet, &self.params)
            .await
            .ticket_phase(Phase::Translate, hash)?;
        let reward_path = outputs
            .get(1)
            .and_then(|o| o.address_n())
            .cloned()
            .ok_or_else(|| SettlementError::UnexpectedTransaction {
                tx: hash,
                reason: "ticket has no owned commitment output".to_string(),
            })?;

        Ok(PublishedTicket {
            index: 0,
            hash,
            ticket_hex: raw_to_hex(&ticket_raw),
            parent_hex: raw_to_hex(&parent_raw),
            reward_path,
        })
    }

    /// Steps 6-8 for one ticket.
    async fn negotiate_fee<V>(
        &mut self,
        vsp: &V,
        record: &mut PurchaseRecord,
        ticket: &PublishedTicket,
        voting_key: &str,
    ) -> Result<FeeOutcome, SettlementError>
    where
        V: VspService + ?Sized,
    {
        let hash = ticket.hash;

        // 6. Fee address.
        let fee_request = FeeAddressRequest {
            timestamp: Utc::now().timestamp(),
            tickethash: hash.to_display(),
            tickethex: ticket.ticket_hex.clone(),
            parenthex: ticket.parent_hex.clone(),
        };
        let body = self
            .sign_body(&fee_request, &ticket.reward_path, Phase::RequestFeeAddress, hash)
            .await?;
        let quote = match vsp.fee_address(&body).await {
            Ok(quote) => quote,
            Err(VspError::AlreadyPaid) => {
                return self.already_paid(record, ticket);
            }
            Err(source) => {
                return Err(SettlementError::Vsp {
                    phase: Phase::RequestFeeAddress,
                    ticket: hash,
                    source,
                })
            }
        };

        let progress = &mut record.tickets[ticket.index];
        progress.stage = TicketStage::FeeRequested;
        progress.fee_address = Some(quote.feeaddress.clone());
        progress.fee_amount = Some(quote.feeamount);
        record.advance(TicketPurchaseState::FeeRequested);
        self.persist(record)?;
        info!(
            purchase_id = %record.id,
            ticket = %hash,
            fee_address = %quote.feeaddress,
            fee_amount = quote.feeamount,
            "fee quoted"
        );

        if quote.expiration > 0 && quote.expiration <= Utc::now().timestamp() {
            return Err(SettlementError::FeeQuoteExpired {
                ticket: hash,
                expiration: quote.expiration,
            });
        }

        // 7. Fee transaction. The VSP broadcasts it, we only sign.
        let outputs = [PaymentOutput {
            destination: quote.feeaddress.clone(),
            amount: quote.feeamount,
        }];
        // The fee is funded from the account that bought the ticket.
        let fee_tx = self
            .construct_and_sign(
                record.account,
                &outputs,
                Phase::ConstructFee,
                Phase::SignFee,
                Some(hash),
            )
            .await?;

        let pay_request = PayFeeRequest {
            timestamp: Utc::now().timestamp(),
            tickethash: hash.to_display(),
            feetx: raw_to_hex(&fee_tx),
            votingkey: voting_key.to_string(),
            votechoices: self.options.vote_choices.clone(),
        };
        let body = self
            .sign_body(&pay_request, &ticket.reward_path, Phase::PayFee, hash)
            .await?;

        // 8. Paid.
        match vsp.pay_fee(&body).await {
            Ok(_) => {}
            Err(VspError::AlreadyPaid) => return self.already_paid(record, ticket),
            Err(source) => {
                return Err(SettlementError::Vsp {
                    phase: Phase::PayFee,
                    ticket: hash,
                    source,
                })
            }
        }
        record.tickets[ticket.index].stage = TicketStage::FeePaid;
        self.persist(record)?;
        info!(purchase_id = %record.id, ticket = %hash, "vsp fee paid");
        Ok(FeeOutcome::Paid)
    }

    fn already_paid(
        &self,
        record: &mut PurchaseRecord,
        ticket: &PublishedTicket,
    ) -> Result<FeeOutcome, SettlementError> {
        record.tickets[ticket.index].stage = TicketStage::FeeAlreadyPaid;
        self.persist(record)?;
        info!(purchase_id = %record.id, ticket = %ticket.hash, "vsp already holds a fee for ticket");
        Ok(FeeOutcome::AlreadyPaid)
    }

    /// Serializes `body` and signs the exact JSON text with the ticket's
    /// commitment key.
    async fn sign_body<T: Serialize>(
        &mut self,
        body: &T,
        path: &DerivationPath,
        phase: Phase,
        ticket: Hash,
    ) -> Result<SignedBody, SettlementError> {
        let json = serde_json::to_string(body).map_err(|e| SettlementError::Encode(e.to_string()))?;
        let signed: MessageSignature = self
            .signer
            .sign_message(path, json.as_bytes(), &self.params.coin_name)
            .await
            .ticket_phase(phase, ticket)?;
        Ok(SignedBody {
            json,
            signature: signed.to_base64(),
        })
    }
}

/// Path of the commitment output of a ticket sign request.
fn commitment_path(request: &SignRequest, ticket: Hash) -> Result<DerivationPath, SettlementError> {
    request
        .outputs
        .get(1)
        .and_then(|o| o.address_n())
        .cloned()
        .ok_or_else(|| SettlementError::Translate {
            phase: Phase::Translate,
            ticket: Some(ticket),
            source: TranslateError::UnsupportedOutputShape {
                index: 1,
                reason: "commitment output carries no derivation path".to_string(),
            },
        })
}
