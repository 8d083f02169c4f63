//! In-memory wallet, signer and VSP shared by the integration tests.
//!
//! Raw transactions are fake: a one-byte tag (`0x00` unsigned, `0x01`
//! signed) followed by the 32-byte hash. The wallet and the signer share one
//! [`Ledger`] so the signer can tell which transaction a request is for.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use ticketsign_protocol::codec::address::encode_unchecked;
use ticketsign_protocol::codec::{decode_address, Hash};
use ticketsign_protocol::config::{NetworkParams, OP_SSTX, OP_SSTXCHANGE};
use ticketsign_protocol::signer::{
    DerivationPath, MessageSignature, SignRequest, Signer, SignerError,
};
use ticketsign_protocol::stake::{commitment_output_script, commitment_script};
use ticketsign_protocol::transaction::{DecodedTransaction, TxInput, TxOutput};
use ticketsign_protocol::vsp::{
    FeeAddressResponse, PayFeeResponse, SignedBody, VspError, VspService,
};
use ticketsign_protocol::wallet::{
    AccountBalance, AddressOracle, AddressValidation, ConstructedTransaction, PaymentOutput,
    TicketRequest, UnsignedTicket, UnsignedTicketPurchase, WalletError, WalletService,
};

pub const TICKET_PRICE: u64 = 200_000_000;
pub const FEE_AMOUNT: u64 = 1_500_000;
pub const FUNDING_AMOUNT: u64 = 1_000_000_000;
pub const BEST_HEIGHT: u32 = 25_000;
pub const VOTING_KEY: &str = "PtWVDUidYaiiNT5e2Sfb1Ah4evbaSopZJkkpFBuzkJYcYteugvdFg";

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn address(params: &NetworkParams, byte: u8) -> String {
    encode_unchecked(params.pubkey_hash_addr_id, &[byte; 20])
}

pub fn script_address(params: &NetworkParams, byte: u8) -> String {
    encode_unchecked(params.script_hash_addr_id, &[byte; 20])
}

pub fn input(prev: Hash, index: u32, amount: u64) -> TxInput {
    TxInput {
        prev_hash: prev,
        prev_index: index,
        amount_in: amount,
        sequence: u32::MAX,
        tree: None,
        signature_script: vec![],
    }
}

pub fn output(index: u32, value: u64, addr: &str, script: Vec<u8>) -> TxOutput {
    TxOutput {
        value,
        addresses: vec![addr.to_string()],
        script_version: 0,
        index,
        script,
    }
}

fn p2pkh(index: u32, value: u64, addr: &str) -> TxOutput {
    output(index, value, addr, vec![0x76, 0xa9, 0x14])
}

pub fn unsigned_raw(hash: &Hash) -> Vec<u8> {
    let mut raw = vec![0x00];
    raw.extend_from_slice(hash.as_bytes());
    raw
}

pub fn signed_raw(hash: &Hash) -> Vec<u8> {
    let mut raw = vec![0x01];
    raw.extend_from_slice(hash.as_bytes());
    raw
}

fn raw_hash(raw: &[u8]) -> Option<Hash> {
    Hash::from_raw(raw.get(1..)?).ok()
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Ledger {
    txs: HashMap<Hash, DecodedTransaction>,
    next_id: u32,
    published: Vec<Hash>,
}

impl Ledger {
    pub fn insert(&mut self, inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Hash {
        self.next_id += 1;
        let mut bytes = [0xeeu8; 32];
        bytes[..4].copy_from_slice(&self.next_id.to_be_bytes());
        let hash = Hash::from(bytes);
        self.txs.insert(
            hash,
            DecodedTransaction {
                hash,
                version: 1,
                lock_time: 0,
                expiry: 0,
                inputs,
                outputs,
            },
        );
        hash
    }

    pub fn get(&self, hash: &Hash) -> Option<DecodedTransaction> {
        self.txs.get(hash).cloned()
    }

    /// The transaction spending exactly `outpoints`, in order.
    fn find_by_outpoints(&self, outpoints: &[(Hash, u32)]) -> Option<Hash> {
        self.txs
            .values()
            .find(|tx| {
                tx.inputs.len() == outpoints.len()
                    && tx
                        .inputs
                        .iter()
                        .zip(outpoints)
                        .all(|(i, (h, n))| i.prev_hash == *h && i.prev_index == *n)
            })
            .map(|tx| tx.hash)
    }
}

// ---------------------------------------------------------------------------
// MockWallet
// ---------------------------------------------------------------------------

pub struct MockWallet {
    params: NetworkParams,
    pub ledger: Arc<Mutex<Ledger>>,
    owned: Mutex<HashMap<String, AddressValidation>>,
    next_index: Mutex<u8>,
    funding: Mutex<VecDeque<(Hash, u64)>>,
    publish_calls: Mutex<usize>,
    /// Publish call (0-based) that fails.
    pub fail_publish_at: Mutex<Option<usize>>,
    pub verify_ok: Mutex<bool>,
    /// Return a split with no tickets from `construct_tickets`.
    pub no_tickets: Mutex<bool>,
    /// Account of every `construct_transaction` and `construct_tickets` call.
    pub construct_accounts: Mutex<Vec<u32>>,
}

impl MockWallet {
    pub fn new(params: NetworkParams) -> Self {
        let wallet = Self {
            params,
            ledger: Arc::new(Mutex::new(Ledger::default())),
            owned: Mutex::new(HashMap::new()),
            next_index: Mutex::new(0),
            funding: Mutex::new(VecDeque::new()),
            publish_calls: Mutex::new(0),
            fail_publish_at: Mutex::new(None),
            verify_ok: Mutex::new(true),
            no_tickets: Mutex::new(false),
            construct_accounts: Mutex::new(Vec::new()),
        };
        for _ in 0..6 {
            wallet.fund(FUNDING_AMOUNT);
        }
        wallet
    }

    /// A fresh wallet-owned address on the given branch.
    pub fn owned_address(&self, internal: bool) -> String {
        let mut next = self.next_index.lock();
        *next += 1;
        let addr = address(&self.params, 0x40 + *next);
        self.owned.lock().insert(
            addr.clone(),
            AddressValidation {
                is_valid: true,
                is_mine: true,
                is_internal: internal,
                account: 0,
                index: u32::from(*next),
                is_script: false,
            },
        );
        addr
    }

    /// Adds a confirmed output the wallet can spend.
    pub fn fund(&self, amount: u64) {
        let addr = self.owned_address(false);
        let hash = self.ledger.lock().insert(vec![], vec![p2pkh(0, amount, &addr)]);
        self.funding.lock().push_back((hash, amount));
    }

    pub fn published(&self) -> Vec<Hash> {
        self.ledger.lock().published.clone()
    }

    fn take_funding(&self) -> Result<(Hash, u64), WalletError> {
        self.funding
            .lock()
            .pop_front()
            .ok_or_else(|| WalletError::Rejected("insufficient funds".into()))
    }
}

#[async_trait]
impl AddressOracle for MockWallet {
    async fn validate_address(&self, address: &str) -> Result<AddressValidation, WalletError> {
        if let Some(v) = self.owned.lock().get(address) {
            return Ok(*v);
        }
        Ok(match decode_address(address, &self.params) {
            Ok(decoded) => AddressValidation {
                is_valid: true,
                is_script: decoded.is_script_hash(),
                ..Default::default()
            },
            Err(_) => AddressValidation::default(),
        })
    }
}

#[async_trait]
impl WalletService for MockWallet {
    async fn construct_transaction(
        &self,
        account: u32,
        _min_conf: u32,
        outputs: &[PaymentOutput],
    ) -> Result<ConstructedTransaction, WalletError> {
        self.construct_accounts.lock().push(account);
        let (source, value) = self.take_funding()?;
        let total: u64 = outputs.iter().map(|o| o.amount).sum();
        let change_addr = self.owned_address(true);

        let mut outs: Vec<TxOutput> = outputs
            .iter()
            .enumerate()
            .map(|(i, o)| p2pkh(i as u32, o.amount, &o.destination))
            .collect();
        let change_index = outs.len() as u32;
        outs.push(p2pkh(
            change_index,
            value.saturating_sub(total + 10_000),
            &change_addr,
        ));

        let hash = self
            .ledger
            .lock()
            .insert(vec![input(source, 0, value)], outs);
        Ok(ConstructedTransaction {
            unsigned_tx: unsigned_raw(&hash),
            change_index: Some(change_index),
        })
    }

    async fn decode_transaction(&self, raw: &[u8]) -> Result<DecodedTransaction, WalletError> {
        let hash = raw_hash(raw)
            .ok_or_else(|| WalletError::InvalidResponse("undecodable transaction".into()))?;
        self.ledger
            .lock()
            .get(&hash)
            .ok_or_else(|| WalletError::NotFound(hash.to_string()))
    }

    async fn publish_transaction(&self, raw: &[u8]) -> Result<Hash, WalletError> {
        let mut calls = self.publish_calls.lock();
        let call = *calls;
        *calls += 1;
        if *self.fail_publish_at.lock() == Some(call) {
            return Err(WalletError::Unavailable("connection reset".into()));
        }
        if raw.first() != Some(&0x01) {
            return Err(WalletError::Rejected("transaction is not signed".into()));
        }
        let hash = raw_hash(raw)
            .ok_or_else(|| WalletError::InvalidResponse("undecodable transaction".into()))?;
        self.ledger.lock().published.push(hash);
        Ok(hash)
    }

    async fn get_transaction(&self, hash: &Hash) -> Result<Vec<u8>, WalletError> {
        let ledger = self.ledger.lock();
        match ledger.get(hash) {
            Some(_) if ledger.published.contains(hash) => Ok(signed_raw(hash)),
            Some(_) => Ok(unsigned_raw(hash)),
            None => Err(WalletError::NotFound(hash.to_string())),
        }
    }

    async fn balance(&self, _account: u32, _min_conf: u32) -> Result<AccountBalance, WalletError> {
        let spendable = self.funding.lock().iter().map(|(_, v)| v).sum();
        Ok(AccountBalance {
            total: spendable,
            spendable,
            immature: 0,
            locked_by_tickets: 0,
        })
    }

    async fn best_block_height(&self) -> Result<u32, WalletError> {
        Ok(BEST_HEIGHT)
    }

    async fn ticket_price(&self) -> Result<u64, WalletError> {
        Ok(TICKET_PRICE)
    }

    async fn construct_tickets(
        &self,
        request: &TicketRequest,
    ) -> Result<UnsignedTicketPurchase, WalletError> {
        self.construct_accounts.lock().push(request.account);
        let (source, value) = self.take_funding()?;
        let n = if *self.no_tickets.lock() { 0 } else { request.num_tickets };

        let split_outputs = (0..n)
            .map(|i| p2pkh(i, TICKET_PRICE, &self.owned_address(true)))
            .collect();
        let split = self
            .ledger
            .lock()
            .insert(vec![input(source, 0, value)], split_outputs);

        let mut tickets = Vec::new();
        for i in 0..n {
            let voting = self.owned_address(false);
            let reward = self.owned_address(false);
            let change = self.owned_address(true);
            let payload = commitment_script(&reward, TICKET_PRICE, false, &self.params)
                .map_err(|e| WalletError::InvalidResponse(e.to_string()))?;

            let hash = self.ledger.lock().insert(
                vec![input(split, i, TICKET_PRICE)],
                vec![
                    output(0, TICKET_PRICE, &voting, vec![OP_SSTX, 0x76, 0xa9]),
                    output(1, 0, &reward, commitment_output_script(&payload)),
                    output(2, 0, &change, vec![OP_SSTXCHANGE, 0x76, 0xa9]),
                ],
            );
            tickets.push(UnsignedTicket(unsigned_raw(&hash)));
        }

        Ok(UnsignedTicketPurchase {
            split_tx: unsigned_raw(&split),
            tickets,
            voting_key: VOTING_KEY.to_string(),
        })
    }

    async fn verify_message(
        &self,
        _address: &str,
        _message: &str,
        _signature: &str,
    ) -> Result<bool, WalletError> {
        Ok(*self.verify_ok.lock())
    }
}

// ---------------------------------------------------------------------------
// MockSigner
// ---------------------------------------------------------------------------

pub struct MockSigner {
    ledger: Arc<Mutex<Ledger>>,
    pub requests: Mutex<Vec<SignRequest>>,
    pub messages: Mutex<Vec<(DerivationPath, Vec<u8>)>>,
    /// Sign call (0-based) the user rejects on the device.
    pub reject_at: Mutex<Option<usize>>,
}

impl MockSigner {
    pub fn new(ledger: Arc<Mutex<Ledger>>) -> Self {
        Self {
            ledger,
            requests: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            reject_at: Mutex::new(None),
        }
    }

    pub fn message_signature(message: &[u8]) -> Vec<u8> {
        let mut sig = b"sig:".to_vec();
        sig.extend_from_slice(&message[..message.len().min(8)]);
        sig
    }
}

#[async_trait]
impl Signer for MockSigner {
    async fn get_address(
        &self,
        path: &DerivationPath,
        _coin_name: &str,
        _show_display: bool,
    ) -> Result<String, SignerError> {
        Ok(format!("addr:{path}"))
    }

    async fn get_public_key(
        &self,
        path: &DerivationPath,
        _coin_name: &str,
    ) -> Result<String, SignerError> {
        Ok(format!("tpub:{path}"))
    }

    async fn sign_message(
        &self,
        path: &DerivationPath,
        message: &[u8],
        _coin_name: &str,
    ) -> Result<MessageSignature, SignerError> {
        self.messages.lock().push((path.clone(), message.to_vec()));
        Ok(MessageSignature {
            address: "TsSignerAddress".to_string(),
            signature: Self::message_signature(message),
        })
    }

    async fn sign_transaction(&self, request: &SignRequest) -> Result<Vec<u8>, SignerError> {
        let call = {
            let mut requests = self.requests.lock();
            requests.push(request.clone());
            requests.len() - 1
        };
        if *self.reject_at.lock() == Some(call) {
            return Err(SignerError::Rejected);
        }

        let outpoints: Vec<(Hash, u32)> = request
            .inputs
            .iter()
            .map(|i| (i.prev_hash, i.prev_index))
            .collect();
        let hash = self
            .ledger
            .lock()
            .find_by_outpoints(&outpoints)
            .ok_or_else(|| SignerError::Refused("unknown transaction".into()))?;
        Ok(signed_raw(&hash))
    }
}

// ---------------------------------------------------------------------------
// MockVsp
// ---------------------------------------------------------------------------

pub struct MockVsp {
    pub fee_address: String,
    pub fee_address_calls: Mutex<Vec<SignedBody>>,
    pub pay_fee_calls: Mutex<Vec<SignedBody>>,
    pub already_paid: Mutex<bool>,
    pub fail_pay: Mutex<Option<VspError>>,
    pub expiration_offset: Mutex<i64>,
}

impl MockVsp {
    pub fn new(params: &NetworkParams) -> Self {
        Self {
            fee_address: address(params, 0xfe),
            fee_address_calls: Mutex::new(Vec::new()),
            pay_fee_calls: Mutex::new(Vec::new()),
            already_paid: Mutex::new(false),
            fail_pay: Mutex::new(None),
            expiration_offset: Mutex::new(3_600),
        }
    }
}

#[async_trait]
impl VspService for MockVsp {
    async fn fee_address(&self, body: &SignedBody) -> Result<FeeAddressResponse, VspError> {
        self.fee_address_calls.lock().push(body.clone());
        if *self.already_paid.lock() {
            return Err(VspError::AlreadyPaid);
        }
        let now = chrono::Utc::now().timestamp();
        Ok(FeeAddressResponse {
            timestamp: now,
            feeaddress: self.fee_address.clone(),
            feeamount: FEE_AMOUNT,
            expiration: now + *self.expiration_offset.lock(),
        })
    }

    async fn pay_fee(&self, body: &SignedBody) -> Result<PayFeeResponse, VspError> {
        self.pay_fee_calls.lock().push(body.clone());
        if let Some(err) = self.fail_pay.lock().clone() {
            return Err(err);
        }
        Ok(PayFeeResponse::default())
    }
}

// ---------------------------------------------------------------------------
// Session wiring
// ---------------------------------------------------------------------------

/// A wallet and a signer over the same ledger.
pub fn wallet_and_signer(params: &NetworkParams) -> (MockWallet, MockSigner) {
    let wallet = MockWallet::new(params.clone());
    let signer = MockSigner::new(Arc::clone(&wallet.ledger));
    (wallet, signer)
}
