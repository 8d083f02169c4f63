//! # Signer
//!
//! The hardware signer is a black box behind the [`Signer`] trait. Transport,
//! pairing and PIN/passphrase prompts belong to whoever implements it; this
//! crate only decides *what* to ask the device.
//!
//! ```text
//!   Translator ──SignRequest──▶ Signer ──signed tx bytes──▶ Orchestrator
//!                               │
//!                               ├─ get_address     (display / confirm)
//!                               ├─ get_public_key  (account xpub)
//!                               └─ sign_message    (VSP request auth)
//! ```

pub mod path;
pub mod types;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use path::{DerivationPath, PathParseError};
pub use types::{
    InputScriptType, OutputDestination, OutputScriptType, RefInput, RefOutput,
    ReferenceTransaction, SignRequest, SignerInput, SignerOutput,
};

/// Errors reported by a signer implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// The device could not be reached or the session was lost.
    #[error("signer unavailable: {0}")]
    Unavailable(String),

    /// The user declined the request on the device.
    #[error("request rejected on device")]
    Rejected,

    /// The device refused the request as malformed.
    #[error("signer refused request: {0}")]
    Refused(String),

    /// The device answered with something we could not interpret.
    #[error("invalid signer response: {0}")]
    InvalidResponse(String),
}

/// A compact message signature together with the address that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSignature {
    pub address: String,
    #[serde(with = "crate::codec::hex_bytes")]
    pub signature: Vec<u8>,
}

impl MessageSignature {
    /// The signature as base64, the form wallets and VSPs accept.
    pub fn to_base64(&self) -> String {
        use base64::Engine as _;
        base64::engine::general_purpose::STANDARD.encode(&self.signature)
    }
}

/// Operations a hardware signer exposes.
///
/// Every call names the coin so one device can serve several networks.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Derives the address at `path`, optionally showing it on the device.
    async fn get_address(
        &self,
        path: &DerivationPath,
        coin_name: &str,
        show_display: bool,
    ) -> Result<String, SignerError>;

    /// Returns the extended public key at `path`.
    async fn get_public_key(
        &self,
        path: &DerivationPath,
        coin_name: &str,
    ) -> Result<String, SignerError>;

    /// Signs `message` with the key at `path`.
    async fn sign_message(
        &self,
        path: &DerivationPath,
        message: &[u8],
        coin_name: &str,
    ) -> Result<MessageSignature, SignerError>;

    /// Signs a transaction and returns it fully serialized.
    async fn sign_transaction(&self, request: &SignRequest) -> Result<Vec<u8>, SignerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_signature_base64() {
        let sig = MessageSignature {
            address: "TsAddr".into(),
            signature: b"hello".to_vec(),
        };
        assert_eq!(sig.to_base64(), "aGVsbG8=");
    }
}
