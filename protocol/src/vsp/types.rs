//! VSP API v3 message bodies.
//!
//! Field names are the VSP's own (`tickethash`, `feeaddress`, ...) and must
//! not be renamed: the signature covers the exact JSON text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `POST /api/v3/feeaddress` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAddressRequest {
    pub timestamp: i64,
    pub tickethash: String,
    pub tickethex: String,
    pub parenthex: String,
}

/// `POST /api/v3/feeaddress` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAddressResponse {
    #[serde(default)]
    pub timestamp: i64,
    pub feeaddress: String,
    /// Fee in atoms.
    pub feeamount: u64,
    /// Unix time after which the quote is void.
    pub expiration: i64,
}

/// `POST /api/v3/payfee` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayFeeRequest {
    pub timestamp: i64,
    pub tickethash: String,
    /// Signed fee transaction, hex.
    pub feetx: String,
    pub votingkey: String,
    /// Agenda id to choice id.
    pub votechoices: BTreeMap<String, String>,
}

/// `POST /api/v3/payfee` response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayFeeResponse {
    #[serde(default)]
    pub timestamp: i64,
}

/// Error body returned with any non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VspErrorBody {
    pub code: i64,
    pub message: String,
}

/// A request body together with the base64 signature over its exact bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBody {
    pub json: String,
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_address_request_field_order() {
        let req = FeeAddressRequest {
            timestamp: 1_700_000_000,
            tickethash: "ab".into(),
            tickethex: "01".into(),
            parenthex: "02".into(),
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"timestamp":1700000000,"tickethash":"ab","tickethex":"01","parenthex":"02"}"#
        );
    }

    #[test]
    fn fee_address_response_tolerates_extra_fields() {
        let json = r#"{"timestamp":1,"feeaddress":"TsFee","feeamount":12345,
                      "expiration":99,"request":"eyJ9"}"#;
        let resp: FeeAddressResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.feeamount, 12_345);
        assert_eq!(resp.feeaddress, "TsFee");
    }
}
