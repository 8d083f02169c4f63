//! # Codec
//!
//! Byte and string conversions shared by every other module.
//!
//! Two conventions coexist and mixing them up is the classic bug in this
//! domain:
//!
//! - **Hashes** (transaction ids, block hashes) are displayed byte-reversed.
//!   The wallet hands us raw bytes, humans and the signer want the reversed
//!   hex string.
//! - **Scripts and serialized transactions** are never reversed. Plain hex.
//!
//! ```text
//! raw bytes  00 11 22 .. ff      --hex-->  "001122..ff"
//! display    "ff..221100"        <--reverse_byte_order--
//! ```

pub mod address;
pub mod hash;

mod error;

pub use address::{decode_address, AddressKind, DecodedAddress};
pub use error::CodecError;
pub use hash::{
    display_hash_to_raw, hex_to_base64, hex_to_raw, raw_to_display_hash, raw_to_hex,
    reverse_byte_order, utf8_to_hex, Hash,
};

/// Serde adapter that carries a `u64` amount as a decimal string.
///
/// Signer requests are JSON consumed by tooling that parses numbers as IEEE
/// doubles; atoms above 2^53 would silently lose precision as numbers.
pub mod decimal_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<u64>().map_err(de::Error::custom)
    }
}

/// Serde adapter for byte vectors carried as plain (unreversed) hex.
pub mod hex_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Carrier {
        #[serde(with = "super::decimal_string")]
        amount: u64,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Script {
        #[serde(with = "super::hex_bytes")]
        bytes: Vec<u8>,
    }

    #[test]
    fn scripts_travel_as_plain_hex() {
        let s = Script {
            bytes: vec![0x76, 0xa9],
        };
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"bytes":"76a9"}"#);
        assert_eq!(serde_json::from_str::<Script>(&json).unwrap(), s);
    }

    #[test]
    fn amounts_travel_as_strings() {
        let c = Carrier { amount: u64::MAX };
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"amount":"18446744073709551615"}"#);
        let back: Carrier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn numeric_amount_is_rejected() {
        assert!(serde_json::from_str::<Carrier>(r#"{"amount":12}"#).is_err());
    }
}
