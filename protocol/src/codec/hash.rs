//! Hex, hash and text conversions.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::error::CodecError;

/// Reverses the byte order of a hex string.
///
/// The input is treated as a sequence of byte pairs. An odd-length input is
/// left-padded with a single `0` nibble first, so `"abc"` becomes `"0abc"`
/// and then `"bc0a"`. Characters are passed through unchanged (case is
/// preserved).
pub fn reverse_byte_order(hex_str: &str) -> Result<String, CodecError> {
    if let Some(c) = hex_str.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(CodecError::MalformedEncoding(format!(
            "invalid hex character {c:?}"
        )));
    }

    let padded = if hex_str.len() % 2 == 1 {
        format!("0{hex_str}")
    } else {
        hex_str.to_string()
    };

    let bytes = padded.as_bytes();
    let mut out = String::with_capacity(padded.len());
    for pair in bytes.chunks(2).rev() {
        // ASCII hex digits only, so bytes are chars.
        out.push(pair[0] as char);
        out.push(pair[1] as char);
    }
    Ok(out)
}

/// Decodes a display (byte-reversed) hash string into raw bytes.
pub fn display_hash_to_raw(display: &str) -> Result<Vec<u8>, CodecError> {
    let reversed = reverse_byte_order(display)?;
    Ok(hex::decode(reversed)?)
}

/// Encodes raw hash bytes as a display (byte-reversed) hex string.
pub fn raw_to_display_hash(raw: &[u8]) -> String {
    let mut reversed = raw.to_vec();
    reversed.reverse();
    hex::encode(reversed)
}

/// Plain hex decoding, no reversal. Used for scripts and serialized txs.
pub fn hex_to_raw(hex_str: &str) -> Result<Vec<u8>, CodecError> {
    Ok(hex::decode(hex_str)?)
}

/// Plain hex encoding, no reversal.
pub fn raw_to_hex(raw: &[u8]) -> String {
    hex::encode(raw)
}

/// Hex encoding of the UTF-8 bytes of `s`. Message signing payloads are
/// handed to the signer in this form.
pub fn utf8_to_hex(s: &str) -> String {
    hex::encode(s.as_bytes())
}

/// Re-encodes a hex string as standard base64 (with padding).
pub fn hex_to_base64(hex_str: &str) -> Result<String, CodecError> {
    let raw = hex::decode(hex_str)?;
    Ok(BASE64.encode(raw))
}

// ---------------------------------------------------------------------------
// Hash
// ---------------------------------------------------------------------------

/// A 32-byte transaction or block hash, stored in raw (wire) order.
///
/// `Display`, `FromStr` and serde all use the byte-reversed display form,
/// which is what block explorers, the signer and VSPs expect.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash([u8; 32]);

impl Hash {
    pub const LEN: usize = 32;

    /// Wraps raw bytes as received from the wallet.
    pub fn from_raw(raw: &[u8]) -> Result<Self, CodecError> {
        let bytes: [u8; 32] = raw.try_into().map_err(|_| {
            CodecError::MalformedEncoding(format!(
                "hash must be {} bytes, got {}",
                Self::LEN,
                raw.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Parses a display (byte-reversed) hex string.
    pub fn from_display(display: &str) -> Result<Self, CodecError> {
        if display.len() != Self::LEN * 2 {
            return Err(CodecError::MalformedEncoding(format!(
                "display hash must be {} hex characters, got {}",
                Self::LEN * 2,
                display.len()
            )));
        }
        Self::from_raw(&display_hash_to_raw(display)?)
    }

    /// Raw bytes in wire order.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Byte-reversed hex form.
    pub fn to_display(&self) -> String {
        raw_to_display_hash(&self.0)
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_display())
    }
}

impl FromStr for Hash {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_display(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_display(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISPLAY: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

    #[test]
    fn reverse_swaps_pairs_not_nibbles() {
        assert_eq!(reverse_byte_order("0011aabb").unwrap(), "bbaa1100");
    }

    #[test]
    fn reverse_pads_odd_length() {
        assert_eq!(reverse_byte_order("abc").unwrap(), "bc0a");
    }

    #[test]
    fn reverse_is_an_involution_on_even_input() {
        for h in ["", "00", "0102", DISPLAY, "DEADbeef"] {
            let twice = reverse_byte_order(&reverse_byte_order(h).unwrap()).unwrap();
            assert_eq!(twice, h);
        }
    }

    #[test]
    fn reverse_rejects_non_hex() {
        assert!(matches!(
            reverse_byte_order("zz"),
            Err(CodecError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn display_and_raw_round_trip() {
        let raw = display_hash_to_raw(DISPLAY).unwrap();
        assert_eq!(raw[0], 0x3b);
        assert_eq!(raw[31], 0x4a);
        assert_eq!(raw_to_display_hash(&raw), DISPLAY);
    }

    #[test]
    fn scripts_are_not_reversed() {
        let raw = hex_to_raw("76a914").unwrap();
        assert_eq!(raw, vec![0x76, 0xa9, 0x14]);
        assert_eq!(raw_to_hex(&raw), "76a914");
    }

    #[test]
    fn hex_to_raw_rejects_odd_length() {
        assert!(hex_to_raw("abc").is_err());
    }

    #[test]
    fn hash_parses_and_displays() {
        let h: Hash = DISPLAY.parse().unwrap();
        assert_eq!(h.to_string(), DISPLAY);
        assert_eq!(h.as_bytes()[0], 0x3b);
    }

    #[test]
    fn hash_rejects_wrong_length() {
        assert!(Hash::from_display("abcd").is_err());
        assert!(Hash::from_raw(&[0u8; 31]).is_err());
    }

    #[test]
    fn hash_serde_uses_display_form() {
        let h = Hash::from_display(DISPLAY).unwrap();
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{DISPLAY}\""));
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn text_helpers() {
        assert_eq!(utf8_to_hex("hi"), "6869");
        assert_eq!(hex_to_base64("6869").unwrap(), "aGk=");
        assert!(hex_to_base64("6").is_err());
    }
}
