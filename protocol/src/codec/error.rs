use thiserror::Error;

/// Errors raised by the codec helpers. All of them are local: no I/O is
/// involved, so they always point at bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The input is not valid hex, base58, or has the wrong length.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),
}

impl From<hex::FromHexError> for CodecError {
    fn from(err: hex::FromHexError) -> Self {
        CodecError::MalformedEncoding(err.to_string())
    }
}

impl From<bs58::decode::Error> for CodecError {
    fn from(err: bs58::decode::Error) -> Self {
        CodecError::MalformedEncoding(err.to_string())
    }
}
