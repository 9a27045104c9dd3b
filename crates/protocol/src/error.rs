//! Protocol error types

use thiserror::Error;

/// Protocol-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Header buffer shorter than the fixed header size
    #[error("Malformed header: needed {needed} bytes, got {available}")]
    MalformedHeader { needed: usize, available: usize },

    /// Declared payload length exceeds the negotiated maximum
    #[error("Payload too large: {size} bytes (max: {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Fewer payload bytes arrived than the header declared
    #[error("Incomplete payload: expected {expected} bytes, got {actual}")]
    IncompletePayload { expected: usize, actual: usize },

    /// Payload does not add up to the header's checksum
    #[error("Checksum mismatch: header says {expected:#010x}, payload sums to {computed:#010x}")]
    ChecksumMismatch { expected: u32, computed: u32 },

    /// A message arrived that is not valid at this point of the exchange
    #[error("Unexpected message: expected {expected}, got {actual}")]
    UnexpectedMessage {
        expected: &'static str,
        actual: String,
    },
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;
