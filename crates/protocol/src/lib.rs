//! ADB wire protocol for rust-adb-usb
//!
//! This crate defines the pieces of the Android Debug Bridge message format
//! the host needs for the connection and authentication handshake: the
//! 24-byte message header, the additive payload checksum, the protocol
//! constants, and classification of incoming headers into tagged variants.
//!
//! # Example
//!
//! ```
//! use protocol::{HOST_BANNER, MessageHeader, MessageKind, checksum};
//!
//! // Outgoing CNXN: header first, banner as a separate transfer
//! let header = MessageHeader::connect(HOST_BANNER);
//! let wire = header.encode();
//! assert_eq!(wire.len(), 24);
//! assert_eq!(header.data_checksum, checksum(HOST_BANNER));
//!
//! // Incoming: decode, then branch on the tag
//! let decoded = MessageHeader::decode(&wire).unwrap();
//! assert!(matches!(MessageKind::from_header(&decoded), MessageKind::Connect { .. }));
//! ```

pub mod codec;
pub mod constants;
pub mod error;
pub mod integrity;
pub mod messages;

pub use codec::MessageHeader;
pub use constants::{
    A_AUTH, A_CNXN, A_VERSION, AUTH_MAGIC, AUTH_RSAPUBLICKEY, AUTH_SIGNATURE, AUTH_TOKEN,
    CNXN_MAGIC, HEADER_SIZE, HOST_BANNER, MAX_PAYLOAD, command_name,
};
pub use error::{ProtocolError, Result};
pub use integrity::{checksum, verify_checksum};
pub use messages::MessageKind;
