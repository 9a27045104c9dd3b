//! Classification of incoming messages
//!
//! A received header is turned into a [`MessageKind`] before anything else
//! is read from the device, so callers branch on a checked tag instead of
//! trusting raw `command`/`arg0` words.

use crate::codec::MessageHeader;
use crate::constants::{A_AUTH, A_CNXN, AUTH_RSAPUBLICKEY, AUTH_SIGNATURE, AUTH_TOKEN, command_name};
use std::fmt;

/// Message types this host distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// `CNXN`: the device accepted the connection
    Connect { version: u32, max_payload: u32 },
    /// `AUTH(TOKEN)`: random challenge to be signed
    AuthToken,
    /// `AUTH(SIGNATURE)`
    AuthSignature,
    /// `AUTH(RSAPUBLICKEY)`
    AuthRsaPublicKey,
    /// `AUTH` with an auth type this host does not know
    Auth { auth_type: u32 },
    /// Anything else
    Unknown { command: u32 },
}

impl MessageKind {
    /// Classify a decoded header
    pub fn from_header(header: &MessageHeader) -> Self {
        match header.command {
            A_CNXN => MessageKind::Connect {
                version: header.arg0,
                max_payload: header.arg1,
            },
            A_AUTH => match header.arg0 {
                AUTH_TOKEN => MessageKind::AuthToken,
                AUTH_SIGNATURE => MessageKind::AuthSignature,
                AUTH_RSAPUBLICKEY => MessageKind::AuthRsaPublicKey,
                auth_type => MessageKind::Auth { auth_type },
            },
            command => MessageKind::Unknown { command },
        }
    }

    /// True for every `AUTH` variant
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            MessageKind::AuthToken
                | MessageKind::AuthSignature
                | MessageKind::AuthRsaPublicKey
                | MessageKind::Auth { .. }
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Connect { version, .. } => write!(f, "CNXN(version={:#010x})", version),
            MessageKind::AuthToken => write!(f, "AUTH(TOKEN)"),
            MessageKind::AuthSignature => write!(f, "AUTH(SIGNATURE)"),
            MessageKind::AuthRsaPublicKey => write!(f, "AUTH(RSAPUBLICKEY)"),
            MessageKind::Auth { auth_type } => write!(f, "AUTH(type={})", auth_type),
            MessageKind::Unknown { command } => write!(f, "{}", command_name(*command)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{A_VERSION, AUTH_MAGIC, HOST_BANNER, MAX_PAYLOAD};

    fn auth_header(auth_type: u32) -> MessageHeader {
        MessageHeader {
            command: A_AUTH,
            arg0: auth_type,
            arg1: 0,
            data_length: 20,
            data_checksum: 0,
            magic: AUTH_MAGIC,
        }
    }

    #[test]
    fn test_classify_connect() {
        let kind = MessageKind::from_header(&MessageHeader::connect(HOST_BANNER));
        assert_eq!(
            kind,
            MessageKind::Connect {
                version: A_VERSION,
                max_payload: MAX_PAYLOAD
            }
        );
        assert!(!kind.is_auth());
    }

    #[test]
    fn test_classify_auth_types() {
        assert_eq!(
            MessageKind::from_header(&auth_header(AUTH_TOKEN)),
            MessageKind::AuthToken
        );
        assert_eq!(
            MessageKind::from_header(&auth_header(AUTH_SIGNATURE)),
            MessageKind::AuthSignature
        );
        assert_eq!(
            MessageKind::from_header(&auth_header(AUTH_RSAPUBLICKEY)),
            MessageKind::AuthRsaPublicKey
        );
        assert_eq!(
            MessageKind::from_header(&auth_header(9)),
            MessageKind::Auth { auth_type: 9 }
        );
        assert!(MessageKind::from_header(&auth_header(9)).is_auth());
    }

    #[test]
    fn test_classify_unknown() {
        let mut header = auth_header(AUTH_TOKEN);
        header.command = u32::from_le_bytes(*b"OKAY");
        let kind = MessageKind::from_header(&header);
        assert!(matches!(kind, MessageKind::Unknown { .. }));
        assert_eq!(kind.to_string(), "OKAY");
    }
}
