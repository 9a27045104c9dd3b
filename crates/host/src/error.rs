//! Host error types

use crate::usb::classifier::Rejection;
use crate::usb::transfers::TransferError;
use protocol::{MessageKind, ProtocolError};
use std::fmt;
use thiserror::Error;

/// Step of the handshake an error happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    SendConnect,
    ReadToken,
    SendSignature,
    ReadAuthResult,
}

impl fmt::Display for HandshakeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            HandshakeStage::SendConnect => "sending CNXN",
            HandshakeStage::ReadToken => "reading AUTH token",
            HandshakeStage::SendSignature => "sending AUTH signature",
            HandshakeStage::ReadAuthResult => "reading AUTH result",
        };
        f.write_str(stage)
    }
}

/// Errors raised while finding a device and authenticating with it
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Error opening device ({0})")]
    OpenFailure(TransferError),

    #[error("Error claiming interface {interface} ({source})")]
    ClaimFailure {
        interface: u8,
        source: TransferError,
    },

    #[error("Error reading descriptor ({0})")]
    DescriptorReadFailure(TransferError),

    #[error("Malformed ADB interface: {0}")]
    MalformedInterface(Rejection),

    #[error("Transport failure while {stage}: {kind}")]
    TransportFailure {
        stage: HandshakeStage,
        kind: TransferError,
    },

    #[error("Short write while {stage}: sent {sent} of {expected} bytes")]
    ShortWrite {
        stage: HandshakeStage,
        sent: usize,
        expected: usize,
    },

    #[error("Signing failure: {0}")]
    SigningFailure(#[source] common::Error),

    #[error("Device rejected authentication (answered with {0})")]
    ProtocolRejection(MessageKind),

    #[error("Protocol error while {stage}: {source}")]
    Protocol {
        stage: HandshakeStage,
        #[source]
        source: ProtocolError,
    },

    #[error("No ADB-compliant devices found")]
    NoCompliantDevice,

    #[error("Device {0} does not expose an ADB interface")]
    NotCompliant(usize),
}

impl HostError {
    /// Transport failures that may clear up on a second attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            HostError::TransportFailure { kind, .. } => kind.is_transient(),
            _ => false,
        }
    }

    /// The transport error kind, for failures caused by the transport
    pub fn transfer_error(&self) -> Option<TransferError> {
        match self {
            HostError::OpenFailure(kind)
            | HostError::DescriptorReadFailure(kind)
            | HostError::TransportFailure { kind, .. }
            | HostError::ClaimFailure { source: kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        let timeout = HostError::TransportFailure {
            stage: HandshakeStage::ReadToken,
            kind: TransferError::Timeout,
        };
        assert!(timeout.is_retryable());

        let gone = HostError::TransportFailure {
            stage: HandshakeStage::SendConnect,
            kind: TransferError::DeviceDisconnected,
        };
        assert!(!gone.is_retryable());
        assert!(!HostError::ProtocolRejection(MessageKind::AuthToken).is_retryable());
    }

    #[test]
    fn test_display_names_stage() {
        let err = HostError::TransportFailure {
            stage: HandshakeStage::SendConnect,
            kind: TransferError::DeviceDisconnected,
        };
        assert_eq!(
            err.to_string(),
            "Transport failure while sending CNXN: Device has been disconnected"
        );
        assert_eq!(
            HostError::ProtocolRejection(MessageKind::AuthToken).to_string(),
            "Device rejected authentication (answered with AUTH(TOKEN))"
        );
    }

    #[test]
    fn test_transfer_error_accessor() {
        assert_eq!(
            HostError::OpenFailure(TransferError::PermissionDenied).transfer_error(),
            Some(TransferError::PermissionDenied)
        );
        assert_eq!(HostError::NoCompliantDevice.transfer_error(), None);
    }

    #[test]
    fn test_stage_names() {
        let stages = [
            HandshakeStage::SendConnect,
            HandshakeStage::ReadToken,
            HandshakeStage::SendSignature,
            HandshakeStage::ReadAuthResult,
        ];
        let names: Vec<String> = stages.iter().map(|stage| stage.to_string()).collect();
        assert_eq!(
            names,
            [
                "sending CNXN",
                "reading AUTH token",
                "sending AUTH signature",
                "reading AUTH result"
            ]
        );
    }

    #[test]
    fn test_signing_failure_keeps_source() {
        let err = HostError::SigningFailure(common::Error::Signing("bad token".into()));
        assert_eq!(err.to_string(), "Signing failure: Signing error: bad token");
        assert!(std::error::Error::source(&err).is_some());
    }
}
