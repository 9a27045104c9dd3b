//! USB transfer plumbing
//!
//! Every USB call the host makes reports failures as a [`TransferError`],
//! produced from `rusb::Error` by [`map_rusb_error`]. The handshake talks to
//! the device through the [`BulkTransport`] trait so it can be driven by a
//! scripted transport in tests.

use std::fmt;

/// Uniform classification of USB transport failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferError {
    Timeout,
    EndpointHalted,
    EndpointOverflow,
    DeviceDisconnected,
    PermissionDenied,
    OutOfMemory,
    Unknown,
}

impl TransferError {
    /// Errors worth retrying on the same device
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransferError::Timeout | TransferError::EndpointHalted | TransferError::EndpointOverflow
        )
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            TransferError::Timeout => "Transfer timed out",
            TransferError::EndpointHalted => "Endpoint halted",
            TransferError::EndpointOverflow => "Endpoint overflow",
            TransferError::DeviceDisconnected => "Device has been disconnected",
            TransferError::PermissionDenied => "Insufficient permissions",
            TransferError::OutOfMemory => "No memory",
            TransferError::Unknown => "Unknown error",
        };
        f.write_str(description)
    }
}

impl std::error::Error for TransferError {}

impl From<rusb::Error> for TransferError {
    fn from(err: rusb::Error) -> Self {
        map_rusb_error(err)
    }
}

/// Map rusb::Error to TransferError
pub fn map_rusb_error(err: rusb::Error) -> TransferError {
    match err {
        rusb::Error::Timeout => TransferError::Timeout,
        rusb::Error::Pipe => TransferError::EndpointHalted,
        rusb::Error::Overflow => TransferError::EndpointOverflow,
        rusb::Error::NoDevice => TransferError::DeviceDisconnected,
        rusb::Error::Access => TransferError::PermissionDenied,
        rusb::Error::NoMem => TransferError::OutOfMemory,
        _ => TransferError::Unknown,
    }
}

/// Blocking bulk transfers on a claimed interface
pub trait BulkTransport {
    /// Write `data` to the OUT endpoint, returning the number of bytes sent
    fn write_bulk(&mut self, endpoint: u8, data: &[u8]) -> Result<usize, TransferError>;

    /// Read into `buf` from the IN endpoint, returning the number of bytes received
    fn read_bulk(&mut self, endpoint: u8, buf: &mut [u8]) -> Result<usize, TransferError>;
}

impl<T: BulkTransport + ?Sized> BulkTransport for &mut T {
    fn write_bulk(&mut self, endpoint: u8, data: &[u8]) -> Result<usize, TransferError> {
        (**self).write_bulk(endpoint, data)
    }

    fn read_bulk(&mut self, endpoint: u8, buf: &mut [u8]) -> Result<usize, TransferError> {
        (**self).read_bulk(endpoint, buf)
    }
}
