//! Message header encoding and decoding
//!
//! Every ADB message starts with a fixed 24-byte header of six little-endian
//! `u32` words, followed by `data_length` payload bytes:
//!
//! ```text
//! [command][arg0][arg1][data_length][data_checksum][magic]
//! ```
//!
//! On USB the header and the payload travel as separate bulk transfers, so
//! the header is always encoded and decoded on its own.

use crate::constants::{
    A_AUTH, A_CNXN, A_VERSION, AUTH_MAGIC, AUTH_SIGNATURE, CNXN_MAGIC, HEADER_SIZE, MAX_PAYLOAD,
};
use crate::error::{ProtocolError, Result};
use crate::integrity::checksum;
use byteorder::{ByteOrder, LittleEndian};

/// The fixed-layout ADB message header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub command: u32,
    pub arg0: u32,
    pub arg1: u32,
    pub data_length: u32,
    pub data_checksum: u32,
    pub magic: u32,
}

impl MessageHeader {
    /// Build the `CNXN` header announcing `payload` (normally [`crate::HOST_BANNER`])
    ///
    /// # Example
    /// ```
    /// use protocol::{HOST_BANNER, MessageHeader, A_CNXN};
    ///
    /// let header = MessageHeader::connect(HOST_BANNER);
    /// assert_eq!(header.command, A_CNXN);
    /// assert_eq!(header.data_length, 7);
    /// ```
    pub fn connect(payload: &[u8]) -> Self {
        Self {
            command: A_CNXN,
            arg0: A_VERSION,
            arg1: MAX_PAYLOAD,
            data_length: payload.len() as u32,
            data_checksum: checksum(payload),
            magic: CNXN_MAGIC,
        }
    }

    /// Build the `AUTH(SIGNATURE)` header announcing `signature`
    pub fn auth_signature(signature: &[u8]) -> Self {
        Self {
            command: A_AUTH,
            arg0: AUTH_SIGNATURE,
            arg1: 0,
            data_length: signature.len() as u32,
            data_checksum: checksum(signature),
            magic: AUTH_MAGIC,
        }
    }

    /// Serialize into the 24-byte wire form
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        LittleEndian::write_u32_into(
            &[
                self.command,
                self.arg0,
                self.arg1,
                self.data_length,
                self.data_checksum,
                self.magic,
            ],
            &mut buf,
        );
        buf
    }

    /// Parse a header from the first 24 bytes of `buf`
    ///
    /// Trailing bytes are ignored. Fails with
    /// [`ProtocolError::MalformedHeader`] when fewer than 24 bytes are given.
    ///
    /// # Example
    /// ```
    /// use protocol::{HOST_BANNER, MessageHeader};
    ///
    /// let header = MessageHeader::connect(HOST_BANNER);
    /// let decoded = MessageHeader::decode(&header.encode()).unwrap();
    /// assert_eq!(decoded, header);
    ///
    /// assert!(MessageHeader::decode(&[0u8; 10]).is_err());
    /// ```
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(ProtocolError::MalformedHeader {
                needed: HEADER_SIZE,
                available: buf.len(),
            });
        }

        let mut words = [0u32; 6];
        LittleEndian::read_u32_into(&buf[..HEADER_SIZE], &mut words);

        Ok(Self {
            command: words[0],
            arg0: words[1],
            arg1: words[2],
            data_length: words[3],
            data_checksum: words[4],
            magic: words[5],
        })
    }

    /// Declared payload length, checked against `max`
    pub fn payload_len(&self, max: u32) -> Result<usize> {
        if self.data_length > max {
            return Err(ProtocolError::PayloadTooLarge {
                size: self.data_length as usize,
                max: max as usize,
            });
        }
        Ok(self.data_length as usize)
    }

    /// Check a received payload against this header
    ///
    /// The length must match exactly. A zero checksum is accepted without
    /// verification since newer devices stop filling the field in.
    pub fn verify_payload(&self, payload: &[u8]) -> Result<()> {
        if payload.len() != self.data_length as usize {
            return Err(ProtocolError::IncompletePayload {
                expected: self.data_length as usize,
                actual: payload.len(),
            });
        }
        if self.data_checksum != 0 {
            let computed = checksum(payload);
            if computed != self.data_checksum {
                return Err(ProtocolError::ChecksumMismatch {
                    expected: self.data_checksum,
                    computed,
                });
            }
        }
        Ok(())
    }

    /// Whether `magic` is the bitwise complement of `command`
    ///
    /// Headers built from the constants in this crate always satisfy this;
    /// a `false` here means a command and its magic constant went out of sync.
    pub fn has_derived_magic(&self) -> bool {
        self.magic == !self.command
    }
}
