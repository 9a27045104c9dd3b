//! ADB protocol constants
//!
//! Command words are the ASCII tag read as a little-endian `u32`. The magic
//! values are kept as literal constants rather than computed from the
//! command; [`crate::MessageHeader::has_derived_magic`] reports whether a
//! header still follows the `magic == !command` rule.

/// Size of the fixed message header on the wire
pub const HEADER_SIZE: usize = 24;

/// `CNXN`: connection request / acceptance
pub const A_CNXN: u32 = 0x4e58_4e43;

/// `AUTH`: authentication exchange
pub const A_AUTH: u32 = 0x4854_5541;

/// Magic word sent with `CNXN`
pub const CNXN_MAGIC: u32 = 0xb1a7_b1bc;

/// Magic word sent with `AUTH`
pub const AUTH_MAGIC: u32 = 0xb7ab_aabe;

/// Protocol version advertised in `CNXN.arg0`
pub const A_VERSION: u32 = 0x0100_0000;

/// Largest payload this host accepts, advertised in `CNXN.arg1`
pub const MAX_PAYLOAD: u32 = 4096;

/// `AUTH.arg0`: device sends a random token
pub const AUTH_TOKEN: u32 = 1;

/// `AUTH.arg0`: host answers with a signed token
pub const AUTH_SIGNATURE: u32 = 2;

/// `AUTH.arg0`: host offers its public key
pub const AUTH_RSAPUBLICKEY: u32 = 3;

/// System identity banner sent by the host with `CNXN`, NUL terminated
pub const HOST_BANNER: &[u8] = b"host::\0";

/// Render a command word as its four-character tag, e.g. `CNXN`
pub fn command_name(command: u32) -> String {
    let bytes = command.to_le_bytes();
    if bytes.iter().all(|b| b.is_ascii_uppercase()) {
        bytes.iter().map(|&b| b as char).collect()
    } else {
        format!("{:#010x}", command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_words_spell_tags() {
        assert_eq!(&A_CNXN.to_le_bytes(), b"CNXN");
        assert_eq!(&A_AUTH.to_le_bytes(), b"AUTH");
    }

    #[test]
    fn test_command_name() {
        assert_eq!(command_name(A_CNXN), "CNXN");
        assert_eq!(command_name(A_AUTH), "AUTH");
        assert_eq!(command_name(0x1234), "0x00001234");
    }

    #[test]
    fn test_host_banner() {
        assert_eq!(HOST_BANNER.len(), 7);
        assert_eq!(HOST_BANNER.last(), Some(&0));
    }
}
