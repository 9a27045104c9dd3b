//! ADB host key loading and token signing
//!
//! The host proves possession of its private key by signing the random token
//! a device sends in `AUTH(TOKEN)`. This module locates and loads the key the
//! stock ADB tools keep on disk and exposes signing behind [`TokenSigner`] so
//! the handshake never touches key material itself.
//!
//! Key location, in order:
//! - `$ANDROID_USER_HOME/adbkey`
//! - `~/.android/adbkey`

use crate::{Error, Result};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha1::Sha1;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Private key filename used by the ADB tools
const ADB_KEY_FILENAME: &str = "adbkey";

/// Directory under the home directory holding ADB state
const ANDROID_DIR: &str = ".android";

/// Length of the token adbd sends (a SHA-1 sized challenge)
pub const TOKEN_SIZE: usize = 20;

/// Signs authentication tokens on behalf of the handshake
pub trait TokenSigner {
    /// Sign `token` and return the raw signature bytes
    ///
    /// Implementations decide whether and how the token is hashed; the
    /// handshake passes the bytes exactly as the device sent them.
    fn sign_token(&self, token: &[u8]) -> Result<Vec<u8>>;
}

impl<T: TokenSigner + ?Sized> TokenSigner for &T {
    fn sign_token(&self, token: &[u8]) -> Result<Vec<u8>> {
        (**self).sign_token(token)
    }
}

/// RSA signer compatible with adbd
///
/// adbd verifies with `RSA_verify(NID_sha1, token, ...)`, i.e. the token is
/// treated as an already computed SHA-1 digest. Signing therefore applies
/// PKCS#1 v1.5 padding with the SHA-1 `DigestInfo` prefix over the raw token
/// and performs no hashing. Tokens that are not exactly [`TOKEN_SIZE`]
/// bytes are rejected.
pub struct AdbRsaSigner {
    key: RsaPrivateKey,
}

impl AdbRsaSigner {
    /// Wrap an already loaded key
    pub fn new(key: RsaPrivateKey) -> Self {
        Self { key }
    }

    /// Modulus size in bytes, which is also the signature length
    pub fn signature_len(&self) -> usize {
        self.key.size()
    }
}

impl TokenSigner for AdbRsaSigner {
    fn sign_token(&self, token: &[u8]) -> Result<Vec<u8>> {
        if token.len() != TOKEN_SIZE {
            return Err(Error::Signing(format!(
                "token is {} bytes, expected {}",
                token.len(),
                TOKEN_SIZE
            )));
        }

        let signature = self
            .key
            .sign(Pkcs1v15Sign::new::<Sha1>(), token)
            .map_err(|e| Error::Signing(e.to_string()))?;

        debug!(
            "Signed {} byte token, signature is {} bytes",
            token.len(),
            signature.len()
        );
        Ok(signature)
    }
}

/// Get the default ADB private key path
///
/// Honours `ANDROID_USER_HOME` the way the ADB tools do, then falls back to
/// `~/.android/adbkey`.
pub fn default_adb_key_path() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("ANDROID_USER_HOME") {
        return Ok(PathBuf::from(dir).join(ADB_KEY_FILENAME));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| Error::Key("Failed to determine home directory (HOME not set?)".into()))?;

    Ok(home.join(ANDROID_DIR).join(ADB_KEY_FILENAME))
}

/// Load an RSA private key from a PEM file
///
/// `adb keygen` writes PKCS#8 (`BEGIN PRIVATE KEY`); PKCS#1
/// (`BEGIN RSA PRIVATE KEY`) is accepted as well.
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The contents are neither PKCS#8 nor PKCS#1 PEM
pub fn load_private_key(path: &Path) -> Result<AdbRsaSigner> {
    debug!("Loading ADB private key from {}", path.display());

    let pem = fs::read_to_string(path).map_err(|e| {
        Error::Key(format!(
            "Failed to read private key {}: {}. Run 'adb keygen {}' to create one.",
            path.display(),
            e,
            path.display()
        ))
    })?;

    let key = RsaPrivateKey::from_pkcs8_pem(&pem)
        .or_else(|pkcs8_err| {
            RsaPrivateKey::from_pkcs1_pem(&pem).map_err(|pkcs1_err| {
                Error::Key(format!(
                    "Invalid private key {}: not PKCS#8 ({}) or PKCS#1 ({})",
                    path.display(),
                    pkcs8_err,
                    pkcs1_err
                ))
            })
        })?;

    info!(
        "Loaded {}-bit ADB key from {}",
        key.size() * 8,
        path.display()
    );
    Ok(AdbRsaSigner::new(key))
}
