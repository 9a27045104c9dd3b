//! Common utilities for rust-adb-usb
//!
//! This crate provides functionality shared by the host binary and its
//! tests: the common error type, tracing setup, and ADB key handling with
//! the token-signing capability used during authentication.

pub mod error;
pub mod keys;
pub mod logging;

pub use error::{Error, Result};
pub use keys::{AdbRsaSigner, TOKEN_SIZE, TokenSigner, default_adb_key_path, load_private_key};
pub use logging::setup_logging;
