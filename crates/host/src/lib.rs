//! ADB USB host
//!
//! Finds USB devices exposing an ADB interface and authenticates with one
//! of them over raw bulk endpoints:
//!
//! - [`usb`]: descriptor classification, the device filter and the claimed
//!   device session
//! - [`handshake`]: the `CNXN` / `AUTH` state machine
//! - [`selection`] and [`retry`]: which device to use and whether to try again
//! - [`config`]: TOML configuration

pub mod config;
pub mod error;
pub mod handshake;
pub mod retry;
pub mod selection;
pub mod usb;

pub use config::HostConfig;
pub use error::{HandshakeStage, HostError, Result};
pub use handshake::{DeviceBanner, Handshake, SessionOutcome, SessionState, run_handshake};
pub use retry::RetryPolicy;
pub use selection::{ByIndex, FirstCompliant, SelectionPolicy, select_device};
