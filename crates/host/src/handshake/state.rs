//! Handshake states and outcomes

use crate::error::{HostError, Result};
use std::fmt;

/// Where a handshake currently stands
///
/// States only move forward:
/// `AwaitingConnect -> AwaitingAuthToken -> AwaitingAuthResult -> Authenticated`,
/// and any of the waiting states may end in `Failed`.
#[derive(Debug)]
pub enum SessionState {
    AwaitingConnect,
    AwaitingAuthToken,
    AwaitingAuthResult,
    Authenticated(DeviceBanner),
    Failed(HostError),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Authenticated(_) | SessionState::Failed(_)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::AwaitingConnect => write!(f, "AwaitingConnect"),
            SessionState::AwaitingAuthToken => write!(f, "AwaitingAuthToken"),
            SessionState::AwaitingAuthResult => write!(f, "AwaitingAuthResult"),
            SessionState::Authenticated(_) => write!(f, "Authenticated"),
            SessionState::Failed(err) => write!(f, "Failed({})", err),
        }
    }
}

/// Final result of one handshake
#[derive(Debug)]
pub enum SessionOutcome {
    Authenticated(DeviceBanner),
    Failed(HostError),
}

impl SessionOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionOutcome::Authenticated(_))
    }

    pub fn error(&self) -> Option<&HostError> {
        match self {
            SessionOutcome::Failed(err) => Some(err),
            SessionOutcome::Authenticated(_) => None,
        }
    }

    pub fn into_result(self) -> Result<DeviceBanner> {
        match self {
            SessionOutcome::Authenticated(banner) => Ok(banner),
            SessionOutcome::Failed(err) => Err(err),
        }
    }
}

/// Identity string a device sends with its `CNXN`
///
/// Shaped like `device::ro.product.name=foo;ro.product.model=bar;features=...`:
/// a connection state, `::`, then `;`-separated `key=value` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceBanner {
    pub raw: String,
    pub state: String,
    pub properties: Vec<(String, String)>,
}

impl DeviceBanner {
    pub fn parse(payload: &[u8]) -> Self {
        let text = String::from_utf8_lossy(payload);
        let raw = text.trim_end_matches('\0').to_string();

        let (state, rest) = raw.split_once("::").unwrap_or((raw.as_str(), ""));
        let properties = rest
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        Self {
            state: state.to_string(),
            properties,
            raw,
        }
    }

    /// Value of the first property named `key`
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn product_name(&self) -> Option<&str> {
        self.property("ro.product.name")
    }

    pub fn model(&self) -> Option<&str> {
        self.property("ro.product.model")
    }
}

impl fmt::Display for DeviceBanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
