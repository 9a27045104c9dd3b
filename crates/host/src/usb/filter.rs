//! ADB device filter
//!
//! Probes every enumerated device for an ADB interface. Each device is
//! opened, its active configuration is classified, and the handle is
//! dropped before the next device is touched. A device that cannot be
//! opened or described is recorded as skipped and the scan goes on.

use crate::error::HostError;
use crate::usb::classifier::{AdbInterface, InterfaceInfo, Rejection, find_adb_interface};
use crate::usb::transfers::TransferError;
use std::fmt;
use tracing::{debug, info, warn};

/// A device the filter can open and inspect
pub trait ProbeTarget {
    /// Open handle, released when dropped
    type Handle;

    /// Open the device
    fn open(&self) -> Result<Self::Handle, TransferError>;

    /// Interface descriptors of the active configuration
    fn interfaces(&self, handle: &Self::Handle) -> Result<Vec<InterfaceInfo>, TransferError>;

    /// Human readable product name, if the device reports one
    fn product(&self, _handle: &Self::Handle) -> Result<Option<String>, TransferError> {
        Ok(None)
    }
}

/// Why a device was left out of the scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Open(TransferError),
    Descriptor(TransferError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Open(err) => write!(f, "Error opening device ({})", err),
            SkipReason::Descriptor(err) => write!(f, "Error reading descriptor ({})", err),
        }
    }
}

/// Outcome of probing one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    Compliant(AdbInterface),
    NotCompliant,
    /// Advertises ADB but its endpoints are unusable
    Malformed(Rejection),
    Skipped(SkipReason),
}

impl ProbeStatus {
    pub fn is_compliant(&self) -> bool {
        matches!(self, ProbeStatus::Compliant(_))
    }
}

/// One line of the scan, in enumeration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeEntry {
    pub index: usize,
    pub product: Option<String>,
    /// Set when the product string could not be read
    pub product_error: Option<TransferError>,
    pub status: ProbeStatus,
}

impl ProbeEntry {
    /// Product column of the device listing
    pub fn product_label(&self) -> String {
        match (&self.product, self.product_error) {
            (_, Some(err)) => format!("Error reading descriptor ({})", err),
            (Some(product), None) => product.clone(),
            (None, None) => "(no product string)".to_string(),
        }
    }
}

/// A device exposing an ADB interface
#[derive(Debug, Clone)]
pub struct CompliantDevice<D> {
    /// Position in the enumeration
    pub index: usize,
    pub device: D,
    pub interface: AdbInterface,
    pub product: Option<String>,
}

/// Result of a full scan
#[derive(Debug)]
pub struct FilterReport<D> {
    /// Every device, in enumeration order
    pub entries: Vec<ProbeEntry>,
    /// ADB-compliant devices, in enumeration order
    pub candidates: Vec<CompliantDevice<D>>,
}

impl<D> FilterReport<D> {
    /// True when no ADB-compliant device was found
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of devices looked at
    pub fn probed(&self) -> usize {
        self.entries.len()
    }

    /// Devices that could not be probed
    pub fn skipped(&self) -> impl Iterator<Item = &ProbeEntry> {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.status, ProbeStatus::Skipped(_)))
    }

    /// Why the device at enumeration `index` is not among the candidates
    pub fn rejection_for(&self, index: usize) -> HostError {
        match self.entries.get(index).map(|entry| &entry.status) {
            Some(ProbeStatus::Skipped(SkipReason::Open(kind))) => HostError::OpenFailure(*kind),
            Some(ProbeStatus::Skipped(SkipReason::Descriptor(kind))) => {
                HostError::DescriptorReadFailure(*kind)
            }
            Some(ProbeStatus::Malformed(rejection)) => {
                HostError::MalformedInterface(rejection.clone())
            }
            _ => HostError::NotCompliant(index),
        }
    }
}

type Probed = (
    Result<Option<String>, TransferError>,
    Result<Option<AdbInterface>, Rejection>,
);

/// Probe a single device; the handle does not outlive this call
///
/// A failed product string read is kept for the listing and does not stop
/// the interface scan.
fn probe<D: ProbeTarget>(device: &D) -> Result<Probed, SkipReason> {
    let handle = device.open().map_err(SkipReason::Open)?;
    let product = device.product(&handle);
    let interfaces = device
        .interfaces(&handle)
        .map_err(SkipReason::Descriptor)?;
    Ok((product, find_adb_interface(&interfaces)))
}

/// Scan `devices` and keep those exposing an ADB interface
pub fn filter_devices<D, I>(devices: I) -> FilterReport<D>
where
    D: ProbeTarget,
    I: IntoIterator<Item = D>,
{
    let mut entries = Vec::new();
    let mut candidates = Vec::new();

    for (index, device) in devices.into_iter().enumerate() {
        let (product, compliance) = match probe(&device) {
            Ok(probed) => probed,
            Err(reason) => {
                warn!("Skipping device {}: {}", index, reason);
                entries.push(ProbeEntry {
                    index,
                    product: None,
                    product_error: None,
                    status: ProbeStatus::Skipped(reason),
                });
                continue;
            }
        };

        let (product, product_error) = match product {
            Ok(product) => (product, None),
            Err(err) => {
                warn!("Error reading product string of device {}: {}", index, err);
                (None, Some(err))
            }
        };

        let status = match compliance {
            Ok(Some(interface)) => {
                debug!("Device {} is ADB-compliant on interface {}", index, interface.number);
                candidates.push(CompliantDevice {
                    index,
                    device,
                    interface,
                    product: product.clone(),
                });
                ProbeStatus::Compliant(interface)
            }
            Ok(None) => ProbeStatus::NotCompliant,
            Err(rejection) => ProbeStatus::Malformed(rejection),
        };

        entries.push(ProbeEntry {
            index,
            product,
            product_error,
            status,
        });
    }

    info!(
        "Probed {} device(s), {} ADB-compliant",
        entries.len(),
        candidates.len()
    );

    FilterReport {
        entries,
        candidates,
    }
}
