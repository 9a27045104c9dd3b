//! USB side of the host
//!
//! Classification of interface descriptors, the device filter, the claimed
//! device session and the transfer error mapping.

pub mod classifier;
pub mod device;
pub mod filter;
pub mod transfers;

pub use classifier::{AdbEndpoints, AdbInterface, InterfaceInfo, Rejection, find_adb_interface};
pub use device::AdbUsbDevice;
pub use filter::{
    CompliantDevice, FilterReport, ProbeEntry, ProbeStatus, ProbeTarget, SkipReason,
    filter_devices,
};
pub use transfers::{BulkTransport, TransferError, map_rusb_error};
