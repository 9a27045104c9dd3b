//! rusb-backed devices
//!
//! [`rusb::Device`] is probed through [`ProbeTarget`], and a selected device
//! is opened as an [`AdbUsbDevice`]: a handle with the ADB interface claimed,
//! exposing blocking bulk transfers with a fixed per-transfer timeout.

use crate::error::{HostError, Result};
use crate::usb::classifier::{AdbEndpoints, AdbInterface, InterfaceInfo};
use crate::usb::filter::ProbeTarget;
use crate::usb::transfers::{BulkTransport, TransferError, map_rusb_error};
use rusb::{Device, DeviceHandle, UsbContext};
use std::time::Duration;
use tracing::{debug, warn};

impl<T: UsbContext> ProbeTarget for Device<T> {
    type Handle = DeviceHandle<T>;

    fn open(&self) -> std::result::Result<DeviceHandle<T>, TransferError> {
        Device::open(self).map_err(|e| {
            debug!(
                "Failed to open device {:03}:{:03}: {}",
                self.bus_number(),
                self.address(),
                e
            );
            map_rusb_error(e)
        })
    }

    fn interfaces(
        &self,
        _handle: &DeviceHandle<T>,
    ) -> std::result::Result<Vec<InterfaceInfo>, TransferError> {
        let config = self.active_config_descriptor().map_err(map_rusb_error)?;
        Ok(InterfaceInfo::from_config(&config))
    }

    fn product(&self, handle: &DeviceHandle<T>) -> std::result::Result<Option<String>, TransferError> {
        let descriptor = self.device_descriptor().map_err(map_rusb_error)?;
        let Some(index) = descriptor.product_string_index() else {
            return Ok(None);
        };
        handle
            .read_string_descriptor_ascii(index)
            .map(Some)
            .map_err(map_rusb_error)
    }
}

/// An opened device with its ADB interface claimed
///
/// Dropping the value releases the interface and hands it back to the
/// kernel driver if one was detached on open.
pub struct AdbUsbDevice<T: UsbContext> {
    handle: DeviceHandle<T>,
    interface: AdbInterface,
    timeout: Duration,
    kernel_driver_detached: bool,
}

impl<T: UsbContext> AdbUsbDevice<T> {
    /// Open `device` and claim `interface`
    ///
    /// A zero `timeout` waits forever on every transfer.
    pub fn open(device: &Device<T>, interface: AdbInterface, timeout: Duration) -> Result<Self> {
        let handle = Device::open(device).map_err(|e| HostError::OpenFailure(map_rusb_error(e)))?;
        let number = interface.number;

        let kernel_driver_detached = match handle.kernel_driver_active(number) {
            Ok(true) => {
                debug!("Detaching kernel driver from interface {}", number);
                match handle.detach_kernel_driver(number) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(
                            "Failed to detach kernel driver from interface {}: {}",
                            number, e
                        );
                        false
                    }
                }
            }
            Ok(false) => false,
            Err(e) => {
                debug!(
                    "Could not check kernel driver status for interface {}: {}",
                    number, e
                );
                false
            }
        };

        if let Err(e) = handle.claim_interface(number) {
            warn!("Failed to claim interface {}: {}", number, e);
            if kernel_driver_detached {
                let _ = handle.attach_kernel_driver(number);
            }
            return Err(HostError::ClaimFailure {
                interface: number,
                source: map_rusb_error(e),
            });
        }

        let device = Self {
            handle,
            interface,
            timeout,
            kernel_driver_detached,
        };

        if interface.setting != 0 {
            device
                .handle
                .set_alternate_setting(number, interface.setting)
                .map_err(|e| HostError::ClaimFailure {
                    interface: number,
                    source: map_rusb_error(e),
                })?;
        }

        debug!(
            "Claimed interface {} (alt {}) on device {:03}:{:03}",
            number,
            interface.setting,
            device.bus_number(),
            device.address()
        );
        Ok(device)
    }

    pub fn endpoints(&self) -> AdbEndpoints {
        self.interface.endpoints
    }

    pub fn interface(&self) -> AdbInterface {
        self.interface
    }

    pub fn bus_number(&self) -> u8 {
        self.handle.device().bus_number()
    }

    pub fn address(&self) -> u8 {
        self.handle.device().address()
    }
}

impl<T: UsbContext> BulkTransport for AdbUsbDevice<T> {
    fn write_bulk(&mut self, endpoint: u8, data: &[u8]) -> std::result::Result<usize, TransferError> {
        self.handle
            .write_bulk(endpoint, data, self.timeout)
            .map_err(map_rusb_error)
    }

    fn read_bulk(
        &mut self,
        endpoint: u8,
        buf: &mut [u8],
    ) -> std::result::Result<usize, TransferError> {
        self.handle
            .read_bulk(endpoint, buf, self.timeout)
            .map_err(map_rusb_error)
    }
}

impl<T: UsbContext> Drop for AdbUsbDevice<T> {
    fn drop(&mut self) {
        let number = self.interface.number;
        if let Err(e) = self.handle.release_interface(number) {
            warn!("Failed to release interface {}: {}", number, e);
        }
        if self.kernel_driver_detached
            && let Err(e) = self.handle.attach_kernel_driver(number)
        {
            debug!(
                "Could not reattach kernel driver to interface {}: {}",
                number, e
            );
        }
        debug!("Released interface {}", number);
    }
}
