//! ADB interface classification
//!
//! Decides from descriptor data alone whether an interface speaks the ADB
//! USB transport, and which of its endpoints is IN and which is OUT. An ADB
//! interface is vendor specific (class 0xFF) with subclass 0x42, protocol
//! 0x01 and exactly two bulk endpoints of opposite direction.

use std::fmt;
use tracing::{debug, warn};

/// Vendor-specific interface class used by ADB
pub const ADB_CLASS: u8 = 0xFF;
/// ADB interface subclass
pub const ADB_SUBCLASS: u8 = 0x42;
/// ADB interface protocol
pub const ADB_PROTOCOL: u8 = 0x01;

/// Direction bit of an endpoint address
const ENDPOINT_DIR_IN: u8 = 0x80;

/// Endpoint transfer type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Control,
    Isochronous,
    Bulk,
    Interrupt,
}

impl From<rusb::TransferType> for TransferKind {
    fn from(transfer_type: rusb::TransferType) -> Self {
        match transfer_type {
            rusb::TransferType::Control => TransferKind::Control,
            rusb::TransferType::Isochronous => TransferKind::Isochronous,
            rusb::TransferType::Bulk => TransferKind::Bulk,
            rusb::TransferType::Interrupt => TransferKind::Interrupt,
        }
    }
}

/// One endpoint of an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointInfo {
    pub address: u8,
    pub transfer: TransferKind,
}

impl EndpointInfo {
    pub fn is_in(&self) -> bool {
        self.address & ENDPOINT_DIR_IN != 0
    }
}

/// Descriptor data of one interface alternate setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub number: u8,
    pub setting: u8,
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
    pub endpoints: Vec<EndpointInfo>,
}

impl InterfaceInfo {
    /// Copy the fields the classifier needs out of a rusb descriptor
    pub fn from_descriptor(descriptor: &rusb::InterfaceDescriptor<'_>) -> Self {
        Self {
            number: descriptor.interface_number(),
            setting: descriptor.setting_number(),
            class: descriptor.class_code(),
            subclass: descriptor.sub_class_code(),
            protocol: descriptor.protocol_code(),
            endpoints: descriptor
                .endpoint_descriptors()
                .map(|endpoint| EndpointInfo {
                    address: endpoint.address(),
                    transfer: endpoint.transfer_type().into(),
                })
                .collect(),
        }
    }

    /// All alternate settings of all interfaces in a configuration
    pub fn from_config(config: &rusb::ConfigDescriptor) -> Vec<Self> {
        config
            .interfaces()
            .flat_map(|interface| interface.descriptors())
            .map(|descriptor| Self::from_descriptor(&descriptor))
            .collect()
    }
}

/// The bulk endpoint pair of an ADB interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdbEndpoints {
    pub in_endpoint: u8,
    pub out_endpoint: u8,
}

/// An ADB interface located in a device's active configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdbInterface {
    pub number: u8,
    pub setting: u8,
    pub endpoints: AdbEndpoints,
}

/// Why an interface is not usable for ADB
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Class, subclass or protocol do not identify ADB
    NotAdbInterface { class: u8, subclass: u8, protocol: u8 },
    /// ADB identifiers but not exactly two endpoints
    EndpointCount(usize),
    /// An endpoint lacks the bulk transfer type
    NotBulk { address: u8 },
    /// Both or neither endpoint carry the IN direction bit
    MalformedDirection { both_in: bool },
}

impl Rejection {
    /// Interfaces that claim to be ADB but are built wrong
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Rejection::NotAdbInterface { .. })
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotAdbInterface {
                class,
                subclass,
                protocol,
            } => write!(
                f,
                "not an ADB interface ({:#04x}/{:#04x}/{:#04x})",
                class, subclass, protocol
            ),
            Rejection::EndpointCount(count) => {
                write!(f, "expected 2 endpoints, found {}", count)
            }
            Rejection::NotBulk { address } => {
                write!(f, "endpoint {:#04x} is not a bulk endpoint", address)
            }
            Rejection::MalformedDirection { both_in: true } => {
                write!(f, "both endpoints are IN endpoints")
            }
            Rejection::MalformedDirection { both_in: false } => {
                write!(f, "neither endpoint is an IN endpoint")
            }
        }
    }
}

/// Result of classifying one interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplianceResult {
    Compliant(AdbEndpoints),
    Rejected(Rejection),
}

impl ComplianceResult {
    pub fn is_compliant(&self) -> bool {
        matches!(self, ComplianceResult::Compliant(_))
    }
}

fn is_adb_interface(class: u8, subclass: u8, protocol: u8) -> bool {
    class == ADB_CLASS && subclass == ADB_SUBCLASS && protocol == ADB_PROTOCOL
}

/// Classify a single interface
pub fn classify(interface: &InterfaceInfo) -> ComplianceResult {
    if !is_adb_interface(interface.class, interface.subclass, interface.protocol) {
        return ComplianceResult::Rejected(Rejection::NotAdbInterface {
            class: interface.class,
            subclass: interface.subclass,
            protocol: interface.protocol,
        });
    }

    let [first, second] = interface.endpoints.as_slice() else {
        return ComplianceResult::Rejected(Rejection::EndpointCount(interface.endpoints.len()));
    };

    if let Some(endpoint) = [first, second]
        .into_iter()
        .find(|endpoint| endpoint.transfer != TransferKind::Bulk)
    {
        return ComplianceResult::Rejected(Rejection::NotBulk {
            address: endpoint.address,
        });
    }

    match (first.is_in(), second.is_in()) {
        (true, false) => ComplianceResult::Compliant(AdbEndpoints {
            in_endpoint: first.address,
            out_endpoint: second.address,
        }),
        (false, true) => ComplianceResult::Compliant(AdbEndpoints {
            in_endpoint: second.address,
            out_endpoint: first.address,
        }),
        (both_in, _) => ComplianceResult::Rejected(Rejection::MalformedDirection { both_in }),
    }
}

/// First ADB-compliant interface among `interfaces`
///
/// Returns `Ok(None)` when nothing looks like ADB, and the first
/// [`Rejection`] when the only ADB-looking interfaces are malformed.
pub fn find_adb_interface(
    interfaces: &[InterfaceInfo],
) -> Result<Option<AdbInterface>, Rejection> {
    let mut malformed = None;

    for interface in interfaces {
        match classify(interface) {
            ComplianceResult::Compliant(endpoints) => {
                debug!(
                    "Interface {} (alt {}) is ADB: in={:#04x} out={:#04x}",
                    interface.number,
                    interface.setting,
                    endpoints.in_endpoint,
                    endpoints.out_endpoint
                );
                return Ok(Some(AdbInterface {
                    number: interface.number,
                    setting: interface.setting,
                    endpoints,
                }));
            }
            ComplianceResult::Rejected(rejection) if rejection.is_malformed() => {
                warn!(
                    "Interface {} (alt {}) looks like ADB but is unusable: {}",
                    interface.number, interface.setting, rejection
                );
                malformed.get_or_insert(rejection);
            }
            ComplianceResult::Rejected(_) => {}
        }
    }

    match malformed {
        Some(rejection) => Err(rejection),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(address: u8) -> EndpointInfo {
        EndpointInfo {
            address,
            transfer: TransferKind::Bulk,
        }
    }

    fn adb_interface(endpoints: Vec<EndpointInfo>) -> InterfaceInfo {
        InterfaceInfo {
            number: 1,
            setting: 0,
            class: ADB_CLASS,
            subclass: ADB_SUBCLASS,
            protocol: ADB_PROTOCOL,
            endpoints,
        }
    }

    #[test]
    fn test_compliant_in_first() {
        let result = classify(&adb_interface(vec![bulk(0x81), bulk(0x01)]));
        assert_eq!(
            result,
            ComplianceResult::Compliant(AdbEndpoints {
                in_endpoint: 0x81,
                out_endpoint: 0x01
            })
        );
    }

    #[test]
    fn test_compliant_out_first() {
        let result = classify(&adb_interface(vec![bulk(0x02), bulk(0x83)]));
        assert_eq!(
            result,
            ComplianceResult::Compliant(AdbEndpoints {
                in_endpoint: 0x83,
                out_endpoint: 0x02
            })
        );
    }

    #[test]
    fn test_wrong_subclass_rejected() {
        let mut interface = adb_interface(vec![bulk(0x81), bulk(0x01)]);
        interface.subclass = 0x43;
        assert!(matches!(
            classify(&interface),
            ComplianceResult::Rejected(Rejection::NotAdbInterface { subclass: 0x43, .. })
        ));
    }

    #[test]
    fn test_wrong_class_rejected() {
        let mut interface = adb_interface(vec![bulk(0x81), bulk(0x01)]);
        interface.class = 0x08;
        assert_eq!(
            classify(&interface),
            ComplianceResult::Rejected(Rejection::NotAdbInterface {
                class: 0x08,
                subclass: ADB_SUBCLASS,
                protocol: ADB_PROTOCOL
            })
        );
    }

    #[test]
    fn test_wrong_protocol_rejected() {
        let mut interface = adb_interface(vec![bulk(0x81), bulk(0x01)]);
        interface.protocol = 0x03;
        assert_eq!(
            classify(&interface),
            ComplianceResult::Rejected(Rejection::NotAdbInterface {
                class: ADB_CLASS,
                subclass: ADB_SUBCLASS,
                protocol: 0x03
            })
        );
    }

    #[test]
    fn test_three_endpoints_rejected() {
        let interface = adb_interface(vec![bulk(0x81), bulk(0x01), bulk(0x82)]);
        assert_eq!(
            classify(&interface),
            ComplianceResult::Rejected(Rejection::EndpointCount(3))
        );
    }

    #[test]
    fn test_interrupt_endpoint_rejected() {
        let interrupt = EndpointInfo {
            address: 0x81,
            transfer: TransferKind::Interrupt,
        };
        assert_eq!(
            classify(&adb_interface(vec![interrupt, bulk(0x01)])),
            ComplianceResult::Rejected(Rejection::NotBulk { address: 0x81 })
        );
    }

    #[test]
    fn test_direction_errors() {
        assert_eq!(
            classify(&adb_interface(vec![bulk(0x81), bulk(0x82)])),
            ComplianceResult::Rejected(Rejection::MalformedDirection { both_in: true })
        );
        assert_eq!(
            classify(&adb_interface(vec![bulk(0x01), bulk(0x02)])),
            ComplianceResult::Rejected(Rejection::MalformedDirection { both_in: false })
        );
    }

    #[test]
    fn test_find_skips_non_adb_and_malformed() {
        let mass_storage = InterfaceInfo {
            number: 0,
            setting: 0,
            class: 0x08,
            subclass: 0x06,
            protocol: 0x50,
            endpoints: vec![bulk(0x81), bulk(0x02)],
        };
        let malformed = adb_interface(vec![bulk(0x01), bulk(0x02)]);
        let mut good = adb_interface(vec![bulk(0x84), bulk(0x03)]);
        good.number = 2;

        let found = find_adb_interface(&[mass_storage, malformed, good])
            .unwrap()
            .unwrap();
        assert_eq!(found.number, 2);
        assert_eq!(found.endpoints.in_endpoint, 0x84);
        assert_eq!(found.endpoints.out_endpoint, 0x03);
    }

    #[test]
    fn test_find_reports_malformed_when_nothing_usable() {
        let malformed = adb_interface(vec![bulk(0x81)]);
        assert_eq!(
            find_adb_interface(&[malformed]),
            Err(Rejection::EndpointCount(1))
        );
    }

    #[test]
    fn test_find_none() {
        assert_eq!(find_adb_interface(&[]), Ok(None));
    }

    #[test]
    fn test_rejection_display() {
        assert_eq!(
            Rejection::EndpointCount(1).to_string(),
            "expected 2 endpoints, found 1"
        );
        assert!(!Rejection::NotAdbInterface {
            class: 0,
            subclass: 0,
            protocol: 0
        }
        .is_malformed());
        assert!(Rejection::NotBulk { address: 1 }.is_malformed());
    }
}
