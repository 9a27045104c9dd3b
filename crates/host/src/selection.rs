//! Choosing which compliant device to talk to

use crate::error::{HostError, Result};
use crate::usb::filter::{CompliantDevice, FilterReport};

/// Picks one device out of the filter's candidates
pub trait SelectionPolicy<D> {
    /// Position in `candidates` of the chosen device, if any
    fn select(&self, candidates: &[CompliantDevice<D>]) -> Option<usize>;
}

/// The first compliant device in enumeration order
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCompliant;

impl<D> SelectionPolicy<D> for FirstCompliant {
    fn select(&self, candidates: &[CompliantDevice<D>]) -> Option<usize> {
        if candidates.is_empty() { None } else { Some(0) }
    }
}

/// The compliant device at a given enumeration index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByIndex(pub usize);

impl<D> SelectionPolicy<D> for ByIndex {
    fn select(&self, candidates: &[CompliantDevice<D>]) -> Option<usize> {
        candidates
            .iter()
            .position(|candidate| candidate.index == self.0)
    }
}

/// Pick the device to authenticate with
///
/// With `requested` set, only the device at that enumeration index will do,
/// and a miss reports why that device was not usable. Otherwise the first
/// compliant device is taken.
pub fn select_device<D>(
    report: &FilterReport<D>,
    requested: Option<usize>,
) -> Result<&CompliantDevice<D>> {
    let position = match requested {
        Some(index) => ByIndex(index)
            .select(&report.candidates)
            .ok_or_else(|| report.rejection_for(index))?,
        None => FirstCompliant
            .select(&report.candidates)
            .ok_or(HostError::NoCompliantDevice)?,
    };
    Ok(&report.candidates[position])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usb::classifier::{AdbEndpoints, AdbInterface};
    use crate::usb::filter::{ProbeEntry, ProbeStatus, SkipReason};
    use crate::usb::transfers::TransferError;

    fn candidate(index: usize) -> CompliantDevice<()> {
        CompliantDevice {
            index,
            device: (),
            interface: AdbInterface {
                number: 1,
                setting: 0,
                endpoints: AdbEndpoints {
                    in_endpoint: 0x81,
                    out_endpoint: 0x01,
                },
            },
            product: None,
        }
    }

    #[test]
    fn test_first_compliant() {
        assert_eq!(SelectionPolicy::<()>::select(&FirstCompliant, &[]), None);
        assert_eq!(FirstCompliant.select(&[candidate(3), candidate(5)]), Some(0));
    }

    #[test]
    fn test_by_index_uses_enumeration_index() {
        let candidates = [candidate(1), candidate(4), candidate(6)];
        assert_eq!(ByIndex(4).select(&candidates), Some(1));
        assert_eq!(ByIndex(6).select(&candidates), Some(2));
        assert_eq!(ByIndex(0).select(&candidates), None);
    }

    fn entry(index: usize, status: ProbeStatus) -> ProbeEntry {
        ProbeEntry {
            index,
            product: None,
            product_error: None,
            status,
        }
    }

    #[test]
    fn test_select_device_prefers_requested_index() {
        let report = FilterReport {
            entries: vec![
                entry(0, ProbeStatus::NotCompliant),
                entry(1, ProbeStatus::Compliant(candidate(1).interface)),
                entry(2, ProbeStatus::Compliant(candidate(2).interface)),
            ],
            candidates: vec![candidate(1), candidate(2)],
        };

        assert_eq!(select_device(&report, None).unwrap().index, 1);
        assert_eq!(select_device(&report, Some(2)).unwrap().index, 2);
        assert!(matches!(
            select_device(&report, Some(0)),
            Err(HostError::NotCompliant(0))
        ));
    }

    #[test]
    fn test_select_device_explains_requested_index_without_candidates() {
        let report: FilterReport<()> = FilterReport {
            entries: vec![
                entry(0, ProbeStatus::NotCompliant),
                entry(
                    1,
                    ProbeStatus::Skipped(SkipReason::Open(TransferError::PermissionDenied)),
                ),
            ],
            candidates: Vec::new(),
        };

        assert!(matches!(
            select_device(&report, Some(1)),
            Err(HostError::OpenFailure(TransferError::PermissionDenied))
        ));
        assert!(matches!(
            select_device(&report, None),
            Err(HostError::NoCompliantDevice)
        ));
    }
}
