// Package transition table
//
// Forward edges go to the immediate successor only. The only backward edges
// are failed delivery attempts returning to IN_WAREHOUSE.

use super::errors::LifecycleError;
use super::types::PackageStatus;

impl PackageStatus {
    /// Every status reachable from this one in a single step
    pub fn allowed_targets(self) -> Vec<PackageStatus> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.successor()
            .into_iter()
            .chain(self.retry_target())
            .collect()
    }

    pub fn can_transition_to(self, target: PackageStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.successor() == Some(target) || self.retry_target() == Some(target)
    }

    /// True for the failed-attempt edges
    pub fn is_retry_edge(self, target: PackageStatus) -> bool {
        self.retry_target() == Some(target)
    }
}

pub fn can_transition_package(current: PackageStatus, target: PackageStatus) -> bool {
    current.can_transition_to(target)
}

/// Same decision as `can_transition_package`, with the reason on rejection
pub fn check_package_transition(
    current: PackageStatus,
    target: PackageStatus,
) -> Result<(), LifecycleError> {
    if current.is_terminal() {
        return Err(LifecycleError::terminal(current));
    }
    if !current.can_transition_to(target) {
        return Err(LifecycleError::invalid(current, target));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use PackageStatus::*;

    #[test]
    fn test_happy_path_is_accepted_step_by_step() {
        for pair in PackageStatus::ALL.windows(2) {
            assert!(
                can_transition_package(pair[0], pair[1]),
                "{} -> {} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_skipping_a_step_is_rejected() {
        assert!(!can_transition_package(InWarehouse, Delivered));
        assert_eq!(
            check_package_transition(InWarehouse, Delivered),
            Err(LifecycleError::invalid(InWarehouse, Delivered))
        );
        assert!(!can_transition_package(Pending, ShippedByAgent));
    }

    #[test]
    fn test_failed_attempts_return_to_warehouse() {
        assert!(can_transition_package(OutForDelivery, InWarehouse));
        assert!(can_transition_package(Delivering, InWarehouse));
        assert!(OutForDelivery.is_retry_edge(InWarehouse));
        assert!(!can_transition_package(Sorting, InWarehouse));
        assert!(!can_transition_package(TransferringForwarder, InWarehouse));
    }

    #[test]
    fn test_delivered_is_terminal() {
        assert!(Delivered.allowed_targets().is_empty());
        for target in PackageStatus::ALL {
            assert!(!can_transition_package(Delivered, target));
            assert_eq!(
                check_package_transition(Delivered, target),
                Err(LifecycleError::terminal(Delivered))
            );
        }
    }

    #[test]
    fn test_self_transition_is_rejected() {
        for status in PackageStatus::ALL {
            assert!(!can_transition_package(status, status));
        }
    }

    #[test]
    fn test_allowed_targets() {
        assert_eq!(Pending.allowed_targets(), vec![PreparedByAgent]);
        assert_eq!(Delivering.allowed_targets(), vec![Delivered, InWarehouse]);
    }
}
