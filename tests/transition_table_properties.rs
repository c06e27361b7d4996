// Property-Based Testing for the package transition table
// Every pair of statuses is checked against the adjacency + failed-attempt rule

use chrono::{TimeZone, Utc};
use freightline::lifecycle::{
    can_transition_package, check_package_transition, Actor, FixedClock, LifecycleEngine,
    LifecycleError, Package, PackageHistory, PackageStatus, Role, ShippingMode, ShippingType,
};
use proptest::prelude::*;

fn status_strategy() -> impl Strategy<Value = PackageStatus> {
    prop::sample::select(PackageStatus::ALL.to_vec())
}

fn engine() -> LifecycleEngine<FixedClock> {
    LifecycleEngine::with_clock(FixedClock(
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
    ))
}

proptest! {
    #[test]
    fn test_only_successor_and_retry_edges_are_legal(
        from in status_strategy(),
        to in status_strategy(),
    ) {
        let successor = to.rank() == from.rank() + 1;
        let retry = matches!(
            (from, to),
            (PackageStatus::OutForDelivery, PackageStatus::InWarehouse)
                | (PackageStatus::Delivering, PackageStatus::InWarehouse)
        );
        let expected = !from.is_terminal() && (successor || retry);

        prop_assert_eq!(can_transition_package(from, to), expected);
        prop_assert_eq!(check_package_transition(from, to).is_ok(), expected);
    }

    #[test]
    fn test_engine_walks_always_verify(choices in prop::collection::vec(any::<bool>(), 0..40)) {
        // A fixed clock forces every timestamp through the strictly-increasing bump
        let engine = engine();
        let admin = Actor::new("admin-1", Role::Admin);
        let mut package = Package::new("PH-0001", ShippingType::Standard, ShippingMode::Sea);
        let mut history = PackageHistory::new("PH-0001");

        for take_retry in choices {
            if package.status.is_terminal() {
                break;
            }
            let target = match (take_retry, package.status.retry_target()) {
                (true, Some(retry)) => retry,
                _ => match package.status.successor() {
                    Some(next) => next,
                    None => break,
                },
            };
            let entry = engine.apply_package_transition(&package, target, &admin).unwrap();
            prop_assert_eq!(entry.status, target);
            if let Some(previous) = package.last_logged_at {
                prop_assert!(entry.created_at > previous);
            }
            history.append(entry.clone()).unwrap();
            package.record(&entry);
        }

        prop_assert!(history.verify().is_ok());
        prop_assert_eq!(history.current_status(), package.status);
    }
}

#[test]
fn test_delivered_rejects_everything() {
    for target in PackageStatus::ALL {
        assert_eq!(
            check_package_transition(PackageStatus::Delivered, target),
            Err(LifecycleError::TerminalStateViolation {
                status: PackageStatus::Delivered.into(),
            })
        );
    }
}

#[test]
fn test_warehouse_cannot_skip_to_delivered() {
    assert!(matches!(
        check_package_transition(PackageStatus::InWarehouse, PackageStatus::Delivered),
        Err(LifecycleError::InvalidTransition { .. })
    ));
}

#[test]
fn test_failed_delivery_returns_to_warehouse() {
    assert!(can_transition_package(
        PackageStatus::OutForDelivery,
        PackageStatus::InWarehouse
    ));
    assert!(can_transition_package(
        PackageStatus::Delivering,
        PackageStatus::InWarehouse
    ));
    assert!(!can_transition_package(
        PackageStatus::Sorting,
        PackageStatus::InWarehouse
    ));
}
