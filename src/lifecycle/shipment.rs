// Shipment transitions gated by the status of member packages
//
// One guard serves every shipment kind; the threshold it checks comes from
// `ShipmentKind::requirements`.

use std::collections::HashMap;

use super::errors::{BlockingPackage, LifecycleError};
use super::types::{
    PackageAdvance, PackageStatus, Shipment, ShipmentStatus, ShipmentStatusUpdate, TrackingNumber,
};

/// Current status of each member package, keyed by tracking number
pub type MemberStatuses = HashMap<TrackingNumber, PackageStatus>;

/// Package threshold that must hold before `shipment` may move to `target`
pub fn required_member_status(
    shipment: &Shipment,
    target: ShipmentStatus,
) -> Result<PackageStatus, LifecycleError> {
    if shipment.status.is_terminal() {
        return Err(LifecycleError::terminal(shipment.status));
    }
    let requirements = shipment.kind.requirements();
    match (shipment.status, target) {
        (ShipmentStatus::Preparing, ShipmentStatus::InTransit) => Ok(requirements.loaded),
        (ShipmentStatus::InTransit, target) if target == requirements.terminal => {
            Ok(requirements.arrived)
        }
        (from, to) => Err(LifecycleError::invalid(from, to)),
    }
}

/// Members below `required`, in binding order. Missing snapshots block.
pub fn blocking_packages(
    shipment: &Shipment,
    members: &MemberStatuses,
    required: PackageStatus,
) -> Vec<BlockingPackage> {
    shipment
        .package_ids
        .iter()
        .filter_map(|id| match members.get(id) {
            Some(status) if status.is_at_or_past(required) => None,
            other => Some(BlockingPackage {
                tracking_number: id.clone(),
                status: other.copied(),
            }),
        })
        .collect()
}

pub fn can_transition_shipment(
    shipment: &Shipment,
    members: &MemberStatuses,
    target: ShipmentStatus,
) -> bool {
    apply_shipment_transition(shipment, members, target).is_ok()
}

/// Decide a shipment transition. On completion the update carries one
/// advance per non-terminal member still below the kind's close-out status.
pub fn apply_shipment_transition(
    shipment: &Shipment,
    members: &MemberStatuses,
    target: ShipmentStatus,
) -> Result<ShipmentStatusUpdate, LifecycleError> {
    if shipment.is_archived {
        return Err(LifecycleError::Archived {
            id: shipment.id.to_string(),
        });
    }

    let required = required_member_status(shipment, target)?;
    let blocking = blocking_packages(shipment, members, required);
    if !blocking.is_empty() {
        return Err(LifecycleError::GuardNotSatisfied {
            target,
            required,
            blocking,
        });
    }

    let package_advances = match shipment.kind.requirements().completion_advance {
        Some(close_out) if target.is_terminal() => shipment
            .package_ids
            .iter()
            .filter_map(|id| {
                let from = *members.get(id)?;
                if from.is_terminal() || from.is_at_or_past(close_out) {
                    return None;
                }
                Some(PackageAdvance {
                    tracking_number: id.clone(),
                    from,
                    to: close_out,
                })
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok(ShipmentStatusUpdate {
        shipment_id: shipment.id,
        from: shipment.status,
        to: target,
        package_advances,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::types::ShipmentKind;
    use chrono::Utc;
    use PackageStatus::*;

    fn shipment(kind: ShipmentKind, status: ShipmentStatus, ids: &[&str]) -> Shipment {
        let mut shipment = Shipment::new(kind, Utc::now()).with_packages(ids.iter().copied());
        shipment.status = status;
        shipment
    }

    fn members(entries: &[(&str, PackageStatus)]) -> MemberStatuses {
        entries
            .iter()
            .map(|(id, status)| (TrackingNumber::from(*id), *status))
            .collect()
    }

    #[test]
    fn test_forwarder_shipment_blocked_by_package_still_in_warehouse() {
        let shipment = shipment(
            ShipmentKind::ForwarderTransfer,
            ShipmentStatus::Preparing,
            &["PKG-1", "PKG-2"],
        );
        let members = members(&[("PKG-1", InWarehouse), ("PKG-2", TransferringForwarder)]);

        let err = apply_shipment_transition(&shipment, &members, ShipmentStatus::InTransit)
            .unwrap_err();
        match err {
            LifecycleError::GuardNotSatisfied {
                required, blocking, ..
            } => {
                assert_eq!(required, TransferringForwarder);
                assert_eq!(blocking.len(), 1);
                assert_eq!(blocking[0].tracking_number.as_str(), "PKG-1");
                assert_eq!(blocking[0].status, Some(InWarehouse));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!can_transition_shipment(&shipment, &members, ShipmentStatus::InTransit));
    }

    #[test]
    fn test_forwarder_shipment_departs_when_all_loaded() {
        let shipment = shipment(
            ShipmentKind::ForwarderTransfer,
            ShipmentStatus::Preparing,
            &["PKG-1", "PKG-2"],
        );
        let members = members(&[
            ("PKG-1", TransferringForwarder),
            ("PKG-2", TransferringForwarder),
        ]);

        let update =
            apply_shipment_transition(&shipment, &members, ShipmentStatus::InTransit).unwrap();
        assert_eq!(update.from, ShipmentStatus::Preparing);
        assert_eq!(update.to, ShipmentStatus::InTransit);
        assert!(update.package_advances.is_empty());
    }

    #[test]
    fn test_missing_snapshot_fails_closed() {
        let shipment = shipment(
            ShipmentKind::Delivery,
            ShipmentStatus::Preparing,
            &["PKG-1", "PKG-2"],
        );
        let members = members(&[("PKG-1", OutForDelivery)]);

        let blocking = blocking_packages(&shipment, &members, OutForDelivery);
        assert_eq!(blocking.len(), 1);
        assert_eq!(blocking[0].status, None);
        assert!(!can_transition_shipment(&shipment, &members, ShipmentStatus::InTransit));
    }

    #[test]
    fn test_delivery_completion_closes_out_members() {
        let shipment = shipment(
            ShipmentKind::Delivery,
            ShipmentStatus::InTransit,
            &["PKG-1", "PKG-2"],
        );
        let members = members(&[("PKG-1", Delivering), ("PKG-2", Delivered)]);

        let update =
            apply_shipment_transition(&shipment, &members, ShipmentStatus::Completed).unwrap();
        assert_eq!(
            update.package_advances,
            vec![PackageAdvance {
                tracking_number: TrackingNumber::from("PKG-1"),
                from: Delivering,
                to: Delivered,
            }]
        );
    }

    #[test]
    fn test_failed_delivery_blocks_completion() {
        let shipment = shipment(
            ShipmentKind::Delivery,
            ShipmentStatus::InTransit,
            &["PKG-1", "PKG-2"],
        );
        let members = members(&[("PKG-1", Delivering), ("PKG-2", InWarehouse)]);

        assert!(matches!(
            apply_shipment_transition(&shipment, &members, ShipmentStatus::Completed),
            Err(LifecycleError::GuardNotSatisfied { .. })
        ));
    }

    #[test]
    fn test_incoming_shipment_ends_in_arrived() {
        let shipment = shipment(ShipmentKind::Incoming, ShipmentStatus::InTransit, &["PKG-1"]);
        let members = members(&[("PKG-1", ShippedByAgent)]);

        assert_eq!(
            apply_shipment_transition(&shipment, &members, ShipmentStatus::Completed),
            Err(LifecycleError::invalid(
                ShipmentStatus::InTransit,
                ShipmentStatus::Completed
            ))
        );
        let update =
            apply_shipment_transition(&shipment, &members, ShipmentStatus::Arrived).unwrap();
        assert_eq!(update.package_advances[0].to, ArrivedInPh);
    }

    #[test]
    fn test_terminal_shipments_reject_everything() {
        for status in [ShipmentStatus::Completed, ShipmentStatus::Arrived] {
            let shipment = shipment(ShipmentKind::Delivery, status, &[]);
            for target in ShipmentStatus::ALL {
                assert_eq!(
                    apply_shipment_transition(&shipment, &MemberStatuses::new(), target),
                    Err(LifecycleError::terminal(status))
                );
            }
        }
    }

    #[test]
    fn test_no_skipping_and_no_going_back() {
        let preparing = shipment(ShipmentKind::WarehouseTransfer, ShipmentStatus::Preparing, &[]);
        assert!(!can_transition_shipment(
            &preparing,
            &MemberStatuses::new(),
            ShipmentStatus::Completed
        ));

        let in_transit = shipment(ShipmentKind::WarehouseTransfer, ShipmentStatus::InTransit, &[]);
        assert!(!can_transition_shipment(
            &in_transit,
            &MemberStatuses::new(),
            ShipmentStatus::Preparing
        ));
    }

    #[test]
    fn test_archived_shipment_is_rejected() {
        let mut shipment = shipment(ShipmentKind::Delivery, ShipmentStatus::Preparing, &[]);
        shipment.is_archived = true;
        assert!(matches!(
            apply_shipment_transition(&shipment, &MemberStatuses::new(), ShipmentStatus::InTransit),
            Err(LifecycleError::Archived { .. })
        ));
    }
}
