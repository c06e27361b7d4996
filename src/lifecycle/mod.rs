// Package/Shipment Lifecycle Module
//
// Closed status enums, one authoritative transition table, and a single
// parameterised shipment guard. Everything here is a pure function of the
// snapshot the caller supplies.

pub mod types;
pub mod errors;
pub mod package;
pub mod shipment;
pub mod engine;
pub mod history;

pub use types::{
    Actor, Package, PackageAdvance, PackageStatus, PackageStatusLog, ParseStatusError, Role,
    Shipment, ShipmentKind, ShipmentRequirements, ShipmentStatus, ShipmentStatusUpdate,
    ShippingMode, ShippingType, TrackingNumber,
};
pub use errors::{AnyStatus, BlockingPackage, LifecycleError};
pub use package::{can_transition_package, check_package_transition};
pub use shipment::{
    apply_shipment_transition, blocking_packages, can_transition_shipment,
    required_member_status, MemberStatuses,
};
pub use engine::{next_log_timestamp, Clock, FixedClock, LifecycleEngine, SystemClock};
pub use history::{HistoryViolation, PackageHistory};
