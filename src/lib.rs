// Freightline Library - package and shipment lifecycle
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod ledger;
pub mod lifecycle;
pub mod scanning;
pub mod telemetry;
pub mod tracking;

// Re-export key types for easy access
pub use config::{config, FreightlineConfig};
pub use ledger::{
    JsonFileStore, LedgerError, LedgerState, LifecycleService, LifecycleStore, MemoryStore,
    ShipmentCommit, Versioned,
};
pub use lifecycle::{
    can_transition_package, can_transition_shipment, Actor, Clock, FixedClock, LifecycleEngine,
    LifecycleError, Package, PackageHistory, PackageStatus, PackageStatusLog, Role, Shipment,
    ShipmentKind, ShipmentStatus, SystemClock, TrackingNumber,
};
pub use scanning::{ScanOutcome, ScanRejection, ScanRejectionReason, ScanSession};
pub use telemetry::{
    create_lifecycle_span, generate_correlation_id, init_telemetry, shutdown_telemetry,
};
pub use tracking::{estimate_eta, GeoPoint, LocationTrail, ShipmentLocation, TrackingView};
