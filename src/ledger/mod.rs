// Ledger - reference persistence for the lifecycle engine
//
// The engine decides; the ledger stores. Every write carries the version the
// caller read, so two requests racing from the same snapshot cannot both be
// accepted.

pub mod state;
pub mod memory;
pub mod file;
pub mod service;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::lifecycle::{
    HistoryViolation, LifecycleError, Package, PackageHistory, PackageStatusLog, Shipment,
    TrackingNumber,
};
use crate::tracking::ShipmentLocation;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use service::{LifecycleService, ShipmentCommit};
pub use state::LedgerState;

/// Errors that can occur while reading or writing the ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Version conflict on {id}: expected {expected}, found {found}")]
    VersionConflict { id: String, expected: u64, found: u64 },

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("History violation: {0}")]
    History(#[from] HistoryViolation),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A stored value together with the version it was read at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

/// Log entry to append, with the package version it was decided against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub entry: PackageStatusLog,
    pub expected_version: u64,
}

/// Storage operations the service needs
#[async_trait]
pub trait LifecycleStore: Send + Sync {
    async fn insert_package(&self, package: Package) -> Result<Versioned<Package>, LedgerError>;

    async fn load_package(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Versioned<Package>, LedgerError>;

    /// Append one entry if the package is still at `expected_version`
    async fn append_status(
        &self,
        entry: PackageStatusLog,
        expected_version: u64,
    ) -> Result<Versioned<Package>, LedgerError>;

    async fn package_history(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<PackageHistory, LedgerError>;

    async fn insert_shipment(&self, shipment: Shipment) -> Result<Versioned<Shipment>, LedgerError>;

    async fn load_shipment(&self, id: Uuid) -> Result<Versioned<Shipment>, LedgerError>;

    /// Store the shipment and append every close-out entry, all or nothing
    async fn commit_shipment(
        &self,
        shipment: Shipment,
        expected_version: u64,
        entries: Vec<PendingEntry>,
    ) -> Result<Versioned<Shipment>, LedgerError>;

    /// Mark a package archived if it is still at `expected_version`
    async fn archive_package(
        &self,
        tracking_number: &TrackingNumber,
        expected_version: u64,
    ) -> Result<Versioned<Package>, LedgerError>;

    async fn archive_shipment(
        &self,
        id: Uuid,
        expected_version: u64,
    ) -> Result<Versioned<Shipment>, LedgerError>;

    async fn record_location(&self, location: ShipmentLocation) -> Result<(), LedgerError>;

    async fn locations(&self, shipment_id: Uuid) -> Result<Vec<ShipmentLocation>, LedgerError>;
}

#[async_trait]
impl<S: LifecycleStore + ?Sized> LifecycleStore for std::sync::Arc<S> {
    async fn insert_package(&self, package: Package) -> Result<Versioned<Package>, LedgerError> {
        (**self).insert_package(package).await
    }

    async fn load_package(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Versioned<Package>, LedgerError> {
        (**self).load_package(tracking_number).await
    }

    async fn append_status(
        &self,
        entry: PackageStatusLog,
        expected_version: u64,
    ) -> Result<Versioned<Package>, LedgerError> {
        (**self).append_status(entry, expected_version).await
    }

    async fn package_history(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<PackageHistory, LedgerError> {
        (**self).package_history(tracking_number).await
    }

    async fn insert_shipment(&self, shipment: Shipment) -> Result<Versioned<Shipment>, LedgerError> {
        (**self).insert_shipment(shipment).await
    }

    async fn load_shipment(&self, id: Uuid) -> Result<Versioned<Shipment>, LedgerError> {
        (**self).load_shipment(id).await
    }

    async fn commit_shipment(
        &self,
        shipment: Shipment,
        expected_version: u64,
        entries: Vec<PendingEntry>,
    ) -> Result<Versioned<Shipment>, LedgerError> {
        (**self).commit_shipment(shipment, expected_version, entries).await
    }

    async fn archive_package(
        &self,
        tracking_number: &TrackingNumber,
        expected_version: u64,
    ) -> Result<Versioned<Package>, LedgerError> {
        (**self).archive_package(tracking_number, expected_version).await
    }

    async fn archive_shipment(
        &self,
        id: Uuid,
        expected_version: u64,
    ) -> Result<Versioned<Shipment>, LedgerError> {
        (**self).archive_shipment(id, expected_version).await
    }

    async fn record_location(&self, location: ShipmentLocation) -> Result<(), LedgerError> {
        (**self).record_location(location).await
    }

    async fn locations(&self, shipment_id: Uuid) -> Result<Vec<ShipmentLocation>, LedgerError> {
        (**self).locations(shipment_id).await
    }
}
