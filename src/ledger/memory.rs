// In-memory ledger

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LedgerError, LedgerState, LifecycleStore, PendingEntry, Versioned};
use crate::lifecycle::{Package, PackageHistory, PackageStatusLog, Shipment, TrackingNumber};
use crate::tracking::ShipmentLocation;

/// Ledger held behind one async lock. Writers are serialised by the lock
/// and checked against the version they read.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<LedgerState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LifecycleStore for MemoryStore {
    async fn insert_package(&self, package: Package) -> Result<Versioned<Package>, LedgerError> {
        self.state.write().await.insert_package(package)
    }

    async fn load_package(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Versioned<Package>, LedgerError> {
        self.state.read().await.load_package(tracking_number)
    }

    async fn append_status(
        &self,
        entry: PackageStatusLog,
        expected_version: u64,
    ) -> Result<Versioned<Package>, LedgerError> {
        self.state.write().await.append_status(entry, expected_version)
    }

    async fn package_history(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<PackageHistory, LedgerError> {
        let state = self.state.read().await;
        Ok(state.package_record(tracking_number)?.history.clone())
    }

    async fn insert_shipment(&self, shipment: Shipment) -> Result<Versioned<Shipment>, LedgerError> {
        self.state.write().await.insert_shipment(shipment)
    }

    async fn load_shipment(&self, id: Uuid) -> Result<Versioned<Shipment>, LedgerError> {
        self.state.read().await.load_shipment(id)
    }

    async fn commit_shipment(
        &self,
        shipment: Shipment,
        expected_version: u64,
        entries: Vec<PendingEntry>,
    ) -> Result<Versioned<Shipment>, LedgerError> {
        self.state
            .write()
            .await
            .commit_shipment(shipment, expected_version, entries)
    }

    async fn archive_package(
        &self,
        tracking_number: &TrackingNumber,
        expected_version: u64,
    ) -> Result<Versioned<Package>, LedgerError> {
        self.state
            .write()
            .await
            .archive_package(tracking_number, expected_version)
    }

    async fn archive_shipment(
        &self,
        id: Uuid,
        expected_version: u64,
    ) -> Result<Versioned<Shipment>, LedgerError> {
        self.state.write().await.archive_shipment(id, expected_version)
    }

    async fn record_location(&self, location: ShipmentLocation) -> Result<(), LedgerError> {
        self.state.write().await.record_location(location)
    }

    async fn locations(&self, shipment_id: Uuid) -> Result<Vec<ShipmentLocation>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.shipment_record(shipment_id)?.locations.clone())
    }
}
