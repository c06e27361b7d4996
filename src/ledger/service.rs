// Lifecycle service - read, decide, persist
//
// Each operation reads a versioned snapshot, asks the engine for a decision
// and writes back against the version it read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use super::{LedgerError, LifecycleStore, PendingEntry, Versioned};
use crate::lifecycle::{
    Actor, Clock, LifecycleEngine, MemberStatuses, Package, PackageHistory, PackageStatus,
    PackageStatusLog, Shipment, ShipmentKind, ShipmentStatus, ShipmentStatusUpdate,
    SystemClock, TrackingNumber,
};
use crate::scanning::{ScanOutcome, ScanRejection, ScanRejectionReason, ScanSession};
use crate::tracking::{estimate_eta, GeoPoint, LocationTrail, ShipmentLocation, TrackingView};

/// Default floor below which a shipment is treated as stationary
pub const DEFAULT_MIN_SPEED_KMH: f64 = 1.0;

/// Everything an accepted shipment transition wrote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentCommit {
    pub shipment: Shipment,
    pub update: ShipmentStatusUpdate,
    pub entries: Vec<PackageStatusLog>,
}

pub struct LifecycleService<S: LifecycleStore, C: Clock = SystemClock> {
    store: S,
    engine: LifecycleEngine<C>,
    min_speed_kmh: f64,
}

impl<S: LifecycleStore, C: Clock> LifecycleService<S, C> {
    pub fn new(store: S, engine: LifecycleEngine<C>) -> Self {
        Self {
            store,
            engine,
            min_speed_kmh: DEFAULT_MIN_SPEED_KMH,
        }
    }

    pub fn with_min_speed(mut self, min_speed_kmh: f64) -> Self {
        self.min_speed_kmh = min_speed_kmh;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn engine(&self) -> &LifecycleEngine<C> {
        &self.engine
    }

    pub async fn register_package(&self, package: Package) -> Result<Package, LedgerError> {
        let stored = self.store.insert_package(package).await?;
        info!(tracking_number = %stored.value.tracking_number, "Package registered");
        Ok(stored.value)
    }

    /// Move one package to `target` and append the resulting log entry
    pub async fn advance_package(
        &self,
        tracking_number: &TrackingNumber,
        target: PackageStatus,
        actor: &Actor,
        description: Option<&str>,
    ) -> Result<PackageStatusLog, LedgerError> {
        let current = self.store.load_package(tracking_number).await?;
        let entry = self.engine.apply_package_transition_with_description(
            &current.value,
            target,
            actor,
            description,
        )?;
        self.store
            .append_status(entry.clone(), current.version)
            .await?;
        Ok(entry)
    }

    /// Archive a package. It keeps its history but accepts no more
    /// transitions.
    pub async fn archive_package(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Package, LedgerError> {
        let current = self.store.load_package(tracking_number).await?;
        let stored = self
            .store
            .archive_package(tracking_number, current.version)
            .await?;
        info!(%tracking_number, status = %stored.value.status, "Package archived");
        Ok(stored.value)
    }

    pub async fn archive_shipment(&self, id: Uuid) -> Result<Shipment, LedgerError> {
        let current = self.store.load_shipment(id).await?;
        let stored = self.store.archive_shipment(id, current.version).await?;
        info!(shipment_id = %id, status = %stored.value.status, "Shipment archived");
        Ok(stored.value)
    }

    pub async fn package_history(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<PackageHistory, LedgerError> {
        self.store.package_history(tracking_number).await
    }

    pub async fn create_shipment<I, T>(
        &self,
        kind: ShipmentKind,
        packages: I,
    ) -> Result<Shipment, LedgerError>
    where
        I: IntoIterator<Item = T>,
        T: Into<TrackingNumber>,
    {
        let shipment = Shipment::new(kind, self.engine.clock().now()).with_packages(packages);
        let stored = self.store.insert_shipment(shipment).await?;
        info!(
            shipment_id = %stored.value.id,
            kind = %stored.value.kind,
            packages = stored.value.package_ids.len(),
            "Shipment created"
        );
        Ok(stored.value)
    }

    pub async fn load_shipment(&self, id: Uuid) -> Result<Shipment, LedgerError> {
        Ok(self.store.load_shipment(id).await?.value)
    }

    /// Move a shipment to `target`. Close-out advances of member packages
    /// are committed together with the shipment or not at all.
    pub async fn advance_shipment(
        &self,
        id: Uuid,
        target: ShipmentStatus,
        actor: &Actor,
    ) -> Result<ShipmentCommit, LedgerError> {
        let current = self.store.load_shipment(id).await?;
        let members = self.load_members(&current.value).await?;
        let statuses: MemberStatuses = members
            .iter()
            .map(|(id, package)| (id.clone(), package.value.status))
            .collect();

        let update = self
            .engine
            .apply_shipment_transition(&current.value, &statuses, target)?;

        let mut pending = Vec::with_capacity(update.package_advances.len());
        for advance in &update.package_advances {
            let package = members
                .get(&advance.tracking_number)
                .ok_or_else(|| LedgerError::NotFound(format!("package {}", advance.tracking_number)))?;
            let entry = self.engine.close_out_entry(&package.value, advance, actor)?;
            pending.push(PendingEntry {
                entry,
                expected_version: package.version,
            });
        }
        let entries = pending.iter().map(|p| p.entry.clone()).collect();

        let mut shipment = current.value;
        shipment.status = target;
        let stored = self
            .store
            .commit_shipment(shipment, current.version, pending)
            .await?;

        Ok(ShipmentCommit {
            shipment: stored.value,
            update,
            entries,
        })
    }

    /// Persist a Save All batch. Packages changed by someone else since they
    /// were read are reported as conflicts; the rest are written.
    pub async fn scan_batch(&self, session: &ScanSession) -> Result<ScanOutcome, LedgerError> {
        let mut versions = HashMap::new();
        let mut packages = HashMap::new();
        for tracking_number in session.scanned() {
            match self.store.load_package(tracking_number).await {
                Ok(found) => {
                    versions.insert(tracking_number.clone(), found.version);
                    packages.insert(tracking_number.clone(), found.value);
                }
                Err(LedgerError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let decided = session.save_all(&self.engine, &packages);
        let mut outcome = ScanOutcome {
            accepted: Vec::with_capacity(decided.accepted.len()),
            rejected: decided.rejected,
        };

        for entry in decided.accepted {
            let version = versions.get(&entry.tracking_number).copied().unwrap_or_default();
            match self.store.append_status(entry.clone(), version).await {
                Ok(_) => outcome.accepted.push(entry),
                Err(e @ (LedgerError::VersionConflict { .. } | LedgerError::History(_))) => {
                    warn!(tracking_number = %entry.tracking_number, error = %e, "Scan lost a race");
                    outcome.rejected.push(ScanRejection {
                        tracking_number: entry.tracking_number.clone(),
                        reason: ScanRejectionReason::Conflict(e.to_string()),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }

    pub async fn tracking_view(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<TrackingView, LedgerError> {
        let package = self.store.load_package(tracking_number).await?;
        let history = self.store.package_history(tracking_number).await?;
        Ok(TrackingView::build(&package.value, &history))
    }

    pub async fn record_location(&self, location: ShipmentLocation) -> Result<(), LedgerError> {
        self.store.record_location(location).await
    }

    pub async fn location_trail(&self, shipment_id: Uuid) -> Result<LocationTrail, LedgerError> {
        Ok(LocationTrail::new(self.store.locations(shipment_id).await?))
    }

    pub async fn eta(
        &self,
        shipment_id: Uuid,
        destination: GeoPoint,
    ) -> Result<Option<DateTime<Utc>>, LedgerError> {
        let trail = self.location_trail(shipment_id).await?;
        Ok(estimate_eta(&trail, destination, self.min_speed_kmh))
    }

    /// Snapshots of every member that still exists. Missing members are
    /// left out so the guard reports them as blocking.
    async fn load_members(
        &self,
        shipment: &Shipment,
    ) -> Result<HashMap<TrackingNumber, Versioned<Package>>, LedgerError> {
        let mut members = HashMap::new();
        for id in &shipment.package_ids {
            match self.store.load_package(id).await {
                Ok(package) => {
                    members.insert(id.clone(), package);
                }
                Err(LedgerError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(members)
    }
}
