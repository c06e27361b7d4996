// JSON file ledger
//
// The whole ledger is one JSON document. Each operation takes an advisory
// lock on `<path>.lock`, reads the document, applies the change and writes
// it back through a temp file + rename.

use async_trait::async_trait;
use fd_lock::RwLock;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use super::{LedgerError, LedgerState, LifecycleStore, PendingEntry, Versioned};
use crate::lifecycle::{Package, PackageHistory, PackageStatusLog, Shipment, TrackingNumber};
use crate::tracking::ShipmentLocation;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(path: &Path) -> PathBuf {
        let mut lock = path.as_os_str().to_owned();
        lock.push(".lock");
        PathBuf::from(lock)
    }

    fn open_lock(path: &Path) -> Result<RwLock<File>, LedgerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(Self::lock_path(path))?;
        Ok(RwLock::new(file))
    }

    fn read_state(path: &Path) -> Result<LedgerState, LedgerError> {
        if !path.exists() {
            return Ok(LedgerState::default());
        }
        let contents = fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(LedgerState::default());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_state(path: &Path, state: &LedgerState) -> Result<(), LedgerError> {
        let serialized = serde_json::to_string_pretty(state)?;
        let mut temp = path.as_os_str().to_owned();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);
        fs::write(&temp, serialized)?;
        fs::rename(&temp, path)?;
        debug!(file = ?path, "Ledger written");
        Ok(())
    }

    /// Run `op` against the ledger under a shared lock
    async fn read<T, F>(&self, op: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&LedgerState) -> Result<T, LedgerError> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<T, LedgerError> {
            let lock = Self::open_lock(&path)?;
            let _guard = lock.read()?;
            let state = Self::read_state(&path)?;
            op(&state)
        })
        .await
        .map_err(|e| LedgerError::Io(std::io::Error::other(e)))?
    }

    /// Run `op` under an exclusive lock and persist the result if it succeeds
    async fn mutate<T, F>(&self, op: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut LedgerState) -> Result<T, LedgerError> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<T, LedgerError> {
            let mut lock = Self::open_lock(&path)?;
            let _guard = lock.write()?;
            let mut state = Self::read_state(&path)?;
            let result = op(&mut state)?;
            Self::write_state(&path, &state)?;
            Ok(result)
        })
        .await
        .map_err(|e| LedgerError::Io(std::io::Error::other(e)))?
    }
}

#[async_trait]
impl LifecycleStore for JsonFileStore {
    async fn insert_package(&self, package: Package) -> Result<Versioned<Package>, LedgerError> {
        self.mutate(move |state| state.insert_package(package)).await
    }

    async fn load_package(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Versioned<Package>, LedgerError> {
        let tracking_number = tracking_number.clone();
        self.read(move |state| state.load_package(&tracking_number))
            .await
    }

    async fn append_status(
        &self,
        entry: PackageStatusLog,
        expected_version: u64,
    ) -> Result<Versioned<Package>, LedgerError> {
        self.mutate(move |state| state.append_status(entry, expected_version))
            .await
    }

    async fn package_history(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<PackageHistory, LedgerError> {
        let tracking_number = tracking_number.clone();
        self.read(move |state| Ok(state.package_record(&tracking_number)?.history.clone()))
            .await
    }

    async fn insert_shipment(&self, shipment: Shipment) -> Result<Versioned<Shipment>, LedgerError> {
        self.mutate(move |state| state.insert_shipment(shipment)).await
    }

    async fn load_shipment(&self, id: Uuid) -> Result<Versioned<Shipment>, LedgerError> {
        self.read(move |state| state.load_shipment(id)).await
    }

    async fn commit_shipment(
        &self,
        shipment: Shipment,
        expected_version: u64,
        entries: Vec<PendingEntry>,
    ) -> Result<Versioned<Shipment>, LedgerError> {
        self.mutate(move |state| state.commit_shipment(shipment, expected_version, entries))
            .await
    }

    async fn archive_package(
        &self,
        tracking_number: &TrackingNumber,
        expected_version: u64,
    ) -> Result<Versioned<Package>, LedgerError> {
        let tracking_number = tracking_number.clone();
        self.mutate(move |state| state.archive_package(&tracking_number, expected_version))
            .await
    }

    async fn archive_shipment(
        &self,
        id: Uuid,
        expected_version: u64,
    ) -> Result<Versioned<Shipment>, LedgerError> {
        self.mutate(move |state| state.archive_shipment(id, expected_version))
            .await
    }

    async fn record_location(&self, location: ShipmentLocation) -> Result<(), LedgerError> {
        self.mutate(move |state| state.record_location(location)).await
    }

    async fn locations(&self, shipment_id: Uuid) -> Result<Vec<ShipmentLocation>, LedgerError> {
        self.read(move |state| Ok(state.shipment_record(shipment_id)?.locations.clone()))
            .await
    }
}
