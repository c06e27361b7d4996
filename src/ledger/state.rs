// Ledger document shared by the memory and file stores
//
// All version checks live here so both stores enforce them identically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{LedgerError, PendingEntry, Versioned};
use crate::lifecycle::{
    LifecycleError, Package, PackageHistory, PackageStatus, PackageStatusLog, Shipment,
    TrackingNumber,
};
use crate::tracking::ShipmentLocation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub package: Package,
    pub version: u64,
    pub history: PackageHistory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub shipment: Shipment,
    pub version: u64,
    #[serde(default)]
    pub locations: Vec<ShipmentLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    #[serde(default)]
    pub packages: BTreeMap<TrackingNumber, PackageRecord>,
    #[serde(default)]
    pub shipments: BTreeMap<Uuid, ShipmentRecord>,
}

fn check_version(id: impl ToString, expected: u64, found: u64) -> Result<(), LedgerError> {
    if expected != found {
        return Err(LedgerError::VersionConflict {
            id: id.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

impl LedgerState {
    /// New packages enter the ledger in PENDING with an empty log
    pub fn insert_package(&mut self, package: Package) -> Result<Versioned<Package>, LedgerError> {
        if package.status != PackageStatus::Pending {
            return Err(LifecycleError::invalid(PackageStatus::Pending, package.status).into());
        }
        if package.is_archived {
            return Err(LifecycleError::Archived {
                id: package.tracking_number.to_string(),
            }
            .into());
        }
        if self.packages.contains_key(&package.tracking_number) {
            return Err(LedgerError::AlreadyExists(package.tracking_number.to_string()));
        }
        let record = PackageRecord {
            history: PackageHistory::new(package.tracking_number.clone()),
            package: package.clone(),
            version: 0,
        };
        self.packages.insert(package.tracking_number.clone(), record);
        Ok(Versioned {
            value: package,
            version: 0,
        })
    }

    pub fn load_package(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Versioned<Package>, LedgerError> {
        let record = self.package_record(tracking_number)?;
        Ok(Versioned {
            value: record.package.clone(),
            version: record.version,
        })
    }

    pub fn package_record(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<&PackageRecord, LedgerError> {
        self.packages
            .get(tracking_number)
            .ok_or_else(|| LedgerError::NotFound(format!("package {}", tracking_number)))
    }

    pub fn append_status(
        &mut self,
        entry: PackageStatusLog,
        expected_version: u64,
    ) -> Result<Versioned<Package>, LedgerError> {
        self.check_entry(&entry, expected_version)?;
        self.apply_entry(entry)
    }

    pub fn insert_shipment(
        &mut self,
        shipment: Shipment,
    ) -> Result<Versioned<Shipment>, LedgerError> {
        if shipment.is_archived {
            return Err(LifecycleError::Archived {
                id: shipment.id.to_string(),
            }
            .into());
        }
        if self.shipments.contains_key(&shipment.id) {
            return Err(LedgerError::AlreadyExists(format!("shipment {}", shipment.id)));
        }
        for id in &shipment.package_ids {
            self.package_record(id)?;
        }
        self.shipments.insert(
            shipment.id,
            ShipmentRecord {
                shipment: shipment.clone(),
                version: 0,
                locations: Vec::new(),
            },
        );
        Ok(Versioned {
            value: shipment,
            version: 0,
        })
    }

    pub fn load_shipment(&self, id: Uuid) -> Result<Versioned<Shipment>, LedgerError> {
        let record = self.shipment_record(id)?;
        Ok(Versioned {
            value: record.shipment.clone(),
            version: record.version,
        })
    }

    pub fn shipment_record(&self, id: Uuid) -> Result<&ShipmentRecord, LedgerError> {
        self.shipments
            .get(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("shipment {}", id)))
    }

    /// Validate everything first, then write; a failure leaves the ledger
    /// untouched
    pub fn commit_shipment(
        &mut self,
        shipment: Shipment,
        expected_version: u64,
        entries: Vec<PendingEntry>,
    ) -> Result<Versioned<Shipment>, LedgerError> {
        let record = self.shipment_record(shipment.id)?;
        check_version(shipment.id, expected_version, record.version)?;
        for pending in &entries {
            self.check_entry(&pending.entry, pending.expected_version)?;
        }

        for pending in entries {
            self.apply_entry(pending.entry)?;
        }
        let record = self
            .shipments
            .get_mut(&shipment.id)
            .ok_or_else(|| LedgerError::NotFound(format!("shipment {}", shipment.id)))?;
        record.shipment = shipment;
        record.version += 1;
        Ok(Versioned {
            value: record.shipment.clone(),
            version: record.version,
        })
    }

    /// Soft-delete a package. Its history stays readable; the engine refuses
    /// further transitions.
    pub fn archive_package(
        &mut self,
        tracking_number: &TrackingNumber,
        expected_version: u64,
    ) -> Result<Versioned<Package>, LedgerError> {
        let record = self
            .packages
            .get_mut(tracking_number)
            .ok_or_else(|| LedgerError::NotFound(format!("package {}", tracking_number)))?;
        check_version(tracking_number, expected_version, record.version)?;
        if record.package.is_archived {
            return Err(LifecycleError::Archived {
                id: tracking_number.to_string(),
            }
            .into());
        }
        record.package.is_archived = true;
        record.version += 1;
        Ok(Versioned {
            value: record.package.clone(),
            version: record.version,
        })
    }

    pub fn archive_shipment(
        &mut self,
        id: Uuid,
        expected_version: u64,
    ) -> Result<Versioned<Shipment>, LedgerError> {
        let record = self
            .shipments
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("shipment {}", id)))?;
        check_version(id, expected_version, record.version)?;
        if record.shipment.is_archived {
            return Err(LifecycleError::Archived { id: id.to_string() }.into());
        }
        record.shipment.is_archived = true;
        record.version += 1;
        Ok(Versioned {
            value: record.shipment.clone(),
            version: record.version,
        })
    }

    pub fn record_location(&mut self, location: ShipmentLocation) -> Result<(), LedgerError> {
        let record = self
            .shipments
            .get_mut(&location.shipment_id)
            .ok_or_else(|| LedgerError::NotFound(format!("shipment {}", location.shipment_id)))?;
        record.locations.push(location);
        Ok(())
    }

    fn check_entry(&self, entry: &PackageStatusLog, expected_version: u64) -> Result<(), LedgerError> {
        let record = self.package_record(&entry.tracking_number)?;
        check_version(&entry.tracking_number, expected_version, record.version)?;
        record.history.check_next(entry)?;
        Ok(())
    }

    fn apply_entry(&mut self, entry: PackageStatusLog) -> Result<Versioned<Package>, LedgerError> {
        let record = self
            .packages
            .get_mut(&entry.tracking_number)
            .ok_or_else(|| LedgerError::NotFound(format!("package {}", entry.tracking_number)))?;
        record.history.append(entry.clone())?;
        record.package.record(&entry);
        record.version += 1;
        Ok(Versioned {
            value: record.package.clone(),
            version: record.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{ShipmentKind, ShippingMode, ShippingType};
    use chrono::{Duration, TimeZone, Utc};

    fn entry(id: &str, minute: i64, status: PackageStatus) -> PackageStatusLog {
        PackageStatusLog {
            id: Uuid::new_v4(),
            tracking_number: id.into(),
            status,
            description: status.default_description().to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
                + Duration::minutes(minute),
            created_by_id: "admin-1".to_string(),
        }
    }

    fn ledger_with(ids: &[&str]) -> LedgerState {
        let mut ledger = LedgerState::default();
        for id in ids {
            ledger
                .insert_package(Package::new(*id, ShippingType::Express, ShippingMode::Air))
                .unwrap();
        }
        ledger
    }

    #[test]
    fn test_append_bumps_version_and_status() {
        let mut ledger = ledger_with(&["PH-1"]);
        let stored = ledger
            .append_status(entry("PH-1", 1, PackageStatus::PreparedByAgent), 0)
            .unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.value.status, PackageStatus::PreparedByAgent);
        assert_eq!(
            ledger.package_record(&"PH-1".into()).unwrap().history.entries().len(),
            1
        );
    }

    #[test]
    fn test_stale_version_is_a_conflict() {
        let mut ledger = ledger_with(&["PH-1"]);
        ledger
            .append_status(entry("PH-1", 1, PackageStatus::PreparedByAgent), 0)
            .unwrap();
        let err = ledger
            .append_status(entry("PH-1", 2, PackageStatus::ShippedByAgent), 0)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::VersionConflict {
                expected: 0,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_package_is_rejected() {
        let mut ledger = ledger_with(&["PH-1"]);
        assert!(matches!(
            ledger.insert_package(Package::new("PH-1", ShippingType::Express, ShippingMode::Air)),
            Err(LedgerError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_archived_package_cannot_be_registered() {
        let mut ledger = LedgerState::default();
        let mut package = Package::new("PH-1", ShippingType::Express, ShippingMode::Air);
        package.is_archived = true;

        assert!(matches!(
            ledger.insert_package(package),
            Err(LedgerError::Lifecycle(LifecycleError::Archived { .. }))
        ));
        assert!(ledger.packages.is_empty());
    }

    #[test]
    fn test_archive_bumps_version_once() {
        let mut ledger = ledger_with(&["PH-1"]);
        let archived = ledger.archive_package(&"PH-1".into(), 0).unwrap();
        assert!(archived.value.is_archived);
        assert_eq!(archived.version, 1);

        assert!(matches!(
            ledger.archive_package(&"PH-1".into(), 0),
            Err(LedgerError::VersionConflict { .. })
        ));
        assert!(matches!(
            ledger.archive_package(&"PH-1".into(), 1),
            Err(LedgerError::Lifecycle(LifecycleError::Archived { .. }))
        ));
    }

    #[test]
    fn test_shipment_needs_known_packages() {
        let mut ledger = ledger_with(&["PH-1"]);
        let shipment = Shipment::new(ShipmentKind::Delivery, Utc::now()).with_packages(["PH-1", "PH-9"]);
        assert!(matches!(
            ledger.insert_shipment(shipment),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_commit_is_all_or_nothing() {
        let mut ledger = ledger_with(&["PH-1", "PH-2"]);
        let shipment = Shipment::new(ShipmentKind::Delivery, Utc::now()).with_packages(["PH-1", "PH-2"]);
        let shipment_id = shipment.id;
        ledger.insert_shipment(shipment.clone()).unwrap();

        let mut moved = shipment;
        moved.status = crate::lifecycle::ShipmentStatus::InTransit;
        let entries = vec![
            PendingEntry {
                entry: entry("PH-1", 1, PackageStatus::PreparedByAgent),
                expected_version: 0,
            },
            PendingEntry {
                entry: entry("PH-2", 1, PackageStatus::PreparedByAgent),
                expected_version: 7,
            },
        ];

        assert!(ledger.commit_shipment(moved, 0, entries).is_err());
        assert_eq!(ledger.load_package(&"PH-1".into()).unwrap().version, 0);
        assert_eq!(ledger.load_shipment(shipment_id).unwrap().version, 0);
    }
}
