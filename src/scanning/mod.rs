// Scan sessions - request-scoped "Save All" batches
//
// A warehouse operator scans a run of tracking numbers and then commits them
// to one target status in a single action. The session owns the selection;
// nothing is shared between requests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::lifecycle::{
    Actor, Clock, LifecycleEngine, LifecycleError, Package, PackageStatus, PackageStatusLog,
    TrackingNumber,
};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ScanRejectionReason {
    #[error("Unknown tracking number")]
    UnknownPackage,
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("Changed by another request: {0}")]
    Conflict(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRejection {
    pub tracking_number: TrackingNumber,
    pub reason: ScanRejectionReason,
}

/// What a Save All produced. Rejections never block the accepted entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub accepted: Vec<PackageStatusLog>,
    pub rejected: Vec<ScanRejection>,
}

impl ScanOutcome {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ScanSession {
    pub id: Uuid,
    pub target: PackageStatus,
    pub actor: Actor,
    pub description: Option<String>,
    scanned: Vec<TrackingNumber>,
}

impl ScanSession {
    pub fn new(target: PackageStatus, actor: Actor) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            actor,
            description: None,
            scanned: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Record a scan. Scanning the same label twice is a no-op.
    pub fn scan(&mut self, tracking_number: impl Into<TrackingNumber>) -> bool {
        let tracking_number = tracking_number.into();
        if self.scanned.contains(&tracking_number) {
            return false;
        }
        self.scanned.push(tracking_number);
        true
    }

    pub fn unscan(&mut self, tracking_number: &TrackingNumber) -> bool {
        let before = self.scanned.len();
        self.scanned.retain(|scanned| scanned != tracking_number);
        before != self.scanned.len()
    }

    pub fn scanned(&self) -> &[TrackingNumber] {
        &self.scanned
    }

    pub fn len(&self) -> usize {
        self.scanned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scanned.is_empty()
    }

    /// Evaluate every scanned package against the engine, in scan order
    pub fn save_all<C: Clock>(
        &self,
        engine: &LifecycleEngine<C>,
        packages: &HashMap<TrackingNumber, Package>,
    ) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for tracking_number in &self.scanned {
            let Some(package) = packages.get(tracking_number) else {
                outcome.rejected.push(ScanRejection {
                    tracking_number: tracking_number.clone(),
                    reason: ScanRejectionReason::UnknownPackage,
                });
                continue;
            };

            match engine.apply_package_transition_with_description(
                package,
                self.target,
                &self.actor,
                self.description.as_deref(),
            ) {
                Ok(entry) => outcome.accepted.push(entry),
                Err(e) => outcome.rejected.push(ScanRejection {
                    tracking_number: tracking_number.clone(),
                    reason: e.into(),
                }),
            }
        }

        info!(
            session_id = %self.id,
            target = %self.target,
            scanned = self.scanned.len(),
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            "Scan session saved"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{FixedClock, Role, ShippingMode, ShippingType};
    use chrono::{TimeZone, Utc};

    fn package(id: &str, status: PackageStatus) -> (TrackingNumber, Package) {
        let mut package = Package::new(id, ShippingType::Standard, ShippingMode::Sea);
        package.status = status;
        (package.tracking_number.clone(), package)
    }

    #[test]
    fn test_duplicate_scans_are_ignored() {
        let mut session = ScanSession::new(
            PackageStatus::InWarehouse,
            Actor::new("wh-1", Role::Warehouse),
        );
        assert!(session.scan("PH-1"));
        assert!(!session.scan("PH-1"));
        assert!(session.scan("PH-2"));
        assert_eq!(session.len(), 2);
        assert!(session.unscan(&"PH-1".into()));
        assert_eq!(session.scanned(), &[TrackingNumber::from("PH-2")]);
    }

    #[test]
    fn test_save_all_applies_what_it_can() {
        let engine = LifecycleEngine::with_clock(FixedClock(
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        ));
        let packages: HashMap<_, _> = [
            package("PH-1", PackageStatus::ArrivedInPh),
            package("PH-2", PackageStatus::Pending),
            package("PH-3", PackageStatus::ArrivedInPh),
        ]
        .into_iter()
        .collect();

        let mut session = ScanSession::new(
            PackageStatus::InWarehouse,
            Actor::new("wh-1", Role::Warehouse),
        )
        .with_description("Received at Manila hub");
        for id in ["PH-1", "PH-2", "PH-3", "PH-404"] {
            session.scan(id);
        }

        let outcome = session.save_all(&engine, &packages);
        assert_eq!(outcome.accepted.len(), 2);
        assert!(outcome
            .accepted
            .iter()
            .all(|entry| entry.description == "Received at Manila hub"));
        assert_eq!(outcome.rejected.len(), 2);
        assert_eq!(outcome.rejected[0].tracking_number.as_str(), "PH-2");
        assert!(matches!(
            outcome.rejected[0].reason,
            ScanRejectionReason::Lifecycle(LifecycleError::InvalidTransition { .. })
        ));
        assert_eq!(outcome.rejected[1].reason, ScanRejectionReason::UnknownPackage);
        assert!(!outcome.is_clean());
    }
}
