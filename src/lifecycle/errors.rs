// Typed rejections returned by the lifecycle engine

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::types::{PackageStatus, Role, ShipmentStatus, TrackingNumber};

/// Either side of a rejected edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnyStatus {
    Package(PackageStatus),
    Shipment(ShipmentStatus),
}

impl fmt::Display for AnyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyStatus::Package(status) => write!(f, "{}", status),
            AnyStatus::Shipment(status) => write!(f, "{}", status),
        }
    }
}

impl From<PackageStatus> for AnyStatus {
    fn from(status: PackageStatus) -> Self {
        AnyStatus::Package(status)
    }
}

impl From<ShipmentStatus> for AnyStatus {
    fn from(status: ShipmentStatus) -> Self {
        AnyStatus::Shipment(status)
    }
}

/// A member package holding a shipment back. `status` is `None` when the
/// caller supplied no snapshot for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingPackage {
    pub tracking_number: TrackingNumber,
    pub status: Option<PackageStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LifecycleError {
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: AnyStatus, to: AnyStatus },

    #[error("{status} is terminal, no further transitions allowed")]
    TerminalStateViolation { status: AnyStatus },

    #[error(
        "Cannot move shipment to {target}: {} package(s) not yet at {required}",
        .blocking.len()
    )]
    GuardNotSatisfied {
        target: ShipmentStatus,
        required: PackageStatus,
        blocking: Vec<BlockingPackage>,
    },

    #[error("Role {role} may not record {status}")]
    ActorNotPermitted { role: Role, status: PackageStatus },

    #[error("{id} is archived")]
    Archived { id: String },
}

impl LifecycleError {
    pub fn invalid(from: impl Into<AnyStatus>, to: impl Into<AnyStatus>) -> Self {
        LifecycleError::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn terminal(status: impl Into<AnyStatus>) -> Self {
        LifecycleError::TerminalStateViolation {
            status: status.into(),
        }
    }
}
