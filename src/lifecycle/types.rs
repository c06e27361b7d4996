// Core types for the package and shipment lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Package statuses in canonical order. The declaration order IS the
/// lifecycle order; `rank()` relies on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageStatus {
    /// Booked, nothing physical has happened yet
    Pending,
    /// Overseas agent has packed and labelled the package
    PreparedByAgent,
    /// Overseas agent has handed the package to the line haul
    ShippedByAgent,
    /// Landed in the Philippines
    ArrivedInPh,
    /// Received into a warehouse
    InWarehouse,
    /// Being sorted for onward movement
    Sorting,
    /// Handed over to a third-party forwarder
    TransferringForwarder,
    /// Moving between internal warehouses
    TransferringWarehouse,
    /// Loaded for final-mile delivery
    OutForDelivery,
    /// Driver is on the way to the receiver
    Delivering,
    /// Receiver has the package
    Delivered,
}

impl PackageStatus {
    pub const ALL: [PackageStatus; 11] = [
        PackageStatus::Pending,
        PackageStatus::PreparedByAgent,
        PackageStatus::ShippedByAgent,
        PackageStatus::ArrivedInPh,
        PackageStatus::InWarehouse,
        PackageStatus::Sorting,
        PackageStatus::TransferringForwarder,
        PackageStatus::TransferringWarehouse,
        PackageStatus::OutForDelivery,
        PackageStatus::Delivering,
        PackageStatus::Delivered,
    ];

    /// Position in the canonical order
    pub fn rank(self) -> usize {
        self as usize
    }

    /// Immediate successor in the canonical order
    pub fn successor(self) -> Option<PackageStatus> {
        Self::ALL.get(self.rank() + 1).copied()
    }

    /// Where a failed attempt from this status sends the package back to
    pub fn retry_target(self) -> Option<PackageStatus> {
        match self {
            PackageStatus::OutForDelivery | PackageStatus::Delivering => {
                Some(PackageStatus::InWarehouse)
            }
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PackageStatus::Delivered)
    }

    pub fn is_at_or_past(self, threshold: PackageStatus) -> bool {
        self.rank() >= threshold.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PackageStatus::Pending => "PENDING",
            PackageStatus::PreparedByAgent => "PREPARED_BY_AGENT",
            PackageStatus::ShippedByAgent => "SHIPPED_BY_AGENT",
            PackageStatus::ArrivedInPh => "ARRIVED_IN_PH",
            PackageStatus::InWarehouse => "IN_WAREHOUSE",
            PackageStatus::Sorting => "SORTING",
            PackageStatus::TransferringForwarder => "TRANSFERRING_FORWARDER",
            PackageStatus::TransferringWarehouse => "TRANSFERRING_WAREHOUSE",
            PackageStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            PackageStatus::Delivering => "DELIVERING",
            PackageStatus::Delivered => "DELIVERED",
        }
    }

    /// Log description shown on the tracking page when the operator gives none
    pub fn default_description(self) -> &'static str {
        match self {
            PackageStatus::Pending => "Shipment booked, awaiting pickup",
            PackageStatus::PreparedByAgent => "Package prepared by origin agent",
            PackageStatus::ShippedByAgent => "Package shipped by origin agent",
            PackageStatus::ArrivedInPh => "Package arrived in the Philippines",
            PackageStatus::InWarehouse => "Package received at warehouse",
            PackageStatus::Sorting => "Package is being sorted",
            PackageStatus::TransferringForwarder => "Package handed over to forwarder",
            PackageStatus::TransferringWarehouse => "Package in transfer to another warehouse",
            PackageStatus::OutForDelivery => "Package is out for delivery",
            PackageStatus::Delivering => "Driver is delivering the package",
            PackageStatus::Delivered => "Package delivered to receiver",
        }
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} '{value}'")]
pub struct ParseStatusError {
    pub kind: &'static str,
    pub value: String,
}

/// Normalise user input: case-insensitive, dashes and spaces read as underscores
fn normalise(value: &str) -> String {
    value.trim().to_ascii_uppercase().replace(|c: char| c == '-' || c == ' ', "_")
}

impl FromStr for PackageStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalise(s);
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| ParseStatusError {
                kind: "package status",
                value: s.to_string(),
            })
    }
}

/// Shipment statuses. `Completed` and `Arrived` are both terminal; which one
/// a shipment ends in depends on its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Preparing,
    InTransit,
    Completed,
    Arrived,
}

impl ShipmentStatus {
    pub const ALL: [ShipmentStatus; 4] = [
        ShipmentStatus::Preparing,
        ShipmentStatus::InTransit,
        ShipmentStatus::Completed,
        ShipmentStatus::Arrived,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, ShipmentStatus::Completed | ShipmentStatus::Arrived)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentStatus::Preparing => "PREPARING",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::Completed => "COMPLETED",
            ShipmentStatus::Arrived => "ARRIVED",
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShipmentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalise(s);
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| ParseStatusError {
                kind: "shipment status",
                value: s.to_string(),
            })
    }
}

/// Shipment subtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentKind {
    /// Line haul from an overseas agent into the country
    Incoming,
    /// Final-mile run from a warehouse to receivers
    Delivery,
    /// Hand-over of packages to a third-party forwarder
    ForwarderTransfer,
    /// Movement between two internal warehouses
    WarehouseTransfer,
}

/// Package thresholds that gate a shipment kind's transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipmentRequirements {
    /// Every member must be at or past this before IN_TRANSIT
    pub loaded: PackageStatus,
    /// Every member must be at or past this before completion
    pub arrived: PackageStatus,
    /// Members below this are advanced to it when the shipment completes
    pub completion_advance: Option<PackageStatus>,
    /// Status the shipment ends in
    pub terminal: ShipmentStatus,
}

impl ShipmentKind {
    pub const ALL: [ShipmentKind; 4] = [
        ShipmentKind::Incoming,
        ShipmentKind::Delivery,
        ShipmentKind::ForwarderTransfer,
        ShipmentKind::WarehouseTransfer,
    ];

    pub fn requirements(self) -> ShipmentRequirements {
        match self {
            ShipmentKind::Incoming => ShipmentRequirements {
                loaded: PackageStatus::ShippedByAgent,
                arrived: PackageStatus::ShippedByAgent,
                completion_advance: Some(PackageStatus::ArrivedInPh),
                terminal: ShipmentStatus::Arrived,
            },
            ShipmentKind::Delivery => ShipmentRequirements {
                loaded: PackageStatus::OutForDelivery,
                arrived: PackageStatus::Delivering,
                completion_advance: Some(PackageStatus::Delivered),
                terminal: ShipmentStatus::Completed,
            },
            ShipmentKind::ForwarderTransfer => ShipmentRequirements {
                loaded: PackageStatus::TransferringForwarder,
                arrived: PackageStatus::TransferringForwarder,
                completion_advance: Some(PackageStatus::Delivered),
                terminal: ShipmentStatus::Completed,
            },
            // Members stay at TRANSFERRING_WAREHOUSE on completion. The
            // receiving warehouse re-sorts them and records OUT_FOR_DELIVERY
            // itself, which is a separate Delivery shipment.
            ShipmentKind::WarehouseTransfer => ShipmentRequirements {
                loaded: PackageStatus::TransferringWarehouse,
                arrived: PackageStatus::TransferringWarehouse,
                completion_advance: None,
                terminal: ShipmentStatus::Completed,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentKind::Incoming => "INCOMING",
            ShipmentKind::Delivery => "DELIVERY",
            ShipmentKind::ForwarderTransfer => "FORWARDER_TRANSFER",
            ShipmentKind::WarehouseTransfer => "WAREHOUSE_TRANSFER",
        }
    }
}

impl fmt::Display for ShipmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShipmentKind {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalise(s);
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| ParseStatusError {
                kind: "shipment kind",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingType {
    Express,
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingMode {
    Air,
    Sea,
}

impl FromStr for ShippingType {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "EXPRESS" => Ok(ShippingType::Express),
            "STANDARD" => Ok(ShippingType::Standard),
            _ => Err(ParseStatusError {
                kind: "shipping type",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for ShippingMode {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "AIR" => Ok(ShippingMode::Air),
            "SEA" => Ok(ShippingMode::Sea),
            _ => Err(ParseStatusError {
                kind: "shipping mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Portal roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Warehouse,
    OverseasAgent,
    DomesticAgent,
    Driver,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Warehouse,
        Role::OverseasAgent,
        Role::DomesticAgent,
        Role::Driver,
    ];

    /// Whether this role may record `status` on a package
    pub fn may_record(self, status: PackageStatus) -> bool {
        use PackageStatus::*;
        match self {
            Role::Admin => true,
            Role::OverseasAgent => matches!(status, PreparedByAgent | ShippedByAgent),
            Role::Warehouse => matches!(
                status,
                ArrivedInPh
                    | InWarehouse
                    | Sorting
                    | TransferringForwarder
                    | TransferringWarehouse
                    | OutForDelivery
            ),
            Role::DomesticAgent => matches!(
                status,
                TransferringForwarder | Delivering | Delivered | InWarehouse
            ),
            Role::Driver => matches!(status, Delivering | Delivered | InWarehouse),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Warehouse => "WAREHOUSE",
            Role::OverseasAgent => "OVERSEAS_AGENT",
            Role::DomesticAgent => "DOMESTIC_AGENT",
            Role::Driver => "DRIVER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalise(s);
        Self::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == wanted)
            .ok_or_else(|| ParseStatusError {
                kind: "role",
                value: s.to_string(),
            })
    }
}

/// Whoever is asking for a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingNumber(pub String);

impl TrackingNumber {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackingNumber {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TrackingNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Current snapshot of a package. `status` and `last_logged_at` mirror the
/// latest status log entry and are only changed through `record`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub tracking_number: TrackingNumber,
    pub status: PackageStatus,
    pub shipping_type: ShippingType,
    pub shipping_mode: ShippingMode,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub warehouse_id: Option<Uuid>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub last_logged_at: Option<DateTime<Utc>>,
}

impl Package {
    pub fn new(
        tracking_number: impl Into<TrackingNumber>,
        shipping_type: ShippingType,
        shipping_mode: ShippingMode,
    ) -> Self {
        Self {
            tracking_number: tracking_number.into(),
            status: PackageStatus::Pending,
            shipping_type,
            shipping_mode,
            is_archived: false,
            warehouse_id: None,
            agent_id: None,
            last_logged_at: None,
        }
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Fold a log entry into the snapshot
    pub fn record(&mut self, entry: &PackageStatusLog) {
        self.status = entry.status;
        self.last_logged_at = Some(entry.created_at);
    }
}

/// Immutable status log entry. A package's current status is the status of
/// its most recent entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageStatusLog {
    pub id: Uuid,
    pub tracking_number: TrackingNumber,
    pub status: PackageStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub created_by_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: Uuid,
    pub kind: ShipmentKind,
    pub status: ShipmentStatus,
    #[serde(default)]
    pub is_archived: bool,
    pub package_ids: Vec<TrackingNumber>,
    pub created_at: DateTime<Utc>,
}

impl Shipment {
    pub fn new(kind: ShipmentKind, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            status: ShipmentStatus::Preparing,
            is_archived: false,
            package_ids: Vec::new(),
            created_at,
        }
    }

    /// Bind a package to this shipment. Returns false if it was already bound.
    pub fn add_package(&mut self, tracking_number: impl Into<TrackingNumber>) -> bool {
        let tracking_number = tracking_number.into();
        if self.package_ids.contains(&tracking_number) {
            return false;
        }
        self.package_ids.push(tracking_number);
        true
    }

    pub fn with_packages<I, T>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TrackingNumber>,
    {
        for package in packages {
            self.add_package(package);
        }
        self
    }
}

/// One member package moved forward by a shipment close-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageAdvance {
    pub tracking_number: TrackingNumber,
    pub from: PackageStatus,
    pub to: PackageStatus,
}

/// Result of an accepted shipment transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentStatusUpdate {
    pub shipment_id: Uuid,
    pub from: ShipmentStatus,
    pub to: ShipmentStatus,
    pub package_advances: Vec<PackageAdvance>,
}
