use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use crate::lifecycle::{PackageStatus, Role, ShipmentKind, ShipmentStatus, ShippingMode, ShippingType};

pub mod commands;

#[derive(Parser)]
#[command(name = "freightline")]
#[command(about = "Package and shipment lifecycle ledger")]
#[command(long_about = "Freightline records package and shipment status changes in an append-only \
                       ledger and refuses any transition the lifecycle does not allow. Start with \
                       'freightline statuses' to see the canonical order.")]
pub struct Cli {
    /// Ledger file, overrides ledger.path from the configuration
    #[arg(long, global = true, help = "Path to the JSON ledger file")]
    pub ledger: Option<PathBuf>,

    /// Configuration file used instead of ./freightline.toml
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Actor id recorded on new log entries
    #[arg(long, global = true, help = "Who is recording the change (defaults to lifecycle.default_actor_id)")]
    pub actor: Option<String>,

    /// Role the actor acts in
    #[arg(long, global = true, default_value = "ADMIN", help = "ADMIN, WAREHOUSE, OVERSEAS_AGENT, DOMESTIC_AGENT or DRIVER")]
    pub role: Role,

    /// Print results as JSON
    #[arg(long, global = true, help = "Emit machine-readable JSON on stdout")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the canonical status order and every legal transition
    Statuses,
    /// Check whether a package may move between two statuses
    Check {
        /// Current status
        from: PackageStatus,
        /// Requested status
        to: PackageStatus,
    },
    /// Register, advance and inspect packages
    #[command(subcommand)]
    Package(PackageCommands),
    /// Create and advance shipments
    #[command(subcommand)]
    Shipment(ShipmentCommands),
    /// Save All: move every scanned package to one status
    Scan {
        /// Target status for the whole batch
        #[arg(long, help = "Status every scanned package should move to")]
        to: PackageStatus,
        /// Log description for every accepted entry
        #[arg(long, help = "Description shown on the tracking page")]
        description: Option<String>,
        /// Scanned tracking numbers, in scan order
        #[arg(required = true)]
        tracking_numbers: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum PackageCommands {
    /// Register a new package in PENDING
    Create {
        tracking_number: String,
        #[arg(long, default_value = "EXPRESS", help = "EXPRESS or STANDARD")]
        shipping_type: ShippingType,
        #[arg(long, default_value = "AIR", help = "AIR or SEA")]
        mode: ShippingMode,
        #[arg(long, help = "Overseas agent handling the package")]
        agent: Option<String>,
    },
    /// Move a package to its next status
    Advance {
        tracking_number: String,
        status: PackageStatus,
        #[arg(long, help = "Description shown on the tracking page")]
        description: Option<String>,
    },
    /// Print the full status log of a package
    History { tracking_number: String },
    /// Print the public tracking view of a package
    Track { tracking_number: String },
    /// Archive a package; its history stays readable
    Archive { tracking_number: String },
}

#[derive(Subcommand)]
pub enum ShipmentCommands {
    /// Create a shipment in PREPARING with the given packages
    Create {
        #[arg(long, help = "INCOMING, DELIVERY, FORWARDER_TRANSFER or WAREHOUSE_TRANSFER")]
        kind: ShipmentKind,
        tracking_numbers: Vec<String>,
    },
    /// Move a shipment to IN_TRANSIT or its terminal status
    Advance { id: Uuid, status: ShipmentStatus },
    /// Print a shipment and its members
    Show { id: Uuid },
    /// Archive a shipment so it accepts no more transitions
    Archive { id: Uuid },
    /// Record a position sample for a shipment
    Locate {
        id: Uuid,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long, help = "RFC 3339 timestamp of the sample (defaults to now)")]
        at: Option<DateTime<Utc>>,
    },
    /// Estimate arrival at a destination from the recorded trail
    Eta {
        id: Uuid,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
}

impl Cli {
    /// Name recorded on the lifecycle span
    pub fn operation_name(&self) -> &'static str {
        match &self.command {
            None => "help",
            Some(Commands::Statuses) => "statuses",
            Some(Commands::Check { .. }) => "check",
            Some(Commands::Package(command)) => match command {
                PackageCommands::Create { .. } => "package.create",
                PackageCommands::Advance { .. } => "package.advance",
                PackageCommands::History { .. } => "package.history",
                PackageCommands::Track { .. } => "package.track",
                PackageCommands::Archive { .. } => "package.archive",
            },
            Some(Commands::Shipment(command)) => match command {
                ShipmentCommands::Create { .. } => "shipment.create",
                ShipmentCommands::Advance { .. } => "shipment.advance",
                ShipmentCommands::Show { .. } => "shipment.show",
                ShipmentCommands::Archive { .. } => "shipment.archive",
                ShipmentCommands::Locate { .. } => "shipment.locate",
                ShipmentCommands::Eta { .. } => "shipment.eta",
            },
            Some(Commands::Scan { .. }) => "scan",
        }
    }

    /// Package or shipment the command acts on, if it names exactly one
    pub fn subject(&self) -> Option<String> {
        match self.command.as_ref()? {
            Commands::Package(command) => match command {
                PackageCommands::Create { tracking_number, .. }
                | PackageCommands::Advance { tracking_number, .. }
                | PackageCommands::History { tracking_number }
                | PackageCommands::Track { tracking_number }
                | PackageCommands::Archive { tracking_number } => Some(tracking_number.clone()),
            },
            Commands::Shipment(command) => match command {
                ShipmentCommands::Create { .. } => None,
                ShipmentCommands::Advance { id, .. }
                | ShipmentCommands::Show { id }
                | ShipmentCommands::Archive { id }
                | ShipmentCommands::Locate { id, .. }
                | ShipmentCommands::Eta { id, .. } => Some(id.to_string()),
            },
            Commands::Statuses | Commands::Check { .. } | Commands::Scan { .. } => None,
        }
    }
}
