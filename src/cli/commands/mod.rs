use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::{Cli, Commands};
use crate::config::FreightlineConfig;
use crate::ledger::{JsonFileStore, LifecycleService};
use crate::lifecycle::{Actor, LifecycleEngine};

pub mod check;
pub mod package;
pub mod scan;
pub mod shipment;
pub mod statuses;

/// Settings every command resolves from flags first, configuration second
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub ledger_path: PathBuf,
    pub actor: Actor,
    pub enforce_roles: bool,
    pub min_speed_kmh: f64,
    pub json: bool,
}

impl CommandContext {
    pub fn from_cli(cli: &Cli, config: &FreightlineConfig) -> Self {
        let actor_id = cli
            .actor
            .clone()
            .unwrap_or_else(|| config.lifecycle.default_actor_id.clone());
        Self {
            ledger_path: cli.ledger.clone().unwrap_or_else(|| config.ledger.path.clone()),
            actor: Actor::new(actor_id, cli.role),
            enforce_roles: config.lifecycle.enforce_roles,
            min_speed_kmh: config.tracking.min_speed_kmh,
            json: cli.json,
        }
    }

    pub fn service(&self) -> LifecycleService<JsonFileStore> {
        let engine = LifecycleEngine::new().enforce_roles(self.enforce_roles);
        LifecycleService::new(JsonFileStore::new(&self.ledger_path), engine)
            .with_min_speed(self.min_speed_kmh)
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn dispatch(cli: Cli, config: &FreightlineConfig) -> Result<()> {
    let ctx = CommandContext::from_cli(&cli, config);

    match cli.command {
        None => show_how_to_start(),
        Some(Commands::Statuses) => statuses::StatusesCommand::new().execute(&ctx),
        Some(Commands::Check { from, to }) => check::CheckCommand::new(from, to).execute(&ctx),
        Some(Commands::Package(command)) => package::PackageCommand::new(command).execute(&ctx).await,
        Some(Commands::Shipment(command)) => {
            shipment::ShipmentCommand::new(command).execute(&ctx).await
        }
        Some(Commands::Scan {
            to,
            description,
            tracking_numbers,
        }) => {
            scan::ScanCommand::new(to, tracking_numbers)
                .with_description(description)
                .execute(&ctx)
                .await
        }
    }
}

pub fn show_how_to_start() -> Result<()> {
    println!("📦 Freightline - package and shipment lifecycle ledger");
    println!();
    println!("To get started:");
    println!("  freightline statuses                       # Canonical order and legal moves");
    println!("  freightline package create PH-0001         # Register a package");
    println!("  freightline package advance PH-0001 PREPARED_BY_AGENT");
    println!("  freightline scan --to IN_WAREHOUSE PH-0001 PH-0002");
    println!("  freightline shipment create --kind DELIVERY PH-0001");
    println!();
    println!("💡 Use --ledger <path> to point at a ledger other than the configured one");
    Ok(())
}
