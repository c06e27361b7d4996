use anyhow::Result;
use chrono::Utc;

use super::{print_json, CommandContext};
use crate::cli::ShipmentCommands;
use crate::ledger::LifecycleStore;
use crate::tracking::{GeoPoint, ShipmentLocation};

pub struct ShipmentCommand {
    command: ShipmentCommands,
}

impl ShipmentCommand {
    pub fn new(command: ShipmentCommands) -> Self {
        Self { command }
    }

    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let service = ctx.service();

        match &self.command {
            ShipmentCommands::Create {
                kind,
                tracking_numbers,
            } => {
                let shipment = service
                    .create_shipment(*kind, tracking_numbers.iter().map(String::as_str))
                    .await?;
                if ctx.json {
                    return print_json(&shipment);
                }
                println!(
                    "🚚 Created {} shipment {} with {} package(s)",
                    shipment.kind,
                    shipment.id,
                    shipment.package_ids.len()
                );
            }
            ShipmentCommands::Advance { id, status } => {
                let commit = service.advance_shipment(*id, *status, &ctx.actor).await?;
                if ctx.json {
                    return print_json(&commit);
                }
                println!(
                    "✅ Shipment {} moved {} -> {}",
                    commit.shipment.id, commit.update.from, commit.update.to
                );
                for advance in &commit.update.package_advances {
                    println!(
                        "   {} {} -> {}",
                        advance.tracking_number, advance.from, advance.to
                    );
                }
            }
            ShipmentCommands::Show { id } => {
                let shipment = service.load_shipment(*id).await?;
                let mut members = Vec::with_capacity(shipment.package_ids.len());
                for tracking_number in &shipment.package_ids {
                    let package = service.store().load_package(tracking_number).await?;
                    members.push(package.value);
                }
                if ctx.json {
                    return print_json(&serde_json::json!({
                        "shipment": shipment,
                        "packages": members,
                    }));
                }
                println!("🚚 {} shipment {} - {}", shipment.kind, shipment.id, shipment.status);
                for package in &members {
                    println!("   {:<16} {}", package.tracking_number, package.status);
                }
            }
            ShipmentCommands::Archive { id } => {
                let shipment = service.archive_shipment(*id).await?;
                if ctx.json {
                    return print_json(&shipment);
                }
                println!("🗄️  Archived shipment {} at {}", shipment.id, shipment.status);
            }
            ShipmentCommands::Locate { id, lat, lon, at } => {
                let location = ShipmentLocation {
                    shipment_id: *id,
                    position: GeoPoint::new(*lat, *lon),
                    recorded_at: at.unwrap_or_else(Utc::now),
                };
                service.record_location(location.clone()).await?;
                if ctx.json {
                    return print_json(&location);
                }
                println!("📍 Recorded {:.5},{:.5} for shipment {}", lat, lon, id);
            }
            ShipmentCommands::Eta { id, lat, lon } => {
                let eta = service.eta(*id, GeoPoint::new(*lat, *lon)).await?;
                if ctx.json {
                    return print_json(&serde_json::json!({ "shipment_id": id, "eta": eta }));
                }
                match eta {
                    Some(eta) => println!("⏱️  Estimated arrival {}", eta.to_rfc3339()),
                    None => println!("⏱️  Not enough movement recorded to estimate arrival"),
                }
            }
        }
        Ok(())
    }
}
