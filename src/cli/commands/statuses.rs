use anyhow::Result;
use serde::Serialize;

use super::{print_json, CommandContext};
use crate::lifecycle::{PackageStatus, ShipmentKind};

#[derive(Serialize)]
struct StatusRow {
    status: PackageStatus,
    rank: usize,
    allowed: Vec<PackageStatus>,
}

#[derive(Serialize)]
struct KindRow {
    kind: ShipmentKind,
    loaded: PackageStatus,
    arrived: PackageStatus,
    completion_advance: Option<PackageStatus>,
    terminal: String,
}

pub struct StatusesCommand;

impl StatusesCommand {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let statuses: Vec<StatusRow> = PackageStatus::ALL
            .iter()
            .map(|status| StatusRow {
                status: *status,
                rank: status.rank(),
                allowed: status.allowed_targets(),
            })
            .collect();
        let kinds: Vec<KindRow> = ShipmentKind::ALL
            .iter()
            .map(|kind| {
                let req = kind.requirements();
                KindRow {
                    kind: *kind,
                    loaded: req.loaded,
                    arrived: req.arrived,
                    completion_advance: req.completion_advance,
                    terminal: req.terminal.to_string(),
                }
            })
            .collect();

        if ctx.json {
            return print_json(&serde_json::json!({
                "package_statuses": statuses,
                "shipment_kinds": kinds,
            }));
        }

        println!("📋 Package statuses (canonical order):");
        for row in &statuses {
            let allowed: Vec<&str> = row.allowed.iter().map(|s| s.as_str()).collect();
            let allowed = if allowed.is_empty() {
                "(terminal)".to_string()
            } else {
                allowed.join(", ")
            };
            println!("  {:>2}. {:<24} -> {}", row.rank, row.status, allowed);
        }
        println!();
        println!("🚚 Shipment kinds:");
        for row in &kinds {
            let close_out = row
                .completion_advance
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<20} loaded>={:<24} arrived>={:<24} close-out={:<12} ends {}",
                row.kind, row.loaded, row.arrived, close_out, row.terminal
            );
        }
        Ok(())
    }
}

impl Default for StatusesCommand {
    fn default() -> Self {
        Self::new()
    }
}
