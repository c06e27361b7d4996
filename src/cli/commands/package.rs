use anyhow::Result;

use super::{print_json, CommandContext};
use crate::cli::PackageCommands;
use crate::lifecycle::{Package, TrackingNumber};

pub struct PackageCommand {
    command: PackageCommands,
}

impl PackageCommand {
    pub fn new(command: PackageCommands) -> Self {
        Self { command }
    }

    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let service = ctx.service();

        match &self.command {
            PackageCommands::Create {
                tracking_number,
                shipping_type,
                mode,
                agent,
            } => {
                let mut package = Package::new(tracking_number.as_str(), *shipping_type, *mode);
                if let Some(agent) = agent {
                    package = package.with_agent(agent.as_str());
                }
                let package = service.register_package(package).await?;
                if ctx.json {
                    return print_json(&package);
                }
                println!("📦 Registered {} ({})", package.tracking_number, package.status);
            }
            PackageCommands::Advance {
                tracking_number,
                status,
                description,
            } => {
                let entry = service
                    .advance_package(
                        &TrackingNumber::from(tracking_number.as_str()),
                        *status,
                        &ctx.actor,
                        description.as_deref(),
                    )
                    .await?;
                if ctx.json {
                    return print_json(&entry);
                }
                println!("✅ {} is now {}", entry.tracking_number, entry.status);
                println!("   {}", entry.description);
            }
            PackageCommands::History { tracking_number } => {
                let history = service
                    .package_history(&TrackingNumber::from(tracking_number.as_str()))
                    .await?;
                if ctx.json {
                    return print_json(&history.entries());
                }
                println!("📜 {} - {}", history.tracking_number, history.current_status());
                for entry in history.entries() {
                    println!(
                        "  {}  {:<24} {:<12} {}",
                        entry.created_at.to_rfc3339(),
                        entry.status,
                        entry.created_by_id,
                        entry.description
                    );
                }
            }
            PackageCommands::Track { tracking_number } => {
                let view = service
                    .tracking_view(&TrackingNumber::from(tracking_number.as_str()))
                    .await?;
                if ctx.json {
                    return print_json(&view);
                }
                println!("🔎 {} - {}", view.tracking_number, view.current_status);
                if view.failed_attempts > 0 {
                    println!("   Failed delivery attempts: {}", view.failed_attempts);
                }
                for event in &view.events {
                    println!("  {}  {}", event.at.format("%Y-%m-%d %H:%M"), event.description);
                }
            }
            PackageCommands::Archive { tracking_number } => {
                let package = service
                    .archive_package(&TrackingNumber::from(tracking_number.as_str()))
                    .await?;
                if ctx.json {
                    return print_json(&package);
                }
                println!("🗄️  Archived {} at {}", package.tracking_number, package.status);
            }
        }
        Ok(())
    }
}
