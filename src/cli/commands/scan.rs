use anyhow::Result;

use super::{print_json, CommandContext};
use crate::lifecycle::PackageStatus;
use crate::scanning::ScanSession;

pub struct ScanCommand {
    pub target: PackageStatus,
    pub tracking_numbers: Vec<String>,
    pub description: Option<String>,
}

impl ScanCommand {
    pub fn new(target: PackageStatus, tracking_numbers: Vec<String>) -> Self {
        Self {
            target,
            tracking_numbers,
            description: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Rejections are reported, not fatal; the exit status stays zero as long
    /// as the ledger could be read and written
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let mut session = ScanSession::new(self.target, ctx.actor.clone());
        if let Some(description) = &self.description {
            session = session.with_description(description.as_str());
        }
        for tracking_number in &self.tracking_numbers {
            session.scan(tracking_number.as_str());
        }

        let outcome = ctx.service().scan_batch(&session).await?;
        if ctx.json {
            return print_json(&outcome);
        }

        println!(
            "📥 Save All to {}: {} accepted, {} rejected",
            self.target,
            outcome.accepted.len(),
            outcome.rejected.len()
        );
        for entry in &outcome.accepted {
            println!("   ✅ {}", entry.tracking_number);
        }
        for rejection in &outcome.rejected {
            println!("   ❌ {} - {}", rejection.tracking_number, rejection.reason);
        }
        Ok(())
    }
}
