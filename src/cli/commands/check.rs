use anyhow::Result;

use super::{print_json, CommandContext};
use crate::lifecycle::{check_package_transition, PackageStatus};

pub struct CheckCommand {
    pub from: PackageStatus,
    pub to: PackageStatus,
}

impl CheckCommand {
    pub fn new(from: PackageStatus, to: PackageStatus) -> Self {
        Self { from, to }
    }

    /// Fails with the rejection reason when the edge is not legal
    pub fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let verdict = check_package_transition(self.from, self.to);

        if ctx.json {
            print_json(&serde_json::json!({
                "from": self.from,
                "to": self.to,
                "allowed": verdict.is_ok(),
                "reason": verdict.as_ref().err().map(|e| e.to_string()),
            }))?;
        } else if verdict.is_ok() {
            let kind = if self.from.is_retry_edge(self.to) {
                " (failed attempt)"
            } else {
                ""
            };
            println!("✅ {} -> {} is allowed{}", self.from, self.to, kind);
        }

        verdict.map_err(Into::into)
    }
}
