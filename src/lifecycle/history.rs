// Status history - deriving and auditing a package's append-only log

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{PackageStatus, PackageStatusLog, TrackingNumber};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryViolation {
    #[error("Entry {index} belongs to {found}, expected {expected}")]
    ForeignEntry {
        index: usize,
        expected: TrackingNumber,
        found: TrackingNumber,
    },

    #[error("Entry {index} moves backwards from {from} to {to}")]
    Regression {
        index: usize,
        from: PackageStatus,
        to: PackageStatus,
    },

    #[error("Entry {index} is not later than the entry before it")]
    NonIncreasingTimestamp { index: usize },

    #[error("Entry {index} follows a terminal status")]
    AfterTerminal { index: usize },
}

/// Ordered status log of one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageHistory {
    pub tracking_number: TrackingNumber,
    entries: Vec<PackageStatusLog>,
}

impl PackageHistory {
    pub fn new(tracking_number: impl Into<TrackingNumber>) -> Self {
        Self {
            tracking_number: tracking_number.into(),
            entries: Vec::new(),
        }
    }

    /// Build from stored entries, sorting them by creation time
    pub fn from_entries(
        tracking_number: impl Into<TrackingNumber>,
        mut entries: Vec<PackageStatusLog>,
    ) -> Self {
        entries.sort_by_key(|entry| entry.created_at);
        Self {
            tracking_number: tracking_number.into(),
            entries,
        }
    }

    pub fn entries(&self) -> &[PackageStatusLog] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&PackageStatusLog> {
        self.entries.last()
    }

    /// Status of the most recent entry; a package with no entries is PENDING
    pub fn current_status(&self) -> PackageStatus {
        self.latest()
            .map(|entry| entry.status)
            .unwrap_or(PackageStatus::Pending)
    }

    /// Whether `entry` may be appended next
    pub fn check_next(&self, entry: &PackageStatusLog) -> Result<(), HistoryViolation> {
        check_entry(&self.tracking_number, self.latest(), entry, self.entries.len())
    }

    /// Append an entry after checking it keeps the log valid
    pub fn append(&mut self, entry: PackageStatusLog) -> Result<(), HistoryViolation> {
        self.check_next(&entry)?;
        self.entries.push(entry);
        Ok(())
    }

    /// Check the whole log: non-decreasing order except failed-attempt
    /// edges, strictly increasing timestamps, nothing after DELIVERED
    pub fn verify(&self) -> Result<(), HistoryViolation> {
        let mut previous: Option<&PackageStatusLog> = None;
        for (index, entry) in self.entries.iter().enumerate() {
            check_entry(&self.tracking_number, previous, entry, index)?;
            previous = Some(entry);
        }
        Ok(())
    }

    /// Number of failed delivery attempts recorded
    pub fn failed_attempts(&self) -> usize {
        self.entries
            .windows(2)
            .filter(|pair| pair[0].status.is_retry_edge(pair[1].status))
            .count()
    }
}

fn check_entry(
    tracking_number: &TrackingNumber,
    previous: Option<&PackageStatusLog>,
    entry: &PackageStatusLog,
    index: usize,
) -> Result<(), HistoryViolation> {
    if &entry.tracking_number != tracking_number {
        return Err(HistoryViolation::ForeignEntry {
            index,
            expected: tracking_number.clone(),
            found: entry.tracking_number.clone(),
        });
    }
    let Some(previous) = previous else {
        return Ok(());
    };
    if previous.status.is_terminal() {
        return Err(HistoryViolation::AfterTerminal { index });
    }
    if entry.created_at <= previous.created_at {
        return Err(HistoryViolation::NonIncreasingTimestamp { index });
    }
    if !entry.status.is_at_or_past(previous.status) && !previous.status.is_retry_edge(entry.status)
    {
        return Err(HistoryViolation::Regression {
            index,
            from: previous.status,
            to: entry.status,
        });
    }
    Ok(())
}
