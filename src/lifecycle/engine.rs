// Lifecycle engine - turns accepted transitions into log entries
//
// Every decision is a pure function of the snapshot handed in. The engine
// owns no state beyond its clock and policy flags.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::LifecycleError;
use super::package::check_package_transition;
use super::shipment::{apply_shipment_transition, MemberStatuses};
use super::types::{
    Actor, Package, PackageAdvance, PackageStatus, PackageStatusLog, Shipment, ShipmentStatus,
    ShipmentStatusUpdate,
};

/// Time source for log entries
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Timestamp for a new entry, strictly after `previous`
pub fn next_log_timestamp(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(previous) if previous >= now => previous + Duration::microseconds(1),
        _ => now,
    }
}

#[derive(Debug, Clone)]
pub struct LifecycleEngine<C: Clock = SystemClock> {
    clock: C,
    enforce_roles: bool,
}

impl Default for LifecycleEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleEngine<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> LifecycleEngine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            enforce_roles: true,
        }
    }

    pub fn enforce_roles(mut self, enforce: bool) -> Self {
        self.enforce_roles = enforce;
        self
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Full package check: archival, terminal state, edge legality, then role
    pub fn check_package_transition(
        &self,
        package: &Package,
        target: PackageStatus,
        actor: &Actor,
    ) -> Result<(), LifecycleError> {
        if package.is_archived {
            return Err(LifecycleError::Archived {
                id: package.tracking_number.to_string(),
            });
        }
        check_package_transition(package.status, target)?;
        if self.enforce_roles && !actor.role.may_record(target) {
            return Err(LifecycleError::ActorNotPermitted {
                role: actor.role,
                status: target,
            });
        }
        Ok(())
    }

    pub fn apply_package_transition(
        &self,
        package: &Package,
        target: PackageStatus,
        actor: &Actor,
    ) -> Result<PackageStatusLog, LifecycleError> {
        self.apply_package_transition_with_description(package, target, actor, None)
    }

    /// Produce the log entry for an accepted transition. The caller appends
    /// it and folds it into the snapshot with `Package::record`.
    pub fn apply_package_transition_with_description(
        &self,
        package: &Package,
        target: PackageStatus,
        actor: &Actor,
        description: Option<&str>,
    ) -> Result<PackageStatusLog, LifecycleError> {
        if let Err(e) = self.check_package_transition(package, target, actor) {
            warn!(
                tracking_number = %package.tracking_number,
                from = %package.status,
                to = %target,
                actor = %actor.id,
                error = %e,
                "Package transition rejected"
            );
            return Err(e);
        }

        let entry = self.log_entry(package, target, actor, description);
        info!(
            tracking_number = %package.tracking_number,
            from = %package.status,
            to = %target,
            actor = %actor.id,
            retry = package.status.is_retry_edge(target),
            "Package transition accepted"
        );
        Ok(entry)
    }

    pub fn can_transition_shipment(
        &self,
        shipment: &Shipment,
        members: &MemberStatuses,
        target: ShipmentStatus,
    ) -> bool {
        apply_shipment_transition(shipment, members, target).is_ok()
    }

    pub fn apply_shipment_transition(
        &self,
        shipment: &Shipment,
        members: &MemberStatuses,
        target: ShipmentStatus,
    ) -> Result<ShipmentStatusUpdate, LifecycleError> {
        match apply_shipment_transition(shipment, members, target) {
            Ok(update) => {
                info!(
                    shipment_id = %shipment.id,
                    kind = %shipment.kind,
                    from = %update.from,
                    to = %update.to,
                    advances = update.package_advances.len(),
                    "Shipment transition accepted"
                );
                Ok(update)
            }
            Err(e) => {
                warn!(
                    shipment_id = %shipment.id,
                    kind = %shipment.kind,
                    from = %shipment.status,
                    to = %target,
                    error = %e,
                    "Shipment transition rejected"
                );
                Err(e)
            }
        }
    }

    /// Log entry for a shipment close-out advance. Close-outs are forward
    /// jumps made on the shipment's authority, so only the direction and
    /// the terminal state are checked.
    pub fn close_out_entry(
        &self,
        package: &Package,
        advance: &PackageAdvance,
        actor: &Actor,
    ) -> Result<PackageStatusLog, LifecycleError> {
        if package.status.is_terminal() {
            return Err(LifecycleError::terminal(package.status));
        }
        if package.status != advance.from || !advance.to.is_at_or_past(advance.from) {
            return Err(LifecycleError::invalid(package.status, advance.to));
        }
        debug!(
            tracking_number = %package.tracking_number,
            from = %advance.from,
            to = %advance.to,
            "Shipment close-out advance"
        );
        Ok(self.log_entry(package, advance.to, actor, None))
    }

    fn log_entry(
        &self,
        package: &Package,
        target: PackageStatus,
        actor: &Actor,
        description: Option<&str>,
    ) -> PackageStatusLog {
        PackageStatusLog {
            id: Uuid::new_v4(),
            tracking_number: package.tracking_number.clone(),
            status: target,
            description: description
                .map(str::to_string)
                .unwrap_or_else(|| target.default_description().to_string()),
            created_at: next_log_timestamp(package.last_logged_at, self.clock.now()),
            created_by_id: actor.id.clone(),
        }
    }
}
