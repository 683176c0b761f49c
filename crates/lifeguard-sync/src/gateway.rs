//! Mutation gateway.
//!
//! Every user-initiated write goes through here. Local rules run first
//! (eligibility, transitions, interval and draft validation); the
//! collaborator is called next; only after it confirms does the gateway
//! refresh the affected domain. Nothing is applied optimistically, so a
//! failed mutation leaves the dashboard exactly as it was.

use std::sync::Arc;

use lifeguard_core::flag::validate_draft;
use lifeguard_core::schedule::{self, ScheduleReport};
use lifeguard_core::shift::{self as lifecycle, CheckInEligibility};
use lifeguard_types::{
    Alert, AlertId, AlertStatus, CenterId, FlagDraft, FlagId, GeoPoint, NewShift, SafetyFlag,
    ScheduleTemplate, Shift, ShiftId, ShiftPatch, ShiftStatus,
};
use tracing::{info, warn};

use crate::error::{MutationError, Operation};
use crate::refresh::{Domain, RefreshContext, refresh};
use crate::state::DashboardStore;

/// Routes dashboard writes to the collaborator.
#[derive(Clone)]
pub struct MutationGateway {
    ctx: Arc<RefreshContext>,
    store: Arc<DashboardStore>,
}

impl MutationGateway {
    /// Gateway writing through `ctx` and refreshing `store`.
    pub const fn new(ctx: Arc<RefreshContext>, store: Arc<DashboardStore>) -> Self {
        Self { ctx, store }
    }

    async fn confirmed(&self, domain: Domain) {
        refresh(&self.ctx, &self.store, domain).await;
    }

    /// Whether `shift` could be checked in right now, and why not.
    pub fn check_in_eligibility(&self, shift: &Shift) -> CheckInEligibility {
        lifecycle::evaluate_check_in_eligibility(
            shift,
            self.ctx.clock.now(),
            &self.ctx.settings.check_in,
        )
    }

    /// Check in to `shift` at `location`.
    pub async fn check_in(&self, shift: &Shift, location: GeoPoint) -> Result<Shift, MutationError> {
        let op = Operation::CheckIn;
        let mut local = shift.clone();
        lifecycle::request_check_in(
            &mut local,
            location,
            self.ctx.clock.now(),
            &self.ctx.settings.check_in,
        )
        .map_err(|e| MutationError::new(op, e))?;

        let updated = self
            .ctx
            .access
            .check_in(shift.id, location)
            .await
            .map_err(|e| MutationError::new(op, e))?;
        info!(shift_id = %updated.id, "checked in");
        self.confirmed(Domain::Shifts).await;
        Ok(updated)
    }

    /// Check out of `shift`.
    pub async fn check_out(&self, shift: &Shift) -> Result<Shift, MutationError> {
        let op = Operation::CheckOut;
        lifecycle::ensure_check_out(shift).map_err(|e| MutationError::new(op, e))?;
        let updated = self
            .ctx
            .access
            .check_out(shift.id)
            .await
            .map_err(|e| MutationError::new(op, e))?;
        info!(shift_id = %updated.id, "checked out");
        self.confirmed(Domain::Shifts).await;
        Ok(updated)
    }

    /// Cancel `shift` from `scheduled` or `active`.
    pub async fn cancel_shift(&self, shift: &Shift) -> Result<Shift, MutationError> {
        let op = Operation::CancelShift;
        let mut local = shift.clone();
        lifecycle::cancel(&mut local, self.ctx.clock.now()).map_err(|e| MutationError::new(op, e))?;
        let patch = ShiftPatch {
            status: Some(ShiftStatus::Cancelled),
            ..ShiftPatch::default()
        };
        let updated = self
            .ctx
            .access
            .update_shift(shift.id, &patch)
            .await
            .map_err(|e| MutationError::new(op, e))?;
        info!(shift_id = %updated.id, "shift cancelled");
        self.confirmed(Domain::Shifts).await;
        Ok(updated)
    }

    /// Create a single shift.
    pub async fn create_shift(&self, req: &NewShift) -> Result<Shift, MutationError> {
        let op = Operation::CreateShift;
        lifecycle::validate_interval(req.start_time, req.end_time)
            .map_err(|e| MutationError::new(op, e))?;
        let created = self
            .ctx
            .access
            .create_shift(req)
            .await
            .map_err(|e| MutationError::new(op, e))?;
        info!(shift_id = %created.id, "shift created");
        self.confirmed(Domain::Shifts).await;
        Ok(created)
    }

    /// Apply an administrative edit to `shift`.
    pub async fn update_shift(&self, shift: &Shift, patch: &ShiftPatch) -> Result<Shift, MutationError> {
        let op = Operation::UpdateShift;
        lifecycle::validate_patch(shift, patch).map_err(|e| MutationError::new(op, e))?;
        let updated = self
            .ctx
            .access
            .update_shift(shift.id, patch)
            .await
            .map_err(|e| MutationError::new(op, e))?;
        info!(shift_id = %updated.id, "shift updated");
        self.confirmed(Domain::Shifts).await;
        Ok(updated)
    }

    /// Delete a shift.
    pub async fn delete_shift(&self, id: ShiftId) -> Result<(), MutationError> {
        self.ctx
            .access
            .delete_shift(id)
            .await
            .map_err(|e| MutationError::new(Operation::DeleteShift, e))?;
        info!(shift_id = %id, "shift deleted");
        self.confirmed(Domain::Shifts).await;
        Ok(())
    }

    /// Expand `template` and create every non-conflicting shift.
    ///
    /// Fails only when the template is invalid or the lifeguard's existing
    /// shifts cannot be read; in both cases nothing is created. Once
    /// creation starts, individual failures are counted and the batch
    /// carries on. Nothing already created is rolled back.
    pub async fn generate_weekly_schedule(
        &self,
        template: &ScheduleTemplate,
    ) -> Result<ScheduleReport, MutationError> {
        let op = Operation::GenerateSchedule;
        let settings = &self.ctx.settings;
        schedule::validate_template(template, settings.max_weeks)
            .map_err(|e| MutationError::new(op, e))?;

        let existing = self
            .ctx
            .access
            .list_shifts_for_lifeguard(template.lifeguard_id)
            .await
            .map_err(|e| MutationError::new(op, e))?;
        let plan = schedule::plan_weekly_schedule(
            template,
            &existing,
            settings.check_in.site_offset,
            settings.max_weeks,
        )
        .map_err(|e| MutationError::new(op, e))?;

        let mut report = ScheduleReport {
            skipped_count: plan.skipped_count(),
            ..ScheduleReport::default()
        };
        for req in plan.requests() {
            match self.ctx.access.create_shift(&req).await {
                Ok(shift) => report.created.push(shift.id),
                Err(e) => {
                    warn!(
                        lifeguard_id = %req.lifeguard_id,
                        start = %req.start_time,
                        error = %e,
                        "schedule candidate not created"
                    );
                    report.failed_count = report.failed_count.saturating_add(1);
                }
            }
        }

        info!(
            lifeguard_id = %template.lifeguard_id,
            created = report.created.len(),
            skipped = report.skipped_count,
            failed = report.failed_count,
            "weekly schedule generated"
        );
        if !report.created.is_empty() {
            self.confirmed(Domain::Shifts).await;
        }
        Ok(report)
    }

    /// Set a new safety flag for `center_id`.
    pub async fn create_flag(
        &self,
        center_id: CenterId,
        draft: &FlagDraft,
    ) -> Result<SafetyFlag, MutationError> {
        let op = Operation::CreateFlag;
        validate_draft(draft, self.ctx.clock.now()).map_err(|e| MutationError::new(op, e))?;
        let flag = self
            .ctx
            .access
            .create_flag(center_id, draft)
            .await
            .map_err(|e| MutationError::new(op, e))?;
        info!(flag_id = %flag.id, center_id = %center_id, status = ?flag.status, "flag set");
        self.confirmed(Domain::Flag).await;
        Ok(flag)
    }

    /// Edit an existing flag.
    pub async fn update_flag(&self, id: FlagId, draft: &FlagDraft) -> Result<SafetyFlag, MutationError> {
        let op = Operation::UpdateFlag;
        validate_draft(draft, self.ctx.clock.now()).map_err(|e| MutationError::new(op, e))?;
        let flag = self
            .ctx
            .access
            .update_flag(id, draft)
            .await
            .map_err(|e| MutationError::new(op, e))?;
        info!(flag_id = %flag.id, "flag updated");
        self.confirmed(Domain::Flag).await;
        Ok(flag)
    }

    /// Delete a flag from the history.
    pub async fn delete_flag(&self, id: FlagId) -> Result<(), MutationError> {
        self.ctx
            .access
            .delete_flag(id)
            .await
            .map_err(|e| MutationError::new(Operation::DeleteFlag, e))?;
        info!(flag_id = %id, "flag deleted");
        self.confirmed(Domain::Flag).await;
        Ok(())
    }

    /// Move an alert to `status`.
    pub async fn update_alert_status(
        &self,
        id: AlertId,
        status: AlertStatus,
    ) -> Result<Alert, MutationError> {
        let alert = self
            .ctx
            .access
            .update_alert_status(id, status)
            .await
            .map_err(|e| MutationError::new(Operation::UpdateAlertStatus, e))?;
        info!(alert_id = %id, status = ?status, "alert status updated");
        self.confirmed(Domain::Alerts).await;
        Ok(alert)
    }
}
