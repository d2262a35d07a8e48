//! Request ledger and approval workflow.
//!
//! Worker-submitted requests start as pending and transition exactly once
//! to approved or rejected. Administrator-direct changes skip the pending
//! phase: the change is applied immediately and an already-approved record
//! is appended purely for audit history.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{ChangePayload, ChangeRequest, RequestStatus, RequestUpdate};

use super::ScheduleEngine;

/// Rejects malformed payloads before they can reach the applier.
fn validate_payload(payload: &ChangePayload) -> Result<()> {
    match payload {
        ChangePayload::TimeOff { .. } => Ok(()),
        ChangePayload::CustomHours { shift, hours, .. } => {
            if shift.trim().is_empty() {
                bail!("custom shift label must not be empty");
            }
            if !(0.0..=24.0).contains(hours) {
                bail!("custom hours {hours} outside the 0-24 range");
            }
            Ok(())
        }
        ChangePayload::Swap { from, to } => {
            if from == to {
                bail!("swap must name two distinct dates");
            }
            Ok(())
        }
    }
}

impl ScheduleEngine {
    /// Creates a pending change request on behalf of a worker.
    pub async fn submit_request(
        &self,
        employee_id: &str,
        payload: ChangePayload,
        now: DateTime<Utc>,
    ) -> Result<ChangeRequest> {
        validate_payload(&payload)?;
        self.require_employee(employee_id).await?;

        let request = ChangeRequest {
            id: Uuid::new_v4().to_string(),
            employee_id: employee_id.to_string(),
            payload,
            status: RequestStatus::Pending,
            requested_at: now,
            approved_by: None,
            approved_at: None,
        };
        self.store.append_request(&request).await?;
        Ok(request)
    }

    /// Approves a pending request and applies its deviation to the schedule.
    ///
    /// The deviation is applied before the ledger is stamped, so a failing
    /// applier leaves the request pending instead of approved-but-unapplied.
    pub async fn approve_request(
        &self,
        request_id: &str,
        approved_by: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let request = self.require_pending(request_id).await?;

        self.apply_change(&request.employee_id, &request.payload)
            .await?;

        self.store
            .update_request(
                request_id,
                &RequestUpdate::resolution(RequestStatus::Approved, approved_by, now),
            )
            .await
    }

    /// Rejects a pending request. The schedule is not touched.
    pub async fn reject_request(
        &self,
        request_id: &str,
        approved_by: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.require_pending(request_id).await?;

        self.store
            .update_request(
                request_id,
                &RequestUpdate::resolution(RequestStatus::Rejected, approved_by, now),
            )
            .await
    }

    /// Administrator path: applies the change immediately and records a
    /// synthesized approved request for the audit trail.
    pub async fn direct_change(
        &self,
        employee_id: &str,
        payload: ChangePayload,
        applied_by: &str,
        now: DateTime<Utc>,
    ) -> Result<ChangeRequest> {
        validate_payload(&payload)?;
        self.apply_change(employee_id, &payload).await?;

        let request = ChangeRequest {
            id: Uuid::new_v4().to_string(),
            employee_id: employee_id.to_string(),
            payload,
            status: RequestStatus::Approved,
            requested_at: now,
            approved_by: Some(applied_by.to_string()),
            approved_at: Some(now),
        };
        self.store.append_request(&request).await?;
        Ok(request)
    }

    pub async fn pending_requests(&self) -> Result<Vec<ChangeRequest>> {
        Ok(self
            .store
            .requests()
            .await?
            .into_iter()
            .filter(|req| req.status == RequestStatus::Pending)
            .collect())
    }

    pub async fn requests_for(&self, employee_id: &str) -> Result<Vec<ChangeRequest>> {
        Ok(self
            .store
            .requests()
            .await?
            .into_iter()
            .filter(|req| req.employee_id == employee_id)
            .collect())
    }

    async fn require_pending(&self, request_id: &str) -> Result<ChangeRequest> {
        let requests = self.store.requests().await?;
        let Some(request) = requests.into_iter().find(|req| req.id == request_id) else {
            bail!("change request {request_id} not found");
        };
        if request.status != RequestStatus::Pending {
            bail!(
                "change request {request_id} is {}, not pending",
                request.status.as_str()
            );
        }
        Ok(request)
    }
}
