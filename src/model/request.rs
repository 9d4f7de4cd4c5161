use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::workflow::duration::{DurationValue, Schedule};
use crate::workflow::engine::{RequestState, SHIFT_SWAP};
use crate::workflow::visibility;

/// The two request collections. Fixed for a record's lifetime.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Leave,
    Overtime,
}

impl RequestKind {
    pub fn collection(&self) -> &'static str {
        match self {
            RequestKind::Leave => "leave_requests",
            RequestKind::Overtime => "overtime_requests",
        }
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, sqlx::Type,
    ToSchema, Default,
)]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: String,
    pub employee_name: String,
    pub department: String,
    pub position: String,
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: u32,
    pub reason: String,
    pub status: RequestStatus,
    pub submission_date: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub approval_date: Option<DateTime<Utc>>,
    pub cancellation_requested: bool,
    pub cancellation_reason: Option<String>,
    pub cancellation_date: Option<DateTime<Utc>>,
    pub cancellation_approved: bool,
    pub cancellation_approval_date: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    pub fn schedule(&self) -> Schedule {
        Schedule::Days {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn duration(&self) -> DurationValue {
        DurationValue::Days(self.total_days)
    }

    pub fn workflow_state(&self) -> RequestState {
        RequestState {
            kind: RequestKind::Leave,
            status: self.status,
            cancellation_requested: self.cancellation_requested,
            owner: self.employee_id.clone(),
            department: self.department.clone(),
            period_end: Some(self.end_date),
        }
    }
}

/// Overtime rows reuse the start/end columns for a shift swap's off-dates;
/// `schedule()` is the only reader and returns the tagged variant.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OvertimeRequest {
    pub id: u64,
    pub employee_id: String,
    pub employee_name: String,
    pub department: String,
    pub position: String,
    pub adjustment_type: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub total_hours: f64,
    pub reason: String,
    pub status: RequestStatus,
    pub submission_date: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub approval_date: Option<DateTime<Utc>>,
    pub cancellation_requested: bool,
    pub cancellation_reason: Option<String>,
    pub cancellation_date: Option<DateTime<Utc>>,
    pub cancellation_approved: bool,
    pub cancellation_approval_date: Option<DateTime<Utc>>,
}

impl OvertimeRequest {
    pub fn is_swap(&self) -> bool {
        self.adjustment_type == SHIFT_SWAP
    }

    pub fn schedule(&self) -> Schedule {
        if self.is_swap() {
            Schedule::Swap {
                original_off: self.start_date.date(),
                new_off: self.end_date.date(),
            }
        } else {
            Schedule::Hours {
                start: self.start_date,
                end: self.end_date,
            }
        }
    }

    pub fn duration(&self) -> DurationValue {
        if self.is_swap() {
            DurationValue::Swap
        } else {
            DurationValue::Hours(self.total_hours)
        }
    }

    pub fn workflow_state(&self) -> RequestState {
        RequestState {
            kind: RequestKind::Overtime,
            status: self.status,
            cancellation_requested: self.cancellation_requested,
            owner: self.employee_id.clone(),
            department: self.department.clone(),
            period_end: None,
        }
    }
}

/// Kind-agnostic view served by the list endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct RequestSummary {
    #[schema(example = 1)]
    pub id: u64,
    #[serde(rename = "type")]
    #[schema(example = "Leave")]
    pub request_type: String,
    #[schema(example = "Annual Leave")]
    pub category: String,
    #[schema(example = "EMP-204")]
    pub employee_id: String,
    pub employee_name: String,
    pub department: String,
    pub position: String,
    #[schema(value_type = Object)]
    pub schedule: Schedule,
    #[schema(example = "3 days")]
    pub duration: String,
    pub reason: String,
    pub status: RequestStatus,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub submission_date: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub approval_date: Option<DateTime<Utc>>,
    pub cancellation_requested: bool,
    pub cancellation_reason: Option<String>,
    /// Whether the owner may still start a cancellation today.
    pub cancel_allowed: bool,
}

impl RequestSummary {
    pub fn from_leave(row: &LeaveRequest, today: NaiveDate) -> Self {
        RequestSummary {
            id: row.id,
            request_type: RequestKind::Leave.to_string(),
            category: row.leave_type.clone(),
            employee_id: row.employee_id.clone(),
            employee_name: row.employee_name.clone(),
            department: row.department.clone(),
            position: row.position.clone(),
            schedule: row.schedule(),
            duration: row.duration().to_string(),
            reason: row.reason.clone(),
            status: row.status,
            submission_date: row.submission_date,
            approved_by: row.approved_by.clone(),
            approval_date: row.approval_date,
            cancellation_requested: row.cancellation_requested,
            cancellation_reason: row.cancellation_reason.clone(),
            cancel_allowed: visibility::cancel_button_visible(&row.workflow_state(), today),
        }
    }

    pub fn from_overtime(row: &OvertimeRequest, today: NaiveDate) -> Self {
        RequestSummary {
            id: row.id,
            request_type: RequestKind::Overtime.to_string(),
            category: row.adjustment_type.clone(),
            employee_id: row.employee_id.clone(),
            employee_name: row.employee_name.clone(),
            department: row.department.clone(),
            position: row.position.clone(),
            schedule: row.schedule(),
            duration: row.duration().to_string(),
            reason: row.reason.clone(),
            status: row.status,
            submission_date: row.submission_date,
            approved_by: row.approved_by.clone(),
            approval_date: row.approval_date,
            cancellation_requested: row.cancellation_requested,
            cancellation_reason: row.cancellation_reason.clone(),
            cancel_allowed: visibility::cancel_button_visible(&row.workflow_state(), today),
        }
    }
}
