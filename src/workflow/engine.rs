use chrono::{NaiveDate, NaiveDateTime};

use crate::model::request::{RequestKind, RequestStatus};
use crate::model::role::Role;

use super::duration::{DurationValue, Schedule};
use super::error::WorkflowError;

/// Overtime category whose two dates are an off-day exchange rather than a
/// worked period.
pub const SHIFT_SWAP: &str = "Shift Swap";

/// The acting user, resolved from the session token before any operation.
#[derive(Debug, Clone)]
pub struct Actor {
    pub employee_id: String,
    pub name: String,
    pub role: Role,
    pub department: String,
}

/// The slice of a stored request the state machine needs.
#[derive(Debug, Clone)]
pub struct RequestState {
    pub kind: RequestKind,
    pub status: RequestStatus,
    pub cancellation_requested: bool,
    /// Business key of the submitting employee.
    pub owner: String,
    pub department: String,
    /// End of the leave period; `None` for overtime requests.
    pub period_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Approved,
    Rejected,
}

impl From<Outcome> for RequestStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Approved => RequestStatus::Approved,
            Outcome::Rejected => RequestStatus::Rejected,
        }
    }
}

/// Fields a decision writes back to the store. The approval timestamp is
/// assigned by the store clock at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionWrite {
    pub status: RequestStatus,
    pub approved_by: String,
}

/// Validated overtime submission: the schedule variant plus the hour count
/// derived from it (0 for a shift swap).
#[derive(Debug, Clone, PartialEq)]
pub struct OvertimeSubmission {
    pub schedule: Schedule,
    pub total_hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationEffect {
    /// Pending requests cancel in place, no approval step.
    Immediate,
    /// Approved requests only flag a cancellation for reviewer approval.
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationRuling {
    /// Terminal: the request becomes Cancelled.
    Cancel,
    /// The flag and cancellation fields are cleared; status stays Approved.
    Restore,
}

/// Validates a leave submission and derives its day count.
pub fn submit_leave(
    leave_type: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    reason: &str,
) -> Result<u32, WorkflowError> {
    if leave_type.trim().is_empty() {
        return Err(WorkflowError::Validation("leave type"));
    }
    let start = start.ok_or(WorkflowError::Validation("start date"))?;
    let end = end.ok_or(WorkflowError::Validation("end date"))?;
    if reason.trim().is_empty() {
        return Err(WorkflowError::Validation("reason"));
    }

    match (Schedule::Days { start, end }).duration()? {
        DurationValue::Days(days) => Ok(days),
        _ => Err(WorkflowError::InvalidRange),
    }
}

/// Validates an overtime submission. Shift swaps take the two off-dates in
/// any order and carry no hour measure; every other category is a worked
/// period with an ordered start/end.
pub fn submit_overtime(
    adjustment_type: &str,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    original_off: Option<NaiveDate>,
    new_off: Option<NaiveDate>,
    reason: &str,
) -> Result<OvertimeSubmission, WorkflowError> {
    if adjustment_type.trim().is_empty() {
        return Err(WorkflowError::Validation("adjustment type"));
    }

    let schedule = if adjustment_type == SHIFT_SWAP {
        let original_off = original_off.ok_or(WorkflowError::Validation("original off date"))?;
        let new_off = new_off.ok_or(WorkflowError::Validation("new off date"))?;
        Schedule::Swap { original_off, new_off }
    } else {
        let start = start.ok_or(WorkflowError::Validation("start time"))?;
        let end = end.ok_or(WorkflowError::Validation("end time"))?;
        Schedule::Hours { start, end }
    };
    if reason.trim().is_empty() {
        return Err(WorkflowError::Validation("reason"));
    }

    let total_hours = match schedule.duration()? {
        DurationValue::Hours(hours) => hours,
        DurationValue::Swap => 0.0,
        DurationValue::Days(_) => return Err(WorkflowError::InvalidRange),
    };

    Ok(OvertimeSubmission { schedule, total_hours })
}

/// Approve or reject a pending request.
pub fn decide(
    state: &RequestState,
    outcome: Outcome,
    actor: &Actor,
) -> Result<DecisionWrite, WorkflowError> {
    ensure_reviewer(state, actor)?;
    if state.status != RequestStatus::Pending {
        return Err(WorkflowError::InvalidState(
            "request has already been processed",
        ));
    }
    Ok(DecisionWrite {
        status: outcome.into(),
        approved_by: actor.name.clone(),
    })
}

/// An employee withdrawing their own request. Pending requests cancel
/// immediately; approved ones enter the deferred cancellation-approval
/// cycle. An approved leave whose period already ended cannot be cancelled.
pub fn request_cancellation(
    state: &RequestState,
    reason: &str,
    actor: &Actor,
    today: NaiveDate,
) -> Result<CancellationEffect, WorkflowError> {
    if actor.employee_id != state.owner {
        return Err(WorkflowError::Forbidden(
            "only the submitting employee may cancel this request",
        ));
    }
    if reason.trim().is_empty() {
        return Err(WorkflowError::Validation("cancellation reason"));
    }
    if state.cancellation_requested {
        return Err(WorkflowError::InvalidState(
            "cancellation has already been requested",
        ));
    }

    match state.status {
        RequestStatus::Pending => Ok(CancellationEffect::Immediate),
        RequestStatus::Approved => {
            if state.kind == RequestKind::Leave {
                if let Some(end) = state.period_end {
                    if end < today {
                        return Err(WorkflowError::InvalidState(
                            "the leave period has already ended",
                        ));
                    }
                }
            }
            Ok(CancellationEffect::Deferred)
        }
        RequestStatus::Rejected | RequestStatus::Cancelled => Err(WorkflowError::InvalidState(
            "request can no longer be cancelled",
        )),
    }
}

/// Reviewer ruling on a deferred cancellation.
pub fn decide_cancellation(
    state: &RequestState,
    approve: bool,
    actor: &Actor,
) -> Result<CancellationRuling, WorkflowError> {
    ensure_reviewer(state, actor)?;
    if !state.cancellation_requested {
        return Err(WorkflowError::InvalidState(
            "no cancellation is pending for this request",
        ));
    }
    Ok(if approve {
        CancellationRuling::Cancel
    } else {
        CancellationRuling::Restore
    })
}

/// Heads review only their own department; HR reviews everything.
fn ensure_reviewer(state: &RequestState, actor: &Actor) -> Result<(), WorkflowError> {
    match actor.role {
        Role::Hr => Ok(()),
        Role::Head if actor.department == state.department => Ok(()),
        Role::Head => Err(WorkflowError::Forbidden(
            "request belongs to another department",
        )),
        Role::Employee => Err(WorkflowError::Forbidden("approver role required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    fn head(department: &str) -> Actor {
        Actor {
            employee_id: "EMP-100".into(),
            name: "Mei Ling".into(),
            role: Role::Head,
            department: department.into(),
        }
    }

    fn hr() -> Actor {
        Actor {
            employee_id: "EMP-001".into(),
            name: "Grace Chen".into(),
            role: Role::Hr,
            department: "Admin".into(),
        }
    }

    fn owner() -> Actor {
        Actor {
            employee_id: "EMP-204".into(),
            name: "Li Wei".into(),
            role: Role::Employee,
            department: "Massage".into(),
        }
    }

    fn leave_state(status: RequestStatus) -> RequestState {
        RequestState {
            kind: RequestKind::Leave,
            status,
            cancellation_requested: false,
            owner: "EMP-204".into(),
            department: "Massage".into(),
            period_end: Some(d("2024-06-20")),
        }
    }

    fn overtime_state(status: RequestStatus) -> RequestState {
        RequestState {
            kind: RequestKind::Overtime,
            status,
            cancellation_requested: false,
            owner: "EMP-204".into(),
            department: "Massage".into(),
            period_end: None,
        }
    }

    #[test]
    fn leave_submission_derives_inclusive_days() {
        let days = submit_leave("Annual Leave", Some(d("2024-01-10")), Some(d("2024-01-12")), "family trip").unwrap();
        assert_eq!(days, 3);
    }

    #[test]
    fn leave_submission_is_at_least_one_day() {
        let days = submit_leave("Sick Leave", Some(d("2024-01-10")), Some(d("2024-01-10")), "flu").unwrap();
        assert_eq!(days, 1);
    }

    #[test]
    fn leave_submission_rejects_reversed_range() {
        let err = submit_leave("Annual Leave", Some(d("2024-01-12")), Some(d("2024-01-10")), "trip").unwrap_err();
        assert_eq!(err, WorkflowError::InvalidRange);
    }

    #[test]
    fn leave_submission_requires_every_field() {
        assert_eq!(
            submit_leave("", Some(d("2024-01-10")), Some(d("2024-01-12")), "trip"),
            Err(WorkflowError::Validation("leave type"))
        );
        assert_eq!(
            submit_leave("Annual Leave", None, Some(d("2024-01-12")), "trip"),
            Err(WorkflowError::Validation("start date"))
        );
        assert_eq!(
            submit_leave("Annual Leave", Some(d("2024-01-10")), Some(d("2024-01-12")), "  "),
            Err(WorkflowError::Validation("reason"))
        );
    }

    #[test]
    fn overtime_submission_derives_rounded_hours() {
        let sub = submit_overtime(
            "Overtime",
            Some(dt("2024-01-10T09:00:00")),
            Some(dt("2024-01-10T17:30:00")),
            None,
            None,
            "inventory count",
        )
        .unwrap();
        assert_eq!(sub.total_hours, 8.5);
        assert_eq!(
            sub.schedule,
            Schedule::Hours {
                start: dt("2024-01-10T09:00:00"),
                end: dt("2024-01-10T17:30:00"),
            }
        );
    }

    #[test]
    fn overtime_submission_rejects_reversed_range() {
        let err = submit_overtime(
            "Overtime",
            Some(dt("2024-01-10T17:00:00")),
            Some(dt("2024-01-10T09:00:00")),
            None,
            None,
            "late shift",
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::InvalidRange);
    }

    #[test]
    fn shift_swap_accepts_any_date_order_and_has_no_hours() {
        let sub = submit_overtime(
            SHIFT_SWAP,
            None,
            None,
            Some(d("2024-02-01")),
            Some(d("2024-01-20")),
            "covering a colleague",
        )
        .unwrap();
        assert_eq!(sub.total_hours, 0.0);
        assert_eq!(
            sub.schedule,
            Schedule::Swap {
                original_off: d("2024-02-01"),
                new_off: d("2024-01-20"),
            }
        );
    }

    #[test]
    fn shift_swap_requires_both_off_dates() {
        assert_eq!(
            submit_overtime(SHIFT_SWAP, None, None, Some(d("2024-02-01")), None, "swap"),
            Err(WorkflowError::Validation("new off date"))
        );
    }

    #[test]
    fn head_decides_own_department() {
        let write = decide(&leave_state(RequestStatus::Pending), Outcome::Approved, &head("Massage")).unwrap();
        assert_eq!(write.status, RequestStatus::Approved);
        assert_eq!(write.approved_by, "Mei Ling");
    }

    #[test]
    fn head_cannot_decide_other_department() {
        let err = decide(&leave_state(RequestStatus::Pending), Outcome::Approved, &head("Front Desk")).unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));
    }

    #[test]
    fn employee_cannot_decide() {
        let err = decide(&leave_state(RequestStatus::Pending), Outcome::Rejected, &owner()).unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));
    }

    #[test]
    fn hr_decides_any_department() {
        let write = decide(&leave_state(RequestStatus::Pending), Outcome::Rejected, &hr()).unwrap();
        assert_eq!(write.status, RequestStatus::Rejected);
    }

    #[test]
    fn deciding_twice_is_rejected() {
        let err = decide(&leave_state(RequestStatus::Approved), Outcome::Approved, &hr()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState(_)));
    }

    #[test]
    fn pending_request_cancels_immediately() {
        let effect = request_cancellation(
            &leave_state(RequestStatus::Pending),
            "no longer needed",
            &owner(),
            d("2024-06-01"),
        )
        .unwrap();
        assert_eq!(effect, CancellationEffect::Immediate);
    }

    #[test]
    fn approved_request_defers_cancellation() {
        let effect = request_cancellation(
            &leave_state(RequestStatus::Approved),
            "plans changed",
            &owner(),
            d("2024-06-01"),
        )
        .unwrap();
        assert_eq!(effect, CancellationEffect::Deferred);
    }

    #[test]
    fn elapsed_approved_leave_cannot_be_cancelled() {
        let err = request_cancellation(
            &leave_state(RequestStatus::Approved),
            "plans changed",
            &owner(),
            d("2024-06-21"),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState(_)));
    }

    #[test]
    fn leave_ending_today_can_still_be_cancelled() {
        let effect = request_cancellation(
            &leave_state(RequestStatus::Approved),
            "plans changed",
            &owner(),
            d("2024-06-20"),
        )
        .unwrap();
        assert_eq!(effect, CancellationEffect::Deferred);
    }

    #[test]
    fn approved_overtime_has_no_elapsed_cutoff() {
        let effect = request_cancellation(
            &overtime_state(RequestStatus::Approved),
            "shift covered",
            &owner(),
            d("2030-01-01"),
        )
        .unwrap();
        assert_eq!(effect, CancellationEffect::Deferred);
    }

    #[test]
    fn cancellation_requires_a_reason() {
        let err = request_cancellation(&leave_state(RequestStatus::Pending), " ", &owner(), d("2024-06-01"))
            .unwrap_err();
        assert_eq!(err, WorkflowError::Validation("cancellation reason"));
    }

    #[test]
    fn cancellation_requires_the_owner() {
        let err = request_cancellation(
            &leave_state(RequestStatus::Pending),
            "no longer needed",
            &hr(),
            d("2024-06-01"),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));
    }

    #[test]
    fn double_cancellation_is_rejected() {
        let mut state = leave_state(RequestStatus::Approved);
        state.cancellation_requested = true;
        let err = request_cancellation(&state, "again", &owner(), d("2024-06-01")).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState(_)));
    }

    #[test]
    fn terminal_requests_cannot_be_cancelled() {
        for status in [RequestStatus::Rejected, RequestStatus::Cancelled] {
            let err = request_cancellation(&leave_state(status), "reason", &owner(), d("2024-06-01"))
                .unwrap_err();
            assert!(matches!(err, WorkflowError::InvalidState(_)));
        }
    }

    #[test]
    fn cancellation_ruling_requires_the_flag() {
        let err = decide_cancellation(&leave_state(RequestStatus::Approved), true, &hr()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState(_)));
    }

    #[test]
    fn cancellation_approval_is_terminal() {
        let mut state = leave_state(RequestStatus::Approved);
        state.cancellation_requested = true;
        assert_eq!(decide_cancellation(&state, true, &hr()), Ok(CancellationRuling::Cancel));
    }

    #[test]
    fn cancellation_rejection_restores_the_request() {
        let mut state = overtime_state(RequestStatus::Approved);
        state.cancellation_requested = true;
        assert_eq!(
            decide_cancellation(&state, false, &head("Massage")),
            Ok(CancellationRuling::Restore)
        );
    }

    #[test]
    fn cancellation_ruling_respects_department_scope() {
        let mut state = leave_state(RequestStatus::Approved);
        state.cancellation_requested = true;
        let err = decide_cancellation(&state, true, &head("Front Desk")).unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));
    }
}
