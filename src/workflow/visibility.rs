use chrono::NaiveDate;

use crate::model::request::{RequestKind, RequestStatus};
use crate::model::role::Role;

use super::engine::{Actor, RequestState};

/// Whether the owning employee may still start a cancellation from the
/// request list. Mirrors the cancellation preconditions: terminal and
/// flag-carrying requests are out, approved leave only until its period
/// ends, approved overtime always.
pub fn cancel_button_visible(state: &RequestState, today: NaiveDate) -> bool {
    if state.cancellation_requested {
        return false;
    }
    match state.status {
        RequestStatus::Cancelled | RequestStatus::Rejected => false,
        RequestStatus::Pending => true,
        RequestStatus::Approved => match state.kind {
            RequestKind::Overtime => true,
            RequestKind::Leave => state.period_end.is_some_and(|end| end >= today),
        },
    }
}

/// Which rows an actor's list queries may cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    /// HR: unrestricted.
    All,
    /// Head: a single department.
    Department(String),
    /// Employee: own requests only, by business key.
    Own(String),
}

pub fn list_scope(actor: &Actor) -> ListScope {
    match actor.role {
        Role::Hr => ListScope::All,
        Role::Head => ListScope::Department(actor.department.clone()),
        Role::Employee => ListScope::Own(actor.employee_id.clone()),
    }
}

/// Single-request reads: the owner, a same-department head, or HR.
pub fn can_view(state: &RequestState, actor: &Actor) -> bool {
    match actor.role {
        Role::Hr => true,
        Role::Head => actor.department == state.department,
        Role::Employee => actor.employee_id == state.owner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn state(kind: RequestKind, status: RequestStatus, period_end: Option<NaiveDate>) -> RequestState {
        RequestState {
            kind,
            status,
            cancellation_requested: false,
            owner: "EMP-204".into(),
            department: "Massage".into(),
            period_end,
        }
    }

    #[test]
    fn terminal_requests_never_show_cancel() {
        let today = d("2024-06-01");
        for status in [RequestStatus::Cancelled, RequestStatus::Rejected] {
            assert!(!cancel_button_visible(
                &state(RequestKind::Leave, status, Some(d("2030-01-01"))),
                today
            ));
            assert!(!cancel_button_visible(&state(RequestKind::Overtime, status, None), today));
        }
    }

    #[test]
    fn pending_requests_always_show_cancel() {
        assert!(cancel_button_visible(
            &state(RequestKind::Leave, RequestStatus::Pending, Some(d("2020-01-01"))),
            d("2024-06-01")
        ));
    }

    #[test]
    fn pending_cancellation_hides_the_button() {
        let mut s = state(RequestKind::Overtime, RequestStatus::Approved, None);
        s.cancellation_requested = true;
        assert!(!cancel_button_visible(&s, d("2024-06-01")));
    }

    #[test]
    fn approved_overtime_shows_cancel() {
        assert!(cancel_button_visible(
            &state(RequestKind::Overtime, RequestStatus::Approved, None),
            d("2024-06-01")
        ));
    }

    #[test]
    fn approved_leave_shows_cancel_until_it_ends() {
        let s = state(RequestKind::Leave, RequestStatus::Approved, Some(d("2024-06-10")));
        assert!(cancel_button_visible(&s, d("2024-06-10")));
        assert!(!cancel_button_visible(&s, d("2024-06-11")));
    }

    #[test]
    fn scope_follows_role() {
        let actor = Actor {
            employee_id: "EMP-204".into(),
            name: "Li Wei".into(),
            role: Role::Employee,
            department: "Massage".into(),
        };
        assert_eq!(list_scope(&actor), ListScope::Own("EMP-204".into()));

        let head = Actor { role: Role::Head, ..actor.clone() };
        assert_eq!(list_scope(&head), ListScope::Department("Massage".into()));

        let hr = Actor { role: Role::Hr, ..actor };
        assert_eq!(list_scope(&hr), ListScope::All);
    }

    #[test]
    fn single_reads_allow_owner_department_head_and_hr() {
        let s = state(RequestKind::Leave, RequestStatus::Pending, Some(d("2024-06-10")));
        let owner = Actor {
            employee_id: "EMP-204".into(),
            name: "Li Wei".into(),
            role: Role::Employee,
            department: "Massage".into(),
        };
        let other = Actor { employee_id: "EMP-999".into(), ..owner.clone() };
        let head = Actor { role: Role::Head, ..other.clone() };
        let foreign_head = Actor { department: "Front Desk".into(), ..head.clone() };

        assert!(can_view(&s, &owner));
        assert!(!can_view(&s, &other));
        assert!(can_view(&s, &head));
        assert!(!can_view(&s, &foreign_head));
    }
}
