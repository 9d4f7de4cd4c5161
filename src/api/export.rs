use crate::auth::auth::AuthUser;
use crate::model::request::RequestSummary;
use crate::workflow::duration::Schedule;
use crate::workflow::error::WorkflowError;
use actix_web::{HttpResponse, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use super::request::{RequestFilter, build_request_filter, fetch_merged};

/// Which date decides whether a request falls inside the export range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportBasis {
    #[default]
    Start,
    Submitted,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ExportQuery {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    #[param(example = "2026-01-01", format = "date", value_type = String)]
    /// Inclusive range start
    pub start: NaiveDate,
    #[schema(example = "2026-01-31", format = "date", value_type = String)]
    #[param(example = "2026-01-31", format = "date", value_type = String)]
    /// Inclusive range end
    pub end: NaiveDate,
    /// start (default) | submitted
    pub basis: Option<ExportBasis>,
}

pub const REPORT_HEADERS: [&str; 11] = [
    "Start Date",
    "End Date",
    "Employee Name",
    "Employee ID",
    "Department",
    "Type",
    "Category",
    "Duration",
    "Reason",
    "Status",
    "Submitted",
];

/// One spreadsheet line. Serialized field names become the CSV header row
/// and must stay in step with `REPORT_HEADERS`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ReportRow {
    #[serde(rename = "Start Date")]
    pub start_date: String,
    #[serde(rename = "End Date")]
    pub end_date: String,
    #[serde(rename = "Employee Name")]
    pub employee_name: String,
    #[serde(rename = "Employee ID")]
    pub employee_id: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Type")]
    pub request_type: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Duration")]
    pub duration: String,
    #[serde(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Submitted")]
    pub submitted: String,
}

/// Calendar day a request starts on; for a swap that is the off-day given up.
fn start_day(summary: &RequestSummary) -> NaiveDate {
    match summary.schedule {
        Schedule::Days { start, .. } => start,
        Schedule::Hours { start, .. } => start.date(),
        Schedule::Swap { original_off, .. } => original_off,
    }
}

fn schedule_columns(schedule: &Schedule) -> (String, String) {
    match *schedule {
        Schedule::Days { start, end } => (
            start.format("%Y-%m-%d").to_string(),
            end.format("%Y-%m-%d").to_string(),
        ),
        Schedule::Hours { start, end } => (
            start.format("%Y-%m-%d %H:%M").to_string(),
            end.format("%Y-%m-%d %H:%M").to_string(),
        ),
        // Off-date pair in the date columns.
        Schedule::Swap { original_off, new_off } => (
            original_off.format("%Y-%m-%d").to_string(),
            new_off.format("%Y-%m-%d").to_string(),
        ),
    }
}

/// Filters to the inclusive range on the chosen basis and sorts ascending by
/// start date.
pub fn report_rows(
    requests: &[RequestSummary],
    start: NaiveDate,
    end: NaiveDate,
    basis: ExportBasis,
) -> Vec<ReportRow> {
    let mut selected: Vec<&RequestSummary> = requests
        .iter()
        .filter(|summary| {
            let day = match basis {
                ExportBasis::Start => Some(start_day(summary)),
                ExportBasis::Submitted => summary.submission_date.map(|at| at.date_naive()),
            };
            day.is_some_and(|day| day >= start && day <= end)
        })
        .collect();
    selected.sort_by_key(|summary| start_day(summary));

    selected
        .into_iter()
        .map(|summary| {
            let (start_date, end_date) = schedule_columns(&summary.schedule);
            ReportRow {
                start_date,
                end_date,
                employee_name: summary.employee_name.clone(),
                employee_id: summary.employee_id.clone(),
                department: summary.department.clone(),
                request_type: summary.request_type.clone(),
                category: summary.category.clone(),
                duration: summary.duration.clone(),
                reason: summary.reason.clone(),
                status: summary.status.to_string(),
                submitted: summary
                    .submission_date
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
            }
        })
        .collect()
}

/// Swagger doc for export_requests endpoint
#[utoipa::path(
    get,
    path = "/api/v1/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV attachment, one row per request in range", content_type = "text/csv"),
        (status = 400, description = "Missing or reversed date range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Export"
)]
pub async fn export_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ExportQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr()?;
    if query.end < query.start {
        return Err(WorkflowError::InvalidRange.into());
    }

    let actor = auth.actor();
    let (where_sql, args) = build_request_filter(&actor, &RequestFilter::default());
    let merged = fetch_merged(pool.get_ref(), &where_sql, &args)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch requests for export");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let rows = report_rows(
        &merged,
        query.start,
        query.end,
        query.basis.unwrap_or_default(),
    );

    let mut writer = csv::Writer::from_writer(Vec::new());
    if rows.is_empty() {
        // serialize() only emits the header with a first record.
        writer.write_record(REPORT_HEADERS).map_err(|e| {
            error!(error = %e, "Failed to write CSV header");
            ErrorInternalServerError("Internal Server Error")
        })?;
    }
    for row in &rows {
        writer.serialize(row).map_err(|e| {
            error!(error = %e, "Failed to write CSV row");
            ErrorInternalServerError("Internal Server Error")
        })?;
    }
    let bytes = writer.into_inner().map_err(|e| {
        error!(error = %e, "Failed to finish CSV export");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let filename = format!("requests_{}_{}.csv", query.start, query.end);
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::request::RequestStatus;
    use chrono::{DateTime, Utc};

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn leave(id: u64, start: &str, end: &str, days: u32, submitted: &str) -> RequestSummary {
        RequestSummary {
            id,
            request_type: "Leave".into(),
            category: "Annual Leave".into(),
            employee_id: "EMP-204".into(),
            employee_name: "Li Wei".into(),
            department: "Massage".into(),
            position: "Therapist".into(),
            schedule: Schedule::Days {
                start: d(start),
                end: d(end),
            },
            duration: format!("{} days", days),
            reason: "family trip".into(),
            status: RequestStatus::Approved,
            submission_date: Some(at(submitted)),
            approved_by: Some("Grace Chen".into()),
            approval_date: None,
            cancellation_requested: false,
            cancellation_reason: None,
            cancel_allowed: false,
        }
    }

    fn swap(id: u64, original_off: &str, new_off: &str, submitted: &str) -> RequestSummary {
        RequestSummary {
            id,
            request_type: "Overtime".into(),
            category: "Shift Swap".into(),
            employee_id: "EMP-311".into(),
            employee_name: "Ana Souza".into(),
            department: "Front Desk".into(),
            position: "Receptionist".into(),
            schedule: Schedule::Swap {
                original_off: d(original_off),
                new_off: d(new_off),
            },
            duration: "Swap".into(),
            reason: "covering a colleague".into(),
            status: RequestStatus::Pending,
            submission_date: Some(at(submitted)),
            approved_by: None,
            approval_date: None,
            cancellation_requested: false,
            cancellation_reason: None,
            cancel_allowed: true,
        }
    }

    #[test]
    fn rows_outside_the_range_are_dropped() {
        let requests = vec![
            leave(1, "2024-01-10", "2024-01-12", 3, "2024-01-02T08:00:00Z"),
            leave(2, "2024-03-01", "2024-03-02", 2, "2024-02-20T08:00:00Z"),
        ];
        let rows = report_rows(&requests, d("2024-01-01"), d("2024-01-31"), ExportBasis::Start);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].start_date, "2024-01-10");
    }

    #[test]
    fn range_endpoints_are_inclusive() {
        let requests = vec![
            leave(1, "2024-01-01", "2024-01-02", 2, "2023-12-20T08:00:00Z"),
            leave(2, "2024-01-31", "2024-02-01", 2, "2024-01-25T08:00:00Z"),
        ];
        let rows = report_rows(&requests, d("2024-01-01"), d("2024-01-31"), ExportBasis::Start);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn rows_sort_ascending_by_start_date() {
        let requests = vec![
            leave(1, "2024-01-20", "2024-01-21", 2, "2024-01-02T08:00:00Z"),
            leave(2, "2024-01-05", "2024-01-06", 2, "2024-01-03T08:00:00Z"),
        ];
        let rows = report_rows(&requests, d("2024-01-01"), d("2024-01-31"), ExportBasis::Start);
        assert_eq!(rows[0].start_date, "2024-01-05");
        assert_eq!(rows[1].start_date, "2024-01-20");
    }

    #[test]
    fn submitted_basis_filters_on_submission_date() {
        let requests = vec![leave(1, "2024-03-10", "2024-03-12", 3, "2024-01-15T08:00:00Z")];

        let by_start = report_rows(&requests, d("2024-01-01"), d("2024-01-31"), ExportBasis::Start);
        assert!(by_start.is_empty());

        let by_submitted =
            report_rows(&requests, d("2024-01-01"), d("2024-01-31"), ExportBasis::Submitted);
        assert_eq!(by_submitted.len(), 1);
    }

    #[test]
    fn swap_rows_carry_the_off_dates() {
        let requests = vec![swap(1, "2024-02-01", "2024-01-20", "2024-01-10T08:00:00Z")];
        let rows = report_rows(&requests, d("2024-01-01"), d("2024-02-28"), ExportBasis::Start);
        assert_eq!(rows[0].start_date, "2024-02-01");
        assert_eq!(rows[0].end_date, "2024-01-20");
        assert_eq!(rows[0].duration, "Swap");
    }

    #[test]
    fn leave_row_columns() {
        let requests = vec![leave(1, "2024-01-10", "2024-01-12", 3, "2024-01-02T08:15:00Z")];
        let rows = report_rows(&requests, d("2024-01-01"), d("2024-01-31"), ExportBasis::Start);
        let row = &rows[0];
        assert_eq!(row.end_date, "2024-01-12");
        assert_eq!(row.employee_name, "Li Wei");
        assert_eq!(row.employee_id, "EMP-204");
        assert_eq!(row.department, "Massage");
        assert_eq!(row.request_type, "Leave");
        assert_eq!(row.category, "Annual Leave");
        assert_eq!(row.duration, "3 days");
        assert_eq!(row.status, "Approved");
        assert_eq!(row.submitted, "2024-01-02 08:15");
    }
}
