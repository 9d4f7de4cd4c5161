use crate::auth::auth::AuthUser;
use crate::model::request::{
    LeaveRequest, OvertimeRequest, RequestKind, RequestStatus, RequestSummary,
};
use crate::model::role::Role;
use crate::workflow::duration::Schedule;
use crate::workflow::engine::{self, CancellationEffect, CancellationRuling, Outcome};
use crate::workflow::error::WorkflowError;
use crate::workflow::visibility::{self, ListScope};
use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateLeave {
    #[schema(example = "Annual Leave")]
    pub leave_type: String,
    #[schema(example = "2026-01-10", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-01-12", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = "family trip")]
    pub reason: String,
}

impl Default for CreateLeave {
    fn default() -> Self {
        CreateLeave {
            leave_type: String::new(),
            start_date: None,
            end_date: None,
            reason: String::new(),
        }
    }
}

/// Shift swaps fill the off-date pair instead of the start/end times.
#[derive(Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateOvertime {
    #[schema(example = "Overtime")]
    pub adjustment_type: String,
    #[schema(example = "2026-01-10T09:00:00", format = "date-time", value_type = Option<String>)]
    pub start_date: Option<NaiveDateTime>,
    #[schema(example = "2026-01-10T17:30:00", format = "date-time", value_type = Option<String>)]
    pub end_date: Option<NaiveDateTime>,
    #[schema(example = "2026-02-01", format = "date", value_type = Option<String>)]
    pub original_off_date: Option<NaiveDate>,
    #[schema(example = "2026-01-20", format = "date", value_type = Option<String>)]
    pub new_off_date: Option<NaiveDate>,
    #[schema(example = "inventory count")]
    pub reason: String,
}

impl Default for CreateOvertime {
    fn default() -> Self {
        CreateOvertime {
            adjustment_type: String::new(),
            start_date: None,
            end_date: None,
            original_off_date: None,
            new_off_date: None,
            reason: String::new(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(default)]
pub struct CancelRequest {
    #[schema(example = "no longer needed")]
    pub reason: String,
}

impl Default for CancelRequest {
    fn default() -> Self {
        CancelRequest { reason: String::new() }
    }
}

#[derive(Default, Deserialize, IntoParams, ToSchema)]
pub struct RequestFilter {
    #[schema(example = "EMP-204")]
    /// Filter by the submitting employee's business key
    pub employee_id: Option<String>,
    #[schema(example = "Pending")]
    /// Filter by request status
    pub status: Option<RequestStatus>,
    #[schema(example = "Massage")]
    /// Filter by department (effective for HR only)
    pub department: Option<String>,
    /// Only requests with a pending cancellation
    pub cancellation_requested: Option<bool>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct RequestListResponse {
    pub data: Vec<RequestSummary>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
#[derive(Debug, PartialEq)]
pub(crate) enum FilterValue {
    Str(String),
    Bool(bool),
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Role scope first, then the caller's filters where the scope leaves room.
pub(crate) fn build_request_filter(
    actor: &engine::Actor,
    query: &RequestFilter,
) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    let scope = visibility::list_scope(actor);
    match &scope {
        ListScope::Own(employee_id) => {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::Str(employee_id.clone()));
        }
        ListScope::Department(department) => {
            where_sql.push_str(" AND department = ?");
            args.push(FilterValue::Str(department.clone()));
        }
        ListScope::All => {}
    }

    if !matches!(scope, ListScope::Own(_)) {
        if let Some(employee_id) = &query.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::Str(employee_id.clone()));
        }
    }

    if matches!(scope, ListScope::All) {
        if let Some(department) = &query.department {
            where_sql.push_str(" AND department = ?");
            args.push(FilterValue::Str(department.clone()));
        }
    }

    if let Some(status) = query.status {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }

    if let Some(flag) = query.cancellation_requested {
        where_sql.push_str(" AND cancellation_requested = ?");
        args.push(FilterValue::Bool(flag));
    }

    (where_sql, args)
}

/* =========================
Submit requests
========================= */
/// Swagger doc for submit_leave endpoint
#[utoipa::path(
    post,
    path = "/api/v1/requests/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave request submitted",
            "id": 1,
            "status": "Pending"
        })),
        (status = 400, description = "Missing field or invalid date range"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn submit_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<HttpResponse> {
    let total_days = engine::submit_leave(
        &payload.leave_type,
        payload.start_date,
        payload.end_date,
        &payload.reason,
    )?;

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, employee_name, department, position,
             leave_type, start_date, end_date, total_days, reason)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&auth.employee_id)
    .bind(&auth.name)
    .bind(&auth.department)
    .bind(&auth.position)
    .bind(&payload.leave_type)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(total_days)
    .bind(&payload.reason)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id = %auth.employee_id, "Failed to create leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request submitted",
        "id": result.last_insert_id(),
        "status": RequestStatus::Pending
    })))
}

/// Swagger doc for submit_overtime endpoint
#[utoipa::path(
    post,
    path = "/api/v1/requests/overtime",
    request_body(
        content = CreateOvertime,
        description = "Overtime or shift-swap request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Request submitted", body = Object, example = json!({
            "message": "Overtime request submitted",
            "id": 1,
            "status": "Pending"
        })),
        (status = 400, description = "Missing field or invalid time range"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn submit_overtime(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateOvertime>,
) -> actix_web::Result<HttpResponse> {
    let submission = engine::submit_overtime(
        &payload.adjustment_type,
        payload.start_date,
        payload.end_date,
        payload.original_off_date,
        payload.new_off_date,
        &payload.reason,
    )?;

    let (start_at, end_at) = match submission.schedule {
        Schedule::Hours { start, end } => (start, end),
        Schedule::Swap { original_off, new_off } => (
            original_off.and_time(NaiveTime::MIN),
            new_off.and_time(NaiveTime::MIN),
        ),
        Schedule::Days { start, end } => (
            start.and_time(NaiveTime::MIN),
            end.and_time(NaiveTime::MIN),
        ),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO overtime_requests
            (employee_id, employee_name, department, position,
             adjustment_type, start_date, end_date, total_hours, reason)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&auth.employee_id)
    .bind(&auth.name)
    .bind(&auth.department)
    .bind(&auth.position)
    .bind(&payload.adjustment_type)
    .bind(start_at)
    .bind(end_at)
    .bind(submission.total_hours)
    .bind(&payload.reason)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id = %auth.employee_id, "Failed to create overtime request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Overtime request submitted",
        "id": result.last_insert_id(),
        "status": RequestStatus::Pending
    })))
}

/* =========================
List / read requests
========================= */
/// Swagger doc for list_leave endpoint
#[utoipa::path(
    get,
    path = "/api/v1/requests/leave",
    params(RequestFilter),
    responses(
        (status = 200, description = "Paginated leave request list", body = RequestListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn list_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RequestFilter>,
) -> actix_web::Result<HttpResponse> {
    list_requests(RequestKind::Leave, auth, pool, query).await
}

/// Swagger doc for list_overtime endpoint
#[utoipa::path(
    get,
    path = "/api/v1/requests/overtime",
    params(RequestFilter),
    responses(
        (status = 200, description = "Paginated overtime request list", body = RequestListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn list_overtime(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RequestFilter>,
) -> actix_web::Result<HttpResponse> {
    list_requests(RequestKind::Overtime, auth, pool, query).await
}

async fn list_requests(
    kind: RequestKind,
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RequestFilter>,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor();

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let (where_sql, args) = build_request_filter(&actor, &query);

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM {}{}", kind.collection(), where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::Str(s) => count_q.bind(s.clone()),
            FilterValue::Bool(b) => count_q.bind(*b),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, collection = kind.collection(), "Failed to count requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "SELECT * FROM {}{} ORDER BY submission_date DESC LIMIT ? OFFSET ?",
        kind.collection(),
        where_sql
    );

    let today = today();
    let data: Vec<RequestSummary> = match kind {
        RequestKind::Leave => {
            let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
            for arg in &args {
                data_q = match arg {
                    FilterValue::Str(s) => data_q.bind(s.clone()),
                    FilterValue::Bool(b) => data_q.bind(*b),
                };
            }
            data_q
                .bind(per_page)
                .bind(offset)
                .fetch_all(pool.get_ref())
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to fetch leave requests");
                    actix_web::error::ErrorInternalServerError("Internal Server Error")
                })?
                .iter()
                .map(|row| RequestSummary::from_leave(row, today))
                .collect()
        }
        RequestKind::Overtime => {
            let mut data_q = sqlx::query_as::<_, OvertimeRequest>(&data_sql);
            for arg in &args {
                data_q = match arg {
                    FilterValue::Str(s) => data_q.bind(s.clone()),
                    FilterValue::Bool(b) => data_q.bind(*b),
                };
            }
            data_q
                .bind(per_page)
                .bind(offset)
                .fetch_all(pool.get_ref())
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to fetch overtime requests");
                    actix_web::error::ErrorInternalServerError("Internal Server Error")
                })?
                .iter()
                .map(|row| RequestSummary::from_overtime(row, today))
                .collect()
        }
    };

    Ok(HttpResponse::Ok().json(RequestListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Both collections read concurrently and merged, newest submission first.
pub(crate) async fn fetch_merged(
    pool: &MySqlPool,
    where_sql: &str,
    args: &[FilterValue],
) -> Result<Vec<RequestSummary>, sqlx::Error> {
    let leave_sql = format!("SELECT * FROM leave_requests{}", where_sql);
    let overtime_sql = format!("SELECT * FROM overtime_requests{}", where_sql);

    let mut leave_q = sqlx::query_as::<_, LeaveRequest>(&leave_sql);
    let mut overtime_q = sqlx::query_as::<_, OvertimeRequest>(&overtime_sql);
    for arg in args {
        match arg {
            FilterValue::Str(s) => {
                leave_q = leave_q.bind(s.clone());
                overtime_q = overtime_q.bind(s.clone());
            }
            FilterValue::Bool(b) => {
                leave_q = leave_q.bind(*b);
                overtime_q = overtime_q.bind(*b);
            }
        }
    }

    let (leave_rows, overtime_rows) =
        futures::try_join!(leave_q.fetch_all(pool), overtime_q.fetch_all(pool))?;

    let today = today();
    let mut merged: Vec<RequestSummary> = leave_rows
        .iter()
        .map(|row| RequestSummary::from_leave(row, today))
        .chain(
            overtime_rows
                .iter()
                .map(|row| RequestSummary::from_overtime(row, today)),
        )
        .collect();
    merged.sort_by(|a, b| b.submission_date.cmp(&a.submission_date));

    Ok(merged)
}

/// Swagger doc for request_overview endpoint
#[utoipa::path(
    get,
    path = "/api/v1/requests",
    responses(
        (status = 200, description = "Leave and overtime requests merged, newest first; scoped to the caller's role", body = [RequestSummary]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn request_overview(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor();
    let (where_sql, args) = build_request_filter(&actor, &RequestFilter::default());

    let merged = fetch_merged(pool.get_ref(), &where_sql, &args)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch request overview");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(merged))
}

/// Swagger doc for cancellation_queue endpoint
#[utoipa::path(
    get,
    path = "/api/v1/requests/cancellations",
    responses(
        (status = 200, description = "Requests awaiting a cancellation ruling", body = [RequestSummary]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn cancellation_queue(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor();
    if actor.role == Role::Employee {
        return Err(WorkflowError::Forbidden("approver role required").into());
    }

    let filter = RequestFilter {
        cancellation_requested: Some(true),
        ..RequestFilter::default()
    };
    let (where_sql, args) = build_request_filter(&actor, &filter);

    let merged = fetch_merged(pool.get_ref(), &where_sql, &args)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch cancellation queue");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(merged))
}

enum AnyRequest {
    Leave(LeaveRequest),
    Overtime(OvertimeRequest),
}

impl AnyRequest {
    fn state(&self) -> engine::RequestState {
        match self {
            AnyRequest::Leave(row) => row.workflow_state(),
            AnyRequest::Overtime(row) => row.workflow_state(),
        }
    }

    fn summary(&self, today: NaiveDate) -> RequestSummary {
        match self {
            AnyRequest::Leave(row) => RequestSummary::from_leave(row, today),
            AnyRequest::Overtime(row) => RequestSummary::from_overtime(row, today),
        }
    }
}

async fn load_request(
    pool: &MySqlPool,
    kind: RequestKind,
    id: u64,
) -> actix_web::Result<AnyRequest> {
    let sql = format!("SELECT * FROM {} WHERE id = ?", kind.collection());

    let found = match kind {
        RequestKind::Leave => sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, id, "Failed to fetch leave request");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?
            .map(AnyRequest::Leave),
        RequestKind::Overtime => sqlx::query_as::<_, OvertimeRequest>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, id, "Failed to fetch overtime request");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?
            .map(AnyRequest::Overtime),
    };

    found.ok_or_else(|| WorkflowError::NotFound.into())
}

/// Swagger doc for get_request endpoint
#[utoipa::path(
    get,
    path = "/api/v1/requests/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "leave or overtime"),
        ("id" = u64, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Request found", body = RequestSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn get_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(RequestKind, u64)>,
) -> actix_web::Result<HttpResponse> {
    let (kind, id) = path.into_inner();
    let actor = auth.actor();

    let request = load_request(pool.get_ref(), kind, id).await?;
    if !visibility::can_view(&request.state(), &actor) {
        return Err(WorkflowError::Forbidden("not allowed to view this request").into());
    }

    Ok(HttpResponse::Ok().json(request.summary(today())))
}

/* =========================
Decide requests (Head/HR)
========================= */
/// Swagger doc for approve_request endpoint
#[utoipa::path(
    put,
    path = "/api/v1/requests/{kind}/{id}/approve",
    params(
        ("kind" = String, Path, description = "leave or overtime"),
        ("id" = u64, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Request approved", body = Object, example = json!({
            "message": "Request approved"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn approve_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(RequestKind, u64)>,
) -> actix_web::Result<HttpResponse> {
    decide_request(auth, pool, path.into_inner(), Outcome::Approved).await
}

/// Swagger doc for reject_request endpoint
#[utoipa::path(
    put,
    path = "/api/v1/requests/{kind}/{id}/reject",
    params(
        ("kind" = String, Path, description = "leave or overtime"),
        ("id" = u64, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Request rejected", body = Object, example = json!({
            "message": "Request rejected"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn reject_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(RequestKind, u64)>,
) -> actix_web::Result<HttpResponse> {
    decide_request(auth, pool, path.into_inner(), Outcome::Rejected).await
}

async fn decide_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    (kind, id): (RequestKind, u64),
    outcome: Outcome,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor();
    let request = load_request(pool.get_ref(), kind, id).await?;

    let write = engine::decide(&request.state(), outcome, &actor)?;

    let sql = format!(
        "UPDATE {} SET status = ?, approved_by = ?, approval_date = NOW() \
         WHERE id = ? AND status = 'Pending'",
        kind.collection()
    );

    let result = sqlx::query(&sql)
        .bind(write.status)
        .bind(&write.approved_by)
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, id, "Failed to update request status");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        // Lost the race to another reviewer between read and write.
        return Err(WorkflowError::InvalidState("request has already been processed").into());
    }

    let message = match outcome {
        Outcome::Approved => "Request approved",
        Outcome::Rejected => "Request rejected",
    };
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": message })))
}

/* =========================
Cancellation cycle
========================= */
/// Swagger doc for cancel_request endpoint
#[utoipa::path(
    post,
    path = "/api/v1/requests/{kind}/{id}/cancel",
    params(
        ("kind" = String, Path, description = "leave or overtime"),
        ("id" = u64, Path, description = "Request id")
    ),
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Cancelled or queued for cancellation approval", body = Object, example = json!({
            "message": "Request cancelled"
        })),
        (status = 400, description = "Missing cancellation reason"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request can no longer be cancelled")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn cancel_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(RequestKind, u64)>,
    body: web::Json<CancelRequest>,
) -> actix_web::Result<HttpResponse> {
    let (kind, id) = path.into_inner();
    let actor = auth.actor();
    let request = load_request(pool.get_ref(), kind, id).await?;

    let effect = engine::request_cancellation(&request.state(), &body.reason, &actor, today())?;

    let (sql, message) = match effect {
        CancellationEffect::Immediate => (
            format!(
                "UPDATE {} SET status = 'Cancelled', cancellation_reason = ?, cancellation_date = NOW() \
                 WHERE id = ? AND status = 'Pending' AND cancellation_requested = FALSE",
                kind.collection()
            ),
            "Request cancelled",
        ),
        CancellationEffect::Deferred => (
            format!(
                "UPDATE {} SET cancellation_requested = TRUE, cancellation_reason = ?, cancellation_date = NOW() \
                 WHERE id = ? AND status = 'Approved' AND cancellation_requested = FALSE",
                kind.collection()
            ),
            "Cancellation submitted for approval",
        ),
    };

    let result = sqlx::query(&sql)
        .bind(&body.reason)
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, id, "Failed to cancel request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Err(WorkflowError::InvalidState("request can no longer be cancelled").into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": message })))
}

/// Swagger doc for approve_cancellation endpoint
#[utoipa::path(
    put,
    path = "/api/v1/requests/{kind}/{id}/cancellation/approve",
    params(
        ("kind" = String, Path, description = "leave or overtime"),
        ("id" = u64, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Cancellation approved", body = Object, example = json!({
            "message": "Cancellation approved"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "No cancellation pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn approve_cancellation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(RequestKind, u64)>,
) -> actix_web::Result<HttpResponse> {
    rule_cancellation(auth, pool, path.into_inner(), true).await
}

/// Swagger doc for reject_cancellation endpoint
#[utoipa::path(
    put,
    path = "/api/v1/requests/{kind}/{id}/cancellation/reject",
    params(
        ("kind" = String, Path, description = "leave or overtime"),
        ("id" = u64, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Cancellation rejected, request restored", body = Object, example = json!({
            "message": "Cancellation rejected"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "No cancellation pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn reject_cancellation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(RequestKind, u64)>,
) -> actix_web::Result<HttpResponse> {
    rule_cancellation(auth, pool, path.into_inner(), false).await
}

async fn rule_cancellation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    (kind, id): (RequestKind, u64),
    approve: bool,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor();
    let request = load_request(pool.get_ref(), kind, id).await?;

    let ruling = engine::decide_cancellation(&request.state(), approve, &actor)?;

    let (sql, message) = match ruling {
        CancellationRuling::Cancel => (
            format!(
                "UPDATE {} SET status = 'Cancelled', cancellation_requested = FALSE, \
                 cancellation_approved = TRUE, cancellation_approval_date = NOW() \
                 WHERE id = ? AND cancellation_requested = TRUE",
                kind.collection()
            ),
            "Cancellation approved",
        ),
        CancellationRuling::Restore => (
            format!(
                "UPDATE {} SET cancellation_requested = FALSE, cancellation_reason = NULL, \
                 cancellation_date = NULL WHERE id = ? AND cancellation_requested = TRUE",
                kind.collection()
            ),
            "Cancellation rejected",
        ),
    };

    let result = sqlx::query(&sql)
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, id, "Failed to rule on cancellation");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Err(WorkflowError::InvalidState("no cancellation is pending for this request").into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": message })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> engine::Actor {
        engine::Actor {
            employee_id: "EMP-204".into(),
            name: "Li Wei".into(),
            role,
            department: "Massage".into(),
        }
    }

    #[test]
    fn employee_queries_are_pinned_to_their_own_requests() {
        let query = RequestFilter {
            // An employee cannot widen the scope to someone else's rows.
            employee_id: Some("EMP-999".into()),
            department: Some("Front Desk".into()),
            ..RequestFilter::default()
        };
        let (sql, args) = build_request_filter(&actor(Role::Employee), &query);
        assert_eq!(sql, " WHERE 1=1 AND employee_id = ?");
        assert_eq!(args, vec![FilterValue::Str("EMP-204".into())]);
    }

    #[test]
    fn head_queries_are_pinned_to_their_department() {
        let query = RequestFilter {
            department: Some("Front Desk".into()),
            ..RequestFilter::default()
        };
        let (sql, args) = build_request_filter(&actor(Role::Head), &query);
        assert_eq!(sql, " WHERE 1=1 AND department = ?");
        assert_eq!(args, vec![FilterValue::Str("Massage".into())]);
    }

    #[test]
    fn head_may_narrow_to_one_employee() {
        let query = RequestFilter {
            employee_id: Some("EMP-311".into()),
            ..RequestFilter::default()
        };
        let (sql, args) = build_request_filter(&actor(Role::Head), &query);
        assert_eq!(sql, " WHERE 1=1 AND department = ? AND employee_id = ?");
        assert_eq!(
            args,
            vec![
                FilterValue::Str("Massage".into()),
                FilterValue::Str("EMP-311".into())
            ]
        );
    }

    #[test]
    fn hr_queries_are_unrestricted() {
        let (sql, args) = build_request_filter(&actor(Role::Hr), &RequestFilter::default());
        assert_eq!(sql, " WHERE 1=1");
        assert!(args.is_empty());
    }

    #[test]
    fn hr_may_filter_by_department_status_and_flag() {
        let query = RequestFilter {
            department: Some("Front Desk".into()),
            status: Some(RequestStatus::Pending),
            cancellation_requested: Some(true),
            ..RequestFilter::default()
        };
        let (sql, args) = build_request_filter(&actor(Role::Hr), &query);
        assert_eq!(
            sql,
            " WHERE 1=1 AND department = ? AND status = ? AND cancellation_requested = ?"
        );
        assert_eq!(
            args,
            vec![
                FilterValue::Str("Front Desk".into()),
                FilterValue::Str("Pending".into()),
                FilterValue::Bool(true)
            ]
        );
    }
}
