use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::model::employee::Employee;
use crate::model::role::Role;
use crate::utils::{email_cache, email_filter};
use crate::workflow::error::WorkflowError;
use actix_web::{HttpResponse, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-204")]
    pub employee_id: String,
    #[schema(example = "Li Wei")]
    pub name: String,
    #[schema(example = "li.wei@company.com", format = "email")]
    pub email: String,
    /// Initial password, hashed before storage.
    pub password: String,
    #[schema(example = "Massage")]
    pub department: String,
    pub role: Role,
    #[schema(example = "Therapist")]
    pub position: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    #[schema(example = 1)]
    /// Page number (starts at 1)
    pub page: Option<u32>,
    #[schema(example = 20)]
    /// Items per page
    pub per_page: Option<u32>,
    #[schema(example = "Massage")]
    /// Filter by department
    pub department: Option<String>,
    #[schema(example = "li.wei")]
    /// Search by name, business id or email
    pub search: Option<String>,
    #[schema(example = "date_newest")]
    /// id_asc | id_desc | date_newest | date_oldest
    pub sort: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, pool: &MySqlPool) -> bool {
    let email = email.to_lowercase();

    // Cuckoo filter: a definite miss means the email was never registered.
    if !email_filter::might_exist(&email) {
        return true;
    }

    // Moka cache: fast positive for recently seen emails.
    if email_cache::is_taken(&email).await {
        return false;
    }

    // Database fallback resolves filter false positives.
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE email = ? LIMIT 1)",
    )
    .bind(&email)
    .fetch_one(pool)
    .await
    .unwrap_or(true); // on DB error assume taken; the INSERT stays authoritative

    if exists {
        email_cache::mark_taken(&email).await;
    }

    !exists
}

/// Swagger doc for create_employee endpoint
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployee,
    responses(
        (status = 200, description = "Staff record created", body = Object, example = json!({
            "message": "Employee created",
            "id": 1
        })),
        (status = 400, description = "Missing required field"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR only"),
        (status = 409, description = "Email already registered")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employees"
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr()?;

    for (value, field) in [
        (&payload.employee_id, "employee id"),
        (&payload.name, "name"),
        (&payload.email, "email"),
        (&payload.password, "password"),
        (&payload.department, "department"),
        (&payload.position, "position"),
    ] {
        if value.trim().is_empty() {
            return Err(WorkflowError::Validation(field).into());
        }
    }

    if !is_email_available(&payload.email, pool.get_ref()).await {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Email already registered"
        })));
    }

    let hashed = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO employees
            (employee_id, name, email, password, department, role, position)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.employee_id)
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&hashed)
    .bind(&payload.department)
    .bind(payload.role)
    .bind(&payload.position)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => {
            // Keep the fast duplicate-email path in sync with the roster.
            email_filter::insert(&payload.email);
            email_cache::mark_taken(&payload.email).await;

            info!(employee_id = %payload.employee_id, "Employee created");
            Ok(HttpResponse::Ok().json(json!({
                "message": "Employee created",
                "id": res.last_insert_id()
            })))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                // Unique key on email or employee_id; the filter can miss a
                // row inserted since warmup.
                if db_err.code() == Some("23000".into()) {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Email or employee id already registered"
                    })));
                }
            }
            error!(error = %e, "Failed to create employee");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/// Swagger doc for list_employees endpoint
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated staff roster", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employees"
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(department) = &query.department {
        conditions.push("department = ?");
        bindings.push(department.clone());
    }

    if let Some(search) = &query.search {
        conditions.push("(name LIKE ? OR employee_id LIKE ? OR email LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone());
        bindings.push(like.clone());
        bindings.push(like);
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let order_by = match query.sort.as_deref() {
        Some("id_asc") => "employee_id ASC",
        Some("id_desc") => "employee_id DESC",
        Some("date_oldest") => "created_at ASC",
        _ => "created_at DESC", // date_newest
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);
    debug!(sql = %count_sql, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count employees");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT id, employee_id, name, email, department, role, position, created_at \
         FROM employees {} ORDER BY {} LIMIT ? OFFSET ?",
        where_clause, order_by
    );
    debug!(sql = %data_sql, page, per_page, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch employees");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Swagger doc for get_employee endpoint
#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}",
    params(
        ("id" = u64, Path, description = "Employee row id")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR only"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employees"
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr()?;
    let id = path.into_inner();

    let employee = sqlx::query_as::<_, Employee>(
        r#"
        SELECT id, employee_id, name, email, department, role, position, created_at
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, id, "Failed to fetch employee");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        }))),
    }
}

/// Swagger doc for delete_employee endpoint
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{id}",
    params(
        ("id" = u64, Path, description = "Employee row id")
    ),
    responses(
        (status = 200, description = "Access revoked; request history untouched", body = Object, example = json!({
            "message": "Employee deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR only"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employees"
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr()?;
    let id = path.into_inner();

    // The email is needed afterwards to free the login for reuse.
    let email = sqlx::query_scalar::<_, String>("SELECT email FROM employees WHERE id = ?")
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to fetch employee before delete");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(email) = email else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    // Request rows keep their snapshot; only the login record goes.
    sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete employee");
            ErrorInternalServerError("Internal Server Error")
        })?;

    // Kill any outstanding sessions for the revoked account.
    let _ = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE employee_id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await;

    email_filter::remove(&email);
    email_cache::mark_free(&email).await;

    info!(id, "Employee deleted");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted"
    })))
}
