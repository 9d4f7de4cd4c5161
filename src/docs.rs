use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery};
use crate::api::export::{ExportBasis, ExportQuery};
use crate::api::request::{
    CancelRequest, CreateLeave, CreateOvertime, RequestFilter, RequestListResponse,
};
use crate::model::employee::Employee;
use crate::model::request::{RequestKind, RequestStatus, RequestSummary};
use crate::model::role::Role;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staff Request Portal API",
        version = "1.0.0",
        description = r#"
## Staff Request Portal

This API powers a staff request portal for a small business.

### 🔹 Key Features
- **Request Lifecycle**
  - Submit leave, overtime and shift-swap requests
  - Department heads and HR approve or reject pending requests
  - Immediate cancellation while pending, reviewed cancellation once approved
- **Staff Roster**
  - HR creates, lists and removes employee accounts
- **Reporting**
  - Date-ranged CSV export of all requests

### 🔐 Security
All endpoints outside `/auth` require **JWT Bearer authentication**.
Heads act only within their own department; roster and export are **HR** only.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::request::submit_leave,
        crate::api::request::submit_overtime,
        crate::api::request::list_leave,
        crate::api::request::list_overtime,
        crate::api::request::request_overview,
        crate::api::request::cancellation_queue,
        crate::api::request::get_request,
        crate::api::request::approve_request,
        crate::api::request::reject_request,
        crate::api::request::cancel_request,
        crate::api::request::approve_cancellation,
        crate::api::request::reject_cancellation,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::delete_employee,

        crate::api::export::export_requests
    ),
    components(
        schemas(
            CreateLeave,
            CreateOvertime,
            CancelRequest,
            RequestFilter,
            RequestListResponse,
            RequestSummary,
            RequestStatus,
            RequestKind,
            CreateEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            Employee,
            Role,
            ExportQuery,
            ExportBasis
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Requests", description = "Request lifecycle APIs"),
        (name = "Employees", description = "Staff roster APIs (HR)"),
        (name = "Export", description = "CSV reporting APIs (HR)"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
