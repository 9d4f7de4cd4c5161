use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_id": "EMP-204",
        "name": "Li Wei",
        "email": "li.wei@company.com",
        "department": "Massage",
        "role": "Employee",
        "position": "Therapist",
        "created_at": "2024-01-01T00:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    /// HR-assigned business key, distinct from the row id.
    #[schema(example = "EMP-204")]
    pub employee_id: String,

    #[schema(example = "Li Wei")]
    pub name: String,

    #[schema(example = "li.wei@company.com")]
    pub email: String,

    #[schema(example = "Massage")]
    pub department: String,

    pub role: Role,

    #[schema(example = "Therapist")]
    pub position: String,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}
