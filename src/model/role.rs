use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
pub enum Role {
    #[serde(rename = "HR")]
    #[strum(serialize = "HR")]
    #[sqlx(rename = "HR")]
    Hr,
    Head,
    Employee,
}

impl Role {
    pub fn id(&self) -> u8 {
        match self {
            Role::Hr => 1,
            Role::Head => 2,
            Role::Employee => 3,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Hr),
            2 => Some(Role::Head),
            3 => Some(Role::Employee),
            _ => None,
        }
    }
}
