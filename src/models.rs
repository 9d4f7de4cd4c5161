use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::model::role::Role;

#[derive(Deserialize)]
pub struct LoginReqDto {
    pub email: String,
    pub password: String,
}

/// Login row; the only place the password hash is read.
#[derive(FromRow)]
pub struct EmployeeCredential {
    pub id: u64,
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: String,
    pub role: Role,
    pub position: String,
}

impl EmployeeCredential {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role.id(),
            department: self.department.clone(),
            position: self.position.clone(),
            employee_id: self.employee_id.clone(),
        }
    }
}

/// What goes into a token: the employee snapshot the workflow needs to
/// resolve the actor without another roster read.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: u64,
    pub email: String,
    pub name: String,
    pub role: u8, // role id
    pub department: String,
    pub position: String,
    pub employee_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String, // login email
    pub name: String,
    pub role: u8, // role id
    pub department: String,
    pub position: String,
    /// Business key of the employee record.
    pub employee_id: String,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            email: self.sub.clone(),
            name: self.name.clone(),
            role: self.role,
            department: self.department.clone(),
            position: self.position.clone(),
            employee_id: self.employee_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
