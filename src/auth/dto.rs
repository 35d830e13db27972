use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::{Identity, Role, User};

/// Request body for signup. Fields are optional so missing ones can be
/// reported as a 400 with a field-level message instead of a decode error.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            role: u.role,
        }
    }
}

impl From<Identity> for PublicUser {
    fn from(i: Identity) -> Self {
        Self {
            id: i.id,
            email: i.email,
            username: i.username,
            role: i.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_serializes_role_as_snake_case() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            email: "owner@example.com".into(),
            username: "owner".into(),
            role: Role::BusinessOwner,
        };
        let json = serde_json::to_string(&user).expect("serialize");
        assert!(json.contains("\"business_owner\""));
        assert!(json.contains("owner@example.com"));
    }
}
