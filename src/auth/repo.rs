use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum Role {
    User,
    BusinessOwner,
    Admin,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: OffsetDateTime,
}

/// The resolved principal of an authenticated request.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
}

impl Identity {
    /// Single authorization policy: a role check passes for that exact role
    /// and always for admin.
    pub fn require_role(&self, role: Role) -> Result<(), crate::error::ApiError> {
        if self.role == role || self.role == Role::Admin {
            Ok(())
        } else {
            Err(crate::error::ApiError::forbidden(match role {
                Role::BusinessOwner => "Business owner access required",
                Role::Admin => "Admin access required",
                Role::User => "User access required",
            }))
        }
    }

    /// Ownership policy shared by the resource handlers: the owning user or
    /// an admin may modify a record.
    pub fn owns_or_admin(&self, owner_id: Uuid) -> bool {
        self.id == owner_id || self.role == Role::Admin
    }
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, role, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(
        db: &PgPool,
        email: &str,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, username, password_hash, role, created_at
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}

/// Server-side session row backing the `session_id` cookie.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// Inserts a session with a fresh opaque id. Expiry is fixed at
    /// creation; nothing ever extends it.
    pub async fn create(db: &PgPool, user_id: Uuid, ttl_days: i64) -> anyhow::Result<Session> {
        let id = Uuid::new_v4();
        let expires_at = OffsetDateTime::now_utc() + Duration::days(ttl_days);
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, expires_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(db)
        .await?;
        Ok(session)
    }

    /// Looks up a session and its owning user, filtering on expiry in SQL so
    /// an expired row never authenticates even before the sweeper removes
    /// it. Absence is `Ok(None)`, never an error.
    pub async fn resolve(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>(
            r#"
            SELECT u.id, u.email, u.username, u.role
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = $1 AND s.expires_at > now()
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(identity)
    }

    /// Deletes one session row. Other sessions of the same user stay valid.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn delete_expired(db: &PgPool) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < now()")
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "user@example.com".into(),
            username: "user".into(),
            role,
        }
    }

    #[test]
    fn role_check_accepts_exact_role() {
        assert!(identity(Role::BusinessOwner)
            .require_role(Role::BusinessOwner)
            .is_ok());
        assert!(identity(Role::User).require_role(Role::User).is_ok());
    }

    #[test]
    fn admin_satisfies_any_role_check() {
        let admin = identity(Role::Admin);
        assert!(admin.require_role(Role::User).is_ok());
        assert!(admin.require_role(Role::BusinessOwner).is_ok());
        assert!(admin.require_role(Role::Admin).is_ok());
    }

    #[test]
    fn role_check_rejects_insufficient_role() {
        assert!(identity(Role::User)
            .require_role(Role::BusinessOwner)
            .is_err());
        assert!(identity(Role::BusinessOwner)
            .require_role(Role::Admin)
            .is_err());
    }

    #[test]
    fn ownership_policy_admits_owner_and_admin_only() {
        let owner_id = Uuid::new_v4();
        let mut owner = identity(Role::BusinessOwner);
        owner.id = owner_id;
        assert!(owner.owns_or_admin(owner_id));
        assert!(!identity(Role::BusinessOwner).owns_or_admin(owner_id));
        assert!(identity(Role::Admin).owns_or_admin(owner_id));
    }

    #[test]
    fn user_serialization_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "user@example.com".into(),
            username: "user".into(),
            password_hash: "argon2-secret".into(),
            role: Role::User,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).expect("serialize");
        assert!(!json.contains("argon2-secret"));
        assert!(json.contains("user@example.com"));
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::BusinessOwner).expect("serialize"),
            "\"business_owner\""
        );
    }
}
