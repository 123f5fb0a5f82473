//! Profile directory backed by the `profiles` table

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::user::{Role, UserDirectory, UserProfile};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_profile(row: &PgRow) -> Result<UserProfile, DomainError> {
    let role: String = row.get("role");

    Ok(UserProfile {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        role: role.parse()?,
    })
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DomainError> {
        let row = sqlx::query("SELECT id, name, email, role FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get profile: {}", e)))?;

        row.as_ref().map(row_to_profile).transpose()
    }

    async fn find_by_roles(&self, roles: &[Role]) -> Result<Vec<UserProfile>, DomainError> {
        let roles: Vec<&str> = roles.iter().map(Role::as_str).collect();

        let rows = sqlx::query(
            "SELECT id, name, email, role FROM profiles WHERE role = ANY($1) ORDER BY id",
        )
        .bind(&roles)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list profiles: {}", e)))?;

        rows.iter().map(row_to_profile).collect()
    }
}
