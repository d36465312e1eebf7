//! Users and committees.

use super::{directory_error, from_json, parse_id, to_json};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docflow_core::{CommitteeId, RoleId, UserId};
use docflow_directory::{Committee, Directory, DirectoryAdmin, DirectoryError, RoleSet, User};
use sqlx::{FromRow, PgPool};

/// Row type for user queries.
#[derive(FromRow)]
struct UserRow {
    id: String,
    display_name: String,
    email: Option<String>,
    roles: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, sqlx::Error> {
        let id: UserId = parse_id("user id", &self.id)?;
        let roles: RoleSet = from_json("roles", &self.id, self.roles)?;
        Ok(User::with_all_fields(
            id,
            self.display_name,
            self.email,
            roles,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// Row type for committee queries.
#[derive(FromRow)]
struct CommitteeRow {
    id: String,
    name: String,
    members: serde_json::Value,
    chairperson: String,
    created_at: DateTime<Utc>,
}

impl CommitteeRow {
    fn try_into_committee(self) -> Result<Committee, sqlx::Error> {
        Ok(Committee {
            id: parse_id("committee id", &self.id)?,
            name: self.name,
            members: from_json("committee members", &self.id, self.members)?,
            chairperson: parse_id("chairperson id", &self.chairperson)?,
            created_at: self.created_at,
        })
    }
}

/// Directory backed by the `users` and `committees` tables.
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    /// Creates a new directory.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn users_with_role(&self, role: RoleId) -> Result<Vec<User>, sqlx::Error> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT id, display_name, email, roles, created_at, updated_at
            FROM users
            WHERE roles @> $1
            ORDER BY created_at, id
            "#,
        )
        .bind(serde_json::json!([role.to_string()]))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserRow::try_into_user).collect()
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, display_name, email, roles, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::try_into_user).transpose()
    }

    async fn committee_by_id(&self, id: CommitteeId) -> Result<Option<Committee>, sqlx::Error> {
        let row: Option<CommitteeRow> = sqlx::query_as(
            r#"
            SELECT id, name, members, chairperson, created_at
            FROM committees
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CommitteeRow::try_into_committee).transpose()
    }

    async fn upsert_user(&self, user: &User) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, display_name, email, roles, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET display_name = $2, email = $3, roles = $4, updated_at = $6
            "#,
        )
        .bind(user.id().to_string())
        .bind(user.display_name())
        .bind(user.email())
        .bind(to_json(user.roles())?)
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_committee(&self, committee: &Committee) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO committees (id, name, members, chairperson, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = $2, members = $3, chairperson = $4
            "#,
        )
        .bind(committee.id.to_string())
        .bind(&committee.name)
        .bind(to_json(&committee.members)?)
        .bind(committee.chairperson.to_string())
        .bind(committee.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn find_users_by_role(&self, role: RoleId) -> Result<Vec<User>, DirectoryError> {
        self.users_with_role(role).await.map_err(directory_error)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, DirectoryError> {
        self.user_by_id(id).await.map_err(directory_error)
    }

    async fn find_committee(&self, id: CommitteeId) -> Result<Option<Committee>, DirectoryError> {
        self.committee_by_id(id).await.map_err(directory_error)
    }
}

#[async_trait]
impl DirectoryAdmin for PgDirectory {
    async fn save_user(&self, user: &User) -> Result<(), DirectoryError> {
        self.upsert_user(user).await.map_err(directory_error)
    }

    async fn save_committee(&self, committee: &Committee) -> Result<(), DirectoryError> {
        self.upsert_committee(committee)
            .await
            .map_err(directory_error)
    }
}
