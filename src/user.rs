use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub gender: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub gender: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Search/filter parameters for the admin user listing. Only accounts with
/// the `user` role are ever returned.
pub struct UserFilter {
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

const USER_COLUMNS: &str =
    "id, first_name, last_name, username, email, password, gender, role, is_active, \
     last_login, created_at, updated_at";

impl User {
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn create(pool: &PgPool, new_user: NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as(&format!(
            "INSERT INTO users (first_name, last_name, username, email, password, gender, role) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.gender)
        .bind(new_user.role)
        .fetch_one(pool)
        .await
        .map_err(map_create_error)?;

        Ok(user)
    }

    pub async fn touch_last_login(pool: &PgPool, id: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn set_active(pool: &PgPool, id: i32, is_active: bool) -> Result<User, AppError> {
        let user = sqlx::query_as(&format!(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(is_active)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn list(
        pool: &PgPool,
        filter: &UserFilter,
        sort_column: &str,
        descending: bool,
        limit: u32,
        offset: i64,
    ) -> Result<Vec<User>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = 'user'"
        ));
        push_user_filters(&mut builder, filter);

        builder.push(format!(
            " ORDER BY {} {}",
            sort_column,
            if descending { "DESC" } else { "ASC" }
        ));
        builder.push(" LIMIT ");
        builder.push_bind(limit as i64);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let users = builder.build_query_as().fetch_all(pool).await?;

        Ok(users)
    }

    pub async fn count(pool: &PgPool, filter: &UserFilter) -> Result<i64, AppError> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE role = 'user'");
        push_user_filters(&mut builder, filter);

        let count = builder.build_query_scalar().fetch_one(pool).await?;

        Ok(count)
    }

    pub async fn count_by_activity(pool: &PgPool, is_active: bool) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'user' AND is_active = $1")
                .bind(is_active)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    pub async fn count_since(pool: &PgPool, since: DateTime<Utc>) -> Result<i64, AppError> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE role = 'user' AND created_at >= $1",
        )
        .bind(since)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}

/// Turns a unique-index violation on the insert into a 409. The handlers
/// pre-check both columns, but two concurrent registrations can still race
/// past that and lose at the constraint.
fn map_create_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some("users_username_key") => "username",
                _ => "email",
            };

            return AppError::Conflict(format!("{field} already exists"));
        }
    }

    AppError::Database(e)
}

fn push_user_filters(builder: &mut QueryBuilder<Postgres>, filter: &UserFilter) {
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");

        builder.push(" AND (first_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR last_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR email ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR username ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    if let Some(is_active) = filter.is_active {
        builder.push(" AND is_active = ");
        builder.push_bind(is_active);
    }
}

/// Maps a client-facing sort key onto a real column, falling back to
/// `created_at` for anything unknown.
pub fn sort_column(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("firstName") => "first_name",
        Some("lastName") => "last_name",
        Some("username") => "username",
        Some("email") => "email",
        _ => "created_at",
    }
}

pub fn hash_password(plain: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

pub fn verify_password(plain: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error;
    use std::fmt;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::{hash_password, map_create_error, sort_column, verify_password};
    use crate::error::AppError;

    #[derive(Debug)]
    struct UniqueViolation(&'static str);

    impl fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "duplicate key value violates unique constraint \"{}\"", self.0)
        }
    }

    impl Error for UniqueViolation {}

    impl DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some("23505".into())
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.0)
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }

        fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn test_duplicate_key_maps_to_conflict() {
        let email = sqlx::Error::Database(Box::new(UniqueViolation("users_email_key")));
        match map_create_error(email) {
            AppError::Conflict(message) => assert_eq!(message, "email already exists"),
            other => panic!("expected conflict, got {other:?}"),
        }

        let username = sqlx::Error::Database(Box::new(UniqueViolation("users_username_key")));
        match map_create_error(username) {
            AppError::Conflict(message) => assert_eq!(message, "username already exists"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_other_errors_pass_through() {
        match map_create_error(sqlx::Error::RowNotFound) {
            AppError::Database(sqlx::Error::RowNotFound) => {}
            other => panic!("expected database error, got {other:?}"),
        }
    }

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("Secret1").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Secret1", &hash));
        assert!(!verify_password("Secret2", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("Secret1", "not-a-phc-string"));
    }

    #[test]
    fn test_sort_whitelist() {
        assert_eq!(sort_column(Some("firstName")), "first_name");
        assert_eq!(sort_column(Some("email")), "email");
        assert_eq!(sort_column(Some("password")), "created_at");
        assert_eq!(sort_column(None), "created_at");
    }
}
