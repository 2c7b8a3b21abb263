//! User repository implementation
//!
//! Every write runs the domain pipeline before touching storage:
//!
//! | operation | pipeline |
//! |-----------|----------|
//! | insert    | sanitize → validate → hash → email lookup → `INSERT ... RETURNING *` |
//! | update    | sanitize → validate → verified re-hash (only on password change) → `UPDATE ... RETURNING *` |
//! | delete    | `DELETE` (a still-referenced user is unprocessable) |
//!
//! Failures leave through [`CoreError`], classified once here. Callers are
//! expected to have checked the acting user's role before any mutation.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info, instrument, warn};

use core_kernel::{
    cache_key, AdapterHealth, CachePort, CoreError, CoreResult, HealthCheckResult,
    HealthCheckable, UserId,
};
use domain_user::{PasswordHasher, Sanitize, User, UserError, UserValidator};

use crate::column::{ColumnMapped, ColumnMapping};
use crate::error::DatabaseError;
use crate::filter::{push_field, EntityFilter, IntFilter, Predicate, StringFilter, TimeFilter};
use crate::query::ListParams;

/// Database row for the `users` table
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub description: String,
    pub firstname: String,
    pub lastname: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ColumnMapped for UserRow {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("id", "id"),
        ("email", "email"),
        ("password", "password"),
        ("description", "description"),
        ("first_name", "firstname"),
        ("last_name", "lastname"),
        ("created_at", "created_at"),
        ("updated_at", "updated_at"),
    ];
    const UNSORTABLE: &'static [&'static str] = &["password"];

    fn mapping_cell() -> &'static OnceCell<ColumnMapping> {
        static CELL: OnceCell<ColumnMapping> = OnceCell::new();
        &CELL
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id),
            email: row.email,
            password: row.password,
            description: row.description,
            first_name: row.firstname,
            last_name: row.lastname,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Filterable user fields; the password is deliberately absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserFilter {
    pub id: Option<IntFilter>,
    pub email: Option<StringFilter>,
    pub description: Option<StringFilter>,
    pub first_name: Option<StringFilter>,
    pub last_name: Option<StringFilter>,
    pub created_at: Option<TimeFilter>,
    pub updated_at: Option<TimeFilter>,
}

impl EntityFilter for UserFilter {
    fn predicates(&self) -> Vec<Predicate> {
        let mut out = Vec::new();
        push_field(&mut out, "id", self.id.as_ref());
        push_field(&mut out, "email", self.email.as_ref());
        push_field(&mut out, "description", self.description.as_ref());
        push_field(&mut out, "first_name", self.first_name.as_ref());
        push_field(&mut out, "last_name", self.last_name.as_ref());
        push_field(&mut out, "created_at", self.created_at.as_ref());
        push_field(&mut out, "updated_at", self.updated_at.as_ref());
        out
    }
}

/// List parameters for users
pub type UserListParams = ListParams<UserFilter>;

/// Repository for user accounts
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
    cache: Arc<dyn CachePort>,
    hasher: PasswordHasher,
}

impl UserRepository {
    /// Creates a new UserRepository
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    /// * `cache` - Cache whose `user:<id>` entries are invalidated on writes
    /// * `hasher` - Credential hasher used on insert and password change
    pub fn new(pool: PgPool, cache: Arc<dyn CachePort>, hasher: PasswordHasher) -> Self {
        Self {
            pool,
            cache,
            hasher,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates a user
    ///
    /// On success `user` is replaced by the stored row: the id and
    /// timestamps are assigned and `password` holds the hash.
    ///
    /// # Errors
    ///
    /// - `Unprocessable` when validation fails
    /// - `Conflict` when the email is already taken
    /// - `Internal` for any other failure
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn insert(&self, user: &mut User) -> CoreResult<()> {
        user.sanitize();
        UserValidator::validate_new(user).into_result()?;

        let hashed = self.hasher.hash(&user.password)?;

        let taken = UserListParams::new(UserFilter {
            email: Some(StringFilter::equals(user.email.clone())),
            ..Default::default()
        })
        .with_pagination(1, 0);
        if !self.list(&taken).await?.is_empty() {
            return Err(email_taken(&user.email));
        }

        let row = self.insert_row(user, &hashed).await?;

        *user = row.into();
        info!(user_id = %user.id, "User created");
        Ok(())
    }

    /// Updates description and names, and optionally the password
    ///
    /// A password change is detected by `user.password` differing from
    /// `old_hashed_password`. It must be confirmed with `old_password`,
    /// which is verified against `old_hashed_password` before the new
    /// plaintext is validated and hashed. The email is not updatable.
    ///
    /// # Errors
    ///
    /// - `Unprocessable` when validation fails or the old password is missing
    /// - `Unauthorized` when the old password is wrong
    /// - `NotFound` when no user has `user.id`
    /// - `Internal` for any other failure
    #[instrument(skip(self, user, old_hashed_password, old_password), fields(user_id = %user.id))]
    pub async fn update(
        &self,
        user: &mut User,
        old_hashed_password: &str,
        old_password: Option<&str>,
    ) -> CoreResult<()> {
        user.sanitize();
        UserValidator::validate(user).into_result()?;

        let password = if user.password != old_hashed_password {
            debug!("Password change requested");
            let old_password = old_password.ok_or(UserError::OldPasswordRequired)?;
            self.hasher.verify(old_password, old_hashed_password)?;
            UserValidator::validate_password(&user.password).into_result()?;
            self.hasher.hash(&user.password)?
        } else {
            old_hashed_password.to_string()
        };

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET password = $1, description = $2, firstname = $3, lastname = $4, updated_at = now()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&password)
        .bind(&user.description)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| not_found(user.id))?;

        *user = row.into();
        self.invalidate(user.id).await;
        info!("User updated");
        Ok(())
    }

    /// Deletes a user; deleting a missing id succeeds
    ///
    /// # Errors
    ///
    /// - `Unprocessable` when other rows still reference the user
    /// - `Internal` for any other failure
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete(&self, id: UserId) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                let error = DatabaseError::from(e);
                if error.is_foreign_key_violation() {
                    CoreError::from(error)
                        .with_message(format!("User is still referenced for ID: {}", id))
                } else {
                    CoreError::from(error)
                }
            })?;

        self.invalidate(id).await;
        debug!(rows = result.rows_affected(), "User deleted");
        Ok(())
    }

    /// Retrieves a user by id
    ///
    /// # Errors
    ///
    /// - `NotFound` when no user has `id`
    /// - `Internal` for any other failure
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_by_id(&self, id: UserId) -> CoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1 LIMIT 1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from)?
            .ok_or_else(|| not_found(id))?;

        Ok(row.into())
    }

    /// Lists users matching the filter, sorted and paginated
    ///
    /// # Errors
    ///
    /// - `Unprocessable` when the sort column is not a user field
    /// - `Internal` for any other failure
    #[instrument(skip(self, params))]
    pub async fn list(&self, params: &UserListParams) -> CoreResult<Vec<User>> {
        let statement = params.statement(UserRow::column_mapping()?)?;
        debug!(sql = %statement.sql, params = statement.params.len(), "Listing users");

        let rows: Vec<UserRow> = statement.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Checks a candidate password against the user's stored hash
    ///
    /// # Errors
    ///
    /// `Unauthorized` on mismatch, `Internal` if the stored hash is unusable.
    pub fn verify_password(&self, user: &User, candidate: &str) -> CoreResult<()> {
        Ok(user.is_correct_password(&self.hasher, candidate)?)
    }

    async fn insert_row(&self, user: &User, hashed: &str) -> CoreResult<UserRow> {
        sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password, description, firstname, lastname)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(hashed)
        .bind(&user.description)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // the email lookup is check-then-act; the unique index has the final say
            let error = DatabaseError::from(e);
            if error.is_unique_violation() {
                CoreError::from(error).with_message(email_taken_message(&user.email))
            } else {
                CoreError::from(error)
            }
        })
    }

    async fn invalidate(&self, id: UserId) {
        let key = cache_key(UserId::prefix(), id);
        if let Err(e) = self.cache.invalidate(&key).await {
            warn!(error = %e, key = %key, "Failed to invalidate cache entry");
        }
    }
}

impl fmt::Debug for UserRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRepository")
            .field("pool", &self.pool)
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HealthCheckable for UserRepository {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "postgres-user-repository".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "postgres-user-repository".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

fn not_found(id: UserId) -> CoreError {
    CoreError::not_found(format!("User not found for ID: {}", id))
}

fn email_taken_message(email: &str) -> String {
    format!("user with email {} does already exist", email)
}

fn email_taken(email: &str) -> CoreError {
    CoreError::conflict(email_taken_message(email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::OneColumnSort;
    use crate::filter::SqlValue;
    use core_kernel::ErrorKind;

    #[test]
    fn test_user_mapping() {
        let mapping = UserRow::column_mapping().unwrap();

        assert_eq!(mapping.table(), "users");
        assert_eq!(mapping.resolve("first_name"), Some("firstname"));
        assert_eq!(mapping.resolve("LAST_NAME"), Some("lastname"));
        assert_eq!(mapping.len(), 8);
    }

    #[test]
    fn test_email_lookup_statement() {
        let params = UserListParams::new(UserFilter {
            email: Some(StringFilter::equals("a@x.com")),
            ..Default::default()
        })
        .with_pagination(1, 0);

        let statement = params.statement(UserRow::column_mapping().unwrap()).unwrap();

        assert_eq!(statement.sql, "SELECT * FROM users WHERE email = $1 LIMIT 1 OFFSET 0");
        assert_eq!(statement.params, vec![SqlValue::Text("a@x.com".to_string())]);
    }

    #[test]
    fn test_filter_fields_follow_declaration_order() {
        let filter = UserFilter {
            last_name: Some(StringFilter::equals("Lovelace")),
            id: Some(IntFilter::equals(1)),
            ..Default::default()
        };
        let fields: Vec<_> = filter.predicates().iter().map(Predicate::field).collect();

        assert_eq!(fields, vec!["id", "last_name"]);
    }

    #[test]
    fn test_sort_by_unknown_user_field_is_unprocessable() {
        let params = UserListParams::default().with_sort(OneColumnSort::asc("nickname"));

        let error = params.statement(UserRow::column_mapping().unwrap()).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Unprocessable);
    }

    #[test]
    fn test_sort_by_password_is_unprocessable() {
        let mapping = UserRow::column_mapping().unwrap();

        for params in [
            UserListParams::default().with_sort(OneColumnSort::asc("password")),
            UserListParams::default().with_sort(OneColumnSort::desc("Password")),
        ] {
            let error = params.statement(mapping).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Unprocessable);
        }

        let statement = UserListParams::default()
            .with_sort(OneColumnSort::desc("created_at"))
            .statement(mapping)
            .unwrap();
        assert!(statement.sql.contains("ORDER BY created_at DESC"));
    }

    #[test]
    fn test_row_into_user() {
        let now = Utc::now();
        let user: User = UserRow {
            id: 9,
            email: "a@x.com".to_string(),
            password: "$argon2id$...".to_string(),
            description: String::new(),
            firstname: "Ada".to_string(),
            lastname: "Lovelace".to_string(),
            created_at: now,
            updated_at: now,
        }
        .into();

        assert_eq!(user.id, UserId::new(9));
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name, "Lovelace");
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn test_unique_constraint_is_conflict() {
        let db = test_utils::test_database!();
        let repo = UserRepository::new(
            db.pool().clone(),
            Arc::new(core_kernel::InMemoryCache::new()),
            test_utils::CredentialFixtures::hasher(),
        );

        let mut stored = test_utils::UserFixtures::ada();
        repo.insert(&mut stored).await.unwrap();

        let mut rival = test_utils::UserFixtures::grace();
        rival.email = stored.email.clone();
        let error = repo.insert_row(&rival, &stored.password).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Conflict);
        assert_eq!(
            error.message(),
            Some(format!("user with email {} does already exist", stored.email).as_str())
        );
        assert_eq!(db.count_users().await.unwrap(), 1);
    }
}
