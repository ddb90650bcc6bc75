// db/userdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use crate::db::db::{page_offset, DBClient};
use crate::models::usermodel::{User, UserRole};
use crate::service::error::ServiceError;

const COLUMNS: &str = "id, name, email, phone_number, wallet_balance, role, is_disabled, \
                       disable_reason, disabled_at, disabled_by, enabled_at, enabled_by, \
                       referral_code, created_at, updated_at";

#[derive(Debug, Default)]
pub struct UpdateUserFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub role: Option<UserRole>,
    pub referral_code: Option<String>,
}

#[async_trait]
pub trait UserExt {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error>;

    /// Paginated listing, optionally filtered by a search term matched
    /// against name, email, phone number and referral code.
    async fn get_users(
        &self,
        page: u32,
        limit: u32,
        search: Option<String>,
        sort_by_balance: bool,
    ) -> Result<(Vec<User>, i64), sqlx::Error>;

    async fn update_user(
        &self,
        user_id: Uuid,
        fields: UpdateUserFields,
    ) -> Result<User, ServiceError>;

    /// Removes the user together with their ledger and order rows.
    async fn delete_user(&self, user_id: Uuid) -> Result<(), ServiceError>;

    /// Flips the disabled flag, stamping who acted and when on the matching
    /// side. Returns the updated row and whether the flip was a disable.
    async fn toggle_user_status(
        &self,
        user_id: Uuid,
        disable_reason: Option<String>,
        admin_id: Uuid,
    ) -> Result<(User, bool), ServiceError>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_users(
        &self,
        page: u32,
        limit: u32,
        search: Option<String>,
        sort_by_balance: bool,
    ) -> Result<(Vec<User>, i64), sqlx::Error> {
        let offset = page_offset(page, limit);

        const PREDICATE: &str = r#"($1::text IS NULL
                OR name ILIKE '%' || $1 || '%'
                OR email ILIKE '%' || $1 || '%'
                OR phone_number ILIKE '%' || $1 || '%'
                OR referral_code ILIKE '%' || $1 || '%')"#;

        let order_by = if sort_by_balance {
            "wallet_balance DESC"
        } else {
            "created_at DESC"
        };

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE {PREDICATE}
             ORDER BY {order_by} LIMIT $2 OFFSET $3"
        ))
        .bind(search.as_deref())
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {PREDICATE}"))
                .bind(search.as_deref())
                .fetch_one(&self.pool)
                .await?;

        Ok((users, total))
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        fields: UpdateUserFields,
    ) -> Result<User, ServiceError> {
        sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users
               SET name = COALESCE($2, name),
                   email = COALESCE($3, email),
                   phone_number = COALESCE($4, phone_number),
                   role = COALESCE($5, role),
                   referral_code = COALESCE($6, referral_code),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {COLUMNS}"#
        ))
        .bind(user_id)
        .bind(fields.name)
        .bind(fields.email)
        .bind(fields.phone_number)
        .bind(fields.role)
        .bind(fields.referral_code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::UserNotFound)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(ServiceError::UserNotFound);
        }

        sqlx::query("DELETE FROM transactions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        // History rows cascade from their orders.
        sqlx::query("DELETE FROM data_purchases WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn toggle_user_status(
        &self,
        user_id: Uuid,
        disable_reason: Option<String>,
        admin_id: Uuid,
    ) -> Result<(User, bool), ServiceError> {
        let mut tx = self.pool.begin().await?;

        let user = crate::db::walletdb::lock_user(&mut tx, user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let disabling = !user.is_disabled;

        let user = if disabling {
            sqlx::query_as::<_, User>(&format!(
                r#"UPDATE users
                   SET is_disabled = TRUE,
                       disable_reason = $2,
                       disabled_at = NOW(),
                       disabled_by = $3,
                       updated_at = NOW()
                   WHERE id = $1
                   RETURNING {COLUMNS}"#
            ))
            .bind(user_id)
            .bind(
                disable_reason
                    .as_deref()
                    .unwrap_or("Administrative action"),
            )
            .bind(admin_id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query_as::<_, User>(&format!(
                r#"UPDATE users
                   SET is_disabled = FALSE,
                       disable_reason = NULL,
                       enabled_at = NOW(),
                       enabled_by = $2,
                       updated_at = NOW()
                   WHERE id = $1
                   RETURNING {COLUMNS}"#
            ))
            .bind(user_id)
            .bind(admin_id)
            .fetch_one(&mut *tx)
            .await?
        };

        tx.commit().await?;
        Ok((user, disabling))
    }
}
