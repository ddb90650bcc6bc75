// db/walletdb.rs
//
// Wallet mutations. Every balance change and its ledger row are written in
// one transaction; the users row is locked first so concurrent mutations
// serialize on the row.
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::Postgres;
use uuid::Uuid;

use crate::db::db::DBClient;
use crate::models::transactionmodel::{
    generate_admin_reference, Transaction, TransactionStatus, TransactionType,
    GATEWAY_ADMIN_DEDUCTION, GATEWAY_ADMIN_DEPOSIT,
};
use crate::models::usermodel::User;
use crate::service::error::ServiceError;

/// Result of a committed wallet mutation.
#[derive(Debug)]
pub struct WalletMutation {
    pub user: User,
    pub previous_balance: i64,
    pub transaction: Transaction,
}

#[async_trait]
pub trait WalletExt {
    async fn credit_wallet(
        &self,
        user_id: Uuid,
        amount: i64,
        admin_id: Uuid,
    ) -> Result<WalletMutation, ServiceError>;

    async fn debit_wallet(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: Option<String>,
        admin_id: Uuid,
    ) -> Result<WalletMutation, ServiceError>;
}

#[async_trait]
impl WalletExt for DBClient {
    async fn credit_wallet(
        &self,
        user_id: Uuid,
        amount: i64,
        admin_id: Uuid,
    ) -> Result<WalletMutation, ServiceError> {
        if amount <= 0 {
            return Err(ServiceError::InvalidAmount);
        }

        let mut tx = self.pool.begin().await?;

        let user = lock_user(&mut tx, user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let previous_balance = user.wallet_balance;
        let new_balance = previous_balance + amount;

        let metadata = json!({
            "adminId": admin_id,
            "previousBalance": previous_balance,
            "newBalance": new_balance,
        });

        let (user, transaction) = apply_ledger_entry(
            &mut tx,
            &user,
            new_balance,
            amount,
            TransactionType::Deposit,
            generate_admin_reference("ADMIN-DEPOSIT"),
            GATEWAY_ADMIN_DEPOSIT,
            metadata,
        )
        .await?;

        tx.commit().await?;

        Ok(WalletMutation {
            user,
            previous_balance,
            transaction,
        })
    }

    async fn debit_wallet(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: Option<String>,
        admin_id: Uuid,
    ) -> Result<WalletMutation, ServiceError> {
        if amount <= 0 {
            return Err(ServiceError::InvalidAmount);
        }

        let mut tx = self.pool.begin().await?;

        let user = lock_user(&mut tx, user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let previous_balance = user.wallet_balance;
        if previous_balance < amount {
            return Err(ServiceError::InsufficientBalance {
                current: previous_balance,
                requested: amount,
            });
        }
        let new_balance = previous_balance - amount;

        let metadata = json!({
            "adminId": admin_id,
            "reason": reason.as_deref().unwrap_or("Administrative deduction"),
            "previousBalance": previous_balance,
            "newBalance": new_balance,
        });

        let (user, transaction) = apply_ledger_entry(
            &mut tx,
            &user,
            new_balance,
            amount,
            TransactionType::Withdrawal,
            generate_admin_reference("ADMIN-DEDUCT"),
            GATEWAY_ADMIN_DEDUCTION,
            metadata,
        )
        .await?;

        tx.commit().await?;

        Ok(WalletMutation {
            user,
            previous_balance,
            transaction,
        })
    }
}

pub(crate) async fn lock_user(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"SELECT id, name, email, phone_number, wallet_balance, role, is_disabled,
                  disable_reason, disabled_at, disabled_by, enabled_at, enabled_by,
                  referral_code, created_at, updated_at
           FROM users WHERE id = $1 FOR UPDATE"#,
    )
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Writes the new balance and its ledger row inside the caller's transaction.
/// The caller holds the row lock from `lock_user` and decides when to commit.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn apply_ledger_entry(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    user: &User,
    new_balance: i64,
    amount: i64,
    transaction_type: TransactionType,
    reference: String,
    gateway: &str,
    metadata: Value,
) -> Result<(User, Transaction), sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"UPDATE users SET wallet_balance = $2, updated_at = NOW()
           WHERE id = $1
           RETURNING id, name, email, phone_number, wallet_balance, role, is_disabled,
                     disable_reason, disabled_at, disabled_by, enabled_at, enabled_by,
                     referral_code, created_at, updated_at"#,
    )
    .bind(user.id)
    .bind(new_balance)
    .fetch_one(&mut **tx)
    .await?;

    let transaction = sqlx::query_as::<_, Transaction>(
        r#"INSERT INTO transactions (user_id, transaction_type, amount, status, reference, gateway, metadata)
           VALUES ($1, $2, $3, $4, $5, $6, $7)
           RETURNING id, user_id, transaction_type, amount, status, reference, gateway, metadata,
                     created_at, updated_at"#,
    )
    .bind(user.id)
    .bind(transaction_type)
    .bind(amount)
    .bind(TransactionStatus::Completed)
    .bind(reference)
    .bind(gateway)
    .bind(metadata)
    .fetch_one(&mut **tx)
    .await?;

    Ok((user, transaction))
}
