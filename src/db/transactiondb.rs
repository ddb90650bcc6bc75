// db/transactiondb.rs
//
// Ledger queries and the Paystack reconciliation path. Reconciliation only
// flips the pending deposit's status and merges the gateway payload into
// its metadata; the wallet credit belongs to the deposit flow.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::db::{page_offset, DBClient};
use crate::models::transactionmodel::{
    Transaction, TransactionStatus, TransactionType, GATEWAY_PAYSTACK,
};
use crate::service::error::ServiceError;

const COLUMNS: &str = "id, user_id, transaction_type, amount, status, reference, gateway, \
                       metadata, created_at, updated_at";

#[derive(Debug, Default, Clone)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub gateway: Option<String>,
    pub reference: Option<String>,
    pub user_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Completed volume per transaction type under the current filter.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TypeTotal {
    pub transaction_type: TransactionType,
    pub total_amount: i64,
    pub count: i64,
}

#[derive(Debug)]
pub enum VerifyOutcome {
    /// Reconciliation already happened, nothing changed.
    AlreadyCompleted(Transaction),
    /// Gateway confirmed the charge; deposit marked completed.
    Completed(Transaction),
    /// Gateway reported the charge unsuccessful; deposit marked failed.
    MarkedFailed(Transaction),
}

#[async_trait]
pub trait TransactionExt {
    async fn get_transactions(
        &self,
        filter: &TransactionFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Transaction>, i64, Vec<TypeTotal>), sqlx::Error>;

    async fn get_transaction(&self, transaction_id: Uuid)
        -> Result<Option<Transaction>, sqlx::Error>;

    async fn update_transaction_status(
        &self,
        transaction_id: Uuid,
        status: TransactionStatus,
        admin_notes: Option<String>,
        admin_id: Uuid,
    ) -> Result<Transaction, ServiceError>;

    async fn reconcile_paystack_deposit(
        &self,
        reference: &str,
        charge_succeeded: bool,
        payload: Value,
    ) -> Result<VerifyOutcome, ServiceError>;
}

#[async_trait]
impl TransactionExt for DBClient {
    async fn get_transactions(
        &self,
        filter: &TransactionFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Transaction>, i64, Vec<TypeTotal>), sqlx::Error> {
        let offset = page_offset(page, limit);

        const PREDICATE: &str = r#"
               ($1::transaction_type IS NULL OR transaction_type = $1)
           AND ($2::transaction_status IS NULL OR status = $2)
           AND ($3::text IS NULL OR gateway = $3)
           AND ($4::text IS NULL OR reference ILIKE '%' || $4 || '%')
           AND ($5::uuid IS NULL OR user_id = $5)
           AND ($6::timestamptz IS NULL OR created_at >= $6)
           AND ($7::timestamptz IS NULL OR created_at <= $7)"#;

        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE {PREDICATE}
             ORDER BY created_at DESC LIMIT $8 OFFSET $9"
        ))
        .bind(filter.transaction_type)
        .bind(filter.status)
        .bind(filter.gateway.as_deref())
        .bind(filter.reference.as_deref())
        .bind(filter.user_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM transactions WHERE {PREDICATE}"
        ))
        .bind(filter.transaction_type)
        .bind(filter.status)
        .bind(filter.gateway.as_deref())
        .bind(filter.reference.as_deref())
        .bind(filter.user_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(&self.pool)
        .await?;

        let totals = sqlx::query_as::<_, TypeTotal>(&format!(
            r#"SELECT transaction_type,
                      COALESCE(SUM(amount), 0)::BIGINT AS total_amount,
                      COUNT(*) AS count
               FROM transactions
               WHERE status = 'completed' AND {PREDICATE}
               GROUP BY transaction_type"#
        ))
        .bind(filter.transaction_type)
        .bind(filter.status)
        .bind(filter.gateway.as_deref())
        .bind(filter.reference.as_deref())
        .bind(filter.user_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.pool)
        .await?;

        Ok((transactions, total, totals))
    }

    async fn get_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_transaction_status(
        &self,
        transaction_id: Uuid,
        status: TransactionStatus,
        admin_notes: Option<String>,
        admin_id: Uuid,
    ) -> Result<Transaction, ServiceError> {
        let note = json!({
            "statusOverride": {
                "adminId": admin_id,
                "notes": admin_notes,
                "at": Utc::now(),
            }
        });

        sqlx::query_as::<_, Transaction>(&format!(
            r#"UPDATE transactions
               SET status = $2,
                   metadata = COALESCE(metadata, '{{}}'::jsonb) || $3::jsonb,
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {COLUMNS}"#
        ))
        .bind(transaction_id)
        .bind(status)
        .bind(note)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::TransactionNotFound)
    }

    async fn reconcile_paystack_deposit(
        &self,
        reference: &str,
        charge_succeeded: bool,
        payload: Value,
    ) -> Result<VerifyOutcome, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"SELECT {COLUMNS} FROM transactions
               WHERE reference = $1 AND gateway = $2 AND transaction_type = $3
               FOR UPDATE"#
        ))
        .bind(reference)
        .bind(GATEWAY_PAYSTACK)
        .bind(TransactionType::Deposit)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServiceError::TransactionNotFound)?;

        if transaction.status == TransactionStatus::Completed {
            return Ok(VerifyOutcome::AlreadyCompleted(transaction));
        }

        let status = if charge_succeeded {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Failed
        };

        let transaction = sqlx::query_as::<_, Transaction>(&reconcile_update_sql())
            .bind(transaction.id)
            .bind(status)
            .bind(json!({ "verification": payload }))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        if charge_succeeded {
            Ok(VerifyOutcome::Completed(transaction))
        } else {
            Ok(VerifyOutcome::MarkedFailed(transaction))
        }
    }
}

fn reconcile_update_sql() -> String {
    format!(
        r#"UPDATE transactions
           SET status = $2,
               metadata = COALESCE(metadata, '{{}}'::jsonb) || $3::jsonb,
               updated_at = NOW()
           WHERE id = $1
           RETURNING {COLUMNS}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reconciliation may flip status and merge metadata, nothing else. The
    // wallet credit for a deposit happens when the deposit is made.
    #[test]
    fn reconciliation_touches_only_the_transaction_row() {
        let sql = reconcile_update_sql();
        assert!(sql.starts_with("UPDATE transactions"));
        assert!(!sql.contains("UPDATE users"));
        assert!(!sql.contains("wallet_balance"));
    }
}
