// db/orderdb.rs
//
// Order status transitions. An order is addressed by its vendor reference
// first, then by internal id, so operators can paste either into the admin
// panel. A transition, its history row, and any refund it triggers commit
// as one transaction; the refund itself goes through the same ledger path
// as every other wallet mutation.
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use sqlx::Postgres;
use uuid::Uuid;

use crate::db::db::{page_offset, DBClient};
use crate::db::walletdb::{apply_ledger_entry, lock_user};
use crate::models::ordermodel::{refund_due, DataPurchase, OrderStatus, OrderStatusHistory};
use crate::models::transactionmodel::{TransactionType, GATEWAY_WALLET_REFUND};
use crate::service::error::ServiceError;

/// Orders per bulk transaction. Keeps row locks short while still
/// amortizing the commit cost.
pub const BULK_BATCH_SIZE: usize = 10;

/// Everything a handler needs to message the customer after a refund has
/// committed. SMS never happens inside the transaction.
#[derive(Debug, Clone)]
pub struct RefundNotice {
    pub name: String,
    pub phone_number: String,
    pub price: i64,
    pub capacity: f64,
    pub network: String,
    pub new_balance: i64,
}

#[derive(Debug)]
pub struct OrderTransition {
    pub order: DataPurchase,
    pub previous_status: OrderStatus,
    pub refund: Option<RefundNotice>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSuccess {
    pub id: Uuid,
    pub geonet_reference: Option<String>,
    pub previous_status: OrderStatus,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailure {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geonet_reference: Option<String>,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusResults {
    pub success: Vec<BulkSuccess>,
    pub failed: Vec<BulkFailure>,
    pub not_found: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub network: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<chrono::DateTime<Utc>>,
    pub end_date: Option<chrono::DateTime<Utc>>,
}

#[async_trait]
pub trait OrderExt {
    /// Returns the page of orders, the total row count, and the completed
    /// revenue (pesewas) under the same filter.
    async fn get_orders(
        &self,
        page: u32,
        limit: u32,
        filter: &OrderFilter,
    ) -> Result<(Vec<DataPurchase>, i64, i64), sqlx::Error>;

    /// Returns the page of the user's orders, the total count, and the sum
    /// of their non-failed order prices (pesewas).
    async fn get_user_orders(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<DataPurchase>, i64, i64), sqlx::Error>;

    /// Non-locking lookup by vendor reference, falling back to internal id.
    async fn find_order(&self, reference: &str) -> Result<Option<DataPurchase>, sqlx::Error>;

    async fn get_order_history(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<OrderStatusHistory>, sqlx::Error>;

    async fn set_order_status(
        &self,
        reference: &str,
        status: OrderStatus,
        admin_id: Uuid,
    ) -> Result<OrderTransition, ServiceError>;

    async fn bulk_set_order_status(
        &self,
        references: &[String],
        status: OrderStatus,
        admin_id: Uuid,
    ) -> Result<(BulkStatusResults, Vec<RefundNotice>), ServiceError>;
}

#[async_trait]
impl OrderExt for DBClient {
    async fn get_orders(
        &self,
        page: u32,
        limit: u32,
        filter: &OrderFilter,
    ) -> Result<(Vec<DataPurchase>, i64, i64), sqlx::Error> {
        let offset = page_offset(page, limit);

        const PREDICATE: &str = r#"
               ($1::order_status IS NULL OR status = $1)
           AND ($2::text IS NULL OR network = $2)
           AND ($3::text IS NULL OR phone_number ILIKE '%' || $3 || '%'
                OR vendor_reference ILIKE '%' || $3 || '%')
           AND ($4::timestamptz IS NULL OR created_at >= $4)
           AND ($5::timestamptz IS NULL OR created_at <= $5)"#;

        let orders = sqlx::query_as::<_, DataPurchase>(&format!(
            r#"SELECT id, user_id, phone_number, network, capacity, price, status,
                      vendor_reference, processed_by, refunded_at, created_at, updated_at
               FROM data_purchases
               WHERE {PREDICATE}
               ORDER BY created_at DESC
               LIMIT $6 OFFSET $7"#
        ))
        .bind(filter.status)
        .bind(filter.network.as_deref())
        .bind(filter.search.as_deref())
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM data_purchases WHERE {PREDICATE}"
        ))
        .bind(filter.status)
        .bind(filter.network.as_deref())
        .bind(filter.search.as_deref())
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(&self.pool)
        .await?;

        let revenue: i64 = sqlx::query_scalar(&format!(
            r#"SELECT COALESCE(SUM(price), 0)::BIGINT FROM data_purchases
               WHERE status = 'completed' AND {PREDICATE}"#
        ))
        .bind(filter.status)
        .bind(filter.network.as_deref())
        .bind(filter.search.as_deref())
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(&self.pool)
        .await?;

        Ok((orders, total, revenue))
    }

    async fn get_user_orders(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<DataPurchase>, i64, i64), sqlx::Error> {
        let offset = page_offset(page, limit);

        let orders = sqlx::query_as::<_, DataPurchase>(
            r#"SELECT id, user_id, phone_number, network, capacity, price, status,
                      vendor_reference, processed_by, refunded_at, created_at, updated_at
               FROM data_purchases
               WHERE user_id = $1
               ORDER BY created_at DESC
               LIMIT $2 OFFSET $3"#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let row = sqlx::query(
            r#"SELECT COUNT(*) AS total,
                      COALESCE(SUM(price) FILTER (WHERE status <> 'failed'), 0)::BIGINT AS total_spent
               FROM data_purchases WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        use sqlx::Row;
        Ok((orders, row.get("total"), row.get("total_spent")))
    }

    async fn find_order(&self, reference: &str) -> Result<Option<DataPurchase>, sqlx::Error> {
        const COLUMNS: &str = "id, user_id, phone_number, network, capacity, price, status, \
                               vendor_reference, processed_by, refunded_at, created_at, updated_at";

        let by_reference = sqlx::query_as::<_, DataPurchase>(&format!(
            "SELECT {COLUMNS} FROM data_purchases WHERE vendor_reference = $1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        if by_reference.is_some() {
            return Ok(by_reference);
        }

        let Ok(id) = Uuid::parse_str(reference) else {
            return Ok(None);
        };

        sqlx::query_as::<_, DataPurchase>(&format!(
            "SELECT {COLUMNS} FROM data_purchases WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_order_history(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<OrderStatusHistory>, sqlx::Error> {
        sqlx::query_as::<_, OrderStatusHistory>(
            r#"SELECT id, order_id, status, previous_status, changed_by, bulk_update, changed_at
               FROM order_status_history
               WHERE order_id = $1
               ORDER BY changed_at ASC"#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn set_order_status(
        &self,
        reference: &str,
        status: OrderStatus,
        admin_id: Uuid,
    ) -> Result<OrderTransition, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let order = resolve_order_locked(&mut tx, reference)
            .await?
            .ok_or_else(|| ServiceError::OrderNotFound(reference.to_string()))?;

        let previous_status = order.status;

        // Re-applying the current status changes nothing: no history row,
        // no refund.
        if previous_status == status {
            tx.commit().await?;
            return Ok(OrderTransition {
                order,
                previous_status,
                refund: None,
            });
        }

        let mut refund = None;
        if refund_due(previous_status, status, order.refunded_at) {
            refund = issue_refund(&mut tx, &order, previous_status, admin_id, false).await?;
        }

        let order =
            write_transition(&mut tx, &order, status, admin_id, false, refund.is_some()).await?;

        tx.commit().await?;

        Ok(OrderTransition {
            order,
            previous_status,
            refund,
        })
    }

    async fn bulk_set_order_status(
        &self,
        references: &[String],
        status: OrderStatus,
        admin_id: Uuid,
    ) -> Result<(BulkStatusResults, Vec<RefundNotice>), ServiceError> {
        let mut results = BulkStatusResults::default();
        let mut notices = Vec::new();

        for chunk in references.chunks(BULK_BATCH_SIZE) {
            let mut entries: Vec<ChunkEntry> = Vec::with_capacity(chunk.len());
            let mut chunk_notices = Vec::new();

            let outcome: Result<(), sqlx::Error> = async {
                let mut tx = self.pool.begin().await?;

                for reference in chunk {
                    let Some(order) = resolve_order_locked(&mut tx, reference).await? else {
                        entries.push(ChunkEntry::NotFound);
                        continue;
                    };

                    if order.status == status {
                        entries.push(ChunkEntry::NoOp {
                            id: order.id,
                            vendor_reference: order.vendor_reference,
                        });
                        continue;
                    }

                    let previous_status = order.status;
                    let mut refunded = false;

                    if refund_due(previous_status, status, order.refunded_at) {
                        if let Some(notice) =
                            issue_refund(&mut tx, &order, previous_status, admin_id, true).await?
                        {
                            chunk_notices.push(notice);
                            refunded = true;
                        }
                    }

                    write_transition(&mut tx, &order, status, admin_id, true, refunded).await?;

                    entries.push(ChunkEntry::Transitioned {
                        id: order.id,
                        vendor_reference: order.vendor_reference,
                        previous_status,
                    });
                }

                tx.commit().await?;
                Ok(())
            }
            .await;

            if let Err(e) = &outcome {
                tracing::error!(error = %e, batch_size = chunk.len(), "Bulk status batch failed");
            }
            classify_chunk(&mut results, chunk, &entries, status);
            if outcome.is_ok() {
                notices.extend(chunk_notices);
            }
        }

        Ok((results, notices))
    }
}

/// Per-order outcome recorded while a bulk batch's transaction is open.
#[derive(Debug)]
enum ChunkEntry {
    NotFound,
    NoOp {
        id: Uuid,
        vendor_reference: Option<String>,
    },
    Transitioned {
        id: Uuid,
        vendor_reference: Option<String>,
        previous_status: OrderStatus,
    },
}

/// Folds one batch's recorded outcomes into the running results. Entries
/// are positional: a batch that errored stops recording at the failing
/// order, and every reference without an entry is reported failed. Outcomes
/// recorded before the error keep their classification even though the
/// batch rolled back.
fn classify_chunk(
    results: &mut BulkStatusResults,
    references: &[String],
    entries: &[ChunkEntry],
    target: OrderStatus,
) {
    for (i, reference) in references.iter().enumerate() {
        match entries.get(i) {
            Some(ChunkEntry::NotFound) => results.not_found.push(reference.clone()),
            Some(ChunkEntry::NoOp {
                id,
                vendor_reference,
            }) => results.success.push(BulkSuccess {
                id: *id,
                geonet_reference: vendor_reference.clone(),
                previous_status: target,
                status: target,
                message: Some("Status already set (no change needed)".to_string()),
            }),
            Some(ChunkEntry::Transitioned {
                id,
                vendor_reference,
                previous_status,
            }) => results.success.push(BulkSuccess {
                id: *id,
                geonet_reference: vendor_reference.clone(),
                previous_status: *previous_status,
                status: target,
                message: None,
            }),
            None => results.failed.push(BulkFailure {
                id: reference.clone(),
                geonet_reference: None,
                error: "Batch transaction error".to_string(),
            }),
        }
    }
}

/// Looks the order up by vendor reference first, then by internal id when
/// the reference parses as a UUID. Malformed ids resolve to not-found
/// rather than an error.
async fn resolve_order_locked(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    reference: &str,
) -> Result<Option<DataPurchase>, sqlx::Error> {
    const COLUMNS: &str = "id, user_id, phone_number, network, capacity, price, status, \
                           vendor_reference, processed_by, refunded_at, created_at, updated_at";

    let by_reference = sqlx::query_as::<_, DataPurchase>(&format!(
        "SELECT {COLUMNS} FROM data_purchases WHERE vendor_reference = $1 FOR UPDATE"
    ))
    .bind(reference)
    .fetch_optional(&mut **tx)
    .await?;

    if by_reference.is_some() {
        return Ok(by_reference);
    }

    let Ok(id) = Uuid::parse_str(reference) else {
        return Ok(None);
    };

    sqlx::query_as::<_, DataPurchase>(&format!(
        "SELECT {COLUMNS} FROM data_purchases WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

/// Credits the order price back through the ledger. Returns the notice for
/// the post-commit SMS, or None when the paying user no longer exists.
async fn issue_refund(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    order: &DataPurchase,
    previous_status: OrderStatus,
    admin_id: Uuid,
    bulk_update: bool,
) -> Result<Option<RefundNotice>, sqlx::Error> {
    let Some(user) = lock_user(tx, order.user_id).await? else {
        tracing::warn!(order_id = %order.id, "Refund skipped: purchasing user no longer exists");
        return Ok(None);
    };

    let new_balance = user.wallet_balance + order.price;
    let reference = format!(
        "REFUND-{}-{}",
        order.id.simple(),
        Utc::now().timestamp_millis()
    );
    let metadata = json!({
        "orderId": order.id,
        "geonetReference": order.vendor_reference,
        "previousStatus": previous_status,
        "adminId": admin_id,
        "bulkUpdate": bulk_update,
    });

    let (user, _) = apply_ledger_entry(
        tx,
        &user,
        new_balance,
        order.price,
        TransactionType::Refund,
        reference,
        GATEWAY_WALLET_REFUND,
        metadata,
    )
    .await?;

    Ok(Some(RefundNotice {
        name: user.name,
        phone_number: user.phone_number,
        price: order.price,
        capacity: order.capacity,
        network: order.network.clone(),
        new_balance: user.wallet_balance,
    }))
}

/// Writes the new status and appends the history row. `refunded` stamps
/// `refunded_at`, which is what makes a refund one-time per order.
async fn write_transition(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    order: &DataPurchase,
    status: OrderStatus,
    admin_id: Uuid,
    bulk_update: bool,
    refunded: bool,
) -> Result<DataPurchase, sqlx::Error> {
    let updated = sqlx::query_as::<_, DataPurchase>(
        r#"UPDATE data_purchases
           SET status = $2,
               processed_by = $3,
               refunded_at = CASE WHEN $4 THEN NOW() ELSE refunded_at END,
               updated_at = NOW()
           WHERE id = $1
           RETURNING id, user_id, phone_number, network, capacity, price, status,
                     vendor_reference, processed_by, refunded_at, created_at, updated_at"#,
    )
    .bind(order.id)
    .bind(status)
    .bind(admin_id)
    .bind(refunded)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query(
        r#"INSERT INTO order_status_history (order_id, status, previous_status, changed_by, bulk_update)
           VALUES ($1, $2, $3, $4, $5)"#,
    )
    .bind(order.id)
    .bind(status)
    .bind(order.status)
    .bind(admin_id)
    .bind(bulk_update)
    .execute(&mut **tx)
    .await?;

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_results_serialize_with_wire_field_names() {
        let results = BulkStatusResults {
            success: vec![BulkSuccess {
                id: Uuid::nil(),
                geonet_reference: Some("GEO-1".to_string()),
                previous_status: OrderStatus::Processing,
                status: OrderStatus::Failed,
                message: None,
            }],
            failed: vec![BulkFailure {
                id: "bad-ref".to_string(),
                geonet_reference: None,
                error: "Batch transaction error".to_string(),
            }],
            not_found: vec!["missing-ref".to_string()],
        };

        let value = serde_json::to_value(&results).unwrap();
        assert_eq!(value["success"][0]["previousStatus"], "processing");
        assert_eq!(value["success"][0]["status"], "failed");
        assert!(value["success"][0].get("message").is_none());
        assert_eq!(value["notFound"][0], "missing-ref");
        assert_eq!(value["failed"][0]["error"], "Batch transaction error");
        assert!(value["failed"][0].get("geonetReference").is_none());
    }

    #[test]
    fn bulk_classification_keeps_pre_error_outcomes_and_fails_the_rest() {
        let refs: Vec<String> = (1..=15).map(|i| format!("GEO-{}", i)).collect();
        let mut results = BulkStatusResults::default();

        // First batch of ten commits: eight transitions, two unknown refs.
        let first: Vec<ChunkEntry> = refs[..10]
            .iter()
            .enumerate()
            .map(|(i, reference)| {
                if i == 3 || i == 7 {
                    ChunkEntry::NotFound
                } else {
                    ChunkEntry::Transitioned {
                        id: Uuid::new_v4(),
                        vendor_reference: Some(reference.clone()),
                        previous_status: OrderStatus::Processing,
                    }
                }
            })
            .collect();
        classify_chunk(&mut results, &refs[..10], &first, OrderStatus::Failed);

        // Second batch errors on its last order: the four orders classified
        // before the error keep their outcome despite the rollback, and the
        // unrecorded remainder is reported failed.
        let second: Vec<ChunkEntry> = refs[10..14]
            .iter()
            .map(|reference| ChunkEntry::Transitioned {
                id: Uuid::new_v4(),
                vendor_reference: Some(reference.clone()),
                previous_status: OrderStatus::Pending,
            })
            .collect();
        classify_chunk(&mut results, &refs[10..], &second, OrderStatus::Failed);

        assert_eq!(results.success.len(), 12);
        assert_eq!(results.not_found, ["GEO-4", "GEO-8"]);
        assert_eq!(results.failed.len(), 1);
        assert_eq!(results.failed[0].id, "GEO-15");
        assert_eq!(results.failed[0].error, "Batch transaction error");
    }

    #[test]
    fn no_op_entries_carry_an_explanatory_message() {
        let entry = BulkSuccess {
            id: Uuid::nil(),
            geonet_reference: None,
            previous_status: OrderStatus::Completed,
            status: OrderStatus::Completed,
            message: Some("Status already set (no change needed)".to_string()),
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["message"], "Status already set (no change needed)");
    }
}
