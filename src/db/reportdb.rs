// db/reportdb.rs
//
// Read-only aggregates for the admin reports. Amounts here are converted to
// cedis in SQL since these rows go straight into responses.
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::Row;

use crate::db::db::DBClient;
use crate::dtos::orderdtos::OrderDto;
use crate::models::ordermodel::{DataPurchase, OrderStatus};

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummary {
    pub network: String,
    pub count: i64,
    pub total_gb: f64,
    pub revenue: f64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GatewayDeposits {
    pub gateway: String,
    pub count: i64,
    pub total_amount: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositSummary {
    pub total_deposits: f64,
    pub deposit_count: i64,
    pub average_deposit: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminActivity {
    pub deposit_count: i64,
    pub deduction_count: i64,
    pub refund_count: i64,
    pub total_deposits: f64,
    pub total_deductions: f64,
    pub total_refunds: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_orders: i64,
    pub total_revenue: f64,
    pub total_capacity_gb: f64,
    pub network_summary: Vec<NetworkSummary>,
    pub status_summary: Vec<StatusCount>,
    pub deposits: DepositSummary,
    pub deposits_by_gateway: Vec<GatewayDeposits>,
    pub admin_activity: AdminActivity,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatistics {
    pub total_users: i64,
    pub total_wallet_balance: f64,
    pub total_orders: i64,
    pub orders_today: i64,
    pub total_revenue: f64,
    pub revenue_today: f64,
    pub status_summary: Vec<StatusCount>,
    pub network_summary: Vec<NetworkSummary>,
    pub recent_orders: Vec<OrderDto>,
}

#[async_trait]
pub trait ReportExt {
    async fn daily_summary(&self, date: NaiveDate) -> Result<DailySummary, sqlx::Error>;
    async fn dashboard_statistics(&self) -> Result<DashboardStatistics, sqlx::Error>;
}

#[async_trait]
impl ReportExt for DBClient {
    async fn daily_summary(&self, date: NaiveDate) -> Result<DailySummary, sqlx::Error> {
        const DAY: &str =
            "created_at >= $1::date AND created_at < ($1::date + INTERVAL '1 day')";

        let orders = sqlx::query(&format!(
            r#"SELECT COUNT(*) AS total_orders,
                      (COALESCE(SUM(price), 0) / 100.0)::DOUBLE PRECISION AS total_revenue,
                      COALESCE(SUM(capacity), 0)::DOUBLE PRECISION AS total_capacity
               FROM data_purchases WHERE {DAY}"#
        ))
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        let network_summary = sqlx::query_as::<_, NetworkSummary>(&format!(
            r#"SELECT network,
                      COUNT(*) AS count,
                      COALESCE(SUM(capacity), 0)::DOUBLE PRECISION AS total_gb,
                      (COALESCE(SUM(price), 0) / 100.0)::DOUBLE PRECISION AS revenue
               FROM data_purchases WHERE {DAY}
               GROUP BY network ORDER BY revenue DESC"#
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        let status_summary = sqlx::query_as::<_, StatusCount>(&format!(
            r#"SELECT status, COUNT(*) AS count
               FROM data_purchases WHERE {DAY}
               GROUP BY status ORDER BY count DESC"#
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        let deposits = sqlx::query(&format!(
            r#"SELECT (COALESCE(SUM(amount), 0) / 100.0)::DOUBLE PRECISION AS total_deposits,
                      COUNT(*) AS deposit_count,
                      (COALESCE(AVG(amount), 0) / 100.0)::DOUBLE PRECISION AS average_deposit
               FROM transactions
               WHERE transaction_type = 'deposit' AND status = 'completed' AND {DAY}"#
        ))
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        let deposits_by_gateway = sqlx::query_as::<_, GatewayDeposits>(&format!(
            r#"SELECT gateway,
                      COUNT(*) AS count,
                      (COALESCE(SUM(amount), 0) / 100.0)::DOUBLE PRECISION AS total_amount
               FROM transactions
               WHERE transaction_type = 'deposit' AND status = 'completed' AND {DAY}
               GROUP BY gateway ORDER BY total_amount DESC"#
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        let admin = sqlx::query(&format!(
            r#"SELECT COUNT(*) FILTER (WHERE gateway = 'admin-deposit') AS deposit_count,
                      COUNT(*) FILTER (WHERE gateway = 'admin-deduction') AS deduction_count,
                      COUNT(*) FILTER (WHERE transaction_type = 'refund') AS refund_count,
                      (COALESCE(SUM(amount) FILTER (WHERE gateway = 'admin-deposit'), 0) / 100.0)::DOUBLE PRECISION AS total_deposits,
                      (COALESCE(SUM(amount) FILTER (WHERE gateway = 'admin-deduction'), 0) / 100.0)::DOUBLE PRECISION AS total_deductions,
                      (COALESCE(SUM(amount) FILTER (WHERE transaction_type = 'refund'), 0) / 100.0)::DOUBLE PRECISION AS total_refunds
               FROM transactions
               WHERE status = 'completed' AND {DAY}"#
        ))
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(DailySummary {
            date,
            total_orders: orders.get("total_orders"),
            total_revenue: orders.get("total_revenue"),
            total_capacity_gb: orders.get("total_capacity"),
            network_summary,
            status_summary,
            deposits: DepositSummary {
                total_deposits: deposits.get("total_deposits"),
                deposit_count: deposits.get("deposit_count"),
                average_deposit: deposits.get("average_deposit"),
            },
            deposits_by_gateway,
            admin_activity: AdminActivity {
                deposit_count: admin.get("deposit_count"),
                deduction_count: admin.get("deduction_count"),
                refund_count: admin.get("refund_count"),
                total_deposits: admin.get("total_deposits"),
                total_deductions: admin.get("total_deductions"),
                total_refunds: admin.get("total_refunds"),
            },
        })
    }

    async fn dashboard_statistics(&self) -> Result<DashboardStatistics, sqlx::Error> {
        let users = sqlx::query(
            r#"SELECT COUNT(*) AS total_users,
                      (COALESCE(SUM(wallet_balance), 0) / 100.0)::DOUBLE PRECISION AS total_wallet_balance
               FROM users"#,
        )
        .fetch_one(&self.pool)
        .await?;

        let orders = sqlx::query(
            r#"SELECT COUNT(*) AS total_orders,
                      COUNT(*) FILTER (WHERE created_at >= CURRENT_DATE) AS orders_today,
                      (COALESCE(SUM(price), 0) / 100.0)::DOUBLE PRECISION AS total_revenue,
                      (COALESCE(SUM(price) FILTER (WHERE created_at >= CURRENT_DATE), 0) / 100.0)::DOUBLE PRECISION AS revenue_today
               FROM data_purchases"#,
        )
        .fetch_one(&self.pool)
        .await?;

        let status_summary = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM data_purchases GROUP BY status ORDER BY count DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let network_summary = sqlx::query_as::<_, NetworkSummary>(
            r#"SELECT network,
                      COUNT(*) AS count,
                      COALESCE(SUM(capacity), 0)::DOUBLE PRECISION AS total_gb,
                      (COALESCE(SUM(price), 0) / 100.0)::DOUBLE PRECISION AS revenue
               FROM data_purchases
               GROUP BY network ORDER BY revenue DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;

        let recent_orders = sqlx::query_as::<_, DataPurchase>(
            r#"SELECT id, user_id, phone_number, network, capacity, price, status,
                      vendor_reference, processed_by, refunded_at, created_at, updated_at
               FROM data_purchases ORDER BY created_at DESC LIMIT 10"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(DashboardStatistics {
            total_users: users.get("total_users"),
            total_wallet_balance: users.get("total_wallet_balance"),
            total_orders: orders.get("total_orders"),
            orders_today: orders.get("orders_today"),
            total_revenue: orders.get("total_revenue"),
            revenue_today: orders.get("revenue_today"),
            status_summary,
            network_summary,
            recent_orders: OrderDto::filter_orders(&recent_orders),
        })
    }
}
