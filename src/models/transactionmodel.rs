// models/transactionmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Refund,
    Payment,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "transaction_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl TransactionType {
    pub fn to_str(&self) -> &str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Refund => "refund",
            TransactionType::Payment => "payment",
        }
    }
}

impl TransactionStatus {
    pub fn to_str(&self) -> &str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Refunded => "refunded",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionType::Deposit),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            "refund" => Ok(TransactionType::Refund),
            "payment" => Ok(TransactionType::Payment),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "failed" => Ok(TransactionStatus::Failed),
            "refunded" => Ok(TransactionStatus::Refunded),
            _ => Err(()),
        }
    }
}

/// One immutable balance-affecting event. Amount, type and owner never change
/// after insert; only `status` and `metadata` may be updated (gateway
/// verification, admin notes).
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub transaction_type: TransactionType,
    /// Amount in pesewas, always positive.
    pub amount: i64,
    pub status: TransactionStatus,
    pub reference: String,
    /// Origin of the event: `admin-deposit`, `admin-deduction`, `paystack`,
    /// `wallet-refund`, ... Open set, so a plain string column.
    pub gateway: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn amount_in_cedis(&self) -> f64 {
        self.amount as f64 / 100.0
    }
}

pub const GATEWAY_ADMIN_DEPOSIT: &str = "admin-deposit";
pub const GATEWAY_ADMIN_DEDUCTION: &str = "admin-deduction";
pub const GATEWAY_WALLET_REFUND: &str = "wallet-refund";
pub const GATEWAY_PAYSTACK: &str = "paystack";

pub fn generate_admin_reference(prefix: &str) -> String {
    format!(
        "{}-{}",
        prefix,
        Uuid::new_v4().simple().to_string()[..16].to_uppercase()
    )
}
