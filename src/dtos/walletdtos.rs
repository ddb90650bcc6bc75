// dtos/walletdtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::transactionmodel::Transaction;

#[derive(Debug, Deserialize, Validate)]
pub struct AddMoneyDto {
    /// Amount in cedis; converted to pesewas before it touches the ledger.
    #[validate(range(min = 0.01, message = "Please provide a valid amount"))]
    pub amount: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeductMoneyDto {
    #[validate(range(min = 0.01, message = "Please provide a valid amount"))]
    pub amount: f64,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// Amount in cedis.
    pub amount: f64,
    pub status: String,
    pub reference: String,
    pub gateway: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionDto {
    pub fn filter_transaction(transaction: &Transaction) -> Self {
        TransactionDto {
            id: transaction.id.to_string(),
            user_id: transaction.user_id.to_string(),
            transaction_type: transaction.transaction_type.to_str().to_string(),
            amount: transaction.amount_in_cedis(),
            status: transaction.status.to_str().to_string(),
            reference: transaction.reference.clone(),
            gateway: transaction.gateway.clone(),
            metadata: transaction.metadata.clone(),
            created_at: transaction.created_at,
            updated_at: transaction.updated_at,
        }
    }

    pub fn filter_transactions(transactions: &[Transaction]) -> Vec<Self> {
        transactions.iter().map(Self::filter_transaction).collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletChangeResponseDto {
    pub msg: String,
    /// Balances in cedis.
    pub current_balance: f64,
    pub previous_balance: f64,
    pub transaction: TransactionDto,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transactionmodel::{TransactionStatus, TransactionType};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn transaction_dto_uses_wire_names_and_cedis() {
        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            transaction_type: TransactionType::Refund,
            amount: 1950,
            status: TransactionStatus::Completed,
            reference: "REFUND-abc-123".to_string(),
            gateway: "wallet-refund".to_string(),
            metadata: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let dto = TransactionDto::filter_transaction(&transaction);
        assert_eq!(dto.amount, 19.50);

        let value = serde_json::to_value(&dto).unwrap();
        assert_eq!(value["type"], "refund");
        assert_eq!(value["status"], "completed");
        assert_eq!(value["userId"], transaction.user_id.to_string());
    }
}
