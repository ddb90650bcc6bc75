// dtos/transactiondtos.rs
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
    /// Transaction type and status arrive as strings so an unknown value can
    /// be reported as a 400 instead of a deserialization error.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub status: Option<String>,
    pub gateway: Option<String>,
    pub reference: Option<String>,
    pub user_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionStatusDto {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportQueryDto {
    /// Defaults to today when absent.
    pub date: Option<NaiveDate>,
}
