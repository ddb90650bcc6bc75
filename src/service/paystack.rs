// service/paystack.rs
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentVerification {
    /// Gateway-reported charge status ("success", "failed", "abandoned", ...)
    pub status: String,
    /// Charged amount in pesewas (Paystack reports minor units).
    pub amount: i64,
    /// Full gateway payload, merged into transaction metadata on
    /// reconciliation.
    pub raw: serde_json::Value,
}

pub struct PaystackService {
    secret_key: String,
    client: reqwest::Client,
}

impl PaystackService {
    pub fn new(config: &Config) -> Self {
        PaystackService {
            secret_key: config.paystack_secret_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn verify(
        &self,
        reference: &str,
    ) -> Result<PaymentVerification, Box<dyn std::error::Error + Send + Sync>> {
        let response = self
            .client
            .get(format!(
                "https://api.paystack.co/transaction/verify/{}",
                reference
            ))
            .header("Authorization", format!("Bearer {}", self.secret_key))
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let body: serde_json::Value = response.json().await?;

        if !body["status"].as_bool().unwrap_or(false) {
            return Err(body["message"]
                .as_str()
                .unwrap_or("Paystack verification failed")
                .into());
        }

        let data = body["data"].clone();
        Ok(PaymentVerification {
            status: data["status"].as_str().unwrap_or("unknown").to_string(),
            amount: data["amount"].as_i64().unwrap_or(0),
            raw: data,
        })
    }
}
