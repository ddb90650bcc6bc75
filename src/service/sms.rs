// service/sms.rs
//
// mNotify SMS collaborator. Sends are always best-effort: handlers call
// `notify` after their transaction has committed, and every failure ends up
// in the logs instead of the response.
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::utils::currency::format_pesewas_as_cedis;

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("Invalid phone number format")]
    InvalidPhone,

    #[error("Could not parse provider response: {0}")]
    UnrecognizedResponse(String),

    #[error("{0}")]
    Provider(&'static str),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Successful provider outcomes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MnotifyCode {
    Sent,
    Scheduled,
}

#[derive(Clone)]
pub struct SmsService {
    api_key: String,
    sender_id: String,
    base_url: String,
    client: reqwest::Client,
}

impl SmsService {
    pub fn new(config: &Config) -> Self {
        SmsService {
            api_key: config.mnotify_api_key.clone(),
            sender_id: config.mnotify_sender_id.clone(),
            base_url: config.mnotify_base_url.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn send(&self, to: &str, message: &str) -> Result<MnotifyCode, SmsError> {
        let phone = format_ghana_phone(to);
        if phone.len() < 12 {
            return Err(SmsError::InvalidPhone);
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("to", phone.as_str()),
                ("msg", message),
                ("sender_id", self.sender_id.as_str()),
            ])
            .send()
            .await?;

        let http_status = response.status();
        let body = response.text().await?;

        match parse_response_code(&body) {
            Some(code) => map_response_code(code),
            // The provider occasionally answers with free-form text; a 200
            // without a recognizable code is treated as sent, matching its
            // observed behavior.
            None if http_status.is_success() => Ok(MnotifyCode::Sent),
            None => Err(SmsError::UnrecognizedResponse(body)),
        }
    }

    /// Fire-and-forget wrapper: logs the outcome, never propagates.
    pub async fn notify(&self, to: &str, message: &str) {
        match self.send(to, message).await {
            Ok(code) => tracing::info!(phone = %to, ?code, "SMS dispatched"),
            Err(e) => tracing::warn!(phone = %to, error = %e, "Failed to send SMS"),
        }
    }
}

/// Normalise a phone number to the Ghana international format mNotify
/// expects: digits only, `0XXXXXXXXX` becomes `233XXXXXXXXX`.
pub fn format_ghana_phone(phone: &str) -> String {
    let mut cleaned: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if cleaned.starts_with('0') {
        cleaned = format!("233{}", &cleaned[1..]);
    }
    if !cleaned.starts_with("233") {
        cleaned = format!("233{}", cleaned);
    }

    cleaned
}

/// The provider reports its result code as a bare number, a string containing
/// a number, or a JSON object with a `code` field. Collapse all three into a
/// numeric code, or None when nothing parseable is present.
pub fn parse_response_code(body: &str) -> Option<u32> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        match value {
            Value::Number(n) => return n.as_u64().map(|n| n as u32),
            Value::String(s) => return extract_digits(&s),
            Value::Object(map) => {
                if let Some(code) = map.get("code") {
                    return match code {
                        Value::Number(n) => n.as_u64().map(|n| n as u32),
                        Value::String(s) => extract_digits(s),
                        _ => None,
                    };
                }
                return None;
            }
            _ => return None,
        }
    }

    extract_digits(body)
}

fn extract_digits(s: &str) -> Option<u32> {
    let digits: String = s
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn map_response_code(code: u32) -> Result<MnotifyCode, SmsError> {
    match code {
        1000 => Ok(MnotifyCode::Sent),
        1007 => Ok(MnotifyCode::Scheduled),
        1002 => Err(SmsError::Provider("SMS sending failed")),
        1003 => Err(SmsError::Provider("Insufficient SMS balance")),
        1004 => Err(SmsError::Provider("Invalid API key")),
        1005 => Err(SmsError::Provider("Invalid phone number")),
        1006 => Err(SmsError::Provider(
            "Invalid Sender ID. Sender ID must not be more than 11 characters",
        )),
        1008 => Err(SmsError::Provider("Empty message")),
        1011 => Err(SmsError::Provider("Numeric Sender IDs are not allowed")),
        1012 => Err(SmsError::Provider("Sender ID is not registered")),
        _ => Err(SmsError::Provider("Unknown response code")),
    }
}

// Message texts, kept byte-compatible with what customers already receive.

pub fn credit_message(name: &str, amount: i64, new_balance: i64) -> String {
    format!(
        "Hello {}! Your DataMartGH account has been credited with {}. Your new balance is {}. Thank you for choosing DataMartGH!",
        name,
        format_pesewas_as_cedis(amount),
        format_pesewas_as_cedis(new_balance)
    )
}

pub fn debit_message(amount: i64, new_balance: i64, reason: Option<&str>) -> String {
    format!(
        "DATAMART: {} has been deducted from your wallet. Your new balance is {}. Reason: {}. For inquiries, contact support.",
        format_pesewas_as_cedis(amount),
        format_pesewas_as_cedis(new_balance),
        reason.unwrap_or("Administrative adjustment")
    )
}

pub fn refund_message(
    name: &str,
    price: i64,
    capacity: f64,
    network: &str,
    new_balance: i64,
) -> String {
    format!(
        "Hello {}! Your DataMartGH account has been credited with a refund of {} for your {}GB {} order. Your new balance is {}. We apologize for any inconvenience.",
        name,
        format_pesewas_as_cedis(price),
        capacity,
        network,
        format_pesewas_as_cedis(new_balance)
    )
}

pub fn account_disabled_message(reason: &str) -> String {
    format!(
        "DATAMART: Your account has been disabled. Reason: {}. Contact support for assistance.",
        reason
    )
}

pub fn account_enabled_message() -> String {
    "DATAMART: Your account has been re-enabled. You can now access all platform features. Thank you for choosing DATAMART.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_local_numbers_to_international() {
        assert_eq!(format_ghana_phone("0241234567"), "233241234567");
        assert_eq!(format_ghana_phone("+233 24 123 4567"), "233241234567");
        assert_eq!(format_ghana_phone("241234567"), "233241234567");
        assert_eq!(format_ghana_phone("233241234567"), "233241234567");
    }

    #[test]
    fn parses_bare_numeric_response() {
        assert_eq!(parse_response_code("1000"), Some(1000));
    }

    #[test]
    fn parses_string_response_with_surrounding_text() {
        assert_eq!(parse_response_code("\"code: 1007 accepted\""), Some(1007));
    }

    #[test]
    fn parses_object_response() {
        assert_eq!(parse_response_code(r#"{"code": 1000}"#), Some(1000));
        assert_eq!(parse_response_code(r#"{"code": "1003"}"#), Some(1003));
    }

    #[test]
    fn unparseable_response_yields_none() {
        assert_eq!(parse_response_code("OK"), None);
        assert_eq!(parse_response_code(r#"{"status": "done"}"#), None);
    }

    #[test]
    fn maps_success_and_error_codes() {
        assert_eq!(map_response_code(1000).unwrap(), MnotifyCode::Sent);
        assert_eq!(map_response_code(1007).unwrap(), MnotifyCode::Scheduled);
        assert!(map_response_code(1003).is_err());
        assert!(map_response_code(9999).is_err());
    }

    #[test]
    fn credit_message_formats_amounts_in_cedis() {
        let msg = credit_message("Ama", 1950, 6950);
        assert!(msg.contains("GHS 19.50"));
        assert!(msg.contains("GHS 69.50"));
    }

    #[test]
    fn debit_message_defaults_reason() {
        let msg = debit_message(500, 1000, None);
        assert!(msg.contains("Administrative adjustment"));
    }
}
