pub mod error;
pub mod paystack;
pub mod sms;
