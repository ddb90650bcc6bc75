pub mod inventory;
pub mod orders;
pub mod reports;
pub mod transactions;
pub mod users;
