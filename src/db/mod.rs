pub mod db;
pub mod inventorydb;
pub mod orderdb;
pub mod reportdb;
pub mod transactiondb;
pub mod userdb;
pub mod walletdb;
