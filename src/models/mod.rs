pub mod inventorymodel;
pub mod ordermodel;
pub mod transactionmodel;
pub mod usermodel;
