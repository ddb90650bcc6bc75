pub mod orderdtos;
pub mod transactiondtos;
pub mod userdtos;
pub mod walletdtos;
