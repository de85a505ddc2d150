pub mod merch;
pub mod purchases;
pub mod transactions;
pub mod users;
