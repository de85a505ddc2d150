pub mod auth;
pub mod catalog;
pub mod error;
pub mod ledger;
pub mod password;
pub mod repo;
pub mod service;
pub mod shop;
pub mod token;
