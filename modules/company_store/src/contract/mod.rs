pub mod client;
pub mod error;
pub mod model;

pub use client::CompanyStoreApi;
pub use error::CompanyStoreError;
pub use model::*;
