//! HTTP client for the ledger API: transport, wire types, and server
//! error body handling.

pub mod error_body;
pub mod http;
pub mod types;

pub use http::ApiClient;
