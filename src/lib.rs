pub mod client;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod refresh;
pub mod session;
pub mod store;

pub mod cli;

#[cfg(test)]
pub(crate) mod testutil;
