//! Social Swap Pool node
//!
//! Serves [`lib_pool_governance::SwapPoolService`] over HTTP. The binary in
//! `main.rs` only parses arguments, sets up logging and calls [`node::run`].

pub mod api;
pub mod config;
pub mod node;

pub use config::NodeConfig;
