pub mod atomic;
pub mod auth;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod errors;
pub mod export;
pub mod keystore;
pub mod vault;
