pub mod client;
pub mod error;
pub mod manager;
mod retry;
pub mod token;

pub use client::OlmedAuthClient;
pub use error::OlmedError;
pub use manager::TokenManager;
pub use token::{TokenInfo, TokenStore, OLMED_PROVIDER};
