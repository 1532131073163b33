pub mod error;
pub mod mt5;
pub mod newsapi;
pub mod provider;
