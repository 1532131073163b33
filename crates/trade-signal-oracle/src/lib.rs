pub mod client;
pub mod error;
pub mod oracle;
pub mod prompt;
