use thiserror::Error;
use trade_signal_core::error::MarketDataError;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned no message content")]
    EmptyResponse,

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("No headlines to analyze")]
    NoHeadlines,

    #[error("Cannot build market snapshot: {0}")]
    Snapshot(#[from] MarketDataError),

    #[error("Oracle configuration error: {0}")]
    Config(String),
}
