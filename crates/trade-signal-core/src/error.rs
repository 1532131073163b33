use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Not enough data: {required} candle(s) required, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error("Unknown timeframe '{0}'. Expected one of: M1, M5, M15, M30, H1, H4, D1, W1, MN1")]
    InvalidTimeframe(String),

    #[error("Indicator error: {0}")]
    Indicator(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
