use thiserror::Error;
use trade_signal_core::error::MarketDataError;
use trade_signal_oracle::error::OracleError;
use trade_signal_providers::error::ProviderError;
use warp::http::StatusCode;

/// Failure of one pipeline run, classified by how the API reports it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An upstream (broker, news, model) was unreachable or gave nothing usable.
    #[error("{0}")]
    Unavailable(String),

    /// Anything else: bad parameters, not enough data to build a snapshot.
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        ApiError::Unavailable(e.to_string())
    }
}

impl From<OracleError> for ApiError {
    fn from(e: OracleError) -> Self {
        match e {
            OracleError::Snapshot(inner) => ApiError::from(inner),
            other => ApiError::Unavailable(other.to_string()),
        }
    }
}

impl From<MarketDataError> for ApiError {
    fn from(e: MarketDataError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}
