use async_trait::async_trait;
use trade_signal_core::candle::Candle;
use trade_signal_core::news::NewsArticle;
use trade_signal_core::timeframe::Timeframe;

use crate::error::ProviderError;

/// Trait for fetching recent candles from a broker terminal.
#[async_trait]
pub trait CandleProvider: Send + Sync {
    /// Provider name (for logging/display).
    fn name(&self) -> &str;

    /// Fetch the `count` most recent candles for a symbol.
    /// Returns candles sorted by timestamp, most recent last.
    /// Returns `ProviderError::NoData` rather than an empty vec.
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Candle>, ProviderError>;
}

/// Trait for searching news headlines.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Provider name (for logging/display).
    fn name(&self) -> &str;

    /// Run a search and return every matching article, in provider order.
    async fn fetch_articles(&self, query: &str) -> Result<Vec<NewsArticle>, ProviderError>;
}
