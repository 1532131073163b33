use std::sync::Arc;

use trade_signal_core::indicators::IndicatorSettings;
use trade_signal_core::timeframe::Timeframe;
use trade_signal_oracle::oracle::DecisionOracle;
use trade_signal_providers::provider::{CandleProvider, NewsProvider};

/// What a request analyzes when it does not say otherwise.
#[derive(Debug, Clone)]
pub struct Defaults {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub candle_count: usize,
    pub news_query: String,
    pub indicators: IndicatorSettings,
}

/// Clients and settings shared by every request. Built once at startup.
pub struct AppContext {
    pub candles: Arc<dyn CandleProvider>,
    pub news: Arc<dyn NewsProvider>,
    pub oracle: DecisionOracle,
    pub defaults: Defaults,
}
