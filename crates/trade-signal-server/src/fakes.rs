//! In-process stand-ins for the broker, news and model upstreams.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trade_signal_core::candle::Candle;
use trade_signal_core::indicators::IndicatorSettings;
use trade_signal_core::news::NewsArticle;
use trade_signal_core::timeframe::Timeframe;
use trade_signal_oracle::client::ChatCompletion;
use trade_signal_oracle::error::OracleError;
use trade_signal_oracle::oracle::DecisionOracle;
use trade_signal_providers::error::ProviderError;
use trade_signal_providers::newsapi::GOLD_NEWS_QUERY;
use trade_signal_providers::provider::{CandleProvider, NewsProvider};

use crate::context::{AppContext, Defaults};

/// Serves fixed candles, or fails like an unreachable terminal when `None`.
pub struct StaticCandles(pub Option<Vec<Candle>>);

#[async_trait]
impl CandleProvider for StaticCandles {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_candles(
        &self,
        _symbol: &str,
        _timeframe: Timeframe,
        _count: usize,
    ) -> Result<Vec<Candle>, ProviderError> {
        self.0.clone().ok_or_else(|| ProviderError::Connection {
            provider: "static".into(),
            message: "initialize failed".into(),
        })
    }
}

/// Serves fixed articles, or fails like a 503 from the news API when `None`.
pub struct StaticNews(pub Option<Vec<NewsArticle>>);

#[async_trait]
impl NewsProvider for StaticNews {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_articles(&self, _query: &str) -> Result<Vec<NewsArticle>, ProviderError> {
        self.0.clone().ok_or(ProviderError::Api {
            status: 503,
            message: "unavailable".into(),
        })
    }
}

pub struct CannedChat(pub String);

#[async_trait]
impl ChatCompletion for CannedChat {
    fn model(&self) -> &str {
        "canned"
    }

    async fn complete_json(&self, _system: &str, _user: &str) -> Result<String, OracleError> {
        Ok(self.0.clone())
    }
}

/// Rising-then-falling closes around 2600.
pub fn candles(len: usize) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
    (0..len)
        .map(|i| {
            let close = Decimal::from(2600 + (i % 11) as i64 - 5);
            Candle {
                timestamp: start + Duration::minutes(15 * i as i64),
                open: close,
                high: close + dec!(1.25),
                low: close - dec!(1.25),
                close,
                volume: 100,
            }
        })
        .collect()
}

pub fn articles(n: usize) -> Vec<NewsArticle> {
    (0..n)
        .map(|i| NewsArticle {
            title: Some(format!("Gold headline {i}")),
            desc: Some("Bullion moves".into()),
            source: Some("Wire".into()),
            url: Some(format!("https://example.com/{i}")),
        })
        .collect()
}

pub fn context(
    candles: Option<Vec<Candle>>,
    articles: Option<Vec<NewsArticle>>,
    reply: &str,
) -> AppContext {
    AppContext {
        candles: Arc::new(StaticCandles(candles)),
        news: Arc::new(StaticNews(articles)),
        oracle: DecisionOracle::new(Arc::new(CannedChat(reply.to_string()))),
        defaults: Defaults {
            symbol: "XAUUSD".into(),
            timeframe: Timeframe::M15,
            candle_count: 100,
            news_query: GOLD_NEWS_QUERY.into(),
            indicators: IndicatorSettings::default(),
        },
    }
}
