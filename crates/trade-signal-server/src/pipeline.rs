use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use trade_signal_core::indicators::IndicatorTable;
use trade_signal_core::news::NewsArticle;
use trade_signal_core::timeframe::Timeframe;

use crate::context::AppContext;
use crate::error::ApiError;

/// Largest candle window a single request may ask the terminal for.
pub const MAX_CANDLES: usize = 5_000;

/// Optional overrides accepted by `/analyze/`.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeQuery {
    pub symbol: Option<String>,
    pub timeframe: Option<String>,
    pub count: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketRequest {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub count: usize,
}

impl MarketRequest {
    /// Apply query overrides on top of the configured defaults.
    pub fn resolve(query: &AnalyzeQuery, ctx: &AppContext) -> Result<Self, ApiError> {
        let defaults = &ctx.defaults;

        let symbol = match query.symbol.as_deref().map(str::trim) {
            Some("") => return Err(ApiError::BadRequest("symbol must not be empty".into())),
            Some(s) => s.to_uppercase(),
            None => defaults.symbol.clone(),
        };

        let timeframe = match query.timeframe.as_deref() {
            Some(tf) => tf.parse::<Timeframe>()?,
            None => defaults.timeframe,
        };

        let count = match query.count.as_deref() {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ApiError::BadRequest(format!("count '{raw}' is not a number")))?,
            None => defaults.candle_count,
        };
        if !(2..=MAX_CANDLES).contains(&count) {
            return Err(ApiError::BadRequest(format!(
                "count must be between 2 and {MAX_CANDLES}, got {count}"
            )));
        }

        Ok(Self {
            symbol,
            timeframe,
            count,
        })
    }
}

/// Candles -> indicators -> market oracle. Returns the model's JSON object.
pub async fn analyze_market(ctx: &AppContext, query: &AnalyzeQuery) -> Result<Value, ApiError> {
    let request = MarketRequest::resolve(query, ctx)?;
    info!(
        "Analyzing {} {} over {} candle(s) via {}",
        request.symbol,
        request.timeframe,
        request.count,
        ctx.candles.name()
    );

    let candles = ctx
        .candles
        .fetch_candles(&request.symbol, request.timeframe, request.count)
        .await
        .inspect_err(|e| warn!("{}: candle fetch failed: {e}", request.symbol))?;

    let table = IndicatorTable::compute(&candles, ctx.defaults.indicators)?;
    let verdict = ctx
        .oracle
        .ask_market(&request.symbol, &table)
        .await
        .inspect_err(|e| warn!("{}: market oracle failed: {e}", request.symbol))?;

    Ok(verdict.raw)
}

/// Headline search with the configured query.
pub async fn fetch_news(ctx: &AppContext) -> Result<Vec<NewsArticle>, ApiError> {
    let articles = ctx
        .news
        .fetch_articles(&ctx.defaults.news_query)
        .await
        .inspect_err(|e| warn!("{} search failed: {e}", ctx.news.name()))?;
    Ok(articles)
}

/// Headline search -> news oracle. Returns the model's JSON object.
pub async fn analyze_news(ctx: &AppContext) -> Result<Value, ApiError> {
    let articles = fetch_news(ctx).await?;
    let verdict = ctx
        .oracle
        .ask_news(&ctx.defaults.symbol, &articles)
        .await
        .inspect_err(|e| warn!("News oracle failed: {e}"))?;
    Ok(verdict.raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes;

    fn query(symbol: Option<&str>, timeframe: Option<&str>, count: Option<&str>) -> AnalyzeQuery {
        AnalyzeQuery {
            symbol: symbol.map(String::from),
            timeframe: timeframe.map(String::from),
            count: count.map(String::from),
        }
    }

    #[test]
    fn resolve_uses_defaults() {
        let ctx = fakes::context(None, None, "{}");
        let request = MarketRequest::resolve(&AnalyzeQuery::default(), &ctx).unwrap();
        assert_eq!(
            request,
            MarketRequest {
                symbol: "XAUUSD".into(),
                timeframe: Timeframe::M15,
                count: 100,
            }
        );
    }

    #[test]
    fn resolve_applies_overrides() {
        let ctx = fakes::context(None, None, "{}");
        let request =
            MarketRequest::resolve(&query(Some("eurusd"), Some("h1"), Some("250")), &ctx).unwrap();
        assert_eq!(request.symbol, "EURUSD");
        assert_eq!(request.timeframe, Timeframe::H1);
        assert_eq!(request.count, 250);
    }

    #[test]
    fn resolve_rejects_bad_values() {
        let ctx = fakes::context(None, None, "{}");
        for q in [
            query(Some(" "), None, None),
            query(None, Some("M7"), None),
            query(None, None, Some("lots")),
            query(None, None, Some("1")),
            query(None, None, Some("50000")),
        ] {
            let err = MarketRequest::resolve(&q, &ctx).unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)), "{q:?}");
        }
    }

    #[tokio::test]
    async fn analyze_market_passes_model_json_through() {
        let reply = r#"{"decision": "SELL", "confidence": "80%", "reasoning": "overbought"}"#;
        let ctx = fakes::context(Some(fakes::candles(100)), None, reply);
        let value = analyze_market(&ctx, &AnalyzeQuery::default()).await.unwrap();
        assert_eq!(value, serde_json::from_str::<Value>(reply).unwrap());
    }

    #[tokio::test]
    async fn analyze_market_broker_down_is_unavailable() {
        let ctx = fakes::context(None, None, "{}");
        let err = analyze_market(&ctx, &AnalyzeQuery::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unavailable(_)));
    }

    #[tokio::test]
    async fn analyze_market_short_history_is_bad_request() {
        let ctx = fakes::context(Some(fakes::candles(20)), None, "{}");
        let err = analyze_market(&ctx, &AnalyzeQuery::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn analyze_news_with_no_articles_is_unavailable() {
        let ctx = fakes::context(None, Some(Vec::new()), "{}");
        let err = analyze_news(&ctx).await.unwrap_err();
        assert!(matches!(err, ApiError::Unavailable(_)));
    }
}
