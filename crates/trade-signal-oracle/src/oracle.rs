use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};
use trade_signal_core::indicators::IndicatorTable;
use trade_signal_core::news::NewsArticle;
use trade_signal_core::signal::{MarketSignal, NewsSignal};

use crate::client::ChatCompletion;
use crate::error::OracleError;
use crate::prompt;

/// A validated model answer together with the JSON object the model produced.
/// `raw` is what the API passes through to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict<S> {
    pub signal: S,
    pub raw: Value,
}

/// Turns indicator tables and headline lists into trade signals via a chat model.
#[derive(Clone)]
pub struct DecisionOracle {
    chat: Arc<dyn ChatCompletion>,
}

impl DecisionOracle {
    pub fn new(chat: Arc<dyn ChatCompletion>) -> Self {
        Self { chat }
    }

    pub fn model(&self) -> &str {
        self.chat.model()
    }

    /// Ask for a signal from the latest two rows of an indicator table.
    pub async fn ask_market(
        &self,
        symbol: &str,
        table: &IndicatorTable,
    ) -> Result<Verdict<MarketSignal>, OracleError> {
        let snapshot = table.snapshot()?;
        let context = prompt::market_context(symbol, &snapshot, table.settings());

        info!(
            "{symbol}: asking {} (price {}, RSI {:.2})",
            self.chat.model(),
            snapshot.close,
            snapshot.rsi
        );
        let content = self
            .chat
            .complete_json(&prompt::market_system_prompt(), &context)
            .await?;
        let verdict: Verdict<MarketSignal> = parse_verdict(&content)?;

        let implied = prompt::implied_decision(&snapshot);
        if verdict.signal.decision != implied {
            warn!(
                "{symbol}: model chose {} but strategy rules imply {implied}",
                verdict.signal.decision
            );
        }
        info!("{symbol}: market signal {}", verdict.signal.decision);
        Ok(verdict)
    }

    /// Ask for a sentiment signal from the leading headlines.
    pub async fn ask_news(
        &self,
        symbol: &str,
        articles: &[NewsArticle],
    ) -> Result<Verdict<NewsSignal>, OracleError> {
        if articles.is_empty() {
            return Err(OracleError::NoHeadlines);
        }

        let context = prompt::news_context(symbol, articles);
        info!(
            "{symbol}: asking {} about {} headline(s)",
            self.chat.model(),
            articles.len().min(prompt::MAX_HEADLINES)
        );
        let content = self
            .chat
            .complete_json(prompt::NEWS_SYSTEM_PROMPT, &context)
            .await?;
        let verdict: Verdict<NewsSignal> = parse_verdict(&content)?;

        info!(
            "{symbol}: news signal {} (sentiment {:.2})",
            verdict.signal.decision, verdict.signal.sentiment_score
        );
        Ok(verdict)
    }
}

/// Parse model content as a JSON object and validate it against `S`.
pub fn parse_verdict<S: DeserializeOwned>(content: &str) -> Result<Verdict<S>, OracleError> {
    let raw: Value = serde_json::from_str(content.trim())
        .map_err(|e| OracleError::MalformedOutput(format!("not JSON: {e}")))?;

    if !raw.is_object() {
        return Err(OracleError::MalformedOutput(format!(
            "expected a JSON object, got {raw}"
        )));
    }

    let signal = serde_json::from_value(raw.clone())
        .map_err(|e| OracleError::MalformedOutput(format!("unexpected shape: {e}")))?;

    Ok(Verdict { signal, raw })
}
