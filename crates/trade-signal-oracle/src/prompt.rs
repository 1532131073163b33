//! Prompt text for both oracle variants.
//!
//! The market strategy is kept as data so the same rules that are written
//! into the system prompt can be evaluated locally against a snapshot.

use rust_decimal::prelude::ToPrimitive;
use trade_signal_core::indicators::{IndicatorSettings, IndicatorSnapshot};
use trade_signal_core::news::NewsArticle;
use trade_signal_core::signal::Decision;

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

/// Headlines beyond this many are left out of the news prompt.
pub const MAX_HEADLINES: usize = 10;

/// One line of the market strategy.
pub struct MarketRule {
    pub decision: Decision,
    pub text: &'static str,
    applies: fn(&IndicatorSnapshot) -> bool,
}

impl MarketRule {
    pub fn applies(&self, snapshot: &IndicatorSnapshot) -> bool {
        (self.applies)(snapshot)
    }
}

fn price(snapshot: &IndicatorSnapshot) -> f64 {
    snapshot.close.to_f64().unwrap_or(f64::NAN)
}

fn overbought(s: &IndicatorSnapshot) -> bool {
    price(s) > s.bb_upper && s.rsi > RSI_OVERBOUGHT
}

fn oversold(s: &IndicatorSnapshot) -> bool {
    price(s) < s.bb_lower && s.rsi < RSI_OVERSOLD
}

fn mixed(_: &IndicatorSnapshot) -> bool {
    true
}

/// Evaluated in order; the last rule always applies.
pub const MARKET_RULES: &[MarketRule] = &[
    MarketRule {
        decision: Decision::Sell,
        text: "SELL if Price > Upper Bollinger Band AND RSI > 70 (Overbought).",
        applies: overbought,
    },
    MarketRule {
        decision: Decision::Buy,
        text: "BUY if Price < Lower Bollinger Band AND RSI < 30 (Oversold).",
        applies: oversold,
    },
    MarketRule {
        decision: Decision::Wait,
        text: "WAIT if signals are mixed.",
        applies: mixed,
    },
];

/// Decision the stated strategy rules lead to for this snapshot.
pub fn implied_decision(snapshot: &IndicatorSnapshot) -> Decision {
    MARKET_RULES
        .iter()
        .find(|rule| rule.applies(snapshot))
        .map(|rule| rule.decision)
        .unwrap_or(Decision::Wait)
}

const MARKET_OUTPUT_FORMAT: &str = r#"OUTPUT FORMAT:
You must reply with strict JSON only. No text.
Format:
{
    "decision": "BUY" or "SELL" or "WAIT",
    "confidence": "0-100%",
    "entry_price": float,
    "stop_loss": float,
    "take_profit": float,
    "reasoning": "Short explanation",
    "pattern_detected": "Name of pattern (e.g. Overbought Rejection)"
}"#;

pub fn market_system_prompt() -> String {
    let rules = MARKET_RULES
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. {}", i + 1, rule.text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an expert Gold Trader AI.\n\
         Analyze the technical data provided.\n\n\
         STRATEGY RULES:\n{rules}\n\n{MARKET_OUTPUT_FORMAT}"
    )
}

/// Technical context block for the latest candle.
pub fn market_context(
    symbol: &str,
    snapshot: &IndicatorSnapshot,
    settings: &IndicatorSettings,
) -> String {
    format!(
        "ASSET: {symbol}\n\
         CURRENT PRICE: {close}\n\
         RSI ({rsi_period}): {rsi:.2}\n\
         EMA ({ema_period}): {ema:.2}\n\
         BOLLINGER UPPER: {upper:.2}\n\
         BOLLINGER LOWER: {lower:.2}\n\n\
         PREVIOUS CANDLE CLOSE: {prev}\n",
        close = snapshot.close,
        rsi_period = settings.rsi_period,
        rsi = snapshot.rsi,
        ema_period = settings.ema_period,
        ema = snapshot.ema,
        upper = snapshot.bb_upper,
        lower = snapshot.bb_lower,
        prev = snapshot.previous_close,
    )
}

pub const NEWS_SYSTEM_PROMPT: &str = r#"You are an expert Financial News Analyst AI.
Analyze the headlines provided for Gold (XAUUSD).

STRATEGY RULES:
1. BUY if news is overwhelmingly bullish (positive sentiment > 0.7).
2. SELL if news is overwhelmingly bearish (negative sentiment < -0.7).
3. WAIT if news is mixed, neutral, or irrelevant.

OUTPUT FORMAT:
Strict JSON only.
{
    "decision": "BUY" or "SELL" or "WAIT",
    "sentiment_score": float (-1.0 to 1.0),
    "impact_duration": "SHORT-TERM" or "LONG-TERM",
    "reasoning": "Explain based on the news",
    "key_event": "The specific headline driving this decision"
}"#;

/// Bulleted headline block built from the first `MAX_HEADLINES` articles.
pub fn news_context(symbol: &str, articles: &[NewsArticle]) -> String {
    let headlines = articles
        .iter()
        .take(MAX_HEADLINES)
        .map(|article| format!("- {article}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!("ASSET: {symbol}\nLATEST NEWS HEADLINES:\n{headlines}\n")
}
