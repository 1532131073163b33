use std::fmt;
use std::str::FromStr;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Trade action recommended by the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Sell,
    Wait,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Decision::Buy => "BUY",
            Decision::Sell => "SELL",
            Decision::Wait => "WAIT",
        })
    }
}

/// Model confidence: either a number or a label such as `"85%"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Confidence {
    Score(f64),
    Label(String),
}

/// Signal produced from the technical-indicator snapshot.
///
/// Only `decision` is required. Price levels the model leaves as text
/// (`"N/A"` on a WAIT) read as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSignal {
    pub decision: Decision,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub entry_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub stop_loss: Option<f64>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub take_profit: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub pattern_detected: Option<String>,
}

/// How long the news is expected to move the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImpactDuration {
    #[serde(rename = "SHORT-TERM")]
    ShortTerm,
    #[serde(rename = "LONG-TERM")]
    LongTerm,
}

impl FromStr for ImpactDuration {
    type Err = String;

    /// Accepts any casing and `-`, `_` or space as the separator.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '_' | ' ' => '-',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        match normalized.as_str() {
            "SHORT-TERM" => Ok(ImpactDuration::ShortTerm),
            "LONG-TERM" => Ok(ImpactDuration::LongTerm),
            _ => Err(format!("unknown impact duration: {s}")),
        }
    }
}

/// Signal produced from the headline sentiment read.
///
/// `decision` and `sentiment_score` are required; an unrecognised
/// `impact_duration` reads as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsSignal {
    pub decision: Decision,
    /// -1.0 (bearish) to 1.0 (bullish).
    pub sentiment_score: f64,
    #[serde(default, deserialize_with = "lenient_impact")]
    pub impact_duration: Option<ImpactDuration>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub key_event: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Number(n)) => Some(n),
        Some(Loose::Text(s)) => s.trim().trim_start_matches('$').parse().ok(),
        Some(Loose::Other(_)) | None => None,
    })
}

fn lenient_impact<'de, D>(deserializer: D) -> Result<Option<ImpactDuration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(s)) => s.parse().ok(),
        _ => None,
    })
}
