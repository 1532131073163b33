use std::fmt;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use trade_signal_core::candle::Candle;
use trade_signal_core::timeframe::Timeframe;

use crate::error::ProviderError;
use crate::provider::CandleProvider;

pub const MT5_BRIDGE_DEFAULT_URL: &str = "http://127.0.0.1:5555";
pub const MT5_DEFAULT_SERVER: &str = "MetaQuotes-Demo";

const PROVIDER_NAME: &str = "mt5";
const SESSION_HEADER: &str = "X-Session-Id";

/// Account credentials forwarded to the terminal when a session is opened.
/// `login`/`password` may be omitted when the terminal is already logged in.
#[derive(Clone, Serialize)]
pub struct Mt5Credentials {
    pub login: Option<u64>,
    pub password: Option<String>,
    pub server: String,
}

impl fmt::Debug for Mt5Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mt5Credentials")
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("server", &self.server)
            .finish()
    }
}

impl Default for Mt5Credentials {
    fn default() -> Self {
        Self {
            login: None,
            password: None,
            server: MT5_DEFAULT_SERVER.to_string(),
        }
    }
}

/// MetaTrader 5 candle provider.
///
/// Talks to an HTTP bridge running next to the terminal. Every fetch opens a
/// session, copies the most recent rates and closes the session again, so no
/// terminal connection outlives a request.
pub struct Mt5BridgeProvider {
    client: Client,
    base_url: String,
    credentials: Mt5Credentials,
}

impl Mt5BridgeProvider {
    /// Create with explicit credentials and optional bridge URL override.
    pub fn new(credentials: Mt5Credentials, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url
                .unwrap_or_else(|| MT5_BRIDGE_DEFAULT_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            credentials,
        }
    }

    fn connection_error(message: impl Into<String>) -> ProviderError {
        ProviderError::Connection {
            provider: PROVIDER_NAME.to_string(),
            message: message.into(),
        }
    }

    /// Open a terminal session. Any failure here means the terminal is unreachable.
    async fn open_session(&self) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(format!("{}/session", self.base_url))
            .json(&self.credentials)
            .send()
            .await
            .map_err(|e| Self::connection_error(format!("initialize failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::connection_error(format!(
                "initialize failed ({status}): {body}"
            )));
        }

        let body: SessionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("failed to parse session response: {e}")))?;

        debug!("Opened MT5 session {}", body.session_id);
        Ok(body.session_id)
    }

    async fn copy_rates(
        &self,
        session_id: &str,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Candle>, ProviderError> {
        let count = count.to_string();
        let response = self
            .client
            .get(format!("{}/rates", self.base_url))
            .header(SESSION_HEADER, session_id)
            .query(&[
                ("symbol", symbol),
                ("timeframe", timeframe.as_str()),
                ("start_pos", "0"),
                ("count", count.as_str()),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 60,
            });
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status,
                message: body,
            });
        }

        let rates: Option<Vec<Mt5Rate>> = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("failed to parse rates: {e}")))?;

        let rates = rates.unwrap_or_default();
        if rates.is_empty() {
            return Err(ProviderError::NoData {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
            });
        }

        let mut candles = rates
            .iter()
            .map(Mt5Rate::to_candle)
            .collect::<Result<Vec<_>, _>>()?;
        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }

    /// Close a session. Failures are logged and otherwise ignored.
    async fn close_session(&self, session_id: &str) {
        let result = self
            .client
            .delete(format!("{}/session/{}", self.base_url, session_id))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Closed MT5 session {session_id}");
            }
            Ok(response) => {
                warn!(
                    "MT5 session {session_id} shutdown returned {}",
                    response.status()
                );
            }
            Err(e) => warn!("MT5 session {session_id} shutdown failed: {e}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    session_id: String,
}

/// One row of `copy_rates_from_pos` output.
#[derive(Debug, Deserialize)]
struct Mt5Rate {
    /// Bar open time, unix seconds
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    tick_volume: i64,
}

fn f64_to_decimal(val: f64) -> Result<Decimal, ProviderError> {
    Decimal::try_from(val).map_err(|e| ProviderError::Parse(format!("invalid decimal value: {e}")))
}

impl Mt5Rate {
    fn to_candle(&self) -> Result<Candle, ProviderError> {
        let timestamp = Utc
            .timestamp_opt(self.time, 0)
            .single()
            .ok_or_else(|| ProviderError::Parse(format!("invalid unix timestamp: {}", self.time)))?;

        Ok(Candle {
            timestamp,
            open: f64_to_decimal(self.open)?,
            high: f64_to_decimal(self.high)?,
            low: f64_to_decimal(self.low)?,
            close: f64_to_decimal(self.close)?,
            volume: self.tick_volume,
        })
    }
}

#[async_trait]
impl CandleProvider for Mt5BridgeProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Candle>, ProviderError> {
        let session_id = self.open_session().await?;
        let result = self.copy_rates(&session_id, symbol, timeframe, count).await;
        self.close_session(&session_id).await;

        let candles = result?;
        info!(
            "{symbol} {timeframe}: received {} candle(s), last close {}",
            candles.len(),
            candles.last().map(|c| c.close).unwrap_or_default()
        );
        Ok(candles)
    }
}
