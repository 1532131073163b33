use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use ta::Next;
use ta::indicators::BollingerBands;

use crate::candle::Candle;
use crate::error::MarketDataError;

/// Lookback settings for the indicator families fed to the market oracle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSettings {
    pub rsi_period: usize,
    pub ema_period: usize,
    pub bb_period: usize,
    /// Band width in standard deviations.
    pub bb_std: f64,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            ema_period: 50,
            bb_period: 20,
            bb_std: 2.0,
        }
    }
}

impl IndicatorSettings {
    /// Number of candles needed before every indicator has a value.
    pub fn warmup(&self) -> usize {
        (self.rsi_period + 1).max(self.ema_period).max(self.bb_period)
    }
}

/// One candle with the indicator values computed up to and including it.
/// A value is `None` while its indicator is still inside its warm-up window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub timestamp: DateTime<Utc>,
    pub close: Decimal,
    pub rsi: Option<f64>,
    pub ema: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
}

/// Candle series annotated with RSI, EMA and Bollinger Bands, most recent last.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTable {
    settings: IndicatorSettings,
    rows: Vec<IndicatorRow>,
}

/// Latest fully-populated indicator row plus the close before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub timestamp: DateTime<Utc>,
    pub close: Decimal,
    pub rsi: f64,
    pub ema: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    pub previous_close: Decimal,
}

impl IndicatorTable {
    /// Compute every indicator over the candle closes.
    /// Candles must already be sorted by timestamp.
    pub fn compute(
        candles: &[Candle],
        settings: IndicatorSettings,
    ) -> Result<Self, MarketDataError> {
        let closes = candles
            .iter()
            .map(|c| {
                c.close.to_f64().ok_or_else(|| {
                    MarketDataError::InvalidData(format!("close {} is not representable", c.close))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let rsi = wilder_rsi(&closes, settings.rsi_period);
        let ema = ema(&closes, settings.ema_period);
        let bands = bollinger(&closes, settings.bb_period, settings.bb_std)?;

        let rows = candles
            .iter()
            .enumerate()
            .map(|(i, candle)| IndicatorRow {
                timestamp: candle.timestamp,
                close: candle.close,
                rsi: rsi[i],
                ema: ema[i],
                bb_upper: bands[i].map(|b| b.upper),
                bb_middle: bands[i].map(|b| b.middle),
                bb_lower: bands[i].map(|b| b.lower),
            })
            .collect();

        Ok(Self { settings, rows })
    }

    pub fn settings(&self) -> &IndicatorSettings {
        &self.settings
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    pub fn previous(&self) -> Option<&IndicatorRow> {
        self.rows.len().checked_sub(2).map(|i| &self.rows[i])
    }

    /// Extract the latest row and the prior close.
    /// Fails when there are fewer than two rows or the latest row is still warming up.
    pub fn snapshot(&self) -> Result<IndicatorSnapshot, MarketDataError> {
        let insufficient = || MarketDataError::InsufficientData {
            required: self.settings.warmup().max(2),
            available: self.rows.len(),
        };

        let (current, previous) = match (self.latest(), self.previous()) {
            (Some(current), Some(previous)) => (current, previous),
            _ => return Err(insufficient()),
        };

        match (
            current.rsi,
            current.ema,
            current.bb_upper,
            current.bb_middle,
            current.bb_lower,
        ) {
            (Some(rsi), Some(ema), Some(bb_upper), Some(bb_middle), Some(bb_lower)) => {
                Ok(IndicatorSnapshot {
                    timestamp: current.timestamp,
                    close: current.close,
                    rsi,
                    ema,
                    bb_upper,
                    bb_middle,
                    bb_lower,
                    previous_close: previous.close,
                })
            }
            _ => Err(insufficient()),
        }
    }
}

/// Relative Strength Index with Wilder smoothing.
///
/// The first value lands at index `period`, seeded with the simple average of
/// the first `period` gains and losses; later values use
/// `avg = (prev * (period - 1) + x) / period`.
pub fn wilder_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for w in closes[..=period].windows(2) {
        let change = w[1] - w[0];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    let n = period as f64;
    for i in (period + 1)..closes.len() {
        let change = closes[i] - closes[i - 1];
        avg_gain = (avg_gain * (n - 1.0) + change.max(0.0)) / n;
        avg_loss = (avg_loss * (n - 1.0) + (-change).max(0.0)) / n;
        out[i] = Some(rsi_value(avg_gain, avg_loss));
    }

    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        // Flat window is neutral; pure gains saturate.
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// Exponential moving average seeded with the simple average of the first
/// `period` values, then `alpha = 2 / (period + 1)`.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(current);

    for i in period..values.len() {
        current = alpha * values[i] + (1.0 - alpha) * current;
        out[i] = Some(current);
    }

    out
}

/// One Bollinger Band reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Simple moving average plus/minus `std_dev` population standard deviations.
/// The first band lands at index `period - 1`.
pub fn bollinger(
    values: &[f64],
    period: usize,
    std_dev: f64,
) -> Result<Vec<Option<Band>>, MarketDataError> {
    let mut bb = BollingerBands::new(period, std_dev)
        .map_err(|e| MarketDataError::Indicator(format!("bollinger({period}, {std_dev}): {e:?}")))?;

    Ok(values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let out = bb.next(v);
            (i + 1 >= period).then_some(Band {
                upper: out.upper,
                middle: out.average,
                lower: out.lower,
            })
        })
        .collect())
}
