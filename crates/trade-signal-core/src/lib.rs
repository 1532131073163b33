pub mod candle;
pub mod error;
pub mod indicators;
pub mod news;
pub mod signal;
pub mod timeframe;
