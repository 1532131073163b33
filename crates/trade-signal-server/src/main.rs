use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use trade_signal_core::indicators::IndicatorSettings;
use trade_signal_core::timeframe::Timeframe;
use trade_signal_oracle::client::{DEFAULT_MODEL, GROQ_BASE_URL, GroqClient};
use trade_signal_oracle::oracle::DecisionOracle;
use trade_signal_providers::mt5::{
    MT5_BRIDGE_DEFAULT_URL, MT5_DEFAULT_SERVER, Mt5BridgeProvider, Mt5Credentials,
};
use trade_signal_providers::newsapi::{GOLD_NEWS_QUERY, NewsApiProvider};
use tracing::info;

use crate::context::{AppContext, Defaults};

mod context;
mod error;
#[cfg(test)]
mod fakes;
mod pipeline;
mod routes;

#[derive(Parser)]
#[command(
    name = "trade-signal",
    about = "Serve LLM trade signals built from market indicators and news headlines"
)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Symbol analyzed by default
    #[arg(long, env = "SYMBOL", default_value = "XAUUSD")]
    symbol: String,

    /// Candle timeframe: M1, M5, M15, M30, H1, H4, D1, W1, MN1
    #[arg(long, env = "TIMEFRAME", default_value = "M15")]
    timeframe: Timeframe,

    /// Number of most recent candles to fetch
    #[arg(long = "candles", env = "CANDLE_COUNT", default_value_t = 100)]
    candle_count: usize,

    /// Groq API key
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    groq_api_key: String,

    /// Chat model used for both oracles
    #[arg(long, env = "GROQ_MODEL", default_value = DEFAULT_MODEL)]
    groq_model: String,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "GROQ_BASE_URL", default_value = GROQ_BASE_URL)]
    groq_base_url: String,

    /// NewsAPI.org key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    news_api_key: String,

    /// NewsAPI base URL
    #[arg(long, env = "NEWS_BASE_URL")]
    news_base_url: Option<String>,

    /// Headline search query
    #[arg(long, env = "NEWS_QUERY", default_value = GOLD_NEWS_QUERY)]
    news_query: String,

    /// MetaTrader 5 bridge URL
    #[arg(long, env = "MT5_BRIDGE_URL", default_value = MT5_BRIDGE_DEFAULT_URL)]
    mt5_bridge_url: String,

    /// Trading account number (omit if the terminal is already logged in)
    #[arg(long, env = "MT5_LOGIN")]
    mt5_login: Option<u64>,

    /// Trading account password
    #[arg(long, env = "MT5_PASSWORD", hide_env_values = true)]
    mt5_password: Option<String>,

    /// Broker server name
    #[arg(long, env = "MT5_SERVER", default_value = MT5_DEFAULT_SERVER)]
    mt5_server: String,
}

fn build_context(cli: &Cli) -> Result<AppContext> {
    let chat = GroqClient::new(
        cli.groq_api_key.clone(),
        Some(cli.groq_model.clone()),
        Some(cli.groq_base_url.clone()),
    )
    .context("failed to create LLM client")?;

    let news = NewsApiProvider::new(cli.news_api_key.clone(), cli.news_base_url.clone())
        .context("failed to create NewsAPI provider")?;

    let candles = Mt5BridgeProvider::new(
        Mt5Credentials {
            login: cli.mt5_login,
            password: cli.mt5_password.clone(),
            server: cli.mt5_server.clone(),
        },
        Some(cli.mt5_bridge_url.clone()),
    );

    Ok(AppContext {
        candles: Arc::new(candles),
        news: Arc::new(news),
        oracle: DecisionOracle::new(Arc::new(chat)),
        defaults: Defaults {
            symbol: cli.symbol.to_uppercase(),
            timeframe: cli.timeframe,
            candle_count: cli.candle_count,
            news_query: cli.news_query.clone(),
            indicators: IndicatorSettings::default(),
        },
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    let ctx = Arc::new(build_context(&cli)?);
    info!(
        "Serving {} {} signals with {} on candles from {} and news from {}",
        ctx.defaults.symbol,
        ctx.defaults.timeframe,
        ctx.oracle.model(),
        ctx.candles.name(),
        ctx.news.name()
    );

    let (addr, server) = warp::serve(routes::routes(ctx))
        .try_bind_with_graceful_shutdown(cli.bind, async {
            tokio::signal::ctrl_c().await.ok();
        })
        .with_context(|| format!("failed to bind {}", cli.bind))?;

    info!("Listening on http://{addr}");
    server.await;
    info!("Shut down");

    Ok(())
}
