use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use trade_signal_core::news::NewsArticle;

use crate::error::ProviderError;
use crate::provider::NewsProvider;

const NEWSAPI_BASE_URL: &str = "https://newsapi.org/v2";

/// Gold-market search: macro and bullion coverage, minus jewelry and mining stories.
pub const GOLD_NEWS_QUERY: &str =
    "(Gold Price OR XAUUSD OR Bullion OR Federal Reserve) AND NOT (Jewelry OR Gold Mine)";

/// NewsAPI.org `everything` search.
/// Authenticates via the X-Api-Key header. Results are sorted by relevancy.
pub struct NewsApiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl NewsApiProvider {
    /// Create with an explicit key and optional base URL override.
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::Config("NewsAPI key is empty".into()));
        }

        Ok(Self {
            client: Client::builder()
                .user_agent(concat!("trade-signal/", env!("CARGO_PKG_VERSION")))
                .build()?,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| NEWSAPI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    source: Option<NewsApiSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

impl From<NewsApiArticle> for NewsArticle {
    fn from(raw: NewsApiArticle) -> Self {
        NewsArticle {
            title: raw.title,
            desc: raw.description,
            source: raw.source.and_then(|s| s.name),
            url: raw.url,
        }
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    fn name(&self) -> &str {
        "newsapi"
    }

    async fn fetch_articles(&self, query: &str) -> Result<Vec<NewsArticle>, ProviderError> {
        debug!("NewsAPI search: {query}");

        let response = self
            .client
            .get(format!("{}/everything", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", query),
                ("sortBy", "relevancy"),
                ("language", "en"),
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

        let body: NewsApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("failed to parse response: {e}")))?;

        if body.status != "ok" {
            return Err(ProviderError::Api {
                status: 0,
                message: format!(
                    "{}: {}",
                    body.code.unwrap_or_else(|| body.status.clone()),
                    body.message.unwrap_or_default()
                ),
            });
        }

        let articles: Vec<NewsArticle> = body.articles.into_iter().map(NewsArticle::from).collect();
        info!("NewsAPI returned {} article(s)", articles.len());
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use serde_json::json;
    use warp::http::StatusCode;
    use warp::{Filter, Rejection, Reply};

    fn serve<F>(routes: F) -> String
    where
        F: Filter<Error = Rejection> + Clone + Send + Sync + 'static,
        F::Extract: Reply,
    {
        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{addr}")
    }

    fn fake_newsapi(body: serde_json::Value, status: StatusCode) -> String {
        let route = warp::get()
            .and(warp::path("everything"))
            .and(warp::header::<String>("x-api-key"))
            .and(warp::query::<HashMap<String, String>>())
            .map(move |key: String, query: HashMap<String, String>| {
                assert_eq!(key, "test-key");
                assert_eq!(query["q"], GOLD_NEWS_QUERY);
                assert_eq!(query["sortBy"], "relevancy");
                assert_eq!(query["language"], "en");
                warp::reply::with_status(warp::reply::json(&body), status)
            });
        serve(route)
    }

    #[test]
    fn parse_newsapi_response_json() {
        let json = r#"{
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {
                    "source": {"id": "reuters", "name": "Reuters"},
                    "author": "Staff",
                    "title": "Gold climbs as Fed signals cuts",
                    "description": "Bullion rose 1%",
                    "url": "https://example.com/gold",
                    "publishedAt": "2025-01-15T14:30:00Z"
                },
                {
                    "source": {"id": null, "name": null},
                    "title": "Dollar firms",
                    "description": null,
                    "url": "https://example.com/usd"
                }
            ]
        }"#;

        let response: NewsApiResponse = serde_json::from_str(json).unwrap();
        let articles: Vec<NewsArticle> =
            response.articles.into_iter().map(NewsArticle::from).collect();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].source.as_deref(), Some("Reuters"));
        assert_eq!(articles[0].desc.as_deref(), Some("Bullion rose 1%"));
        assert!(articles[1].source.is_none());
        assert!(articles[1].desc.is_none());
    }

    #[test]
    fn empty_key_is_config_error() {
        assert!(matches!(
            NewsApiProvider::new("  ".into(), None),
            Err(ProviderError::Config(_))
        ));
    }

    #[tokio::test]
    async fn fetch_articles_returns_every_match() {
        let articles: Vec<_> = (0..15)
            .map(|i| {
                json!({
                    "source": {"name": "Wire"},
                    "title": format!("Headline {i}"),
                    "description": "d",
                    "url": format!("https://example.com/{i}")
                })
            })
            .collect();
        let url = fake_newsapi(
            json!({"status": "ok", "totalResults": 15, "articles": articles}),
            StatusCode::OK,
        );

        let provider = NewsApiProvider::new("test-key".into(), Some(url)).unwrap();
        let result = provider.fetch_articles(GOLD_NEWS_QUERY).await.unwrap();

        assert_eq!(result.len(), 15);
        assert_eq!(result[14].title.as_deref(), Some("Headline 14"));
    }

    #[tokio::test]
    async fn http_error_is_api_error() {
        let url = fake_newsapi(
            json!({"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid"}),
            StatusCode::UNAUTHORIZED,
        );

        let provider = NewsApiProvider::new("test-key".into(), Some(url)).unwrap();
        let err = provider.fetch_articles(GOLD_NEWS_QUERY).await.unwrap_err();

        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("apiKeyInvalid"));
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_is_api_error() {
        let url = fake_newsapi(json!({}), StatusCode::SERVICE_UNAVAILABLE);
        let provider = NewsApiProvider::new("test-key".into(), Some(url)).unwrap();
        let err = provider.fetch_articles(GOLD_NEWS_QUERY).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn rate_limit_is_reported() {
        let url = fake_newsapi(json!({"status": "error"}), StatusCode::TOO_MANY_REQUESTS);
        let provider = NewsApiProvider::new("test-key".into(), Some(url)).unwrap();
        let err = provider.fetch_articles(GOLD_NEWS_QUERY).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn error_status_in_body_is_api_error() {
        let url = fake_newsapi(
            json!({"status": "error", "code": "parameterInvalid", "message": "bad q"}),
            StatusCode::OK,
        );
        let provider = NewsApiProvider::new("test-key".into(), Some(url)).unwrap();
        let err = provider.fetch_articles(GOLD_NEWS_QUERY).await.unwrap_err();
        match err {
            ProviderError::Api { message, .. } => assert_eq!(message, "parameterInvalid: bad q"),
            other => panic!("expected Api, got {other:?}"),
        }
    }
}
