use std::convert::Infallible;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::error;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::context::AppContext;
use crate::error::ApiError;
use crate::pipeline::{self, AnalyzeQuery};

/// `GET /analyze/`, `GET /news/` and `GET /newsAnalysis/`.
pub fn routes(
    ctx: Arc<AppContext>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let analyze = warp::path("analyze")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_context(ctx.clone()))
        .and(warp::query::<AnalyzeQuery>())
        .and_then(analyze_handler);

    let news = warp::path("news")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_context(ctx.clone()))
        .and_then(news_handler);

    let news_analysis = warp::path("newsAnalysis")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(news_analysis_handler);

    let cors = warp::cors().allow_any_origin().allow_methods(vec!["GET"]);

    analyze
        .or(news)
        .or(news_analysis)
        .with(cors)
        .with(warp::trace::request())
}

fn with_context(
    ctx: Arc<AppContext>,
) -> impl Filter<Extract = (Arc<AppContext>,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

async fn analyze_handler(
    ctx: Arc<AppContext>,
    query: AnalyzeQuery,
) -> Result<Response, Infallible> {
    Ok(respond(pipeline::analyze_market(&ctx, &query).await))
}

async fn news_handler(ctx: Arc<AppContext>) -> Result<Response, Infallible> {
    Ok(respond(pipeline::fetch_news(&ctx).await))
}

async fn news_analysis_handler(ctx: Arc<AppContext>) -> Result<Response, Infallible> {
    Ok(respond(pipeline::analyze_news(&ctx).await))
}

/// 200 with the body, or the error's status with `{"error": "..."}`.
fn respond<T: Serialize>(result: Result<T, ApiError>) -> Response {
    match result {
        Ok(body) => warp::reply::with_status(warp::reply::json(&body), StatusCode::OK).into_response(),
        Err(e) => {
            let status = e.status();
            error!("Request failed ({status}): {e}");
            warp::reply::with_status(warp::reply::json(&json!({ "error": e.to_string() })), status)
                .into_response()
        }
    }
}
