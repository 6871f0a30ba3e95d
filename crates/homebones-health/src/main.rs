//! HomeBones health probe
//!
//! Serves `GET /health` so deployments can check liveness.

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use homebones::Config;

async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

fn router() -> Router {
    Router::new().route("/health", get(health))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    rolling_logger::init_logger_with_level(&config.log_dir, &config.app_name, &config.log_level)?;

    let listener = tokio::net::TcpListener::bind(config.health_addr).await?;
    log::info!("Health probe listening on {}", listener.local_addr()?);

    axum::serve(listener, router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_returns_ok() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = router()
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
