//! Liveness endpoint.
//!
//! In polling mode the health router runs on its own listener on PORT. In webhook mode it is merged
//! into the teloxide webhook router so one port serves both.

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Router exposing `GET /health`.
pub fn health_router() -> Router {
    Router::new().route("/health", get(health_handler))
}

/// Start the standalone health server.
pub async fn start_health_server(port: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    log::info!("Starting health server on http://{}", addr);
    log::info!("  /health     - Health check");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, health_router()).await?;

    Ok(())
}

/// GET /health: simple health check.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_returns_ok() {
        let response = health_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = health_router()
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
