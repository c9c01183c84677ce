//! HTTP front end for the conversion service.
//!
//! Routes:
//! - `POST /convert` converts an amount of CAD
//! - `GET /currencies` lists the supported currency labels
//! - `GET /health` reports liveness and whether rates are loaded

use crate::core::config::ServerConfig;
use crate::core::{ConversionError, FieldError, FieldErrorKind};
use crate::service::{ConversionRequest, ConversionService};
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

impl IntoResponse for ConversionError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = match self {
            ConversionError::Validation(errors) => json!({ "errors": errors }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Builds the application router around `service`.
pub fn router(service: ConversionService) -> Router {
    with_boundary(
        Router::new()
            .route("/convert", post(convert_currency))
            .route("/currencies", get(list_currencies))
            .route("/health", get(health))
            .with_state(service),
    )
}

/// Request tracing plus the catch-all that turns a panicking handler into a
/// generic 500.
fn with_boundary(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Error occurred: {detail}");
    ConversionError::Internal(detail).into_response()
}

/// POST /convert
async fn convert_currency(
    State(service): State<ConversionService>,
    payload: Result<Json<ConversionRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let err = FieldError::new("body", FieldErrorKind::InvalidFormat, rejection.body_text());
            error!("{err}");
            return ConversionError::Validation(vec![err]).into_response();
        }
    };

    match service.handle(&request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Serialize)]
struct CurrencyList {
    currencies: Vec<String>,
}

/// GET /currencies
async fn list_currencies(State(service): State<ConversionService>) -> Json<CurrencyList> {
    let table = service.rates().table().await;
    Json(CurrencyList {
        currencies: table.currencies().map(str::to_string).collect(),
    })
}

/// GET /health
async fn health(State(service): State<ConversionService>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "rates_loaded": service.rates().peek().is_some(),
    }))
}

/// Binds to the configured address and serves until Ctrl-C.
pub async fn serve(config: &ServerConfig, service: ConversionService) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server is running on http://{}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            warn!("Could not listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barrier::RatesHandle;
    use crate::core::error::{CORRUPT_RATE_MESSAGE, INTERNAL_MESSAGE};
    use crate::core::{ExchangeRateRecord, RateTable};
    use serde_json::Value;

    async fn spawn_app(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn service_with(records: Vec<ExchangeRateRecord>) -> ConversionService {
        ConversionService::new(RatesHandle::ready(RateTable::from_records(records)))
    }

    #[tokio::test]
    async fn test_error_response_shapes() {
        let response = ConversionError::Validation(vec![FieldError::missing("date")]).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ConversionError::CorruptRate {
            date: "2023-05-31".to_string(),
            currency: "Broken".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "error": CORRUPT_RATE_MESSAGE }));
    }

    #[tokio::test]
    async fn test_corrupt_rate_over_http() {
        let base = spawn_app(router(service_with(vec![ExchangeRateRecord {
            date: "2023-05-31".to_string(),
            country: "Canada".to_string(),
            currency: "Broken".to_string(),
            value: f64::INFINITY,
        }])))
        .await;

        let response = reqwest::Client::new()
            .post(format!("{base}/convert"))
            .json(&json!({ "date": "2023-05-31", "currency": "Broken", "amount_in_cad": 1 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 500);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], CORRUPT_RATE_MESSAGE);
    }

    #[tokio::test]
    async fn test_panicking_handler_becomes_generic_500() {
        async fn explode() -> &'static str {
            panic!("secret internal detail")
        }
        let base = spawn_app(with_boundary(Router::new().route("/boom", get(explode)))).await;

        let response = reqwest::get(format!("{base}/boom")).await.unwrap();
        assert_eq!(response.status().as_u16(), 500);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": INTERNAL_MESSAGE }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_validation_error() {
        let base = spawn_app(router(service_with(vec![]))).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/convert"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["errors"][0]["field"], "body");
    }
}
