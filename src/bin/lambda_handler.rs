//! AWS Lambda handler for loan calculations and comparisons
//!
//! Routes by path: `.../calculate-loan` and `.../compare-loans`, both POST with JSON bodies.
//! Engine settings come from the environment (see `EngineConfig::from_env`).
//!
//! Supports Lambda Function URLs for direct HTTP access.

use lambda_http::http::StatusCode;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use loan_engine::api::{handle_calculate, handle_compare, CalculateLoanRequest, CompareLoansRequest};
use loan_engine::schedule::NoInsuranceResolver;
use loan_engine::{EngineConfig, EngineError, LoanEngine};
use serde::Serialize;
use std::sync::OnceLock;

static ENGINE: OnceLock<LoanEngine> = OnceLock::new();

fn engine() -> &'static LoanEngine {
    ENGINE.get_or_init(|| LoanEngine::new(EngineConfig::from_env()))
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

fn error_response(status: StatusCode, message: &str) -> Result<Response<Body>, Error> {
    let body = serde_json::to_string(&ErrorBody { error: message })?;
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::Text(body))?)
}

fn json_response<T: Serialize>(body: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Body::Text(serde_json::to_string(body)?))?)
}

fn engine_error_response(err: &EngineError) -> Result<Response<Body>, Error> {
    if err.is_client_error() {
        log::info!("rejected request: {}", err);
        error_response(StatusCode::BAD_REQUEST, &err.to_string())
    } else {
        log::error!("calculation failed: {}", err);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
    }
}

fn body_text(event: &Request) -> String {
    match event.body() {
        Body::Text(s) => s.clone(),
        Body::Binary(b) => String::from_utf8_lossy(b).to_string(),
        Body::Empty => "{}".to_string(),
    }
}

/// Lambda handler function
async fn handler(event: Request) -> Result<Response<Body>, Error> {
    let start = std::time::Instant::now();

    // Handle CORS preflight
    if event.method().as_str() == "OPTIONS" {
        return Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "POST, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type")
            .body(Body::Empty)?);
    }

    if event.method().as_str() != "POST" {
        return error_response(StatusCode::METHOD_NOT_ALLOWED, "Only POST is supported");
    }

    let path = event.uri().path().trim_end_matches('/').to_string();
    let body = body_text(&event);

    let response = if path.ends_with("calculate-loan") {
        let request: CalculateLoanRequest = match serde_json::from_str(&body) {
            Ok(r) => r,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, &format!("Invalid JSON: {}", e)),
        };
        match handle_calculate(&request, engine()) {
            Ok(result) => json_response(&result),
            Err(e) => engine_error_response(&e),
        }
    } else if path.ends_with("compare-loans") {
        let request: CompareLoansRequest = match serde_json::from_str(&body) {
            Ok(r) => r,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, &format!("Invalid JSON: {}", e)),
        };
        match handle_compare(&request, engine(), &NoInsuranceResolver) {
            Ok(result) => json_response(&result),
            Err(e) => engine_error_response(&e),
        }
    } else {
        error_response(StatusCode::NOT_FOUND, &format!("Unknown route: {}", path))
    };

    log::info!("{} handled in {} ms", path, start.elapsed().as_millis());
    response
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}
