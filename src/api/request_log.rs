//! Access log and status-class accounting

use axum::{
    extract::{ConnectInfo, Request, State as AxumState},
    http::header,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{error, info};

use crate::SharedState;

const UNCOUNTED_PATH: &str = "/status";

pub async fn log_requests(
    AxumState(state): AxumState<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let version = request.version();
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    // only present when served with connect info
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string());

    let started = Instant::now();
    let response = next.run(request).await;
    let status = response.status();

    if path != UNCOUNTED_PATH {
        if let Err(e) = state.stats.record_status(status.as_u16()) {
            error!("{}", e);
        }
    }

    info!(
        "{} {} - \"{} {} {:?}\" {} {:?}",
        ip,
        user_agent,
        method,
        path,
        version,
        status.as_u16(),
        started.elapsed()
    );
    response
}
