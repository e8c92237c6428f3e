use std::time::Instant;

use actix_web::{
    Error,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};
use tracing::debug;

/**
 * Logs method, path, status and duration of every request under the `performance` target.
 */
pub async fn timing_middleware(request: ServiceRequest, next: Next<impl MessageBody>) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.path().to_owned();
    let response = next.call(request).await;
    let status = response.as_ref().map_or(500, |service_response| service_response.status().as_u16());
    debug!(target: "performance", "{} {} answered {} in {}ms", method, path, status, started.elapsed().as_millis());
    response
}
