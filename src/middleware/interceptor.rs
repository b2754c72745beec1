//! Server-side interceptor wrapped around every `UserService` operation.
//!
//! Per call it opens the `rpc` span, runs the authorization gate for gated
//! operations, then emits one request count, one duration observation and
//! one log line, whatever the outcome.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tessera_core::{AppError, RpcCode};
use tracing::{Instrument, Span, error, info, warn};
use uuid::Uuid;

use crate::metrics::MetricsSink;
use crate::state::AppState;
use crate::utils::tracing::{record_rpc_code, rpc_span};

/// Per-call context handed to handlers through request extensions.
#[derive(Clone)]
pub struct CallContext {
    pub operation: String,
    pub request_id: Uuid,
    pub span: Span,
    pub metrics: Arc<dyn MetricsSink>,
}

impl std::fmt::Debug for CallContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallContext")
            .field("operation", &self.operation)
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

impl<S> FromRequestParts<S> for CallContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallContext>()
            .cloned()
            .ok_or_else(|| AppError::internal(anyhow::anyhow!("call context missing")))
    }
}

/// Name of the operation addressed by `path`, its last segment.
pub fn operation_from_path(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

pub async fn rpc_interceptor(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let operation = operation_from_path(req.uri().path()).to_string();
    let request_id = Uuid::new_v4();
    let span = rpc_span(&operation, request_id);

    let ctx = CallContext {
        operation: operation.clone(),
        request_id,
        span: span.clone(),
        metrics: Arc::clone(&state.metrics),
    };

    let authorized = state
        .gate
        .authorize_operation(&ctx, &state.role_table, &operation, req.headers());

    let response = match authorized {
        Ok(principal) => {
            if let Some(principal) = principal {
                req.extensions_mut().insert(principal);
            }
            req.extensions_mut().insert(ctx.clone());
            next.run(req).instrument(span.clone()).await
        }
        Err(err) => span.in_scope(|| err.into_response()),
    };

    let latency = start.elapsed();
    let code = response
        .extensions()
        .get::<RpcCode>()
        .copied()
        .unwrap_or_else(|| RpcCode::from_http_status(response.status()));

    ctx.metrics.increment_requests(&operation, code);
    ctx.metrics.observe_duration(&operation, latency);
    if !code.is_ok() {
        ctx.metrics.increment_errors(&operation, code);
    }
    record_rpc_code(&span, code);

    span.in_scope(|| {
        if code.is_ok() {
            info!(
                request_id = %request_id,
                operation = %operation,
                code = %code,
                latency_ms = %latency.as_millis(),
                "Call completed"
            );
        } else if code.is_server_error() {
            error!(
                request_id = %request_id,
                operation = %operation,
                code = %code,
                latency_ms = %latency.as_millis(),
                "Call failed"
            );
        } else {
            warn!(
                request_id = %request_id,
                operation = %operation,
                code = %code,
                latency_ms = %latency.as_millis(),
                "Call rejected"
            );
        }
    });

    response
}
