//! Span and event helpers shared by the RPC interceptor, the authorization gate
//! and the services, so every call is logged with the same field names.

use tessera_core::RpcCode;
use tracing::{Level, Span};
use uuid::Uuid;

/// Log a security-relevant event at WARN level
///
/// Use this for failed authentication, authorization denials and ownership
/// violations.
#[macro_export]
macro_rules! security_event {
    ($event:expr, $($field:tt)*) => {
        tracing::warn!(
            security.event = $event,
            $($field)*
        )
    };
}

/// Log an audit event at INFO level
///
/// Use this for user creation, renames and deletions.
#[macro_export]
macro_rules! audit_event {
    ($action:expr, $resource:expr, $($field:tt)*) => {
        tracing::info!(
            audit.action = $action,
            audit.resource = $resource,
            $($field)*
        )
    };
}

/// Root span of one remote call.
pub fn rpc_span(operation: &str, request_id: Uuid) -> Span {
    tracing::span!(
        Level::INFO,
        "rpc",
        rpc.service = "UserService",
        rpc.method = operation,
        request_id = %request_id,
        rpc.code = tracing::field::Empty,
        otel.kind = "server",
        otel.status_code = tracing::field::Empty
    )
}

/// Record the outcome of a call on its span
pub fn record_rpc_code(span: &Span, code: RpcCode) {
    span.record("rpc.code", code.as_str());
    if code.is_ok() {
        span.record("otel.status_code", "OK");
    } else {
        span.record("otel.status_code", "ERROR");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_rpc_code_without_subscriber() {
        // No subscriber is installed, the span is disabled and recording is a no-op
        let span = rpc_span("GetUser", Uuid::new_v4());
        record_rpc_code(&span, RpcCode::Ok);
        record_rpc_code(&span, RpcCode::Internal);
    }
}
