//! Credential verification and role checks for gated operations.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tessera_auth::{Role, TokenError, TokenMaker, TokenPayload};
use tessera_core::AppError;
use tracing::debug;

use crate::middleware::interceptor::CallContext;
use crate::middleware::policy::{Access, RoleTable};
use crate::security_event;
use crate::utils::mask_email;

pub const MISSING_CREDENTIAL: &str = "missing credential";
pub const INVALID_CREDENTIAL: &str = "invalid credential";

/// The caller of a gated operation, built from a verified token.
///
/// Lives in the extensions of a single request and is dropped with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedPrincipal {
    email: String,
    role: Role,
}

impl AuthorizedPrincipal {
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Admins may act on any account, everyone else only on their own.
    pub fn can_act_on(&self, target_email: &str) -> bool {
        self.role.is_admin() || self.email == target_email
    }

    pub fn ensure_can_act_on(&self, target_email: &str) -> Result<(), AppError> {
        if self.can_act_on(target_email) {
            return Ok(());
        }
        security_event!(
            "ownership_denied",
            principal = %mask_email(&self.email),
            target = %mask_email(target_email),
            "Principal tried to act on another user"
        );
        Err(AppError::permission_denied(
            "cannot act on another user's account",
        ))
    }
}

impl From<TokenPayload> for AuthorizedPrincipal {
    fn from(payload: TokenPayload) -> Self {
        Self {
            email: payload.subject().to_string(),
            role: payload.role(),
        }
    }
}

impl<S> FromRequestParts<S> for AuthorizedPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthorizedPrincipal>()
            .cloned()
            .ok_or_else(|| AppError::unauthenticated(MISSING_CREDENTIAL))
    }
}

#[derive(Clone)]
pub struct AuthorizationGate {
    maker: Arc<dyn TokenMaker>,
}

impl AuthorizationGate {
    pub fn new(maker: Arc<dyn TokenMaker>) -> Self {
        Self { maker }
    }

    /// Verifies the `authorization` header and checks the caller's role.
    ///
    /// The header value is the raw token. Every verification failure collapses
    /// into one unauthenticated answer; the detail is only logged.
    pub fn authorize(
        &self,
        ctx: &CallContext,
        headers: &HeaderMap,
        allowed_roles: &[Role],
    ) -> Result<AuthorizedPrincipal, AppError> {
        let _entered = ctx.span.enter();

        let mut values = headers.get_all(AUTHORIZATION).iter();
        let token = match (values.next(), values.next()) {
            (None, _) => None,
            (Some(value), None) => Some(value),
            (Some(_), Some(_)) => {
                security_event!(
                    "credential_rejected",
                    reason = "multiple authorization entries",
                    "Ambiguous credential"
                );
                ctx.metrics.authorization_checked(false, "unknown");
                return Err(AppError::unauthenticated(INVALID_CREDENTIAL));
            }
        };

        let token = match token {
            Some(value) if !value.is_empty() => value,
            _ => {
                security_event!("credential_missing", "Gated call without credential");
                ctx.metrics.authorization_checked(false, "anonymous");
                return Err(AppError::unauthenticated(MISSING_CREDENTIAL));
            }
        };

        let payload = token
            .to_str()
            .map_err(|_| TokenError::InvalidToken)
            .and_then(|token| self.maker.verify_token(token))
            .map_err(|e| {
                security_event!("credential_rejected", reason = %e, "Token verification failed");
                ctx.metrics.authorization_checked(false, "unknown");
                AppError::unauthenticated(INVALID_CREDENTIAL)
            })?;

        let principal = AuthorizedPrincipal::from(payload);

        if !allowed_roles.contains(&principal.role) {
            security_event!(
                "role_denied",
                principal = %mask_email(&principal.email),
                role = %principal.role,
                "Role not allowed for operation"
            );
            ctx.metrics.authorization_checked(false, principal.role.as_str());
            return Err(AppError::permission_denied(format!(
                "role {} is not allowed to perform this operation",
                principal.role
            )));
        }

        debug!(
            principal = %mask_email(&principal.email),
            role = %principal.role,
            "Caller authorized"
        );
        ctx.metrics.authorization_checked(true, principal.role.as_str());
        Ok(principal)
    }

    /// Applies the role table entry for `operation`.
    ///
    /// Public operations yield no principal and never look at the header.
    pub fn authorize_operation(
        &self,
        ctx: &CallContext,
        table: &RoleTable,
        operation: &str,
        headers: &HeaderMap,
    ) -> Result<Option<AuthorizedPrincipal>, AppError> {
        match table.access(operation) {
            Access::Public => Ok(None),
            Access::Roles(roles) => self.authorize(ctx, headers, &roles).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration as StdDuration;

    use axum::http::HeaderValue;
    use chrono::{DateTime, Duration, Utc};
    use tessera_auth::SymmetricTokenMaker;
    use tessera_core::RpcCode;
    use tracing::Span;
    use uuid::Uuid;

    use crate::metrics::MetricsSink;

    const KEY: [u8; 32] = [42u8; 32];

    /// Keeps the authorization checks, drops everything else.
    #[derive(Default)]
    struct ChecksSink {
        checks: Mutex<Vec<(bool, String)>>,
    }

    impl MetricsSink for ChecksSink {
        fn increment_requests(&self, _: &str, _: RpcCode) {}
        fn observe_duration(&self, _: &str, _: StdDuration) {}
        fn increment_errors(&self, _: &str, _: RpcCode) {}
        fn user_created(&self, _: Role) {}
        fn login_succeeded(&self, _: Role) {}
        fn login_failed(&self, _: &'static str) {}
        fn token_issued(&self, _: Role) {}

        fn authorization_checked(&self, allowed: bool, role: &str) {
            self.checks.lock().unwrap().push((allowed, role.to_string()));
        }
    }

    /// Verifies every token an hour in the future.
    struct LateVerifier(SymmetricTokenMaker);

    impl TokenMaker for LateVerifier {
        fn create_token(
            &self,
            subject: &str,
            role: Role,
            duration: Duration,
        ) -> Result<(String, TokenPayload), TokenError> {
            self.0.create_token(subject, role, duration)
        }

        fn verify_token_at(
            &self,
            token: &str,
            now: DateTime<Utc>,
        ) -> Result<TokenPayload, TokenError> {
            self.0.verify_token_at(token, now + Duration::hours(1))
        }
    }

    fn ctx_with(sink: Arc<ChecksSink>) -> CallContext {
        CallContext {
            operation: "GetUser".to_string(),
            request_id: Uuid::new_v4(),
            span: Span::none(),
            metrics: sink,
        }
    }

    fn ctx() -> CallContext {
        ctx_with(Arc::new(ChecksSink::default()))
    }

    fn gate() -> (AuthorizationGate, Arc<dyn TokenMaker>) {
        let maker: Arc<dyn TokenMaker> = Arc::new(SymmetricTokenMaker::new(KEY).unwrap());
        (AuthorizationGate::new(Arc::clone(&maker)), maker)
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(token).unwrap());
        headers
    }

    fn principal(email: &str, role: Role) -> AuthorizedPrincipal {
        AuthorizedPrincipal {
            email: email.to_string(),
            role,
        }
    }

    #[test]
    fn test_missing_and_empty_credential() {
        let (gate, _) = gate();

        let err = gate.authorize(&ctx(), &HeaderMap::new(), &[Role::Admin]).unwrap_err();
        assert_eq!(err.code, RpcCode::Unauthenticated);
        assert_eq!(err.client_message(), MISSING_CREDENTIAL);

        let err = gate.authorize(&ctx(), &headers_with(""), &[Role::Admin]).unwrap_err();
        assert_eq!(err.client_message(), MISSING_CREDENTIAL);
    }

    #[test]
    fn test_invalid_credential_hides_reason() {
        let (gate, _) = gate();
        let other = SymmetricTokenMaker::new([1u8; 32]).unwrap();
        let (foreign, _) = other
            .create_token("a@x.com", Role::Admin, Duration::minutes(5))
            .unwrap();

        for token in ["garbage", foreign.as_str()] {
            let err = gate
                .authorize(&ctx(), &headers_with(token), &[Role::Admin])
                .unwrap_err();
            assert_eq!(err.code, RpcCode::Unauthenticated);
            assert_eq!(err.client_message(), INVALID_CREDENTIAL);
        }
    }

    #[test]
    fn test_bearer_prefix_is_not_stripped() {
        let (gate, maker) = gate();
        let (token, _) = maker
            .create_token("a@x.com", Role::Admin, Duration::minutes(5))
            .unwrap();

        let err = gate
            .authorize(&ctx(), &headers_with(&format!("Bearer {token}")), &[Role::Admin])
            .unwrap_err();
        assert_eq!(err.client_message(), INVALID_CREDENTIAL);
    }

    #[test]
    fn test_multiple_credentials_rejected() {
        let (gate, maker) = gate();
        let (token, _) = maker
            .create_token("a@x.com", Role::Admin, Duration::minutes(5))
            .unwrap();

        let mut headers = headers_with(&token);
        headers.append(AUTHORIZATION, HeaderValue::from_str(&token).unwrap());
        let err = gate.authorize(&ctx(), &headers, &[Role::Admin]).unwrap_err();
        assert_eq!(err.client_message(), INVALID_CREDENTIAL);
    }

    #[test]
    fn test_role_enforcement() {
        let (gate, maker) = gate();
        let (standard, _) = maker
            .create_token("s@x.com", Role::Standard, Duration::minutes(5))
            .unwrap();
        let (admin, _) = maker
            .create_token("a@x.com", Role::Admin, Duration::minutes(5))
            .unwrap();

        let err = gate
            .authorize(&ctx(), &headers_with(&standard), &[Role::Admin])
            .unwrap_err();
        assert_eq!(err.code, RpcCode::PermissionDenied);

        let principal = gate.authorize(&ctx(), &headers_with(&admin), &[Role::Admin]).unwrap();
        assert_eq!(principal.email(), "a@x.com");
        assert_eq!(principal.role(), Role::Admin);

        let err = gate.authorize(&ctx(), &headers_with(&admin), &[]).unwrap_err();
        assert_eq!(err.code, RpcCode::PermissionDenied);
    }

    #[test]
    fn test_authorize_operation_public_ignores_header() {
        let (gate, _) = gate();
        let table = RoleTable::default();

        let result = gate
            .authorize_operation(&ctx(), &table, "LoginUser", &headers_with("garbage"))
            .unwrap();
        assert!(result.is_none());

        let err = gate
            .authorize_operation(&ctx(), &table, "NoSuchOperation", &HeaderMap::new())
            .unwrap_err();
        assert_eq!(err.code, RpcCode::Unauthenticated);
    }

    #[test]
    fn test_ownership() {
        let standard = principal("a@x.com", Role::Standard);
        assert!(standard.ensure_can_act_on("a@x.com").is_ok());
        let err = standard.ensure_can_act_on("b@x.com").unwrap_err();
        assert_eq!(err.code, RpcCode::PermissionDenied);

        let admin = principal("root@x.com", Role::Admin);
        assert!(admin.can_act_on("b@x.com"));
    }

    #[test]
    fn test_expired_token_is_invalid_credential() {
        let maker = LateVerifier(SymmetricTokenMaker::new(KEY).unwrap());
        let (token, _) = maker
            .create_token("a@x.com", Role::Admin, Duration::minutes(5))
            .unwrap();
        assert_eq!(
            maker.verify_token(&token).unwrap_err(),
            TokenError::ExpiredToken
        );

        let gate = AuthorizationGate::new(Arc::new(maker));
        let err = gate
            .authorize(&ctx(), &headers_with(&token), &[Role::Admin])
            .unwrap_err();
        assert_eq!(err.code, RpcCode::Unauthenticated);
        assert_eq!(err.client_message(), INVALID_CREDENTIAL);
    }

    #[test]
    fn test_checks_are_reported_to_context_sink() {
        let (gate, maker) = gate();
        let sink = Arc::new(ChecksSink::default());
        let ctx = ctx_with(Arc::clone(&sink));
        let (standard, _) = maker
            .create_token("s@x.com", Role::Standard, Duration::minutes(5))
            .unwrap();

        gate.authorize(&ctx, &HeaderMap::new(), &[Role::Admin]).unwrap_err();
        gate.authorize(&ctx, &headers_with(&standard), &[Role::Admin]).unwrap_err();
        gate.authorize(&ctx, &headers_with(&standard), &[Role::Standard]).unwrap();

        assert_eq!(
            *sink.checks.lock().unwrap(),
            vec![
                (false, "anonymous".to_string()),
                (false, "standard".to_string()),
                (true, "standard".to_string()),
            ]
        );
    }
}
