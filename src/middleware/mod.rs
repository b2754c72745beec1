//! Call interception for the `UserService` routes.
//!
//! - [`policy`]: which roles may call which operation
//! - [`gate`]: credential verification, role checks and the
//!   [`AuthorizedPrincipal`](gate::AuthorizedPrincipal) extractor
//! - [`interceptor`]: the per-call middleware that applies the gate and
//!   records logs and metrics
//!
//! # Call flow
//!
//! 1. `rpc_interceptor` resolves the operation from the request path
//! 2. Gated operations go through `AuthorizationGate::authorize`; a failure is
//!    answered immediately and the handler never runs
//! 3. The handler reads `AuthorizedPrincipal` and `CallContext` from the request
//! 4. On the way out the interceptor records the outcome

pub mod gate;
pub mod interceptor;
pub mod policy;
