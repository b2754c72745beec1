#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::Value;
use tessera::metrics::MetricsSink;
use tessera::router::init_router;
use tessera::state::AppState;
use tessera_auth::{Role, SymmetricTokenMaker, TokenMaker};
use tessera_core::{RpcCode, hash_password_with_cost};
use tessera_db::{CreateUserParams, InMemoryUserRepository, RepositoryError, UserRepository};
use tessera_models::User;
use tower::ServiceExt;

pub const TEST_KEY: &[u8; 32] = b"tessera-test-key-0123456789abcde";
pub const TEST_PASSWORD: &str = "secret123";

/// In-memory store that counts every call made against it.
#[derive(Default)]
pub struct CountingRepository {
    inner: InMemoryUserRepository,
    calls: AtomicUsize,
}

impl CountingRepository {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserRepository for CountingRepository {
    async fn create_user(&self, params: CreateUserParams) -> Result<User, RepositoryError> {
        self.hit();
        self.inner.create_user(params).await
    }

    async fn find_user_by_id(&self, id: i64) -> Result<User, RepositoryError> {
        self.hit();
        self.inner.find_user_by_id(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        self.hit();
        self.inner.find_user_by_email(email).await
    }

    async fn update_user_name(&self, email: &str, name: &str) -> Result<User, RepositoryError> {
        self.hit();
        self.inner.update_user_name(email, name).await
    }

    async fn delete_user_by_email(&self, email: &str) -> Result<(), RepositoryError> {
        self.hit();
        self.inner.delete_user_by_email(email).await
    }
}

/// Business events reported by the gate and the services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusinessEvent {
    UserCreated(Role),
    LoginSucceeded(Role),
    LoginFailed(&'static str),
    TokenIssued(Role),
    AuthorizationChecked(bool, String),
}

/// Sink that keeps everything emitted while serving calls.
#[derive(Default)]
pub struct RecordingSink {
    pub requests: Mutex<Vec<(String, RpcCode)>>,
    pub durations: Mutex<Vec<(String, StdDuration)>>,
    pub errors: Mutex<Vec<(String, RpcCode)>>,
    pub events: Mutex<Vec<BusinessEvent>>,
}

impl RecordingSink {
    pub fn requests(&self) -> Vec<(String, RpcCode)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn durations(&self) -> Vec<(String, StdDuration)> {
        self.durations.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<(String, RpcCode)> {
        self.errors.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<BusinessEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: BusinessEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl MetricsSink for RecordingSink {
    fn increment_requests(&self, operation: &str, code: RpcCode) {
        self.requests
            .lock()
            .unwrap()
            .push((operation.to_string(), code));
    }

    fn observe_duration(&self, operation: &str, elapsed: StdDuration) {
        self.durations
            .lock()
            .unwrap()
            .push((operation.to_string(), elapsed));
    }

    fn increment_errors(&self, operation: &str, code: RpcCode) {
        self.errors
            .lock()
            .unwrap()
            .push((operation.to_string(), code));
    }

    fn user_created(&self, role: Role) {
        self.push(BusinessEvent::UserCreated(role));
    }

    fn login_succeeded(&self, role: Role) {
        self.push(BusinessEvent::LoginSucceeded(role));
    }

    fn login_failed(&self, reason: &'static str) {
        self.push(BusinessEvent::LoginFailed(reason));
    }

    fn token_issued(&self, role: Role) {
        self.push(BusinessEvent::TokenIssued(role));
    }

    fn authorization_checked(&self, allowed: bool, role: &str) {
        self.push(BusinessEvent::AuthorizationChecked(allowed, role.to_string()));
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub repo: Arc<CountingRepository>,
    pub sink: Arc<RecordingSink>,
    pub maker: Arc<dyn TokenMaker>,
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(|state| state)
}

/// Builds the app, letting the caller adjust the state first.
pub fn setup_test_app_with<F>(configure: F) -> TestApp
where
    F: FnOnce(AppState) -> AppState,
{
    let repo = Arc::new(CountingRepository::default());
    let sink = Arc::new(RecordingSink::default());
    let maker: Arc<dyn TokenMaker> = Arc::new(SymmetricTokenMaker::new(TEST_KEY).unwrap());

    let state = AppState::new(repo.clone(), Arc::clone(&maker), Duration::minutes(15))
        .with_bcrypt_cost(4 /* bcrypt minimum cost */)
        .with_metrics(sink.clone());
    let state = configure(state);

    TestApp {
        router: init_router(state.clone()),
        state,
        repo,
        sink,
        maker,
    }
}

impl TestApp {
    /// Stores a user directly, bypassing the service.
    pub async fn seed_user(&self, name: &str, email: &str, role: Role) -> User {
        let hashed_password = hash_password_with_cost(TEST_PASSWORD, 4 /* bcrypt minimum cost */).unwrap();
        self.repo
            .create_user(CreateUserParams {
                name: name.to_string(),
                email: email.to_string(),
                role,
                hashed_password,
            })
            .await
            .unwrap()
    }

    pub fn token_for(&self, email: &str, role: Role) -> String {
        self.maker
            .create_token(email, role, Duration::minutes(15))
            .unwrap()
            .0
    }

    /// Calls `operation` and returns the status and decoded JSON body.
    pub async fn call(
        &self,
        operation: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/rpc/UserService/{operation}"))
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", token);
        }
        let request = builder
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}
