use crate::modules::users::controller::{
    create_admin, create_user, delete_user, get_user, update_user,
};
use crate::state::AppState;
use axum::{Router, routing::post};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/CreateUser", post(create_user))
        .route("/CreateAdmin", post(create_admin))
        .route("/GetUser", post(get_user))
        .route("/UpdateUser", post(update_user))
        .route("/DeleteUser", post(delete_user))
}
