pub mod auth;
pub mod badge;
pub mod comments;
pub mod error;
pub mod github;
pub mod middleware;
pub mod reactions;
pub mod state;
pub mod users;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// All routes, mounted under `/api`. The status route answers on both
/// `/api` and `/api/`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(users::status))
        .route("/users", get(users::list_users))
        .route(
            "/user/{username}/comments",
            get(comments::list_comments)
                .post(comments::create_comment)
                .delete(comments::delete_comment),
        )
        .route("/user/{username}/svg", get(badge::get_badge))
        .route("/like/like/{comment_id}", post(reactions::like))
        .route("/like/remove-like/{comment_id}", post(reactions::remove_like))
        .route("/like/dislike/{comment_id}", post(reactions::dislike))
        .route("/like/remove-dislike/{comment_id}", post(reactions::remove_dislike))
        .route("/like/owner-like/{comment_id}", post(reactions::owner_like))
        .route("/like/owner-remove-like/{comment_id}", post(reactions::owner_remove_like))
        .route("/comments/{comment_id}/reaction", put(reactions::set_reaction))
        .route("/comments/{comment_id}/counts", get(reactions::counts))
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", get(auth::logout));

    Router::new()
        // Nesting maps "/" to "/api" only; clients also call "/api/".
        .route("/api/", get(users::status))
        .nest("/api", api)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::load_session,
        ))
        .with_state(state)
}
