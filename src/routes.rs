// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, comments},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public reads: threads, single comments, comment settings.
/// * Writes require a bearer token; purging a post's thread requires admin.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let post_routes = Router::new().route(
        "/{post_id}/comments",
        get(comments::list_comments).merge(
            post(comments::create_comment).route_layer(auth.clone()),
        ),
    );

    let comment_routes = Router::new().route(
        "/{id}",
        get(comments::get_comment).merge(
            put(comments::update_comment)
                .delete(comments::delete_comment)
                .route_layer(auth.clone()),
        ),
    );

    let config_routes = Router::new().route("/comments", get(comments::comment_settings));

    let admin_routes = Router::new()
        .route("/posts/{post_id}/comments", delete(admin::purge_post_comments))
        // Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(auth);

    Router::new()
        .nest("/api/posts", post_routes)
        .nest("/api/comments", comment_routes)
        .nest("/api/config", config_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
