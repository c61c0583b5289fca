pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::require_auth;
use crate::creations;
use crate::generation;
use crate::state::AppState;

// Uploads are validated in the handlers (resume cap is 5 MB); the transport
// limit just has to sit above that so the handler message is the one callers
// see.
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    // Exactly one auth gate: the middleware below covers every /api route.
    let api = Router::new()
        .route("/creations/mine", get(creations::handlers::handle_mine))
        .route(
            "/creations/published",
            get(creations::handlers::handle_published),
        )
        .route(
            "/creations/:id/like",
            post(creations::handlers::handle_toggle_like),
        )
        .route("/generate/article", post(generation::handlers::handle_article))
        .route(
            "/generate/blog-title",
            post(generation::handlers::handle_blog_title),
        )
        .route("/generate/image", post(generation::handlers::handle_image))
        .route(
            "/generate/remove-background",
            post(generation::handlers::handle_remove_background),
        )
        .route(
            "/generate/remove-object",
            post(generation::handlers::handle_remove_object),
        )
        .route(
            "/generate/resume-review",
            post(generation::handlers::handle_resume_review),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::models::caller::Plan;
    use crate::test_support::{caller, state_with, test_state, FakeIdentity};

    #[tokio::test]
    async fn test_health_is_open() {
        let (state, _) = test_state();
        let response = build_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_routes_require_a_credential() {
        let (state, _) = test_state();
        let response = build_router(state)
            .oneshot(
                Request::get("/api/creations/mine")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_credential_is_rejected() {
        let (state, _) = test_state();
        let response = build_router(state)
            .oneshot(
                Request::get("/api/creations/mine")
                    .header(header::AUTHORIZATION, "Bearer forged")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_credential_reaches_the_handler() {
        let identity = FakeIdentity::with_token("tok", caller("u1", Plan::Free, 0));
        let (state, _) = state_with(identity);
        let response = build_router(state)
            .oneshot(
                Request::get("/api/creations/mine")
                    .header(header::AUTHORIZATION, "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unmatched_routes_fall_through_to_404() {
        let (state, _) = test_state();
        let response = build_router(state)
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
