pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth_handlers;
use crate::auth::middleware::require_auth;
use crate::ingest::handlers as ingest_handlers;
use crate::library::handlers as library_handlers;
use crate::review::handlers as review_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Everything past login/registration sits behind the session guard.
    let guarded = Router::new()
        .route(
            "/summarization",
            get(ingest_handlers::summarization_view).post(ingest_handlers::summarization_submit),
        )
        .route(
            "/result",
            get(review_handlers::result_view).post(review_handlers::store_selected),
        )
        .route(
            "/confirm_replace",
            get(review_handlers::confirm_replace_view)
                .post(review_handlers::confirm_replace_submit),
        )
        .route(
            "/myarticle",
            get(library_handlers::list_folders).post(library_handlers::create_folder_handler),
        )
        .route("/folder/:folder_id", get(library_handlers::view_folder))
        .route(
            "/delete_folder/:folder_id",
            post(library_handlers::delete_folder_handler),
        )
        .route(
            "/delete_articles",
            post(library_handlers::delete_articles_handler),
        )
        .route(
            "/edit_article/:article_id",
            get(library_handlers::edit_article_view).post(library_handlers::edit_article_submit),
        )
        .route(
            "/compare_articles",
            post(library_handlers::compare_articles),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/", get(auth_handlers::login_view).post(auth_handlers::login))
        .route("/logout", get(auth_handlers::logout))
        .route(
            "/register",
            get(auth_handlers::register_view).post(auth_handlers::register),
        )
        .merge(guarded)
        .with_state(state)
}
