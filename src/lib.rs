pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod omdb;
pub mod pagination;
pub mod routes;
pub mod store;
pub mod sync;
pub mod validation;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::store::MovieRepository;

pub struct AppState {
    pub store: Arc<dyn MovieRepository>,
}

pub fn app(store: Arc<dyn MovieRepository>) -> Router {
    let state = Arc::new(AppState { store });

    Router::new()
        .route("/health", get(routes::health))
        .route("/movies/", get(routes::list_movies).post(routes::create_movie))
        .route("/movies/featured/", get(routes::featured_movies))
        .route("/movies/genre/{genre}/", get(routes::movies_by_genre))
        .route("/movies/imdb/{imdb_id}/", get(routes::movie_by_imdb_id))
        .route(
            "/movies/{id}/",
            get(routes::get_movie)
                .put(routes::replace_movie)
                .patch(routes::patch_movie)
                .delete(routes::delete_movie),
        )
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
}
