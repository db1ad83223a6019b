use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::{
    AppState,
    error::{AppError, AppResult},
    filter::{FilterParams, MovieFilter},
    models::Movie,
    pagination::{Page, PageParams, PageRequest, paginate},
    store::{MovieRepository, next_id},
    validation::{self, FieldErrors, ensure_unique_external_id},
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(flatten)]
    filters: FilterParams,
    #[serde(flatten)]
    paging: PageParams,
}

#[derive(Debug, Serialize)]
pub struct GenrePage {
    genre: String,
    #[serde(flatten)]
    page: Page<Movie>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListQuery>,
) -> AppResult<Json<Page<Movie>>> {
    let (filter, req) = match (MovieFilter::from_params(&q.filters), PageRequest::from_params(&q.paging)) {
        (Ok(filter), Ok(req)) => (filter, req),
        (filter, req) => {
            let mut errors = FieldErrors::new();
            if let Err(e) = filter {
                errors.extend(e);
            }
            if let Err(e) = req {
                errors.extend(e);
            }
            return Err(errors.into());
        },
    };

    let movies = with_store(&state, |store| Ok(store.load())).await?;
    let movies = filter.apply(movies);
    debug!(matches = movies.len(), page = req.page, "listing movies");
    Ok(Json(paginate(movies, req)))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let body = json_body(payload)?;
    let changes = validation::parse(&body, false)?;

    let movie = with_store(&state, move |store| {
        let mut movies = store.load();
        if let Some(Some(imdb_id)) = &changes.imdb_id {
            ensure_unique_external_id(&movies, imdb_id, None)?;
        }

        let movie = Movie::create(next_id(&movies), changes, Timestamp::now());
        movies.push(movie.clone());
        store.save(&movies)?;
        Ok(movie)
    })
    .await?;

    info!(id = movie.id, title = %movie.title, "created movie");
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Movie>> {
    let id = movie_id(path)?;
    let movie = with_store(&state, move |store| Ok(store.find_by_id(id))).await?;
    movie.map(Json).ok_or_else(|| not_found(id))
}

pub async fn movie_by_imdb_id(
    State(state): State<Arc<AppState>>,
    Path(imdb_id): Path<String>,
) -> AppResult<Json<Movie>> {
    let key = imdb_id.clone();
    let movie = with_store(&state, move |store| Ok(store.find_by_external_id(&key))).await?;
    movie
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no movie with imdb_id {imdb_id}")))
}

pub async fn replace_movie(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Movie>> {
    let id = movie_id(path)?;
    update(&state, id, json_body(payload)?, false).await.map(Json)
}

pub async fn patch_movie(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Movie>> {
    let id = movie_id(path)?;
    update(&state, id, json_body(payload)?, true).await.map(Json)
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<StatusCode> {
    let id = movie_id(path)?;

    with_store(&state, move |store| {
        let mut movies = store.load();
        let before = movies.len();
        movies.retain(|m| m.id != id);
        if movies.len() == before {
            return Err(not_found(id));
        }
        store.save(&movies)?;
        Ok(())
    })
    .await?;

    info!(id, "deleted movie");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn movies_by_genre(
    State(state): State<Arc<AppState>>,
    Path(genre): Path<String>,
    Query(paging): Query<PageParams>,
) -> AppResult<Json<GenrePage>> {
    let req = PageRequest::from_params(&paging)?;
    let movies = with_store(&state, |store| Ok(store.load())).await?;
    let movies = MovieFilter::new().genre(&genre).apply(movies);
    if movies.is_empty() {
        return Err(AppError::NotFound(format!("no movies found for genre: {genre}")));
    }
    Ok(Json(GenrePage { genre, page: paginate(movies, req) }))
}

pub async fn featured_movies(
    State(state): State<Arc<AppState>>,
    Query(paging): Query<PageParams>,
) -> AppResult<Json<Page<Movie>>> {
    let req = PageRequest::from_params(&paging)?;
    let movies = with_store(&state, |store| Ok(store.load())).await?;
    let movies = MovieFilter::new().featured(true).apply(movies);
    Ok(Json(paginate(movies, req)))
}

async fn update(state: &Arc<AppState>, id: i64, body: Value, partial: bool) -> AppResult<Movie> {
    let changes = validation::parse(&body, partial);

    let updated = with_store(state, move |store| {
        let mut movies = store.load();
        let Some(idx) = movies.iter().position(|m| m.id == id) else {
            return Err(not_found(id));
        };

        let changes = changes?;
        if let Some(Some(imdb_id)) = &changes.imdb_id {
            ensure_unique_external_id(&movies, imdb_id, Some(id))?;
        }

        let movie = &mut movies[idx];
        changes.apply_to(movie);
        movie.touch(Timestamp::now());
        let updated = movie.clone();

        store.save(&movies)?;
        Ok(updated)
    })
    .await?;

    info!(id, partial, "updated movie");
    Ok(updated)
}

/// Runs a load/save cycle on the blocking pool; the store does plain file I/O.
async fn with_store<T, F>(state: &Arc<AppState>, f: F) -> AppResult<T>
where
    F: FnOnce(&dyn MovieRepository) -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || f(store.as_ref())).await?
}

/// Ids that are not integers can never match a movie.
fn movie_id(path: Result<Path<i64>, PathRejection>) -> AppResult<i64> {
    path.map(|Path(id)| id).map_err(|rejection| {
        debug!(error = %rejection, "unparseable movie id");
        AppError::NotFound("movie not found".to_string())
    })
}

fn json_body(payload: Result<Json<Value>, JsonRejection>) -> AppResult<Value> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| FieldErrors::single("non_field_errors", rejection.body_text()).into())
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("movie {id} not found"))
}
