#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use movie_catalog::store::JsonMovieStore;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

/// Router over a movie document inside a throwaway directory.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<JsonMovieStore>,
    _dir: TempDir,
}

pub fn test_app() -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(JsonMovieStore::new(dir.path().join("data/movies.json")));
    let router = movie_catalog::app(store.clone());
    TestApp { router, store, _dir: dir }
}

/// Store whose parent directory is a regular file, so every save fails.
pub fn unwritable_app() -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"plain file").expect("write blocker");
    let store = Arc::new(JsonMovieStore::new(blocker.join("movies.json")));
    let router = movie_catalog::app(store.clone());
    TestApp { router, store, _dir: dir }
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = self.request(Method::GET, uri, None).await;
        (response.status(), body_json(response).await)
    }

    pub async fn send_json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = self.request(method, uri, Some(body)).await;
        (response.status(), body_json(response).await)
    }

    /// Creates a movie through the API and returns its body.
    pub async fn create(&self, body: Value) -> Value {
        let (status, created) = self.send_json(Method::POST, "/movies/", body).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {created}");
        created
    }
}

/// Reads the whole body as JSON; an empty body decodes to `null`.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

pub fn movie_body(title: &str, genre: &str) -> Value {
    json!({
        "title": title,
        "description": format!("{title}, a film."),
        "genre": genre,
        "release_year": 2010,
        "duration_minutes": 120,
        "rating": 7.5,
        "thumbnail_url": "https://img.example.com/poster.jpg",
        "video_url": "https://cdn.example.com/movie.mp4"
    })
}
