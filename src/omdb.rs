use std::{future::Future, num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum OmdbError {
    /// Carries no request URL: the query string holds the API key.
    #[error("request failed: {0}")]
    Transport(reqwest::Error),
    #[error("unreadable response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for OmdbError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum OmdbLookup {
    Found(OmdbTitle),
    /// The service answered but has no such title; carries its explanation.
    NotFound(String),
}

/// Source of external movie metadata keyed by IMDb id.
pub trait MetadataSource {
    fn lookup(
        &self,
        imdb_id: &str,
    ) -> impl Future<Output = Result<OmdbLookup, OmdbError>> + Send;
}

pub struct OmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl OmdbClient {
    /// `client` carries the per-request timeout.
    pub fn new(client: reqwest::Client, api_key: String, base_url: String, rps: u32) -> Self {
        let rps = NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));
        Self { client, api_key, base_url, limiter }
    }
}

impl MetadataSource for OmdbClient {
    async fn lookup(&self, imdb_id: &str) -> Result<OmdbLookup, OmdbError> {
        self.limiter.until_ready().await;

        let body = self
            .client
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str()), ("i", imdb_id)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<OmdbLookup, OmdbError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    if envelope.response.as_deref().is_some_and(|r| r.eq_ignore_ascii_case("false")) {
        let reason = envelope.error.unwrap_or_else(|| "not found".to_string());
        return Ok(OmdbLookup::NotFound(reason));
    }
    Ok(OmdbLookup::Found(envelope.title))
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(flatten)]
    title: OmdbTitle,
}

/// A title as OMDb describes it. Every field is free text, often `"N/A"`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OmdbTitle {
    pub title: Option<String>,
    pub plot: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub runtime: Option<String>,
    pub poster: Option<String>,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: Option<String>,
    #[serde(rename = "imdbID")]
    pub imdb_id: Option<String>,
    pub director: Option<String>,
    pub actors: Option<String>,
    pub writer: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub awards: Option<String>,
    pub metascore: Option<String>,
    #[serde(rename = "imdbVotes")]
    pub imdb_votes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_found_title() {
        let body = r#"{
            "Title": "Inception", "Year": "2010", "Runtime": "148 min",
            "Genre": "Action, Adventure, Sci-Fi", "Director": "Christopher Nolan",
            "Plot": "A thief who steals corporate secrets.", "imdbRating": "8.8",
            "imdbVotes": "2,600,000", "imdbID": "tt1375666", "Type": "movie",
            "Ratings": [{"Source": "Metacritic", "Value": "74/100"}],
            "Response": "True"
        }"#;

        let OmdbLookup::Found(title) = parse_response(body).unwrap() else {
            panic!("expected a title");
        };
        assert_eq!(title.title.as_deref(), Some("Inception"));
        assert_eq!(title.runtime.as_deref(), Some("148 min"));
        assert_eq!(title.imdb_id.as_deref(), Some("tt1375666"));
        assert_eq!(title.poster, None);
    }

    #[test]
    fn parses_not_found() {
        let body = r#"{"Response":"False","Error":"Incorrect IMDb ID."}"#;
        assert_eq!(
            parse_response(body).unwrap(),
            OmdbLookup::NotFound("Incorrect IMDb ID.".to_string())
        );
    }

    #[tokio::test]
    async fn transport_errors_drop_the_keyed_url() {
        let err = reqwest::Client::new()
            .get("ftp://omdb.example.com/")
            .query(&[("apikey", "s3cr3t-key"), ("i", "tt0133093")])
            .send()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("s3cr3t-key"));

        let err = OmdbError::from(err);
        assert!(!err.to_string().contains("s3cr3t-key"));
        assert!(!format!("{err:?}").contains("s3cr3t-key"));
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(parse_response("<html>").unwrap_err(), OmdbError::Decode(_)));
    }
}
