use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub movies_path: PathBuf,
    pub omdb_api_key: String,
    pub omdb_base_url: String,
    pub omdb_timeout_secs: u64,
    pub omdb_rps: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "8000".to_string()).parse().context("PORT")?;

        let movies_path = std::env::var("MOVIES_JSON_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/movies.json"));

        let omdb_api_key = std::env::var("OMDB_API_KEY").unwrap_or_default();
        let omdb_base_url = std::env::var("OMDB_BASE_URL")
            .unwrap_or_else(|_| "http://www.omdbapi.com/".to_string());

        let omdb_timeout_secs: u64 = std::env::var("OMDB_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("OMDB_TIMEOUT_SECS")?;

        let omdb_rps: u32 =
            std::env::var("OMDB_RPS").unwrap_or_else(|_| "5".to_string()).parse().context("OMDB_RPS")?;

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            movies_path,
            omdb_api_key,
            omdb_base_url,
            omdb_timeout_secs,
            omdb_rps,
        })
    }
}
