use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::time::Duration;

use crate::models::{CastMember, Genre};

const TMDB_BASE: &str = "https://api.themoviedb.org/3";

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
}

#[async_trait]
pub trait TmdbApi: Send + Sync {
    /// Currently playing titles, passed through untouched.
    async fn now_playing(&self) -> Result<Vec<Value>>;
    async fn movie_details(&self, id: &str) -> Result<MovieDetails>;
    async fn movie_credits(&self, id: &str) -> Result<Credits>;
}

/// The subset of TMDB's movie detail response this service persists.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieDetails {
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub release_date: Option<String>,
    pub original_language: String,
    pub tagline: Option<String>,
    pub vote_average: f64,
    pub runtime: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

impl TmdbClient {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        let user_agent = format!("showtime/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self { client, api_key })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {}", url, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn now_playing(&self) -> Result<Vec<Value>> {
        #[derive(Deserialize)]
        struct NowPlayingResponse {
            results: Vec<Value>,
        }

        let url = format!("{TMDB_BASE}/movie/now_playing");
        let data: NowPlayingResponse = self.get_json(&url).await?;
        Ok(data.results)
    }

    async fn movie_details(&self, id: &str) -> Result<MovieDetails> {
        let url = format!("{TMDB_BASE}/movie/{id}");
        self.get_json(&url).await
    }

    async fn movie_credits(&self, id: &str) -> Result<Credits> {
        let url = format!("{TMDB_BASE}/movie/{id}/credits");
        self.get_json(&url).await
    }
}
