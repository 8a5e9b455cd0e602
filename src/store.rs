use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};
use std::env;

use crate::models::{Movie, Show};

pub const DB_NAME: &str = "showtime";
const MOVIES_COLLECTION: &str = "movies";
const SHOWS_COLLECTION: &str = "shows";

#[async_trait]
pub trait ShowStore: Send + Sync {
    async fn find_movie(&self, id: &str) -> Result<Option<Movie>>;
    async fn insert_movie(&self, movie: &Movie) -> Result<()>;
    /// Every show, in the database's default order.
    async fn find_all_shows(&self) -> Result<Vec<Show>>;
    async fn insert_shows(&self, shows: &[Show]) -> Result<()>;
}

#[derive(Clone)]
pub struct MongoStore {
    movies: Collection<Movie>,
    shows: Collection<Show>,
}

impl MongoStore {
    pub async fn from_env() -> Result<Self> {
        let uri = env::var("MONGODB_URI").context("MONGODB_URI not set")?;
        Self::connect(&uri).await
    }

    pub async fn connect(uri: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .context("Failed to connect to MongoDB")?;
        let db = client.database(DB_NAME);
        Ok(Self {
            movies: db.collection(MOVIES_COLLECTION),
            shows: db.collection(SHOWS_COLLECTION),
        })
    }
}

#[async_trait]
impl ShowStore for MongoStore {
    async fn find_movie(&self, id: &str) -> Result<Option<Movie>> {
        self.movies
            .find_one(doc! { "_id": id })
            .await
            .context("Movie lookup failed")
    }

    async fn insert_movie(&self, movie: &Movie) -> Result<()> {
        self.movies
            .insert_one(movie)
            .await
            .context("Movie insert failed")?;
        Ok(())
    }

    async fn find_all_shows(&self) -> Result<Vec<Show>> {
        let cursor = self
            .shows
            .find(doc! {})
            .await
            .context("Show query failed")?;
        cursor.try_collect().await.context("Reading shows failed")
    }

    async fn insert_shows(&self, shows: &[Show]) -> Result<()> {
        self.shows
            .insert_many(shows)
            .await
            .context("Show insert failed")?;
        Ok(())
    }
}
