use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::tmdb::{Credits, MovieDetails};

/// Seat identifier mapped to the id of the booking holding it. Empty until
/// seats are booked.
pub type OccupiedSeats = BTreeMap<String, String>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Movie {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub genres: Vec<Genre>,
    pub casts: Vec<CastMember>,
    pub release_date: Option<String>,
    pub original_language: String,
    pub tagline: String,
    pub vote_average: f64,
    pub runtime: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CastMember {
    pub id: i64,
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    #[serde(
        rename = "_id",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_object_id",
        default
    )]
    pub id: Option<ObjectId>,
    /// Movie `_id` this screening belongs to. Not enforced by the database.
    pub movie: String,
    pub show_date_time: DateTime<Utc>,
    pub show_price: f64,
    pub occupied_seats: OccupiedSeats,
}

impl Movie {
    /// Combines the catalog's detail and credits responses into the document
    /// persisted on first reference. A missing tagline becomes `""`.
    pub fn from_catalog(id: String, details: MovieDetails, credits: Credits) -> Self {
        Self {
            id,
            title: details.title,
            overview: details.overview,
            poster_path: details.poster_path,
            backdrop_path: details.backdrop_path,
            genres: details.genres,
            casts: credits.cast,
            release_date: details.release_date,
            original_language: details.original_language,
            tagline: details.tagline.unwrap_or_default(),
            vote_average: details.vote_average,
            runtime: details.runtime,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AddShowRequest {
    pub movie_id: String,
    pub shows_input: Vec<ShowInput>,
    pub show_price: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShowInput {
    pub date: String,
    pub time: Vec<String>,
}

pub fn serialize_object_id<S>(id: &Option<ObjectId>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match id {
        Some(oid) => serializer.serialize_str(&oid.to_hex()),
        None => serializer.serialize_none(),
    }
}
