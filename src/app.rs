use crate::events::{EventSink, InngestClient, SHOW_ADDED_EVENT};
use crate::models::{AddShowRequest, Movie, OccupiedSeats, Show};
use crate::store::{MongoStore, ShowStore};
use crate::tmdb::{TmdbApi, TmdbClient};
use anyhow::{anyhow, Context, Result};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{json, Value};
use std::{
    collections::{BTreeMap, HashSet},
    net::SocketAddr,
    sync::Arc,
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};

const MAX_BODY_BYTES: usize = 1024 * 1024; // 1MB safety cap

#[derive(Clone)]
pub struct AppState {
    pub tmdb: Arc<dyn TmdbApi>,
    pub store: Arc<dyn ShowStore>,
    pub events: Arc<dyn EventSink>,
}

pub async fn run_server() -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::from_env()?);
    let store: Arc<dyn ShowStore> = Arc::new(MongoStore::from_env().await?);
    let events: Arc<dyn EventSink> = Arc::new(InngestClient::from_env()?);

    let state = AppState {
        tmdb,
        store,
        events,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/show/now-playing", get(now_playing))
        .route("/api/show/add", post(add_show))
        .route("/api/show/all", get(list_shows))
        .route("/api/show/:movie_id", get(show_detail))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Errors are reported in the response body; the HTTP status stays 200.
fn failure(err: anyhow::Error) -> Json<Value> {
    Json(json!({ "success": false, "message": err.to_string() }))
}

async fn now_playing(State(state): State<AppState>) -> Json<Value> {
    match state.tmdb.now_playing().await {
        Ok(movies) => Json(json!({ "success": true, "movies": movies })),
        Err(err) => {
            error!("Failed to fetch now-playing movies: {:?}", err);
            failure(err)
        }
    }
}

async fn add_show(
    State(state): State<AppState>,
    Json(req): Json<AddShowRequest>,
) -> Json<Value> {
    match add_show_inner(&state, req).await {
        Ok(body) => Json(body),
        Err(err) => {
            error!("Failed to add show: {:?}", err);
            failure(err)
        }
    }
}

async fn add_show_inner(state: &AppState, req: AddShowRequest) -> Result<Value> {
    let movie = match state.store.find_movie(&req.movie_id).await? {
        Some(movie) => movie,
        None => {
            let (details, credits) = tokio::try_join!(
                state.tmdb.movie_details(&req.movie_id),
                state.tmdb.movie_credits(&req.movie_id)
            )?;
            let movie = Movie::from_catalog(req.movie_id.clone(), details, credits);
            state.store.insert_movie(&movie).await?;
            info!("Cached movie '{}' ({})", movie.title, movie.id);
            movie
        }
    };

    let shows = build_shows(&req)?;
    if !shows.is_empty() {
        state.store.insert_shows(&shows).await?;
    }
    info!("Added {} shows for movie '{}'", shows.len(), movie.title);

    // Notification failures must not fail the request.
    if let Err(err) = state
        .events
        .send(SHOW_ADDED_EVENT, json!({ "movieTitle": movie.title }))
        .await
    {
        warn!("Failed to emit show-added event: {:?}", err);
    }

    Ok(json!({ "success": true, "message": "Show Added successfully." }))
}

fn build_shows(req: &AddShowRequest) -> Result<Vec<Show>> {
    let mut shows = Vec::new();
    for input in &req.shows_input {
        for time in &input.time {
            shows.push(Show {
                id: None,
                movie: req.movie_id.clone(),
                show_date_time: parse_show_date_time(&input.date, time)?,
                show_price: req.show_price,
                occupied_seats: OccupiedSeats::new(),
            });
        }
    }
    Ok(shows)
}

/// Date and time arrive as separate fields and are treated as UTC wall-clock.
fn parse_show_date_time(date: &str, time: &str) -> Result<DateTime<Utc>> {
    let raw = format!("{date}T{time}");
    let parsed = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M"))
        .with_context(|| format!("Invalid show date-time '{raw}'"))?;
    Ok(parsed.and_utc())
}

async fn list_shows(State(state): State<AppState>) -> Json<Value> {
    match list_shows_inner(&state).await {
        Ok(body) => Json(body),
        Err(err) => {
            error!("Failed to list shows: {:?}", err);
            failure(err)
        }
    }
}

async fn list_shows_inner(state: &AppState) -> Result<Value> {
    let shows = state.store.find_all_shows().await?;
    let mut seen = HashSet::new();
    let mut movies = Vec::new();
    for show in shows {
        // One entry per movie, in the order shows first appear.
        if !seen.insert(show.movie.clone()) {
            continue;
        }
        let movie = state
            .store
            .find_movie(&show.movie)
            .await?
            .ok_or_else(|| anyhow!("Movie '{}' referenced by show is missing", show.movie))?;
        movies.push(movie);
    }
    Ok(json!({ "success": true, "shows": movies }))
}

async fn show_detail(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> Json<Value> {
    match show_detail_inner(&state, &movie_id).await {
        Ok(body) => Json(body),
        Err(err) => {
            error!("Failed to fetch show detail: {:?}", err);
            failure(err)
        }
    }
}

async fn show_detail_inner(state: &AppState, movie_id: &str) -> Result<Value> {
    let movie_id = movie_id.trim();
    let shows = state.store.find_all_shows().await?;
    let matching: Vec<Show> = shows
        .into_iter()
        .filter(|show| show.movie.trim() == movie_id)
        .collect();
    if matching.is_empty() {
        return Ok(json!({ "success": false, "message": "No shows found for this movie." }));
    }

    let movie = state.store.find_movie(movie_id).await?;

    let mut date_time: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for show in &matching {
        let date = show.show_date_time.date_naive().to_string();
        date_time.entry(date).or_default().push(json!({
            "time": show.show_date_time,
            "showId": show.id.map(|id| id.to_hex()),
        }));
    }

    Ok(json!({ "success": true, "movie": movie, "dateTime": date_time }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
