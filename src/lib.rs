//! Cinema show-listing backend: TMDB-backed catalog reads, MongoDB-backed
//! show storage, and fire-and-forget notifications on new shows.

pub mod app;
pub mod events;
pub mod models;
pub mod store;
pub mod tmdb;
