pub mod actions;
pub mod app;
pub mod compose;
pub mod config;
pub mod genres;
pub mod media;
pub mod tmdb;
