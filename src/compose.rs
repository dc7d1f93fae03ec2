//! Message composition for entity details, listings and reviews.
use crate::media::{Entity, Review, WatchProviders};
use chrono::{Datelike, NaiveDate};
use serde_json::Value;

pub const DETAIL_OVERVIEW_LIMIT: usize = 500;
pub const LISTING_OVERVIEW_LIMIT: usize = 300;
pub const REVIEW_LIMIT: usize = 600;
pub const MAX_LISTED: usize = 5;
pub const MAX_REVIEWS: usize = 5;

pub const NO_REVIEWS: &str = "Non sono disponibili recensioni per questo titolo.";

/// Whether the user asked to see an optional attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    Requested,
    Declined,
    #[default]
    Unspecified,
}

impl TriState {
    /// Reads a slot value: booleans, or yes/no words as the NLU may fill them.
    pub fn from_slot(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(true)) => TriState::Requested,
            Some(Value::Bool(false)) => TriState::Declined,
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "si" | "sì" | "yes" | "true" => TriState::Requested,
                "no" | "false" => TriState::Declined,
                _ => TriState::Unspecified,
            },
            _ => TriState::Unspecified,
        }
    }

    pub fn is_requested(&self) -> bool {
        matches!(self, TriState::Requested)
    }
}

/// Cuts `text` to `limit` characters and appends `...`; shorter text passes through.
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn join_genres<S: AsRef<str>>(genres: &[S]) -> String {
    genres
        .iter()
        .map(|g| g.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Year part of an ISO date; non-ISO input is shown as-is.
pub fn release_year(release_date: &str) -> String {
    match NaiveDate::parse_from_str(release_date.trim(), "%Y-%m-%d") {
        Ok(date) => date.year().to_string(),
        Err(_) if release_date.trim().is_empty() => "non disponibile".to_string(),
        Err(_) => release_date.trim().to_string(),
    }
}

/// Builds the details message. Year and genre are only added when explicitly requested;
/// any other combination falls through to title and overview.
pub fn compose<S: AsRef<str>>(
    title: &str,
    overview: &str,
    release_date: &str,
    genres: &[S],
    want_year: TriState,
    want_genre: TriState,
) -> String {
    let mut message = format!(
        "Ecco i dettagli su {title}:\nTrama: {}",
        truncate(overview, DETAIL_OVERVIEW_LIMIT)
    );
    let year_line = format!("\nAnno di uscita: {}", release_year(release_date));
    let genre_line = format!("\nGenere: {}", join_genres(genres));
    match (want_year, want_genre) {
        (TriState::Requested, TriState::Requested) => {
            message.push_str(&year_line);
            message.push_str(&genre_line);
        }
        (TriState::Requested, _) => message.push_str(&year_line),
        (_, TriState::Requested) => message.push_str(&genre_line),
        _ => {}
    }
    message
}

pub fn compose_entity(entity: &Entity, want_year: TriState, want_genre: TriState) -> String {
    compose(
        entity.title(),
        entity.overview(),
        entity.release_date(),
        &entity.genres,
        want_year,
        want_genre,
    )
}

/// One message per review (at most five, in API order), or a single notice when there are none.
pub fn render_reviews(reviews: &[Review]) -> Vec<String> {
    if reviews.is_empty() {
        return vec![NO_REVIEWS.to_string()];
    }
    reviews
        .iter()
        .take(MAX_REVIEWS)
        .map(|r| {
            format!(
                "Autore: {}\nRecensione: {}",
                r.author(),
                truncate(r.content(), REVIEW_LIMIT)
            )
        })
        .collect()
}

/// Bulleted preview of the first entries of a listing.
pub fn render_listing(header: &str, entities: &[Entity]) -> String {
    let mut message = format!("{header}\n");
    for (idx, entity) in entities.iter().take(MAX_LISTED).enumerate() {
        let date = entity.release_date();
        let dated = if date.is_empty() {
            String::new()
        } else {
            format!(" ({date})")
        };
        message.push_str(&format!(
            "\n{}. {}{}\n{}\n",
            idx + 1,
            entity.title(),
            dated,
            truncate(entity.overview(), LISTING_OVERVIEW_LIMIT)
        ));
    }
    message
}

pub fn render_watch_providers(title: &str, providers: &WatchProviders) -> String {
    let mut message = format!("Ecco dove puoi guardare {title}:");
    for (label, names) in [
        ("In streaming", &providers.streaming),
        ("A noleggio", &providers.rent),
        ("In vendita", &providers.buy),
    ] {
        if !names.is_empty() {
            message.push_str(&format!("\n{label}: {}", names.join(", ")));
        }
    }
    if let Some(link) = &providers.link {
        message.push_str(&format!("\nMaggiori dettagli: {link}"));
    }
    message
}
