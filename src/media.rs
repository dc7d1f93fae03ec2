//! Typed projections of the JSON objects returned by TMDB.
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

pub const POSTER_BASE: &str = "https://image.tmdb.org/t/p/original";

pub const DEFAULT_TITLE: &str = "Titolo non disponibile";
pub const DEFAULT_OVERVIEW: &str = "Trama non disponibile";
pub const DEFAULT_RELEASE_DATE: &str = "Data di uscita non disponibile";
pub const DEFAULT_AUTHOR: &str = "Autore sconosciuto";
pub const DEFAULT_REVIEW: &str = "Recensione non disponibile";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Path segment used by TMDB (`/search/movie`, `/tv/{id}`, ...).
    pub fn path(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }

    /// Slot holding the title the user asked about.
    pub fn title_slot(&self) -> &'static str {
        match self {
            MediaKind::Movie => "titolo_film",
            MediaKind::Series => "titolo_serie",
        }
    }

    pub fn noun(&self) -> &'static str {
        match self {
            MediaKind::Movie => "film",
            MediaKind::Series => "serie",
        }
    }

    /// "nessun film" / "nessuna serie"
    pub fn none_of(&self) -> &'static str {
        match self {
            MediaKind::Movie => "nessun film",
            MediaKind::Series => "nessuna serie",
        }
    }
}

#[derive(Debug, Deserialize)]
struct NamedItem {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    id: Option<i64>,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    #[serde(default)]
    genres: Option<Vec<NamedItem>>,
    poster_path: Option<String>,
}

/// A movie or series as seen by a single handler invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: MediaKind,
    pub id: Option<i64>,
    title: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    pub genres: Vec<String>,
    poster_path: Option<String>,
}

impl Entity {
    pub fn from_json(kind: MediaKind, value: &Value) -> Result<Self> {
        let raw = RawEntity::deserialize(value)
            .with_context(|| format!("unexpected TMDB {} shape", kind.path()))?;
        let (title, release_date) = match kind {
            MediaKind::Movie => (raw.title, raw.release_date),
            MediaKind::Series => (raw.name, raw.first_air_date),
        };
        let genres = raw
            .genres
            .unwrap_or_default()
            .into_iter()
            .filter_map(|g| g.name)
            .collect();
        Ok(Self {
            kind,
            id: raw.id,
            title: non_empty(title),
            overview: non_empty(raw.overview),
            release_date: non_empty(release_date),
            genres,
            poster_path: non_empty(raw.poster_path),
        })
    }

    pub fn from_map(kind: MediaKind, map: &Map<String, Value>) -> Result<Self> {
        Self::from_json(kind, &Value::Object(map.clone()))
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    /// Borrows `other`'s title when this projection has none.
    pub fn with_fallback_title(mut self, other: &Entity) -> Self {
        if self.title.is_none() {
            self.title = other.title.clone();
        }
        self
    }

    pub fn overview(&self) -> &str {
        self.overview.as_deref().unwrap_or(DEFAULT_OVERVIEW)
    }

    /// ISO `YYYY-MM-DD`, or an empty string when TMDB has no date.
    pub fn release_date(&self) -> &str {
        self.release_date.as_deref().unwrap_or("")
    }

    pub fn release_date_or_default(&self) -> &str {
        self.release_date.as_deref().unwrap_or(DEFAULT_RELEASE_DATE)
    }

    pub fn poster_url(&self) -> Option<String> {
        self.poster_path
            .as_deref()
            .map(|p| format!("{POSTER_BASE}{p}"))
    }
}

#[derive(Debug, Deserialize)]
struct RawReview {
    author: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    author: Option<String>,
    content: Option<String>,
}

impl Review {
    pub fn from_json(value: &Value) -> Result<Self> {
        let raw = RawReview::deserialize(value).context("unexpected TMDB review shape")?;
        Ok(Self {
            author: non_empty(raw.author),
            content: non_empty(raw.content),
        })
    }

    pub fn author(&self) -> &str {
        self.author.as_deref().unwrap_or(DEFAULT_AUTHOR)
    }

    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or(DEFAULT_REVIEW)
    }
}

#[derive(Debug, Deserialize)]
struct Provider {
    provider_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegionProviders {
    link: Option<String>,
    flatrate: Option<Vec<Provider>>,
    rent: Option<Vec<Provider>>,
    buy: Option<Vec<Provider>>,
}

/// Watch providers for one region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchProviders {
    pub link: Option<String>,
    pub streaming: Vec<String>,
    pub rent: Vec<String>,
    pub buy: Vec<String>,
}

impl WatchProviders {
    /// Reads `results.<region>` from a `/watch/providers` response.
    /// `Ok(None)` when the region is absent.
    pub fn from_response(map: &Map<String, Value>, region: &str) -> Result<Option<Self>> {
        let Some(entry) = map.get("results").and_then(|r| r.get(region)) else {
            return Ok(None);
        };
        let raw = RegionProviders::deserialize(entry)
            .with_context(|| format!("unexpected watch providers shape for {region}"))?;
        let providers = Self {
            link: non_empty(raw.link),
            streaming: provider_names(raw.flatrate),
            rent: provider_names(raw.rent),
            buy: provider_names(raw.buy),
        };
        Ok(Some(providers))
    }

    pub fn is_empty(&self) -> bool {
        self.streaming.is_empty() && self.rent.is_empty() && self.buy.is_empty()
    }
}

fn provider_names(list: Option<Vec<Provider>>) -> Vec<String> {
    list.unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.provider_name)
        .collect()
}

/// The `results` sequence of a gateway response; empty when absent or not a list.
pub fn results(map: &Map<String, Value>) -> &[Value] {
    map.get("results")
        .and_then(|r| r.as_array())
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
