use crate::config::{Settings, REDACTED};
use crate::media::MediaKind;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

pub const API_KEY_PARAM: &str = "api_key";
pub const LANGUAGE_PARAM: &str = "language";

pub type Params = BTreeMap<String, String>;
pub type JsonMap = Map<String, Value>;

pub fn params<const N: usize>(pairs: [(&str, String); N]) -> Params {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Single access point to TMDB.
///
/// `fetch` never fails: any transport error, non-200 status or non-object body comes back as
/// an empty map, so callers can always read `results` and treat absence as "no matches".
/// The remaining operations only bind endpoint and parameters.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    /// False when no API key was configured; callers check this before doing any lookup.
    fn has_credential(&self) -> bool;

    async fn fetch(&self, endpoint: &str, params: Params) -> JsonMap;

    async fn search(&self, kind: MediaKind, title: &str) -> JsonMap {
        let endpoint = format!("/search/{}", kind.path());
        self.fetch(&endpoint, params([("query", title.to_string())]))
            .await
    }

    async fn details(&self, kind: MediaKind, id: i64) -> JsonMap {
        let endpoint = format!("/{}/{id}", kind.path());
        self.fetch(&endpoint, Params::new()).await
    }

    async fn now_playing(&self) -> JsonMap {
        self.fetch("/movie/now_playing", Params::new()).await
    }

    async fn on_the_air(&self) -> JsonMap {
        self.fetch("/tv/on_the_air", Params::new()).await
    }

    async fn popular(&self, kind: MediaKind) -> JsonMap {
        let endpoint = format!("/{}/popular", kind.path());
        self.fetch(&endpoint, Params::new()).await
    }

    async fn reviews(&self, kind: MediaKind, id: i64) -> JsonMap {
        let endpoint = format!("/{}/{id}/reviews", kind.path());
        self.fetch(&endpoint, params([("page", "1".to_string())]))
            .await
    }

    async fn watch_providers(&self, kind: MediaKind, id: i64) -> JsonMap {
        let endpoint = format!("/{}/{id}/watch/providers", kind.path());
        self.fetch(&endpoint, Params::new()).await
    }

    async fn discover_by_genre(&self, kind: MediaKind, genre_id: u32) -> JsonMap {
        let endpoint = format!("/discover/{}", kind.path());
        self.fetch(&endpoint, params([("with_genres", genre_id.to_string())]))
            .await
    }
}

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    language: String,
}

impl fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbClient")
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl TmdbClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let user_agent = format!("cinechat/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
            language: settings.language.clone(),
        })
    }

    async fn get_json(&self, url: &str, query: &Params) -> Result<JsonMap> {
        let res = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("request failed")?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("reading body failed")?;
        if status != StatusCode::OK {
            return Err(anyhow!("HTTP {}: {}", status, text));
        }
        match serde_json::from_str::<Value>(&text).context("JSON parse failed")? {
            Value::Object(map) => Ok(map),
            other => Err(anyhow!("expected a JSON object, got {}", kind_of(&other))),
        }
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, endpoint: &str, mut params: Params) -> JsonMap {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!(endpoint, "TMDB_API_KEY not configured, skipping request");
            return JsonMap::new();
        };
        if params.remove(API_KEY_PARAM).is_some() {
            warn!(endpoint, "Caller supplied its own api_key parameter, ignoring it");
        }
        params.insert(API_KEY_PARAM.to_string(), api_key.to_string());
        params
            .entry(LANGUAGE_PARAM.to_string())
            .or_insert_with(|| self.language.clone());

        let url = format!("{}{}", self.base_url, endpoint);
        debug!(endpoint, "TMDB request");
        match self.get_json(&url, &params).await {
            Ok(map) => map,
            Err(e) => {
                warn!(endpoint, "TMDB request failed, treating as empty result: {:#}", e);
                JsonMap::new()
            }
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
