//! Dialogue actions: each handler reads slots, queries TMDB and emits messages.
use crate::compose::{self, TriState};
use crate::genres::resolve_genre;
use crate::media::{self, Entity, MediaKind, Review, WatchProviders};
use crate::tmdb::{JsonMap, TmdbApi};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub const GENRE_SLOT: &str = "genere";
pub const WANT_YEAR_SLOT: &str = "richiesta_anno";
pub const WANT_GENRE_SLOT: &str = "richiesta_genere";

pub const MISSING_API_KEY: &str = "Manca la chiave API. Non posso recuperare le informazioni richieste.";
pub const MISSING_GENRE: &str = "Non ho capito il genere che cerchi.";

/// Conversation state as sent by the dialogue engine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tracker {
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub slots: Map<String, Value>,
}

impl Tracker {
    pub fn with_slots(slots: Map<String, Value>) -> Self {
        Self {
            sender_id: None,
            slots,
        }
    }

    pub fn get_slot(&self, name: &str) -> Option<&Value> {
        self.slots.get(name).filter(|v| !v.is_null())
    }

    /// Slot text, trimmed; `None` when unset or blank.
    pub fn slot_text(&self, name: &str) -> Option<String> {
        let text = match self.get_slot(name)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BotMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Collects the messages an action emits during one run.
#[derive(Debug, Default)]
pub struct Dispatcher {
    messages: Vec<BotMessage>,
}

impl Dispatcher {
    pub fn utter_text(&mut self, text: impl Into<String>) {
        self.messages.push(BotMessage {
            text: Some(text.into()),
            image: None,
        });
    }

    pub fn utter_image(&mut self, url: impl Into<String>) {
        self.messages.push(BotMessage {
            text: None,
            image: Some(url.into()),
        });
    }

    pub fn messages(&self) -> &[BotMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<BotMessage> {
        self.messages
    }
}

/// State mutation handed back to the dialogue engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum Event {
    #[serde(rename = "slot")]
    SlotSet { name: String, value: Value },
}

impl Event {
    pub fn reset_slot(name: &str) -> Self {
        Event::SlotSet {
            name: name.to_string(),
            value: Value::Null,
        }
    }
}

#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        tmdb: &dyn TmdbApi,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Vec<Event>;
}

/// Entity details composed from the year/genre slots.
pub struct DetailsAction {
    pub kind: MediaKind,
}

/// Current releases: movies now playing, series on the air.
pub struct LatestAction {
    pub kind: MediaKind,
}

pub struct PopularAction {
    pub kind: MediaKind,
}

pub struct GenreAction {
    pub kind: MediaKind,
}

pub struct ReviewsAction {
    pub kind: MediaKind,
}

pub struct WatchProvidersAction {
    pub kind: MediaKind,
    pub region: String,
}

pub struct PosterAction {
    pub kind: MediaKind,
}

#[async_trait]
impl Action for DetailsAction {
    fn name(&self) -> &'static str {
        match self.kind {
            MediaKind::Movie => "action_movie_details",
            MediaKind::Series => "action_series_details",
        }
    }

    async fn run(
        &self,
        tmdb: &dyn TmdbApi,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Vec<Event> {
        let Some(entity) = lookup_details(self.kind, tmdb, dispatcher, tracker).await else {
            return Vec::new();
        };
        let want_year = TriState::from_slot(tracker.get_slot(WANT_YEAR_SLOT));
        let want_genre = TriState::from_slot(tracker.get_slot(WANT_GENRE_SLOT));
        debug!(?want_year, ?want_genre, "Composing details");
        dispatcher.utter_text(compose::compose_entity(&entity, want_year, want_genre));
        vec![
            Event::reset_slot(WANT_YEAR_SLOT),
            Event::reset_slot(WANT_GENRE_SLOT),
        ]
    }
}

#[async_trait]
impl Action for LatestAction {
    fn name(&self) -> &'static str {
        match self.kind {
            MediaKind::Movie => "action_recent_releases",
            MediaKind::Series => "action_series_on_the_air",
        }
    }

    async fn run(
        &self,
        tmdb: &dyn TmdbApi,
        dispatcher: &mut Dispatcher,
        _tracker: &Tracker,
    ) -> Vec<Event> {
        if !require_credential(tmdb, dispatcher) {
            return Vec::new();
        }
        let (data, header, empty) = match self.kind {
            MediaKind::Movie => (
                tmdb.now_playing().await,
                "Ecco alcuni film attualmente in sala:",
                "Non ho trovato film recentemente usciti.",
            ),
            MediaKind::Series => (
                tmdb.on_the_air().await,
                "Ecco alcune serie attualmente in onda:",
                "Non ho trovato serie attualmente in onda.",
            ),
        };
        utter_listing(self.kind, &data, header, empty, dispatcher);
        Vec::new()
    }
}

#[async_trait]
impl Action for PopularAction {
    fn name(&self) -> &'static str {
        match self.kind {
            MediaKind::Movie => "popular_movies",
            MediaKind::Series => "popular_series",
        }
    }

    async fn run(
        &self,
        tmdb: &dyn TmdbApi,
        dispatcher: &mut Dispatcher,
        _tracker: &Tracker,
    ) -> Vec<Event> {
        if !require_credential(tmdb, dispatcher) {
            return Vec::new();
        }
        let data = tmdb.popular(self.kind).await;
        let (header, empty) = match self.kind {
            MediaKind::Movie => (
                "Ecco i film più popolari:",
                "Non ho trovato film popolari al momento.",
            ),
            MediaKind::Series => (
                "Ecco le serie più popolari:",
                "Non ho trovato serie popolari al momento.",
            ),
        };
        utter_listing(self.kind, &data, header, empty, dispatcher);
        Vec::new()
    }
}

#[async_trait]
impl Action for GenreAction {
    fn name(&self) -> &'static str {
        match self.kind {
            MediaKind::Movie => "action_search_by_genre",
            MediaKind::Series => "action_series_by_genre",
        }
    }

    async fn run(
        &self,
        tmdb: &dyn TmdbApi,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Vec<Event> {
        let Some(label) = tracker.slot_text(GENRE_SLOT) else {
            dispatcher.utter_text(MISSING_GENRE);
            return Vec::new();
        };
        if !require_credential(tmdb, dispatcher) {
            return Vec::new();
        }
        let Some(genre_id) = resolve_genre(self.kind, &label) else {
            info!(label = %label, "Unknown genre label");
            dispatcher.utter_text(format!(
                "Non conosco il genere {label}, prova con un altro."
            ));
            return Vec::new();
        };
        let data = tmdb.discover_by_genre(self.kind, genre_id).await;
        let header = format!("Ecco alcuni titoli del genere {label}:");
        let empty = format!("Non ho trovato {} del genere {label}.", self.kind.noun());
        utter_listing(self.kind, &data, &header, &empty, dispatcher);
        Vec::new()
    }
}

#[async_trait]
impl Action for ReviewsAction {
    fn name(&self) -> &'static str {
        match self.kind {
            MediaKind::Movie => "movie_reviews",
            MediaKind::Series => "series_reviews",
        }
    }

    async fn run(
        &self,
        tmdb: &dyn TmdbApi,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Vec<Event> {
        let Some((_, id)) = lookup_hit_with_id(self.kind, tmdb, dispatcher, tracker).await
        else {
            return Vec::new();
        };
        let data = tmdb.reviews(self.kind, id).await;
        let reviews: Vec<Review> = media::results(&data)
            .iter()
            .filter_map(|v| match Review::from_json(v) {
                Ok(review) => Some(review),
                Err(e) => {
                    warn!("Skipping malformed review: {:#}", e);
                    None
                }
            })
            .collect();
        for message in compose::render_reviews(&reviews) {
            dispatcher.utter_text(message);
        }
        Vec::new()
    }
}

#[async_trait]
impl Action for WatchProvidersAction {
    fn name(&self) -> &'static str {
        match self.kind {
            MediaKind::Movie => "action_where_to_watch",
            MediaKind::Series => "action_series_where_to_watch",
        }
    }

    async fn run(
        &self,
        tmdb: &dyn TmdbApi,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Vec<Event> {
        let Some((hit, id)) = lookup_hit_with_id(self.kind, tmdb, dispatcher, tracker).await
        else {
            return Vec::new();
        };
        let data = tmdb.watch_providers(self.kind, id).await;
        match WatchProviders::from_response(&data, &self.region) {
            Ok(Some(providers)) if !providers.is_empty() => {
                dispatcher.utter_text(compose::render_watch_providers(hit.title(), &providers));
            }
            Ok(_) => dispatcher.utter_text(format!(
                "Non ho trovato piattaforme che offrono {} in questo momento.",
                hit.title()
            )),
            Err(e) => {
                warn!(id, "Unreadable watch providers: {:#}", e);
                dispatcher.utter_text(unreadable_notice(self.kind));
            }
        }
        Vec::new()
    }
}

#[async_trait]
impl Action for PosterAction {
    fn name(&self) -> &'static str {
        match self.kind {
            MediaKind::Movie => "action_movie_poster",
            MediaKind::Series => "action_series_poster",
        }
    }

    async fn run(
        &self,
        tmdb: &dyn TmdbApi,
        dispatcher: &mut Dispatcher,
        tracker: &Tracker,
    ) -> Vec<Event> {
        let Some(entity) = lookup_details(self.kind, tmdb, dispatcher, tracker).await else {
            return Vec::new();
        };
        match entity.poster_url() {
            Some(url) => {
                dispatcher.utter_text(format!("Ecco la locandina di {}:", entity.title()));
                dispatcher.utter_image(url);
            }
            None => dispatcher.utter_text(format!(
                "Non ho trovato una locandina per {}.",
                entity.title()
            )),
        }
        Vec::new()
    }
}

fn require_credential(tmdb: &dyn TmdbApi, dispatcher: &mut Dispatcher) -> bool {
    if tmdb.has_credential() {
        return true;
    }
    dispatcher.utter_text(MISSING_API_KEY);
    false
}

fn missing_title_notice(kind: MediaKind) -> String {
    format!(
        "Non ho capito il titolo {}, puoi ripetere?",
        match kind {
            MediaKind::Movie => "del film",
            MediaKind::Series => "della serie",
        }
    )
}

fn not_found_notice(kind: MediaKind) -> String {
    format!("Non ho trovato {} con questo titolo.", kind.none_of())
}

fn missing_id_notice(kind: MediaKind) -> String {
    format!(
        "Non sono riuscito a recuperare l'ID {}.",
        match kind {
            MediaKind::Movie => "del film",
            MediaKind::Series => "della serie",
        }
    )
}

fn unreadable_notice(kind: MediaKind) -> String {
    format!(
        "Non sono riuscito a leggere le informazioni su questa {}.",
        match kind {
            MediaKind::Movie => "pellicola",
            MediaKind::Series => "serie",
        }
    )
}

/// Title slot -> credential check -> search -> first hit.
async fn lookup_search_hit(
    kind: MediaKind,
    tmdb: &dyn TmdbApi,
    dispatcher: &mut Dispatcher,
    tracker: &Tracker,
) -> Option<Entity> {
    let Some(title) = tracker.slot_text(kind.title_slot()) else {
        dispatcher.utter_text(missing_title_notice(kind));
        return None;
    };
    if !require_credential(tmdb, dispatcher) {
        return None;
    }
    let data = tmdb.search(kind, &title).await;
    let Some(first) = media::results(&data).first() else {
        info!(title = %title, kind = kind.path(), "No TMDB match");
        dispatcher.utter_text(not_found_notice(kind));
        return None;
    };
    match Entity::from_json(kind, first) {
        Ok(hit) => {
            debug!(title = %title, id = ?hit.id, "Matched search hit");
            Some(hit)
        }
        Err(e) => {
            warn!(title = %title, "Unreadable search hit: {:#}", e);
            dispatcher.utter_text(unreadable_notice(kind));
            None
        }
    }
}

/// Search hit together with its id; reports a missing id to the user.
async fn lookup_hit_with_id(
    kind: MediaKind,
    tmdb: &dyn TmdbApi,
    dispatcher: &mut Dispatcher,
    tracker: &Tracker,
) -> Option<(Entity, i64)> {
    let hit = lookup_search_hit(kind, tmdb, dispatcher, tracker).await?;
    let Some(id) = hit.id else {
        dispatcher.utter_text(missing_id_notice(kind));
        return None;
    };
    Some((hit, id))
}

async fn lookup_details(
    kind: MediaKind,
    tmdb: &dyn TmdbApi,
    dispatcher: &mut Dispatcher,
    tracker: &Tracker,
) -> Option<Entity> {
    let (hit, id) = lookup_hit_with_id(kind, tmdb, dispatcher, tracker).await?;
    let details = tmdb.details(kind, id).await;
    match Entity::from_map(kind, &details) {
        // An empty details map still knows what the search matched.
        Ok(entity) => Some(entity.with_fallback_title(&hit)),
        Err(e) => {
            warn!(id, "Unreadable details: {:#}", e);
            dispatcher.utter_text(unreadable_notice(kind));
            None
        }
    }
}

fn utter_listing(
    kind: MediaKind,
    data: &JsonMap,
    header: &str,
    empty: &str,
    dispatcher: &mut Dispatcher,
) {
    let entities: Vec<Entity> = media::results(data)
        .iter()
        .filter_map(|v| match Entity::from_json(kind, v) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!("Skipping malformed listing entry: {:#}", e);
                None
            }
        })
        .collect();
    if entities.is_empty() {
        dispatcher.utter_text(empty);
        return;
    }
    dispatcher.utter_text(compose::render_listing(header, &entities));
}

/// Name-indexed set of actions served to the dialogue engine.
pub struct ActionRegistry {
    actions: BTreeMap<&'static str, Box<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            actions: BTreeMap::new(),
        }
    }

    /// Every handler for both media kinds.
    pub fn standard(region: &str) -> Self {
        let mut registry = Self::new();
        for kind in [MediaKind::Movie, MediaKind::Series] {
            registry.register(DetailsAction { kind });
            registry.register(LatestAction { kind });
            registry.register(PopularAction { kind });
            registry.register(GenreAction { kind });
            registry.register(ReviewsAction { kind });
            registry.register(WatchProvidersAction {
                kind,
                region: region.to_string(),
            });
            registry.register(PosterAction { kind });
        }
        registry
    }

    pub fn register(&mut self, action: impl Action + 'static) {
        self.actions.insert(action.name(), Box::new(action));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Action> {
        self.actions.get(name).map(|a| a.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.actions.keys().copied()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one action and returns the slot events together with the emitted messages.
pub async fn run_action(
    action: &dyn Action,
    tmdb: &dyn TmdbApi,
    tracker: &Tracker,
) -> (Vec<Event>, Vec<BotMessage>) {
    let mut dispatcher = Dispatcher::default();
    let events = action.run(tmdb, &mut dispatcher, tracker).await;
    info!(
        action = action.name(),
        sender = tracker.sender_id.as_deref().unwrap_or("-"),
        messages = dispatcher.messages().len(),
        events = events.len(),
        "Action completed"
    );
    (events, dispatcher.into_messages())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tmdb::Params;
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers by endpoint and records every call.
    struct ScriptedTmdb {
        credential: bool,
        responses: Vec<(&'static str, Value)>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTmdb {
        fn new(responses: Vec<(&'static str, Value)>) -> Self {
            Self {
                credential: true,
                responses,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TmdbApi for ScriptedTmdb {
        fn has_credential(&self) -> bool {
            self.credential
        }

        async fn fetch(&self, endpoint: &str, _params: Params) -> JsonMap {
            self.calls.lock().unwrap().push(endpoint.to_string());
            self.responses
                .iter()
                .find(|(e, _)| *e == endpoint)
                .and_then(|(_, v)| v.as_object().cloned())
                .unwrap_or_default()
        }
    }

    fn tracker(slots: Value) -> Tracker {
        Tracker::with_slots(slots.as_object().cloned().unwrap_or_default())
    }

    fn texts(dispatcher: &Dispatcher) -> Vec<String> {
        dispatcher
            .messages()
            .iter()
            .filter_map(|m| m.text.clone())
            .collect()
    }

    fn matrix_fixture() -> Vec<(&'static str, Value)> {
        vec![
            (
                "/search/movie",
                json!({"results": [{"id": 603, "title": "Matrix"}]}),
            ),
            (
                "/movie/603",
                json!({
                    "id": 603,
                    "title": "Matrix",
                    "overview": "Un hacker scopre la verità.",
                    "release_date": "1999-03-31",
                    "genres": [{"id": 28, "name": "Azione"}, {"id": 878, "name": "Fantascienza"}],
                    "poster_path": "/matrix.jpg"
                }),
            ),
        ]
    }

    #[tokio::test]
    async fn details_compose_requested_fields_and_reset_slots() {
        let tmdb = ScriptedTmdb::new(matrix_fixture());
        let mut dispatcher = Dispatcher::default();
        let events = DetailsAction {
            kind: MediaKind::Movie,
        }
        .run(
            &tmdb,
            &mut dispatcher,
            &tracker(json!({"titolo_film": "Matrix", "richiesta_anno": true, "richiesta_genere": "no"})),
        )
        .await;

        let texts = texts(&dispatcher);
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("Anno di uscita: 1999"));
        assert!(!texts[0].contains("Genere"));
        assert_eq!(
            events,
            vec![
                Event::reset_slot(WANT_YEAR_SLOT),
                Event::reset_slot(WANT_GENRE_SLOT)
            ]
        );
        assert_eq!(tmdb.calls(), vec!["/search/movie", "/movie/603"]);
    }

    #[tokio::test]
    async fn missing_title_short_circuits_without_calls() {
        let tmdb = ScriptedTmdb::new(Vec::new());
        let mut dispatcher = Dispatcher::default();
        DetailsAction {
            kind: MediaKind::Series,
        }
        .run(&tmdb, &mut dispatcher, &tracker(json!({"titolo_serie": "  "})))
        .await;
        assert_eq!(
            texts(&dispatcher),
            vec!["Non ho capito il titolo della serie, puoi ripetere?"]
        );
        assert!(tmdb.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_credential_short_circuits_every_action() {
        let mut tmdb = ScriptedTmdb::new(matrix_fixture());
        tmdb.credential = false;
        let registry = ActionRegistry::standard("IT");
        let slots = tracker(json!({
            "titolo_film": "Matrix",
            "titolo_serie": "Dark",
            "genere": "azione"
        }));
        for name in registry.names() {
            let action = registry.get(name).unwrap();
            let (_, messages) = run_action(action, &tmdb, &slots).await;
            assert_eq!(messages.len(), 1, "{name}");
            assert_eq!(messages[0].text.as_deref(), Some(MISSING_API_KEY), "{name}");
        }
        assert!(tmdb.calls().is_empty());
    }

    #[tokio::test]
    async fn search_miss_stops_before_detail_calls() {
        let tmdb = ScriptedTmdb::new(vec![("/search/movie", json!({"results": []}))]);
        for action in [
            Box::new(DetailsAction {
                kind: MediaKind::Movie,
            }) as Box<dyn Action>,
            Box::new(ReviewsAction {
                kind: MediaKind::Movie,
            }) as Box<dyn Action>,
        ] {
            let mut dispatcher = Dispatcher::default();
            action
                .run(&tmdb, &mut dispatcher, &tracker(json!({"titolo_film": "Zzz"})))
                .await;
            assert_eq!(
                texts(&dispatcher),
                vec!["Non ho trovato nessun film con questo titolo."]
            );
        }
        assert_eq!(tmdb.calls(), vec!["/search/movie", "/search/movie"]);
    }

    #[tokio::test]
    async fn search_hit_without_id_is_reported() {
        let tmdb = ScriptedTmdb::new(vec![(
            "/search/tv",
            json!({"results": [{"name": "Senza ID"}]}),
        )]);
        let mut dispatcher = Dispatcher::default();
        PosterAction {
            kind: MediaKind::Series,
        }
        .run(&tmdb, &mut dispatcher, &tracker(json!({"titolo_serie": "Senza ID"})))
        .await;
        assert_eq!(
            texts(&dispatcher),
            vec!["Non sono riuscito a recuperare l'ID della serie."]
        );
        assert_eq!(tmdb.calls(), vec!["/search/tv"]);
    }

    #[tokio::test]
    async fn unknown_genre_names_the_label() {
        let tmdb = ScriptedTmdb::new(Vec::new());
        let mut dispatcher = Dispatcher::default();
        GenreAction {
            kind: MediaKind::Movie,
        }
        .run(&tmdb, &mut dispatcher, &tracker(json!({"genere": "Telenovela"})))
        .await;
        assert_eq!(
            texts(&dispatcher),
            vec!["Non conosco il genere Telenovela, prova con un altro."]
        );
        assert!(tmdb.calls().is_empty());
    }

    #[tokio::test]
    async fn series_genre_uses_series_table() {
        let tmdb = ScriptedTmdb::new(vec![(
            "/discover/tv",
            json!({"results": [{"id": 1, "name": "The Mandalorian", "overview": "Un cacciatore di taglie."}]}),
        )]);
        let mut dispatcher = Dispatcher::default();
        GenreAction {
            kind: MediaKind::Series,
        }
        .run(&tmdb, &mut dispatcher, &tracker(json!({"genere": "Azione"})))
        .await;
        let texts = texts(&dispatcher);
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("Ecco alcuni titoli del genere Azione:"));
        assert!(texts[0].contains("1. The Mandalorian"));
    }

    #[tokio::test]
    async fn reviews_render_five_of_seven() {
        let reviews: Vec<Value> = (1..=7)
            .map(|i| json!({"author": format!("utente{i}"), "content": "Bello."}))
            .collect();
        let mut fixture = matrix_fixture();
        fixture.push(("/movie/603/reviews", json!({ "results": reviews })));
        let tmdb = ScriptedTmdb::new(fixture);
        let mut dispatcher = Dispatcher::default();
        ReviewsAction {
            kind: MediaKind::Movie,
        }
        .run(&tmdb, &mut dispatcher, &tracker(json!({"titolo_film": "Matrix"})))
        .await;
        let texts = texts(&dispatcher);
        assert_eq!(texts.len(), 5);
        assert!(texts[0].starts_with("Autore: utente1"));
        assert!(texts[4].starts_with("Autore: utente5"));
        assert_eq!(tmdb.calls(), vec!["/search/movie", "/movie/603/reviews"]);
    }

    #[tokio::test]
    async fn no_reviews_single_notice() {
        let tmdb = ScriptedTmdb::new(matrix_fixture());
        let mut dispatcher = Dispatcher::default();
        ReviewsAction {
            kind: MediaKind::Movie,
        }
        .run(&tmdb, &mut dispatcher, &tracker(json!({"titolo_film": "Matrix"})))
        .await;
        assert_eq!(texts(&dispatcher), vec![compose::NO_REVIEWS]);
    }

    #[tokio::test]
    async fn malformed_listing_entries_are_skipped() {
        let tmdb = ScriptedTmdb::new(vec![(
            "/discover/movie",
            json!({"results": [
                {"id": 1, "title": "Die Hard", "overview": "Un poliziotto."},
                {"id": 2, "title": 42},
                {"id": 3, "title": "Speed", "overview": "Un autobus."}
            ]}),
        )]);
        let mut dispatcher = Dispatcher::default();
        GenreAction {
            kind: MediaKind::Movie,
        }
        .run(&tmdb, &mut dispatcher, &tracker(json!({"genere": "azione"})))
        .await;
        let texts = texts(&dispatcher);
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("1. Die Hard"));
        assert!(texts[0].contains("2. Speed"));
        assert!(!texts[0].contains("42"));
    }

    #[tokio::test]
    async fn wrongly_shaped_details_report_unreadable() {
        let tmdb = ScriptedTmdb::new(vec![
            (
                "/search/movie",
                json!({"results": [{"id": 603, "title": "Matrix"}]}),
            ),
            ("/movie/603", json!({"id": 603, "title": 42})),
        ]);
        let mut dispatcher = Dispatcher::default();
        let events = DetailsAction {
            kind: MediaKind::Movie,
        }
        .run(&tmdb, &mut dispatcher, &tracker(json!({"titolo_film": "Matrix"})))
        .await;
        assert_eq!(texts(&dispatcher), vec![unreadable_notice(MediaKind::Movie)]);
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn empty_details_keep_the_search_title() {
        let tmdb = ScriptedTmdb::new(vec![(
            "/search/movie",
            json!({"results": [{"id": 603, "title": "Matrix"}]}),
        )]);

        let mut dispatcher = Dispatcher::default();
        DetailsAction {
            kind: MediaKind::Movie,
        }
        .run(&tmdb, &mut dispatcher, &tracker(json!({"titolo_film": "Matrix"})))
        .await;
        let details = texts(&dispatcher);
        assert!(details[0].starts_with("Ecco i dettagli su Matrix:"));

        let mut dispatcher = Dispatcher::default();
        PosterAction {
            kind: MediaKind::Movie,
        }
        .run(&tmdb, &mut dispatcher, &tracker(json!({"titolo_film": "Matrix"})))
        .await;
        assert_eq!(
            texts(&dispatcher),
            vec!["Non ho trovato una locandina per Matrix."]
        );
        assert_eq!(
            tmdb.calls(),
            vec!["/search/movie", "/movie/603", "/search/movie", "/movie/603"]
        );
    }

    #[tokio::test]
    async fn poster_emits_image() {
        let tmdb = ScriptedTmdb::new(matrix_fixture());
        let mut dispatcher = Dispatcher::default();
        PosterAction {
            kind: MediaKind::Movie,
        }
        .run(&tmdb, &mut dispatcher, &tracker(json!({"titolo_film": "Matrix"})))
        .await;
        let messages = dispatcher.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[1].image.as_deref(),
            Some("https://image.tmdb.org/t/p/original/matrix.jpg")
        );
    }

    #[tokio::test]
    async fn where_to_watch_reads_region() {
        let mut fixture = matrix_fixture();
        fixture.push((
            "/movie/603/watch/providers",
            json!({"results": {"IT": {"flatrate": [{"provider_name": "Netflix"}]}}}),
        ));
        let tmdb = ScriptedTmdb::new(fixture);

        let mut dispatcher = Dispatcher::default();
        WatchProvidersAction {
            kind: MediaKind::Movie,
            region: "IT".to_string(),
        }
        .run(&tmdb, &mut dispatcher, &tracker(json!({"titolo_film": "Matrix"})))
        .await;
        assert_eq!(
            texts(&dispatcher),
            vec!["Ecco dove puoi guardare Matrix:\nIn streaming: Netflix"]
        );

        let mut dispatcher = Dispatcher::default();
        WatchProvidersAction {
            kind: MediaKind::Movie,
            region: "US".to_string(),
        }
        .run(&tmdb, &mut dispatcher, &tracker(json!({"titolo_film": "Matrix"})))
        .await;
        assert_eq!(
            texts(&dispatcher),
            vec!["Non ho trovato piattaforme che offrono Matrix in questo momento."]
        );
    }

    #[tokio::test]
    async fn empty_listing_emits_single_notice() {
        let tmdb = ScriptedTmdb::new(Vec::new());
        let mut dispatcher = Dispatcher::default();
        LatestAction {
            kind: MediaKind::Series,
        }
        .run(&tmdb, &mut dispatcher, &Tracker::default())
        .await;
        assert_eq!(
            texts(&dispatcher),
            vec!["Non ho trovato serie attualmente in onda."]
        );
        assert_eq!(tmdb.calls(), vec!["/tv/on_the_air"]);
    }

    #[test]
    fn registry_holds_both_kinds() {
        let registry = ActionRegistry::standard("IT");
        assert_eq!(registry.names().count(), 14);
        assert!(registry.get("action_movie_details").is_some());
        assert!(registry.get("action_series_poster").is_some());
        assert!(registry.get("action_unknown").is_none());
    }

    #[test]
    fn events_serialize_as_slot_events() {
        let value = serde_json::to_value(Event::reset_slot(WANT_YEAR_SLOT)).unwrap();
        assert_eq!(
            value,
            json!({"event": "slot", "name": "richiesta_anno", "value": null})
        );
    }
}
