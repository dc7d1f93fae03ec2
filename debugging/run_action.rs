//! Run a single action against the live TMDB API and print what the bot would say.
//! Usage:
//!   cargo run --bin run_action -- <action_name> [slot=value ...]
//!   cargo run --bin run_action -- action_movie_details titolo_film=Matrix richiesta_anno=true
//!   cargo run --bin run_action -- --list
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{anyhow, Result};
use cinechat::actions::{run_action, ActionRegistry, Tracker};
use cinechat::config::Settings;
use cinechat::tmdb::TmdbClient;
use dotenvy::dotenv;
use serde_json::{Map, Value};
use std::env;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_slot(arg: &str) -> Result<(String, Value)> {
    let (name, raw) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("slot must look like name=value, got '{}'", arg))?;
    let value = match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        other => Value::String(other.to_string()),
    };
    Ok((name.to_string(), value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    init_tracing();

    let settings = Settings::from_env()?;
    let registry = ActionRegistry::standard(&settings.region());

    let mut args = env::args().skip(1);
    let action_name = args
        .next()
        .ok_or_else(|| anyhow!("usage: run_action <action_name> [slot=value ...]"))?;
    if action_name == "--list" {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }
    let action = registry
        .get(&action_name)
        .ok_or_else(|| anyhow!("unknown action '{}' (try --list)", action_name))?;

    let mut slots = Map::new();
    for arg in args {
        let (name, value) = parse_slot(&arg)?;
        slots.insert(name, value);
    }

    let tmdb = TmdbClient::new(&settings)?;
    let (events, messages) = run_action(action, &tmdb, &Tracker::with_slots(slots)).await;
    for message in messages {
        if let Some(text) = message.text {
            println!("{text}\n");
        }
        if let Some(image) = message.image {
            println!("[image] {image}\n");
        }
    }
    if !events.is_empty() {
        println!("events: {}", serde_json::to_string_pretty(&events)?);
    }
    Ok(())
}
