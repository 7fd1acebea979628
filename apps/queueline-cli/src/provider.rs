//! HTTP roster provider with a disk cache and a courtesy rate limit.
//!
//! Fetches a Sleeper-style `players` payload: one JSON object mapping player
//! id to a record carrying name, position, team, and status strings. A fresh
//! cache is served without touching the network; a failed fetch falls back to
//! any cache, however stale, before surfacing a typed failure.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use queueline_core::{PlayerRecord, PlayerStatus, Position, Roster, RosterError, RosterProvider};

use crate::config::RosterSection;

#[derive(Clone, Debug, Deserialize, Serialize)]
struct RawPlayer {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    team: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize, Serialize)]
struct CacheEnvelope {
    fetched_at: DateTime<Utc>,
    players: HashMap<String, RawPlayer>,
}

fn to_record(id: &str, raw: &RawPlayer) -> PlayerRecord {
    PlayerRecord {
        id: id.to_string(),
        first_name: raw.first_name.clone().filter(|s| !s.trim().is_empty()),
        last_name: raw.last_name.clone().filter(|s| !s.trim().is_empty()),
        position: raw
            .position
            .as_deref()
            .map(Position::from_slug)
            .unwrap_or_default(),
        team: raw.team.clone().filter(|s| !s.trim().is_empty()),
        status: raw
            .status
            .as_deref()
            .map(PlayerStatus::from_slug)
            .unwrap_or_default(),
    }
}

pub struct HttpRosterProvider {
    client: reqwest::Client,
    url: String,
    cache_path: PathBuf,
    cache_ttl: Duration,
    min_fetch_interval: Duration,
    last_fetch: Mutex<Option<Instant>>,
}

impl HttpRosterProvider {
    pub fn new(section: &RosterSection) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: section.url.clone(),
            cache_path: section.cache_path.clone(),
            cache_ttl: Duration::from_secs(section.cache_ttl_hours * 3600),
            min_fetch_interval: Duration::from_secs(section.min_fetch_interval_secs),
            last_fetch: Mutex::new(None),
        }
    }

    fn read_cache(&self) -> Option<CacheEnvelope> {
        let content = std::fs::read_to_string(&self.cache_path).ok()?;
        match serde_json::from_str(&content) {
            Ok(envelope) => Some(envelope),
            Err(err) => {
                tracing::warn!(path = %self.cache_path.display(), error = %err, "roster cache unreadable");
                None
            }
        }
    }

    fn cache_is_fresh(&self, envelope: &CacheEnvelope) -> bool {
        let age = Utc::now() - envelope.fetched_at;
        age.num_seconds() >= 0 && (age.num_seconds() as u64) < self.cache_ttl.as_secs()
    }

    fn write_cache(&self, envelope: &CacheEnvelope) {
        let serialized = match serde_json::to_string(envelope) {
            Ok(s) => s,
            Err(err) => {
                tracing::warn!(error = %err, "roster cache serialization failed");
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.cache_path, serialized) {
            tracing::warn!(path = %self.cache_path.display(), error = %err, "roster cache write failed");
        }
    }

    async fn fetch_remote(&self) -> Result<HashMap<String, RawPlayer>, RosterError> {
        // Courtesy rate limit: sleep out the remainder of the interval since
        // the last network fetch.
        {
            let mut last = self.last_fetch.lock().await;
            if let Some(at) = *last {
                let since = at.elapsed();
                if since < self.min_fetch_interval {
                    let wait = self.min_fetch_interval - since;
                    tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limit pause");
                    tokio::time::sleep(wait).await;
                }
            }
            *last = Some(Instant::now());
        }
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RosterError::Fetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| RosterError::Fetch(e.to_string()))?;
        response
            .json::<HashMap<String, RawPlayer>>()
            .await
            .map_err(|e| RosterError::Parse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl RosterProvider for HttpRosterProvider {
    async fn all_players(&self, force_refresh: bool) -> Result<Roster, RosterError> {
        let cached = self.read_cache();
        if !force_refresh {
            if let Some(envelope) = &cached {
                if self.cache_is_fresh(envelope) {
                    tracing::debug!(players = envelope.players.len(), "serving fresh roster cache");
                    return Ok(envelope
                        .players
                        .iter()
                        .map(|(id, raw)| (id.clone(), to_record(id, raw)))
                        .collect());
                }
            }
        }
        match self.fetch_remote().await {
            Ok(players) => {
                let envelope = CacheEnvelope {
                    fetched_at: Utc::now(),
                    players,
                };
                self.write_cache(&envelope);
                tracing::info!(players = envelope.players.len(), "roster fetched");
                Ok(envelope
                    .players
                    .iter()
                    .map(|(id, raw)| (id.clone(), to_record(id, raw)))
                    .collect())
            }
            Err(err) => {
                // Stale cache beats no roster at all.
                if let Some(envelope) = cached {
                    tracing::warn!(error = %err, "roster fetch failed, serving stale cache");
                    return Ok(envelope
                        .players
                        .iter()
                        .map(|(id, raw)| (id.clone(), to_record(id, raw)))
                        .collect());
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_records_convert_with_lenient_slugs() {
        let raw = RawPlayer {
            first_name: Some("Josh".into()),
            last_name: Some("Allen".into()),
            position: Some("QB".into()),
            team: Some("BUF".into()),
            status: Some("Active".into()),
        };
        let rec = to_record("6744", &raw);
        assert_eq!(rec.full_name().as_deref(), Some("Josh Allen"));
        assert_eq!(rec.position, Position::Quarterback);
        assert_eq!(rec.status, PlayerStatus::Active);
    }

    #[test]
    fn blank_fields_become_none() {
        let raw = RawPlayer {
            first_name: Some("".into()),
            last_name: Some("Allen".into()),
            position: None,
            team: Some("  ".into()),
            status: None,
        };
        let rec = to_record("1", &raw);
        assert_eq!(rec.first_name, None);
        assert_eq!(rec.team, None);
        assert_eq!(rec.full_name(), None);
        assert_eq!(rec.status, PlayerStatus::Unknown);
    }
}
