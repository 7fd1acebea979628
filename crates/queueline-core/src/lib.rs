//! Shared domain types for the queueline workspace.
//!
//! This crate owns the roster data model consumed by the resolution and
//! reconciliation engines, the `RosterProvider` capability contract, and the
//! cancellation flag threaded through every batch loop. Engines depend on this
//! crate; nothing here depends on an engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub type PlayerId = String;

/// Full roster snapshot, keyed by the provider's stable player id.
pub type Roster = HashMap<PlayerId, PlayerRecord>;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    Kicker,
    Defense,
    Fullback,
    OffensiveLine,
    DefensiveLine,
    Linebacker,
    DefensiveBack,
    Punter,
    LongSnapper,
    Unknown,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Kicker => "K",
            Position::Defense => "DEF",
            Position::Fullback => "FB",
            Position::OffensiveLine => "OL",
            Position::DefensiveLine => "DL",
            Position::Linebacker => "LB",
            Position::DefensiveBack => "DB",
            Position::Punter => "P",
            Position::LongSnapper => "LS",
            Position::Unknown => "UNK",
        }
    }

    pub fn from_slug(value: &str) -> Self {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "QB" => Position::Quarterback,
            "RB" | "HB" => Position::RunningBack,
            "WR" => Position::WideReceiver,
            "TE" => Position::TightEnd,
            "K" | "PK" => Position::Kicker,
            "DEF" | "DST" | "D/ST" => Position::Defense,
            "FB" => Position::Fullback,
            "OL" | "OT" | "OG" | "C" | "G" | "T" => Position::OffensiveLine,
            "DL" | "DE" | "DT" | "NT" => Position::DefensiveLine,
            "LB" | "ILB" | "OLB" | "MLB" => Position::Linebacker,
            "DB" | "CB" | "S" | "FS" | "SS" => Position::DefensiveBack,
            "P" => Position::Punter,
            "LS" => Position::LongSnapper,
            _ => Position::Unknown,
        }
    }

    /// Whether the position belongs to the fixed fantasy-relevant set used by
    /// the resolution engine's confidence scoring.
    pub fn is_fantasy_relevant(&self) -> bool {
        matches!(
            self,
            Position::Quarterback
                | Position::RunningBack
                | Position::WideReceiver
                | Position::TightEnd
                | Position::Kicker
                | Position::Defense
        )
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::Unknown
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Active,
    Inactive,
    InjuredReserve,
    PracticeSquad,
    #[default]
    Unknown,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerStatus::Active => "active",
            PlayerStatus::Inactive => "inactive",
            PlayerStatus::InjuredReserve => "injured_reserve",
            PlayerStatus::PracticeSquad => "practice_squad",
            PlayerStatus::Unknown => "unknown",
        }
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            PlayerStatus::Active => "Active",
            PlayerStatus::Inactive => "Inactive",
            PlayerStatus::InjuredReserve => "Injured Reserve",
            PlayerStatus::PracticeSquad => "Practice Squad",
            PlayerStatus::Unknown => "Unknown",
        }
    }

    pub fn from_slug(value: &str) -> Self {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" | "act" => PlayerStatus::Active,
            "inactive" | "ina" | "cut" | "released" => PlayerStatus::Inactive,
            "injured reserve" | "injured_reserve" | "ir" | "pup" => PlayerStatus::InjuredReserve,
            "practice squad" | "practice_squad" | "ps" => PlayerStatus::PracticeSquad,
            _ => PlayerStatus::Unknown,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, PlayerStatus::Active)
    }
}

/// One roster entry. Immutable once fetched; the engines only read it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub status: PlayerStatus,
}

impl PlayerRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            first_name: None,
            last_name: None,
            position: Position::Unknown,
            team: None,
            status: PlayerStatus::Unknown,
        }
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn with_status(mut self, status: PlayerStatus) -> Self {
        self.status = status;
        self
    }

    /// Derived "First Last" name; `None` unless both parts are present and
    /// non-blank. Records without a full name are skipped by the resolution
    /// engine rather than matched on a fragment.
    pub fn full_name(&self) -> Option<String> {
        let first = self.first_name.as_deref().map(str::trim).unwrap_or("");
        let last = self.last_name.as_deref().map(str::trim).unwrap_or("");
        if first.is_empty() || last.is_empty() {
            return None;
        }
        Some(format!("{} {}", first, last))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RosterError {
    #[error("roster fetch failed: {0}")]
    Fetch(String),
    #[error("roster payload invalid: {0}")]
    Parse(String),
    #[error("roster unavailable: {0}")]
    Unavailable(String),
}

/// Capability contract for the roster data source. Implementations own their
/// caching, expiry, and rate limiting; callers only see the full mapping or a
/// typed failure.
#[async_trait::async_trait]
pub trait RosterProvider: Send + Sync {
    async fn all_players(&self, force_refresh: bool) -> Result<Roster, RosterError>;
}

/// Cooperative cancellation flag shared between a caller and the batch loops.
///
/// Checked at the top of each per-item iteration; a triggered action always
/// finishes its settle wait before the loop yields, so no item is left
/// half-applied.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
