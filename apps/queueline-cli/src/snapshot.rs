//! Recorded surface snapshots for dry-run reconciliation.
//!
//! A snapshot is a JSON file with the visible row texts captured from the
//! live surface: the addable pool and the current queue. Loading one seeds
//! the scripted surface so `plan` can rehearse a run without touching
//! anything real.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use queueline_mock_surface::{MockRow, MockSurface};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SurfaceSnapshot {
    /// Row texts of addable players, in rendered order.
    #[serde(default)]
    pub pool: Vec<String>,
    /// Row texts of currently queued entries.
    #[serde(default)]
    pub queued: Vec<String>,
    /// How many unfiltered pool rows the surface renders at once; rows past
    /// the window are only reachable through the filter.
    #[serde(default)]
    pub rendered_window: Option<usize>,
}

pub fn load_snapshot(path: &Path) -> Result<SurfaceSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let snapshot: SurfaceSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    Ok(snapshot)
}

/// Seed a scripted surface from a snapshot. Row keys are positional; the
/// engine only ever sees the rendered text.
pub fn surface_from_snapshot(snapshot: &SurfaceSnapshot) -> MockSurface {
    let pool = snapshot
        .pool
        .iter()
        .enumerate()
        .map(|(i, text)| MockRow::new(format!("pool-{}", i), text.clone()))
        .collect();
    let queued = snapshot
        .queued
        .iter()
        .enumerate()
        .map(|(i, text)| MockRow::new(format!("queued-{}", i), text.clone()))
        .collect();
    let mut surface = MockSurface::new().with_pool(pool).with_queued(queued);
    if let Some(window) = snapshot.rendered_window {
        surface = surface.with_window(window);
    }
    surface
}
