//! Capability contract between the reconciliation engine and the live surface.
//!
//! The surface is externally owned and re-renders on its own schedule; the
//! engine can only discover interactive elements, read text, trigger, and
//! drive a shared filter input. This crate defines that contract so the
//! surface-specific heuristics (selector walking, event dispatch) stay inside
//! an adapter implementation and the engine stays testable against a scripted
//! one.

use serde::{Deserialize, Serialize};

/// Opaque reference to a discovered interactive element. Valid only until the
/// next surface mutation; callers must re-validate liveness with
/// [`SurfaceAdapter::is_attached`] before acting on a previously observed
/// handle.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Role marker used for discovery. The surface exposes no stable identifiers,
/// so discovery is by role plus (optionally) visible label.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ElementRole {
    AddTrigger,
    RemoveTrigger,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscoveryQuery {
    pub role: ElementRole,
    /// Exact visible label, compared case-insensitively by the adapter.
    /// `None` discovers every element with the role.
    pub label: Option<String>,
}

impl DiscoveryQuery {
    pub fn role(role: ElementRole) -> Self {
        Self { role, label: None }
    }

    pub fn labeled(role: ElementRole, label: impl Into<String>) -> Self {
        Self {
            role,
            label: Some(label.into()),
        }
    }
}

/// How the filter input is driven.
///
/// `NativeEvent` dispatches the standard input-changed signal and is always
/// attempted first. `Instrumented` asks the adapter to invoke the hosting
/// framework's own change callback directly, for frameworks that ignore
/// direct value assignment; it is a best-effort capability an adapter may not
/// have.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FilterStrategy {
    NativeEvent,
    Instrumented,
}

#[derive(thiserror::Error, Debug)]
pub enum SurfaceError {
    #[error("element no longer attached: {0}")]
    Detached(ElementHandle),
    #[error("element not visible: {0}")]
    Hidden(ElementHandle),
    #[error("no filter input discoverable on the surface")]
    NoFilterInput,
    #[error("surface interaction failed: {0}")]
    Interaction(String),
}

/// The minimal capability set the reconciliation engine needs from the live
/// surface. Every method observes or mutates externally owned state that can
/// change between any two calls.
#[async_trait::async_trait]
pub trait SurfaceAdapter: Send + Sync {
    /// Discover currently rendered elements matching the query. Elements that
    /// exist but are not rendered (virtualized away, filtered out) are not
    /// returned; narrowing the filter is the only way to reach them.
    async fn discover(&self, query: &DiscoveryQuery) -> Result<Vec<ElementHandle>, SurfaceError>;

    /// Visible text directly under the element.
    async fn text_of(&self, element: &ElementHandle) -> Result<String, SurfaceError>;

    /// Visible text of the nearest enclosing queue row. The container walk is
    /// surface-specific, so it lives behind the adapter rather than in the
    /// engine.
    async fn entry_text_of(&self, element: &ElementHandle) -> Result<String, SurfaceError>;

    /// Activate the element. Fails if the element detached or hid between
    /// observation and action.
    async fn trigger(&self, element: &ElementHandle) -> Result<(), SurfaceError>;

    async fn is_attached(&self, element: &ElementHandle) -> bool;

    async fn is_visible(&self, element: &ElementHandle) -> bool;

    /// Drive the surface's shared filter input. Returns whether the
    /// framework's own change handling accepted the value; on `false` the
    /// caller must not assume the filter took effect. An empty string
    /// restores the unfiltered view.
    async fn drive_filter_input(
        &self,
        text: &str,
        strategy: FilterStrategy,
    ) -> Result<bool, SurfaceError>;
}
