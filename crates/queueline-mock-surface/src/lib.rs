//! Scripted in-memory surface for reconciliation tests and CLI dry runs.
//!
//! Models the behaviors the engine has to survive on the real thing: a
//! virtualized list that only renders a window of rows until the filter
//! narrows it, handles that go stale after every mutation, a filter input
//! that may ignore one driving strategy, and a surface-side duplicate guard
//! on the queue.

use std::collections::HashMap;

use tokio::sync::Mutex;

use queueline_surface::{
    DiscoveryQuery, ElementHandle, ElementRole, FilterStrategy, SurfaceAdapter, SurfaceError,
};

/// One row on the scripted surface: a stable key for assertions plus the
/// loosely structured text a real row would render.
#[derive(Clone, Debug)]
pub struct MockRow {
    pub key: String,
    pub text: String,
}

impl MockRow {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// Journal of every mutation the engine performed, for test assertions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockEvent {
    FilterSet {
        value: String,
        strategy: FilterStrategy,
    },
    AddTriggered(String),
    RemoveTriggered(String),
}

#[derive(Clone, Debug)]
enum HandleTarget {
    AddFor(String),
    RemoveFor(String),
}

struct MockState {
    pool: Vec<MockRow>,
    queued: Vec<MockRow>,
    filter: String,
    /// Rows rendered from the unfiltered pool; deeper rows are only
    /// reachable by narrowing the filter.
    window: usize,
    accept_native: bool,
    accept_instrumented: bool,
    has_filter_input: bool,
    remove_label: String,
    detach_next_trigger: bool,
    next_handle: u64,
    handles: HashMap<u64, HandleTarget>,
    journal: Vec<MockEvent>,
}

pub struct MockSurface {
    state: Mutex<MockState>,
}

impl Default for MockSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSurface {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                pool: Vec::new(),
                queued: Vec::new(),
                filter: String::new(),
                window: usize::MAX,
                accept_native: true,
                accept_instrumented: false,
                has_filter_input: true,
                remove_label: "Remove".to_string(),
                detach_next_trigger: false,
                next_handle: 1,
                handles: HashMap::new(),
                journal: Vec::new(),
            }),
        }
    }

    pub fn with_pool(mut self, rows: Vec<MockRow>) -> Self {
        self.state.get_mut().pool = rows;
        self
    }

    pub fn with_queued(mut self, rows: Vec<MockRow>) -> Self {
        self.state.get_mut().queued = rows;
        self
    }

    /// Limit how many unfiltered pool rows are rendered at once.
    pub fn with_window(mut self, window: usize) -> Self {
        self.state.get_mut().window = window;
        self
    }

    /// Make the filter ignore native-event driving; only the instrumented
    /// strategy takes effect.
    pub fn reject_native_filter(mut self) -> Self {
        let state = self.state.get_mut();
        state.accept_native = false;
        state.accept_instrumented = true;
        self
    }

    pub fn accept_instrumented_filter(mut self) -> Self {
        self.state.get_mut().accept_instrumented = true;
        self
    }

    pub fn without_filter_input(mut self) -> Self {
        self.state.get_mut().has_filter_input = false;
        self
    }

    pub fn with_remove_label(mut self, label: impl Into<String>) -> Self {
        self.state.get_mut().remove_label = label.into();
        self
    }

    /// Force the next trigger to fail as if the element detached between
    /// observation and action.
    pub async fn detach_next_trigger(&self) {
        self.state.lock().await.detach_next_trigger = true;
    }

    pub async fn queued_keys(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .queued
            .iter()
            .map(|r| r.key.clone())
            .collect()
    }

    pub async fn current_filter(&self) -> String {
        self.state.lock().await.filter.clone()
    }

    pub async fn journal(&self) -> Vec<MockEvent> {
        self.state.lock().await.journal.clone()
    }
}

impl MockState {
    fn rendered_pool(&self) -> Vec<&MockRow> {
        if self.filter.trim().is_empty() {
            self.pool.iter().take(self.window).collect()
        } else {
            let needle = self.filter.to_lowercase();
            self.pool
                .iter()
                .filter(|r| r.text.to_lowercase().contains(&needle))
                .collect()
        }
    }

    fn mint(&mut self, target: HandleTarget) -> ElementHandle {
        let id = self.next_handle;
        self.next_handle += 1;
        self.handles.insert(id, target);
        ElementHandle(id)
    }

    // Every mutation re-renders the surface, so previously minted handles
    // are no longer attached.
    fn invalidate_handles(&mut self) {
        self.handles.clear();
    }

    fn target_of(&self, handle: &ElementHandle) -> Option<HandleTarget> {
        self.handles.get(&handle.0).cloned()
    }

    fn is_rendered(&self, target: &HandleTarget) -> bool {
        match target {
            HandleTarget::AddFor(key) => self.rendered_pool().iter().any(|r| r.key == *key),
            HandleTarget::RemoveFor(key) => self.queued.iter().any(|r| r.key == *key),
        }
    }
}

#[async_trait::async_trait]
impl SurfaceAdapter for MockSurface {
    async fn discover(&self, query: &DiscoveryQuery) -> Result<Vec<ElementHandle>, SurfaceError> {
        let mut state = self.state.lock().await;
        match query.role {
            ElementRole::AddTrigger => {
                let keys: Vec<String> = state
                    .rendered_pool()
                    .iter()
                    .map(|r| r.key.clone())
                    .collect();
                Ok(keys
                    .into_iter()
                    .map(|k| state.mint(HandleTarget::AddFor(k)))
                    .collect())
            }
            ElementRole::RemoveTrigger => {
                if let Some(label) = &query.label {
                    if !label.eq_ignore_ascii_case(&state.remove_label) {
                        return Ok(Vec::new());
                    }
                }
                let keys: Vec<String> = state.queued.iter().map(|r| r.key.clone()).collect();
                Ok(keys
                    .into_iter()
                    .map(|k| state.mint(HandleTarget::RemoveFor(k)))
                    .collect())
            }
        }
    }

    async fn text_of(&self, element: &ElementHandle) -> Result<String, SurfaceError> {
        let state = self.state.lock().await;
        match state.target_of(element) {
            Some(HandleTarget::AddFor(_)) => Ok("Add".to_string()),
            Some(HandleTarget::RemoveFor(_)) => Ok(state.remove_label.clone()),
            None => Err(SurfaceError::Detached(element.clone())),
        }
    }

    async fn entry_text_of(&self, element: &ElementHandle) -> Result<String, SurfaceError> {
        let state = self.state.lock().await;
        let target = state
            .target_of(element)
            .ok_or_else(|| SurfaceError::Detached(element.clone()))?;
        let row = match &target {
            HandleTarget::AddFor(key) => state.pool.iter().find(|r| r.key == *key),
            HandleTarget::RemoveFor(key) => state.queued.iter().find(|r| r.key == *key),
        };
        row.map(|r| r.text.clone())
            .ok_or_else(|| SurfaceError::Detached(element.clone()))
    }

    async fn trigger(&self, element: &ElementHandle) -> Result<(), SurfaceError> {
        let mut state = self.state.lock().await;
        if state.detach_next_trigger {
            state.detach_next_trigger = false;
            state.invalidate_handles();
            return Err(SurfaceError::Detached(element.clone()));
        }
        let target = state
            .target_of(element)
            .ok_or_else(|| SurfaceError::Detached(element.clone()))?;
        match target {
            HandleTarget::AddFor(key) => {
                // The surface itself guards against duplicate queue entries;
                // a second add trigger is accepted and ignored.
                if !state.queued.iter().any(|r| r.key == key) {
                    if let Some(row) = state.pool.iter().find(|r| r.key == key).cloned() {
                        state.queued.push(row);
                    }
                }
                state.journal.push(MockEvent::AddTriggered(key));
            }
            HandleTarget::RemoveFor(key) => {
                state.queued.retain(|r| r.key != key);
                state.journal.push(MockEvent::RemoveTriggered(key));
            }
        }
        state.invalidate_handles();
        Ok(())
    }

    async fn is_attached(&self, element: &ElementHandle) -> bool {
        let state = self.state.lock().await;
        state
            .target_of(element)
            .map(|t| state.is_rendered(&t))
            .unwrap_or(false)
    }

    async fn is_visible(&self, element: &ElementHandle) -> bool {
        self.is_attached(element).await
    }

    async fn drive_filter_input(
        &self,
        text: &str,
        strategy: FilterStrategy,
    ) -> Result<bool, SurfaceError> {
        let mut state = self.state.lock().await;
        if !state.has_filter_input {
            return Err(SurfaceError::NoFilterInput);
        }
        let accepted = match strategy {
            FilterStrategy::NativeEvent => state.accept_native,
            FilterStrategy::Instrumented => state.accept_instrumented,
        };
        if accepted {
            state.filter = text.to_string();
            state.journal.push(MockEvent::FilterSet {
                value: text.to_string(),
                strategy,
            });
        }
        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<MockRow> {
        vec![
            MockRow::new("allen", "Josh Allen QB BUF"),
            MockRow::new("mahomes", "Patrick Mahomes QB KC"),
            MockRow::new("kelce", "Travis Kelce TE KC"),
        ]
    }

    #[tokio::test]
    async fn unfiltered_discovery_respects_the_window() {
        let surface = MockSurface::new().with_pool(rows()).with_window(1);
        let found = surface
            .discover(&DiscoveryQuery::role(ElementRole::AddTrigger))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        surface
            .drive_filter_input("kelce", FilterStrategy::NativeEvent)
            .await
            .unwrap();
        let narrowed = surface
            .discover(&DiscoveryQuery::role(ElementRole::AddTrigger))
            .await
            .unwrap();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(
            surface.entry_text_of(&narrowed[0]).await.unwrap(),
            "Travis Kelce TE KC"
        );
    }

    #[tokio::test]
    async fn handles_go_stale_after_a_mutation() {
        let surface = MockSurface::new().with_pool(rows());
        let found = surface
            .discover(&DiscoveryQuery::role(ElementRole::AddTrigger))
            .await
            .unwrap();
        surface.trigger(&found[0]).await.unwrap();
        assert!(!surface.is_attached(&found[1]).await);
        assert!(matches!(
            surface.trigger(&found[1]).await,
            Err(SurfaceError::Detached(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_add_is_accepted_and_ignored() {
        let surface = MockSurface::new().with_pool(rows());
        for _ in 0..2 {
            let found = surface
                .discover(&DiscoveryQuery::role(ElementRole::AddTrigger))
                .await
                .unwrap();
            surface.trigger(&found[0]).await.unwrap();
        }
        assert_eq!(surface.queued_keys().await, vec!["allen".to_string()]);
    }

    #[tokio::test]
    async fn rejected_strategy_leaves_the_filter_untouched() {
        let surface = MockSurface::new().with_pool(rows()).reject_native_filter();
        let applied = surface
            .drive_filter_input("kelce", FilterStrategy::NativeEvent)
            .await
            .unwrap();
        assert!(!applied);
        assert_eq!(surface.current_filter().await, "");
        let applied = surface
            .drive_filter_input("kelce", FilterStrategy::Instrumented)
            .await
            .unwrap();
        assert!(applied);
        assert_eq!(surface.current_filter().await, "kelce");
    }
}
