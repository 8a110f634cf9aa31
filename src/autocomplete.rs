//! Debounced suggestion dropdown for the search box.
//!
//! Phases: `Idle -> Debouncing -> Loading -> {Resolved, Failed}`. Each input change
//! bumps a generation counter and aborts the pending debounce task, so only the
//! latest input can ever reach `Loading`, and a response for superseded input is
//! dropped on arrival.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::{ClientSettings, DEFAULT_DEBOUNCE_MS};
use crate::error::ClientError;
use crate::models::Suggestion;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(DEFAULT_DEBOUNCE_MS);
pub const MIN_QUERY_CHARS: usize = 2;

/// Where suggestions come from (the storefront API in production).
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggestions(&self, query: &str) -> Result<Vec<Suggestion>, ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AutocompletePhase {
    #[default]
    Idle,
    Debouncing,
    Loading,
    Resolved,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

/// Everything the dropdown needs to render.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteView {
    pub phase: AutocompletePhase,
    pub input: String,
    pub suggestions: Vec<Suggestion>,
    pub active_index: Option<usize>,
    pub open: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct Inner {
    view: AutocompleteView,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl Inner {
    // Invalidates whatever is in flight
    fn cancel_pending(&mut self) {
        self.generation += 1;
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    // Hides the dropdown; suggestions stay for when it reopens, the selection does not
    fn close(&mut self) {
        self.view.open = false;
        self.view.active_index = None;
    }

    fn clear_suggestions(&mut self) {
        self.view.suggestions.clear();
        self.view.active_index = None;
    }
}

#[derive(Clone)]
pub struct AutocompleteController {
    inner: Arc<Mutex<Inner>>,
    source: Arc<dyn SuggestionSource>,
    debounce: Duration,
}

impl AutocompleteController {
    pub fn new(source: Arc<dyn SuggestionSource>) -> Self {
        Self::with_debounce(source, DEFAULT_DEBOUNCE)
    }

    /// Uses the configured quiet period (`debounce_ms`).
    pub fn from_settings(source: Arc<dyn SuggestionSource>, settings: &ClientSettings) -> Self {
        Self::with_debounce(source, settings.debounce())
    }

    pub fn with_debounce(source: Arc<dyn SuggestionSource>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            source,
            debounce,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn view(&self) -> AutocompleteView {
        self.lock().view.clone()
    }

    /// Handles a change of the input text. Must be called from within a tokio runtime.
    pub fn on_input(&self, text: &str) {
        let mut inner = self.lock();
        inner.cancel_pending();
        inner.view.input = text.to_string();

        let query = text.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            inner.view.phase = AutocompletePhase::Idle;
            inner.view.open = false;
            inner.view.error = None;
            inner.clear_suggestions();
            return;
        }

        inner.view.phase = AutocompletePhase::Debouncing;
        let ticket = inner.generation;
        let query = query.to_string();
        let this = self.clone();
        let debounce = self.debounce;
        inner.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            this.fetch(ticket, query).await;
        }));
    }

    async fn fetch(&self, ticket: u64, query: String) {
        {
            let mut inner = self.lock();
            if inner.generation != ticket {
                return;
            }
            inner.view.phase = AutocompletePhase::Loading;
        }

        tracing::debug!(query = %query, "Requesting suggestions");
        let result = self.source.suggestions(&query).await;

        let mut inner = self.lock();
        if inner.generation != ticket {
            tracing::debug!(query = %query, "Discarding suggestions for superseded input");
            return;
        }
        inner.pending = None;
        match result {
            Ok(suggestions) => {
                inner.view.phase = AutocompletePhase::Resolved;
                inner.view.open = !suggestions.is_empty();
                inner.view.suggestions = suggestions;
                inner.view.active_index = None;
                inner.view.error = None;
            }
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "Suggestion request failed");
                inner.view.phase = AutocompletePhase::Failed;
                inner.view.error = Some(e.user_message());
                inner.clear_suggestions();
                // Stay open so the error is visible
                inner.view.open = true;
            }
        }
    }

    /// Keyboard handling. Returns the suggestion committed by `Enter`, if any.
    pub fn on_key(&self, key: NavKey) -> Option<Suggestion> {
        let mut inner = self.lock();
        let count = inner.view.suggestions.len();
        match key {
            NavKey::ArrowDown if count > 0 => {
                inner.view.active_index = Some(match inner.view.active_index {
                    Some(i) => (i + 1) % count,
                    None => 0,
                });
                None
            }
            NavKey::ArrowUp if count > 0 => {
                inner.view.active_index = Some(match inner.view.active_index {
                    Some(0) | None => count - 1,
                    Some(i) => i - 1,
                });
                None
            }
            NavKey::Enter if inner.view.open => {
                let chosen = inner
                    .view
                    .active_index
                    .and_then(|i| inner.view.suggestions.get(i).cloned())?;
                inner.cancel_pending();
                inner.view.input = chosen.label.clone();
                inner.view.phase = AutocompletePhase::Idle;
                inner.view.open = false;
                inner.view.error = None;
                inner.clear_suggestions();
                Some(chosen)
            }
            NavKey::Escape => {
                inner.close();
                None
            }
            NavKey::ArrowDown | NavKey::ArrowUp | NavKey::Enter => None,
        }
    }

    /// Interaction outside the input and dropdown.
    pub fn dismiss(&self) {
        self.lock().close();
    }
}
