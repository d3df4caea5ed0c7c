//! Debounced, single-flight autosave per document.
//!
//! Every `mark_dirty` bumps the document's generation and re-arms its timer.
//! A timer only acts if its generation is still the latest, so a save never
//! starts from a snapshot that a newer edit has already superseded. While a
//! save is in flight, a timer that fires sets a re-arm flag instead of
//! starting a second save; the flag is honoured when the save completes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::{PersistError, Result};
use crate::models::{ChangeType, NewVersion, Version};
use crate::store::VersionStore;

/// What made a document dirty. The most recent source decides the debounce
/// window and the change type of the next save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirtySource {
    ManualEdit,
    ExtractorOutput,
}

impl DirtySource {
    pub fn change_type(self) -> ChangeType {
        match self {
            Self::ManualEdit => ChangeType::Minor,
            Self::ExtractorOutput => ChangeType::Major,
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Self::ManualEdit => "Manual edit",
            Self::ExtractorOutput => "AI generated update",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    pub manual_debounce: Duration,
    pub generated_debounce: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            manual_debounce: Duration::from_secs(5),
            generated_debounce: Duration::from_secs(2),
        }
    }
}

impl AutosaveConfig {
    fn debounce(&self, source: DirtySource) -> Duration {
        match source {
            DirtySource::ManualEdit => self.manual_debounce,
            DirtySource::ExtractorOutput => self.generated_debounce,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutosaveStatus {
    pub dirty: bool,
    pub saving: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub last_saved_version: Option<String>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone)]
struct Pending {
    content: String,
    source: DirtySource,
    author: String,
}

#[derive(Default)]
struct Entry {
    dirty: bool,
    pending: Option<Pending>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
    in_flight: bool,
    rearm: bool,
    last_saved_at: Option<DateTime<Utc>>,
    last_saved_version: Option<String>,
    last_error: Option<String>,
}

struct Inner {
    store: Arc<dyn VersionStore>,
    config: AutosaveConfig,
    entries: Mutex<HashMap<String, Entry>>,
}

/// Cheap to clone; clones share the same per-document state.
#[derive(Clone)]
pub struct AutosaveCoordinator {
    inner: Arc<Inner>,
}

impl AutosaveCoordinator {
    pub fn new(store: Arc<dyn VersionStore>, config: AutosaveConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                config,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &AutosaveConfig {
        &self.inner.config
    }

    /// Record new content for `document_id` and (re)arm its debounce timer.
    pub async fn mark_dirty(
        &self,
        document_id: &str,
        source: DirtySource,
        content: impl Into<String>,
        author: impl Into<String>,
    ) {
        let delay = self.inner.config.debounce(source);
        let mut entries = self.inner.entries.lock().await;
        let entry = entries.entry(document_id.to_string()).or_default();

        entry.dirty = true;
        entry.pending = Some(Pending {
            content: content.into(),
            source,
            author: author.into(),
        });
        entry.generation += 1;
        if let Some(timer) = entry.timer.take() {
            timer.abort();
        }
        entry.timer = Some(self.arm(document_id, entry.generation, delay));

        tracing::debug!(
            document_id = %document_id,
            source = ?source,
            generation = entry.generation,
            delay_ms = delay.as_millis() as u64,
            "Autosave armed"
        );
    }

    pub async fn status(&self, document_id: &str) -> AutosaveStatus {
        let entries = self.inner.entries.lock().await;
        entries
            .get(document_id)
            .map(|e| AutosaveStatus {
                dirty: e.dirty,
                saving: e.in_flight,
                last_saved_at: e.last_saved_at,
                last_saved_version: e.last_saved_version.clone(),
                last_error: e.last_error.clone(),
            })
            .unwrap_or_default()
    }

    /// Save now, skipping the debounce. Returns `Ok(None)` when there is
    /// nothing to save, or when a save is already running; in that case the
    /// latest content is saved right after it.
    pub async fn flush(&self, document_id: &str) -> Result<Option<Version>> {
        let generation = {
            let mut entries = self.inner.entries.lock().await;
            let Some(entry) = entries.get_mut(document_id) else {
                return Ok(None);
            };
            if !entry.dirty {
                return Ok(None);
            }
            if let Some(timer) = entry.timer.take() {
                timer.abort();
            }
            entry.generation
        };
        self.save(document_id, generation).await
    }

    /// Flush every dirty document. Used on shutdown.
    pub async fn flush_all(&self) -> Vec<(String, PersistError)> {
        let dirty: Vec<String> = {
            let entries = self.inner.entries.lock().await;
            entries
                .iter()
                .filter(|(_, e)| e.dirty)
                .map(|(id, _)| id.clone())
                .collect()
        };

        let mut failures = Vec::new();
        for id in dirty {
            if let Err(e) = self.flush(&id).await {
                failures.push((id, e));
            }
        }
        failures
    }

    /// Forget a document, cancelling any pending timer. A save already in
    /// flight still runs to completion.
    pub async fn forget(&self, document_id: &str) {
        let mut entries = self.inner.entries.lock().await;
        if let Some(mut entry) = entries.remove(document_id) {
            if let Some(timer) = entry.timer.take() {
                timer.abort();
            }
        }
    }

    fn arm(&self, document_id: &str, generation: u64, delay: Duration) -> JoinHandle<()> {
        let this = self.clone();
        let id = document_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = this.save(&id, generation).await {
                tracing::warn!(document_id = %id, error = %e, "Autosave failed");
            }
        })
    }

    /// Persist the pending content if `generation` is still current.
    async fn save(&self, document_id: &str, generation: u64) -> Result<Option<Version>> {
        let pending = {
            let mut entries = self.inner.entries.lock().await;
            let Some(entry) = entries.get_mut(document_id) else {
                return Ok(None);
            };
            if entry.generation != generation {
                return Ok(None);
            }
            // Detach: from here on a re-arm must not abort this task.
            entry.timer = None;
            if entry.in_flight {
                entry.rearm = true;
                return Ok(None);
            }
            let Some(pending) = entry.pending.clone() else {
                return Ok(None);
            };
            entry.in_flight = true;
            pending
        };

        let new = NewVersion::new(pending.content, pending.source.change_type())
            .summary(pending.source.summary())
            .created_by(pending.author);
        let result = self.inner.store.create_version(document_id, new).await;

        let mut entries = self.inner.entries.lock().await;
        let Some(entry) = entries.get_mut(document_id) else {
            return result.map(Some);
        };
        entry.in_flight = false;

        match &result {
            Ok(version) => {
                entry.last_saved_at = Some(Utc::now());
                entry.last_saved_version = Some(version.version_number.to_string());
                entry.last_error = None;
                if entry.generation == generation {
                    entry.dirty = false;
                    entry.pending = None;
                }
                tracing::info!(
                    document_id = %document_id,
                    version = %version.version_number,
                    "Autosaved"
                );
            }
            Err(e) => {
                entry.last_error = Some(e.to_string());
            }
        }

        // A timer fired during the save; its content is the entry's latest.
        if std::mem::take(&mut entry.rearm) && entry.dirty && entry.timer.is_none() {
            entry.timer = Some(self.arm(document_id, entry.generation, Duration::ZERO));
        }

        result.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_mapping() {
        assert_eq!(DirtySource::ManualEdit.change_type(), ChangeType::Minor);
        assert_eq!(DirtySource::ExtractorOutput.change_type(), ChangeType::Major);
        assert_eq!(DirtySource::ManualEdit.summary(), "Manual edit");
        assert_eq!(DirtySource::ExtractorOutput.summary(), "AI generated update");
    }

    #[test]
    fn test_default_windows() {
        let config = AutosaveConfig::default();
        assert_eq!(config.debounce(DirtySource::ManualEdit), Duration::from_secs(5));
        assert_eq!(config.debounce(DirtySource::ExtractorOutput), Duration::from_secs(2));
    }
}
