use std::collections::HashMap;
use std::sync::RwLock;

use composer_protocol::Tag;

/// Lookup-only view of the tag population. Injected wherever machine-form
/// text needs rehydrating so tests can supply isolated registries instead
/// of a process-wide singleton.
///
/// Implementations must tolerate ids they have never seen: machine text can
/// be re-parsed after a reload, when the original in-memory tags are gone.
pub trait TagLookup: Send + Sync {
    fn get(&self, id: &str) -> Option<Tag>;
    fn put(&self, tag: Tag);
    fn remove(&self, id: &str);
}

/// Process-wide map from tag id to full payload. Holds non-owning clones:
/// the editing session's `EditorContent` owns the live tags, the registry
/// only rehydrates the compact `[cmd:id]` / `@kind://id` text forms.
#[derive(Debug, Default)]
pub struct TagRegistry {
    tags: RwLock<HashMap<String, Tag>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tags.read().map(|tags| tags.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry still awaiting upload. Called after a submission
    /// completes: resolved entries stay around for redisplay of the same
    /// session, pending-only entries are dead weight.
    pub fn purge_pending(&self) {
        if let Ok(mut tags) = self.tags.write() {
            tags.retain(|_, tag| !tag.is_pending());
        }
    }
}

impl TagLookup for TagRegistry {
    fn get(&self, id: &str) -> Option<Tag> {
        let found = self.tags.read().ok()?.get(id).cloned();
        if found.is_none() {
            tracing::debug!("registry miss for tag id {id}");
        }
        found
    }

    fn put(&self, tag: Tag) {
        if let Ok(mut tags) = self.tags.write() {
            tags.insert(tag.id().to_string(), tag);
        }
    }

    fn remove(&self, id: &str) {
        if let Ok(mut tags) = self.tags.write() {
            tags.remove(id);
        }
    }
}
