//! Short-lived in-memory copy of the last document loaded or saved.

use std::time::{Duration, Instant};

use vritra_config_core::ConfigDocument;

/// A single cached document with a freshness window.
///
/// A fresh entry lets hot paths such as `get_value` skip the file lock and
/// the disk read.  A stale entry is still kept: when the lock cannot be
/// acquired, the last known document beats falling back to defaults.
#[derive(Debug)]
pub struct ConfigCache {
    ttl: Duration,
    entry: Option<(ConfigDocument, Instant)>,
}

impl ConfigCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// The cached document, if it was stored less than one TTL ago.
    pub fn fresh(&self) -> Option<&ConfigDocument> {
        match &self.entry {
            Some((doc, stored_at)) if stored_at.elapsed() < self.ttl => Some(doc),
            _ => None,
        }
    }

    /// The cached document regardless of age.
    pub fn latest(&self) -> Option<&ConfigDocument> {
        self.entry.as_ref().map(|(doc, _)| doc)
    }

    pub fn store(&mut self, doc: ConfigDocument) {
        self.entry = Some((doc, Instant::now()));
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh().is_some()
    }
}
