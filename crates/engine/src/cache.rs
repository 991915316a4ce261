//! Owned store of the latest result per open file.
//!
//! The cache has exactly one owner (the coordinator) and is changed only
//! through [`CacheOp`]s, so there is a single writer by construction.
//! Readers get shared `Arc`s and never see a half-written result.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use surveygrid_core::FileKey;

use crate::result::GriddingResult;

/// A mutation of the cache.
#[derive(Debug, Clone)]
pub enum CacheOp {
    /// Store a result under its own file key, replacing any previous one
    Submit(Arc<GriddingResult>),
    /// Drop the entry for a file
    Evict(FileKey),
    /// Move an entry to a new key; the value is untouched
    Rename { from: FileKey, to: FileKey },
}

#[derive(Debug, Default)]
pub struct ResultCache {
    entries: HashMap<FileKey, Arc<GriddingResult>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `op`; returns whether the cache changed.
    pub fn apply(&mut self, op: CacheOp) -> bool {
        match op {
            CacheOp::Submit(result) => {
                let key = result.file_key().clone();
                debug!(file = %key, series = result.series_name(), "cache submit");
                self.entries.insert(key, result);
                true
            }
            CacheOp::Evict(key) => {
                let removed = self.entries.remove(&key).is_some();
                if removed {
                    debug!(file = %key, "cache evict");
                }
                removed
            }
            CacheOp::Rename { from, to } => match self.entries.remove(&from) {
                Some(result) => {
                    debug!(from = %from, to = %to, "cache rename");
                    self.entries.insert(to, result);
                    true
                }
                None => false,
            },
        }
    }

    pub fn get(&self, key: &FileKey) -> Option<Arc<GriddingResult>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &FileKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &FileKey> {
        self.entries.keys()
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!(entries = self.entries.len(), "cache cleared");
        }
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surveygrid_core::{
        GeoBounds, Grid, GriddingParams, InterpolationMethod, LatLon, PostProcessingFlags, Range,
    };

    fn result(key: &str) -> Arc<GriddingResult> {
        let bounds = GeoBounds::new(LatLon::new(0.0, 0.0), LatLon::new(0.0, 0.0));
        Arc::new(GriddingResult::new(
            FileKey::new(key),
            "mag".into(),
            GriddingParams::new(1.0, 1.0, InterpolationMethod::Idw).unwrap(),
            Grid::filled(1, 1, 1.0, bounds).unwrap(),
            None,
            (1.0, 1.0),
            Range::new(0.0, 1.0),
            PostProcessingFlags::default(),
        ))
    }

    #[test]
    fn test_submit_replaces() {
        let mut cache = ResultCache::new();
        let first = result("a");
        let second = result("a");
        cache.apply(CacheOp::Submit(Arc::clone(&first)));
        cache.apply(CacheOp::Submit(Arc::clone(&second)));
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&cache.get(&FileKey::new("a")).unwrap(), &second));
    }

    #[test]
    fn test_rename_moves_value() {
        let mut cache = ResultCache::new();
        let r = result("k1");
        cache.apply(CacheOp::Submit(Arc::clone(&r)));
        assert!(cache.apply(CacheOp::Rename {
            from: FileKey::new("k1"),
            to: FileKey::new("k2"),
        }));
        assert!(cache.get(&FileKey::new("k1")).is_none());
        assert!(Arc::ptr_eq(&cache.get(&FileKey::new("k2")).unwrap(), &r));
    }

    #[test]
    fn test_rename_missing_is_noop() {
        let mut cache = ResultCache::new();
        assert!(!cache.apply(CacheOp::Rename {
            from: FileKey::new("x"),
            to: FileKey::new("y"),
        }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evict_and_clear() {
        let mut cache = ResultCache::new();
        cache.apply(CacheOp::Submit(result("a")));
        cache.apply(CacheOp::Submit(result("b")));
        assert!(cache.apply(CacheOp::Evict(FileKey::new("a"))));
        assert!(!cache.apply(CacheOp::Evict(FileKey::new("a"))));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
