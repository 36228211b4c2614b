//! # Recommender Context
//!
//! Per-recommender cache holding trained artifacts between `train`,
//! `predict` and `evaluate` calls. Values are stored behind `Arc` so a
//! populated context can be read from several threads at once; writes go
//! through `&mut self`, so the borrow checker serializes training against
//! readers of the same context.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{RecommenderError, Result};

/// A typed context key.
///
/// The type parameter fixes what is stored under the name, so reading a
/// key yields the value without casts at the call site.
pub struct Key<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.name).finish()
    }
}

/// Key-value store scoped to one recommender.
///
/// The context records the id of the recommender it belongs to; engines
/// refuse a context owned by someone else, so key names only need to be
/// unique within one recommender implementation.
pub struct RecommenderContext {
    owner: String,
    entries: HashMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl RecommenderContext {
    /// Creates an empty context owned by the recommender `owner`.
    #[must_use]
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Fails unless this context belongs to the recommender `id`.
    pub fn ensure_owner(&self, id: &str) -> Result<()> {
        if self.owner == id {
            Ok(())
        } else {
            Err(RecommenderError::ForeignContext {
                owner: self.owner.clone(),
                recommender: id.to_string(),
            })
        }
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn put<T>(&mut self, key: Key<T>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.put_shared(key, Arc::new(value));
    }

    /// Stores an already shared value under `key`.
    pub fn put_shared<T>(&mut self, key: Key<T>, value: Arc<T>)
    where
        T: Any + Send + Sync,
    {
        self.entries.insert(key.name, value);
    }

    /// Reads the value under `key`.
    ///
    /// # Errors
    /// [`RecommenderError::MissingKey`] when nothing was stored yet, which is
    /// a programming error on the caller's side (predict before train).
    pub fn get<T>(&self, key: Key<T>) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let value = self
            .entries
            .get(key.name)
            .ok_or_else(|| RecommenderError::MissingKey {
                key: key.name.to_string(),
            })?;

        Arc::clone(value)
            .downcast::<T>()
            .map_err(|_| RecommenderError::KeyTypeMismatch {
                key: key.name.to_string(),
                expected: type_name::<T>(),
            })
    }

    #[must_use]
    pub fn has_key<T>(&self, key: Key<T>) -> bool {
        self.entries.contains_key(key.name)
    }

    /// Drops the value under `key`, returning whether one was present.
    pub fn remove<T>(&mut self, key: Key<T>) -> bool {
        self.entries.remove(key.name).is_some()
    }
}

impl fmt::Debug for RecommenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().copied().collect();
        keys.sort_unstable();
        f.debug_struct("RecommenderContext")
            .field("owner", &self.owner)
            .field("keys", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_MODEL: Key<Vec<f32>> = Key::new("model");
    const KEY_NAME: Key<String> = Key::new("name");

    #[test]
    fn test_put_then_get() {
        let mut ctx = RecommenderContext::new("ner-1");
        assert!(!ctx.has_key(KEY_MODEL));
        ctx.put(KEY_MODEL, vec![1.0, 2.0]);
        assert!(ctx.has_key(KEY_MODEL));
        assert_eq!(*ctx.get(KEY_MODEL).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_missing_key_fails() {
        let ctx = RecommenderContext::new("ner-1");
        let err = ctx.get(KEY_MODEL).unwrap_err();
        assert!(matches!(err, RecommenderError::MissingKey { ref key } if key == "model"));
    }

    #[test]
    fn test_put_replaces() {
        let mut ctx = RecommenderContext::new("ner-1");
        ctx.put(KEY_NAME, "old".to_string());
        ctx.put(KEY_NAME, "new".to_string());
        assert_eq!(ctx.get(KEY_NAME).unwrap().as_str(), "new");
    }

    #[test]
    fn test_same_name_different_type_is_mismatch() {
        let mut ctx = RecommenderContext::new("ner-1");
        ctx.put(Key::<String>::new("model"), "not a model".to_string());
        let err = ctx.get(KEY_MODEL).unwrap_err();
        assert!(matches!(err, RecommenderError::KeyTypeMismatch { .. }));
    }

    #[test]
    fn test_ensure_owner() {
        let ctx = RecommenderContext::new("ner-1");
        assert!(ctx.ensure_owner("ner-1").is_ok());
        assert!(matches!(
            ctx.ensure_owner("ner-2"),
            Err(RecommenderError::ForeignContext { .. })
        ));
    }

    #[test]
    fn test_remove() {
        let mut ctx = RecommenderContext::new("ner-1");
        ctx.put(KEY_NAME, "x".to_string());
        assert!(ctx.remove(KEY_NAME));
        assert!(!ctx.remove(KEY_NAME));
        assert!(!ctx.has_key(KEY_NAME));
    }

    #[test]
    fn test_concurrent_reads() {
        let mut ctx = RecommenderContext::new("ner-1");
        ctx.put(KEY_MODEL, vec![0.5; 4]);
        let ctx = &ctx;
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(move || {
                    assert_eq!(ctx.get(KEY_MODEL).unwrap().len(), 4);
                });
            }
        });
    }
}
