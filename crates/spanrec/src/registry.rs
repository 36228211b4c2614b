//! Explicit registry of recommender types.
//!
//! Built once at startup and passed by reference to whatever creates
//! recommenders; there is no global registration.

use std::collections::BTreeMap;
use std::fmt;

use spanrec_core::{RecommenderError, RecommenderTraits, Result};

use crate::engine::RecommendationEngine;
use crate::ner::NerRecommender;

/// Type id of the averaged perceptron NER recommender.
pub const PERCEPTRON_NER: &str = "perceptron-ner";

/// Builds a recommender instance from its id and traits.
pub type Factory =
    Box<dyn Fn(&str, RecommenderTraits) -> Result<Box<dyn RecommendationEngine>> + Send + Sync>;

/// Maps recommender type ids to factories.
#[derive(Default)]
pub struct RecommenderRegistry {
    factories: BTreeMap<String, Factory>,
}

impl RecommenderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in recommender type.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PERCEPTRON_NER, |id, traits| {
            Ok(Box::new(NerRecommender::perceptron(id, traits)?) as Box<dyn RecommendationEngine>)
        });
        registry
    }

    /// Register `factory` under `type_id`, replacing any previous entry.
    pub fn register<F>(&mut self, type_id: impl Into<String>, factory: F)
    where
        F: Fn(&str, RecommenderTraits) -> Result<Box<dyn RecommendationEngine>>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(type_id.into(), Box::new(factory));
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.factories.contains_key(type_id)
    }

    /// Registered type ids in sorted order.
    pub fn type_ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Create a recommender of type `type_id` named `id`.
    ///
    /// # Errors
    /// [`RecommenderError::UnknownRecommender`] if nothing is registered under `type_id`,
    /// otherwise whatever the factory reports.
    pub fn create(
        &self,
        type_id: &str,
        id: &str,
        traits: RecommenderTraits,
    ) -> Result<Box<dyn RecommendationEngine>> {
        let factory = self
            .factories
            .get(type_id)
            .ok_or_else(|| RecommenderError::UnknownRecommender {
                id: type_id.to_string(),
            })?;
        factory(id, traits)
    }
}

impl fmt::Debug for RecommenderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecommenderRegistry")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traits() -> RecommenderTraits {
        RecommenderTraits::new("NamedEntity", "value")
    }

    #[test]
    fn test_defaults_contain_perceptron() {
        let registry = RecommenderRegistry::with_defaults();
        assert!(registry.contains(PERCEPTRON_NER));
        assert_eq!(registry.type_ids().collect::<Vec<_>>(), vec![PERCEPTRON_NER]);

        let engine = registry.create(PERCEPTRON_NER, "ner-1", traits()).unwrap();
        assert_eq!(engine.id(), "ner-1");
        assert_eq!(engine.traits().layer, "NamedEntity");
        assert_eq!(engine.new_context().owner(), "ner-1");
    }

    #[test]
    fn test_unknown_type() {
        let registry = RecommenderRegistry::new();
        assert!(matches!(
            registry.create("crf", "x", traits()),
            Err(RecommenderError::UnknownRecommender { .. })
        ));
    }

    #[test]
    fn test_factory_errors_propagate() {
        let registry = RecommenderRegistry::with_defaults();
        let bad = RecommenderTraits::new("", "value");
        assert!(matches!(
            registry.create(PERCEPTRON_NER, "x", bad),
            Err(RecommenderError::Config(_))
        ));
    }

    #[test]
    fn test_register_custom() {
        let mut registry = RecommenderRegistry::new();
        registry.register("custom", |id, traits| {
            Ok(Box::new(NerRecommender::perceptron(format!("custom-{id}"), traits)?)
                as Box<dyn RecommendationEngine>)
        });
        let engine = registry.create("custom", "a", traits()).unwrap();
        assert_eq!(engine.id(), "custom-a");
    }
}
