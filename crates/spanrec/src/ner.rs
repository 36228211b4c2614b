//! # Named-Entity Recommender
//!
//! Learns labeled spans of one annotation layer with a pluggable
//! [`SequenceLabeler`], one sample per sentence.
//!
//! - `train` extracts samples from curated spans and caches the model in the context
//! - `predict` runs the cached model sentence by sentence and appends predicted spans
//! - `evaluate` trains a throwaway model on a split of the samples and scores it

use spanrec_core::{
    DataSplitter, Document, GoldSpan, Key, NameFinder, RecommenderContext, RecommenderError,
    RecommenderTraits, Result, Sample, SampleExtractor, SequenceLabeler, Span, SpanMetrics,
    TargetSet, TokenAligner, TokenSpan,
};
use spanrec_tagger::PerceptronTagger;
use tracing::{debug, info};

use crate::engine::{EvaluationOutcome, RecommendationEngine};

/// Recommender for named-entity style span layers.
#[derive(Debug, Clone)]
pub struct NerRecommender<L: SequenceLabeler = PerceptronTagger> {
    id: String,
    traits: RecommenderTraits,
    extractor: SampleExtractor,
    labeler: L,
}

impl<L: SequenceLabeler> NerRecommender<L> {
    /// Context key of the trained model.
    pub const KEY_MODEL: Key<L::Model> = Key::new("model");

    /// Creates a recommender named `id` learning `traits.layer` / `traits.feature` with `labeler`.
    ///
    /// # Errors
    /// [`RecommenderError::Config`] if the traits are invalid.
    pub fn new(id: impl Into<String>, traits: RecommenderTraits, labeler: L) -> Result<Self> {
        traits.validate()?;
        let extractor = SampleExtractor::new(traits.layer.clone(), traits.feature.clone());
        Ok(Self {
            id: id.into(),
            traits,
            extractor,
            labeler,
        })
    }

    pub fn labeler(&self) -> &L {
        &self.labeler
    }

    /// Fit a model on `samples` without touching any context.
    pub fn train_model(&self, samples: &[Sample]) -> Result<L::Model> {
        self.labeler
            .train(samples, &self.traits.parameters)
            .map_err(RecommenderError::model)
    }

    /// Predicted spans for every sentence of `document`, in document order.
    pub fn find_spans(&self, model: &L::Model, document: &Document) -> Result<Vec<Span>> {
        let mut predictions = Vec::new();

        for sentence in document.sentences() {
            let tokens = document.tokens_covered(sentence);
            if tokens.is_empty() {
                continue;
            }

            let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
            let found = model.find(&texts).map_err(RecommenderError::model)?;

            let aligner = TokenAligner::new(tokens);
            for span in &found {
                let (begin, end) = aligner.char_span_of(span)?;
                predictions.push(Span::prediction(
                    begin,
                    end,
                    &self.traits.feature,
                    span.label.clone(),
                    span.confidence,
                ));
            }
        }

        Ok(predictions)
    }

    /// Span counts of `model` over `samples`, matching `(start, end, label)` exactly.
    pub fn score(&self, model: &L::Model, samples: &[Sample]) -> Result<SpanMetrics> {
        let mut metrics = SpanMetrics::default();
        for sample in samples {
            let predicted: Vec<GoldSpan> = model
                .find(&sample.token_refs())
                .map_err(RecommenderError::model)?
                .iter()
                .filter_map(TokenSpan::to_gold)
                .collect();
            metrics.add_sample(&predicted, &sample.gold_spans);
        }
        Ok(metrics)
    }
}

impl NerRecommender<PerceptronTagger> {
    /// Recommender backed by the averaged perceptron tagger.
    pub fn perceptron(id: impl Into<String>, traits: RecommenderTraits) -> Result<Self> {
        Self::new(id, traits, PerceptronTagger::new())
    }
}

impl<L: SequenceLabeler> RecommendationEngine for NerRecommender<L> {
    fn id(&self) -> &str {
        &self.id
    }

    fn traits(&self) -> &RecommenderTraits {
        &self.traits
    }

    fn is_ready(&self, context: &RecommenderContext) -> bool {
        context.owner() == self.id && context.has_key(Self::KEY_MODEL)
    }

    fn train(&self, context: &mut RecommenderContext, documents: &[Document]) -> Result<()> {
        context.ensure_owner(&self.id)?;

        let samples = self.extractor.extract(documents)?;
        let model = self.train_model(&samples)?;
        context.put(Self::KEY_MODEL, model);

        info!(
            recommender = %self.id,
            documents = documents.len(),
            samples = samples.len(),
            "trained recommender"
        );
        Ok(())
    }

    fn predict(&self, context: &RecommenderContext, document: &mut Document) -> Result<()> {
        context.ensure_owner(&self.id)?;
        let model = context.get(Self::KEY_MODEL)?;

        let predictions = self.find_spans(&model, document)?;
        let count = predictions.len();
        for span in predictions {
            document.add_span(&self.traits.layer, span)?;
        }

        debug!(recommender = %self.id, predictions = count, "predicted spans");
        Ok(())
    }

    fn evaluate_detailed(
        &self,
        context: &RecommenderContext,
        documents: &[Document],
        splitter: &mut dyn DataSplitter,
    ) -> Result<EvaluationOutcome> {
        context.ensure_owner(&self.id)?;

        let samples = self.extractor.extract(documents)?;
        splitter.set_total(samples.len());

        let mut train = Vec::new();
        let mut test = Vec::new();
        for sample in samples {
            match splitter.target_set(&sample) {
                TargetSet::Train => train.push(sample),
                TargetSet::Test => test.push(sample),
                TargetSet::Ignore => {}
            }
        }

        if train.len() < 2 || test.len() < 2 {
            info!(
                recommender = %self.id,
                train = train.len(),
                test = test.len(),
                "insufficient data for evaluation, skipping"
            );
            return Ok(EvaluationOutcome::Skipped {
                train: train.len(),
                test: test.len(),
            });
        }

        let model = self.train_model(&train)?;
        let metrics = self.score(&model, &test)?;

        info!(
            recommender = %self.id,
            train = train.len(),
            test = test.len(),
            precision = metrics.precision(),
            recall = metrics.recall(),
            f_measure = metrics.f_measure(),
            "evaluated recommender"
        );
        Ok(EvaluationOutcome::Scored(metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spanrec_core::{FnSplitter, Segmenter, TrainingParameters};

    fn traits() -> RecommenderTraits {
        RecommenderTraits::new("NamedEntity", "value")
            .with_parameters(TrainingParameters::new().with_iterations(10))
    }

    fn doc(text: &str, spans: &[(&str, &str)]) -> Document {
        let mut doc = Segmenter::new().unwrap().segment(text).unwrap();
        for (surface, label) in spans {
            let begin = text.find(surface).unwrap();
            doc.add_span(
                "NamedEntity",
                Span::new(begin, begin + surface.len()).with_feature("value", *label),
            )
            .unwrap();
        }
        doc
    }

    #[test]
    fn test_predict_before_train_is_missing_key() {
        let rec = NerRecommender::perceptron("ner", traits()).unwrap();
        let ctx = rec.new_context();
        let mut document = doc("Ana lives in Vigo.", &[]);
        assert!(matches!(
            rec.predict(&ctx, &mut document),
            Err(RecommenderError::MissingKey { .. })
        ));
        assert!(!rec.is_ready(&ctx));
    }

    #[test]
    fn test_foreign_context_rejected() {
        let rec = NerRecommender::perceptron("ner", traits()).unwrap();
        let mut ctx = RecommenderContext::new("other");
        let result = rec.train(&mut ctx, &[doc("Ana lives in Vigo.", &[("Vigo", "LOC")])]);
        assert!(matches!(result, Err(RecommenderError::ForeignContext { .. })));
    }

    #[test]
    fn test_train_without_samples_is_model_error() {
        let rec = NerRecommender::perceptron("ner", traits()).unwrap();
        let mut ctx = rec.new_context();
        let result = rec.train(&mut ctx, &[]);
        assert!(matches!(result, Err(RecommenderError::Model(_))));
        assert!(!rec.is_ready(&ctx));
    }

    #[test]
    fn test_train_then_predict() {
        let rec = NerRecommender::perceptron("ner", traits()).unwrap();
        let mut ctx = rec.new_context();
        let corpus = vec![
            doc("Ana lives in Vigo.", &[("Vigo", "LOC")]),
            doc("Bruno lives in Porto.", &[("Porto", "LOC")]),
        ];
        rec.train(&mut ctx, &corpus).unwrap();
        assert!(rec.is_ready(&ctx));

        let mut target = doc("Carla lives in Vigo.", &[]);
        rec.predict(&ctx, &mut target).unwrap();

        let spans = target.spans("NamedEntity");
        assert!(spans.iter().all(|s| s.predicted));
        assert!(spans
            .iter()
            .any(|s| (s.begin, s.end) == (15, 19) && s.label("value") == "LOC"));
    }

    #[test]
    fn test_evaluate_skips_with_one_training_sample() {
        let rec = NerRecommender::perceptron("ner", traits()).unwrap();
        let ctx = rec.new_context();
        let corpus = vec![doc(
            "Ana lives in Vigo. Bruno lives in Porto. Carla lives in Lyon.",
            &[("Vigo", "LOC")],
        )];
        let mut splitter = FnSplitter::new(|position, _, _: &Sample| {
            if position == 0 {
                TargetSet::Train
            } else {
                TargetSet::Test
            }
        });

        let outcome = rec.evaluate_detailed(&ctx, &corpus, &mut splitter).unwrap();
        assert_eq!(outcome, EvaluationOutcome::Skipped { train: 1, test: 2 });
    }

    #[test]
    fn test_ignored_samples_do_not_count() {
        let rec = NerRecommender::perceptron("ner", traits()).unwrap();
        let ctx = rec.new_context();
        let corpus = vec![doc("A b. C d. E f. G h.", &[])];
        let mut splitter = FnSplitter::new(|_, _, _: &Sample| TargetSet::Ignore);
        let score = rec.evaluate(&ctx, &corpus, &mut splitter).unwrap();
        assert_eq!(score, 0.0);
    }
}
