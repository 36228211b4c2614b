//! # Averaged Perceptron Training
//!
//! Structured perceptron over BIO tag sequences. Each pass visits the
//! samples in a seeded shuffle order, decodes with the current weights,
//! and moves weight from the predicted path onto the gold path wherever
//! they differ. The returned model carries the averaged weights.

use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use spanrec_core::{Sample, SequenceLabeler, TrainingParameters};
use tracing::{debug, info};

use crate::error::{Result, TaggerError};
use crate::features::sentence_features;
use crate::labels::LabelSet;
use crate::model::TaggerModel;
use crate::viterbi::{self, TransitionMask};

/// One encoded training sentence.
struct Instance {
    /// Feature ids per token
    features: Vec<Vec<usize>>,
    /// Gold tag per token
    tags: Vec<usize>,
}

/// Offsets of the three weight blocks inside one flat vector.
#[derive(Clone, Copy)]
struct Layout {
    num_tags: usize,
    transition: usize,
    start: usize,
    len: usize,
}

impl Layout {
    fn new(num_features: usize, num_tags: usize) -> Self {
        let transition = num_features * num_tags;
        let start = transition + num_tags * num_tags;
        Self {
            num_tags,
            transition,
            start,
            len: start + num_tags,
        }
    }

    fn emission(&self, feature: usize, tag: usize) -> usize {
        feature * self.num_tags + tag
    }

    fn transition(&self, from: usize, to: usize) -> usize {
        self.transition + from * self.num_tags + to
    }

    fn start(&self, tag: usize) -> usize {
        self.start + tag
    }
}

/// Running weights plus the bookkeeping for the averaged result.
struct Weights {
    current: Vec<f32>,
    summed: Vec<f64>,
    /// Update counter, one tick per visited instance
    c: f64,
}

impl Weights {
    fn new(len: usize) -> Self {
        Self {
            current: vec![0.0; len],
            summed: vec![0.0; len],
            c: 1.0,
        }
    }

    fn update(&mut self, idx: usize, delta: f32) {
        self.current[idx] += delta;
        self.summed[idx] += self.c * f64::from(delta);
    }

    fn averaged(self) -> Vec<f32> {
        let c = self.c;
        self.current
            .into_iter()
            .zip(self.summed)
            .map(|(w, u)| (f64::from(w) - u / c) as f32)
            .collect()
    }
}

/// Sequence labeler backed by an averaged perceptron.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerceptronTagger;

impl PerceptronTagger {
    pub fn new() -> Self {
        Self
    }

    /// Train a model on `samples`.
    ///
    /// Samples without tokens carry no signal and are skipped.
    ///
    /// # Errors
    /// - [`TaggerError::InvalidParameter`] for zero iterations or a negative epsilon
    /// - [`TaggerError::EmptyTrainingSet`] if no sample has tokens
    /// - [`TaggerError::MalformedSample`] if a gold span does not fit its sample
    pub fn fit(&self, samples: &[Sample], parameters: &TrainingParameters) -> Result<TaggerModel> {
        check_parameters(parameters)?;

        let labels = LabelSet::from_samples(samples);
        let sentences: Vec<(usize, &Sample)> = samples
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.tokens.is_empty())
            .collect();
        if sentences.is_empty() {
            return Err(TaggerError::EmptyTrainingSet);
        }

        let mut raw = Vec::with_capacity(sentences.len());
        for (index, sample) in &sentences {
            let tags = labels.encode(sample, *index)?;
            raw.push((sentence_features(&sample.token_refs()), tags));
        }

        let feature_ids = select_features(raw.iter().map(|(f, _)| f), parameters.cutoff);
        let instances: Vec<Instance> = raw
            .into_iter()
            .map(|(features, tags)| Instance {
                features: features
                    .iter()
                    .map(|token| token.iter().filter_map(|f| feature_ids.get(f).copied()).collect())
                    .collect(),
                tags,
            })
            .collect();

        info!(
            samples = instances.len(),
            labels = %labels,
            features = feature_ids.len(),
            iterations = parameters.iterations,
            "training perceptron tagger"
        );

        let layout = Layout::new(feature_ids.len(), labels.num_tags());
        let mask = TransitionMask::new(&labels);
        let weights = run_epochs(&instances, layout, &mask, parameters)?;

        let mut emission = weights;
        let start = emission.split_off(layout.start);
        let transition = emission.split_off(layout.transition);
        TaggerModel::from_parts(labels, feature_ids, emission, transition, start)
    }
}

impl SequenceLabeler for PerceptronTagger {
    type Model = TaggerModel;
    type Error = TaggerError;

    fn train(&self, samples: &[Sample], parameters: &TrainingParameters) -> Result<TaggerModel> {
        self.fit(samples, parameters)
    }
}

fn check_parameters(parameters: &TrainingParameters) -> Result<()> {
    if parameters.iterations == 0 {
        return Err(TaggerError::InvalidParameter(
            "iterations must be at least 1".into(),
        ));
    }
    if parameters.epsilon.is_nan() || parameters.epsilon < 0.0 {
        return Err(TaggerError::InvalidParameter(
            "epsilon must be non-negative".into(),
        ));
    }
    Ok(())
}

/// Features seen at least `cutoff` times, with ids assigned in sorted order.
fn select_features<'a>(
    sentences: impl Iterator<Item = &'a Vec<Vec<String>>>,
    cutoff: usize,
) -> HashMap<String, usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in sentences.flatten() {
        for feature in token {
            *counts.entry(feature.as_str()).or_default() += 1;
        }
    }

    let mut kept: Vec<&str> = counts
        .into_iter()
        .filter(|&(_, n)| n >= cutoff)
        .map(|(f, _)| f)
        .collect();
    kept.sort_unstable();

    kept.into_iter()
        .enumerate()
        .map(|(id, f)| (f.to_string(), id))
        .collect()
}

fn run_epochs(
    instances: &[Instance],
    layout: Layout,
    mask: &TransitionMask,
    parameters: &TrainingParameters,
) -> Result<Vec<f32>> {
    let mut weights = Weights::new(layout.len);
    let mut order: Vec<usize> = (0..instances.len()).collect();
    let mut rng = StdRng::seed_from_u64(parameters.seed);

    for epoch in 0..parameters.iterations {
        order.shuffle(&mut rng);

        let mut loss = 0.0;
        for &idx in &order {
            let inst = &instances[idx];
            let predicted = predict(inst, &weights.current, layout, mask)?;

            let num_diff = predicted
                .iter()
                .zip(&inst.tags)
                .filter(|(p, g)| p != g)
                .count();
            if num_diff > 0 {
                apply_update(&mut weights, inst, &predicted, layout);
                loss += num_diff as f64 / inst.tags.len() as f64;
            }

            weights.c += 1.0;
        }

        let error_rate = loss / instances.len() as f64;
        debug!(epoch = epoch + 1, error_rate, "perceptron pass");

        if error_rate < parameters.epsilon {
            info!(epoch = epoch + 1, "perceptron converged");
            break;
        }
    }

    Ok(weights.averaged())
}

fn predict(
    inst: &Instance,
    weights: &[f32],
    layout: Layout,
    mask: &TransitionMask,
) -> Result<Vec<usize>> {
    let num_tags = layout.num_tags;
    let emissions: Vec<Vec<f32>> = inst
        .features
        .iter()
        .map(|ids| {
            let mut row = vec![0.0f32; num_tags];
            for &id in ids {
                for (tag, score) in row.iter_mut().enumerate() {
                    *score += weights[layout.emission(id, tag)];
                }
            }
            row
        })
        .collect();

    viterbi::decode(
        &emissions,
        &weights[layout.start..layout.len],
        &weights[layout.transition..layout.start],
        mask,
    )
}

/// Reward the gold path and penalize the predicted one where they disagree.
fn apply_update(weights: &mut Weights, inst: &Instance, predicted: &[usize], layout: Layout) {
    for (pos, (&gold, &pred)) in inst.tags.iter().zip(predicted).enumerate() {
        if gold != pred {
            for &id in &inst.features[pos] {
                weights.update(layout.emission(id, gold), 1.0);
                weights.update(layout.emission(id, pred), -1.0);
            }
        }

        if pos == 0 {
            if gold != pred {
                weights.update(layout.start(gold), 1.0);
                weights.update(layout.start(pred), -1.0);
            }
        } else {
            let (gold_prev, pred_prev) = (inst.tags[pos - 1], predicted[pos - 1]);
            if (gold_prev, gold) != (pred_prev, pred) {
                weights.update(layout.transition(gold_prev, gold), 1.0);
                weights.update(layout.transition(pred_prev, pred), -1.0);
            }
        }
    }
}
