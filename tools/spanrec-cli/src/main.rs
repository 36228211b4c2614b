//! Spanrec command-line tool
//!
//! Trains a recommender on a JSON corpus, evaluates it on a split of that
//! corpus, or annotates documents with a previously saved model.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use spanrec::{
    Document, Key, NerRecommender, PerceptronTagger, PercentageBasedSplitter, RecommendationEngine,
    RecommenderRegistry, RecommenderTraits, Segmenter, TaggerModel, TrainingParameters,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Parser)]
#[command(name = "spanrec")]
#[command(about = "Train, evaluate and run span recommenders")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Recommender type
    #[arg(short, long, env = "SPANREC_RECOMMENDER", default_value = spanrec::PERCEPTRON_NER)]
    recommender: String,

    /// Recommender traits as JSON; overrides the layer and parameter flags
    #[arg(short, long, env = "SPANREC_TRAITS")]
    traits: Option<PathBuf>,

    /// Annotation layer to learn
    #[arg(short, long, env = "SPANREC_LAYER", default_value = "NamedEntity")]
    layer: String,

    /// Span feature holding the label
    #[arg(short, long, env = "SPANREC_FEATURE", default_value = "value")]
    feature: String,

    /// Training passes
    #[arg(short, long, env = "SPANREC_ITERATIONS")]
    iterations: Option<usize>,

    /// Minimum feature frequency
    #[arg(long, env = "SPANREC_CUTOFF")]
    cutoff: Option<usize>,

    /// Shuffle seed
    #[arg(long, env = "SPANREC_SEED")]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on a corpus and save the model
    Train {
        /// JSON array of documents
        corpus: PathBuf,
        /// Where to write the model
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,
    },
    /// Estimate quality on a train/test split of a corpus
    Evaluate {
        /// JSON array of documents
        corpus: PathBuf,
        /// Share of samples used for training
        #[arg(short = 'p', long, default_value_t = 0.8)]
        train_percentage: f64,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Annotate documents with a saved model
    Predict {
        /// Model written by `train`
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,
        /// JSON array of documents
        input: PathBuf,
        /// Where to write the annotated documents (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep predictions already present in the input
        #[arg(long)]
        keep_predictions: bool,
    },
    /// List available recommender types
    Recommenders,
}

impl Cli {
    fn recommender_traits(&self) -> Result<RecommenderTraits> {
        let mut traits = match &self.traits {
            Some(path) => RecommenderTraits::from_json_file(path)
                .with_context(|| format!("Failed to load traits from {}", path.display()))?,
            None => RecommenderTraits::new(&self.layer, &self.feature),
        };

        let mut parameters: TrainingParameters = traits.parameters.clone();
        if let Some(iterations) = self.iterations {
            parameters = parameters.with_iterations(iterations);
        }
        if let Some(cutoff) = self.cutoff {
            parameters = parameters.with_cutoff(cutoff);
        }
        if let Some(seed) = self.seed {
            parameters = parameters.with_seed(seed);
        }
        traits = traits.with_parameters(parameters);
        traits.validate()?;
        Ok(traits)
    }
}

/// Context key of the model a recommender type reads and writes as a file.
///
/// Only perceptron recommenders store a `TaggerModel`.
fn model_key(recommender: &str) -> Result<Key<TaggerModel>> {
    if recommender != spanrec::PERCEPTRON_NER {
        bail!(
            "Model files are only supported for {:?}, not {recommender:?}",
            spanrec::PERCEPTRON_NER
        );
    }
    Ok(NerRecommender::<PerceptronTagger>::KEY_MODEL)
}

/// Read a JSON array of documents, segmenting any that come without tokens.
fn load_corpus(path: &Path) -> Result<Vec<Document>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let documents: Vec<Document> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse documents in {}", path.display()))?;

    let segmenter = Segmenter::new()?;
    documents
        .into_iter()
        .map(|doc| ensure_segmented(doc, &segmenter))
        .collect()
}

fn ensure_segmented(doc: Document, segmenter: &Segmenter) -> Result<Document> {
    if !doc.tokens().is_empty() {
        return Ok(doc);
    }

    let mut segmented = segmenter.segment(doc.text())?;
    for layer in doc.layers() {
        for span in doc.spans(layer) {
            segmented.add_span(layer, span.clone())?;
        }
    }
    Ok(segmented)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = RecommenderRegistry::with_defaults();

    if let Commands::Recommenders = cli.command {
        for type_id in registry.type_ids() {
            println!("{type_id}");
        }
        return Ok(());
    }

    let traits = cli.recommender_traits()?;
    if !registry.contains(&cli.recommender) {
        bail!("Unknown recommender type {:?}", cli.recommender);
    }
    let engine = registry.create(&cli.recommender, &cli.recommender, traits)?;

    match &cli.command {
        Commands::Train { corpus, model } => {
            let key = model_key(&cli.recommender)?;
            let documents = load_corpus(corpus)?;
            let mut context = engine.new_context();
            engine.train(&mut context, &documents)?;

            let trained = context.get(key)?;
            trained
                .save(model)
                .with_context(|| format!("Failed to write model to {}", model.display()))?;
            info!(
                labels = %trained.labels(),
                features = trained.num_features(),
                path = %model.display(),
                "Saved model"
            );
        }
        Commands::Evaluate {
            corpus,
            train_percentage,
            json,
        } => {
            let documents = load_corpus(corpus)?;
            let context = engine.new_context();
            let mut splitter = PercentageBasedSplitter::new(*train_percentage)?;
            let outcome = engine.evaluate_detailed(&context, &documents, &mut splitter)?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{outcome}");
            }
        }
        Commands::Predict {
            model,
            input,
            output,
            keep_predictions,
        } => {
            let key = model_key(&cli.recommender)?;
            let loaded = TaggerModel::load(model)
                .with_context(|| format!("Failed to load model from {}", model.display()))?;
            let mut context = engine.new_context();
            context.put(key, loaded);

            let mut documents = load_corpus(input)?;
            let layer = &engine.traits().layer;
            for doc in &mut documents {
                if !keep_predictions {
                    doc.clear_predictions(layer);
                }
                engine.predict(&context, doc)?;
            }
            info!(documents = documents.len(), "Annotated documents");

            let json = serde_json::to_string_pretty(&documents)?;
            match output {
                Some(path) => fs::write(path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => {
                    let mut stdout = std::io::stdout().lock();
                    writeln!(stdout, "{json}")?;
                }
            }
        }
        Commands::Recommenders => {}
    }

    Ok(())
}
