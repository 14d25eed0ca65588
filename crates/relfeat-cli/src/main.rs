//! relfeat CLI - Command-line interface
//!
//! Usage:
//!   relfeat features [--config relfeat.toml] [--dict married=dicts/married.txt]
//!   relfeat words
//!   relfeat recall --labels tags.json --expectations input.csv

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use relfeat_core::{AppConfig, DictionarySource, DictionaryStore, LoggingConfig};
use relfeat_extractor::{
    ExpectationTable, FeatureGenerator, LabelSet, RecallEvaluator, RelationFeatureExtractor,
    WordExtractor,
};

#[derive(Parser)]
#[command(name = "relfeat")]
#[command(about = "Relation feature extraction for distant supervision")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit `relation_id<TAB>feature` lines for annotated sentence records
    Features {
        /// Extra dictionary as ID=PATH (repeatable, overrides config entries with the same id)
        #[arg(long = "dict", value_name = "ID=PATH")]
        dictionaries: Vec<DictionarySource>,

        /// Input file (default: stdin)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Emit `[title_id, word]` candidates for title records
    Words {
        /// Input file (default: stdin)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compute recall of inferred expectations against labels
    Recall {
        /// Label file (JSON)
        #[arg(long)]
        labels: PathBuf,

        /// Expectation table (CSV with header)
        #[arg(long)]
        expectations: PathBuf,

        /// Expectation at or above which a relation counts as predicted
        #[arg(long)]
        threshold: Option<f64>,

        /// Skip correct labels without an expectation row instead of failing
        #[arg(long)]
        skip_unmatched: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Features {
            dictionaries,
            input,
            output,
        } => run_features(config, dictionaries, input.as_deref(), output.as_deref()),
        Commands::Words { input, output } => {
            WordExtractor::new().run(open_input(input.as_deref())?, open_output(output.as_deref())?)?;
            Ok(())
        }
        Commands::Recall {
            labels,
            expectations,
            threshold,
            skip_unmatched,
        } => run_recall(config, &labels, &expectations, threshold, skip_unmatched),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    // Logs go to stderr; stdout carries the extracted data
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run_features(
    mut config: AppConfig,
    extra: Vec<DictionarySource>,
    input: Option<&Path>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    for source in extra {
        config.dictionaries.retain(|d| d.id != source.id);
        config.dictionaries.push(source);
    }

    let store = DictionaryStore::from_sources(&config.dictionaries)
        .context("Failed to load dictionaries")?;
    tracing::info!(
        dictionaries = ?store.ids().collect::<Vec<_>>(),
        "Dictionaries loaded"
    );

    let generator =
        FeatureGenerator::new(&store, config.features).context("Invalid feature configuration")?;
    let extractor = RelationFeatureExtractor::new(generator, config.input);
    extractor.run(open_input(input)?, open_output(output)?)?;
    Ok(())
}

fn run_recall(
    config: AppConfig,
    labels: &Path,
    expectations: &Path,
    threshold: Option<f64>,
    skip_unmatched: bool,
) -> anyhow::Result<()> {
    let evaluation = config
        .evaluation
        .with_threshold(threshold)
        .context("Invalid --threshold")?;
    let labels = LabelSet::from_file(labels)?;
    let expectations = ExpectationTable::from_file(
        expectations,
        evaluation.id_column,
        evaluation.expectation_column,
    )?;

    let evaluator = RecallEvaluator::from_config(&evaluation)
        .skip_unmatched(skip_unmatched || evaluation.skip_unmatched);
    let report = evaluator.evaluate(&labels, &expectations)?;

    print!("{}", report.report());
    Ok(())
}

fn open_input(path: Option<&Path>) -> anyhow::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    })
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}
