//! Policy Pricer CLI
//!
//! Command-line interface for rating quotes through the pricing pipeline

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use policy_pricer::pipeline::TransformRegistry;
use policy_pricer::record::{load_records, write_records_csv, write_records_json};
use policy_pricer::{BatchSummary, Pipeline, PipelineContext, PipelineStage, PricerConfig};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pricer")]
#[command(about = "Rate insurance quotes through the indexing, banding and rating pipeline", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding category-index.json, continuous-banding.json and rating-plan.json
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Directory holding rating table CSV files
    #[arg(long, global = true)]
    tables_dir: Option<PathBuf>,

    /// Apply the built-in driver age and vehicle power transforms before indexing
    #[arg(long, global = true)]
    builtin_transforms: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a batch of records through the pipeline
    Rate {
        /// JSON or CSV file, or a directory of them
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: OutputFormat,

        /// Last stage to run
        #[arg(long, value_enum, default_value = "rated")]
        stage: StageArg,

        /// Partition records across threads
        #[arg(long)]
        parallel: bool,
    },
    /// Price a single JSON quote and print its premium details
    Quote {
        /// JSON file holding one quote object
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StageArg {
    Raw,
    Indexed,
    Banded,
    Rated,
}

impl From<StageArg> for PipelineStage {
    fn from(stage: StageArg) -> Self {
        match stage {
            StageArg::Raw => PipelineStage::Raw,
            StageArg::Indexed => PipelineStage::Indexed,
            StageArg::Banded => PipelineStage::Banded,
            StageArg::Rated => PipelineStage::Rated,
        }
    }
}

fn build_pipeline(cli: &Cli) -> anyhow::Result<Pipeline> {
    let mut config = PricerConfig::from_env();
    if let Some(dir) = &cli.config_dir {
        config.config_dir = dir.clone();
    }
    if let Some(dir) = &cli.tables_dir {
        config.tables_dir = dir.clone();
    }

    let context = PipelineContext::load(&config).context("loading pipeline configuration")?;
    let transforms = if cli.builtin_transforms {
        TransformRegistry::builtin()
    } else {
        TransformRegistry::new()
    };
    Ok(Pipeline::new(context).with_transforms(transforms))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let pipeline = build_pipeline(&cli)?;

    match &cli.command {
        Commands::Rate {
            input,
            output,
            format,
            stage,
            parallel,
        } => {
            let records = load_records(input).with_context(|| format!("loading {}", input.display()))?;
            let input_count = records.len();

            let stage = PipelineStage::from(*stage);
            let processed = if *parallel && stage == PipelineStage::Rated {
                pipeline.process_parallel(records)?
            } else {
                pipeline.run_until(records, stage)?
            };

            let writer: Box<dyn Write> = match output {
                Some(path) => Box::new(BufWriter::new(
                    File::create(path).with_context(|| format!("creating {}", path.display()))?,
                )),
                None => Box::new(io::stdout().lock()),
            };
            match format {
                OutputFormat::Csv => write_records_csv(writer, &processed)?,
                OutputFormat::Json => write_records_json(writer, &processed)?,
            }

            if stage == PipelineStage::Rated {
                let summary = BatchSummary::from_records(input_count, &processed);
                eprintln!(
                    "Rated {} of {} records ({} dropped), total premium {:.2}",
                    summary.rated_records, summary.input_records, summary.dropped_records, summary.total_premium
                );
            }
        }
        Commands::Quote { input } => {
            let mut records = load_records(input).with_context(|| format!("loading {}", input.display()))?;
            if records.len() != 1 {
                bail!("expected exactly one quote in {}, found {}", input.display(), records.len());
            }
            let quote = pipeline.quote(records.remove(0))?;
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
    }

    Ok(())
}
