//! Rate an entire block of quotes in parallel
//!
//! Usage: rate_batch [INPUT] [OUTPUT]
//! Defaults to data/quotes and rated_output.csv; config locations follow PRICER_* env vars.

use anyhow::Context;
use policy_pricer::record::{load_records, write_records_csv};
use policy_pricer::{BatchSummary, Pipeline, PipelineContext, PricerConfig};
use std::fs::File;
use std::io::BufWriter;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input = args.next().unwrap_or_else(|| "data/quotes".to_string());
    let output = args.next().unwrap_or_else(|| "rated_output.csv".to_string());

    let start = Instant::now();
    println!("Loading quotes from {}...", input);
    let records = load_records(&input).with_context(|| format!("loading {}", input))?;
    println!("Loaded {} quotes in {:?}", records.len(), start.elapsed());

    let config = PricerConfig::from_env();
    let context = PipelineContext::load(&config)?;
    // Fail on missing tables before any work is done
    context.preload_tables()?;
    let pipeline = Pipeline::new(context);

    println!("Rating...");
    let rate_start = Instant::now();
    let input_count = records.len();
    let rated = pipeline.process_parallel(records)?;
    println!("Rating complete in {:?}", rate_start.elapsed());

    let file = File::create(&output).with_context(|| format!("creating {}", output))?;
    write_records_csv(BufWriter::new(file), &rated)?;
    println!("Output written to {}", output);

    let summary = BatchSummary::from_records(input_count, &rated);
    println!("\nBlock Summary:");
    println!("  Quotes:        {}", summary.input_records);
    println!("  Rated:         {}", summary.rated_records);
    println!("  Dropped:       {}", summary.dropped_records);
    println!("  Total premium: {:.2}", summary.total_premium);
    println!("  Mean premium:  {:.2}", summary.mean_premium);
    println!("  Min / Max:     {:.2} / {:.2}", summary.min_premium, summary.max_premium);

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
