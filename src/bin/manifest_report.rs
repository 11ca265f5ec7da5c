use std::path::PathBuf;

use clap::Parser;

use textaudio_rs::{AudioDataConfig, Catalog, DataError, DistributedBucketSampler, SamplerConfig};

const DEFAULT_BOUNDARIES: &str = "32,300,400,500,600,700,800,900,1000";

/// Reports bucket occupancy, padding overhead, and per-rank batch counts
/// for a training manifest, without decoding any audio.
#[derive(Debug, Parser)]
#[command(name = "manifest-report")]
struct Args {
    /// Manifest file with `identifier|durations|text_units` rows.
    #[arg(long)]
    manifest: PathBuf,
    /// Optional JSON data config; built-in defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding `<id>.wav` files; overrides the config value.
    #[arg(long)]
    data_path: Option<String>,
    /// Ascending bucket boundaries in frames, comma separated.
    #[arg(long, value_delimiter = ',', default_value = DEFAULT_BOUNDARIES)]
    boundaries: Vec<usize>,
    #[arg(long, default_value_t = 16)]
    batch_size: usize,
    #[arg(long, default_value_t = 1)]
    world_size: usize,
}

fn main() -> Result<(), DataError> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AudioDataConfig::load(path)?,
        None => AudioDataConfig::default(),
    };
    if let Some(data_path) = args.data_path {
        config.data_path = data_path;
    }

    let catalog = Catalog::load(&args.manifest, &config)?;
    println!("retained examples: {}", catalog.len());

    let sampler = DistributedBucketSampler::new(
        catalog.lengths(),
        SamplerConfig {
            batch_size: args.batch_size,
            boundaries: args.boundaries,
            world_size: args.world_size,
            rank: 0,
            shuffle: false,
        },
    )?;

    let boundaries = sampler.boundaries();
    let sizes = sampler.bucket_sizes();
    let padded = sampler.padded_sizes();
    println!("bucket            size  padded  pad overhead");
    for i in 0..sizes.len() {
        let overhead = padded[i] - sizes[i];
        println!(
            "({:>5}, {:>5}]  {:>6}  {:>6}  {:>12}",
            boundaries[i],
            boundaries[i + 1],
            sizes[i],
            padded[i],
            overhead
        );
    }
    let bucketed: usize = sizes.iter().sum();
    println!(
        "bucketed: {bucketed}  discarded: {}  total padded: {}",
        catalog.len() - bucketed,
        sampler.total_size()
    );
    println!(
        "per rank: {} examples, {} batches of {}",
        sampler.num_samples(),
        sampler.batches_per_epoch(),
        args.batch_size
    );
    Ok(())
}
