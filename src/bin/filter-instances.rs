use anyhow::{Context, Result};
use caption_dataset_tools::config::Config;
use caption_dataset_tools::filter::{self, FilterOptions};
use caption_dataset_tools::materialize::DataFolder;
use caption_dataset_tools::types::TruthPolicy;
use caption_dataset_tools::{logging, metrics, pairing};
use clap::Parser;
use std::path::PathBuf;

/// Keep only the instances that reference at least one image.
#[derive(Parser, Debug)]
#[command(
    name = "filter-instances",
    version,
    about = "Restrict a dataset to image-backed instances"
)]
struct Cli {
    /// Folder containing the dataset to filter
    #[arg(long)]
    data_folder: PathBuf,

    /// Folder receiving the filtered dataset
    #[arg(long, alias = "output-train-folder")]
    output_folder: PathBuf,

    /// Which truth lines to keep
    #[arg(long, value_enum, default_value_t = TruthPolicy::Paired)]
    truth: TruthPolicy,

    /// Also copy the referenced media files
    #[arg(long)]
    copy_media: bool,

    /// Optional path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging("filter-instances");
    metrics::init_metrics();

    let args = Cli::parse();
    // Validates any config file even though filtering has no tunables of its own
    Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    let data = DataFolder::new(&args.data_folder);
    let output = DataFolder::new(&args.output_folder);
    let options = FilterOptions {
        truth: args.truth,
        copy_media: args.copy_media,
    };

    let report = filter::filter_instances_on_images(&data, &output, options)
        .with_context(|| format!("Failed to filter {}", data.root().display()))?;
    pairing::warn_on_divergence(&output.instances(), &output.truth())?;

    println!(
        "kept {} instances, dropped {}, wrote {} truths, copied {} images",
        report.kept, report.dropped, report.truths, report.images
    );

    metrics::push_to_pushgateway("filter-instances");
    Ok(())
}
