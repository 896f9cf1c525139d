use anyhow::{Context, Result};
use caption_dataset_tools::config::Config;
use caption_dataset_tools::materialize::{self, DataFolder};
use caption_dataset_tools::split::{self, SplitManifest};
use caption_dataset_tools::types::EmptyMediaPolicy;
use caption_dataset_tools::{logging, metrics, pairing};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Split a labelled dataset into stratified train and test folders.
#[derive(Parser, Debug)]
#[command(
    name = "sample-dataset",
    version,
    about = "Stratified train/test split of a dataset"
)]
struct Cli {
    /// Folder containing data we want to sample from
    #[arg(long)]
    data_folder: PathBuf,

    /// Folder receiving the training split
    #[arg(long)]
    output_train_folder: PathBuf,

    /// Folder receiving the test split
    #[arg(long)]
    output_test_folder: PathBuf,

    /// Random seed for the split (defaults to the configured seed, 42)
    #[arg(long)]
    seed: Option<u64>,

    /// Fraction of identifiers assigned to the test split (defaults to 0.3)
    #[arg(long)]
    test_fraction: Option<f64>,

    /// What to do with records that reference no media
    #[arg(long, value_enum)]
    empty_media: Option<EmptyMediaPolicy>,

    /// Optional path for a JSON manifest of the split
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Optional path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging("sample-dataset");
    metrics::init_metrics();

    let args = Cli::parse();
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    let sampling = config
        .sampling
        .with_overrides(args.seed, args.test_fraction, args.empty_media)
        .context("Invalid sampling options")?;
    let (seed, test_fraction, policy) =
        (sampling.seed, sampling.test_fraction, sampling.empty_media);

    let data = DataFolder::new(&args.data_folder);
    let train = DataFolder::new(&args.output_train_folder);
    let test = DataFolder::new(&args.output_test_folder);

    let assignment = split::split_dataset(&data, test_fraction, seed, policy)
        .with_context(|| format!("Failed to split {}", data.root().display()))?;

    let report = materialize::split_and_store(&data, &train, &test, &assignment, policy)
        .context("Failed to store split")?;

    for out in [&train, &test] {
        pairing::warn_on_divergence(&out.instances(), &out.truth())?;
    }

    if let Some(path) = &args.manifest {
        SplitManifest::new(&assignment, seed, test_fraction, policy)
            .write(path)
            .with_context(|| format!("Failed to write manifest {}", path.display()))?;
        info!("Wrote split manifest to {}", path.display());
    }

    println!("Number of training images: {}", report.train.images);
    println!("Number of testing images: {}", report.test.images);
    println!(
        "train: {} instances, {} truths | test: {} instances, {} truths | ignored: {}",
        report.train.instances,
        report.train.truths,
        report.test.instances,
        report.test.truths,
        report.ignored
    );

    metrics::push_to_pushgateway("sample-dataset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_folders_and_policy() {
        let cli = Cli::try_parse_from([
            "sample-dataset",
            "--data-folder",
            "data",
            "--output-train-folder",
            "train",
            "--output-test-folder",
            "test",
            "--empty-media",
            "drop-after-split",
            "--seed",
            "7",
        ])
        .unwrap();
        assert_eq!(cli.data_folder, PathBuf::from("data"));
        assert_eq!(cli.output_train_folder, PathBuf::from("train"));
        assert_eq!(cli.output_test_folder, PathBuf::from("test"));
        assert_eq!(cli.empty_media, Some(EmptyMediaPolicy::DropAfterSplit));
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.test_fraction, None);
    }

    #[test]
    fn test_requires_output_folders() {
        assert!(Cli::try_parse_from(["sample-dataset", "--data-folder", "data"]).is_err());
        assert!(Cli::try_parse_from([
            "sample-dataset",
            "--data-folder",
            "data",
            "--output-train-folder",
            "train",
            "--output-test-folder",
            "test",
            "--empty-media",
            "sometimes",
        ])
        .is_err());
    }
}
