use anyhow::{Context, Result};
use caption_dataset_tools::caption::{
    self, CaptionGenerator, HttpCaptionModel, MatchStrategy, Vocabulary,
};
use caption_dataset_tools::config::Config;
use caption_dataset_tools::{logging, metrics};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Caption a folder of images and map the captions to instance identifiers.
#[derive(Parser, Debug)]
#[command(
    name = "caption-images",
    version,
    about = "Caption images and join captions to instance ids"
)]
struct Cli {
    /// Folder containing the images we want to caption
    #[arg(long)]
    data_folder: PathBuf,

    /// Instances file holding the ids and media references of the images
    #[arg(long)]
    id_folder: PathBuf,

    /// File receiving the id -> caption map
    #[arg(long)]
    output_folder: PathBuf,

    /// Caption service base URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Model checkpoint path passed to the caption service
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Vocabulary file of the model
    #[arg(long)]
    vocab_file: Option<PathBuf>,

    /// How image names are matched against media references
    #[arg(long = "match", value_enum, default_value_t = MatchStrategy::Positional)]
    strategy: MatchStrategy,

    /// Optional path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging("caption-images");
    metrics::init_metrics();

    let args = Cli::parse();
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    let captioning = config
        .captioning
        .with_overrides(args.endpoint, args.checkpoint, args.vocab_file);

    let vocab = Vocabulary::from_file(&captioning.vocab_file).with_context(|| {
        format!("Failed to load vocabulary {}", captioning.vocab_file.display())
    })?;

    let model = HttpCaptionModel::from_config(&captioning)
        .context("Failed to build caption model client")?;
    info!("Using caption service at {}", model.url());
    let generator = CaptionGenerator::new(model, vocab);
    info!("Loaded vocabulary with {} words", generator.vocabulary().len());

    let report = caption::caption_images(
        &args.data_folder,
        &args.id_folder,
        &args.output_folder,
        &generator,
        args.strategy,
    )
    .context("Captioning run failed")?;

    println!(
        "captioned {}/{} images ({} failed, {} skipped), {} captions written to {}",
        report.captioned,
        report.images,
        report.failed,
        report.skipped,
        report.captions_written,
        args.output_folder.display()
    );

    metrics::push_to_pushgateway("caption-images");
    Ok(())
}
