mod display;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use leafscan_ai::TracingSink;
use leafscan_core::Settings;
use leafscan_pipeline::Pipeline;
use leafscan_translate::language_name;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "leafscan", version, about = "Plant leaf disease detection")]
struct Cli {
    /// JSON settings file; missing keys keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding `<plant>.onnx`, `<plant>_class_map.json` and `<plant>_prevention.json`
    #[arg(long, global = true, env = "LEAFSCAN_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Never call the translation service
    #[arg(long, global = true)]
    no_translate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect the disease on a leaf image
    Detect {
        /// Plant the leaf belongs to (see `leafscan plants`)
        #[arg(long)]
        plant: String,

        /// Leaf image (jpg, jpeg or png)
        #[arg(long)]
        image: PathBuf,

        /// Language code for the disease name and advice
        #[arg(long, default_value = "en")]
        lang: String,

        /// Show the score of every class
        #[arg(long)]
        probabilities: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List supported plants
    Plants {
        /// Load every plant's model and label files and report what is missing
        #[arg(long)]
        check: bool,
    },
    /// List supported languages
    Languages,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    match cli.command {
        Command::Detect {
            plant,
            image,
            lang,
            probabilities,
            json,
        } => {
            if language_name(&lang).is_none() {
                warn!(target_lang = %lang, "language not in the supported list, translation may fall back");
            }
            info!("leafscan v{}", env!("CARGO_PKG_VERSION"));

            let pipeline = Pipeline::open(&settings, Arc::new(TracingSink))?;
            let result = pipeline
                .run_path(&plant, &image, &lang)
                .await
                .with_context(|| format!("detecting disease for {plant}"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                display::print_result_card(&result, probabilities);
            }
        }
        Command::Plants { check: false } => {
            display::print_plants(&settings.registry());
        }
        Command::Plants { check: true } => {
            let pipeline = Pipeline::open(&settings, Arc::new(TracingSink))?;
            display::print_plant_status(pipeline.categories(), pipeline.store());
        }
        Command::Languages => {
            display::print_languages();
        }
    }

    Ok(())
}

/// Settings file first, then command-line and environment overrides.
fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(dir) = &cli.model_dir {
        settings.model_dir = dir.clone();
    }
    if cli.no_translate {
        settings.translation_enabled = false;
    }
    settings.validate()?;
    Ok(settings)
}
