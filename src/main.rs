use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde_json::Value as JsonValue;

use explabox::config::create_output_dir;
use explabox::data::loader::{load_file, LoadOptions};
use explabox::digestibles::Digestible;
use explabox::explore::Explorer;
use explabox::{Config, Ingestible};

/// Explore a labelled text dataset from the command line.
#[derive(Parser, Debug)]
#[command(name = "explabox", version, about)]
struct Cli {
    /// Dataset file (.parquet, .json or .csv)
    file: PathBuf,

    /// JSON config file; defaults come from EXPLABOX_* variables otherwise
    #[arg(short, long, env = "EXPLABOX_CONFIG")]
    config: Option<PathBuf>,

    /// Split to show instances of (defaults to the configured split)
    #[arg(short, long)]
    split: Option<String>,

    /// Number of instances to show
    #[arg(long, default_value_t = 5)]
    head: i64,

    /// Print label counts and tokenized lengths per split
    #[arg(short, long)]
    descriptives: bool,

    /// Also write every result as JSON to the output directory
    #[arg(long)]
    save: bool,

    #[arg(long, default_value = "text")]
    text_column: String,

    #[arg(long, default_value = "label")]
    label_column: String,
}

fn emit(name: &str, value: &JsonValue, config: &Config, save: bool) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value)?;
    println!("{pretty}");
    if save {
        let path = config.output_dir.join(format!("{name}.json"));
        std::fs::write(&path, pretty).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("wrote {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path).with_context(|| format!("Failed to read config {}", path.display()))?,
        None => Config::from_env()?,
    };

    let options = LoadOptions {
        text_column: cli.text_column.clone(),
        label_column: cli.label_column.clone(),
        default_split: config.default_split.clone(),
        ..LoadOptions::default()
    };
    let env = load_file(&cli.file, &options)?;
    let ingestible = Arc::new(Ingestible::new(Some(env), None));
    info!("loaded {} with splits {:?}", cli.file.display(), ingestible.split_names());

    if cli.save {
        create_output_dir(&config.output_dir)?;
    }

    let explorer = Explorer::new(Arc::clone(&ingestible))?;
    if cli.descriptives {
        emit("descriptives", &explorer.descriptives()?.to_config(), &config, cli.save)?;
    }

    let split = cli.split.as_deref().unwrap_or(&config.default_split);
    let instances = explorer.instances(split)?.head(cli.head)?;
    emit(&format!("instances_{split}"), &instances.to_config(), &config, cli.save)?;

    Ok(())
}
