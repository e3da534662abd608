// src/main.rs

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;
use tandoor_import::constants::LOG_FILE_NAME;
use tandoor_import::{
    AppError, BatchImporter, BatchReport, CommandLineInput, ImportCache, ImportConfig,
    TandoorClient, TextNormalizer,
};

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join(LOG_FILE_NAME);
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stderr_appender = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(log_level)))
                .build("console", Box::new(stderr_appender)),
        )
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .logger(Logger::builder().build("hyper", LevelFilter::Warn))
        .logger(Logger::builder().build("hyper_util", LevelFilter::Warn))
        .logger(Logger::builder().build("reqwest", LevelFilter::Info))
        .logger(Logger::builder().build("rustls", LevelFilter::Warn))
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(LevelFilter::Debug),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Imports every photo in the input folder into the configured server.
fn execute_import(config: &ImportConfig) -> Result<BatchReport, AppError> {
    let client = TandoorClient::new(config.server_url.clone(), &config.api_token)?;
    let identity = config.server_identity();
    let mut cache = ImportCache::open(&config.cache_file, &identity);
    let normalizer = TextNormalizer::new(config.corrections.clone());
    let items = config.input_layout().list_items()?;

    log::info!(
        "Importing from {} into {} (token {}, food entries: {})",
        config.input_folder.display(),
        config.server_url,
        config.api_token,
        config.recipe_food
    );

    BatchImporter::new(&client, &normalizer, &mut cache, identity)
        .with_food_entries(config.recipe_food)
        .run(&items)
}

fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let config = ImportConfig::resolve(cli).context("Invalid configuration")?;

    let report = execute_import(&config).context("Import aborted")?;
    log::debug!(
        "{} of {} items imported this run",
        report.completed(),
        report.total()
    );

    Ok(())
}
