// src/config.rs
use crate::constants::{
    DEFAULT_CACHE_FILE, DEFAULT_CONFIG_FILE, DEFAULT_INPUT_FOLDER, DEFAULT_JSON_SUFFIX,
    DEFAULT_OUTPUT_FOLDER,
};
use crate::error::AppError;
use crate::input::InputLayout;
use crate::normalize::Corrections;
use crate::types::{ApiToken, ServerIdentity, ServerUrl};
use clap::Parser;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Parsed command-line input. Every option can also come from the config file.
#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "Add recipes extracted from photos to a Tandoor server",
    long_about = None
)]
pub struct CommandLineInput {
    /// Configuration file (TOML). Defaults to ./config.toml when present.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Folder with the recipe photos
    #[arg(long)]
    pub input_folder: Option<PathBuf>,

    /// Folder with the JSON documents extracted from the photos
    #[arg(long)]
    pub output_folder: Option<PathBuf>,

    /// Full URL of the Tandoor API, including protocol, host, port and path
    #[arg(long)]
    pub tandoor_url: Option<String>,

    /// Tandoor API token
    #[arg(long)]
    pub tandoor_token: Option<String>,

    /// Also create a food linked to each new recipe
    #[arg(long, default_value_t = false)]
    pub recipe_food: bool,

    /// File remembering which photos were already imported
    #[arg(long)]
    pub cache_file: Option<PathBuf>,

    /// Suffix appended to a photo's file stem to find its JSON document
    #[arg(long)]
    pub json_suffix: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Contents of the TOML config file. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub input_folder: Option<PathBuf>,
    pub output_folder: Option<PathBuf>,
    pub tandoor_url: Option<String>,
    pub tandoor_token: Option<String>,
    pub recipe_food: Option<bool>,
    pub cache_file: Option<PathBuf>,
    pub json_suffix: Option<String>,
    /// Extra literal text corrections, applied after the built-in ones.
    pub corrections: IndexMap<String, String>,
}

impl ConfigFile {
    /// Reads a config file.
    ///
    /// A missing file is fine unless it was asked for explicitly.
    pub fn load(path: &Path, explicit: bool) -> Result<Self, AppError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
                log::debug!("No config file at {}, using flags only", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(AppError::ConfigFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|e| AppError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Resolved import configuration.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub input_folder: PathBuf,
    pub output_folder: PathBuf,
    pub server_url: ServerUrl,
    pub api_token: ApiToken,
    pub recipe_food: bool,
    pub cache_file: PathBuf,
    pub json_suffix: String,
    pub corrections: Corrections,
    pub verbose: bool,
}

impl ImportConfig {
    /// Resolves the configuration from CLI input and the config file.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let (path, explicit) = match &cli.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        let file = ConfigFile::load(&path, explicit)?;
        Self::merge(cli, file)
    }

    /// Flags win over the file, the file wins over built-in defaults.
    pub fn merge(cli: CommandLineInput, file: ConfigFile) -> Result<Self, AppError> {
        let url = cli.tandoor_url.or(file.tandoor_url).ok_or_else(|| {
            AppError::MissingConfiguration(
                "tandoor_url must be set with --tandoor-url or in the config file".to_string(),
            )
        })?;
        let token = cli.tandoor_token.or(file.tandoor_token).ok_or_else(|| {
            AppError::MissingConfiguration(
                "tandoor_token must be set with --tandoor-token or in the config file"
                    .to_string(),
            )
        })?;

        let mut corrections = Corrections::default();
        corrections.extend(file.corrections);

        Ok(ImportConfig {
            input_folder: cli
                .input_folder
                .or(file.input_folder)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_FOLDER)),
            output_folder: cli
                .output_folder
                .or(file.output_folder)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FOLDER)),
            server_url: ServerUrl::parse(&url)?,
            api_token: ApiToken::new(token)?,
            recipe_food: cli.recipe_food || file.recipe_food.unwrap_or(false),
            cache_file: cli
                .cache_file
                .or(file.cache_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE)),
            json_suffix: cli
                .json_suffix
                .or(file.json_suffix)
                .unwrap_or_else(|| DEFAULT_JSON_SUFFIX.to_string()),
            corrections,
            verbose: cli.verbose,
        })
    }

    /// Cache partition for the configured server.
    pub fn server_identity(&self) -> ServerIdentity {
        ServerIdentity::for_server(&self.server_url)
    }

    pub fn input_layout(&self) -> InputLayout {
        InputLayout::new(
            &self.input_folder,
            &self.output_folder,
            self.json_suffix.as_str(),
        )
    }
}
