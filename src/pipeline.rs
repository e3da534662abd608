// src/pipeline.rs
//! The batch import loop.
//!
//! Each item moves through normalize → convert → upload → create → (food),
//! and stops at the first step the server refuses. Refusals are reported
//! and the batch moves on. Unreadable input files and transport faults
//! propagate, except while creating the recipe, where a transport fault is
//! reported like any refusal.

use crate::api::{ApiOutcome, ErrorPayload, FoodEntry, RecipeService};
use crate::cache::{CacheRecord, ImportCache};
use crate::error::AppError;
use crate::input::ImportItem;
use crate::normalize::TextNormalizer;
use crate::types::{ItemKey, ServerIdentity};
use serde_json::Value;

/// Terminal state of one item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Already imported into this server on an earlier run.
    Skipped,
    ConversionFailed(ErrorPayload),
    /// Conversion produced a record without a name.
    NamelessRejected { record: Value },
    /// Conversion produced a record without steps to hold the photo.
    NoStepsRejected { record: Value },
    UploadFailed(ErrorPayload),
    RecipeCreateFailed(ErrorPayload),
    /// The recipe exists on the server, but its food entry does not.
    FoodCreateFailed { recipe: String, payload: ErrorPayload },
    Completed { recipe: String },
}

impl ItemOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Completed { .. } | Self::Skipped)
    }

    /// Human-readable reason for a failure.
    pub fn cause(&self) -> Option<&'static str> {
        match self {
            Self::Skipped | Self::Completed { .. } => None,
            Self::ConversionFailed(_) => Some("Failed to convert json to a recipe."),
            Self::NamelessRejected { .. } => Some("Recipe has no name."),
            Self::NoStepsRejected { .. } => Some("Recipe has no steps to attach the image to."),
            Self::UploadFailed(_) => Some("Failed to create image."),
            Self::RecipeCreateFailed(_) => Some("Failed to create recipe."),
            Self::FoodCreateFailed { .. } => Some("Failed to create recipe as food."),
        }
    }

    /// The raw payload behind a failure.
    pub fn details(&self) -> Option<String> {
        match self {
            Self::Skipped | Self::Completed { .. } => None,
            Self::ConversionFailed(payload)
            | Self::UploadFailed(payload)
            | Self::RecipeCreateFailed(payload)
            | Self::FoodCreateFailed { payload, .. } => Some(payload.to_string()),
            Self::NamelessRejected { record } | Self::NoStepsRejected { record } => {
                Some(record.to_string())
            }
        }
    }
}

/// Renders the lines printed for one item.
///
/// `count` is the 1-based position of the item in the batch.
pub fn outcome_lines(
    count: usize,
    total: usize,
    key: &ItemKey,
    outcome: &ItemOutcome,
) -> Vec<String> {
    match outcome {
        ItemOutcome::Skipped => vec![format!(
            "{}/{}: Skipping {}, recipe already created.",
            count, total, key
        )],
        ItemOutcome::Completed { recipe } => vec![format!(
            "{}/{}: Successfully created {} from {}.",
            count, total, recipe, key
        )],
        failure => {
            let mut lines = vec![format!("{}: {}", key, failure.cause().unwrap_or("Failed."))];
            lines.extend(failure.details());
            lines
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemReport {
    pub key: ItemKey,
    pub outcome: ItemOutcome,
}

/// Per-item outcomes of one run, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn completed(&self) -> usize {
        self.items.iter().filter(|r| r.outcome.is_completed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.items
            .iter()
            .filter(|r| r.outcome == ItemOutcome::Skipped)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.items.iter().filter(|r| r.outcome.is_failure()).count()
    }

    pub fn outcome_of(&self, key: &str) -> Option<&ItemOutcome> {
        self.items
            .iter()
            .find(|r| r.key.as_str() == key)
            .map(|r| &r.outcome)
    }
}

/// Drives a batch of items against one server.
pub struct BatchImporter<'a, S: RecipeService> {
    service: &'a S,
    normalizer: &'a TextNormalizer,
    cache: &'a mut ImportCache,
    identity: ServerIdentity,
    create_food: bool,
}

impl<'a, S: RecipeService> BatchImporter<'a, S> {
    pub fn new(
        service: &'a S,
        normalizer: &'a TextNormalizer,
        cache: &'a mut ImportCache,
        identity: ServerIdentity,
    ) -> Self {
        Self {
            service,
            normalizer,
            cache,
            identity,
            create_food: false,
        }
    }

    /// Also create a food entry for every recipe.
    pub fn with_food_entries(mut self, enabled: bool) -> Self {
        self.create_food = enabled;
        self
    }

    /// Processes every item in order.
    pub fn run(&mut self, items: &[ImportItem]) -> Result<BatchReport, AppError> {
        let total = items.len();
        let mut report = BatchReport::default();

        log::info!(
            "Importing {} items into server partition {}",
            total,
            self.identity
        );

        for (index, item) in items.iter().enumerate() {
            let outcome = self.import_item(item)?;

            if let ItemOutcome::Completed { recipe } = &outcome {
                self.remember(item, recipe);
            }

            for line in outcome_lines(index + 1, total, &item.key, &outcome) {
                println!("{}", line);
            }

            report.items.push(ItemReport {
                key: item.key.clone(),
                outcome,
            });
        }

        log::info!(
            "Import finished: {} created, {} skipped, {} failed",
            report.completed(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }

    /// Runs one item to its terminal state.
    pub fn import_item(&self, item: &ImportItem) -> Result<ItemOutcome, AppError> {
        if self.cache.has(&self.identity, &item.key) {
            log::debug!("{} is already imported", item.key);
            return Ok(ItemOutcome::Skipped);
        }

        let image = item.read_image()?;
        let raw_document = item.read_document()?;
        let document = self.normalizer.normalize(&raw_document);

        let mut recipe = match self.service.convert_text_to_recipe(&document)? {
            ApiOutcome::Accepted(recipe) => recipe,
            ApiOutcome::Rejected(payload) => return Ok(ItemOutcome::ConversionFailed(payload)),
        };

        let Some(name) = recipe.display_name().map(str::to_string) else {
            return Ok(ItemOutcome::NamelessRejected {
                record: serde_json::to_value(&recipe)?,
            });
        };
        if recipe.steps.is_empty() {
            return Ok(ItemOutcome::NoStepsRejected {
                record: serde_json::to_value(&recipe)?,
            });
        }

        let attachment = match self
            .service
            .upload_attachment(&name, item.key.as_str(), image)?
        {
            ApiOutcome::Accepted(attachment) => attachment,
            ApiOutcome::Rejected(payload) => return Ok(ItemOutcome::UploadFailed(payload)),
        };
        recipe.attach_to_first_step(attachment);

        let created = match self.service.create_recipe(&recipe) {
            Ok(ApiOutcome::Accepted(created)) => created,
            Ok(ApiOutcome::Rejected(payload)) => {
                return Ok(ItemOutcome::RecipeCreateFailed(payload))
            }
            Err(e) => {
                log::error!("Creating recipe for {} failed: {}", item.key, e);
                return Ok(ItemOutcome::RecipeCreateFailed(
                    ErrorPayload::from_transport(&e),
                ));
            }
        };
        match created.id() {
            Some(id) => log::info!("Created recipe {} ({}) from {}", name, id, item.key),
            None => log::warn!(
                "Created recipe {} from {}, but the server answered without an id: {}",
                name,
                item.key,
                created.0
            ),
        }

        if self.create_food {
            let food = FoodEntry::for_recipe(&created, &name);
            if let ApiOutcome::Rejected(payload) = self.service.create_food_entry(&food)? {
                return Ok(ItemOutcome::FoodCreateFailed {
                    recipe: name,
                    payload,
                });
            }
        }

        Ok(ItemOutcome::Completed { recipe: name })
    }

    fn remember(&mut self, item: &ImportItem, recipe: &str) {
        self.cache
            .record(&self.identity, &item.key, CacheRecord::for_recipe(recipe));
        if let Err(e) = self.cache.flush() {
            log::warn!("Could not persist import cache after {}: {}", item.key, e);
        }
    }
}
