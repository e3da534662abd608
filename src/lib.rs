// src/lib.rs
//! tandoor-import library — adds recipes extracted from photos to a Tandoor server.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling** — `AppError`, `ValidationError`
//! - **Configuration** — `CommandLineInput`, `ConfigFile`, `ImportConfig`
//! - **Domain types** — `ApiToken`, `ServerUrl`, `ItemKey`, `ServerIdentity`
//! - **Text repair** — `TextNormalizer`, `RepairRule`, `Corrections`
//! - **API client** — `RecipeService`, `TandoorClient`, wire types
//! - **Import cache** — `ImportCache`, `CacheRecord`
//! - **Batch import** — `InputLayout`, `ImportItem`, `BatchImporter`, `ItemOutcome`

pub mod api;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod input;
pub mod normalize;
pub mod pipeline;
pub mod types;

// --- Error Handling ---
pub use crate::error::AppError;
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, ConfigFile, ImportConfig};

// --- Domain Types ---
pub use crate::types::{ApiToken, ItemKey, ServerIdentity, ServerUrl};

// --- Text Repair ---
pub use crate::normalize::{Corrections, RepairRule, TextNormalizer};

// --- API Client ---
pub use crate::api::{
    ApiOutcome, AttachmentRef, CreatedRecipe, ErrorPayload, FoodEntry, RecipeDocument,
    RecipeService, RecipeStep, TandoorClient,
};

// --- Import Cache ---
pub use crate::cache::{CacheRecord, ImportCache};

// --- Batch Import ---
pub use crate::input::{ImportItem, InputLayout};
pub use crate::pipeline::{outcome_lines, BatchImporter, BatchReport, ItemOutcome, ItemReport};
