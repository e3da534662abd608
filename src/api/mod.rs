// src/api/mod.rs
//! Tandoor API interaction — the four remote calls an import needs.
//!
//! Business logic depends on the [`RecipeService`] trait, never on HTTP
//! details. Every call separates two kinds of failure: the server saying
//! no (an [`ApiOutcome::Rejected`] carrying its payload) and the request
//! never completing (an `Err`).

pub mod client;
pub mod types;

use crate::error::AppError;
use serde_json::Value;
use std::fmt;

pub use client::TandoorClient;
pub use types::{AttachmentRef, CreatedRecipe, FoodEntry, RecipeDocument, RecipeStep};

/// Result of a request the server answered.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
    Accepted(T),
    Rejected(ErrorPayload),
}

impl<T> ApiOutcome<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiOutcome<U> {
        match self {
            Self::Accepted(value) => ApiOutcome::Accepted(f(value)),
            Self::Rejected(payload) => ApiOutcome::Rejected(payload),
        }
    }

    pub fn into_result(self) -> Result<T, ErrorPayload> {
        match self {
            Self::Accepted(value) => Ok(value),
            Self::Rejected(payload) => Err(payload),
        }
    }
}

/// What the server sent back with a refusal.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPayload {
    /// The body was JSON.
    Json { status: u16, body: Value },
    /// The body was something else (HTML error page, plain text, empty).
    Raw { status: u16, body: String },
    /// The request never got an answer.
    Transport { message: String },
}

impl ErrorPayload {
    /// Classifies a response body by whether it parses as JSON.
    pub fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(json) => Self::Json { status, body: json },
            Err(_) => Self::Raw {
                status,
                body: body.to_string(),
            },
        }
    }

    pub fn from_transport(error: &AppError) -> Self {
        Self::Transport {
            message: error.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Json { status, .. } | Self::Raw { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { status, body } => write!(f, "HTTP {}: {}", status, body),
            Self::Raw { status, body } if body.is_empty() => {
                write!(f, "HTTP {}: <empty body>", status)
            }
            Self::Raw { status, body } => write!(f, "HTTP {}: {}", status, body),
            Self::Transport { message } => write!(f, "{}", message),
        }
    }
}

/// The ability to turn extracted recipe text into recipes on a server.
pub trait RecipeService {
    /// Posts normalized recipe JSON to `recipe-from-source/` (expects 200).
    fn convert_text_to_recipe(
        &self,
        document: &str,
    ) -> Result<ApiOutcome<RecipeDocument>, AppError>;

    /// Uploads a file to `user-file/` as multipart form data (expects 201).
    fn upload_attachment(
        &self,
        display_name: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ApiOutcome<AttachmentRef>, AppError>;

    /// Creates the recipe via `recipe/` (expects 201).
    fn create_recipe(&self, recipe: &RecipeDocument)
        -> Result<ApiOutcome<CreatedRecipe>, AppError>;

    /// Creates a food linked to a recipe via `food/` (expects 201).
    fn create_food_entry(&self, food: &FoodEntry) -> Result<ApiOutcome<Value>, AppError>;
}
