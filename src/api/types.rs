// src/api/types.rs
//! Wire types exchanged with the Tandoor API.
//!
//! Only the fields the importer touches are typed. Everything else the
//! server sends is kept in `extra` and written back unchanged, so a recipe
//! survives the round trip through this crate without losing data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of the `recipe-from-source/` call.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRequest<'a> {
    pub data: &'a str,
}

/// Successful answer of `recipe-from-source/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertedSource {
    pub recipe_json: RecipeDocument,
}

/// A recipe record as produced by conversion and submitted for creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub steps: Vec<RecipeStep>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecipeDocument {
    /// The recipe name exactly as converted, unless missing or empty.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// Attaches an uploaded file to the first step.
    ///
    /// Returns `false` when the recipe has no steps to attach to.
    pub fn attach_to_first_step(&mut self, attachment: AttachmentRef) -> bool {
        match self.steps.first_mut() {
            Some(step) => {
                step.file = Some(attachment);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<AttachmentRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Server-assigned handle of an uploaded file.
///
/// Opaque to the importer: the body returned by `user-file/` is stored
/// as-is and embedded verbatim in the recipe's first step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentRef(pub Value);

/// Body returned by `recipe/` after creation.
///
/// The server said 201, so the recipe exists whatever this body looks like.
/// `id` and `name` are read from it when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatedRecipe(pub Value);

impl CreatedRecipe {
    pub fn id(&self) -> Option<&Value> {
        self.0.get("id").filter(|id| !id.is_null())
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }
}

/// Body of the `food/` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub name: String,
    pub recipe: RecipeLink,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLink {
    pub id: Value,
    pub name: String,
}

impl FoodEntry {
    /// A food named after the recipe (lower-cased) that links back to it.
    ///
    /// Uses the name the server stored, or `fallback_name` when the
    /// creation answer carried none.
    pub fn for_recipe(recipe: &CreatedRecipe, fallback_name: &str) -> Self {
        let name = recipe.name().unwrap_or(fallback_name);
        Self {
            name: name.to_lowercase(),
            recipe: RecipeLink {
                id: recipe.id().cloned().unwrap_or(Value::Null),
                name: name.to_string(),
            },
        }
    }
}
