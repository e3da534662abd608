// src/constants.rs
//! Fixed names the importer agrees on with the Tandoor server and with the
//! upstream extraction step that writes the companion JSON files.

// ---------------------------------------------------------------------------
// Tandoor API endpoints (relative to the configured base URL)
// ---------------------------------------------------------------------------

/// Turns raw recipe JSON into a Tandoor recipe record.
pub const ENDPOINT_RECIPE_FROM_SOURCE: &str = "recipe-from-source/";

/// Stores an uploaded file and returns its reference.
pub const ENDPOINT_USER_FILE: &str = "user-file/";

pub const ENDPOINT_RECIPE: &str = "recipe/";

pub const ENDPOINT_FOOD: &str = "food/";

// ---------------------------------------------------------------------------
// Local layout defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Folder holding the recipe photos.
pub const DEFAULT_INPUT_FOLDER: &str = "import";

/// Folder holding the extracted JSON documents, one per photo.
pub const DEFAULT_OUTPUT_FOLDER: &str = "out";

/// Appended to a photo's file stem to find its companion document.
///
/// The extractor names its output after the original `.png` file, so the
/// suffix carries that extension regardless of the photo's own.
pub const DEFAULT_JSON_SUFFIX: &str = ".png.json";

pub const DEFAULT_CACHE_FILE: &str = "caches.json";

pub const LOG_FILE_NAME: &str = "tandoor_import.log";

// ---------------------------------------------------------------------------
// Text repair
// ---------------------------------------------------------------------------

/// Literal corrections applied to every document before conversion.
///
/// Extended at runtime by the `[corrections]` table of the config file.
pub const DEFAULT_CORRECTIONS: &[(&str, &str)] = &[(r"Park\u00ed\u00fur", "Pur Likor")];
