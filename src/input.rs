// src/input.rs
//! Import items: one recipe photo plus the JSON document extracted from it.
//!
//! Photos live in the input folder. Each photo's document lives in the
//! output folder under the photo's file stem plus a fixed suffix.

use crate::error::AppError;
use crate::types::ItemKey;
use std::fs;
use std::path::{Path, PathBuf};

/// A photo and its companion document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    pub key: ItemKey,
    pub image_path: PathBuf,
    pub document_path: PathBuf,
}

impl ImportItem {
    /// Reads the photo; a missing file is an error, not a skip.
    pub fn read_image(&self) -> Result<Vec<u8>, AppError> {
        fs::read(&self.image_path).map_err(|source| AppError::InputFile {
            path: self.image_path.clone(),
            source,
        })
    }

    pub fn read_document(&self) -> Result<String, AppError> {
        fs::read_to_string(&self.document_path).map_err(|source| AppError::InputFile {
            path: self.document_path.clone(),
            source,
        })
    }
}

/// Where photos and documents are found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLayout {
    input_folder: PathBuf,
    output_folder: PathBuf,
    json_suffix: String,
}

impl InputLayout {
    pub fn new(
        input_folder: impl Into<PathBuf>,
        output_folder: impl Into<PathBuf>,
        json_suffix: impl Into<String>,
    ) -> Self {
        Self {
            input_folder: input_folder.into(),
            output_folder: output_folder.into(),
            json_suffix: json_suffix.into(),
        }
    }

    /// Path of the document extracted from the photo named `key`.
    pub fn companion_path(&self, key: &ItemKey) -> PathBuf {
        let stem = Path::new(key.as_str())
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.as_str().to_string());
        self.output_folder
            .join(format!("{}{}", stem, self.json_suffix))
    }

    pub fn item(&self, key: ItemKey) -> ImportItem {
        ImportItem {
            image_path: self.input_folder.join(key.as_str()),
            document_path: self.companion_path(&key),
            key,
        }
    }

    /// Lists the photos in the input folder, sorted by file name.
    ///
    /// Subdirectories, hidden files and names that are not valid UTF-8 or
    /// not usable as an item key are left out.
    pub fn list_items(&self) -> Result<Vec<ImportItem>, AppError> {
        let entries = fs::read_dir(&self.input_folder).map_err(|source| AppError::InputFile {
            path: self.input_folder.clone(),
            source,
        })?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                log::warn!(
                    "Skipping {}: file name is not valid UTF-8",
                    entry.path().display()
                );
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            match ItemKey::new(name) {
                Ok(key) => keys.push(key),
                Err(e) => log::warn!("Skipping {}: {}", entry.path().display(), e),
            }
        }

        keys.sort();
        log::debug!(
            "Found {} photos in {}",
            keys.len(),
            self.input_folder.display()
        );
        Ok(keys.into_iter().map(|key| self.item(key)).collect())
    }
}
