//! Persisted category vocabulary for one-hot encoding.
//!
//! A vocabulary fixes the set of categories per categorical column, and thereby
//! the indicator columns of the feature matrix. Fitting it once and storing it
//! next to a trained model keeps later batches encoded against the same
//! columns.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::error::{AtStage, PipelineError, PipelineResult, Stage};
use crate::core::frame::require_column;

/// Category recorded for null values.
pub const MISSING_CATEGORY: &str = "__missing__";

/// Current on-disk layout of [`CategoryVocabulary`].
pub const VOCABULARY_FORMAT_VERSION: u32 = 1;

/// Name of the indicator column for `category` of `column`.
pub fn indicator_name(column: &str, category: &str) -> String {
    format!("{}_{}", column, category)
}

/// Sorted categories of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    pub format_version: u32,
    pub fitted_at: DateTime<Utc>,
    /// SHA-256 hex of the JSON encoding of `columns`.
    pub fingerprint: String,
    pub columns: Vec<CategoricalColumn>,
}

impl CategoryVocabulary {
    /// Record the sorted distinct categories of each named column of `df`.
    ///
    /// Nulls are recorded as [`MISSING_CATEGORY`].
    pub fn fit(df: &DataFrame, columns: &[&str]) -> PipelineResult<Self> {
        let mut fitted = Vec::with_capacity(columns.len());

        for &name in columns {
            let values = category_values(df, name, Stage::Vocabulary)?;
            let categories: BTreeSet<String> = values
                .str()
                .at_stage(Stage::Vocabulary)?
                .into_iter()
                .map(|v| v.unwrap_or(MISSING_CATEGORY).to_string())
                .collect();

            log::debug!("Fitted {} categories for '{}'", categories.len(), name);
            fitted.push(CategoricalColumn {
                name: name.to_string(),
                categories: categories.into_iter().collect(),
            });
        }

        Self::from_columns(fitted)
    }

    /// Build a vocabulary from explicit category lists, sorting and
    /// deduplicating each list.
    pub fn from_columns(mut columns: Vec<CategoricalColumn>) -> PipelineResult<Self> {
        for column in &mut columns {
            column.categories.sort();
            column.categories.dedup();
        }
        let fingerprint = fingerprint(&columns)?;

        Ok(Self {
            format_version: VOCABULARY_FORMAT_VERSION,
            fitted_at: Utc::now(),
            fingerprint,
            columns,
        })
    }

    /// Names of the categorical columns, in encoding order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.categories.as_slice())
    }

    /// Indicator column names in encoding order.
    pub fn indicator_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|c| c.categories.iter().map(|cat| indicator_name(&c.name, cat)))
            .collect()
    }

    /// One Boolean indicator column per known category.
    ///
    /// Exactly one indicator per categorical column is true on each row. A
    /// value outside the vocabulary is an unknown-category error.
    pub fn encode(&self, df: &DataFrame) -> PipelineResult<Vec<Column>> {
        let mut encoded = Vec::new();

        for column in &self.columns {
            let values = category_values(df, &column.name, Stage::Features)?;
            let values = values.str().at_stage(Stage::Features)?;

            let index: HashMap<&str, usize> = column
                .categories
                .iter()
                .enumerate()
                .map(|(i, cat)| (cat.as_str(), i))
                .collect();
            let mut indicators = vec![vec![false; df.height()]; column.categories.len()];

            for (row, value) in values.into_iter().enumerate() {
                let value = value.unwrap_or(MISSING_CATEGORY);
                let position =
                    index
                        .get(value)
                        .copied()
                        .ok_or_else(|| PipelineError::UnknownCategory {
                            stage: Stage::Features,
                            column: column.name.clone(),
                            value: value.to_string(),
                        })?;
                indicators[position][row] = true;
            }

            encoded.extend(
                column
                    .categories
                    .iter()
                    .zip(indicators)
                    .map(|(cat, flags)| {
                        Column::new(indicator_name(&column.name, cat).into(), flags)
                    }),
            );
        }

        Ok(encoded)
    }

    /// Write the vocabulary as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| PipelineError::io(path, e))?;
        log::info!(
            "Saved category vocabulary {} to {}",
            &self.fingerprint[..12.min(self.fingerprint.len())],
            path.display()
        );
        Ok(())
    }

    pub fn load(path: &Path) -> PipelineResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let vocabulary = Self::from_json_str(&content)?;
        log::info!(
            "Loaded category vocabulary fitted at {} from {}",
            vocabulary.fitted_at,
            path.display()
        );
        Ok(vocabulary)
    }

    /// Parse and verify a stored vocabulary.
    ///
    /// Malformed documents name the offending JSON path. Unknown format
    /// versions, unsorted category lists and fingerprint mismatches are
    /// rejected.
    pub fn from_json_str(content: &str) -> PipelineResult<Self> {
        let deserializer = &mut serde_json::Deserializer::from_str(content);
        let vocabulary: Self = serde_path_to_error::deserialize(deserializer).map_err(|e| {
            PipelineError::Configuration(format!(
                "Invalid category vocabulary at '{}': {}",
                e.path(),
                e.inner()
            ))
        })?;

        if vocabulary.format_version != VOCABULARY_FORMAT_VERSION {
            return Err(PipelineError::Configuration(format!(
                "Unsupported category vocabulary format version {} (expected {})",
                vocabulary.format_version, VOCABULARY_FORMAT_VERSION
            )));
        }

        for column in &vocabulary.columns {
            if column.categories.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(PipelineError::Configuration(format!(
                    "Categories of '{}' are not sorted and unique",
                    column.name
                )));
            }
        }

        let expected = fingerprint(&vocabulary.columns)?;
        if expected != vocabulary.fingerprint {
            return Err(PipelineError::Configuration(format!(
                "Category vocabulary fingerprint mismatch: stored {}, computed {}",
                vocabulary.fingerprint, expected
            )));
        }

        Ok(vocabulary)
    }
}

fn fingerprint(columns: &[CategoricalColumn]) -> PipelineResult<String> {
    let content = serde_json::to_string(columns)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn category_values(df: &DataFrame, name: &str, stage: Stage) -> PipelineResult<Column> {
    require_column(df, name, stage)?
        .cast(&DataType::String)
        .at_stage(stage)
}
