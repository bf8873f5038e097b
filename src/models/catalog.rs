//! Channel catalog tree
//!
//! The catalog is a JSON object mapping category names to arrays of channel
//! objects (`{ "name": ..., "childItems": [ { "url": ... }, ... ] }`). Any
//! top-level value that is not an array is carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

use crate::errors::{AppError, AppResult};

pub const CHILD_ITEMS_KEY: &str = "childItems";
pub const CHANNEL_NAME_KEY: &str = "name";
pub const SOURCE_URL_KEY: &str = "url";
pub const LAST_UPDATED_KEY: &str = "last_updated";
pub const CHECK_SUMMARY_KEY: &str = "check_summary";

/// Aggregate counts recorded alongside the filtered catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub categories: usize,
    pub channels: usize,
    pub checked_sources: usize,
    pub valid_sources: usize,
    pub invalid_sources: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    root: Map<String, Value>,
}

impl Catalog {
    pub fn from_value(value: Value) -> AppResult<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(AppError::catalog(
                "<memory>",
                format!("expected a JSON object at the top level, found {}", json_kind(&other)),
            )),
        }
    }

    pub fn from_json_str(contents: &str) -> AppResult<Self> {
        Self::from_value(serde_json::from_str(contents)?)
    }

    pub async fn read_from_path(path: &Path) -> AppResult<Self> {
        let shown = path.display().to_string();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::catalog(&shown, format!("failed to read: {e}")))?;
        let value: Value = serde_json::from_str(&contents)
            .map_err(|e| AppError::catalog(&shown, format!("invalid JSON: {e}")))?;
        let catalog = Self::from_value(value).map_err(|e| match e {
            AppError::Catalog { message, .. } => AppError::catalog(&shown, message),
            other => other,
        })?;
        debug!(
            "Read catalog from {} ({} categories)",
            shown,
            catalog.category_names().len()
        );
        Ok(catalog)
    }

    /// Write the catalog as pretty JSON, creating parent directories as needed
    pub async fn write_to_path(&self, path: &Path) -> AppResult<()> {
        let shown = path.display().to_string();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::catalog(&shown, format!("failed to create directory: {e}"))
                })?;
            }
        }
        let contents = serde_json::to_string_pretty(&self.root)?;
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| AppError::catalog(&shown, format!("failed to write: {e}")))?;
        Ok(())
    }

    /// Names of top-level entries holding a channel array, in document order
    pub fn category_names(&self) -> Vec<String> {
        self.root
            .iter()
            .filter(|(_, value)| value.is_array())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn category(&self, name: &str) -> Option<&Vec<Value>> {
        self.root.get(name).and_then(Value::as_array)
    }

    pub fn category_mut(&mut self, name: &str) -> Option<&mut Vec<Value>> {
        self.root.get_mut(name).and_then(Value::as_array_mut)
    }

    pub fn set_metadata(&mut self, last_updated: String, summary: &CheckSummary) -> AppResult<()> {
        self.root
            .insert(LAST_UPDATED_KEY.to_string(), Value::String(last_updated));
        self.root
            .insert(CHECK_SUMMARY_KEY.to_string(), serde_json::to_value(summary)?);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }
}

/// Name of a channel object, falling back to a positional label
pub fn channel_name(channel: &Value, position: usize) -> String {
    channel
        .get(CHANNEL_NAME_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{position}"))
}

/// URL of a source descriptor, if it has a string `url`
pub fn descriptor_url(descriptor: &Value) -> Option<&str> {
    descriptor.get(SOURCE_URL_KEY).and_then(Value::as_str)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
