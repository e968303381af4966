//! Data model for the search protocol
//!
//! The remote endpoint speaks the usual searchable-dropdown contract:
//! `GET <base>?search=<term>&page=<n>` returning
//! `{ "results": [{ "id": ..., "text": ... }], "pagination": { "more": bool } }`.
//! Parsing here is deliberately tolerant: ids may be numbers or strings,
//! unknown fields are ignored, and entries without a usable id are skipped
//! rather than failing the whole page.

use serde::{Deserialize, Serialize};

use crate::error::SelectError;

/// A single selectable option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionItem {
    /// Unique identifier within a result page
    pub value: String,
    /// Human-readable label shown in the dropdown
    pub label: String,
}

impl OptionItem {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// One search dispatched on behalf of the widget.
/// Ephemeral - constructed per keystroke or page scroll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// The term the user typed (may be empty for "show everything")
    pub term: String,
    /// 1-based page number
    pub page: u32,
}

impl SearchRequest {
    pub fn new(term: impl Into<String>, page: u32) -> Self {
        Self {
            term: term.into(),
            page: page.max(1),
        }
    }
}

/// One page of search results plus the pagination cursor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchPage {
    /// Options in the order the source returned them
    pub results: Vec<OptionItem>,
    /// Whether scrolling should request the next page
    pub has_more: bool,
}

impl SearchPage {
    /// The degraded page rendered when a fetch fails: nothing to show,
    /// nothing more to load, widget never stuck in a loading state.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Raw remote payload shape. Extra fields at any level are tolerated;
/// a missing `pagination` block means "no more pages".
#[derive(Debug, Deserialize)]
struct RawPayload {
    #[serde(default)]
    results: Vec<serde_json::Value>,
    #[serde(default)]
    pagination: RawPagination,
}

#[derive(Debug, Default, Deserialize)]
struct RawPagination {
    #[serde(default)]
    more: bool,
}

impl SearchPage {
    /// Parse a remote JSON payload into a result page.
    ///
    /// Label resolution per entry: `text` first (the wire contract's own
    /// label key), then `label_field` (configurable, default `"name"`),
    /// falling back to the id itself so an option is never rendered blank.
    pub fn from_json(body: &str, label_field: &str) -> Result<Self, SelectError> {
        let raw: RawPayload = serde_json::from_str(body)
            .map_err(|e| SelectError::Parse(format!("invalid result payload: {}", e)))?;

        let mut results = Vec::with_capacity(raw.results.len());
        for entry in &raw.results {
            match parse_entry(entry, label_field) {
                Some(option) => results.push(option),
                None => {
                    tracing::debug!("Skipping result entry without usable id: {}", entry);
                }
            }
        }

        Ok(Self {
            results,
            has_more: raw.pagination.more,
        })
    }
}

/// Extract one option from a raw result entry, or None if it has no id
fn parse_entry(entry: &serde_json::Value, label_field: &str) -> Option<OptionItem> {
    let id = scalar_to_string(entry.get("id")?)?;

    let label = entry
        .get("text")
        .and_then(scalar_to_string)
        .or_else(|| entry.get(label_field).and_then(scalar_to_string))
        .unwrap_or_else(|| id.clone());

    Some(OptionItem { value: id, label })
}

/// Accept string and number scalars as identifiers/labels
fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
