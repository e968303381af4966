// Per-control configuration for the select binding layer
//
// A config fully describes one enhanced control. Re-initializing a control
// with a new config replaces the previous configuration outright - nothing
// is merged or carried over from the prior instance.

use serde::Deserialize;
use std::time::Duration;

use crate::error::SelectError;
use crate::options::OptionItem;

/// Delay between the last keystroke and the dispatched search request
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Configuration for one select control
#[derive(Debug, Clone, Deserialize)]
pub struct SelectConfig {
    /// Identifier of the control element being enhanced
    pub control_id: String,

    /// Remote search endpoint. When present, options are fetched with
    /// `GET <remote_url>?search=<term>&page=<n>`. When absent, the widget
    /// is backed by the static `options` list and makes no network calls.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Bind the selection to the reactive-model key declared on the element
    /// instead of the element's own id
    #[serde(default)]
    pub use_reactive_binding: bool,

    /// Field used as the option label when the payload carries no `text`
    #[serde(default = "default_label_field")]
    pub option_label_field: String,

    /// Option injected ahead of the result set and shown as selected
    #[serde(default)]
    pub preselected: Option<OptionItem>,

    /// Static option list, used only when `remote_url` is absent
    #[serde(default)]
    pub options: Vec<OptionItem>,

    /// Debounce delay in milliseconds (default: 250)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_label_field() -> String {
    "name".to_string()
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            control_id: String::new(),
            remote_url: None,
            use_reactive_binding: false,
            option_label_field: default_label_field(),
            preselected: None,
            options: Vec::new(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

// Convenience constructors for programmatic setup and tests
impl SelectConfig {
    /// Config for a remotely-populated control
    pub fn remote(control_id: impl Into<String>, remote_url: impl Into<String>) -> Self {
        Self {
            control_id: control_id.into(),
            remote_url: Some(remote_url.into()),
            ..Default::default()
        }
    }

    /// Config for a control backed by a static option list
    pub fn local(control_id: impl Into<String>, options: Vec<OptionItem>) -> Self {
        Self {
            control_id: control_id.into(),
            options,
            ..Default::default()
        }
    }

    /// The debounce delay as a `Duration`
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Check that the config can identify a control at all.
    /// Host-side attachment failures are caught separately at initialize.
    pub fn validate(&self) -> Result<(), SelectError> {
        if self.control_id.trim().is_empty() {
            return Err(SelectError::Configuration(
                "control id is empty".to_string(),
            ));
        }
        if let Some(url) = &self.remote_url {
            if url.trim().is_empty() {
                return Err(SelectError::Configuration(format!(
                    "remote url for control '{}' is empty",
                    self.control_id
                )));
            }
        }
        Ok(())
    }
}
