//! Editor construction options.

use serde::{Deserialize, Serialize};

use crate::error::OptionsError;
use crate::model::Format;
use crate::model::metadata::ListMetadata;
use crate::snapshots::DEFAULT_MAX_SNAPSHOT_SIZE;

/// Options forwarded to the DOM to Model deriver on every derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomToModelOptions {
    /// Let the deriver normalize tables (span detection, width measuring).
    #[serde(default = "default_true")]
    pub table_pre_processing: bool,
    /// Metadata applied to list levels that carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_metadata_defaults: Option<ListMetadata>,
    /// Record DOM elements on the derived nodes so projection can reuse them.
    #[serde(default = "default_true")]
    pub allow_cache_element: bool,
}

impl Default for DomToModelOptions {
    fn default() -> Self {
        Self {
            table_pre_processing: true,
            list_metadata_defaults: None,
            allow_cache_element: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorOptions {
    #[serde(default = "default_max_snapshot_size")]
    pub max_snapshot_size: usize,
    /// Keep the last model around between events instead of deriving every time.
    #[serde(default = "default_true")]
    pub cache_model: bool,
    #[serde(default)]
    pub is_mac: bool,
    #[serde(default)]
    pub in_dark_mode: bool,
    #[serde(default)]
    pub allowed_custom_paste_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_segment_format: Option<Format>,
    #[serde(default)]
    pub dom_to_model: DomToModelOptions,
}

fn default_true() -> bool {
    true
}

fn default_max_snapshot_size() -> usize {
    DEFAULT_MAX_SNAPSHOT_SIZE
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            max_snapshot_size: default_max_snapshot_size(),
            cache_model: true,
            is_mac: false,
            in_dark_mode: false,
            allowed_custom_paste_types: Vec::new(),
            default_segment_format: None,
            dom_to_model: DomToModelOptions::default(),
        }
    }
}

impl EditorOptions {
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        let options: EditorOptions = serde_json::from_str(json)?;
        if options.max_snapshot_size == 0 {
            return Err(OptionsError::ZeroSnapshotSize);
        }
        tracing::debug!(
            max_snapshot_size = options.max_snapshot_size,
            cache_model = options.cache_model,
            "loaded editor options"
        );
        Ok(options)
    }
}
