//! Typed editing metadata kept as JSON in a node's dataset.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Dataset, ListLevel, Table, TableCell};
use crate::error::MetadataError;

pub const EDITING_INFO_KEY: &str = "editingInfo";

pub trait WithDataset {
    fn dataset(&self) -> &Dataset;
    fn dataset_mut(&mut self) -> &mut Dataset;
}

impl WithDataset for Table {
    fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }
}

impl WithDataset for TableCell {
    fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }
}

impl WithDataset for ListLevel {
    fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }
}

/// A metadata shape with its own value checks on top of the JSON schema.
pub trait Metadata: Serialize + DeserializeOwned {
    fn validate(&self) -> Result<(), MetadataError> {
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TableMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_border_color: Option<String>,
    #[serde(default)]
    pub has_header_row: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_row_color: Option<String>,
    #[serde(default)]
    pub has_first_column: bool,
    #[serde(default)]
    pub has_banded_rows: bool,
    #[serde(default)]
    pub has_banded_columns: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color_even: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color_odd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_border_format: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<String>,
}

impl Metadata for TableMetadata {
    fn validate(&self) -> Result<(), MetadataError> {
        match self.vertical_align.as_deref() {
            None | Some("top" | "middle" | "bottom") => Ok(()),
            Some(align) => Err(MetadataError::InvalidValue {
                field: "verticalAlign",
                reason: format!("expected top, middle or bottom, got {align:?}"),
            }),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_style_type: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unordered_style_type: Option<u8>,
    #[serde(default)]
    pub apply_list_style_from_level: bool,
}

impl Metadata for ListMetadata {
    fn validate(&self) -> Result<(), MetadataError> {
        for (field, value) in [
            ("orderedStyleType", self.ordered_style_type),
            ("unorderedStyleType", self.unordered_style_type),
        ] {
            if value == Some(0) {
                return Err(MetadataError::InvalidValue {
                    field,
                    reason: "style types start at 1".to_string(),
                });
            }
        }
        Ok(())
    }
}

pub fn parse_metadata<T: Metadata>(json: &str) -> Result<T, MetadataError> {
    let value: T = serde_json::from_str(json)?;
    value.validate()?;
    Ok(value)
}

/// Stored metadata, or `None` when it is missing or does not validate.
pub fn get_metadata<T: Metadata>(target: &impl WithDataset) -> Option<T> {
    let json = target.dataset().get(EDITING_INFO_KEY)?;
    match parse_metadata(json) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!("ignoring stored metadata: {err}");
            None
        }
    }
}

/// Passes the current metadata to `callback` and stores what it returns;
/// returning `None` removes the metadata.
pub fn update_metadata<T, F>(target: &mut impl WithDataset, callback: F) -> Option<T>
where
    T: Metadata + Clone,
    F: FnOnce(Option<T>) -> Option<T>,
{
    let updated = callback(get_metadata(&*target));
    match &updated {
        Some(value) => match serde_json::to_string(value) {
            Ok(json) => {
                target.dataset_mut().insert(EDITING_INFO_KEY.to_string(), json);
            }
            Err(err) => tracing::warn!("failed to serialize metadata: {err}"),
        },
        None => {
            target.dataset_mut().remove(EDITING_INFO_KEY);
        }
    }
    updated
}

/// Parses user-supplied metadata, turning any failure into a message for display.
pub fn validate_metadata_input<T: Metadata>(input: &str) -> Result<T, String> {
    parse_metadata(input).map_err(|err| err.to_string())
}
