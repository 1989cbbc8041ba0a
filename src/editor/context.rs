use crate::event::{ChangeSource, EntityOperation};
use crate::model::{Entity, Format, Image};

#[derive(Clone, Debug, PartialEq)]
pub struct DeletedEntity {
    pub entity: Entity,
    pub operation: EntityOperation,
}

/// Handed to a formatter together with the model. Everything starts out empty
/// and the formatter appends what it did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormatContentModelContext {
    pub new_entities: Vec<Entity>,
    pub deleted_entities: Vec<DeletedEntity>,
    pub new_images: Vec<Image>,
    /// Don't record an undo snapshot for this change; it will be folded into
    /// the next one.
    pub skip_undo_snapshot: bool,
    /// Drop the cached model after writing it back instead of keeping it.
    pub clear_model_cache: bool,
    /// Format the next typed characters should get.
    pub new_pending_format: Option<Format>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormatContentModelOptions {
    pub api_name: Option<String>,
    /// Defaults to [`ChangeSource::Format`].
    pub change_source: Option<ChangeSource>,
    pub skip_undo_snapshot: bool,
    /// Backspace right after this change reverts it.
    pub can_undo_by_backspace: bool,
}

impl FormatContentModelOptions {
    pub fn api(name: &str) -> Self {
        Self {
            api_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: ChangeSource) -> Self {
        self.change_source = Some(source);
        self
    }
}
