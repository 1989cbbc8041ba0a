//! Content Model engine of a structured rich-text editor.
//!
//! The editable DOM is mirrored by a [`model::ContentModelDocument`] tree.
//! Formatting goes through [`editor::EditorCore::format_content_model`], which
//! mutates the model, writes it back to the DOM and records undo snapshots. The
//! DOM itself stays with the host behind [`dom::EditorHost`].

pub mod delete;
pub mod dom;
pub mod editor;
pub mod error;
pub mod event;
pub mod model;
pub mod options;
pub mod selection;
pub mod snapshots;

#[cfg(test)]
mod testing;
