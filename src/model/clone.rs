use super::{Block, BlockGroup, ContentModelDocument, Segment};
use crate::dom::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CachedElementKind {
    /// DOM element cached on a paragraph, table, row, cell, divider or container.
    Cache,
    General,
    Entity,
}

/// Decides which DOM handle a cloned node carries.
///
/// Returning `None` drops a cache handle. General and Entity nodes cannot live
/// without their handle, so for them `None` keeps the source handle.
pub type CachedElementPolicy<'a> = &'a mut dyn FnMut(NodeId, CachedElementKind) -> Option<NodeId>;

/// Deep-clones `document`. Without a policy, cache handles are dropped and
/// General/Entity handles are shared with the source tree.
pub fn clone_model(
    document: &ContentModelDocument,
    policy: Option<CachedElementPolicy<'_>>,
) -> ContentModelDocument {
    let mut default_policy = |node: NodeId, kind: CachedElementKind| match kind {
        CachedElementKind::Cache => None,
        CachedElementKind::General | CachedElementKind::Entity => Some(node),
    };
    let policy: CachedElementPolicy<'_> = match policy {
        Some(policy) => policy,
        None => &mut default_policy,
    };

    let mut cloned = document.clone();
    apply_to_blocks(&mut cloned.blocks, policy);
    cloned
}

fn cache(handle: &mut Option<NodeId>, policy: &mut dyn FnMut(NodeId, CachedElementKind) -> Option<NodeId>) {
    *handle = handle.and_then(|node| policy(node, CachedElementKind::Cache));
}

fn required(
    handle: &mut NodeId,
    kind: CachedElementKind,
    policy: &mut dyn FnMut(NodeId, CachedElementKind) -> Option<NodeId>,
) {
    if let Some(node) = policy(*handle, kind) {
        *handle = node;
    }
}

fn apply_to_blocks(
    blocks: &mut [Block],
    policy: &mut dyn FnMut(NodeId, CachedElementKind) -> Option<NodeId>,
) {
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => {
                cache(&mut paragraph.cached_element, policy);
                for segment in &mut paragraph.segments {
                    match segment {
                        Segment::General(general) => {
                            required(&mut general.element, CachedElementKind::General, policy)
                        }
                        Segment::Entity(entity) => {
                            required(&mut entity.wrapper, CachedElementKind::Entity, policy)
                        }
                        _ => {}
                    }
                }
            }
            Block::Table(table) => {
                cache(&mut table.cached_element, policy);
                for row in &mut table.rows {
                    cache(&mut row.cached_element, policy);
                    for cell in &mut row.cells {
                        cache(&mut cell.cached_element, policy);
                        apply_to_blocks(&mut cell.blocks, policy);
                    }
                }
            }
            Block::Divider(divider) => cache(&mut divider.cached_element, policy),
            Block::Entity(entity) => required(&mut entity.wrapper, CachedElementKind::Entity, policy),
            Block::BlockGroup(BlockGroup::FormatContainer(container)) => {
                cache(&mut container.cached_element, policy);
                apply_to_blocks(&mut container.blocks, policy);
            }
            Block::BlockGroup(BlockGroup::ListItem(item)) => {
                cache(&mut item.cached_element, policy);
                apply_to_blocks(&mut item.blocks, policy);
            }
            Block::BlockGroup(BlockGroup::General(general)) => {
                required(&mut general.element, CachedElementKind::General, policy);
                apply_to_blocks(&mut general.blocks, policy);
            }
        }
    }
}
