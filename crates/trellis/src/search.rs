//! Depth-first search over a graphical tree.
//!
//! The tree is strict (no sharing, no cycles), so the walk needs no visited
//! set.

use trellis_core::{
    diagram::{DiagramElement, DiagramTree, ElementKind},
    identifier::{DescriptionId, ElementId, Id},
};

/// First node bound to `semantic_id`, children before border children.
pub fn find_bound_element(tree: &DiagramTree, semantic_id: Id) -> Option<&DiagramElement> {
    fn walk(elements: &[DiagramElement], semantic_id: Id) -> Option<&DiagramElement> {
        for element in elements {
            if element.semantic_id() == semantic_id {
                return Some(element);
            }
            if let Some(found) = walk(element.children(), semantic_id)
                .or_else(|| walk(element.border_children(), semantic_id))
            {
                return Some(found);
            }
        }
        None
    }

    walk(tree.nodes(), semantic_id)
}

/// Every node bound to `semantic_id`, in depth-first order.
pub fn find_bound_nodes(tree: &DiagramTree, semantic_id: Id) -> Vec<&DiagramElement> {
    tree.descendants()
        .into_iter()
        .filter(|element| element.is_node() && element.semantic_id() == semantic_id)
        .collect()
}

/// Edge bound to `semantic_id` from `description_id` between `source` and
/// `target`.
pub fn find_edge(
    tree: &DiagramTree,
    semantic_id: Id,
    description_id: DescriptionId,
    source: ElementId,
    target: ElementId,
) -> Option<&DiagramElement> {
    tree.edges().iter().find(|edge| {
        edge.semantic_id() == semantic_id
            && edge.description_id() == description_id
            && edge.kind() == ElementKind::Edge { source, target }
    })
}

/// First node bound to `semantic_id` that was created from `description_id`.
pub fn find_view(
    tree: &DiagramTree,
    semantic_id: Id,
    description_id: DescriptionId,
) -> Option<&DiagramElement> {
    tree.descendants().into_iter().find(|element| {
        element.is_node()
            && element.semantic_id() == semantic_id
            && element.description_id() == description_id
    })
}

/// The element with exactly this `(parent, description, semantic)` triple,
/// edges included.
pub fn find_by_triple(
    tree: &DiagramTree,
    parent: Option<ElementId>,
    description_id: DescriptionId,
    semantic_id: Id,
) -> Option<&DiagramElement> {
    tree.descendants()
        .into_iter()
        .find(|element| element.triple() == (parent, description_id, semantic_id))
}
