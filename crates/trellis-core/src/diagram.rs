//! Per-document graphical tree.
//!
//! A [`DiagramTree`] is the structure the projection engine keeps consistent
//! with the semantic model. It is a strict tree: every node element has one
//! parent (another node or the diagram itself) and owns its children and
//! border children. Edge elements live at diagram level and reference their
//! source and target elements by id.
//!
//! Elements are never mutated in place. All changes go through the
//! [`GraphicalMutation`] boundary, which appends or removes whole elements.

use std::{collections::HashSet, fmt};

use log::trace;
use thiserror::Error;

use crate::identifier::{DescriptionId, ElementId, Id};

/// Slot a node element occupies under its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContainmentKind {
    /// Regular child, laid out inside the parent.
    #[default]
    Child,
    /// Border node, attached to the parent's outline.
    Border,
}

impl fmt::Display for ContainmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Child => write!(f, "child"),
            Self::Border => write!(f, "border"),
        }
    }
}

/// Whether a diagram element is a node or an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Edge { source: ElementId, target: ElementId },
}

/// One node or edge of a graphical tree, bound to a semantic element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramElement {
    id: ElementId,
    description_id: DescriptionId,
    semantic_id: Id,
    parent_id: Option<ElementId>,
    containment: ContainmentKind,
    kind: ElementKind,
    children: Vec<DiagramElement>,
    border_children: Vec<DiagramElement>,
}

impl DiagramElement {
    fn new(
        description_id: DescriptionId,
        semantic_id: Id,
        parent_id: Option<ElementId>,
        containment: ContainmentKind,
        kind: ElementKind,
    ) -> Self {
        Self {
            id: ElementId::random(),
            description_id,
            semantic_id,
            parent_id,
            containment,
            kind,
            children: Vec::new(),
            border_children: Vec::new(),
        }
    }

    /// Get the element identifier.
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Get the id of the mapping description this element was created from.
    pub fn description_id(&self) -> DescriptionId {
        self.description_id
    }

    /// Get the id of the bound semantic element.
    pub fn semantic_id(&self) -> Id {
        self.semantic_id
    }

    /// Get the parent element id, `None` for top-level elements.
    pub fn parent_id(&self) -> Option<ElementId> {
        self.parent_id
    }

    /// Get the containment slot of this element.
    pub fn containment(&self) -> ContainmentKind {
        self.containment
    }

    /// Get the element kind.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Returns `true` for node elements.
    pub fn is_node(&self) -> bool {
        matches!(self.kind, ElementKind::Node)
    }

    /// Borrow the regular children.
    pub fn children(&self) -> &[DiagramElement] {
        &self.children
    }

    /// Borrow the border children.
    pub fn border_children(&self) -> &[DiagramElement] {
        &self.border_children
    }

    /// Iterate over children then border children.
    pub fn all_children(&self) -> impl Iterator<Item = &DiagramElement> {
        self.children.iter().chain(self.border_children.iter())
    }

    /// Triple identifying this element for duplicate detection.
    pub fn triple(&self) -> (Option<ElementId>, DescriptionId, Id) {
        (self.parent_id, self.description_id, self.semantic_id)
    }

    fn collect_ids(&self, out: &mut HashSet<ElementId>) {
        out.insert(self.id);
        for child in self.all_children() {
            child.collect_ids(out);
        }
    }
}

/// Errors raised by the [`GraphicalMutation`] boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagramError {
    #[error("diagram element `{0}` does not exist")]
    UnknownElement(ElementId),

    #[error("diagram element `{0}` is an edge and cannot own other elements")]
    NotANode(ElementId),
}

/// Mutation boundary of a graphical tree.
///
/// This is where tree elements are materialized; rendering and layout pick
/// them up later.
pub trait GraphicalMutation {
    /// Append a node element under `parent`, or at diagram level for `None`.
    ///
    /// # Errors
    ///
    /// Fails if `parent` does not exist or is an edge.
    fn append_element(
        &mut self,
        parent: Option<ElementId>,
        description_id: DescriptionId,
        semantic_id: Id,
        containment: ContainmentKind,
    ) -> Result<ElementId, DiagramError>;

    /// Append an edge element between two existing elements.
    ///
    /// # Errors
    ///
    /// Fails if either endpoint does not exist.
    fn append_edge(
        &mut self,
        description_id: DescriptionId,
        semantic_id: Id,
        source: ElementId,
        target: ElementId,
    ) -> Result<ElementId, DiagramError>;

    /// Remove an element and its subtree. Edges attached to any removed node
    /// are removed as well.
    ///
    /// # Errors
    ///
    /// Fails if the element does not exist.
    fn remove_element(&mut self, id: ElementId) -> Result<DiagramElement, DiagramError>;
}

/// Element counts of a [`DiagramTree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes: usize,
    pub border_nodes: usize,
    pub edges: usize,
}

impl TreeStats {
    pub fn total(&self) -> usize {
        self.nodes + self.border_nodes + self.edges
    }
}

/// Graphical tree of one diagram document.
#[derive(Debug, Clone)]
pub struct DiagramTree {
    id: ElementId,
    description_id: DescriptionId,
    target: Id,
    nodes: Vec<DiagramElement>,
    edges: Vec<DiagramElement>,
}

impl DiagramTree {
    /// Create an empty diagram of the given kind bound to the semantic
    /// element `target`.
    pub fn new(description_id: DescriptionId, target: Id) -> Self {
        Self {
            id: ElementId::random(),
            description_id,
            target,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Get the diagram identifier.
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Get the diagram description id (the diagram kind).
    pub fn description_id(&self) -> DescriptionId {
        self.description_id
    }

    /// Get the semantic element the diagram is bound to.
    pub fn target(&self) -> Id {
        self.target
    }

    /// Borrow the top-level node elements.
    pub fn nodes(&self) -> &[DiagramElement] {
        &self.nodes
    }

    /// Borrow the edge elements.
    pub fn edges(&self) -> &[DiagramElement] {
        &self.edges
    }

    /// All elements in depth-first order: nodes (children before border
    /// children), then edges.
    pub fn descendants(&self) -> Vec<&DiagramElement> {
        fn walk<'a>(elements: &'a [DiagramElement], out: &mut Vec<&'a DiagramElement>) {
            for element in elements {
                out.push(element);
                walk(&element.children, out);
                walk(&element.border_children, out);
            }
        }

        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out.extend(self.edges.iter());
        out
    }

    /// Total number of elements, edges included.
    pub fn len(&self) -> usize {
        self.descendants().len()
    }

    /// Returns `true` if the diagram has no element.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Count elements by kind.
    pub fn stats(&self) -> TreeStats {
        self.descendants()
            .into_iter()
            .fold(TreeStats::default(), |mut stats, element| {
                match (element.kind, element.containment) {
                    (ElementKind::Edge { .. }, _) => stats.edges += 1,
                    (ElementKind::Node, ContainmentKind::Border) => stats.border_nodes += 1,
                    (ElementKind::Node, ContainmentKind::Child) => stats.nodes += 1,
                }
                stats
            })
    }

    /// Look up any element by id.
    pub fn element(&self, id: ElementId) -> Option<&DiagramElement> {
        self.descendants().into_iter().find(|element| element.id == id)
    }

    /// Look up the parent node of an element. `None` for top-level elements
    /// and unknown ids.
    pub fn parent_of(&self, id: ElementId) -> Option<&DiagramElement> {
        let parent_id = self.element(id)?.parent_id?;
        self.element(parent_id)
    }

    /// Render the tree as an indented outline. `describe` turns description
    /// ids into display labels.
    pub fn outline(&self, describe: impl Fn(DescriptionId) -> String) -> String {
        fn write_node(
            out: &mut String,
            element: &DiagramElement,
            depth: usize,
            describe: &dyn Fn(DescriptionId) -> String,
        ) {
            let slot = match element.containment {
                ContainmentKind::Child => "node",
                ContainmentKind::Border => "border",
            };
            out.push_str(&format!(
                "{}[{slot}] {} -> {}\n",
                "  ".repeat(depth),
                describe(element.description_id),
                element.semantic_id,
            ));
            for child in element.all_children() {
                write_node(out, child, depth + 1, describe);
            }
        }

        let mut out = format!("diagram {} -> {}\n", describe(self.description_id), self.target);
        for node in &self.nodes {
            write_node(&mut out, node, 1, &describe);
        }
        for edge in &self.edges {
            if let ElementKind::Edge { source, target } = edge.kind {
                let endpoint = |id: ElementId| {
                    self.element(id)
                        .map(|element| element.semantic_id.to_string())
                        .unwrap_or_else(|| id.to_string())
                };
                out.push_str(&format!(
                    "  [edge] {} -> {} ({} => {})\n",
                    describe(edge.description_id),
                    edge.semantic_id,
                    endpoint(source),
                    endpoint(target),
                ));
            }
        }
        out
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut DiagramElement> {
        fn find(elements: &mut [DiagramElement], id: ElementId) -> Option<&mut DiagramElement> {
            for element in elements {
                if element.id == id {
                    return Some(element);
                }
                if let Some(found) = find(&mut element.children, id) {
                    return Some(found);
                }
                if let Some(found) = find(&mut element.border_children, id) {
                    return Some(found);
                }
            }
            None
        }

        find(&mut self.nodes, id)
    }

    fn take_node(&mut self, id: ElementId) -> Option<DiagramElement> {
        fn take(elements: &mut Vec<DiagramElement>, id: ElementId) -> Option<DiagramElement> {
            if let Some(index) = elements.iter().position(|element| element.id == id) {
                return Some(elements.remove(index));
            }
            for element in elements.iter_mut() {
                if let Some(found) = take(&mut element.children, id) {
                    return Some(found);
                }
                if let Some(found) = take(&mut element.border_children, id) {
                    return Some(found);
                }
            }
            None
        }

        take(&mut self.nodes, id)
    }
}

impl fmt::Display for DiagramTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.outline(|id| id.to_string()))
    }
}

impl GraphicalMutation for DiagramTree {
    fn append_element(
        &mut self,
        parent: Option<ElementId>,
        description_id: DescriptionId,
        semantic_id: Id,
        containment: ContainmentKind,
    ) -> Result<ElementId, DiagramError> {
        debug_assert!(
            parent.is_some() || containment == ContainmentKind::Child,
            "Border element {semantic_id} requires a parent node"
        );

        let element = DiagramElement::new(
            description_id,
            semantic_id,
            parent,
            containment,
            ElementKind::Node,
        );
        let id = element.id;

        match parent {
            None => self.nodes.push(element),
            Some(parent_id) => {
                if self.edges.iter().any(|edge| edge.id == parent_id) {
                    return Err(DiagramError::NotANode(parent_id));
                }
                let parent = self
                    .node_mut(parent_id)
                    .ok_or(DiagramError::UnknownElement(parent_id))?;
                match containment {
                    ContainmentKind::Child => parent.children.push(element),
                    ContainmentKind::Border => parent.border_children.push(element),
                }
            }
        }

        trace!(element_id:% = id, semantic_id:% = semantic_id; "Appended diagram element");
        Ok(id)
    }

    fn append_edge(
        &mut self,
        description_id: DescriptionId,
        semantic_id: Id,
        source: ElementId,
        target: ElementId,
    ) -> Result<ElementId, DiagramError> {
        for endpoint in [source, target] {
            if self.element(endpoint).is_none() {
                return Err(DiagramError::UnknownElement(endpoint));
            }
        }

        let edge = DiagramElement::new(
            description_id,
            semantic_id,
            None,
            ContainmentKind::Child,
            ElementKind::Edge { source, target },
        );
        let id = edge.id;
        self.edges.push(edge);

        trace!(element_id:% = id, semantic_id:% = semantic_id; "Appended diagram edge");
        Ok(id)
    }

    fn remove_element(&mut self, id: ElementId) -> Result<DiagramElement, DiagramError> {
        if let Some(index) = self.edges.iter().position(|edge| edge.id == id) {
            return Ok(self.edges.remove(index));
        }

        let removed = self.take_node(id).ok_or(DiagramError::UnknownElement(id))?;
        let mut removed_ids = HashSet::new();
        removed.collect_ids(&mut removed_ids);
        self.edges.retain(|edge| match edge.kind {
            ElementKind::Edge { source, target } => {
                !removed_ids.contains(&source) && !removed_ids.contains(&target)
            }
            ElementKind::Node => true,
        });

        trace!(element_id:% = id, removed_count = removed_ids.len(); "Removed diagram element");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> DiagramTree {
        DiagramTree::new(DescriptionId::from_name("Class Diagram"), Id::new("model"))
    }

    #[test]
    fn test_append_top_level_and_nested() {
        let mut tree = tree();
        let package = tree
            .append_element(
                None,
                DescriptionId::from_name("CD_Package"),
                Id::new("pkg"),
                ContainmentKind::Child,
            )
            .unwrap();
        let class = tree
            .append_element(
                Some(package),
                DescriptionId::from_name("CD_Class"),
                Id::new("cls"),
                ContainmentKind::Child,
            )
            .unwrap();
        let port = tree
            .append_element(
                Some(class),
                DescriptionId::from_name("CD_Port"),
                Id::new("port"),
                ContainmentKind::Border,
            )
            .unwrap();

        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.element(class).unwrap().parent_id(), Some(package));
        assert_eq!(tree.parent_of(port).unwrap().id(), class);
        assert_eq!(tree.element(class).unwrap().border_children().len(), 1);
        assert!(tree.parent_of(package).is_none());
    }

    #[test]
    fn test_append_under_unknown_parent_fails() {
        let mut tree = tree();
        let ghost = ElementId::random();
        let result = tree.append_element(
            Some(ghost),
            DescriptionId::from_name("CD_Class"),
            Id::new("cls"),
            ContainmentKind::Child,
        );

        assert_eq!(result, Err(DiagramError::UnknownElement(ghost)));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_edges_cannot_own_nodes() {
        let mut tree = tree();
        let a = tree
            .append_element(None, DescriptionId::from_name("CD_Class"), Id::new("a"), ContainmentKind::Child)
            .unwrap();
        let b = tree
            .append_element(None, DescriptionId::from_name("CD_Class"), Id::new("b"), ContainmentKind::Child)
            .unwrap();
        let edge = tree
            .append_edge(DescriptionId::from_name("CD_Generalization"), Id::new("gen"), a, b)
            .unwrap();

        let result = tree.append_element(
            Some(edge),
            DescriptionId::from_name("CD_Comment"),
            Id::new("note"),
            ContainmentKind::Child,
        );
        assert_eq!(result, Err(DiagramError::NotANode(edge)));
    }

    #[test]
    fn test_remove_subtree_drops_attached_edges() {
        let mut tree = tree();
        let package = tree
            .append_element(None, DescriptionId::from_name("CD_Package"), Id::new("pkg"), ContainmentKind::Child)
            .unwrap();
        let inner = tree
            .append_element(Some(package), DescriptionId::from_name("CD_Class"), Id::new("a"), ContainmentKind::Child)
            .unwrap();
        let outer = tree
            .append_element(None, DescriptionId::from_name("CD_Class"), Id::new("b"), ContainmentKind::Child)
            .unwrap();
        tree.append_edge(DescriptionId::from_name("CD_Generalization"), Id::new("gen"), inner, outer)
            .unwrap();

        let removed = tree.remove_element(package).unwrap();

        assert_eq!(removed.children().len(), 1);
        assert!(tree.edges().is_empty());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.remove_element(package), Err(DiagramError::UnknownElement(package)));
    }

    #[test]
    fn test_stats_split_by_kind() {
        let mut tree = tree();
        let class = tree
            .append_element(None, DescriptionId::from_name("CD_Class"), Id::new("c1"), ContainmentKind::Child)
            .unwrap();
        let other = tree
            .append_element(None, DescriptionId::from_name("CD_Class"), Id::new("c2"), ContainmentKind::Child)
            .unwrap();
        tree.append_element(Some(class), DescriptionId::from_name("CD_Port"), Id::new("p1"), ContainmentKind::Border)
            .unwrap();
        tree.append_edge(DescriptionId::from_name("CD_Dependency"), Id::new("dep"), class, other)
            .unwrap();

        let stats = tree.stats();
        assert_eq!(
            stats,
            TreeStats {
                nodes: 2,
                border_nodes: 1,
                edges: 1,
            }
        );
        assert_eq!(stats.total(), tree.len());
    }

    #[test]
    fn test_outline() {
        let mut tree = tree();
        let package = tree
            .append_element(None, DescriptionId::from_name("CD_Package"), Id::new("pkg"), ContainmentKind::Child)
            .unwrap();
        tree.append_element(Some(package), DescriptionId::from_name("CD_Class"), Id::new("cls"), ContainmentKind::Child)
            .unwrap();

        let outline = tree.outline(|id| {
            if id == DescriptionId::from_name("CD_Package") {
                "CD_Package".to_string()
            } else if id == DescriptionId::from_name("CD_Class") {
                "CD_Class".to_string()
            } else {
                "Class Diagram".to_string()
            }
        });

        assert_eq!(
            outline,
            "diagram Class Diagram -> model\n  [node] CD_Package -> pkg\n    [node] CD_Class -> cls\n"
        );
    }
}
