//! Mapping registry: the frozen catalog of mapping descriptions.
//!
//! A [`MappingRegistry`] holds one [`DiagramDescription`] per diagram kind.
//! Each diagram description owns a flat arena of [`MappingDescription`]s; the
//! nesting tree is expressed through description ids. The registry is
//! produced once by [`RegistryBuilder`] and never mutated afterwards, so it is
//! safe to share between threads.

mod builder;
mod declaration;

pub use builder::RegistryBuilder;
pub use declaration::{DiagramDeclaration, EdgeDeclaration, NodeDeclaration};

use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;

use trellis_core::{
    diagram::{ContainmentKind, DiagramTree},
    identifier::{DescriptionId, Id},
};

/// Whether views are materialized automatically or by explicit creation.
///
/// The mode is declarative metadata for node mappings: a synchronized node
/// mapping is still a candidate for explicit drops, and no refresh creates
/// node views on its own. Edge descriptions carry no mode; their views always
/// follow the shown endpoints (see `DropRouter::refresh_edges`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynchronizationMode {
    Synchronized,
    #[default]
    Unsynchronized,
}

/// Structural role of a node description, fixed at build time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeRole {
    #[default]
    Regular,
    /// Sub-container grouping leaf items of its parent node.
    Compartment,
    /// Layout-only description; never a drop candidate.
    Placeholder,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Regular => write!(f, "regular"),
            NodeRole::Compartment => write!(f, "compartment"),
            NodeRole::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// A node mapping: binds a semantic type to a nesting slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingDescription {
    id: DescriptionId,
    name: Id,
    domain_type: Id,
    containment: ContainmentKind,
    synchronization: SynchronizationMode,
    role: NodeRole,
    children: Vec<DescriptionId>,
    border_children: Vec<DescriptionId>,
    reused_children: Vec<DescriptionId>,
    reused_border_children: Vec<DescriptionId>,
}

impl MappingDescription {
    pub fn id(&self) -> DescriptionId {
        self.id
    }

    pub fn name(&self) -> Id {
        self.name
    }

    /// The semantic type this description accepts, subtypes included.
    pub fn domain_type(&self) -> Id {
        self.domain_type
    }

    /// The slot this description is owned in.
    pub fn containment(&self) -> ContainmentKind {
        self.containment
    }

    /// Declared mode; does not restrict drop candidacy.
    pub fn synchronization(&self) -> SynchronizationMode {
        self.synchronization
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn is_compartment(&self) -> bool {
        self.role == NodeRole::Compartment
    }

    pub fn is_placeholder(&self) -> bool {
        self.role == NodeRole::Placeholder
    }

    pub fn children(&self) -> &[DescriptionId] {
        &self.children
    }

    pub fn border_children(&self) -> &[DescriptionId] {
        &self.border_children
    }

    pub fn reused_children(&self) -> &[DescriptionId] {
        &self.reused_children
    }

    pub fn reused_border_children(&self) -> &[DescriptionId] {
        &self.reused_border_children
    }

    /// Every description that may be nested under this one, owned first:
    /// children, border children, reused children, reused border children.
    pub fn nested(&self) -> impl Iterator<Item = DescriptionId> + '_ {
        self.children
            .iter()
            .chain(&self.border_children)
            .chain(&self.reused_children)
            .chain(&self.reused_border_children)
            .copied()
    }

    /// Returns `true` if `child` is declared in a border slot of this
    /// description, owned or reused.
    pub fn has_border(&self, child: DescriptionId) -> bool {
        self.border_children.contains(&child) || self.reused_border_children.contains(&child)
    }
}

/// An edge mapping between views of the listed descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDescription {
    id: DescriptionId,
    name: Id,
    domain_type: Id,
    sources: Vec<DescriptionId>,
    targets: Vec<DescriptionId>,
}

impl EdgeDescription {
    pub fn id(&self) -> DescriptionId {
        self.id
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn domain_type(&self) -> Id {
        self.domain_type
    }

    pub fn sources(&self) -> &[DescriptionId] {
        &self.sources
    }

    pub fn targets(&self) -> &[DescriptionId] {
        &self.targets
    }

    /// Returns `true` if a view of `source` may start this edge and a view of
    /// `target` may end it.
    pub fn connects(&self, source: DescriptionId, target: DescriptionId) -> bool {
        self.sources.contains(&source) && self.targets.contains(&target)
    }
}

/// The description tree of one diagram kind.
#[derive(Debug, Clone)]
pub struct DiagramDescription {
    id: DescriptionId,
    name: Id,
    target_type: Id,
    top_level: Vec<DescriptionId>,
    nodes: IndexMap<DescriptionId, MappingDescription>,
    edges: IndexMap<DescriptionId, EdgeDescription>,
}

impl DiagramDescription {
    pub fn id(&self) -> DescriptionId {
        self.id
    }

    pub fn name(&self) -> Id {
        self.name
    }

    /// The semantic type a diagram of this kind is opened on.
    pub fn target_type(&self) -> Id {
        self.target_type
    }

    /// Top-level node descriptions, in declaration order.
    pub fn top_level(&self) -> impl Iterator<Item = &MappingDescription> {
        self.top_level.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Every node description, depth-first in declaration order.
    pub fn descriptions(&self) -> impl Iterator<Item = &MappingDescription> {
        self.nodes.values()
    }

    pub fn description(&self, id: DescriptionId) -> Option<&MappingDescription> {
        self.nodes.get(&id)
    }

    pub fn description_by_name(&self, name: &str) -> Option<&MappingDescription> {
        self.nodes.get(&DescriptionId::from_name(name))
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeDescription> {
        self.edges.values()
    }

    pub fn edge_by_name(&self, name: &str) -> Option<&EdgeDescription> {
        self.edges.get(&DescriptionId::from_name(name))
    }

    /// Number of node and edge descriptions.
    pub fn len(&self) -> usize {
        self.nodes.len() + self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Slot a view of `child` takes under a view of `parent`; top-level
    /// views are always regular children.
    pub fn containment_in(&self, parent: Option<DescriptionId>, child: DescriptionId) -> ContainmentKind {
        match parent.and_then(|id| self.nodes.get(&id)) {
            Some(parent) if parent.has_border(child) => ContainmentKind::Border,
            _ => ContainmentKind::Child,
        }
    }

    /// Display name of a diagram, node or edge description id.
    pub fn name_of(&self, id: DescriptionId) -> Option<Id> {
        if id == self.id {
            return Some(self.name);
        }
        self.nodes
            .get(&id)
            .map(MappingDescription::name)
            .or_else(|| self.edges.get(&id).map(EdgeDescription::name))
    }

    /// Opens an empty diagram of this kind bound to the semantic element
    /// `target`.
    pub fn create_diagram(&self, target: Id) -> DiagramTree {
        DiagramTree::new(self.id, target)
    }
}

/// The frozen catalog of every diagram kind.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    diagrams: IndexMap<Id, DiagramDescription>,
}

impl MappingRegistry {
    /// Starts a registry build.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn diagram(&self, name: &str) -> Option<&DiagramDescription> {
        self.diagrams.get(&Id::new(name))
    }

    pub fn diagram_by_id(&self, id: DescriptionId) -> Option<&DiagramDescription> {
        self.diagrams.values().find(|diagram| diagram.id == id)
    }

    /// Diagram kinds, in declaration order.
    pub fn diagrams(&self) -> impl Iterator<Item = &DiagramDescription> {
        self.diagrams.values()
    }

    pub fn len(&self) -> usize {
        self.diagrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagrams.is_empty()
    }

    /// Display label for any description id, falling back to the raw id.
    pub fn describe(&self, id: DescriptionId) -> String {
        self.diagrams
            .values()
            .find_map(|diagram| diagram.name_of(id))
            .map(|name| name.to_string())
            .unwrap_or_else(|| id.to_string())
    }
}
