//! Declarative input for the mapping registry.
//!
//! Declarations are plain data: they come from TOML scenarios through serde
//! or from code through the builder-style constructors. Nothing is validated
//! here; [`RegistryBuilder`](super::RegistryBuilder) does that once.

use serde::Deserialize;

use super::SynchronizationMode;

/// Declaration of a node mapping and its nested descriptions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeDeclaration {
    pub(super) name: String,
    pub(super) domain_type: String,
    #[serde(default)]
    pub(super) synchronization: SynchronizationMode,
    #[serde(default)]
    pub(super) children: Vec<NodeDeclaration>,
    #[serde(default)]
    pub(super) borders: Vec<NodeDeclaration>,
    #[serde(default)]
    pub(super) reused_children: Vec<String>,
    #[serde(default)]
    pub(super) reused_borders: Vec<String>,
    #[serde(default)]
    pub(super) compartment: Option<bool>,
    #[serde(default)]
    pub(super) placeholder: Option<bool>,
    #[serde(default)]
    pub(super) id: Option<String>,
}

impl NodeDeclaration {
    pub fn new(name: impl Into<String>, domain_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain_type: domain_type.into(),
            ..Self::default()
        }
    }

    pub fn with_child(mut self, child: NodeDeclaration) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_border(mut self, border: NodeDeclaration) -> Self {
        self.borders.push(border);
        self
    }

    pub fn reusing_child(mut self, name: impl Into<String>) -> Self {
        self.reused_children.push(name.into());
        self
    }

    pub fn reusing_border(mut self, name: impl Into<String>) -> Self {
        self.reused_borders.push(name.into());
        self
    }

    pub fn synchronized(mut self) -> Self {
        self.synchronization = SynchronizationMode::Synchronized;
        self
    }

    /// Mark the description as a compartment (`true`) or explicitly not one.
    pub fn compartment(mut self, flag: bool) -> Self {
        self.compartment = Some(flag);
        self
    }

    /// Mark the description as a layout-only placeholder.
    pub fn placeholder(mut self, flag: bool) -> Self {
        self.placeholder = Some(flag);
        self
    }

    /// Declare the expected id; the build checks it against the name.
    pub fn with_declared_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Declaration of an edge mapping.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EdgeDeclaration {
    pub(super) name: String,
    pub(super) domain_type: String,
    #[serde(default)]
    pub(super) sources: Vec<String>,
    #[serde(default)]
    pub(super) targets: Vec<String>,
    #[serde(default)]
    pub(super) id: Option<String>,
}

impl EdgeDeclaration {
    pub fn new(name: impl Into<String>, domain_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain_type: domain_type.into(),
            ..Self::default()
        }
    }

    /// Accept views of the named description as source.
    pub fn from_source(mut self, name: impl Into<String>) -> Self {
        self.sources.push(name.into());
        self
    }

    /// Accept views of the named description as target.
    pub fn to_target(mut self, name: impl Into<String>) -> Self {
        self.targets.push(name.into());
        self
    }
}

/// Declaration of one diagram kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiagramDeclaration {
    pub(super) name: String,
    pub(super) target_type: String,
    #[serde(default)]
    pub(super) nodes: Vec<NodeDeclaration>,
    #[serde(default)]
    pub(super) edges: Vec<EdgeDeclaration>,
}

impl DiagramDeclaration {
    pub fn new(name: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_type: target_type.into(),
            ..Self::default()
        }
    }

    pub fn with_node(mut self, node: NodeDeclaration) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_edge(mut self, edge: EdgeDeclaration) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
