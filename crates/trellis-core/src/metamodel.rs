//! Type hierarchy of the semantic model.
//!
//! The engine never owns the metamodel; it consults it through the
//! [`TypeHierarchy`] trait. [`Metamodel`] is the in-memory implementation used
//! by declarative scenarios and tests. It is built once through
//! [`MetamodelBuilder`] and is immutable afterwards.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use log::trace;
use petgraph::{
    Direction, algo,
    graph::{DiGraph, NodeIndex},
};
use thiserror::Error;

use crate::identifier::Id;

/// Read-only view of a semantic type hierarchy.
pub trait TypeHierarchy {
    /// Declared direct supertypes of `ty`, in declaration order.
    ///
    /// Unknown types have no supertypes.
    fn supertypes_of(&self, ty: Id) -> &[Id];

    /// The root concept every well-formed type eventually specializes.
    fn root_concept(&self) -> Id;

    /// Every type known to the hierarchy, in declaration order.
    fn known_types(&self) -> Vec<Id>;

    /// Number of supertype hops from `ty` up to `ancestor`, following the
    /// shortest path. `Some(0)` when both are the same type, `None` when
    /// `ancestor` is not reachable.
    fn ancestor_distance(&self, ty: Id, ancestor: Id) -> Option<usize> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([(ty, 0usize)]);
        while let Some((current, hops)) = queue.pop_front() {
            if current == ancestor {
                return Some(hops);
            }
            if !visited.insert(current) {
                continue;
            }
            for supertype in self.supertypes_of(current) {
                queue.push_back((*supertype, hops + 1));
            }
        }
        None
    }

    /// Returns `true` if `ty` is `ancestor` or one of its subtypes.
    fn is_subtype_of(&self, ty: Id, ancestor: Id) -> bool {
        self.ancestor_distance(ty, ancestor).is_some()
    }
}

/// Errors raised while assembling a [`Metamodel`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetamodelError {
    #[error("type `{0}` is declared more than once")]
    DuplicateType(Id),

    #[error("type `{ty}` declares unknown supertype `{supertype}`")]
    UnknownSupertype { ty: Id, supertype: Id },

    #[error("root concept `{0}` is not a declared type")]
    UnknownRootConcept(Id),

    #[error("supertype declarations form a cycle through `{0}`")]
    CyclicHierarchy(Id),
}

#[derive(Debug)]
struct TypeEntry {
    node: NodeIndex,
    supertypes: Vec<Id>,
}

/// In-memory type hierarchy backed by a directed graph whose edges point from
/// a type to its supertypes.
#[derive(Debug)]
pub struct Metamodel {
    root: Id,
    types: IndexMap<Id, TypeEntry>,
    graph: DiGraph<Id, ()>,
}

impl Metamodel {
    /// Starts building a metamodel with the given root concept.
    pub fn builder(root: impl Into<Id>) -> MetamodelBuilder {
        MetamodelBuilder::new(root.into())
    }

    /// Returns `true` if `ty` is a declared type.
    pub fn contains_type(&self, ty: Id) -> bool {
        self.types.contains_key(&ty)
    }

    /// Number of declared types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no type was declared.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeHierarchy for Metamodel {
    fn supertypes_of(&self, ty: Id) -> &[Id] {
        self.types
            .get(&ty)
            .map(|entry| entry.supertypes.as_slice())
            .unwrap_or(&[])
    }

    fn root_concept(&self) -> Id {
        self.root
    }

    fn known_types(&self) -> Vec<Id> {
        self.types.keys().copied().collect()
    }

    fn ancestor_distance(&self, ty: Id, ancestor: Id) -> Option<usize> {
        let start = self.types.get(&ty)?.node;
        let goal = self.types.get(&ancestor)?.node;

        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([(start, 0usize)]);
        while let Some((node, hops)) = queue.pop_front() {
            if node == goal {
                return Some(hops);
            }
            for supertype in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if visited.insert(supertype) {
                    queue.push_back((supertype, hops + 1));
                }
            }
        }
        None
    }
}

/// Builder for [`Metamodel`].
///
/// Types may be declared in any order; supertypes are resolved on
/// [`MetamodelBuilder::build`].
///
/// # Examples
///
/// ```
/// use trellis_core::metamodel::{Metamodel, TypeHierarchy};
///
/// let metamodel = Metamodel::builder("Element")
///     .with_type("Element", &[])
///     .with_type("Classifier", &["Element"])
///     .with_type("Class", &["Classifier"])
///     .build()
///     .expect("valid hierarchy");
///
/// assert_eq!(metamodel.ancestor_distance("Class".into(), "Element".into()), Some(2));
/// ```
#[derive(Debug)]
pub struct MetamodelBuilder {
    root: Id,
    declarations: Vec<(Id, Vec<Id>)>,
}

impl MetamodelBuilder {
    fn new(root: Id) -> Self {
        Self {
            root,
            declarations: Vec::new(),
        }
    }

    /// Declares a type and its direct supertypes.
    pub fn with_type(mut self, name: &str, supertypes: &[&str]) -> Self {
        self.add_type(
            Id::new(name),
            supertypes.iter().map(|supertype| Id::new(supertype)).collect(),
        );
        self
    }

    /// Declares a type and its direct supertypes.
    pub fn add_type(&mut self, name: Id, supertypes: Vec<Id>) {
        self.declarations.push((name, supertypes));
    }

    /// Validates the declarations and freezes the hierarchy.
    ///
    /// # Errors
    ///
    /// Returns every problem found: duplicate types, unknown supertypes, an
    /// undeclared root concept, or cycles.
    pub fn build(self) -> Result<Metamodel, Vec<MetamodelError>> {
        let mut errors = Vec::new();
        let mut graph = DiGraph::new();
        let mut types: IndexMap<Id, TypeEntry> = IndexMap::new();

        for (name, supertypes) in &self.declarations {
            if types.contains_key(name) {
                errors.push(MetamodelError::DuplicateType(*name));
                continue;
            }
            let node = graph.add_node(*name);
            types.insert(
                *name,
                TypeEntry {
                    node,
                    supertypes: supertypes.clone(),
                },
            );
        }

        let nodes: HashMap<Id, NodeIndex> = types
            .iter()
            .map(|(name, entry)| (*name, entry.node))
            .collect();
        for (name, entry) in &types {
            for supertype in &entry.supertypes {
                match nodes.get(supertype) {
                    Some(target) => {
                        graph.add_edge(entry.node, *target, ());
                    }
                    None => errors.push(MetamodelError::UnknownSupertype {
                        ty: *name,
                        supertype: *supertype,
                    }),
                }
            }
        }

        if !types.contains_key(&self.root) {
            errors.push(MetamodelError::UnknownRootConcept(self.root));
        }

        if let Err(cycle) = algo::toposort(&graph, None) {
            errors.push(MetamodelError::CyclicHierarchy(graph[cycle.node_id()]));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        trace!(types_count = types.len(); "Metamodel built");
        Ok(Metamodel {
            root: self.root,
            types,
            graph,
        })
    }
}
