//! Semantic model: the typed domain objects a diagram projects.
//!
//! The projection engine only reads the semantic model. It inspects element
//! types, containment and named references; all semantic mutation belongs to
//! other collaborators.

use indexmap::IndexMap;
use thiserror::Error;

use crate::{identifier::Id, metamodel::Metamodel};

/// One domain object of the semantic graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticElement {
    id: Id,
    type_name: Id,
    container: Option<Id>,
    references: IndexMap<Id, Vec<Id>>,
}

impl SemanticElement {
    /// Create a new element of the given type with no container.
    pub fn new(id: impl Into<Id>, type_name: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            container: None,
            references: IndexMap::new(),
        }
    }

    /// Set the containing element.
    pub fn with_container(mut self, container: impl Into<Id>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Add targets to a named reference. Targets keep their insertion order.
    pub fn with_reference(mut self, name: impl Into<Id>, targets: &[&str]) -> Self {
        self.add_reference(name.into(), targets.iter().map(|target| Id::new(target)));
        self
    }

    /// Add targets to a named reference.
    pub fn add_reference(&mut self, name: Id, targets: impl IntoIterator<Item = Id>) {
        self.references.entry(name).or_default().extend(targets);
    }

    /// Get the element identifier.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the element's concrete type.
    pub fn type_name(&self) -> Id {
        self.type_name
    }

    /// Get the containing element, `None` for a model root.
    pub fn container(&self) -> Option<Id> {
        self.container
    }

    /// Targets of a named reference; empty if the reference is unset.
    pub fn reference(&self, name: Id) -> &[Id] {
        self.references
            .get(&name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate over all named references.
    pub fn references(&self) -> impl Iterator<Item = (Id, &[Id])> {
        self.references
            .iter()
            .map(|(name, targets)| (*name, targets.as_slice()))
    }
}

/// Problems detected while assembling or validating a [`Model`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("element `{0}` is declared more than once")]
    DuplicateElement(Id),

    #[error("element `{element}` has unknown type `{type_name}`")]
    UnknownType { element: Id, type_name: Id },

    #[error("element `{element}` is contained by unknown element `{container}`")]
    UnknownContainer { element: Id, container: Id },

    #[error("reference `{reference}` of element `{element}` targets unknown element `{target}`")]
    UnknownReferenceTarget {
        element: Id,
        reference: Id,
        target: Id,
    },

    #[error("model root `{0}` is not a declared element")]
    UnknownRoot(Id),
}

/// An in-memory semantic graph with a designated root element.
#[derive(Debug, Clone)]
pub struct Model {
    root: Id,
    elements: IndexMap<Id, SemanticElement>,
}

impl Model {
    /// Create an empty model whose root will be the element `root`.
    pub fn new(root: impl Into<Id>) -> Self {
        Self {
            root: root.into(),
            elements: IndexMap::new(),
        }
    }

    /// Add an element.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateElement`] if an element with the same id
    /// already exists; the model is left unchanged.
    pub fn insert(&mut self, element: SemanticElement) -> Result<(), ModelError> {
        if self.elements.contains_key(&element.id()) {
            return Err(ModelError::DuplicateElement(element.id()));
        }
        self.elements.insert(element.id(), element);
        Ok(())
    }

    /// Builder-style variant of [`Model::insert`] for tests and fixtures.
    ///
    /// # Panics
    ///
    /// Panics if the element id is already used.
    pub fn with(mut self, element: SemanticElement) -> Self {
        let id = element.id();
        if self.insert(element).is_err() {
            panic!("element `{id}` declared twice");
        }
        self
    }

    /// The model root id.
    pub fn root(&self) -> Id {
        self.root
    }

    /// Look up an element by id.
    pub fn element(&self, id: Id) -> Option<&SemanticElement> {
        self.elements.get(&id)
    }

    /// Iterate over elements in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = &SemanticElement> {
        self.elements.values()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the model has no element.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Follow a path of reference names from `start`, taking every target at
    /// each hop. Unknown intermediate elements end their branch.
    pub fn follow(&self, start: Id, path: &[Id]) -> Vec<Id> {
        let mut current = vec![start];
        for reference in path {
            current = current
                .into_iter()
                .filter_map(|id| self.element(id))
                .flat_map(|element| element.reference(*reference).iter().copied())
                .collect();
        }
        current
    }

    /// Check the model against a metamodel.
    ///
    /// Returns every problem found; an empty vector means the model is valid.
    pub fn validate(&self, metamodel: &Metamodel) -> Vec<ModelError> {
        let mut errors = Vec::new();
        if !self.elements.contains_key(&self.root) {
            errors.push(ModelError::UnknownRoot(self.root));
        }
        for element in self.elements.values() {
            if !metamodel.contains_type(element.type_name()) {
                errors.push(ModelError::UnknownType {
                    element: element.id(),
                    type_name: element.type_name(),
                });
            }
            if let Some(container) = element.container() {
                if !self.elements.contains_key(&container) {
                    errors.push(ModelError::UnknownContainer {
                        element: element.id(),
                        container,
                    });
                }
            }
            for (reference, targets) in element.references() {
                for target in targets {
                    if !self.elements.contains_key(target) {
                        errors.push(ModelError::UnknownReferenceTarget {
                            element: element.id(),
                            reference,
                            target: *target,
                        });
                    }
                }
            }
        }
        errors
    }
}

/// Maps semantic elements to the identifiers stored in graphical elements.
pub trait IdentityService {
    /// Identifier of `element`, or `None` when it cannot be computed.
    fn id_of(&self, element: &SemanticElement) -> Option<Id>;
}

/// Identity service that only knows the elements attached to a [`Model`].
///
/// Detached elements (not present in the model) have no identity.
#[derive(Debug, Clone, Copy)]
pub struct ModelIdentity<'a> {
    model: &'a Model,
}

impl<'a> ModelIdentity<'a> {
    /// Create an identity service over `model`.
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }
}

impl IdentityService for ModelIdentity<'_> {
    fn id_of(&self, element: &SemanticElement) -> Option<Id> {
        self.model
            .element(element.id())
            .map(SemanticElement::id)
    }
}
