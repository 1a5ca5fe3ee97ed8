//! Drop routing: turns "put this semantic element here" requests into view
//! creations.
//!
//! Routing is type-directed through a [`DispatchTable`]:
//! - import-like elements project the element they import, through a fixed
//!   mapping name;
//! - relationship-like elements are never drawn themselves; the router makes
//!   sure their endpoints are drawn, in their logical container;
//! - every other element is drawn through the [`CandidateResolver`], with a
//!   single retry against the owning compartment when the literal target
//!   cannot host it.

mod dispatch;
mod endpoints;

pub use dispatch::{DispatchTable, DropKind};
pub use endpoints::{EndpointProvider, EndpointProviders, ReferencePathEndpoints};

use log::{debug, error, info, trace, warn};

use trellis_core::{
    diagram::{DiagramTree, GraphicalMutation},
    identifier::{DescriptionId, ElementId, Id},
    metamodel::TypeHierarchy,
    semantic::{IdentityService, Model, SemanticElement},
};

use crate::{
    config::RoutingConfig,
    construction::ViewConstructor,
    error::TrellisError,
    registry::{DiagramDescription, NodeRole},
    resolver::{CandidateResolver, MappingContext, Query},
    search,
};

/// Read-only collaborators of one editing session.
///
/// Passed explicitly instead of living in globals, so several sessions with
/// different registries or metamodels can coexist.
#[derive(Clone, Copy)]
pub struct EditingContext<'a> {
    pub diagram: &'a DiagramDescription,
    pub hierarchy: &'a dyn TypeHierarchy,
    pub model: &'a Model,
    pub identity: &'a dyn IdentityService,
    pub endpoints: &'a EndpointProviders,
    pub routing: &'a RoutingConfig,
}

/// One insertion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropRequest {
    pub element: Id,
    pub target: Option<ElementId>,
    pub mapping: Option<Id>,
}

impl DropRequest {
    /// Drop `element` at diagram level.
    pub fn new(element: impl Into<Id>) -> Self {
        Self {
            element: element.into(),
            target: None,
            mapping: None,
        }
    }

    /// Drop on the view `target`.
    pub fn on(mut self, target: ElementId) -> Self {
        self.target = Some(target);
        self
    }

    /// Use the mapping named `mapping` instead of resolving by type.
    pub fn with_mapping(mut self, mapping: impl Into<Id>) -> Self {
        self.mapping = Some(mapping.into());
        self
    }
}

/// What a drop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// A view was created at the requested target.
    Created,
    /// The target could not host the element; a view was created under the
    /// compartment owning the target instead.
    CreatedInCompartment,
    /// Relationship drop; `created` endpoint views were added.
    Endpoints { created: usize },
    /// Nothing changed.
    Ignored,
}

impl DropOutcome {
    /// Returns `true` if at least one view was created.
    pub fn changed_tree(&self) -> bool {
        match self {
            DropOutcome::Created | DropOutcome::CreatedInCompartment => true,
            DropOutcome::Endpoints { created } => *created > 0,
            DropOutcome::Ignored => false,
        }
    }
}

struct PlannedEdge {
    description: DescriptionId,
    element: Id,
    source: ElementId,
    target: ElementId,
}

/// Routes drops for one diagram kind.
pub struct DropRouter<'a> {
    context: EditingContext<'a>,
    table: DispatchTable,
}

impl<'a> DropRouter<'a> {
    /// Builds the dispatch table for the context's metamodel.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Wiring`] if a relationship-like type has no
    /// endpoint provider.
    pub fn new(context: EditingContext<'a>) -> Result<Self, TrellisError> {
        let table = DispatchTable::build(context.hierarchy, context.routing, context.endpoints)?;
        Ok(Self { context, table })
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// Routes one drop of `element` on `target` (diagram level for `None`).
    ///
    /// Failed drops are silent no-ops reported as [`DropOutcome::Ignored`].
    pub fn drop_element(
        &self,
        tree: &mut DiagramTree,
        element: &SemanticElement,
        target: Option<ElementId>,
        mapping: Option<Id>,
    ) -> DropOutcome {
        let kind = self.table.kind_of(element.type_name());
        debug!(
            element:% = element.id(),
            type_name:% = element.type_name(),
            kind:? = kind;
            "Routing drop"
        );

        match kind {
            DropKind::Import { reference, mapping } => {
                let Some(imported) = element
                    .reference(reference)
                    .first()
                    .and_then(|id| self.context.model.element(*id))
                else {
                    debug!(element:% = element.id(), reference:% = reference; "Nothing imported");
                    return DropOutcome::Ignored;
                };
                self.drop_default(tree, imported, target, Query::Name(mapping))
            }
            DropKind::Relationship => self.drop_relationship(tree, element),
            DropKind::Default => {
                let query = mapping
                    .map(Query::Name)
                    .unwrap_or(Query::Type(element.type_name()));
                self.drop_default(tree, element, target, query)
            }
        }
    }

    /// Routes a request naming its element by id.
    pub fn drop_request(&self, tree: &mut DiagramTree, request: DropRequest) -> DropOutcome {
        match self.context.model.element(request.element) {
            Some(element) => self.drop_element(tree, element, request.target, request.mapping),
            None => {
                warn!(element:% = request.element; "Dropped element is not part of the model");
                DropOutcome::Ignored
            }
        }
    }

    /// Drops every request in order.
    pub fn populate(
        &self,
        tree: &mut DiagramTree,
        requests: impl IntoIterator<Item = DropRequest>,
    ) -> Vec<DropOutcome> {
        let outcomes: Vec<_> = requests
            .into_iter()
            .map(|request| self.drop_request(tree, request))
            .collect();
        info!(
            requests_count = outcomes.len(),
            changed_count = outcomes.iter().filter(|outcome| outcome.changed_tree()).count();
            "Diagram populated"
        );
        outcomes
    }

    /// Materializes the edges of every relationship-like element of the model
    /// whose endpoints are shown.
    ///
    /// Edge mappings are synchronized: drops never create them, they follow
    /// the endpoint views. An edge is appended once per `(description,
    /// element, source view, target view)`, so refreshing again is a no-op.
    /// Returns the number of edges appended.
    pub fn refresh_edges(&self, tree: &mut DiagramTree) -> usize {
        let shown: &DiagramTree = tree;
        let planned: Vec<PlannedEdge> = self
            .context
            .model
            .elements()
            .filter(|element| self.table.kind_of(element.type_name()) == DropKind::Relationship)
            .flat_map(|element| self.plan_edges(shown, element))
            .collect();

        let mut appended = 0;
        for edge in planned {
            if search::find_edge(tree, edge.element, edge.description, edge.source, edge.target)
                .is_some()
            {
                continue;
            }
            match tree.append_edge(edge.description, edge.element, edge.source, edge.target) {
                Ok(_) => appended += 1,
                Err(err) => error!(err:% = err, element:% = edge.element; "Failed to append edge"),
            }
        }

        debug!(appended; "Edges refreshed");
        appended
    }

    /// One edge per target endpoint: the most specific edge description
    /// connecting a view of the source to a view of the target.
    fn plan_edges(&self, tree: &DiagramTree, element: &SemanticElement) -> Vec<PlannedEdge> {
        let hierarchy = self.context.hierarchy;
        let mut descriptions: Vec<_> = self
            .context
            .diagram
            .edges()
            .filter_map(|edge| {
                hierarchy
                    .ancestor_distance(element.type_name(), edge.domain_type())
                    .map(|distance| (distance, edge))
            })
            .collect();
        if descriptions.is_empty() {
            return Vec::new();
        }
        descriptions.sort_by_key(|(distance, _)| *distance);

        let model = self.context.model;
        let Some((provider, source)) = self
            .context
            .endpoints
            .provider_for(hierarchy, element.type_name())
            .and_then(|provider| provider.source_of(model, element).map(|source| (provider, source)))
        else {
            return Vec::new();
        };
        let sources = search::find_bound_nodes(tree, source);

        let mut planned = Vec::new();
        for target in provider.targets_of(model, element) {
            let targets = search::find_bound_nodes(tree, target);
            let connection = descriptions.iter().find_map(|(_, edge)| {
                sources.iter().find_map(|source_view| {
                    targets
                        .iter()
                        .find(|target_view| {
                            edge.connects(source_view.description_id(), target_view.description_id())
                        })
                        .map(|target_view| PlannedEdge {
                            description: edge.id(),
                            element: element.id(),
                            source: source_view.id(),
                            target: target_view.id(),
                        })
                })
            });
            match connection {
                Some(edge) => planned.push(edge),
                None => trace!(
                    element:% = element.id(),
                    source:% = source,
                    target:% = target;
                    "No edge description connects the endpoint views"
                ),
            }
        }
        planned
    }

    fn resolver(&self) -> CandidateResolver<'a> {
        CandidateResolver::new(self.context.diagram, self.context.hierarchy)
    }

    fn constructor(&self) -> ViewConstructor<'a> {
        ViewConstructor::new(self.context.diagram, self.context.identity)
    }

    fn context_of(tree: &DiagramTree, view: Option<ElementId>) -> MappingContext {
        view.and_then(|id| tree.element(id))
            .map(|view| MappingContext::Description(view.description_id()))
            .unwrap_or(MappingContext::Root)
    }

    fn create_in(
        &self,
        tree: &mut DiagramTree,
        element: &SemanticElement,
        parent: Option<ElementId>,
        query: Query,
    ) -> bool {
        let context = Self::context_of(tree, parent);
        match self.resolver().best(context, query) {
            Some(mapping) => self.constructor().create_view(tree, element, parent, mapping),
            None => {
                debug!(element:% = element.id(), context:? = context; "No compatible mapping");
                false
            }
        }
    }

    fn drop_default(
        &self,
        tree: &mut DiagramTree,
        element: &SemanticElement,
        target: Option<ElementId>,
        query: Query,
    ) -> DropOutcome {
        if self.create_in(tree, element, target, query) {
            return DropOutcome::Created;
        }

        let Some(target) = target else {
            return DropOutcome::Ignored;
        };
        let compartment = tree
            .parent_of(target)
            .filter(|parent| {
                self.context
                    .diagram
                    .description(parent.description_id())
                    .is_some_and(|description| description.role() == NodeRole::Compartment)
            })
            .map(|parent| parent.id());
        match compartment {
            Some(compartment) if self.create_in(tree, element, Some(compartment), query) => {
                debug!(element:% = element.id(), compartment:% = compartment; "Dropped into owning compartment");
                DropOutcome::CreatedInCompartment
            }
            _ => DropOutcome::Ignored,
        }
    }

    fn drop_relationship(&self, tree: &mut DiagramTree, element: &SemanticElement) -> DropOutcome {
        let model = self.context.model;
        let Some(provider) = self
            .context
            .endpoints
            .provider_for(self.context.hierarchy, element.type_name())
        else {
            // Unreachable through the dispatch table, which rejects unwired types.
            error!(element:% = element.id(); "Relationship has no endpoint provider");
            return DropOutcome::Ignored;
        };

        let mut endpoints: Vec<Id> = Vec::new();
        for endpoint in provider
            .source_of(model, element)
            .into_iter()
            .chain(provider.targets_of(model, element))
        {
            if !endpoints.contains(&endpoint) {
                endpoints.push(endpoint);
            }
        }

        let mut created = 0;
        for endpoint in endpoints {
            let Some(endpoint) = model.element(endpoint) else {
                debug!(endpoint:% = endpoint; "Endpoint is not part of the model");
                continue;
            };
            if search::find_bound_element(tree, endpoint.id()).is_some() {
                continue;
            }
            if self.create_endpoint(tree, endpoint) {
                created += 1;
            }
        }

        debug!(element:% = element.id(), created; "Relationship endpoints ensured");
        DropOutcome::Endpoints { created }
    }

    fn create_endpoint(&self, tree: &mut DiagramTree, endpoint: &SemanticElement) -> bool {
        let Some(container) = self.logical_container(endpoint) else {
            debug!(endpoint:% = endpoint.id(); "Endpoint has no container");
            return false;
        };

        let query = Query::Type(endpoint.type_name());
        if container == tree.target() {
            return self.create_in(tree, endpoint, None, query);
        }

        // A container shown with compartments has several views; any of them
        // may host the endpoint.
        let hosts: Vec<ElementId> = search::find_bound_nodes(tree, container)
            .into_iter()
            .map(|view| view.id())
            .collect();
        if hosts.is_empty() {
            debug!(
                endpoint:% = endpoint.id(),
                container:% = container;
                "Endpoint container is not shown"
            );
            return false;
        }
        let created = hosts
            .into_iter()
            .any(|host| self.create_in(tree, endpoint, Some(host), query));
        if !created {
            debug!(
                endpoint:% = endpoint.id(),
                container:% = container;
                "No view of the endpoint container can host it"
            );
        }
        created
    }

    /// First grouping (partition, interruptible region, ...) the element
    /// belongs to, else its semantic container.
    fn logical_container(&self, element: &SemanticElement) -> Option<Id> {
        self.context
            .routing
            .grouping_references()
            .into_iter()
            .find_map(|reference| element.reference(reference).first().copied())
            .or(element.container())
    }
}
