//! Endpoint providers: where a relationship-like element starts and ends.

use std::fmt;

use log::trace;

use trellis_core::{
    identifier::Id,
    metamodel::TypeHierarchy,
    semantic::{Model, SemanticElement},
};

use crate::config::EndpointRule;

/// Computes the endpoints of relationship-like elements.
pub trait EndpointProvider: Send + Sync {
    /// The source endpoint, if any.
    fn source_of(&self, model: &Model, edge: &SemanticElement) -> Option<Id>;

    /// The target endpoints, in order.
    fn targets_of(&self, model: &Model, edge: &SemanticElement) -> Vec<Id>;
}

/// Endpoints reached by following reference paths from the relationship.
#[derive(Debug, Clone)]
pub struct ReferencePathEndpoints {
    source: Vec<Id>,
    targets: Vec<Vec<Id>>,
}

impl ReferencePathEndpoints {
    pub fn new(source: Vec<Id>, targets: Vec<Vec<Id>>) -> Self {
        Self { source, targets }
    }
}

impl From<&EndpointRule> for ReferencePathEndpoints {
    fn from(rule: &EndpointRule) -> Self {
        Self::new(rule.source_path(), rule.target_paths())
    }
}

impl EndpointProvider for ReferencePathEndpoints {
    fn source_of(&self, model: &Model, edge: &SemanticElement) -> Option<Id> {
        if self.source.is_empty() {
            return None;
        }
        model.follow(edge.id(), &self.source).into_iter().next()
    }

    fn targets_of(&self, model: &Model, edge: &SemanticElement) -> Vec<Id> {
        self.targets
            .iter()
            .filter(|path| !path.is_empty())
            .flat_map(|path| model.follow(edge.id(), path))
            .collect()
    }
}

/// Endpoint providers keyed by the relationship type they handle.
///
/// A type is served by the provider registered for its closest ancestor;
/// among equally close registrations the first one wins.
#[derive(Default)]
pub struct EndpointProviders {
    providers: Vec<(Id, Box<dyn EndpointProvider>)>,
}

impl EndpointProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Providers for every configured endpoint rule, in order.
    pub fn from_rules(rules: &[EndpointRule]) -> Self {
        let mut providers = Self::new();
        for rule in rules {
            providers.register(rule.type_name(), ReferencePathEndpoints::from(rule));
        }
        providers
    }

    /// Registers a provider for `type_name` and its subtypes.
    pub fn register(&mut self, type_name: Id, provider: impl EndpointProvider + 'static) {
        self.providers.push((type_name, Box::new(provider)));
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// The provider serving `ty`, if any.
    pub fn provider_for(&self, hierarchy: &dyn TypeHierarchy, ty: Id) -> Option<&dyn EndpointProvider> {
        let (registered, provider) = self
            .providers
            .iter()
            .filter_map(|(registered, provider)| {
                hierarchy
                    .ancestor_distance(ty, *registered)
                    .map(|distance| (distance, registered, provider))
            })
            .min_by_key(|(distance, _, _)| *distance)
            .map(|(_, registered, provider)| (registered, provider))?;
        trace!(type_name:% = ty, provider_type:% = registered; "Endpoint provider selected");
        Some(provider.as_ref())
    }
}

impl fmt::Debug for EndpointProviders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointProviders")
            .field(
                "types",
                &self.providers.iter().map(|(ty, _)| *ty).collect::<Vec<_>>(),
            )
            .finish()
    }
}
