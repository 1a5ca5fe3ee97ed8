//! Per-type routing capabilities, computed once per metamodel.

use std::collections::HashMap;

use log::{debug, error};

use trellis_core::{identifier::Id, metamodel::TypeHierarchy};

use super::endpoints::EndpointProviders;
use crate::{config::RoutingConfig, error::TrellisError};

/// How drops of one semantic type are routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropKind {
    /// Project the element reached through `reference` with the mapping
    /// named `mapping`.
    Import { reference: Id, mapping: Id },
    /// Never drawn itself; ensures its endpoints are drawn.
    Relationship,
    /// Drawn through the candidate resolver.
    Default,
}

/// Capability set of every known type.
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    kinds: HashMap<Id, DropKind>,
}

impl DispatchTable {
    /// Classifies every type of `hierarchy`.
    ///
    /// Import rules take precedence over relationship-likeness; the closest
    /// import rule applies.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Wiring`] if a relationship-like type has no
    /// endpoint provider.
    pub fn build(
        hierarchy: &dyn TypeHierarchy,
        routing: &RoutingConfig,
        endpoints: &EndpointProviders,
    ) -> Result<Self, TrellisError> {
        let relationship = routing.relationship_concept();
        let edge_like = routing.edge_like_types();
        let mut kinds = HashMap::new();
        let mut unwired = Vec::new();

        for ty in hierarchy.known_types() {
            let import = routing
                .imports()
                .iter()
                .filter_map(|rule| {
                    hierarchy
                        .ancestor_distance(ty, rule.type_name())
                        .map(|distance| (distance, rule))
                })
                .min_by_key(|(distance, _)| *distance);

            let kind = if let Some((_, rule)) = import {
                DropKind::Import {
                    reference: rule.reference(),
                    mapping: rule.mapping(),
                }
            } else if hierarchy.is_subtype_of(ty, relationship)
                || edge_like.iter().any(|edge| hierarchy.is_subtype_of(ty, *edge))
            {
                if endpoints.provider_for(hierarchy, ty).is_none() {
                    unwired.push(ty);
                }
                DropKind::Relationship
            } else {
                DropKind::Default
            };
            kinds.insert(ty, kind);
        }

        if !unwired.is_empty() {
            let types = unwired
                .iter()
                .map(Id::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            error!(types; "Relationship-like types without endpoint provider");
            return Err(TrellisError::Wiring(format!(
                "no endpoint provider for relationship-like types: {types}"
            )));
        }

        debug!(types_count = kinds.len(); "Dispatch table built");
        Ok(Self { kinds })
    }

    /// The routing kind of `ty`; unknown types route by default.
    pub fn kind_of(&self, ty: Id) -> DropKind {
        self.kinds.get(&ty).copied().unwrap_or(DropKind::Default)
    }
}
