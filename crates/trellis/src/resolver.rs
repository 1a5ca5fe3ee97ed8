//! Candidate resolution: which mapping descriptions can host a semantic
//! element in a given graphical context.

use log::{debug, info};

use trellis_core::{
    identifier::{DescriptionId, Id},
    metamodel::TypeHierarchy,
};

use crate::registry::{DiagramDescription, MappingDescription};

/// Where a new view would be nested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingContext {
    /// Directly under the diagram.
    Root,
    /// Under a view created from the given description.
    Description(DescriptionId),
}

/// What the caller is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// Descriptions accepting this semantic type.
    Type(Id),
    /// The description with this name, whatever its accepted type.
    Name(Id),
}

/// A candidate with its specificity distance; smaller is more specific.
#[derive(Debug, Clone, Copy)]
pub struct Ranked<'a> {
    description: &'a MappingDescription,
    distance: usize,
}

impl<'a> Ranked<'a> {
    pub fn description(&self) -> &'a MappingDescription {
        self.description
    }

    pub fn distance(&self) -> usize {
        self.distance
    }
}

/// Ranks the descriptions of one diagram kind against queries.
///
/// Resolution is pure: it reads the registry and the hierarchy and only logs.
/// Placeholder descriptions are never returned.
#[derive(Clone, Copy)]
pub struct CandidateResolver<'a> {
    diagram: &'a DiagramDescription,
    hierarchy: &'a dyn TypeHierarchy,
}

impl<'a> CandidateResolver<'a> {
    pub fn new(diagram: &'a DiagramDescription, hierarchy: &'a dyn TypeHierarchy) -> Self {
        Self { diagram, hierarchy }
    }

    /// Compatible descriptions in `context`, best first.
    ///
    /// Type queries keep candidates whose accepted type is the queried type or
    /// one of its ancestors, ordered by hop count; ties keep declaration
    /// order. Candidates whose accepted type does not descend from the root
    /// concept are excluded. An empty result means nothing fits here.
    pub fn resolve(&self, context: MappingContext, query: Query) -> Vec<Ranked<'a>> {
        let candidates = self.candidates(context);
        let ranked = match query {
            Query::Type(ty) => self.rank_by_type(candidates, ty),
            Query::Name(name) => {
                let matches: Vec<_> = candidates
                    .into_iter()
                    .filter(|description| description.name() == name)
                    .map(|description| Ranked {
                        description,
                        distance: 0,
                    })
                    .collect();
                if matches.len() > 1 {
                    info!(
                        name:% = name,
                        matches_count = matches.len();
                        "Several descriptions share the requested name, using the first declared"
                    );
                }
                matches
            }
        };

        debug!(
            context:? = context,
            query:? = query,
            candidates_count = ranked.len();
            "Resolved candidates"
        );
        ranked
    }

    /// The best candidate, if any.
    pub fn best(&self, context: MappingContext, query: Query) -> Option<&'a MappingDescription> {
        self.resolve(context, query)
            .first()
            .map(Ranked::description)
    }

    fn candidates(&self, context: MappingContext) -> Vec<&'a MappingDescription> {
        let diagram = self.diagram;
        let candidates: Vec<_> = match context {
            MappingContext::Root => diagram.top_level().collect(),
            MappingContext::Description(id) => match diagram.description(id) {
                Some(parent) => parent
                    .nested()
                    .filter_map(|child| diagram.description(child))
                    .collect(),
                None => {
                    debug!(description_id:% = id; "Unknown description context");
                    Vec::new()
                }
            },
        };
        candidates
            .into_iter()
            .filter(|description| !description.is_placeholder())
            .collect()
    }

    fn rank_by_type(&self, candidates: Vec<&'a MappingDescription>, ty: Id) -> Vec<Ranked<'a>> {
        let root = self.hierarchy.root_concept();
        let mut ranked: Vec<_> = candidates
            .into_iter()
            .filter(|description| self.hierarchy.is_subtype_of(description.domain_type(), root))
            .filter_map(|description| {
                self.hierarchy
                    .ancestor_distance(ty, description.domain_type())
                    .map(|distance| Ranked {
                        description,
                        distance,
                    })
            })
            .collect();
        // Stable: equal distances keep declaration order.
        ranked.sort_by_key(Ranked::distance);
        ranked
    }
}
