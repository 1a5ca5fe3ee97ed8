//! Configuration types for the projection engine.
//!
//! This module provides configuration structures that control how mapping
//! descriptions are classified and how drop requests are routed. All types
//! implement [`serde::Deserialize`] for loading from TOML.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining naming and routing settings.
//! - [`NamingConfig`] - Name suffixes used to detect compartment and placeholder descriptions.
//! - [`RoutingConfig`] - Relationship concept, edge-like types, grouping references,
//!   import rules and endpoint rules used by the drop router.
//!
//! # Example
//!
//! ```
//! # use trellis::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.naming().compartment_suffix(), "_CompartmentNode");
//! assert_eq!(config.routing().relationship_concept(), "Relationship");
//! ```

use serde::Deserialize;

use trellis_core::identifier::Id;

/// Top-level configuration combining naming and routing settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Naming configuration section.
    #[serde(default)]
    naming: NamingConfig,

    /// Routing configuration section.
    #[serde(default)]
    routing: RoutingConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified sections.
    pub fn new(naming: NamingConfig, routing: RoutingConfig) -> Self {
        Self { naming, routing }
    }

    /// Returns the naming configuration.
    pub fn naming(&self) -> &NamingConfig {
        &self.naming
    }

    /// Returns the routing configuration.
    pub fn routing(&self) -> &RoutingConfig {
        &self.routing
    }
}

/// Name suffixes recognizing special descriptions.
///
/// Only consulted for descriptions that declare no explicit role flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    compartment_suffix: String,
    placeholder_suffix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            compartment_suffix: "_CompartmentNode".to_string(),
            placeholder_suffix: "_FakeNode".to_string(),
        }
    }
}

impl NamingConfig {
    /// Creates a naming configuration with the given suffixes.
    pub fn new(compartment_suffix: impl Into<String>, placeholder_suffix: impl Into<String>) -> Self {
        Self {
            compartment_suffix: compartment_suffix.into(),
            placeholder_suffix: placeholder_suffix.into(),
        }
    }

    /// Suffix of compartment description names.
    pub fn compartment_suffix(&self) -> &str {
        &self.compartment_suffix
    }

    /// Suffix of placeholder description names.
    pub fn placeholder_suffix(&self) -> &str {
        &self.placeholder_suffix
    }
}

/// Import-like relationship projected through a fixed mapping name.
///
/// Dropping an element of `type_name` (or a subtype) creates a view of the
/// element found through `reference`, using the mapping named `mapping`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportRule {
    #[serde(rename = "type")]
    type_name: String,
    reference: String,
    mapping: String,
}

impl ImportRule {
    pub fn new(
        type_name: impl Into<String>,
        reference: impl Into<String>,
        mapping: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            reference: reference.into(),
            mapping: mapping.into(),
        }
    }

    pub fn type_name(&self) -> Id {
        Id::new(&self.type_name)
    }

    pub fn reference(&self) -> Id {
        Id::new(&self.reference)
    }

    pub fn mapping(&self) -> Id {
        Id::new(&self.mapping)
    }
}

/// Endpoints of a relationship type, as dotted reference paths.
///
/// `sendEvent.covered` follows `sendEvent` from the relationship, then
/// `covered` from every element reached.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndpointRule {
    #[serde(rename = "type")]
    type_name: String,
    source: String,
    #[serde(default)]
    targets: Vec<String>,
}

impl EndpointRule {
    pub fn new(type_name: impl Into<String>, source: impl Into<String>, targets: &[&str]) -> Self {
        Self {
            type_name: type_name.into(),
            source: source.into(),
            targets: targets.iter().map(|target| target.to_string()).collect(),
        }
    }

    pub fn type_name(&self) -> Id {
        Id::new(&self.type_name)
    }

    /// The source reference path, split on dots.
    pub fn source_path(&self) -> Vec<Id> {
        split_path(&self.source)
    }

    /// The target reference paths, split on dots.
    pub fn target_paths(&self) -> Vec<Vec<Id>> {
        self.targets.iter().map(|path| split_path(path)).collect()
    }
}

fn split_path(path: &str) -> Vec<Id> {
    path.split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(Id::new)
        .collect()
}

/// Drop routing configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    relationship_concept: String,
    edge_like_types: Vec<String>,
    grouping_references: Vec<String>,
    imports: Vec<ImportRule>,
    endpoints: Vec<EndpointRule>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            relationship_concept: "Relationship".to_string(),
            edge_like_types: ["ActivityEdge", "Message", "Transition"]
                .map(String::from)
                .to_vec(),
            grouping_references: ["inPartition", "inInterruptibleRegion"]
                .map(String::from)
                .to_vec(),
            imports: vec![
                ImportRule::new("ElementImport", "importedElement", "Imported_Element"),
                ImportRule::new("PackageImport", "importedPackage", "Imported_Package"),
            ],
            endpoints: vec![
                EndpointRule::new("Relationship", "source", &["target"]),
                EndpointRule::new("Generalization", "specific", &["general"]),
                EndpointRule::new("Dependency", "client", &["supplier"]),
                EndpointRule::new("Association", "memberEnd.type", &["memberEnd.type"]),
                EndpointRule::new("ActivityEdge", "source", &["target"]),
                EndpointRule::new("Transition", "source", &["target"]),
                EndpointRule::new("Message", "sendEvent.covered", &["receiveEvent.covered"]),
            ],
        }
    }
}

impl RoutingConfig {
    /// The concept whose subtypes are relationship-like.
    pub fn relationship_concept(&self) -> Id {
        Id::new(&self.relationship_concept)
    }

    /// Types routed as relationships even outside the relationship concept.
    pub fn edge_like_types(&self) -> Vec<Id> {
        self.edge_like_types.iter().map(Id::from).collect()
    }

    /// References naming a logical grouping (partition, region), tried in
    /// order before the semantic container.
    pub fn grouping_references(&self) -> Vec<Id> {
        self.grouping_references.iter().map(Id::from).collect()
    }

    pub fn imports(&self) -> &[ImportRule] {
        &self.imports
    }

    pub fn endpoints(&self) -> &[EndpointRule] {
        &self.endpoints
    }

    /// Replace the endpoint rules.
    pub fn with_endpoints(mut self, endpoints: Vec<EndpointRule>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Replace the import rules.
    pub fn with_imports(mut self, imports: Vec<ImportRule>) -> Self {
        self.imports = imports;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();

        assert_eq!(config.naming().placeholder_suffix(), "_FakeNode");
        assert_eq!(config.routing().edge_like_types().len(), 3);
        assert_eq!(config.routing().imports().len(), 2);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [naming]
            compartment_suffix = "_Compartment"

            [routing]
            grouping_references = ["inLane"]
            "#,
        )
        .unwrap();

        assert_eq!(config.naming().compartment_suffix(), "_Compartment");
        assert_eq!(config.naming().placeholder_suffix(), "_FakeNode");
        assert_eq!(config.routing().grouping_references(), vec![Id::new("inLane")]);
        assert_eq!(config.routing().relationship_concept(), "Relationship");
    }

    #[test]
    fn test_endpoint_rules_from_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [[routing.endpoints]]
            type = "Message"
            source = "sendEvent.covered"
            targets = ["receiveEvent.covered"]
            "#,
        )
        .unwrap();

        let rules = config.routing().endpoints();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].type_name(), "Message");
        assert_eq!(
            rules[0].source_path(),
            vec![Id::new("sendEvent"), Id::new("covered")]
        );
        assert_eq!(
            rules[0].target_paths(),
            vec![vec![Id::new("receiveEvent"), Id::new("covered")]]
        );
    }

    #[test]
    fn test_split_path_ignores_empty_segments() {
        assert_eq!(split_path("a..b "), vec![Id::new("a"), Id::new("b")]);
        assert!(split_path("").is_empty());
    }
}
