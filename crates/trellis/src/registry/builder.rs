use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, info};

use trellis_core::{
    diagram::ContainmentKind,
    identifier::{DescriptionId, Id},
    metamodel::TypeHierarchy,
};

use super::{
    DiagramDescription, EdgeDescription, MappingDescription, MappingRegistry, NodeRole,
    declaration::{DiagramDeclaration, EdgeDeclaration, NodeDeclaration},
};
use crate::{
    config::NamingConfig,
    error::{BuildError, Diagnostic, DiagnosticCollector, ErrorCode},
};

/// Builds a [`MappingRegistry`] from declarations.
///
/// All declarations are validated in one pass and every problem is reported:
/// blank or duplicate names, declared ids that differ from the name-derived
/// id, and references to undeclared descriptions are fatal; descriptions whose
/// domain type is unknown to the metamodel only produce a warning.
///
/// # Examples
///
/// ```
/// use trellis::registry::{DiagramDeclaration, MappingRegistry, NodeDeclaration};
/// use trellis_core::metamodel::Metamodel;
///
/// let metamodel = Metamodel::builder("Element")
///     .with_type("Element", &[])
///     .with_type("Package", &["Element"])
///     .build()
///     .expect("valid hierarchy");
///
/// let registry = MappingRegistry::builder()
///     .with_diagram(
///         DiagramDeclaration::new("Class Diagram", "Package")
///             .with_node(NodeDeclaration::new("CD_Package", "Package")),
///     )
///     .build(&metamodel)
///     .expect("valid declarations");
///
/// let diagram = registry.diagram("Class Diagram").expect("declared");
/// assert!(diagram.description_by_name("CD_Package").is_some());
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    naming: NamingConfig,
    diagrams: Vec<DiagramDeclaration>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suffixes used to detect roles of descriptions without explicit flags.
    pub fn with_naming(mut self, naming: NamingConfig) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_diagram(mut self, diagram: DiagramDeclaration) -> Self {
        self.add_diagram(diagram);
        self
    }

    pub fn add_diagram(&mut self, diagram: DiagramDeclaration) {
        self.diagrams.push(diagram);
    }

    /// Validates every declaration and freezes the registry.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] holding every diagnostic when any
    /// error-severity problem was found.
    pub fn build<H>(self, hierarchy: &H) -> Result<MappingRegistry, BuildError>
    where
        H: TypeHierarchy + ?Sized,
    {
        let known_types: HashSet<Id> = hierarchy.known_types().into_iter().collect();
        let mut collector = DiagnosticCollector::new();
        let mut diagrams = IndexMap::new();

        for declaration in &self.diagrams {
            if declaration.name.trim().is_empty() {
                collector.emit(
                    Diagnostic::error("diagram name is blank")
                        .with_code(ErrorCode::E001)
                        .with_help("give every diagram kind a name"),
                );
                continue;
            }
            let name = Id::new(&declaration.name);
            if diagrams.contains_key(&name) {
                collector.emit(
                    Diagnostic::error(format!(
                        "diagram `{}` is declared more than once",
                        declaration.name
                    ))
                    .with_code(ErrorCode::E002)
                    .with_subject(&declaration.name),
                );
                continue;
            }

            let mut state = DiagramState {
                naming: &self.naming,
                known_types: &known_types,
                collector: &mut collector,
                nodes: IndexMap::new(),
                edges: IndexMap::new(),
                pending_reuse: Vec::new(),
            };
            let diagram = state.build_diagram(declaration);
            debug!(
                diagram:% = diagram.name,
                descriptions_count = diagram.len();
                "Diagram description built"
            );
            diagrams.insert(name, diagram);
        }

        collector.finish()?;
        info!(diagrams_count = diagrams.len(); "Mapping registry built");
        Ok(MappingRegistry { diagrams })
    }
}

struct PendingReuse {
    owner: DescriptionId,
    names: Vec<String>,
    border: bool,
    subject: String,
}

struct DiagramState<'a> {
    naming: &'a NamingConfig,
    known_types: &'a HashSet<Id>,
    collector: &'a mut DiagnosticCollector,
    nodes: IndexMap<DescriptionId, MappingDescription>,
    edges: IndexMap<DescriptionId, EdgeDescription>,
    pending_reuse: Vec<PendingReuse>,
}

impl DiagramState<'_> {
    fn build_diagram(&mut self, declaration: &DiagramDeclaration) -> DiagramDescription {
        self.check_domain_type(&declaration.target_type, &declaration.name);

        let top_level = declaration
            .nodes
            .iter()
            .filter_map(|node| self.register_node(node, ContainmentKind::Child, &declaration.name))
            .collect();
        self.resolve_reuse();
        for edge in &declaration.edges {
            self.register_edge(edge, &declaration.name);
        }

        DiagramDescription {
            id: DescriptionId::from_name(&declaration.name),
            name: Id::new(&declaration.name),
            target_type: Id::new(&declaration.target_type),
            top_level,
            nodes: std::mem::take(&mut self.nodes),
            edges: std::mem::take(&mut self.edges),
        }
    }

    fn register_node(
        &mut self,
        declaration: &NodeDeclaration,
        containment: ContainmentKind,
        parent_path: &str,
    ) -> Option<DescriptionId> {
        let subject = format!("{parent_path}/{}", declaration.name);
        let id = self.claim_name(&declaration.name, declaration.id.as_deref(), &subject)?;
        self.check_domain_type(&declaration.domain_type, &subject);

        let name = Id::new(&declaration.name);
        let role = self.role_of(declaration, name);
        self.nodes.insert(
            id,
            MappingDescription {
                id,
                name,
                domain_type: Id::new(&declaration.domain_type),
                containment,
                synchronization: declaration.synchronization,
                role,
                children: Vec::new(),
                border_children: Vec::new(),
                reused_children: Vec::new(),
                reused_border_children: Vec::new(),
            },
        );

        let children: Vec<_> = declaration
            .children
            .iter()
            .filter_map(|child| self.register_node(child, ContainmentKind::Child, &subject))
            .collect();
        let border_children: Vec<_> = declaration
            .borders
            .iter()
            .filter_map(|border| self.register_node(border, ContainmentKind::Border, &subject))
            .collect();
        if let Some(description) = self.nodes.get_mut(&id) {
            description.children = children;
            description.border_children = border_children;
        }

        for (names, border) in [
            (&declaration.reused_children, false),
            (&declaration.reused_borders, true),
        ] {
            if !names.is_empty() {
                self.pending_reuse.push(PendingReuse {
                    owner: id,
                    names: names.clone(),
                    border,
                    subject: subject.clone(),
                });
            }
        }

        Some(id)
    }

    fn register_edge(&mut self, declaration: &EdgeDeclaration, parent_path: &str) {
        let subject = format!("{parent_path}/{}", declaration.name);
        let Some(id) = self.claim_name(&declaration.name, declaration.id.as_deref(), &subject)
        else {
            return;
        };
        self.check_domain_type(&declaration.domain_type, &subject);

        let sources = self.resolve_names(&declaration.sources, &subject);
        let targets = self.resolve_names(&declaration.targets, &subject);
        self.edges.insert(
            id,
            EdgeDescription {
                id,
                name: Id::new(&declaration.name),
                domain_type: Id::new(&declaration.domain_type),
                sources,
                targets,
            },
        );
    }

    /// Checks name and declared id, then reserves the name.
    fn claim_name(&mut self, name: &str, declared: Option<&str>, subject: &str) -> Option<DescriptionId> {
        if name.trim().is_empty() {
            self.collector.emit(
                Diagnostic::error("description name is blank")
                    .with_code(ErrorCode::E001)
                    .with_subject(subject)
                    .with_help("give every description a non-blank name"),
            );
            return None;
        }

        let id = DescriptionId::from_name(name);
        if self.nodes.contains_key(&id) || self.edges.contains_key(&id) {
            self.collector.emit(
                Diagnostic::error(format!("description `{name}` is declared more than once"))
                    .with_code(ErrorCode::E002)
                    .with_subject(subject)
                    .with_help("description names must be unique within a diagram kind"),
            );
            return None;
        }

        if let Some(declared) = declared {
            let matches = declared
                .parse::<DescriptionId>()
                .is_ok_and(|declared| declared == id);
            if !matches {
                self.collector.emit(
                    Diagnostic::error(format!(
                        "declared id `{declared}` of description `{name}` does not match `{id}`"
                    ))
                    .with_code(ErrorCode::E003)
                    .with_subject(subject)
                    .with_help("ids derive from description names; remove the declared id or fix it"),
                );
            }
        }

        Some(id)
    }

    fn check_domain_type(&mut self, domain_type: &str, subject: &str) {
        if !self.known_types.contains(&Id::new(domain_type)) {
            self.collector.emit(
                Diagnostic::warning(format!(
                    "domain type `{domain_type}` is not part of the metamodel"
                ))
                .with_code(ErrorCode::E005)
                .with_subject(subject)
                .with_help("this description can never match a semantic element"),
            );
        }
    }

    fn role_of(&self, declaration: &NodeDeclaration, name: Id) -> NodeRole {
        match (declaration.placeholder, declaration.compartment) {
            (Some(true), _) => NodeRole::Placeholder,
            (_, Some(true)) => NodeRole::Compartment,
            (Some(false), Some(false)) => NodeRole::Regular,
            (placeholder, compartment) => {
                if placeholder.is_none() && name.ends_with(self.naming.placeholder_suffix()) {
                    NodeRole::Placeholder
                } else if compartment.is_none() && name.ends_with(self.naming.compartment_suffix()) {
                    NodeRole::Compartment
                } else {
                    NodeRole::Regular
                }
            }
        }
    }

    fn resolve_reuse(&mut self) {
        for pending in std::mem::take(&mut self.pending_reuse) {
            let resolved = self.resolve_names(&pending.names, &pending.subject);
            if let Some(owner) = self.nodes.get_mut(&pending.owner) {
                if pending.border {
                    owner.reused_border_children = resolved;
                } else {
                    owner.reused_children = resolved;
                }
            }
        }
    }

    fn resolve_names(&mut self, names: &[String], subject: &str) -> Vec<DescriptionId> {
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let id = DescriptionId::from_name(name);
            if self.nodes.contains_key(&id) {
                resolved.push(id);
            } else {
                self.collector.emit(
                    Diagnostic::error(format!("description `{name}` is not declared"))
                        .with_code(ErrorCode::E004)
                        .with_subject(subject)
                        .with_help("only node descriptions of the same diagram kind can be referenced"),
                );
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use trellis_core::metamodel::Metamodel;

    use super::*;
    use crate::error::Severity;

    fn metamodel() -> Metamodel {
        Metamodel::builder("Element")
            .with_type("Element", &[])
            .with_type("Package", &["Element"])
            .with_type("Class", &["Element"])
            .with_type("Comment", &["Element"])
            .with_type("Port", &["Element"])
            .with_type("Generalization", &["Element"])
            .build()
            .expect("valid hierarchy")
    }

    fn class_diagram() -> DiagramDeclaration {
        DiagramDeclaration::new("Class Diagram", "Package")
            .with_node(
                NodeDeclaration::new("CD_Package", "Package")
                    .with_child(
                        NodeDeclaration::new("CD_Class", "Class")
                            .with_border(NodeDeclaration::new("CD_Port", "Port"))
                            .with_child(NodeDeclaration::new("CD_Class_Operations_CompartmentNode", "Class")),
                    )
                    .reusing_child("CD_Comment"),
            )
            .with_node(NodeDeclaration::new("CD_Comment", "Comment"))
            .with_edge(
                EdgeDeclaration::new("CD_Generalization", "Generalization")
                    .from_source("CD_Class")
                    .to_target("CD_Class"),
            )
    }

    fn codes(err: &BuildError) -> Vec<ErrorCode> {
        err.diagnostics().iter().filter_map(Diagnostic::code).collect()
    }

    #[test]
    fn test_build_nests_descriptions() {
        let registry = RegistryBuilder::new()
            .with_diagram(class_diagram())
            .build(&metamodel())
            .unwrap();
        let diagram = registry.diagram("Class Diagram").unwrap();

        let top: Vec<_> = diagram.top_level().map(|d| d.name()).collect();
        assert_eq!(top, vec![Id::new("CD_Package"), Id::new("CD_Comment")]);

        let package = diagram.description_by_name("CD_Package").unwrap();
        let comment = diagram.description_by_name("CD_Comment").unwrap();
        assert_eq!(package.reused_children(), &[comment.id()]);

        let class = diagram.description_by_name("CD_Class").unwrap();
        let port = diagram.description_by_name("CD_Port").unwrap();
        assert_eq!(port.containment(), ContainmentKind::Border);
        assert_eq!(
            diagram.containment_in(Some(class.id()), port.id()),
            ContainmentKind::Border
        );
        assert_eq!(diagram.containment_in(None, port.id()), ContainmentKind::Child);

        let edge = diagram.edge_by_name("CD_Generalization").unwrap();
        assert!(edge.connects(class.id(), class.id()));
    }

    #[test]
    fn test_roles_from_suffix_and_flags() {
        let registry = RegistryBuilder::new()
            .with_diagram(
                DiagramDeclaration::new("D", "Package")
                    .with_node(NodeDeclaration::new("A_CompartmentNode", "Class"))
                    .with_node(NodeDeclaration::new("B_FakeNode", "Class"))
                    .with_node(NodeDeclaration::new("C_Items", "Class").compartment(true))
                    .with_node(NodeDeclaration::new("D_CompartmentNode", "Class").compartment(false)),
            )
            .build(&metamodel())
            .unwrap();
        let diagram = registry.diagram("D").unwrap();
        let role = |name: &str| diagram.description_by_name(name).unwrap().role();

        assert_eq!(role("A_CompartmentNode"), NodeRole::Compartment);
        assert_eq!(role("B_FakeNode"), NodeRole::Placeholder);
        assert_eq!(role("C_Items"), NodeRole::Compartment);
        assert_eq!(role("D_CompartmentNode"), NodeRole::Regular);
    }

    #[test]
    fn test_blank_and_duplicate_names_are_fatal() {
        let err = RegistryBuilder::new()
            .with_diagram(
                DiagramDeclaration::new("D", "Package")
                    .with_node(NodeDeclaration::new("  ", "Class"))
                    .with_node(NodeDeclaration::new("CD_Class", "Class"))
                    .with_node(
                        NodeDeclaration::new("CD_Package", "Package")
                            .with_child(NodeDeclaration::new("CD_Class", "Class")),
                    ),
            )
            .build(&metamodel())
            .unwrap_err();

        assert_eq!(codes(&err), vec![ErrorCode::E001, ErrorCode::E002]);
        assert_eq!(err.diagnostics()[1].subject(), Some("D/CD_Package/CD_Class"));
    }

    #[test]
    fn test_declared_id_is_checked() {
        let good = DescriptionId::from_name("CD_Class").to_string();
        let registry = RegistryBuilder::new()
            .with_diagram(
                DiagramDeclaration::new("D", "Package")
                    .with_node(NodeDeclaration::new("CD_Class", "Class").with_declared_id(good)),
            )
            .build(&metamodel());
        assert!(registry.is_ok());

        let wrong = DescriptionId::from_name("CD_Comment").to_string();
        let err = RegistryBuilder::new()
            .with_diagram(
                DiagramDeclaration::new("D", "Package")
                    .with_node(NodeDeclaration::new("CD_Class", "Class").with_declared_id(wrong))
                    .with_node(NodeDeclaration::new("CD_Note", "Comment").with_declared_id("garbage")),
            )
            .build(&metamodel())
            .unwrap_err();
        assert_eq!(codes(&err), vec![ErrorCode::E003, ErrorCode::E003]);
    }

    #[test]
    fn test_unknown_references_are_fatal() {
        let err = RegistryBuilder::new()
            .with_diagram(
                DiagramDeclaration::new("D", "Package")
                    .with_node(NodeDeclaration::new("CD_Package", "Package").reusing_border("CD_Missing"))
                    .with_edge(EdgeDeclaration::new("CD_Link", "Generalization").to_target("CD_Ghost")),
            )
            .build(&metamodel())
            .unwrap_err();

        assert_eq!(codes(&err), vec![ErrorCode::E004, ErrorCode::E004]);
    }

    #[test]
    fn test_unknown_domain_type_is_a_warning() {
        let registry = RegistryBuilder::new()
            .with_diagram(
                DiagramDeclaration::new("D", "Package")
                    .with_node(NodeDeclaration::new("CD_Widget", "Widget")),
            )
            .build(&metamodel());

        assert!(registry.is_ok());
    }

    #[test]
    fn test_warnings_are_kept_with_errors() {
        let err = RegistryBuilder::new()
            .with_diagram(
                DiagramDeclaration::new("D", "Package")
                    .with_node(NodeDeclaration::new("CD_Widget", "Widget"))
                    .with_node(NodeDeclaration::new("", "Class")),
            )
            .build(&metamodel())
            .unwrap_err();

        assert_eq!(err.diagnostics()[0].severity(), Severity::Warning);
        assert_eq!(err.diagnostics()[1].code(), Some(ErrorCode::E001));
    }

    #[test]
    fn test_duplicate_diagram_names() {
        let err = RegistryBuilder::new()
            .with_diagram(DiagramDeclaration::new("D", "Package"))
            .with_diagram(DiagramDeclaration::new("D", "Package"))
            .build(&metamodel())
            .unwrap_err();

        assert_eq!(codes(&err), vec![ErrorCode::E002]);
    }

    #[test]
    fn test_rebuild_yields_identical_ids() {
        let first = RegistryBuilder::new()
            .with_diagram(class_diagram())
            .build(&metamodel())
            .unwrap();
        let second = RegistryBuilder::new()
            .with_diagram(class_diagram())
            .build(&metamodel())
            .unwrap();

        let ids = |registry: &MappingRegistry| -> Vec<DescriptionId> {
            registry
                .diagrams()
                .flat_map(|diagram| diagram.descriptions().map(MappingDescription::id))
                .collect()
        };
        assert_eq!(ids(&first), ids(&second));
    }
}
