//! Declarative scenarios: a metamodel, mapping declarations, a semantic model
//! and a list of drops, in one TOML document.
//!
//! Loading runs every stage and reports all diagnostics of the first stage
//! that fails:
//! 1. TOML syntax (`E300`)
//! 2. metamodel declarations (`E1xx`)
//! 3. mapping declarations (`E0xx`)
//! 4. the semantic model (`E2xx`)
//! 5. drop requests (`E3xx`)

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Deserialize;

use trellis_core::{
    diagram::DiagramTree,
    identifier::{DescriptionId, ElementId, Id},
    metamodel::{Metamodel, MetamodelError},
    semantic::{Model, ModelError, ModelIdentity, SemanticElement},
};

use crate::{
    config::AppConfig,
    error::{BuildError, Diagnostic, DiagnosticCollector, ErrorCode, TrellisError},
    registry::{DiagramDeclaration, MappingRegistry},
    router::{DropOutcome, DropRouter, EditingContext, EndpointProviders},
    search,
};

#[derive(Debug, Deserialize)]
struct ScenarioDocument {
    diagram: String,
    metamodel: MetamodelDocument,
    #[serde(default)]
    diagrams: Vec<DiagramDeclaration>,
    model: ModelDocument,
    #[serde(default)]
    drops: Vec<DropDocument>,
}

#[derive(Debug, Deserialize)]
struct MetamodelDocument {
    root: String,
    #[serde(default)]
    types: Vec<TypeDocument>,
}

#[derive(Debug, Deserialize)]
struct TypeDocument {
    name: String,
    #[serde(default)]
    supertypes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ModelDocument {
    root: String,
    #[serde(default)]
    elements: Vec<ElementDocument>,
}

#[derive(Debug, Deserialize)]
struct ElementDocument {
    id: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    container: Option<String>,
    #[serde(default)]
    references: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct DropDocument {
    element: String,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    target_mapping: Option<String>,
    #[serde(default)]
    mapping: Option<String>,
}

/// One drop of a scenario.
///
/// The target names a semantic element whose bound view receives the drop.
/// When several views show that element, `target_mapping` names the
/// description of the intended one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioDrop {
    pub element: Id,
    pub target: Option<Id>,
    pub target_mapping: Option<DescriptionId>,
    pub mapping: Option<Id>,
}

/// A fully validated scenario.
#[derive(Debug)]
pub struct Scenario {
    metamodel: Metamodel,
    registry: MappingRegistry,
    model: Model,
    diagram: Id,
    drops: Vec<ScenarioDrop>,
}

impl Scenario {
    /// Parses and validates a scenario document.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Registry`] for invalid mapping declarations
    /// and [`TrellisError::Load`] for every other invalid input.
    pub fn from_toml(source: &str, config: &AppConfig) -> Result<Self, TrellisError> {
        let document: ScenarioDocument = toml::from_str(source).map_err(|err| {
            TrellisError::Load(BuildError::from(
                Diagnostic::error(err.to_string().trim_end())
                    .with_code(ErrorCode::E300)
                    .with_help("check the scenario against the documented TOML layout"),
            ))
        })?;

        let metamodel = build_metamodel(&document.metamodel).map_err(TrellisError::Load)?;

        let mut registry = MappingRegistry::builder().with_naming(config.naming().clone());
        for diagram in document.diagrams {
            registry.add_diagram(diagram);
        }
        let registry = registry.build(&metamodel).map_err(TrellisError::Registry)?;

        let model = build_model(&document.model, &metamodel).map_err(TrellisError::Load)?;

        let diagram = Id::new(&document.diagram);
        let drops = resolve_drops(&document.drops, &model, &registry, &document.diagram)
            .map_err(TrellisError::Load)?;

        info!(
            diagram:% = diagram,
            types_count = metamodel.len(),
            elements_count = model.len(),
            drops_count = drops.len();
            "Scenario loaded"
        );
        Ok(Self {
            metamodel,
            registry,
            model,
            diagram,
            drops,
        })
    }

    pub fn metamodel(&self) -> &Metamodel {
        &self.metamodel
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Name of the diagram kind to open.
    pub fn diagram(&self) -> Id {
        self.diagram
    }

    pub fn drops(&self) -> &[ScenarioDrop] {
        &self.drops
    }

    /// Opens an empty diagram on the model root, replays every drop in order,
    /// then draws the edges of relationships whose endpoints ended up shown.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Wiring`] if the routing configuration leaves a
    /// relationship-like type without endpoint provider.
    pub fn replay(&self, config: &AppConfig) -> Result<(DiagramTree, Vec<DropOutcome>), TrellisError> {
        let diagram = self
            .registry
            .diagram(&self.diagram.name())
            .ok_or_else(|| TrellisError::Wiring(format!("diagram `{}` is not registered", self.diagram)))?;
        let identity = ModelIdentity::new(&self.model);
        let endpoints = EndpointProviders::from_rules(config.routing().endpoints());
        let router = DropRouter::new(EditingContext {
            diagram,
            hierarchy: &self.metamodel,
            model: &self.model,
            identity: &identity,
            endpoints: &endpoints,
            routing: config.routing(),
        })?;

        let mut tree = diagram.create_diagram(self.model.root());
        let mut outcomes = Vec::with_capacity(self.drops.len());
        for drop in &self.drops {
            let target = match drop.target {
                Some(target) => match locate_target(&tree, target, drop.target_mapping) {
                    Some(view) => Some(view),
                    None => {
                        warn!(element:% = drop.element, target:% = target; "Drop target is not shown");
                        outcomes.push(DropOutcome::Ignored);
                        continue;
                    }
                },
                None => None,
            };
            let Some(element) = self.model.element(drop.element) else {
                outcomes.push(DropOutcome::Ignored);
                continue;
            };
            let outcome = router.drop_element(&mut tree, element, target, drop.mapping);
            info!(element:% = drop.element, outcome:? = outcome; "Drop replayed");
            outcomes.push(outcome);
        }

        let edges_count = router.refresh_edges(&mut tree);
        info!(edges_count; "Diagram edges drawn");
        debug!(elements_count = tree.len(); "Scenario replayed");
        Ok((tree, outcomes))
    }

    /// Renders `tree` as an outline labelled with description names.
    pub fn render_outline(&self, tree: &DiagramTree) -> String {
        tree.outline(|id| self.registry.describe(id))
    }
}

fn locate_target(
    tree: &DiagramTree,
    target: Id,
    description: Option<DescriptionId>,
) -> Option<ElementId> {
    match description {
        Some(description) => search::find_view(tree, target, description),
        None => search::find_bound_element(tree, target),
    }
    .map(|view| view.id())
}

fn build_metamodel(document: &MetamodelDocument) -> Result<Metamodel, BuildError> {
    let mut builder = Metamodel::builder(document.root.as_str());
    for ty in &document.types {
        builder.add_type(Id::new(&ty.name), ty.supertypes.iter().map(Id::from).collect());
    }
    builder.build().map_err(|errors| {
        BuildError::new(errors.into_iter().map(metamodel_diagnostic).collect())
    })
}

fn metamodel_diagnostic(error: MetamodelError) -> Diagnostic {
    let (code, subject) = match &error {
        MetamodelError::UnknownSupertype { ty, .. } => (ErrorCode::E100, ty.to_string()),
        MetamodelError::DuplicateType(ty) => (ErrorCode::E101, ty.to_string()),
        MetamodelError::UnknownRootConcept(root) => (ErrorCode::E102, root.to_string()),
        MetamodelError::CyclicHierarchy(ty) => (ErrorCode::E103, ty.to_string()),
    };
    Diagnostic::error(error.to_string())
        .with_code(code)
        .with_subject(format!("metamodel/{subject}"))
}

fn build_model(document: &ModelDocument, metamodel: &Metamodel) -> Result<Model, BuildError> {
    let mut collector = DiagnosticCollector::new();
    let mut model = Model::new(document.root.as_str());
    for element in &document.elements {
        let mut semantic = SemanticElement::new(element.id.as_str(), element.type_name.as_str());
        if let Some(container) = &element.container {
            semantic = semantic.with_container(container.as_str());
        }
        for (reference, targets) in &element.references {
            semantic.add_reference(Id::new(reference), targets.iter().map(Id::from));
        }
        if let Err(err) = model.insert(semantic) {
            collector.emit(model_diagnostic(err));
        }
    }
    for err in model.validate(metamodel) {
        collector.emit(model_diagnostic(err));
    }
    collector.finish()?;
    Ok(model)
}

fn model_diagnostic(error: ModelError) -> Diagnostic {
    let (code, subject) = match &error {
        ModelError::DuplicateElement(id) => (ErrorCode::E200, *id),
        ModelError::UnknownType { element, .. } => (ErrorCode::E201, *element),
        ModelError::UnknownContainer { element, .. } => (ErrorCode::E202, *element),
        ModelError::UnknownReferenceTarget { element, .. } => (ErrorCode::E203, *element),
        ModelError::UnknownRoot(root) => (ErrorCode::E204, *root),
    };
    Diagnostic::error(error.to_string())
        .with_code(code)
        .with_subject(format!("model/{subject}"))
}

fn resolve_drops(
    documents: &[DropDocument],
    model: &Model,
    registry: &MappingRegistry,
    diagram: &str,
) -> Result<Vec<ScenarioDrop>, BuildError> {
    let mut collector = DiagnosticCollector::new();
    if registry.diagram(diagram).is_none() {
        collector.emit(
            Diagnostic::error(format!("diagram kind `{diagram}` is not declared"))
                .with_code(ErrorCode::E006)
                .with_subject(diagram)
                .with_help("open one of the kinds listed under [[diagrams]]"),
        );
    }

    let mut drops = Vec::with_capacity(documents.len());
    for (index, document) in documents.iter().enumerate() {
        let subject = format!("drops[{index}]");
        let element = Id::new(&document.element);
        if model.element(element).is_none() {
            collector.emit(
                Diagnostic::error(format!("dropped element `{element}` is not part of the model"))
                    .with_code(ErrorCode::E301)
                    .with_subject(&subject),
            );
        }
        let target = document.target.as_deref().map(Id::new);
        if let Some(target) = target.filter(|target| model.element(*target).is_none()) {
            collector.emit(
                Diagnostic::error(format!("drop target `{target}` is not part of the model"))
                    .with_code(ErrorCode::E302)
                    .with_subject(&subject),
            );
        }
        let target_mapping = document.target_mapping.as_deref().map(DescriptionId::from_name);
        if let (Some(name), Some(kind)) = (&document.target_mapping, registry.diagram(diagram)) {
            if kind.description_by_name(name).is_none() {
                collector.emit(
                    Diagnostic::error(format!("target mapping `{name}` is not declared"))
                        .with_code(ErrorCode::E004)
                        .with_subject(&subject),
                );
            }
        }
        drops.push(ScenarioDrop {
            element,
            target,
            target_mapping,
            mapping: document.mapping.as_deref().map(Id::new),
        });
    }

    collector.finish()?;
    Ok(drops)
}
