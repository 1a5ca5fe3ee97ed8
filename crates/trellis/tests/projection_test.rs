//! Integration tests for the projection engine's public API.

use trellis::{
    config::RoutingConfig,
    construction::ViewConstructor,
    diagram::{ContainmentKind, DiagramTree},
    identifier::{DescriptionId, Id},
    metamodel::Metamodel,
    registry::{DiagramDeclaration, MappingRegistry, NodeDeclaration},
    resolver::{CandidateResolver, MappingContext, Query},
    router::{DropOutcome, DropRequest, DropRouter, EditingContext, EndpointProviders},
    search,
    semantic::{Model, ModelIdentity, SemanticElement},
};

fn uml() -> Metamodel {
    Metamodel::builder("Element")
        .with_type("Element", &[])
        .with_type("Package", &["Element"])
        .with_type("Class", &["Element"])
        .with_type("Comment", &["Element"])
        .with_type("Item", &["Element"])
        .with_type("Operation", &["Element"])
        .with_type("Relationship", &["Element"])
        .with_type("Dependency", &["Relationship"])
        .build()
        .expect("valid hierarchy")
}

fn class_diagram() -> DiagramDeclaration {
    DiagramDeclaration::new("Class Diagram", "Package")
        .with_node(
            NodeDeclaration::new("CD_Package", "Package")
                .with_child(NodeDeclaration::new("CD_Class", "Class"))
                .with_child(NodeDeclaration::new("CD_Comment", "Comment")),
        )
        .with_node(NodeDeclaration::new("CD_Class_Top", "Class"))
        .with_node(
            NodeDeclaration::new("X_Box", "Class").with_child(
                NodeDeclaration::new("X_Operations_CompartmentNode", "Class")
                    .with_child(NodeDeclaration::new("X_Items", "Item"))
                    .with_child(NodeDeclaration::new("X_Comment", "Comment")),
            ),
        )
}

struct Fixture {
    metamodel: Metamodel,
    registry: MappingRegistry,
    model: Model,
    routing: RoutingConfig,
    endpoints: EndpointProviders,
}

impl Fixture {
    fn new() -> Self {
        let metamodel = uml();
        let registry = MappingRegistry::builder()
            .with_diagram(class_diagram())
            .build(&metamodel)
            .expect("valid declarations");
        let model = Model::new("model")
            .with(SemanticElement::new("model", "Package"))
            .with(SemanticElement::new("pkg", "Package").with_container("model"))
            .with(SemanticElement::new("c1", "Class").with_container("pkg"))
            .with(SemanticElement::new("c2", "Class").with_container("model"))
            .with(SemanticElement::new("note", "Comment").with_container("model"))
            .with(SemanticElement::new("box", "Class").with_container("model"))
            .with(SemanticElement::new("item", "Item").with_container("box"))
            .with(
                SemanticElement::new("dep", "Dependency")
                    .with_container("model")
                    .with_reference("client", &["c1"])
                    .with_reference("supplier", &["c2"]),
            )
            .with(
                SemanticElement::new("uses", "Dependency")
                    .with_container("model")
                    .with_reference("client", &["c2"])
                    .with_reference("supplier", &["item"]),
            );
        let routing = RoutingConfig::default();
        let endpoints = EndpointProviders::from_rules(routing.endpoints());
        Self {
            metamodel,
            registry,
            model,
            routing,
            endpoints,
        }
    }

    fn session<R>(&self, run: impl FnOnce(&DropRouter<'_>, &mut DiagramTree) -> R) -> (DiagramTree, R) {
        let diagram = self.registry.diagram("Class Diagram").expect("declared");
        let identity = ModelIdentity::new(&self.model);
        let router = DropRouter::new(EditingContext {
            diagram,
            hierarchy: &self.metamodel,
            model: &self.model,
            identity: &identity,
            endpoints: &self.endpoints,
            routing: &self.routing,
        })
        .expect("complete wiring");
        let mut tree = diagram.create_diagram(self.model.root());
        let result = run(&router, &mut tree);
        (tree, result)
    }

    fn description(&self, name: &str) -> DescriptionId {
        self.registry
            .diagram("Class Diagram")
            .and_then(|diagram| diagram.description_by_name(name))
            .map(|description| description.id())
            .expect("declared description")
    }
}

fn bound(tree: &DiagramTree, semantic_id: &str) -> trellis::identifier::ElementId {
    search::find_bound_element(tree, Id::new(semantic_id))
        .map(|view| view.id())
        .expect("bound view")
}

#[test]
fn test_specificity_is_independent_of_declaration_order() {
    let metamodel = Metamodel::builder("Root")
        .with_type("Root", &[])
        .with_type("A", &["Root"])
        .with_type("B", &["A"])
        .with_type("C", &["B"])
        .build()
        .expect("valid hierarchy");

    for order in [["M_A", "M_C"], ["M_C", "M_A"]] {
        let diagram = order.iter().fold(DiagramDeclaration::new("D", "Root"), |diagram, name| {
            diagram.with_node(NodeDeclaration::new(*name, &name[2..]))
        });
        let registry = MappingRegistry::builder()
            .with_diagram(diagram)
            .build(&metamodel)
            .expect("valid declarations");
        let resolver = CandidateResolver::new(registry.diagram("D").unwrap(), &metamodel);

        let ranked = resolver.resolve(MappingContext::Root, Query::Type(Id::new("C")));

        assert_eq!(ranked[0].description().name(), "M_C");
        assert_eq!(ranked[0].distance(), 0);
        assert_eq!(ranked[1].description().name(), "M_A");
        assert_eq!(ranked[1].distance(), 2);
    }
}

#[test]
fn test_create_view_twice_yields_one_element() {
    let fixture = Fixture::new();
    let diagram = fixture.registry.diagram("Class Diagram").unwrap();
    let identity = ModelIdentity::new(&fixture.model);
    let constructor = ViewConstructor::new(diagram, &identity);
    let mapping = diagram.description_by_name("CD_Class_Top").unwrap();
    let element = fixture.model.element(Id::new("c2")).unwrap();
    let mut tree = diagram.create_diagram(fixture.model.root());

    assert!(constructor.create_view(&mut tree, element, None, mapping));
    assert!(!constructor.create_view(&mut tree, element, None, mapping));
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_compartment_fallback() {
    let fixture = Fixture::new();
    let (tree, outcome) = fixture.session(|router, tree| {
        router.drop_request(tree, DropRequest::new("box").with_mapping("X_Box"));
        let box_view = bound(tree, "box");
        router.drop_request(
            tree,
            DropRequest::new("box").on(box_view).with_mapping("X_Operations_CompartmentNode"),
        );
        let compartment = tree.element(box_view).unwrap().children()[0].id();
        router.drop_request(tree, DropRequest::new("item").on(compartment));
        let item_view = bound(tree, "item");

        router.drop_request(tree, DropRequest::new("note").on(item_view))
    });

    assert_eq!(outcome, DropOutcome::CreatedInCompartment);
    let note = search::find_bound_element(&tree, Id::new("note")).unwrap();
    assert_eq!(note.description_id(), fixture.description("X_Comment"));
    let parent = tree.parent_of(note.id()).unwrap();
    assert_eq!(parent.description_id(), fixture.description("X_Operations_CompartmentNode"));
    assert_eq!(note.containment(), ContainmentKind::Child);
}

#[test]
fn test_failed_drop_without_compartment_is_a_no_op() {
    let fixture = Fixture::new();
    let (tree, outcome) = fixture.session(|router, tree| {
        router.drop_request(tree, DropRequest::new("c2"));
        let class_view = bound(tree, "c2");
        router.drop_request(tree, DropRequest::new("note").on(class_view))
    });

    assert_eq!(outcome, DropOutcome::Ignored);
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_relationship_drop_with_both_endpoints_shown() {
    let fixture = Fixture::new();
    let (tree, outcome) = fixture.session(|router, tree| {
        router.drop_request(tree, DropRequest::new("pkg"));
        let package = bound(tree, "pkg");
        router.drop_request(tree, DropRequest::new("c1").on(package));
        router.drop_request(tree, DropRequest::new("c2"));
        router.drop_request(tree, DropRequest::new("dep"))
    });

    assert_eq!(outcome, DropOutcome::Endpoints { created: 0 });
    assert_eq!(tree.len(), 3);
}

#[test]
fn test_relationship_drop_with_one_endpoint_missing() {
    let fixture = Fixture::new();
    let (tree, outcome) = fixture.session(|router, tree| {
        router.drop_request(tree, DropRequest::new("pkg"));
        let package = bound(tree, "pkg");
        router.drop_request(tree, DropRequest::new("c1").on(package));
        router.drop_request(tree, DropRequest::new("dep"))
    });

    assert_eq!(outcome, DropOutcome::Endpoints { created: 1 });
    assert_eq!(tree.len(), 3);
    let c2 = search::find_bound_element(&tree, Id::new("c2")).unwrap();
    assert_eq!(c2.parent_id(), None);
    assert!(search::find_bound_element(&tree, Id::new("dep")).is_none());
}

#[test]
fn test_relationship_endpoint_lands_in_container_compartment() {
    let fixture = Fixture::new();
    let (tree, outcome) = fixture.session(|router, tree| {
        router.drop_request(tree, DropRequest::new("box").with_mapping("X_Box"));
        let box_view = bound(tree, "box");
        router.drop_request(
            tree,
            DropRequest::new("box").on(box_view).with_mapping("X_Operations_CompartmentNode"),
        );
        router.drop_request(tree, DropRequest::new("c2"));
        router.drop_request(tree, DropRequest::new("uses"))
    });

    assert_eq!(outcome, DropOutcome::Endpoints { created: 1 });
    let item = search::find_bound_element(&tree, Id::new("item")).expect("item shown");
    assert_eq!(item.description_id(), fixture.description("X_Items"));
    let parent = tree.parent_of(item.id()).unwrap();
    assert_eq!(parent.description_id(), fixture.description("X_Operations_CompartmentNode"));
    assert_eq!(parent.semantic_id(), Id::new("box"));
}

#[test]
fn test_registry_rebuild_is_deterministic() {
    let metamodel = uml();
    let build = || {
        MappingRegistry::builder()
            .with_diagram(class_diagram())
            .build(&metamodel)
            .expect("valid declarations")
    };
    let first = build();
    let second = build();

    let ids = |registry: &MappingRegistry| {
        registry
            .diagrams()
            .flat_map(|diagram| {
                std::iter::once(diagram.id()).chain(diagram.descriptions().map(|d| d.id()))
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
}

#[test]
fn test_drop_class_without_target() {
    let metamodel = uml();
    let registry = MappingRegistry::builder()
        .with_diagram(
            DiagramDeclaration::new("Class Diagram", "Package")
                .with_node(
                    NodeDeclaration::new("CD_Package", "Package")
                        .with_child(NodeDeclaration::new("CD_Nested_Class", "Class"))
                        .with_child(NodeDeclaration::new("CD_Nested_Comment", "Comment")),
                )
                .with_node(NodeDeclaration::new("CD_Class", "Class"))
                .with_node(NodeDeclaration::new("CD_Comment", "Comment")),
        )
        .build(&metamodel)
        .expect("valid declarations");
    let fixture = Fixture {
        registry,
        ..Fixture::new()
    };

    let (tree, outcome) = fixture.session(|router, tree| router.drop_request(tree, DropRequest::new("c2")));

    assert_eq!(outcome, DropOutcome::Created);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.nodes()[0].description_id(), fixture.description("CD_Class"));
    assert_eq!(tree.nodes()[0].parent_id(), None);
}

#[test]
fn test_drop_same_class_twice_on_same_target() {
    let fixture = Fixture::new();
    let (tree, outcomes) = fixture.session(|router, tree| {
        router.drop_request(tree, DropRequest::new("pkg"));
        let package = bound(tree, "pkg");
        let first = router.drop_request(tree, DropRequest::new("c1").on(package));
        let size = tree.len();
        let second = router.drop_request(tree, DropRequest::new("c1").on(package));
        (first, second, size)
    });

    let (first, second, size) = outcomes;
    assert_eq!(first, DropOutcome::Created);
    assert!(!second.changed_tree());
    assert_eq!(tree.len(), size);
}

#[test]
fn test_registry_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MappingRegistry>();
    assert_send_sync::<EndpointProviders>();

    let fixture = Fixture::new();
    let registry = &fixture.registry;
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let diagram = registry.diagram("Class Diagram").unwrap();
                assert!(diagram.description_by_name("CD_Class").is_some());
            });
        }
    });
}
