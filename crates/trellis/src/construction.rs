//! View construction: materializes one graphical element for one semantic
//! element, at most once per `(parent, description, semantic)` triple.

use log::{debug, error, warn};

use trellis_core::{
    diagram::{DiagramTree, GraphicalMutation},
    identifier::ElementId,
    semantic::{IdentityService, SemanticElement},
};

use crate::{registry::DiagramDescription, registry::MappingDescription, search};

/// Creates views through the [`GraphicalMutation`] boundary of a tree.
#[derive(Clone, Copy)]
pub struct ViewConstructor<'a> {
    diagram: &'a DiagramDescription,
    identity: &'a dyn IdentityService,
}

impl<'a> ViewConstructor<'a> {
    pub fn new(diagram: &'a DiagramDescription, identity: &'a dyn IdentityService) -> Self {
        Self { diagram, identity }
    }

    /// Creates a view of `element` from `mapping` under `parent`, or at
    /// diagram level for `None`.
    ///
    /// Returns `false` without touching the tree when the element has no
    /// identity or when an element with the same triple already exists
    /// anywhere in the tree.
    pub fn create_view(
        &self,
        tree: &mut DiagramTree,
        element: &SemanticElement,
        parent: Option<ElementId>,
        mapping: &MappingDescription,
    ) -> bool {
        let Some(semantic_id) = self.identity.id_of(element) else {
            warn!(
                element:% = element.id(),
                description:% = mapping.name();
                "Semantic element has no identity, view not created"
            );
            return false;
        };

        if search::find_by_triple(tree, parent, mapping.id(), semantic_id).is_some() {
            warn!(
                semantic_id:% = semantic_id,
                description:% = mapping.name();
                "View already exists"
            );
            return false;
        }

        let parent_description = parent
            .and_then(|id| tree.element(id))
            .map(|view| view.description_id());
        let containment = self.diagram.containment_in(parent_description, mapping.id());
        debug_assert!(
            parent.is_none() || parent_description.is_some(),
            "Parent view must belong to the tree"
        );

        match tree.append_element(parent, mapping.id(), semantic_id, containment) {
            Ok(id) => {
                debug!(
                    element_id:% = id,
                    semantic_id:% = semantic_id,
                    description:% = mapping.name(),
                    containment:% = containment;
                    "View created"
                );
                true
            }
            Err(err) => {
                error!(err:% = err, semantic_id:% = semantic_id; "Failed to append view");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use trellis_core::{
        diagram::ContainmentKind,
        identifier::Id,
        metamodel::Metamodel,
        semantic::{Model, ModelIdentity},
    };

    use super::*;
    use crate::registry::{DiagramDeclaration, MappingRegistry, NodeDeclaration};

    fn fixture() -> (MappingRegistry, Model) {
        let metamodel = Metamodel::builder("Element")
            .with_type("Element", &[])
            .with_type("Package", &["Element"])
            .with_type("Class", &["Element"])
            .with_type("Port", &["Element"])
            .build()
            .expect("valid hierarchy");
        let registry = MappingRegistry::builder()
            .with_diagram(
                DiagramDeclaration::new("Class Diagram", "Package").with_node(
                    NodeDeclaration::new("CD_Class", "Class")
                        .with_border(NodeDeclaration::new("CD_Port", "Port")),
                ),
            )
            .build(&metamodel)
            .expect("valid declarations");
        let model = Model::new("model")
            .with(SemanticElement::new("model", "Package"))
            .with(SemanticElement::new("c1", "Class").with_container("model"))
            .with(SemanticElement::new("p1", "Port").with_container("c1"));
        (registry, model)
    }

    #[test]
    fn test_create_view_is_idempotent() {
        let (registry, model) = fixture();
        let diagram = registry.diagram("Class Diagram").unwrap();
        let identity = ModelIdentity::new(&model);
        let constructor = ViewConstructor::new(diagram, &identity);
        let class = diagram.description_by_name("CD_Class").unwrap();
        let c1 = model.element(Id::new("c1")).unwrap();
        let mut tree = diagram.create_diagram(model.root());

        assert!(constructor.create_view(&mut tree, c1, None, class));
        assert!(!constructor.create_view(&mut tree, c1, None, class));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.nodes()[0].parent_id(), None);
    }

    #[test]
    fn test_border_slot_decides_containment() {
        let (registry, model) = fixture();
        let diagram = registry.diagram("Class Diagram").unwrap();
        let identity = ModelIdentity::new(&model);
        let constructor = ViewConstructor::new(diagram, &identity);
        let class = diagram.description_by_name("CD_Class").unwrap();
        let port = diagram.description_by_name("CD_Port").unwrap();
        let mut tree = diagram.create_diagram(model.root());

        constructor.create_view(&mut tree, model.element(Id::new("c1")).unwrap(), None, class);
        let class_view = tree.nodes()[0].id();
        assert!(constructor.create_view(
            &mut tree,
            model.element(Id::new("p1")).unwrap(),
            Some(class_view),
            port
        ));

        let border = &tree.nodes()[0].border_children()[0];
        assert_eq!(border.containment(), ContainmentKind::Border);
        assert_eq!(border.parent_id(), Some(class_view));
    }

    #[test]
    fn test_detached_element_is_not_created() {
        let (registry, model) = fixture();
        let diagram = registry.diagram("Class Diagram").unwrap();
        let identity = ModelIdentity::new(&model);
        let constructor = ViewConstructor::new(diagram, &identity);
        let class = diagram.description_by_name("CD_Class").unwrap();
        let detached = SemanticElement::new("detached", "Class");
        let mut tree = diagram.create_diagram(model.root());

        assert!(!constructor.create_view(&mut tree, &detached, None, class));
        assert!(tree.is_empty());
    }

    fn check_repeated_creation_yields_one_element(attempts: usize) {
        let (registry, model) = fixture();
        let diagram = registry.diagram("Class Diagram").unwrap();
        let identity = ModelIdentity::new(&model);
        let constructor = ViewConstructor::new(diagram, &identity);
        let class = diagram.description_by_name("CD_Class").unwrap();
        let c1 = model.element(Id::new("c1")).unwrap();
        let mut tree = diagram.create_diagram(model.root());

        let created = (0..attempts)
            .filter(|_| constructor.create_view(&mut tree, c1, None, class))
            .count();

        assert_eq!(created, 1);
        assert_eq!(tree.len(), 1);
    }

    proptest! {
        #[test]
        fn test_repeated_creation_yields_one_element(attempts in 1usize..16) {
            check_repeated_creation_yields_one_element(attempts);
        }
    }
}
