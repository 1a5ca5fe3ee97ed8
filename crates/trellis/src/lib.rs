//! Trellis - semantic-to-graphical projection engine.
//!
//! Decides which mapping description represents a semantic element, creates
//! the graphical element exactly once, and routes drop requests to the right
//! graphical container.

pub mod config;
pub mod construction;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod router;
pub mod scenario;
pub mod search;

pub use trellis_core::{diagram, identifier, metamodel, semantic};

pub use error::TrellisError;

use log::{debug, info};

use config::AppConfig;
use diagram::DiagramTree;
use router::DropOutcome;
use scenario::Scenario;

/// Entry point for loading and replaying declarative scenarios.
///
/// # Examples
///
/// ```rust,no_run
/// use trellis::{ProjectionBuilder, config::AppConfig};
///
/// let source = std::fs::read_to_string("demos/class_diagram.toml")
///     .expect("Failed to read scenario");
///
/// let builder = ProjectionBuilder::new(AppConfig::default());
/// let scenario = builder.load(&source).expect("Failed to load");
/// let tree = builder.replay(&scenario).expect("Failed to replay");
/// println!("{}", builder.render_outline(&scenario, &tree));
/// ```
#[derive(Debug, Default)]
pub struct ProjectionBuilder {
    config: AppConfig,
}

impl ProjectionBuilder {
    /// Create a new builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse and validate a scenario document.
    ///
    /// # Errors
    ///
    /// Returns `TrellisError::Load` or `TrellisError::Registry` with every
    /// diagnostic of the failing stage.
    pub fn load(&self, source: &str) -> Result<Scenario, TrellisError> {
        info!(source_len = source.len(); "Loading scenario");
        Scenario::from_toml(source, &self.config)
    }

    /// Replay the scenario's drops on an empty diagram.
    ///
    /// # Errors
    ///
    /// Returns `TrellisError::Wiring` for an incomplete routing configuration.
    pub fn replay(&self, scenario: &Scenario) -> Result<DiagramTree, TrellisError> {
        let (tree, outcomes) = scenario.replay(&self.config)?;
        let ignored = outcomes
            .iter()
            .filter(|outcome| **outcome == DropOutcome::Ignored)
            .count();
        debug!(
            drops_count = outcomes.len(),
            ignored_count = ignored;
            "Replay finished"
        );
        info!(elements_count = tree.len(); "Diagram built");
        Ok(tree)
    }

    /// Render the tree as an outline labelled with description names.
    pub fn render_outline(&self, scenario: &Scenario, tree: &DiagramTree) -> String {
        scenario.render_outline(tree)
    }
}
