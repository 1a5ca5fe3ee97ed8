//! CLI logic for the Trellis projection tool.
//!
//! Loads a declarative scenario, replays its drops and writes the resulting
//! graphical tree as an outline.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::info;

use trellis::{ProjectionBuilder, TrellisError};

/// Run the Trellis CLI application
///
/// # Errors
///
/// Returns `TrellisError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Invalid scenarios (every diagnostic is carried)
/// - Incomplete routing configuration
pub fn run(args: &Args) -> Result<(), TrellisError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing scenario"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;

    let builder = ProjectionBuilder::new(app_config);
    let scenario = builder.load(&source)?;
    let tree = builder.replay(&scenario)?;
    let outline = builder.render_outline(&scenario, &tree);

    fs::write(&args.output, outline)?;

    let stats = tree.stats();
    info!(
        output_file = args.output,
        nodes_count = stats.nodes,
        border_nodes_count = stats.border_nodes,
        edges_count = stats.edges;
        "Outline written"
    );

    Ok(())
}
