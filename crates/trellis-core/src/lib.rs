//! Trellis Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Trellis projection
//! engine and its collaborators:
//!
//! - **Identifiers**: interned names ([`identifier::Id`]), name-derived
//!   description ids and graphical element ids
//! - **Metamodel**: the type hierarchy oracle ([`metamodel::TypeHierarchy`])
//!   and its in-memory implementation
//! - **Semantic**: the read-only semantic model and the identity service
//!   ([`semantic`] module)
//! - **Diagram**: the per-document graphical tree and its mutation boundary
//!   ([`diagram`] module)

pub mod diagram;
pub mod identifier;
pub mod metamodel;
pub mod semantic;
