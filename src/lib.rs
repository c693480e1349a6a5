//! # rulegraph-core
//!
//! Core dependency graph types and hierarchical layout for visual firewall
//! rule analysis.
//!
//! This crate turns declarative rule documents — web-ACL rules and
//! load-balancer listener rules — into a single `{nodes, edges}` dependency
//! graph with deterministic 2-D positions, ready for a graph renderer.
//!
//! ## Architecture
//!
//! Rules depend on each other implicitly, through shared symbolic labels,
//! inserted/matched headers, IP literals, ports and policy identifiers:
//!
//! ```text
//! [ACL rules] ──► label resolver ──┐
//! [ACL rules] ─┐                   ├──► RuleGraph ──► classifier ──► layout
//! [ALB rules] ─┴► correlator ──────┤
//! [ALB rules] ──► condition expander
//! ```
//!
//! Every stage is a pure, synchronous function over immutable inputs; the
//! graph is rebuilt from scratch whenever a document or filter changes.
//!
//! ## Modules
//!
//! - `types` - rule document models for both layers
//! - `walk` - schema-less statement tree traversal and extractors
//! - `graph` - node/edge structures and graph export
//! - `labels` - label emitter/reference dependency resolution
//! - `expand` - compound condition expansion into synthetic nodes
//! - `correlate` - cross-layer shared-resource correlation
//! - `classify` - isolated/root/intermediate/leaf partition
//! - `layout` - deterministic hierarchical positioning
//! - `subgraph` - neighborhood and forward-closure extraction
//! - `engine` - the wholesale document-to-graph transform
//! - `loader` - document ingestion, raw and packed formats

mod classify;
mod correlate;
mod engine;
mod expand;
mod graph;
mod labels;
mod layout;
mod loader;
mod subgraph;
mod types;
mod walk;

pub use classify::*;
pub use correlate::*;
pub use engine::*;
pub use expand::*;
pub use graph::*;
pub use labels::*;
pub use layout::*;
pub use loader::*;
pub use subgraph::*;
pub use types::*;
pub use walk::*;
