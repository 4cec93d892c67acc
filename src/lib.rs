//! polybuild - polyglot build-description parser and dependency-graph resolver
//!
//! polybuild reads declarative `BUILD` specifications scattered across a
//! multi-language source tree, resolves the transitive dependency closure of a
//! user-requested set of targets, and produces a fully-linked in-memory graph
//! of build nodes ready to be lowered by a downstream emitter (e.g. to a
//! makefile).
//!
//! # Architecture Overview
//!
//! polybuild follows a specification/graph model where:
//! - Each directory may carry one `BUILD` file, a JSON document whose top
//!   level is an array of objects mapping node-kind keywords (`cc_library`,
//!   `cc_binary`, `cmake`, ...) to attribute trees
//! - Configuration inherits down the directory tree: ancestor specifications
//!   contribute key/value environment and file-wide base dependencies
//! - Plugins registered in a specification may rewrite attribute blocks
//!   before they are parsed, extending the node-kind vocabulary
//! - Graph construction is a breadth-first closure over declared dependency
//!   and required-parent edges, starting from the user-requested targets
//!
//! # Core Modules
//!
//! - [`buildfile`] - One parsed specification: attribute blocks, inherited
//!   environment, base dependencies, typed attribute accessors
//! - [`core`] - Target and resource identifiers, error types
//! - [`graph`] - The parse/resolve engine and the [`graph::Parser`] facade
//! - [`nodes`] - Node variants (one per build-rule kind) and their registry
//! - [`source`] - The [`source::SourceProvider`] seam for fetching
//!   specification contents, plus a filesystem-backed implementation
//! - [`input`] - The user request: root targets, directories, toolchain flags
//!
//! # Example
//!
//! ```no_run
//! use polybuild::graph::Parser;
//! use polybuild::input::Input;
//! use polybuild::nodes::registry::NodeBuilderSet;
//! use polybuild::source::DiskSource;
//!
//! let mut input = Input::new(".", ".gen-obj", ".gen-files");
//! input.add_build_target("//app:main").unwrap();
//!
//! let builders = NodeBuilderSet::default_set();
//! let source = DiskSource::new(".");
//! let mut parser = Parser::new(&builders, &source);
//! parser.parse(input).unwrap();
//!
//! for path in parser.node_order() {
//!     println!("{path}");
//! }
//! ```

pub mod buildfile;
pub mod cli;
pub mod constants;
pub mod core;
pub mod graph;
pub mod input;
pub mod nodes;
pub mod source;
pub mod utils;
