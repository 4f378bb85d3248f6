//! yamlpack: compile a directory of YAML/JSON fragments into one document.
//!
//! Layers, innermost first:
//! - `domain`: values, syntax nodes, the merge algorithm, normalizers
//! - `application`: parser, include resolver, tree builder, pack service
//! - `infrastructure`: filesystem and logger boundaries, encoder, output
//! - `cli`: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use application::{Document, OutputFormat, OutputMode, PackOptions, PackService};
pub use domain::{MergePolicy, Node, Value};
