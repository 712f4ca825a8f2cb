//! Kythe fact extraction core for the veridex HDL indexer.
//!
//! Given the parsed CST of one HDL source file, this crate produces a
//! stream of Kythe-style vertex and edge facts in two decoupled stages:
//!
//! 1. [`extract::build_facts_tree`] projects the CST into a compact,
//!    language-neutral indexing-facts tree ([`facts`]).
//! 2. [`emit::extract_kythe_facts`] re-walks that tree with a lexical scope
//!    model ([`scope`]), binds references to definitions, and streams
//!    records ([`sink`]) keyed by VNames ([`vname`]).
//!
//! [`index_file`] runs both stages back to back. Extraction of one file is
//! synchronous and self-contained; indexing many files is the caller's
//! parallelism to arrange.

pub mod emit;
pub mod error;
pub mod extract;
pub mod facts;
pub mod schema;
pub mod scope;
pub mod sink;
pub mod vname;

pub use emit::{extract_kythe_facts, extract_kythe_facts_with, EmitterOptions};
pub use error::SinkError;
pub use extract::build_facts_tree;
pub use facts::{Anchor, IndexingFactNode, IndexingFactType, IndexingNodeData};
pub use sink::{FactSink, JsonLineSink, MemorySink, Record};
pub use vname::VName;

use veridex_cst::SyntaxNode;

/// Run both extraction stages for one file: CST to facts tree to records.
pub fn index_file<S: FactSink>(
    filename: &str,
    source: &str,
    cst: &SyntaxNode<'_>,
    options: &EmitterOptions,
    sink: &mut S,
) -> Result<(), SinkError> {
    let facts_tree = build_facts_tree(filename, source, cst);
    extract_kythe_facts_with(&facts_tree, options, sink)
}
