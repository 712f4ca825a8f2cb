//! Kythe schema constants: fact names, edge kinds, and fact values.
//!
//! These strings are the stable wire vocabulary; downstream services join
//! on them byte-for-byte, so they must never drift.

/// Fact name for a vertex's node kind.
pub const FACT_NODE_KIND: &str = "/kythe/node/kind";
/// Fact name for a vertex's subkind.
pub const FACT_SUBKIND: &str = "/kythe/subkind";
/// Fact name for definition completeness.
pub const FACT_COMPLETE: &str = "/kythe/complete";
/// Fact name for a file vertex's full text.
pub const FACT_TEXT: &str = "/kythe/text";
/// Fact name for an anchor's start byte offset.
pub const FACT_LOC_START: &str = "/kythe/loc/start";
/// Fact name for an anchor's end byte offset.
pub const FACT_LOC_END: &str = "/kythe/loc/end";

/// Edge kind: structural containment.
pub const EDGE_CHILD_OF: &str = "/kythe/edge/childof";
/// Edge kind: an anchor binds a definition.
pub const EDGE_DEFINES_BINDING: &str = "/kythe/edge/defines/binding";
/// Edge kind: an anchor references a definition.
pub const EDGE_REF: &str = "/kythe/edge/ref";
/// Edge kind: an anchor calls a function or task.
pub const EDGE_REF_CALL: &str = "/kythe/edge/ref/call";
/// Edge kind: an anchor expands a text macro.
pub const EDGE_REF_EXPANDS: &str = "/kythe/edge/ref/expands";
/// Edge kind: an anchor imports a package.
pub const EDGE_REF_IMPORTS: &str = "/kythe/edge/ref/imports";

/// Node kind value for files.
pub const NODE_FILE: &str = "file";
/// Node kind value for modules and classes.
pub const NODE_RECORD: &str = "record";
/// Node kind value for variables and instances.
pub const NODE_VARIABLE: &str = "variable";
/// Node kind value for functions and tasks.
pub const NODE_FUNCTION: &str = "function";
/// Node kind value for text macros.
pub const NODE_MACRO: &str = "macro";
/// Node kind value for packages.
pub const NODE_PACKAGE: &str = "package";
/// Node kind value for anchors.
pub const NODE_ANCHOR: &str = "anchor";

/// Subkind value distinguishing modules among records.
pub const SUBKIND_MODULE: &str = "module";
/// Completeness value for full definitions.
pub const COMPLETE_DEFINITION: &str = "definition";
