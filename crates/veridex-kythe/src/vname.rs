//! VNames and signature synthesis.
//!
//! A [`VName`] is the opaque identity of an emitted vertex. The core keys
//! joins on `signature` and `path`; `language`, `root`, and `corpus` are
//! fixed for a run and carried through untouched.
//!
//! # Signatures
//!
//! Signatures qualify inner-first: a definition's local name is terminated
//! with `#` and the parent signature is appended after it, so `x` inside
//! module `foo` becomes `x#foo#`. This is what makes the substring and
//! prefix lookup rules in [`crate::scope`] work: searching for `x#` finds
//! `x#foo#` wherever `x` is visible.

use serde::Serialize;
use veridex_cst::Span;

/// Opaque identity of an emitted vertex.
///
/// Field order is the wire order; do not reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VName {
    /// Inner-first qualified signature, or `""` for the file vertex.
    pub signature: String,
    /// Path of the indexed file.
    pub path: String,
    /// Language tag, fixed per run.
    pub language: String,
    /// Corpus root, fixed per run.
    pub root: String,
    /// Corpus name, fixed per run.
    pub corpus: String,
}

/// Terminate a local name into a signature: `name` becomes `name#`.
pub fn signature(name: &str) -> String {
    format!("{}#", name)
}

/// Qualify a local name by a parent signature: `x` in `foo#` is `x#foo#`.
pub fn scope_relative_signature(name: &str, parent_signature: &str) -> String {
    format!("{}#{}", name, parent_signature)
}

/// Signature of an anchor vertex over the given span.
pub fn anchor_signature(span: Span) -> String {
    format!("@{}:{}", span.start, span.end)
}
