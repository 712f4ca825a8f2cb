//! Concrete syntax tree contract for the veridex HDL indexer.
//!
//! This crate defines the read-only tree shape that the extraction core
//! consumes: tagged nonterminal nodes, categorized leaf tokens with byte
//! spans, and adapter queries over both. It deliberately contains no lexer
//! or parser; a parser produces trees through the construction API, and the
//! extraction core only ever reads them.

pub mod nodes;

pub use nodes::{CstElement, NodeTag, Span, SyntaxNode, Token, TokenCategory};
