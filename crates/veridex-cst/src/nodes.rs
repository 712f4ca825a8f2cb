//! CST node and token types.
//!
//! A syntax tree is an ordered tree of [`SyntaxNode`]s (tagged nonterminals)
//! whose leaves are [`Token`]s (categorized lexemes with byte spans into the
//! original source buffer). The tree borrows the source text: token `text`
//! fields are slices of the buffer the parser ran over, and `span` offsets
//! index that same buffer.
//!
//! # Adapter surface
//!
//! Consumers navigate with [`SyntaxNode::children`], [`SyntaxNode::nodes`],
//! [`SyntaxNode::first_node`], [`SyntaxNode::tokens`], and
//! [`SyntaxNode::first_token`]. Tags outside a consumer's vocabulary are
//! expected to be walked transparently.
//!
//! # Construction
//!
//! Parsers (and tests) build trees with [`SyntaxNode::new`] plus the
//! `push_*`/`with_*` methods. Nothing in this crate validates that a tree
//! is shaped like well-formed HDL; that is the producing parser's contract.

use serde::Serialize;
use std::fmt;

// ============================================================================
// Spans
// ============================================================================

/// Byte offsets into the source buffer (half-open: `[start, end)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: u32,
    /// End byte offset (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: u32, end: u32) -> Self {
        assert!(start <= end, "Span start ({}) must be <= end ({})", start, end);
        Span { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// Lexical category of a leaf token.
///
/// Only the categories the extraction core distinguishes are modeled;
/// trivia (whitespace, comments) is not represented in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    /// Language keyword (`module`, `endmodule`, `import`, ...).
    Keyword,
    /// Plain identifier.
    Identifier,
    /// Backticked macro identifier, tick included in the lexeme.
    MacroIdentifier,
    /// Punctuation (`::`, `*`, `(`, ...).
    Symbol,
    /// Numeric or string literal.
    Literal,
}

impl TokenCategory {
    /// Returns the string representation used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenCategory::Keyword => "keyword",
            TokenCategory::Identifier => "identifier",
            TokenCategory::MacroIdentifier => "macro_identifier",
            TokenCategory::Symbol => "symbol",
            TokenCategory::Literal => "literal",
        }
    }
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A leaf token: category, lexeme, and byte span.
///
/// `text` borrows the source buffer; `span` locates the same bytes within
/// it. The two are kept together because consumers need the lexeme for name
/// lookups and the span for anchor emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Lexical category.
    pub category: TokenCategory,
    /// The lexeme, borrowed from the source buffer.
    pub text: &'a str,
    /// Byte span of the lexeme within the source buffer.
    pub span: Span,
}

impl<'a> Token<'a> {
    /// Create a token from an explicit lexeme and span.
    pub fn new(category: TokenCategory, text: &'a str, span: Span) -> Self {
        Token { category, text, span }
    }

    /// Create a token whose lexeme is sliced out of `source` at `span`.
    ///
    /// # Panics
    /// Panics if `span` is out of bounds or splits a UTF-8 boundary.
    pub fn in_source(category: TokenCategory, source: &'a str, span: Span) -> Self {
        Token {
            category,
            text: &source[span.start as usize..span.end as usize],
            span,
        }
    }
}

// ============================================================================
// Node tags
// ============================================================================

/// Nonterminal tag of a [`SyntaxNode`].
///
/// The set is closed from the extraction core's point of view: these are the
/// shapes it recognizes. Producers may nest them under the transparent
/// grouping tags ([`NodeTag::Body`], [`NodeTag::ArgumentList`]) freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTag {
    /// Root of one translation unit.
    SourceText,
    /// `module ... endmodule` declaration.
    ModuleDeclaration,
    /// Module header: keyword, name, optional port declarations.
    ModuleHeader,
    /// `: label` after an `end*` keyword.
    EndLabel,
    /// `package ... endpackage` declaration.
    PackageDeclaration,
    /// `class ... endclass` declaration.
    ClassDeclaration,
    /// `function ... endfunction` declaration.
    FunctionDeclaration,
    /// `task ... endtask` declaration.
    TaskDeclaration,
    /// Data declaration: optional named type, then variables or instances.
    DataDeclaration,
    /// Named type reference within a data declaration.
    TypeRef,
    /// A single declared variable, with optional initializer children.
    Variable,
    /// A single module-style instance: name plus connection list.
    GateInstance,
    /// Named port connection `.port` or `.port(actual)`.
    NamedPort,
    /// Port list: declarations in headers, connections in instances.
    PortList,
    /// `import ...;` declaration, one or more items.
    ImportDeclaration,
    /// One `pkg::item` or `pkg::*` import item.
    ImportItem,
    /// Text-macro definition; the name token carries no tick.
    MacroDefine,
    /// Text-macro invocation; the token keeps its tick.
    MacroCall,
    /// Function or task call expression.
    FunctionCall,
    /// `a::b::c` qualified identifier.
    QualifiedId,
    /// A bare identifier in expression position.
    Reference,
    /// Transparent grouping of call arguments.
    ArgumentList,
    /// Transparent grouping of statements or items.
    Body,
}

impl NodeTag {
    /// Returns the string representation used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeTag::SourceText => "source_text",
            NodeTag::ModuleDeclaration => "module_declaration",
            NodeTag::ModuleHeader => "module_header",
            NodeTag::EndLabel => "end_label",
            NodeTag::PackageDeclaration => "package_declaration",
            NodeTag::ClassDeclaration => "class_declaration",
            NodeTag::FunctionDeclaration => "function_declaration",
            NodeTag::TaskDeclaration => "task_declaration",
            NodeTag::DataDeclaration => "data_declaration",
            NodeTag::TypeRef => "type_ref",
            NodeTag::Variable => "variable",
            NodeTag::GateInstance => "gate_instance",
            NodeTag::NamedPort => "named_port",
            NodeTag::PortList => "port_list",
            NodeTag::ImportDeclaration => "import_declaration",
            NodeTag::ImportItem => "import_item",
            NodeTag::MacroDefine => "macro_define",
            NodeTag::MacroCall => "macro_call",
            NodeTag::FunctionCall => "function_call",
            NodeTag::QualifiedId => "qualified_id",
            NodeTag::Reference => "reference",
            NodeTag::ArgumentList => "argument_list",
            NodeTag::Body => "body",
        }
    }
}

impl fmt::Display for NodeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Tree
// ============================================================================

/// One child slot of a [`SyntaxNode`]: either a nested node or a leaf token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CstElement<'a> {
    /// Nested nonterminal.
    Node(SyntaxNode<'a>),
    /// Leaf token.
    Token(Token<'a>),
}

/// A tagged nonterminal with ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode<'a> {
    /// Nonterminal tag.
    pub tag: NodeTag,
    children: Vec<CstElement<'a>>,
}

impl<'a> SyntaxNode<'a> {
    /// Create an empty node with the given tag.
    pub fn new(tag: NodeTag) -> Self {
        SyntaxNode {
            tag,
            children: Vec::new(),
        }
    }

    /// Append a child node.
    pub fn push_node(&mut self, node: SyntaxNode<'a>) {
        self.children.push(CstElement::Node(node));
    }

    /// Append a leaf token.
    pub fn push_token(&mut self, token: Token<'a>) {
        self.children.push(CstElement::Token(token));
    }

    /// Append a child node, fluent form.
    pub fn with_node(mut self, node: SyntaxNode<'a>) -> Self {
        self.push_node(node);
        self
    }

    /// Append a leaf token, fluent form.
    pub fn with_token(mut self, token: Token<'a>) -> Self {
        self.push_token(token);
        self
    }

    /// All children in source order.
    pub fn children(&self) -> &[CstElement<'a>] {
        &self.children
    }

    /// Child nodes in source order, any tag.
    pub fn child_nodes(&self) -> impl Iterator<Item = &SyntaxNode<'a>> {
        self.children.iter().filter_map(|el| match el {
            CstElement::Node(node) => Some(node),
            CstElement::Token(_) => None,
        })
    }

    /// Child nodes with the given tag, in source order.
    pub fn nodes(&self, tag: NodeTag) -> impl Iterator<Item = &SyntaxNode<'a>> {
        self.child_nodes().filter(move |node| node.tag == tag)
    }

    /// First child node with the given tag.
    pub fn first_node(&self, tag: NodeTag) -> Option<&SyntaxNode<'a>> {
        self.nodes(tag).next()
    }

    /// Leaf tokens among the direct children, in source order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token<'a>> {
        self.children.iter().filter_map(|el| match el {
            CstElement::Token(token) => Some(token),
            CstElement::Node(_) => None,
        })
    }

    /// First direct leaf token of the given category.
    pub fn first_token(&self, category: TokenCategory) -> Option<&Token<'a>> {
        self.tokens().find(|token| token.category == category)
    }
}

// ============================================================================
// Tests
// ============================================================================
