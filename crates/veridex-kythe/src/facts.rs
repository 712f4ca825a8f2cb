//! Indexing-facts tree: the language-neutral intermediate between the CST
//! and the emitted Kythe facts.
//!
//! Stage 1 projects the CST into a tree of [`IndexingFactNode`]s. Each node
//! carries an [`IndexingFactType`] kind tag plus one or more [`Anchor`]s
//! naming spans in the source text; children represent structural
//! containment (a module contains its instances, a file its declarations).
//! The anchor layout per kind is fixed: `anchors[0]` is the primary name,
//! trailing anchors are kind-specific (end labels, connected ports, chain
//! segments).
//!
//! Anchors borrow the source buffer except for synthetic values (the
//! filename anchor on the root), so the buffer must outlive the tree.

use std::borrow::Cow;
use std::fmt;

use veridex_cst::{Span, Token};

// ============================================================================
// Anchors
// ============================================================================

/// A named span within the source file.
///
/// Equality is by lexeme and offsets; two anchors with the same text at
/// different positions are distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor<'a> {
    text: Cow<'a, str>,
    span: Span,
}

impl<'a> Anchor<'a> {
    /// Create an anchor borrowing its lexeme from the source buffer.
    pub fn new(text: &'a str, span: Span) -> Self {
        Anchor {
            text: Cow::Borrowed(text),
            span,
        }
    }

    /// Create an anchor with a synthetic (owned) value, e.g. a filename.
    pub fn synthetic(text: impl Into<String>, span: Span) -> Self {
        Anchor {
            text: Cow::Owned(text.into()),
            span,
        }
    }

    /// Create an anchor from a CST token.
    pub fn from_token(token: &Token<'a>) -> Self {
        Anchor::new(token.text, token.span)
    }

    /// The anchored lexeme.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The anchored byte span.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Start byte offset.
    pub fn start(&self) -> u32 {
        self.span.start
    }

    /// End byte offset.
    pub fn end(&self) -> u32 {
        self.span.end
    }
}

impl fmt::Display for Anchor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} @{}:{}}}", self.text, self.span.start, self.span.end)
    }
}

// ============================================================================
// Fact kinds
// ============================================================================

/// Kind tag of an indexing-facts node (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexingFactType {
    /// Root of one file's facts; filename + full text anchors.
    File,
    /// Module declaration; name + optional end label.
    Module,
    /// One instance in a module instantiation.
    ModuleInstance,
    /// Named port connection on a module instance.
    ModuleNamedPort,
    /// Variable definition.
    VariableDefinition,
    /// Bare identifier reference.
    VariableReference,
    /// Reference to a named type in a data declaration.
    DataTypeReference,
    /// Function or task declaration.
    FunctionOrTask,
    /// Function or task call; one anchor, or one per qualifier segment.
    FunctionCall,
    /// Class declaration; name + optional end label.
    Class,
    /// One instance in a class-typed data declaration.
    ClassInstance,
    /// Package declaration; name + optional end label.
    Package,
    /// Package import item; package + optional item anchor.
    PackageImport,
    /// Text-macro definition; bare name.
    Macro,
    /// Text-macro invocation; backticked lexeme.
    MacroCall,
    /// Qualified member reference chain, outermost first.
    MemberReference,
}

impl IndexingFactType {
    /// Returns the string representation used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexingFactType::File => "file",
            IndexingFactType::Module => "module",
            IndexingFactType::ModuleInstance => "module_instance",
            IndexingFactType::ModuleNamedPort => "module_named_port",
            IndexingFactType::VariableDefinition => "variable_definition",
            IndexingFactType::VariableReference => "variable_reference",
            IndexingFactType::DataTypeReference => "data_type_reference",
            IndexingFactType::FunctionOrTask => "function_or_task",
            IndexingFactType::FunctionCall => "function_call",
            IndexingFactType::Class => "class",
            IndexingFactType::ClassInstance => "class_instance",
            IndexingFactType::Package => "package",
            IndexingFactType::PackageImport => "package_import",
            IndexingFactType::Macro => "macro",
            IndexingFactType::MacroCall => "macro_call",
            IndexingFactType::MemberReference => "member_reference",
        }
    }
}

impl fmt::Display for IndexingFactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Node data and tree
// ============================================================================

/// Payload of one facts node: kind plus ordered anchors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingNodeData<'a> {
    kind: IndexingFactType,
    anchors: Vec<Anchor<'a>>,
}

impl<'a> IndexingNodeData<'a> {
    /// Create node data with no anchors yet.
    pub fn new(kind: IndexingFactType) -> Self {
        IndexingNodeData {
            kind,
            anchors: Vec::new(),
        }
    }

    /// Append an anchor, fluent form.
    pub fn with_anchor(mut self, anchor: Anchor<'a>) -> Self {
        self.anchors.push(anchor);
        self
    }

    /// Append an anchor.
    pub fn push_anchor(&mut self, anchor: Anchor<'a>) {
        self.anchors.push(anchor);
    }

    /// The kind tag.
    pub fn kind(&self) -> IndexingFactType {
        self.kind
    }

    /// The anchors in layout order.
    pub fn anchors(&self) -> &[Anchor<'a>] {
        &self.anchors
    }
}

/// One node of the indexing-facts tree.
///
/// The tree owns its children; every node except the root has exactly one
/// parent by construction. Parent context during emission is carried by the
/// emitter's ancestor stack rather than back-pointers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingFactNode<'a> {
    data: IndexingNodeData<'a>,
    children: Vec<IndexingFactNode<'a>>,
}

impl<'a> IndexingFactNode<'a> {
    /// Create a leaf node from its payload.
    pub fn new(data: IndexingNodeData<'a>) -> Self {
        IndexingFactNode {
            data,
            children: Vec::new(),
        }
    }

    /// Append a child, fluent form.
    pub fn with_child(mut self, child: IndexingFactNode<'a>) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child.
    pub fn push_child(&mut self, child: IndexingFactNode<'a>) {
        self.children.push(child);
    }

    /// The node payload.
    pub fn data(&self) -> &IndexingNodeData<'a> {
        &self.data
    }

    /// Shorthand for `data().kind()`.
    pub fn kind(&self) -> IndexingFactType {
        self.data.kind
    }

    /// Shorthand for `data().anchors()`.
    pub fn anchors(&self) -> &[Anchor<'a>] {
        self.data.anchors()
    }

    /// Children in creation (source) order.
    pub fn children(&self) -> &[IndexingFactNode<'a>] {
        &self.children
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.data.kind, indent = depth * 2)?;
        for anchor in self.data.anchors() {
            write!(f, " {}", anchor)?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for IndexingFactNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

// ============================================================================
// Tests
// ============================================================================
