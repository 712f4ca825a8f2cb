//! Shared fixtures for the extraction integration tests.
//!
//! CSTs are constructed programmatically against a literal source string;
//! token spans are located by occurrence so the fixture reads like the
//! source it mimics. Record helpers decode and search the emitted stream.

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use veridex_cst::{NodeTag, Span, SyntaxNode, Token, TokenCategory};
use veridex_kythe::{extract_kythe_facts, IndexingFactNode, MemorySink, Record};

// ============================================================================
// Token location
// ============================================================================

/// Byte offset of the `nth` whole-lexeme occurrence (0-based) of `text` in
/// `source`. Matches inside longer identifiers do not count, so `"m"` finds
/// a module named `m` and not the `m` in `module`.
pub fn find_nth(source: &str, text: &str, nth: usize) -> u32 {
    let bytes = source.as_bytes();
    let mut seen = 0;
    let mut from = 0;
    while let Some(pos) = source[from..].find(text) {
        let at = from + pos;
        let end = at + text.len();
        let before_ok = at == 0 || !is_ident_byte(bytes[at - 1]);
        let after_ok = end == source.len() || !is_ident_byte(bytes[end]);
        if before_ok && after_ok {
            if seen == nth {
                return at as u32;
            }
            seen += 1;
        }
        from = at + 1;
    }
    panic!("occurrence {nth} of {text:?} not found in fixture source");
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Anchor-vertex signature (`@start:end`) of the `nth` occurrence of `text`.
pub fn anchor_sig(source: &str, text: &str, nth: usize) -> String {
    let start = find_nth(source, text, nth);
    format!("@{}:{}", start, start + text.len() as u32)
}

fn token<'a>(
    category: TokenCategory,
    source: &'a str,
    text: &str,
    nth: usize,
) -> Token<'a> {
    let start = find_nth(source, text, nth);
    Token::in_source(category, source, Span::new(start, start + text.len() as u32))
}

/// The `nth` occurrence of `text` as an identifier token.
pub fn ident<'a>(source: &'a str, text: &str, nth: usize) -> Token<'a> {
    token(TokenCategory::Identifier, source, text, nth)
}

/// The `nth` occurrence of `text` as a backticked macro identifier token.
pub fn macro_ident<'a>(source: &'a str, text: &str, nth: usize) -> Token<'a> {
    token(TokenCategory::MacroIdentifier, source, text, nth)
}

// ============================================================================
// CST fixtures
// ============================================================================

/// Root node over the given top-level items.
pub fn source_text(items: Vec<SyntaxNode<'_>>) -> SyntaxNode<'_> {
    let mut root = SyntaxNode::new(NodeTag::SourceText);
    for item in items {
        root.push_node(item);
    }
    root
}

/// `module <name> ... endmodule[: <name>]`, without header ports.
pub fn module<'a>(
    source: &'a str,
    name: &str,
    labeled_end: bool,
    items: Vec<SyntaxNode<'a>>,
) -> SyntaxNode<'a> {
    module_with_ports(source, name, labeled_end, Vec::new(), items)
}

/// `module <name>(<ports>) ... endmodule[: <name>]`.
pub fn module_with_ports<'a>(
    source: &'a str,
    name: &str,
    labeled_end: bool,
    ports: Vec<SyntaxNode<'a>>,
    items: Vec<SyntaxNode<'a>>,
) -> SyntaxNode<'a> {
    let mut header = SyntaxNode::new(NodeTag::ModuleHeader).with_token(ident(source, name, 0));
    if !ports.is_empty() {
        let mut list = SyntaxNode::new(NodeTag::PortList);
        for port in ports {
            list.push_node(port);
        }
        header.push_node(list);
    }

    let mut decl = SyntaxNode::new(NodeTag::ModuleDeclaration).with_node(header);
    for item in items {
        decl.push_node(item);
    }
    if labeled_end {
        decl.push_node(
            SyntaxNode::new(NodeTag::EndLabel).with_token(ident(source, name, 1)),
        );
    }
    decl
}

/// `package <name> ... endpackage`.
pub fn package<'a>(
    source: &'a str,
    name: &str,
    nth: usize,
    items: Vec<SyntaxNode<'a>>,
) -> SyntaxNode<'a> {
    let mut decl =
        SyntaxNode::new(NodeTag::PackageDeclaration).with_token(ident(source, name, nth));
    for item in items {
        decl.push_node(item);
    }
    decl
}

/// `class <name> ... endclass`.
pub fn class<'a>(
    source: &'a str,
    name: &str,
    nth: usize,
    items: Vec<SyntaxNode<'a>>,
) -> SyntaxNode<'a> {
    let mut decl = SyntaxNode::new(NodeTag::ClassDeclaration).with_token(ident(source, name, nth));
    for item in items {
        decl.push_node(item);
    }
    decl
}

/// `function <name>(<args>); ... endfunction`.
pub fn function<'a>(
    source: &'a str,
    name: &str,
    nth: usize,
    args: Vec<SyntaxNode<'a>>,
    body: Vec<SyntaxNode<'a>>,
) -> SyntaxNode<'a> {
    let mut decl =
        SyntaxNode::new(NodeTag::FunctionDeclaration).with_token(ident(source, name, nth));
    if !args.is_empty() {
        let mut list = SyntaxNode::new(NodeTag::PortList);
        for arg in args {
            list.push_node(arg);
        }
        decl.push_node(list);
    }
    for item in body {
        decl.push_node(item);
    }
    decl
}

/// One declared variable, optionally with initializer children.
pub fn variable<'a>(source: &'a str, name: &str, nth: usize) -> SyntaxNode<'a> {
    SyntaxNode::new(NodeTag::Variable).with_token(ident(source, name, nth))
}

/// Builtin-typed declaration of one or more variables (`wire x, y;`).
pub fn wire<'a>(source: &'a str, names: &[(&str, usize)]) -> SyntaxNode<'a> {
    let mut decl = SyntaxNode::new(NodeTag::DataDeclaration);
    for (name, nth) in names {
        decl.push_node(variable(source, name, *nth));
    }
    decl
}

/// Builtin-typed declaration over pre-built `Variable` nodes (for
/// declarations with initializers).
pub fn data_decl(variables: Vec<SyntaxNode<'_>>) -> SyntaxNode<'_> {
    let mut decl = SyntaxNode::new(NodeTag::DataDeclaration);
    for var in variables {
        decl.push_node(var);
    }
    decl
}

/// Declaration with a named type and instance children.
pub fn typed_decl<'a>(
    source: &'a str,
    type_name: &str,
    nth: usize,
    instances: Vec<SyntaxNode<'a>>,
) -> SyntaxNode<'a> {
    let mut decl = SyntaxNode::new(NodeTag::DataDeclaration)
        .with_node(SyntaxNode::new(NodeTag::TypeRef).with_token(ident(source, type_name, nth)));
    for instance in instances {
        decl.push_node(instance);
    }
    decl
}

/// One module-style instance with its connection list.
pub fn gate<'a>(
    source: &'a str,
    name: &str,
    nth: usize,
    connections: Vec<SyntaxNode<'a>>,
) -> SyntaxNode<'a> {
    let mut instance =
        SyntaxNode::new(NodeTag::GateInstance).with_token(ident(source, name, nth));
    if !connections.is_empty() {
        let mut list = SyntaxNode::new(NodeTag::PortList);
        for connection in connections {
            list.push_node(connection);
        }
        instance.push_node(list);
    }
    instance
}

/// `.port` or `.port(actual)` connection.
pub fn named_port<'a>(
    source: &'a str,
    name: &str,
    nth: usize,
    actual: Option<SyntaxNode<'a>>,
) -> SyntaxNode<'a> {
    let mut port = SyntaxNode::new(NodeTag::NamedPort).with_token(ident(source, name, nth));
    if let Some(actual) = actual {
        port.push_node(actual);
    }
    port
}

/// A bare identifier in expression position.
pub fn reference<'a>(source: &'a str, name: &str, nth: usize) -> SyntaxNode<'a> {
    SyntaxNode::new(NodeTag::Reference).with_token(ident(source, name, nth))
}

/// `import pkg::item;` (`item = None` for `import pkg::*;`).
pub fn import<'a>(
    source: &'a str,
    pkg: (&str, usize),
    item: Option<(&str, usize)>,
) -> SyntaxNode<'a> {
    let mut import_item =
        SyntaxNode::new(NodeTag::ImportItem).with_token(ident(source, pkg.0, pkg.1));
    if let Some((name, nth)) = item {
        import_item.push_token(ident(source, name, nth));
    }
    SyntaxNode::new(NodeTag::ImportDeclaration).with_node(import_item)
}

/// `` `define <name> ... ``.
pub fn macro_define<'a>(source: &'a str, name: &str, nth: usize) -> SyntaxNode<'a> {
    SyntaxNode::new(NodeTag::MacroDefine).with_token(ident(source, name, nth))
}

/// `` `<name> `` invocation; `lexeme` includes the tick.
pub fn macro_call<'a>(source: &'a str, lexeme: &str, nth: usize) -> SyntaxNode<'a> {
    SyntaxNode::new(NodeTag::MacroCall).with_token(macro_ident(source, lexeme, nth))
}

/// `a::b::c` in expression position.
pub fn qualified<'a>(source: &'a str, segments: &[(&str, usize)]) -> SyntaxNode<'a> {
    let mut chain = SyntaxNode::new(NodeTag::QualifiedId);
    for (name, nth) in segments {
        chain.push_token(ident(source, name, *nth));
    }
    chain
}

/// `callee(...)` with a plain identifier callee.
pub fn call<'a>(source: &'a str, callee: &str, nth: usize) -> SyntaxNode<'a> {
    SyntaxNode::new(NodeTag::FunctionCall).with_token(ident(source, callee, nth))
}

/// `pkg::cls::f(...)` with a qualified callee.
pub fn qualified_call<'a>(source: &'a str, segments: &[(&str, usize)]) -> SyntaxNode<'a> {
    SyntaxNode::new(NodeTag::FunctionCall).with_node(qualified(source, segments))
}

// ============================================================================
// Record inspection
// ============================================================================

/// Emit all records for a facts tree into memory.
pub fn emit(tree: &IndexingFactNode<'_>) -> Vec<Record> {
    let mut sink = MemorySink::new();
    extract_kythe_facts(tree, &mut sink).expect("memory sink never fails");
    sink.into_records()
}

/// Decode a base64 fact value.
pub fn decode(value: &str) -> String {
    String::from_utf8(STANDARD.decode(value).expect("valid base64")).expect("utf-8 value")
}

/// The decoded value of a fact on the vertex with the given signature.
pub fn fact_value(records: &[Record], signature: &str, name: &str) -> Option<String> {
    records.iter().find_map(|record| match record {
        Record::Fact {
            source,
            fact_name,
            fact_value,
        } if source.signature == signature && fact_name == name => Some(decode(fact_value)),
        _ => None,
    })
}

/// Position of the first edge matching source, kind, and target signatures.
pub fn edge_position(
    records: &[Record],
    source_sig: &str,
    kind: &str,
    target_sig: &str,
) -> Option<usize> {
    records.iter().position(|record| match record {
        Record::Edge {
            source,
            edge_kind,
            target,
            ..
        } => source.signature == source_sig && edge_kind == kind && target.signature == target_sig,
        _ => false,
    })
}

/// Whether an edge with the given endpoints and kind was emitted.
pub fn has_edge(records: &[Record], source_sig: &str, kind: &str, target_sig: &str) -> bool {
    edge_position(records, source_sig, kind, target_sig).is_some()
}

/// All edges of a kind, as `(source signature, target signature)` pairs.
pub fn edges_of_kind<'r>(records: &'r [Record], kind: &str) -> Vec<(&'r str, &'r str)> {
    records
        .iter()
        .filter_map(|record| match record {
            Record::Edge {
                source,
                edge_kind,
                target,
                ..
            } if edge_kind == kind => {
                Some((source.signature.as_str(), target.signature.as_str()))
            }
            _ => None,
        })
        .collect()
}

/// Serialize records exactly as a `JsonLineSink` would.
pub fn json_lines(records: &[Record]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record).expect("serializable record"));
        out.push('\n');
    }
    out
}
