//! Stage 1: project a CST into an indexing-facts tree.
//!
//! The builder recurses over the tagged CST with a current fact-node
//! insertion point. Recognized constructs create a fact node, collect their
//! anchors per the fixed layout, and descend into their structurally
//! relevant children; every other tag is walked transparently so dialect
//! noise between a construct and its parts never matters.
//!
//! The projection is infallible and pure over the CST it inspects: a
//! malformed tree (a module without a header, an import item without a
//! package name) is a parser bug, not a recoverable condition.

use tracing::trace;
use veridex_cst::{NodeTag, Span, SyntaxNode, Token, TokenCategory};

use crate::facts::{Anchor, IndexingFactNode, IndexingFactType, IndexingNodeData};

/// Build the facts tree for one source file.
///
/// `root` must be the `SourceText` node of the file's CST; `source` is the
/// buffer its tokens borrow from. The returned root is always a `File` node
/// carrying the filename and the full text as anchors.
pub fn build_facts_tree<'a>(
    filename: &str,
    source: &'a str,
    root: &SyntaxNode<'a>,
) -> IndexingFactNode<'a> {
    debug_assert_eq!(root.tag, NodeTag::SourceText, "facts root must be SourceText");

    let full = Span::new(0, source.len() as u32);
    let data = IndexingNodeData::new(IndexingFactType::File)
        .with_anchor(Anchor::synthetic(filename, full))
        .with_anchor(Anchor::new(source, full));
    let mut file = IndexingFactNode::new(data);

    let builder = FactsTreeBuilder;
    builder.visit_children(root, &mut file);
    trace!(file = filename, "facts tree built");
    file
}

struct FactsTreeBuilder;

impl FactsTreeBuilder {
    /// Dispatch on the CST tag; unrecognized tags descend transparently.
    fn visit<'a>(&self, node: &SyntaxNode<'a>, parent: &mut IndexingFactNode<'a>) {
        match node.tag {
            NodeTag::ModuleDeclaration => self.extract_module(node, parent),
            NodeTag::PackageDeclaration => self.extract_package(node, parent),
            NodeTag::ClassDeclaration => self.extract_class(node, parent),
            NodeTag::FunctionDeclaration | NodeTag::TaskDeclaration => {
                self.extract_function_or_task(node, parent)
            }
            NodeTag::DataDeclaration => self.extract_data_declaration(node, parent),
            NodeTag::ImportDeclaration => self.extract_package_imports(node, parent),
            NodeTag::MacroDefine => self.extract_macro_define(node, parent),
            NodeTag::MacroCall => self.extract_macro_call(node, parent),
            NodeTag::FunctionCall => self.extract_function_call(node, parent),
            NodeTag::QualifiedId => self.extract_member_reference(node, parent),
            NodeTag::Reference => self.extract_variable_reference(node, parent),
            _ => self.visit_children(node, parent),
        }
    }

    fn visit_children<'a>(&self, node: &SyntaxNode<'a>, parent: &mut IndexingFactNode<'a>) {
        for child in node.child_nodes() {
            self.visit(child, parent);
        }
    }

    // ------------------------------------------------------------------
    // Scoping declarations
    // ------------------------------------------------------------------

    fn extract_module<'a>(&self, node: &SyntaxNode<'a>, parent: &mut IndexingFactNode<'a>) {
        let header = node
            .first_node(NodeTag::ModuleHeader)
            .expect("module declaration without a header");
        let name = header
            .first_token(TokenCategory::Identifier)
            .expect("module header without a name");

        let mut data =
            IndexingNodeData::new(IndexingFactType::Module).with_anchor(Anchor::from_token(name));
        if let Some(label) = end_label(node) {
            data.push_anchor(Anchor::from_token(label));
        }
        let mut module = IndexingFactNode::new(data);

        // Port declarations in the header are definitions in the module body
        // scope.
        if let Some(ports) = header.first_node(NodeTag::PortList) {
            for port in ports.nodes(NodeTag::Variable) {
                self.extract_variable(port, &mut module);
            }
        }

        for child in node.child_nodes() {
            if matches!(child.tag, NodeTag::ModuleHeader | NodeTag::EndLabel) {
                continue;
            }
            self.visit(child, &mut module);
        }
        parent.push_child(module);
    }

    fn extract_package<'a>(&self, node: &SyntaxNode<'a>, parent: &mut IndexingFactNode<'a>) {
        let name = node
            .first_token(TokenCategory::Identifier)
            .expect("package declaration without a name");
        let mut data =
            IndexingNodeData::new(IndexingFactType::Package).with_anchor(Anchor::from_token(name));
        if let Some(label) = end_label(node) {
            data.push_anchor(Anchor::from_token(label));
        }
        let mut package = IndexingFactNode::new(data);
        for child in node.child_nodes() {
            if child.tag == NodeTag::EndLabel {
                continue;
            }
            self.visit(child, &mut package);
        }
        parent.push_child(package);
    }

    fn extract_class<'a>(&self, node: &SyntaxNode<'a>, parent: &mut IndexingFactNode<'a>) {
        let name = node
            .first_token(TokenCategory::Identifier)
            .expect("class declaration without a name");
        let mut data =
            IndexingNodeData::new(IndexingFactType::Class).with_anchor(Anchor::from_token(name));
        if let Some(label) = end_label(node) {
            data.push_anchor(Anchor::from_token(label));
        }
        let mut class = IndexingFactNode::new(data);
        for child in node.child_nodes() {
            if child.tag == NodeTag::EndLabel {
                continue;
            }
            self.visit(child, &mut class);
        }
        parent.push_child(class);
    }

    fn extract_function_or_task<'a>(
        &self,
        node: &SyntaxNode<'a>,
        parent: &mut IndexingFactNode<'a>,
    ) {
        let name = node
            .first_token(TokenCategory::Identifier)
            .expect("function or task declaration without a name");
        let mut data = IndexingNodeData::new(IndexingFactType::FunctionOrTask)
            .with_anchor(Anchor::from_token(name));
        if let Some(label) = end_label(node) {
            data.push_anchor(Anchor::from_token(label));
        }
        let mut function = IndexingFactNode::new(data);

        // Formal arguments are definitions in the body scope.
        if let Some(ports) = node.first_node(NodeTag::PortList) {
            for port in ports.nodes(NodeTag::Variable) {
                self.extract_variable(port, &mut function);
            }
        }

        for child in node.child_nodes() {
            if matches!(child.tag, NodeTag::PortList | NodeTag::EndLabel) {
                continue;
            }
            self.visit(child, &mut function);
        }
        parent.push_child(function);
    }

    // ------------------------------------------------------------------
    // Data declarations, instances, ports
    // ------------------------------------------------------------------

    fn extract_data_declaration<'a>(
        &self,
        node: &SyntaxNode<'a>,
        parent: &mut IndexingFactNode<'a>,
    ) {
        match node.first_node(NodeTag::TypeRef) {
            Some(type_ref) => self.extract_typed_declaration(node, type_ref, parent),
            None => {
                // Builtin-typed declaration: plain variable definitions.
                for child in node.child_nodes() {
                    if child.tag == NodeTag::Variable {
                        self.extract_variable(child, parent);
                    } else {
                        self.visit(child, parent);
                    }
                }
            }
        }
    }

    /// A declaration with a named type: instantiation or class instances,
    /// both rooted at a `DataTypeReference` fact for the type name.
    fn extract_typed_declaration<'a>(
        &self,
        node: &SyntaxNode<'a>,
        type_ref: &SyntaxNode<'a>,
        parent: &mut IndexingFactNode<'a>,
    ) {
        let type_name = type_ref
            .first_token(TokenCategory::Identifier)
            .expect("type reference without a name");
        let mut data_type = IndexingFactNode::new(
            IndexingNodeData::new(IndexingFactType::DataTypeReference)
                .with_anchor(Anchor::from_token(type_name)),
        );

        for child in node.child_nodes() {
            match child.tag {
                NodeTag::TypeRef => {}
                NodeTag::GateInstance => self.extract_module_instance(child, &mut data_type),
                NodeTag::Variable => self.extract_class_instance(child, &mut data_type),
                _ => self.visit(child, &mut data_type),
            }
        }
        parent.push_child(data_type);
    }

    fn extract_module_instance<'a>(
        &self,
        node: &SyntaxNode<'a>,
        data_type: &mut IndexingFactNode<'a>,
    ) {
        let name = node
            .first_token(TokenCategory::Identifier)
            .expect("instance without a name");
        let mut data = IndexingNodeData::new(IndexingFactType::ModuleInstance)
            .with_anchor(Anchor::from_token(name));

        // Bare positional connections become trailing anchors on the
        // instance; named connections become child facts.
        let mut named_ports = Vec::new();
        if let Some(connections) = node.first_node(NodeTag::PortList) {
            for connection in connections.child_nodes() {
                match connection.tag {
                    NodeTag::Reference => {
                        if let Some(actual) = connection.first_token(TokenCategory::Identifier) {
                            data.push_anchor(Anchor::from_token(actual));
                        }
                    }
                    NodeTag::NamedPort => named_ports.push(self.named_port_fact(connection)),
                    _ => {}
                }
            }
        }

        let mut instance = IndexingFactNode::new(data);
        for port in named_ports {
            instance.push_child(port);
        }
        data_type.push_child(instance);
    }

    fn named_port_fact<'a>(&self, node: &SyntaxNode<'a>) -> IndexingFactNode<'a> {
        let name = node
            .first_token(TokenCategory::Identifier)
            .expect("named port without a name");
        let mut port = IndexingFactNode::new(
            IndexingNodeData::new(IndexingFactType::ModuleNamedPort)
                .with_anchor(Anchor::from_token(name)),
        );
        // An explicit actual becomes a child; an implicit `.port` connection
        // leaves the fact childless, which is what resolution keys on.
        self.visit_children(node, &mut port);
        port
    }

    fn extract_class_instance<'a>(
        &self,
        node: &SyntaxNode<'a>,
        data_type: &mut IndexingFactNode<'a>,
    ) {
        let name = node
            .first_token(TokenCategory::Identifier)
            .expect("class instance without a name");
        data_type.push_child(IndexingFactNode::new(
            IndexingNodeData::new(IndexingFactType::ClassInstance)
                .with_anchor(Anchor::from_token(name)),
        ));
        // Constructor arguments and initializers are plain references.
        self.visit_children(node, data_type);
    }

    fn extract_variable<'a>(&self, node: &SyntaxNode<'a>, parent: &mut IndexingFactNode<'a>) {
        let name = node
            .first_token(TokenCategory::Identifier)
            .expect("variable without a name");
        parent.push_child(IndexingFactNode::new(
            IndexingNodeData::new(IndexingFactType::VariableDefinition)
                .with_anchor(Anchor::from_token(name)),
        ));
        // Initializer references follow the definition as siblings.
        self.visit_children(node, parent);
    }

    // ------------------------------------------------------------------
    // References, calls, imports, macros
    // ------------------------------------------------------------------

    fn extract_variable_reference<'a>(
        &self,
        node: &SyntaxNode<'a>,
        parent: &mut IndexingFactNode<'a>,
    ) {
        let name = node
            .first_token(TokenCategory::Identifier)
            .expect("reference without an identifier");
        parent.push_child(IndexingFactNode::new(
            IndexingNodeData::new(IndexingFactType::VariableReference)
                .with_anchor(Anchor::from_token(name)),
        ));
    }

    fn extract_member_reference<'a>(
        &self,
        node: &SyntaxNode<'a>,
        parent: &mut IndexingFactNode<'a>,
    ) {
        let mut data = IndexingNodeData::new(IndexingFactType::MemberReference);
        for segment in identifier_tokens(node) {
            data.push_anchor(Anchor::from_token(segment));
        }
        debug_assert!(
            data.anchors().len() >= 2,
            "qualified reference needs at least two segments"
        );
        parent.push_child(IndexingFactNode::new(data));
    }

    fn extract_function_call<'a>(&self, node: &SyntaxNode<'a>, parent: &mut IndexingFactNode<'a>) {
        let mut data = IndexingNodeData::new(IndexingFactType::FunctionCall);
        match node.first_node(NodeTag::QualifiedId) {
            Some(qualified) => {
                for segment in identifier_tokens(qualified) {
                    data.push_anchor(Anchor::from_token(segment));
                }
            }
            None => {
                let callee = node
                    .first_token(TokenCategory::Identifier)
                    .expect("call without a callee");
                data.push_anchor(Anchor::from_token(callee));
            }
        }
        parent.push_child(IndexingFactNode::new(data));

        // Argument references follow the call fact as siblings.
        if let Some(arguments) = node.first_node(NodeTag::ArgumentList) {
            self.visit_children(arguments, parent);
        }
    }

    fn extract_package_imports<'a>(
        &self,
        node: &SyntaxNode<'a>,
        parent: &mut IndexingFactNode<'a>,
    ) {
        for item in node.nodes(NodeTag::ImportItem) {
            let mut names = item
                .tokens()
                .filter(|token| token.category == TokenCategory::Identifier);
            let package = names.next().expect("import item without a package name");
            let mut data = IndexingNodeData::new(IndexingFactType::PackageImport)
                .with_anchor(Anchor::from_token(package));
            // `pkg::*` has no item identifier and stays single-anchored.
            if let Some(imported) = names.next() {
                data.push_anchor(Anchor::from_token(imported));
            }
            parent.push_child(IndexingFactNode::new(data));
        }
    }

    fn extract_macro_define<'a>(&self, node: &SyntaxNode<'a>, parent: &mut IndexingFactNode<'a>) {
        let name = node
            .first_token(TokenCategory::Identifier)
            .expect("macro definition without a name");
        let mut fact = IndexingFactNode::new(
            IndexingNodeData::new(IndexingFactType::Macro).with_anchor(Anchor::from_token(name)),
        );
        self.visit_children(node, &mut fact);
        parent.push_child(fact);
    }

    fn extract_macro_call<'a>(&self, node: &SyntaxNode<'a>, parent: &mut IndexingFactNode<'a>) {
        let name = node
            .first_token(TokenCategory::MacroIdentifier)
            .expect("macro call without a macro identifier");
        debug_assert!(
            name.text.starts_with('`'),
            "macro identifier must keep its tick"
        );
        parent.push_child(IndexingFactNode::new(
            IndexingNodeData::new(IndexingFactType::MacroCall)
                .with_anchor(Anchor::from_token(name)),
        ));
    }
}

/// The end-label identifier of a declaration, if present.
fn end_label<'b, 'a>(node: &'b SyntaxNode<'a>) -> Option<&'b Token<'a>> {
    node.first_node(NodeTag::EndLabel)
        .and_then(|label| label.first_token(TokenCategory::Identifier))
}

/// Identifier tokens of a qualified chain, outermost first.
fn identifier_tokens<'b, 'a>(
    node: &'b SyntaxNode<'a>,
) -> impl Iterator<Item = &'b Token<'a>> + 'b {
    node.tokens()
        .filter(|token| token.category == TokenCategory::Identifier)
}

// ============================================================================
// Tests
// ============================================================================
