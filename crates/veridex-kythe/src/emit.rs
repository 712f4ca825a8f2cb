//! Stage 2: emit Kythe vertex and edge facts from an indexing-facts tree.
//!
//! The emitter re-walks the facts tree with three pieces of ambient state:
//! the lexical scope stack, the flattened scope map, and the VName ancestor
//! stack (see [`crate::scope`]). Records stream straight to the sink as they
//! are formed; nothing is buffered or deduplicated.
//!
//! # Pass structure
//!
//! 1. The file vertex (`node/kind=file`, `text`) is emitted first, so the
//!    record stream always opens with the file.
//! 2. A pre-pass visits the packages among the file root's direct children
//!    and emits all of their facts, so that imports appearing earlier in the
//!    file than a package can still resolve into it.
//! 3. The main pass walks the rest of the tree pre-order, skipping the
//!    file-level packages already handled.
//!
//! # Resolution
//!
//! Unresolved references are not errors: the edge is simply not emitted,
//! except for bare variable references which fall back to a synthesized
//! scope-relative target so downstream merging can still join on it. The
//! only fallible operation is writing to the sink.

use tracing::{debug, trace};

use crate::error::SinkError;
use crate::facts::{Anchor, IndexingFactNode, IndexingFactType};
use crate::schema::*;
use crate::scope::{FlattenedScopes, LexicalScopes, VNameContext};
use crate::sink::{FactSink, Record};
use crate::vname::{anchor_signature, scope_relative_signature, signature, VName};

// ============================================================================
// Options and entry points
// ============================================================================

/// VName fields fixed for one extraction run.
#[derive(Debug, Clone, Default)]
pub struct EmitterOptions {
    /// Language tag stamped on every VName.
    pub language: String,
    /// Corpus root stamped on every VName.
    pub root: String,
    /// Corpus name stamped on every VName.
    pub corpus: String,
}

/// Emit all Kythe facts for one facts tree with default options.
pub fn extract_kythe_facts<S: FactSink>(
    root: &IndexingFactNode<'_>,
    sink: &mut S,
) -> Result<(), SinkError> {
    extract_kythe_facts_with(root, &EmitterOptions::default(), sink)
}

/// Emit all Kythe facts for one facts tree.
///
/// `root` must be the `File` node produced by
/// [`crate::extract::build_facts_tree`]; its first anchor names the file
/// path used on every VName.
pub fn extract_kythe_facts_with<S: FactSink>(
    root: &IndexingFactNode<'_>,
    options: &EmitterOptions,
    sink: &mut S,
) -> Result<(), SinkError> {
    debug_assert_eq!(root.kind(), IndexingFactType::File, "emission starts at a File node");
    let file_path = root.anchors()[0].text().to_string();
    debug!(file = %file_path, "emitting kythe facts");

    let mut emitter = KytheFactsEmitter {
        file_path,
        options,
        sink,
        lexical_scopes: LexicalScopes::new(),
        flattened_scopes: FlattenedScopes::new(),
        vname_context: VNameContext::new(),
        ancestors: Vec::new(),
    };
    emitter.run(root)
}

// ============================================================================
// Emitter
// ============================================================================

struct KytheFactsEmitter<'t, 's, S: FactSink> {
    file_path: String,
    options: &'s EmitterOptions,
    sink: &'s mut S,
    lexical_scopes: LexicalScopes,
    flattened_scopes: FlattenedScopes,
    vname_context: VNameContext,
    /// Facts-tree ancestors of the node currently being resolved.
    ancestors: Vec<&'t IndexingFactNode<'t>>,
}

impl<'t, 's, S: FactSink> KytheFactsEmitter<'t, 's, S> {
    fn run(&mut self, root: &'t IndexingFactNode<'t>) -> Result<(), SinkError> {
        let file_vname = self.emit_file_vertex(root)?;
        self.create_package_scopes(root)?;

        // Main pass: the file opens the outermost scope; its package
        // children were consumed by the pre-pass.
        self.lexical_scopes.push_scope();
        self.vname_context.push(file_vname.clone());
        self.ancestors.push(root);
        for child in root.children() {
            if child.kind() == IndexingFactType::Package {
                continue;
            }
            self.resolve(child)?;
        }
        self.ancestors.pop();
        self.vname_context.pop();
        let members = self.lexical_scopes.pop_scope();
        self.flattened_scopes.insert(file_vname.signature, members);
        Ok(())
    }

    /// Pre-pass: packages among the file root's direct children, so later
    /// imports can resolve forward references into them.
    fn create_package_scopes(&mut self, root: &'t IndexingFactNode<'t>) -> Result<(), SinkError> {
        for child in root.children() {
            if child.kind() != IndexingFactType::Package {
                continue;
            }
            let package_vname = self.emit_package(child)?;
            self.visit(child, Some(&package_vname))?;
        }
        Ok(())
    }

    /// Resolve one node: derive its VName, contribute it to the enclosing
    /// scope, emit its `childof` edge, then descend.
    fn resolve(&mut self, node: &'t IndexingFactNode<'t>) -> Result<(), SinkError> {
        let kind = node.kind();
        let vname = match kind {
            IndexingFactType::File => {
                debug_assert!(false, "File node below the root");
                None
            }
            IndexingFactType::Module => Some(self.emit_module(node)?),
            IndexingFactType::ModuleInstance | IndexingFactType::ClassInstance => {
                Some(self.emit_instance(node)?)
            }
            IndexingFactType::VariableDefinition => Some(self.emit_variable_definition(node)?),
            IndexingFactType::Macro => Some(self.emit_macro_definition(node)?),
            IndexingFactType::Class => Some(self.emit_class(node)?),
            IndexingFactType::FunctionOrTask => Some(self.emit_function_or_task(node)?),
            IndexingFactType::Package => Some(self.emit_package(node)?),
            IndexingFactType::DataTypeReference => {
                self.emit_data_type_reference(node)?;
                None
            }
            IndexingFactType::ModuleNamedPort => {
                self.emit_module_named_port(node)?;
                None
            }
            IndexingFactType::VariableReference => {
                self.emit_variable_reference(node)?;
                None
            }
            IndexingFactType::FunctionCall => {
                self.emit_function_call(node)?;
                None
            }
            IndexingFactType::PackageImport => {
                self.emit_package_import(node)?;
                None
            }
            IndexingFactType::MacroCall => {
                self.emit_macro_call(node)?;
                None
            }
            IndexingFactType::MemberReference => {
                self.emit_member_reference(node, false)?;
                None
            }
        };

        self.add_to_lexical_scope(kind, vname.as_ref());
        self.emit_childof(kind, vname.as_ref())?;
        self.visit(node, vname.as_ref())
    }

    /// Whether this kind's VName is visible to later siblings.
    fn add_to_lexical_scope(&mut self, kind: IndexingFactType, vname: Option<&VName>) {
        match kind {
            IndexingFactType::Module
            | IndexingFactType::ModuleInstance
            | IndexingFactType::VariableDefinition
            | IndexingFactType::Macro
            | IndexingFactType::Class
            | IndexingFactType::ClassInstance
            | IndexingFactType::FunctionOrTask => {
                if let Some(vname) = vname {
                    self.lexical_scopes.declare(vname.clone());
                }
            }
            _ => {}
        }
    }

    /// Structural containment edge to the innermost enclosing definition.
    fn emit_childof(
        &mut self,
        kind: IndexingFactType,
        vname: Option<&VName>,
    ) -> Result<(), SinkError> {
        match kind {
            IndexingFactType::File
            | IndexingFactType::PackageImport
            | IndexingFactType::VariableReference
            | IndexingFactType::DataTypeReference
            | IndexingFactType::MacroCall
            | IndexingFactType::FunctionCall
            | IndexingFactType::Macro
            | IndexingFactType::ModuleNamedPort
            | IndexingFactType::MemberReference => Ok(()),
            _ => {
                let parent = self.vname_context.top().cloned();
                match (vname, parent) {
                    (Some(vname), Some(parent)) => self.emit_edge(vname, EDGE_CHILD_OF, &parent),
                    _ => Ok(()),
                }
            }
        }
    }

    /// Descend into children, opening a lexical scope for scoping kinds,
    /// then populate the flattened scope map.
    fn visit(
        &mut self,
        node: &'t IndexingFactNode<'t>,
        vname: Option<&VName>,
    ) -> Result<(), SinkError> {
        let kind = node.kind();
        let scope_members = match kind {
            IndexingFactType::File
            | IndexingFactType::Module
            | IndexingFactType::FunctionOrTask
            | IndexingFactType::Class
            | IndexingFactType::Macro
            | IndexingFactType::Package => {
                let vname = vname.expect("scoping definition without a VName");
                self.lexical_scopes.push_scope();
                self.vname_context.push(vname.clone());
                self.visit_children(node)?;
                self.vname_context.pop();
                Some(self.lexical_scopes.pop_scope())
            }
            _ => {
                self.visit_children(node)?;
                None
            }
        };
        self.construct_flattened_scope(node, vname, scope_members);
        Ok(())
    }

    fn visit_children(&mut self, node: &'t IndexingFactNode<'t>) -> Result<(), SinkError> {
        self.ancestors.push(node);
        for child in node.children() {
            self.resolve(child)?;
        }
        self.ancestors.pop();
        Ok(())
    }

    fn construct_flattened_scope(
        &mut self,
        node: &IndexingFactNode<'_>,
        vname: Option<&VName>,
        scope_members: Option<Vec<VName>>,
    ) {
        match node.kind() {
            IndexingFactType::File
            | IndexingFactType::Module
            | IndexingFactType::FunctionOrTask
            | IndexingFactType::Class
            | IndexingFactType::Macro
            | IndexingFactType::Package => {
                if let (Some(vname), Some(members)) = (vname, scope_members) {
                    self.flattened_scopes.insert(vname.signature.clone(), members);
                }
            }
            IndexingFactType::ModuleInstance | IndexingFactType::ClassInstance => {
                // The instance inherits its type's member scope; the type
                // name is the parent fact's first anchor.
                let Some(vname) = vname else { return };
                let Some(parent) = self.ancestors.last() else { return };
                let type_name = parent.anchors()[0].text();
                if let Some(type_vname) = self.lexical_scopes.find(&signature(type_name)) {
                    let type_signature = type_vname.signature.clone();
                    self.flattened_scopes
                        .copy_scope(&type_signature, vname.signature.clone());
                }
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Per-kind emission
    // ------------------------------------------------------------------

    fn emit_file_vertex(&mut self, node: &IndexingFactNode<'_>) -> Result<VName, SinkError> {
        let file_vname = self.vname(String::new());
        let text = node.anchors()[1].text().to_string();
        self.emit_fact(&file_vname, FACT_NODE_KIND, NODE_FILE)?;
        self.emit_fact(&file_vname, FACT_TEXT, &text)?;
        Ok(file_vname)
    }

    fn emit_module(&mut self, node: &IndexingFactNode<'_>) -> Result<VName, SinkError> {
        let anchors = node.anchors();
        let name = &anchors[0];
        let module_vname = self.vname(self.scope_relative_signature(name.text()));
        let name_anchor = self.emit_anchor(name)?;

        self.emit_fact(&module_vname, FACT_NODE_KIND, NODE_RECORD)?;
        self.emit_fact(&module_vname, FACT_SUBKIND, SUBKIND_MODULE)?;
        self.emit_fact(&module_vname, FACT_COMPLETE, COMPLETE_DEFINITION)?;
        self.emit_edge(&name_anchor, EDGE_DEFINES_BINDING, &module_vname)?;

        if let Some(end_label) = anchors.get(1) {
            let end_anchor = self.emit_anchor(end_label)?;
            self.emit_edge(&end_anchor, EDGE_REF, &module_vname)?;
        }
        Ok(module_vname)
    }

    fn emit_class(&mut self, node: &IndexingFactNode<'_>) -> Result<VName, SinkError> {
        let anchors = node.anchors();
        let name = &anchors[0];
        let class_vname = self.vname(self.scope_relative_signature(name.text()));
        let name_anchor = self.emit_anchor(name)?;

        self.emit_fact(&class_vname, FACT_NODE_KIND, NODE_RECORD)?;
        self.emit_fact(&class_vname, FACT_COMPLETE, COMPLETE_DEFINITION)?;
        self.emit_edge(&name_anchor, EDGE_DEFINES_BINDING, &class_vname)?;

        if let Some(end_label) = anchors.get(1) {
            let end_anchor = self.emit_anchor(end_label)?;
            self.emit_edge(&end_anchor, EDGE_REF, &class_vname)?;
        }
        Ok(class_vname)
    }

    fn emit_package(&mut self, node: &IndexingFactNode<'_>) -> Result<VName, SinkError> {
        let anchors = node.anchors();
        let name = &anchors[0];
        let package_vname = self.vname(self.scope_relative_signature(name.text()));
        let name_anchor = self.emit_anchor(name)?;

        self.emit_fact(&package_vname, FACT_NODE_KIND, NODE_PACKAGE)?;
        self.emit_edge(&name_anchor, EDGE_DEFINES_BINDING, &package_vname)?;

        if let Some(end_label) = anchors.get(1) {
            let end_anchor = self.emit_anchor(end_label)?;
            self.emit_edge(&end_anchor, EDGE_REF, &package_vname)?;
        }
        Ok(package_vname)
    }

    fn emit_function_or_task(&mut self, node: &IndexingFactNode<'_>) -> Result<VName, SinkError> {
        let name = &node.anchors()[0];
        let function_vname = self.vname(self.scope_relative_signature(name.text()));
        let name_anchor = self.emit_anchor(name)?;

        self.emit_fact(&function_vname, FACT_NODE_KIND, NODE_FUNCTION)?;
        self.emit_fact(&function_vname, FACT_COMPLETE, COMPLETE_DEFINITION)?;
        self.emit_edge(&name_anchor, EDGE_DEFINES_BINDING, &function_vname)?;
        Ok(function_vname)
    }

    fn emit_variable_definition(&mut self, node: &IndexingFactNode<'_>) -> Result<VName, SinkError> {
        let name = &node.anchors()[0];
        let variable_vname = self.vname(self.scope_relative_signature(name.text()));
        let name_anchor = self.emit_anchor(name)?;

        self.emit_fact(&variable_vname, FACT_NODE_KIND, NODE_VARIABLE)?;
        self.emit_fact(&variable_vname, FACT_COMPLETE, COMPLETE_DEFINITION)?;
        self.emit_edge(&name_anchor, EDGE_DEFINES_BINDING, &variable_vname)?;
        Ok(variable_vname)
    }

    /// Module and class instances share the variable-definition emission;
    /// module instances additionally resolve their trailing anchors as bare
    /// port references.
    fn emit_instance(&mut self, node: &IndexingFactNode<'_>) -> Result<VName, SinkError> {
        let instance_vname = self.emit_variable_definition(node)?;
        for connected in &node.anchors()[1..] {
            let port_definition = self.lexical_scopes.find(&signature(connected.text())).cloned();
            match port_definition {
                Some(port_definition) => {
                    let connected_anchor = self.emit_anchor(connected)?;
                    self.emit_edge(&connected_anchor, EDGE_REF, &port_definition)?;
                }
                None => trace!(port = connected.text(), "unresolved instance port"),
            }
        }
        Ok(instance_vname)
    }

    fn emit_data_type_reference(&mut self, node: &IndexingFactNode<'_>) -> Result<(), SinkError> {
        let type_name = &node.anchors()[0];
        let type_vname = self.lexical_scopes.find(&signature(type_name.text())).cloned();
        match type_vname {
            Some(type_vname) => {
                let type_anchor = self.emit_anchor(type_name)?;
                self.emit_edge(&type_anchor, EDGE_REF, &type_vname)
            }
            None => {
                trace!(ty = type_name.text(), "unresolved data type reference");
                Ok(())
            }
        }
    }

    fn emit_module_named_port(&mut self, node: &IndexingFactNode<'_>) -> Result<(), SinkError> {
        let port_name = &node.anchors()[0];

        // The enclosing instance's type: grandparent DataTypeReference's
        // first anchor.
        let type_vname = self
            .ancestors
            .iter()
            .rev()
            .nth(1)
            .map(|grandparent| grandparent.anchors()[0].text())
            .and_then(|type_name| self.lexical_scopes.find(&signature(type_name)))
            .cloned();

        let port_anchor = self.emit_anchor(port_name)?;

        if let Some(type_vname) = type_vname {
            let formal = self
                .flattened_scopes
                .find_member(&type_vname.signature, &signature(port_name.text()))
                .cloned();
            if let Some(formal) = formal {
                self.emit_edge(&port_anchor, EDGE_REF, &formal)?;
            }
        }

        // Implicit `.port` shorthand also references the like-named local.
        if node.children().is_empty() {
            let local = self.lexical_scopes.find(&signature(port_name.text())).cloned();
            if let Some(local) = local {
                self.emit_edge(&port_anchor, EDGE_REF, &local)?;
            }
        }
        Ok(())
    }

    fn emit_variable_reference(&mut self, node: &IndexingFactNode<'_>) -> Result<(), SinkError> {
        let name = &node.anchors()[0];
        let name_anchor = self.emit_anchor(name)?;

        let definition = self.lexical_scopes.find(&signature(name.text())).cloned();
        match definition {
            Some(definition) => self.emit_edge(&name_anchor, EDGE_REF, &definition),
            None => {
                // Dangling reference: synthesize a scope-relative target so
                // downstream merging can still join on it.
                let synthesized = self.vname(self.scope_relative_signature(name.text()));
                self.emit_edge(&name_anchor, EDGE_REF, &synthesized)
            }
        }
    }

    fn emit_function_call(&mut self, node: &IndexingFactNode<'_>) -> Result<(), SinkError> {
        let anchors = node.anchors();
        if anchors.len() == 1 {
            let name = &anchors[0];
            let function_vname = self.lexical_scopes.find(&signature(name.text())).cloned();
            match function_vname {
                Some(function_vname) => {
                    let name_anchor = self.emit_anchor(name)?;
                    self.emit_edge(&name_anchor, EDGE_REF, &function_vname)?;
                    self.emit_edge(&name_anchor, EDGE_REF_CALL, &function_vname)
                }
                None => {
                    trace!(callee = name.text(), "unresolved call");
                    Ok(())
                }
            }
        } else {
            // Qualified callee: resolve as a member chain, calling the
            // innermost resolved member.
            self.emit_member_reference(node, true)
        }
    }

    fn emit_member_reference(
        &mut self,
        node: &IndexingFactNode<'_>,
        is_call: bool,
    ) -> Result<(), SinkError> {
        let anchors = node.anchors();
        if anchors.len() < 2 {
            return Ok(());
        }
        let outer = &anchors[0];
        let outer_signature = signature(outer.text());

        // The chain head is either a package (resolvable through its
        // flattened scope) or a local type/variable.
        let mut current_signature;
        if self
            .flattened_scopes
            .find_member(&outer_signature, &signature(anchors[1].text()))
            .is_some()
        {
            let package_vname = self.vname(outer_signature.clone());
            let outer_anchor = self.emit_anchor(outer)?;
            self.emit_edge(&outer_anchor, EDGE_REF, &package_vname)?;
            current_signature = outer_signature;
        } else {
            let containing = self.lexical_scopes.find(&outer_signature).cloned();
            let Some(containing) = containing else {
                trace!(outer = outer.text(), "unresolved member reference head");
                return Ok(());
            };
            let outer_anchor = self.emit_anchor(outer)?;
            self.emit_edge(&outer_anchor, EDGE_REF, &containing)?;
            current_signature = containing.signature;
        }

        // Resolve the rest of the chain. A miss skips that segment but
        // keeps probing later ones against the last resolved scope.
        let mut last_resolved: Option<(VName, VName)> = None;
        for member in &anchors[1..] {
            let found = self
                .flattened_scopes
                .find_member(&current_signature, &signature(member.text()))
                .cloned();
            let Some(member_vname) = found else {
                trace!(member = member.text(), "unresolved member in chain");
                continue;
            };
            let member_anchor = self.emit_anchor(member)?;
            self.emit_edge(&member_anchor, EDGE_REF, &member_vname)?;
            current_signature = member_vname.signature.clone();
            last_resolved = Some((member_anchor, member_vname));
        }

        if is_call {
            if let Some((callee_anchor, callee_vname)) = last_resolved {
                self.emit_edge(&callee_anchor, EDGE_REF_CALL, &callee_vname)?;
            }
        }
        Ok(())
    }

    fn emit_package_import(&mut self, node: &IndexingFactNode<'_>) -> Result<(), SinkError> {
        let anchors = node.anchors();
        let package_name = &anchors[0];
        let package_vname = self.vname(signature(package_name.text()));
        let package_anchor = self.emit_anchor(package_name)?;
        self.emit_edge(&package_anchor, EDGE_REF_IMPORTS, &package_vname)?;

        if let Some(item) = anchors.get(1) {
            // `import pkg::item`: the item becomes visible unqualified.
            let found = self
                .flattened_scopes
                .find_member(&package_vname.signature, &signature(item.text()))
                .cloned();
            let Some(definition) = found else {
                trace!(item = item.text(), "unresolved import item");
                return Ok(());
            };
            let item_anchor = self.emit_anchor(item)?;
            self.emit_edge(&item_anchor, EDGE_REF, &definition)?;
            self.lexical_scopes.declare(definition);
        } else {
            // `import pkg::*`: everything the package declares becomes
            // visible unqualified.
            let Some(members) = self.flattened_scopes.members(&package_vname.signature) else {
                trace!(package = package_name.text(), "unresolved wildcard import");
                return Ok(());
            };
            let members = members.to_vec();
            self.lexical_scopes.declare(package_vname);
            for member in members {
                self.lexical_scopes.declare(member);
            }
        }
        Ok(())
    }

    fn emit_macro_definition(&mut self, node: &IndexingFactNode<'_>) -> Result<VName, SinkError> {
        // Macros are file-global: unqualified signature regardless of scope.
        let name = &node.anchors()[0];
        let macro_vname = self.vname(signature(name.text()));
        let name_anchor = self.emit_anchor(name)?;

        self.emit_fact(&macro_vname, FACT_NODE_KIND, NODE_MACRO)?;
        self.emit_edge(&name_anchor, EDGE_DEFINES_BINDING, &macro_vname)?;
        Ok(macro_vname)
    }

    fn emit_macro_call(&mut self, node: &IndexingFactNode<'_>) -> Result<(), SinkError> {
        let name = &node.anchors()[0];
        let call_anchor = self.emit_anchor(name)?;
        // The lexeme keeps its tick; the definition's signature does not.
        let stripped = name.text().get(1..).unwrap_or_default();
        let target_vname = self.vname(signature(stripped));
        self.emit_edge(&call_anchor, EDGE_REF_EXPANDS, &target_vname)
    }

    // ------------------------------------------------------------------
    // Record plumbing
    // ------------------------------------------------------------------

    fn vname(&self, signature: String) -> VName {
        VName {
            signature,
            path: self.file_path.clone(),
            language: self.options.language.clone(),
            root: self.options.root.clone(),
            corpus: self.options.corpus.clone(),
        }
    }

    fn scope_relative_signature(&self, name: &str) -> String {
        match self.vname_context.top() {
            Some(parent) => scope_relative_signature(name, &parent.signature),
            None => signature(name),
        }
    }

    /// Emit the anchor vertex for a source span and return its VName.
    ///
    /// Re-emission of the same anchor is expected; downstream ingestion is
    /// idempotent on identical facts.
    fn emit_anchor(&mut self, anchor: &Anchor<'_>) -> Result<VName, SinkError> {
        let anchor_vname = self.vname(anchor_signature(anchor.span()));
        self.emit_fact(&anchor_vname, FACT_NODE_KIND, NODE_ANCHOR)?;
        self.emit_fact(&anchor_vname, FACT_LOC_START, &anchor.start().to_string())?;
        self.emit_fact(&anchor_vname, FACT_LOC_END, &anchor.end().to_string())?;
        Ok(anchor_vname)
    }

    fn emit_fact(&mut self, vname: &VName, fact_name: &str, value: &str) -> Result<(), SinkError> {
        self.sink.append(Record::fact(vname.clone(), fact_name, value))
    }

    fn emit_edge(&mut self, source: &VName, kind: &str, target: &VName) -> Result<(), SinkError> {
        self.sink.append(Record::edge(source.clone(), kind, target.clone()))
    }
}
