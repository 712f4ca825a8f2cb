//! Scope model used during fact emission.
//!
//! Three structures cooperate while the emitter walks the facts tree:
//!
//! - [`LexicalScopes`]: a stack of mutable symbol lists, one per enclosing
//!   scoping definition (file, module, class, package, function, macro).
//!   Bottom-up name resolution searches newest scope to oldest.
//! - [`FlattenedScopes`]: a map from a definition's signature to the symbols
//!   declared directly inside it, populated when the emitter leaves the
//!   definition. Qualified (`pkg::item`) lookups go through here. Instances
//!   get an entry copied from their type's scope so `inst.member` resolves.
//! - [`VNameContext`]: the stack of ancestor VNames, used for `childof`
//!   edges and scope-relative signatures.
//!
//! # Lookup rules
//!
//! The matching rules are deliberately loose and must stay exactly as they
//! are to keep the record stream stable:
//!
//! - lexical lookup matches by *substring containment*: probing with `x#`
//!   matches `x#foo#` because child signatures embed the parent signature
//!   as a suffix;
//! - flattened lookup matches by *prefix*: probing `flattened[foo#]` with
//!   `port#` matches `port#foo#`.

use std::collections::HashMap;

use crate::vname::VName;

// ============================================================================
// Lexical scopes
// ============================================================================

/// Stack of symbol lists for bottom-up name resolution.
#[derive(Debug, Default)]
pub struct LexicalScopes {
    scopes: Vec<Vec<VName>>,
}

impl LexicalScopes {
    /// Create an empty stack.
    pub fn new() -> Self {
        LexicalScopes::default()
    }

    /// Enter a new innermost scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    /// Leave the innermost scope, returning the symbols declared in it.
    ///
    /// # Panics
    /// Panics if no scope is open (builder/emitter pairing bug).
    pub fn pop_scope(&mut self) -> Vec<VName> {
        self.scopes.pop().expect("pop_scope without matching push")
    }

    /// Declare a symbol in the innermost scope.
    ///
    /// # Panics
    /// Panics if no scope is open.
    pub fn declare(&mut self, vname: VName) {
        self.scopes
            .last_mut()
            .expect("declare outside any scope")
            .push(vname);
    }

    /// Resolve a signature probe against all open scopes.
    ///
    /// Scopes are searched newest to oldest, and within each scope entries
    /// newest-first; the first VName whose signature *contains* `probe` as a
    /// substring wins.
    pub fn find(&self, probe: &str) -> Option<&VName> {
        for scope in self.scopes.iter().rev() {
            for vname in scope.iter().rev() {
                if vname.signature.contains(probe) {
                    return Some(vname);
                }
            }
        }
        None
    }
}

// ============================================================================
// Flattened scopes
// ============================================================================

/// Map from a definition's signature to its directly-declared symbols.
#[derive(Debug, Default)]
pub struct FlattenedScopes {
    scopes: HashMap<String, Vec<VName>>,
}

impl FlattenedScopes {
    /// Create an empty map.
    pub fn new() -> Self {
        FlattenedScopes::default()
    }

    /// Record the symbols declared directly inside `owner`.
    pub fn insert(&mut self, owner_signature: String, members: Vec<VName>) {
        self.scopes.insert(owner_signature, members);
    }

    /// Copy a type's member list under an instance's signature.
    ///
    /// A missing source scope copies as empty, so the instance still gets an
    /// entry; member lookups against it then simply miss.
    pub fn copy_scope(&mut self, type_signature: &str, instance_signature: String) {
        let members = self.scopes.get(type_signature).cloned().unwrap_or_default();
        self.scopes.insert(instance_signature, members);
    }

    /// The symbols declared directly inside `owner`, if recorded.
    pub fn members(&self, owner_signature: &str) -> Option<&[VName]> {
        self.scopes.get(owner_signature).map(Vec::as_slice)
    }

    /// Resolve a member of `owner` by signature prefix.
    ///
    /// Linear scan in declaration order; the first member whose signature
    /// *starts with* `prefix` wins.
    pub fn find_member(&self, owner_signature: &str, prefix: &str) -> Option<&VName> {
        self.scopes
            .get(owner_signature)?
            .iter()
            .find(|vname| vname.signature.starts_with(prefix))
    }
}

// ============================================================================
// VName context
// ============================================================================

/// Stack of ancestor VNames along the current traversal path.
#[derive(Debug, Default)]
pub struct VNameContext {
    stack: Vec<VName>,
}

impl VNameContext {
    /// Create an empty stack.
    pub fn new() -> Self {
        VNameContext::default()
    }

    /// Enter a definition.
    pub fn push(&mut self, vname: VName) {
        self.stack.push(vname);
    }

    /// Leave the innermost definition.
    ///
    /// # Panics
    /// Panics if the stack is empty (push/pop pairing bug).
    pub fn pop(&mut self) {
        self.stack.pop().expect("pop on empty VName context");
    }

    /// The innermost enclosing definition, if any.
    pub fn top(&self) -> Option<&VName> {
        self.stack.last()
    }
}

// ============================================================================
// Tests
// ============================================================================
