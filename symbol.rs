//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ecc project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Symbol table for the ecc compiler core
//
// Symbols are bindings of a name in one of C's namespaces (ordinary,
// tag, label, member), scoped by the AST node that introduced the
// scope. Each declaring occurrence gets its own symbol; compatibility
// between multiple declarations of one name is the analyzer's job.
// The emitter later fills in stack offsets and initializer images.
//

use crate::ast::{Ast, NodeId, NodeKind, StorageClass};
use crate::types::{CType, TypeClass};
use std::collections::HashMap;

// ============================================================================
// Identity and classification
// ============================================================================

/// Index of a symbol in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

/// C name spaces (C99 6.2.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceClass {
    /// Objects, functions, typedef names, enumeration constants
    Ordinary,
    /// struct/union/enum tags
    Tag,
    /// goto labels; function-body scope only
    Label,
    /// struct/union members, scoped by their specifier
    Member,
}

/// Storage duration (C99 6.2.4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageDuration {
    Static,
    Automatic,
    Allocated,
    None,
}

/// Linkage (C99 6.2.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    External,
    Internal,
    None,
}

// ============================================================================
// Symbol
// ============================================================================

/// An address-constant relocation inside a static initializer image:
/// the pointer-sized slot at `data_location` holds the addend and
/// refers to `symbol`
#[derive(Debug, Clone)]
pub struct InitReloc {
    pub data_location: i64,
    pub symbol: SymbolId,
}

/// A named binding in a namespace
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ns: NamespaceClass,
    /// The declaring AST node; None for emitter-synthesized symbols
    pub declarer: Option<NodeId>,
    /// The scope-introducing node; None means file scope
    pub scope: Option<NodeId>,
    pub ctype: CType,
    /// Static initializer image
    pub data: Option<Vec<u8>>,
    /// Address-constant relocations into `data`
    pub relocations: Vec<InitReloc>,
    /// Stack offset assigned during emission; 0 means unassigned
    pub stack_offset: i64,
    /// Forced storage duration for synthesized symbols
    pub sd_override: Option<StorageDuration>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, ns: NamespaceClass, ctype: CType) -> Self {
        Self {
            name: name.into(),
            ns,
            declarer: None,
            scope: None,
            ctype,
            data: None,
            relocations: Vec::new(),
            stack_offset: 0,
            sd_override: None,
        }
    }
}

// ============================================================================
// Symbol table
// ============================================================================

/// Symbol table for one translation unit
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    by_name: HashMap<(String, NamespaceClass), Vec<SymbolId>>,
    by_declarer: HashMap<NodeId, SymbolId>,
}

/// Does this node introduce a scope for lookups walking outward?
fn introduces_scope(ast: &Ast, id: NodeId) -> bool {
    match ast.kind(id) {
        NodeKind::CompoundStatement { .. }
        | NodeKind::FunctionDefinition { .. }
        | NodeKind::ForStatement { .. } => true,
        // a function declarator introduces prototype scope unless it
        // belongs to a function definition, whose parameter scope is
        // the definition itself
        NodeKind::FunctionDeclarator { .. } => {
            match ast.enclosing(id, |k| {
                matches!(
                    k,
                    NodeKind::Declaration { .. } | NodeKind::FunctionDefinition { .. }
                )
            }) {
                Some(owner) => !matches!(ast.kind(owner), NodeKind::FunctionDefinition { .. }),
                None => true,
            }
        }
        _ => false,
    }
}

/// Scope nodes enclosing `from`, innermost first, ending with file
/// scope (None)
pub fn scope_chain(ast: &Ast, from: NodeId) -> Vec<Option<NodeId>> {
    let mut out = Vec::new();
    let mut cur = ast.parent(from);
    while let Some(n) = cur {
        if introduces_scope(ast, n) {
            out.push(Some(n));
        }
        cur = ast.parent(n);
    }
    out.push(None);
    out
}

/// The scope a declaration at `at` lands in
pub fn declaration_scope(ast: &Ast, at: NodeId) -> Option<NodeId> {
    scope_chain(ast, at).into_iter().next().unwrap_or(None)
}

/// Is this scope a block scope (anything but file scope)?
pub fn scope_is_block(scope: Option<NodeId>) -> bool {
    scope.is_some()
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    #[inline]
    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    /// Add a symbol, indexing it by name and declaring node
    pub fn add(&mut self, sym: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.by_name
            .entry((sym.name.clone(), sym.ns))
            .or_default()
            .push(id);
        if let Some(declarer) = sym.declarer {
            self.by_declarer.insert(declarer, id);
        }
        self.symbols.push(sym);
        id
    }

    /// The symbol created for a declaring AST node
    pub fn get_by_declarer(&self, declarer: NodeId) -> Option<SymbolId> {
        self.by_declarer.get(&declarer).copied()
    }

    /// Innermost visible symbol for a name, walking scopes outward
    /// from the occurrence
    pub fn lookup(
        &self,
        ast: &Ast,
        name: &str,
        ns: NamespaceClass,
        from: NodeId,
    ) -> Option<SymbolId> {
        let ids = self.by_name.get(&(name.to_string(), ns))?;
        for scope in scope_chain(ast, from) {
            if let Some(&id) = ids.iter().find(|&&id| self.get(id).scope == scope) {
                return Some(id);
            }
        }
        None
    }

    /// All visible symbols sharing the resolved symbol's scope, plus
    /// whether the given declaring node is the first of them
    pub fn count_lookup(
        &self,
        ast: &Ast,
        name: &str,
        ns: NamespaceClass,
        from: NodeId,
    ) -> (Option<SymbolId>, Vec<SymbolId>, bool) {
        let resolved = match self.by_declarer.get(&from) {
            // declaring occurrence: resolve to its own symbol
            Some(&id) => Some(id),
            None => self.lookup(ast, name, ns, from),
        };
        let resolved = match resolved {
            Some(id) => id,
            None => return (None, Vec::new(), false),
        };
        let scope = self.get(resolved).scope;
        let same_scope: Vec<SymbolId> = self
            .by_name
            .get(&(name.to_string(), ns))
            .map(|ids| {
                ids.iter()
                    .copied()
                    .filter(|&id| self.get(id).scope == scope)
                    .collect()
            })
            .unwrap_or_default();
        let first = same_scope.first() == Some(&resolved);
        (Some(resolved), same_scope, first)
    }

    /// Member lookup within one struct/union specifier's namespace
    pub fn lookup_member(&self, sus: NodeId, name: &str) -> Option<SymbolId> {
        let ids = self
            .by_name
            .get(&(name.to_string(), NamespaceClass::Member))?;
        ids.iter()
            .copied()
            .find(|&id| self.get(id).scope == Some(sus))
    }

    /// Find a symbol by name, namespace and type class (used for the
    /// `__ecc_va_list` tag and the emitter's rodata helpers)
    pub fn get_by_classes(
        &self,
        name: &str,
        class: TypeClass,
        ns: NamespaceClass,
    ) -> Option<SymbolId> {
        let ids = self.by_name.get(&(name.to_string(), ns))?;
        ids.iter()
            .copied()
            .find(|&id| self.get(id).ctype.class == class)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(i as u32), s))
    }

    // ========================================================================
    // Linkage and storage duration classification
    // ========================================================================

    /// Storage class specifiers on the symbol's declaration
    fn storage_class_of(&self, ast: &Ast, id: SymbolId) -> Option<StorageClass> {
        let declarer = self.get(id).declarer?;
        let specs = ast.declaration_specifiers(declarer)?;
        for s in specs {
            if let NodeKind::StorageClassSpecifier { scs } = ast.kind(s) {
                return Some(*scs);
            }
        }
        None
    }

    /// Linkage of a symbol (C99 6.2.2)
    pub fn linkage(&self, ast: &Ast, id: SymbolId) -> Linkage {
        let sym = self.get(id);
        if sym.ns != NamespaceClass::Ordinary {
            return Linkage::None;
        }
        let scs = self.storage_class_of(ast, id);
        if matches!(scs, Some(StorageClass::Typedef)) {
            return Linkage::None;
        }
        if sym.declarer.is_some() && self.is_enum_constant(ast, id) {
            return Linkage::None;
        }
        if sym.scope.is_none() {
            // file scope
            return match scs {
                Some(StorageClass::Static) => Linkage::Internal,
                _ => Linkage::External,
            };
        }
        // block scope
        if matches!(scs, Some(StorageClass::Extern))
            || (sym.ctype.class == TypeClass::Function && scs.is_none())
        {
            // inherit from a prior visible declaration, default external
            if let Some(ids) = self.by_name.get(&(sym.name.clone(), NamespaceClass::Ordinary)) {
                for &prior in ids {
                    if prior == id {
                        break;
                    }
                    if self.get(prior).scope.is_none() {
                        return self.linkage(ast, prior);
                    }
                }
            }
            return Linkage::External;
        }
        Linkage::None
    }

    /// Storage duration of a symbol (C99 6.2.4)
    pub fn storage_duration(&self, ast: &Ast, id: SymbolId) -> StorageDuration {
        let sym = self.get(id);
        if let Some(sd) = sym.sd_override {
            return sd;
        }
        if let Some(declarer) = sym.declarer {
            match ast.kind(declarer) {
                NodeKind::StringLiteral { .. } | NodeKind::FloatingConstant { .. } => {
                    return StorageDuration::Static;
                }
                NodeKind::CompoundLiteral { .. } => {
                    return if ast.enclosing_function_definition(declarer).is_some() {
                        StorageDuration::Automatic
                    } else {
                        StorageDuration::Static
                    };
                }
                _ => {}
            }
            if self.is_enum_constant(ast, id) {
                return StorageDuration::None;
            }
        }
        let scs = self.storage_class_of(ast, id);
        if matches!(scs, Some(StorageClass::Typedef)) {
            return StorageDuration::None;
        }
        if sym.ctype.class == TypeClass::Function {
            return StorageDuration::Static;
        }
        if sym.scope.is_none() || matches!(scs, Some(StorageClass::Static)) {
            return StorageDuration::Static;
        }
        if matches!(scs, Some(StorageClass::Extern)) {
            return StorageDuration::Static;
        }
        StorageDuration::Automatic
    }

    /// Is this symbol an enumeration constant?
    pub fn is_enum_constant(&self, ast: &Ast, id: SymbolId) -> bool {
        match self.get(id).declarer {
            Some(declarer) => match ast.parent(declarer) {
                Some(p) => matches!(ast.kind(p), NodeKind::Enumerator { .. }),
                None => false,
            },
            None => false,
        }
    }

    // ========================================================================
    // Emission naming
    // ========================================================================

    /// Block-scope statics can collide with file-scope names and get
    /// disambiguated labels; synthesized literal symbols are already
    /// unique
    pub fn requires_disambiguation(&self, ast: &Ast, id: SymbolId) -> bool {
        if self.storage_duration(ast, id) != StorageDuration::Static {
            return false;
        }
        let sym = self.get(id);
        if !scope_is_block(sym.scope) {
            return false;
        }
        match sym.declarer {
            None => true,
            Some(declarer) => !matches!(
                ast.kind(declarer),
                NodeKind::StringLiteral { .. }
                    | NodeKind::CompoundLiteral { .. }
                    | NodeKind::FloatingConstant { .. }
            ),
        }
    }

    /// Label for a symbol needing disambiguation
    pub fn disambiguated_name(&self, id: SymbolId) -> String {
        format!("{}.{}", self.get(id).name, id.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Ast, NodeKind};
    use crate::types::CType;

    fn int() -> CType {
        CType::basic(TypeClass::Int)
    }

    #[test]
    fn test_add_and_lookup_file_scope() {
        let mut ast = Ast::new();
        let use_site = ast.add(
            NodeKind::Identifier {
                name: "x".to_string(),
            },
            2,
            1,
        );
        let tu = ast.add(
            NodeKind::TranslationUnit {
                items: vec![use_site],
            },
            1,
            1,
        );
        ast.link_parents(tu);

        let mut st = SymbolTable::new();
        let id = st.add(Symbol::new("x", NamespaceClass::Ordinary, int()));
        assert_eq!(
            st.lookup(&ast, "x", NamespaceClass::Ordinary, use_site),
            Some(id)
        );
        assert_eq!(st.lookup(&ast, "y", NamespaceClass::Ordinary, use_site), None);
    }

    #[test]
    fn test_shadowing() {
        let mut ast = Ast::new();
        let use_site = ast.add(
            NodeKind::Identifier {
                name: "x".to_string(),
            },
            3,
            5,
        );
        let stmt = ast.add(
            NodeKind::ExpressionStatement {
                expr: Some(use_site),
            },
            3,
            5,
        );
        let block = ast.add(NodeKind::CompoundStatement { items: vec![stmt] }, 2, 1);
        let tu = ast.add(NodeKind::TranslationUnit { items: vec![block] }, 1, 1);
        ast.link_parents(tu);

        let mut st = SymbolTable::new();
        let outer = st.add(Symbol::new("x", NamespaceClass::Ordinary, int()));
        let mut inner_sym = Symbol::new("x", NamespaceClass::Ordinary, CType::basic(TypeClass::Char));
        inner_sym.scope = Some(block);
        let inner = st.add(inner_sym);

        // from inside the block, the inner binding wins
        assert_eq!(
            st.lookup(&ast, "x", NamespaceClass::Ordinary, use_site),
            Some(inner)
        );
        // from file scope only the outer one is visible
        assert_eq!(
            st.lookup(&ast, "x", NamespaceClass::Ordinary, tu),
            Some(outer)
        );
    }

    #[test]
    fn test_namespaces_are_disjoint() {
        let mut ast = Ast::new();
        let use_site = ast.add(
            NodeKind::Identifier {
                name: "list".to_string(),
            },
            1,
            1,
        );
        let tu = ast.add(
            NodeKind::TranslationUnit {
                items: vec![use_site],
            },
            1,
            1,
        );
        ast.link_parents(tu);

        let mut st = SymbolTable::new();
        let tag = st.add(Symbol::new(
            "list",
            NamespaceClass::Tag,
            CType::basic(TypeClass::Structure),
        ));
        assert_eq!(
            st.lookup(&ast, "list", NamespaceClass::Ordinary, use_site),
            None
        );
        assert_eq!(
            st.lookup(&ast, "list", NamespaceClass::Tag, use_site),
            Some(tag)
        );
    }

    #[test]
    fn test_disambiguated_name() {
        let mut st = SymbolTable::new();
        let id = st.add(Symbol::new("counter", NamespaceClass::Ordinary, int()));
        assert_eq!(st.disambiguated_name(id), format!("counter.{}", id.0));
    }
}
