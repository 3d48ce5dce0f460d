//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ecc project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Semantic analysis for the ecc compiler core
//
// One post-order traversal (with a few pre-order hooks) that types
// every expression, resolves identifiers against the symbol table,
// enforces the constraint rules of the language standard, elaborates
// initializer lists into positioned layouts, and materializes static
// initializer images. Constraint violations append diagnostics and
// type the offending subtree as the error class so analysis continues.
//

use crate::ast::{Ast, BinaryOp, Bts, NodeId, NodeKind, StorageClass};
use crate::constexpr::{self, ConstValue};
use crate::diag::Diagnostics;
use crate::symbol::{
    declaration_scope, scope_is_block, Linkage, NamespaceClass, StorageDuration, Symbol, SymbolId,
    SymbolTable,
};
use crate::traverse::{traverse, Visitor};
use crate::types::{CType, Members, Qualifiers, TypeClass};

// ============================================================================
// Options
// ============================================================================

/// Program options visible to the analyzer
#[derive(Debug, Default, Clone)]
pub struct Options {
    /// Verbose initializer and type debug prints to standard output
    pub iflag: bool,
}

// ============================================================================
// Entry point
// ============================================================================

/// Analyze a translation unit, decorating the AST in place and
/// populating the symbol table. Returns the ordered diagnostic list.
pub fn analyze(ast: &mut Ast, root: NodeId, st: &mut SymbolTable, options: &Options) -> Diagnostics {
    let mut analyzer = Analyzer {
        st,
        options: options.clone(),
        diags: Diagnostics::new(),
        next_compound_literal: 0,
        next_string_literal: 0,
        next_floating_constant: 0,
        next_label_uid: 0,
    };
    traverse(ast, root, &mut analyzer);
    analyzer.diags
}

pub struct Analyzer<'a> {
    st: &'a mut SymbolTable,
    options: Options,
    diags: Diagnostics,
    next_compound_literal: u64,
    next_string_literal: u64,
    next_floating_constant: u64,
    next_label_uid: u64,
}

impl<'a> Analyzer<'a> {
    fn error(&mut self, ast: &Ast, id: NodeId, msg: impl Into<String>) {
        let node = ast.node(id);
        self.diags.error(node.row, node.col, msg);
    }

    fn warning(&mut self, ast: &Ast, id: NodeId, msg: impl Into<String>) {
        let node = ast.node(id);
        self.diags.warning(node.row, node.col, msg);
    }

    /// A structural inconsistency the grammar should have prevented
    fn internal(&mut self, ast: &Ast, id: NodeId, what: &str) {
        self.error(ast, id, format!("internal: {}", what));
    }

    fn set_ctype(&mut self, ast: &mut Ast, id: NodeId, ct: CType) {
        ast.node_mut(id).ctype = Some(ct);
    }

    fn set_error_type(&mut self, ast: &mut Ast, id: NodeId) {
        ast.node_mut(id).ctype = Some(CType::basic(TypeClass::Error));
    }

    /// The decorated type of a node, or the error class when missing
    fn ctype_of(&self, ast: &Ast, id: NodeId) -> CType {
        ast.node(id)
            .ctype
            .clone()
            .unwrap_or_else(|| CType::basic(TypeClass::Error))
    }

    // ========================================================================
    // Lvalue-sensitive type copying
    // ========================================================================

    /// Copy a type into an expression node, applying array and
    /// function decay unless the syntactic position keeps the
    /// designator unconverted
    fn expression_type_copy(&mut self, ast: &mut Ast, ct: &CType, id: NodeId) -> CType {
        let parent = match ast.parent(id) {
            Some(p) => p,
            None => return ct.clone(),
        };
        let parent_kind = ast.kind(parent).clone();
        let array_unconverted = matches!(
            parent_kind,
            NodeKind::SizeofExpression { .. }
                | NodeKind::SizeofType { .. }
                | NodeKind::Reference { .. }
        ) || self.string_literal_initializes_array(ast, id);
        let function_unconverted = matches!(
            parent_kind,
            NodeKind::SizeofExpression { .. }
                | NodeKind::SizeofType { .. }
                | NodeKind::Reference { .. }
        );
        if ct.class == TypeClass::Array && !array_unconverted {
            CType::pointer_to(ct.pointee().clone())
        } else if ct.class == TypeClass::Function && !function_unconverted {
            CType::pointer_to(ct.clone())
        } else {
            ct.clone()
        }
    }

    /// Lvalues lose their qualifiers when not used in an lvalue context
    fn strip_if_rvalue(&mut self, ast: &mut Ast, id: NodeId) {
        if !ast.is_in_lvalue_context(id) {
            if let Some(ct) = &mut ast.node_mut(id).ctype {
                ct.qualifiers = Qualifiers::empty();
            }
        }
    }

    // ========================================================================
    // Assignment compatibility
    // ========================================================================

    /// The simple-assignment constraint (ISO 6.5.16.1 (1))
    fn can_assign(&self, ast: &Ast, tlhs: &CType, trhs: &CType, rhs: Option<NodeId>) -> bool {
        // condition 1: both arithmetic
        if tlhs.is_arithmetic() && trhs.is_arithmetic() {
            return true;
        }
        // condition 2: compatible struct/union
        if matches!(tlhs.class, TypeClass::Structure | TypeClass::Union)
            && tlhs.compatible_ignore_qualifiers(trhs)
        {
            return true;
        }
        // condition 3: pointers to compatible types, lhs qualifiers a
        // superset of rhs qualifiers
        if tlhs.class == TypeClass::Pointer && trhs.class == TypeClass::Pointer {
            let (lp, rp) = (tlhs.pointee(), trhs.pointee());
            if lp.compatible_ignore_qualifiers(rp)
                && (lp.qualifiers & rp.qualifiers) == rp.qualifiers
            {
                return true;
            }
            // condition 4: one side void pointer
            if (lp.is_object_type() || !lp.is_complete())
                && rp.class == TypeClass::Void
                && (lp.qualifiers & rp.qualifiers) == rp.qualifiers
            {
                return true;
            }
            if (rp.is_object_type() || !rp.is_complete())
                && lp.class == TypeClass::Void
                && (lp.qualifiers & rp.qualifiers) == rp.qualifiers
            {
                return true;
            }
        }
        // condition 5: null pointer constant
        if tlhs.class == TypeClass::Pointer {
            if let Some(rhs) = rhs {
                if self.is_null_pointer_constant(ast, rhs) {
                    return true;
                }
            }
        }
        // condition 6: _Bool from any pointer
        if tlhs.class == TypeClass::Bool && trhs.class == TypeClass::Pointer {
            return true;
        }
        false
    }

    /// An integer constant expression equal to zero, optionally cast
    /// to an unqualified `void*`
    fn is_null_pointer_constant(&self, ast: &Ast, id: NodeId) -> bool {
        let mut expr = id;
        if let NodeKind::Cast { operand, .. } = ast.kind(id) {
            match &ast.node(id).ctype {
                Some(ct)
                    if ct.class == TypeClass::Pointer
                        && ct.qualifiers.is_empty()
                        && ct.pointee().class == TypeClass::Void
                        && ct.pointee().qualifiers.is_empty() =>
                {
                    expr = *operand;
                }
                _ => return false,
            }
        }
        let value = constexpr::evaluate_integer(ast, self.st, expr);
        value.succeeded() && value.equals_zero()
    }
}

// ============================================================================
// Type building from specifiers and declarators
// ============================================================================

impl<'a> Analyzer<'a> {
    /// Base type named by a specifier/qualifier list
    fn build_specifier_type(&mut self, ast: &mut Ast, specifiers: &[NodeId], at: NodeId) -> CType {
        let mut qualifiers = Qualifiers::empty();
        let mut named: Option<CType> = None;
        let mut nvoid = 0;
        let mut nchar = 0;
        let mut nshort = 0;
        let mut nint = 0;
        let mut nlong = 0;
        let mut nfloat = 0;
        let mut ndouble = 0;
        let mut nsigned = 0;
        let mut nunsigned = 0;
        let mut nbool = 0;
        let mut ncomplex = 0;
        let mut any_basic = false;

        for &spec in specifiers {
            match ast.kind(spec).clone() {
                NodeKind::TypeQualifier { tq } => qualifiers |= tq,
                NodeKind::BasicTypeSpecifier { bts } => {
                    any_basic = true;
                    match bts {
                        Bts::Void => nvoid += 1,
                        Bts::Char => nchar += 1,
                        Bts::Short => nshort += 1,
                        Bts::Int => nint += 1,
                        Bts::Long => nlong += 1,
                        Bts::Float => nfloat += 1,
                        Bts::Double => ndouble += 1,
                        Bts::Signed => nsigned += 1,
                        Bts::Unsigned => nunsigned += 1,
                        Bts::Bool => nbool += 1,
                        Bts::Complex => ncomplex += 1,
                    }
                }
                NodeKind::StructUnionSpecifier { .. } => {
                    named = Some(self.build_struct_union(ast, spec));
                }
                NodeKind::EnumSpecifier { .. } => {
                    named = Some(self.build_enum(ast, spec));
                }
                NodeKind::TypedefName { name } => {
                    match self.st.lookup(ast, &name, NamespaceClass::Ordinary, spec) {
                        Some(sy) => named = Some(self.st.get(sy).ctype.clone()),
                        None => {
                            self.error(
                                ast,
                                spec,
                                format!("typedef name '{}' is not defined", name),
                            );
                            named = Some(CType::basic(TypeClass::Error));
                        }
                    }
                }
                _ => {}
            }
        }

        let mut ct = if let Some(named) = named {
            named
        } else if any_basic {
            self.basic_type_from_counts(
                ast, at, nvoid, nchar, nshort, nint, nlong, nfloat, ndouble, nsigned, nunsigned,
                nbool, ncomplex,
            )
        } else {
            // ISO: 6.7.2 (2)
            self.error(ast, at, "a declaration must name a type");
            CType::basic(TypeClass::Error)
        };
        ct.qualifiers |= qualifiers;
        ct
    }

    #[allow(clippy::too_many_arguments)]
    fn basic_type_from_counts(
        &mut self,
        ast: &Ast,
        at: NodeId,
        nvoid: u32,
        nchar: u32,
        nshort: u32,
        nint: u32,
        nlong: u32,
        nfloat: u32,
        ndouble: u32,
        nsigned: u32,
        nunsigned: u32,
        nbool: u32,
        ncomplex: u32,
    ) -> CType {
        use TypeClass::*;
        let signs_bad = nsigned + nunsigned > 1;
        let class = if signs_bad {
            None
        } else if nvoid == 1 && nchar + nshort + nint + nlong + nfloat + ndouble + nbool == 0 {
            Some(Void)
        } else if nbool == 1 && nvoid + nchar + nshort + nint + nlong + nfloat + ndouble == 0 {
            Some(Bool)
        } else if nchar == 1 && nshort + nint + nlong + nfloat + ndouble == 0 {
            Some(if nunsigned == 1 {
                UnsignedChar
            } else if nsigned == 1 {
                SignedChar
            } else {
                Char
            })
        } else if nshort == 1 && nchar + nlong + nfloat + ndouble == 0 && nint <= 1 {
            Some(if nunsigned == 1 { UnsignedShortInt } else { ShortInt })
        } else if nlong == 1 && ndouble == 1 && ncomplex == 0 {
            Some(LongDouble)
        } else if nlong == 1 && ndouble == 1 && ncomplex == 1 {
            Some(LongDoubleComplex)
        } else if nlong == 1 && nchar + nshort + nfloat + ndouble == 0 && nint <= 1 {
            Some(if nunsigned == 1 { UnsignedLongInt } else { LongInt })
        } else if nlong == 2 && nchar + nshort + nfloat + ndouble == 0 && nint <= 1 {
            Some(if nunsigned == 1 {
                UnsignedLongLongInt
            } else {
                LongLongInt
            })
        } else if nfloat == 1 && nchar + nshort + nint + nlong + ndouble == 0 {
            Some(if ncomplex == 1 { FloatComplex } else { Float })
        } else if ndouble == 1 && nchar + nshort + nint + nlong + nfloat == 0 {
            Some(if ncomplex == 1 { DoubleComplex } else { Double })
        } else if (nint == 1 || nsigned == 1 || nunsigned == 1)
            && nvoid + nchar + nshort + nlong + nfloat + ndouble + nbool == 0
            && nint <= 1
        {
            Some(if nunsigned == 1 { UnsignedInt } else { Int })
        } else {
            None
        };
        match class {
            Some(class) => CType::basic(class),
            None => {
                // ISO: 6.7.2 (2)
                self.error(ast, at, "invalid combination of type specifiers");
                CType::basic(Error)
            }
        }
    }

    /// Build a struct/union specifier's type, declaring its tag and
    /// member symbols on first encounter
    fn build_struct_union(&mut self, ast: &mut Ast, sus: NodeId) -> CType {
        let (is_union, tag_id, declarations) = match ast.kind(sus).clone() {
            NodeKind::StructUnionSpecifier {
                is_union,
                id,
                declarations,
            } => (is_union, id, declarations),
            _ => return CType::basic(TypeClass::Error),
        };
        let class = if is_union {
            TypeClass::Union
        } else {
            TypeClass::Structure
        };
        let tag_name = tag_id.and_then(|id| ast.ident(id).map(|s| s.to_string()));

        // reference or forward declaration
        if declarations.is_none() {
            if let Some(name) = &tag_name {
                if let Some(sy) = self.st.lookup(ast, name, NamespaceClass::Tag, sus) {
                    return self.st.get(sy).ctype.clone();
                }
                // forward declaration introduces the tag
                let mut ct = CType::basic(class);
                ct.tag = tag_name.clone();
                if let Some(tag_node) = tag_id {
                    if self.st.get_by_declarer(tag_node).is_none() {
                        let mut sym = Symbol::new(name.clone(), NamespaceClass::Tag, ct.clone());
                        sym.declarer = Some(tag_node);
                        sym.scope = declaration_scope(ast, sus);
                        self.st.add(sym);
                    }
                }
                return ct;
            }
            let mut ct = CType::basic(class);
            ct.tag = None;
            return ct;
        }

        // complete definition: build the member list
        let mut ct = CType::basic(class);
        ct.tag = tag_name.clone();
        if ast.node(sus).ctype.is_some() {
            // already built through another declaration path
            return ast.node(sus).ctype.clone().unwrap();
        }

        let mut members = Members::default();
        for sdecl in declarations.unwrap_or_default() {
            let (specs, declarators) = match ast.kind(sdecl).clone() {
                NodeKind::StructDeclaration {
                    specifiers,
                    declarators,
                } => (specifiers, declarators),
                _ => continue,
            };
            let base = self.build_specifier_type(ast, &specs, sdecl);
            for sdeclr in declarators {
                let (declarator, bits) = match ast.kind(sdeclr).clone() {
                    NodeKind::StructDeclarator { declarator, bits } => (declarator, bits),
                    _ => continue,
                };
                let bit_width = bits.and_then(|b| {
                    let value = constexpr::evaluate_integer(ast, self.st, b);
                    if value.succeeded() {
                        Some(value.as_i64())
                    } else {
                        None
                    }
                });
                let (mt, id) = match declarator {
                    Some(d) => self.derive_declarator(ast, base.clone(), d),
                    None => (base.clone(), None),
                };
                let name = match id.and_then(|id| ast.ident(id).map(|s| s.to_string())) {
                    Some(name) => name,
                    None => continue, // unnamed bit-field
                };
                members.names.push(name.clone());
                members.types.push(mt.clone());
                members.bits.push(if bits.is_some() { bit_width.or(Some(-1)) } else { None });
                if let Some(id) = id {
                    if self.st.get_by_declarer(id).is_none() {
                        let mut sym = Symbol::new(name, NamespaceClass::Member, mt);
                        sym.declarer = Some(id);
                        sym.scope = Some(sus);
                        self.st.add(sym);
                    }
                }
            }
        }
        ct.members = Some(members);
        ast.node_mut(sus).ctype = Some(ct.clone());

        // declare or complete the tag
        if let (Some(name), Some(tag_node)) = (&tag_name, tag_id) {
            let scope = declaration_scope(ast, sus);
            let existing = self
                .st
                .lookup(ast, name, NamespaceClass::Tag, sus)
                .filter(|&sy| self.st.get(sy).scope == scope);
            match existing {
                Some(sy) if self.st.get(sy).ctype.members.is_none() => {
                    self.st.get_mut(sy).ctype = ct.clone();
                }
                Some(_) => {}
                None => {
                    if self.st.get_by_declarer(tag_node).is_none() {
                        let mut sym = Symbol::new(name.clone(), NamespaceClass::Tag, ct.clone());
                        sym.declarer = Some(tag_node);
                        sym.scope = scope;
                        self.st.add(sym);
                    }
                }
            }
        }
        ct
    }

    /// Build an enum specifier's type, declaring the tag and the
    /// enumeration constants
    fn build_enum(&mut self, ast: &mut Ast, es: NodeId) -> CType {
        let (tag_id, enumerators) = match ast.kind(es).clone() {
            NodeKind::EnumSpecifier { id, enumerators } => (id, enumerators),
            _ => return CType::basic(TypeClass::Error),
        };
        let tag_name = tag_id.and_then(|id| ast.ident(id).map(|s| s.to_string()));

        if enumerators.is_none() {
            if let Some(name) = &tag_name {
                if let Some(sy) = self.st.lookup(ast, name, NamespaceClass::Tag, es) {
                    return self.st.get(sy).ctype.clone();
                }
            }
            let mut ct = CType::basic(TypeClass::Enumerated);
            ct.tag = tag_name;
            return ct;
        }

        let mut ct = CType::basic(TypeClass::Enumerated);
        ct.tag = tag_name.clone();
        let mut members = Members::default();
        for enumr in enumerators.unwrap_or_default() {
            let id = match ast.kind(enumr) {
                NodeKind::Enumerator { id, .. } => *id,
                _ => continue,
            };
            let name = match ast.ident(id) {
                Some(name) => name.to_string(),
                None => continue,
            };
            members.names.push(name.clone());
            if self.st.get_by_declarer(id).is_none() {
                let mut sym = Symbol::new(name, NamespaceClass::Ordinary, CType::basic(TypeClass::Int));
                sym.declarer = Some(id);
                sym.scope = declaration_scope(ast, es);
                self.st.add(sym);
            }
        }
        ct.members = Some(members);

        if let (Some(name), Some(tag_node)) = (&tag_name, tag_id) {
            if self.st.get_by_declarer(tag_node).is_none() {
                let mut sym = Symbol::new(name.clone(), NamespaceClass::Tag, ct.clone());
                sym.declarer = Some(tag_node);
                sym.scope = declaration_scope(ast, es);
                self.st.add(sym);
            }
        }
        ct
    }

    /// sizeof and casts inside array length expressions are evaluated
    /// before their type names have been visited; type them up front
    fn pre_type_nested_type_names(&mut self, ast: &mut Ast, expr: NodeId) {
        let children = ast.children(expr);
        match ast.kind(expr).clone() {
            NodeKind::SizeofType { type_name } | NodeKind::Cast { type_name, .. } => {
                if ast.node(type_name).ctype.is_none() {
                    let ct = self.build_type_name(ast, type_name);
                    ast.node_mut(type_name).ctype = Some(ct);
                }
            }
            _ => {}
        }
        for child in children {
            self.pre_type_nested_type_names(ast, child);
        }
    }

    /// Derive the full type of a declarator chain over a base type,
    /// returning the named identifier (None for abstract declarators).
    /// Parameter symbols are declared along the way.
    fn derive_declarator(
        &mut self,
        ast: &mut Ast,
        base: CType,
        declr: NodeId,
    ) -> (CType, Option<NodeId>) {
        match ast.kind(declr).clone() {
            NodeKind::IdentDeclarator { id } => (base, Some(id)),
            NodeKind::AbstractBase => (base, None),
            NodeKind::PointerDeclarator { qualifiers, inner } => {
                let mut ptr = CType::pointer_to(base);
                ptr.qualifiers = qualifiers;
                self.derive_declarator(ast, ptr, inner)
            }
            NodeKind::ArrayDeclarator { inner, length } => {
                let mut arr = CType::array_of(base, None);
                if let Some(length) = length {
                    self.pre_type_nested_type_names(ast, length);
                    let value = constexpr::evaluate_integer(ast, self.st, length);
                    if value.succeeded() {
                        let mut value = value;
                        value.convert_class(TypeClass::LongLongInt);
                        arr.array_length = Some(value.as_i64());
                    } else {
                        arr.array_vla = true;
                    }
                }
                self.derive_declarator(ast, arr, inner)
            }
            NodeKind::FunctionDeclarator {
                inner,
                params,
                variadic,
                ..
            } => {
                let param_types = params.map(|params| {
                    let mut types = Vec::new();
                    for pdecl in params {
                        let (specs, pdeclr) = match ast.kind(pdecl).clone() {
                            NodeKind::ParameterDeclaration {
                                specifiers,
                                declarator,
                            } => (specifiers, declarator),
                            _ => continue,
                        };
                        let pbase = self.build_specifier_type(ast, &specs, pdecl);
                        let (mut pt, pid) = match pdeclr {
                            Some(d) => self.derive_declarator(ast, pbase, d),
                            None => (pbase, None),
                        };
                        // a lone (void) parameter means no parameters
                        if pt.class == TypeClass::Void && pid.is_none() && types.is_empty() {
                            continue;
                        }
                        // parameter adjustment (ISO 6.7.5.3 (7), (8))
                        if pt.class == TypeClass::Array {
                            pt = CType::pointer_to(pt.pointee().clone());
                        } else if pt.class == TypeClass::Function {
                            pt = CType::pointer_to(pt);
                        }
                        if let Some(pid) = pid {
                            if self.st.get_by_declarer(pid).is_none() {
                                let name = ast.ident(pid).unwrap_or_default().to_string();
                                let mut sym =
                                    Symbol::new(name, NamespaceClass::Ordinary, pt.clone());
                                sym.declarer = Some(pid);
                                sym.scope = declaration_scope(ast, pid);
                                self.st.add(sym);
                            }
                        }
                        types.push(pt);
                    }
                    types
                });
                self.derive_declarator(ast, CType::function(base, param_types, variadic), inner)
            }
            NodeKind::InitDeclarator { declarator, .. } => {
                self.derive_declarator(ast, base, declarator)
            }
            _ => (base, None),
        }
    }

    /// Type named by a type-name node (casts, sizeof, compound
    /// literals, va_arg)
    fn build_type_name(&mut self, ast: &mut Ast, tn: NodeId) -> CType {
        if let Some(ct) = &ast.node(tn).ctype {
            return ct.clone();
        }
        let (specifiers, declarator) = match ast.kind(tn).clone() {
            NodeKind::TypeName {
                specifiers,
                declarator,
            } => (specifiers, declarator),
            _ => return CType::basic(TypeClass::Error),
        };
        let base = self.build_specifier_type(ast, &specifiers, tn);
        let ct = match declarator {
            Some(d) => self.derive_declarator(ast, base, d).0,
            None => base,
        };
        ast.node_mut(tn).ctype = Some(ct.clone());
        ct
    }

    /// Declare the symbols named by a declaration's init declarators
    fn declare_from_declaration(&mut self, ast: &mut Ast, decl: NodeId) {
        let (specifiers, init_declarators) = match ast.kind(decl).clone() {
            NodeKind::Declaration {
                specifiers,
                init_declarators,
            } => (specifiers, init_declarators),
            _ => return,
        };
        let base = self.build_specifier_type(ast, &specifiers, decl);
        let inline_fn = specifiers
            .iter()
            .any(|&s| matches!(ast.kind(s), NodeKind::FunctionSpecifier));
        for ideclr in init_declarators {
            let (mut ct, id) = self.derive_declarator(ast, base.clone(), ideclr);
            if ct.class == TypeClass::Function {
                ct.inline_fn = inline_fn;
            }
            if let Some(id) = id {
                if self.st.get_by_declarer(id).is_none() {
                    let name = ast.ident(id).unwrap_or_default().to_string();
                    let mut sym = Symbol::new(name, NamespaceClass::Ordinary, ct.clone());
                    sym.declarer = Some(id);
                    sym.scope = declaration_scope(ast, decl);
                    self.st.add(sym);
                }
            }
        }
    }

    /// Declare the function symbol of a definition, plus every label
    /// in its body (labels are visible before their statement)
    fn declare_from_function_definition(&mut self, ast: &mut Ast, fdef: NodeId) {
        let (specifiers, declarator, body) = match ast.kind(fdef).clone() {
            NodeKind::FunctionDefinition {
                specifiers,
                declarator,
                body,
                ..
            } => (specifiers, declarator, body),
            _ => return,
        };
        let base = self.build_specifier_type(ast, &specifiers, fdef);
        let inline_fn = specifiers
            .iter()
            .any(|&s| matches!(ast.kind(s), NodeKind::FunctionSpecifier));
        let (mut ct, id) = self.derive_declarator(ast, base, declarator);
        if ct.class == TypeClass::Function {
            ct.inline_fn = inline_fn;
        }
        if let Some(id) = id {
            if self.st.get_by_declarer(id).is_none() {
                let name = ast.ident(id).unwrap_or_default().to_string();
                let mut sym = Symbol::new(name, NamespaceClass::Ordinary, ct.clone());
                sym.declarer = Some(id);
                sym.scope = declaration_scope(ast, fdef);
                self.st.add(sym);
            }
        }
        self.declare_labels(ast, body, fdef);
    }

    fn declare_labels(&mut self, ast: &mut Ast, node: NodeId, fdef: NodeId) {
        if let NodeKind::LabeledStatement {
            label: Some(label), ..
        } = ast.kind(node)
        {
            let label = *label;
            if self.st.get_by_declarer(label).is_none() {
                let name = ast.ident(label).unwrap_or_default().to_string();
                let mut sym = Symbol::new(name, NamespaceClass::Label, CType::basic(TypeClass::Label));
                sym.declarer = Some(label);
                sym.scope = Some(fdef);
                self.st.add(sym);
            }
        }
        for child in ast.children(node) {
            // nested functions do not exist; every label belongs here
            self.declare_labels(ast, child, fdef);
        }
    }
}

// ============================================================================
// Register-address sub-traversal
// ============================================================================

impl<'a> Analyzer<'a> {
    /// Scan the outermost address-of operand for uses of
    /// register-declared lvalues in lvalue contexts. Nested address-of
    /// expressions are not descended into.
    fn is_register_object_addr_requested(&mut self, ast: &Ast, expr: NodeId) -> bool {
        if let NodeKind::Identifier { name } = ast.kind(expr) {
            let name = name.clone();
            if ast.is_lvalue(expr) && ast.is_in_lvalue_context(expr) {
                if let Some(sy) = self.st.lookup(ast, &name, NamespaceClass::Ordinary, expr) {
                    if let Some(declarer) = self.st.get(sy).declarer {
                        if let Some(specs) = ast.declaration_specifiers(declarer) {
                            if ast.has_storage_class(&specs, StorageClass::Register) {
                                return true;
                            }
                        }
                    }
                }
            }
        }
        if matches!(ast.kind(expr), NodeKind::Reference { .. }) {
            return false;
        }
        for child in ast.children(expr) {
            if self.is_register_object_addr_requested(ast, child) {
                return true;
            }
        }
        false
    }
}

// ============================================================================
// Expression handlers
// ============================================================================

impl<'a> Analyzer<'a> {
    /// Resolve an aggregate whose definition may postdate the type
    /// copy held by an expression (tag declared before completion)
    fn resolve_aggregate(&self, ast: &Ast, ct: &CType, at: NodeId) -> CType {
        if !matches!(ct.class, TypeClass::Structure | TypeClass::Union) || ct.members.is_some() {
            return ct.clone();
        }
        if let Some(tag) = &ct.tag {
            if let Some(sy) = self.st.lookup(ast, tag, NamespaceClass::Tag, at) {
                let mut resolved = self.st.get(sy).ctype.clone();
                resolved.qualifiers = ct.qualifiers;
                return resolved;
            }
        }
        ct.clone()
    }

    fn subscript_after(&mut self, ast: &mut Ast, id: NodeId) {
        let (base, index) = match ast.kind(id) {
            NodeKind::Subscript { base, index } => (*base, *index),
            _ => return,
        };
        let mut array_ct = self.ctype_of(ast, base);
        let mut index_ct = self.ctype_of(ast, index);
        let mut pass = false;
        if matches!(index_ct.class, TypeClass::Array | TypeClass::Pointer) {
            std::mem::swap(&mut array_ct, &mut index_ct);
            pass = true;
        } else if !matches!(array_ct.class, TypeClass::Array | TypeClass::Pointer) {
            // ISO: 6.5.2.1 (1)
            self.error(ast, id, "subscript can only be applied to array and pointer types");
        } else {
            pass = true;
        }
        if pass {
            pass = index_ct.is_integer();
            if !pass {
                // ISO: 6.5.2.1 (1)
                self.error(ast, id, "subscript index expression can only be of integer type");
            }
        }
        if pass {
            // ISO: 6.5.2.1 (1)
            let element = array_ct.pointee().clone();
            let ct = self.expression_type_copy(ast, &element, id);
            self.set_ctype(ast, id, ct);
            self.strip_if_rvalue(ast, id);
        } else {
            self.set_error_type(ast, id);
        }
    }

    fn function_call_after(&mut self, ast: &mut Ast, id: NodeId) {
        let (callee, args) = match ast.kind(id).clone() {
            NodeKind::FunctionCall { callee, args } => (callee, args),
            _ => return,
        };
        let called = self.ctype_of(ast, callee);
        let mut pass = true;
        if called.class == TypeClass::Error {
            pass = false;
        } else if called.class != TypeClass::Pointer
            || called.pointee().class != TypeClass::Function
        {
            // ISO: 6.5.2.2 (1)
            self.error(
                ast,
                id,
                "calling expression in function call must be of function or function pointer type",
            );
            pass = false;
        } else {
            let ret = called.pointee().pointee();
            if ret.class != TypeClass::Void
                && (!ret.is_object_type() || ret.class == TypeClass::Array)
            {
                // ISO: 6.5.2.2 (1)
                self.error(
                    ast,
                    id,
                    "function to be called must have a return type of void or an object type besides an array type",
                );
                pass = false;
            }
        }

        if pass {
            let ftype = called.pointee();
            if let Some(params) = &ftype.params {
                if ftype.variadic && args.len() < params.len() {
                    self.error(
                        ast,
                        id,
                        format!(
                            "function to be called expected {} or more argument(s), got {}",
                            params.len(),
                            args.len()
                        ),
                    );
                } else if !ftype.variadic && params.len() != args.len() {
                    // ISO: 6.5.2.2 (2)
                    self.error(
                        ast,
                        id,
                        format!(
                            "function to be called expected {} argument(s), got {}",
                            params.len(),
                            args.len()
                        ),
                    );
                    pass = false;
                } else {
                    let params = params.clone();
                    for (i, (&arg, param)) in args.iter().zip(params.iter()).enumerate() {
                        let mut unqualified = param.clone();
                        unqualified.qualifiers = Qualifiers::empty();
                        let arg_ct = self.ctype_of(ast, arg);
                        if !self.can_assign(ast, &unqualified, &arg_ct, Some(arg)) {
                            // ISO: 6.5.2.2 (2)
                            if self.options.iflag {
                                println!(
                                    "function parameter expected this assignment to be possible: {} = {}",
                                    unqualified, arg_ct
                                );
                            }
                            self.error(
                                ast,
                                arg,
                                format!("invalid type for argument {} of this function call", i + 1),
                            );
                            pass = false;
                        }
                    }
                }
            }
        }

        for &arg in &args {
            let arg_ct = self.ctype_of(ast, arg);
            if !arg_ct.is_object_type() {
                // ISO: 6.5.2.2 (4)
                self.error(ast, arg, "argument in function call needs to be of object type");
                pass = false;
            }
        }

        if pass {
            let ret = called.pointee().pointee().clone();
            if ret.is_object_type() {
                // ISO: 6.5.2.2 (5)
                self.set_ctype(ast, id, ret);
            } else {
                // ISO: 6.5.2.2 (5)
                self.set_ctype(ast, id, CType::basic(TypeClass::Void));
            }
        } else {
            self.set_error_type(ast, id);
        }
    }

    fn member_after(&mut self, ast: &mut Ast, id: NodeId, deref: bool) {
        let (base, member_id) = match ast.kind(id) {
            NodeKind::Member { base, id: m } | NodeKind::DerefMember { base, id: m } => (*base, *m),
            _ => return,
        };
        let member = ast.ident(member_id).unwrap_or_default().to_string();
        let base_ct = self.ctype_of(ast, base);
        let aggregate = if deref {
            if base_ct.class != TypeClass::Pointer {
                // ISO: 6.5.2.3 (2)
                self.error(
                    ast,
                    id,
                    "left hand side of dereferencing member access expression must be of struct/union type",
                );
                self.set_error_type(ast, id);
                return;
            }
            self.resolve_aggregate(ast, base_ct.pointee(), id)
        } else {
            self.resolve_aggregate(ast, &base_ct, id)
        };
        if !matches!(aggregate.class, TypeClass::Structure | TypeClass::Union) {
            // ISO: 6.5.2.3 (1), 6.5.2.3 (2)
            self.error(
                ast,
                id,
                if deref {
                    "left hand side of dereferencing member access expression must be of struct/union type"
                } else {
                    "left hand side of member access expression must be of struct/union type"
                },
            );
            self.set_error_type(ast, id);
            return;
        }
        let member_type = aggregate
            .members
            .as_ref()
            .and_then(|m| m.index_of(&member).map(|i| m.types[i].clone()));
        match member_type {
            Some(mt) => {
                // ISO: 6.5.2.3 (3), 6.5.2.3 (4)
                let mut rt = self.expression_type_copy(ast, &mt, id);
                rt.qualifiers |= aggregate.qualifiers;
                self.set_ctype(ast, id, rt);
                self.strip_if_rvalue(ast, id);
            }
            None => {
                // ISO: 6.5.2.3 (1), 6.5.2.3 (2)
                self.error(ast, id, format!("struct/union has no such member '{}'", member));
                self.set_error_type(ast, id);
            }
        }
    }

    /// Bit width of the member a member-access expression names, if
    /// its declaration carried one
    fn member_bit_width(&self, ast: &Ast, expr: NodeId) -> Option<i64> {
        let (base, member_id, deref) = match ast.kind(expr) {
            NodeKind::Member { base, id } => (*base, *id, false),
            NodeKind::DerefMember { base, id } => (*base, *id, true),
            _ => return None,
        };
        let base_ct = ast.node(base).ctype.clone()?;
        let aggregate = if deref {
            if base_ct.class != TypeClass::Pointer {
                return None;
            }
            self.resolve_aggregate(ast, base_ct.pointee(), expr)
        } else {
            self.resolve_aggregate(ast, &base_ct, expr)
        };
        let member = ast.ident(member_id)?;
        let members = aggregate.members.as_ref()?;
        let idx = members.index_of(member)?;
        members.bits.get(idx).copied().flatten()
    }

    fn inc_dec_after(&mut self, ast: &mut Ast, id: NodeId, operand: NodeId) {
        let otype = self.ctype_of(ast, operand);
        let mut pass = false;
        if ast.is_modifiable_lvalue(operand) {
            // ISO: 6.5.2.4 (1), 6.5.3.1 (1)
            if otype.is_real() || otype.class == TypeClass::Pointer {
                pass = true;
            }
        }
        if pass {
            // ISO: 6.5.2.4 (2), 6.5.3.1 (2)
            let ct = self.expression_type_copy(ast, &otype, id);
            self.set_ctype(ast, id, ct);
        } else {
            self.error(ast, id, "invalid operand to increment/decrement operator");
            self.set_error_type(ast, id);
        }
    }

    fn dereference_after(&mut self, ast: &mut Ast, id: NodeId, operand: NodeId) {
        let otype = self.ctype_of(ast, operand);
        if otype.class != TypeClass::Pointer {
            // ISO: 6.5.3.2 (2)
            self.error(ast, id, "dereference operand must be of pointer type");
            self.set_error_type(ast, id);
            return;
        }
        // ISO: 6.5.3.2 (4)
        let pointee = otype.pointee().clone();
        let ct = self.expression_type_copy(ast, &pointee, id);
        self.set_ctype(ast, id, ct);
        self.strip_if_rvalue(ast, id);
    }

    fn reference_after(&mut self, ast: &mut Ast, id: NodeId, operand: NodeId) {
        let otype = self.ctype_of(ast, operand);
        let mut context = String::new();
        let mut pass = false;
        if otype.class == TypeClass::Function {
            // ISO: 6.5.3.2 (1)
            pass = true;
        } else if matches!(
            ast.kind(operand),
            NodeKind::Subscript { .. } | NodeKind::Dereference { .. }
        ) {
            // ISO: 6.5.3.2 (1)
            pass = true;
        } else if ast.is_lvalue(operand) {
            pass = true;
            if matches!(
                ast.kind(operand),
                NodeKind::Member { .. } | NodeKind::DerefMember { .. }
            ) && self.member_bit_width(ast, operand).is_some()
            {
                // ISO: 6.5.3.2 (1)
                context = "cannot request address of a bitfield".to_string();
                pass = false;
            }
            if pass && self.is_register_object_addr_requested(ast, operand) {
                // ISO: 6.5.3.2 (1)
                context = "cannot request address of an object declared with the 'register' storage class specifier"
                    .to_string();
                pass = false;
            }
        }
        if pass {
            // ISO: 6.5.3.2 (3)
            self.set_ctype(ast, id, CType::pointer_to(otype));
        } else {
            if context.is_empty() {
                self.error(ast, id, "invalid operand to address-of operator");
            } else {
                self.error(
                    ast,
                    id,
                    format!("invalid operand to address-of operator: {}", context),
                );
            }
            self.set_error_type(ast, id);
        }
    }

    fn plus_minus_after(&mut self, ast: &mut Ast, id: NodeId, operand: NodeId) {
        let otype = self.ctype_of(ast, operand);
        if !otype.is_arithmetic() {
            // ISO: 6.5.3.3 (1)
            self.error(ast, id, "plus/minus operand must be of arithmetic type");
            self.set_error_type(ast, id);
            return;
        }
        // ISO: 6.5.3.3 (2), 6.5.3.3 (3)
        self.set_ctype(ast, id, otype.integer_promotions());
    }

    fn complement_after(&mut self, ast: &mut Ast, id: NodeId, operand: NodeId) {
        let otype = self.ctype_of(ast, operand);
        if !otype.is_integer() {
            // ISO: 6.5.3.3 (1)
            self.error(ast, id, "complement operand must of integer type");
            self.set_error_type(ast, id);
            return;
        }
        // ISO: 6.5.3.3 (4)
        self.set_ctype(ast, id, otype.integer_promotions());
    }

    fn not_after(&mut self, ast: &mut Ast, id: NodeId, operand: NodeId) {
        let otype = self.ctype_of(ast, operand);
        if !otype.is_scalar() {
            // ISO: 6.5.3.3 (1)
            self.error(ast, id, "not ('!') operand must be of scalar type");
            self.set_error_type(ast, id);
            return;
        }
        // ISO: 6.5.3.3 (5)
        self.set_ctype(ast, id, CType::basic(TypeClass::Int));
    }

    fn sizeof_after(&mut self, ast: &mut Ast, id: NodeId) {
        let otype = match ast.kind(id).clone() {
            NodeKind::SizeofExpression { operand } => {
                let ct = self.ctype_of(ast, operand);
                if matches!(
                    ast.kind(operand),
                    NodeKind::Member { .. } | NodeKind::DerefMember { .. }
                ) && self.member_bit_width(ast, operand).is_some()
                {
                    // ISO: 6.5.3.4 (1)
                    self.error(ast, id, "sizeof operand cannot be a bitfield member");
                    self.set_error_type(ast, id);
                    return;
                }
                ct
            }
            NodeKind::SizeofType { type_name } => {
                let ct = self.build_type_name(ast, type_name);
                if ct.class == TypeClass::Error {
                    self.set_error_type(ast, id);
                    return;
                }
                ct
            }
            _ => return,
        };
        let mut pass = true;
        if otype.class == TypeClass::Function {
            // ISO: 6.5.3.4 (1)
            self.error(ast, id, "sizeof operand cannot be of function type");
            pass = false;
        }
        if !otype.is_complete() && otype.class != TypeClass::Function {
            // ISO: 6.5.3.4 (1)
            self.error(ast, id, "sizeof operand cannot be of incomplete type");
            pass = false;
        }
        if pass {
            // ISO: 6.5.3.4 (4)
            self.set_ctype(ast, id, CType::size_t());
        } else {
            self.set_error_type(ast, id);
        }
    }

    fn cast_after(&mut self, ast: &mut Ast, id: NodeId) {
        let type_name = match ast.kind(id) {
            NodeKind::Cast { type_name, .. } => *type_name,
            _ => return,
        };
        let ct = self.build_type_name(ast, type_name);
        if ct.class == TypeClass::Error {
            self.set_ctype(ast, id, ct);
            return;
        }
        if ct.class != TypeClass::Void && !ct.is_scalar() {
            // ISO: 6.5.4 (2)
            self.error(ast, id, "type name of cast expression must be of scalar type");
            self.set_error_type(ast, id);
            return;
        }
        // ISO: 6.5.4 (4)
        self.set_ctype(ast, id, ct);
    }

    fn binary_after(&mut self, ast: &mut Ast, id: NodeId, op: BinaryOp, lhs: NodeId, rhs: NodeId) {
        use BinaryOp::*;
        let tlhs = self.ctype_of(ast, lhs);
        let trhs = self.ctype_of(ast, rhs);
        let ct = match op {
            Modulo => {
                let mut pass = true;
                if !tlhs.is_integer() {
                    // ISO: 6.5.5 (2)
                    self.error(ast, id, "left hand side of modular expression must have an integer type");
                    pass = false;
                }
                if !trhs.is_integer() {
                    // ISO: 6.5.5 (2)
                    self.error(ast, id, "right hand side of modular expression must have an integer type");
                    pass = false;
                }
                if pass {
                    // ISO: 6.5.5 (3)
                    CType::usual_arithmetic_conversions(&tlhs, &trhs)
                } else {
                    CType::basic(TypeClass::Error)
                }
            }
            Multiply | Divide => {
                let mut pass = true;
                if !tlhs.is_arithmetic() {
                    // ISO: 6.5.5 (2)
                    self.error(
                        ast,
                        id,
                        "left hand side of multiplication/division expression must have an arithmetic type",
                    );
                    pass = false;
                }
                if !trhs.is_arithmetic() {
                    // ISO: 6.5.5 (2)
                    self.error(
                        ast,
                        id,
                        "right hand side of multiplication/division expression must have an arithmetic type",
                    );
                    pass = false;
                }
                if pass {
                    // ISO: 6.5.5 (3)
                    CType::usual_arithmetic_conversions(&tlhs, &trhs)
                } else {
                    CType::basic(TypeClass::Error)
                }
            }
            Add => {
                if tlhs.is_arithmetic() && trhs.is_arithmetic() {
                    // ISO: 6.5.6 (2), 6.5.6 (4)
                    CType::usual_arithmetic_conversions(&tlhs, &trhs)
                } else if tlhs.is_integer()
                    && trhs.class == TypeClass::Pointer
                    && trhs.pointee().is_object_type()
                {
                    // ISO: 6.5.6 (2), 6.5.6 (8)
                    trhs.clone()
                } else if tlhs.class == TypeClass::Pointer
                    && tlhs.pointee().is_object_type()
                    && trhs.is_integer()
                {
                    // ISO: 6.5.6 (2), 6.5.6 (8)
                    tlhs.clone()
                } else {
                    self.error(ast, id, "invalid operands of addition expression");
                    CType::basic(TypeClass::Error)
                }
            }
            Subtract => {
                if tlhs.is_arithmetic() && trhs.is_arithmetic() {
                    // ISO: 6.5.6 (3), 6.5.6 (4)
                    CType::usual_arithmetic_conversions(&tlhs, &trhs)
                } else if tlhs.class == TypeClass::Pointer
                    && tlhs.pointee().is_object_type()
                    && trhs.is_integer()
                {
                    // ISO: 6.5.6 (3), 6.5.6 (8)
                    tlhs.clone()
                } else if tlhs.class == TypeClass::Pointer
                    && trhs.class == TypeClass::Pointer
                    && tlhs.pointee().is_object_type()
                    && trhs.pointee().is_object_type()
                    && tlhs.pointee().compatible_ignore_qualifiers(trhs.pointee())
                {
                    // ISO: 6.5.6 (3), 6.5.6 (9)
                    CType::ptrdiff_t()
                } else {
                    self.error(ast, id, "invalid operands of subtraction expression");
                    CType::basic(TypeClass::Error)
                }
            }
            ShiftLeft | ShiftRight => {
                let mut pass = true;
                if !tlhs.is_integer() {
                    // ISO: 6.5.7 (2)
                    self.error(ast, id, "left hand side of shift expression must have an integer type");
                    pass = false;
                }
                if !trhs.is_integer() {
                    // ISO: 6.5.7 (2)
                    self.error(ast, id, "right hand side of shift expression must have an integer type");
                    pass = false;
                }
                if pass {
                    // ISO: 6.5.7 (3)
                    tlhs.integer_promotions()
                } else {
                    CType::basic(TypeClass::Error)
                }
            }
            Less | LessEqual | Greater | GreaterEqual => {
                let mut pass = false;
                if tlhs.is_real() && trhs.is_real() {
                    // ISO: 6.5.8 (2)
                    pass = true;
                } else if tlhs.class == TypeClass::Pointer
                    && trhs.class == TypeClass::Pointer
                    && tlhs.pointee().compatible_ignore_qualifiers(trhs.pointee())
                    && ((tlhs.pointee().is_object_type() && trhs.pointee().is_object_type())
                        || (!tlhs.pointee().is_complete() && !trhs.pointee().is_complete()))
                {
                    // ISO: 6.5.8 (2)
                    pass = true;
                }
                if pass {
                    // ISO: 6.5.8 (6)
                    CType::basic(TypeClass::Int)
                } else {
                    self.error(ast, id, "invalid operands of relational expression");
                    CType::basic(TypeClass::Error)
                }
            }
            Equal | NotEqual => {
                let mut pass = false;
                if tlhs.is_arithmetic() && trhs.is_arithmetic() {
                    // ISO: 6.5.9 (2)
                    pass = true;
                } else if tlhs.class == TypeClass::Pointer
                    && trhs.class == TypeClass::Pointer
                    && tlhs.pointee().compatible_ignore_qualifiers(trhs.pointee())
                {
                    // ISO: 6.5.9 (2)
                    pass = true;
                } else if tlhs.class == TypeClass::Pointer
                    && (tlhs.pointee().is_object_type() || !tlhs.pointee().is_complete())
                    && trhs.class == TypeClass::Pointer
                    && trhs.pointee().class == TypeClass::Void
                {
                    // ISO: 6.5.9 (2)
                    pass = true;
                } else if trhs.class == TypeClass::Pointer
                    && (trhs.pointee().is_object_type() || !trhs.pointee().is_complete())
                    && tlhs.class == TypeClass::Pointer
                    && tlhs.pointee().class == TypeClass::Void
                {
                    // ISO: 6.5.9 (2)
                    pass = true;
                } else if tlhs.class == TypeClass::Pointer && self.is_null_pointer_constant(ast, rhs)
                {
                    // ISO: 6.5.9 (2)
                    pass = true;
                } else if trhs.class == TypeClass::Pointer && self.is_null_pointer_constant(ast, lhs)
                {
                    // ISO: 6.5.9 (2)
                    pass = true;
                }
                if pass {
                    // ISO: 6.5.9 (3)
                    CType::basic(TypeClass::Int)
                } else {
                    self.error(ast, id, "invalid operands of equality expression");
                    CType::basic(TypeClass::Error)
                }
            }
            BitAnd | BitXor | BitOr => {
                let mut pass = true;
                if !tlhs.is_integer() {
                    // ISO: 6.5.10 (2), 6.5.11 (2), 6.5.12 (2)
                    self.error(ast, id, "left hand side of bitwise expression must have an integer type");
                    pass = false;
                }
                if !trhs.is_integer() {
                    // ISO: 6.5.10 (2), 6.5.11 (2), 6.5.12 (2)
                    self.error(ast, id, "right hand side of bitwise expression must have an integer type");
                    pass = false;
                }
                if pass {
                    // ISO: 6.5.10 (3), 6.5.11 (3), 6.5.12 (3)
                    CType::usual_arithmetic_conversions(&tlhs, &trhs)
                } else {
                    CType::basic(TypeClass::Error)
                }
            }
            LogicalAnd | LogicalOr => {
                let mut pass = true;
                if !tlhs.is_scalar() {
                    // ISO: 6.5.13 (2), 6.5.14 (2)
                    self.error(ast, id, "left hand side of logical expression must have a scalar type");
                    pass = false;
                }
                if !trhs.is_scalar() {
                    // ISO: 6.5.13 (2), 6.5.14 (2)
                    self.error(ast, id, "right hand side of logical expression must have a scalar type");
                    pass = false;
                }
                if pass {
                    // ISO: 6.5.13 (3), 6.5.14 (3)
                    CType::basic(TypeClass::Int)
                } else {
                    CType::basic(TypeClass::Error)
                }
            }
        };
        self.set_ctype(ast, id, ct);
    }

    fn conditional_after(&mut self, ast: &mut Ast, id: NodeId) {
        let (condition, then_expr, else_expr) = match ast.kind(id) {
            NodeKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => (*condition, *then_expr, *else_expr),
            _ => return,
        };
        let mut ft: Option<CType> = None;
        if !self.ctype_of(ast, condition).is_scalar() {
            // ISO: 6.5.15 (2)
            self.error(
                ast,
                id,
                "condition of a conditional expression must have a scalar type",
            );
            ft = Some(CType::basic(TypeClass::Error));
        }

        let op2 = self.ctype_of(ast, then_expr);
        let op3 = self.ctype_of(ast, else_expr);
        if op2.is_arithmetic() && op3.is_arithmetic() {
            // ISO: 6.5.15 (5)
            ft = ft.or_else(|| Some(CType::usual_arithmetic_conversions(&op2, &op3)));
        } else if matches!(op2.class, TypeClass::Structure | TypeClass::Union)
            && matches!(op3.class, TypeClass::Structure | TypeClass::Union)
            && op2.compatible(&op3)
        {
            // ISO: 6.5.15 (5)
            ft = ft.or_else(|| Some(op2.clone()));
        } else if op2.class == TypeClass::Void && op3.class == TypeClass::Void {
            // ISO: 6.5.15 (5)
            ft = ft.or_else(|| Some(CType::basic(TypeClass::Void)));
        } else if op2.class == TypeClass::Pointer
            && op3.class == TypeClass::Pointer
            && op2.pointee().compatible_ignore_qualifiers(op3.pointee())
        {
            // ISO: 6.5.15 (6)
            ft = ft.or_else(|| {
                let mut pointee = op2.pointee().compose(op3.pointee());
                pointee.qualifiers = op2.pointee().qualifiers | op3.pointee().qualifiers;
                Some(CType::pointer_to(pointee))
            });
        } else if op2.class == TypeClass::Pointer && self.is_null_pointer_constant(ast, else_expr) {
            // ISO: 6.5.15 (6)
            ft = ft.or_else(|| {
                let mut pointee = op2.pointee().clone();
                pointee.qualifiers = op2.pointee().qualifiers | op3.qualifiers;
                Some(CType::pointer_to(pointee))
            });
        } else if op3.class == TypeClass::Pointer && self.is_null_pointer_constant(ast, then_expr) {
            // ISO: 6.5.15 (6)
            ft = ft.or_else(|| {
                let mut pointee = op3.pointee().clone();
                pointee.qualifiers = op2.qualifiers | op3.pointee().qualifiers;
                Some(CType::pointer_to(pointee))
            });
        } else if op2.class == TypeClass::Pointer
            && op3.class == TypeClass::Pointer
            && (op2.pointee().is_object_type() || !op2.pointee().is_complete())
            && op3.pointee().class == TypeClass::Void
        {
            // ISO: 6.5.15 (6)
            ft = ft.or_else(|| {
                let mut pointee = CType::basic(TypeClass::Void);
                pointee.qualifiers = op2.pointee().qualifiers | op3.pointee().qualifiers;
                Some(CType::pointer_to(pointee))
            });
        } else if op2.class == TypeClass::Pointer
            && op3.class == TypeClass::Pointer
            && (op3.pointee().is_object_type() || !op3.pointee().is_complete())
            && op2.pointee().class == TypeClass::Void
        {
            // ISO: 6.5.15 (6)
            ft = ft.or_else(|| {
                let mut pointee = CType::basic(TypeClass::Void);
                pointee.qualifiers = op2.pointee().qualifiers | op3.pointee().qualifiers;
                Some(CType::pointer_to(pointee))
            });
        }

        match ft {
            Some(ft) => self.set_ctype(ast, id, ft),
            None => {
                // ISO: 6.5.15 (6)
                self.error(ast, id, "invalid operands of conditional expression");
                self.set_error_type(ast, id);
            }
        }
    }

    fn assignment_after(&mut self, ast: &mut Ast, id: NodeId) {
        let (op, lhs, rhs) = match ast.kind(id) {
            NodeKind::Assignment { op, lhs, rhs } => (*op, *lhs, *rhs),
            _ => return,
        };
        let tlhs = self.ctype_of(ast, lhs);
        let trhs = self.ctype_of(ast, rhs);
        if !ast.is_modifiable_lvalue(lhs) {
            // ISO: 6.5.16 (2)
            self.error(
                ast,
                id,
                "left-hand side of assignment expression must be a modifiable lvalue",
            );
            self.set_error_type(ast, id);
        } else {
            // ISO: 6.5.16 (3)
            let mut ft = tlhs.clone();
            ft.qualifiers = Qualifiers::empty();
            self.set_ctype(ast, id, ft);
        }
        match op {
            None => {
                if !self.can_assign(ast, &tlhs, &trhs, Some(rhs)) {
                    // ISO: 6.5.16.1 (1)
                    self.error(ast, id, "simple assignment operation is invalid");
                    self.set_error_type(ast, id);
                }
            }
            Some(op) => {
                use BinaryOp::*;
                let pass = match op {
                    Add | Subtract => {
                        // ISO: 6.5.16.2 (1)
                        (tlhs.class == TypeClass::Pointer
                            && tlhs.pointee().is_object_type()
                            && trhs.is_integer())
                            || (tlhs.is_arithmetic() && trhs.is_arithmetic())
                    }
                    Multiply | Divide => {
                        // ISO: 6.5.16.2 (2), 6.5.5 (2)
                        tlhs.is_arithmetic() && trhs.is_arithmetic()
                    }
                    ShiftLeft | ShiftRight | BitAnd | BitOr | BitXor | Modulo => {
                        // ISO: 6.5.16.2 (2), 6.5.5 (2), 6.5.7 (2),
                        // 6.5.10 (2), 6.5.11 (2), 6.5.12 (2)
                        tlhs.is_integer() && trhs.is_integer()
                    }
                    _ => {
                        self.internal(ast, id, "assignment carries a non-assignment operator");
                        false
                    }
                };
                if !pass {
                    self.error(ast, id, "compound assignment operation has invalid operands");
                    self.set_error_type(ast, id);
                }
            }
        }
    }

    fn comma_after(&mut self, ast: &mut Ast, id: NodeId) {
        let exprs = match ast.kind(id) {
            NodeKind::Comma { exprs } => exprs.clone(),
            _ => return,
        };
        match exprs.last() {
            Some(&last) => {
                // ISO: 6.5.17 (2)
                let ct = self.ctype_of(ast, last);
                self.set_ctype(ast, id, ct);
            }
            None => self.internal(ast, id, "comma expression with no operands"),
        }
    }

    fn string_literal_after(&mut self, ast: &mut Ast, id: NodeId) {
        // type the literal: array of char (or of wchar_t) including
        // the terminator
        let ct = match ast.kind(id) {
            NodeKind::StringLiteral { bytes, wide } => {
                if let Some(bytes) = bytes {
                    CType::array_of(CType::basic(TypeClass::Char), Some(bytes.len() as i64))
                } else if let Some(wide) = wide {
                    CType::array_of(CType::wchar_t(), Some(wide.len() as i64))
                } else {
                    CType::basic(TypeClass::Error)
                }
            }
            _ => return,
        };
        let name = format!("__sl{}", self.next_string_literal);
        self.next_string_literal += 1;
        ast.node_mut(id).synthesized_name = Some(name.clone());
        if self.st.get_by_declarer(id).is_none() {
            let mut sym = Symbol::new(name, NamespaceClass::Ordinary, ct.clone());
            sym.declarer = Some(id);
            self.st.add(sym);
        }
        let decayed = self.expression_type_copy(ast, &ct, id);
        self.set_ctype(ast, id, decayed);
        self.strip_if_rvalue(ast, id);
    }

    fn floating_constant_after(&mut self, ast: &mut Ast, id: NodeId) {
        let class = match ast.kind(id) {
            NodeKind::FloatingConstant { class, .. } => *class,
            _ => return,
        };
        let ct = CType::basic(class);
        self.set_ctype(ast, id, ct.clone());
        if class == TypeClass::LongDouble || ct.is_complex() {
            self.error(ast, id, "long double literals and complex numbers are not supported yet");
            return;
        }
        let name = format!("__fc{}", self.next_floating_constant);
        self.next_floating_constant += 1;
        ast.node_mut(id).synthesized_name = Some(name.clone());
        if self.st.get_by_declarer(id).is_none() {
            let mut sym = Symbol::new(name, NamespaceClass::Ordinary, ct);
            sym.declarer = Some(id);
            self.st.add(sym);
        }
    }
}

// ============================================================================
// Identifier resolution
// ============================================================================

impl<'a> Analyzer<'a> {
    fn identifier_after(&mut self, ast: &mut Ast, id: NodeId) {
        let name = match ast.ident(id) {
            Some(name) => name.to_string(),
            None => return,
        };
        let parent = match ast.parent(id) {
            Some(p) => p,
            None => return,
        };
        // positions handled by other passes or their parent handler
        match ast.kind(parent) {
            NodeKind::Member { id: m, .. } | NodeKind::DerefMember { id: m, .. } if *m == id => {
                return
            }
            NodeKind::StructUnionSpecifier { .. } | NodeKind::EnumSpecifier { .. } => return,
            NodeKind::Designation { .. } => return,
            NodeKind::FunctionDeclarator { .. } => return, // K&R identifier list
            _ => {}
        }
        // member declarator names are checked by the struct specifier
        // pass; expressions nested in one still resolve normally
        if let Some(sdeclr) = ast.enclosing_struct_declarator(id) {
            if ast.declarator_identifier(sdeclr) == Some(id) {
                return;
            }
        }
        let ns = match ast.kind(parent) {
            NodeKind::Goto { .. } => NamespaceClass::Label,
            NodeKind::LabeledStatement { label: Some(l), .. } if *l == id => NamespaceClass::Label,
            _ => NamespaceClass::Ordinary,
        };
        let (resolved, symbols, first) = self.st.count_lookup(ast, &name, ns, id);
        let sy = match resolved {
            Some(sy) => sy,
            None => {
                // ISO: 6.5.1 (2)
                self.error(
                    ast,
                    id,
                    format!("symbol '{}' is not defined in the given context", name),
                );
                self.set_error_type(ast, id);
                return;
            }
        };
        if self.st.get(sy).declarer == Some(id) {
            self.declaring_identifier_after(ast, id, sy, first, &symbols);
        } else if ns == NamespaceClass::Ordinary {
            self.designating_identifier_after(ast, id, sy);
        }
    }

    fn declaring_identifier_after(
        &mut self,
        ast: &mut Ast,
        id: NodeId,
        sy: SymbolId,
        first: bool,
        symbols: &[SymbolId],
    ) {
        // enumeration constants get their value here
        let declarer_parent = self.st.get(sy).declarer.and_then(|d| ast.parent(d));
        if let Some(p) = declarer_parent {
            if matches!(ast.kind(p), NodeKind::Enumerator { .. }) {
                self.enumeration_constant_after(ast, id, p);
            }
        }

        let lk = self.st.linkage(ast, sy);
        let sd = self.st.storage_duration(ast, sy);
        let scope = self.st.get(sy).scope;
        let sy_type = self.st.get(sy).ctype.clone();
        let sy_name = self.st.get(sy).name.clone();

        if let Some(fdef) = ast.enclosing_function_definition(id) {
            if let Some(fsy) = self.function_symbol(ast, fdef) {
                if fsy != sy
                    && !sy_type.qualifiers.contains(Qualifiers::CONST)
                    && sd == StorageDuration::Static
                    && self.st.get(fsy).ctype.is_function_inline()
                {
                    // ISO: 6.7.4 (3)
                    self.error(
                        ast,
                        id,
                        "an inline function may not declare a non-const identifier with static storage duration",
                    );
                }
            }
        }

        if sy_type.class == TypeClass::Function && sy_name == "main" && sy_type.is_function_inline()
        {
            // ISO: 6.7.4 (4)
            self.error(ast, id, "'main' should not have the 'inline' function specifier");
        }

        if sy_type.class == TypeClass::Array {
            let mut et = &sy_type;
            while et.class == TypeClass::Array {
                et = et.pointee();
            }
            let resolved = self.resolve_aggregate(ast, et, id);
            if resolved.has_flexible_array_member() {
                // ISO: 6.7.2.1 (2)
                self.error(
                    ast,
                    id,
                    "an array may not have elements of a struct or union type that has a flexible array member",
                );
            }
        }

        if !matches!(
            sy_type.class,
            TypeClass::Structure | TypeClass::Union | TypeClass::Enumerated | TypeClass::Label
        ) && lk == Linkage::None
            && symbols.len() > 1
        {
            // ISO: 6.7 (3)
            self.error(
                ast,
                id,
                "symbol with no linkage may not be declared twice with the same scope and namespace",
            );
        }

        if matches!(lk, Linkage::External | Linkage::Internal)
            && ast.has_initializer(id)
            && scope_is_block(scope)
        {
            // ISO: 6.7.8 (5)
            self.error(
                ast,
                id,
                "symbol declared with external or internal linkage at block scope may not be initialized",
            );
        }

        if let Some(decl) = ast.declarator_declaration(id) {
            if matches!(ast.kind(decl), NodeKind::Declaration { .. }) {
                if let Some(specs) = ast.declaration_specifiers(id) {
                    if scope_is_block(scope)
                        && sy_type.class == TypeClass::Function
                        && !ast.has_storage_class(&specs, StorageClass::Extern)
                        && ast.count_storage_classes(&specs) > 0
                    {
                        // ISO: 6.7.1 (5)
                        self.error(
                            ast,
                            id,
                            "function declarations at block scope may only have the 'extern' storage class specifier",
                        );
                    }
                }
            }
        }

        if self.is_tentative_definition(ast, id, sy) {
            if let Some(specs) = ast.declaration_specifiers(id) {
                if ast.has_storage_class(&specs, StorageClass::Static) && !sy_type.is_complete() {
                    // ISO: 6.9.2 (3)
                    self.error(
                        ast,
                        id,
                        "tentative definitions with internal linkage may not have an incomplete type",
                    );
                }
            }
        }

        if sy_type.class == TypeClass::Label && !first && symbols.len() > 1 {
            let func_name = scope
                .and_then(|s| self.function_symbol(ast, s))
                .map(|fsy| self.st.get(fsy).name.clone())
                .unwrap_or_default();
            // ISO: 6.8.1 (3)
            self.error(
                ast,
                id,
                format!("duplicate label name '{}' in function '{}'", sy_name, func_name),
            );
        }

        for (i, &x) in symbols.iter().enumerate() {
            for &y in symbols.iter().skip(i + 1) {
                if !self.st.get(x).ctype.compatible(&self.st.get(y).ctype) {
                    // ISO: 6.7 (4)
                    self.error(
                        ast,
                        id,
                        format!(
                            "another declaration of '{}' in this scope does not have a compatible type",
                            sy_name
                        ),
                    );
                }
            }
        }
    }

    fn designating_identifier_after(&mut self, ast: &mut Ast, id: NodeId, sy: SymbolId) {
        let lk = self.st.linkage(ast, sy);
        if let Some(fdef) = ast.enclosing_function_definition(id) {
            if let Some(fsy) = self.function_symbol(ast, fdef) {
                if lk == Linkage::Internal && self.st.get(fsy).ctype.is_function_inline() {
                    // ISO: 6.7.4 (3)
                    self.error(
                        ast,
                        id,
                        "an inline function may not contain a reference to an identifier declared with internal linkage",
                    );
                }
            }
        }
        let sy_type = self.st.get(sy).ctype.clone();
        let ct = self.expression_type_copy(ast, &sy_type, id);
        self.set_ctype(ast, id, ct);
        self.strip_if_rvalue(ast, id);
    }

    /// The symbol of the function a node belongs to
    fn function_symbol(&self, ast: &Ast, fdef: NodeId) -> Option<SymbolId> {
        let declarator = match ast.kind(fdef) {
            NodeKind::FunctionDefinition { declarator, .. } => *declarator,
            _ => return None,
        };
        let id = ast.declarator_identifier(declarator)?;
        self.st.get_by_declarer(id)
    }

    /// A file-scope object declaration without an initializer and
    /// without `extern`
    fn is_tentative_definition(&self, ast: &Ast, id: NodeId, sy: SymbolId) -> bool {
        if scope_is_block(self.st.get(sy).scope) {
            return false;
        }
        if self.st.get(sy).ctype.class == TypeClass::Function {
            return false;
        }
        if ast.has_initializer(id) {
            return false;
        }
        match ast.declaration_specifiers(id) {
            Some(specs) => {
                !ast.has_storage_class(&specs, StorageClass::Extern)
                    && !ast.has_storage_class(&specs, StorageClass::Typedef)
            }
            None => false,
        }
    }

    fn enumeration_constant_after(&mut self, ast: &mut Ast, id: NodeId, enumr: NodeId) {
        let value_expr = match ast.kind(enumr) {
            NodeKind::Enumerator { value, .. } => *value,
            _ => return,
        };
        // an explicit constant takes precedence
        if let Some(expr) = value_expr {
            let mut value = constexpr::evaluate_integer(ast, self.st, expr);
            if !value.succeeded() {
                // ISO: 6.7.2.2 (2)
                self.error(
                    ast,
                    expr,
                    "enumeration constant value must be specified by an integer constant expression",
                );
                return;
            }
            value.convert_class(TypeClass::LongLongInt);
            let value = value.as_i64();
            if !(-0x8000_0000..=0x7FFF_FFFF).contains(&value) {
                // ISO: 6.7.2.2 (2)
                self.error(
                    ast,
                    expr,
                    "enumeration constant value must be representable by type 'int'",
                );
                return;
            }
            ast.node_mut(enumr).enum_value = Some(value);
            return;
        }
        // otherwise: the last explicit enumerator before this one,
        // plus the placement gap
        let enums = match ast.parent(enumr) {
            Some(p) => p,
            None => {
                self.internal(ast, id, "enumerator without an enclosing enum specifier");
                return;
            }
        };
        let enumerators = match ast.kind(enums) {
            NodeKind::EnumSpecifier {
                enumerators: Some(e),
                ..
            } => e.clone(),
            _ => return,
        };
        let mut last: Option<usize> = None;
        let mut idx = 0usize;
        for (i, &er) in enumerators.iter().enumerate() {
            idx = i;
            if er == enumr {
                break;
            }
            if matches!(ast.kind(er), NodeKind::Enumerator { value: Some(_), .. }) {
                last = Some(i);
            }
        }
        let value = match last {
            None => idx as i64,
            Some(last_idx) => {
                let last_expr = match ast.kind(enumerators[last_idx]) {
                    NodeKind::Enumerator { value: Some(v), .. } => *v,
                    _ => return,
                };
                let mut value = constexpr::evaluate_integer(ast, self.st, last_expr);
                if !value.succeeded() {
                    // ISO: 6.7.2.2 (2)
                    self.error(
                        ast,
                        last_expr,
                        "enumeration constant value must be specified by an integer constant expression",
                    );
                    return;
                }
                value.convert_class(TypeClass::Int);
                value.as_i64() + (idx as i64 - last_idx as i64)
            }
        };
        if !(-0x8000_0000..=0x7FFF_FFFF).contains(&value) {
            // ISO: 6.7.2.2 (2)
            self.error(
                ast,
                enumr,
                "enumeration constant value must be representable by type 'int'",
            );
            return;
        }
        ast.node_mut(enumr).enum_value = Some(value);
    }
}

// ============================================================================
// Initializer elaboration
// ============================================================================

impl<'a> Analyzer<'a> {
    fn aggregate_element_count(ct: Option<&CType>) -> i64 {
        let ct = match ct {
            Some(ct) => ct,
            None => return -1,
        };
        match ct.class {
            TypeClass::Union => 1,
            TypeClass::Structure => ct.members.as_ref().map(|m| m.len() as i64).unwrap_or(0),
            TypeClass::Array => ct.array_length(),
            _ => 0,
        }
    }

    /// Elaborate an initializer list against a symbol, fixing the
    /// length of an unsized root array from the highest index reached
    fn elaborate_for_symbol(&mut self, ast: &mut Ast, init_list: NodeId, sy: SymbolId) {
        let ct = self.st.get(sy).ctype.clone();
        if let Some(ml) = self.add_initializer_list_semantics(ast, init_list, &ct) {
            let sy_type = &mut self.st.get_mut(sy).ctype;
            if sy_type.class == TypeClass::Array && sy_type.array_length.is_none() {
                sy_type.array_length = Some(ml);
            }
        }
    }

    /// Walk an initializer list in source order, computing each
    /// element's byte offset and target type via the pair of
    /// current-object and current-index stacks. Returns the fixed
    /// length when the root is an unsized array.
    fn add_initializer_list_semantics(
        &mut self,
        ast: &mut Ast,
        syn: NodeId,
        ct: &CType,
    ) -> Option<i64> {
        if ast.node(syn).inlist_has_semantics {
            return None;
        }
        ast.node_mut(syn).inlist_has_semantics = true;

        let (designations, initializers) = match ast.kind(syn).clone() {
            NodeKind::InitializerList {
                designations,
                initializers,
            } => (designations, initializers),
            _ => return None,
        };

        let mut cot_stack: Vec<CType> = vec![ct.clone()];
        let mut coei_stack: Vec<i64> = vec![0];
        let mut offset: i64 = 0;
        let mut ml: i64 = 1;

        let count = initializers.len();
        for i in 0..count {
            let desig = designations[i];
            let mut init = initializers[i];

            if let Some(desig) = desig {
                offset = 0;
                cot_stack.clear();
                coei_stack.clear();
                let designators = match ast.kind(desig).clone() {
                    NodeKind::Designation { designators } => designators,
                    _ => Vec::new(),
                };
                let mut nav = ct.clone();
                for desigr in designators {
                    cot_stack.push(nav.clone());
                    if let NodeKind::Identifier { name } = ast.kind(desigr).clone() {
                        let resolved = self.resolve_aggregate(ast, &nav, desigr);
                        if !matches!(resolved.class, TypeClass::Structure | TypeClass::Union) {
                            // ISO: 6.7.8 (7)
                            self.error(
                                ast,
                                desigr,
                                "struct initialization designators may not be used to initialize non-struct and non-union types",
                            );
                            return None;
                        }
                        let found = resolved.members.as_ref().and_then(|m| {
                            m.index_of(&name)
                                .map(|idx| (idx as i64, resolved.member_offset(&name).unwrap_or(0)))
                        });
                        let (midx, soffset) = match found {
                            Some(pair) => pair,
                            None => {
                                // ISO: 6.7.8 (7)
                                self.error(
                                    ast,
                                    desigr,
                                    "struct initialization designators must specify a valid member of the struct or union it is initializing",
                                );
                                return None;
                            }
                        };
                        coei_stack.push(midx);
                        offset += soffset;
                        nav = resolved.members.as_ref().unwrap().types[midx as usize].clone();
                    } else {
                        if nav.class != TypeClass::Array {
                            // ISO: 6.7.8 (6)
                            self.error(
                                ast,
                                desigr,
                                "array initialization designators may not be used to initialize non-array types",
                            );
                            return None;
                        }
                        let mut value = constexpr::evaluate_integer(ast, self.st, desigr);
                        if !value.succeeded() {
                            // ISO: 6.7.8 (6)
                            self.error(
                                ast,
                                desigr,
                                "array initialization designators must have a constant expression for its index",
                            );
                            return None;
                        }
                        value.convert_class(TypeClass::LongLongInt);
                        let value = value.as_i64();
                        if value < 0 {
                            // ISO: 6.7.8 (6)
                            self.error(
                                ast,
                                desigr,
                                "array initialization designators must have a non-negative index",
                            );
                            return None;
                        }
                        coei_stack.push(value);
                        offset += nav.pointee().size().max(0) * value;
                        nav = nav.pointee().clone();
                    }
                }
            }

            let mut cot = cot_stack.last().cloned();
            let mut ei = coei_stack.last().copied().unwrap_or(0);

            // the current element type at the top of the stacks
            let et = match &cot {
                None => {
                    // ISO: 6.7.8 (2)
                    ast.node_mut(init).init_offset = Some(-1);
                    self.error(
                        ast,
                        init,
                        "this initializer and any after it would write outside the object being initialized",
                    );
                    break;
                }
                Some(top) => match top.class {
                    TypeClass::Array => top.pointee().clone(),
                    TypeClass::Structure | TypeClass::Union => {
                        let resolved = self.resolve_aggregate(ast, top, init);
                        match resolved
                            .members
                            .as_ref()
                            .and_then(|m| m.types.get(ei as usize).cloned())
                        {
                            Some(mt) => mt,
                            None => {
                                // ISO: 6.7.8 (2)
                                ast.node_mut(init).init_offset = Some(-1);
                                self.error(
                                    ast,
                                    init,
                                    "this initializer and any after it would write outside the object being initialized",
                                );
                                break;
                            }
                        }
                    }
                    _ => top.clone(),
                },
            };

            if !et.is_object_type() && (et.class != TypeClass::Array || et.is_vla()) {
                // ISO: 6.7.8 (3)
                self.error(
                    ast,
                    init,
                    "initialization target must be an object type or an array of unknown size that is not variable-length",
                );
                return None;
            }

            let is_scalar = et.is_scalar();
            let is_char_array = et.class == TypeClass::Array && et.pointee().is_character();
            let is_wchar_array =
                et.class == TypeClass::Array && et.pointee().is_wchar_compatible();

            let alignment = et.alignment().max(1);
            offset += (alignment - (offset % alignment)) % alignment;

            ast.node_mut(init).init_offset = Some(offset);

            let mut enclosed = false;

            // a scalar initializer may be enclosed in braces
            if is_scalar {
                if let NodeKind::InitializerList { initializers, .. } = ast.kind(init) {
                    if initializers.len() == 1 {
                        init = initializers[0];
                        enclosed = true;
                    }
                }
            }

            // a character array initializer may brace a string literal
            if is_char_array {
                if let NodeKind::InitializerList { initializers, .. } = ast.kind(init) {
                    if initializers.len() == 1 {
                        let inner = initializers[0];
                        if matches!(
                            ast.kind(inner),
                            NodeKind::StringLiteral { bytes: Some(_), .. }
                        ) {
                            init = inner;
                            enclosed = true;
                        }
                    }
                }
            }

            // a wide character array similarly braces a wide literal
            if is_wchar_array {
                if let NodeKind::InitializerList { initializers, .. } = ast.kind(init) {
                    if initializers.len() == 1 {
                        let inner = initializers[0];
                        if matches!(
                            ast.kind(inner),
                            NodeKind::StringLiteral { wide: Some(_), .. }
                        ) {
                            init = inner;
                            enclosed = true;
                        }
                    }
                }
            }

            let mut et = et;
            if matches!(ast.kind(init), NodeKind::InitializerList { .. }) && !enclosed {
                // like: { { ... } }
                self.add_initializer_list_semantics(ast, init, &et);
            } else {
                // like: { ... } -- drill into nested aggregates
                loop {
                    let resolved = self.resolve_aggregate(ast, &et, init);
                    if !matches!(
                        resolved.class,
                        TypeClass::Structure | TypeClass::Union | TypeClass::Array
                    ) {
                        break;
                    }
                    if resolved.class == TypeClass::Array
                        && resolved.pointee().is_character()
                        && matches!(
                            ast.kind(init),
                            NodeKind::StringLiteral { bytes: Some(_), .. }
                        )
                    {
                        break;
                    }
                    if resolved.class == TypeClass::Array
                        && resolved.pointee().is_wchar_compatible()
                        && matches!(ast.kind(init), NodeKind::StringLiteral { wide: Some(_), .. })
                    {
                        break;
                    }
                    cot_stack.push(resolved.clone());
                    coei_stack.push(ei);
                    ei = 0;
                    cot = Some(resolved.clone());
                    et = match resolved.class {
                        TypeClass::Array => resolved.pointee().clone(),
                        _ => match resolved
                            .members
                            .as_ref()
                            .and_then(|m| m.types.first().cloned())
                        {
                            Some(mt) => mt,
                            None => break,
                        },
                    };
                }
                ast.node_mut(init).init_ctype = Some(et.clone());
            }

            offset += et.size().max(0);

            loop {
                ei += 1;
                if let Some(top) = coei_stack.last_mut() {
                    *top = ei;
                }
                let elem_count = Self::aggregate_element_count(cot.as_ref());
                if elem_count == -1 {
                    // unsized array: keep going until the list runs out
                    if cot.is_some() && cot_stack.len() == 1 {
                        ml = ei;
                    }
                    break;
                }
                if ei >= elem_count {
                    cot_stack.pop();
                    coei_stack.pop();
                    cot = cot_stack.last().cloned();
                    ei = coei_stack.last().copied().unwrap_or(0);
                } else {
                    if i == count - 1 && cot_stack.len() != 1 {
                        ml += 1;
                    }
                    break;
                }
            }
        }

        if ct.class == TypeClass::Array && !ct.array_vla && ct.array_length.is_none() {
            Some(ml)
        } else {
            None
        }
    }

    /// Is this string literal the direct initializer of an array of
    /// scalar element type?
    fn string_literal_initializes_array(&mut self, ast: &mut Ast, syn: NodeId) -> bool {
        if !matches!(ast.kind(syn), NodeKind::StringLiteral { .. }) {
            return false;
        }
        let ideclr = match ast.enclosing_init_declarator(syn) {
            Some(i) => i,
            None => return false,
        };
        let initializer = match ast.kind(ideclr) {
            NodeKind::InitDeclarator { initializer, .. } => *initializer,
            _ => return false,
        };
        let id = match ast.declarator_identifier(ideclr) {
            Some(id) => id,
            None => return false,
        };
        let isy = match self.st.get_by_declarer(id) {
            Some(isy) => isy,
            None => return false,
        };

        let parent = ast.parent(syn);
        let directly_braced = parent
            .map(|p| {
                p == ideclr
                    || (matches!(ast.kind(p), NodeKind::InitializerList { .. })
                        && ast.parent(p) == Some(ideclr))
            })
            .unwrap_or(false);
        if directly_braced {
            let inits = match parent.map(|p| ast.kind(p).clone()) {
                Some(NodeKind::InitializerList { initializers, .. }) => initializers.len(),
                _ => 1,
            };
            let ty = self.st.get(isy).ctype.clone();
            if ty.class == TypeClass::Array && inits == 1 && ty.pointee().is_scalar() {
                return true;
            }
        }

        let init = match initializer {
            Some(init) if matches!(ast.kind(init), NodeKind::InitializerList { .. }) => init,
            _ => return false,
        };
        self.elaborate_for_symbol(ast, init, isy);

        match &ast.node(syn).init_ctype {
            Some(ct) => ct.class == TypeClass::Array && ct.pointee().is_scalar(),
            None => false,
        }
    }

    /// Each elaborated scalar leaf must be assignable from its
    /// initializer expression
    fn check_initializations(&mut self, ast: &mut Ast, syn: NodeId) {
        if let NodeKind::InitializerList { initializers, .. } = ast.kind(syn) {
            for init in initializers.clone() {
                self.check_initializations(ast, init);
            }
            return;
        }
        let ct = match ast.node(syn).init_ctype.clone() {
            Some(ct) => ct,
            None => return,
        };
        if ct.is_scalar() {
            let sct = self.ctype_of(ast, syn);
            if !self.can_assign(ast, &ct, &sct, Some(syn)) {
                if self.options.iflag {
                    println!(
                        "invalid initialization on line {}: {} = {}",
                        ast.node(syn).row,
                        ct,
                        sct
                    );
                }
                // ISO: 6.7.8 (11)
                self.error(ast, syn, "invalid initialization");
            }
        }
    }

    /// An unsized array initialized by a string literal takes the
    /// literal's length
    fn initializer_after(&mut self, ast: &mut Ast, syn: NodeId, sy: SymbolId) {
        if self.string_literal_initializes_array(ast, syn)
            && self.st.get(sy).ctype.array_length() == -1
        {
            if let Some(strsy) = self.st.get_by_declarer(syn) {
                let length = self.st.get(strsy).ctype.array_length();
                if length >= 0 {
                    self.st.get_mut(sy).ctype.array_length = Some(length);
                }
            }
        }
    }

    /// Reduce the elaborated initializer of a static-duration object
    /// to bytes in the symbol's data image plus relocations
    fn static_initializer_after(&mut self, ast: &mut Ast, syn: NodeId, sy: SymbolId, base: i64) {
        if self.string_literal_initializes_array(ast, syn) {
            let bytes: Vec<u8> = match ast.kind(syn) {
                NodeKind::StringLiteral {
                    bytes: Some(bytes), ..
                } => bytes.clone(),
                NodeKind::StringLiteral { wide: Some(wide), .. } => wide
                    .iter()
                    .flat_map(|unit| unit.to_le_bytes())
                    .collect(),
                _ => return,
            };
            if let Some(data) = &mut self.st.get_mut(sy).data {
                let end = ((base as usize) + bytes.len()).min(data.len());
                let n = end.saturating_sub(base as usize);
                data[base as usize..end].copy_from_slice(&bytes[..n]);
            }
            return;
        }
        if !matches!(ast.kind(syn), NodeKind::InitializerList { .. }) {
            // fold `pointer +/- integer-constant` into the addend
            let (offset_lhs, offset_rhs, lhs, rhs, subtracting) = match ast.kind(syn) {
                NodeKind::Binary {
                    op: BinaryOp::Add,
                    lhs,
                    rhs,
                } => (
                    ast.node(*lhs)
                        .ctype
                        .as_ref()
                        .map(|t| t.class == TypeClass::Pointer)
                        .unwrap_or(false),
                    ast.node(*rhs)
                        .ctype
                        .as_ref()
                        .map(|t| t.class == TypeClass::Pointer)
                        .unwrap_or(false),
                    Some(*lhs),
                    Some(*rhs),
                    false,
                ),
                NodeKind::Binary {
                    op: BinaryOp::Subtract,
                    lhs,
                    rhs,
                } => (
                    ast.node(*lhs)
                        .ctype
                        .as_ref()
                        .map(|t| t.class == TypeClass::Pointer)
                        .unwrap_or(false),
                    false,
                    Some(*lhs),
                    Some(*rhs),
                    true,
                ),
                _ => (false, false, None, None, false),
            };
            let offset_included = offset_lhs || offset_rhs;
            let (ptr_side, offset_side) = if offset_lhs {
                (lhs, rhs)
            } else {
                (rhs, lhs)
            };

            let ce = constexpr::evaluate(
                ast,
                self.st,
                if offset_included { ptr_side.unwrap() } else { syn },
            );
            let oce = if offset_included {
                Some(constexpr::evaluate_integer(
                    ast,
                    self.st,
                    offset_side.unwrap(),
                ))
            } else {
                None
            };

            if ce.succeeded() && oce.as_ref().map(|o| o.succeeded()).unwrap_or(true) {
                if self.options.iflag {
                    println!(
                        "value of static initializer on line {}: {}",
                        ast.node(syn).row,
                        ce
                    );
                }
                match &ce {
                    ConstValue::Integer { ct, .. } | ConstValue::Arithmetic { ct, .. } => {
                        let bytes = ce.serialize();
                        let size = ct.size().max(0) as usize;
                        if let Some(data) = &mut self.st.get_mut(sy).data {
                            let end = ((base as usize) + size).min(data.len());
                            let n = end.saturating_sub(base as usize);
                            data[base as usize..end].copy_from_slice(&bytes[..n]);
                        }
                    }
                    ConstValue::Address { ct, symbol, offset } => {
                        let mut total = *offset;
                        if let Some(mut oce) = oce {
                            oce.convert_class(TypeClass::LongLongInt);
                            let pointee_size = ptr_side
                                .and_then(|p| ast.node(p).ctype.clone())
                                .map(|t| t.pointee().size().max(0))
                                .unwrap_or_else(|| ct.pointee().size().max(0));
                            let delta = oce.as_i64() * pointee_size;
                            if subtracting {
                                total -= delta;
                            } else {
                                total += delta;
                            }
                        }
                        let symbol = *symbol;
                        let sym = self.st.get_mut(sy);
                        sym.relocations.push(crate::symbol::InitReloc {
                            data_location: base,
                            symbol,
                        });
                        if let Some(data) = &mut sym.data {
                            let end = ((base as usize) + 8).min(data.len());
                            let n = end.saturating_sub(base as usize);
                            data[base as usize..end].copy_from_slice(&total.to_le_bytes()[..n]);
                        }
                    }
                    ConstValue::Error { .. } => {}
                }
            } else {
                // ISO: 6.7.8 (4)
                if let Some(message) = ce.error_message() {
                    self.error(ast, syn, format!("in static initialization: {}", message));
                }
                if let Some(oce) = &oce {
                    if let Some(message) = oce.error_message() {
                        self.error(
                            ast,
                            offset_side.unwrap(),
                            format!(
                                "in address constant offset of static initialization: {}",
                                message
                            ),
                        );
                    }
                }
            }
            return;
        }
        let initializers = match ast.kind(syn) {
            NodeKind::InitializerList { initializers, .. } => initializers.clone(),
            _ => return,
        };
        for init in initializers {
            let offset = ast.node(init).init_offset;
            if offset == Some(-1) {
                continue;
            }
            self.static_initializer_after(ast, init, sy, base + offset.unwrap_or(0));
        }
    }

    fn init_declarator_after(&mut self, ast: &mut Ast, syn: NodeId) {
        let initializer = match ast.kind(syn) {
            NodeKind::InitDeclarator { initializer, .. } => *initializer,
            _ => return,
        };
        let init0 = match initializer {
            Some(init) => init,
            None => return,
        };
        let id = match ast.declarator_identifier(syn) {
            Some(id) => id,
            None => {
                self.internal(ast, syn, "init declarator without an identifier");
                return;
            }
        };
        let sy = match self.st.get_by_declarer(id) {
            Some(sy) => sy,
            None => {
                self.internal(ast, syn, "declared identifier has no symbol");
                return;
            }
        };
        let lk = self.st.linkage(ast, sy);
        let scope = self.st.get(sy).scope;
        let sy_type = self.st.get(sy).ctype.clone();
        let sy_name = self.st.get(sy).name.clone();

        if !sy_type.is_object_type() && (sy_type.class != TypeClass::Array || sy_type.is_vla()) {
            // ISO: 6.7.8 (3)
            self.error(
                ast,
                syn,
                format!(
                    "initialization target '{}' must be an object type or an array of unknown size that is not variable-length",
                    sy_name
                ),
            );
            return;
        }
        if matches!(lk, Linkage::External | Linkage::Internal) && scope_is_block(scope) {
            // ISO: 6.7.8 (4)
            self.error(
                ast,
                syn,
                "identifiers with external or internal linkage may not be initialized at block scope",
            );
            return;
        }

        let is_scalar = sy_type.is_scalar();
        let is_char_array =
            sy_type.class == TypeClass::Array && sy_type.pointee().is_character();
        let is_wchar_array =
            sy_type.class == TypeClass::Array && sy_type.pointee().is_wchar_compatible();

        let mut init = init0;
        if let NodeKind::InitializerList { initializers, .. } = ast.kind(init) {
            if initializers.len() == 1 {
                let inner = initializers[0];
                if is_scalar
                    && !matches!(ast.kind(inner), NodeKind::InitializerList { .. })
                    && ast
                        .node(inner)
                        .ctype
                        .as_ref()
                        .map(|t| t.is_scalar())
                        .unwrap_or(false)
                {
                    init = inner;
                }
                if is_char_array
                    && matches!(ast.kind(inner), NodeKind::StringLiteral { bytes: Some(_), .. })
                {
                    init = inner;
                }
                if is_wchar_array
                    && matches!(ast.kind(inner), NodeKind::StringLiteral { wide: Some(_), .. })
                {
                    init = inner;
                }
            }
        }

        if matches!(ast.kind(init), NodeKind::InitializerList { .. }) {
            self.elaborate_for_symbol(ast, init, sy);
        } else {
            ast.node_mut(init).init_ctype = Some(sy_type.clone());
            ast.node_mut(init).init_offset = Some(0);
        }

        self.check_initializations(ast, init);
        self.initializer_after(ast, init, sy);

        let sd = self.st.storage_duration(ast, sy);
        if sd == StorageDuration::Static {
            let size = self.st.get(sy).ctype.size().max(0) as usize;
            self.st.get_mut(sy).data = Some(vec![0u8; size]);
            self.static_initializer_after(ast, init, sy, 0);
        }
        // automatic initializers are lowered by the air builder
    }

    fn compound_literal_before(&mut self, ast: &mut Ast, syn: NodeId) {
        let type_name = match ast.kind(syn) {
            NodeKind::CompoundLiteral { type_name, .. } => *type_name,
            _ => return,
        };
        let name = format!("__cl{}", self.next_compound_literal);
        self.next_compound_literal += 1;
        ast.node_mut(syn).synthesized_name = Some(name.clone());
        let ct = self.build_type_name(ast, type_name);
        if self.st.get_by_declarer(syn).is_none() {
            let mut sym = Symbol::new(name, NamespaceClass::Ordinary, ct.clone());
            sym.declarer = Some(syn);
            sym.scope = declaration_scope(ast, syn);
            self.st.add(sym);
        }
        if ct.class == TypeClass::Error {
            self.set_ctype(ast, syn, ct);
            return;
        }
        let decayed = self.expression_type_copy(ast, &ct, syn);
        self.set_ctype(ast, syn, decayed);
        self.strip_if_rvalue(ast, syn);
    }

    fn compound_literal_after(&mut self, ast: &mut Ast, syn: NodeId) {
        let initializer = match ast.kind(syn) {
            NodeKind::CompoundLiteral { initializer, .. } => *initializer,
            _ => return,
        };
        let sy = match self.st.get_by_declarer(syn) {
            Some(sy) => sy,
            None => {
                self.internal(ast, syn, "compound literal has no backing symbol");
                return;
            }
        };
        let ct = self.st.get(sy).ctype.clone();
        let mut pass = true;
        if !ct.is_object_type() && (ct.class != TypeClass::Array || ct.is_vla()) {
            // ISO: 6.5.2.5 (1)
            self.error(ast, syn, "compound literals may not have a variable-length array type");
            pass = false;
        }

        if matches!(ast.kind(initializer), NodeKind::InitializerList { .. }) {
            self.elaborate_for_symbol(ast, initializer, sy);
        }
        self.check_initializations(ast, initializer);
        self.initializer_after(ast, syn, sy);

        let sd = self.st.storage_duration(ast, sy);
        if sd == StorageDuration::Static {
            let size = self.st.get(sy).ctype.size().max(0) as usize;
            self.st.get_mut(sy).data = Some(vec![0u8; size]);
            self.static_initializer_after(ast, initializer, sy, 0);
        }

        if !pass {
            self.set_error_type(ast, syn);
        }
    }
}

// ============================================================================
// Intrinsics
// ============================================================================

type IntrinsicHandler = for<'x, 'y, 'z> fn(&'x mut Analyzer<'y>, &'z mut Ast, NodeId);

/// Static lookup from intrinsic name to its typing handler
const INTRINSICS: &[(&str, IntrinsicHandler)] = &[
    ("__ecc_va_arg", |a: &mut Analyzer, b: &mut Ast, c: NodeId| a.intrinsic_va_arg(b, c)),
    ("__ecc_va_start", |a: &mut Analyzer, b: &mut Ast, c: NodeId| a.intrinsic_va_start(b, c)),
    ("__ecc_va_end", |a: &mut Analyzer, b: &mut Ast, c: NodeId| a.intrinsic_va_end(b, c)),
    ("__ecc_lsys_open", |a: &mut Analyzer, b: &mut Ast, c: NodeId| a.intrinsic_lsys_open(b, c)),
    ("__ecc_lsys_close", |a: &mut Analyzer, b: &mut Ast, c: NodeId| a.intrinsic_lsys_close(b, c)),
    ("__ecc_lsys_read", |a: &mut Analyzer, b: &mut Ast, c: NodeId| a.intrinsic_lsys_read(b, c)),
];

impl<'a> Analyzer<'a> {
    fn intrinsic_call_after(&mut self, ast: &mut Ast, syn: NodeId) {
        let name = match ast.kind(syn) {
            NodeKind::IntrinsicCall { name, .. } => name.clone(),
            _ => return,
        };
        match INTRINSICS.iter().find(|(n, _)| *n == name) {
            Some((_, handler)) => handler(self, ast, syn),
            None => {
                self.error(
                    ast,
                    syn,
                    format!("unsupported intrinsic function '{}' invoked", name),
                );
                self.set_error_type(ast, syn);
            }
        }
    }

    fn intrinsic_args(&self, ast: &Ast, syn: NodeId) -> Vec<NodeId> {
        match ast.kind(syn) {
            NodeKind::IntrinsicCall { args, .. } => args.clone(),
            _ => Vec::new(),
        }
    }

    /// The `__ecc_va_list` structure tag, required by the va_* family
    fn va_list_type(&mut self, ast: &Ast, syn: NodeId, what: &str) -> Option<CType> {
        match self
            .st
            .get_by_classes("__ecc_va_list", TypeClass::Structure, NamespaceClass::Tag)
        {
            Some(sy) => Some(self.st.get(sy).ctype.clone()),
            None => {
                self.error(
                    ast,
                    syn,
                    format!("cannot find va_list declaration for {} invocation", what),
                );
                None
            }
        }
    }

    fn intrinsic_va_arg(&mut self, ast: &mut Ast, syn: NodeId) {
        let args = self.intrinsic_args(ast, syn);
        if args.len() != 2 {
            self.error(
                ast,
                syn,
                "va_arg invocation requires two arguments: a va_list and a type for the argument returned",
            );
            self.set_error_type(ast, syn);
            return;
        }
        let va_list = match self.va_list_type(ast, syn, "va_arg") {
            Some(t) => t,
            None => {
                self.set_error_type(ast, syn);
                return;
            }
        };
        let ap_ct = self.ctype_of(ast, args[0]);
        if !ap_ct.compatible_ignore_qualifiers(&va_list) {
            self.error(ast, syn, "first parameter of va_arg invocation must be a va_list");
            self.set_error_type(ast, syn);
            return;
        }
        if !matches!(ast.kind(args[1]), NodeKind::TypeName { .. }) {
            self.error(ast, syn, "second parameter of va_arg invocation must be a type name");
            self.set_error_type(ast, syn);
            return;
        }
        let ct = self.build_type_name(ast, args[1]);
        if ct.class == TypeClass::Error {
            self.set_ctype(ast, syn, ct);
            return;
        }
        if matches!(ct.class, TypeClass::Structure | TypeClass::Union | TypeClass::LongDouble)
            || ct.is_complex()
        {
            self.error(ast, syn, "this type is not yet supported by va_arg");
            self.set_error_type(ast, syn);
            return;
        }
        self.set_ctype(ast, syn, ct);
    }

    fn intrinsic_va_start(&mut self, ast: &mut Ast, syn: NodeId) {
        let args = self.intrinsic_args(ast, syn);
        if args.len() != 2 {
            self.error(
                ast,
                syn,
                "va_start invocation requires two arguments: a va_list and the last non-variadic parameter of this function",
            );
            self.set_error_type(ast, syn);
            return;
        }
        let va_list = match self.va_list_type(ast, syn, "va_start") {
            Some(t) => t,
            None => {
                self.set_error_type(ast, syn);
                return;
            }
        };
        let ap_ct = self.ctype_of(ast, args[0]);
        if !ap_ct.compatible_ignore_qualifiers(&va_list) {
            self.error(ast, syn, "first parameter of va_start invocation must be a va_list");
            self.set_error_type(ast, syn);
            return;
        }
        self.set_ctype(ast, syn, CType::basic(TypeClass::Void));
    }

    fn intrinsic_va_end(&mut self, ast: &mut Ast, syn: NodeId) {
        let args = self.intrinsic_args(ast, syn);
        if args.len() != 1 {
            self.error(ast, syn, "va_end invocation requires one argument: a va_list");
            self.set_error_type(ast, syn);
            return;
        }
        let va_list = match self.va_list_type(ast, syn, "va_end") {
            Some(t) => t,
            None => {
                self.set_error_type(ast, syn);
                return;
            }
        };
        let ap_ct = self.ctype_of(ast, args[0]);
        if !ap_ct.compatible_ignore_qualifiers(&va_list) {
            self.error(ast, syn, "parameter of va_end invocation must be a va_list");
            self.set_error_type(ast, syn);
            return;
        }
        self.set_ctype(ast, syn, CType::basic(TypeClass::Void));
    }

    /// One argument of a system-call intrinsic must be assignable to
    /// its declared parameter type
    fn check_intrinsic_arg(&mut self, ast: &mut Ast, syn: NodeId, index: usize, ct: CType) -> bool {
        let args = self.intrinsic_args(ast, syn);
        if index >= args.len() {
            self.error(
                ast,
                syn,
                format!(
                    "invocation requires only {} argument{}",
                    args.len(),
                    if args.len() != 1 { "s" } else { "" }
                ),
            );
            self.set_error_type(ast, syn);
            return false;
        }
        let arg = args[index];
        let arg_ct = self.ctype_of(ast, arg);
        if !self.can_assign(ast, &ct, &arg_ct, Some(arg)) {
            self.error(
                ast,
                arg,
                format!(
                    "argument {} of invocation has an incompatible type with parameter {}",
                    index + 1,
                    index + 1
                ),
            );
            self.set_error_type(ast, syn);
            return false;
        }
        true
    }

    fn intrinsic_lsys_open(&mut self, ast: &mut Ast, syn: NodeId) {
        let mut path_ct = CType::basic(TypeClass::Char);
        path_ct.qualifiers |= Qualifiers::CONST;
        if !self.check_intrinsic_arg(ast, syn, 0, CType::pointer_to(path_ct)) {
            return;
        }
        if !self.check_intrinsic_arg(ast, syn, 1, CType::basic(TypeClass::Int)) {
            return;
        }
        if !self.check_intrinsic_arg(ast, syn, 2, CType::basic(TypeClass::UnsignedInt)) {
            return;
        }
        self.set_ctype(ast, syn, CType::basic(TypeClass::Int));
    }

    fn intrinsic_lsys_close(&mut self, ast: &mut Ast, syn: NodeId) {
        if !self.check_intrinsic_arg(ast, syn, 0, CType::basic(TypeClass::Int)) {
            return;
        }
        self.set_ctype(ast, syn, CType::basic(TypeClass::Int));
    }

    fn intrinsic_lsys_read(&mut self, ast: &mut Ast, syn: NodeId) {
        if !self.check_intrinsic_arg(ast, syn, 0, CType::basic(TypeClass::Int)) {
            return;
        }
        if !self.check_intrinsic_arg(
            ast,
            syn,
            1,
            CType::pointer_to(CType::basic(TypeClass::Char)),
        ) {
            return;
        }
        if !self.check_intrinsic_arg(ast, syn, 2, CType::size_t()) {
            return;
        }
        self.set_ctype(ast, syn, CType::basic(TypeClass::LongInt));
    }
}

// ============================================================================
// Statements
// ============================================================================

impl<'a> Analyzer<'a> {
    fn labeled_statement_after(&mut self, ast: &mut Ast, syn: NodeId) {
        let named = matches!(
            ast.kind(syn),
            NodeKind::LabeledStatement { label: Some(_), .. }
        );
        if named {
            // this constraint applies to case/default only
            return;
        }
        if ast
            .enclosing(syn, |k| matches!(k, NodeKind::SwitchStatement { .. }))
            .is_none()
        {
            // ISO: 6.8.1 (2)
            self.error(ast, syn, "case and default labels may only exist within a switch statement");
        }
    }

    fn if_statement_after(&mut self, ast: &mut Ast, syn: NodeId) {
        let condition = match ast.kind(syn) {
            NodeKind::IfStatement { condition, .. } => *condition,
            _ => return,
        };
        if !self.ctype_of(ast, condition).is_scalar() {
            // ISO: 6.8.4.1 (1)
            self.error(
                ast,
                condition,
                "controlling expression of an if statement must be of scalar type",
            );
        }
    }

    fn switch_statement_after(&mut self, ast: &mut Ast, syn: NodeId) {
        self.warning(
            ast,
            syn,
            "switch statements are not checked for identifiers with variably-modified types, use with your own risk",
        );
        let (condition, body) = match ast.kind(syn) {
            NodeKind::SwitchStatement { condition, body } => (*condition, *body),
            _ => return,
        };
        let cond_ct = self.ctype_of(ast, condition);
        if !cond_ct.is_integer() {
            // ISO: 6.8.4.2 (1)
            self.error(
                ast,
                condition,
                "controlling expression of a switch statement must be of integer type",
            );
            return;
        }
        // nested traversal of the switch body: collect case values,
        // checking uniqueness and the at-most-one default rule
        let promoted = cond_ct.integer_promotions();
        let mut cases: Vec<(u64, u32)> = Vec::new();
        let mut default_seen = false;
        self.switch_body_walk(ast, body, syn, &promoted, &mut cases, &mut default_seen);
    }

    fn switch_body_walk(
        &mut self,
        ast: &mut Ast,
        node: NodeId,
        swstmt: NodeId,
        promoted: &CType,
        cases: &mut Vec<(u64, u32)>,
        default_seen: &mut bool,
    ) {
        if let NodeKind::LabeledStatement {
            label: None,
            case_expr,
            is_default,
            ..
        } = ast.kind(node).clone()
        {
            let enclosing_switch =
                ast.enclosing(node, |k| matches!(k, NodeKind::SwitchStatement { .. }));
            if enclosing_switch == Some(swstmt) {
                if let Some(case_expr) = case_expr {
                    let mut value = constexpr::evaluate_integer(ast, self.st, case_expr);
                    if !value.succeeded() {
                        // ISO: 6.8.4.2 (3)
                        self.error(ast, node, "case statement must have a constant expression");
                    } else {
                        value.convert(promoted);
                        let value = value.as_u64();
                        ast.node_mut(node).case_value = Some(value);
                        for &(seen, row) in cases.iter() {
                            if seen == value {
                                // ISO: 6.8.4.2 (3)
                                self.error(
                                    ast,
                                    node,
                                    format!(
                                        "case statement on line {} has expression with the same value",
                                        row
                                    ),
                                );
                            }
                        }
                        cases.push((value, ast.node(node).row));
                    }
                } else if is_default {
                    if *default_seen {
                        // ISO: 6.8.4.2 (3)
                        self.error(
                            ast,
                            node,
                            "multiple default cases are not allowed within a switch statement",
                        );
                    } else {
                        *default_seen = true;
                    }
                }
            }
        }
        for child in ast.children(node) {
            self.switch_body_walk(ast, child, swstmt, promoted, cases, default_seen);
        }
    }

    fn iteration_statement_after(&mut self, ast: &mut Ast, syn: NodeId) {
        let controlling = match ast.kind(syn).clone() {
            NodeKind::WhileStatement { condition, .. } | NodeKind::DoStatement { condition, .. } => {
                Some(condition)
            }
            NodeKind::ForStatement {
                init, condition, ..
            } => {
                if let Some(init) = init {
                    if let NodeKind::Declaration { specifiers, .. } = ast.kind(init).clone() {
                        let bad = specifiers.iter().any(|&s| {
                            matches!(
                                ast.kind(s),
                                NodeKind::StorageClassSpecifier { scs }
                                    if !matches!(scs, StorageClass::Auto | StorageClass::Register)
                            )
                        });
                        if bad {
                            // ISO: 6.8.5 (3)
                            self.error(
                                ast,
                                init,
                                "for loop initializing declaration may only have storage class specifiers of 'auto' or 'register'",
                            );
                        }
                    }
                }
                condition
            }
            _ => return,
        };
        if let Some(controlling) = controlling {
            if !self.ctype_of(ast, controlling).is_scalar() {
                // ISO: 6.8.5 (2)
                self.error(
                    ast,
                    controlling,
                    "controlling expression of a loop must be of scalar type",
                );
            }
        }
    }

    fn continue_statement_after(&mut self, ast: &mut Ast, syn: NodeId) {
        let in_loop = ast
            .enclosing(syn, |k| {
                matches!(
                    k,
                    NodeKind::ForStatement { .. }
                        | NodeKind::WhileStatement { .. }
                        | NodeKind::DoStatement { .. }
                )
            })
            .is_some();
        if !in_loop {
            // ISO: 6.8.6.2 (1)
            self.error(ast, syn, "continue statements are only allowed within loops");
        }
    }

    fn break_statement_after(&mut self, ast: &mut Ast, syn: NodeId) {
        let in_breakable = ast
            .enclosing(syn, |k| {
                matches!(
                    k,
                    NodeKind::ForStatement { .. }
                        | NodeKind::WhileStatement { .. }
                        | NodeKind::DoStatement { .. }
                        | NodeKind::SwitchStatement { .. }
                )
            })
            .is_some();
        if !in_breakable {
            // ISO: 6.8.6.3 (1)
            self.error(
                ast,
                syn,
                "break statements are only allowed within loops and switch statements",
            );
        }
    }

    fn return_statement_after(&mut self, ast: &mut Ast, syn: NodeId) {
        let expr = match ast.kind(syn) {
            NodeKind::Return { expr } => *expr,
            _ => return,
        };
        let fdef = match ast.enclosing_function_definition(syn) {
            Some(fdef) => fdef,
            None => {
                self.internal(ast, syn, "return statement outside a function definition");
                return;
            }
        };
        let fsy = match self.function_symbol(ast, fdef) {
            Some(fsy) => fsy,
            None => {
                self.internal(ast, syn, "function definition has no symbol");
                return;
            }
        };
        let ftype = self.st.get(fsy).ctype.clone();
        if ftype.class != TypeClass::Function {
            return;
        }
        let returns_void = ftype.pointee().class == TypeClass::Void;
        if returns_void && expr.is_some() {
            // ISO: 6.8.6.4 (1)
            self.error(
                ast,
                syn,
                "return values are not allowed for return statements if their function has a void return type",
            );
        }
        if !returns_void && expr.is_none() {
            // ISO: 6.8.6.4 (1)
            self.error(
                ast,
                syn,
                "return values are required for return statements if their function has a non-void return type",
            );
        }
    }
}

// ============================================================================
// Declaration-level constraints
// ============================================================================

impl<'a> Analyzer<'a> {
    /// A declaration must declare something (ISO 6.7 (2))
    fn enforce_declares_something(&mut self, ast: &mut Ast, syn: NodeId) {
        let (specifiers, init_declarators) = match ast.kind(syn) {
            NodeKind::Declaration {
                specifiers,
                init_declarators,
            } => (specifiers.clone(), init_declarators),
            _ => return,
        };
        if !init_declarators.is_empty() {
            return;
        }
        for s in specifiers {
            match ast.kind(s) {
                NodeKind::StructUnionSpecifier { id: Some(_), .. } => return,
                NodeKind::EnumSpecifier { id, enumerators } => {
                    if id.is_some() {
                        return;
                    }
                    if enumerators.as_ref().map(|e| !e.is_empty()).unwrap_or(false) {
                        return;
                    }
                }
                _ => {}
            }
        }
        // ISO: 6.7 (2)
        self.error(
            ast,
            syn,
            "a declaration must declare an identifier, struct/union/enum tag, or an enumeration constant",
        );
    }

    /// At most one storage class specifier (ISO 6.7.1 (2))
    fn enforce_one_storage_class(&mut self, ast: &mut Ast, syn: NodeId) {
        let specifiers = match ast.kind(syn) {
            NodeKind::Declaration { specifiers, .. } => specifiers.clone(),
            _ => return,
        };
        if ast.count_storage_classes(&specifiers) > 1 {
            // ISO: 6.7.1 (2)
            self.error(ast, syn, "only one storage class specifier allowed in declaration");
        }
    }

    /// External declarations forbid auto and register (ISO 6.9 (2))
    fn enforce_external_storage_classes(&mut self, ast: &mut Ast, syn: NodeId) {
        let parent_is_tu = ast
            .parent(syn)
            .map(|p| matches!(ast.kind(p), NodeKind::TranslationUnit { .. }))
            .unwrap_or(false);
        if !parent_is_tu {
            return;
        }
        let specifiers = match ast.kind(syn) {
            NodeKind::Declaration { specifiers, .. }
            | NodeKind::FunctionDefinition { specifiers, .. } => specifiers.clone(),
            _ => return,
        };
        for s in specifiers {
            if let NodeKind::StorageClassSpecifier { scs } = ast.kind(s) {
                if matches!(scs, StorageClass::Auto | StorageClass::Register) {
                    // ISO: 6.9 (2)
                    let name = scs.name();
                    self.error(
                        ast,
                        s,
                        format!("'{}' not allowed in external declaration", name),
                    );
                }
            }
        }
    }

    fn declaration_after(&mut self, ast: &mut Ast, syn: NodeId) {
        self.enforce_declares_something(ast, syn);
        self.enforce_one_storage_class(ast, syn);
        self.enforce_external_storage_classes(ast, syn);
    }

    fn function_definition_after(&mut self, ast: &mut Ast, syn: NodeId) {
        self.enforce_external_storage_classes(ast, syn);
        self.enforce_function_declarator_type(ast, syn);
        self.enforce_function_return_type(ast, syn);
        self.enforce_function_storage_classes(ast, syn);
        self.enforce_function_parameter_forms(ast, syn);
        self.enforce_knr_declaration_list(ast, syn);
        self.enforce_main_definition(ast, syn);
    }

    fn fdef_symbol_type(&mut self, ast: &Ast, syn: NodeId) -> Option<(SymbolId, CType)> {
        let sy = self.function_symbol(ast, syn)?;
        let ct = self.st.get(sy).ctype.clone();
        Some((sy, ct))
    }

    /// ISO 6.9.1 (2)
    fn enforce_function_declarator_type(&mut self, ast: &mut Ast, syn: NodeId) {
        let ct = match self.fdef_symbol_type(ast, syn) {
            Some((_, ct)) => ct,
            None => {
                self.internal(ast, syn, "function definition has no symbol");
                return;
            }
        };
        if ct.class != TypeClass::Function {
            // ISO: 6.9.1 (2)
            self.error(ast, syn, "declarator of function must be of function type");
        }
    }

    /// ISO 6.9.1 (3)
    fn enforce_function_return_type(&mut self, ast: &mut Ast, syn: NodeId) {
        let ct = match self.fdef_symbol_type(ast, syn) {
            Some((_, ct)) => ct,
            None => return,
        };
        if ct.class != TypeClass::Function {
            return; // reported by the declarator-type constraint
        }
        let ret = ct.pointee();
        if ret.class == TypeClass::Void
            || (ret.is_object_type() && ret.class != TypeClass::Array)
        {
            return;
        }
        // ISO: 6.9.1 (3)
        self.error(
            ast,
            syn,
            "function may only have a void or object (other than array) return type",
        );
    }

    /// ISO 6.9.1 (4)
    fn enforce_function_storage_classes(&mut self, ast: &mut Ast, syn: NodeId) {
        let specifiers = match ast.kind(syn) {
            NodeKind::FunctionDefinition { specifiers, .. } => specifiers.clone(),
            _ => return,
        };
        let no_scs = ast.count_storage_classes(&specifiers);
        if no_scs > 1 {
            // ISO: 6.9.1 (4)
            self.error(
                ast,
                syn,
                "function definition should not have more than one storage class specifier",
            );
        }
        if no_scs == 1
            && !ast.has_storage_class(&specifiers, StorageClass::Extern)
            && !ast.has_storage_class(&specifiers, StorageClass::Static)
        {
            // ISO: 6.9.1 (4)
            self.error(
                ast,
                syn,
                "'static' and 'extern' are the only allowed storage class specifiers for function definitions",
            );
        }
    }

    /// ISO 6.9.1 (5)
    fn enforce_function_parameter_forms(&mut self, ast: &mut Ast, syn: NodeId) {
        let (declarator, knr_declarations) = match ast.kind(syn) {
            NodeKind::FunctionDefinition {
                declarator,
                knr_declarations,
                ..
            } => (*declarator, knr_declarations.clone()),
            _ => return,
        };
        let params = match ast.kind(declarator) {
            NodeKind::FunctionDeclarator { params, .. } => params.clone(),
            _ => return, // reported by the declarator-type constraint
        };
        let params = match params {
            Some(params) => params,
            None => return,
        };
        if !knr_declarations.is_empty() {
            // ISO: 6.9.1 (5)
            self.error(
                ast,
                syn,
                "declaration list in function definition not allowed if there is a parameter list",
            );
        }
        if params.len() == 1 {
            if let NodeKind::ParameterDeclaration {
                specifiers,
                declarator: None,
            } = ast.kind(params[0])
            {
                // a lone (void) declarator is the no-parameter form
                if specifiers.len() == 1
                    && matches!(
                        ast.kind(specifiers[0]),
                        NodeKind::BasicTypeSpecifier { bts: Bts::Void }
                    )
                {
                    return;
                }
            }
        }
        for pdecl in params {
            let named = match ast.kind(pdecl) {
                NodeKind::ParameterDeclaration {
                    declarator: Some(d),
                    ..
                } => ast.declarator_identifier(*d).is_some(),
                _ => false,
            };
            if !named {
                // ISO: 6.9.1 (5)
                self.error(
                    ast,
                    syn,
                    "all parameters in a function definition must have identifiers",
                );
                break;
            }
        }
    }

    /// ISO 6.9.1 (6)
    fn enforce_knr_declaration_list(&mut self, ast: &mut Ast, syn: NodeId) {
        let (declarator, knr_declarations) = match ast.kind(syn) {
            NodeKind::FunctionDefinition {
                declarator,
                knr_declarations,
                ..
            } => (*declarator, knr_declarations.clone()),
            _ => return,
        };
        let knr_identifiers = match ast.kind(declarator) {
            NodeKind::FunctionDeclarator {
                knr_identifiers: Some(ids),
                ..
            } => ids.clone(),
            _ => return,
        };
        let knr_names: Vec<String> = knr_identifiers
            .iter()
            .filter_map(|&id| ast.ident(id).map(|s| s.to_string()))
            .collect();
        let mut found = 0usize;
        for knr_decl in knr_declarations {
            let (specifiers, init_declarators) = match ast.kind(knr_decl) {
                NodeKind::Declaration {
                    specifiers,
                    init_declarators,
                } => (specifiers.clone(), init_declarators.clone()),
                _ => continue,
            };
            for s in specifiers {
                if let NodeKind::StorageClassSpecifier { scs } = ast.kind(s) {
                    if *scs != StorageClass::Register {
                        // ISO: 6.9.1 (6)
                        self.error(
                            ast,
                            s,
                            "declarations in the function declaration list may only have the storage class specifier 'register'",
                        );
                    }
                }
            }
            if init_declarators.is_empty() {
                // ISO: 6.9.1 (6)
                self.error(
                    ast,
                    knr_decl,
                    "declarations in the function declaration list must include at least one declarator",
                );
                continue;
            }
            for ideclr in init_declarators {
                if let NodeKind::InitDeclarator {
                    initializer: Some(init),
                    ..
                } = ast.kind(ideclr)
                {
                    // ISO: 6.9.1 (6)
                    let init = *init;
                    self.error(
                        ast,
                        init,
                        "declarations in the function declaration list cannot have initializers",
                    );
                }
                let name = ast
                    .declarator_identifier(ideclr)
                    .and_then(|id| ast.ident(id).map(|s| s.to_string()));
                match name {
                    Some(name) if knr_names.contains(&name) => found += 1,
                    Some(name) => {
                        // ISO: 6.9.1 (6)
                        self.error(
                            ast,
                            syn,
                            format!(
                                "declaration of '{}' does not have a corresponding identifier in the identifier list",
                                name
                            ),
                        );
                    }
                    None => {
                        self.internal(ast, ideclr, "declarator without an identifier");
                    }
                }
            }
        }
        if found != knr_names.len() {
            // ISO: 6.9.1 (6)
            self.error(
                ast,
                syn,
                "each identifier must have exactly one declaration in the declaration list",
            );
        }
    }

    /// The prototype of `main`, when that is what is being defined
    fn enforce_main_definition(&mut self, ast: &mut Ast, syn: NodeId) {
        let (sy, ct) = match self.fdef_symbol_type(ast, syn) {
            Some(pair) => pair,
            None => return,
        };
        if self.st.get(sy).name != "main" {
            return;
        }
        if ct.class != TypeClass::Function {
            return; // reported by the declarator-type constraint
        }
        if ct.pointee().class != TypeClass::Int {
            self.error(ast, syn, "'main' should have an int return type");
        }
        // (void), (int, char**), (int, char*[]), or no prototype
        let good_prototype = match &ct.params {
            None => true,
            Some(params) if params.is_empty() => true,
            Some(params) if params.len() == 2 => {
                let (pt0, pt1) = (&params[0], &params[1]);
                pt0.class == TypeClass::Int
                    && matches!(pt1.class, TypeClass::Pointer | TypeClass::Array)
                    && pt1.pointee().class == TypeClass::Pointer
                    && pt1.pointee().pointee().class == TypeClass::Char
            }
            Some(_) => false,
        };
        if !good_prototype {
            self.error(
                ast,
                syn,
                "the function prototype for 'main', if any, should be either 'int main(void)' or 'int main(int argc, char *argv[])'",
            );
        }
    }

    fn struct_union_specifier_after(&mut self, ast: &mut Ast, syn: NodeId) {
        let declarations = match ast.kind(syn) {
            NodeKind::StructUnionSpecifier {
                declarations: Some(d),
                ..
            } => d.clone(),
            _ => return,
        };
        let total_declarators: usize = declarations
            .iter()
            .map(|&sdecl| match ast.kind(sdecl) {
                NodeKind::StructDeclaration { declarators, .. } => declarators.len(),
                _ => 0,
            })
            .sum();
        let last_sdecl = declarations.len().saturating_sub(1);
        for (j, &sdecl) in declarations.iter().enumerate() {
            let (specifiers, declarators) = match ast.kind(sdecl) {
                NodeKind::StructDeclaration {
                    specifiers,
                    declarators,
                } => (specifiers.clone(), declarators.clone()),
                _ => continue,
            };
            let last_sdeclr = declarators.len().saturating_sub(1);
            for (i, &sdeclr) in declarators.iter().enumerate() {
                let (declarator, bits) = match ast.kind(sdeclr) {
                    NodeKind::StructDeclarator { declarator, bits } => (*declarator, *bits),
                    _ => continue,
                };
                if let Some(bits) = bits {
                    self.error(ast, bits, "struct and union bitfields are not supported yet");

                    let base = self.build_specifier_type(ast, &specifiers, sdecl);
                    let mt = match declarator {
                        Some(d) => self.derive_declarator(ast, base, d).0,
                        None => base,
                    };
                    if mt.class == TypeClass::Error {
                        continue;
                    }
                    if !matches!(
                        mt.class,
                        TypeClass::Bool | TypeClass::Int | TypeClass::UnsignedInt
                    ) {
                        // ISO: 6.7.2.1 (4)
                        self.error(ast, sdeclr, "bitfield must have a type of bool, int, or unsigned int");
                        continue;
                    }
                    let mut width = constexpr::evaluate_integer(ast, self.st, bits);
                    if !width.succeeded() {
                        // ISO: 6.7.2.1 (3)
                        self.error(ast, bits, "bitfield width must be an integer constant expression");
                        continue;
                    }
                    width.convert_class(TypeClass::LongLongInt);
                    let width = width.as_i64();
                    if width < 0 {
                        // ISO: 6.7.2.1 (3)
                        self.error(ast, bits, "bitfield width must be nonnegative");
                        continue;
                    }
                    if width > mt.size() * 8 {
                        // ISO: 6.7.2.1 (3)
                        self.error(
                            ast,
                            bits,
                            "bitfield width must not exceed the typical width of its declaring type",
                        );
                        continue;
                    }
                    if width == 0 {
                        if let Some(declarator) = declarator {
                            // ISO: 6.7.2.1 (3)
                            self.error(
                                ast,
                                declarator,
                                "zero-width bitfields may not declare an identifier",
                            );
                        }
                    }
                    continue;
                }
                let id = match declarator.and_then(|d| ast.declarator_identifier(d)) {
                    Some(id) => id,
                    None => continue,
                };
                let msy = match self.st.get_by_declarer(id) {
                    Some(msy) => msy,
                    None => {
                        self.internal(ast, sdeclr, "struct member has no symbol");
                        continue;
                    }
                };
                let mt = self.st.get(msy).ctype.clone();
                let resolved = self.resolve_aggregate(ast, &mt, sdeclr);
                if resolved.has_flexible_array_member() {
                    // ISO: 6.7.2.1 (2)
                    self.error(
                        ast,
                        sdeclr,
                        "member with a struct or union type may not have a flexible array member",
                    );
                    continue;
                }
                if mt.class == TypeClass::Function {
                    // ISO: 6.7.2.1 (2)
                    self.error(ast, sdeclr, "struct or union members may not have a function type");
                    continue;
                }
                let complete = mt.is_complete();
                let flexible = !complete
                    && mt.class == TypeClass::Array
                    && j == last_sdecl
                    && i == last_sdeclr;
                if !complete && !flexible {
                    // ISO: 6.7.2.1 (2)
                    if mt.class == TypeClass::Array {
                        self.error(
                            ast,
                            sdeclr,
                            "flexible array members are only allowed at the end of a struct or union",
                        );
                    } else {
                        self.error(ast, sdeclr, "incomplete types are not allowed within structs and unions");
                    }
                }
                if flexible {
                    let nested = ast
                        .parent(syn)
                        .and_then(|p| {
                            ast.enclosing(p, |k| matches!(k, NodeKind::StructUnionSpecifier { .. }))
                        })
                        .is_some();
                    if nested {
                        // ISO: 6.7.2.1 (2)
                        self.error(
                            ast,
                            sdeclr,
                            "flexible array members are not permitted at the end of nested structs and unions",
                        );
                    }
                    if total_declarators == 1 {
                        // ISO: 6.7.2.1 (2)
                        self.error(
                            ast,
                            sdeclr,
                            "flexible array members cannot be a part of an otherwise empty struct or union",
                        );
                    }
                }
            }
        }
    }

    fn array_declarator_after(&mut self, ast: &mut Ast, syn: NodeId) {
        let length = match ast.kind(syn) {
            NodeKind::ArrayDeclarator {
                length: Some(length),
                ..
            } => *length,
            _ => return,
        };
        if !self.ctype_of(ast, length).is_integer() {
            // ISO: 6.7.5.2 (1)
            self.error(ast, syn, "array length expression must have an integer type");
            return;
        }
        let mut value = constexpr::evaluate_integer(ast, self.st, length);
        if !value.succeeded() {
            self.error(ast, syn, "variable-length arrays are not supported yet");
            return;
        }
        value.convert_class(TypeClass::LongLongInt);
        if value.as_i64() <= 0 {
            self.error(ast, syn, "constant array length must be greater than zero");
        }
    }

    fn function_declarator_after(&mut self, ast: &mut Ast, syn: NodeId) {
        let (params, knr_identifiers) = match ast.kind(syn) {
            NodeKind::FunctionDeclarator {
                params,
                knr_identifiers,
                ..
            } => (params.clone(), knr_identifiers.clone()),
            _ => return,
        };
        if params.is_none() {
            self.error(ast, syn, "functions without prototypes are not supported yet");
        }
        let in_definition = ast
            .parent(syn)
            .map(|p| matches!(ast.kind(p), NodeKind::FunctionDefinition { .. }))
            .unwrap_or(false);
        if !in_definition && knr_identifiers.map(|ids| !ids.is_empty()).unwrap_or(false) {
            // ISO: 6.7.5.3 (3)
            self.error(
                ast,
                syn,
                "function declarations which are not definitions must have an empty identifier list",
            );
        }
    }

    fn parameter_declaration_after(&mut self, ast: &mut Ast, syn: NodeId) {
        let specifiers = match ast.kind(syn) {
            NodeKind::ParameterDeclaration { specifiers, .. } => specifiers.clone(),
            _ => return,
        };
        for spec in specifiers {
            if let NodeKind::StorageClassSpecifier { scs } = ast.kind(spec) {
                if *scs != StorageClass::Register {
                    // ISO: 6.7.5.3 (2)
                    self.error(
                        ast,
                        syn,
                        "only the 'register' storage class specifier may appear in a parameter declaration",
                    );
                }
            }
        }
    }
}

// ============================================================================
// Traversal wiring
// ============================================================================

impl<'a> Visitor for Analyzer<'a> {
    fn before(&mut self, ast: &mut Ast, id: NodeId) {
        if matches!(ast.kind(id), NodeKind::Declaration { .. }) {
            self.declare_from_declaration(ast, id);
        } else if matches!(ast.kind(id), NodeKind::FunctionDefinition { .. }) {
            self.declare_from_function_definition(ast, id);
        } else if matches!(ast.kind(id), NodeKind::CompoundLiteral { .. }) {
            self.compound_literal_before(ast, id);
        } else if matches!(ast.kind(id), NodeKind::LabeledStatement { .. }) {
            self.next_label_uid += 1;
            let uid = self.next_label_uid;
            ast.node_mut(id).label_uid = uid;
        }
    }

    fn after(&mut self, ast: &mut Ast, id: NodeId) {
        match ast.kind(id).clone() {
            // expressions
            NodeKind::Comma { .. } => self.comma_after(ast, id),
            NodeKind::Assignment { .. } => self.assignment_after(ast, id),
            NodeKind::Conditional { .. } => self.conditional_after(ast, id),
            NodeKind::Binary { op, lhs, rhs } => self.binary_after(ast, id, op, lhs, rhs),
            NodeKind::Cast { .. } => self.cast_after(ast, id),
            NodeKind::SizeofExpression { .. } | NodeKind::SizeofType { .. } => {
                self.sizeof_after(ast, id)
            }
            NodeKind::Not { operand } => self.not_after(ast, id, operand),
            NodeKind::Complement { operand } => self.complement_after(ast, id, operand),
            NodeKind::UnaryPlus { operand } | NodeKind::UnaryMinus { operand } => {
                self.plus_minus_after(ast, id, operand)
            }
            NodeKind::Reference { operand } => self.reference_after(ast, id, operand),
            NodeKind::Dereference { operand } => self.dereference_after(ast, id, operand),
            NodeKind::PrefixIncrement { operand }
            | NodeKind::PrefixDecrement { operand }
            | NodeKind::PostfixIncrement { operand }
            | NodeKind::PostfixDecrement { operand } => self.inc_dec_after(ast, id, operand),
            NodeKind::CompoundLiteral { .. } => self.compound_literal_after(ast, id),
            NodeKind::Member { .. } => self.member_after(ast, id, false),
            NodeKind::DerefMember { .. } => self.member_after(ast, id, true),
            NodeKind::FunctionCall { .. } => self.function_call_after(ast, id),
            NodeKind::IntrinsicCall { .. } => self.intrinsic_call_after(ast, id),
            NodeKind::Subscript { .. } => self.subscript_after(ast, id),
            NodeKind::Identifier { .. } => self.identifier_after(ast, id),
            NodeKind::StringLiteral { .. } => self.string_literal_after(ast, id),
            NodeKind::IntegerConstant { class, .. } => {
                self.set_ctype(ast, id, CType::basic(class))
            }
            NodeKind::FloatingConstant { .. } => self.floating_constant_after(ast, id),
            NodeKind::StorageClassSpecifier { scs } => {
                if scs == StorageClass::Register {
                    self.warning(
                        ast,
                        id,
                        "the 'register' storage class will not prioritize an object to remain in a register",
                    );
                }
            }

            // statements
            NodeKind::LabeledStatement { .. } => self.labeled_statement_after(ast, id),
            NodeKind::IfStatement { .. } => self.if_statement_after(ast, id),
            NodeKind::ForStatement { .. }
            | NodeKind::DoStatement { .. }
            | NodeKind::WhileStatement { .. } => self.iteration_statement_after(ast, id),
            NodeKind::Continue => self.continue_statement_after(ast, id),
            NodeKind::Break => self.break_statement_after(ast, id),
            NodeKind::Return { .. } => self.return_statement_after(ast, id),
            NodeKind::SwitchStatement { .. } => self.switch_statement_after(ast, id),

            // declarations
            NodeKind::Declaration { .. } => self.declaration_after(ast, id),
            NodeKind::FunctionDefinition { .. } => self.function_definition_after(ast, id),
            NodeKind::InitDeclarator { .. } => self.init_declarator_after(ast, id),
            NodeKind::ArrayDeclarator { .. } => self.array_declarator_after(ast, id),
            NodeKind::StructUnionSpecifier { .. } => self.struct_union_specifier_after(ast, id),
            NodeKind::FunctionDeclarator { .. } => self.function_declarator_after(ast, id),
            NodeKind::ParameterDeclaration { .. } => self.parameter_declaration_after(ast, id),
            _ => {}
        }
    }
}
