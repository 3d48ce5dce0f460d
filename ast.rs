//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ecc project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Abstract syntax tree for the ecc compiler core
//
// The tree is arena-allocated: nodes live in a flat vector and refer
// to each other by index, including the child-to-parent edge, so no
// owning back-links exist. The external parser builds nodes bottom-up
// and calls `link_parents` once on the root; the analyzer then
// decorates nodes in place.
//

use crate::types::{CType, Qualifiers, TypeClass};

// ============================================================================
// Node identity
// ============================================================================

/// Index of a node in the AST arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

// ============================================================================
// Specifier payloads
// ============================================================================

/// Basic type specifier keywords (C99 6.7.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bts {
    Void,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Signed,
    Unsigned,
    Bool,
    Complex,
}

/// Storage class specifiers (C99 6.7.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Typedef,
    Extern,
    Static,
    Auto,
    Register,
}

impl StorageClass {
    pub fn name(self) -> &'static str {
        match self {
            StorageClass::Typedef => "typedef",
            StorageClass::Extern => "extern",
            StorageClass::Static => "static",
            StorageClass::Auto => "auto",
            StorageClass::Register => "register",
        }
    }
}

/// Binary operators (one node kind, discriminated here)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Multiply,
    Divide,
    Modulo,
    Add,
    Subtract,
    ShiftLeft,
    ShiftRight,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    BitAnd,
    BitXor,
    BitOr,
    LogicalAnd,
    LogicalOr,
}

// ============================================================================
// Node kinds
// ============================================================================

/// Syntactic category and per-category payload
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    TranslationUnit {
        items: Vec<NodeId>,
    },

    // declarations
    Declaration {
        specifiers: Vec<NodeId>,
        init_declarators: Vec<NodeId>,
    },
    FunctionDefinition {
        specifiers: Vec<NodeId>,
        declarator: NodeId,
        knr_declarations: Vec<NodeId>,
        body: NodeId,
    },
    InitDeclarator {
        declarator: NodeId,
        initializer: Option<NodeId>,
    },
    /// Direct declarator naming the declared identifier
    IdentDeclarator {
        id: NodeId,
    },
    /// Terminator of an abstract declarator chain
    AbstractBase,
    PointerDeclarator {
        qualifiers: Qualifiers,
        inner: NodeId,
    },
    ArrayDeclarator {
        inner: NodeId,
        length: Option<NodeId>,
    },
    FunctionDeclarator {
        inner: NodeId,
        /// None marks a prototype-less () declarator
        params: Option<Vec<NodeId>>,
        knr_identifiers: Option<Vec<NodeId>>,
        variadic: bool,
    },
    ParameterDeclaration {
        specifiers: Vec<NodeId>,
        declarator: Option<NodeId>,
    },
    BasicTypeSpecifier {
        bts: Bts,
    },
    StorageClassSpecifier {
        scs: StorageClass,
    },
    TypeQualifier {
        tq: Qualifiers,
    },
    /// `inline`
    FunctionSpecifier,
    TypedefName {
        name: String,
    },
    StructUnionSpecifier {
        is_union: bool,
        id: Option<NodeId>,
        declarations: Option<Vec<NodeId>>,
    },
    StructDeclaration {
        specifiers: Vec<NodeId>,
        declarators: Vec<NodeId>,
    },
    StructDeclarator {
        declarator: Option<NodeId>,
        bits: Option<NodeId>,
    },
    EnumSpecifier {
        id: Option<NodeId>,
        enumerators: Option<Vec<NodeId>>,
    },
    Enumerator {
        id: NodeId,
        value: Option<NodeId>,
    },
    TypeName {
        specifiers: Vec<NodeId>,
        declarator: Option<NodeId>,
    },
    Designation {
        designators: Vec<NodeId>,
    },
    InitializerList {
        /// Parallel to `initializers`; None for undesignated elements
        designations: Vec<Option<NodeId>>,
        initializers: Vec<NodeId>,
    },

    // expressions
    Identifier {
        name: String,
    },
    IntegerConstant {
        value: u64,
        class: TypeClass,
    },
    FloatingConstant {
        value: f64,
        class: TypeClass,
    },
    StringLiteral {
        /// Regular string bytes including the terminator
        bytes: Option<Vec<u8>>,
        /// Wide string code units including the terminator
        wide: Option<Vec<u32>>,
    },
    CompoundLiteral {
        type_name: NodeId,
        initializer: NodeId,
    },
    Subscript {
        base: NodeId,
        index: NodeId,
    },
    FunctionCall {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    IntrinsicCall {
        name: String,
        args: Vec<NodeId>,
    },
    Member {
        base: NodeId,
        id: NodeId,
    },
    DerefMember {
        base: NodeId,
        id: NodeId,
    },
    PostfixIncrement {
        operand: NodeId,
    },
    PostfixDecrement {
        operand: NodeId,
    },
    PrefixIncrement {
        operand: NodeId,
    },
    PrefixDecrement {
        operand: NodeId,
    },
    /// Unary `&`
    Reference {
        operand: NodeId,
    },
    /// Unary `*`
    Dereference {
        operand: NodeId,
    },
    UnaryPlus {
        operand: NodeId,
    },
    UnaryMinus {
        operand: NodeId,
    },
    Complement {
        operand: NodeId,
    },
    Not {
        operand: NodeId,
    },
    SizeofExpression {
        operand: NodeId,
    },
    SizeofType {
        type_name: NodeId,
    },
    Cast {
        type_name: NodeId,
        operand: NodeId,
    },
    Binary {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Conditional {
        condition: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    },
    /// Simple assignment when `op` is None, compound otherwise
    Assignment {
        op: Option<BinaryOp>,
        lhs: NodeId,
        rhs: NodeId,
    },
    /// Comma expression
    Comma {
        exprs: Vec<NodeId>,
    },

    // statements
    LabeledStatement {
        label: Option<NodeId>,
        case_expr: Option<NodeId>,
        is_default: bool,
        stmt: NodeId,
    },
    CompoundStatement {
        items: Vec<NodeId>,
    },
    ExpressionStatement {
        expr: Option<NodeId>,
    },
    IfStatement {
        condition: NodeId,
        then_stmt: NodeId,
        else_stmt: Option<NodeId>,
    },
    SwitchStatement {
        condition: NodeId,
        body: NodeId,
    },
    WhileStatement {
        condition: NodeId,
        body: NodeId,
    },
    DoStatement {
        body: NodeId,
        condition: NodeId,
    },
    ForStatement {
        init: Option<NodeId>,
        condition: Option<NodeId>,
        post: Option<NodeId>,
        body: NodeId,
    },
    Goto {
        label: NodeId,
    },
    Continue,
    Break,
    Return {
        expr: Option<NodeId>,
    },
}

// ============================================================================
// Node
// ============================================================================

/// One AST node: kind, position, parent index, and the decoration
/// slots filled during analysis
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub row: u32,
    pub col: u32,
    pub parent: Option<NodeId>,

    /// Result type after analysis (expressions, type names)
    pub ctype: Option<CType>,
    /// Byte offset of an elaborated initializer element; -1 marks an
    /// element that would write outside the object
    pub init_offset: Option<i64>,
    /// Target element type of an elaborated initializer leaf
    pub init_ctype: Option<CType>,
    /// Unique id assigned to labeled statements
    pub label_uid: u64,
    /// Converted case expression value
    pub case_value: Option<u64>,
    /// Value of an enumeration constant
    pub enum_value: Option<i64>,
    /// Synthesized symbol name (`__cl<n>`, `__sl<n>`, `__fc<n>`)
    pub synthesized_name: Option<String>,
    /// Initializer-list elaboration already ran on this node
    pub inlist_has_semantics: bool,
}

impl Node {
    fn new(kind: NodeKind, row: u32, col: u32) -> Self {
        Self {
            kind,
            row,
            col,
            parent: None,
            ctype: None,
            init_offset: None,
            init_ctype: None,
            label_uid: 0,
            case_value: None,
            enum_value: None,
            synthesized_name: None,
            inlist_has_semantics: false,
        }
    }
}

// ============================================================================
// Arena
// ============================================================================

/// The AST arena for one translation unit
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, returning its id. Parent links are established
    /// later by `link_parents`.
    pub fn add(&mut self, kind: NodeKind, row: u32, col: u32) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind, row, col));
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Identifier text, if this node is an identifier
    pub fn ident(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// Child node ids in source order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        use NodeKind::*;
        let mut out = Vec::new();
        match self.kind(id) {
            TranslationUnit { items } | CompoundStatement { items } => out.extend(items),
            Declaration {
                specifiers,
                init_declarators,
            } => {
                out.extend(specifiers);
                out.extend(init_declarators);
            }
            FunctionDefinition {
                specifiers,
                declarator,
                knr_declarations,
                body,
            } => {
                out.extend(specifiers);
                out.push(*declarator);
                out.extend(knr_declarations);
                out.push(*body);
            }
            InitDeclarator {
                declarator,
                initializer,
            } => {
                out.push(*declarator);
                out.extend(initializer);
            }
            IdentDeclarator { id } => out.push(*id),
            AbstractBase => {}
            PointerDeclarator { inner, .. } => out.push(*inner),
            ArrayDeclarator { inner, length } => {
                out.push(*inner);
                out.extend(length);
            }
            FunctionDeclarator {
                inner,
                params,
                knr_identifiers,
                ..
            } => {
                out.push(*inner);
                if let Some(params) = params {
                    out.extend(params);
                }
                if let Some(ids) = knr_identifiers {
                    out.extend(ids);
                }
            }
            ParameterDeclaration {
                specifiers,
                declarator,
            } => {
                out.extend(specifiers);
                out.extend(declarator);
            }
            BasicTypeSpecifier { .. }
            | StorageClassSpecifier { .. }
            | TypeQualifier { .. }
            | FunctionSpecifier
            | TypedefName { .. } => {}
            StructUnionSpecifier {
                id, declarations, ..
            } => {
                out.extend(id);
                if let Some(decls) = declarations {
                    out.extend(decls);
                }
            }
            StructDeclaration {
                specifiers,
                declarators,
            } => {
                out.extend(specifiers);
                out.extend(declarators);
            }
            StructDeclarator { declarator, bits } => {
                out.extend(declarator);
                out.extend(bits);
            }
            EnumSpecifier { id, enumerators } => {
                out.extend(id);
                if let Some(enums) = enumerators {
                    out.extend(enums);
                }
            }
            Enumerator { id, value } => {
                out.push(*id);
                out.extend(value);
            }
            TypeName {
                specifiers,
                declarator,
            } => {
                out.extend(specifiers);
                out.extend(declarator);
            }
            Designation { designators } => out.extend(designators),
            InitializerList {
                designations,
                initializers,
            } => {
                for (desig, init) in designations.iter().zip(initializers.iter()) {
                    out.extend(desig);
                    out.push(*init);
                }
            }
            Identifier { .. }
            | IntegerConstant { .. }
            | FloatingConstant { .. }
            | StringLiteral { .. } => {}
            CompoundLiteral {
                type_name,
                initializer,
            } => {
                out.push(*type_name);
                out.push(*initializer);
            }
            Subscript { base, index } => {
                out.push(*base);
                out.push(*index);
            }
            FunctionCall { callee, args } => {
                out.push(*callee);
                out.extend(args);
            }
            IntrinsicCall { args, .. } => out.extend(args),
            Member { base, id } | DerefMember { base, id } => {
                out.push(*base);
                out.push(*id);
            }
            PostfixIncrement { operand }
            | PostfixDecrement { operand }
            | PrefixIncrement { operand }
            | PrefixDecrement { operand }
            | Reference { operand }
            | Dereference { operand }
            | UnaryPlus { operand }
            | UnaryMinus { operand }
            | Complement { operand }
            | Not { operand }
            | SizeofExpression { operand } => out.push(*operand),
            SizeofType { type_name } => out.push(*type_name),
            Cast { type_name, operand } => {
                out.push(*type_name);
                out.push(*operand);
            }
            Binary { lhs, rhs, .. } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                out.push(*condition);
                out.push(*then_expr);
                out.push(*else_expr);
            }
            Assignment { lhs, rhs, .. } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            Comma { exprs } => out.extend(exprs),
            LabeledStatement {
                label,
                case_expr,
                stmt,
                ..
            } => {
                out.extend(label);
                out.extend(case_expr);
                out.push(*stmt);
            }
            ExpressionStatement { expr } => out.extend(expr),
            IfStatement {
                condition,
                then_stmt,
                else_stmt,
            } => {
                out.push(*condition);
                out.push(*then_stmt);
                out.extend(else_stmt);
            }
            SwitchStatement { condition, body }
            | WhileStatement { condition, body } => {
                out.push(*condition);
                out.push(*body);
            }
            DoStatement { body, condition } => {
                out.push(*body);
                out.push(*condition);
            }
            ForStatement {
                init,
                condition,
                post,
                body,
            } => {
                out.extend(init);
                out.extend(condition);
                out.extend(post);
                out.push(*body);
            }
            Goto { label } => out.push(*label),
            Continue | Break => {}
            Return { expr } => out.extend(expr),
        }
        out
    }

    /// Establish parent indices for the subtree rooted at `root`
    pub fn link_parents(&mut self, root: NodeId) {
        let children = self.children(root);
        for child in children {
            self.nodes[child.index()].parent = Some(root);
            self.link_parents(child);
        }
    }

    /// Nearest node (starting from `id` itself) satisfying `pred`
    pub fn enclosing(&self, id: NodeId, pred: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if pred(self.kind(n)) {
                return Some(n);
            }
            cur = self.parent(n);
        }
        None
    }

    /// Enclosing function definition
    pub fn enclosing_function_definition(&self, id: NodeId) -> Option<NodeId> {
        self.enclosing(id, |k| matches!(k, NodeKind::FunctionDefinition { .. }))
    }

    /// Enclosing init declarator
    pub fn enclosing_init_declarator(&self, id: NodeId) -> Option<NodeId> {
        self.enclosing(id, |k| matches!(k, NodeKind::InitDeclarator { .. }))
    }

    // ========================================================================
    // Declarator helpers
    // ========================================================================

    /// The identifier node at the core of a declarator chain
    pub fn declarator_identifier(&self, declarator: NodeId) -> Option<NodeId> {
        match self.kind(declarator) {
            NodeKind::IdentDeclarator { id } => Some(*id),
            NodeKind::InitDeclarator { declarator, .. } => self.declarator_identifier(*declarator),
            NodeKind::StructDeclarator {
                declarator: Some(d), ..
            } => self.declarator_identifier(*d),
            NodeKind::PointerDeclarator { inner, .. }
            | NodeKind::ArrayDeclarator { inner, .. }
            | NodeKind::FunctionDeclarator { inner, .. } => self.declarator_identifier(*inner),
            _ => None,
        }
    }

    /// The declaration or function definition a declarator belongs to
    pub fn declarator_declaration(&self, id: NodeId) -> Option<NodeId> {
        self.enclosing(id, |k| {
            matches!(
                k,
                NodeKind::Declaration { .. } | NodeKind::FunctionDefinition { .. }
            )
        })
    }

    /// The struct declarator (if any) a member identifier belongs to
    pub fn enclosing_struct_declarator(&self, id: NodeId) -> Option<NodeId> {
        self.enclosing(id, |k| matches!(k, NodeKind::StructDeclarator { .. }))
    }

    // ========================================================================
    // Specifier queries
    // ========================================================================

    /// Does a specifier list contain the given storage class?
    pub fn has_storage_class(&self, specifiers: &[NodeId], scs: StorageClass) -> bool {
        specifiers.iter().any(|&s| {
            matches!(self.kind(s), NodeKind::StorageClassSpecifier { scs: found } if *found == scs)
        })
    }

    /// Number of storage class specifiers in a list
    pub fn count_storage_classes(&self, specifiers: &[NodeId]) -> usize {
        specifiers
            .iter()
            .filter(|&&s| matches!(self.kind(s), NodeKind::StorageClassSpecifier { .. }))
            .count()
    }

    /// The specifier list of the declaration owning a declaring
    /// identifier, if any
    pub fn declaration_specifiers(&self, id: NodeId) -> Option<Vec<NodeId>> {
        let decl = self.declarator_declaration(id)?;
        match self.kind(decl) {
            NodeKind::Declaration { specifiers, .. }
            | NodeKind::FunctionDefinition { specifiers, .. } => Some(specifiers.clone()),
            _ => None,
        }
    }

    /// Does the init declarator owning this identifier carry an
    /// initializer?
    pub fn has_initializer(&self, id: NodeId) -> bool {
        match self.enclosing_init_declarator(id) {
            Some(ideclr) => matches!(
                self.kind(ideclr),
                NodeKind::InitDeclarator {
                    initializer: Some(_),
                    ..
                }
            ),
            None => false,
        }
    }

    // ========================================================================
    // Lvalue classification
    // ========================================================================

    /// Does this expression designate an object (C99 6.3.2.1)?
    pub fn is_lvalue(&self, id: NodeId) -> bool {
        matches!(
            self.kind(id),
            NodeKind::Identifier { .. }
                | NodeKind::StringLiteral { .. }
                | NodeKind::CompoundLiteral { .. }
                | NodeKind::Subscript { .. }
                | NodeKind::Dereference { .. }
                | NodeKind::Member { .. }
                | NodeKind::DerefMember { .. }
        )
    }

    /// Is this expression used where an lvalue is required? Qualifiers
    /// survive only in such positions.
    pub fn is_in_lvalue_context(&self, id: NodeId) -> bool {
        let parent = match self.parent(id) {
            Some(p) => p,
            None => return false,
        };
        match self.kind(parent) {
            NodeKind::Assignment { lhs, .. } => *lhs == id,
            NodeKind::PrefixIncrement { .. }
            | NodeKind::PrefixDecrement { .. }
            | NodeKind::PostfixIncrement { .. }
            | NodeKind::PostfixDecrement { .. }
            | NodeKind::Reference { .. } => true,
            NodeKind::Member { base, .. } => {
                *base == id && self.is_in_lvalue_context(parent)
            }
            _ => false,
        }
    }

    /// Modifiable lvalue (C99 6.3.2.1p1): an lvalue of complete
    /// non-array type without const anywhere assignment would write
    pub fn is_modifiable_lvalue(&self, id: NodeId) -> bool {
        if !self.is_lvalue(id) {
            return false;
        }
        let ct = match &self.node(id).ctype {
            Some(ct) => ct,
            None => return false,
        };
        if ct.class == TypeClass::Array || ct.class == TypeClass::Function {
            return false;
        }
        if !ct.is_complete() {
            return false;
        }
        !type_has_const(ct)
    }
}

/// const anywhere assignment to an object of this type would write
fn type_has_const(ct: &CType) -> bool {
    if ct.qualifiers.contains(Qualifiers::CONST) {
        return true;
    }
    if matches!(ct.class, TypeClass::Structure | TypeClass::Union) {
        if let Some(members) = &ct.members {
            return members.types.iter().any(type_has_const);
        }
    }
    false
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_and_parents() {
        let mut ast = Ast::new();
        let id = ast.add(
            NodeKind::Identifier {
                name: "x".to_string(),
            },
            1,
            1,
        );
        let deref = ast.add(NodeKind::Dereference { operand: id }, 1, 1);
        let root = ast.add(
            NodeKind::ExpressionStatement { expr: Some(deref) },
            1,
            1,
        );
        ast.link_parents(root);
        assert_eq!(ast.parent(id), Some(deref));
        assert_eq!(ast.parent(deref), Some(root));
        assert_eq!(ast.parent(root), None);
    }

    #[test]
    fn test_enclosing() {
        let mut ast = Ast::new();
        let brk = ast.add(NodeKind::Break, 2, 3);
        let body = ast.add(NodeKind::CompoundStatement { items: vec![brk] }, 2, 1);
        let cond = ast.add(
            NodeKind::IntegerConstant {
                value: 1,
                class: TypeClass::Int,
            },
            1,
            7,
        );
        let loop_stmt = ast.add(
            NodeKind::WhileStatement {
                condition: cond,
                body,
            },
            1,
            1,
        );
        ast.link_parents(loop_stmt);
        let found = ast.enclosing(brk, |k| matches!(k, NodeKind::WhileStatement { .. }));
        assert_eq!(found, Some(loop_stmt));
    }

    #[test]
    fn test_declarator_identifier() {
        let mut ast = Ast::new();
        let id = ast.add(
            NodeKind::Identifier {
                name: "p".to_string(),
            },
            1,
            6,
        );
        let direct = ast.add(NodeKind::IdentDeclarator { id }, 1, 6);
        let ptr = ast.add(
            NodeKind::PointerDeclarator {
                qualifiers: Qualifiers::empty(),
                inner: direct,
            },
            1,
            5,
        );
        assert_eq!(ast.declarator_identifier(ptr), Some(id));
    }

    #[test]
    fn test_lvalue_context() {
        let mut ast = Ast::new();
        let lhs = ast.add(
            NodeKind::Identifier {
                name: "x".to_string(),
            },
            1,
            1,
        );
        let rhs = ast.add(
            NodeKind::IntegerConstant {
                value: 1,
                class: TypeClass::Int,
            },
            1,
            5,
        );
        let assign = ast.add(
            NodeKind::Assignment {
                op: None,
                lhs,
                rhs,
            },
            1,
            3,
        );
        ast.link_parents(assign);
        assert!(ast.is_in_lvalue_context(lhs));
        assert!(!ast.is_in_lvalue_context(rhs));
    }
}
