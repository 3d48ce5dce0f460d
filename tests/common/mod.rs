//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ecc project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Shared AST construction helpers for the integration tests. The
// external parser normally builds these trees; tests assemble them by
// hand through the same arena API.
//

use ecc::analyze::{analyze, Options};
use ecc::ast::{Ast, Bts, NodeId, NodeKind, StorageClass};
use ecc::diag::{Diagnostics, Severity};
use ecc::symbol::SymbolTable;
use ecc::types::TypeClass;

pub fn ident(ast: &mut Ast, name: &str, row: u32) -> NodeId {
    ast.add(
        NodeKind::Identifier {
            name: name.to_string(),
        },
        row,
        1,
    )
}

pub fn int_const(ast: &mut Ast, value: u64, row: u32) -> NodeId {
    ast.add(
        NodeKind::IntegerConstant {
            value,
            class: TypeClass::Int,
        },
        row,
        1,
    )
}

pub fn bts(ast: &mut Ast, bts: Bts, row: u32) -> NodeId {
    ast.add(NodeKind::BasicTypeSpecifier { bts }, row, 1)
}

pub fn scs(ast: &mut Ast, scs: StorageClass, row: u32) -> NodeId {
    ast.add(NodeKind::StorageClassSpecifier { scs }, row, 1)
}

/// Direct declarator naming `name`; returns (declarator, identifier)
pub fn ident_declarator(ast: &mut Ast, name: &str, row: u32) -> (NodeId, NodeId) {
    let id = ident(ast, name, row);
    let declr = ast.add(NodeKind::IdentDeclarator { id }, row, 1);
    (declr, id)
}

pub fn init_declarator(ast: &mut Ast, declarator: NodeId, initializer: Option<NodeId>, row: u32) -> NodeId {
    ast.add(
        NodeKind::InitDeclarator {
            declarator,
            initializer,
        },
        row,
        1,
    )
}

pub fn declaration(ast: &mut Ast, specifiers: Vec<NodeId>, init_declarators: Vec<NodeId>, row: u32) -> NodeId {
    ast.add(
        NodeKind::Declaration {
            specifiers,
            init_declarators,
        },
        row,
        1,
    )
}

/// `int <name>(void) { <body_items> }`
pub fn function_definition(
    ast: &mut Ast,
    name: &str,
    body_items: Vec<NodeId>,
    row: u32,
) -> NodeId {
    let ret = bts(ast, Bts::Int, row);
    let void_spec = bts(ast, Bts::Void, row);
    let param = ast.add(
        NodeKind::ParameterDeclaration {
            specifiers: vec![void_spec],
            declarator: None,
        },
        row,
        1,
    );
    let (inner, _) = ident_declarator(ast, name, row);
    let declarator = ast.add(
        NodeKind::FunctionDeclarator {
            inner,
            params: Some(vec![param]),
            knr_identifiers: None,
            variadic: false,
        },
        row,
        1,
    );
    let body = ast.add(NodeKind::CompoundStatement { items: body_items }, row, 1);
    ast.add(
        NodeKind::FunctionDefinition {
            specifiers: vec![ret],
            declarator,
            knr_declarations: vec![],
            body,
        },
        row,
        1,
    )
}

/// Link the tree under a translation unit and run the analyzer
pub fn run_analysis(ast: &mut Ast, items: Vec<NodeId>) -> (NodeId, SymbolTable, Diagnostics) {
    let root = ast.add(NodeKind::TranslationUnit { items }, 1, 1);
    ast.link_parents(root);
    let mut st = SymbolTable::new();
    let diags = analyze(ast, root, &mut st, &Options::default());
    (root, st, diags)
}

pub fn error_messages(diags: &Diagnostics) -> Vec<String> {
    diags
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.message.clone())
        .collect()
}
