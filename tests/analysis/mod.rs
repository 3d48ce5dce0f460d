//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ecc project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Semantic analysis scenarios
//

use crate::common::*;
use ecc::ast::{Ast, BinaryOp, Bts, NodeKind, StorageClass};
use ecc::types::TypeClass;

#[test]
fn register_object_address_is_rejected() {
    // register int r; &r;
    let mut ast = Ast::new();
    let reg = scs(&mut ast, StorageClass::Register, 1);
    let int_spec = bts(&mut ast, Bts::Int, 1);
    let (declr, _) = ident_declarator(&mut ast, "r", 1);
    let ideclr = init_declarator(&mut ast, declr, None, 1);
    let decl = declaration(&mut ast, vec![reg, int_spec], vec![ideclr], 1);

    let use_r = ident(&mut ast, "r", 2);
    let addr = ast.add(NodeKind::Reference { operand: use_r }, 2, 1);
    let stmt = ast.add(NodeKind::ExpressionStatement { expr: Some(addr) }, 2, 1);

    let fdef = function_definition(&mut ast, "f", vec![decl, stmt], 1);
    let (_, _, diags) = run_analysis(&mut ast, vec![fdef]);

    let errors = error_messages(&diags);
    assert!(
        errors.iter().any(|m| m.contains(
            "cannot request address of an object declared with the 'register' storage class specifier"
        )),
        "errors: {:?}",
        errors
    );
}

#[test]
fn taking_the_address_through_a_subscript_is_fine() {
    // register int r; int a[2]; &a[r];  -- r is not used as an lvalue
    let mut ast = Ast::new();
    let reg = scs(&mut ast, StorageClass::Register, 1);
    let int_spec1 = bts(&mut ast, Bts::Int, 1);
    let (r_declr, _) = ident_declarator(&mut ast, "r", 1);
    let r_ideclr = init_declarator(&mut ast, r_declr, None, 1);
    let r_decl = declaration(&mut ast, vec![reg, int_spec1], vec![r_ideclr], 1);

    let int_spec2 = bts(&mut ast, Bts::Int, 2);
    let (a_inner, _) = ident_declarator(&mut ast, "a", 2);
    let two = int_const(&mut ast, 2, 2);
    let a_declr = ast.add(
        NodeKind::ArrayDeclarator {
            inner: a_inner,
            length: Some(two),
        },
        2,
        1,
    );
    let a_ideclr = init_declarator(&mut ast, a_declr, None, 2);
    let a_decl = declaration(&mut ast, vec![int_spec2], vec![a_ideclr], 2);

    let use_a = ident(&mut ast, "a", 3);
    let use_r = ident(&mut ast, "r", 3);
    let subscript = ast.add(
        NodeKind::Subscript {
            base: use_a,
            index: use_r,
        },
        3,
        1,
    );
    let addr = ast.add(NodeKind::Reference { operand: subscript }, 3, 1);
    let stmt = ast.add(NodeKind::ExpressionStatement { expr: Some(addr) }, 3, 1);

    let fdef = function_definition(&mut ast, "f", vec![r_decl, a_decl, stmt], 1);
    let (_, _, diags) = run_analysis(&mut ast, vec![fdef]);
    assert_eq!(error_messages(&diags), Vec::<String>::new());
}

#[test]
fn duplicate_case_values_are_diagnosed() {
    // switch (x) { case 1: case 1: ; }
    let mut ast = Ast::new();
    let int_spec = bts(&mut ast, Bts::Int, 1);
    let (x_declr, _) = ident_declarator(&mut ast, "x", 1);
    let x_ideclr = init_declarator(&mut ast, x_declr, None, 1);
    let x_decl = declaration(&mut ast, vec![int_spec], vec![x_ideclr], 1);

    let empty = ast.add(NodeKind::ExpressionStatement { expr: None }, 4, 1);
    let case1_expr = int_const(&mut ast, 1, 4);
    let inner_case = ast.add(
        NodeKind::LabeledStatement {
            label: None,
            case_expr: Some(case1_expr),
            is_default: false,
            stmt: empty,
        },
        4,
        1,
    );
    let case0_expr = int_const(&mut ast, 1, 3);
    let outer_case = ast.add(
        NodeKind::LabeledStatement {
            label: None,
            case_expr: Some(case0_expr),
            is_default: false,
            stmt: inner_case,
        },
        3,
        1,
    );
    let body = ast.add(NodeKind::CompoundStatement { items: vec![outer_case] }, 2, 1);
    let cond = ident(&mut ast, "x", 2);
    let switch = ast.add(
        NodeKind::SwitchStatement {
            condition: cond,
            body,
        },
        2,
        1,
    );

    let fdef = function_definition(&mut ast, "f", vec![x_decl, switch], 1);
    let (_, _, diags) = run_analysis(&mut ast, vec![fdef]);
    let errors = error_messages(&diags);
    assert!(
        errors
            .iter()
            .any(|m| m == "case statement on line 3 has expression with the same value"),
        "errors: {:?}",
        errors
    );
}

#[test]
fn multiple_defaults_are_diagnosed() {
    let mut ast = Ast::new();
    let int_spec = bts(&mut ast, Bts::Int, 1);
    let (x_declr, _) = ident_declarator(&mut ast, "x", 1);
    let x_ideclr = init_declarator(&mut ast, x_declr, None, 1);
    let x_decl = declaration(&mut ast, vec![int_spec], vec![x_ideclr], 1);

    let empty = ast.add(NodeKind::ExpressionStatement { expr: None }, 4, 1);
    let inner_default = ast.add(
        NodeKind::LabeledStatement {
            label: None,
            case_expr: None,
            is_default: true,
            stmt: empty,
        },
        4,
        1,
    );
    let outer_default = ast.add(
        NodeKind::LabeledStatement {
            label: None,
            case_expr: None,
            is_default: true,
            stmt: inner_default,
        },
        3,
        1,
    );
    let body = ast.add(
        NodeKind::CompoundStatement {
            items: vec![outer_default],
        },
        2,
        1,
    );
    let cond = ident(&mut ast, "x", 2);
    let switch = ast.add(
        NodeKind::SwitchStatement {
            condition: cond,
            body,
        },
        2,
        1,
    );

    let fdef = function_definition(&mut ast, "f", vec![x_decl, switch], 1);
    let (_, _, diags) = run_analysis(&mut ast, vec![fdef]);
    let errors = error_messages(&diags);
    assert!(
        errors
            .iter()
            .any(|m| m == "multiple default cases are not allowed within a switch statement"),
        "errors: {:?}",
        errors
    );
}

#[test]
fn null_pointer_conditional_types_as_pointer() {
    // int cond; int n; int *p = cond ? 0 : &n;
    let mut ast = Ast::new();
    let int_spec1 = bts(&mut ast, Bts::Int, 1);
    let (cond_declr, _) = ident_declarator(&mut ast, "cond", 1);
    let cond_ideclr = init_declarator(&mut ast, cond_declr, None, 1);
    let cond_decl = declaration(&mut ast, vec![int_spec1], vec![cond_ideclr], 1);

    let int_spec2 = bts(&mut ast, Bts::Int, 2);
    let (n_declr, _) = ident_declarator(&mut ast, "n", 2);
    let n_ideclr = init_declarator(&mut ast, n_declr, None, 2);
    let n_decl = declaration(&mut ast, vec![int_spec2], vec![n_ideclr], 2);

    let int_spec3 = bts(&mut ast, Bts::Int, 3);
    let (p_inner, _) = ident_declarator(&mut ast, "p", 3);
    let p_declr = ast.add(
        NodeKind::PointerDeclarator {
            qualifiers: Default::default(),
            inner: p_inner,
        },
        3,
        1,
    );
    let use_cond = ident(&mut ast, "cond", 3);
    let zero = int_const(&mut ast, 0, 3);
    let use_n = ident(&mut ast, "n", 3);
    let addr_n = ast.add(NodeKind::Reference { operand: use_n }, 3, 1);
    let conditional = ast.add(
        NodeKind::Conditional {
            condition: use_cond,
            then_expr: zero,
            else_expr: addr_n,
        },
        3,
        1,
    );
    let p_ideclr = init_declarator(&mut ast, p_declr, Some(conditional), 3);
    let p_decl = declaration(&mut ast, vec![int_spec3], vec![p_ideclr], 3);

    let fdef = function_definition(&mut ast, "f", vec![cond_decl, n_decl, p_decl], 1);
    let (_, _, diags) = run_analysis(&mut ast, vec![fdef]);
    assert_eq!(error_messages(&diags), Vec::<String>::new());

    let ct = ast.node(conditional).ctype.clone().unwrap();
    assert_eq!(ct.class, TypeClass::Pointer);
    assert_eq!(ct.pointee().class, TypeClass::Int);
}

#[test]
fn conditional_of_integers_uses_uac() {
    // int a; unsigned int b; a ? a : b  has type unsigned int
    let mut ast = Ast::new();
    let int_spec = bts(&mut ast, Bts::Int, 1);
    let (a_declr, _) = ident_declarator(&mut ast, "a", 1);
    let a_ideclr = init_declarator(&mut ast, a_declr, None, 1);
    let a_decl = declaration(&mut ast, vec![int_spec], vec![a_ideclr], 1);

    let unsigned_spec = bts(&mut ast, Bts::Unsigned, 2);
    let int_spec2 = bts(&mut ast, Bts::Int, 2);
    let (b_declr, _) = ident_declarator(&mut ast, "b", 2);
    let b_ideclr = init_declarator(&mut ast, b_declr, None, 2);
    let b_decl = declaration(&mut ast, vec![unsigned_spec, int_spec2], vec![b_ideclr], 2);

    let c = ident(&mut ast, "a", 3);
    let t = ident(&mut ast, "a", 3);
    let e = ident(&mut ast, "b", 3);
    let conditional = ast.add(
        NodeKind::Conditional {
            condition: c,
            then_expr: t,
            else_expr: e,
        },
        3,
        1,
    );
    let stmt = ast.add(
        NodeKind::ExpressionStatement {
            expr: Some(conditional),
        },
        3,
        1,
    );

    let fdef = function_definition(&mut ast, "f", vec![a_decl, b_decl, stmt], 1);
    let (_, _, diags) = run_analysis(&mut ast, vec![fdef]);
    assert_eq!(error_messages(&diags), Vec::<String>::new());
    assert_eq!(
        ast.node(conditional).ctype.as_ref().unwrap().class,
        TypeClass::UnsignedInt
    );
}

#[test]
fn assignment_between_identical_types_is_accepted() {
    // int x; int y; x = y;
    let mut ast = Ast::new();
    let int_spec1 = bts(&mut ast, Bts::Int, 1);
    let (x_declr, _) = ident_declarator(&mut ast, "x", 1);
    let x_ideclr = init_declarator(&mut ast, x_declr, None, 1);
    let x_decl = declaration(&mut ast, vec![int_spec1], vec![x_ideclr], 1);

    let int_spec2 = bts(&mut ast, Bts::Int, 2);
    let (y_declr, _) = ident_declarator(&mut ast, "y", 2);
    let y_ideclr = init_declarator(&mut ast, y_declr, None, 2);
    let y_decl = declaration(&mut ast, vec![int_spec2], vec![y_ideclr], 2);

    let lhs = ident(&mut ast, "x", 3);
    let rhs = ident(&mut ast, "y", 3);
    let assign = ast.add(
        NodeKind::Assignment {
            op: None,
            lhs,
            rhs,
        },
        3,
        1,
    );
    let stmt = ast.add(NodeKind::ExpressionStatement { expr: Some(assign) }, 3, 1);

    let fdef = function_definition(&mut ast, "f", vec![x_decl, y_decl, stmt], 1);
    let (_, _, diags) = run_analysis(&mut ast, vec![fdef]);
    assert_eq!(error_messages(&diags), Vec::<String>::new());
    assert_eq!(
        ast.node(assign).ctype.as_ref().unwrap().class,
        TypeClass::Int
    );
}

#[test]
fn undefined_identifier_is_diagnosed_and_typed_error() {
    let mut ast = Ast::new();
    let use_x = ident(&mut ast, "mystery", 2);
    let stmt = ast.add(NodeKind::ExpressionStatement { expr: Some(use_x) }, 2, 1);
    let fdef = function_definition(&mut ast, "f", vec![stmt], 1);
    let (_, _, diags) = run_analysis(&mut ast, vec![fdef]);
    let errors = error_messages(&diags);
    assert!(
        errors
            .iter()
            .any(|m| m == "symbol 'mystery' is not defined in the given context"),
        "errors: {:?}",
        errors
    );
    assert_eq!(
        ast.node(use_x).ctype.as_ref().unwrap().class,
        TypeClass::Error
    );
}

#[test]
fn every_expression_node_is_typed_after_analysis() {
    // int a; a + (a ? 1 : 2) * -a;
    let mut ast = Ast::new();
    let int_spec = bts(&mut ast, Bts::Int, 1);
    let (a_declr, _) = ident_declarator(&mut ast, "a", 1);
    let a_ideclr = init_declarator(&mut ast, a_declr, None, 1);
    let a_decl = declaration(&mut ast, vec![int_spec], vec![a_ideclr], 1);

    let a1 = ident(&mut ast, "a", 2);
    let a2 = ident(&mut ast, "a", 2);
    let one = int_const(&mut ast, 1, 2);
    let two = int_const(&mut ast, 2, 2);
    let conditional = ast.add(
        NodeKind::Conditional {
            condition: a2,
            then_expr: one,
            else_expr: two,
        },
        2,
        1,
    );
    let a3 = ident(&mut ast, "a", 2);
    let neg = ast.add(NodeKind::UnaryMinus { operand: a3 }, 2, 1);
    let mul = ast.add(
        NodeKind::Binary {
            op: BinaryOp::Multiply,
            lhs: conditional,
            rhs: neg,
        },
        2,
        1,
    );
    let add = ast.add(
        NodeKind::Binary {
            op: BinaryOp::Add,
            lhs: a1,
            rhs: mul,
        },
        2,
        1,
    );
    let stmt = ast.add(NodeKind::ExpressionStatement { expr: Some(add) }, 2, 1);
    let fdef = function_definition(&mut ast, "f", vec![a_decl, stmt], 1);
    let (_, _, diags) = run_analysis(&mut ast, vec![fdef]);
    assert_eq!(error_messages(&diags), Vec::<String>::new());

    for expr in [a1, a2, a3, one, two, conditional, neg, mul, add] {
        assert!(
            ast.node(expr).ctype.is_some(),
            "expression {:?} left untyped",
            expr
        );
    }
}

#[test]
fn break_outside_loop_is_diagnosed() {
    let mut ast = Ast::new();
    let brk = ast.add(NodeKind::Break, 2, 1);
    let fdef = function_definition(&mut ast, "f", vec![brk], 1);
    let (_, _, diags) = run_analysis(&mut ast, vec![fdef]);
    let errors = error_messages(&diags);
    assert!(
        errors
            .iter()
            .any(|m| m == "break statements are only allowed within loops and switch statements"),
        "errors: {:?}",
        errors
    );
}

#[test]
fn register_warning_is_emitted() {
    let mut ast = Ast::new();
    let reg = scs(&mut ast, StorageClass::Register, 1);
    let int_spec = bts(&mut ast, Bts::Int, 1);
    let (declr, _) = ident_declarator(&mut ast, "r", 1);
    let ideclr = init_declarator(&mut ast, declr, None, 1);
    let decl = declaration(&mut ast, vec![reg, int_spec], vec![ideclr], 1);
    let fdef = function_definition(&mut ast, "f", vec![decl], 1);
    let (_, _, diags) = run_analysis(&mut ast, vec![fdef]);
    assert!(diags
        .iter()
        .any(|d| d.message.contains("will not prioritize an object to remain in a register")));
}
