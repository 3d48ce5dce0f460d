//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ecc project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Initializer elaboration and static materialization scenarios
//

use crate::common::*;
use ecc::ast::{Ast, Bts, NodeKind};
use ecc::types::TypeClass;

#[test]
fn unsized_char_array_takes_string_length() {
    // char s[] = "hi";
    let mut ast = Ast::new();
    let char_spec = bts(&mut ast, Bts::Char, 1);
    let (inner, s_id) = ident_declarator(&mut ast, "s", 1);
    let declr = ast.add(
        NodeKind::ArrayDeclarator {
            inner,
            length: None,
        },
        1,
        1,
    );
    let strlit = ast.add(
        NodeKind::StringLiteral {
            bytes: Some(b"hi\0".to_vec()),
            wide: None,
        },
        1,
        1,
    );
    let ideclr = init_declarator(&mut ast, declr, Some(strlit), 1);
    let decl = declaration(&mut ast, vec![char_spec], vec![ideclr], 1);
    let (_, st, diags) = run_analysis(&mut ast, vec![decl]);
    assert_eq!(error_messages(&diags), Vec::<String>::new());

    let sy = st.get_by_declarer(s_id).expect("s has a symbol");
    let ct = &st.get(sy).ctype;
    assert_eq!(ct.class, TypeClass::Array);
    assert_eq!(ct.array_length(), 3);
    assert_eq!(ct.pointee().class, TypeClass::Char);

    assert_eq!(st.get(sy).data.as_deref(), Some(&[0x68u8, 0x69, 0x00][..]));
    assert!(st.get(sy).relocations.is_empty());
}

#[test]
fn designated_struct_initializer_offsets() {
    // struct { int a, b, c; } x = { .b = 7 };
    let mut ast = Ast::new();
    let int_spec = bts(&mut ast, Bts::Int, 1);
    let mut declarators = Vec::new();
    for name in ["a", "b", "c"] {
        let (d, _) = ident_declarator(&mut ast, name, 1);
        declarators.push(ast.add(
            NodeKind::StructDeclarator {
                declarator: Some(d),
                bits: None,
            },
            1,
            1,
        ));
    }
    let sdecl = ast.add(
        NodeKind::StructDeclaration {
            specifiers: vec![int_spec],
            declarators,
        },
        1,
        1,
    );
    let sus = ast.add(
        NodeKind::StructUnionSpecifier {
            is_union: false,
            id: None,
            declarations: Some(vec![sdecl]),
        },
        1,
        1,
    );

    let desig_id = ident(&mut ast, "b", 2);
    let desig = ast.add(
        NodeKind::Designation {
            designators: vec![desig_id],
        },
        2,
        1,
    );
    let seven = int_const(&mut ast, 7, 2);
    let inlist = ast.add(
        NodeKind::InitializerList {
            designations: vec![Some(desig)],
            initializers: vec![seven],
        },
        2,
        1,
    );
    let (x_declr, x_id) = ident_declarator(&mut ast, "x", 2);
    let ideclr = init_declarator(&mut ast, x_declr, Some(inlist), 2);
    let decl = declaration(&mut ast, vec![sus], vec![ideclr], 2);
    let (_, st, diags) = run_analysis(&mut ast, vec![decl]);
    assert_eq!(error_messages(&diags), Vec::<String>::new());

    let sy = st.get_by_declarer(x_id).expect("x has a symbol");
    let ct = &st.get(sy).ctype;
    assert_eq!(ct.size(), 12);
    assert_eq!(ct.alignment(), 4);

    // the single element landed at offset 4
    assert_eq!(ast.node(seven).init_offset, Some(4));
    let data = st.get(sy).data.as_deref().unwrap();
    assert_eq!(data.len(), 12);
    assert_eq!(&data[0..4], &[0, 0, 0, 0]);
    assert_eq!(&data[4..8], &[7, 0, 0, 0]);
    assert_eq!(&data[8..12], &[0, 0, 0, 0]);
}

#[test]
fn sequential_offsets_match_member_walk() {
    // struct { char c; int i; } y = { 1, 2 };
    let mut ast = Ast::new();
    let char_spec = bts(&mut ast, Bts::Char, 1);
    let (c_declr, _) = ident_declarator(&mut ast, "c", 1);
    let c_sdeclr = ast.add(
        NodeKind::StructDeclarator {
            declarator: Some(c_declr),
            bits: None,
        },
        1,
        1,
    );
    let c_sdecl = ast.add(
        NodeKind::StructDeclaration {
            specifiers: vec![char_spec],
            declarators: vec![c_sdeclr],
        },
        1,
        1,
    );
    let int_spec = bts(&mut ast, Bts::Int, 1);
    let (i_declr, _) = ident_declarator(&mut ast, "i", 1);
    let i_sdeclr = ast.add(
        NodeKind::StructDeclarator {
            declarator: Some(i_declr),
            bits: None,
        },
        1,
        1,
    );
    let i_sdecl = ast.add(
        NodeKind::StructDeclaration {
            specifiers: vec![int_spec],
            declarators: vec![i_sdeclr],
        },
        1,
        1,
    );
    let sus = ast.add(
        NodeKind::StructUnionSpecifier {
            is_union: false,
            id: None,
            declarations: Some(vec![c_sdecl, i_sdecl]),
        },
        1,
        1,
    );

    let one = int_const(&mut ast, 1, 2);
    let two = int_const(&mut ast, 2, 2);
    let inlist = ast.add(
        NodeKind::InitializerList {
            designations: vec![None, None],
            initializers: vec![one, two],
        },
        2,
        1,
    );
    let (y_declr, y_id) = ident_declarator(&mut ast, "y", 2);
    let ideclr = init_declarator(&mut ast, y_declr, Some(inlist), 2);
    let decl = declaration(&mut ast, vec![sus], vec![ideclr], 2);
    let (_, st, diags) = run_analysis(&mut ast, vec![decl]);
    assert_eq!(error_messages(&diags), Vec::<String>::new());

    // char at 0, int padded to its alignment
    assert_eq!(ast.node(one).init_offset, Some(0));
    assert_eq!(ast.node(two).init_offset, Some(4));

    let sy = st.get_by_declarer(y_id).unwrap();
    let data = st.get(sy).data.as_deref().unwrap();
    assert_eq!(data[0], 1);
    assert_eq!(&data[4..8], &[2, 0, 0, 0]);
}

#[test]
fn unsized_int_array_length_from_list() {
    // int v[] = { 10, 20, 30 };
    let mut ast = Ast::new();
    let int_spec = bts(&mut ast, Bts::Int, 1);
    let (inner, v_id) = ident_declarator(&mut ast, "v", 1);
    let declr = ast.add(
        NodeKind::ArrayDeclarator {
            inner,
            length: None,
        },
        1,
        1,
    );
    let elems: Vec<_> = [10u64, 20, 30]
        .iter()
        .map(|&v| int_const(&mut ast, v, 1))
        .collect();
    let inlist = ast.add(
        NodeKind::InitializerList {
            designations: vec![None; 3],
            initializers: elems.clone(),
        },
        1,
        1,
    );
    let ideclr = init_declarator(&mut ast, declr, Some(inlist), 1);
    let decl = declaration(&mut ast, vec![int_spec], vec![ideclr], 1);
    let (_, st, diags) = run_analysis(&mut ast, vec![decl]);
    assert_eq!(error_messages(&diags), Vec::<String>::new());

    let sy = st.get_by_declarer(v_id).unwrap();
    assert_eq!(st.get(sy).ctype.array_length(), 3);
    assert_eq!(ast.node(elems[0]).init_offset, Some(0));
    assert_eq!(ast.node(elems[1]).init_offset, Some(4));
    assert_eq!(ast.node(elems[2]).init_offset, Some(8));
    let data = st.get(sy).data.as_deref().unwrap();
    assert_eq!(&data[0..4], &[10, 0, 0, 0]);
    assert_eq!(&data[4..8], &[20, 0, 0, 0]);
    assert_eq!(&data[8..12], &[30, 0, 0, 0]);
}

#[test]
fn address_constant_initializer_records_relocation() {
    // int n; int *p = &n;  (file scope)
    let mut ast = Ast::new();
    let int_spec1 = bts(&mut ast, Bts::Int, 1);
    let (n_declr, n_id) = ident_declarator(&mut ast, "n", 1);
    let n_ideclr = init_declarator(&mut ast, n_declr, None, 1);
    let n_decl = declaration(&mut ast, vec![int_spec1], vec![n_ideclr], 1);

    let int_spec2 = bts(&mut ast, Bts::Int, 2);
    let (p_inner, p_id) = ident_declarator(&mut ast, "p", 2);
    let p_declr = ast.add(
        NodeKind::PointerDeclarator {
            qualifiers: Default::default(),
            inner: p_inner,
        },
        2,
        1,
    );
    let use_n = ident(&mut ast, "n", 2);
    let addr = ast.add(NodeKind::Reference { operand: use_n }, 2, 1);
    let p_ideclr = init_declarator(&mut ast, p_declr, Some(addr), 2);
    let p_decl = declaration(&mut ast, vec![int_spec2], vec![p_ideclr], 2);

    let (_, st, diags) = run_analysis(&mut ast, vec![n_decl, p_decl]);
    assert_eq!(error_messages(&diags), Vec::<String>::new());

    let p_sy = st.get_by_declarer(p_id).unwrap();
    let n_sy = st.get_by_declarer(n_id).unwrap();
    let sym = st.get(p_sy);
    assert_eq!(sym.relocations.len(), 1);
    assert_eq!(sym.relocations[0].data_location, 0);
    assert_eq!(sym.relocations[0].symbol, n_sy);
    // the in-place addend is zero
    assert_eq!(sym.data.as_deref(), Some(&[0u8; 8][..]));
}
