//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ecc project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// End-to-end emission scenarios: analyzed symbols flowing through an
// air program into assembly text
//

use crate::common::*;
use ecc::air::{Air, AirData, AirInsn, AirOp, AirOperand, AirRoutine};
use ecc::arch::x86_64::generate;
use ecc::ast::{Ast, NodeKind};
use ecc::symbol::{NamespaceClass, Symbol, SymbolTable};
use ecc::types::{CType, TypeClass};

fn render(air: &Air, ast: &Ast, st: &mut SymbolTable) -> String {
    let (mut file, diags) = generate(air, ast, st);
    assert_eq!(diags.count(false), 0);
    let mut buf = Vec::new();
    file.write(&mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn string_initialized_array_reaches_the_data_section() {
    // char s[] = "hi"; emitted through an air data item
    let mut ast = Ast::new();
    let char_spec = bts(&mut ast, ecc::ast::Bts::Char, 1);
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
    let (_, mut st, diags) = run_analysis(&mut ast, vec![decl]);
    assert_eq!(error_messages(&diags), Vec::<String>::new());

    let sy = st.get_by_declarer(s_id).unwrap();
    let air = Air {
        routines: vec![],
        data: vec![AirData {
            symbol: sy,
            data: st.get(sy).data.clone().unwrap(),
            relocations: vec![],
            readonly: false,
        }],
        rodata: vec![],
    };
    let text = render(&air, &ast, &mut st);
    assert!(text.contains("    .data"), "got:\n{}", text);
    assert!(text.contains("    .align 1"));
    assert!(text.contains("s:"));
    // 0x68 0x69 0x00 serialized as the largest aligned chunks
    assert!(text.contains("    .word 0x6968"));
    assert!(text.contains("    .byte 0x0"));
    assert!(!text.contains(".section .rodata"));
}

#[test]
fn stack_allocation_stays_16_byte_aligned() {
    // three automatic symbols of mixed size and alignment
    let mut ast = Ast::new();
    let body = ast.add(NodeKind::CompoundStatement { items: vec![] }, 1, 1);
    let tu = ast.add(NodeKind::TranslationUnit { items: vec![body] }, 1, 1);
    ast.link_parents(tu);

    let mut st = SymbolTable::new();
    let mut locals = Vec::new();
    for (name, class) in [
        ("a", TypeClass::Char),
        ("b", TypeClass::Double),
        ("c", TypeClass::Int),
    ] {
        let declarer = ast.add(
            NodeKind::Identifier {
                name: name.to_string(),
            },
            1,
            1,
        );
        let mut sym = Symbol::new(name, NamespaceClass::Ordinary, CType::basic(class));
        sym.declarer = Some(declarer);
        sym.scope = Some(body);
        locals.push(st.add(sym));
    }
    let f = st.add(Symbol::new(
        "f",
        NamespaceClass::Ordinary,
        CType::function(CType::basic(TypeClass::Int), Some(vec![]), false),
    ));
    let insns = locals
        .iter()
        .map(|&sy| {
            AirInsn::new(
                AirOp::Declare,
                st.get(sy).ctype.clone(),
                vec![AirOperand::Symbol(sy)],
            )
        })
        .collect();
    let air = Air {
        routines: vec![AirRoutine {
            symbol: f,
            insns,
            uses_varargs: false,
        }],
        data: vec![],
        rodata: vec![],
    };
    let text = render(&air, &ast, &mut st);
    // slots: char at -1, double aligned to -16, int at -20; rounded to 32
    assert_eq!(st.get(locals[0]).stack_offset, -1);
    assert_eq!(st.get(locals[1]).stack_offset, -16);
    assert_eq!(st.get(locals[2]).stack_offset, -20);
    assert!(text.contains("subq $32, %rsp"), "got:\n{}", text);
}

#[test]
fn relocated_pointer_data_emits_quad_with_label() {
    // int n; int *p = &n; emitted with the analyzer's relocation
    let mut ast = Ast::new();
    let int_spec1 = bts(&mut ast, ecc::ast::Bts::Int, 1);
    let (n_declr, n_id) = ident_declarator(&mut ast, "n", 1);
    let n_ideclr = init_declarator(&mut ast, n_declr, None, 1);
    let n_decl = declaration(&mut ast, vec![int_spec1], vec![n_ideclr], 1);

    let int_spec2 = bts(&mut ast, ecc::ast::Bts::Int, 2);
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

    let (_, mut st, diags) = run_analysis(&mut ast, vec![n_decl, p_decl]);
    assert_eq!(error_messages(&diags), Vec::<String>::new());

    let p_sy = st.get_by_declarer(p_id).unwrap();
    let _ = st.get_by_declarer(n_id).unwrap();
    let relocations = st
        .get(p_sy)
        .relocations
        .iter()
        .map(|r| ecc::air::AirReloc {
            data_location: r.data_location,
            symbol: Some(r.symbol),
        })
        .collect();
    let air = Air {
        routines: vec![],
        data: vec![AirData {
            symbol: p_sy,
            data: st.get(p_sy).data.clone().unwrap(),
            relocations,
            readonly: false,
        }],
        rodata: vec![],
    };
    let text = render(&air, &ast, &mut st);
    assert!(text.contains("p:"), "got:\n{}", text);
    assert!(text.contains("    .quad n"), "got:\n{}", text);
}
