//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ecc project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// x86-64 code generation: air -> assembly
//
// The emitter treats its inputs as preconditioned by the analyzer and
// the air builder: a missing or mistyped operand is an internal error,
// reported and skipped. Stack slots are assigned on first use of an
// automatic symbol, growing downward with alignment padding; the final
// allocation is rounded up to 16 bytes by the routine writer.
//

use crate::air::{Air, AirData, AirInsn, AirOp, AirOperand, AirRoutine, INVALID_VREG};
use crate::arch::x86_64::lir::{
    AsmData, AsmFile, AsmReloc, AsmRoutine, Insn, InsnKind, Operand, OperandSize, Reg,
};
use crate::ast::Ast;
use crate::diag::Diagnostics;
use crate::symbol::{Linkage, NamespaceClass, StorageDuration, Symbol, SymbolTable};
use crate::types::{CType, TypeClass};

// ============================================================================
// Entry point
// ============================================================================

/// Translate an air program into an assembly file
pub fn generate(air: &Air, ast: &Ast, st: &mut SymbolTable) -> (AsmFile, Diagnostics) {
    let mut gen = Generator {
        ast,
        st,
        diags: Diagnostics::new(),
    };
    let mut file = AsmFile::new();
    for routine in &air.routines {
        let emitted = gen.gen_routine(routine, &mut file);
        file.routines.push(emitted);
    }
    for data in &air.data {
        if let Some(emitted) = gen.gen_data(data) {
            file.data.push(emitted);
        }
    }
    for rodata in &air.rodata {
        if let Some(emitted) = gen.gen_data(rodata) {
            file.rodata.push(emitted);
        }
    }
    (file, gen.diags)
}

struct Generator<'a> {
    ast: &'a Ast,
    st: &'a mut SymbolTable,
    diags: Diagnostics,
}

impl<'a> Generator<'a> {
    fn internal(&mut self, message: &str) {
        self.diags.error(0, 0, format!("internal: {}", message));
    }

    fn ct_size(ct: &CType) -> OperandSize {
        OperandSize::from_bytes(ct.size())
    }

    // ========================================================================
    // Operand mapping
    // ========================================================================

    fn reg(&mut self, id: u32) -> Option<Reg> {
        let reg = Reg::from_id(id);
        if reg.is_none() {
            self.internal("air operand names an unknown register");
        }
        reg
    }

    fn operand(&mut self, aop: &AirOperand, routine: &mut AsmRoutine) -> Option<Operand> {
        match aop {
            AirOperand::Register { reg, .. } => Some(Operand::register(self.reg(*reg)?)),
            AirOperand::IndirectRegister {
                reg,
                roffset,
                factor,
                offset,
                ..
            } => {
                if *roffset != INVALID_VREG || *factor != 1 {
                    let index = if *roffset != INVALID_VREG {
                        Some(self.reg(*roffset)?)
                    } else {
                        None
                    };
                    Some(Operand::IndexedMem {
                        base: Some(self.reg(*reg)?),
                        index,
                        scale: *factor,
                        offset: *offset,
                    })
                } else {
                    Some(Operand::DerefRegister {
                        reg: self.reg(*reg)?,
                        offset: *offset,
                    })
                }
            }
            AirOperand::IntegerConstant(value) => Some(Operand::Immediate(*value)),
            AirOperand::Symbol(sy) => self.symbol_operand(*sy, 0, routine),
            AirOperand::IndirectSymbol { symbol, offset } => {
                self.symbol_operand(*symbol, *offset, routine)
            }
            AirOperand::Label { disambiguator, id } => {
                Some(Operand::Label(format!(".L{}{}", disambiguator, id)))
            }
            AirOperand::FloatingConstant(_) | AirOperand::Type(_) => {
                self.internal("air operand kind should have been resolved by an earlier pass");
                None
            }
        }
    }

    fn symbol_operand(
        &mut self,
        sy: crate::symbol::SymbolId,
        offset: i64,
        routine: &mut AsmRoutine,
    ) -> Option<Operand> {
        // static duration: refer by label, RIP-relative
        if self.st.storage_duration(self.ast, sy) == StorageDuration::Static {
            let label = if self.st.requires_disambiguation(self.ast, sy) {
                self.st.disambiguated_name(sy)
            } else {
                self.st.get(sy).name.clone()
            };
            return Some(Operand::label_ref(label, offset));
        }
        // automatic: reuse or assign a stack offset
        let existing = self.st.get(sy).stack_offset;
        if existing != 0 {
            return Some(Operand::DerefRegister {
                reg: Reg::Rbp,
                offset: existing + offset,
            });
        }
        let ctype = &self.st.get(sy).ctype;
        let size = ctype.size().max(0);
        let alignment = ctype.alignment().max(1);
        let mut syoffset = routine.stackalloc;
        syoffset -= size;
        // pad downward to the symbol's alignment
        syoffset -= (alignment + (syoffset % alignment)) % alignment;
        routine.stackalloc = syoffset;
        self.st.get_mut(sy).stack_offset = syoffset;
        Some(Operand::DerefRegister {
            reg: Reg::Rbp,
            offset: syoffset + offset,
        })
    }

    fn operand_ct<'b>(&self, ainsn: &'b AirInsn, index: usize) -> Option<&'b CType> {
        ainsn.operand(index).and_then(|op| op.ctype())
    }

    // ========================================================================
    // Helper rodata symbols
    // ========================================================================

    /// 16-byte mask used by `ptest` to test an SSE value against zero
    fn sse_zero_checker(&mut self, class: TypeClass, file: &mut AsmFile) -> String {
        let is_float = class == TypeClass::Float;
        let cached = if is_float {
            &file.sse32_zero_checker
        } else {
            &file.sse64_zero_checker
        };
        if let Some(name) = cached {
            return name.clone();
        }
        let name = if is_float {
            "__sse32_zero_checker"
        } else {
            "__sse64_zero_checker"
        };
        let mut sym = Symbol::new(
            name,
            NamespaceClass::Ordinary,
            CType::array_of(CType::basic(TypeClass::UnsignedChar), Some(16)),
        );
        sym.sd_override = Some(StorageDuration::Static);
        self.st.add(sym);

        let mut bytes = vec![0u8; 16];
        let mask: u64 = if is_float { 0x7FFF_FFFF } else { 0x7FFF_FFFF_FFFF_FFFF };
        bytes[..8].copy_from_slice(&mask.to_le_bytes());
        file.rodata.push(AsmData {
            label: name.to_string(),
            alignment: 16,
            bytes,
            relocations: Vec::new(),
            readonly: true,
        });
        if is_float {
            file.sse32_zero_checker = Some(name.to_string());
        } else {
            file.sse64_zero_checker = Some(name.to_string());
        }
        name.to_string()
    }

    /// 2^63 as a float or double, for the SSE <-> u64 sequences
    fn sse_i64_limit(&mut self, class: TypeClass, file: &mut AsmFile) -> String {
        let is_float = class == TypeClass::Float;
        let cached = if is_float {
            &file.sse32_i64_limit
        } else {
            &file.sse64_i64_limit
        };
        if let Some(name) = cached {
            return name.clone();
        }
        let name = if is_float {
            "__sse32_i64_limit"
        } else {
            "__sse64_i64_limit"
        };
        let (ctype, bytes, alignment) = if is_float {
            (
                CType::basic(TypeClass::Float),
                9223372036854775808.0f32.to_le_bytes().to_vec(),
                4,
            )
        } else {
            (
                CType::basic(TypeClass::Double),
                9223372036854775808.0f64.to_le_bytes().to_vec(),
                8,
            )
        };
        let mut sym = Symbol::new(name, NamespaceClass::Ordinary, ctype);
        sym.sd_override = Some(StorageDuration::Static);
        self.st.add(sym);

        file.rodata.push(AsmData {
            label: name.to_string(),
            alignment,
            bytes,
            relocations: Vec::new(),
            readonly: true,
        });
        if is_float {
            file.sse32_i64_limit = Some(name.to_string());
        } else {
            file.sse64_i64_limit = Some(name.to_string());
        }
        name.to_string()
    }

    // ========================================================================
    // Instruction generators
    // ========================================================================

    fn gen_load(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        let kind = if ainsn.ct.is_integer() || ainsn.ct.class == TypeClass::Pointer {
            InsnKind::Mov
        } else if ainsn.ct.class == TypeClass::Float {
            InsnKind::Movss
        } else if ainsn.ct.class == TypeClass::Double {
            InsnKind::Movsd
        } else {
            self.internal("load of a type no move instruction exists for");
            return Vec::new();
        };
        let (Some(dst), Some(src)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("load is missing operands");
            return Vec::new();
        };
        let src = self.operand(src, routine);
        let dst = self.operand(dst, routine);
        match (src, dst) {
            (Some(src), Some(dst)) => {
                vec![Insn::binary(kind, Self::ct_size(&ainsn.ct), src, dst)]
            }
            _ => Vec::new(),
        }
    }

    fn gen_load_addr(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        let (Some(dst), Some(src)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("load-address is missing operands");
            return Vec::new();
        };
        let src = self.operand(src, routine);
        let dst = self.operand(dst, routine);
        match (src, dst) {
            (Some(src), Some(dst)) => vec![Insn::binary(InsnKind::Lea, OperandSize::Qword, src, dst)],
            _ => Vec::new(),
        }
    }

    fn gen_func_call(&mut self, ainsn: &AirInsn, _routine: &mut AsmRoutine) -> Vec<Insn> {
        let target = match ainsn.operand(1) {
            Some(AirOperand::Register { reg, .. }) => match Reg::from_id(*reg) {
                Some(reg) => Operand::PtrRegister(reg),
                None => {
                    self.internal("call through an unknown register");
                    return Vec::new();
                }
            },
            Some(AirOperand::Symbol(sy)) => Operand::Label(self.st.get(*sy).name.clone()),
            _ => {
                self.internal("call has no callable operand");
                return Vec::new();
            }
        };
        vec![Insn::unary(InsnKind::Call, OperandSize::Qword, target)]
    }

    fn gen_declare(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        // assigns the stack slot; emits nothing
        if let Some(op) = ainsn.operand(0) {
            let _ = self.operand(op, routine);
        }
        Vec::new()
    }

    fn gen_return(&mut self, routine: &mut AsmRoutine) -> Vec<Insn> {
        vec![Insn::unary(
            InsnKind::Jmp,
            OperandSize::Qword,
            Operand::Label(format!(".LR{}", routine.id)),
        )]
    }

    fn binary_op_kind(&mut self, ainsn: &AirInsn) -> Option<(InsnKind, InsnKind)> {
        use AirOp::*;
        let ct = &ainsn.ct;
        let direct = matches!(
            ainsn.op,
            DirectAdd
                | DirectSubtract
                | DirectMultiply
                | DirectAnd
                | DirectXor
                | DirectOr
                | DirectShiftLeft
                | DirectShiftRight
                | DirectSignedShiftRight
        );
        let base = |op: AirOp| -> AirOp {
            if !direct {
                return op;
            }
            match op {
                DirectAdd => Add,
                DirectSubtract => Subtract,
                DirectMultiply => Multiply,
                DirectAnd => And,
                DirectXor => Xor,
                DirectOr => Or,
                DirectShiftLeft => ShiftLeft,
                DirectShiftRight => ShiftRight,
                DirectSignedShiftRight => SignedShiftRight,
                other => other,
            }
        };
        let op = base(ainsn.op);
        let kind = if ct.class == TypeClass::Float {
            match op {
                Add => InsnKind::Addss,
                Subtract => InsnKind::Subss,
                Multiply => InsnKind::Mulss,
                Xor => InsnKind::Xorps,
                _ => return None,
            }
        } else if ct.class == TypeClass::Double {
            match op {
                Add => InsnKind::Addsd,
                Subtract => InsnKind::Subsd,
                Multiply => InsnKind::Mulsd,
                Xor => InsnKind::Xorpd,
                _ => return None,
            }
        } else if ct.is_signed_integer() || ct.class == TypeClass::Char {
            match op {
                Add => InsnKind::Add,
                Subtract => InsnKind::Sub,
                Multiply => InsnKind::Imul,
                And => InsnKind::And,
                Xor => InsnKind::Xor,
                Or => InsnKind::Or,
                ShiftLeft => InsnKind::Shl,
                ShiftRight => InsnKind::Shr,
                SignedShiftRight => InsnKind::Sar,
                _ => return None,
            }
        } else if ct.is_unsigned_integer() || ct.class == TypeClass::Pointer {
            match op {
                Add => InsnKind::Add,
                Subtract => InsnKind::Sub,
                And => InsnKind::And,
                Xor => InsnKind::Xor,
                Or => InsnKind::Or,
                ShiftLeft => InsnKind::Shl,
                ShiftRight => InsnKind::Shr,
                SignedShiftRight => InsnKind::Sar,
                _ => return None,
            }
        } else {
            return None;
        };
        let mov = if ct.class == TypeClass::Float {
            InsnKind::Movss
        } else if ct.class == TypeClass::Double {
            InsnKind::Movsd
        } else {
            InsnKind::Mov
        };
        Some((kind, mov))
    }

    /// dst = a OP b: apply the operation onto operand 1 and move the
    /// result into the destination unless it is already there
    fn gen_binary(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        let Some((kind, mov_kind)) = self.binary_op_kind(ainsn) else {
            self.internal("binary operator on an unsupported type");
            return Vec::new();
        };
        let size = Self::ct_size(&ainsn.ct);
        let (Some(dst), Some(acc), Some(src)) =
            (ainsn.operand(0), ainsn.operand(1), ainsn.operand(2))
        else {
            self.internal("binary operator is missing operands");
            return Vec::new();
        };
        let src = self.operand(src, routine);
        let acc = self.operand(acc, routine);
        let dst = self.operand(dst, routine);
        let (Some(src), Some(acc), Some(dst)) = (src, acc, dst) else {
            return Vec::new();
        };
        let mut out = vec![Insn::binary(kind, size, src, acc.clone())];
        if acc != dst {
            out.push(Insn::binary(mov_kind, size, acc, dst));
        }
        out
    }

    /// acc OP= b, no separate destination
    fn gen_direct_binary(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        let Some((kind, _)) = self.binary_op_kind(ainsn) else {
            self.internal("binary operator on an unsupported type");
            return Vec::new();
        };
        let (Some(acc), Some(src)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("binary operator is missing operands");
            return Vec::new();
        };
        let src = self.operand(src, routine);
        let acc = self.operand(acc, routine);
        match (src, acc) {
            (Some(src), Some(acc)) => {
                vec![Insn::binary(kind, Self::ct_size(&ainsn.ct), src, acc)]
            }
            _ => Vec::new(),
        }
    }

    /// Unsigned multiply uses the one-operand form with rax implicit
    fn gen_multiply(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        if !ainsn.ct.is_unsigned_integer() && ainsn.ct.class != TypeClass::Pointer {
            return self.gen_binary(ainsn, routine);
        }
        let size = Self::ct_size(&ainsn.ct);
        let (Some(dst), Some(acc), Some(src)) =
            (ainsn.operand(0), ainsn.operand(1), ainsn.operand(2))
        else {
            self.internal("multiply is missing operands");
            return Vec::new();
        };
        let src = self.operand(src, routine);
        let acc = self.operand(acc, routine);
        let dst = self.operand(dst, routine);
        let (Some(src), Some(acc), Some(dst)) = (src, acc, dst) else {
            return Vec::new();
        };
        vec![
            Insn::unary(InsnKind::Mul, size, src),
            Insn::binary(InsnKind::Mov, size, acc, dst),
        ]
    }

    fn gen_direct_multiply(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        if !ainsn.ct.is_unsigned_integer() && ainsn.ct.class != TypeClass::Pointer {
            return self.gen_direct_binary(ainsn, routine);
        }
        let Some(src) = ainsn.operand(1) else {
            self.internal("multiply is missing operands");
            return Vec::new();
        };
        match self.operand(src, routine) {
            Some(src) => vec![Insn::unary(InsnKind::Mul, Self::ct_size(&ainsn.ct), src)],
            None => Vec::new(),
        }
    }

    fn gen_divide(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        let size = Self::ct_size(&ainsn.ct);
        if ainsn.ct.is_sse_floating() {
            let is_float = ainsn.ct.class == TypeClass::Float;
            let (Some(dst), Some(acc), Some(src)) =
                (ainsn.operand(0), ainsn.operand(1), ainsn.operand(2))
            else {
                self.internal("divide is missing operands");
                return Vec::new();
            };
            let src = self.operand(src, routine);
            let acc = self.operand(acc, routine);
            let dst = self.operand(dst, routine);
            let (Some(src), Some(acc), Some(dst)) = (src, acc, dst) else {
                return Vec::new();
            };
            let mut out = vec![Insn::binary(
                if is_float { InsnKind::Divss } else { InsnKind::Divsd },
                size,
                src,
                acc.clone(),
            )];
            if acc != dst {
                out.push(Insn::binary(
                    if is_float { InsnKind::Movss } else { InsnKind::Movsd },
                    size,
                    acc,
                    dst,
                ));
            }
            return out;
        }
        if ainsn.ct.is_integer() {
            let kind = if ainsn.ct.is_signed_integer() {
                InsnKind::Idiv
            } else {
                InsnKind::Div
            };
            let Some(src) = ainsn.operand(2) else {
                self.internal("divide is missing operands");
                return Vec::new();
            };
            return match self.operand(src, routine) {
                Some(src) => vec![Insn::unary(kind, size, src)],
                None => Vec::new(),
            };
        }
        self.internal("divide on an unsupported type");
        Vec::new()
    }

    fn gen_direct_divide(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        let size = Self::ct_size(&ainsn.ct);
        if ainsn.ct.is_sse_floating() {
            let is_float = ainsn.ct.class == TypeClass::Float;
            let (Some(acc), Some(src)) = (ainsn.operand(0), ainsn.operand(1)) else {
                self.internal("divide is missing operands");
                return Vec::new();
            };
            let src = self.operand(src, routine);
            let acc = self.operand(acc, routine);
            return match (src, acc) {
                (Some(src), Some(acc)) => vec![Insn::binary(
                    if is_float { InsnKind::Divss } else { InsnKind::Divsd },
                    size,
                    src,
                    acc,
                )],
                _ => Vec::new(),
            };
        }
        if ainsn.ct.is_integer() {
            let kind = if ainsn.ct.is_signed_integer() {
                InsnKind::Idiv
            } else {
                InsnKind::Div
            };
            let Some(src) = ainsn.operand(1) else {
                self.internal("divide is missing operands");
                return Vec::new();
            };
            return match self.operand(src, routine) {
                Some(src) => vec![Insn::unary(kind, size, src)],
                None => Vec::new(),
            };
        }
        self.internal("divide on an unsupported type");
        Vec::new()
    }

    /// Logical NOT: compare against zero (`ptest` with a rodata mask
    /// for SSE values), then `sete`
    fn gen_not(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine, file: &mut AsmFile) -> Vec<Insn> {
        let opt = match self.operand_ct(ainsn, 1) {
            Some(ct) => ct.clone(),
            None => ainsn.ct.clone(),
        };
        let (Some(dst), Some(src)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("logical not is missing operands");
            return Vec::new();
        };
        let cmp = if opt.is_integer() || opt.class == TypeClass::Pointer {
            let src = self.operand(src, routine);
            match src {
                Some(src) => Insn::binary(
                    InsnKind::Cmp,
                    Self::ct_size(&opt),
                    Operand::Immediate(0),
                    src,
                ),
                None => return Vec::new(),
            }
        } else if opt.is_sse_floating() {
            let checker = self.sse_zero_checker(opt.class, file);
            let src = self.operand(src, routine);
            match src {
                Some(src) => Insn::binary(
                    InsnKind::Ptest,
                    Self::ct_size(&opt),
                    Operand::label_ref(checker, 0),
                    src,
                ),
                None => return Vec::new(),
            }
        } else {
            self.internal("logical not on an unsupported type");
            return Vec::new();
        };
        let dst = match self.operand(dst, routine) {
            Some(dst) => dst,
            None => return Vec::new(),
        };
        vec![cmp, Insn::unary(InsnKind::Sete, OperandSize::Byte, dst)]
    }

    fn gen_negate(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        if !ainsn.ct.is_integer() {
            // SSE negations are rewritten during localization
            self.internal("negate on an unsupported type");
            return Vec::new();
        }
        let size = Self::ct_size(&ainsn.ct);
        let (Some(dst), Some(acc)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("negate is missing operands");
            return Vec::new();
        };
        let acc = self.operand(acc, routine);
        let dst = self.operand(dst, routine);
        let (Some(acc), Some(dst)) = (acc, dst) else {
            return Vec::new();
        };
        let mut out = vec![Insn::unary(InsnKind::Neg, size, acc.clone())];
        if acc != dst {
            out.push(Insn::binary(InsnKind::Mov, size, acc, dst));
        }
        out
    }

    fn gen_posate(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        let kind = if ainsn.ct.class == TypeClass::Float {
            InsnKind::Movss
        } else if ainsn.ct.class == TypeClass::Double {
            InsnKind::Movsd
        } else if ainsn.ct.is_integer() {
            InsnKind::Mov
        } else {
            self.internal("unary plus on an unsupported type");
            return Vec::new();
        };
        let (Some(dst), Some(src)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("unary plus is missing operands");
            return Vec::new();
        };
        let src = self.operand(src, routine);
        let dst = self.operand(dst, routine);
        match (src, dst) {
            (Some(src), Some(dst)) => {
                vec![Insn::binary(kind, Self::ct_size(&ainsn.ct), src, dst)]
            }
            _ => Vec::new(),
        }
    }

    fn gen_complement(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        let size = Self::ct_size(&ainsn.ct);
        let (Some(dst), Some(acc)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("complement is missing operands");
            return Vec::new();
        };
        let acc = self.operand(acc, routine);
        let dst = self.operand(dst, routine);
        let (Some(acc), Some(dst)) = (acc, dst) else {
            return Vec::new();
        };
        let mut out = vec![Insn::unary(InsnKind::Not, size, acc.clone())];
        if acc != dst {
            out.push(Insn::binary(InsnKind::Mov, size, acc, dst));
        }
        out
    }

    fn gen_conditional_jump(
        &mut self,
        ainsn: &AirInsn,
        routine: &mut AsmRoutine,
        file: &mut AsmFile,
    ) -> Vec<Insn> {
        let kind = match ainsn.op {
            AirOp::Jz => InsnKind::Je,
            AirOp::Jnz => InsnKind::Jne,
            _ => unreachable!(),
        };
        let (Some(target), Some(value)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("conditional jump is missing operands");
            return Vec::new();
        };
        let cmp = if ainsn.ct.is_integer() {
            let value = self.operand(value, routine);
            match value {
                Some(value) => Insn::binary(
                    InsnKind::Cmp,
                    Self::ct_size(&ainsn.ct),
                    Operand::Immediate(0),
                    value,
                ),
                None => return Vec::new(),
            }
        } else if ainsn.ct.is_sse_floating() {
            let checker = self.sse_zero_checker(ainsn.ct.class, file);
            let value = self.operand(value, routine);
            match value {
                Some(value) => Insn::binary(
                    InsnKind::Ptest,
                    Self::ct_size(&ainsn.ct),
                    Operand::label_ref(checker, 0),
                    value,
                ),
                None => return Vec::new(),
            }
        } else {
            self.internal("conditional jump on an unsupported type");
            return Vec::new();
        };
        let target = match self.operand(target, routine) {
            Some(target) => target,
            None => return Vec::new(),
        };
        vec![cmp, Insn::unary(kind, OperandSize::Qword, target)]
    }

    fn gen_simple_jump(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine, kind: InsnKind) -> Vec<Insn> {
        let Some(op) = ainsn.operand(0) else {
            self.internal("jump or label is missing its operand");
            return Vec::new();
        };
        match self.operand(op, routine) {
            Some(op) => vec![Insn::unary(kind, OperandSize::Qword, op)],
            None => Vec::new(),
        }
    }

    /// Relational and integer equality: compare then set. SSE `<` and
    /// `<=` swap operands and use the above/not-below conditions so
    /// unordered compares to false.
    fn gen_relational(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        let Some(opt) = self.operand_ct(ainsn, 1).cloned() else {
            self.internal("comparison has untyped operands");
            return Vec::new();
        };
        let opt_sse = opt.is_sse_floating();
        let set = match ainsn.op {
            AirOp::LessEqual => {
                if opt_sse {
                    InsnKind::Setnb
                } else {
                    InsnKind::Setle
                }
            }
            AirOp::Less => {
                if opt_sse {
                    InsnKind::Seta
                } else {
                    InsnKind::Setl
                }
            }
            AirOp::GreaterEqual => {
                if opt_sse {
                    InsnKind::Setnb
                } else {
                    InsnKind::Setge
                }
            }
            AirOp::Greater => {
                if opt_sse {
                    InsnKind::Seta
                } else {
                    InsnKind::Setg
                }
            }
            AirOp::Equal => InsnKind::Sete,
            AirOp::Inequal => InsnKind::Setne,
            _ => unreachable!(),
        };
        let cmp_kind = if opt.is_integer() {
            InsnKind::Cmp
        } else if opt_sse {
            if opt.class == TypeClass::Float {
                InsnKind::Comiss
            } else {
                InsnKind::Comisd
            }
        } else {
            self.internal("comparison on an unsupported type");
            return Vec::new();
        };
        let (Some(dst), Some(lhs), Some(rhs)) =
            (ainsn.operand(0), ainsn.operand(1), ainsn.operand(2))
        else {
            self.internal("comparison is missing operands");
            return Vec::new();
        };
        let flip = opt_sse && matches!(ainsn.op, AirOp::Less | AirOp::LessEqual);
        let (first, second) = if flip { (lhs, rhs) } else { (rhs, lhs) };
        let first = self.operand(first, routine);
        let second = self.operand(second, routine);
        let dst = self.operand(dst, routine);
        let (Some(first), Some(second), Some(dst)) = (first, second, dst) else {
            return Vec::new();
        };
        vec![
            Insn::binary(cmp_kind, Self::ct_size(&ainsn.ct), first, second),
            Insn::unary(set, OperandSize::Byte, dst),
        ]
    }

    /// SSE equality honors NaN: `ucomis?` raises parity on unordered
    /// operands, so take the parity-corrected set and branch around a
    /// corrective move
    fn gen_sse_equality(
        &mut self,
        ainsn: &AirInsn,
        routine: &mut AsmRoutine,
        file: &mut AsmFile,
    ) -> Vec<Insn> {
        let eq = ainsn.op == AirOp::Equal;
        let Some(opt) = self.operand_ct(ainsn, 1).cloned() else {
            self.internal("comparison has untyped operands");
            return Vec::new();
        };
        let is_float = opt.class == TypeClass::Float;
        let ucomi = if is_float {
            InsnKind::Ucomiss
        } else {
            InsnKind::Ucomisd
        };
        let (Some(dst), Some(lhs), Some(rhs)) =
            (ainsn.operand(0), ainsn.operand(1), ainsn.operand(2))
        else {
            self.internal("comparison is missing operands");
            return Vec::new();
        };
        let rhs1 = self.operand(rhs, routine);
        let lhs1 = self.operand(lhs, routine);
        let dst1 = self.operand(dst, routine);
        let rhs2 = self.operand(rhs, routine);
        let lhs2 = self.operand(lhs, routine);
        let dst2 = self.operand(dst, routine);
        let (Some(rhs1), Some(lhs1), Some(dst1), Some(rhs2), Some(lhs2), Some(dst2)) =
            (rhs1, lhs1, dst1, rhs2, lhs2, dst2)
        else {
            return Vec::new();
        };
        let label = file.create_next_label();
        let size = Self::ct_size(&opt);
        vec![
            Insn::binary(ucomi, size, rhs1, lhs1),
            Insn::unary(
                if eq { InsnKind::Setnp } else { InsnKind::Setp },
                OperandSize::Byte,
                dst1,
            ),
            Insn::binary(ucomi, size, rhs2, lhs2),
            Insn::unary(InsnKind::Je, OperandSize::Qword, Operand::Label(label.clone())),
            Insn::binary(
                InsnKind::Mov,
                Self::ct_size(&ainsn.ct),
                Operand::Immediate(!eq as u64),
                dst2,
            ),
            Insn::unary(InsnKind::Label, OperandSize::Qword, Operand::Label(label)),
        ]
    }

    fn gen_equality(
        &mut self,
        ainsn: &AirInsn,
        routine: &mut AsmRoutine,
        file: &mut AsmFile,
    ) -> Vec<Insn> {
        match self.operand_ct(ainsn, 1) {
            Some(ct) if ct.is_sse_floating() => self.gen_sse_equality(ainsn, routine, file),
            Some(ct) if ct.is_integer() || ct.class == TypeClass::Pointer => {
                self.gen_relational(ainsn, routine)
            }
            _ => {
                self.internal("equality on an unsupported type");
                Vec::new()
            }
        }
    }

    /// movsx/movzx; same-size and dword-to-qword zero extensions are
    /// free
    fn gen_extension(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        let Some(opt) = self.operand_ct(ainsn, 1).cloned() else {
            self.internal("extension has untyped operands");
            return Vec::new();
        };
        let src_size = Self::ct_size(&opt);
        let dst_size = Self::ct_size(&ainsn.ct);
        if src_size == dst_size {
            return Vec::new();
        }
        if ainsn.op == AirOp::Zext
            && src_size == OperandSize::Dword
            && dst_size == OperandSize::Qword
        {
            return Vec::new();
        }
        let kind = if ainsn.op == AirOp::Sext {
            InsnKind::Movsx
        } else {
            InsnKind::Movzx
        };
        let (Some(dst), Some(src)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("extension is missing operands");
            return Vec::new();
        };
        let src = self.operand(src, routine);
        let dst = self.operand(dst, routine);
        match (src, dst) {
            (Some(src), Some(dst)) => vec![Insn::binary(
                kind,
                dst_size,
                src.with_size(src_size),
                dst,
            )],
            _ => Vec::new(),
        }
    }

    fn gen_sse_convert(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine, kind: InsnKind) -> Vec<Insn> {
        let (Some(dst), Some(src)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("conversion is missing operands");
            return Vec::new();
        };
        let src = self.operand(src, routine);
        let dst = self.operand(dst, routine);
        match (src, dst) {
            (Some(src), Some(dst)) => {
                vec![Insn::binary(kind, Self::ct_size(&ainsn.ct), src, dst)]
            }
            _ => Vec::new(),
        }
    }

    /// SSE -> signed integer: truncating convert; destinations
    /// narrower than a dword widen to a dword
    fn gen_sse2signed(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        let Some(opt) = self.operand_ct(ainsn, 1).cloned() else {
            self.internal("conversion has untyped operands");
            return Vec::new();
        };
        let kind = if opt.class == TypeClass::Float {
            InsnKind::Cvttss2si
        } else {
            InsnKind::Cvttsd2si
        };
        let size = Self::ct_size(&ainsn.ct).max(OperandSize::Dword);
        let (Some(dst), Some(src)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("conversion is missing operands");
            return Vec::new();
        };
        let src = self.operand(src, routine);
        let dst = self.operand(dst, routine);
        match (src, dst) {
            (Some(src), Some(dst)) => vec![Insn::binary(
                kind,
                size,
                src.with_size(Self::ct_size(&opt)),
                dst,
            )],
            _ => Vec::new(),
        }
    }

    /// Signed integer -> SSE: sources narrower than int sign-extend to
    /// a dword first
    fn gen_signed2sse(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine) -> Vec<Insn> {
        let Some(opt) = self.operand_ct(ainsn, 1).cloned() else {
            self.internal("conversion has untyped operands");
            return Vec::new();
        };
        let (Some(dst), Some(src)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("conversion is missing operands");
            return Vec::new();
        };
        let mut out = Vec::new();
        if opt.rank() < CType::class_rank(TypeClass::Int) {
            let widen_src = self.operand(src, routine);
            let widen_dst = self.operand(src, routine);
            let (Some(widen_src), Some(widen_dst)) = (widen_src, widen_dst) else {
                return Vec::new();
            };
            out.push(Insn::binary(
                InsnKind::Movsx,
                OperandSize::Dword,
                widen_src.with_size(Self::ct_size(&opt)),
                widen_dst,
            ));
        }
        let kind = if ainsn.ct.class == TypeClass::Float {
            InsnKind::Cvtsi2ss
        } else {
            InsnKind::Cvtsi2sd
        };
        let size = Self::ct_size(&opt).max(OperandSize::Dword);
        let src = self.operand(src, routine);
        let dst = self.operand(dst, routine);
        let (Some(src), Some(dst)) = (src, dst) else {
            return Vec::new();
        };
        out.push(Insn::binary(kind, size, src.with_size(size), dst));
        out
    }

    /// SSE -> unsigned 64-bit: compare against 2^63; below converts
    /// directly, otherwise subtract the limit, convert, then rebuild
    /// the high bit with shift/or/rotate
    fn gen_sse2u64(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine, file: &mut AsmFile) -> Vec<Insn> {
        let Some(opt) = self.operand_ct(ainsn, 1).cloned() else {
            self.internal("conversion has untyped operands");
            return Vec::new();
        };
        let is_float = opt.class == TypeClass::Float;
        let limit = self.sse_i64_limit(opt.class, file);
        let cvt = if is_float {
            InsnKind::Cvttss2si
        } else {
            InsnKind::Cvttsd2si
        };
        let (Some(dst), Some(src)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("conversion is missing operands");
            return Vec::new();
        };
        let src_size = Self::ct_size(&opt);
        let gte_label = file.create_next_label();
        let after_label = file.create_next_label();

        macro_rules! op {
            ($aop:expr) => {
                match self.operand($aop, routine) {
                    Some(op) => op,
                    None => return Vec::new(),
                }
            };
        }
        vec![
            Insn::binary(
                if is_float { InsnKind::Comiss } else { InsnKind::Comisd },
                src_size,
                Operand::label_ref(limit.clone(), 0),
                op!(src),
            ),
            Insn::unary(InsnKind::Jnb, OperandSize::Qword, Operand::Label(gte_label.clone())),
            Insn::binary(cvt, OperandSize::Qword, op!(src).with_size(src_size), op!(dst)),
            Insn::unary(InsnKind::Jmp, OperandSize::Qword, Operand::Label(after_label.clone())),
            Insn::unary(InsnKind::Label, OperandSize::Qword, Operand::Label(gte_label)),
            Insn::binary(
                if is_float { InsnKind::Subss } else { InsnKind::Subsd },
                src_size,
                Operand::label_ref(limit, 0),
                op!(src),
            ),
            Insn::binary(cvt, OperandSize::Qword, op!(src).with_size(src_size), op!(dst)),
            Insn::binary(InsnKind::Shl, OperandSize::Qword, Operand::Immediate(1), op!(dst)),
            Insn::binary(InsnKind::Or, OperandSize::Byte, Operand::Immediate(1), op!(dst)),
            Insn::binary(InsnKind::Ror, OperandSize::Qword, Operand::Immediate(1), op!(dst)),
            Insn::unary(InsnKind::Label, OperandSize::Qword, Operand::Label(after_label)),
        ]
    }

    /// SSE -> unsigned narrower than 64 bits: straight signed
    /// conversion widened
    fn gen_sse2unsigned(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine, file: &mut AsmFile) -> Vec<Insn> {
        let size = Self::ct_size(&ainsn.ct);
        if size == OperandSize::Qword {
            return self.gen_sse2u64(ainsn, routine, file);
        }
        let Some(opt) = self.operand_ct(ainsn, 1).cloned() else {
            self.internal("conversion has untyped operands");
            return Vec::new();
        };
        let kind = if opt.class == TypeClass::Float {
            InsnKind::Cvttss2si
        } else {
            InsnKind::Cvttsd2si
        };
        let size = if size == OperandSize::Dword {
            OperandSize::Qword
        } else {
            OperandSize::Dword
        };
        let (Some(dst), Some(src)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("conversion is missing operands");
            return Vec::new();
        };
        let src = self.operand(src, routine);
        let dst = self.operand(dst, routine);
        match (src, dst) {
            (Some(src), Some(dst)) => vec![Insn::binary(
                kind,
                size,
                src.with_size(Self::ct_size(&opt)),
                dst,
            )],
            _ => Vec::new(),
        }
    }

    /// Unsigned 64-bit -> SSE: clear the destination, test the sign
    /// bit; set means halve, convert, and add 2^63 back
    fn gen_u642sse(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine, file: &mut AsmFile) -> Vec<Insn> {
        let Some(opt) = self.operand_ct(ainsn, 1).cloned() else {
            self.internal("conversion has untyped operands");
            return Vec::new();
        };
        let is_float = ainsn.ct.class == TypeClass::Float;
        let limit = self.sse_i64_limit(ainsn.ct.class, file);
        let cvt = if is_float {
            InsnKind::Cvtsi2ss
        } else {
            InsnKind::Cvtsi2sd
        };
        let size = Self::ct_size(&ainsn.ct);
        let (Some(dst), Some(src)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("conversion is missing operands");
            return Vec::new();
        };
        let gte_label = file.create_next_label();
        let after_label = file.create_next_label();

        macro_rules! op {
            ($aop:expr) => {
                match self.operand($aop, routine) {
                    Some(op) => op,
                    None => return Vec::new(),
                }
            };
        }
        vec![
            Insn::binary(
                if is_float { InsnKind::Xorps } else { InsnKind::Xorpd },
                size,
                op!(dst),
                op!(dst),
            ),
            Insn::binary(InsnKind::Test, OperandSize::Qword, op!(src), op!(src)),
            Insn::unary(InsnKind::Js, OperandSize::Qword, Operand::Label(gte_label.clone())),
            Insn::binary(cvt, OperandSize::Qword, op!(src), op!(dst)),
            Insn::unary(InsnKind::Jmp, OperandSize::Qword, Operand::Label(after_label.clone())),
            Insn::unary(InsnKind::Label, OperandSize::Qword, Operand::Label(gte_label)),
            Insn::binary(InsnKind::Shl, OperandSize::Qword, Operand::Immediate(1), op!(src)),
            Insn::binary(InsnKind::Shr, OperandSize::Qword, Operand::Immediate(1), op!(src)),
            Insn::binary(cvt, OperandSize::Qword, op!(src), op!(dst)),
            Insn::binary(
                if is_float { InsnKind::Addss } else { InsnKind::Addsd },
                Self::ct_size(&opt),
                Operand::label_ref(limit, 0),
                op!(dst),
            ),
            Insn::unary(InsnKind::Label, OperandSize::Qword, Operand::Label(after_label)),
        ]
    }

    /// Unsigned narrower than 64 bits -> SSE: zero-extend to a dword
    /// and convert as a signed qword
    fn gen_unsigned2sse(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine, file: &mut AsmFile) -> Vec<Insn> {
        let Some(opt) = self.operand_ct(ainsn, 1).cloned() else {
            self.internal("conversion has untyped operands");
            return Vec::new();
        };
        if Self::ct_size(&opt) == OperandSize::Qword {
            return self.gen_u642sse(ainsn, routine, file);
        }
        let (Some(dst), Some(src)) = (ainsn.operand(0), ainsn.operand(1)) else {
            self.internal("conversion is missing operands");
            return Vec::new();
        };
        let mut out = Vec::new();
        if opt.rank() < CType::class_rank(TypeClass::Int) {
            let widen_src = self.operand(src, routine);
            let widen_dst = self.operand(src, routine);
            let (Some(widen_src), Some(widen_dst)) = (widen_src, widen_dst) else {
                return Vec::new();
            };
            out.push(Insn::binary(
                InsnKind::Movzx,
                OperandSize::Dword,
                widen_src.with_size(Self::ct_size(&opt)),
                widen_dst,
            ));
        }
        let kind = if ainsn.ct.class == TypeClass::Float {
            InsnKind::Cvtsi2ss
        } else {
            InsnKind::Cvtsi2sd
        };
        let src = self.operand(src, routine);
        let dst = self.operand(dst, routine);
        let (Some(src), Some(dst)) = (src, dst) else {
            return Vec::new();
        };
        out.push(Insn::binary(
            kind,
            OperandSize::Qword,
            src.with_size(OperandSize::Qword),
            dst,
        ));
        out
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    fn gen_insn(&mut self, ainsn: &AirInsn, routine: &mut AsmRoutine, file: &mut AsmFile) -> Vec<Insn> {
        use AirOp::*;
        match ainsn.op {
            Load | Assign => self.gen_load(ainsn, routine),
            LoadAddr => self.gen_load_addr(ainsn, routine),
            FuncCall => self.gen_func_call(ainsn, routine),
            Nop => vec![Insn::new(InsnKind::Nop)],
            Declare => self.gen_declare(ainsn, routine),
            Return => self.gen_return(routine),

            Add | Subtract | And | Xor | Or | ShiftLeft | ShiftRight | SignedShiftRight => {
                self.gen_binary(ainsn, routine)
            }
            Multiply => self.gen_multiply(ainsn, routine),
            Divide => self.gen_divide(ainsn, routine),

            Jz | Jnz => self.gen_conditional_jump(ainsn, routine, file),
            Jmp => self.gen_simple_jump(ainsn, routine, InsnKind::Jmp),
            Label => self.gen_simple_jump(ainsn, routine, InsnKind::Label),
            Push => {
                let Some(op) = ainsn.operand(0) else {
                    self.internal("push is missing its operand");
                    return Vec::new();
                };
                match self.operand(op, routine) {
                    Some(op) => vec![Insn::unary(InsnKind::Push, OperandSize::Qword, op)],
                    None => Vec::new(),
                }
            }

            DirectAdd | DirectSubtract | DirectAnd | DirectXor | DirectOr | DirectShiftLeft
            | DirectShiftRight | DirectSignedShiftRight => self.gen_direct_binary(ainsn, routine),
            DirectMultiply => self.gen_direct_multiply(ainsn, routine),
            DirectDivide => self.gen_direct_divide(ainsn, routine),

            Negate => self.gen_negate(ainsn, routine),
            Not => self.gen_not(ainsn, routine, file),
            Posate => self.gen_posate(ainsn, routine),
            Complement => self.gen_complement(ainsn, routine),

            LessEqual | Less | GreaterEqual | Greater => self.gen_relational(ainsn, routine),
            Equal | Inequal => self.gen_equality(ainsn, routine, file),

            Sext | Zext => self.gen_extension(ainsn, routine),
            S2D => self.gen_sse_convert(ainsn, routine, InsnKind::Cvtss2sd),
            D2S => self.gen_sse_convert(ainsn, routine, InsnKind::Cvtsd2ss),
            S2Si | D2Si => self.gen_sse2signed(ainsn, routine),
            Si2S | Si2D => self.gen_signed2sse(ainsn, routine),
            S2Ui | D2Ui => self.gen_sse2unsigned(ainsn, routine, file),
            Ui2S | Ui2D => self.gen_unsigned2sse(ainsn, routine, file),

            Memset => vec![Insn::new(InsnKind::RepStosb)],
            LSyscall => vec![Insn::new(InsnKind::Syscall)],

            // symbolic for earlier stages; modulo is rewritten to
            // division during localization, phi and varargs forms are
            // deleted before emission
            DeclareRegister | Blip | Modulo | DirectModulo | Phi | VaArg | VaStart | VaEnd
            | SequencePoint => Vec::new(),
        }
    }

    // ========================================================================
    // Routine and data translation
    // ========================================================================

    fn gen_routine(&mut self, aroutine: &AirRoutine, file: &mut AsmFile) -> AsmRoutine {
        file.next_routine_id += 1;
        let global = self.st.linkage(self.ast, aroutine.symbol) == Linkage::External;
        let label = self.st.get(aroutine.symbol).name.clone();
        let mut routine = AsmRoutine::new(file.next_routine_id, label, global);
        if aroutine.uses_varargs {
            routine.stackalloc -= 176;
            routine.uses_varargs = true;
        }
        for (i, ainsn) in aroutine.insns.iter().enumerate() {
            // the builder opens every routine with a nop
            if i == 0 && ainsn.op == AirOp::Nop {
                continue;
            }
            let insns = self.gen_insn(ainsn, &mut routine, file);
            routine.insns.extend(insns);
        }
        routine
    }

    fn gen_data(&mut self, adata: &AirData) -> Option<AsmData> {
        let sy = adata.symbol;
        let ctype = self.st.get(sy).ctype.clone();
        let size = ctype.size();
        if size < 0 {
            self.internal("data item has an incomplete type");
            return None;
        }
        let mut bytes = adata.data.clone();
        bytes.resize(size as usize, 0);
        let relocations = adata
            .relocations
            .iter()
            .map(|r| AsmReloc {
                offset: r.data_location,
                label: r.symbol.map(|target| {
                    if self.st.requires_disambiguation(self.ast, target) {
                        self.st.disambiguated_name(target)
                    } else {
                        self.st.get(target).name.clone()
                    }
                }),
            })
            .collect();
        let label = if self.st.requires_disambiguation(self.ast, sy) {
            self.st.disambiguated_name(sy)
        } else {
            self.st.get(sy).name.clone()
        };
        Some(AsmData {
            label,
            alignment: ctype.alignment(),
            bytes,
            relocations,
            readonly: adata.readonly,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::air::{Air, AirInsn, AirOp, AirOperand, AirRoutine};
    use crate::ast::{Ast, NodeKind};
    use crate::symbol::{NamespaceClass, Symbol, SymbolTable};

    fn setup() -> (Ast, SymbolTable) {
        let mut ast = Ast::new();
        let tu = ast.add(NodeKind::TranslationUnit { items: vec![] }, 1, 1);
        ast.link_parents(tu);
        (ast, SymbolTable::new())
    }

    fn reg(id: u32, ct: CType) -> AirOperand {
        AirOperand::Register { reg: id, ct: Some(ct) }
    }

    fn render(air: &Air, ast: &Ast, st: &mut SymbolTable) -> String {
        let (mut file, diags) = generate(air, ast, st);
        assert_eq!(diags.count(false), 0);
        let mut buf = Vec::new();
        file.write(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn int() -> CType {
        CType::basic(TypeClass::Int)
    }

    fn routine_with(st: &mut SymbolTable, insns: Vec<AirInsn>) -> Air {
        let sym = st.add(Symbol::new(
            "f",
            NamespaceClass::Ordinary,
            CType::function(int(), Some(vec![]), false),
        ));
        Air {
            routines: vec![AirRoutine {
                symbol: sym,
                insns,
                uses_varargs: false,
            }],
            data: vec![],
            rodata: vec![],
        }
    }

    #[test]
    fn test_load_immediate() {
        let (ast, mut st) = setup();
        let air = routine_with(
            &mut st,
            vec![AirInsn::new(
                AirOp::Load,
                int(),
                vec![reg(0, int()), AirOperand::IntegerConstant(42)],
            )],
        );
        let text = render(&air, &ast, &mut st);
        assert!(text.contains("    .globl f"));
        assert!(text.contains("f:"));
        assert!(text.contains("movl $42, %eax"), "got:\n{}", text);
    }

    #[test]
    fn test_binary_mov_elision() {
        let (ast, mut st) = setup();
        // dst == acc: no trailing move
        let air = routine_with(
            &mut st,
            vec![AirInsn::new(
                AirOp::Add,
                int(),
                vec![reg(0, int()), reg(0, int()), reg(2, int())],
            )],
        );
        let text = render(&air, &ast, &mut st);
        assert!(text.contains("addl %ecx, %eax"));
        assert_eq!(text.matches("mov").count(), 1); // only the prologue movq
    }

    #[test]
    fn test_unsigned_multiply_single_operand() {
        let (ast, mut st) = setup();
        let uint = CType::basic(TypeClass::UnsignedInt);
        let air = routine_with(
            &mut st,
            vec![AirInsn::new(
                AirOp::Multiply,
                uint.clone(),
                vec![reg(0, uint.clone()), reg(0, uint.clone()), reg(2, uint)],
            )],
        );
        let text = render(&air, &ast, &mut st);
        assert!(text.contains("mull %ecx"), "got:\n{}", text);
        assert!(!text.contains("imul"));
    }

    #[test]
    fn test_sse_to_u64_limit_sequence() {
        let (ast, mut st) = setup();
        let dbl = CType::basic(TypeClass::Double);
        let u64t = CType::basic(TypeClass::UnsignedLongLongInt);
        let air = routine_with(
            &mut st,
            vec![AirInsn::new(
                AirOp::D2Ui,
                u64t,
                vec![reg(0, CType::basic(TypeClass::UnsignedLongLongInt)), reg(16, dbl)],
            )],
        );
        let text = render(&air, &ast, &mut st);
        assert!(text.contains("comisd __sse64_i64_limit(%rip), %xmm0"), "got:\n{}", text);
        assert!(text.contains("subsd __sse64_i64_limit(%rip), %xmm0"));
        assert!(text.contains("cvttsd2siq %xmm0, %rax"));
        assert!(text.contains("shlq $1, %rax"));
        assert!(text.contains("orb $1, %al"));
        assert!(text.contains("rorq $1, %rax"));
        assert!(text.contains(".section .rodata"));
        assert!(text.contains("__sse64_i64_limit:"));
    }

    #[test]
    fn test_u64_to_sse_sequence() {
        let (ast, mut st) = setup();
        let dbl = CType::basic(TypeClass::Double);
        let u64t = CType::basic(TypeClass::UnsignedLongLongInt);
        let air = routine_with(
            &mut st,
            vec![AirInsn::new(
                AirOp::Ui2D,
                dbl.clone(),
                vec![reg(16, dbl), reg(0, u64t)],
            )],
        );
        let text = render(&air, &ast, &mut st);
        assert!(text.contains("xorpd %xmm0, %xmm0"), "got:\n{}", text);
        assert!(text.contains("testq %rax, %rax"));
        assert!(text.contains("js .LGEN"));
        assert!(text.contains("cvtsi2sdq %rax, %xmm0"));
        assert!(text.contains("addsd __sse64_i64_limit(%rip), %xmm0"));
    }

    #[test]
    fn test_sse_equality_nan_sequence() {
        let (ast, mut st) = setup();
        let dbl = CType::basic(TypeClass::Double);
        let air = routine_with(
            &mut st,
            vec![AirInsn::new(
                AirOp::Equal,
                int(),
                vec![reg(0, int()), reg(16, dbl.clone()), reg(17, dbl)],
            )],
        );
        let text = render(&air, &ast, &mut st);
        assert!(text.contains("ucomisd %xmm1, %xmm0"), "got:\n{}", text);
        assert!(text.contains("setnp %al"));
        assert!(text.contains("je .LGEN1"));
        assert!(text.contains("movl $0, %eax"));
        assert!(text.contains(".LGEN1:"));
    }

    #[test]
    fn test_stack_assignment_aligned() {
        let (mut ast, mut st) = setup();
        // an automatic int gets a stack slot; final sub is 16-aligned
        let declarer = ast.add(
            NodeKind::Identifier {
                name: "x".to_string(),
            },
            1,
            1,
        );
        let body = ast.add(NodeKind::CompoundStatement { items: vec![] }, 1, 1);
        ast.link_parents(body);
        let mut sym = Symbol::new("x", NamespaceClass::Ordinary, int());
        sym.declarer = Some(declarer);
        sym.scope = Some(body);
        let x = st.add(sym);
        let air = routine_with(
            &mut st,
            vec![AirInsn::new(
                AirOp::Load,
                int(),
                vec![AirOperand::Symbol(x), AirOperand::IntegerConstant(7)],
            )],
        );
        let text = render(&air, &ast, &mut st);
        assert!(text.contains("movl $7, -4(%rbp)"), "got:\n{}", text);
        assert!(text.contains("subq $16, %rsp"));
        assert_eq!(st.get(x).stack_offset, -4);
    }

    #[test]
    fn test_static_symbol_rip_relative() {
        let (mut ast, mut st) = setup();
        let declarer = ast.add(
            NodeKind::Identifier {
                name: "g".to_string(),
            },
            1,
            1,
        );
        let mut sym = Symbol::new("g", NamespaceClass::Ordinary, int());
        sym.declarer = Some(declarer);
        let g = st.add(sym);
        let air = routine_with(
            &mut st,
            vec![AirInsn::new(
                AirOp::Load,
                int(),
                vec![reg(0, int()), AirOperand::Symbol(g)],
            )],
        );
        let text = render(&air, &ast, &mut st);
        assert!(text.contains("movl g(%rip), %eax"), "got:\n{}", text);
    }

    #[test]
    fn test_return_epilogue_label() {
        let (ast, mut st) = setup();
        let air = routine_with(
            &mut st,
            vec![
                AirInsn::new(
                    AirOp::Return,
                    int(),
                    vec![],
                ),
                AirInsn::new(
                    AirOp::Load,
                    int(),
                    vec![reg(0, int()), AirOperand::IntegerConstant(1)],
                ),
            ],
        );
        let text = render(&air, &ast, &mut st);
        // non-trailing return jump: label emitted
        assert!(text.contains("jmp .LR1"));
        assert!(text.contains(".LR1:"));
    }
}
