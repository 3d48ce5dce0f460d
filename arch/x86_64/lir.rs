//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ecc project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// x86-64 low-level instruction representation and assembly writer
//
// AT&T syntax throughout. Mnemonics that take an operand-size suffix
// get it appended from the instruction size; SSE and addressing
// mnemonics carry their own size. Routine emission lays out the
// System-V frame: saved rbp, 16-byte-aligned stack allocation, used
// callee-saved registers, and for variadic routines the 176-byte
// register save area.
//

use crate::types::POINTER_WIDTH;
use std::io::{self, Write};

// ============================================================================
// Registers
// ============================================================================

/// Physical registers: general purpose first, then the SSE argument
/// registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    Rax,
    Rbx,
    Rcx,
    Rdx,
    Rsi,
    Rdi,
    Rbp,
    Rsp,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
    Xmm0,
    Xmm1,
    Xmm2,
    Xmm3,
    Xmm4,
    Xmm5,
    Xmm6,
    Xmm7,
}

const GP_COUNT: u32 = 16;

impl Reg {
    /// Map an air register id onto a physical register
    pub fn from_id(id: u32) -> Option<Reg> {
        use Reg::*;
        const TABLE: [Reg; 24] = [
            Rax, Rbx, Rcx, Rdx, Rsi, Rdi, Rbp, Rsp, R8, R9, R10, R11, R12, R13, R14, R15, Xmm0,
            Xmm1, Xmm2, Xmm3, Xmm4, Xmm5, Xmm6, Xmm7,
        ];
        TABLE.get(id as usize).copied()
    }

    pub fn is_sse(self) -> bool {
        self as u32 >= GP_COUNT
    }

    pub fn is_integer(self) -> bool {
        !self.is_sse()
    }

    /// Register name for an access size
    pub fn name(self, size: OperandSize) -> &'static str {
        const BYTE: [&str; 16] = [
            "al", "bl", "cl", "dl", "sil", "dil", "bpl", "spl", "r8b", "r9b", "r10b", "r11b",
            "r12b", "r13b", "r14b", "r15b",
        ];
        const WORD: [&str; 16] = [
            "ax", "bx", "cx", "dx", "si", "di", "bp", "sp", "r8w", "r9w", "r10w", "r11w", "r12w",
            "r13w", "r14w", "r15w",
        ];
        const DWORD: [&str; 16] = [
            "eax", "ebx", "ecx", "edx", "esi", "edi", "ebp", "esp", "r8d", "r9d", "r10d", "r11d",
            "r12d", "r13d", "r14d", "r15d",
        ];
        const QWORD: [&str; 16] = [
            "rax", "rbx", "rcx", "rdx", "rsi", "rdi", "rbp", "rsp", "r8", "r9", "r10", "r11",
            "r12", "r13", "r14", "r15",
        ];
        const SSE: [&str; 8] = [
            "xmm0", "xmm1", "xmm2", "xmm3", "xmm4", "xmm5", "xmm6", "xmm7",
        ];
        let idx = self as u32;
        if self.is_sse() {
            return SSE[(idx - GP_COUNT) as usize];
        }
        match size {
            OperandSize::Byte => BYTE[idx as usize],
            OperandSize::Word => WORD[idx as usize],
            OperandSize::Dword => DWORD[idx as usize],
            OperandSize::Qword => QWORD[idx as usize],
        }
    }
}

// ============================================================================
// Operand size
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OperandSize {
    Byte,
    Word,
    Dword,
    Qword,
}

impl OperandSize {
    pub fn suffix(self) -> char {
        match self {
            OperandSize::Byte => 'b',
            OperandSize::Word => 'w',
            OperandSize::Dword => 'l',
            OperandSize::Qword => 'q',
        }
    }

    /// Operand size for a byte count (defaults to qword)
    pub fn from_bytes(bytes: i64) -> OperandSize {
        match bytes {
            1 => OperandSize::Byte,
            2 => OperandSize::Word,
            4 => OperandSize::Dword,
            _ => OperandSize::Qword,
        }
    }
}

// ============================================================================
// Operands
// ============================================================================

/// One instruction operand
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Register {
        reg: Reg,
        /// Override for instructions that access a register at a size
        /// other than the instruction size (extensions, conversions)
        size: Option<OperandSize>,
    },
    /// Indirect call target `*%reg`
    PtrRegister(Reg),
    /// `offset(%reg)`
    DerefRegister {
        reg: Reg,
        offset: i64,
    },
    /// `offset(%base, %index, scale)`
    IndexedMem {
        base: Option<Reg>,
        index: Option<Reg>,
        scale: i64,
        offset: i64,
    },
    Label(String),
    /// RIP-relative `label±offset(%rip)`
    LabelRef {
        label: String,
        offset: i64,
    },
    Immediate(u64),
}

impl Operand {
    pub fn register(reg: Reg) -> Operand {
        Operand::Register { reg, size: None }
    }

    pub fn label_ref(label: impl Into<String>, offset: i64) -> Operand {
        Operand::LabelRef {
            label: label.into(),
            offset,
        }
    }

    /// Force the register access size
    pub fn with_size(mut self, new_size: OperandSize) -> Operand {
        if let Operand::Register { size, .. } = &mut self {
            *size = Some(new_size);
        }
        self
    }

    fn write(&self, default_size: OperandSize, out: &mut impl Write) -> io::Result<()> {
        match self {
            Operand::Register { reg, size } => {
                write!(out, "%{}", reg.name(size.unwrap_or(default_size)))
            }
            Operand::PtrRegister(reg) => write!(out, "*%{}", reg.name(OperandSize::Qword)),
            Operand::DerefRegister { reg, offset } => {
                if *offset != 0 {
                    write!(out, "{}", offset)?;
                }
                write!(out, "(%{})", reg.name(OperandSize::Qword))
            }
            Operand::IndexedMem {
                base,
                index,
                scale,
                offset,
            } => {
                if *offset != 0 {
                    write!(out, "{}", offset)?;
                }
                write!(out, "(")?;
                if let Some(base) = base {
                    write!(out, "%{}", base.name(OperandSize::Qword))?;
                }
                write!(out, ", ")?;
                if let Some(index) = index {
                    write!(out, "%{}", index.name(OperandSize::Qword))?;
                }
                write!(out, ", {})", scale)
            }
            Operand::Label(label) => write!(out, "{}", label),
            Operand::LabelRef { label, offset } => {
                if *offset > 0 {
                    write!(out, "{}+{}(%rip)", label, offset)
                } else if *offset < 0 {
                    write!(out, "{}-{}(%rip)", label, offset.unsigned_abs())
                } else {
                    write!(out, "{}(%rip)", label)
                }
            }
            Operand::Immediate(value) => write!(out, "${}", value),
        }
    }
}

// ============================================================================
// Instructions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsnKind {
    Label,
    Leave,
    Ret,
    Stc,
    Nop,
    Syscall,
    Call,
    Jmp,
    Je,
    Jne,
    Jnb,
    Js,
    Sete,
    Setne,
    Setle,
    Setl,
    Setge,
    Setg,
    Seta,
    Setnb,
    Setp,
    Setnp,
    Push,
    Pop,
    Neg,
    Mov,
    Movss,
    Movsd,
    Movsx,
    Movzx,
    Lea,
    And,
    Or,
    Cmp,
    Not,
    Add,
    Addss,
    Addsd,
    Sub,
    Subss,
    Subsd,
    Mul,
    Imul,
    Mulss,
    Mulsd,
    Div,
    Idiv,
    Divss,
    Divsd,
    Xor,
    Xorps,
    Xorpd,
    Cvtsd2ss,
    Cvtss2sd,
    Cvtsi2ss,
    Cvtsi2sd,
    Cvttss2si,
    Cvttsd2si,
    Comiss,
    Comisd,
    Ucomiss,
    Ucomisd,
    Test,
    Ptest,
    RepStosb,
    Shl,
    Shr,
    Sar,
    Ror,
}

impl InsnKind {
    /// Does this mnemonic take the b/w/l/q size suffix?
    fn uses_suffix(self) -> bool {
        use InsnKind::*;
        !matches!(
            self,
            Movss
                | Movsd
                | Addss
                | Addsd
                | Subss
                | Subsd
                | Mulss
                | Mulsd
                | Divss
                | Divsd
                | Cvtsd2ss
                | Cvtss2sd
                | Comiss
                | Comisd
                | Xorpd
                | Xorps
                | Ucomiss
                | Ucomisd
                | Ptest
                | Movzx
                | Movsx
                | Stc
                | RepStosb
                | Syscall
        )
    }

    /// Which register operands does this instruction write? Used by
    /// the callee-saved pruning pass.
    pub fn writes(self) -> (bool, bool) {
        use InsnKind::*;
        match self {
            Pop | Sete | Setne | Setle | Setl | Setge | Setg | Seta | Setnb | Setp | Setnp
            | Not | Neg | Mul => (true, false),
            Lea | And | Or | Xor | Mov | Movzx | Movsx | Add | Sub | Imul | Div | Idiv | Shl
            | Shr | Sar | Ror | Movss | Movsd | Addss | Addsd | Subss | Subsd | Mulss | Mulsd
            | Divss | Divsd | Xorps | Xorpd | Cvtsd2ss | Cvtss2sd | Cvtsi2ss | Cvtsi2sd
            | Cvttss2si | Cvttsd2si => (false, true),
            _ => (false, false),
        }
    }

    fn mnemonic(self) -> &'static str {
        use InsnKind::*;
        match self {
            Label => "",
            Leave => "leave",
            Ret => "ret",
            Stc => "stc",
            Nop => "nop",
            Syscall => "syscall",
            Call => "call",
            Jmp => "jmp",
            Je => "je",
            Jne => "jne",
            Jnb => "jnb",
            Js => "js",
            Sete => "sete",
            Setne => "setne",
            Setle => "setle",
            Setl => "setl",
            Setge => "setge",
            Setg => "setg",
            Seta => "seta",
            Setnb => "setnb",
            Setp => "setp",
            Setnp => "setnp",
            Push => "push",
            Pop => "pop",
            Neg => "neg",
            Mov => "mov",
            Movss => "movss",
            Movsd => "movsd",
            Movsx => "movsx",
            Movzx => "movzx",
            Lea => "lea",
            And => "and",
            Or => "or",
            Cmp => "cmp",
            Not => "not",
            Add => "add",
            Addss => "addss",
            Addsd => "addsd",
            Sub => "sub",
            Subss => "subss",
            Subsd => "subsd",
            Mul => "mul",
            Imul => "imul",
            Mulss => "mulss",
            Mulsd => "mulsd",
            Div => "div",
            Idiv => "idiv",
            Divss => "divss",
            Divsd => "divsd",
            Xor => "xor",
            Xorps => "xorps",
            Xorpd => "xorpd",
            Cvtsd2ss => "cvtsd2ss",
            Cvtss2sd => "cvtss2sd",
            Cvtsi2ss => "cvtsi2ss",
            Cvtsi2sd => "cvtsi2sd",
            Cvttss2si => "cvttss2si",
            Cvttsd2si => "cvttsd2si",
            Comiss => "comiss",
            Comisd => "comisd",
            Ucomiss => "ucomiss",
            Ucomisd => "ucomisd",
            Test => "test",
            Ptest => "ptest",
            RepStosb => "rep stosb",
            Shl => "shl",
            Shr => "shr",
            Sar => "sar",
            Ror => "ror",
        }
    }
}

/// One emitted instruction: kind, size, up to two operands
#[derive(Debug, Clone)]
pub struct Insn {
    pub kind: InsnKind,
    pub size: OperandSize,
    pub op1: Option<Operand>,
    pub op2: Option<Operand>,
}

impl Insn {
    pub fn new(kind: InsnKind) -> Self {
        Self {
            kind,
            size: OperandSize::Qword,
            op1: None,
            op2: None,
        }
    }

    pub fn sized(kind: InsnKind, size: OperandSize) -> Self {
        Self {
            kind,
            size,
            op1: None,
            op2: None,
        }
    }

    pub fn unary(kind: InsnKind, size: OperandSize, op1: Operand) -> Self {
        Self {
            kind,
            size,
            op1: Some(op1),
            op2: None,
        }
    }

    pub fn binary(kind: InsnKind, size: OperandSize, op1: Operand, op2: Operand) -> Self {
        Self {
            kind,
            size,
            op1: Some(op1),
            op2: Some(op2),
        }
    }

    fn write(&self, out: &mut impl Write) -> io::Result<()> {
        use InsnKind::*;
        const INDENT: &str = "    ";
        let suffix = if self.kind.uses_suffix() {
            self.size.suffix().to_string()
        } else {
            String::new()
        };
        match self.kind {
            Label => {
                if let Some(Operand::Label(name)) = &self.op1 {
                    write!(out, "{}:", name)?;
                }
            }
            Leave | Ret | Stc | Nop | Syscall | RepStosb => {
                write!(out, "{}{}", INDENT, self.kind.mnemonic())?;
            }
            Call | Jmp | Je | Jne | Jnb | Js => {
                write!(out, "{}{} ", INDENT, self.kind.mnemonic())?;
                if let Some(op) = &self.op1 {
                    op.write(OperandSize::Qword, out)?;
                }
            }
            Sete | Setne | Setle | Setl | Setge | Setg | Seta | Setnb | Setp | Setnp => {
                write!(out, "{}{} ", INDENT, self.kind.mnemonic())?;
                if let Some(op) = &self.op1 {
                    op.write(OperandSize::Byte, out)?;
                }
            }
            Push | Pop | Neg | Mul | Div | Idiv | Not => {
                write!(out, "{}{}{} ", INDENT, self.kind.mnemonic(), suffix)?;
                if let Some(op) = &self.op1 {
                    op.write(self.size, out)?;
                }
            }
            Shl | Shr | Sar | Ror => {
                // shift count is a byte-sized operand
                write!(out, "{}{}{} ", INDENT, self.kind.mnemonic(), suffix)?;
                if let Some(op) = &self.op1 {
                    op.write(OperandSize::Byte, out)?;
                }
                write!(out, ", ")?;
                if let Some(op) = &self.op2 {
                    op.write(self.size, out)?;
                }
            }
            _ => {
                write!(out, "{}{}{} ", INDENT, self.kind.mnemonic(), suffix)?;
                if let Some(op) = &self.op1 {
                    op.write(self.size, out)?;
                }
                write!(out, ", ")?;
                if let Some(op) = &self.op2 {
                    op.write(self.size, out)?;
                }
            }
        }
        writeln!(out)
    }
}

// ============================================================================
// Callee-saved register tracking
// ============================================================================

bitflags::bitflags! {
    /// Callee-saved registers written by a routine
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Nonvolatiles: u16 {
        const RBX = 1 << 0;
        const R12 = 1 << 1;
        const R13 = 1 << 2;
        const R14 = 1 << 3;
        const R15 = 1 << 4;
    }
}

const NONVOLATILE_ORDER: [(Nonvolatiles, &str); 5] = [
    (Nonvolatiles::RBX, "rbx"),
    (Nonvolatiles::R12, "r12"),
    (Nonvolatiles::R13, "r13"),
    (Nonvolatiles::R14, "r14"),
    (Nonvolatiles::R15, "r15"),
];

// ============================================================================
// Data items
// ============================================================================

/// A relocation inside a data item: the pointer-sized slot at `offset`
/// holds the link-time addend and refers to `label`
#[derive(Debug, Clone)]
pub struct AsmReloc {
    pub offset: i64,
    pub label: Option<String>,
}

/// One emitted data item (either section)
#[derive(Debug, Clone)]
pub struct AsmData {
    pub label: String,
    pub alignment: i64,
    pub bytes: Vec<u8>,
    pub relocations: Vec<AsmReloc>,
    pub readonly: bool,
}

impl AsmData {
    fn write(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "    .align {}", self.alignment)?;
        writeln!(out, "{}:", self.label)?;
        let len = self.bytes.len();
        let mut i = 0usize;
        let mut next_reloc = 0usize;
        while i < len {
            if let Some(reloc) = self.relocations.get(next_reloc) {
                if i as i64 == reloc.offset && i + 8 <= len {
                    next_reloc += 1;
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(&self.bytes[i..i + 8]);
                    let addend = i64::from_le_bytes(raw);
                    match &reloc.label {
                        Some(label) => {
                            if addend != 0 {
                                writeln!(
                                    out,
                                    "    .quad {}{}{}",
                                    label,
                                    if addend < 0 { '-' } else { '+' },
                                    addend.unsigned_abs()
                                )?;
                            } else {
                                writeln!(out, "    .quad {}", label)?;
                            }
                        }
                        None => writeln!(out, "    .quad 0x{:X}", addend)?,
                    }
                    i += POINTER_WIDTH as usize;
                    continue;
                }
            }
            if i + 8 <= len {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&self.bytes[i..i + 8]);
                writeln!(out, "    .quad 0x{:X}", u64::from_le_bytes(raw))?;
                i += 8;
            } else if i + 4 <= len {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(&self.bytes[i..i + 4]);
                writeln!(out, "    .long 0x{:X}", u32::from_le_bytes(raw))?;
                i += 4;
            } else if i + 2 <= len {
                let mut raw = [0u8; 2];
                raw.copy_from_slice(&self.bytes[i..i + 2]);
                writeln!(out, "    .word 0x{:X}", u16::from_le_bytes(raw))?;
                i += 2;
            } else {
                writeln!(out, "    .byte 0x{:X}", self.bytes[i])?;
                i += 1;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Routines
// ============================================================================

/// One emitted routine
#[derive(Debug, Clone)]
pub struct AsmRoutine {
    pub id: u64,
    pub label: String,
    pub global: bool,
    /// Negative running total of stack slot assignments
    pub stackalloc: i64,
    pub uses_varargs: bool,
    pub used_nonvolatiles: Nonvolatiles,
    pub insns: Vec<Insn>,
}

impl AsmRoutine {
    pub fn new(id: u64, label: String, global: bool) -> Self {
        Self {
            id,
            label,
            global,
            stackalloc: 0,
            uses_varargs: false,
            used_nonvolatiles: Nonvolatiles::empty(),
            insns: Vec::new(),
        }
    }

    /// Scan the instruction stream for writes to callee-saved
    /// registers; only those get pushed and popped
    fn find_used_nonvolatiles(&mut self) {
        for insn in &self.insns {
            let (w1, w2) = insn.kind.writes();
            for (writes, op) in [(w1, &insn.op1), (w2, &insn.op2)] {
                if !writes {
                    continue;
                }
                if let Some(Operand::Register { reg, .. }) = op {
                    let flag = match reg {
                        Reg::Rbx => Nonvolatiles::RBX,
                        Reg::R12 => Nonvolatiles::R12,
                        Reg::R13 => Nonvolatiles::R13,
                        Reg::R14 => Nonvolatiles::R14,
                        Reg::R15 => Nonvolatiles::R15,
                        _ => continue,
                    };
                    self.used_nonvolatiles |= flag;
                }
            }
        }
    }

    fn write_varargs_setup(&self, out: &mut impl Write) -> io::Result<()> {
        // integer argument registers, last to first
        for (i, reg) in ["r9", "r8", "rcx", "rdx", "rsi", "rdi"].iter().enumerate() {
            writeln!(out, "    movq %{}, {}(%rbp)", reg, -8 * (i as i64 + 1))?;
        }
        // SSE argument registers fill the rest of the register save area
        for i in 0..8 {
            writeln!(out, "    movaps %xmm{}, {}(%rbp)", 7 - i, -64 - 16 * i)?;
        }
        Ok(())
    }

    fn write(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.find_used_nonvolatiles();
        if self.global {
            writeln!(out, "    .globl {}", self.label)?;
        }
        writeln!(out, "{}:", self.label)?;
        writeln!(out, "    pushq %rbp")?;
        writeln!(out, "    movq %rsp, %rbp")?;
        if self.stackalloc != 0 {
            let v = self.stackalloc.abs();
            writeln!(out, "    subq ${}, %rsp", v + (16 - (v % 16)) % 16)?;
        }
        for (flag, name) in NONVOLATILE_ORDER {
            if self.used_nonvolatiles.contains(flag) {
                writeln!(out, "    pushq %{}", name)?;
            }
        }
        if self.uses_varargs {
            self.write_varargs_setup(out)?;
        }
        let epilogue = format!(".LR{}", self.id);
        let mut epilogue_jumps = 0usize;
        for (i, insn) in self.insns.iter().enumerate() {
            // a jump to the epilogue as the last instruction is elided
            if insn.kind == InsnKind::Jmp {
                if let Some(Operand::Label(target)) = &insn.op1 {
                    if *target == epilogue {
                        if i + 1 == self.insns.len() {
                            continue;
                        }
                        epilogue_jumps += 1;
                    }
                }
            }
            insn.write(out)?;
        }
        if epilogue_jumps > 0 {
            writeln!(out, "{}:", epilogue)?;
        }
        for (flag, name) in NONVOLATILE_ORDER.iter().rev() {
            if self.used_nonvolatiles.contains(*flag) {
                writeln!(out, "    popq %{}", name)?;
            }
        }
        writeln!(out, "    leave")?;
        writeln!(out, "    ret")
    }
}

// ============================================================================
// File
// ============================================================================

/// A complete assembly file plus the emission state shared by its
/// routines (generated-label counter, cached rodata helper symbols)
#[derive(Debug, Default)]
pub struct AsmFile {
    pub data: Vec<AsmData>,
    pub rodata: Vec<AsmData>,
    pub routines: Vec<AsmRoutine>,
    pub next_local_label: u64,
    pub next_routine_id: u64,
    pub sse32_zero_checker: Option<String>,
    pub sse64_zero_checker: Option<String>,
    pub sse32_i64_limit: Option<String>,
    pub sse64_i64_limit: Option<String>,
}

impl AsmFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next generated local label `.LGEN<n>`
    pub fn create_next_label(&mut self) -> String {
        self.next_local_label += 1;
        format!(".LGEN{}", self.next_local_label)
    }

    /// Write `.data`, `.rodata` and `.text` sections in order
    pub fn write(&mut self, out: &mut impl Write) -> io::Result<()> {
        if !self.data.is_empty() {
            writeln!(out, "    .data")?;
        }
        for data in &self.data {
            data.write(out)?;
        }
        if !self.rodata.is_empty() {
            writeln!(out, "    .section .rodata")?;
        }
        for rodata in &self.rodata {
            rodata.write(out)?;
        }
        if !self.routines.is_empty() {
            writeln!(out, "    .text")?;
        }
        for routine in &mut self.routines {
            routine.write(out)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn render_insn(insn: &Insn) -> String {
        let mut buf = Vec::new();
        insn.write(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_register_names() {
        assert_eq!(Reg::Rax.name(OperandSize::Byte), "al");
        assert_eq!(Reg::Rax.name(OperandSize::Qword), "rax");
        assert_eq!(Reg::R12.name(OperandSize::Dword), "r12d");
        assert_eq!(Reg::Xmm3.name(OperandSize::Qword), "xmm3");
        assert!(Reg::Xmm0.is_sse());
        assert!(Reg::R15.is_integer());
    }

    #[test]
    fn test_mov_suffix() {
        let insn = Insn::binary(
            InsnKind::Mov,
            OperandSize::Dword,
            Operand::Immediate(7),
            Operand::register(Reg::Rax),
        );
        assert_eq!(render_insn(&insn), "    movl $7, %eax\n");
    }

    #[test]
    fn test_sse_no_suffix() {
        let insn = Insn::binary(
            InsnKind::Movsd,
            OperandSize::Qword,
            Operand::DerefRegister {
                reg: Reg::Rbp,
                offset: -16,
            },
            Operand::register(Reg::Xmm0),
        );
        assert_eq!(render_insn(&insn), "    movsd -16(%rbp), %xmm0\n");
    }

    #[test]
    fn test_label_ref_offsets() {
        let mut buf = Vec::new();
        Operand::label_ref("tbl", 8)
            .write(OperandSize::Qword, &mut buf)
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "tbl+8(%rip)");

        let mut buf = Vec::new();
        Operand::label_ref("tbl", -4)
            .write(OperandSize::Qword, &mut buf)
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "tbl-4(%rip)");
    }

    #[test]
    fn test_indexed_mem() {
        let mut buf = Vec::new();
        Operand::IndexedMem {
            base: Some(Reg::Rax),
            index: Some(Reg::Rcx),
            scale: 4,
            offset: 12,
        }
        .write(OperandSize::Qword, &mut buf)
        .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "12(%rax, %rcx, 4)");
    }

    #[test]
    fn test_shift_count_is_byte_sized() {
        let insn = Insn::binary(
            InsnKind::Shl,
            OperandSize::Qword,
            Operand::Immediate(1),
            Operand::register(Reg::Rax),
        );
        assert_eq!(render_insn(&insn), "    shlq $1, %rax\n");
    }

    #[test]
    fn test_stack_alloc_rounded_to_16() {
        let mut routine = AsmRoutine::new(1, "f".to_string(), true);
        routine.stackalloc = -20;
        let mut buf = Vec::new();
        routine.write(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("subq $32, %rsp"), "got:\n{}", text);
    }

    #[test]
    fn test_nonvolatile_pruning() {
        let mut routine = AsmRoutine::new(2, "g".to_string(), false);
        routine.insns.push(Insn::binary(
            InsnKind::Mov,
            OperandSize::Qword,
            Operand::Immediate(1),
            Operand::register(Reg::R12),
        ));
        let mut buf = Vec::new();
        routine.write(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("pushq %r12"));
        assert!(text.contains("popq %r12"));
        assert!(!text.contains("pushq %rbx"));
        assert!(!text.contains("pushq %r13"));
    }

    #[test]
    fn test_trailing_epilogue_jump_elided() {
        let mut routine = AsmRoutine::new(3, "h".to_string(), false);
        routine.insns.push(Insn::unary(
            InsnKind::Jmp,
            OperandSize::Qword,
            Operand::Label(".LR3".to_string()),
        ));
        let mut buf = Vec::new();
        routine.write(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        // a single trailing return jump needs neither the jmp nor the label
        assert!(!text.contains("jmp .LR3"));
        assert!(!text.contains(".LR3:"));
    }

    #[test]
    fn test_data_chunking() {
        // 7 bytes: one .long, one .word, one .byte
        let data = AsmData {
            label: "s".to_string(),
            alignment: 1,
            bytes: vec![0x68, 0x69, 0, 0, 0x21, 0x43, 0x65],
            relocations: vec![],
            readonly: false,
        };
        let mut buf = Vec::new();
        data.write(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("    .align 1"));
        assert!(text.contains("s:"));
        assert!(text.contains("    .long 0x6968"));
        assert!(text.contains("    .word 0x4321"));
        assert!(text.contains("    .byte 0x65"));
    }

    #[test]
    fn test_relocation_interrupts_byte_stream() {
        let mut bytes = vec![0u8; 16];
        bytes[0] = 0x68;
        bytes[1] = 0x69;
        bytes[8] = 4; // addend written in place
        let data = AsmData {
            label: "table".to_string(),
            alignment: 8,
            bytes,
            relocations: vec![AsmReloc {
                offset: 8,
                label: Some("target".to_string()),
            }],
            readonly: false,
        };
        let mut buf = Vec::new();
        data.write(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("    .quad 0x6968"));
        assert!(text.contains("    .quad target+4"));
    }

    #[test]
    fn test_varargs_register_save_area() {
        let mut routine = AsmRoutine::new(4, "v".to_string(), true);
        routine.uses_varargs = true;
        routine.stackalloc = -176;
        let mut buf = Vec::new();
        routine.write(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("movq %r9, -8(%rbp)"));
        assert!(text.contains("movq %rdi, -48(%rbp)"));
        assert!(text.contains("movaps %xmm7, -64(%rbp)"));
        assert!(text.contains("movaps %xmm0, -176(%rbp)"));
        assert!(text.contains("subq $176, %rsp"));
    }
}
