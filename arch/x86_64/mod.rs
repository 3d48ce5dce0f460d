//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ecc project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// x86-64 backend: air -> assembly translation and textual emission
//

pub mod codegen;
pub mod lir;

pub use codegen::generate;
pub use lir::{AsmData, AsmFile, AsmReloc, AsmRoutine, Insn, InsnKind, Operand, OperandSize, Reg};
