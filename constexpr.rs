//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ecc project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Compile-time expression evaluation for the ecc compiler core
//
// Evaluation succeeds only when every leaf is a literal, a sizeof of a
// complete type, an enumeration constant, or an address constant (an
// identifier of static storage duration, a string literal, a compound
// literal, or the address of one of those), with optional pointer
// arithmetic by an integer constant. Anything else yields the error
// variant carrying a message.
//
// Integer values are kept as a 64-bit pattern truncated to the width
// of their class; conversion between classes preserves the value
// modulo the target width with the target's signedness.
//

use crate::ast::{Ast, BinaryOp, NodeId, NodeKind};
use crate::symbol::{NamespaceClass, StorageDuration, SymbolId, SymbolTable};
use crate::types::{CType, TypeClass};

// ============================================================================
// Value representation
// ============================================================================

/// Result of constant-expression evaluation
#[derive(Debug, Clone)]
pub enum ConstValue {
    Integer { ct: CType, bits: u64 },
    Arithmetic { ct: CType, value: f64 },
    Address { ct: CType, symbol: SymbolId, offset: i64 },
    Error { message: String },
}

impl ConstValue {
    pub fn error(message: impl Into<String>) -> Self {
        ConstValue::Error {
            message: message.into(),
        }
    }

    fn int(ct: CType, value: i64) -> Self {
        let mut v = ConstValue::Integer {
            ct: ct.clone(),
            bits: value as u64,
        };
        v.truncate_to(&ct);
        v
    }

    pub fn succeeded(&self) -> bool {
        !matches!(self, ConstValue::Error { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ConstValue::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn ctype(&self) -> Option<&CType> {
        match self {
            ConstValue::Integer { ct, .. }
            | ConstValue::Arithmetic { ct, .. }
            | ConstValue::Address { ct, .. } => Some(ct),
            ConstValue::Error { .. } => None,
        }
    }

    fn width_bits(ct: &CType) -> u32 {
        let size = ct.size();
        if size <= 0 {
            64
        } else {
            (size * 8).min(64) as u32
        }
    }

    fn truncate_to(&mut self, target: &CType) {
        if let ConstValue::Integer { ct, bits } = self {
            let width = Self::width_bits(target);
            if width < 64 {
                *bits &= (1u64 << width) - 1;
            }
            *ct = target.clone();
        }
    }

    /// Signed reading of an integer value (sign-extended from its width)
    pub fn as_i64(&self) -> i64 {
        match self {
            ConstValue::Integer { ct, bits } => {
                let width = Self::width_bits(ct);
                if ct.is_signed_integer() && width < 64 {
                    let shift = 64 - width;
                    ((*bits << shift) as i64) >> shift
                } else {
                    *bits as i64
                }
            }
            ConstValue::Arithmetic { value, .. } => *value as i64,
            _ => 0,
        }
    }

    /// Unsigned reading of an integer value
    pub fn as_u64(&self) -> u64 {
        match self {
            ConstValue::Integer { bits, .. } => *bits,
            ConstValue::Arithmetic { value, .. } => *value as u64,
            _ => 0,
        }
    }

    /// Convert an integer value to another integer class, preserving
    /// the value modulo the target width with the target's signedness
    pub fn convert_class(&mut self, class: TypeClass) {
        self.convert(&CType::basic(class));
    }

    /// Convert to a target type (integer/integer, integer/floating,
    /// floating/floating); addresses only re-type
    pub fn convert(&mut self, target: &CType) {
        if matches!(self, ConstValue::Error { .. }) {
            return;
        }
        if let ConstValue::Address { ct, .. } = self {
            *ct = target.clone();
            return;
        }
        if let ConstValue::Arithmetic { value, .. } = self {
            let value = *value;
            if target.is_real_floating() {
                *self = ConstValue::Arithmetic {
                    ct: target.clone(),
                    value: if target.class == TypeClass::Float {
                        value as f32 as f64
                    } else {
                        value
                    },
                };
            } else {
                *self = ConstValue::Integer {
                    ct: target.clone(),
                    bits: value as i64 as u64,
                };
                self.truncate_to(target);
            }
            return;
        }
        // integer source
        let signed = self
            .ctype()
            .map(|ct| ct.is_signed_integer())
            .unwrap_or(false);
        if target.is_real_floating() {
            let value = if signed {
                self.as_i64() as f64
            } else {
                self.as_u64() as f64
            };
            *self = ConstValue::Arithmetic {
                ct: target.clone(),
                value,
            };
        } else {
            let raw = if signed { self.as_i64() as u64 } else { self.as_u64() };
            *self = ConstValue::Integer {
                ct: target.clone(),
                bits: raw,
            };
            self.truncate_to(target);
        }
    }

    /// Is this a constant equal to zero?
    pub fn equals_zero(&self) -> bool {
        match self {
            ConstValue::Integer { bits, .. } => *bits == 0,
            ConstValue::Arithmetic { value, .. } => *value == 0.0,
            _ => false,
        }
    }

    /// Serialize into the target's byte representation (little endian)
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            ConstValue::Integer { ct, bits } => {
                let size = ct.size().max(1) as usize;
                bits.to_le_bytes()[..size.min(8)].to_vec()
            }
            ConstValue::Arithmetic { ct, value } => {
                if ct.class == TypeClass::Float {
                    (*value as f32).to_le_bytes().to_vec()
                } else {
                    value.to_le_bytes().to_vec()
                }
            }
            ConstValue::Address { offset, .. } => offset.to_le_bytes().to_vec(),
            ConstValue::Error { .. } => Vec::new(),
        }
    }
}

impl std::fmt::Display for ConstValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstValue::Integer { ct, .. } => {
                if ct.is_unsigned_integer() {
                    write!(f, "{}", self.as_u64())
                } else {
                    write!(f, "{}", self.as_i64())
                }
            }
            ConstValue::Arithmetic { value, .. } => write!(f, "{}", value),
            ConstValue::Address { symbol, offset, .. } => {
                if *offset != 0 {
                    write!(f, "<symbol {}>{:+}", symbol.0, offset)
                } else {
                    write!(f, "<symbol {}>", symbol.0)
                }
            }
            ConstValue::Error { message } => write!(f, "<error: {}>", message),
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Evaluate an expression subtree to a constant
pub fn evaluate(ast: &Ast, st: &SymbolTable, id: NodeId) -> ConstValue {
    use NodeKind::*;
    match ast.kind(id) {
        IntegerConstant { value, class } => {
            let mut v = ConstValue::Integer {
                ct: CType::basic(*class),
                bits: *value,
            };
            v.truncate_to(&CType::basic(*class));
            v
        }
        FloatingConstant { value, class } => ConstValue::Arithmetic {
            ct: CType::basic(*class),
            value: *value,
        },
        StringLiteral { .. } | CompoundLiteral { .. } => match st.get_by_declarer(id) {
            Some(sy) => ConstValue::Address {
                ct: CType::pointer_to(st.get(sy).ctype.clone()),
                symbol: sy,
                offset: 0,
            },
            None => ConstValue::error("literal has no backing symbol"),
        },
        Identifier { name } => evaluate_identifier(ast, st, id, name),
        SizeofExpression { operand } => {
            let ct = match &ast.node(*operand).ctype {
                Some(ct) => ct,
                None => return ConstValue::error("sizeof operand has no type"),
            };
            sizeof_value(ct)
        }
        SizeofType { type_name } => {
            let ct = match &ast.node(*type_name).ctype {
                Some(ct) => ct,
                None => return ConstValue::error("sizeof operand has no type"),
            };
            sizeof_value(ct)
        }
        Cast { operand, .. } => {
            let target = match &ast.node(id).ctype {
                Some(ct) => ct.clone(),
                None => return ConstValue::error("cast has no type"),
            };
            let mut v = evaluate(ast, st, *operand);
            if !v.succeeded() {
                return v;
            }
            if !target.is_arithmetic() && target.class != TypeClass::Pointer {
                return ConstValue::error("cast in constant expression must be to a scalar type");
            }
            if matches!(v, ConstValue::Address { .. }) && target.class != TypeClass::Pointer {
                return ConstValue::error("address constant cannot be cast to a non-pointer type");
            }
            v.convert(&target);
            v
        }
        UnaryPlus { operand } => {
            let mut v = evaluate(ast, st, *operand);
            if let Some(ct) = v.ctype() {
                if ct.is_integer() {
                    let promoted = ct.integer_promotions();
                    v.convert(&promoted);
                }
            }
            v
        }
        UnaryMinus { operand } => {
            let v = evaluate(ast, st, *operand);
            match v {
                ConstValue::Integer { ref ct, .. } => {
                    let promoted = ct.integer_promotions();
                    ConstValue::int(promoted, v.as_i64().wrapping_neg())
                }
                ConstValue::Arithmetic { ct, value } => ConstValue::Arithmetic { ct, value: -value },
                ConstValue::Address { .. } => {
                    ConstValue::error("cannot negate an address constant")
                }
                err => err,
            }
        }
        Complement { operand } => {
            let v = evaluate(ast, st, *operand);
            match &v {
                ConstValue::Integer { ct, .. } => {
                    let promoted = ct.integer_promotions();
                    ConstValue::int(promoted, !v.as_i64())
                }
                ConstValue::Error { .. } => v,
                _ => ConstValue::error("complement operand must be an integer constant"),
            }
        }
        Not { operand } => {
            let v = evaluate(ast, st, *operand);
            if !v.succeeded() {
                return v;
            }
            ConstValue::int(CType::basic(TypeClass::Int), v.equals_zero() as i64)
        }
        Reference { operand } => evaluate_address_of(ast, st, *operand),
        Binary { op, lhs, rhs } => evaluate_binary(ast, st, *op, *lhs, *rhs),
        Conditional {
            condition,
            then_expr,
            else_expr,
        } => {
            let cond = evaluate(ast, st, *condition);
            if !cond.succeeded() {
                return cond;
            }
            if cond.equals_zero() {
                evaluate(ast, st, *else_expr)
            } else {
                evaluate(ast, st, *then_expr)
            }
        }
        _ => ConstValue::error("expression cannot be evaluated at compile time"),
    }
}

/// Evaluate and require an integer result
pub fn evaluate_integer(ast: &Ast, st: &SymbolTable, id: NodeId) -> ConstValue {
    let v = evaluate(ast, st, id);
    match v {
        ConstValue::Integer { .. } | ConstValue::Error { .. } => v,
        _ => ConstValue::error("expression is not an integer constant expression"),
    }
}

fn sizeof_value(ct: &CType) -> ConstValue {
    let size = ct.size();
    if size < 0 {
        return ConstValue::error("sizeof operand has no compile-time size");
    }
    ConstValue::int(CType::size_t(), size)
}

fn evaluate_identifier(ast: &Ast, st: &SymbolTable, id: NodeId, name: &str) -> ConstValue {
    let sy = match st.lookup(ast, name, NamespaceClass::Ordinary, id) {
        Some(sy) => sy,
        None => return ConstValue::error(format!("'{}' is not a compile-time constant", name)),
    };
    // enumeration constant
    if st.is_enum_constant(ast, sy) {
        if let Some(declarer) = st.get(sy).declarer {
            if let Some(enumr) = ast.parent(declarer) {
                if let Some(value) = ast.node(enumr).enum_value {
                    return ConstValue::int(CType::basic(TypeClass::Int), value);
                }
            }
        }
        return ConstValue::error(format!("enumeration constant '{}' has no value yet", name));
    }
    // an array or function designator of static storage decays to an
    // address constant
    let ctype = st.get(sy).ctype.clone();
    if matches!(ctype.class, TypeClass::Array | TypeClass::Function)
        && st.storage_duration(ast, sy) == StorageDuration::Static
    {
        let pointee = match ctype.class {
            TypeClass::Array => ctype.pointee().clone(),
            _ => ctype.clone(),
        };
        return ConstValue::Address {
            ct: CType::pointer_to(pointee),
            symbol: sy,
            offset: 0,
        };
    }
    ConstValue::error(format!("'{}' is not a compile-time constant", name))
}

/// `&operand` as an address constant
fn evaluate_address_of(ast: &Ast, st: &SymbolTable, operand: NodeId) -> ConstValue {
    use NodeKind::*;
    match ast.kind(operand) {
        Identifier { name } => {
            let sy = match st.lookup(ast, name, NamespaceClass::Ordinary, operand) {
                Some(sy) => sy,
                None => return ConstValue::error(format!("'{}' is not defined", name)),
            };
            if st.storage_duration(ast, sy) != StorageDuration::Static {
                return ConstValue::error(
                    "address constants must refer to objects with static storage duration",
                );
            }
            ConstValue::Address {
                ct: CType::pointer_to(st.get(sy).ctype.clone()),
                symbol: sy,
                offset: 0,
            }
        }
        StringLiteral { .. } | CompoundLiteral { .. } => evaluate(ast, st, operand),
        Dereference { operand } => evaluate(ast, st, *operand),
        Subscript { base, index } => {
            let base_value = evaluate(ast, st, *base);
            let (ct, symbol, offset) = match base_value {
                ConstValue::Address { ct, symbol, offset } => (ct, symbol, offset),
                ConstValue::Error { .. } => return base_value,
                _ => return ConstValue::error("subscript base is not an address constant"),
            };
            let mut idx = evaluate_integer(ast, st, *index);
            if !idx.succeeded() {
                return idx;
            }
            idx.convert_class(TypeClass::LongLongInt);
            let elem_size = ct.pointee().size().max(0);
            ConstValue::Address {
                ct,
                symbol,
                offset: offset + idx.as_i64() * elem_size,
            }
        }
        Member { base, id } => {
            let base_value = evaluate_address_of(ast, st, *base);
            let (ct, symbol, offset) = match base_value {
                ConstValue::Address { ct, symbol, offset } => (ct, symbol, offset),
                other => return other,
            };
            let aggregate = ct.pointee();
            let member = match ast.ident(*id) {
                Some(name) => name,
                None => return ConstValue::error("malformed member access"),
            };
            match (aggregate.member_offset(member), aggregate.members.as_ref()) {
                (Some(moff), Some(members)) => {
                    let idx = members.index_of(member).unwrap();
                    ConstValue::Address {
                        ct: CType::pointer_to(members.types[idx].clone()),
                        symbol,
                        offset: offset + moff,
                    }
                }
                _ => ConstValue::error(format!("no member '{}' in aggregate", member)),
            }
        }
        _ => ConstValue::error("operand of '&' is not an address constant"),
    }
}

fn evaluate_binary(
    ast: &Ast,
    st: &SymbolTable,
    op: BinaryOp,
    lhs: NodeId,
    rhs: NodeId,
) -> ConstValue {
    use BinaryOp::*;
    let lv = evaluate(ast, st, lhs);
    if !lv.succeeded() {
        return lv;
    }
    // short-circuit forms still require a constant controlling operand
    if op == LogicalAnd && lv.equals_zero() {
        return ConstValue::int(CType::basic(TypeClass::Int), 0);
    }
    if op == LogicalOr && !lv.equals_zero() && !matches!(lv, ConstValue::Address { .. }) {
        return ConstValue::int(CType::basic(TypeClass::Int), 1);
    }
    let rv = evaluate(ast, st, rhs);
    if !rv.succeeded() {
        return rv;
    }

    // pointer arithmetic against an address constant
    if let ConstValue::Address { ct, symbol, offset } = &lv {
        if matches!(op, Add | Subtract) {
            if let ConstValue::Integer { .. } = rv {
                let elem = ct.pointee().size().max(0);
                let delta = rv.as_i64() * elem;
                return ConstValue::Address {
                    ct: ct.clone(),
                    symbol: *symbol,
                    offset: offset + if op == Add { delta } else { -delta },
                };
            }
        }
        return ConstValue::error("invalid arithmetic on an address constant");
    }
    if let ConstValue::Address { ct, symbol, offset } = &rv {
        if op == Add {
            if let ConstValue::Integer { .. } = lv {
                let elem = ct.pointee().size().max(0);
                return ConstValue::Address {
                    ct: ct.clone(),
                    symbol: *symbol,
                    offset: offset + lv.as_i64() * elem,
                };
            }
        }
        return ConstValue::error("invalid arithmetic on an address constant");
    }

    match op {
        LogicalAnd | LogicalOr => {
            let value = if op == LogicalAnd {
                !lv.equals_zero() && !rv.equals_zero()
            } else {
                !lv.equals_zero() || !rv.equals_zero()
            };
            ConstValue::int(CType::basic(TypeClass::Int), value as i64)
        }
        Less | LessEqual | Greater | GreaterEqual | Equal | NotEqual => {
            let result = compare(&lv, &rv, op);
            ConstValue::int(CType::basic(TypeClass::Int), result as i64)
        }
        _ => arithmetic_binary(&lv, &rv, op),
    }
}

fn compare(lv: &ConstValue, rv: &ConstValue, op: BinaryOp) -> bool {
    use BinaryOp::*;
    let lct = lv.ctype().cloned().unwrap_or_else(|| CType::basic(TypeClass::Int));
    let rct = rv.ctype().cloned().unwrap_or_else(|| CType::basic(TypeClass::Int));
    if lct.is_real_floating() || rct.is_real_floating() {
        let a = to_f64(lv);
        let b = to_f64(rv);
        return match op {
            Less => a < b,
            LessEqual => a <= b,
            Greater => a > b,
            GreaterEqual => a >= b,
            Equal => a == b,
            NotEqual => a != b,
            _ => false,
        };
    }
    let common = CType::usual_arithmetic_conversions(&lct, &rct);
    if common.is_unsigned_integer() {
        let (a, b) = (lv.as_u64(), rv.as_u64());
        match op {
            Less => a < b,
            LessEqual => a <= b,
            Greater => a > b,
            GreaterEqual => a >= b,
            Equal => a == b,
            NotEqual => a != b,
            _ => false,
        }
    } else {
        let (a, b) = (lv.as_i64(), rv.as_i64());
        match op {
            Less => a < b,
            LessEqual => a <= b,
            Greater => a > b,
            GreaterEqual => a >= b,
            Equal => a == b,
            NotEqual => a != b,
            _ => false,
        }
    }
}

fn to_f64(v: &ConstValue) -> f64 {
    match v {
        ConstValue::Arithmetic { value, .. } => *value,
        ConstValue::Integer { ct, .. } => {
            if ct.is_signed_integer() {
                v.as_i64() as f64
            } else {
                v.as_u64() as f64
            }
        }
        _ => 0.0,
    }
}

fn arithmetic_binary(lv: &ConstValue, rv: &ConstValue, op: BinaryOp) -> ConstValue {
    use BinaryOp::*;
    let lct = match lv.ctype() {
        Some(ct) => ct.clone(),
        None => return ConstValue::error("bad operand"),
    };
    let rct = match rv.ctype() {
        Some(ct) => ct.clone(),
        None => return ConstValue::error("bad operand"),
    };

    if !lct.is_arithmetic() || !rct.is_arithmetic() {
        return ConstValue::error("operands are not arithmetic constants");
    }

    // shifts use the promoted left operand's type
    if matches!(op, ShiftLeft | ShiftRight) {
        if !lct.is_integer() || !rct.is_integer() {
            return ConstValue::error("shift operands must be integer constants");
        }
        let result_ct = lct.integer_promotions();
        let shift = (rv.as_u64() & 63) as u32;
        let bits = if result_ct.is_unsigned_integer() {
            match op {
                ShiftLeft => lv.as_u64().wrapping_shl(shift),
                _ => lv.as_u64().wrapping_shr(shift),
            }
        } else {
            match op {
                ShiftLeft => (lv.as_i64().wrapping_shl(shift)) as u64,
                _ => (lv.as_i64().wrapping_shr(shift)) as u64,
            }
        };
        let mut out = ConstValue::Integer {
            ct: result_ct.clone(),
            bits,
        };
        out.truncate_to(&result_ct);
        return out;
    }

    let common = CType::usual_arithmetic_conversions(&lct, &rct);
    if common.is_real_floating() {
        if matches!(op, Modulo | BitAnd | BitOr | BitXor) {
            return ConstValue::error("operator requires integer constant operands");
        }
        let a = to_f64(lv);
        let b = to_f64(rv);
        let value = match op {
            Multiply => a * b,
            Divide => a / b,
            Add => a + b,
            Subtract => a - b,
            _ => return ConstValue::error("invalid floating operator"),
        };
        return ConstValue::Arithmetic { ct: common, value };
    }

    let unsigned = common.is_unsigned_integer();
    let (a_u, b_u) = (lv.as_u64(), rv.as_u64());
    let (a_s, b_s) = (lv.as_i64(), rv.as_i64());
    if matches!(op, Divide | Modulo) && b_u == 0 {
        return ConstValue::error("division by zero in constant expression");
    }
    let bits = if unsigned {
        match op {
            Multiply => a_u.wrapping_mul(b_u),
            Divide => a_u / b_u,
            Modulo => a_u % b_u,
            Add => a_u.wrapping_add(b_u),
            Subtract => a_u.wrapping_sub(b_u),
            BitAnd => a_u & b_u,
            BitOr => a_u | b_u,
            BitXor => a_u ^ b_u,
            _ => return ConstValue::error("invalid integer operator"),
        }
    } else {
        let v = match op {
            Multiply => a_s.wrapping_mul(b_s),
            Divide => a_s.wrapping_div(b_s),
            Modulo => a_s.wrapping_rem(b_s),
            Add => a_s.wrapping_add(b_s),
            Subtract => a_s.wrapping_sub(b_s),
            BitAnd => a_s & b_s,
            BitOr => a_s | b_s,
            BitXor => a_s ^ b_s,
            _ => return ConstValue::error("invalid integer operator"),
        };
        v as u64
    };
    let mut out = ConstValue::Integer {
        ct: common.clone(),
        bits,
    };
    out.truncate_to(&common);
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ast;

    fn int_node(ast: &mut Ast, value: u64) -> NodeId {
        ast.add(
            NodeKind::IntegerConstant {
                value,
                class: TypeClass::Int,
            },
            1,
            1,
        )
    }

    #[test]
    fn test_literal_roundtrip() {
        let mut ast = Ast::new();
        let st = SymbolTable::new();
        let n = int_node(&mut ast, 0x1234_5678);
        let v = evaluate(&ast, &st, n);
        assert!(v.succeeded());
        assert_eq!(v.as_i64(), 0x1234_5678);
        assert_eq!(v.serialize(), 0x1234_5678u32.to_le_bytes().to_vec());
    }

    #[test]
    fn test_arithmetic_folding() {
        let mut ast = Ast::new();
        let st = SymbolTable::new();
        let a = int_node(&mut ast, 6);
        let b = int_node(&mut ast, 7);
        let mul = ast.add(
            NodeKind::Binary {
                op: BinaryOp::Multiply,
                lhs: a,
                rhs: b,
            },
            1,
            1,
        );
        ast.link_parents(mul);
        let v = evaluate(&ast, &st, mul);
        assert_eq!(v.as_i64(), 42);
    }

    #[test]
    fn test_integer_class_conversion() {
        let mut ast = Ast::new();
        let st = SymbolTable::new();
        let n = int_node(&mut ast, 0x1FF);
        let mut v = evaluate(&ast, &st, n);
        v.convert_class(TypeClass::UnsignedChar);
        assert_eq!(v.as_u64(), 0xFF);
        v.convert_class(TypeClass::SignedChar);
        assert_eq!(v.as_i64(), -1);
    }

    #[test]
    fn test_division_by_zero_fails() {
        let mut ast = Ast::new();
        let st = SymbolTable::new();
        let a = int_node(&mut ast, 1);
        let b = int_node(&mut ast, 0);
        let div = ast.add(
            NodeKind::Binary {
                op: BinaryOp::Divide,
                lhs: a,
                rhs: b,
            },
            1,
            1,
        );
        ast.link_parents(div);
        assert!(!evaluate(&ast, &st, div).succeeded());
    }

    #[test]
    fn test_equals_zero() {
        let mut ast = Ast::new();
        let st = SymbolTable::new();
        let zero = int_node(&mut ast, 0);
        assert!(evaluate(&ast, &st, zero).equals_zero());
        let one = int_node(&mut ast, 1);
        assert!(!evaluate(&ast, &st, one).equals_zero());
    }

    #[test]
    fn test_non_constant_fails() {
        let mut ast = Ast::new();
        let st = SymbolTable::new();
        let id = ast.add(
            NodeKind::Identifier {
                name: "x".to_string(),
            },
            1,
            1,
        );
        assert!(!evaluate(&ast, &st, id).succeeded());
    }

    #[test]
    fn test_conditional_picks_branch() {
        let mut ast = Ast::new();
        let st = SymbolTable::new();
        let cond = int_node(&mut ast, 0);
        let a = int_node(&mut ast, 10);
        let b = int_node(&mut ast, 20);
        let c = ast.add(
            NodeKind::Conditional {
                condition: cond,
                then_expr: a,
                else_expr: b,
            },
            1,
            1,
        );
        ast.link_parents(c);
        assert_eq!(evaluate(&ast, &st, c).as_i64(), 20);
    }
}
