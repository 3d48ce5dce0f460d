//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ecc project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Type model for the ecc compiler core
//
// Types are plain values: assigning a type to a new owner (an AST node,
// a symbol) clones it. Derived types own their referent through a Box,
// and struct/union members are held by index in parallel vectors, so a
// type graph never forms a cycle.
//

use std::fmt;

pub const POINTER_WIDTH: i64 = 8;

bitflags::bitflags! {
    /// Type qualifier set (C99 6.7.3)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Qualifiers: u8 {
        const CONST    = 1 << 0;
        const VOLATILE = 1 << 1;
        const RESTRICT = 1 << 2;
    }
}

// ============================================================================
// Type classes
// ============================================================================

/// Discriminant for every C type the analyzer can produce.
///
/// `Error` is the propagating failure class: analysis keeps walking
/// after a constraint violation and downstream checks short-circuit on
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    ShortInt,
    UnsignedShortInt,
    Int,
    UnsignedInt,
    LongInt,
    UnsignedLongInt,
    LongLongInt,
    UnsignedLongLongInt,
    Float,
    Double,
    LongDouble,
    FloatComplex,
    DoubleComplex,
    LongDoubleComplex,
    Enumerated,
    Pointer,
    Array,
    Function,
    Structure,
    Union,
    Label,
    Error,
}

// ============================================================================
// Struct/union member storage
// ============================================================================

/// Members of a complete struct or union, by declaration order.
///
/// Member order is significant: it determines layout. Bit widths are
/// recorded for constraint checking even though bit-field layout is
/// not supported.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Members {
    pub names: Vec<String>,
    pub types: Vec<CType>,
    pub bits: Vec<Option<i64>>,
}

impl Members {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Index of a named member
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

// ============================================================================
// CType
// ============================================================================

/// A C type: class, qualifier set, and the payload its class calls for
#[derive(Debug, Clone, PartialEq)]
pub struct CType {
    pub class: TypeClass,
    pub qualifiers: Qualifiers,
    /// Element / pointee / return type for array, pointer and function
    pub derived_from: Option<Box<CType>>,
    /// Function parameter types; None means no prototype
    pub params: Option<Vec<CType>>,
    pub variadic: bool,
    /// `inline` function specifier
    pub inline_fn: bool,
    /// struct/union/enum tag
    pub tag: Option<String>,
    /// struct/union members (enum constant names reuse `names`);
    /// None marks an incomplete type
    pub members: Option<Members>,
    /// Resolved array length; None for an unsized array
    pub array_length: Option<i64>,
    /// The array had a non-constant length expression (VLA)
    pub array_vla: bool,
}

impl CType {
    pub fn basic(class: TypeClass) -> Self {
        Self {
            class,
            qualifiers: Qualifiers::empty(),
            derived_from: None,
            params: None,
            variadic: false,
            inline_fn: false,
            tag: None,
            members: None,
            array_length: None,
            array_vla: false,
        }
    }

    pub fn pointer_to(pointee: CType) -> Self {
        let mut ct = Self::basic(TypeClass::Pointer);
        ct.derived_from = Some(Box::new(pointee));
        ct
    }

    pub fn array_of(element: CType, length: Option<i64>) -> Self {
        let mut ct = Self::basic(TypeClass::Array);
        ct.derived_from = Some(Box::new(element));
        ct.array_length = length;
        ct
    }

    pub fn function(ret: CType, params: Option<Vec<CType>>, variadic: bool) -> Self {
        let mut ct = Self::basic(TypeClass::Function);
        ct.derived_from = Some(Box::new(ret));
        ct.params = params;
        ct.variadic = variadic;
        ct
    }

    /// `size_t` on this target
    pub fn size_t() -> Self {
        Self::basic(TypeClass::UnsignedLongInt)
    }

    /// `ptrdiff_t` on this target
    pub fn ptrdiff_t() -> Self {
        Self::basic(TypeClass::LongInt)
    }

    /// `wchar_t` on this target
    pub fn wchar_t() -> Self {
        Self::basic(TypeClass::Int)
    }

    /// The derived-from type; panics on classes that have none
    pub fn pointee(&self) -> &CType {
        self.derived_from
            .as_deref()
            .expect("derived class without referent")
    }

    // ========================================================================
    // Class predicates
    // ========================================================================

    pub fn is_integer(&self) -> bool {
        use TypeClass::*;
        matches!(
            self.class,
            Bool | Char
                | SignedChar
                | UnsignedChar
                | ShortInt
                | UnsignedShortInt
                | Int
                | UnsignedInt
                | LongInt
                | UnsignedLongInt
                | LongLongInt
                | UnsignedLongLongInt
                | Enumerated
        )
    }

    pub fn is_signed_integer(&self) -> bool {
        use TypeClass::*;
        matches!(
            self.class,
            SignedChar | ShortInt | Int | LongInt | LongLongInt | Enumerated
        )
    }

    pub fn is_unsigned_integer(&self) -> bool {
        use TypeClass::*;
        matches!(
            self.class,
            Bool | UnsignedChar | UnsignedShortInt | UnsignedInt | UnsignedLongInt
                | UnsignedLongLongInt
        )
    }

    pub fn is_real_floating(&self) -> bool {
        use TypeClass::*;
        matches!(self.class, Float | Double | LongDouble)
    }

    /// float or double: held in XMM registers per the System-V ABI
    pub fn is_sse_floating(&self) -> bool {
        matches!(self.class, TypeClass::Float | TypeClass::Double)
    }

    pub fn is_complex(&self) -> bool {
        use TypeClass::*;
        matches!(self.class, FloatComplex | DoubleComplex | LongDoubleComplex)
    }

    pub fn is_arithmetic(&self) -> bool {
        self.is_integer() || self.is_real_floating() || self.is_complex()
    }

    pub fn is_real(&self) -> bool {
        self.is_integer() || self.is_real_floating()
    }

    pub fn is_scalar(&self) -> bool {
        self.is_arithmetic() || self.class == TypeClass::Pointer
    }

    pub fn is_character(&self) -> bool {
        use TypeClass::*;
        matches!(self.class, Char | SignedChar | UnsignedChar)
    }

    /// Compatible with `wchar_t` ignoring qualifiers
    pub fn is_wchar_compatible(&self) -> bool {
        self.compatible_ignore_qualifiers(&CType::wchar_t())
    }

    pub fn is_complete(&self) -> bool {
        match self.class {
            TypeClass::Void | TypeClass::Function | TypeClass::Label | TypeClass::Error => false,
            TypeClass::Structure | TypeClass::Union | TypeClass::Enumerated => {
                self.members.is_some()
            }
            TypeClass::Array => self.array_length.is_some() && self.pointee().is_complete(),
            _ => true,
        }
    }

    /// An object type fully describes the storage of an object: any
    /// complete type that is not a function type
    pub fn is_object_type(&self) -> bool {
        self.class != TypeClass::Function && self.is_complete()
    }

    pub fn is_vla(&self) -> bool {
        self.class == TypeClass::Array && self.array_vla
    }

    pub fn is_function_inline(&self) -> bool {
        self.class == TypeClass::Function && self.inline_fn
    }

    // ========================================================================
    // Size and alignment
    // ========================================================================

    /// Size in bytes, or -1 for incomplete and function types
    pub fn size(&self) -> i64 {
        use TypeClass::*;
        match self.class {
            Void | Function | Label | Error => -1,
            Bool | Char | SignedChar | UnsignedChar => 1,
            ShortInt | UnsignedShortInt => 2,
            Int | UnsignedInt | Float => 4,
            LongInt | UnsignedLongInt | LongLongInt | UnsignedLongLongInt | Double => 8,
            LongDouble => 16,
            FloatComplex => 8,
            DoubleComplex => 16,
            LongDoubleComplex => 32,
            Enumerated => {
                if self.members.is_some() {
                    4
                } else {
                    -1
                }
            }
            Pointer => POINTER_WIDTH,
            Array => {
                let elem = self.pointee().size();
                match self.array_length {
                    Some(n) if !self.array_vla && elem >= 0 => n * elem,
                    _ => -1,
                }
            }
            Structure => self.struct_layout().map(|(size, _)| size).unwrap_or(-1),
            Union => self.union_layout().map(|(size, _)| size).unwrap_or(-1),
        }
    }

    /// Alignment requirement in bytes (1 for incomplete types)
    pub fn alignment(&self) -> i64 {
        use TypeClass::*;
        match self.class {
            Array => self.pointee().alignment(),
            Structure | Union => self
                .members
                .as_ref()
                .map(|m| m.types.iter().map(|t| t.alignment()).max().unwrap_or(1))
                .unwrap_or(1),
            LongDouble | LongDoubleComplex => 16,
            FloatComplex => 4,
            DoubleComplex => 8,
            _ => {
                let size = self.size();
                if size > 0 {
                    size.min(POINTER_WIDTH)
                } else {
                    1
                }
            }
        }
    }

    /// Struct layout: (padded size, alignment). A trailing flexible
    /// array member contributes no size.
    fn struct_layout(&self) -> Option<(i64, i64)> {
        let members = self.members.as_ref()?;
        let mut offset = 0i64;
        let mut max_align = 1i64;
        let last = members.len().saturating_sub(1);
        for (i, mt) in members.types.iter().enumerate() {
            let size = mt.size();
            if size < 0 && !(i == last && mt.class == TypeClass::Array) {
                return None;
            }
            let align = mt.alignment().max(1);
            max_align = max_align.max(align);
            offset += (align - offset % align) % align;
            offset += size.max(0);
        }
        offset += (max_align - offset % max_align) % max_align;
        Some((offset, max_align))
    }

    fn union_layout(&self) -> Option<(i64, i64)> {
        let members = self.members.as_ref()?;
        let mut max_size = 0i64;
        let mut max_align = 1i64;
        for mt in &members.types {
            let size = mt.size();
            if size < 0 {
                return None;
            }
            max_size = max_size.max(size);
            max_align = max_align.max(mt.alignment().max(1));
        }
        max_size += (max_align - max_size % max_align) % max_align;
        Some((max_size, max_align))
    }

    /// Byte offset of a named member, None if absent. Union members
    /// all live at offset zero.
    pub fn member_offset(&self, name: &str) -> Option<i64> {
        let members = self.members.as_ref()?;
        let idx = members.index_of(name)?;
        if self.class == TypeClass::Union {
            return Some(0);
        }
        let mut offset = 0i64;
        for mt in members.types.iter().take(idx) {
            let align = mt.alignment().max(1);
            offset += (align - offset % align) % align;
            offset += mt.size().max(0);
        }
        let align = members.types[idx].alignment().max(1);
        offset += (align - offset % align) % align;
        Some(offset)
    }

    /// Resolved array length, -1 for unsized arrays
    pub fn array_length(&self) -> i64 {
        self.array_length.unwrap_or(-1)
    }

    /// True when the last member of a complete struct is an unsized array
    pub fn has_flexible_array_member(&self) -> bool {
        if self.class != TypeClass::Structure {
            return false;
        }
        match &self.members {
            Some(m) => m
                .types
                .last()
                .map(|t| t.class == TypeClass::Array && t.array_length.is_none())
                .unwrap_or(false),
            None => false,
        }
    }

    // ========================================================================
    // Integer conversion rank, promotions, UAC
    // ========================================================================

    /// Integer conversion rank (C99 6.3.1.1); 0 for non-integers
    pub fn rank(&self) -> u32 {
        use TypeClass::*;
        match self.class {
            Bool => 1,
            Char | SignedChar | UnsignedChar => 2,
            ShortInt | UnsignedShortInt => 3,
            Int | UnsignedInt | Enumerated => 4,
            LongInt | UnsignedLongInt => 5,
            LongLongInt | UnsignedLongLongInt => 6,
            _ => 0,
        }
    }

    /// Rank of a bare class
    pub fn class_rank(class: TypeClass) -> u32 {
        CType::basic(class).rank()
    }

    /// Integer promotions (C99 6.3.1.1p2): narrow integer types widen
    /// to int; everything narrower than int is representable in int on
    /// this target.
    pub fn integer_promotions(&self) -> CType {
        if self.is_integer() && self.rank() < Self::class_rank(TypeClass::Int) {
            return CType::basic(TypeClass::Int);
        }
        if self.class == TypeClass::Enumerated {
            return CType::basic(TypeClass::Int);
        }
        let mut ct = self.clone();
        ct.qualifiers = Qualifiers::empty();
        ct
    }

    /// Unsigned counterpart of a signed integer class
    fn unsigned_counterpart(class: TypeClass) -> TypeClass {
        use TypeClass::*;
        match class {
            SignedChar | Char => UnsignedChar,
            ShortInt => UnsignedShortInt,
            Int | Enumerated => UnsignedInt,
            LongInt => UnsignedLongInt,
            LongLongInt => UnsignedLongLongInt,
            other => other,
        }
    }

    /// Usual arithmetic conversions result type (C99 6.3.1.8)
    pub fn usual_arithmetic_conversions(lhs: &CType, rhs: &CType) -> CType {
        use TypeClass::*;
        let complex = lhs.is_complex() || rhs.is_complex();
        let lreal = lhs.real_class();
        let rreal = rhs.real_class();
        for class in [LongDouble, Double, Float] {
            if lreal == class || rreal == class {
                return CType::basic(Self::lift_complex(class, complex));
            }
        }
        let lp = lhs.integer_promotions();
        let rp = rhs.integer_promotions();
        if lp.class == rp.class {
            return lp;
        }
        let (ls, rs) = (lp.is_signed_integer(), rp.is_signed_integer());
        if ls == rs {
            return if lp.rank() >= rp.rank() { lp } else { rp };
        }
        let (signed_t, unsigned_t) = if ls { (lp, rp) } else { (rp, lp) };
        if unsigned_t.rank() >= signed_t.rank() {
            return unsigned_t;
        }
        // the signed type can represent the unsigned one only when it
        // is strictly wider
        if signed_t.size() > unsigned_t.size() {
            return signed_t;
        }
        CType::basic(Self::unsigned_counterpart(signed_t.class))
    }

    /// Real class underlying a complex class (identity otherwise)
    fn real_class(&self) -> TypeClass {
        use TypeClass::*;
        match self.class {
            FloatComplex => Float,
            DoubleComplex => Double,
            LongDoubleComplex => LongDouble,
            other => other,
        }
    }

    fn lift_complex(class: TypeClass, complex: bool) -> TypeClass {
        use TypeClass::*;
        if !complex {
            return class;
        }
        match class {
            Float => FloatComplex,
            Double => DoubleComplex,
            LongDouble => LongDoubleComplex,
            other => other,
        }
    }

    // ========================================================================
    // Compatibility and composition
    // ========================================================================

    /// Structural compatibility (C99 6.2.7)
    pub fn compatible(&self, other: &CType) -> bool {
        self.compatible_check(other, true)
    }

    /// Compatibility with top-level qualifiers ignored
    pub fn compatible_ignore_qualifiers(&self, other: &CType) -> bool {
        self.compatible_check(other, false)
    }

    fn compatible_check(&self, other: &CType, check_qualifiers: bool) -> bool {
        use TypeClass::*;
        if self.class == Error || other.class == Error {
            return false;
        }
        if self.class != other.class {
            return false;
        }
        if check_qualifiers && self.qualifiers != other.qualifiers {
            return false;
        }
        match self.class {
            Pointer => self.pointee().compatible(other.pointee()),
            Array => {
                if let (Some(a), Some(b)) = (self.array_length, other.array_length) {
                    if a != b {
                        return false;
                    }
                }
                self.pointee().compatible(other.pointee())
            }
            Function => {
                if !self.pointee().compatible(other.pointee()) {
                    return false;
                }
                match (&self.params, &other.params) {
                    (Some(a), Some(b)) => {
                        self.variadic == other.variadic
                            && a.len() == b.len()
                            && a.iter()
                                .zip(b.iter())
                                .all(|(x, y)| x.compatible_ignore_qualifiers(y))
                    }
                    // a prototype composes with a prototype-less
                    // declaration of the same return type
                    _ => true,
                }
            }
            Structure | Union | Enumerated => {
                if self.tag != other.tag {
                    return false;
                }
                match (&self.members, &other.members) {
                    (Some(a), Some(b)) => {
                        a.names == b.names
                            && a.types.len() == b.types.len()
                            && a.types.iter().zip(b.types.iter()).all(|(x, y)| x.compatible(y))
                    }
                    _ => true,
                }
            }
            _ => true,
        }
    }

    /// Composite of two compatible types (C99 6.2.7p3): unknown array
    /// lengths and missing prototypes are filled in from the other side.
    pub fn compose(&self, other: &CType) -> CType {
        use TypeClass::*;
        let mut out = self.clone();
        match self.class {
            Array => {
                out.array_length = self.array_length.or(other.array_length);
                out.derived_from = Some(Box::new(self.pointee().compose(other.pointee())));
            }
            Pointer => {
                out.derived_from = Some(Box::new(self.pointee().compose(other.pointee())));
            }
            Function => {
                out.derived_from = Some(Box::new(self.pointee().compose(other.pointee())));
                out.params = match (&self.params, &other.params) {
                    (Some(a), Some(b)) => Some(
                        a.iter()
                            .zip(b.iter())
                            .map(|(x, y)| x.compose(y))
                            .collect(),
                    ),
                    (Some(a), None) => Some(a.clone()),
                    (None, Some(b)) => Some(b.clone()),
                    (None, None) => None,
                };
                out.variadic = self.variadic || other.variadic;
            }
            Structure | Union | Enumerated => {
                if out.members.is_none() {
                    out.members = other.members.clone();
                }
            }
            _ => {}
        }
        out
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TypeClass::*;
        if self.qualifiers.contains(Qualifiers::CONST) {
            write!(f, "const ")?;
        }
        if self.qualifiers.contains(Qualifiers::VOLATILE) {
            write!(f, "volatile ")?;
        }
        match self.class {
            Void => write!(f, "void"),
            Bool => write!(f, "_Bool"),
            Char => write!(f, "char"),
            SignedChar => write!(f, "signed char"),
            UnsignedChar => write!(f, "unsigned char"),
            ShortInt => write!(f, "short"),
            UnsignedShortInt => write!(f, "unsigned short"),
            Int => write!(f, "int"),
            UnsignedInt => write!(f, "unsigned int"),
            LongInt => write!(f, "long"),
            UnsignedLongInt => write!(f, "unsigned long"),
            LongLongInt => write!(f, "long long"),
            UnsignedLongLongInt => write!(f, "unsigned long long"),
            Float => write!(f, "float"),
            Double => write!(f, "double"),
            LongDouble => write!(f, "long double"),
            FloatComplex => write!(f, "float _Complex"),
            DoubleComplex => write!(f, "double _Complex"),
            LongDoubleComplex => write!(f, "long double _Complex"),
            Enumerated => match &self.tag {
                Some(tag) => write!(f, "enum {}", tag),
                None => write!(f, "enum <anonymous>"),
            },
            Pointer => write!(f, "{}*", self.pointee()),
            Array => match self.array_length {
                Some(n) => write!(f, "{}[{}]", self.pointee(), n),
                None => write!(f, "{}[]", self.pointee()),
            },
            Function => {
                write!(f, "{}(", self.pointee())?;
                if let Some(params) = &self.params {
                    for (i, p) in params.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", p)?;
                    }
                    if self.variadic {
                        if !params.is_empty() {
                            write!(f, ", ")?;
                        }
                        write!(f, "...")?;
                    }
                }
                write!(f, ")")
            }
            Structure => match &self.tag {
                Some(tag) => write!(f, "struct {}", tag),
                None => write!(f, "struct <anonymous>"),
            },
            Union => match &self.tag {
                Some(tag) => write!(f, "union {}", tag),
                None => write!(f, "union <anonymous>"),
            },
            Label => write!(f, "<label>"),
            Error => write!(f, "<error>"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn int() -> CType {
        CType::basic(TypeClass::Int)
    }

    #[test]
    fn test_basic_predicates() {
        assert!(int().is_integer());
        assert!(int().is_arithmetic());
        assert!(int().is_scalar());
        assert!(!int().is_real_floating());
        assert!(CType::basic(TypeClass::Double).is_sse_floating());
        assert!(!CType::basic(TypeClass::LongDouble).is_sse_floating());
    }

    #[test]
    fn test_sizes() {
        assert_eq!(int().size(), 4);
        assert_eq!(CType::basic(TypeClass::Char).size(), 1);
        assert_eq!(CType::pointer_to(int()).size(), 8);
        assert_eq!(CType::array_of(int(), Some(3)).size(), 12);
        assert_eq!(CType::array_of(int(), None).size(), -1);
        assert_eq!(CType::basic(TypeClass::Function).size(), -1);
    }

    #[test]
    fn test_struct_layout() {
        // struct { char c; int i; short s; } -> 0, 4, 8; size 12, align 4
        let mut st = CType::basic(TypeClass::Structure);
        st.members = Some(Members {
            names: vec!["c".into(), "i".into(), "s".into()],
            types: vec![
                CType::basic(TypeClass::Char),
                int(),
                CType::basic(TypeClass::ShortInt),
            ],
            bits: vec![None, None, None],
        });
        assert_eq!(st.size(), 12);
        assert_eq!(st.alignment(), 4);
        assert_eq!(st.member_offset("c"), Some(0));
        assert_eq!(st.member_offset("i"), Some(4));
        assert_eq!(st.member_offset("s"), Some(8));
    }

    #[test]
    fn test_union_layout() {
        let mut un = CType::basic(TypeClass::Union);
        un.members = Some(Members {
            names: vec!["c".into(), "d".into()],
            types: vec![CType::basic(TypeClass::Char), CType::basic(TypeClass::Double)],
            bits: vec![None, None],
        });
        assert_eq!(un.size(), 8);
        assert_eq!(un.alignment(), 8);
        assert_eq!(un.member_offset("d"), Some(0));
    }

    #[test]
    fn test_flexible_array_member() {
        let mut st = CType::basic(TypeClass::Structure);
        st.members = Some(Members {
            names: vec!["n".into(), "data".into()],
            types: vec![int(), CType::array_of(CType::basic(TypeClass::Char), None)],
            bits: vec![None, None],
        });
        assert!(st.has_flexible_array_member());
        assert_eq!(st.size(), 4);
    }

    #[test]
    fn test_promotions() {
        assert_eq!(
            CType::basic(TypeClass::Char).integer_promotions().class,
            TypeClass::Int
        );
        assert_eq!(
            CType::basic(TypeClass::UnsignedShortInt)
                .integer_promotions()
                .class,
            TypeClass::Int
        );
        assert_eq!(
            CType::basic(TypeClass::UnsignedInt).integer_promotions().class,
            TypeClass::UnsignedInt
        );
    }

    #[test]
    fn test_uac() {
        let uac = CType::usual_arithmetic_conversions;
        assert_eq!(uac(&int(), &int()).class, TypeClass::Int);
        assert_eq!(
            uac(&int(), &CType::basic(TypeClass::UnsignedInt)).class,
            TypeClass::UnsignedInt
        );
        assert_eq!(
            uac(&CType::basic(TypeClass::UnsignedInt), &CType::basic(TypeClass::LongInt)).class,
            TypeClass::LongInt
        );
        assert_eq!(
            uac(
                &CType::basic(TypeClass::UnsignedLongInt),
                &CType::basic(TypeClass::LongLongInt)
            )
            .class,
            TypeClass::UnsignedLongLongInt
        );
        assert_eq!(
            uac(&int(), &CType::basic(TypeClass::Double)).class,
            TypeClass::Double
        );
        assert_eq!(
            uac(&CType::basic(TypeClass::Char), &CType::basic(TypeClass::ShortInt)).class,
            TypeClass::Int
        );
    }

    #[test]
    fn test_compatibility() {
        assert!(int().compatible(&int()));
        assert!(!int().compatible(&CType::basic(TypeClass::UnsignedInt)));
        let mut cint = int();
        cint.qualifiers = Qualifiers::CONST;
        assert!(!int().compatible(&cint));
        assert!(int().compatible_ignore_qualifiers(&cint));

        let a10 = CType::array_of(int(), Some(10));
        let a_unk = CType::array_of(int(), None);
        assert!(a10.compatible(&a_unk));
        assert!(!a10.compatible(&CType::array_of(int(), Some(20))));
    }

    #[test]
    fn test_composite_array_length() {
        let a10 = CType::array_of(int(), Some(10));
        let a_unk = CType::array_of(int(), None);
        let composed = a_unk.compose(&a10);
        assert_eq!(composed.array_length, Some(10));
    }

    #[test]
    fn test_pointer_qualifier_compat() {
        // const int* vs int*: pointees differ in qualifiers
        let mut cint = int();
        cint.qualifiers = Qualifiers::CONST;
        let p1 = CType::pointer_to(cint);
        let p2 = CType::pointer_to(int());
        assert!(!p1.compatible(&p2));
    }

    #[test]
    fn test_display() {
        assert_eq!(int().to_string(), "int");
        assert_eq!(CType::pointer_to(int()).to_string(), "int*");
        assert_eq!(
            CType::array_of(CType::basic(TypeClass::Char), Some(3)).to_string(),
            "char[3]"
        );
    }
}
