// value.rs — The native word and the tagged values exchanged across the boundary.
//
// Every native argument and return value is one untyped 64-bit word. The word
// carries no type; how it is read depends entirely on the type requested at the
// call site. TypedValue is the closed set of managed values that can be turned
// into (or read back from) such words, ValueKind is its tag without payload.

use crate::math::{Vector2, Vector3};

// ============================================================
// Native Word
// ============================================================

/// One 64-bit argument/return slot of the native calling convention.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct NativeWord(pub u64);

/// Words written back by the host for one call. Three words cover the largest
/// return type, a padded 3-component vector.
pub type NativeSlot = [NativeWord; SLOT_WORDS];

/// Number of words in a result/output slot.
pub const SLOT_WORDS: usize = 3;

impl NativeWord {
    pub const ZERO: Self = Self(0);

    /// Float in the low 32 bits, high 32 bits zero.
    pub fn from_f32(value: f32) -> Self {
        Self(value.to_bits() as u64)
    }

    /// Reinterpret the low 32 bits as a float.
    pub fn low_f32(self) -> f32 {
        f32::from_bits(self.0 as u32)
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for NativeWord {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl From<NativeWord> for u64 {
    fn from(w: NativeWord) -> Self {
        w.0
    }
}

// ============================================================
// Integer Kinds
// ============================================================

/// Width and signedness of an integer (or of an enum's underlying integer).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl IntKind {
    pub const fn is_signed(self) -> bool {
        matches!(self, IntKind::I8 | IntKind::I16 | IntKind::I32 | IntKind::I64)
    }

    pub const fn bits(self) -> u32 {
        match self {
            IntKind::I8 | IntKind::U8 => 8,
            IntKind::I16 | IntKind::U16 => 16,
            IntKind::I32 | IntKind::U32 => 32,
            IntKind::I64 | IntKind::U64 => 64,
        }
    }

    /// Sign- or zero-extend `raw` (only the low `bits()` are looked at) to a full word.
    pub const fn extend(self, raw: u64) -> u64 {
        match self {
            IntKind::I8 => raw as u8 as i8 as i64 as u64,
            IntKind::U8 => raw as u8 as u64,
            IntKind::I16 => raw as u16 as i16 as i64 as u64,
            IntKind::U16 => raw as u16 as u64,
            IntKind::I32 => raw as u32 as i32 as i64 as u64,
            IntKind::U32 => raw as u32 as u64,
            IntKind::I64 | IntKind::U64 => raw,
        }
    }

    /// Truncate a word to this width. The result is zero-extended, which is the
    /// canonical raw form stored in `EnumValue`.
    pub const fn truncate(self, word: u64) -> u64 {
        match self.bits() {
            64 => word,
            n => word & ((1u64 << n) - 1),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            IntKind::I8 => "i8",
            IntKind::U8 => "u8",
            IntKind::I16 => "i16",
            IntKind::U16 => "u16",
            IntKind::I32 => "i32",
            IntKind::U32 => "u32",
            IntKind::I64 => "i64",
            IntKind::U64 => "u64",
        }
    }
}

/// Primitive integers usable as native values and as enum representations.
pub trait NativeInt: Copy {
    const KIND: IntKind;

    /// Two's-complement bits of the value, zero-extended to 64 bits.
    fn to_raw(self) -> u64;

    /// Truncating reinterpretation of a word.
    fn from_raw(raw: u64) -> Self;
}

macro_rules! native_int {
    ($($t:ty => $kind:ident as $unsigned:ty),* $(,)?) => {
        $(
            impl NativeInt for $t {
                const KIND: IntKind = IntKind::$kind;

                #[inline]
                fn to_raw(self) -> u64 {
                    self as $unsigned as u64
                }

                #[inline]
                fn from_raw(raw: u64) -> Self {
                    raw as $unsigned as $t
                }
            }
        )*
    };
}

native_int!(
    i8 => I8 as u8,
    u8 => U8 as u8,
    i16 => I16 as u16,
    u16 => U16 as u16,
    i32 => I32 as u32,
    u32 => U32 as u32,
    i64 => I64 as u64,
    u64 => U64 as u64,
);

// ============================================================
// Enum Values
// ============================================================

/// An enum value carried by its underlying integer.
///
/// `raw` is always truncated to the width of `repr`, so two values compare equal
/// exactly when the same enum type holds the same integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub name: &'static str,
    pub repr: IntKind,
    raw: u64,
}

impl EnumValue {
    pub const fn new(name: &'static str, repr: IntKind, raw: u64) -> Self {
        Self { name, repr, raw: repr.truncate(raw) }
    }

    pub const fn raw(self) -> u64 {
        self.raw
    }
}

// ============================================================
// Typed Values
// ============================================================

/// A managed value on its way into (or out of) a native word.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    Null,
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    /// Narrowed to f32 when encoded; natives never take doubles.
    F64(f64),
    Pointer(usize),
    Str(String),
    Enum(EnumValue),
    Vector2(Vector2),
    Vector3(Vector3),
    /// Any object represented by a single native word (entities, models, ...).
    Handle(NativeWord),
}

/// The tag of a `TypedValue`, used to request a decode at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int(IntKind),
    F32,
    F64,
    Pointer,
    Str,
    Enum { name: &'static str, repr: IntKind },
    Vector2,
    Vector3,
    Handle,
}

impl TypedValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Null => ValueKind::Null,
            TypedValue::Bool(_) => ValueKind::Bool,
            TypedValue::I8(_) => ValueKind::Int(IntKind::I8),
            TypedValue::U8(_) => ValueKind::Int(IntKind::U8),
            TypedValue::I16(_) => ValueKind::Int(IntKind::I16),
            TypedValue::U16(_) => ValueKind::Int(IntKind::U16),
            TypedValue::I32(_) => ValueKind::Int(IntKind::I32),
            TypedValue::U32(_) => ValueKind::Int(IntKind::U32),
            TypedValue::I64(_) => ValueKind::Int(IntKind::I64),
            TypedValue::U64(_) => ValueKind::Int(IntKind::U64),
            TypedValue::F32(_) => ValueKind::F32,
            TypedValue::F64(_) => ValueKind::F64,
            TypedValue::Pointer(_) => ValueKind::Pointer,
            TypedValue::Str(_) => ValueKind::Str,
            TypedValue::Enum(e) => ValueKind::Enum { name: e.name, repr: e.repr },
            TypedValue::Vector2(_) => ValueKind::Vector2,
            TypedValue::Vector3(_) => ValueKind::Vector3,
            TypedValue::Handle(_) => ValueKind::Handle,
        }
    }

    /// Integer payload as an (integer kind, raw bits) pair.
    pub fn as_int(&self) -> Option<(IntKind, u64)> {
        Some(match *self {
            TypedValue::I8(v) => (IntKind::I8, v.to_raw()),
            TypedValue::U8(v) => (IntKind::U8, v.to_raw()),
            TypedValue::I16(v) => (IntKind::I16, v.to_raw()),
            TypedValue::U16(v) => (IntKind::U16, v.to_raw()),
            TypedValue::I32(v) => (IntKind::I32, v.to_raw()),
            TypedValue::U32(v) => (IntKind::U32, v.to_raw()),
            TypedValue::I64(v) => (IntKind::I64, v.to_raw()),
            TypedValue::U64(v) => (IntKind::U64, v.to_raw()),
            _ => return None,
        })
    }

    /// Build the integer variant for `kind` from raw bits.
    pub fn from_int(kind: IntKind, raw: u64) -> Self {
        match kind {
            IntKind::I8 => TypedValue::I8(NativeInt::from_raw(raw)),
            IntKind::U8 => TypedValue::U8(NativeInt::from_raw(raw)),
            IntKind::I16 => TypedValue::I16(NativeInt::from_raw(raw)),
            IntKind::U16 => TypedValue::U16(NativeInt::from_raw(raw)),
            IntKind::I32 => TypedValue::I32(NativeInt::from_raw(raw)),
            IntKind::U32 => TypedValue::U32(NativeInt::from_raw(raw)),
            IntKind::I64 => TypedValue::I64(NativeInt::from_raw(raw)),
            IntKind::U64 => TypedValue::U64(NativeInt::from_raw(raw)),
        }
    }
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int(k) => k.name(),
            ValueKind::F32 => "f32",
            ValueKind::F64 => "f64",
            ValueKind::Pointer => "pointer",
            ValueKind::Str => "string",
            ValueKind::Enum { name, .. } => name,
            ValueKind::Vector2 => "Vector2",
            ValueKind::Vector3 => "Vector3",
            ValueKind::Handle => "native handle",
        }
    }
}

macro_rules! typed_value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for TypedValue {
                fn from(v: $t) -> Self {
                    TypedValue::$variant(v)
                }
            }
        )*
    };
}

typed_value_from!(
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => Str,
    EnumValue => Enum,
    Vector2 => Vector2,
    Vector3 => Vector3,
    NativeWord => Handle,
);

impl From<&str> for TypedValue {
    fn from(v: &str) -> Self {
        TypedValue::Str(v.to_owned())
    }
}

impl<T> From<*const T> for TypedValue {
    fn from(p: *const T) -> Self {
        TypedValue::Pointer(p as usize)
    }
}

impl<T> From<*mut T> for TypedValue {
    fn from(p: *mut T) -> Self {
        TypedValue::Pointer(p as usize)
    }
}

impl<T: Into<TypedValue>> From<Option<T>> for TypedValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(TypedValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_respects_signedness() {
        assert_eq!(IntKind::I8.extend(0xFF), u64::MAX);
        assert_eq!(IntKind::U8.extend(0xFF), 0xFF);
        assert_eq!(IntKind::I32.extend(0x8000_0000), 0xFFFF_FFFF_8000_0000);
        assert_eq!(IntKind::U32.extend(0x8000_0000), 0x8000_0000);
    }

    #[test]
    fn enum_value_is_canonicalised() {
        let a = EnumValue::new("Seat", IntKind::I32, u64::MAX);
        let b = EnumValue::new("Seat", IntKind::I32, 0xFFFF_FFFF);
        assert_eq!(a, b);
        assert_eq!(a.raw(), 0xFFFF_FFFF);
    }

    #[test]
    fn int_payload_round_trips_through_kind() {
        let v = TypedValue::I16(-2);
        let (kind, raw) = v.as_int().unwrap();
        assert_eq!(TypedValue::from_int(kind, raw), v);
        assert_eq!(v.kind(), ValueKind::Int(IntKind::I16));
    }

    #[test]
    fn none_becomes_null() {
        assert_eq!(TypedValue::from(None::<i32>), TypedValue::Null);
        assert_eq!(TypedValue::from(Some(3u8)), TypedValue::U8(3));
    }
}
