// codec.rs — Conversion between managed values and native words.
//
// Encoding (value -> word):
//   bool            -> exactly 1 or 0
//   integers        -> sign/zero-extended to 64 bits by the source type
//   f32 / f64       -> f32 bits in the low half, high half zero (f64 is narrowed)
//   enums           -> their underlying integer, extended by its signedness
//   strings         -> pointer to a pinned NUL-terminated copy
//   handles         -> their native word, unchanged
//   null            -> 0
//   vectors         -> not representable as one argument word
//
// Decoding (slot -> value) is driven by the requested type. Vectors are read
// from the padded layout natives write back: every component sits in its own
// 8-byte slot, so X/Y/Z live at byte offsets 0/8/16 of the result slot.
//
// The statically-typed path is the `FromNative` trait; `decode` is the same set
// of rules selected by a runtime `ValueKind`.

use crate::error::{Error, Result};
use crate::host::StringPinning;
use crate::math::{Vector2, Vector3};
use crate::value::{EnumValue, NativeInt, NativeSlot, NativeWord, TypedValue, ValueKind};
use std::ffi::{c_char, CStr};

// ============================================================
// Encoding
// ============================================================

/// Encode one value into a native word, pinning strings through `pins`.
pub fn encode(value: &TypedValue, pins: &dyn StringPinning) -> Result<NativeWord> {
    match value {
        TypedValue::Str(s) => Ok(NativeWord(pins.pin(s) as usize as u64)),
        other => encode_scalar(other),
    }
}

/// Encode a value that needs no pinning. Strings are rejected here.
pub fn encode_scalar(value: &TypedValue) -> Result<NativeWord> {
    let word = match *value {
        TypedValue::Null => 0,
        TypedValue::Bool(b) => b as u64,
        TypedValue::F32(f) => return Ok(NativeWord::from_f32(f)),
        TypedValue::F64(f) => return Ok(NativeWord::from_f32(f as f32)),
        TypedValue::Pointer(p) => p as u64,
        TypedValue::Enum(e) => e.repr.extend(e.raw()),
        TypedValue::Handle(w) => return Ok(w),
        TypedValue::Str(_) | TypedValue::Vector2(_) | TypedValue::Vector3(_) => {
            return Err(unsupported(value.kind()));
        }
        _ => match value.as_int() {
            Some((kind, raw)) => kind.extend(raw),
            None => return Err(unsupported(value.kind())),
        },
    };
    Ok(NativeWord(word))
}

// ============================================================
// Decoding
// ============================================================

/// Whether `kind` has a decode rule.
pub fn can_decode(kind: ValueKind) -> bool {
    !matches!(kind, ValueKind::Null)
}

/// Decode a result slot as `kind`.
///
/// # Safety
/// When `kind` is `Str`, the first word must be null or point to a readable
/// NUL-terminated byte sequence.
pub unsafe fn decode(kind: ValueKind, slot: &NativeSlot) -> Result<TypedValue> {
    let word = slot[0];
    Ok(match kind {
        ValueKind::Bool => TypedValue::Bool(!word.is_zero()),
        ValueKind::Pointer => TypedValue::Pointer(word.0 as usize),
        ValueKind::Enum { name, repr } => TypedValue::Enum(EnumValue::new(name, repr, word.0)),
        ValueKind::Int(k) => TypedValue::from_int(k, k.truncate(word.0)),
        ValueKind::F32 => TypedValue::F32(word.low_f32()),
        ValueKind::F64 => TypedValue::F64(word.low_f32() as f64),
        ValueKind::Vector2 => TypedValue::Vector2(Vector2::from_native(slot)),
        ValueKind::Vector3 => TypedValue::Vector3(Vector3::from_native(slot)),
        ValueKind::Str => TypedValue::Str(read_c_string(word.0 as usize as *const c_char)),
        ValueKind::Handle => TypedValue::Handle(word),
        ValueKind::Null => return Err(unsupported(kind)),
    })
}

/// Copy a NUL-terminated UTF-8 string out of native memory. Null reads as "".
///
/// # Safety
/// `ptr` must be null or point to a readable NUL-terminated byte sequence.
pub unsafe fn read_c_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

fn unsupported(kind: ValueKind) -> Error {
    tracing::warn!(kind = kind.name(), "no native conversion for value kind");
    Error::UnsupportedConversion { type_name: kind.name() }
}

// ============================================================
// Typed Decoding
// ============================================================

/// Types that can be read back from a native result slot.
pub trait FromNative: Sized {
    /// # Safety
    /// Pointer-carrying types (strings) require the word to be null or point
    /// to a readable NUL-terminated byte sequence.
    unsafe fn from_native(slot: &NativeSlot) -> Self;
}

impl FromNative for () {
    unsafe fn from_native(_: &NativeSlot) -> Self {}
}

impl FromNative for bool {
    /// Any non-zero bit in the full word is `true`.
    unsafe fn from_native(slot: &NativeSlot) -> Self {
        !slot[0].is_zero()
    }
}

macro_rules! from_native_int {
    ($($t:ty),*) => {
        $(
            impl FromNative for $t {
                unsafe fn from_native(slot: &NativeSlot) -> Self {
                    <$t as NativeInt>::from_raw(slot[0].0)
                }
            }
        )*
    };
}

from_native_int!(i8, u8, i16, u16, i32, u32, i64, u64);

impl FromNative for f32 {
    unsafe fn from_native(slot: &NativeSlot) -> Self {
        slot[0].low_f32()
    }
}

impl FromNative for f64 {
    unsafe fn from_native(slot: &NativeSlot) -> Self {
        slot[0].low_f32() as f64
    }
}

impl FromNative for NativeWord {
    unsafe fn from_native(slot: &NativeSlot) -> Self {
        slot[0]
    }
}

impl<T> FromNative for *const T {
    unsafe fn from_native(slot: &NativeSlot) -> Self {
        slot[0].0 as usize as *const T
    }
}

impl<T> FromNative for *mut T {
    unsafe fn from_native(slot: &NativeSlot) -> Self {
        slot[0].0 as usize as *mut T
    }
}

impl FromNative for String {
    unsafe fn from_native(slot: &NativeSlot) -> Self {
        read_c_string(slot[0].0 as usize as *const c_char)
    }
}

impl FromNative for Vector2 {
    unsafe fn from_native(slot: &NativeSlot) -> Self {
        Vector2::new(slot[0].low_f32(), slot[1].low_f32())
    }
}

impl FromNative for Vector3 {
    unsafe fn from_native(slot: &NativeSlot) -> Self {
        Vector3::new(slot[0].low_f32(), slot[1].low_f32(), slot[2].low_f32())
    }
}

// ============================================================
// Native Handle Objects
// ============================================================

/// Objects represented by exactly one native word.
///
/// `from_native_value` must rebuild the whole object from that word alone;
/// there is no other state to restore it from.
pub trait NativeValue: Sized {
    fn native_value(&self) -> NativeWord;
    fn from_native_value(word: NativeWord) -> Self;
}

/// Wire a `NativeValue` type into argument encoding and result decoding.
#[macro_export]
macro_rules! impl_native_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl $crate::codec::FromNative for $t {
                unsafe fn from_native(slot: &$crate::value::NativeSlot) -> Self {
                    <$t as $crate::codec::NativeValue>::from_native_value(slot[0])
                }
            }

            impl ::std::convert::From<$t> for $crate::value::TypedValue {
                fn from(v: $t) -> Self {
                    $crate::value::TypedValue::Handle($crate::codec::NativeValue::native_value(&v))
                }
            }

            impl ::std::convert::From<&$t> for $crate::value::TypedValue {
                fn from(v: &$t) -> Self {
                    $crate::value::TypedValue::Handle($crate::codec::NativeValue::native_value(v))
                }
            }

            impl<'a> ::std::convert::From<$t> for $crate::marshal::CallArgument<'a> {
                fn from(v: $t) -> Self {
                    $crate::marshal::CallArgument::new(v.into())
                }
            }

            impl<'a> ::std::convert::From<&$t> for $crate::marshal::CallArgument<'a> {
                fn from(v: &$t) -> Self {
                    $crate::marshal::CallArgument::new(v.into())
                }
            }
        )*
    };
}

/// Declare an open enum: a newtype over an integer with named values.
///
/// Any integer is a valid value (the game may hand back values this crate has
/// no name for), and encoding/decoding follows the underlying integer's rules.
#[macro_export]
macro_rules! native_enum {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($repr:ty) {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis struct $name(pub $repr);

        impl $name {
            $($(#[$vmeta])* pub const $variant: Self = Self($value);)*

            pub const fn value(self) -> $repr {
                self.0
            }

            pub fn to_enum_value(self) -> $crate::value::EnumValue {
                $crate::value::EnumValue::new(
                    stringify!($name),
                    <$repr as $crate::value::NativeInt>::KIND,
                    $crate::value::NativeInt::to_raw(self.0),
                )
            }

            pub const fn kind() -> $crate::value::ValueKind {
                $crate::value::ValueKind::Enum {
                    name: stringify!($name),
                    repr: <$repr as $crate::value::NativeInt>::KIND,
                }
            }
        }

        impl $crate::codec::FromNative for $name {
            unsafe fn from_native(slot: &$crate::value::NativeSlot) -> Self {
                Self(<$repr as $crate::value::NativeInt>::from_raw(slot[0].0))
            }
        }

        impl ::std::convert::From<$name> for $crate::value::TypedValue {
            fn from(v: $name) -> Self {
                $crate::value::TypedValue::Enum(v.to_enum_value())
            }
        }

        impl<'a> ::std::convert::From<$name> for $crate::marshal::CallArgument<'a> {
            fn from(v: $name) -> Self {
                $crate::marshal::CallArgument::new(v.into())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PinnedStrings;
    use crate::value::IntKind;

    native_enum! {
        struct Seat(i32) {
            DRIVER = -1,
            PASSENGER = 0,
        }
    }

    fn slot_of(word: NativeWord) -> NativeSlot {
        [word, NativeWord::ZERO, NativeWord::ZERO]
    }

    fn round_trip(v: TypedValue) -> TypedValue {
        let word = encode_scalar(&v).unwrap();
        unsafe { decode(v.kind(), &slot_of(word)).unwrap() }
    }

    #[test]
    fn integer_boundaries_round_trip() {
        let values = [
            TypedValue::I8(i8::MIN),
            TypedValue::U8(u8::MAX),
            TypedValue::I16(i16::MIN),
            TypedValue::U16(u16::MAX),
            TypedValue::I32(i32::MIN),
            TypedValue::I32(i32::MAX),
            TypedValue::U32(u32::MAX),
            TypedValue::I64(i64::MIN),
            TypedValue::U64(u64::MAX),
            TypedValue::Bool(true),
            TypedValue::Bool(false),
            TypedValue::Pointer(0xDEAD_BEEF),
            TypedValue::Handle(NativeWord(0x1234_5678_9ABC)),
            TypedValue::Enum(Seat::DRIVER.to_enum_value()),
        ];
        for v in values {
            assert_eq!(round_trip(v.clone()), v);
        }
    }

    #[test]
    fn signed_integers_are_sign_extended() {
        assert_eq!(encode_scalar(&TypedValue::I32(-1)).unwrap(), NativeWord(u64::MAX));
        assert_eq!(encode_scalar(&TypedValue::U32(u32::MAX)).unwrap(), NativeWord(0xFFFF_FFFF));
        assert_eq!(encode_scalar(&TypedValue::I8(-2)).unwrap(), NativeWord(0xFFFF_FFFF_FFFF_FFFE));
    }

    #[test]
    fn float_special_values_keep_their_bits() {
        for f in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, -0.0, f32::MIN_POSITIVE] {
            let word = encode_scalar(&TypedValue::F32(f)).unwrap();
            assert_eq!(word.0 >> 32, 0, "high half must stay zero");
            match round_trip(TypedValue::F32(f)) {
                TypedValue::F32(back) => assert_eq!(back.to_bits(), f.to_bits()),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn doubles_are_narrowed_to_floats() {
        let wide = 1.0000000001f64;
        let a = encode_scalar(&TypedValue::F64(wide)).unwrap();
        let b = encode_scalar(&TypedValue::F32(wide as f32)).unwrap();
        assert_eq!(a, b);
        assert_eq!(unsafe { f32::from_native(&slot_of(a)) }, wide as f32);
    }

    #[test]
    fn true_is_always_one() {
        assert_eq!(encode_scalar(&TypedValue::Bool(true)).unwrap(), NativeWord(1));
        assert_eq!(encode_scalar(&TypedValue::Bool(false)).unwrap(), NativeWord(0));
        for w in [1u64, 2, 0x100, 0x8000_0000_0000_0000] {
            assert!(unsafe { bool::from_native(&slot_of(NativeWord(w))) });
        }
    }

    #[test]
    fn bool_decode_looks_at_the_whole_word() {
        // Low 32 bits zero, high bits set: still true.
        assert!(unsafe { bool::from_native(&slot_of(NativeWord(0x1_0000_0000))) });
    }

    #[test]
    fn vectors_decode_from_padded_slots() {
        let slot = [
            NativeWord::from_f32(1.5),
            NativeWord::from_f32(2.5),
            NativeWord::from_f32(3.5),
        ];
        assert_eq!(unsafe { Vector3::from_native(&slot) }, Vector3::new(1.5, 2.5, 3.5));
        assert_eq!(unsafe { Vector2::from_native(&slot) }, Vector2::new(1.5, 2.5));
    }

    #[test]
    fn vectors_are_not_argument_words() {
        let err = encode_scalar(&TypedValue::Vector3(Vector3::ZERO)).unwrap_err();
        assert_eq!(err, Error::UnsupportedConversion { type_name: "Vector3" });
    }

    #[test]
    fn null_has_no_decode_rule() {
        let err = unsafe { decode(ValueKind::Null, &slot_of(NativeWord(5))) }.unwrap_err();
        assert_eq!(err, Error::UnsupportedConversion { type_name: "null" });
        assert_eq!(encode_scalar(&TypedValue::Null).unwrap(), NativeWord::ZERO);
    }

    #[test]
    fn enum_decode_truncates_to_the_underlying_type() {
        let word = NativeWord(0xAAAA_AAAA_FFFF_FFFF);
        assert_eq!(unsafe { Seat::from_native(&slot_of(word)) }, Seat::DRIVER);
        let dynamic = unsafe { decode(Seat::kind(), &slot_of(word)).unwrap() };
        assert_eq!(dynamic, TypedValue::Enum(EnumValue::new("Seat", IntKind::I32, 0xFFFF_FFFF)));
    }

    #[test]
    fn strings_go_through_the_pinning_table() {
        let pins = PinnedStrings::new();
        let word = encode(&TypedValue::from("abc"), &pins).unwrap();
        assert_ne!(word, NativeWord::ZERO);
        assert_eq!(unsafe { String::from_native(&slot_of(word)) }, "abc");
        assert_eq!(unsafe { String::from_native(&slot_of(NativeWord::ZERO)) }, "");
        assert!(encode_scalar(&TypedValue::from("abc")).is_err());
    }
}
