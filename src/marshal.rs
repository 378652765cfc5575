// marshal.rs — Call arguments and caller-owned output slots.
//
// A call takes an ordered list of `CallArgument`s. Most arguments are plain
// values; an `OutputArgument` is passed as the address of a 24-byte slot the
// native writes its result into. The slot is heap-allocated and never moves,
// so the address stays valid across the call and until `release`.

use crate::codec::{self, FromNative};
use crate::error::{Error, Result};
use crate::host::StringPinning;
use crate::math::{Vector2, Vector3};
use crate::value::{EnumValue, NativeSlot, NativeWord, TypedValue, ValueKind, SLOT_WORDS};
use std::marker::PhantomData;

/// Size in bytes of an output slot. Large enough for a padded 3-vector.
pub const OUTPUT_SLOT_SIZE: usize = SLOT_WORDS * 8;

// ============================================================
// Call Arguments
// ============================================================

/// One argument of a native call.
///
/// The lifetime ties arguments built from an `OutputArgument` to it, so the
/// output slot cannot be dropped while a call that writes into it is pending.
#[derive(Clone, Debug, PartialEq)]
pub struct CallArgument<'a> {
    value: TypedValue,
    _borrow: PhantomData<&'a mut NativeSlot>,
}

impl<'a> CallArgument<'a> {
    pub fn new(value: TypedValue) -> Self {
        Self { value, _borrow: PhantomData }
    }

    pub fn value(&self) -> &TypedValue {
        &self.value
    }
}

impl<'a> From<TypedValue> for CallArgument<'a> {
    fn from(value: TypedValue) -> Self {
        Self::new(value)
    }
}

macro_rules! call_argument_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl<'a> From<$t> for CallArgument<'a> {
                fn from(v: $t) -> Self {
                    Self::new(TypedValue::from(v))
                }
            }
        )*
    };
}

call_argument_from!(
    bool, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64,
    String, &str, EnumValue, Vector2, Vector3, NativeWord,
);

impl<'a, T> From<*const T> for CallArgument<'a> {
    fn from(p: *const T) -> Self {
        Self::new(TypedValue::from(p))
    }
}

impl<'a, T> From<*mut T> for CallArgument<'a> {
    fn from(p: *mut T) -> Self {
        Self::new(TypedValue::from(p))
    }
}

impl<'a> From<&'a mut OutputArgument> for CallArgument<'a> {
    /// The slot's address; null once the slot has been released.
    fn from(out: &'a mut OutputArgument) -> Self {
        Self::new(TypedValue::Pointer(out.as_mut_ptr() as usize))
    }
}

/// Encode `args` into one word each, in order.
pub fn build_word_array(args: &[CallArgument<'_>], pins: &dyn StringPinning) -> Result<Vec<NativeWord>> {
    args.iter().map(|a| codec::encode(&a.value, pins)).collect()
}

// ============================================================
// Output Arguments
// ============================================================

/// A caller-owned result slot passed to natives by address.
#[derive(Debug)]
pub struct OutputArgument {
    storage: Option<Box<NativeSlot>>,
}

impl Default for OutputArgument {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputArgument {
    /// A zero-filled slot.
    pub fn new() -> Self {
        Self { storage: Some(Box::new([NativeWord::ZERO; SLOT_WORDS])) }
    }

    /// A slot whose first word is pre-seeded with the encoding of `value`,
    /// for natives that read the slot before writing it.
    pub fn with_value(value: impl Into<TypedValue>, pins: &dyn StringPinning) -> Result<Self> {
        let word = codec::encode(&value.into(), pins)?;
        let mut out = Self::new();
        if let Some(slot) = out.storage.as_mut() {
            slot[0] = word;
        }
        Ok(out)
    }

    /// Free the slot. Safe to call more than once.
    pub fn release(&mut self) {
        self.storage = None;
    }

    pub fn is_released(&self) -> bool {
        self.storage.is_none()
    }

    /// Address of the slot, or null once released.
    pub fn as_mut_ptr(&mut self) -> *mut NativeWord {
        match self.storage.as_mut() {
            Some(slot) => slot.as_mut_ptr(),
            None => std::ptr::null_mut(),
        }
    }

    /// Raw words currently in the slot.
    pub fn words(&self) -> Result<&NativeSlot> {
        self.storage.as_deref().ok_or(Error::OutputReleased)
    }

    /// Decode the slot as `T`, with the same rules as a call result.
    ///
    /// # Safety
    /// See `FromNative::from_native`: a string result must point to readable,
    /// NUL-terminated memory.
    pub unsafe fn result<T: FromNative>(&self) -> Result<T> {
        Ok(T::from_native(self.words()?))
    }

    /// Decode the slot as a runtime-selected kind.
    ///
    /// # Safety
    /// Same as `result`.
    pub unsafe fn result_as(&self, kind: ValueKind) -> Result<TypedValue> {
        codec::decode(kind, self.words()?)
    }
}
