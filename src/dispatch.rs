// dispatch.rs — Calling natives by hash.
//
//   args --encode--> word array --host.invoke--> result slot --decode--> T
//
// The host returns NO_RESULT (None) when a call is made off the script thread;
// that surfaces as `Error::WrongThread`, never as a zero value.

use crate::codec::{self, FromNative};
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::host::{NativeInvoker, StringPinning};
use crate::marshal::{build_word_array, CallArgument};
use crate::value::{NativeSlot, TypedValue, ValueKind};

fn dispatch(
    invoker: &dyn NativeInvoker,
    pins: &dyn StringPinning,
    hash: Hash,
    args: &[CallArgument<'_>],
) -> Result<NativeSlot> {
    let words = build_word_array(args, pins)?;
    tracing::debug!(%hash, argc = words.len(), "native call");
    invoker.invoke(hash.0, &words).ok_or_else(|| {
        tracing::warn!(%hash, "native called outside the script thread");
        Error::WrongThread
    })
}

/// Call `hash` and decode the first result word(s) as `T`.
///
/// # Safety
/// The native must actually return something decodable as `T`; for strings
/// that means a null or readable NUL-terminated pointer.
pub unsafe fn call<T: FromNative>(
    invoker: &dyn NativeInvoker,
    pins: &dyn StringPinning,
    hash: Hash,
    args: &[CallArgument<'_>],
) -> Result<T> {
    let slot = dispatch(invoker, pins, hash, args)?;
    Ok(T::from_native(&slot))
}

/// Call `hash` and discard its result.
pub fn invoke(
    invoker: &dyn NativeInvoker,
    pins: &dyn StringPinning,
    hash: Hash,
    args: &[CallArgument<'_>],
) -> Result<()> {
    dispatch(invoker, pins, hash, args).map(drop)
}

/// Call `hash` and decode the result as a runtime-selected kind.
///
/// A kind with no decode rule is rejected before the native runs.
///
/// # Safety
/// Same as `call`.
pub unsafe fn call_as(
    invoker: &dyn NativeInvoker,
    pins: &dyn StringPinning,
    hash: Hash,
    args: &[CallArgument<'_>],
    kind: ValueKind,
) -> Result<TypedValue> {
    if !codec::can_decode(kind) {
        return Err(Error::UnsupportedConversion { type_name: kind.name() });
    }
    let slot = dispatch(invoker, pins, hash, args)?;
    codec::decode(kind, &slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PinnedStrings;
    use crate::math::Vector3;
    use crate::mock::ScriptedInvoker;
    use crate::value::NativeWord;

    const SOME_NATIVE: Hash = Hash(0x1122_3344_5566_7788);

    #[test]
    fn result_is_decoded_as_requested() {
        let pins = PinnedStrings::new();
        let host = ScriptedInvoker::returning([NativeWord(0x2A), NativeWord::ZERO, NativeWord::ZERO]);
        let v: i32 = unsafe { call(&host, &pins, SOME_NATIVE, &[5i32.into()]) }.unwrap();
        assert_eq!(v, 42);
        let calls = host.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, SOME_NATIVE.0);
        assert_eq!(calls[0].1, vec![NativeWord(5)]);
    }

    #[test]
    fn zero_result_is_not_no_result() {
        let pins = PinnedStrings::new();
        let host = ScriptedInvoker::returning([NativeWord::ZERO; 3]);
        assert_eq!(unsafe { call::<i32>(&host, &pins, SOME_NATIVE, &[]) }, Ok(0));
        assert_eq!(invoke(&host, &pins, SOME_NATIVE, &[]), Ok(()));
    }

    #[test]
    fn off_thread_calls_fail() {
        let pins = PinnedStrings::new();
        let host = ScriptedInvoker::off_thread();
        assert_eq!(unsafe { call::<i32>(&host, &pins, SOME_NATIVE, &[]) }, Err(Error::WrongThread));
        assert_eq!(invoke(&host, &pins, SOME_NATIVE, &[1i32.into()]), Err(Error::WrongThread));
    }

    #[test]
    fn vector_results_use_three_words() {
        let pins = PinnedStrings::new();
        let host = ScriptedInvoker::returning([
            NativeWord::from_f32(10.0),
            NativeWord::from_f32(20.0),
            NativeWord::from_f32(30.0),
        ]);
        let v: Vector3 = unsafe { call(&host, &pins, SOME_NATIVE, &[]) }.unwrap();
        assert_eq!(v, Vector3::new(10.0, 20.0, 30.0));
    }

    #[test]
    fn undecodable_kind_never_reaches_the_host() {
        let pins = PinnedStrings::new();
        let host = ScriptedInvoker::returning([NativeWord::ZERO; 3]);
        let err = unsafe { call_as(&host, &pins, SOME_NATIVE, &[], ValueKind::Null) }.unwrap_err();
        assert_eq!(err, Error::UnsupportedConversion { type_name: "null" });
        assert!(host.calls().is_empty());
    }

    #[test]
    fn unencodable_argument_never_reaches_the_host() {
        let pins = PinnedStrings::new();
        let host = ScriptedInvoker::returning([NativeWord::ZERO; 3]);
        let err = invoke(&host, &pins, SOME_NATIVE, &[Vector3::ZERO.into()]).unwrap_err();
        assert_eq!(err, Error::UnsupportedConversion { type_name: "Vector3" });
        assert!(host.calls().is_empty());
    }
}
