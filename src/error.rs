// error.rs — Error type shared by the codec, dispatcher, offset table and globals.
//
// Two classes of failure exist at this layer:
//   1. Programmer / context errors (bad conversion, wrong thread) which are
//      surfaced to the caller immediately and never retried.
//   2. "Not available" conditions (unknown offset for this game build) which the
//      memory accessors swallow and turn into default values.
// A zero address is never an error: it is the "object gone" sentinel and is
// handled by every accessor without reaching this type.

use crate::offsets::{FieldId, GameVersion};

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the native bridge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A value kind has no encode/decode rule at the native boundary.
    #[error("unable to convert between a native value and `{type_name}`")]
    UnsupportedConversion {
        /// Name of the offending type or value kind
        type_name: &'static str,
    },

    /// The host refused the call because it came from outside the script thread.
    #[error("native functions can only be called from the main script thread")]
    WrongThread,

    /// The running game build predates every known offset for the field.
    #[error("no offset known for {field:?} on game version {version}")]
    NoOffsetKnown {
        /// Field that was looked up
        field: FieldId,
        /// Version reported by the host
        version: GameVersion,
    },

    /// An output argument was read after its storage was released.
    #[error("output argument storage has already been released")]
    OutputReleased,

    /// No process-wide runtime has been installed yet.
    #[error("no native host has been installed")]
    HostNotInstalled,

    /// `runtime::install` was called twice.
    #[error("a native host is already installed")]
    HostAlreadyInstalled,

    /// A host service could not be resolved (missing module or export).
    #[error("native host unavailable: {what}")]
    HostUnavailable {
        /// What could not be resolved
        what: &'static str,
    },

    /// No global variable exists at the index.
    #[error("the index {index} does not correspond to an existing global variable")]
    GlobalNotFound {
        /// Requested global index
        index: i32,
    },

    /// Bit operations on a global only cover one 64-bit slot.
    #[error("bit index {index} is outside 0..=63")]
    BitIndexOutOfRange {
        /// Requested bit index
        index: i32,
    },

    /// Global strings are stored in 8-byte aligned buffers of at most 64 bytes.
    #[error("string maximum size {size} is not one of 8, 16, 24, 32, 40, 48, 56 or 64")]
    InvalidStringSize {
        /// Requested maximum size
        size: i32,
    },

    /// Array item size must be positive.
    #[error("array item size {size} must be positive")]
    InvalidItemSize {
        /// Requested item size
        size: i32,
    },

    /// The global does not start with a plausible element count.
    #[error("the global variable does not seem to be an array")]
    NotAnArray,

    /// Array index outside the stored element count.
    #[error("index {index} is outside the array bounds (count {len})")]
    IndexOutOfRange {
        /// Requested index
        index: i32,
        /// Element count stored in the array header
        len: i32,
    },

    /// Strings must go through `GlobalVariable::write_string`.
    #[error("string values cannot be written with `write`, use `write_string`")]
    StringWriteUnsupported,
}
