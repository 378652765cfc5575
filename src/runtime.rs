// runtime.rs — The host services bundled together, and the process-wide instance.
//
// Entity wrappers and globals take a `&Runtime` and reach every host service
// through it. A DLL installs exactly one runtime when its script starts; tests build
// their own and pass it around directly.

use crate::codec::FromNative;
use crate::dispatch;
use crate::error::{Error, Result};
use crate::field::{FieldAccessor, VersionedFields};
use crate::globals::GlobalVariable;
use crate::hash::Hash;
use crate::host::{FixedVersion, MemoryIo, NativeInvoker, PinnedStrings, StringPinning, VersionDetector};
use crate::marshal::CallArgument;
use crate::offsets::{FieldId, FieldLocation, GameVersion, VersionedOffsetTable};
use crate::value::{TypedValue, ValueKind};
use once_cell::sync::OnceCell;

pub struct Runtime {
    invoker: Box<dyn NativeInvoker>,
    pins: Box<dyn StringPinning>,
    memory: Box<dyn MemoryIo>,
    version: Box<dyn VersionDetector>,
    offsets: VersionedOffsetTable,
}

impl Runtime {
    /// A runtime over the given host, with the default string table and the
    /// built-in offset table.
    pub fn new(
        invoker: impl NativeInvoker + 'static,
        memory: impl MemoryIo + 'static,
        version: impl VersionDetector + 'static,
    ) -> Self {
        Self {
            invoker: Box::new(invoker),
            pins: Box::new(PinnedStrings::new()),
            memory: Box::new(memory),
            version: Box::new(version),
            offsets: VersionedOffsetTable::builtin().clone(),
        }
    }

    pub fn with_string_pinning(mut self, pins: impl StringPinning + 'static) -> Self {
        self.pins = Box::new(pins);
        self
    }

    pub fn with_offsets(mut self, offsets: VersionedOffsetTable) -> Self {
        self.offsets = offsets;
        self
    }

    /// Report `version` regardless of what the host detects.
    pub fn with_version_override(mut self, version: GameVersion) -> Self {
        self.version = Box::new(FixedVersion(version));
        self
    }

    /// # Safety
    /// See `dispatch::call`.
    pub unsafe fn call<T: FromNative>(&self, hash: Hash, args: &[CallArgument<'_>]) -> Result<T> {
        dispatch::call(self.invoker.as_ref(), self.pins.as_ref(), hash, args)
    }

    pub fn invoke(&self, hash: Hash, args: &[CallArgument<'_>]) -> Result<()> {
        dispatch::invoke(self.invoker.as_ref(), self.pins.as_ref(), hash, args)
    }

    /// # Safety
    /// See `dispatch::call_as`.
    pub unsafe fn call_as(&self, hash: Hash, args: &[CallArgument<'_>], kind: ValueKind) -> Result<TypedValue> {
        dispatch::call_as(self.invoker.as_ref(), self.pins.as_ref(), hash, args, kind)
    }

    pub fn game_version(&self) -> GameVersion {
        self.version.game_version()
    }

    pub fn string_pinning(&self) -> &dyn StringPinning {
        self.pins.as_ref()
    }

    pub fn memory(&self) -> &dyn MemoryIo {
        self.memory.as_ref()
    }

    pub fn offsets(&self) -> &VersionedOffsetTable {
        &self.offsets
    }

    /// Offset of `field` for the running game build.
    pub fn resolve_offset(&self, field: FieldId) -> Result<FieldLocation> {
        self.offsets.locate(field, self.game_version())
    }

    /// The script global at `index`.
    pub fn global(&self, index: i32) -> Result<GlobalVariable<'_>> {
        GlobalVariable::get(self.memory(), index)
    }

    pub fn accessor(&self) -> FieldAccessor<'_> {
        FieldAccessor::new(self.memory())
    }

    /// Version-resolved field access on the running game build.
    pub fn fields(&self) -> VersionedFields<'_> {
        VersionedFields::new(self.memory(), &self.offsets, self.game_version())
    }
}

// ============================================================
// Process-Wide Instance
// ============================================================

static RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// Install the process-wide runtime. Only the first call succeeds.
pub fn install(runtime: Runtime) -> Result<&'static Runtime> {
    let mut fresh = false;
    let rt = RUNTIME.get_or_init(|| {
        fresh = true;
        runtime
    });
    if !fresh {
        return Err(Error::HostAlreadyInstalled);
    }
    tracing::info!(version = %rt.game_version(), "runtime installed");
    Ok(rt)
}

/// The installed runtime.
pub fn current() -> Result<&'static Runtime> {
    RUNTIME.get().ok_or(Error::HostNotInstalled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{word, ArenaMemory, ScriptedInvoker};

    fn runtime() -> Runtime {
        Runtime::new(
            ScriptedInvoker::returning(word(7)),
            ArenaMemory::new(16),
            FixedVersion(GameVersion::V1_0_944_2_STEAM),
        )
    }

    #[test]
    fn offsets_follow_the_detected_version() {
        let rt = runtime();
        assert_eq!(rt.resolve_offset(FieldId::PedArmor).unwrap().offset, 0x14B0);
        let rt = rt.with_version_override(GameVersion::V1_0_335_2_STEAM);
        assert_eq!(rt.resolve_offset(FieldId::PedArmor).unwrap().offset, 0x1464);
    }

    #[test]
    fn unknown_version_has_no_offsets() {
        let rt = runtime().with_version_override(GameVersion::UNKNOWN);
        assert!(matches!(rt.resolve_offset(FieldId::PedArmor), Err(Error::NoOffsetKnown { .. })));
    }

    #[test]
    fn calls_go_through_the_installed_invoker() {
        let rt = runtime();
        assert_eq!(unsafe { rt.call::<u8>(Hash(1), &[]) }, Ok(7));
    }

    #[test]
    fn install_is_once_only() {
        assert_eq!(current().err(), Some(Error::HostNotInstalled));
        assert!(install(runtime()).is_ok());
        assert_eq!(install(runtime()).err(), Some(Error::HostAlreadyInstalled));
        assert_eq!(current().map(Runtime::game_version), Ok(GameVersion::V1_0_944_2_STEAM));
    }
}
