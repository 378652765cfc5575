// shv.rs — Host services backed by ScriptHookV.dll.
//
// ScriptHookV exports a tiny C++ API; the symbols are MSVC-mangled, so they
// are looked up by their decorated names. A native call is three steps:
//   nativeInit(hash) -> nativePush64(arg) per argument -> nativeCall()
// nativeCall returns a pointer to the game's result buffer.
//
// Natives may only run on the script thread. The host remembers that thread
// (see `bind_current_thread`) and refuses calls from anywhere else with
// NO_RESULT instead of letting the game crash.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::host::{MemoryIo, NativeInvoker, RawMemory, VersionDetector};
use crate::offsets::GameVersion;
use crate::runtime::{self, Runtime};
use crate::value::{NativeSlot, NativeWord, SLOT_WORDS};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use winapi::um::libloaderapi::{GetModuleHandleA, GetProcAddress};
use winapi::um::processthreadsapi::GetCurrentThreadId;

type NativeInitFn = unsafe extern "C" fn(u64);
type NativePush64Fn = unsafe extern "C" fn(u64);
type NativeCallFn = unsafe extern "C" fn() -> *mut u64;
type GetGlobalPtrFn = unsafe extern "C" fn(i32) -> *mut u64;
type GetGameVersionFn = unsafe extern "C" fn() -> i32;
type GetScriptHandleBaseAddressFn = unsafe extern "C" fn(i32) -> *mut u8;

const MODULE: &[u8] = b"ScriptHookV.dll\0";

/// No thread bound yet.
const UNBOUND: u32 = 0;

#[derive(Clone, Copy)]
struct Exports {
    native_init: NativeInitFn,
    native_push64: NativePush64Fn,
    native_call: NativeCallFn,
    get_global_ptr: GetGlobalPtrFn,
    get_game_version: GetGameVersionFn,
    get_script_handle_base_address: GetScriptHandleBaseAddressFn,
}

/// Resolve one decorated export as `T`.
unsafe fn export<T: Copy>(module: winapi::shared::minwindef::HMODULE, name: &'static [u8], what: &'static str) -> Result<T> {
    let proc = GetProcAddress(module, name.as_ptr() as _);
    if proc.is_null() {
        return Err(Error::HostUnavailable { what });
    }
    Ok(std::mem::transmute_copy::<_, T>(&proc))
}

impl Exports {
    unsafe fn resolve() -> Result<Self> {
        let module = GetModuleHandleA(MODULE.as_ptr() as _);
        if module.is_null() {
            return Err(Error::HostUnavailable { what: "ScriptHookV.dll" });
        }
        Ok(Self {
            native_init: export(module, b"?nativeInit@@YAX_K@Z\0", "nativeInit")?,
            native_push64: export(module, b"?nativePush64@@YAX_K@Z\0", "nativePush64")?,
            native_call: export(module, b"?nativeCall@@YAPEA_KXZ\0", "nativeCall")?,
            get_global_ptr: export(module, b"?getGlobalPtr@@YAPEA_KH@Z\0", "getGlobalPtr")?,
            get_game_version: export(module, b"?getGameVersion@@YA?AW4eGameVersion@@XZ\0", "getGameVersion")?,
            get_script_handle_base_address: export(
                module,
                b"?getScriptHandleBaseAddress@@YAPEAEH@Z\0",
                "getScriptHandleBaseAddress",
            )?,
        })
    }
}

/// All four host services over one loaded ScriptHookV.
#[derive(Clone)]
pub struct ScriptHookHost {
    exports: Exports,
    memory: RawMemory,
    script_thread: Arc<AtomicU32>,
}

impl ScriptHookHost {
    /// Resolve the ScriptHookV exports in the current process.
    pub fn load() -> Result<Self> {
        // SAFETY: module and export lookups have no side effects.
        let exports = unsafe { Exports::resolve()? };
        tracing::info!("ScriptHookV exports resolved");
        Ok(Self {
            exports,
            // SAFETY: addresses come from ScriptHookV or from scripts, and every
            // access is checked against the page protection first.
            memory: unsafe { RawMemory::new() },
            script_thread: Arc::new(AtomicU32::new(UNBOUND)),
        })
    }

    /// Make the calling thread the only one allowed to run natives.
    /// Call this from the script's entry function.
    pub fn bind_current_thread(&self) {
        // SAFETY: plain Win32 query.
        let id = unsafe { GetCurrentThreadId() };
        let previous = self.script_thread.swap(id, Ordering::AcqRel);
        if previous != id {
            tracing::debug!(thread = id, previous, "script thread bound");
        }
    }

    fn on_script_thread(&self) -> bool {
        let bound = self.script_thread.load(Ordering::Acquire);
        // SAFETY: plain Win32 query.
        bound != UNBOUND && bound == unsafe { GetCurrentThreadId() }
    }
}

impl NativeInvoker for ScriptHookHost {
    fn invoke(&self, hash: u64, args: &[NativeWord]) -> Option<NativeSlot> {
        if !self.on_script_thread() {
            return None;
        }
        // SAFETY: exports resolved at load time; we are on the script thread.
        unsafe {
            (self.exports.native_init)(hash);
            for arg in args {
                (self.exports.native_push64)(arg.0);
            }
            let result = (self.exports.native_call)();
            let mut slot = [NativeWord::ZERO; SLOT_WORDS];
            if !result.is_null() {
                for (i, word) in slot.iter_mut().enumerate() {
                    *word = NativeWord(*result.add(i));
                }
            }
            Some(slot)
        }
    }
}

impl MemoryIo for ScriptHookHost {
    fn entity_address(&self, handle: i32) -> usize {
        // SAFETY: ScriptHookV returns null for dead or unknown handles.
        unsafe { (self.exports.get_script_handle_base_address)(handle) as usize }
    }

    fn global_address(&self, index: i32) -> usize {
        // SAFETY: ScriptHookV returns null for out-of-range indices.
        unsafe { (self.exports.get_global_ptr)(index) as usize }
    }

    fn read_u8(&self, address: usize) -> u8 {
        self.memory.read_u8(address)
    }
    fn write_u8(&self, address: usize, value: u8) {
        self.memory.write_u8(address, value)
    }
    fn read_i32(&self, address: usize) -> i32 {
        self.memory.read_i32(address)
    }
    fn write_i32(&self, address: usize, value: i32) {
        self.memory.write_i32(address, value)
    }
    fn read_f32(&self, address: usize) -> f32 {
        self.memory.read_f32(address)
    }
    fn write_f32(&self, address: usize, value: f32) {
        self.memory.write_f32(address, value)
    }
    fn read_u64(&self, address: usize) -> u64 {
        self.memory.read_u64(address)
    }
    fn write_u64(&self, address: usize, value: u64) {
        self.memory.write_u64(address, value)
    }
}

impl VersionDetector for ScriptHookHost {
    fn game_version(&self) -> GameVersion {
        // SAFETY: export resolved at load time.
        GameVersion(unsafe { (self.exports.get_game_version)() })
    }
}

/// Load ScriptHookV and install it as the process-wide runtime.
///
/// Returns the host too, so the script entry point can bind its thread.
pub fn install_script_hook(config: &Config) -> Result<(&'static Runtime, ScriptHookHost)> {
    let host = ScriptHookHost::load()?;
    let mut rt = Runtime::new(host.clone(), host.clone(), host.clone());
    if let Some(version) = config.game_version {
        tracing::info!(%version, "game version overridden by configuration");
        rt = rt.with_version_override(version);
    }
    Ok((runtime::install(rt)?, host))
}
