// lib.rs — Native call bridge for GTA V scripts running under ScriptHookV.
//
// Scripts call game natives by hash with ordinary Rust values. The bridge:
//   1. Encodes every argument into a 64-bit native word (strings are pinned)
//   2. Hands the word array to the host's call gate
//   3. Decodes the returned words as the type the caller asked for
// Fields with no native accessor are read straight from game memory through a
// table of per-build struct offsets.
//
// On Windows the crate also builds as a DLL: DllMain starts file logging and
// `shv::install_script_hook` wires the ScriptHookV exports in as the host.

#![allow(non_snake_case)]

// Natives pass pointers in 64-bit words.
#[cfg(all(windows, not(target_arch = "x86_64")))]
compile_error!("Build with x86_64-pc-windows-msvc (64-bit).");

pub mod codec;    // Value <-> native word rules, FromNative, handle/enum macros
pub mod config;   // Environment configuration
pub mod dispatch; // call / invoke / call_as by native hash
pub mod entities; // Entity, Ped, Model and enum wrappers
pub mod error;    // Crate error type
pub mod field;    // Direct-memory field reads/writes
pub mod globals;  // Script global variables
pub mod hash;     // Native hashes, joaat
pub mod host;     // Host service traits and in-process defaults
pub mod logging;  // tracing setup
pub mod marshal;  // Call arguments and output slots
pub mod math;     // Vector2 / Vector3
pub mod offsets;  // Game versions and the versioned offset table
pub mod runtime;  // Bundled host services, process-wide instance
#[cfg(windows)]
pub mod shv;      // ScriptHookV backend
pub mod value;    // NativeWord, TypedValue, ValueKind

#[cfg(test)]
mod mock;

pub use codec::{FromNative, NativeValue};
pub use entities::{Entity, EntityType, Model, Ped, RadioStation, VehicleSeat};
pub use error::{Error, Result};
pub use globals::GlobalVariable;
pub use hash::Hash;
pub use marshal::{CallArgument, OutputArgument};
pub use math::{Vector2, Vector3};
pub use offsets::{FieldId, GameVersion, VersionedOffsetTable};
pub use runtime::Runtime;
pub use value::{NativeWord, TypedValue, ValueKind};

#[cfg(windows)]
mod dll {
    use winapi::shared::minwindef::{BOOL, DWORD, HINSTANCE, LPVOID, TRUE};
    use winapi::um::libloaderapi::DisableThreadLibraryCalls;
    use winapi::um::winnt::{DLL_PROCESS_ATTACH, DLL_PROCESS_DETACH};

    /// DLL entry point. Only sets up logging; the script's entry function
    /// installs the host once ScriptHookV has started it.
    #[no_mangle]
    pub unsafe extern "system" fn DllMain(hinst: HINSTANCE, reason: DWORD, _reserved: LPVOID) -> BOOL {
        match reason {
            DLL_PROCESS_ATTACH => {
                DisableThreadLibraryCalls(hinst);
                crate::logging::set_module_handle(hinst as usize);
                let config = crate::config::Config::from_env();
                // Without a log file the bridge still works; there is nowhere to report it.
                let _ = crate::logging::init(&config);
            }
            DLL_PROCESS_DETACH => {
                tracing::info!("DLL detached");
            }
            _ => {}
        }
        TRUE
    }
}
