// host.rs — Contracts of the host services the core is built on, plus in-process defaults.
//
// The game process owns everything interesting: the native function table, the
// live memory image and the build number. The core only talks to it through
// four narrow traits:
//   NativeInvoker    -> call a native by hash, NO_RESULT when off the script thread
//   StringPinning    -> stable NUL-terminated copies of strings passed to natives
//   MemoryIo         -> handle/global address lookup and typed raw reads/writes
//   VersionDetector  -> which game build is running
//
// All services are only valid on the host's script thread; the Send + Sync
// bounds exist so one runtime can live in a process-wide static.

use crate::math::Vector3;
use crate::offsets::GameVersion;
use crate::value::{NativeSlot, NativeWord};
use std::collections::HashMap;
use std::ffi::c_char;
use std::sync::{Mutex, PoisonError};

// ============================================================
// Service Contracts
// ============================================================

/// The host's native call gate.
pub trait NativeInvoker: Send + Sync {
    /// Call the native `hash` with one word per argument.
    ///
    /// Returns `None` (NO_RESULT) iff the call was made outside the permitted
    /// script thread. A native that legitimately returns zero yields
    /// `Some([0, 0, 0])`.
    fn invoke(&self, hash: u64, args: &[NativeWord]) -> Option<NativeSlot>;
}

/// Keeps string data alive at a fixed address for native consumption.
pub trait StringPinning: Send + Sync {
    /// Pointer to a NUL-terminated UTF-8 copy of `text`, valid until the
    /// script domain is torn down.
    fn pin(&self, text: &str) -> *const c_char;
}

/// Running game build.
pub trait VersionDetector: Send + Sync {
    fn game_version(&self) -> GameVersion;
}

/// Direct access to the game's memory image.
///
/// Address 0 means "object no longer resolvable". The typed helpers in
/// `field.rs` never pass 0 down to an implementation.
pub trait MemoryIo: Send + Sync {
    /// Address of the entity behind a script handle, 0 when unresolvable.
    fn entity_address(&self, _handle: i32) -> usize {
        0
    }

    /// Address of a script global slot, 0 when it does not exist.
    fn global_address(&self, _index: i32) -> usize {
        0
    }

    fn read_u8(&self, address: usize) -> u8;
    fn write_u8(&self, address: usize, value: u8);
    fn read_i32(&self, address: usize) -> i32;
    fn write_i32(&self, address: usize, value: i32);
    fn read_f32(&self, address: usize) -> f32;
    fn write_f32(&self, address: usize, value: f32);
    fn read_u64(&self, address: usize) -> u64;
    fn write_u64(&self, address: usize, value: u64);

    fn read_address(&self, address: usize) -> usize {
        self.read_u64(address) as usize
    }

    /// Packed float[3] (x@0, y@4, z@8).
    fn read_vector3(&self, address: usize) -> Vector3 {
        Vector3::new(
            self.read_f32(address),
            self.read_f32(address + 4),
            self.read_f32(address + 8),
        )
    }

    fn write_vector3(&self, address: usize, value: Vector3) {
        self.write_f32(address, value.x);
        self.write_f32(address + 4, value.y);
        self.write_f32(address + 8, value.z);
    }

    fn write_bytes(&self, address: usize, bytes: &[u8]) {
        for (i, b) in bytes.iter().enumerate() {
            self.write_u8(address + i, *b);
        }
    }

    /// Bit `bit` (0..32) of the 32-bit value at `address`. Bits past 31 read
    /// as clear and are never written.
    fn is_bit_set(&self, address: usize, bit: u32) -> bool {
        if bit >= 32 {
            return false;
        }
        (self.read_i32(address) >> bit) & 1 != 0
    }

    fn set_bit(&self, address: usize, bit: u32) {
        if bit >= 32 {
            return;
        }
        let v = self.read_i32(address);
        self.write_i32(address, v | (1 << bit));
    }

    fn clear_bit(&self, address: usize, bit: u32) {
        if bit >= 32 {
            return;
        }
        let v = self.read_i32(address);
        self.write_i32(address, v & !(1 << bit));
    }
}

// ============================================================
// String Pinning
// ============================================================

/// Grow-only table of pinned strings.
///
/// Entries are never removed: a pointer handed to a native stays valid for the
/// lifetime of the table, which is the lifetime of the script domain. Identical
/// strings share one entry.
#[derive(Default)]
pub struct PinnedStrings {
    table: Mutex<HashMap<Box<str>, Box<[u8]>>>,
}

impl PinnedStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct strings pinned so far.
    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StringPinning for PinnedStrings {
    fn pin(&self, text: &str) -> *const c_char {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        let bytes = table.entry(Box::from(text)).or_insert_with(|| {
            let mut buf = Vec::with_capacity(text.len() + 1);
            buf.extend_from_slice(text.as_bytes());
            buf.push(0);
            buf.into_boxed_slice()
        });
        // The boxed buffer never moves, even when the map rehashes.
        bytes.as_ptr() as *const c_char
    }
}

// ============================================================
// Raw In-Process Memory
// ============================================================

/// `MemoryIo` over the current process's address space.
///
/// Handle and global lookups are not available here (they return 0); the
/// ScriptHookV host layers them on top. On Windows every access is checked
/// against the page protection first and unreadable addresses read as zero,
/// writes to them are dropped.
#[derive(Clone, Copy, Debug)]
pub struct RawMemory {
    _private: (),
}

impl RawMemory {
    /// # Safety
    /// Every non-zero address later passed to this instance must either point
    /// into memory valid for the access, or (on Windows) into memory that the
    /// page-protection check rejects.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }

    #[inline]
    fn readable(&self, address: usize, len: usize) -> bool {
        if address == 0 {
            return false;
        }
        #[cfg(windows)]
        {
            // SAFETY: VirtualQuery only inspects the page tables.
            unsafe { page::is_readable(address, len) }
        }
        #[cfg(not(windows))]
        {
            let _ = len;
            true
        }
    }

    #[inline]
    fn writable(&self, address: usize, len: usize) -> bool {
        if address == 0 {
            return false;
        }
        #[cfg(windows)]
        {
            // SAFETY: VirtualQuery only inspects the page tables.
            unsafe { page::is_writable(address, len) }
        }
        #[cfg(not(windows))]
        {
            let _ = len;
            true
        }
    }

    #[inline]
    fn read<T: Copy + Default>(&self, address: usize) -> T {
        if !self.readable(address, std::mem::size_of::<T>()) {
            return T::default();
        }
        // SAFETY: the constructor's contract plus the readability check above.
        unsafe { std::ptr::read_unaligned(address as *const T) }
    }

    #[inline]
    fn write<T: Copy>(&self, address: usize, value: T) {
        if !self.writable(address, std::mem::size_of::<T>()) {
            return;
        }
        // SAFETY: the constructor's contract plus the writability check above.
        unsafe { std::ptr::write_unaligned(address as *mut T, value) }
    }
}

impl MemoryIo for RawMemory {
    fn read_u8(&self, address: usize) -> u8 {
        self.read(address)
    }
    fn write_u8(&self, address: usize, value: u8) {
        self.write(address, value)
    }
    fn read_i32(&self, address: usize) -> i32 {
        self.read(address)
    }
    fn write_i32(&self, address: usize, value: i32) {
        self.write(address, value)
    }
    fn read_f32(&self, address: usize) -> f32 {
        self.read(address)
    }
    fn write_f32(&self, address: usize, value: f32) {
        self.write(address, value)
    }
    fn read_u64(&self, address: usize) -> u64 {
        self.read(address)
    }
    fn write_u64(&self, address: usize, value: u64) {
        self.write(address, value)
    }
}

/// Page-protection queries used to keep raw reads from faulting.
#[cfg(windows)]
mod page {
    use winapi::um::memoryapi::VirtualQuery;
    use winapi::um::winnt::{
        MEMORY_BASIC_INFORMATION, MEM_COMMIT, PAGE_EXECUTE_READ, PAGE_EXECUTE_READWRITE,
        PAGE_EXECUTE_WRITECOPY, PAGE_READONLY, PAGE_READWRITE, PAGE_WRITECOPY,
    };

    const READABLE: u32 = PAGE_READONLY | PAGE_READWRITE | PAGE_WRITECOPY
        | PAGE_EXECUTE_READ | PAGE_EXECUTE_READWRITE | PAGE_EXECUTE_WRITECOPY;
    const WRITABLE: u32 = PAGE_READWRITE | PAGE_WRITECOPY
        | PAGE_EXECUTE_READWRITE | PAGE_EXECUTE_WRITECOPY;

    /// Committed region with one of `flags`, covering `addr..addr + len`.
    unsafe fn has_protection(addr: usize, len: usize, flags: u32) -> bool {
        if addr == 0 || len == 0 { return false; }
        let mut mbi: MEMORY_BASIC_INFORMATION = std::mem::zeroed();
        let ret = VirtualQuery(addr as *const _, &mut mbi,
            std::mem::size_of::<MEMORY_BASIC_INFORMATION>());
        if ret == 0 { return false; }
        if mbi.State != MEM_COMMIT { return false; }
        if mbi.Protect & flags == 0 { return false; }
        addr + len <= mbi.BaseAddress as usize + mbi.RegionSize
    }

    pub(super) unsafe fn is_readable(addr: usize, len: usize) -> bool {
        has_protection(addr, len, READABLE)
    }

    pub(super) unsafe fn is_writable(addr: usize, len: usize) -> bool {
        has_protection(addr, len, WRITABLE)
    }
}

// ============================================================
// Version Detection
// ============================================================

/// A version detector that always reports the same build.
/// Used for configuration overrides and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedVersion(pub GameVersion);

impl VersionDetector for FixedVersion {
    fn game_version(&self) -> GameVersion {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn pinned_strings_are_nul_terminated_and_stable() {
        let pins = PinnedStrings::new();
        let a = pins.pin("abc");
        for i in 0..64 {
            pins.pin(&format!("filler {i}"));
        }
        let again = pins.pin("abc");
        assert_eq!(a, again);
        let text = unsafe { CStr::from_ptr(a) };
        assert_eq!(text.to_str().unwrap(), "abc");
        assert_eq!(pins.len(), 65);
    }

    #[test]
    fn raw_memory_reads_and_writes_process_memory() {
        let mut buf = vec![0u8; 32];
        let base = buf.as_mut_ptr() as usize;
        let mem = unsafe { RawMemory::new() };

        mem.write_f32(base + 4, 2.5);
        mem.write_i32(base + 8, -7);
        mem.write_vector3(base + 16, Vector3::new(1.0, 2.0, 3.0));

        assert_eq!(mem.read_f32(base + 4), 2.5);
        assert_eq!(mem.read_i32(base + 8), -7);
        assert_eq!(mem.read_vector3(base + 16), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(mem.read_u8(0), 0);
    }

    #[test]
    fn bit_helpers_touch_only_their_bit() {
        let mut word = 0i32;
        let base = &mut word as *mut i32 as usize;
        let mem = unsafe { RawMemory::new() };

        mem.set_bit(base, 5);
        mem.set_bit(base, 16);
        assert!(mem.is_bit_set(base, 5));
        assert!(!mem.is_bit_set(base, 4));

        mem.clear_bit(base, 5);
        assert!(!mem.is_bit_set(base, 5));
        assert!(mem.is_bit_set(base, 16));
        assert_eq!(word, 1 << 16);
    }

    #[test]
    fn bit_helpers_ignore_bits_past_31() {
        let mut words = [-1i32, 0];
        let base = words.as_mut_ptr() as usize;
        let mem = unsafe { RawMemory::new() };

        assert!(!mem.is_bit_set(base, 32));
        mem.clear_bit(base, 63);
        mem.set_bit(base + 4, 32);
        assert_eq!(words, [-1, 0]);
    }
}
