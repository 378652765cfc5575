// mock.rs — Scripted host services for unit tests.

use crate::host::MemoryIo;
use crate::value::{NativeSlot, NativeWord};
use std::collections::HashMap;
use std::sync::Mutex;

type Handler = Box<dyn Fn(u64, &[NativeWord]) -> Option<NativeSlot> + Send + Sync>;

/// Invoker that answers every call with a closure and records the calls.
pub struct ScriptedInvoker {
    handler: Handler,
    calls: Mutex<Vec<(u64, Vec<NativeWord>)>>,
}

impl ScriptedInvoker {
    pub fn with_handler(
        handler: impl Fn(u64, &[NativeWord]) -> Option<NativeSlot> + Send + Sync + 'static,
    ) -> Self {
        Self { handler: Box::new(handler), calls: Mutex::new(Vec::new()) }
    }

    pub fn returning(slot: NativeSlot) -> Self {
        Self::with_handler(move |_, _| Some(slot))
    }

    pub fn off_thread() -> Self {
        Self::with_handler(|_, _| None)
    }

    pub fn calls(&self) -> Vec<(u64, Vec<NativeWord>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl crate::host::NativeInvoker for ScriptedInvoker {
    fn invoke(&self, hash: u64, args: &[NativeWord]) -> Option<NativeSlot> {
        self.calls.lock().unwrap().push((hash, args.to_vec()));
        (self.handler)(hash, args)
    }
}

pub fn word(v: u64) -> NativeSlot {
    [NativeWord(v), NativeWord::ZERO, NativeWord::ZERO]
}

/// Byte arena mapped at a fake base address, with entity and global tables.
pub struct ArenaMemory {
    base: usize,
    bytes: Mutex<Vec<u8>>,
    entities: HashMap<i32, usize>,
    globals: HashMap<i32, usize>,
}

impl ArenaMemory {
    pub const BASE: usize = 0x7FF0_0000_0000;

    pub fn new(size: usize) -> Self {
        Self {
            base: Self::BASE,
            bytes: Mutex::new(vec![0; size]),
            entities: HashMap::new(),
            globals: HashMap::new(),
        }
    }

    /// Map `handle` to the arena offset `offset`.
    pub fn with_entity(mut self, handle: i32, offset: usize) -> Self {
        self.entities.insert(handle, self.base + offset);
        self
    }

    pub fn with_global(mut self, index: i32, offset: usize) -> Self {
        self.globals.insert(index, self.base + offset);
        self
    }

    pub fn addr(&self, offset: usize) -> usize {
        self.base + offset
    }

    fn with_bytes<R>(&self, address: usize, len: usize, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let start = address
            .checked_sub(self.base)
            .unwrap_or_else(|| panic!("address {address:#x} below arena"));
        let mut bytes = self.bytes.lock().unwrap();
        assert!(start + len <= bytes.len(), "address {address:#x} past arena end");
        f(&mut bytes[start..start + len])
    }

    fn read<const N: usize>(&self, address: usize) -> [u8; N] {
        self.with_bytes(address, N, |b| b.try_into().unwrap())
    }

    fn write<const N: usize>(&self, address: usize, value: [u8; N]) {
        self.with_bytes(address, N, |b| b.copy_from_slice(&value))
    }
}

impl MemoryIo for ArenaMemory {
    fn entity_address(&self, handle: i32) -> usize {
        self.entities.get(&handle).copied().unwrap_or(0)
    }
    fn global_address(&self, index: i32) -> usize {
        self.globals.get(&index).copied().unwrap_or(0)
    }
    fn read_u8(&self, address: usize) -> u8 {
        self.read::<1>(address)[0]
    }
    fn write_u8(&self, address: usize, value: u8) {
        self.write(address, [value])
    }
    fn read_i32(&self, address: usize) -> i32 {
        i32::from_le_bytes(self.read(address))
    }
    fn write_i32(&self, address: usize, value: i32) {
        self.write(address, value.to_le_bytes())
    }
    fn read_f32(&self, address: usize) -> f32 {
        f32::from_le_bytes(self.read(address))
    }
    fn write_f32(&self, address: usize, value: f32) {
        self.write(address, value.to_le_bytes())
    }
    fn read_u64(&self, address: usize) -> u64 {
        u64::from_le_bytes(self.read(address))
    }
    fn write_u64(&self, address: usize, value: u64) {
        self.write(address, value.to_le_bytes())
    }
}

/// Memory that fails the test on any access.
pub struct UntouchableMemory;

impl MemoryIo for UntouchableMemory {
    fn read_u8(&self, address: usize) -> u8 {
        panic!("read_u8({address:#x})")
    }
    fn write_u8(&self, address: usize, _: u8) {
        panic!("write_u8({address:#x})")
    }
    fn read_i32(&self, address: usize) -> i32 {
        panic!("read_i32({address:#x})")
    }
    fn write_i32(&self, address: usize, _: i32) {
        panic!("write_i32({address:#x})")
    }
    fn read_f32(&self, address: usize) -> f32 {
        panic!("read_f32({address:#x})")
    }
    fn write_f32(&self, address: usize, _: f32) {
        panic!("write_f32({address:#x})")
    }
    fn read_u64(&self, address: usize) -> u64 {
        panic!("read_u64({address:#x})")
    }
    fn write_u64(&self, address: usize, _: u64) {
        panic!("write_u64({address:#x})")
    }
}
