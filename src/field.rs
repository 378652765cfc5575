// field.rs — Typed direct-memory field access.
//
// Two layers:
//   FieldAccessor    -> (address, offset) reads/writes; address 0 short-circuits
//   VersionedFields  -> (address, FieldId) resolved against the running build;
//                       an unknown offset degrades to the same default
//
// Neither layer ever dereferences address 0. Reads return 0 / 0.0 / false /
// Vector3::ZERO, writes are dropped.

use crate::error::Error;
use crate::host::MemoryIo;
use crate::math::Vector3;
use crate::offsets::{FieldId, FieldLocation, GameVersion, VersionedOffsetTable};

// ============================================================
// Raw Field Accessor
// ============================================================

#[derive(Clone, Copy)]
pub struct FieldAccessor<'a> {
    memory: &'a dyn MemoryIo,
}

impl<'a> FieldAccessor<'a> {
    pub fn new(memory: &'a dyn MemoryIo) -> Self {
        Self { memory }
    }

    pub fn read_bit(&self, address: usize, offset: usize, bit: u32) -> bool {
        address != 0 && self.memory.is_bit_set(address + offset, bit)
    }

    pub fn write_bit(&self, address: usize, offset: usize, bit: u32, value: bool) {
        if address == 0 {
            return;
        }
        if value {
            self.memory.set_bit(address + offset, bit);
        } else {
            self.memory.clear_bit(address + offset, bit);
        }
    }

    pub fn read_byte(&self, address: usize, offset: usize) -> u8 {
        if address == 0 { return 0; }
        self.memory.read_u8(address + offset)
    }

    pub fn write_byte(&self, address: usize, offset: usize, value: u8) {
        if address == 0 { return; }
        self.memory.write_u8(address + offset, value)
    }

    pub fn read_i32(&self, address: usize, offset: usize) -> i32 {
        if address == 0 { return 0; }
        self.memory.read_i32(address + offset)
    }

    pub fn write_i32(&self, address: usize, offset: usize, value: i32) {
        if address == 0 { return; }
        self.memory.write_i32(address + offset, value)
    }

    pub fn read_f32(&self, address: usize, offset: usize) -> f32 {
        if address == 0 { return 0.0; }
        self.memory.read_f32(address + offset)
    }

    pub fn write_f32(&self, address: usize, offset: usize, value: f32) {
        if address == 0 { return; }
        self.memory.write_f32(address + offset, value)
    }

    pub fn read_vector3(&self, address: usize, offset: usize) -> Vector3 {
        if address == 0 { return Vector3::ZERO; }
        self.memory.read_vector3(address + offset)
    }

    pub fn write_vector3(&self, address: usize, offset: usize, value: Vector3) {
        if address == 0 { return; }
        self.memory.write_vector3(address + offset, value)
    }

    /// Pointer-sized value at `address + offset`, 0 when `address` is 0.
    pub fn read_address(&self, address: usize, offset: usize) -> usize {
        if address == 0 { return 0; }
        self.memory.read_address(address + offset)
    }
}

// ============================================================
// Version-Resolved Fields
// ============================================================

/// Field access by `FieldId` for one game build.
#[derive(Clone, Copy)]
pub struct VersionedFields<'a> {
    access: FieldAccessor<'a>,
    offsets: &'a VersionedOffsetTable,
    version: GameVersion,
}

impl<'a> VersionedFields<'a> {
    pub fn new(memory: &'a dyn MemoryIo, offsets: &'a VersionedOffsetTable, version: GameVersion) -> Self {
        Self { access: FieldAccessor::new(memory), offsets, version }
    }

    pub fn version(&self) -> GameVersion {
        self.version
    }

    fn locate(&self, field: FieldId) -> Option<FieldLocation> {
        match self.offsets.locate(field, self.version) {
            Ok(loc) => Some(loc),
            Err(Error::NoOffsetKnown { .. }) => {
                tracing::debug!(?field, version = %self.version, "no offset for field on this build");
                None
            }
            Err(_) => None,
        }
    }

    pub fn get_f32(&self, address: usize, field: FieldId) -> f32 {
        match self.locate(field) {
            Some(loc) => self.access.read_f32(address, loc.offset),
            None => 0.0,
        }
    }

    pub fn set_f32(&self, address: usize, field: FieldId, value: f32) {
        if let Some(loc) = self.locate(field) {
            self.access.write_f32(address, loc.offset, value);
        }
    }

    pub fn get_byte(&self, address: usize, field: FieldId) -> u8 {
        match self.locate(field) {
            Some(loc) => self.access.read_byte(address, loc.offset),
            None => 0,
        }
    }

    pub fn set_byte(&self, address: usize, field: FieldId, value: u8) {
        if let Some(loc) = self.locate(field) {
            self.access.write_byte(address, loc.offset, value);
        }
    }

    pub fn get_i32(&self, address: usize, field: FieldId) -> i32 {
        match self.locate(field) {
            Some(loc) => self.access.read_i32(address, loc.offset),
            None => 0,
        }
    }

    pub fn set_i32(&self, address: usize, field: FieldId, value: i32) {
        if let Some(loc) = self.locate(field) {
            self.access.write_i32(address, loc.offset, value);
        }
    }

    /// Vector field, or `fallback` when `address` is 0 or the build has no
    /// offset for it.
    pub fn get_vector3(&self, address: usize, field: FieldId, fallback: Vector3) -> Vector3 {
        if address == 0 {
            return fallback;
        }
        match self.locate(field) {
            Some(loc) => self.access.read_vector3(address, loc.offset),
            None => fallback,
        }
    }

    /// Pointer field; 0 stands for "not resolvable" like any other address.
    pub fn get_address(&self, address: usize, field: FieldId) -> usize {
        match self.locate(field) {
            Some(loc) => self.access.read_address(address, loc.offset),
            None => 0,
        }
    }

    /// Flag field: the bit stored with the field's row. Fields registered
    /// without a bit read as `false`.
    pub fn get_flag(&self, address: usize, field: FieldId) -> bool {
        match self.locate(field) {
            Some(FieldLocation { offset, bit: Some(bit) }) => self.access.read_bit(address, offset, bit),
            _ => false,
        }
    }

    pub fn set_flag(&self, address: usize, field: FieldId, value: bool) {
        if let Some(FieldLocation { offset, bit: Some(bit) }) = self.locate(field) {
            self.access.write_bit(address, offset, bit, value);
        }
    }
}
