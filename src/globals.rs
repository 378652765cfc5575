// globals.rs — Game-script global variables.
//
// Script globals live in pages of 8-byte slots. A global is addressed by its
// index; structs are consecutive slots, arrays are a count slot followed by
// `item_size` slots per element:
//
//   address + 0                      -> element count (i32 in the low half)
//   address + 8 + 8*item_size*i      -> element i
//
// Values are stored with the same layout natives return them in, so reads
// share the codec's decode rules.

use crate::codec::{self, FromNative};
use crate::error::{Error, Result};
use crate::host::MemoryIo;
use crate::value::{NativeSlot, NativeWord, TypedValue};

const SLOT_SIZE: usize = 8;
/// Slots per global page; no array can be longer than one page.
pub const GLOBAL_PAGE_SLOTS: i32 = 65536;
/// Largest inline string buffer a script declares.
pub const MAX_GLOBAL_STRING_SIZE: i32 = 64;

#[derive(Clone, Copy)]
pub struct GlobalVariable<'a> {
    memory: &'a dyn MemoryIo,
    address: usize,
}

impl std::fmt::Debug for GlobalVariable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalVariable").field("address", &format_args!("{:#x}", self.address)).finish()
    }
}

impl<'a> GlobalVariable<'a> {
    /// The global at `index`.
    pub fn get(memory: &'a dyn MemoryIo, index: i32) -> Result<Self> {
        match memory.global_address(index) {
            0 => Err(Error::GlobalNotFound { index }),
            address => Ok(Self { memory, address }),
        }
    }

    pub fn address(&self) -> usize {
        self.address
    }

    fn at(&self, address: usize) -> Self {
        Self { memory: self.memory, address }
    }

    /// Decode the value stored here. Vectors span three slots.
    ///
    /// Strings are stored inline rather than by pointer; use `read_string`.
    ///
    /// # Safety
    /// `T` must match what the script keeps in this global.
    pub unsafe fn read<T: FromNative>(&self) -> T {
        let slot: NativeSlot = [
            NativeWord(self.memory.read_u64(self.address)),
            NativeWord(self.memory.read_u64(self.address + SLOT_SIZE)),
            NativeWord(self.memory.read_u64(self.address + 2 * SLOT_SIZE)),
        ];
        T::from_native(&slot)
    }

    /// NUL-terminated UTF-8 text stored inline, at most `MAX_GLOBAL_STRING_SIZE` bytes.
    pub fn read_string(&self) -> String {
        let bytes: Vec<u8> = (0..MAX_GLOBAL_STRING_SIZE as usize)
            .map(|i| self.memory.read_u8(self.address + i))
            .take_while(|&b| b != 0)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Store `value` here.
    ///
    /// Floats clear the whole slot before writing the low four bytes; vectors
    /// write each component into its own slot and leave the padding alone.
    pub fn write(&self, value: impl Into<TypedValue>) -> Result<()> {
        match value.into() {
            TypedValue::Str(_) => return Err(Error::StringWriteUnsupported),
            TypedValue::Vector2(v) => {
                self.memory.write_f32(self.address, v.x);
                self.memory.write_f32(self.address + SLOT_SIZE, v.y);
            }
            TypedValue::Vector3(v) => {
                self.memory.write_f32(self.address, v.x);
                self.memory.write_f32(self.address + SLOT_SIZE, v.y);
                self.memory.write_f32(self.address + 2 * SLOT_SIZE, v.z);
            }
            TypedValue::F32(f) => self.write_float(f),
            TypedValue::F64(f) => self.write_float(f as f32),
            other => {
                let word = codec::encode_scalar(&other)?;
                self.memory.write_u64(self.address, word.0);
            }
        }
        Ok(())
    }

    fn write_float(&self, value: f32) {
        self.memory.write_u64(self.address, 0);
        self.memory.write_f32(self.address, value);
    }

    /// Copy `text` into an inline buffer of `max_size` bytes.
    ///
    /// Text that fits is NUL-terminated. Longer text is cut to `max_size - 1`
    /// bytes and the terminator is not written; scripts pre-zero these buffers.
    pub fn write_string(&self, text: &str, max_size: i32) -> Result<()> {
        if max_size <= 0 || max_size % 8 != 0 || max_size > MAX_GLOBAL_STRING_SIZE {
            return Err(Error::InvalidStringSize { size: max_size });
        }
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        let limit = max_size as usize;
        if bytes.len() >= limit {
            bytes.truncate(limit - 1);
        }
        self.memory.write_bytes(self.address, &bytes);
        Ok(())
    }

    fn check_bit(index: i32) -> Result<u32> {
        match index {
            0..=63 => Ok(index as u32),
            _ => Err(Error::BitIndexOutOfRange { index }),
        }
    }

    pub fn set_bit(&self, index: i32) -> Result<()> {
        let bit = Self::check_bit(index)?;
        let v = self.memory.read_u64(self.address);
        self.memory.write_u64(self.address, v | (1u64 << bit));
        Ok(())
    }

    pub fn clear_bit(&self, index: i32) -> Result<()> {
        let bit = Self::check_bit(index)?;
        let v = self.memory.read_u64(self.address);
        self.memory.write_u64(self.address, v & !(1u64 << bit));
        Ok(())
    }

    pub fn is_bit_set(&self, index: i32) -> Result<bool> {
        let bit = Self::check_bit(index)?;
        Ok((self.memory.read_u64(self.address) >> bit) & 1 != 0)
    }

    /// Slot `index` of a global struct (the Y of a vector is field 1).
    pub fn struct_field(&self, index: usize) -> Self {
        self.at(self.address + SLOT_SIZE * index)
    }

    fn array_count(&self, item_size: i32) -> Result<i32> {
        if item_size <= 0 {
            return Err(Error::InvalidItemSize { size: item_size });
        }
        let count = self.memory.read_i32(self.address);
        if count < 1 || count >= GLOBAL_PAGE_SLOTS / item_size {
            return Err(Error::NotAnArray);
        }
        Ok(count)
    }

    fn element(&self, index: i32, item_size: i32) -> Self {
        self.at(self.address + SLOT_SIZE + SLOT_SIZE * item_size as usize * index as usize)
    }

    /// Every element of a global array of `item_size`-slot items.
    pub fn array(&self, item_size: i32) -> Result<Vec<Self>> {
        let count = self.array_count(item_size)?;
        Ok((0..count).map(|i| self.element(i, item_size)).collect())
    }

    pub fn array_item(&self, index: i32, item_size: i32) -> Result<Self> {
        let count = self.array_count(item_size)?;
        if index < 0 || index >= count {
            return Err(Error::IndexOutOfRange { index, len: count });
        }
        Ok(self.element(index, item_size))
    }
}
