// hash.rs — Native function identifiers and the engine's string hash.
//
// Native functions are addressed by a 64-bit hash in the host's function table.
// Only the natives used by the wrappers in this crate are named here; scripts
// can call any other native with `Hash(0x...)`.

use std::fmt;

/// Identifier of a native function in the host's table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash(pub u64);

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl From<u64> for Hash {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

// Entities
pub const GET_ENTITY_COORDS: Hash = Hash(0x3FEF770D40960D5A);
pub const GET_ENTITY_TYPE: Hash = Hash(0x8ACD366038D14505);
pub const FREEZE_ENTITY_POSITION: Hash = Hash(0x428CA6DBD1094446);
pub const SET_ENTITY_INVINCIBLE: Hash = Hash(0x3882114BDE571AD4);

// Peds
pub const GET_PED_ARMOUR: Hash = Hash(0x9483AF821605B1D8);
pub const SET_PED_ARMOUR: Hash = Hash(0xCEA04D83135264CC);
pub const IS_PED_MALE: Hash = Hash(0x6D9F5FAA7488BA46);
pub const IS_PED_IN_ANY_VEHICLE: Hash = Hash(0x997ABD671D25E1B9);
pub const SET_PED_SWEAT: Hash = Hash(0x27B0405F59637D1F);
pub const GET_PED_LAST_WEAPON_IMPACT_COORD: Hash = Hash(0x6C4D0409BA1A2BC2);

// Models
pub const IS_MODEL_VALID: Hash = Hash(0xC0296A2EDF545E92);
pub const HAS_MODEL_LOADED: Hash = Hash(0x98A4EB5D89A0C952);
pub const REQUEST_MODEL: Hash = Hash(0x963D27A58DF860AC);

// Audio
pub const GET_PLAYER_RADIO_STATION_INDEX: Hash = Hash(0xE8AF77C4C06ADC93);
pub const SET_RADIO_TO_STATION_INDEX: Hash = Hash(0xA619B168B8A8570F);

/// Jenkins one-at-a-time hash over the lowercased ASCII bytes of `text`.
/// This is the hash the engine uses for model, weapon and asset names.
pub fn joaat(text: &str) -> u32 {
    let mut h: u32 = 0;
    for b in text.bytes() {
        h = h.wrapping_add(b.to_ascii_lowercase() as u32);
        h = h.wrapping_add(h << 10);
        h ^= h >> 6;
    }
    h = h.wrapping_add(h << 3);
    h ^= h >> 11;
    h.wrapping_add(h << 15)
}
