// entities.rs — Game object wrappers built on the call path and the offset table.
//
// Each wrapper is just a script handle (or a model hash). Reads go one of two
// ways:
//   1. Native call through the runtime (position, type, armor, ...)
//   2. Direct memory: handle -> entity address -> versioned field offset
//
// Memory-backed getters never fail. A stale handle (address 0) or a game build
// with no known offset reads as the default and setters do nothing. Native
// calls return `Result` because they can be made from the wrong thread.

use crate::codec::NativeValue;
use crate::error::Result;
use crate::hash;
use crate::marshal::OutputArgument;
use crate::math::Vector3;
use crate::offsets::{FieldId, FieldLocation};
use crate::runtime::Runtime;
use crate::value::NativeWord;
use crate::{impl_native_value, native_enum};

// ============================================================
// Enums
// ============================================================

native_enum! {
    /// What kind of entity a handle refers to.
    pub struct EntityType(i32) {
        NONE = 0,
        PED = 1,
        VEHICLE = 2,
        PROP = 3,
    }
}

native_enum! {
    pub struct VehicleSeat(i32) {
        NONE = -3,
        ANY = -2,
        DRIVER = -1,
        PASSENGER = 0,
        LEFT_REAR = 1,
        RIGHT_REAR = 2,
    }
}

native_enum! {
    /// In-game radio stations, by station index.
    pub struct RadioStation(i32) {
        LOS_SANTOS_ROCK_RADIO = 0,
        NON_STOP_POP_FM = 1,
        RADIO_LOS_SANTOS = 2,
        CHANNEL_X = 3,
        WEST_COAST_TALK_RADIO = 4,
        REBEL_RADIO = 5,
        SOULWAX_FM = 6,
        EAST_LOS_FM = 7,
        WEST_COAST_CLASSICS = 8,
        BLAINE_COUNTY_RADIO = 9,
        THE_BLUE_ARK = 10,
        WORLD_WIDE_FM = 11,
        FLYLO_FM = 12,
        THE_LOWDOWN = 13,
        RADIO_MIRROR_PARK = 14,
        SPACE = 15,
        VINEWOOD_BOULEVARD_RADIO = 16,
        SELF_RADIO = 17,
        THE_LAB = 18,
        BLONDED_LOS_SANTOS = 19,
        LOS_SANTOS_UNDERGROUND_RADIO = 20,
        IFRUIT_RADIO = 21,
        RADIO_OFF = 255,
    }
}

/// Station the player is listening to.
pub fn radio_station(rt: &Runtime) -> Result<RadioStation> {
    // SAFETY: the native returns a plain integer.
    unsafe { rt.call(hash::GET_PLAYER_RADIO_STATION_INDEX, &[]) }
}

pub fn set_radio_station(rt: &Runtime, station: RadioStation) -> Result<()> {
    rt.invoke(hash::SET_RADIO_TO_STATION_INDEX, &[station.into()])
}

// ============================================================
// Model
// ============================================================

/// A model, identified by the hash of its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Model {
    pub hash: i32,
}

impl Model {
    pub const fn new(hash: i32) -> Self {
        Self { hash }
    }

    /// `Model::from_name("adder")` is the Adder, whatever the letter case.
    pub fn from_name(name: &str) -> Self {
        Self { hash: hash::joaat(name) as i32 }
    }

    pub fn is_valid(&self, rt: &Runtime) -> Result<bool> {
        // SAFETY: bool result.
        unsafe { rt.call(hash::IS_MODEL_VALID, &[self.into()]) }
    }

    pub fn is_loaded(&self, rt: &Runtime) -> Result<bool> {
        // SAFETY: bool result.
        unsafe { rt.call(hash::HAS_MODEL_LOADED, &[self.into()]) }
    }

    /// Ask the streamer to load the model. Poll `is_loaded` from the script loop.
    pub fn request(&self, rt: &Runtime) -> Result<()> {
        rt.invoke(hash::REQUEST_MODEL, &[self.into()])
    }
}

impl NativeValue for Model {
    fn native_value(&self) -> NativeWord {
        NativeWord(self.hash as u32 as u64)
    }

    fn from_native_value(word: NativeWord) -> Self {
        Self { hash: word.0 as u32 as i32 }
    }
}

// ============================================================
// Entity
// ============================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Entity {
    pub handle: i32,
}

macro_rules! memory_flags {
    ($($(#[$meta:meta])* $get:ident / $set:ident => $field:ident;)*) => {
        $(
            $(#[$meta])*
            pub fn $get(&self, rt: &Runtime) -> bool {
                rt.fields().get_flag(self.memory_address(rt), FieldId::$field)
            }

            pub fn $set(&self, rt: &Runtime, value: bool) {
                rt.fields().set_flag(self.memory_address(rt), FieldId::$field, value)
            }
        )*
    };
}

impl Entity {
    pub const fn new(handle: i32) -> Self {
        Self { handle }
    }

    /// Address of the game object, 0 once the handle no longer resolves.
    pub fn memory_address(&self, rt: &Runtime) -> usize {
        rt.memory().entity_address(self.handle)
    }

    /// World position. `alive` false skips the death-animation offset.
    pub fn position(&self, rt: &Runtime, alive: bool) -> Result<Vector3> {
        // SAFETY: vector result.
        unsafe { rt.call(hash::GET_ENTITY_COORDS, &[self.into(), alive.into()]) }
    }

    pub fn entity_type(&self, rt: &Runtime) -> Result<EntityType> {
        // SAFETY: integer result.
        unsafe { rt.call(hash::GET_ENTITY_TYPE, &[self.into()]) }
    }

    /// Health as the game stores it, including the 100 point ped offset.
    pub fn health_float(&self, rt: &Runtime) -> f32 {
        rt.fields().get_f32(self.memory_address(rt), FieldId::EntityHealth)
    }

    pub fn set_health_float(&self, rt: &Runtime, value: f32) {
        rt.fields().set_f32(self.memory_address(rt), FieldId::EntityHealth, value)
    }

    pub fn max_health_float(&self, rt: &Runtime) -> f32 {
        rt.fields().get_f32(self.memory_address(rt), FieldId::EntityMaxHealth)
    }

    pub fn set_max_health_float(&self, rt: &Runtime, value: f32) {
        rt.fields().set_f32(self.memory_address(rt), FieldId::EntityMaxHealth, value)
    }

    pub fn is_position_frozen(&self, rt: &Runtime) -> bool {
        rt.fields().get_flag(self.memory_address(rt), FieldId::EntityPositionFrozen)
    }

    pub fn set_position_frozen(&self, rt: &Runtime, frozen: bool) -> Result<()> {
        rt.invoke(hash::FREEZE_ENTITY_POSITION, &[self.into(), frozen.into()])
    }

    pub fn is_rendered(&self, rt: &Runtime) -> bool {
        rt.fields().get_flag(self.memory_address(rt), FieldId::EntityRendered)
    }

    /// Unit vectors of the world matrix. A handle that no longer resolves
    /// reports the identity axes.
    pub fn right_vector(&self, rt: &Runtime) -> Vector3 {
        rt.fields().get_vector3(self.memory_address(rt), FieldId::EntityRightVector, Vector3::RELATIVE_RIGHT)
    }

    pub fn forward_vector(&self, rt: &Runtime) -> Vector3 {
        rt.fields().get_vector3(self.memory_address(rt), FieldId::EntityForwardVector, Vector3::RELATIVE_FRONT)
    }

    pub fn up_vector(&self, rt: &Runtime) -> Vector3 {
        rt.fields().get_vector3(self.memory_address(rt), FieldId::EntityUpVector, Vector3::RELATIVE_TOP)
    }

    /// Entities without physics data always count as having gravity.
    pub fn has_gravity(&self, rt: &Runtime) -> bool {
        let fields = rt.fields();
        let physics = fields.get_address(self.memory_address(rt), FieldId::EntityPhysicsInfo);
        physics == 0 || !fields.get_flag(physics, FieldId::PhysicsGravityDisabled)
    }

    pub fn is_invincible(&self, rt: &Runtime) -> bool {
        rt.fields().get_flag(self.memory_address(rt), FieldId::EntityInvincible)
    }

    pub fn set_invincible(&self, rt: &Runtime, value: bool) -> Result<()> {
        rt.invoke(hash::SET_ENTITY_INVINCIBLE, &[self.into(), value.into()])
    }

    memory_flags! {
        is_bullet_proof / set_bullet_proof => EntityBulletProof;
        is_fire_proof / set_fire_proof => EntityFireProof;
        is_collision_proof / set_collision_proof => EntityCollisionProof;
        is_melee_proof / set_melee_proof => EntityMeleeProof;
        is_explosion_proof / set_explosion_proof => EntityExplosionProof;
        is_water_cannon_proof / set_water_cannon_proof => EntityWaterCannonProof;
        is_steam_proof / set_steam_proof => EntitySteamProof;
        is_smoke_proof / set_smoke_proof => EntitySmokeProof;
        /// Only the player can damage this entity.
        is_only_damaged_by_player / set_only_damaged_by_player => EntityOnlyDamagedByPlayer;
    }
}

impl NativeValue for Entity {
    fn native_value(&self) -> NativeWord {
        NativeWord(self.handle as i64 as u64)
    }

    fn from_native_value(word: NativeWord) -> Self {
        Self { handle: word.0 as i32 }
    }
}

// ============================================================
// Ped
// ============================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ped {
    pub handle: i32,
}

impl Ped {
    pub const fn new(handle: i32) -> Self {
        Self { handle }
    }

    pub const fn entity(&self) -> Entity {
        Entity { handle: self.handle }
    }

    pub fn memory_address(&self, rt: &Runtime) -> usize {
        self.entity().memory_address(rt)
    }

    pub fn armor(&self, rt: &Runtime) -> Result<i32> {
        // SAFETY: integer result.
        unsafe { rt.call(hash::GET_PED_ARMOUR, &[self.into()]) }
    }

    pub fn set_armor(&self, rt: &Runtime, value: i32) -> Result<()> {
        rt.invoke(hash::SET_PED_ARMOUR, &[self.into(), value.into()])
    }

    pub fn armor_float(&self, rt: &Runtime) -> f32 {
        rt.fields().get_f32(self.memory_address(rt), FieldId::PedArmor)
    }

    pub fn set_armor_float(&self, rt: &Runtime, value: f32) {
        rt.fields().set_f32(self.memory_address(rt), FieldId::PedArmor, value)
    }

    pub fn sweat(&self, rt: &Runtime) -> f32 {
        rt.fields().get_f32(self.memory_address(rt), FieldId::PedSweat)
    }

    /// Clamped to 0..=100 by the game.
    pub fn set_sweat(&self, rt: &Runtime, value: f32) -> Result<()> {
        rt.invoke(hash::SET_PED_SWEAT, &[self.into(), value.into()])
    }

    pub fn injury_health_threshold(&self, rt: &Runtime) -> f32 {
        rt.fields().get_f32(self.memory_address(rt), FieldId::PedInjuryHealthThreshold)
    }

    pub fn set_injury_health_threshold(&self, rt: &Runtime, value: f32) {
        rt.fields().set_f32(self.memory_address(rt), FieldId::PedInjuryHealthThreshold, value)
    }

    pub fn fatal_injury_health_threshold(&self, rt: &Runtime) -> f32 {
        rt.fields().get_f32(self.memory_address(rt), FieldId::PedFatalInjuryHealthThreshold)
    }

    pub fn set_fatal_injury_health_threshold(&self, rt: &Runtime, value: f32) {
        rt.fields().set_f32(self.memory_address(rt), FieldId::PedFatalInjuryHealthThreshold, value)
    }

    /// The game stores "immune" flags; these two getters report the opposite.
    fn inverted_flag(&self, rt: &Runtime, field: FieldId) -> bool {
        let address = self.memory_address(rt);
        match rt.resolve_offset(field) {
            Ok(FieldLocation { offset, bit: Some(bit) }) if address != 0 => {
                !rt.accessor().read_bit(address, offset, bit)
            }
            _ => false,
        }
    }

    pub fn can_suffer_critical_hits(&self, rt: &Runtime) -> bool {
        self.inverted_flag(rt, FieldId::PedCriticalHitFlags)
    }

    pub fn drops_weapons_on_death(&self, rt: &Runtime) -> bool {
        self.inverted_flag(rt, FieldId::PedDropsWeaponsFlags)
    }

    pub fn is_male(&self, rt: &Runtime) -> Result<bool> {
        // SAFETY: bool result.
        unsafe { rt.call(hash::IS_PED_MALE, &[self.into()]) }
    }

    pub fn is_in_any_vehicle(&self, rt: &Runtime) -> Result<bool> {
        // SAFETY: bool result.
        unsafe { rt.call(hash::IS_PED_IN_ANY_VEHICLE, &[self.into(), false.into()]) }
    }

    /// Seat of the vehicle the ped sits in, `VehicleSeat::NONE` on foot.
    pub fn seat_index(&self, rt: &Runtime) -> Result<VehicleSeat> {
        let address = self.memory_address(rt);
        let Ok(loc) = rt.resolve_offset(FieldId::PedSeatIndex) else {
            return Ok(VehicleSeat::NONE);
        };
        if address == 0 {
            return Ok(VehicleSeat::NONE);
        }
        // Stored one above the seat numbering, negative when not seated.
        let raw = rt.accessor().read_byte(address, loc.offset) as i8;
        if raw >= 0 && self.is_in_any_vehicle(rt)? {
            Ok(VehicleSeat(raw as i32 - 1))
        } else {
            Ok(VehicleSeat::NONE)
        }
    }

    /// Where the ped's last shot landed, if it hit anything.
    pub fn last_weapon_impact_position(&self, rt: &Runtime) -> Result<Option<Vector3>> {
        let mut out = OutputArgument::new();
        // SAFETY: bool result.
        let hit: bool = unsafe {
            rt.call(hash::GET_PED_LAST_WEAPON_IMPACT_COORD, &[self.into(), (&mut out).into()])
        }?;
        if !hit {
            return Ok(None);
        }
        // SAFETY: the native wrote a padded vector into the slot.
        unsafe { out.result::<Vector3>() }.map(Some)
    }
}

impl NativeValue for Ped {
    fn native_value(&self) -> NativeWord {
        NativeWord(self.handle as i64 as u64)
    }

    fn from_native_value(word: NativeWord) -> Self {
        Self { handle: word.0 as i32 }
    }
}

impl From<Ped> for Entity {
    fn from(ped: Ped) -> Self {
        ped.entity()
    }
}

impl_native_value!(Model, Entity, Ped);
