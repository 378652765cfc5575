// offsets.rs — Game build numbers and the versioned table of struct offsets.
//
// Entity and ped structs move between game builds. Instead of hard-coding one
// offset per field, each field owns a list of (first build, offset) thresholds.
// Lookup walks the list from the newest threshold down and takes the first one
// the running build has reached ("highest satisfied threshold wins"). A build
// older than every threshold has no known offset: callers treat that as
// "feature unavailable" and fall back to a default value.
//
// The offsets and bit indices below are opaque engine facts taken from the
// reverse-engineered struct layouts. They are stored as data, not derived.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

// ============================================================
// Game Versions
// ============================================================

/// ScriptHookV's game version ordinal.
///
/// Steam and non-Steam builds of one release are adjacent ordinals, so
/// "build >= release X" comparisons work across both stores. `-1` is an
/// unknown build; any ordinal newer than the last named one is still ordered
/// correctly against the thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameVersion(pub i32);

macro_rules! game_versions {
    ($($name:ident = $ordinal:expr),* $(,)?) => {
        impl GameVersion {
            $(pub const $name: Self = Self($ordinal);)*
        }

        const VERSION_NAMES: &[(GameVersion, &str)] = &[
            $((GameVersion::$name, stringify!($name)),)*
        ];
    };
}

game_versions! {
    UNKNOWN = -1,
    V1_0_335_2_STEAM = 0,
    V1_0_335_2_NOSTEAM = 1,
    V1_0_350_1_STEAM = 2,
    V1_0_350_2_NOSTEAM = 3,
    V1_0_372_2_STEAM = 4,
    V1_0_372_2_NOSTEAM = 5,
    V1_0_393_2_STEAM = 6,
    V1_0_393_2_NOSTEAM = 7,
    V1_0_393_4_STEAM = 8,
    V1_0_393_4_NOSTEAM = 9,
    V1_0_463_1_STEAM = 10,
    V1_0_463_1_NOSTEAM = 11,
    V1_0_505_2_STEAM = 12,
    V1_0_505_2_NOSTEAM = 13,
    V1_0_573_1_STEAM = 14,
    V1_0_573_1_NOSTEAM = 15,
    V1_0_617_1_STEAM = 16,
    V1_0_617_1_NOSTEAM = 17,
    V1_0_678_1_STEAM = 18,
    V1_0_678_1_NOSTEAM = 19,
    V1_0_757_2_STEAM = 20,
    V1_0_757_2_NOSTEAM = 21,
    V1_0_757_4_STEAM = 22,
    V1_0_757_4_NOSTEAM = 23,
    V1_0_791_2_STEAM = 24,
    V1_0_791_2_NOSTEAM = 25,
    V1_0_877_1_STEAM = 26,
    V1_0_877_1_NOSTEAM = 27,
    V1_0_944_2_STEAM = 28,
    V1_0_944_2_NOSTEAM = 29,
    V1_0_1011_1_STEAM = 30,
    V1_0_1011_1_NOSTEAM = 31,
    V1_0_1032_1_STEAM = 32,
    V1_0_1032_1_NOSTEAM = 33,
    V1_0_1103_2_STEAM = 34,
    V1_0_1103_2_NOSTEAM = 35,
    V1_0_1180_2_STEAM = 36,
    V1_0_1180_2_NOSTEAM = 37,
    V1_0_1290_1_STEAM = 38,
    V1_0_1290_1_NOSTEAM = 39,
    V1_0_1365_1_STEAM = 40,
    V1_0_1365_1_NOSTEAM = 41,
    V1_0_1493_0_STEAM = 42,
    V1_0_1493_0_NOSTEAM = 43,
    V1_0_1493_1_STEAM = 44,
    V1_0_1493_1_NOSTEAM = 45,
    V1_0_1604_0_STEAM = 46,
    V1_0_1604_0_NOSTEAM = 47,
    V1_0_1604_1_STEAM = 48,
    V1_0_1604_1_NOSTEAM = 49,
    V1_0_1737_0_STEAM = 50,
    V1_0_1737_0_NOSTEAM = 51,
    V1_0_1737_6_STEAM = 52,
    V1_0_1737_6_NOSTEAM = 53,
    V1_0_1868_0_STEAM = 54,
    V1_0_1868_0_NOSTEAM = 55,
    V1_0_1868_1_STEAM = 56,
    V1_0_1868_1_NOSTEAM = 57,
    V1_0_1868_4_EGS = 58,
    V1_0_2060_0_STEAM = 59,
    V1_0_2060_0_NOSTEAM = 60,
}

impl GameVersion {
    /// Name of a known build, `None` for ordinals without a name.
    pub fn name(self) -> Option<&'static str> {
        VERSION_NAMES.iter().find(|(v, _)| *v == self).map(|(_, n)| *n)
    }

    /// Parse either a known name (`V1_0_877_1_STEAM`, case-insensitive) or a
    /// bare ordinal.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(n) = text.parse::<i32>() {
            return Some(Self(n));
        }
        VERSION_NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(text))
            .map(|(v, _)| *v)
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(n) => f.write_str(n),
            None => write!(f, "ordinal {}", self.0),
        }
    }
}

// ============================================================
// Fields
// ============================================================

/// Semantic struct fields reachable through direct memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldId {
    // Entity (CEntity / CPhysical)
    EntityPositionFrozen,
    EntityRendered,
    EntityHealth,
    EntityMaxHealth,
    EntityBulletProof,
    EntityFireProof,
    EntityCollisionProof,
    EntityMeleeProof,
    EntityInvincible,
    EntityOnlyDamagedByPlayer,
    EntityExplosionProof,
    EntityWaterCannonProof,
    EntitySteamProof,
    EntitySmokeProof,
    EntityRightVector,
    EntityForwardVector,
    EntityUpVector,
    EntityPhysicsInfo,

    // Physics info behind EntityPhysicsInfo
    PhysicsGravityDisabled,

    // Ped (CPed)
    PedSweat,
    PedArmor,
    PedCriticalHitFlags,
    PedDropsWeaponsFlags,
    PedInjuryHealthThreshold,
    PedFatalInjuryHealthThreshold,
    PedSeatIndex,
}

/// A resolved field: byte offset from the object base, plus the bit index for
/// flag fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldLocation {
    pub offset: usize,
    pub bit: Option<u32>,
}

/// Thresholds for one field, ascending by version.
#[derive(Clone, Debug)]
struct FieldOffsets {
    bit: Option<u32>,
    thresholds: Vec<(GameVersion, usize)>,
}

// ============================================================
// Versioned Offset Table
// ============================================================

/// Maps (field, running version) to a byte offset.
#[derive(Clone, Debug, Default)]
pub struct VersionedOffsetTable {
    fields: HashMap<FieldId, FieldOffsets>,
}

impl VersionedOffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `field` with its thresholds. Order of `thresholds` does not
    /// matter; registering a field twice replaces the earlier entry.
    pub fn insert(&mut self, field: FieldId, bit: Option<u32>, thresholds: &[(GameVersion, usize)]) -> &mut Self {
        let mut thresholds = thresholds.to_vec();
        thresholds.sort_by_key(|(v, _)| *v);
        self.fields.insert(field, FieldOffsets { bit, thresholds });
        self
    }

    /// Offset of `field` for a game running `version`.
    pub fn resolve(&self, field: FieldId, version: GameVersion) -> Result<usize> {
        self.fields
            .get(&field)
            .and_then(|f| {
                f.thresholds
                    .iter()
                    .rev()
                    .find(|(min, _)| *min <= version)
                    .map(|(_, offset)| *offset)
            })
            .ok_or(Error::NoOffsetKnown { field, version })
    }

    /// Bit index of a flag field.
    pub fn bit(&self, field: FieldId) -> Option<u32> {
        self.fields.get(&field).and_then(|f| f.bit)
    }

    pub fn locate(&self, field: FieldId, version: GameVersion) -> Result<FieldLocation> {
        let offset = self.resolve(field, version)?;
        Ok(FieldLocation { offset, bit: self.bit(field) })
    }

    /// The table of known struct layouts.
    pub fn builtin() -> &'static VersionedOffsetTable {
        &BUILTIN
    }
}

// ============================================================
// Known Layouts
// ============================================================

type V = GameVersion;

const ENTITY_DAMAGE_FLAGS: usize = 392; // CPhysical damage/proof bitfield

static BUILTIN: Lazy<VersionedOffsetTable> = Lazy::new(|| {
    let mut t = VersionedOffsetTable::new();

    // --- Entity ---
    t.insert(FieldId::EntityPositionFrozen, Some(1), &[(V::V1_0_335_2_STEAM, 0x2E)]);
    t.insert(FieldId::EntityRendered, Some(4), &[(V::V1_0_335_2_STEAM, 176)]);
    t.insert(FieldId::EntityHealth, None, &[(V::V1_0_335_2_STEAM, 0x280)]);
    t.insert(FieldId::EntityMaxHealth, None, &[
        (V::V1_0_335_2_STEAM, 0x284),
        (V::V1_0_877_1_STEAM, 0x2A0),
    ]);
    // Rows of the world matrix.
    t.insert(FieldId::EntityRightVector, None, &[(V::V1_0_335_2_STEAM, 0x60)]);
    t.insert(FieldId::EntityForwardVector, None, &[(V::V1_0_335_2_STEAM, 0x70)]);
    t.insert(FieldId::EntityUpVector, None, &[(V::V1_0_335_2_STEAM, 0x80)]);
    t.insert(FieldId::EntityPhysicsInfo, None, &[(V::V1_0_335_2_STEAM, 48)]);
    t.insert(FieldId::PhysicsGravityDisabled, Some(4), &[(V::V1_0_335_2_STEAM, 26)]);

    let proofs = [
        (FieldId::EntityBulletProof, 4),
        (FieldId::EntityFireProof, 5),
        (FieldId::EntityCollisionProof, 6),
        (FieldId::EntityMeleeProof, 7),
        (FieldId::EntityInvincible, 8),
        (FieldId::EntityOnlyDamagedByPlayer, 9),
        (FieldId::EntityExplosionProof, 11),
        (FieldId::EntityWaterCannonProof, 12),
        (FieldId::EntitySteamProof, 15),
        (FieldId::EntitySmokeProof, 16),
    ];
    for (field, bit) in proofs {
        t.insert(field, Some(bit), &[(V::V1_0_335_2_STEAM, ENTITY_DAMAGE_FLAGS)]);
    }

    // --- Ped ---
    t.insert(FieldId::PedSweat, None, &[
        (V::V1_0_335_2_STEAM, 0x1170),
        (V::V1_0_877_1_STEAM, 0x11A0),
        (V::V1_0_944_2_STEAM, 0x11B0),
        (V::V1_0_2060_0_STEAM, 0x11C0),
    ]);
    t.insert(FieldId::PedArmor, None, &[
        (V::V1_0_335_2_STEAM, 0x1464),
        (V::V1_0_372_2_STEAM, 0x1474),
        (V::V1_0_877_1_STEAM, 0x14A0),
        (V::V1_0_944_2_STEAM, 0x14B0),
        (V::V1_0_1290_1_STEAM, 0x14B8),
        (V::V1_0_2060_0_STEAM, 0x14E0),
    ]);
    // Bit set means the ped is immune to critical hits.
    t.insert(FieldId::PedCriticalHitFlags, Some(2), &[
        (V::V1_0_335_2_STEAM, 0x13AC),
        (V::V1_0_372_2_STEAM, 0x13BC),
        (V::V1_0_877_1_STEAM, 0x13E4),
        (V::V1_0_944_2_STEAM, 0x13F4),
        (V::V1_0_2060_0_STEAM, 0x1414),
    ]);
    // Bit set means the ped keeps its weapons on death.
    t.insert(FieldId::PedDropsWeaponsFlags, Some(6), &[
        (V::V1_0_335_2_STEAM, 0x13BD),
        (V::V1_0_877_1_STEAM, 0x13E5),
        (V::V1_0_944_2_STEAM, 0x13F5),
        (V::V1_0_2060_0_STEAM, 0x1415),
    ]);
    t.insert(FieldId::PedInjuryHealthThreshold, None, &[
        (V::V1_0_335_2_STEAM, 0x1470),
        (V::V1_0_372_2_STEAM, 0x1480),
        (V::V1_0_877_1_STEAM, 0x14C8),
        (V::V1_0_944_2_STEAM, 0x14D8),
        (V::V1_0_1290_1_STEAM, 0x14E0),
        (V::V1_0_2060_0_STEAM, 0x1508),
    ]);
    t.insert(FieldId::PedFatalInjuryHealthThreshold, None, &[
        (V::V1_0_335_2_STEAM, 0x1474),
        (V::V1_0_372_2_STEAM, 0x1484),
        (V::V1_0_877_1_STEAM, 0x14CC),
        (V::V1_0_944_2_STEAM, 0x14DC),
        (V::V1_0_1290_1_STEAM, 0x14E4),
        (V::V1_0_2060_0_STEAM, 0x150C),
    ]);
    t.insert(FieldId::PedSeatIndex, None, &[
        (V::V1_0_335_2_STEAM, 0x1540),
        (V::V1_0_877_1_STEAM, 0x1588),
        (V::V1_0_944_2_STEAM, 0x1598),
        (V::V1_0_1290_1_STEAM, 0x15A0),
        (V::V1_0_2060_0_STEAM, 0x15C8),
    ]);

    t
});
