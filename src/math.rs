// math.rs — 2- and 3-component float vectors exchanged with the game.
//
// Two layouts exist for the same vector:
//   - in entity memory a Vector3 is a packed float[3] (x@0, y@4, z@8)
//   - at the native-call boundary every component is padded to an 8-byte slot
//     (x@0, y@8, z@16); see codec.rs for that layout.

/// A 3-component vector matching the engine's packed float[3] layout.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    // Entity-local axes.
    pub const RELATIVE_RIGHT: Self = Self::new(1.0, 0.0, 0.0);
    pub const RELATIVE_FRONT: Self = Self::new(0.0, 1.0, 0.0);
    pub const RELATIVE_TOP: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A 2-component vector (screen positions, 2D offsets).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}
