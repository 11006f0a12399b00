//! Identity encoding and cursor picking.
//!
//! Every visible entity is drawn into an 8-bit identity channel with the
//! value `id / 255`. Reading back the single texel under the cursor and
//! decoding it tells us which entity (if any) the user is pointing at.
//! Ids are spaced [`ID_STEP`] apart so that a slightly-off sample never
//! aliases onto a neighbouring entity; `255` is reserved for the cleared
//! background.

use glam::{UVec2, Vec2};

use crate::entity::EntityId;
use crate::error::{MedscopeError, Result};
use crate::registry::Registry;

/// Channel value the identity target is cleared to.
pub const BACKGROUND_CODE: u8 = 255;

/// Spacing between consecutive entity ids.
pub const ID_STEP: u8 = 10;

/// Number of ids the allocator can hand out (10, 20, ..., 250).
pub const MAX_ENTITIES: usize = 254 / ID_STEP as usize;

/// Returns the normalized channel value written when drawing entity `id`.
#[must_use]
pub fn encode(id: EntityId) -> f32 {
    f32::from(id.get()) / 255.0
}

/// Returns the byte an 8-bit unorm target stores for entity `id`.
///
/// This is what [`decode`] receives back after readback.
#[must_use]
pub fn encode_byte(id: EntityId) -> u8 {
    // Same rounding the GPU applies when storing to a unorm channel.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let byte = (encode(id) * 255.0).round() as u8;
    byte
}

/// Decodes a sampled identity byte.
///
/// Returns `None` for the background sentinel, for zero, and for any value
/// that is not on the id grid.
#[must_use]
pub fn decode(byte: u8) -> Option<EntityId> {
    if byte == BACKGROUND_CODE || byte % ID_STEP != 0 {
        return None;
    }
    EntityId::new(byte)
}

/// Hands out identity codes in registration order.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u8,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: ID_STEP }
    }
}

impl IdAllocator {
    /// Creates an allocator starting at the first code.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next free id.
    pub fn allocate(&mut self) -> Result<EntityId> {
        let id = EntityId::new(self.next).ok_or(MedscopeError::RegistryFull {
            capacity: MAX_ENTITIES,
        })?;
        self.next = self.next.checked_add(ID_STEP).unwrap_or(BACKGROUND_CODE);
        if self.next > 254 {
            self.next = BACKGROUND_CODE;
        }
        Ok(id)
    }

    /// Returns how many ids are still available.
    pub fn remaining(&self) -> usize {
        if self.next == BACKGROUND_CODE {
            0
        } else {
            MAX_ENTITIES + 1 - usize::from(self.next / ID_STEP)
        }
    }
}

/// Synchronous access to the identity buffer.
///
/// [`prepare`](Self::prepare) is called once per frame after transforms are
/// composed and before any read, so GPU-backed implementations draw the
/// identity pass there. [`read_identity_pixel`](Self::read_identity_pixel)
/// then fetches the texel at `(x, y)` in target pixel coordinates and blocks
/// until the value is available. An asynchronous, one-frame-late
/// implementation can sit behind the same trait.
pub trait PickReadback {
    /// Produces this frame's identity image from the registry.
    fn prepare(&mut self, registry: &Registry) -> Result<()> {
        let _ = registry;
        Ok(())
    }

    /// Returns the identity byte at `(x, y)`.
    fn read_identity_pixel(&mut self, x: u32, y: u32) -> Result<u8>;

    /// Returns the identity target size in pixels.
    fn target_size(&self) -> UVec2;

    /// Returns where row zero of the target lives.
    fn origin(&self) -> PixelOrigin {
        PixelOrigin::TopLeft
    }
}

/// Row origin of a pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelOrigin {
    /// Row zero is the top row (window systems, wgpu textures).
    #[default]
    TopLeft,
    /// Row zero is the bottom row (GL framebuffers).
    BottomLeft,
}

/// Converts a cursor position in window pixels (top-left origin) into
/// texel coordinates of the identity target.
///
/// Scales for targets whose size differs from the window and flips Y when
/// the target stores rows bottom-up. Returns `None` outside the target.
#[must_use]
pub fn cursor_to_target(
    cursor: Vec2,
    window_size: UVec2,
    target_size: UVec2,
    origin: PixelOrigin,
) -> Option<UVec2> {
    if window_size.x == 0 || window_size.y == 0 || target_size.x == 0 || target_size.y == 0 {
        return None;
    }
    if cursor.x < 0.0 || cursor.y < 0.0 {
        return None;
    }

    let scale = target_size.as_vec2() / window_size.as_vec2();
    let scaled = (cursor * scale).floor();
    if scaled.x >= target_size.x as f32 || scaled.y >= target_size.y as f32 {
        return None;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (x, y) = (scaled.x as u32, scaled.y as u32);
    let y = match origin {
        PixelOrigin::TopLeft => y,
        PixelOrigin::BottomLeft => target_size.y - 1 - y,
    };
    Some(UVec2::new(x, y))
}

/// What the cursor resolved to this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickHit {
    /// A live entity is under the cursor.
    Entity(EntityId),
    /// The cursor is over empty background (sentinel read back).
    Background,
    /// Nothing usable: cursor outside the target, or an undecodable value.
    #[default]
    Nothing,
}

impl PickHit {
    /// Returns the hit entity id, if any.
    #[must_use]
    pub fn entity(self) -> Option<EntityId> {
        match self {
            PickHit::Entity(id) => Some(id),
            _ => None,
        }
    }
}

/// Samples the identity buffer under the cursor and resolves it against the registry.
///
/// Pure query: no entity state is touched. Readback failures propagate.
pub fn resolve(
    readback: &mut dyn PickReadback,
    registry: &Registry,
    cursor: Vec2,
    window_size: UVec2,
) -> Result<PickHit> {
    let Some(texel) = cursor_to_target(
        cursor,
        window_size,
        readback.target_size(),
        readback.origin(),
    ) else {
        return Ok(PickHit::Nothing);
    };

    let byte = readback.read_identity_pixel(texel.x, texel.y)?;
    if byte == BACKGROUND_CODE {
        return Ok(PickHit::Background);
    }

    match decode(byte).filter(|id| registry.contains(*id)) {
        Some(id) => Ok(PickHit::Entity(id)),
        None => {
            log::warn!("identity value {byte} at ({}, {}) matches no entity", texel.x, texel.y);
            Ok(PickHit::Nothing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Category, EntityDesc};
    use proptest::prelude::*;

    struct FixedPixel {
        value: u8,
        size: UVec2,
        origin: PixelOrigin,
        last: Option<(u32, u32)>,
    }

    impl PickReadback for FixedPixel {
        fn read_identity_pixel(&mut self, x: u32, y: u32) -> Result<u8> {
            self.last = Some((x, y));
            Ok(self.value)
        }

        fn target_size(&self) -> UVec2 {
            self.size
        }

        fn origin(&self) -> PixelOrigin {
            self.origin
        }
    }

    fn fixed(value: u8) -> FixedPixel {
        FixedPixel {
            value,
            size: UVec2::new(100, 100),
            origin: PixelOrigin::TopLeft,
            last: None,
        }
    }

    #[test]
    fn test_background_decodes_to_none() {
        assert_eq!(decode(BACKGROUND_CODE), None);
        assert_eq!(decode(0), None);
        assert_eq!(decode(15), None);
    }

    #[test]
    fn test_allocator_exhausts() {
        let mut alloc = IdAllocator::new();
        let mut ids = Vec::new();
        while let Ok(id) = alloc.allocate() {
            ids.push(id.get());
        }
        assert_eq!(ids.len(), MAX_ENTITIES);
        assert_eq!(ids.first(), Some(&10));
        assert_eq!(ids.last(), Some(&250));
        assert_eq!(alloc.remaining(), 0);
        assert!(matches!(
            alloc.allocate(),
            Err(MedscopeError::RegistryFull { .. })
        ));
    }

    #[test]
    fn test_allocator_remaining_counts_down() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.remaining(), MAX_ENTITIES);
        alloc.allocate().unwrap();
        assert_eq!(alloc.remaining(), MAX_ENTITIES - 1);
    }

    #[test]
    fn test_cursor_flip_for_bottom_left_targets() {
        let size = UVec2::new(800, 600);
        let top = cursor_to_target(Vec2::new(10.0, 0.0), size, size, PixelOrigin::TopLeft);
        let bottom = cursor_to_target(Vec2::new(10.0, 0.0), size, size, PixelOrigin::BottomLeft);
        assert_eq!(top, Some(UVec2::new(10, 0)));
        assert_eq!(bottom, Some(UVec2::new(10, 599)));
    }

    #[test]
    fn test_cursor_scaled_to_target() {
        let texel = cursor_to_target(
            Vec2::new(400.0, 300.0),
            UVec2::new(800, 600),
            UVec2::new(1600, 1200),
            PixelOrigin::TopLeft,
        );
        assert_eq!(texel, Some(UVec2::new(800, 600)));
    }

    #[test]
    fn test_cursor_outside_target() {
        let size = UVec2::new(800, 600);
        assert!(cursor_to_target(Vec2::new(-1.0, 5.0), size, size, PixelOrigin::TopLeft).is_none());
        assert!(cursor_to_target(Vec2::new(800.0, 5.0), size, size, PixelOrigin::TopLeft).is_none());
        assert!(cursor_to_target(Vec2::ZERO, UVec2::ZERO, size, PixelOrigin::TopLeft).is_none());
    }

    #[test]
    fn test_resolve_hits() {
        let mut registry = Registry::new();
        let liver = registry
            .register(EntityDesc::new("liver", Category::Surface))
            .unwrap();
        let window = UVec2::new(100, 100);

        let mut px = fixed(liver.get());
        let hit = resolve(&mut px, &registry, Vec2::new(5.0, 7.0), window).unwrap();
        assert_eq!(hit, PickHit::Entity(liver));
        assert_eq!(px.last, Some((5, 7)));

        let mut px = fixed(BACKGROUND_CODE);
        let hit = resolve(&mut px, &registry, Vec2::new(5.0, 7.0), window).unwrap();
        assert_eq!(hit, PickHit::Background);

        // On the id grid but not registered.
        let mut px = fixed(200);
        let hit = resolve(&mut px, &registry, Vec2::new(5.0, 7.0), window).unwrap();
        assert_eq!(hit, PickHit::Nothing);

        let mut px = fixed(BACKGROUND_CODE);
        let hit = resolve(&mut px, &registry, Vec2::new(500.0, 7.0), window).unwrap();
        assert_eq!(hit, PickHit::Nothing);
        assert!(px.last.is_none());
    }

    #[test]
    fn test_resolve_propagates_readback_failure() {
        struct Broken;
        impl PickReadback for Broken {
            fn read_identity_pixel(&mut self, _x: u32, _y: u32) -> Result<u8> {
                Err(MedscopeError::Readback("device lost".into()))
            }
            fn target_size(&self) -> UVec2 {
                UVec2::new(10, 10)
            }
        }

        let registry = Registry::new();
        let result = resolve(&mut Broken, &registry, Vec2::ONE, UVec2::new(10, 10));
        assert!(matches!(result, Err(MedscopeError::Readback(_))));
    }

    proptest! {
        #[test]
        fn prop_codec_roundtrip(n in 1u8..=25) {
            let id = EntityId::new(n * ID_STEP).unwrap();
            prop_assert_eq!(decode(encode_byte(id)), Some(id));
        }

        #[test]
        fn prop_off_grid_values_never_decode(byte in any::<u8>()) {
            if byte % ID_STEP != 0 || byte == 0 || byte == BACKGROUND_CODE {
                prop_assert_eq!(decode(byte), None);
            }
        }
    }
}
