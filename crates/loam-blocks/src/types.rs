/// Block type id as stored per voxel cell. One byte per cell.
pub type BlockId = u8;

/// The empty cell. Id 0 is air in every registry.
pub const AIR: BlockId = 0;

/// Sentinel returned by world probes that land outside chunk extents.
/// Cross-chunk lookups on the hot path test against this instead of
/// unwrapping an `Option`.
pub const OUT_OF_BOUNDS: i32 = -1;

/// A registered block type. Flags drive lighting and meshing; the
/// texture table maps the six faces onto atlas tiles.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockType {
    pub name: String,
    /// Light passes through this block (air, glass, leaves, water).
    pub translucent: bool,
    /// Rendered as crossed camera-agnostic quads instead of cube faces.
    pub billboard: bool,
    /// Emits cube faces at all. Air and other empty markers do not.
    pub tessellates: bool,
    /// Counts toward the per-vertex occlusion term of adjacent faces.
    pub casts_shadow: bool,
    /// Local light emission, 0..=15. Non-zero types seed block light.
    pub emission: u8,
    /// Atlas tile per face in +Y, -Y, +X, -X, +Z, -Z order (matches the
    /// mesher's face indexing).
    pub textures: [u16; 6],
    pub tint: [u8; 4],
}

impl BlockType {
    #[inline]
    pub fn is_opaque(&self) -> bool {
        !self.translucent
    }
}
