//! Chunk voxel storage: block ids, two light channels, dirty flags.
#![forbid(unsafe_code)]

use loam_blocks::{AIR, BlockId, BlockRegistry, OUT_OF_BOUNDS};
use loam_world::ChunkCoord;

mod serial;

pub use serial::{deserialize_chunk, serialize_chunk};

/// Maximum light intensity for both channels.
pub const MAX_LIGHT: u8 = 15;

/// Which of the two independent 0..=15 illumination channels.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LightKind {
    Sky,
    Block,
}

/// Which lateral chunk faces a local edit touched. The store uses this
/// to dirty exactly the neighbor sharing the crossed face.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TouchedFaces {
    pub neg_x: bool,
    pub pos_x: bool,
    pub neg_z: bool,
    pub pos_z: bool,
}

impl TouchedFaces {
    pub const NONE: TouchedFaces = TouchedFaces {
        neg_x: false,
        pos_x: false,
        neg_z: false,
        pos_z: false,
    };

    #[inline]
    pub fn any(self) -> bool {
        self.neg_x || self.pos_x || self.neg_z || self.pos_z
    }

    /// Neighbor coordinate offsets for every touched face.
    pub fn offsets(self) -> impl Iterator<Item = (i32, i32)> {
        [
            (self.neg_x, (-1, 0)),
            (self.pos_x, (1, 0)),
            (self.neg_z, (0, -1)),
            (self.pos_z, (0, 1)),
        ]
        .into_iter()
        .filter_map(|(hit, d)| hit.then_some(d))
    }
}

/// A fixed-height column of voxels. Block ids and both light channels
/// are one byte per cell, linearized with the same (y, z, x) nesting
/// the rest of the engine uses.
#[derive(Clone, Debug)]
pub struct VoxelChunk {
    pub coord: ChunkCoord,
    pub sx: usize,
    pub sy: usize,
    pub sz: usize,
    pub blocks: Vec<u8>,
    pub sky_light: Vec<u8>,
    pub block_light: Vec<u8>,
    /// Geometry must be rebuilt.
    pub dirty: bool,
    /// Illumination must be recomputed.
    pub light_dirty: bool,
    /// Never generated or loaded; arrays are not yet meaningful and
    /// neighbors must not read them for light propagation.
    pub fresh: bool,
    /// Bumped on every mutating edit; consumers drop stale payloads.
    pub rev: u64,
}

impl VoxelChunk {
    pub fn new(coord: ChunkCoord, sx: usize, sy: usize, sz: usize) -> Self {
        let n = sx * sy * sz;
        Self {
            coord,
            sx,
            sy,
            sz,
            blocks: vec![AIR; n],
            sky_light: vec![0; n],
            block_light: vec![0; n],
            dirty: false,
            light_dirty: false,
            fresh: true,
            rev: 0,
        }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.sz + z) * self.sx + x
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && x < self.sx as i32
            && y < self.sy as i32
            && z < self.sz as i32
    }

    /// Block id at a local coordinate, or [`OUT_OF_BOUNDS`] outside the
    /// chunk extents. Sentinel instead of `Option`: neighbor-crossing
    /// probes are extremely frequent on the hot path.
    #[inline]
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> i32 {
        if !self.in_bounds(x, y, z) {
            return OUT_OF_BOUNDS;
        }
        i32::from(self.blocks[self.idx(x as usize, y as usize, z as usize)])
    }

    /// Writes a block cell. Out-of-range writes are silent no-ops.
    /// An opaque block zeroes sky light at its cell; any change marks
    /// the chunk dirty and reports which lateral faces were touched.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, id: BlockId, reg: &BlockRegistry) -> TouchedFaces {
        if !self.in_bounds(x, y, z) {
            return TouchedFaces::NONE;
        }
        let i = self.idx(x as usize, y as usize, z as usize);
        let prev = self.blocks[i];
        self.blocks[i] = id;
        if !reg.is_translucent(id) {
            self.sky_light[i] = 0;
        }
        if prev == id {
            return TouchedFaces::NONE;
        }
        self.dirty = true;
        self.rev += 1;
        self.touched_faces(x, z)
    }

    #[inline]
    pub fn get_light(&self, x: i32, y: i32, z: i32, kind: LightKind) -> i32 {
        if !self.in_bounds(x, y, z) {
            return OUT_OF_BOUNDS;
        }
        let i = self.idx(x as usize, y as usize, z as usize);
        i32::from(match kind {
            LightKind::Sky => self.sky_light[i],
            LightKind::Block => self.block_light[i],
        })
    }

    /// Writes a light cell. No-op while `fresh` or out of range; a
    /// changed value marks the chunk dirty, bumps `rev`, and reports
    /// touched faces.
    pub fn set_light(&mut self, x: i32, y: i32, z: i32, kind: LightKind, value: u8) -> TouchedFaces {
        if self.fresh || !self.in_bounds(x, y, z) {
            return TouchedFaces::NONE;
        }
        let value = value.min(MAX_LIGHT);
        let i = self.idx(x as usize, y as usize, z as usize);
        let slot = match kind {
            LightKind::Sky => &mut self.sky_light[i],
            LightKind::Block => &mut self.block_light[i],
        };
        if *slot == value {
            return TouchedFaces::NONE;
        }
        *slot = value;
        self.dirty = true;
        self.rev += 1;
        self.touched_faces(x, z)
    }

    /// True iff every cell above (x,y,z) up to the chunk ceiling is
    /// translucent. Out-of-range coordinates report false.
    pub fn can_see_sky(&self, x: i32, y: i32, z: i32, reg: &BlockRegistry) -> bool {
        if !self.in_bounds(x, y, z) {
            return false;
        }
        let (x, z) = (x as usize, z as usize);
        for yy in (y as usize + 1)..self.sy {
            let id = self.blocks[self.idx(x, yy, z)];
            if !reg.is_translucent(id) {
                return false;
            }
        }
        true
    }

    /// Top-down initial sky light, used by generators to satisfy the
    /// generation call contract: open columns get full light down to
    /// the first opaque cell, everything below stays dark.
    pub fn seed_skylight(&mut self, reg: &BlockRegistry) {
        for z in 0..self.sz {
            for x in 0..self.sx {
                let mut open = true;
                for y in (0..self.sy).rev() {
                    let i = self.idx(x, y, z);
                    if open && reg.is_translucent(self.blocks[i]) {
                        self.sky_light[i] = MAX_LIGHT;
                    } else {
                        open = false;
                        self.sky_light[i] = 0;
                    }
                }
            }
        }
    }

    /// Transitions out of the `fresh` state after terrain fill or a
    /// persisted load, queueing the chunk for lighting and meshing.
    pub fn finish_generation(&mut self) {
        self.fresh = false;
        self.dirty = true;
        self.light_dirty = true;
    }

    #[inline]
    fn touched_faces(&self, x: i32, z: i32) -> TouchedFaces {
        TouchedFaces {
            neg_x: x == 0,
            pos_x: x == self.sx as i32 - 1,
            neg_z: z == 0,
            pos_z: z == self.sz as i32 - 1,
        }
    }
}

/// External terrain-fill contract. Implementations write the block
/// array of a fresh chunk and compute initial sky light top-down;
/// everything else (flags, lighting repair, meshing) is the core's
/// concern.
pub trait ChunkGenerator: Send + Sync {
    fn generate(&self, chunk: &mut VoxelChunk, reg: &BlockRegistry);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg() -> BlockRegistry {
        BlockRegistry::from_toml_str(
            r#"
            [[blocks]]
            name = "stone"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn opaque_set_block_zeroes_sky_light() {
        let reg = reg();
        let stone = reg.id_by_name("stone").unwrap();
        let mut c = VoxelChunk::new(ChunkCoord::new(0, 0), 4, 4, 4);
        c.finish_generation();
        c.set_light(1, 1, 1, LightKind::Sky, 12);
        c.set_block(1, 1, 1, stone, &reg);
        assert_eq!(c.get_light(1, 1, 1, LightKind::Sky), 0);
    }

    #[test]
    fn set_light_is_a_no_op_while_fresh() {
        let mut c = VoxelChunk::new(ChunkCoord::new(0, 0), 4, 4, 4);
        assert!(c.fresh);
        c.set_light(1, 1, 1, LightKind::Block, 9);
        assert_eq!(c.get_light(1, 1, 1, LightKind::Block), 0);
        assert!(!c.dirty);
    }

    #[test]
    fn edge_writes_report_touched_faces() {
        let reg = reg();
        let stone = reg.id_by_name("stone").unwrap();
        let mut c = VoxelChunk::new(ChunkCoord::new(0, 0), 4, 4, 4);
        c.finish_generation();
        let t = c.set_block(0, 2, 3, stone, &reg);
        assert!(t.neg_x && t.pos_z && !t.pos_x && !t.neg_z);
        let offsets: Vec<_> = t.offsets().collect();
        assert_eq!(offsets, vec![(-1, 0), (0, 1)]);
    }

    #[test]
    fn changed_cell_writes_bump_rev() {
        let reg = reg();
        let stone = reg.id_by_name("stone").unwrap();
        let mut c = VoxelChunk::new(ChunkCoord::new(0, 0), 4, 4, 4);
        c.finish_generation();
        let r0 = c.rev;
        c.set_light(1, 1, 1, LightKind::Block, 9);
        assert_eq!(c.rev, r0 + 1);
        // Writing the same value again is not an edit.
        c.set_light(1, 1, 1, LightKind::Block, 9);
        assert_eq!(c.rev, r0 + 1);
        c.set_block(1, 1, 1, stone, &reg);
        assert_eq!(c.rev, r0 + 2);
        c.set_block(1, 1, 1, stone, &reg);
        assert_eq!(c.rev, r0 + 2);
    }

    #[test]
    fn can_see_sky_scans_to_ceiling() {
        let reg = reg();
        let stone = reg.id_by_name("stone").unwrap();
        let mut c = VoxelChunk::new(ChunkCoord::new(0, 0), 4, 8, 4);
        c.finish_generation();
        assert!(c.can_see_sky(2, 0, 2, &reg));
        c.set_block(2, 5, 2, stone, &reg);
        assert!(!c.can_see_sky(2, 0, 2, &reg));
        assert!(c.can_see_sky(2, 5, 2, &reg));
    }
}
