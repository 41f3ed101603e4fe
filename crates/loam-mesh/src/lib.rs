//! CPU mesh extraction: turns one chunk's cells into vertex arrays,
//! grouped by render pass. Pure given the chunk and a neighbor sampler,
//! so it runs safely off the scheduling thread.
#![forbid(unsafe_code)]

use loam_blocks::{AIR, BlockId, BlockRegistry};
use loam_chunk::{LightKind, MAX_LIGHT, VoxelChunk};
use loam_geom::{Aabb, Vec3};
use loam_world::ChunkCoord;

mod face;
pub use face::{ALL_FACES, Face};

/// Square texture atlas dimension, in tiles per side.
pub const ATLAS_TILES: u16 = 16;

/// Per-vertex darkening for each shadow-casting occlusion sample.
const OCCLUSION_STEP: f32 = 0.2;

/// Constant dimming on the east/west faces so cube edges read in
/// uniform light.
const SIDE_DIM: f32 = 0.8;

/// Read access to cells outside the chunk being meshed. Implementors
/// resolve world coordinates against whatever neighbor data exists and
/// answer the out-of-bounds sentinel where none does.
pub trait VoxelSampler {
    fn block_at(&self, wx: i32, wy: i32, wz: i32) -> i32;
    /// Brighter of the two light channels at the cell, or the sentinel.
    fn light_at(&self, wx: i32, wy: i32, wz: i32) -> i32;
}

/// Sampler with no neighbor data at all; every probe misses.
pub struct NoNeighbors;

impl VoxelSampler for NoNeighbors {
    fn block_at(&self, _wx: i32, _wy: i32, _wz: i32) -> i32 {
        loam_blocks::OUT_OF_BOUNDS
    }
    fn light_at(&self, _wx: i32, _wy: i32, _wz: i32) -> i32 {
        loam_blocks::OUT_OF_BOUNDS
    }
}

/// One render pass worth of geometry: interleaved positions, normals,
/// atlas UVs, shade-modulated colors, and triangle indices.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct MeshGroup {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub col: Vec<u8>,
    pub idx: Vec<u16>,
}

impl MeshGroup {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    /// Appends a quad (two triangles). Vertex order is corrected so the
    /// winding agrees with the supplied normal. Index space is `u16`;
    /// quads past that cap are dropped instead of wrapping onto earlier
    /// vertices.
    pub fn add_quad(&mut self, vs: [Vec3; 4], n: Vec3, uvs: [(f32, f32); 4], rgba: [u8; 4]) {
        let base = self.pos.len() / 3;
        if base + 4 > usize::from(u16::MAX) + 1 {
            return;
        }
        let base = base as u16;
        let mut vs = vs;
        let mut uvs = uvs;
        let e1 = vs[1] - vs[0];
        let e2 = vs[2] - vs[0];
        let cross = Vec3::new(
            e1.y * e2.z - e1.z * e2.y,
            e1.z * e2.x - e1.x * e2.z,
            e1.x * e2.y - e1.y * e2.x,
        );
        if cross.dot(n) < 0.0 {
            vs.swap(1, 3);
            uvs.swap(1, 3);
        }
        for i in 0..4 {
            self.pos.extend_from_slice(&[vs[i].x, vs[i].y, vs[i].z]);
            self.norm.extend_from_slice(&[n.x, n.y, n.z]);
            self.uv.extend_from_slice(&[uvs[i].0, uvs[i].1]);
            self.col
                .extend_from_slice(&[rgba[0], rgba[1], rgba[2], rgba[3]]);
        }
        self.idx
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Finished mesh for one chunk, ready for the upload queue. Immutable
/// once built; `rev` lets the consumer drop stale payloads per chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshPayload {
    pub coord: ChunkCoord,
    pub rev: u64,
    pub bbox: Aabb,
    pub opaque: MeshGroup,
    pub translucent: MeshGroup,
    pub billboard: MeshGroup,
}

impl MeshPayload {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.translucent.is_empty() && self.billboard.is_empty()
    }
}

#[inline]
fn tessellates(reg: &BlockRegistry, id: BlockId) -> bool {
    reg.get(id).map(|ty| ty.tessellates).unwrap_or(false)
}

/// A cube face is emitted when the cell it points into does not hide
/// it: air, non-tessellating blocks, and billboards never hide a face,
/// and a translucent neighbor never hides an opaque block's face.
#[inline]
fn face_open(reg: &BlockRegistry, here: BlockId, neighbor: i32) -> bool {
    if neighbor < 0 {
        return true;
    }
    let nb = neighbor as BlockId;
    if nb == AIR || reg.is_billboard(nb) || !tessellates(reg, nb) {
        return true;
    }
    reg.is_translucent(nb) && !reg.is_translucent(here)
}

#[inline]
fn shade_rgba(tint: [u8; 4], shade: f32) -> [u8; 4] {
    let s = (shade.clamp(0.0, 1.0) * 255.0).round() as u16;
    let mul = |c: u8| ((u16::from(c) * s) / 255) as u8;
    [mul(tint[0]), mul(tint[1]), mul(tint[2]), tint[3]]
}

/// Maps a local `(u,v)` in `[0,1]` onto the atlas rectangle of `tile`.
#[inline]
fn atlas_uv(tile: u16, u: f32, v: f32) -> (f32, f32) {
    let step = 1.0 / f32::from(ATLAS_TILES);
    let tu = f32::from(tile % ATLAS_TILES);
    let tv = f32::from(tile / ATLAS_TILES);
    ((tu + u) * step, (tv + v) * step)
}

struct Extract<'a, S: VoxelSampler> {
    chunk: &'a VoxelChunk,
    sampler: &'a S,
    reg: &'a BlockRegistry,
    base_x: i32,
    base_z: i32,
}

impl<S: VoxelSampler> Extract<'_, S> {
    #[inline]
    fn local(&self, wx: i32, wy: i32, wz: i32) -> Option<(i32, i32, i32)> {
        let lx = wx - self.base_x;
        let lz = wz - self.base_z;
        if lx >= 0
            && (lx as usize) < self.chunk.sx
            && wy >= 0
            && (wy as usize) < self.chunk.sy
            && lz >= 0
            && (lz as usize) < self.chunk.sz
        {
            Some((lx, wy, lz))
        } else {
            None
        }
    }

    fn block(&self, wx: i32, wy: i32, wz: i32) -> i32 {
        match self.local(wx, wy, wz) {
            Some((x, y, z)) => self.chunk.get_block(x, y, z),
            None => self.sampler.block_at(wx, wy, wz),
        }
    }

    fn light(&self, wx: i32, wy: i32, wz: i32) -> i32 {
        match self.local(wx, wy, wz) {
            Some((x, y, z)) => self
                .chunk
                .get_light(x, y, z, LightKind::Sky)
                .max(self.chunk.get_light(x, y, z, LightKind::Block)),
            None => self.sampler.light_at(wx, wy, wz),
        }
    }

    /// Shade for one face: the light factor of the cell the face points
    /// into, dimmed by the occlusion samples. Bottom faces skip
    /// occlusion; top faces at the chunk ceiling are forced fully lit.
    fn face_shade(&self, wx: i32, wy: i32, wz: i32, face: Face) -> f32 {
        if face == Face::PosY && wy as usize == self.chunk.sy - 1 {
            return 1.0;
        }
        let (dx, dy, dz) = face.delta();
        let mut lv = self.light(wx + dx, wy + dy, wz + dz);
        if lv < 0 {
            lv = self.light(wx, wy, wz).max(0);
        }
        let mut shade = lv as f32 / f32::from(MAX_LIGHT);
        if face != Face::NegY {
            let mut occluders = 0;
            for (ox, oy, oz) in face.occlusion_deltas() {
                let nb = self.block(wx + ox, wy + oy, wz + oz);
                if nb > 0 && self.reg.casts_shadow(nb as BlockId) {
                    occluders += 1;
                }
            }
            shade *= (1.0 - OCCLUSION_STEP * occluders as f32).max(0.0);
        }
        if matches!(face, Face::PosX | Face::NegX) {
            shade *= SIDE_DIM;
        }
        shade
    }

    fn emit_cube(&self, out: &mut MeshGroup, wx: i32, wy: i32, wz: i32, id: BlockId) {
        let Some(ty) = self.reg.get(id) else { return };
        let origin = Vec3::new(wx as f32, wy as f32, wz as f32);
        for face in ALL_FACES {
            let (dx, dy, dz) = face.delta();
            if !face_open(self.reg, id, self.block(wx + dx, wy + dy, wz + dz)) {
                continue;
            }
            let vs = face.corners(origin);
            let tile = ty.textures[face.index()];
            let mut uvs = [(0.0, 0.0); 4];
            for (i, v) in vs.iter().enumerate() {
                let (u, vv) = face.corner_uv(origin, *v);
                uvs[i] = atlas_uv(tile, u, vv);
            }
            let rgba = shade_rgba(ty.tint, self.face_shade(wx, wy, wz, face));
            out.add_quad(vs, face.normal(), uvs, rgba);
        }
    }

    /// Two crossed vertical quads on the cell diagonals. Billboards
    /// ignore face visibility and occlusion; the cell's own light sets
    /// the shade.
    fn emit_billboard(&self, out: &mut MeshGroup, wx: i32, wy: i32, wz: i32, id: BlockId) {
        let Some(ty) = self.reg.get(id) else { return };
        let (x, y, z) = (wx as f32, wy as f32, wz as f32);
        let lv = self.light(wx, wy, wz).max(0);
        let rgba = shade_rgba(ty.tint, lv as f32 / f32::from(MAX_LIGHT));
        let tile = ty.textures[Face::PosX.index()];
        let uvs = [
            atlas_uv(tile, 0.0, 1.0),
            atlas_uv(tile, 0.0, 0.0),
            atlas_uv(tile, 1.0, 0.0),
            atlas_uv(tile, 1.0, 1.0),
        ];
        let k = std::f32::consts::FRAC_1_SQRT_2;
        out.add_quad(
            [
                Vec3::new(x, y, z),
                Vec3::new(x, y + 1.0, z),
                Vec3::new(x + 1.0, y + 1.0, z + 1.0),
                Vec3::new(x + 1.0, y, z + 1.0),
            ],
            Vec3::new(k, 0.0, -k),
            uvs,
            rgba,
        );
        out.add_quad(
            [
                Vec3::new(x, y, z + 1.0),
                Vec3::new(x, y + 1.0, z + 1.0),
                Vec3::new(x + 1.0, y + 1.0, z),
                Vec3::new(x + 1.0, y, z),
            ],
            Vec3::new(k, 0.0, k),
            uvs,
            rgba,
        );
    }
}

/// Builds the full mesh for one chunk. Reads the chunk directly and
/// everything past its extents through the sampler; mutates nothing.
pub fn build_chunk_mesh<S: VoxelSampler>(
    chunk: &VoxelChunk,
    sampler: &S,
    reg: &BlockRegistry,
) -> MeshPayload {
    let base_x = chunk.coord.cx * chunk.sx as i32;
    let base_z = chunk.coord.cz * chunk.sz as i32;
    let ex = Extract {
        chunk,
        sampler,
        reg,
        base_x,
        base_z,
    };

    let mut opaque = MeshGroup::default();
    let mut translucent = MeshGroup::default();
    let mut billboard = MeshGroup::default();

    for z in 0..chunk.sz {
        for y in 0..chunk.sy {
            for x in 0..chunk.sx {
                let raw = chunk.get_block(x as i32, y as i32, z as i32);
                if raw <= 0 {
                    continue;
                }
                let id = raw as BlockId;
                let (wx, wy, wz) = (base_x + x as i32, y as i32, base_z + z as i32);
                if reg.is_billboard(id) {
                    ex.emit_billboard(&mut billboard, wx, wy, wz, id);
                } else if tessellates(reg, id) {
                    let out = if reg.is_translucent(id) {
                        &mut translucent
                    } else {
                        &mut opaque
                    };
                    ex.emit_cube(out, wx, wy, wz, id);
                }
            }
        }
    }

    MeshPayload {
        coord: chunk.coord,
        rev: chunk.rev,
        bbox: Aabb::new(
            Vec3::new(base_x as f32, 0.0, base_z as f32),
            Vec3::new(
                base_x as f32 + chunk.sx as f32,
                chunk.sy as f32,
                base_z as f32 + chunk.sz as f32,
            ),
        ),
        opaque,
        translucent,
        billboard,
    }
}
