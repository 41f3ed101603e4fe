//! Byte layout for persisted chunks.
//!
//! One flags byte (bit 0 = light_dirty), then three bytes per cell in
//! x-outer, y-middle, z-inner order: block id, sky light, block light.

use loam_world::ChunkCoord;

use crate::VoxelChunk;

const FLAG_LIGHT_DIRTY: u8 = 1 << 0;

pub fn serialize_chunk(chunk: &VoxelChunk) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + chunk.sx * chunk.sy * chunk.sz * 3);
    let mut flags = 0u8;
    if chunk.light_dirty {
        flags |= FLAG_LIGHT_DIRTY;
    }
    out.push(flags);
    for x in 0..chunk.sx {
        for y in 0..chunk.sy {
            for z in 0..chunk.sz {
                let i = chunk.idx(x, y, z);
                out.push(chunk.blocks[i]);
                out.push(chunk.sky_light[i]);
                out.push(chunk.block_light[i]);
            }
        }
    }
    out
}

/// Exact inverse of [`serialize_chunk`]. Returns `None` when the byte
/// count does not match the expected cell count. The result is not
/// `fresh` (persisted data is, by definition, generated) and needs a
/// mesh rebuild.
pub fn deserialize_chunk(
    coord: ChunkCoord,
    sx: usize,
    sy: usize,
    sz: usize,
    bytes: &[u8],
) -> Option<VoxelChunk> {
    if bytes.len() != 1 + sx * sy * sz * 3 {
        return None;
    }
    let mut chunk = VoxelChunk::new(coord, sx, sy, sz);
    let flags = bytes[0];
    let mut it = bytes[1..].iter().copied();
    for x in 0..sx {
        for y in 0..sy {
            for z in 0..sz {
                let i = chunk.idx(x, y, z);
                chunk.blocks[i] = it.next()?;
                chunk.sky_light[i] = it.next()?;
                chunk.block_light[i] = it.next()?;
            }
        }
    }
    chunk.fresh = false;
    chunk.dirty = true;
    chunk.light_dirty = flags & FLAG_LIGHT_DIRTY != 0;
    Some(chunk)
}
