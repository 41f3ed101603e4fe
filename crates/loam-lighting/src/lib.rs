//! Worklist light propagation and repair across chunk seams.
//!
//! All operations take world coordinates and reach voxels through the
//! [`LightWorld`] trait, so a flood naturally crosses chunk boundaries
//! wherever the backing store resolves them. Propagation is an explicit
//! breadth-first queue, never recursion: stack depth stays bounded and
//! every visit is guarded by an already-at-or-above check.
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use loam_blocks::{BlockId, BlockRegistry, OUT_OF_BOUNDS};
use loam_chunk::MAX_LIGHT;

pub use loam_chunk::LightKind;


const NEIGHBORS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// World-coordinate voxel access for the propagation worklists.
///
/// `block_at` must yield [`OUT_OF_BOUNDS`] for cells in fresh or
/// unresident chunks; that single rule keeps floods out of chunks whose
/// arrays are not yet meaningful.
pub trait LightWorld {
    fn block_at(&self, wx: i32, wy: i32, wz: i32) -> i32;
    fn light_at(&self, wx: i32, wy: i32, wz: i32, kind: LightKind) -> i32;
    fn set_light(&mut self, wx: i32, wy: i32, wz: i32, kind: LightKind, value: u8);
}

#[inline]
fn translucent_at<W: LightWorld>(world: &W, reg: &BlockRegistry, wx: i32, wy: i32, wz: i32) -> bool {
    let b = world.block_at(wx, wy, wz);
    b != OUT_OF_BOUNDS && reg.is_translucent(b as BlockId)
}

/// Floods light outward from a source cell.
///
/// Writes `value` at the seed, then walks a breadth-first queue: each
/// step offers `level - 1` to the six axis neighbors and only enters a
/// neighbor that is translucent and currently strictly dimmer than the
/// offer. The guard doubles as the termination proof: a cell's light
/// only ever increases, so no cell is enqueued twice at the same level.
pub fn spread_light<W: LightWorld>(
    world: &mut W,
    reg: &BlockRegistry,
    wx: i32,
    wy: i32,
    wz: i32,
    value: u8,
    kind: LightKind,
) {
    let value = value.min(MAX_LIGHT);
    world.set_light(wx, wy, wz, kind, value);
    if value == 0 {
        return;
    }
    let mut queue: VecDeque<(i32, i32, i32, u8)> = VecDeque::new();
    queue.push_back((wx, wy, wz, value));
    while let Some((x, y, z, level)) = queue.pop_front() {
        if level <= 1 {
            continue;
        }
        let offer = level - 1;
        for (dx, dy, dz) in NEIGHBORS {
            let (nx, ny, nz) = (x + dx, y + dy, z + dz);
            if !translucent_at(world, reg, nx, ny, nz) {
                continue;
            }
            let cur = world.light_at(nx, ny, nz, kind);
            if cur >= i32::from(offer) {
                continue;
            }
            world.set_light(nx, ny, nz, kind, offer);
            queue.push_back((nx, ny, nz, offer));
        }
    }
}

/// Local, non-recursive light repair after a block is removed or
/// exposed. Opaque cells are forced dark; translucent cells are
/// re-seeded to `max(neighbors) - 1`, never below their current value.
///
/// This is deliberately not a general un-spread: fully dimming every
/// cell lit through a removed source is an open problem here, and the
/// deployed answer is this cheap repair plus a fresh [`spread_light`]
/// from the edited cell.
pub fn refresh_light_at<W: LightWorld>(
    world: &mut W,
    reg: &BlockRegistry,
    wx: i32,
    wy: i32,
    wz: i32,
    kind: LightKind,
) -> u8 {
    let b = world.block_at(wx, wy, wz);
    if b == OUT_OF_BOUNDS {
        return 0;
    }
    if !reg.is_translucent(b as BlockId) {
        world.set_light(wx, wy, wz, kind, 0);
        return 0;
    }
    let mut best: i32 = 0;
    for (dx, dy, dz) in NEIGHBORS {
        let l = world.light_at(wx + dx, wy + dy, wz + dz, kind);
        if l > best {
            best = l;
        }
    }
    let own = world.light_at(wx, wy, wz, kind).max(0);
    let reseed = (best - 1).max(0);
    let v = own.max(reseed) as u8;
    world.set_light(wx, wy, wz, kind, v);
    v
}

/// Recomputes sky light for one vertical column, top-down.
///
/// Cells above the first covering block (non-translucent and not a
/// billboard) get full sky light; cells at and below it go dark. With
/// `spread` set, a newly brightened cell floods outward; with
/// `refresh` set, darkened cells are locally re-seeded so light
/// arriving sideways from neighbor columns survives.
pub fn refresh_sunlight_column<W: LightWorld>(
    world: &mut W,
    reg: &BlockRegistry,
    wx: i32,
    wz: i32,
    sy: usize,
    spread: bool,
    refresh: bool,
) {
    let mut covered = false;
    for y in (0..sy as i32).rev() {
        let b = world.block_at(wx, y, wz);
        if b == OUT_OF_BOUNDS {
            continue;
        }
        let id = b as BlockId;
        if !covered && !reg.is_translucent(id) && !reg.is_billboard(id) {
            covered = true;
        }
        if !covered {
            let cur = world.light_at(wx, y, wz, LightKind::Sky);
            if cur < i32::from(MAX_LIGHT) {
                if spread {
                    spread_light(world, reg, wx, y, wz, MAX_LIGHT, LightKind::Sky);
                } else {
                    world.set_light(wx, y, wz, LightKind::Sky, MAX_LIGHT);
                }
            }
        } else {
            world.set_light(wx, y, wz, LightKind::Sky, 0);
            if refresh {
                refresh_light_at(world, reg, wx, y, wz, LightKind::Sky);
            }
        }
    }
}

/// Full illumination pass over one chunk's world-coordinate extent:
/// every column gets a sunlight refresh and every emissive cell
/// re-floods its block light.
pub fn relight_chunk_extent<W: LightWorld>(
    world: &mut W,
    reg: &BlockRegistry,
    base_x: i32,
    base_z: i32,
    sx: usize,
    sy: usize,
    sz: usize,
) {
    for lz in 0..sz as i32 {
        for lx in 0..sx as i32 {
            refresh_sunlight_column(world, reg, base_x + lx, base_z + lz, sy, true, true);
        }
    }
    for lz in 0..sz as i32 {
        for ly in 0..sy as i32 {
            for lx in 0..sx as i32 {
                let (wx, wy, wz) = (base_x + lx, ly, base_z + lz);
                let b = world.block_at(wx, wy, wz);
                if b == OUT_OF_BOUNDS {
                    continue;
                }
                let em = reg.emission(b as BlockId);
                if em > 0 && world.light_at(wx, wy, wz, LightKind::Block) < i32::from(em) {
                    spread_light(world, reg, wx, wy, wz, em, LightKind::Block);
                }
            }
        }
    }
}
