use std::collections::VecDeque;

use loam_blocks::BlockRegistry;
use loam_chunk::{LightKind, VoxelChunk};
use loam_lighting::{LightWorld, spread_light};
use loam_world::ChunkCoord;
use proptest::prelude::*;

struct Grid {
    chunk: VoxelChunk,
}

impl LightWorld for Grid {
    fn block_at(&self, wx: i32, wy: i32, wz: i32) -> i32 {
        self.chunk.get_block(wx, wy, wz)
    }
    fn light_at(&self, wx: i32, wy: i32, wz: i32, kind: LightKind) -> i32 {
        self.chunk.get_light(wx, wy, wz, kind)
    }
    fn set_light(&mut self, wx: i32, wy: i32, wz: i32, kind: LightKind, value: u8) {
        self.chunk.set_light(wx, wy, wz, kind, value);
    }
}

fn registry() -> BlockRegistry {
    BlockRegistry::from_toml_str(
        r#"
        [[blocks]]
        name = "stone"
        "#,
    )
    .unwrap()
}

/// Graph distance from the source through translucent cells only.
fn flood_distances(grid: &Grid, sx: usize, sy: usize, sz: usize, src: (i32, i32, i32)) -> Vec<i32> {
    let idx = |x: i32, y: i32, z: i32| ((y as usize * sz + z as usize) * sx + x as usize);
    let mut dist = vec![i32::MAX; sx * sy * sz];
    let mut q = VecDeque::new();
    dist[idx(src.0, src.1, src.2)] = 0;
    q.push_back(src);
    while let Some((x, y, z)) = q.pop_front() {
        let d = dist[idx(x, y, z)];
        for (dx, dy, dz) in [(1, 0, 0), (-1, 0, 0), (0, 1, 0), (0, -1, 0), (0, 0, 1), (0, 0, -1)] {
            let (nx, ny, nz) = (x + dx, y + dy, z + dz);
            if grid.block_at(nx, ny, nz) != 0 {
                continue; // opaque or out of bounds
            }
            let i = idx(nx, ny, nz);
            if dist[i] > d + 1 {
                dist[i] = d + 1;
                q.push_back((nx, ny, nz));
            }
        }
    }
    dist
}

proptest! {
    // After spreading V from a translucent source, every translucent
    // cell at flood distance d <= V carries at least V - d.
    #[test]
    fn light_floor_along_shortest_paths(
        dims in (2usize..=6, 2usize..=6, 2usize..=6),
        walls in proptest::collection::vec(any::<bool>(), 216),
        value in 1u8..=15,
        seed in any::<u64>(),
    ) {
        let (sx, sy, sz) = dims;
        let reg = registry();
        let stone = reg.id_by_name("stone").unwrap();
        let mut chunk = VoxelChunk::new(ChunkCoord::new(0, 0), sx, sy, sz);
        chunk.finish_generation();
        for y in 0..sy { for z in 0..sz { for x in 0..sx {
            if walls[((y * sz + z) * sx + x) % walls.len()] {
                let i = chunk.idx(x, y, z);
                chunk.blocks[i] = stone;
            }
        }}}
        // Pick a translucent source cell deterministically from the seed.
        let sxi = (seed as usize) % sx;
        let syi = ((seed >> 8) as usize) % sy;
        let szi = ((seed >> 16) as usize) % sz;
        let i = chunk.idx(sxi, syi, szi);
        chunk.blocks[i] = 0;

        let mut grid = Grid { chunk };
        let src = (sxi as i32, syi as i32, szi as i32);
        spread_light(&mut grid, &reg, src.0, src.1, src.2, value, LightKind::Block);

        let dist = flood_distances(&grid, sx, sy, sz, src);
        for y in 0..sy as i32 { for z in 0..sz as i32 { for x in 0..sx as i32 {
            let d = dist[((y as usize * sz + z as usize) * sx + x as usize)];
            if d == i32::MAX || d > i32::from(value) {
                continue;
            }
            let floor = i32::from(value) - d;
            prop_assert!(
                grid.light_at(x, y, z, LightKind::Block) >= floor,
                "cell ({},{},{}) at distance {} below floor {}",
                x, y, z, d, floor
            );
        }}}
    }
}
