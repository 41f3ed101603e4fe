//! Demo terrain for the soak driver: rolling noise hills with a water
//! table, beaches, scattered ferns, and the odd torch.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use loam_blocks::{AIR, BlockId, BlockRegistry};
use loam_chunk::{ChunkGenerator, VoxelChunk};

const SEA_LEVEL: i32 = 36;

pub struct NoiseGen {
    terrain: FastNoiseLite,
    detail: FastNoiseLite,
}

impl NoiseGen {
    pub fn new(seed: i32) -> Self {
        let mut terrain = FastNoiseLite::with_seed(seed);
        terrain.set_noise_type(Some(NoiseType::OpenSimplex2));
        terrain.set_frequency(Some(0.008));
        let mut detail = FastNoiseLite::with_seed(seed ^ 99_173);
        detail.set_noise_type(Some(NoiseType::OpenSimplex2));
        detail.set_frequency(Some(0.11));
        Self { terrain, detail }
    }
}

struct Palette {
    stone: BlockId,
    dirt: BlockId,
    grass: BlockId,
    sand: BlockId,
    water: BlockId,
    fern: BlockId,
    torch: BlockId,
}

impl Palette {
    fn resolve(reg: &BlockRegistry) -> Self {
        let id = |name: &str| reg.id_by_name(name).unwrap_or(AIR);
        Self {
            stone: id("stone"),
            dirt: id("dirt"),
            grass: id("grass"),
            sand: id("sand"),
            water: id("water"),
            fern: id("fern"),
            torch: id("torch"),
        }
    }
}

impl ChunkGenerator for NoiseGen {
    fn generate(&self, chunk: &mut VoxelChunk, reg: &BlockRegistry) {
        let p = Palette::resolve(reg);
        let base_x = chunk.coord.cx * chunk.sx as i32;
        let base_z = chunk.coord.cz * chunk.sz as i32;
        for z in 0..chunk.sz {
            for x in 0..chunk.sx {
                let (wx, wz) = (base_x + x as i32, base_z + z as i32);
                let h = (self.terrain.get_noise_2d(wx as f32, wz as f32) + 1.0) * 0.5;
                let height = (16.0 + h * 64.0) as i32;
                let height = height.clamp(1, chunk.sy as i32 - 2);
                let d = self.detail.get_noise_2d(wx as f32, wz as f32);
                let beach = height <= SEA_LEVEL + 1;

                for y in 0..height {
                    let i = chunk.idx(x, y as usize, z);
                    chunk.blocks[i] = if y < height - 3 { p.stone } else { p.dirt };
                }
                let top = chunk.idx(x, height as usize, z);
                chunk.blocks[top] = if beach { p.sand } else { p.grass };
                for y in (height + 1)..=SEA_LEVEL {
                    let i = chunk.idx(x, y as usize, z);
                    chunk.blocks[i] = p.water;
                }
                if height > SEA_LEVEL + 1 && (height as usize) + 1 < chunk.sy {
                    let above = chunk.idx(x, height as usize + 1, z);
                    if d > 0.55 {
                        chunk.blocks[above] = p.fern;
                    } else if d < -0.92 {
                        chunk.blocks[above] = p.torch;
                    }
                }
            }
        }
        chunk.seed_skylight(reg);
    }
}
