//! Resident chunk cache: coordinate-keyed ownership, on-demand
//! creation, distance-based eviction, and the world-coordinate edit
//! entry point that closes the edit -> relight -> remesh loop.
#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use hashbrown::HashMap;
use loam_blocks::{BlockId, BlockRegistry, OUT_OF_BOUNDS};
use loam_chunk::{ChunkGenerator, LightKind, TouchedFaces, VoxelChunk};
use loam_lighting::{LightWorld, refresh_light_at, refresh_sunlight_column, spread_light};
use loam_world::{ChunkCoord, Viewpoint, WorldParams};

pub type ChunkHandle = Arc<RwLock<VoxelChunk>>;

/// Single owner of all resident chunks. Chunks never hold references
/// to each other; every neighbor access is a coordinate lookup here,
/// which keeps the chunk graph acyclic and the locking one-chunk-deep.
pub struct ChunkStore {
    params: RwLock<WorldParams>,
    registry: Arc<BlockRegistry>,
    generator: Arc<dyn ChunkGenerator>,
    save_dir: Option<PathBuf>,
    chunks: Mutex<HashMap<ChunkCoord, ChunkHandle>>,
}

impl ChunkStore {
    pub fn new(
        params: WorldParams,
        registry: Arc<BlockRegistry>,
        generator: Arc<dyn ChunkGenerator>,
        save_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            params: RwLock::new(params),
            registry,
            generator,
            save_dir,
            chunks: Mutex::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn params(&self) -> WorldParams {
        *self.params.read().unwrap()
    }

    pub fn set_view_distance(&self, vx: usize, vz: usize) {
        let mut p = self.params.write().unwrap();
        p.view_distance_x = vx;
        p.view_distance_z = vz;
    }

    #[inline]
    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<ChunkHandle> {
        self.chunks.lock().unwrap().get(&coord).cloned()
    }

    pub fn resident_count(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }

    pub fn resident_coords(&self) -> Vec<ChunkCoord> {
        self.chunks.lock().unwrap().keys().copied().collect()
    }

    /// Returns the resident chunk, or a persisted one loaded back, or
    /// a brand-new fresh chunk. Never fails for valid coordinates;
    /// callers rely on that as a structural guarantee.
    pub fn load_or_create(&self, coord: ChunkCoord) -> ChunkHandle {
        if let Some(existing) = self.get(coord) {
            return existing;
        }
        let p = self.params();
        // Disk probe happens outside the map lock; a racing creator is
        // resolved by the entry re-check below.
        let loaded = self.save_dir.as_ref().and_then(|dir| {
            match loam_io::load_chunk(dir, coord, p.sx, p.sy, p.sz) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("load of chunk ({},{}) failed: {e}; regenerating", coord.cx, coord.cz);
                    None
                }
            }
        });
        let candidate = Arc::new(RwLock::new(
            loaded.unwrap_or_else(|| VoxelChunk::new(coord, p.sx, p.sy, p.sz)),
        ));
        let mut map = self.chunks.lock().unwrap();
        map.entry(coord).or_insert(candidate).clone()
    }

    /// [`load_or_create`](Self::load_or_create) plus terrain fill: if
    /// the chunk is still fresh, the generation callback runs under
    /// the chunk's write lock (re-checked there, so two racing callers
    /// generate once).
    pub fn ensure_generated(&self, coord: ChunkCoord) -> ChunkHandle {
        let handle = self.load_or_create(coord);
        if handle.read().unwrap().fresh {
            let mut chunk = handle.write().unwrap();
            if chunk.fresh {
                self.generator.generate(&mut chunk, &self.registry);
                chunk.finish_generation();
            }
        }
        handle
    }

    /// Current capacity; derived from the live view distance on every
    /// call so a runtime change takes effect immediately.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.params().cache_capacity()
    }

    /// Removes and persists the farthest chunks until at or under
    /// capacity. Fresh chunks carry nothing meaningful and are dropped
    /// without a save; save failures are logged and the eviction
    /// proceeds (worst case that chunk regenerates later).
    pub fn evict_excess(&self, view: Option<&Viewpoint>) {
        let capacity = self.capacity();
        let p = self.params();
        let victims: Vec<ChunkCoord> = {
            let map = self.chunks.lock().unwrap();
            if map.len() <= capacity {
                return;
            }
            let mut order: Vec<ChunkCoord> = map.keys().copied().collect();
            match view {
                Some(v) => {
                    let center = p.chunk_at(v.position.x.floor() as i32, v.position.z.floor() as i32);
                    order.sort_by_key(|c| {
                        (std::cmp::Reverse(c.distance_sq(center)), loam_io::chunk_file_id(*c))
                    });
                }
                // No viewpoint yet: stable fallback by numeric file id.
                None => order.sort_by_key(|c| std::cmp::Reverse(loam_io::chunk_file_id(*c))),
            }
            let excess = map.len() - capacity;
            order.truncate(excess);
            order
        };
        for coord in victims {
            let Some(handle) = self.get(coord) else { continue };
            // Save before unmapping: once the entry is gone, a racing
            // load_or_create must find the newest bytes on disk, not a
            // stale file from an earlier eviction.
            {
                let chunk = handle.read().unwrap();
                if !chunk.fresh {
                    if let Some(dir) = &self.save_dir {
                        if let Err(e) = loam_io::save_chunk(dir, &chunk) {
                            log::warn!(
                                "evicting chunk ({},{}): save failed: {e}",
                                coord.cx,
                                coord.cz
                            );
                        }
                    }
                }
            }
            self.chunks.lock().unwrap().remove(&coord);
        }
    }

    /// Persists every resident, non-fresh chunk (shutdown path).
    pub fn persist_all(&self) {
        let Some(dir) = &self.save_dir else { return };
        for coord in self.resident_coords() {
            let Some(handle) = self.get(coord) else { continue };
            let chunk = handle.read().unwrap();
            if chunk.fresh {
                continue;
            }
            if let Err(e) = loam_io::save_chunk(dir, &chunk) {
                log::warn!("persist of chunk ({},{}) failed: {e}", coord.cx, coord.cz);
            }
        }
    }

    fn mark_neighbors_dirty(&self, coord: ChunkCoord, touched: TouchedFaces) {
        for (dx, dz) in touched.offsets() {
            if let Some(handle) = self.get(coord.offset(dx, dz)) {
                let mut chunk = handle.write().unwrap();
                if !chunk.fresh {
                    chunk.dirty = true;
                }
            }
        }
    }

    /// Gameplay edit entry point. Writes the block, dirties the chunk
    /// and the face-touching neighbor, then runs the local lighting
    /// repair: sunlight column rewalk, per-cell re-seed, and a fresh
    /// outward spread from the edited cell (plus the emitter flood for
    /// emissive placements).
    pub fn set_block_world(&self, wx: i32, wy: i32, wz: i32, id: BlockId) {
        let p = self.params();
        let Some((coord, lx, ly, lz)) = p.split_world(wx, wy, wz) else {
            return;
        };
        let handle = self.ensure_generated(coord);
        let touched = {
            let mut chunk = handle.write().unwrap();
            chunk.set_block(lx as i32, ly as i32, lz as i32, id, &self.registry)
        };
        self.mark_neighbors_dirty(coord, touched);

        let reg = Arc::clone(&self.registry);
        let mut view = StoreLightWorld { store: self };
        refresh_sunlight_column(&mut view, &reg, wx, wz, p.sy, true, true);
        let sky = refresh_light_at(&mut view, &reg, wx, wy, wz, LightKind::Sky);
        let blk = refresh_light_at(&mut view, &reg, wx, wy, wz, LightKind::Block);
        let em = reg.emission(id);
        if reg.is_translucent(id) {
            if sky > 0 {
                spread_light(&mut view, &reg, wx, wy, wz, sky, LightKind::Sky);
            }
            if blk > 0 {
                spread_light(&mut view, &reg, wx, wy, wz, blk, LightKind::Block);
            }
        }
        if em > blk {
            spread_light(&mut view, &reg, wx, wy, wz, em, LightKind::Block);
        }
    }

    /// World-coordinate block probe. Fresh or unresident chunks yield
    /// the sentinel, which is exactly the contract light propagation
    /// needs to stay out of them.
    pub fn block_at_world(&self, wx: i32, wy: i32, wz: i32) -> i32 {
        let p = self.params();
        let Some((coord, lx, ly, lz)) = p.split_world(wx, wy, wz) else {
            return OUT_OF_BOUNDS;
        };
        let Some(handle) = self.get(coord) else {
            return OUT_OF_BOUNDS;
        };
        let chunk = handle.read().unwrap();
        if chunk.fresh {
            return OUT_OF_BOUNDS;
        }
        chunk.get_block(lx as i32, ly as i32, lz as i32)
    }

    pub fn light_at_world(&self, wx: i32, wy: i32, wz: i32, kind: LightKind) -> i32 {
        let p = self.params();
        let Some((coord, lx, ly, lz)) = p.split_world(wx, wy, wz) else {
            return OUT_OF_BOUNDS;
        };
        let Some(handle) = self.get(coord) else {
            return OUT_OF_BOUNDS;
        };
        let chunk = handle.read().unwrap();
        if chunk.fresh {
            return OUT_OF_BOUNDS;
        }
        chunk.get_light(lx as i32, ly as i32, lz as i32, kind)
    }

    /// World-coordinate light write. Crossing a chunk face dirties the
    /// neighbor on the other side so its mesh picks up the new shade.
    pub fn set_light_world(&self, wx: i32, wy: i32, wz: i32, kind: LightKind, value: u8) {
        let p = self.params();
        let Some((coord, lx, ly, lz)) = p.split_world(wx, wy, wz) else {
            return;
        };
        let Some(handle) = self.get(coord) else {
            return;
        };
        let touched = {
            let mut chunk = handle.write().unwrap();
            chunk.set_light(lx as i32, ly as i32, lz as i32, kind, value)
        };
        self.mark_neighbors_dirty(coord, touched);
    }
}

/// [`LightWorld`] over the store. Each call takes at most one chunk
/// lock and releases it before returning, so cross-chunk floods can
/// never deadlock against each other.
pub struct StoreLightWorld<'a> {
    pub store: &'a ChunkStore,
}

impl LightWorld for StoreLightWorld<'_> {
    fn block_at(&self, wx: i32, wy: i32, wz: i32) -> i32 {
        self.store.block_at_world(wx, wy, wz)
    }
    fn light_at(&self, wx: i32, wy: i32, wz: i32, kind: LightKind) -> i32 {
        self.store.light_at_world(wx, wy, wz, kind)
    }
    fn set_light(&mut self, wx: i32, wy: i32, wz: i32, kind: LightKind, value: u8) {
        self.store.set_light_world(wx, wy, wz, kind, value);
    }
}
