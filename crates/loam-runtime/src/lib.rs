//! Update scheduling: picks the most urgent chunk work each tick and
//! runs the generate -> light -> mesh pipeline for it on a bounded
//! worker pool, feeding finished meshes to the render-upload queue.
#![forbid(unsafe_code)]

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use hashbrown::HashSet;
use loam_geom::{Aabb, Vec3};
use loam_lighting::relight_chunk_extent;
use loam_mesh::{MeshPayload, VoxelSampler, build_chunk_mesh};
use loam_store::{ChunkStore, StoreLightWorld};
use loam_world::{ChunkCoord, Viewpoint, WorldParams};
use rayon::{ThreadPool, ThreadPoolBuilder};

/// One unit of scheduled work: a chunk to push through the pipeline,
/// optionally re-dirtying its ring afterwards (set when the chunk was
/// never generated, since its appearance changes the neighbor seams).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PendingUpdate {
    pub coord: ChunkCoord,
    pub update_neighbors: bool,
}

/// [`VoxelSampler`] over the store for cross-chunk mesh reads. Each
/// probe takes one short-lived chunk lock.
pub struct StoreSampler<'a> {
    pub store: &'a ChunkStore,
}

impl VoxelSampler for StoreSampler<'_> {
    fn block_at(&self, wx: i32, wy: i32, wz: i32) -> i32 {
        self.store.block_at_world(wx, wy, wz)
    }
    fn light_at(&self, wx: i32, wy: i32, wz: i32) -> i32 {
        self.store
            .light_at_world(wx, wy, wz, loam_chunk::LightKind::Sky)
            .max(self.store.light_at_world(wx, wy, wz, loam_chunk::LightKind::Block))
    }
}

#[inline]
fn chunk_aabb(p: &WorldParams, coord: ChunkCoord) -> Aabb {
    let base_x = coord.cx * p.sx as i32;
    let base_z = coord.cz * p.sz as i32;
    Aabb::new(
        Vec3::new(base_x as f32, 0.0, base_z as f32),
        Vec3::new(
            base_x as f32 + p.sx as f32,
            p.sy as f32,
            base_z as f32 + p.sz as f32,
        ),
    )
}

/// Scans the view rectangle for chunks needing work, nearest first.
/// Unresident and fresh chunks always qualify; resident ones qualify
/// when a dirty flag is set. A frustum, when present, filters the set;
/// without one every rectangle chunk is considered.
pub fn collect_candidates(store: &ChunkStore, view: &Viewpoint) -> Vec<PendingUpdate> {
    let p = store.params();
    let center = p.chunk_at(view.position.x.floor() as i32, view.position.z.floor() as i32);
    let (vx, vz) = (p.view_distance_x as i32, p.view_distance_z as i32);
    let mut out = Vec::new();
    for dz in -vz..=vz {
        for dx in -vx..=vx {
            let coord = center.offset(dx, dz);
            if let Some(f) = &view.frustum {
                if !f.intersects_aabb(chunk_aabb(&p, coord)) {
                    continue;
                }
            }
            let pending = match store.get(coord) {
                None => Some(true),
                Some(handle) => {
                    let c = handle.read().unwrap();
                    if c.fresh {
                        Some(true)
                    } else if c.dirty || c.light_dirty {
                        Some(false)
                    } else {
                        None
                    }
                }
            };
            if let Some(update_neighbors) = pending {
                out.push(PendingUpdate {
                    coord,
                    update_neighbors,
                });
            }
        }
    }
    out.sort_by_key(|u| (u.coord.distance_sq(center), u.coord.cx, u.coord.cz));
    out
}

/// Runs the full pipeline for one chunk: generate it and its ring,
/// relight if flagged, remesh if flagged, push the mesh to `uploads`.
/// Flags are cleared before the computation they gate, so an edit
/// landing mid-flight re-marks the chunk for a later tick.
pub fn process_update(
    store: &ChunkStore,
    coord: ChunkCoord,
    update_neighbors: bool,
    uploads: &Sender<MeshPayload>,
) {
    let handle = store.ensure_generated(coord);
    // Lighting correctness needs the ring resident and generated, not
    // necessarily clean.
    for n in coord.ring() {
        store.ensure_generated(n);
    }

    let p = store.params();
    let needs_light = {
        let mut chunk = handle.write().unwrap();
        let flagged = chunk.light_dirty;
        chunk.light_dirty = false;
        flagged
    };
    if needs_light {
        let reg = Arc::clone(store.registry());
        let mut lw = StoreLightWorld { store };
        relight_chunk_extent(
            &mut lw,
            &reg,
            coord.cx * p.sx as i32,
            coord.cz * p.sz as i32,
            p.sx,
            p.sy,
            p.sz,
        );
    }

    // Mesh from a snapshot so no lock is held while sampling neighbors.
    let snapshot = {
        let mut chunk = handle.write().unwrap();
        if chunk.dirty {
            chunk.dirty = false;
            Some(chunk.clone())
        } else {
            None
        }
    };
    if let Some(snap) = snapshot {
        let sampler = StoreSampler { store };
        let mesh = build_chunk_mesh(&snap, &sampler, store.registry());
        let _ = uploads.send(mesh);
    }

    if update_neighbors {
        for n in coord.ring() {
            if let Some(h) = store.get(n) {
                let mut chunk = h.write().unwrap();
                if !chunk.fresh {
                    chunk.dirty = true;
                }
            }
        }
    }
}

/// Per-tick accounting, for the driver's log line.
#[derive(Clone, Copy, Debug, Default)]
pub struct TickStats {
    pub dispatched: usize,
    pub completed: usize,
    pub in_flight: usize,
    pub resident: usize,
}

/// Owns the worker pool and the in-flight set. `tick` runs on one
/// driver thread; workers only ever touch the store and the channels,
/// so membership checks here race with nothing.
pub struct UpdateScheduler {
    store: Arc<ChunkStore>,
    job_tx: Sender<PendingUpdate>,
    done_rx: Receiver<ChunkCoord>,
    in_flight: HashSet<ChunkCoord>,
    pub workers: usize,
    _pool: ThreadPool,
}

impl UpdateScheduler {
    /// Worker count is half the machine, floored at one, leaving
    /// headroom for the render side of the process.
    pub fn new(store: Arc<ChunkStore>, uploads: Sender<MeshPayload>) -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2)
            / 2;
        let workers = workers.max(1);
        let (job_tx, job_rx) = unbounded::<PendingUpdate>();
        let (done_tx, done_rx) = unbounded::<ChunkCoord>();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("loam-chunk-{i}"))
            .build()
            .expect("chunk worker pool");
        for _ in 0..workers {
            let rx = job_rx.clone();
            let done = done_tx.clone();
            let store = Arc::clone(&store);
            let uploads = uploads.clone();
            pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    process_update(&store, job.coord, job.update_neighbors, &uploads);
                    let _ = done.send(job.coord);
                }
            });
        }
        Self {
            store,
            job_tx,
            done_rx,
            in_flight: HashSet::new(),
            workers,
            _pool: pool,
        }
    }

    /// One driver pass: retire finished work, enforce the cache
    /// capacity, then hand the nearest pending chunks to free workers.
    pub fn tick(&mut self, view: &Viewpoint) -> TickStats {
        let mut completed = 0;
        for coord in self.done_rx.try_iter() {
            let was_tracked = self.in_flight.remove(&coord);
            debug_assert!(was_tracked, "completion for undispatched chunk");
            completed += 1;
        }

        self.store.evict_excess(Some(view));

        let mut dispatched = 0;
        for job in collect_candidates(&self.store, view) {
            if self.in_flight.len() >= self.workers {
                break;
            }
            if self.in_flight.contains(&job.coord) {
                continue;
            }
            self.in_flight.insert(job.coord);
            if self.job_tx.send(job).is_err() {
                self.in_flight.remove(&job.coord);
                break;
            }
            log::trace!(
                "dispatch chunk ({},{}) neighbors={}",
                job.coord.cx,
                job.coord.cz,
                job.update_neighbors
            );
            dispatched += 1;
        }

        TickStats {
            dispatched,
            completed,
            in_flight: self.in_flight.len(),
            resident: self.store.resident_count(),
        }
    }

    /// True when no worker holds a chunk.
    pub fn idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn store(&self) -> &Arc<ChunkStore> {
        &self.store
    }
}
