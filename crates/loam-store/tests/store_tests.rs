use std::sync::Arc;

use loam_blocks::BlockRegistry;
use loam_chunk::{ChunkGenerator, LightKind, MAX_LIGHT, VoxelChunk};
use loam_geom::Vec3;
use loam_store::ChunkStore;
use loam_world::{ChunkCoord, Viewpoint, WorldParams};

fn vp(x: f32, z: f32) -> Viewpoint {
    Viewpoint::at(Vec3::new(x, 0.0, z))
}

fn registry() -> Arc<BlockRegistry> {
    Arc::new(
        BlockRegistry::from_toml_str(
            r#"
            [[blocks]]
            name = "stone"

            [[blocks]]
            name = "torch"
            translucent = true
            casts_shadow = false
            emission = 14
            "#,
        )
        .unwrap(),
    )
}

/// Flat floor at y = 0, open sky above.
struct FloorGen;

impl ChunkGenerator for FloorGen {
    fn generate(&self, chunk: &mut VoxelChunk, reg: &BlockRegistry) {
        let stone = reg.id_by_name("stone").unwrap();
        for z in 0..chunk.sz {
            for x in 0..chunk.sx {
                let i = chunk.idx(x, 0, z);
                chunk.blocks[i] = stone;
            }
        }
        chunk.seed_skylight(reg);
    }
}

fn store_with_dir(view_distance: usize, dir: Option<&std::path::Path>) -> ChunkStore {
    ChunkStore::new(
        WorldParams::new(8, 16, 8, view_distance),
        registry(),
        Arc::new(FloorGen),
        dir.map(|p| p.to_path_buf()),
    )
}

#[test]
fn load_or_create_always_succeeds_and_dedupes() {
    let store = store_with_dir(4, None);
    let a = store.load_or_create(ChunkCoord::new(3, -2));
    let b = store.load_or_create(ChunkCoord::new(3, -2));
    assert!(Arc::ptr_eq(&a, &b));
    assert!(a.read().unwrap().fresh);
    assert_eq!(store.resident_count(), 1);
}

#[test]
fn ensure_generated_runs_the_callback_once() {
    let store = store_with_dir(4, None);
    let h = store.ensure_generated(ChunkCoord::new(0, 0));
    {
        let c = h.read().unwrap();
        assert!(!c.fresh);
        assert!(c.dirty && c.light_dirty);
        assert_ne!(c.get_block(0, 0, 0), 0);
        // Generator seeded sky light top-down over the open column.
        assert_eq!(c.get_light(0, 10, 0, LightKind::Sky), i32::from(MAX_LIGHT));
        assert_eq!(c.get_light(0, 0, 0, LightKind::Sky), 0);
    }
    let before = h.read().unwrap().blocks.clone();
    let h2 = store.ensure_generated(ChunkCoord::new(0, 0));
    assert!(Arc::ptr_eq(&h, &h2));
    assert_eq!(h2.read().unwrap().blocks, before);
}

#[test]
fn eviction_keeps_the_nearest_and_persists_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    // view 1x1 + slack 16 = capacity 17
    let store = store_with_dir(1, Some(dir.path()));
    for cz in 0..5 {
        for cx in 0..5 {
            store.ensure_generated(ChunkCoord::new(cx, cz));
        }
    }
    assert_eq!(store.resident_count(), 25);
    let view = vp(0.0, 0.0); // viewer in chunk (0,0)
    store.evict_excess(Some(&view));
    assert_eq!(store.resident_count(), store.capacity());

    // The survivors are exactly the nearest ones; (0,0) must remain,
    // the far corner must be gone and persisted.
    assert!(store.get(ChunkCoord::new(0, 0)).is_some());
    assert!(store.get(ChunkCoord::new(4, 4)).is_none());
    let saved = loam_io::load_chunk(dir.path(), ChunkCoord::new(4, 4), 8, 16, 8)
        .unwrap()
        .expect("evicted chunk must be persisted");
    assert!(!saved.fresh);
}

#[test]
fn fresh_chunks_are_dropped_without_a_save() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_with_dir(1, Some(dir.path()));
    for i in 0..(store.capacity() as i32 + 3) {
        store.load_or_create(ChunkCoord::new(i, 0)); // all stay fresh
    }
    store.evict_excess(None);
    assert_eq!(store.resident_count(), store.capacity());
    assert_eq!(std::fs::read_dir(dir.path()).map(|d| d.count()).unwrap_or(0), 0);
}

#[test]
fn eviction_saves_before_the_entry_disappears() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(store_with_dir(1, Some(dir.path())));
    let victim = ChunkCoord::new(200, 0);
    store.ensure_generated(victim);
    for i in 0..(store.capacity() as i32 + 4) {
        store.ensure_generated(ChunkCoord::new(i, 0));
    }

    // Watches for the instant the entry leaves the map; the file must
    // already be on disk by then, or a concurrent loader would read a
    // stale image.
    let watcher = {
        let store = Arc::clone(&store);
        let path = dir.path().to_path_buf();
        std::thread::spawn(move || {
            let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
            while store.get(victim).is_some() {
                if std::time::Instant::now() > deadline {
                    return false;
                }
                std::thread::yield_now();
            }
            loam_io::load_chunk(&path, victim, 8, 16, 8)
                .unwrap()
                .is_some()
        })
    };
    store.evict_excess(Some(&vp(0.0, 0.0)));
    assert!(store.get(victim).is_none());
    assert!(
        watcher.join().unwrap(),
        "chunk file must exist by the time the entry is removed"
    );
}

#[test]
fn evicted_chunks_reload_with_their_edits() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_with_dir(1, Some(dir.path()));
    let torch = store.registry().id_by_name("torch").unwrap();
    store.set_block_world(3, 5, 3, torch);
    // Push the edited chunk out of the cache.
    for i in 1..(store.capacity() as i32 + 2) {
        store.ensure_generated(ChunkCoord::new(i + 100, 0));
    }
    store.evict_excess(Some(&vp(900.0 * 8.0, 0.0)));
    assert!(store.get(ChunkCoord::new(0, 0)).is_none());

    let back = store.load_or_create(ChunkCoord::new(0, 0));
    let c = back.read().unwrap();
    assert_eq!(c.get_block(3, 5, 3), i32::from(torch));
    assert_eq!(c.get_light(3, 5, 3, LightKind::Block), 14);
}

#[test]
fn block_edit_repairs_lighting_and_dirties_the_neighbor() {
    let store = store_with_dir(4, None);
    let reg = store.registry().clone();
    let stone = reg.id_by_name("stone").unwrap();
    store.ensure_generated(ChunkCoord::new(0, 0));
    store.ensure_generated(ChunkCoord::new(-1, 0));

    // Clear both dirty flags so the neighbor-marking is observable.
    for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(-1, 0)] {
        let h = store.get(coord).unwrap();
        let mut c = h.write().unwrap();
        c.dirty = false;
        c.light_dirty = false;
    }

    // Roof over the west edge cell: sky below goes dark.
    store.set_block_world(0, 8, 0, stone);
    assert_eq!(store.light_at_world(0, 8, 0, loam_chunk::LightKind::Sky), 0);
    assert!(store.light_at_world(0, 7, 0, loam_chunk::LightKind::Sky) < i32::from(MAX_LIGHT));
    let neighbor = store.get(ChunkCoord::new(-1, 0)).unwrap();
    assert!(neighbor.read().unwrap().dirty);

    // Remove it again: the column relights to full.
    store.set_block_world(0, 8, 0, 0);
    assert_eq!(
        store.light_at_world(0, 7, 0, loam_chunk::LightKind::Sky),
        i32::from(MAX_LIGHT)
    );
}

#[test]
fn torch_placement_floods_block_light() {
    let store = store_with_dir(4, None);
    let torch = store.registry().id_by_name("torch").unwrap();
    store.ensure_generated(ChunkCoord::new(0, 0));
    store.ensure_generated(ChunkCoord::new(1, 0));
    store.set_block_world(7, 5, 4, torch);
    assert_eq!(store.light_at_world(7, 5, 4, LightKind::Block), 14);
    // The flood crosses the seam into the next chunk over.
    assert_eq!(store.light_at_world(8, 5, 4, LightKind::Block), 13);
    assert_eq!(store.light_at_world(10, 5, 4, LightKind::Block), 11);
}
