//! Headless soak driver: walks a viewpoint across noise terrain and
//! runs the chunk pipeline under it, logging throughput. Stands in for
//! the renderer-facing host process.

mod worldgen;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::unbounded;
use loam_blocks::BlockRegistry;
use loam_geom::Vec3;
use loam_mesh::MeshPayload;
use loam_runtime::UpdateScheduler;
use loam_store::ChunkStore;
use loam_world::{Viewpoint, WorldParams};

use crate::worldgen::NoiseGen;

const DEFAULT_BLOCKS: &str = include_str!("../assets/blocks.toml");

#[derive(Parser, Debug)]
#[command(name = "loam", about = "chunk pipeline soak driver")]
struct Args {
    /// Terrain seed.
    #[arg(long, default_value_t = 1337)]
    seed: i32,
    /// Horizontal view distance, in chunks per axis.
    #[arg(long, default_value_t = 8)]
    view_distance: usize,
    /// Driver ticks before shutdown.
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Viewer speed in blocks per tick.
    #[arg(long, default_value_t = 0.5)]
    walk_speed: f32,
    /// Persist chunks here; omitted means in-memory only.
    #[arg(long)]
    save_dir: Option<PathBuf>,
    /// Block definitions; defaults to the built-in set.
    #[arg(long)]
    blocks: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let blocks_text = match &args.blocks {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                log::error!("cannot read {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => DEFAULT_BLOCKS.to_string(),
    };
    let registry = match BlockRegistry::from_toml_str(&blocks_text) {
        Ok(reg) => Arc::new(reg),
        Err(e) => {
            log::error!("bad block config: {e}");
            std::process::exit(1);
        }
    };
    let torch = registry.id_by_name("torch");

    let store = Arc::new(ChunkStore::new(
        WorldParams::new(16, 128, 16, args.view_distance),
        registry,
        Arc::new(NoiseGen::new(args.seed)),
        args.save_dir.clone(),
    ));
    let (upload_tx, upload_rx) = unbounded::<MeshPayload>();
    let mut sched = UpdateScheduler::new(Arc::clone(&store), upload_tx);
    log::info!(
        "starting: workers={} capacity={} view_distance={}",
        sched.workers,
        store.capacity(),
        args.view_distance
    );

    let mut uploaded = 0usize;
    let mut triangles = 0usize;
    for tick in 0..args.ticks {
        let t = tick as f32 * args.walk_speed;
        let view = Viewpoint::at(Vec3::new(t, 80.0, (t * 0.011).sin() * 96.0));
        let stats = sched.tick(&view);
        for mesh in upload_rx.try_iter() {
            uploaded += 1;
            triangles +=
                (mesh.opaque.idx.len() + mesh.translucent.idx.len() + mesh.billboard.idx.len()) / 3;
        }

        // Sprinkle edits along the walk to exercise the repair path.
        if let Some(torch) = torch {
            if tick % 97 == 96 {
                store.set_block_world(view.position.x as i32, 70, view.position.z as i32, torch);
            }
        }

        if tick % 60 == 0 {
            log::info!(
                "tick {tick}: resident={} in_flight={} dispatched={} uploaded={uploaded} tris={triangles}",
                stats.resident,
                stats.in_flight,
                stats.dispatched
            );
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    store.persist_all();
    log::info!("done: {uploaded} meshes, {triangles} triangles");
}
