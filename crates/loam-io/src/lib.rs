//! Per-chunk persistence files.
//!
//! One file per chunk under a save directory, named by a bijective
//! pairing of (cx, cz) into a single integer. A missing file means
//! "not yet generated" and is not an error.
#![forbid(unsafe_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use loam_chunk::{VoxelChunk, deserialize_chunk, serialize_chunk};
use loam_world::ChunkCoord;

#[inline]
fn zigzag(v: i32) -> u64 {
    ((v << 1) ^ (v >> 31)) as u32 as u64
}

/// Bijective (cx, cz) -> u64 used as the persisted filename key.
/// Zigzag folds the sign, Szudzik pairs the two halves.
#[inline]
pub fn chunk_file_id(coord: ChunkCoord) -> u64 {
    let a = zigzag(coord.cx);
    let b = zigzag(coord.cz);
    if a >= b { a * a + a + b } else { b * b + a }
}

pub fn chunk_path(dir: &Path, coord: ChunkCoord) -> PathBuf {
    dir.join(format!("{}.chunk", chunk_file_id(coord)))
}

/// Writes the chunk's byte image, creating the directory on demand.
pub fn save_chunk(dir: &Path, chunk: &VoxelChunk) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let path = chunk_path(dir, chunk.coord);
    fs::write(&path, serialize_chunk(chunk))?;
    log::debug!(
        "saved chunk ({},{}) to {}",
        chunk.coord.cx,
        chunk.coord.cz,
        path.display()
    );
    Ok(())
}

/// Reads a persisted chunk back. `Ok(None)` when no file exists or the
/// stored image does not match the expected dimensions (stale saves
/// from a different world sizing are treated as not-yet-generated).
pub fn load_chunk(
    dir: &Path,
    coord: ChunkCoord,
    sx: usize,
    sy: usize,
    sz: usize,
) -> io::Result<Option<VoxelChunk>> {
    let path = chunk_path(dir, coord);
    let bytes = match fs::read(&path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    match deserialize_chunk(coord, sx, sy, sz, &bytes) {
        Some(chunk) => Ok(Some(chunk)),
        None => {
            log::warn!(
                "chunk file {} has unexpected length {}; regenerating",
                path.display(),
                bytes.len()
            );
            Ok(None)
        }
    }
}
