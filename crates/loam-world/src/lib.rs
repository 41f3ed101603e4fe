//! World-level coordinates, sizing parameters, and viewpoint types.
#![forbid(unsafe_code)]

mod chunk_coord;
mod view;

pub use chunk_coord::ChunkCoord;
pub use view::{Frustum, Viewpoint};

/// Fixed world sizing shared by every chunk. Chunks are 2D-indexed
/// columns: (cx, cz) with a fixed vertical extent of `sy` cells.
#[derive(Clone, Copy, Debug)]
pub struct WorldParams {
    pub sx: usize,
    pub sy: usize,
    pub sz: usize,
    /// Horizontal view distance in chunks, per axis.
    pub view_distance_x: usize,
    pub view_distance_z: usize,
}

/// Extra residency beyond the view-derived capacity, so chunks just
/// outside the view ring are not thrashed on small camera moves.
pub const CACHE_SLACK: usize = 16;

impl WorldParams {
    pub fn new(sx: usize, sy: usize, sz: usize, view_distance: usize) -> Self {
        Self {
            sx,
            sy,
            sz,
            view_distance_x: view_distance,
            view_distance_z: view_distance,
        }
    }

    /// Cache capacity. Recomputed at every call site on purpose so a
    /// runtime view-distance change takes effect immediately.
    #[inline]
    pub fn cache_capacity(&self) -> usize {
        self.view_distance_x * self.view_distance_z + CACHE_SLACK
    }

    /// Chunk coordinate containing the given world cell.
    #[inline]
    pub fn chunk_at(&self, wx: i32, wz: i32) -> ChunkCoord {
        ChunkCoord::new(
            wx.div_euclid(self.sx as i32),
            wz.div_euclid(self.sz as i32),
        )
    }

    /// Splits a world position into (chunk, local) coordinates.
    /// Returns `None` when `wy` falls outside the vertical extent.
    #[inline]
    pub fn split_world(&self, wx: i32, wy: i32, wz: i32) -> Option<(ChunkCoord, usize, usize, usize)> {
        if wy < 0 || wy >= self.sy as i32 {
            return None;
        }
        let coord = self.chunk_at(wx, wz);
        let lx = wx.rem_euclid(self.sx as i32) as usize;
        let lz = wz.rem_euclid(self.sz as i32) as usize;
        Some((coord, lx, wy as usize, lz))
    }
}

impl Default for WorldParams {
    fn default() -> Self {
        Self::new(16, 128, 16, 8)
    }
}
