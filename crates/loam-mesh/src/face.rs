use loam_geom::Vec3;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    PosY = 0,
    NegY = 1,
    PosX = 2,
    NegX = 3,
    PosZ = 4,
    NegZ = 5,
}

pub const ALL_FACES: [Face; 6] = [
    Face::PosY,
    Face::NegY,
    Face::PosX,
    Face::NegX,
    Face::PosZ,
    Face::NegZ,
];

impl Face {
    /// Returns the `[0..6)` index of this face, which is also the slot
    /// in a block type's per-face texture table.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the unit-normal vector for this face.
    #[inline]
    pub fn normal(self) -> Vec3 {
        match self {
            Face::PosY => Vec3::new(0.0, 1.0, 0.0),
            Face::NegY => Vec3::new(0.0, -1.0, 0.0),
            Face::PosX => Vec3::new(1.0, 0.0, 0.0),
            Face::NegX => Vec3::new(-1.0, 0.0, 0.0),
            Face::PosZ => Vec3::new(0.0, 0.0, 1.0),
            Face::NegZ => Vec3::new(0.0, 0.0, -1.0),
        }
    }

    /// Returns the integer grid delta `(dx,dy,dz)` when stepping out of this face.
    #[inline]
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Face::PosY => (0, 1, 0),
            Face::NegY => (0, -1, 0),
            Face::PosX => (1, 0, 0),
            Face::NegX => (-1, 0, 0),
            Face::PosZ => (0, 0, 1),
            Face::NegZ => (0, 0, -1),
        }
    }

    /// Faces whose texture is rotated a quarter turn so the atlas seam
    /// lines up with the neighboring orientations.
    #[inline]
    pub fn rotates_uv(self) -> bool {
        matches!(self, Face::PosZ | Face::NegX)
    }

    /// The four cells edge-adjacent to the cell this face points into,
    /// lying in the plane of the face. These are the occlusion samples.
    #[inline]
    pub fn occlusion_deltas(self) -> [(i32, i32, i32); 4] {
        match self {
            Face::PosY => [(1, 1, 0), (-1, 1, 0), (0, 1, 1), (0, 1, -1)],
            Face::NegY => [(1, -1, 0), (-1, -1, 0), (0, -1, 1), (0, -1, -1)],
            Face::PosX => [(1, 1, 0), (1, -1, 0), (1, 0, 1), (1, 0, -1)],
            Face::NegX => [(-1, 1, 0), (-1, -1, 0), (-1, 0, 1), (-1, 0, -1)],
            Face::PosZ => [(1, 0, 1), (-1, 0, 1), (0, 1, 1), (0, -1, 1)],
            Face::NegZ => [(1, 0, -1), (-1, 0, -1), (0, 1, -1), (0, -1, -1)],
        }
    }

    /// Corner positions of the unit face at `origin`, wound so the
    /// quad's cross product agrees with [`normal`](Self::normal).
    pub fn corners(self, origin: Vec3) -> [Vec3; 4] {
        let o = origin;
        match self {
            Face::PosY => [
                Vec3::new(o.x, o.y + 1.0, o.z),
                Vec3::new(o.x, o.y + 1.0, o.z + 1.0),
                Vec3::new(o.x + 1.0, o.y + 1.0, o.z + 1.0),
                Vec3::new(o.x + 1.0, o.y + 1.0, o.z),
            ],
            Face::NegY => [
                Vec3::new(o.x, o.y, o.z),
                Vec3::new(o.x + 1.0, o.y, o.z),
                Vec3::new(o.x + 1.0, o.y, o.z + 1.0),
                Vec3::new(o.x, o.y, o.z + 1.0),
            ],
            Face::PosX => [
                Vec3::new(o.x + 1.0, o.y, o.z),
                Vec3::new(o.x + 1.0, o.y + 1.0, o.z),
                Vec3::new(o.x + 1.0, o.y + 1.0, o.z + 1.0),
                Vec3::new(o.x + 1.0, o.y, o.z + 1.0),
            ],
            Face::NegX => [
                Vec3::new(o.x, o.y, o.z + 1.0),
                Vec3::new(o.x, o.y + 1.0, o.z + 1.0),
                Vec3::new(o.x, o.y + 1.0, o.z),
                Vec3::new(o.x, o.y, o.z),
            ],
            Face::PosZ => [
                Vec3::new(o.x + 1.0, o.y, o.z + 1.0),
                Vec3::new(o.x + 1.0, o.y + 1.0, o.z + 1.0),
                Vec3::new(o.x, o.y + 1.0, o.z + 1.0),
                Vec3::new(o.x, o.y, o.z + 1.0),
            ],
            Face::NegZ => [
                Vec3::new(o.x, o.y, o.z),
                Vec3::new(o.x, o.y + 1.0, o.z),
                Vec3::new(o.x + 1.0, o.y + 1.0, o.z),
                Vec3::new(o.x + 1.0, o.y, o.z),
            ],
        }
    }

    /// Projects a face corner onto its local `(u,v)` square, with the
    /// quarter-turn applied for the rotated orientations.
    #[inline]
    pub fn corner_uv(self, origin: Vec3, corner: Vec3) -> (f32, f32) {
        let dx = corner.x - origin.x;
        let dy = corner.y - origin.y;
        let dz = corner.z - origin.z;
        let (u, v) = match self {
            Face::PosY | Face::NegY => (dx, dz),
            Face::PosX | Face::NegX => (dz, 1.0 - dy),
            Face::PosZ | Face::NegZ => (dx, 1.0 - dy),
        };
        if self.rotates_uv() { (v, u) } else { (u, v) }
    }
}
