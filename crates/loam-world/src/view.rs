use loam_geom::{Aabb, Vec3};

/// Current viewer state, supplied by the external camera collaborator.
/// Absence of a frustum degrades candidate filtering gracefully.
#[derive(Clone, Copy, Debug, Default)]
pub struct Viewpoint {
    pub position: Vec3,
    pub frustum: Option<Frustum>,
}

impl Viewpoint {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            frustum: None,
        }
    }
}

/// Six view planes as (normal, d), inward-facing: a point p is inside
/// when dot(n, p) + d >= 0 for all planes.
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pub planes: [(Vec3, f32); 6],
}

impl Frustum {
    /// Conservative AABB test: reject only when the whole box is on
    /// the outside of some plane.
    pub fn intersects_aabb(&self, aabb: Aabb) -> bool {
        for (n, d) in self.planes {
            let far = Vec3::new(
                if n.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if n.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if n.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if n.dot(far) + d < 0.0 {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_space_x() -> Frustum {
        // Single meaningful plane x >= 0; the rest accept everything.
        let open = (Vec3::new(0.0, 1.0, 0.0), 1.0e9);
        Frustum {
            planes: [
                (Vec3::new(1.0, 0.0, 0.0), 0.0),
                open,
                open,
                open,
                open,
                open,
            ],
        }
    }

    #[test]
    fn aabb_rejected_only_when_fully_outside() {
        let f = half_space_x();
        let inside = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let straddling = Aabb::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let outside = Aabb::new(Vec3::new(-3.0, 0.0, 0.0), Vec3::new(-2.0, 1.0, 1.0));
        assert!(f.intersects_aabb(inside));
        assert!(f.intersects_aabb(straddling));
        assert!(!f.intersects_aabb(outside));
    }
}
