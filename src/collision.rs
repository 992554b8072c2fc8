use glam::{Mat4, Vec3};

/// Default minimum distance kept between the camera and any collider surface.
pub const DEFAULT_CLEARANCE_RADIUS: f32 = 0.35;

#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    Aabb { min: Vec3, max: Vec3 },
    /// Triangle soup in the collider's local space; both faces block.
    Triangles(Vec<[Vec3; 3]>),
}

/// Blocking geometry with a world transform and optional nested sub-geometry.
#[derive(Debug, Clone)]
pub struct Collider {
    pub name: String,
    pub world: Mat4,
    pub shape: Option<ColliderShape>,
    pub children: Vec<Collider>,
}

impl Collider {
    pub fn new(name: impl Into<String>, world: Mat4, shape: Option<ColliderShape>) -> Self {
        Self { name: name.into(), world, shape, children: Vec::new() }
    }

    /// Axis-aligned box centered at `center`.
    pub fn cuboid(name: impl Into<String>, center: Vec3, half_extents: Vec3) -> Self {
        Self::new(
            name,
            Mat4::from_translation(center),
            Some(ColliderShape::Aabb { min: -half_extents, max: half_extents }),
        )
    }

    /// Quad of `half_size` lying in the local XY plane, placed by `world`.
    pub fn quad(name: impl Into<String>, world: Mat4, half_width: f32, half_height: f32) -> Self {
        let a = Vec3::new(-half_width, -half_height, 0.0);
        let b = Vec3::new(half_width, -half_height, 0.0);
        let c = Vec3::new(half_width, half_height, 0.0);
        let d = Vec3::new(-half_width, half_height, 0.0);
        Self::new(name, world, Some(ColliderShape::Triangles(vec![[a, b, c], [a, c, d]])))
    }

    pub fn with_child(mut self, child: Collider) -> Self {
        self.children.push(child);
        self
    }

    /// Nearest world-space hit distance along `dir` (unit length) within `max_distance`,
    /// searching this collider and all nested children.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<f32> {
        let own = self.shape.as_ref().and_then(|shape| ray_hit_shape(origin, dir, &self.world, shape));
        self.children
            .iter()
            .filter_map(|child| child.raycast(origin, dir, max_distance))
            .chain(own)
            .filter(|distance| *distance <= max_distance)
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Rejects frame steps that would bring the camera within the clearance radius of a collider.
#[derive(Debug, Clone)]
pub struct CollisionGuard {
    colliders: Vec<Collider>,
    radius: f32,
}

impl Default for CollisionGuard {
    fn default() -> Self {
        Self { colliders: Vec::new(), radius: DEFAULT_CLEARANCE_RADIUS }
    }
}

impl CollisionGuard {
    pub fn new(radius: f32) -> Self {
        Self { colliders: Vec::new(), radius }
    }

    pub fn set_colliders(&mut self, colliders: Vec<Collider>) {
        self.colliders = colliders;
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    pub fn nearest_hit(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<f32> {
        self.colliders
            .iter()
            .filter_map(|collider| collider.raycast(origin, dir, max_distance))
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Returns the accepted end position for a step from `from` to `to`: either `to`, or
    /// `from` when the whole step is rejected. There is no partial sliding.
    pub fn resolve(&self, from: Vec3, to: Vec3) -> Vec3 {
        if self.colliders.is_empty() {
            return to;
        }
        let displacement = to - from;
        let length = displacement.length();
        if length <= f32::EPSILON || !length.is_finite() {
            return to;
        }
        let dir = displacement / length;
        let reach = length + self.radius;
        match self.nearest_hit(from, dir, reach) {
            Some(distance) if distance < reach => {
                tracing::debug!(target: "collision", distance, reach, "step rejected");
                from
            }
            _ => to,
        }
    }
}

fn ray_hit_shape(origin: Vec3, dir: Vec3, world: &Mat4, shape: &ColliderShape) -> Option<f32> {
    let inv = world.inverse();
    if !matrix_is_finite(&inv) {
        return None;
    }
    let origin_local = inv.transform_point3(origin);
    let dir_local = inv.transform_vector3(dir);
    if dir_local.length_squared() <= f32::EPSILON {
        return None;
    }
    let dir_local = dir_local.normalize();
    let t_local = match shape {
        ColliderShape::Aabb { min, max } => {
            // A ray starting inside the box never blocks, so a camera placed in one can walk out.
            if origin_local.cmpge(*min).all() && origin_local.cmple(*max).all() {
                return None;
            }
            ray_aabb_intersection(origin_local, dir_local, *min, *max)?.0
        }
        ColliderShape::Triangles(triangles) => triangles
            .iter()
            .filter_map(|tri| ray_triangle_intersection(origin_local, dir_local, tri))
            .min_by(|a, b| a.total_cmp(b))?,
    };
    let hit_world = world.transform_point3(origin_local + dir_local * t_local);
    Some((hit_world - origin).length())
}

pub fn matrix_is_finite(mat: &Mat4) -> bool {
    mat.to_cols_array().iter().all(|v| v.is_finite())
}

pub fn ray_aabb_intersection(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<(f32, Vec3)> {
    let mut t_min: f32 = 0.0;
    let mut t_max: f32 = f32::INFINITY;
    for i in 0..3 {
        let o = origin[i];
        let d = dir[i];
        if d.abs() < 1e-6 {
            if o < min[i] || o > max[i] {
                return None;
            }
        } else {
            let inv_d = 1.0 / d;
            let mut t1 = (min[i] - o) * inv_d;
            let mut t2 = (max[i] - o) * inv_d;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }
    }
    if t_max < 0.0 {
        return None;
    }
    Some((t_min, origin + dir * t_min))
}

/// Möller–Trumbore, culling neither face.
pub fn ray_triangle_intersection(origin: Vec3, dir: Vec3, tri: &[Vec3; 3]) -> Option<f32> {
    let edge_ab = tri[1] - tri[0];
    let edge_ac = tri[2] - tri[0];
    let p = dir.cross(edge_ac);
    let det = edge_ab.dot(p);
    if det.abs() < 1e-8 {
        return None;
    }
    let inv_det = 1.0 / det;
    let to_origin = origin - tri[0];
    let u = to_origin.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = to_origin.cross(edge_ab);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge_ac.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}
