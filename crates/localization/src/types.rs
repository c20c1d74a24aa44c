use nalgebra::{Point2, Point3, Unit, UnitQuaternion, Vector3};

/// Identifier of a tracked physical surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl Pose {
    pub fn new(position: Point3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self { position, rotation }
    }

    pub fn at(position: Point3<f32>) -> Self {
        Self::new(position, UnitQuaternion::identity())
    }
}

/// Nearest intersection of a screen ray with a tracked surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub surface: SurfaceId,
    pub normal: Unit<Vector3<f32>>,
    pub pose: Pose,
}

/// A detection or touch projected onto a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalizedObject {
    pub surface: SurfaceId,
    pub normal: Unit<Vector3<f32>>,
    pub pose: Pose,
}

impl From<SurfaceHit> for LocalizedObject {
    fn from(hit: SurfaceHit) -> Self {
        Self {
            surface: hit.surface,
            normal: hit.normal,
            pose: hit.pose,
        }
    }
}

/// Camera position and viewing direction in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub position: Point3<f32>,
    pub forward: Vector3<f32>,
}

impl Observer {
    pub fn new(position: Point3<f32>, forward: Vector3<f32>) -> Self {
        Self { position, forward }
    }
}

/// Ray casting against tracked surfaces.
///
/// Points are in screen pixels with the origin at the bottom-left corner.
pub trait SurfaceProvider {
    fn raycast(&self, point: Point2<f32>) -> Option<SurfaceHit>;
}

impl<F> SurfaceProvider for F
where
    F: Fn(Point2<f32>) -> Option<SurfaceHit>,
{
    fn raycast(&self, point: Point2<f32>) -> Option<SurfaceHit> {
        self(point)
    }
}

/// `direction` projected onto the plane with `normal`; `None` when they are parallel.
pub fn project_on_plane(
    direction: &Vector3<f32>,
    normal: &Unit<Vector3<f32>>,
) -> Option<Unit<Vector3<f32>>> {
    let n = normal.as_ref();
    Unit::try_new(direction - n * direction.dot(n), 1e-6)
}

/// Rotation looking along `direction` flattened onto the surface, with the
/// surface normal as up.
pub fn facing_rotation(
    direction: &Vector3<f32>,
    normal: &Unit<Vector3<f32>>,
) -> Option<UnitQuaternion<f32>> {
    let forward = project_on_plane(direction, normal)?;
    Some(UnitQuaternion::face_towards(forward.as_ref(), normal.as_ref()))
}
