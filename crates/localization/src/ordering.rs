//! Back-to-front, left-to-right enumeration of objects lying on one surface.

use crate::types::{LocalizedObject, Observer, project_on_plane};
use nalgebra::{Point3, Unit, Vector3};
use std::cmp::Ordering;

pub const DEFAULT_ROW_TOLERANCE: f32 = 0.08;

/// Planar frame on the surface: origin below the observer, `z` along the
/// flattened view direction and `x` to the observer's right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverFrame {
    origin: Point3<f32>,
    forward: Unit<Vector3<f32>>,
    right: Unit<Vector3<f32>>,
}

impl ObserverFrame {
    /// `None` when the observer looks along the surface normal.
    pub fn new(
        observer: &Observer,
        normal: &Unit<Vector3<f32>>,
        plane_point: &Point3<f32>,
    ) -> Option<Self> {
        let n = normal.as_ref();
        let height = (observer.position - plane_point).dot(n);
        let origin = observer.position - n * height;

        let forward = project_on_plane(&observer.forward, normal)?;
        let right = Unit::new_normalize(forward.cross(n));

        Some(Self {
            origin,
            forward,
            right,
        })
    }

    /// `(x, z)` of a world point in this frame
    pub fn local(&self, point: &Point3<f32>) -> (f32, f32) {
        let offset = point - self.origin;
        (offset.dot(self.right.as_ref()), offset.dot(self.forward.as_ref()))
    }
}

/// Pairwise order of two local positions: further back first, then further left
/// within the same row.
pub fn compare(a: (f32, f32), b: (f32, f32), row_tolerance: f32) -> Ordering {
    let (x1, z1) = a;
    let (x2, z2) = b;
    if (z1 - z2).abs() > row_tolerance {
        z2.total_cmp(&z1)
    } else {
        x1.total_cmp(&x2)
    }
}

/// Sort objects into reading order relative to the observer.
///
/// Objects are insertion sorted with `compare`. When the tolerance makes
/// `compare` contradict itself for this input, objects are instead grouped
/// into rows by depth (a new row starts wherever the gap to the previous depth
/// exceeds `row_tolerance`), rows run back to front and each row left to right.
/// The input order is kept when no frame can be built.
pub fn order(
    objects: Vec<LocalizedObject>,
    observer: &Observer,
    normal: &Unit<Vector3<f32>>,
    row_tolerance: f32,
) -> Vec<LocalizedObject> {
    let Some(first) = objects.first() else {
        return objects;
    };

    let Some(frame) = ObserverFrame::new(observer, normal, &first.pose.position) else {
        tracing::debug!("View direction parallel to surface normal, keeping detection order");
        return objects;
    };

    let mut keyed: Vec<((f32, f32), LocalizedObject)> = objects
        .into_iter()
        .map(|object| (frame.local(&object.pose.position), object))
        .collect();

    insertion_sort(&mut keyed, row_tolerance);
    if is_consistent(&keyed, row_tolerance) {
        return keyed.into_iter().map(|(_, object)| object).collect();
    }

    tracing::debug!(count = keyed.len(), "Pairwise order is ambiguous, sorting by depth rows");
    row_sweep(keyed, row_tolerance)
}

fn insertion_sort(keyed: &mut [((f32, f32), LocalizedObject)], row_tolerance: f32) {
    for i in 1..keyed.len() {
        let mut j = i;
        while j > 0 && compare(keyed[j - 1].0, keyed[j].0, row_tolerance) == Ordering::Greater {
            keyed.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Every earlier element compares not greater than every later one.
fn is_consistent(keyed: &[((f32, f32), LocalizedObject)], row_tolerance: f32) -> bool {
    keyed.iter().enumerate().all(|(i, (a, _))| {
        keyed[i + 1..]
            .iter()
            .all(|(b, _)| compare(*a, *b, row_tolerance) != Ordering::Greater)
    })
}

fn row_sweep(
    mut keyed: Vec<((f32, f32), LocalizedObject)>,
    row_tolerance: f32,
) -> Vec<LocalizedObject> {
    keyed.sort_by(|(a, _), (b, _)| b.1.total_cmp(&a.1));

    let mut ordered = Vec::with_capacity(keyed.len());
    let mut row: Vec<((f32, f32), LocalizedObject)> = Vec::new();
    let mut previous_z = f32::INFINITY;

    for entry in keyed {
        let z = entry.0.1;
        if previous_z - z > row_tolerance {
            flush_row(&mut row, &mut ordered);
        }
        previous_z = z;
        row.push(entry);
    }
    flush_row(&mut row, &mut ordered);

    ordered
}

fn flush_row(row: &mut Vec<((f32, f32), LocalizedObject)>, out: &mut Vec<LocalizedObject>) {
    row.sort_by(|(a, _), (b, _)| a.0.total_cmp(&b.0));
    out.extend(row.drain(..).map(|(_, object)| object));
}
