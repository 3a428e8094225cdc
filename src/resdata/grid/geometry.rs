//! Corner-point cell geometry.
//!
//! A corner-point grid stores one straight pillar per `(i, j)` node in
//! COORD and eight corner depths per cell in ZCORN. Corner `c` of a cell
//! sits on pillar `c % 4` at the depth read from ZCORN:
//!
//! ```text
//!   top face (c = 0..3)      bottom face (c = 4..7)
//!    2 ──── 3                 6 ──── 7
//!    │      │                 │      │
//!    0 ──── 1                 4 ──── 5      (i grows →, j grows ↑)
//! ```

/// A point in model coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn midpoint(self, other: Point) -> Point {
        Point::new(
            0.5 * (self.x + other.x),
            0.5 * (self.y + other.y),
            0.5 * (self.z + other.z),
        )
    }
}

/// Offset of the first COORD value of pillar `(i, j)`.
pub fn pillar_index(nx: usize, i: usize, j: usize) -> usize {
    6 * (j * (nx + 1) + i)
}

/// Offset into ZCORN of corner `c` of cell `(i, j, k)`.
pub fn zcorn_index(nx: usize, ny: usize, i: usize, j: usize, k: usize, c: usize) -> usize {
    let mut index = k * 8 * nx * ny + j * 4 * nx + 2 * i;
    if c % 2 == 1 {
        index += 1;
    }
    if c % 4 >= 2 {
        index += 2 * nx;
    }
    if c >= 4 {
        index += 4 * nx * ny;
    }
    index
}

/// Position on a pillar at depth `z`.
///
/// A pillar with no vertical extent is treated as vertical through its top.
fn point_on_pillar(pillar: &[f64], z: f64) -> Point {
    let (x0, y0, z0) = (pillar[0], pillar[1], pillar[2]);
    let dz = pillar[5] - z0;
    if dz == 0.0 {
        return Point::new(x0, y0, z);
    }
    let t = (z - z0) / dz;
    Point::new(x0 + t * (pillar[3] - x0), y0 + t * (pillar[4] - y0), z)
}

/// The eight corners of cell `(i, j, k)`.
///
/// `coord` and `zcorn` must already be checked against the dimensions.
pub fn cell_corners(
    nx: usize,
    ny: usize,
    coord: &[f64],
    zcorn: &[f64],
    (i, j, k): (usize, usize, usize),
) -> [Point; 8] {
    let mut corners = [Point::default(); 8];
    for (c, corner) in corners.iter_mut().enumerate() {
        let ip = c % 4;
        let p = pillar_index(nx, i + ip % 2, j + ip / 2);
        let z = zcorn[zcorn_index(nx, ny, i, j, k, c)];
        *corner = point_on_pillar(&coord[p..p + 6], z);
    }
    corners
}

/// Mean of the eight corners.
pub fn centroid(corners: &[Point; 8]) -> Point {
    let mut sum = Point::default();
    for corner in corners {
        sum.x += corner.x;
        sum.y += corner.y;
        sum.z += corner.z;
    }
    Point::new(sum.x / 8.0, sum.y / 8.0, sum.z / 8.0)
}

const BARYCENTRIC_TOLERANCE: f64 = 1e-9;

/// Barycentric weights of `p` in the `(x, y)` projection of triangle `abc`.
///
/// Returns `None` for a triangle with no area.
fn barycentric(p: Point, a: Point, b: Point, c: Point) -> Option<[f64; 3]> {
    let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    if det.abs() <= f64::EPSILON * (a.x.abs() + a.y.abs() + 1.0) {
        return None;
    }
    let l1 = ((b.y - c.y) * (p.x - c.x) + (c.x - b.x) * (p.y - c.y)) / det;
    let l2 = ((c.y - a.y) * (p.x - c.x) + (a.x - c.x) * (p.y - c.y)) / det;
    Some([l1, l2, 1.0 - l1 - l2])
}

/// The two triangles covering the cell's quadrilateral footprint.
const FOOTPRINT_TRIANGLES: [[usize; 3]; 2] = [[0, 1, 3], [0, 3, 2]];

/// Locates `p` in the footprint of the cell, taken halfway between its top
/// and bottom faces. Returns the footprint triangle and the weights.
fn locate_in_footprint(corners: &[Point; 8], p: Point) -> Option<([usize; 3], [f64; 3])> {
    let mid = |ip: usize| corners[ip].midpoint(corners[ip + 4]);
    FOOTPRINT_TRIANGLES.iter().find_map(|tri| {
        let weights = barycentric(p, mid(tri[0]), mid(tri[1]), mid(tri[2]))?;
        weights
            .iter()
            .all(|w| *w >= -BARYCENTRIC_TOLERANCE)
            .then_some((*tri, weights))
    })
}

/// Whether the `(x, y)` projection of `p` falls in the cell footprint.
pub fn footprint_contains(corners: &[Point; 8], p: Point) -> bool {
    locate_in_footprint(corners, p).is_some()
}

/// Whether `p` lies inside the cell.
///
/// The footprint test fixes barycentric weights; the top and bottom face
/// depths interpolated with the same weights bound the admissible `z`.
pub fn contains(corners: &[Point; 8], p: Point) -> bool {
    let Some((tri, weights)) = locate_in_footprint(corners, p) else {
        return false;
    };
    let face_depth = |offset: usize| -> f64 {
        tri.iter()
            .zip(weights)
            .map(|(ip, w)| w * corners[ip + offset].z)
            .sum()
    };
    let (top, bottom) = (face_depth(0), face_depth(4));
    let (low, high) = if top <= bottom { (top, bottom) } else { (bottom, top) };
    let tolerance = BARYCENTRIC_TOLERANCE * (1.0 + high.abs());
    p.z >= low - tolerance && p.z <= high + tolerance
}
