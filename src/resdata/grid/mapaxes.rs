//! Map axes: the transform from grid coordinates to map coordinates.
//!
//! `MAPAXES` holds three points `(x1, y1, x0, y0, x2, y2)`: a point on the
//! y axis, the origin and a point on the x axis, all in map coordinates.
//! A grid point `(x, y)` lands at `origin + x * unit_x + y * unit_y`; depth
//! is not affected.

use log::warn;

use super::geometry::Point;
use crate::resdata::types::error::{ResdataError, Result};

/// Number of values in a `MAPAXES` keyword.
pub const MAPAXES_LEN: usize = 6;

/// Origin and unit axes of the map coordinate system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapAxes {
    origin: [f64; 2],
    unit_x: [f64; 2],
    unit_y: [f64; 2],
    raw: [f64; MAPAXES_LEN],
}

fn normalized(v: [f64; 2]) -> Option<[f64; 2]> {
    let norm = v[0].hypot(v[1]);
    (norm.is_finite() && norm > 0.0).then(|| [v[0] / norm, v[1] / norm])
}

impl MapAxes {
    /// Reads the three points of a `MAPAXES` keyword.
    ///
    /// Returns `Ok(None)` for degenerate axes (a zero length or two
    /// parallel axes), which leave the grid in its own coordinates.
    ///
    /// # Errors
    /// Returns [`ResdataError::SizeMismatch`] unless there are exactly six values.
    pub fn from_values(values: &[f64]) -> Result<Option<Self>> {
        let raw: [f64; MAPAXES_LEN] = values
            .try_into()
            .map_err(|_| ResdataError::size_mismatch("MAPAXES", MAPAXES_LEN, values.len()))?;
        let origin = [raw[2], raw[3]];
        let axes = normalized([raw[4] - raw[2], raw[5] - raw[3]])
            .zip(normalized([raw[0] - raw[2], raw[1] - raw[3]]));
        let Some((unit_x, unit_y)) = axes else {
            warn!("Ignoring MAPAXES with a zero length axis: {:?}", raw);
            return Ok(None);
        };
        if unit_x[0] * unit_y[1] - unit_x[1] * unit_y[0] == 0.0 {
            warn!("Ignoring MAPAXES with parallel axes: {:?}", raw);
            return Ok(None);
        }
        Ok(Some(Self {
            origin,
            unit_x,
            unit_y,
            raw,
        }))
    }

    /// Origin of the grid in map coordinates.
    pub fn origin(&self) -> (f64, f64) {
        (self.origin[0], self.origin[1])
    }

    pub fn unit_x(&self) -> (f64, f64) {
        (self.unit_x[0], self.unit_x[1])
    }

    pub fn unit_y(&self) -> (f64, f64) {
        (self.unit_y[0], self.unit_y[1])
    }

    /// The six values as read from the file.
    pub fn values(&self) -> &[f64; MAPAXES_LEN] {
        &self.raw
    }

    /// Grid coordinates to map coordinates.
    pub fn to_map(&self, p: Point) -> Point {
        Point::new(
            self.origin[0] + p.x * self.unit_x[0] + p.y * self.unit_y[0],
            self.origin[1] + p.x * self.unit_x[1] + p.y * self.unit_y[1],
            p.z,
        )
    }

    /// Map coordinates back to grid coordinates.
    pub fn to_grid(&self, p: Point) -> Point {
        let norm = 1.0 / (self.unit_x[0] * self.unit_y[1] - self.unit_x[1] * self.unit_y[0]);
        let dx = p.x - self.origin[0];
        let dy = p.y - self.origin[1];
        Point::new(
            (dx * self.unit_y[1] - dy * self.unit_y[0]) * norm,
            (-dx * self.unit_x[1] + dy * self.unit_x[0]) * norm,
            p.z,
        )
    }
}
