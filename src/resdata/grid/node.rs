//! One grid of the forest: the main grid or a local refinement.

use super::geometry::{self, Point};
use super::mapaxes::MapAxes;
use super::LgrId;
use crate::resdata::types::error::{ResdataError, Result};

/// Cell geometry and active-cell bookkeeping of a single grid.
///
/// Cells are addressed by global index `g = i + j*nx + k*nx*ny`. Active
/// indices are handed out in one ascending pass over `g`, skipping inactive
/// cells, so `global_index_of_active` is strictly increasing.
#[derive(Debug, Clone)]
pub struct GridNode {
    pub(super) name: String,
    pub(super) lgr_number: i32,
    pub(super) parent: Option<LgrId>,
    pub(super) children: Vec<LgrId>,
    nx: usize,
    ny: usize,
    nz: usize,
    corners: Vec<[Point; 8]>,
    actnum: Vec<i32>,
    active_index: Vec<Option<usize>>,
    global_index: Vec<usize>,
    /// Host cell in the parent grid for every cell (LGRs only).
    pub(super) host_cells: Vec<usize>,
    /// Child refinement covering each cell.
    pub(super) lgr_cells: Vec<Option<LgrId>>,
}

impl GridNode {
    /// Builds the cells of a grid from checked COORD/ZCORN/ACTNUM arrays.
    ///
    /// With `map_axes` every corner is moved to map coordinates.
    pub(super) fn from_arrays(
        name: String,
        lgr_number: i32,
        (nx, ny, nz): (usize, usize, usize),
        coord: &[f64],
        zcorn: &[f64],
        actnum: Option<Vec<i32>>,
        map_axes: Option<&MapAxes>,
    ) -> Self {
        let mut corners = Vec::with_capacity(nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let mut cell = geometry::cell_corners(nx, ny, coord, zcorn, (i, j, k));
                    if let Some(map_axes) = map_axes {
                        cell = cell.map(|p| map_axes.to_map(p));
                    }
                    corners.push(cell);
                }
            }
        }
        Self::from_corners(name, lgr_number, (nx, ny, nz), corners, actnum)
    }

    /// Builds a grid from per-cell corners, `nx*ny*nz` of them in global
    /// index order.
    pub(super) fn from_corners(
        name: String,
        lgr_number: i32,
        (nx, ny, nz): (usize, usize, usize),
        corners: Vec<[Point; 8]>,
        actnum: Option<Vec<i32>>,
    ) -> Self {
        let size = nx * ny * nz;
        let actnum = actnum.unwrap_or_else(|| vec![1; size]);

        let mut active_index = Vec::with_capacity(size);
        let mut global_index = Vec::new();
        for (g, value) in actnum.iter().enumerate() {
            if *value > 0 {
                active_index.push(Some(global_index.len()));
                global_index.push(g);
            } else {
                active_index.push(None);
            }
        }

        Self {
            name,
            lgr_number,
            parent: None,
            children: Vec::new(),
            nx,
            ny,
            nz,
            corners,
            actnum,
            active_index,
            global_index,
            host_cells: Vec::new(),
            lgr_cells: vec![None; size],
        }
    }

    /// Grid name; `GLOBAL` for the main grid.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// LGR number; 0 for the main grid.
    pub fn lgr_number(&self) -> i32 {
        self.lgr_number
    }

    pub fn is_main(&self) -> bool {
        self.parent.is_none()
    }

    pub fn parent(&self) -> Option<LgrId> {
        self.parent
    }

    pub fn children(&self) -> &[LgrId] {
        &self.children
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn nz(&self) -> usize {
        self.nz
    }

    pub fn global_size(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    pub fn active_size(&self) -> usize {
        self.global_index.len()
    }

    fn check_global(&self, g: usize) -> Result<()> {
        if g < self.global_size() {
            Ok(())
        } else {
            Err(ResdataError::IndexOutOfRange {
                what: "global cell",
                index: g,
                len: self.global_size(),
            })
        }
    }

    /// Global index of cell `(i, j, k)`, zero based.
    pub fn global_index(&self, i: usize, j: usize, k: usize) -> Result<usize> {
        if i >= self.nx || j >= self.ny || k >= self.nz {
            return Err(ResdataError::IndexOutOfRange {
                what: "cell (i,j,k)",
                index: i.max(j).max(k),
                len: self.global_size(),
            });
        }
        Ok(i + j * self.nx + k * self.nx * self.ny)
    }

    /// Zero based `(i, j, k)` of global cell `g`.
    pub fn ijk(&self, g: usize) -> Result<(usize, usize, usize)> {
        self.check_global(g)?;
        let layer = self.nx * self.ny;
        Ok((g % self.nx, (g % layer) / self.nx, g / layer))
    }

    /// Active index of global cell `g`, `None` for inactive cells.
    pub fn active_index(&self, g: usize) -> Result<Option<usize>> {
        self.check_global(g)?;
        Ok(self.active_index[g])
    }

    /// Global index of active cell `a`.
    pub fn global_index_of_active(&self, a: usize) -> Result<usize> {
        self.global_index
            .get(a)
            .copied()
            .ok_or(ResdataError::IndexOutOfRange {
                what: "active cell",
                index: a,
                len: self.active_size(),
            })
    }

    pub fn is_active(&self, g: usize) -> Result<bool> {
        Ok(self.active_index(g)?.is_some())
    }

    /// Raw ACTNUM value of global cell `g`.
    pub fn actnum(&self, g: usize) -> Result<i32> {
        self.check_global(g)?;
        Ok(self.actnum[g])
    }

    /// Global indices of all active cells, ascending.
    pub fn active_cells(&self) -> &[usize] {
        &self.global_index
    }

    /// Corner `c` (0..8) of global cell `g`.
    pub fn cell_corner(&self, g: usize, c: usize) -> Result<Point> {
        self.check_global(g)?;
        self.corners[g]
            .get(c)
            .copied()
            .ok_or(ResdataError::IndexOutOfRange {
                what: "cell corner",
                index: c,
                len: 8,
            })
    }

    pub fn cell_corners(&self, g: usize) -> Result<&[Point; 8]> {
        self.check_global(g)?;
        Ok(&self.corners[g])
    }

    /// Centroid of global cell `g`.
    pub fn cell_center(&self, g: usize) -> Result<Point> {
        self.check_global(g)?;
        Ok(geometry::centroid(&self.corners[g]))
    }

    /// Mean depth of the top and bottom faces of cell `g`.
    pub fn cell_depth(&self, g: usize) -> Result<f64> {
        Ok(self.cell_center(g)?.z)
    }

    /// Mean vertical distance between the bottom and top faces of cell `g`.
    pub fn cell_thickness(&self, g: usize) -> Result<f64> {
        self.check_global(g)?;
        let corners = &self.corners[g];
        let sum: f64 = (0..4).map(|c| corners[c + 4].z - corners[c].z).sum();
        Ok(sum / 4.0)
    }

    /// Finds the cell of layer `k` containing `(x, y, z)`.
    ///
    /// Returns the global index of the first matching cell in `(i, j)` scan
    /// order, or `None` if the point lies outside the layer.
    pub fn find_cell_in_layer(&self, k: usize, x: f64, y: f64, z: f64) -> Result<Option<usize>> {
        self.scan_layer(k, |corners| geometry::contains(corners, Point::new(x, y, z)))
    }

    /// Finds the cell of layer `k` whose footprint contains `(x, y)`.
    pub fn find_cell_xy_in_layer(&self, k: usize, x: f64, y: f64) -> Result<Option<usize>> {
        self.scan_layer(k, |corners| {
            geometry::footprint_contains(corners, Point::new(x, y, 0.0))
        })
    }

    /// Finds the cell containing `(x, y, z)`, searching layer by layer.
    pub fn find_cell(&self, x: f64, y: f64, z: f64) -> Option<usize> {
        (0..self.nz).find_map(|k| self.find_cell_in_layer(k, x, y, z).ok().flatten())
    }

    fn scan_layer(&self, k: usize, test: impl Fn(&[Point; 8]) -> bool) -> Result<Option<usize>> {
        if k >= self.nz {
            return Err(ResdataError::IndexOutOfRange {
                what: "layer",
                index: k,
                len: self.nz,
            });
        }
        let layer = self.nx * self.ny;
        let start = k * layer;
        Ok((start..start + layer).find(|&g| test(&self.corners[g])))
    }

    /// Host cell in the parent grid of LGR cell `g`; `None` on the main grid.
    pub fn host_cell(&self, g: usize) -> Result<Option<usize>> {
        self.check_global(g)?;
        Ok(self.host_cells.get(g).copied())
    }

    /// The child refinement covering cell `g`, if any.
    pub fn lgr_of_cell(&self, g: usize) -> Result<Option<LgrId>> {
        self.check_global(g)?;
        Ok(self.lgr_cells[g])
    }

    /// Zero based `(i, j, k)` corners of the box of parent cells hosting this
    /// refinement; `None` on the main grid.
    pub fn host_box(&self, parent: &GridNode) -> Option<((usize, usize, usize), (usize, usize, usize))> {
        let mut cells = self.host_cells.iter().filter_map(|&g| parent.ijk(g).ok());
        let first = cells.next()?;
        Some(cells.fold((first, first), |(low, high), (i, j, k)| {
            (
                (low.0.min(i), low.1.min(j), low.2.min(k)),
                (high.0.max(i), high.1.max(j), high.2.max(k)),
            )
        }))
    }
}
