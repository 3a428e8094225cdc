//! Grid construction from the older GRID layout.
//!
//! A GRID file stores one `COORDS`/`CORNERS` keyword pair per cell instead
//! of pillars and corner depths:
//!
//! ```text
//! DIMENS   nx ny nz                 (one per grid, main grid first)
//! COORDS   i j k g [active [host coarse]]    one pair per cell,
//! CORNERS  x0 y0 z0 ... x7 y7 z7             1-based i, j, k and host
//! LGR      name [parent]            (one per refinement)
//! ```
//!
//! The main grid takes the first `nx*ny*nz` cell records, or fewer when only
//! active cells were written. Each LGR then takes exactly `nx*ny*nz` records
//! in order, and those must carry the 7 value form with the host cell.

use std::ops::Range;

use log::debug;

use super::builder::checked_len;
use super::geometry::Point;
use super::mapaxes::MapAxes;
use super::node::GridNode;
use super::{Grid, MAIN_GRID_NAME};
use crate::resdata::reader::ResFile;
use crate::resdata::types::error::{ResdataError, Result};

/// Values in a `CORNERS` record: eight `(x, y, z)` corners.
const CORNERS_LEN: usize = 24;
/// `COORDS` with the active flag, host cell and coarsening group.
const COORDS_FULL_LEN: usize = 7;

/// One grid worth of cell records.
struct CellRecords {
    corners: Vec<[Point; 8]>,
    actnum: Vec<i32>,
    host_cells: Vec<usize>,
}

fn grid_dims(file: &ResFile, grid_nr: usize) -> Result<(usize, usize, usize)> {
    let dimens = file.load_named("DIMENS", grid_nr)?.values::<i32>()?;
    if dimens.len() < 3 {
        return Err(ResdataError::size_mismatch("DIMENS", 3, dimens.len()));
    }
    let mut dims = [0usize; 3];
    for (dim, value) in dims.iter_mut().zip(&dimens) {
        *dim = usize::try_from(*value)
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| ResdataError::Format(format!("GRID dimensions must be positive: {:?}", dimens)))?;
    }
    Ok((dims[0], dims[1], dims[2]))
}

fn read_cells(
    file: &ResFile,
    (nx, ny, nz): (usize, usize, usize),
    records: Range<usize>,
    is_lgr: bool,
    map_axes: Option<&MapAxes>,
) -> Result<CellRecords> {
    let size = nx * ny * nz;
    let mut cells = CellRecords {
        corners: vec![[Point::default(); 8]; size],
        actnum: vec![0; size],
        host_cells: vec![usize::MAX; size],
    };
    for record in records {
        let coords = file.load_named("COORDS", record)?;
        let corners = file.load_named("CORNERS", record)?;
        checked_len(&corners, CORNERS_LEN)?;
        let values = coords.values::<i32>()?;
        if !matches!(values.len(), 4 | 5 | COORDS_FULL_LEN) || (is_lgr && values.len() != COORDS_FULL_LEN) {
            return Err(ResdataError::Format(format!(
                "COORDS record {} has {} values{}",
                record,
                values.len(),
                if is_lgr { ", LGR cells need 7" } else { ", expected 4, 5 or 7" }
            )));
        }

        let ijk: Vec<usize> = values[..3]
            .iter()
            .filter_map(|v| usize::try_from(*v).ok()?.checked_sub(1))
            .collect();
        let g = match ijk.as_slice() {
            &[i, j, k] if i < nx && j < ny && k < nz => i + j * nx + k * nx * ny,
            _ => {
                return Err(ResdataError::Format(format!(
                    "COORDS record {} addresses cell {:?} outside {}x{}x{}",
                    record,
                    &values[..3],
                    nx,
                    ny,
                    nz
                )))
            }
        };

        cells.actnum[g] = values.get(4).copied().unwrap_or(1);
        if let Some(host) = values.get(5) {
            cells.host_cells[g] = usize::try_from(*host)
                .ok()
                .and_then(|h| h.checked_sub(1))
                .unwrap_or(usize::MAX);
        }
        let xyz = corners.to_f64_vec()?;
        cells.corners[g] = std::array::from_fn(|c| {
            let p = Point::new(xyz[3 * c], xyz[3 * c + 1], xyz[3 * c + 2]);
            map_axes.map_or(p, |axes| axes.to_map(p))
        });
    }
    Ok(cells)
}

/// Builds the main grid and its refinements from a scanned GRID file.
pub(super) fn build(file: &ResFile, map_axes: Option<&MapAxes>) -> Result<Grid> {
    let num_records = file.num_named("COORDS");
    if file.num_named("CORNERS") != num_records {
        return Err(ResdataError::size_mismatch(
            "CORNERS records",
            num_records,
            file.num_named("CORNERS"),
        ));
    }

    let dims = grid_dims(file, 0)?;
    let size = dims.0 * dims.1 * dims.2;
    let main_records = num_records.min(size);
    if main_records < size {
        debug!("GRID file holds {} of {} main grid cells", main_records, size);
    }
    let cells = read_cells(file, dims, 0..main_records, false, map_axes)?;
    let main = GridNode::from_corners(MAIN_GRID_NAME.to_string(), 0, dims, cells.corners, Some(cells.actnum));
    let mut grid = Grid::with_main(main);

    let mut offset = size;
    for grid_nr in 1..file.num_named("DIMENS") {
        let dims = grid_dims(file, grid_nr)?;
        let size = dims.0 * dims.1 * dims.2;
        let lgr = file.load_named("LGR", grid_nr - 1)?;
        let name = lgr.iget_string(0)?;
        let parent_name = if lgr.len() > 1 {
            lgr.iget_string(1)?
        } else {
            String::new()
        };
        if offset + size > num_records {
            return Err(ResdataError::Format(format!(
                "LGR '{}' needs cell records {}..{}, the file has {}",
                name,
                offset,
                offset + size,
                num_records
            )));
        }

        let cells = read_cells(file, dims, offset..offset + size, true, map_axes)?;
        let mut node = GridNode::from_corners(name, grid_nr as i32, dims, cells.corners, Some(cells.actnum));
        node.host_cells = cells.host_cells;
        grid.install_lgr(node, &parent_name)?;
        offset += size;
    }
    Ok(grid)
}
