//! Non-neighbor connections.
//!
//! NNCs are declared in sections opened by a header keyword:
//!
//! - `NNCHEAD` + `NNC1`/`NNC2`: connections inside the grid numbered in `NNCHEAD[1]`
//! - `NNCHEAD` + `NNCG`/`NNCL`: connections from main grid cells to cells of that LGR
//! - `NNCHEADA` + `NNA1`/`NNA2`: connections between LGR `NNCHEADA[0]` and LGR `NNCHEADA[1]`
//!
//! All cell references on disk are one based global indices.

use log::{debug, warn};

use super::node::GridNode;
use crate::resdata::reader::{BlockView, ResFile};
use crate::resdata::types::error::{ResdataError, Result};

/// One connection between two `(grid number, global index)` endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NncPair {
    pub grid_nr1: i32,
    pub global_index1: usize,
    pub grid_nr2: i32,
    pub global_index2: usize,
    /// Position of the connection in the keyword it was read from.
    pub input_index: usize,
}

impl NncPair {
    /// Whether both pairs come from the same kind of keyword section.
    ///
    /// The comparison is ordered: `(1, 3)` and `(3, 1)` are different classes.
    pub fn same_kw(&self, other: &NncPair) -> bool {
        self.grid_nr1 == other.grid_nr1 && self.grid_nr2 == other.grid_nr2
    }

    fn sort_key(&self) -> (i32, i32, usize, usize) {
        (self.grid_nr1, self.grid_nr2, self.global_index1, self.global_index2)
    }

    /// Whether `(grid_nr, g)` is one of the endpoints.
    pub fn touches(&self, grid_nr: i32, g: usize) -> bool {
        (self.grid_nr1 == grid_nr && self.global_index1 == g)
            || (self.grid_nr2 == grid_nr && self.global_index2 == g)
    }
}

/// Reads every NNC section of `file`, validating endpoints against `grid_size`
/// (the number of cells of a grid given its number, `None` if unknown).
///
/// In a dual porosity model the fracture cells are numbered after the
/// matrix cells; connections touching them are skipped.
///
/// The result is ordered by grid numbers, then global indices; the sort is
/// stable so duplicates keep their input order.
pub(super) fn read_pairs(
    file: &ResFile,
    grid_size: impl Fn(i32) -> Option<usize>,
    dual_porosity: bool,
) -> Result<Vec<NncPair>> {
    let mut pairs = Vec::new();
    let mut skipped = 0;

    for section in 0..file.num_named("NNCHEAD") {
        let Some(view) = file.block_view("NNCHEAD", section) else {
            continue;
        };
        let head = view.load("NNCHEAD", 0)?.values::<i32>()?;
        let grid_nr = head.get(1).copied().unwrap_or(0);
        if view.has("NNC1") {
            let (first, second) = load_index_pair(&view, "NNC1", "NNC2")?;
            skipped += push_pairs(
                &mut pairs,
                &grid_size,
                dual_porosity,
                (grid_nr, &first),
                (grid_nr, &second),
            )?;
        }
        if view.has("NNCL") {
            let (global, local) = load_index_pair(&view, "NNCG", "NNCL")?;
            skipped += push_pairs(
                &mut pairs,
                &grid_size,
                dual_porosity,
                (0, &global),
                (grid_nr, &local),
            )?;
        }
        debug!("NNC section {} for grid {}: {} pairs so far", section, grid_nr, pairs.len());
    }

    for section in 0..file.num_named("NNCHEADA") {
        let Some(view) = file.block_view("NNCHEADA", section) else {
            continue;
        };
        let head = view.load("NNCHEADA", 0)?.values::<i32>()?;
        let (&grid_nr1, &grid_nr2) = match head.as_slice() {
            [a, b, ..] => (a, b),
            _ => {
                return Err(ResdataError::Format(format!(
                    "NNCHEADA section {} has {} elements, expected at least 2",
                    section,
                    head.len()
                )))
            }
        };
        let (first, second) = load_index_pair(&view, "NNA1", "NNA2")?;
        skipped += push_pairs(
            &mut pairs,
            &grid_size,
            dual_porosity,
            (grid_nr1, &first),
            (grid_nr2, &second),
        )?;
        debug!("Amalgamation section {}: grids {} -> {}", section, grid_nr1, grid_nr2);
    }

    if skipped > 0 {
        warn!("Skipped {} NNCs to dual porosity fracture cells", skipped);
    }
    pairs.sort_by_key(NncPair::sort_key);
    Ok(pairs)
}

fn load_index_pair(view: &BlockView<'_>, first: &str, second: &str) -> Result<(Vec<i32>, Vec<i32>)> {
    let a = view.load(first, 0)?.values::<i32>()?;
    let b = view.load(second, 0)?.values::<i32>()?;
    if a.len() != b.len() {
        return Err(ResdataError::size_mismatch(
            format!("{} paired with {}", second, first),
            a.len(),
            b.len(),
        ));
    }
    Ok((a, b))
}

/// Appends one section's pairs and returns how many fracture pairs were skipped.
fn push_pairs(
    pairs: &mut Vec<NncPair>,
    grid_size: &impl Fn(i32) -> Option<usize>,
    dual_porosity: bool,
    (grid_nr1, first): (i32, &[i32]),
    (grid_nr2, second): (i32, &[i32]),
) -> Result<usize> {
    let mut skipped = 0;
    for (input_index, (&a, &b)) in first.iter().zip(second).enumerate() {
        if dual_porosity && (is_fracture(grid_size, grid_nr1, a) || is_fracture(grid_size, grid_nr2, b)) {
            skipped += 1;
            continue;
        }
        pairs.push(NncPair {
            grid_nr1,
            global_index1: resolve_endpoint(&grid_size, grid_nr1, a)?,
            grid_nr2,
            global_index2: resolve_endpoint(&grid_size, grid_nr2, b)?,
            input_index,
        });
    }
    Ok(skipped)
}

fn is_fracture(grid_size: &impl Fn(i32) -> Option<usize>, grid_nr: i32, one_based: i32) -> bool {
    match (grid_size(grid_nr), usize::try_from(one_based)) {
        (Some(size), Ok(g)) => g > size && g <= 2 * size,
        _ => false,
    }
}

fn resolve_endpoint(grid_size: &impl Fn(i32) -> Option<usize>, grid_nr: i32, one_based: i32) -> Result<usize> {
    let size = grid_size(grid_nr).ok_or_else(|| {
        ResdataError::InvalidTopology(format!("NNC refers to unknown grid number {}", grid_nr))
    })?;
    usize::try_from(one_based)
        .ok()
        .and_then(|g| g.checked_sub(1))
        .filter(|g| *g < size)
        .ok_or_else(|| {
            ResdataError::InvalidTopology(format!(
                "NNC endpoint {} is outside grid {} of {} cells",
                one_based, grid_nr, size
            ))
        })
}

/// Pairs with an endpoint on global cell `g` of grid `grid_nr`.
pub fn pairs_for_cell(pairs: &[NncPair], grid_nr: i32, g: usize) -> impl Iterator<Item = &NncPair> {
    pairs.iter().filter(move |pair| pair.touches(grid_nr, g))
}

pub(super) fn node_size(nodes: &[GridNode], grid_nr: i32) -> Option<usize> {
    nodes
        .iter()
        .find(|node| node.lgr_number == grid_nr)
        .map(GridNode::global_size)
}
