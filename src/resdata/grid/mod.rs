//! Corner-point grids with local refinements and non-neighbor connections.
//!
//! # Architecture
//!
//! ```text
//! Grid
//! ├── nodes: Vec<GridNode>      arena, index 0 = main grid
//! │     └── parent / children   LgrId links into the arena
//! ├── by_name:   name   → LgrId ┐ two views over the
//! ├── by_number: number → LgrId ┘ same arena nodes
//! └── nnc: Vec<NncPair>         sorted connection list
//! ```
//!
//! A grid is built once from a scanned file (see [`Grid::build`]) and is
//! immutable afterwards. Both the EGRID layout (COORD/ZCORN per grid) and
//! the older GRID layout (one COORDS/CORNERS pair per cell) are read. With
//! `MAPAXES` in the file, cell corners are reported in map coordinates.

mod builder;
pub mod geometry;
mod legacy;
pub mod mapaxes;
pub mod nnc;
mod node;

use std::collections::HashMap;

pub use geometry::Point;
pub use mapaxes::MapAxes;
pub use nnc::NncPair;
pub use node::GridNode;

use crate::resdata::types::error::{ResdataError, Result};

/// Name reported by the main grid.
pub const MAIN_GRID_NAME: &str = "GLOBAL";

/// Stable handle of a grid inside a [`Grid`] forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LgrId(usize);

impl LgrId {
    /// The main grid.
    pub const MAIN: LgrId = LgrId(0);

    /// Position in the arena; 0 is the main grid, LGRs follow in file order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A main grid together with its tree of local grid refinements and the
/// non-neighbor connections between all of them.
#[derive(Debug, Clone)]
pub struct Grid {
    nodes: Vec<GridNode>,
    by_name: HashMap<String, LgrId>,
    by_number: HashMap<i32, LgrId>,
    nnc: Vec<NncPair>,
    map_axes: Option<MapAxes>,
}

/// Options for grid construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridOptions {
    /// Move cell corners to map coordinates when the file has `MAPAXES`.
    /// The axes are reported by [`Grid::map_axes`] either way.
    pub apply_mapaxes: bool,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self { apply_mapaxes: true }
    }
}

impl GridOptions {
    pub fn with_apply_mapaxes(mut self, apply_mapaxes: bool) -> Self {
        self.apply_mapaxes = apply_mapaxes;
        self
    }
}

impl Grid {
    fn with_main(main: GridNode) -> Self {
        Self {
            nodes: vec![main],
            by_name: HashMap::new(),
            by_number: HashMap::new(),
            nnc: Vec::new(),
            map_axes: None,
        }
    }

    /// Map axes read from `MAPAXES`, if the file has usable ones.
    pub fn map_axes(&self) -> Option<&MapAxes> {
        self.map_axes.as_ref()
    }

    /// The main grid.
    pub fn main(&self) -> &GridNode {
        &self.nodes[LgrId::MAIN.0]
    }

    /// Number of local grid refinements, at any depth.
    pub fn num_lgr(&self) -> usize {
        self.nodes.len() - 1
    }

    /// The grid behind `id`.
    pub fn node(&self, id: LgrId) -> Result<&GridNode> {
        self.nodes.get(id.0).ok_or(ResdataError::IndexOutOfRange {
            what: "grid",
            index: id.0,
            len: self.nodes.len(),
        })
    }

    pub fn lgr_by_name(&self, name: &str) -> Option<LgrId> {
        self.by_name.get(name.trim_end()).copied()
    }

    pub fn lgr_by_number(&self, number: i32) -> Option<LgrId> {
        self.by_number.get(&number).copied()
    }

    /// The grid with number `number`; 0 is the main grid.
    pub fn grid_by_number(&self, number: i32) -> Option<&GridNode> {
        if number == 0 {
            return Some(self.main());
        }
        self.lgr_by_number(number).map(|id| &self.nodes[id.0])
    }

    /// All refinements in file order.
    pub fn lgrs(&self) -> impl Iterator<Item = (LgrId, &GridNode)> {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, node)| (LgrId(index), node))
    }

    /// Parent of `id`; `None` for the main grid.
    pub fn parent(&self, id: LgrId) -> Result<Option<LgrId>> {
        Ok(self.node(id)?.parent())
    }

    pub fn children(&self, id: LgrId) -> Result<&[LgrId]> {
        Ok(self.node(id)?.children())
    }

    /// Zero based `(i, j, k)` bounds of the parent cells hosting refinement `id`.
    pub fn host_box(&self, id: LgrId) -> Result<Option<((usize, usize, usize), (usize, usize, usize))>> {
        let node = self.node(id)?;
        match node.parent() {
            Some(parent) => Ok(node.host_box(self.node(parent)?)),
            None => Ok(None),
        }
    }

    /// All NNC pairs, ordered by `(grid_nr1, grid_nr2, global_index1, global_index2)`.
    pub fn nnc_pairs(&self) -> &[NncPair] {
        &self.nnc
    }

    /// NNC pairs with an endpoint on global cell `g` of grid `grid_nr`.
    pub fn nnc_for_cell(&self, grid_nr: i32, g: usize) -> impl Iterator<Item = &NncPair> {
        nnc::pairs_for_cell(&self.nnc, grid_nr, g)
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        self.main().dims()
    }

    pub fn global_size(&self) -> usize {
        self.main().global_size()
    }

    pub fn active_size(&self) -> usize {
        self.main().active_size()
    }

    pub fn global_index(&self, i: usize, j: usize, k: usize) -> Result<usize> {
        self.main().global_index(i, j, k)
    }

    pub fn ijk(&self, g: usize) -> Result<(usize, usize, usize)> {
        self.main().ijk(g)
    }

    pub fn active_index(&self, g: usize) -> Result<Option<usize>> {
        self.main().active_index(g)
    }

    pub fn global_index_of_active(&self, a: usize) -> Result<usize> {
        self.main().global_index_of_active(a)
    }

    pub fn cell_center(&self, g: usize) -> Result<Point> {
        self.main().cell_center(g)
    }

    pub fn find_cell_in_layer(&self, k: usize, x: f64, y: f64, z: f64) -> Result<Option<usize>> {
        self.main().find_cell_in_layer(k, x, y, z)
    }

    pub fn find_cell(&self, x: f64, y: f64, z: f64) -> Option<usize> {
        self.main().find_cell(x, y, z)
    }
}
