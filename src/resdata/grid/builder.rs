//! Grid construction from keyword files.

use log::{debug, info};

use super::mapaxes::MapAxes;
use super::node::GridNode;
use super::{legacy, nnc, Grid, GridOptions, LgrId, MAIN_GRID_NAME};
use crate::resdata::reader::{BlockView, ResFile};
use crate::resdata::types::error::{ResdataError, Result};
use crate::resdata::types::keyword::Keyword;

/// Element of `FILEHEAD` flagging a dual porosity model.
const FILEHEAD_DUAL_POROSITY: usize = 5;

/// Dimensions and declared LGR number of one grid section.
struct SectionDims {
    dims: (usize, usize, usize),
    lgr_number: Option<i32>,
}

fn positive_dim(value: i32, axis: &str) -> Result<usize> {
    usize::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ResdataError::Format(format!("Grid dimension {} is not positive: {}", axis, value)))
}

fn dims_from(values: &[i32], offset: usize, context: &str) -> Result<(usize, usize, usize)> {
    if values.len() < offset + 3 {
        return Err(ResdataError::size_mismatch(context, offset + 3, values.len()));
    }
    Ok((
        positive_dim(values[offset], "nx")?,
        positive_dim(values[offset + 1], "ny")?,
        positive_dim(values[offset + 2], "nz")?,
    ))
}

fn read_dims(view: &BlockView<'_>) -> Result<SectionDims> {
    if let Some(gridhead) = view.load_optional("GRIDHEAD")? {
        let values = gridhead.values::<i32>()?;
        return Ok(SectionDims {
            dims: dims_from(&values, 1, "GRIDHEAD")?,
            lgr_number: values.get(4).copied(),
        });
    }
    if let Some(dimens) = view.load_optional("DIMENS")? {
        let values = dimens.values::<i32>()?;
        return Ok(SectionDims {
            dims: dims_from(&values, 0, "DIMENS")?,
            lgr_number: None,
        });
    }
    Err(ResdataError::Format(
        "Grid section has neither GRIDHEAD nor DIMENS".to_string(),
    ))
}

/// Checks a COORD/ZCORN/ACTNUM keyword against the grid dimensions.
pub(super) fn checked_len(keyword: &Keyword, expected: usize) -> Result<()> {
    if keyword.len() != expected {
        return Err(ResdataError::size_mismatch(keyword.name(), expected, keyword.len()));
    }
    Ok(())
}

/// Cell arrays of one grid section, checked against its dimensions.
struct SectionArrays {
    coord: Vec<f64>,
    zcorn: Vec<f64>,
    actnum: Option<Vec<i32>>,
}

fn section_arrays(
    (nx, ny, nz): (usize, usize, usize),
    coord: &Keyword,
    zcorn: &Keyword,
    actnum: Option<&Keyword>,
) -> Result<SectionArrays> {
    checked_len(coord, 6 * (nx + 1) * (ny + 1))?;
    checked_len(zcorn, 8 * nx * ny * nz)?;
    let actnum = match actnum {
        Some(keyword) => {
            checked_len(keyword, nx * ny * nz)?;
            Some(keyword.values::<i32>()?)
        }
        None => None,
    };
    Ok(SectionArrays {
        coord: coord.to_f64_vec()?,
        zcorn: zcorn.to_f64_vec()?,
        actnum,
    })
}

/// Reads `MAPAXES` from the main grid section; LGRs share the main grid's axes.
fn read_map_axes(view: &BlockView<'_>) -> Result<Option<MapAxes>> {
    match view.load_optional("MAPAXES")? {
        Some(keyword) => MapAxes::from_values(&keyword.to_f64_vec()?),
        None => Ok(None),
    }
}

fn load_section(
    view: &BlockView<'_>,
    name: String,
    default_number: i32,
    map_axes: Option<&MapAxes>,
) -> Result<GridNode> {
    let SectionDims { dims, lgr_number } = read_dims(view)?;
    let coord = view.load("COORD", 0)?;
    let zcorn = view.load("ZCORN", 0)?;
    let actnum = view.load_optional("ACTNUM")?;
    let arrays = section_arrays(dims, &coord, &zcorn, actnum.as_ref())?;
    let number = lgr_number.filter(|n| *n > 0).unwrap_or(default_number);
    let node = GridNode::from_arrays(
        name,
        number,
        dims,
        &arrays.coord,
        &arrays.zcorn,
        arrays.actnum,
        map_axes,
    );
    debug!(
        "Loaded grid '{}' (#{}): {}x{}x{}, {} active",
        node.name(),
        node.lgr_number(),
        dims.0,
        dims.1,
        dims.2,
        node.active_size()
    );
    Ok(node)
}

impl Grid {
    /// Builds the grid described by a scanned grid file, applying `MAPAXES`.
    ///
    /// See [`Grid::build_with`].
    pub fn build(file: &ResFile) -> Result<Self> {
        Self::build_with(file, GridOptions::default())
    }

    /// Builds the grid described by a scanned EGRID or GRID file.
    ///
    /// In an EGRID file the main grid is read from the keywords before the
    /// first `LGR` keyword. Every `LGR` section then adds one refinement,
    /// attached to the grid named by `LGRPARNT` (the main grid when blank or
    /// absent) through its `HOSTNUM` cells. A file with `COORDS` cell
    /// records and no `ZCORN` is read as a GRID file instead. NNC sections
    /// are read last.
    ///
    /// # Arguments
    /// * `file` - A scanned grid file
    /// * `options` - Whether corners are moved to `MAPAXES` map coordinates
    ///
    /// # Errors
    /// Returns an error if:
    /// - [`ResdataError::Format`]: dimensions or geometry keywords are
    ///   missing, or their sizes disagree with the dimensions
    /// - [`ResdataError::InvalidTopology`]: duplicate LGR name or number,
    ///   unknown parent, host cells shared between LGRs or outside their
    ///   parent, NNC endpoints outside their grid
    ///
    /// Nothing is returned on failure; there is no partially built grid.
    pub fn build_with(file: &ResFile, options: GridOptions) -> Result<Self> {
        info!("Building grid from {}", file.path().display());
        let head = file.head_view("LGR");
        let map_axes = read_map_axes(&head)?;
        if let Some(axes) = &map_axes {
            debug!(
                "MAPAXES origin {:?}, applied: {}",
                axes.origin(),
                options.apply_mapaxes
            );
        }
        let transform = map_axes.as_ref().filter(|_| options.apply_mapaxes);

        let mut grid = if file.has("COORDS") && !file.has("ZCORN") {
            legacy::build(file, transform)?
        } else {
            Self::build_egrid(file, &head, transform)?
        };
        grid.map_axes = map_axes;

        let dual_porosity = match file.get("FILEHEAD", 0) {
            Some(entry) if entry.count > FILEHEAD_DUAL_POROSITY => {
                file.read_element::<i32>(entry, FILEHEAD_DUAL_POROSITY)? != 0
            }
            _ => false,
        };
        if dual_porosity {
            debug!("FILEHEAD declares a dual porosity model");
        }
        let nodes = &grid.nodes;
        grid.nnc = nnc::read_pairs(file, |nr| nnc::node_size(nodes, nr), dual_porosity)?;
        info!(
            "Grid built: {}x{}x{}, {} active cells, {} LGRs, {} NNCs",
            grid.main().nx(),
            grid.main().ny(),
            grid.main().nz(),
            grid.main().active_size(),
            grid.num_lgr(),
            grid.nnc.len()
        );
        Ok(grid)
    }

    fn build_egrid(file: &ResFile, head: &BlockView<'_>, map_axes: Option<&MapAxes>) -> Result<Self> {
        let main = load_section(head, MAIN_GRID_NAME.to_string(), 0, map_axes)?;
        let mut grid = Grid::with_main(main);

        for section in 0..file.num_named("LGR") {
            let Some(view) = file.block_view("LGR", section) else {
                continue;
            };
            let name = view.load("LGR", 0)?.iget_string(0)?;
            let parent_name = match view.load_optional("LGRPARNT")? {
                Some(keyword) if !keyword.is_empty() => keyword.iget_string(0)?,
                _ => String::new(),
            };
            let mut node = load_section(&view, name, section as i32 + 1, map_axes)?;
            let hostnum = view.load("HOSTNUM", 0)?;
            checked_len(&hostnum, node.global_size())?;
            node.host_cells = hostnum
                .values::<i32>()?
                .into_iter()
                .map(|h| usize::try_from(h).ok().and_then(|h| h.checked_sub(1)).unwrap_or(usize::MAX))
                .collect();
            grid.install_lgr(node, &parent_name)?;
        }
        Ok(grid)
    }

    /// Builds a single grid without refinements from loose keywords.
    ///
    /// # Arguments
    /// * `dims` - `(nx, ny, nz)`
    /// * `coord` - COORD, `6*(nx+1)*(ny+1)` REAL or DOUB values
    /// * `zcorn` - ZCORN, `8*nx*ny*nz` REAL or DOUB values
    /// * `actnum` - Optional ACTNUM; all cells are active without it
    pub fn from_grdecl(
        dims: (usize, usize, usize),
        coord: &Keyword,
        zcorn: &Keyword,
        actnum: Option<&Keyword>,
    ) -> Result<Self> {
        Self::from_grdecl_mapped(dims, coord, zcorn, actnum, None)
    }

    /// Like [`Grid::from_grdecl`], with corners moved to the map
    /// coordinates of an optional `MAPAXES` keyword.
    pub fn from_grdecl_mapped(
        dims: (usize, usize, usize),
        coord: &Keyword,
        zcorn: &Keyword,
        actnum: Option<&Keyword>,
        mapaxes: Option<&Keyword>,
    ) -> Result<Self> {
        if dims.0 == 0 || dims.1 == 0 || dims.2 == 0 {
            return Err(ResdataError::Format(format!("Grid dimensions must be positive: {:?}", dims)));
        }
        let arrays = section_arrays(dims, coord, zcorn, actnum)?;
        let map_axes = match mapaxes {
            Some(keyword) => MapAxes::from_values(&keyword.to_f64_vec()?)?,
            None => None,
        };
        let main = GridNode::from_arrays(
            MAIN_GRID_NAME.to_string(),
            0,
            dims,
            &arrays.coord,
            &arrays.zcorn,
            arrays.actnum,
            map_axes.as_ref(),
        );
        let mut grid = Grid::with_main(main);
        grid.map_axes = map_axes;
        Ok(grid)
    }

    pub(super) fn install_lgr(&mut self, mut node: GridNode, parent_name: &str) -> Result<LgrId> {
        if self.by_name.contains_key(node.name()) {
            return Err(ResdataError::InvalidTopology(format!(
                "Duplicate LGR name '{}'",
                node.name()
            )));
        }
        if node.lgr_number == 0 || self.by_number.contains_key(&node.lgr_number) {
            return Err(ResdataError::InvalidTopology(format!(
                "Duplicate LGR number {} for '{}'",
                node.lgr_number,
                node.name()
            )));
        }
        let parent = if parent_name.is_empty() || parent_name == MAIN_GRID_NAME {
            LgrId::MAIN
        } else {
            *self.by_name.get(parent_name).ok_or_else(|| {
                ResdataError::InvalidTopology(format!(
                    "LGR '{}' refers to unknown parent '{}'",
                    node.name(),
                    parent_name
                ))
            })?
        };

        let id = LgrId(self.nodes.len());
        let parent_ref = &self.nodes[parent.0];
        for &host in &node.host_cells {
            match parent_ref.lgr_cells.get(host) {
                None => {
                    return Err(ResdataError::InvalidTopology(format!(
                        "LGR '{}' has a host cell outside parent '{}'",
                        node.name(),
                        parent_ref.name()
                    )))
                }
                Some(Some(owner)) => {
                    return Err(ResdataError::InvalidTopology(format!(
                        "LGR '{}' claims host cell {} of '{}', already refined by '{}'",
                        node.name(),
                        host,
                        parent_ref.name(),
                        self.nodes[owner.0].name()
                    )))
                }
                Some(None) => {}
            }
        }
        let parent_node = &mut self.nodes[parent.0];
        for &host in &node.host_cells {
            parent_node.lgr_cells[host] = Some(id);
        }
        parent_node.children.push(id);
        node.parent = Some(parent);

        debug!(
            "Installed LGR '{}' (#{}) under '{}'",
            node.name(),
            node.lgr_number,
            parent_node.name()
        );
        self.by_name.insert(node.name().to_string(), id);
        self.by_number.insert(node.lgr_number, id);
        self.nodes.push(node);
        Ok(id)
    }
}
