#![allow(dead_code)]

use std::path::{Path, PathBuf};

use resdata_reader::resdata::grid::geometry::zcorn_index;
use resdata_reader::{Keyword, ResFile, ResWriter, StreamFormat};
use tempfile::TempDir;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

/// Writes `keywords` to `dir/name` and returns the path.
pub fn write_keywords(dir: &Path, name: &str, format: StreamFormat, keywords: &[Keyword]) -> PathBuf {
    let path = dir.join(name);
    let mut writer = ResWriter::create(&path, format).expect("create writer");
    writer.write_all(keywords).expect("write keywords");
    writer.finish().expect("flush writer");
    path
}

pub fn scan(path: &Path) -> ResFile {
    ResFile::scan_path(path).unwrap_or_else(|e| panic!("failed to scan {}: {}", path.display(), e))
}

pub fn ints(name: &str, values: &[i32]) -> Keyword {
    Keyword::from_values(name, values).expect("INTE keyword")
}

pub fn reals(name: &str, values: &[f32]) -> Keyword {
    Keyword::from_values(name, values).expect("REAL keyword")
}

pub fn chars(name: &str, values: &[&str]) -> Keyword {
    Keyword::from_strings(name, values).expect("CHAR keyword")
}

/// COORD of a box of `nx*ny` unit columns starting at `(x0, y0)`, with
/// pillars running from depth `top` to `bottom`.
pub fn box_coord(nx: usize, ny: usize, (x0, y0): (f32, f32), size: f32, top: f32, bottom: f32) -> Vec<f32> {
    let mut coord = Vec::with_capacity(6 * (nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            let x = x0 + size * i as f32;
            let y = y0 + size * j as f32;
            coord.extend_from_slice(&[x, y, top, x, y, bottom]);
        }
    }
    coord
}

/// ZCORN of flat layers of thickness `dz` starting at depth `top`.
pub fn layered_zcorn(nx: usize, ny: usize, nz: usize, top: f32, dz: f32) -> Vec<f32> {
    let mut zcorn = vec![0.0; 8 * nx * ny * nz];
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                for c in 0..8 {
                    let layer = k + usize::from(c >= 4);
                    zcorn[zcorn_index(nx, ny, i, j, k, c)] = top + dz * layer as f32;
                }
            }
        }
    }
    zcorn
}

/// The keywords of one unit-cell grid section.
pub fn grid_section(
    (nx, ny, nz): (usize, usize, usize),
    lgr_number: i32,
    origin: (f32, f32),
    size: f32,
    actnum: Option<&[i32]>,
) -> Vec<Keyword> {
    let depth = size * nz as f32;
    let mut keywords = vec![
        ints("GRIDHEAD", &[1, nx as i32, ny as i32, nz as i32, lgr_number]),
        reals("COORD", &box_coord(nx, ny, origin, size, 0.0, depth)),
        reals("ZCORN", &layered_zcorn(nx, ny, nz, 0.0, size)),
    ];
    if let Some(actnum) = actnum {
        keywords.push(ints("ACTNUM", actnum));
    }
    keywords.push(Keyword::new("ENDGRID", resdata_reader::DataType::Int, 0).expect("ENDGRID"));
    keywords
}

/// A 2x2x2 main grid of unit cells followed by `LOCAL1`, a 2x2x2
/// refinement of main cell `(0, 0, 0)`.
pub fn lgr_grid_keywords() -> Vec<Keyword> {
    let mut keywords = vec![ints("FILEHEAD", &[3, 2007, 0, 0, 0, 0, 1])];
    keywords.extend(grid_section((2, 2, 2), 0, (0.0, 0.0), 1.0, None));
    keywords.push(chars("LGR", &["LOCAL1"]));
    keywords.push(chars("LGRPARNT", &[""]));
    keywords.extend(grid_section((2, 2, 2), 1, (0.0, 0.0), 0.5, None));
    keywords.push(ints("HOSTNUM", &[1; 8]));
    keywords.push(Keyword::new("ENDLGR", resdata_reader::DataType::Int, 0).expect("ENDLGR"));
    keywords
}
