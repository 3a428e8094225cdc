mod common;

use common::*;
use resdata_reader::{DataType, Grid, GridOptions, Keyword, LgrId, Point, ResdataError, StreamFormat};

fn build(keywords: &[Keyword]) -> resdata_reader::Result<Grid> {
    let dir = temp_dir();
    let path = write_keywords(dir.path(), "CASE.EGRID", StreamFormat::default(), keywords);
    Grid::build(&scan(&path))
}

fn endlgr() -> Keyword {
    Keyword::new("ENDLGR", DataType::Int, 0).expect("ENDLGR")
}

#[test]
fn inactive_cell_is_skipped_by_active_numbering() {
    init_logger();
    let mut actnum = [1; 8];
    actnum[0] = 0;
    let grid = build(&grid_section((2, 2, 2), 0, (0.0, 0.0), 1.0, Some(&actnum))).expect("build grid");

    assert_eq!(grid.dims(), (2, 2, 2));
    assert_eq!(grid.global_size(), 8);
    assert_eq!(grid.active_size(), 7);
    assert_eq!(grid.active_index(0).expect("cell 0"), None);
    let active: Vec<usize> = (1..8).map(|g| grid.active_index(g).expect("cell").expect("active")).collect();
    assert_eq!(active, (0..7).collect::<Vec<_>>());
    for a in 0..7 {
        let g = grid.global_index_of_active(a).expect("active cell");
        assert_eq!(grid.active_index(g).expect("cell"), Some(a));
    }
    assert!(matches!(
        grid.global_index_of_active(7),
        Err(ResdataError::IndexOutOfRange { index: 7, len: 7, .. })
    ));
}

#[test]
fn global_index_and_ijk_are_inverse() {
    let grid = build(&grid_section((2, 2, 2), 0, (0.0, 0.0), 1.0, None)).expect("build grid");
    assert_eq!(grid.global_index(1, 1, 1).expect("last cell"), 7);
    assert_eq!(grid.global_index(1, 0, 1).expect("cell"), 5);
    for g in 0..8 {
        let (i, j, k) = grid.ijk(g).expect("ijk");
        assert_eq!(grid.global_index(i, j, k).expect("global index"), g);
    }
    assert!(grid.global_index(2, 0, 0).is_err());
    assert!(grid.ijk(8).is_err());
}

#[test]
fn cell_centres_resolve_back_to_their_cells() {
    let grid = build(&grid_section((2, 2, 2), 0, (0.0, 0.0), 1.0, None)).expect("build grid");
    let main = grid.main();
    for g in 0..grid.global_size() {
        let center = grid.cell_center(g).expect("center");
        let (_, _, k) = grid.ijk(g).expect("ijk");
        assert_eq!(
            grid.find_cell_in_layer(k, center.x, center.y, center.z).expect("layer"),
            Some(g),
            "centre of cell {} resolved elsewhere",
            g
        );
        assert_eq!(grid.find_cell(center.x, center.y, center.z), Some(g));
        assert!((main.cell_thickness(g).expect("thickness") - 1.0).abs() < 1e-12);
    }

    let center = grid.cell_center(7).expect("center");
    assert_eq!((center.x, center.y, center.z), (1.5, 1.5, 1.5));
    assert_eq!(grid.find_cell(5.0, 0.5, 0.5), None, "outside the footprint");
    assert_eq!(grid.find_cell(0.5, 0.5, 2.5), None, "below the grid");
    assert_eq!(grid.find_cell_in_layer(1, 0.5, 0.5, 0.5).expect("layer 1"), None, "wrong layer");
    assert!(grid.find_cell_in_layer(2, 0.5, 0.5, 0.5).is_err());
}

#[test]
fn corners_follow_the_pillars() {
    let grid = build(&grid_section((2, 2, 2), 0, (10.0, 20.0), 1.0, None)).expect("build grid");
    let main = grid.main();
    let corner = main.cell_corner(0, 0).expect("corner 0");
    assert_eq!((corner.x, corner.y, corner.z), (10.0, 20.0, 0.0));
    let corner = main.cell_corner(0, 7).expect("corner 7");
    assert_eq!((corner.x, corner.y, corner.z), (11.0, 21.0, 1.0));
    assert!(main.cell_corner(0, 8).is_err());
    assert_eq!(main.cell_depth(4).expect("depth"), 1.5);
}

#[test]
fn geometry_size_mismatch_is_a_format_error() {
    let mut keywords = grid_section((2, 2, 2), 0, (0.0, 0.0), 1.0, None);
    keywords[2] = reals("ZCORN", &[0.0; 10]);
    let err = build(&keywords).expect_err("short ZCORN must fail");
    assert!(err.is_format(), "expected a format error, got {:?}", err);

    let missing = vec![ints("GRIDHEAD", &[1, 2, 2, 2, 0])];
    assert!(build(&missing).expect_err("no COORD").is_format());
}

#[test]
fn dimens_is_a_fallback_for_gridhead() {
    let mut keywords = grid_section((2, 1, 1), 0, (0.0, 0.0), 1.0, None);
    keywords[0] = ints("DIMENS", &[2, 1, 1]);
    let grid = build(&keywords).expect("build from DIMENS");
    assert_eq!(grid.dims(), (2, 1, 1));
}

#[test]
fn lgr_is_found_by_name_and_number() {
    init_logger();
    let grid = build(&lgr_grid_keywords()).expect("build grid with LGR");

    assert_eq!(grid.num_lgr(), 1);
    let by_name = grid.lgr_by_name("LOCAL1").expect("LOCAL1 by name");
    let by_number = grid.lgr_by_number(1).expect("LGR 1 by number");
    assert_eq!(by_name, by_number);
    assert_eq!(by_name.index(), 1);

    let lgr = grid.node(by_name).expect("LGR node");
    assert_eq!(lgr.name(), "LOCAL1");
    assert_eq!(lgr.lgr_number(), 1);
    assert!(!lgr.is_main());
    assert_eq!(lgr.global_size(), 8);
    assert_eq!(grid.parent(by_name).expect("parent"), Some(LgrId::MAIN));
    assert_eq!(grid.children(LgrId::MAIN).expect("children"), &[by_name]);
    assert_eq!(grid.grid_by_number(1).map(|g| g.name()), Some("LOCAL1"));
    assert_eq!(grid.grid_by_number(0).map(|g| g.name()), Some("GLOBAL"));
    assert!(grid.grid_by_number(2).is_none());
    assert!(grid.lgr_by_name("LOCAL2").is_none());

    assert_eq!(lgr.host_cell(5).expect("host"), Some(0));
    assert_eq!(grid.main().lgr_of_cell(0).expect("cell 0"), Some(by_name));
    assert_eq!(grid.main().lgr_of_cell(1).expect("cell 1"), None);
    assert_eq!(grid.host_box(by_name).expect("host box"), Some(((0, 0, 0), (0, 0, 0))));
    assert_eq!(grid.host_box(LgrId::MAIN).expect("main"), None);

    assert_eq!(lgr.find_cell(0.25, 0.25, 0.25), Some(0));
    assert_eq!(lgr.find_cell(0.75, 0.75, 0.75), Some(7));
}

#[test]
fn nested_lgr_links_to_its_named_parent() {
    let mut keywords = lgr_grid_keywords();
    keywords.push(chars("LGR", &["NESTED"]));
    keywords.push(chars("LGRPARNT", &["LOCAL1"]));
    keywords.extend(grid_section((1, 1, 1), 2, (0.0, 0.0), 0.5, None));
    keywords.push(ints("HOSTNUM", &[8]));
    keywords.push(endlgr());
    let grid = build(&keywords).expect("build nested grid");

    let local = grid.lgr_by_name("LOCAL1").expect("LOCAL1");
    let nested = grid.lgr_by_number(2).expect("NESTED");
    assert_eq!(grid.num_lgr(), 2);
    assert_eq!(grid.parent(nested).expect("parent"), Some(local));
    assert_eq!(grid.node(local).expect("LOCAL1").lgr_of_cell(7).expect("cell"), Some(nested));
    let names: Vec<&str> = grid.lgrs().map(|(_, node)| node.name()).collect();
    assert_eq!(names, vec!["LOCAL1", "NESTED"]);
}

#[test]
fn duplicate_lgr_is_invalid_topology() {
    let mut keywords = lgr_grid_keywords();
    keywords.push(chars("LGR", &["LOCAL1"]));
    keywords.extend(grid_section((1, 1, 1), 2, (1.0, 0.0), 1.0, None));
    keywords.push(ints("HOSTNUM", &[2]));
    keywords.push(endlgr());
    assert!(matches!(build(&keywords), Err(ResdataError::InvalidTopology(_))));

    let mut keywords = lgr_grid_keywords();
    keywords.push(chars("LGR", &["OTHER"]));
    keywords.extend(grid_section((1, 1, 1), 1, (1.0, 0.0), 1.0, None));
    keywords.push(ints("HOSTNUM", &[2]));
    keywords.push(endlgr());
    assert!(matches!(build(&keywords), Err(ResdataError::InvalidTopology(_))));
}

#[test]
fn unknown_parent_and_bad_host_cells_are_invalid_topology() {
    let mut keywords = lgr_grid_keywords();
    keywords.push(chars("LGR", &["ORPHAN"]));
    keywords.push(chars("LGRPARNT", &["NOWHERE"]));
    keywords.extend(grid_section((1, 1, 1), 2, (1.0, 0.0), 1.0, None));
    keywords.push(ints("HOSTNUM", &[2]));
    assert!(matches!(build(&keywords), Err(ResdataError::InvalidTopology(_))));

    let mut keywords = lgr_grid_keywords();
    keywords.push(chars("LGR", &["FARAWAY"]));
    keywords.extend(grid_section((1, 1, 1), 2, (1.0, 0.0), 1.0, None));
    keywords.push(ints("HOSTNUM", &[9]));
    assert!(matches!(build(&keywords), Err(ResdataError::InvalidTopology(_))));
}

#[test]
fn lgrs_sharing_a_host_cell_are_invalid_topology() {
    let mut keywords = lgr_grid_keywords();
    keywords.push(chars("LGR", &["LOCAL2"]));
    keywords.extend(grid_section((1, 1, 1), 2, (0.0, 0.0), 0.5, None));
    keywords.push(ints("HOSTNUM", &[1]));
    keywords.push(endlgr());
    match build(&keywords) {
        Err(ResdataError::InvalidTopology(message)) => {
            assert!(message.contains("LOCAL1"), "message names the first owner: {}", message)
        }
        other => panic!("expected InvalidTopology, got {:?}", other.map(|g| g.num_lgr())),
    }

    // A neighbouring host cell is fine.
    let mut keywords = lgr_grid_keywords();
    keywords.push(chars("LGR", &["LOCAL2"]));
    keywords.extend(grid_section((1, 1, 1), 2, (1.0, 0.0), 1.0, None));
    keywords.push(ints("HOSTNUM", &[2]));
    keywords.push(endlgr());
    let grid = build(&keywords).expect("disjoint hosts");
    let local2 = grid.lgr_by_name("LOCAL2").expect("LOCAL2");
    assert_eq!(grid.main().lgr_of_cell(1).expect("host cell"), Some(local2));
    assert_eq!(grid.node(local2).expect("LOCAL2").host_cell(0).expect("host"), Some(1));
}

fn nnc_keywords() -> Vec<Keyword> {
    let mut keywords = lgr_grid_keywords();
    keywords.push(ints("NNCHEAD", &[2, 0]));
    keywords.push(ints("NNC1", &[2, 1]));
    keywords.push(ints("NNC2", &[8, 3]));
    keywords.push(ints("NNCHEAD", &[1, 1]));
    keywords.push(ints("NNCG", &[2]));
    keywords.push(ints("NNCL", &[1]));
    keywords
}

#[test]
fn nnc_pairs_are_sorted_and_zero_based() {
    let grid = build(&nnc_keywords()).expect("build grid with NNCs");
    let pairs: Vec<(i32, usize, i32, usize, usize)> = grid
        .nnc_pairs()
        .iter()
        .map(|p| (p.grid_nr1, p.global_index1, p.grid_nr2, p.global_index2, p.input_index))
        .collect();
    assert_eq!(pairs, vec![(0, 0, 0, 2, 1), (0, 1, 0, 7, 0), (0, 1, 1, 0, 0)]);

    let [first, second, third] = grid.nnc_pairs() else {
        panic!("expected three pairs");
    };
    assert!(first.same_kw(second));
    assert!(!first.same_kw(third));
    assert_eq!(grid.nnc_for_cell(0, 1).count(), 2);
    assert_eq!(grid.nnc_for_cell(1, 0).count(), 1);
}

#[test]
fn same_kw_is_ordered() {
    let pair = |grid_nr1, grid_nr2| resdata_reader::NncPair {
        grid_nr1,
        global_index1: 0,
        grid_nr2,
        global_index2: 0,
        input_index: 0,
    };
    assert!(pair(1, 3).same_kw(&pair(1, 3)));
    assert!(!pair(1, 3).same_kw(&pair(3, 1)));
}

#[test]
fn nnc_endpoint_outside_grid_is_invalid_topology() {
    let mut keywords = nnc_keywords();
    keywords.push(ints("NNCHEAD", &[1, 0]));
    keywords.push(ints("NNC1", &[1]));
    keywords.push(ints("NNC2", &[9]));
    assert!(matches!(build(&keywords), Err(ResdataError::InvalidTopology(_))));

    let mut keywords = lgr_grid_keywords();
    keywords.push(ints("NNCHEADA", &[1, 7]));
    keywords.push(ints("NNA1", &[1]));
    keywords.push(ints("NNA2", &[1]));
    assert!(matches!(build(&keywords), Err(ResdataError::InvalidTopology(_))));
}

#[test]
fn dual_porosity_fracture_connections_are_skipped() {
    let mut keywords = lgr_grid_keywords();
    keywords[0] = ints("FILEHEAD", &[3, 2007, 0, 0, 0, 1, 1]);
    keywords.push(ints("NNCHEAD", &[2, 0]));
    keywords.push(ints("NNC1", &[1, 2]));
    keywords.push(ints("NNC2", &[9, 3]));
    let grid = build(&keywords).expect("dual porosity grid");
    assert_eq!(grid.nnc_pairs().len(), 1, "the matrix-fracture pair is dropped");
    assert_eq!(grid.nnc_pairs()[0].global_index1, 1);
    assert_eq!(grid.nnc_pairs()[0].global_index2, 2);
    assert_eq!(grid.nnc_pairs()[0].input_index, 1);
}

#[test]
fn nnc_length_mismatch_is_a_format_error() {
    let mut keywords = lgr_grid_keywords();
    keywords.push(ints("NNCHEAD", &[2, 0]));
    keywords.push(ints("NNC1", &[1, 2]));
    keywords.push(ints("NNC2", &[3]));
    assert!(build(&keywords).expect_err("mismatched NNC arrays").is_format());
}

#[test]
fn grid_from_loose_keywords() {
    let coord = reals("COORD", &box_coord(1, 1, (0.0, 0.0), 2.0, 0.0, 2.0));
    let zcorn = reals("ZCORN", &layered_zcorn(1, 1, 1, 0.0, 2.0));
    let grid = Grid::from_grdecl((1, 1, 1), &coord, &zcorn, None).expect("grdecl grid");
    assert_eq!(grid.active_size(), 1);
    assert_eq!(grid.find_cell(1.0, 1.0, 1.0), Some(0));
    assert!(Grid::from_grdecl((2, 1, 1), &coord, &zcorn, None).is_err());
}

const SHIFTED_AXES: [f32; 6] = [100.0, 201.0, 100.0, 200.0, 101.0, 200.0];

fn mapped_lgr_keywords() -> Vec<Keyword> {
    let mut keywords = lgr_grid_keywords();
    keywords.insert(1, reals("MAPAXES", &SHIFTED_AXES));
    keywords
}

#[test]
fn mapaxes_moves_corners_and_centres_to_map_coordinates() {
    let grid = build(&mapped_lgr_keywords()).expect("mapped grid");
    let axes = grid.map_axes().expect("MAPAXES is read");
    assert_eq!(axes.origin(), (100.0, 200.0));

    assert_eq!(grid.cell_center(0).expect("centre"), Point::new(100.5, 200.5, 0.5));
    assert_eq!(grid.main().cell_corner(7, 7).expect("corner"), Point::new(102.0, 202.0, 2.0));
    assert_eq!(grid.find_cell(100.5, 200.5, 0.5), Some(0));
    assert_eq!(grid.find_cell(0.5, 0.5, 0.5), None, "grid coordinates are no longer inside");

    let local = grid.lgr_by_name("LOCAL1").expect("LOCAL1");
    let centre = grid.node(local).expect("LOCAL1").cell_center(0).expect("LGR centre");
    assert_eq!(centre, Point::new(100.25, 200.25, 0.25), "refinements share the main grid axes");
}

#[test]
fn mapaxes_can_be_left_unapplied() {
    let dir = temp_dir();
    let path = write_keywords(dir.path(), "CASE.EGRID", StreamFormat::default(), &mapped_lgr_keywords());
    let options = GridOptions::default().with_apply_mapaxes(false);
    let grid = Grid::build_with(&scan(&path), options).expect("unmapped grid");

    let centre = grid.cell_center(0).expect("centre");
    assert_eq!(centre, Point::new(0.5, 0.5, 0.5));
    let axes = grid.map_axes().expect("axes are still reported");
    assert_eq!(axes.to_map(centre), Point::new(100.5, 200.5, 0.5));
    assert_eq!(axes.to_grid(Point::new(100.5, 200.5, 0.5)), centre);
}

#[test]
fn loose_keywords_accept_mapaxes() {
    let coord = reals("COORD", &box_coord(1, 1, (0.0, 0.0), 2.0, 0.0, 2.0));
    let zcorn = reals("ZCORN", &layered_zcorn(1, 1, 1, 0.0, 2.0));
    let mapaxes = reals("MAPAXES", &SHIFTED_AXES);
    let grid = Grid::from_grdecl_mapped((1, 1, 1), &coord, &zcorn, None, Some(&mapaxes)).expect("grdecl grid");
    assert_eq!(grid.cell_center(0).expect("centre"), Point::new(101.0, 201.0, 1.0));

    let degenerate = reals("MAPAXES", &[0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    let grid = Grid::from_grdecl_mapped((1, 1, 1), &coord, &zcorn, None, Some(&degenerate)).expect("grdecl grid");
    assert!(grid.map_axes().is_none());
    assert_eq!(grid.cell_center(0).expect("centre"), Point::new(1.0, 1.0, 1.0));
}

/// The 24 `CORNERS` values of an axis aligned box.
fn box_corners((x0, y0, z0): (f32, f32, f32), (dx, dy, dz): (f32, f32, f32)) -> Vec<f32> {
    (0..8)
        .flat_map(|c| {
            [
                x0 + dx * (c % 2) as f32,
                y0 + dy * ((c % 4) / 2) as f32,
                z0 + dz * (c / 4) as f32,
            ]
        })
        .collect()
}

fn cell_record(coords: &[i32], corners: Vec<f32>) -> [Keyword; 2] {
    [ints("COORDS", coords), reals("CORNERS", &corners)]
}

/// A 2x1x1 main grid of unit cells whose second cell hosts `LOCAL`, a
/// 1x1x2 refinement.
fn grid_file_keywords(lgr_coords_len: usize) -> Vec<Keyword> {
    let mut keywords = vec![ints("DIMENS", &[2, 1, 1])];
    keywords.extend(cell_record(&[1, 1, 1, 1, 1, 0, 0], box_corners((0.0, 0.0, 0.0), (1.0, 1.0, 1.0))));
    keywords.extend(cell_record(&[2, 1, 1, 2, 1, 0, 0], box_corners((1.0, 0.0, 0.0), (1.0, 1.0, 1.0))));
    keywords.push(chars("LGR", &["LOCAL"]));
    keywords.push(ints("DIMENS", &[1, 1, 2]));
    for k in 0..2 {
        let coords = [1, 1, k + 1, k + 1, 1, 2, 0];
        let corners = box_corners((1.0, 0.0, 0.5 * k as f32), (1.0, 1.0, 0.5));
        keywords.extend(cell_record(&coords[..lgr_coords_len], corners));
    }
    keywords
}

#[test]
fn grid_file_cells_and_refinements() {
    init_logger();
    let grid = build(&grid_file_keywords(7)).expect("GRID layout");
    assert_eq!(grid.dims(), (2, 1, 1));
    assert_eq!(grid.active_size(), 2);
    assert_eq!(grid.cell_center(1).expect("centre"), Point::new(1.5, 0.5, 0.5));

    let local = grid.lgr_by_name("LOCAL").expect("LOCAL");
    assert_eq!(grid.lgr_by_number(1), Some(local));
    assert_eq!(grid.main().lgr_of_cell(1).expect("host"), Some(local));
    assert_eq!(grid.main().lgr_of_cell(0).expect("plain cell"), None);

    let node = grid.node(local).expect("LOCAL");
    assert_eq!(node.dims(), (1, 1, 2));
    assert_eq!(node.host_cell(1).expect("host cell"), Some(1));
    assert_eq!(node.cell_center(1).expect("lower cell"), Point::new(1.5, 0.5, 0.75));
    assert_eq!(node.cell_thickness(0).expect("thickness"), 0.5);
}

#[test]
fn grid_file_with_active_cells_only() {
    let mut keywords = vec![ints("DIMENS", &[2, 1, 1]), reals("MAPAXES", &SHIFTED_AXES)];
    keywords.extend(cell_record(&[2, 1, 1, 2, 1], box_corners((1.0, 0.0, 0.0), (1.0, 1.0, 1.0))));
    let grid = build(&keywords).expect("active cells only");
    assert_eq!(grid.active_size(), 1);
    assert_eq!(grid.active_index(0).expect("unlisted cell"), None);
    assert_eq!(grid.global_index_of_active(0).expect("listed cell"), 1);
    assert_eq!(grid.cell_center(1).expect("centre"), Point::new(101.5, 200.5, 0.5));
}

#[test]
fn grid_file_refinements_need_host_cells() {
    let err = build(&grid_file_keywords(5)).expect_err("LGR cells without host");
    assert!(err.is_format(), "got {:?}", err);

    let mut keywords = grid_file_keywords(7);
    keywords.pop();
    let err = build(&keywords).expect_err("CORNERS record missing");
    assert!(err.is_format(), "got {:?}", err);

    let mut keywords = vec![ints("DIMENS", &[1, 1, 1])];
    keywords.extend(cell_record(&[2, 1, 1, 1], box_corners((0.0, 0.0, 0.0), (1.0, 1.0, 1.0))));
    let err = build(&keywords).expect_err("cell outside the grid");
    assert!(err.is_format(), "got {:?}", err);
}
