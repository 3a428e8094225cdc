//! Summary variable descriptors and their lookup keys.
//!
//! Every variable of a summary catalog is classified from its keyword
//! name. The class decides which of the entity fields (well or group
//! name, `NUMS` value, LGR name and cell) take part in the lookup keys:
//!
//! | class            | primary key          | secondary key   |
//! |------------------|----------------------|-----------------|
//! | field, misc      | `KW`                 |                 |
//! | well, group      | `KW:WG`              |                 |
//! | network          | `KW:WG`              |                 |
//! | region, aquifer  | `KW:NUM`             |                 |
//! | region to region | `KW:R1-R2`           | `KW:NUM`        |
//! | block            | `KW:I,J,K`           | `KW:NUM`        |
//! | completion       | `KW:WG:I,J,K`        | `KW:WG:NUM`     |
//! | segment          | `KW:WG:NUM`          |                 |
//! | local well       | `KW:LGR:WG`          |                 |
//! | local block      | `KW:LGR:I,J,K`       |                 |
//! | local completion | `KW:LGR:WG:I,J,K`    |                 |

use std::fmt;

/// Well name used for variables that do not belong to a real well or group.
pub const DUMMY_WELL: &str = ":+:+:+:+";

/// Keywords that do not follow the first-letter naming rules.
const SPECIAL_MISC: &[&str] = &[
    "NAIMFRAC", "NBAKFL", "NBYTOT", "NCPRLINS", "NEWTFL", "NEWTON", "NLINEARP", "NLINEARS",
    "NLINSMAX", "NLINSMIN", "NLRESMAX", "NLRESSUM", "NMESSAGE", "NNUMFL", "NNUMST", "NTS",
    "NTSECL", "NTSMCL", "NTSPCL", "ELAPSED", "MAXDPR", "MAXDSO", "MAXDSG", "MAXDSW", "STEPTYPE",
    "WNEWTON",
];

const RATE_KEYWORDS: &[&str] = &[
    "OPR", "OIR", "OVPR", "OVIR", "OFR", "OPP", "OPI", "OMR", "GPR", "GIR", "GVPR", "GVIR", "GFR",
    "GPP", "GPI", "GMR", "WGPR", "WGIR", "WPR", "WIR", "WVPR", "WVIR", "WFR", "WPP", "WPI", "WMR",
    "LPR", "LFR", "VPR", "VIR", "VFR", "GLIR", "RGR", "EGR", "EXGR", "SGR", "GSR", "FGR", "GIMR",
    "GCR", "NPR", "NIR", "CPR", "CIR", "SIR", "SPR", "TIR", "TPR", "GOR", "WCT", "OGR", "WGR",
    "GLR",
];

const SEGMENT_RATE_KEYWORDS: &[&str] = &[
    "OFR", "GFR", "WFR", "CFR", "SFR", "TFR", "CVPR", "WCT", "GOR", "OGR", "WGR",
];

const TOTAL_KEYWORDS: &[&str] = &[
    "OPT", "OIT", "OVPT", "OVIT", "OMT", "GPT", "GIT", "GVPT", "GVIT", "GMT", "WGPT", "WGIT", "WPT",
    "WIT", "WVPT", "WVIT", "WMT", "LPT", "VPT", "VIT", "RGT", "EGT", "EXGT", "SGT", "GST", "FGT",
    "GIMT", "GCT", "NPT", "NIT", "CPT", "CIT", "SIT", "SPT", "TIT", "TPT",
];

const SEGMENT_TOTAL_KEYWORDS: &[&str] = &["OFT", "GFT", "WFT"];

/// Encoding base of region-to-region `NUMS` values.
const REGION_PAIR_BASE: i32 = 32768;

/// Category of a summary variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    Aquifer,
    Block,
    Completion,
    Field,
    Group,
    LocalBlock,
    LocalCompletion,
    LocalWell,
    Misc,
    Network,
    Region,
    RegionToRegion,
    Segment,
    Well,
}

impl VarType {
    /// Classifies a keyword by its name.
    ///
    /// Combined keys such as `WWCT:OP_1` classify like their keyword part.
    pub fn classify(keyword: &str) -> Self {
        let keyword = keyword.split(':').next().unwrap_or(keyword);
        if SPECIAL_MISC.contains(&keyword) {
            return VarType::Misc;
        }
        let bytes = keyword.as_bytes();
        match bytes.first() {
            Some(b'A') => VarType::Aquifer,
            Some(b'B') => VarType::Block,
            Some(b'C') => VarType::Completion,
            Some(b'F') => VarType::Field,
            Some(b'G') => VarType::Group,
            Some(b'L') => match bytes.get(1) {
                Some(b'B') => VarType::LocalBlock,
                Some(b'C') => VarType::LocalCompletion,
                Some(b'W') => VarType::LocalWell,
                _ => VarType::Misc,
            },
            Some(b'N') => VarType::Network,
            Some(b'R') => classify_region(bytes),
            Some(b'S') => VarType::Segment,
            Some(b'W') => VarType::Well,
            _ => VarType::Misc,
        }
    }

    /// Whether variables of this class are tied to a well or group name.
    pub fn has_wgname(self) -> bool {
        matches!(
            self,
            VarType::Well
                | VarType::Group
                | VarType::Completion
                | VarType::Segment
                | VarType::Network
                | VarType::LocalWell
                | VarType::LocalCompletion
        )
    }

    pub fn is_local(self) -> bool {
        matches!(
            self,
            VarType::LocalBlock | VarType::LocalCompletion | VarType::LocalWell
        )
    }
}

/// Region keywords are region-to-region flows when `FT` or `FR` follows
/// the first one or two characters, with a few historical exceptions.
fn classify_region(bytes: &[u8]) -> VarType {
    if bytes.len() == 3 && bytes[2] == b'F' {
        return VarType::RegionToRegion;
    }
    match bytes {
        b"RNLF" => return VarType::RegionToRegion,
        b"RORFR" => return VarType::Region,
        _ => {}
    }
    let flow_at = |offset: usize| {
        bytes.len() > offset + 1
            && bytes[offset] == b'F'
            && matches!(bytes[offset + 1], b'T' | b'R')
    };
    if flow_at(2) || flow_at(3) {
        VarType::RegionToRegion
    } else {
        VarType::Region
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VarType::Aquifer => "aquifer",
            VarType::Block => "block",
            VarType::Completion => "completion",
            VarType::Field => "field",
            VarType::Group => "group",
            VarType::LocalBlock => "local block",
            VarType::LocalCompletion => "local completion",
            VarType::LocalWell => "local well",
            VarType::Misc => "misc",
            VarType::Network => "network",
            VarType::Region => "region",
            VarType::RegionToRegion => "region to region",
            VarType::Segment => "segment",
            VarType::Well => "well",
        };
        f.write_str(name)
    }
}

/// Options for summary key generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Separator placed between the parts of a key.
    pub key_join: String,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            key_join: ":".to_string(),
        }
    }
}

impl SummaryOptions {
    pub fn with_key_join(mut self, key_join: &str) -> Self {
        self.key_join = key_join.to_string();
        self
    }
}

/// Raw per-variable metadata as read from the catalog keywords.
#[derive(Debug, Clone, Default)]
pub(super) struct RawVariable {
    pub keyword: String,
    pub wgname: String,
    pub num: i32,
    pub unit: String,
    pub lgr: Option<String>,
    pub lgr_ijk: Option<(i32, i32, i32)>,
}

/// One variable of a summary catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryNode {
    position: usize,
    var_type: VarType,
    keyword: String,
    wgname: Option<String>,
    num: i32,
    unit: String,
    lgr: Option<String>,
    ijk: Option<(i32, i32, i32)>,
    key: Option<String>,
    alt_key: Option<String>,
    rate: bool,
    total: bool,
    historical: bool,
}

impl SummaryNode {
    /// Builds the descriptor of the variable at `position`.
    ///
    /// `dims` are the grid dimensions used to decode block and completion
    /// `NUMS` values into cells.
    pub(super) fn new(position: usize, raw: RawVariable, dims: (i32, i32, i32), options: &SummaryOptions) -> Self {
        let var_type = VarType::classify(&raw.keyword);
        let wgname = Some(raw.wgname.trim().to_string()).filter(|name| !name.is_empty());
        let ijk = match var_type {
            VarType::Block | VarType::Completion => decode_ijk(raw.num, dims),
            VarType::LocalBlock | VarType::LocalCompletion => raw.lgr_ijk,
            _ => None,
        };
        let mut node = Self {
            position,
            var_type,
            rate: is_rate(&raw.keyword, var_type),
            total: is_total(&raw.keyword, var_type),
            historical: raw.keyword.ends_with('H')
                && matches!(var_type, VarType::Well | VarType::Group | VarType::Field),
            keyword: raw.keyword,
            wgname,
            num: raw.num,
            unit: raw.unit.trim().to_string(),
            lgr: raw.lgr.map(|lgr| lgr.trim().to_string()).filter(|lgr| !lgr.is_empty()),
            ijk,
            key: None,
            alt_key: None,
        };
        if node.is_valid() {
            let (key, alt_key) = node.gen_keys(&options.key_join);
            node.key = key;
            node.alt_key = alt_key;
        }
        node
    }

    /// Offset of this variable in every ministep array.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn var_type(&self) -> VarType {
        self.var_type
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Well, group or network node name, `None` when blank.
    pub fn wgname(&self) -> Option<&str> {
        self.wgname.as_deref()
    }

    /// The raw `NUMS` value.
    pub fn num(&self) -> i32 {
        self.num
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// LGR name of local variables.
    pub fn lgr(&self) -> Option<&str> {
        self.lgr.as_deref()
    }

    /// One based cell of block, completion and local variables.
    pub fn ijk(&self) -> Option<(i32, i32, i32)> {
        self.ijk
    }

    /// Primary lookup key; `None` for variables that cannot be looked up.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Secondary lookup key for block, completion and region-to-region variables.
    pub fn alt_key(&self) -> Option<&str> {
        self.alt_key.as_deref()
    }

    pub fn is_rate(&self) -> bool {
        self.rate
    }

    pub fn is_total(&self) -> bool {
        self.total
    }

    pub fn is_historical(&self) -> bool {
        self.historical
    }

    /// Region pair `(r1, r2)` of a region-to-region variable.
    pub fn region_pair(&self) -> Option<(i32, i32)> {
        (self.var_type == VarType::RegionToRegion).then(|| {
            let r1 = self.num % REGION_PAIR_BASE;
            let r2 = (self.num - r1) / REGION_PAIR_BASE - 10;
            (r1, r2)
        })
    }

    /// Whether the entity fields identify a real variable. Invalid
    /// variables keep their position but get no key.
    fn is_valid(&self) -> bool {
        let named = || {
            self.wgname
                .as_deref()
                .is_some_and(|name| name != DUMMY_WELL)
        };
        match self.var_type {
            VarType::Misc | VarType::Field | VarType::LocalBlock | VarType::Network => true,
            VarType::Well | VarType::Group | VarType::LocalWell | VarType::LocalCompletion => named(),
            VarType::Completion | VarType::Segment => named() && self.num >= 0,
            VarType::Region | VarType::RegionToRegion | VarType::Block | VarType::Aquifer => {
                self.num >= 0
            }
        }
    }

    fn gen_keys(&self, join: &str) -> (Option<String>, Option<String>) {
        let kw = self.keyword.as_str();
        let wg = self.wgname.as_deref().unwrap_or_default();
        let lgr = self.lgr.as_deref().unwrap_or_default();
        let num = self.num;
        let cell = |ijk: Option<(i32, i32, i32)>| ijk.map(|(i, j, k)| format!("{},{},{}", i, j, k));
        let join_all = |parts: &[&str]| parts.join(join);

        match self.var_type {
            VarType::Field | VarType::Misc => (Some(kw.to_string()), None),
            VarType::Well | VarType::Group | VarType::Network => (Some(join_all(&[kw, wg])), None),
            VarType::Region | VarType::Aquifer => (Some(join_all(&[kw, &num.to_string()])), None),
            VarType::Segment => (Some(join_all(&[kw, wg, &num.to_string()])), None),
            VarType::RegionToRegion => {
                let pair = self
                    .region_pair()
                    .map(|(r1, r2)| join_all(&[kw, &format!("{}-{}", r1, r2)]));
                (pair, Some(join_all(&[kw, &num.to_string()])))
            }
            VarType::Block => (
                cell(self.ijk).map(|ijk| join_all(&[kw, &ijk])),
                Some(join_all(&[kw, &num.to_string()])),
            ),
            VarType::Completion => (
                cell(self.ijk).map(|ijk| join_all(&[kw, wg, &ijk])),
                Some(join_all(&[kw, wg, &num.to_string()])),
            ),
            VarType::LocalWell => (Some(join_all(&[kw, lgr, wg])), None),
            VarType::LocalBlock => (cell(self.ijk).map(|ijk| join_all(&[kw, lgr, &ijk])), None),
            VarType::LocalCompletion => (
                cell(self.ijk).map(|ijk| join_all(&[kw, lgr, wg, &ijk])),
                None,
            ),
        }
    }
}

/// One based `(i, j, k)` of the cell with one based global index `num`.
fn decode_ijk(num: i32, (nx, ny, nz): (i32, i32, i32)) -> Option<(i32, i32, i32)> {
    if num <= 0 || nx <= 0 || ny <= 0 {
        return None;
    }
    // Large grids overflow i32 in the layer and grid sizes.
    let (nx, layer) = (i64::from(nx), i64::from(nx) * i64::from(ny));
    let g = i64::from(num) - 1;
    if g >= layer * i64::from(nz.max(1)) {
        return None;
    }
    let rest = g % layer;
    let ijk = (rest % nx + 1, rest / nx + 1, g / layer + 1);
    Some((
        i32::try_from(ijk.0).ok()?,
        i32::try_from(ijk.1).ok()?,
        i32::try_from(ijk.2).ok()?,
    ))
}

fn matches_at(keyword: &str, offset: usize, table: &[&str]) -> bool {
    keyword
        .get(offset..)
        .is_some_and(|tail| table.iter().any(|entry| tail.starts_with(entry)))
}

/// Whether `keyword` names a rate. The class letter (two letters for
/// local and network variables) is skipped before matching.
fn is_rate(keyword: &str, var_type: VarType) -> bool {
    match var_type {
        VarType::LocalWell | VarType::LocalCompletion | VarType::Network => {
            matches_at(keyword, 2, RATE_KEYWORDS)
        }
        VarType::Well | VarType::Group | VarType::Field | VarType::Region | VarType::Completion => {
            matches_at(keyword, 1, RATE_KEYWORDS)
        }
        VarType::Segment => matches_at(keyword, 1, SEGMENT_RATE_KEYWORDS),
        VarType::RegionToRegion => matches_at(keyword, 2, &["FR"]) || matches_at(keyword, 3, &["FR"]),
        _ => false,
    }
}

fn is_total(keyword: &str, var_type: VarType) -> bool {
    match var_type {
        VarType::LocalWell | VarType::LocalCompletion => matches_at(keyword, 2, TOTAL_KEYWORDS),
        VarType::Well | VarType::Group | VarType::Field | VarType::Region | VarType::Completion => {
            matches_at(keyword, 1, TOTAL_KEYWORDS)
        }
        VarType::Segment => matches_at(keyword, 1, SEGMENT_TOTAL_KEYWORDS),
        VarType::RegionToRegion => matches_at(keyword, 2, &["FT"]) || matches_at(keyword, 3, &["FT"]),
        _ => false,
    }
}
