//! Summary catalog: the per-variable metadata of an SMSPEC-style file.

use std::collections::HashMap;

use log::{debug, info, warn};
use regex::Regex;
use time::{Date, Month, PrimitiveDateTime, Time};

use super::node::{RawVariable, SummaryNode, SummaryOptions, VarType};
use crate::resdata::reader::ResFile;
use crate::resdata::types::error::{ResdataError, Result};
use crate::resdata::types::keyword::Keyword;

/// `NUMS` value assumed when the catalog has no `NUMS` keyword.
const NUMS_INVALID: i32 = -1;

/// Ordered catalog of summary variables.
///
/// Positions are `0..len()` in the order of the catalog keywords; every
/// ministep array of the matching data files is indexed by them.
#[derive(Debug, Clone)]
pub struct SummaryIndex {
    nodes: Vec<SummaryNode>,
    keys: HashMap<String, usize>,
    dims: (i32, i32, i32),
    restart_step: Option<i32>,
    restart_case: Option<String>,
    start: PrimitiveDateTime,
    options: SummaryOptions,
    time_position: Option<usize>,
    time_in_hours: bool,
    date_positions: Option<[usize; 3]>,
}

fn load_required(file: &ResFile, name: &str) -> Result<Keyword> {
    file.load_named(name, 0)
        .map_err(|e| match e {
            ResdataError::Io(_) => e,
            _ => ResdataError::Format(format!("Summary catalog has no {} keyword", name)),
        })
}

fn load_optional(file: &ResFile, name: &str) -> Result<Option<Keyword>> {
    if file.has(name) {
        file.load_named(name, 0).map(Some)
    } else {
        Ok(None)
    }
}

/// Checks that a per-variable keyword has one element per variable.
fn check_parallel(keyword: &Keyword, n: usize) -> Result<()> {
    if keyword.len() != n {
        return Err(ResdataError::Format(format!(
            "Summary keyword {} has {} elements, KEYWORDS has {}",
            keyword.name(),
            keyword.len(),
            n
        )));
    }
    Ok(())
}

/// Decodes `STARTDAT`: day, month, year and optionally hour, minute and
/// microseconds.
fn parse_start_date(values: &[i32]) -> Result<PrimitiveDateTime> {
    let invalid = || ResdataError::Format(format!("Invalid STARTDAT {:?}", values));
    let (day, month, year) = match values {
        [day, month, year, ..] => (*day, *month, *year),
        _ => return Err(invalid()),
    };
    let month = u8::try_from(month).ok().and_then(|m| Month::try_from(m).ok()).ok_or_else(invalid)?;
    let day = u8::try_from(day).map_err(|_| invalid())?;
    let date = Date::from_calendar_date(year, month, day).map_err(|_| invalid())?;

    let time = match values {
        [_, _, _, hour, minute, micros, ..] => {
            let hour = u8::try_from(*hour).map_err(|_| invalid())?;
            let minute = u8::try_from(*minute).map_err(|_| invalid())?;
            let micros = u32::try_from(*micros).map_err(|_| invalid())?;
            let second = u8::try_from(micros / 1_000_000).map_err(|_| invalid())?;
            Time::from_hms_micro(hour, minute, second, micros % 1_000_000).map_err(|_| invalid())?
        }
        _ => Time::MIDNIGHT,
    };
    Ok(PrimitiveDateTime::new(date, time))
}

/// Compiles a `*`/`?` wildcard pattern into an anchored regex.
fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    for c in pattern.chars() {
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            c => source.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }
    source.push('$');
    Regex::new(&source).map_err(|e| ResdataError::Format(format!("Invalid key pattern '{}': {}", pattern, e)))
}

impl SummaryIndex {
    /// Builds the catalog of a scanned SMSPEC-style file with `:` as key separator.
    pub fn build(file: &ResFile) -> Result<Self> {
        Self::build_with(file, SummaryOptions::default())
    }

    /// Builds the catalog of a scanned SMSPEC-style file.
    ///
    /// # Arguments
    /// * `file` - The scanned catalog file
    /// * `options` - Key generation options
    ///
    /// # Errors
    /// Returns [`ResdataError::Format`] if a required keyword (`KEYWORDS`,
    /// `WGNAMES` or `NAMES`, `UNITS`, `DIMENS`, `STARTDAT`) is missing, or if
    /// the per-variable keywords disagree in length.
    pub fn build_with(file: &ResFile, options: SummaryOptions) -> Result<Self> {
        info!("Building summary catalog from {}", file.path().display());
        let keywords = load_required(file, "KEYWORDS")?.strings()?;
        let n = keywords.len();

        let names_kw = if file.has("WGNAMES") {
            load_required(file, "WGNAMES")?
        } else {
            load_required(file, "NAMES")?
        };
        check_parallel(&names_kw, n)?;
        let wgnames = names_kw.strings()?;

        let units_kw = load_required(file, "UNITS")?;
        check_parallel(&units_kw, n)?;
        let units = units_kw.strings()?;

        let nums = match load_optional(file, "NUMS")? {
            Some(kw) => {
                check_parallel(&kw, n)?;
                Some(kw.values::<i32>()?)
            }
            None => None,
        };

        let dimens = load_required(file, "DIMENS")?.values::<i32>()?;
        if dimens.len() < 4 {
            return Err(ResdataError::size_mismatch("DIMENS", 6, dimens.len()));
        }
        if usize::try_from(dimens[0]).ok() != Some(n) {
            warn!("DIMENS declares {} variables, KEYWORDS has {}", dimens[0], n);
        }
        let dims = (dimens[1], dimens[2], dimens[3]);
        let restart_step = dimens.get(5).copied().filter(|step| *step > 0);

        let start = parse_start_date(&load_required(file, "STARTDAT")?.values::<i32>()?)?;
        let restart_case = load_optional(file, "RESTART")?
            .map(|kw| kw.strings().map(|parts| parts.concat()))
            .transpose()?
            .filter(|case| !case.trim().is_empty());

        let local = match load_optional(file, "LGRS")? {
            Some(lgrs) => {
                check_parallel(&lgrs, n)?;
                let mut axes = Vec::with_capacity(3);
                for name in ["NUMLX", "NUMLY", "NUMLZ"] {
                    let kw = load_required(file, name)?;
                    check_parallel(&kw, n)?;
                    axes.push(kw.values::<i32>()?);
                }
                Some((lgrs.strings()?, axes))
            }
            None => None,
        };

        let mut nodes = Vec::with_capacity(n);
        for (position, keyword) in keywords.into_iter().enumerate() {
            let mut raw = RawVariable {
                keyword: keyword.trim().to_string(),
                wgname: wgnames[position].clone(),
                num: nums.as_ref().map_or(NUMS_INVALID, |nums| nums[position]),
                unit: units[position].clone(),
                ..Default::default()
            };
            if let Some((lgrs, axes)) = &local {
                if VarType::classify(&raw.keyword).is_local() {
                    raw.lgr = Some(lgrs[position].clone());
                    raw.lgr_ijk = Some((axes[0][position], axes[1][position], axes[2][position]));
                }
            }
            nodes.push(SummaryNode::new(position, raw, dims, &options));
        }

        let index = Self::from_nodes(nodes, dims, start, options);
        let index = Self {
            restart_step,
            restart_case,
            ..index
        };
        info!(
            "Summary catalog: {} variables, {} keys, start {}",
            index.len(),
            index.keys.len(),
            index.start
        );
        Ok(index)
    }

    fn from_nodes(
        nodes: Vec<SummaryNode>,
        dims: (i32, i32, i32),
        start: PrimitiveDateTime,
        options: SummaryOptions,
    ) -> Self {
        let mut keys = HashMap::new();
        for node in &nodes {
            for key in [node.key(), node.alt_key()].into_iter().flatten() {
                if let Some(previous) = keys.insert(key.to_string(), node.position()) {
                    warn!(
                        "Summary key '{}' is defined at positions {} and {}; using {}",
                        key,
                        previous,
                        node.position(),
                        node.position()
                    );
                }
            }
        }

        let position_of = |keyword: &str| {
            nodes
                .iter()
                .rev()
                .find(|node| node.keyword() == keyword)
                .map(SummaryNode::position)
        };
        let time_position = position_of("TIME");
        let time_in_hours = time_position
            .map(|pos| nodes[pos].unit().eq_ignore_ascii_case("HOURS"))
            .unwrap_or(false);
        let date_positions = match (position_of("DAY"), position_of("MONTH"), position_of("YEAR")) {
            (Some(day), Some(month), Some(year)) => Some([day, month, year]),
            _ => None,
        };
        debug!(
            "Time source: TIME at {:?} (hours: {}), calendar at {:?}",
            time_position, time_in_hours, date_positions
        );

        Self {
            nodes,
            keys,
            dims,
            restart_step: None,
            restart_case: None,
            start,
            options,
            time_position,
            time_in_hours,
            date_positions,
        }
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All variables in position order.
    pub fn nodes(&self) -> &[SummaryNode] {
        &self.nodes
    }

    /// The variable at `position`.
    pub fn node(&self, position: usize) -> Result<&SummaryNode> {
        self.nodes.get(position).ok_or(ResdataError::IndexOutOfRange {
            what: "summary position",
            index: position,
            len: self.nodes.len(),
        })
    }

    /// Position of the variable with lookup key `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.keys.get(key).copied()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// The variable with lookup key `key`.
    pub fn node_by_key(&self, key: &str) -> Option<&SummaryNode> {
        self.position(key).map(|position| &self.nodes[position])
    }

    /// All lookup keys matching a `*`/`?` wildcard pattern, sorted.
    ///
    /// # Errors
    /// Returns [`ResdataError::Format`] if the pattern does not compile.
    pub fn keys_matching(&self, pattern: &str) -> Result<Vec<&str>> {
        let regex = wildcard_regex(pattern)?;
        let mut keys: Vec<&str> = self
            .keys
            .keys()
            .map(String::as_str)
            .filter(|key| regex.is_match(key))
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }

    /// Grid dimensions declared in `DIMENS`.
    pub fn dims(&self) -> (i32, i32, i32) {
        self.dims
    }

    /// Simulation start from `STARTDAT`.
    pub fn start_date(&self) -> PrimitiveDateTime {
        self.start
    }

    /// Report step this run was restarted from, if any.
    pub fn restart_step(&self) -> Option<i32> {
        self.restart_step
    }

    /// Case name this run was restarted from, if any.
    pub fn restart_case(&self) -> Option<&str> {
        self.restart_case.as_deref()
    }

    pub fn options(&self) -> &SummaryOptions {
        &self.options
    }

    /// Position of `TIME` and whether its unit is hours.
    pub(super) fn time_source(&self) -> (Option<usize>, bool) {
        (self.time_position, self.time_in_hours)
    }

    /// Positions of the `DAY`, `MONTH` and `YEAR` variables.
    pub(super) fn date_positions(&self) -> Option<[usize; 3]> {
        self.date_positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_date() {
        let date = parse_start_date(&[10, 3, 2001]).unwrap();
        assert_eq!(date.year(), 2001);
        assert_eq!(date.month(), Month::March);
        assert_eq!(date.day(), 10);
        assert_eq!(date.hour(), 0);

        let date = parse_start_date(&[1, 1, 2000, 6, 30, 15_000_000]).unwrap();
        assert_eq!((date.hour(), date.minute(), date.second()), (6, 30, 15));

        assert!(parse_start_date(&[31, 2, 2001]).is_err());
        assert!(parse_start_date(&[1, 13, 2001]).is_err());
        assert!(parse_start_date(&[1, 1]).is_err());
    }

    #[test]
    fn test_wildcard_regex() {
        let regex = wildcard_regex("W*:OP?1").unwrap();
        assert!(regex.is_match("WOPR:OP_1"));
        assert!(!regex.is_match("WOPR:OP_10"));
        assert!(wildcard_regex("BPR:1,1,1").unwrap().is_match("BPR:1,1,1"));
        assert!(!wildcard_regex("F.PR").unwrap().is_match("FOPR"));
    }
}
