//! Summary time series: ministep arrays read from one or more data files.
//!
//! ```text
//! UNSMRY / S0001 ...
//! ├── SEQHDR            starts report step r + 1
//! ├── MINISTEP [m]      ministep number of the next PARAMS
//! ├── PARAMS  [n]       one value per catalog position
//! ├── MINISTEP [m + 1]
//! ├── PARAMS  [n]
//! └── SEQHDR ...
//! ```
//!
//! Opening a data handle reads only the time of every ministep. Columns
//! are read on demand and cached per position for the lifetime of the
//! handle.

use log::{debug, info, trace};
use time::{Date, Duration, Month, PrimitiveDateTime};

use super::smspec::SummaryIndex;
use crate::resdata::reader::ResFile;
use crate::resdata::types::error::{ResdataError, Result};
use crate::resdata::types::models::{DataType, IndexEntry};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Location and time of one ministep.
#[derive(Debug, Clone)]
struct Ministep {
    file: usize,
    entry: usize,
    number: i32,
    report_step: usize,
    days: f64,
}

/// Time series of a summary catalog.
///
/// Ministeps are ordered by simulated time, which never decreases. Several
/// ministeps may share a report step.
#[derive(Debug)]
pub struct SummaryData<'a> {
    index: &'a SummaryIndex,
    files: Vec<&'a ResFile>,
    ministeps: Vec<Ministep>,
    cache: Vec<Option<Vec<f64>>>,
}

/// Reads element `position` of a REAL or DOUB `PARAMS` entry.
fn read_param(file: &ResFile, entry: &IndexEntry, position: usize) -> Result<f64> {
    match entry.data_type {
        DataType::Double => file.read_element::<f64>(entry, position),
        _ => file.read_element::<f32>(entry, position).map(f64::from),
    }
}

impl<'a> SummaryData<'a> {
    /// Opens the time series stored in `files`, in order.
    ///
    /// # Arguments
    /// * `index` - The catalog the data files were written against
    /// * `files` - Scanned data files (a unified file or a sequence of step files)
    ///
    /// # Errors
    /// Returns [`ResdataError::Format`] if a `PARAMS` array does not have one
    /// value per catalog position, if simulated time does not strictly
    /// increase, or if the catalog has neither a `TIME` variable nor `DAY`/`MONTH`/`YEAR`.
    pub fn open(index: &'a SummaryIndex, files: &[&'a ResFile]) -> Result<Self> {
        let mut data = Self {
            index,
            files: files.to_vec(),
            ministeps: Vec::new(),
            cache: vec![None; index.len()],
        };
        let mut report_step = index
            .restart_step()
            .and_then(|step| usize::try_from(step).ok())
            .unwrap_or(0);

        for (file_index, file) in files.iter().enumerate() {
            let mut number = None;
            for (entry_index, entry) in file.entries().iter().enumerate() {
                match entry.name.as_str() {
                    "SEQHDR" => report_step += 1,
                    "MINISTEP" => number = Some(file.read_element::<i32>(entry, 0)?),
                    "PARAMS" => {
                        if entry.count != index.len() {
                            return Err(ResdataError::Format(format!(
                                "PARAMS at offset {:#x} of {} has {} values, the catalog has {}",
                                entry.offset,
                                file.path().display(),
                                entry.count,
                                index.len()
                            )));
                        }
                        let days = data.ministep_days(file, entry)?;
                        if let Some(last) = data.ministeps.last() {
                            if days <= last.days {
                                return Err(ResdataError::Format(format!(
                                    "Simulated time does not increase from {} to {} days in {}",
                                    last.days,
                                    days,
                                    file.path().display()
                                )));
                            }
                        }
                        let number = number.take().unwrap_or(data.ministeps.len() as i32);
                        trace!("Ministep {} at {} days, report step {}", number, days, report_step);
                        data.ministeps.push(Ministep {
                            file: file_index,
                            entry: entry_index,
                            number,
                            report_step,
                            days,
                        });
                    }
                    _ => {}
                }
            }
            debug!("Read {} ministeps through {}", data.ministeps.len(), file.path().display());
        }

        info!(
            "Summary data: {} ministeps, {} report steps",
            data.ministeps.len(),
            data.ministeps.last().map_or(0, |m| m.report_step)
        );
        Ok(data)
    }

    /// Simulated days of the ministep stored in `entry`.
    fn ministep_days(&self, file: &ResFile, entry: &IndexEntry) -> Result<f64> {
        if let (Some(position), in_hours) = self.index.time_source() {
            let value = read_param(file, entry, position)?;
            return Ok(if in_hours { value / 24.0 } else { value });
        }
        if let Some([day, month, year]) = self.index.date_positions() {
            let field = |position| read_param(file, entry, position).map(|v| v.round() as i32);
            let (day, month, year) = (field(day)?, field(month)?, field(year)?);
            let invalid = || ResdataError::Format(format!("Invalid ministep date {}/{}/{}", day, month, year));
            let month = u8::try_from(month).ok().and_then(|m| Month::try_from(m).ok()).ok_or_else(invalid)?;
            let day = u8::try_from(day).map_err(|_| invalid())?;
            let date = Date::from_calendar_date(year, month, day).map_err(|_| invalid())?;
            let elapsed = date.midnight() - self.index.start_date();
            return Ok(elapsed.as_seconds_f64() / SECONDS_PER_DAY);
        }
        Err(ResdataError::Format(
            "Summary catalog has neither TIME nor DAY/MONTH/YEAR".to_string(),
        ))
    }

    pub fn index(&self) -> &'a SummaryIndex {
        self.index
    }

    /// Number of ministeps.
    pub fn len(&self) -> usize {
        self.ministeps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ministeps.is_empty()
    }

    /// Simulated days of every ministep.
    pub fn times(&self) -> Vec<f64> {
        self.ministeps.iter().map(|m| m.days).collect()
    }

    /// Report step of every ministep.
    pub fn report_steps(&self) -> Vec<usize> {
        self.ministeps.iter().map(|m| m.report_step).collect()
    }

    /// Ministep numbers as recorded by `MINISTEP` keywords.
    pub fn ministep_numbers(&self) -> Vec<i32> {
        self.ministeps.iter().map(|m| m.number).collect()
    }

    /// Simulated days of ministep `ministep`.
    pub fn time_at(&self, ministep: usize) -> Result<f64> {
        Ok(self.ministep(ministep)?.days)
    }

    /// Calendar time of ministep `ministep`.
    pub fn date_at(&self, ministep: usize) -> Result<PrimitiveDateTime> {
        let days = self.ministep(ministep)?.days;
        Duration::checked_seconds_f64(days * SECONDS_PER_DAY)
            .and_then(|elapsed| self.index.start_date().checked_add(elapsed))
            .ok_or_else(|| ResdataError::Format(format!("Ministep time {} days is not a valid date", days)))
    }

    fn ministep(&self, ministep: usize) -> Result<&Ministep> {
        self.ministeps.get(ministep).ok_or(ResdataError::IndexOutOfRange {
            what: "ministep",
            index: ministep,
            len: self.ministeps.len(),
        })
    }

    fn check_position(&self, position: usize) -> Result<()> {
        self.index.node(position).map(|_| ())
    }

    fn read_value(&self, position: usize, ministep: &Ministep) -> Result<f64> {
        let file = self.files[ministep.file];
        read_param(file, &file.entries()[ministep.entry], position)
    }

    fn load_column(&self, position: usize) -> Result<Vec<f64>> {
        self.ministeps
            .iter()
            .map(|ministep| self.read_value(position, ministep))
            .collect()
    }

    /// The values of variable `position` at every ministep.
    ///
    /// The column is read on the first call and cached; later calls return
    /// the cached column.
    ///
    /// # Errors
    /// Returns [`ResdataError::IndexOutOfRange`] if `position` is not a
    /// catalog position.
    pub fn get_vector(&mut self, position: usize) -> Result<&[f64]> {
        self.check_position(position)?;
        if self.cache[position].is_none() {
            debug!("Loading summary column {}", position);
            let column = self.load_column(position)?;
            self.cache[position] = Some(column);
        }
        Ok(self.cache[position].as_deref().unwrap_or(&[]))
    }

    /// The column of the variable with lookup key `key`; `None` for an unknown key.
    pub fn get_vector_by_key(&mut self, key: &str) -> Result<Option<&[f64]>> {
        match self.index.position(key) {
            Some(position) => self.get_vector(position).map(Some),
            None => Ok(None),
        }
    }

    /// Whether the column of `position` has been loaded.
    pub fn is_cached(&self, position: usize) -> bool {
        self.cache.get(position).is_some_and(Option::is_some)
    }

    /// Value of variable `position` at ministep `ministep`.
    ///
    /// # Errors
    /// Returns [`ResdataError::IndexOutOfRange`] if either index is out of range.
    pub fn value_at(&self, position: usize, ministep: usize) -> Result<f64> {
        self.check_position(position)?;
        let step = self.ministep(ministep)?;
        if let Some(column) = &self.cache[position] {
            return Ok(column[ministep]);
        }
        self.read_value(position, step)
    }

    /// Index of the first ministep at or after `days`.
    ///
    /// # Errors
    /// Returns [`ResdataError::IndexOutOfRange`] if `days` lies before the
    /// first or after the last ministep.
    pub fn ministep_at_time(&self, days: f64) -> Result<usize> {
        let out_of_range = |index| ResdataError::IndexOutOfRange {
            what: "simulated time",
            index,
            len: self.ministeps.len(),
        };
        let (first, last) = match (self.ministeps.first(), self.ministeps.last()) {
            (Some(first), Some(last)) => (first.days, last.days),
            _ => return Err(out_of_range(0)),
        };
        if days < first || days > last || days.is_nan() {
            return Err(out_of_range(if days < first { 0 } else { self.ministeps.len() }));
        }
        Ok(self.ministeps.partition_point(|m| m.days < days))
    }

    /// Value of variable `position` at the first ministep at or after `days`.
    ///
    /// A time equal to a ministep's time returns that ministep's value.
    pub fn value_at_time(&self, position: usize, days: f64) -> Result<f64> {
        let ministep = self.ministep_at_time(days)?;
        self.value_at(position, ministep)
    }

    /// Value of variable `position` at `days`, interpolated linearly between
    /// the bracketing ministeps.
    ///
    /// Rates hold over the interval that ends at a ministep, so they take
    /// the value of the following ministep without interpolation.
    pub fn interpolate_at_time(&self, position: usize, days: f64) -> Result<f64> {
        let ministep = self.ministep_at_time(days)?;
        let after = &self.ministeps[ministep];
        if ministep == 0 || after.days == days || self.index.node(position)?.is_rate() {
            return self.value_at(position, ministep);
        }
        let before = &self.ministeps[ministep - 1];
        let span = after.days - before.days;
        if span <= 0.0 {
            return self.value_at(position, ministep);
        }
        let w1 = (after.days - days) / span;
        let w2 = (days - before.days) / span;
        Ok(w1 * self.value_at(position, ministep - 1)? + w2 * self.value_at(position, ministep)?)
    }

    /// First ministep of report step `report_step`.
    pub fn first_ministep_of_report(&self, report_step: usize) -> Result<usize> {
        self.ministeps
            .iter()
            .position(|m| m.report_step == report_step)
            .ok_or_else(|| self.report_out_of_range(report_step))
    }

    /// Last ministep of report step `report_step`.
    pub fn last_ministep_of_report(&self, report_step: usize) -> Result<usize> {
        self.ministeps
            .iter()
            .rposition(|m| m.report_step == report_step)
            .ok_or_else(|| self.report_out_of_range(report_step))
    }

    fn report_out_of_range(&self, report_step: usize) -> ResdataError {
        ResdataError::IndexOutOfRange {
            what: "report step",
            index: report_step,
            len: self.ministeps.last().map_or(0, |m| m.report_step + 1),
        }
    }

    /// Value of variable `position` at the end of report step `report_step`.
    pub fn value_at_report_step(&self, position: usize, report_step: usize) -> Result<f64> {
        let ministep = self.last_ministep_of_report(report_step)?;
        self.value_at(position, ministep)
    }
}
