//! The in-memory keyword: a named, typed, fixed-layout data block.

use super::element::Element;
use super::error::{ResdataError, Result};
use super::models::{DataType, KeywordHeader};
use crate::resdata::utils::{pad_ascii, trim_slot, validate_name};

/// A decoded keyword.
///
/// The payload is an owned byte buffer of exactly `count * element_size`
/// bytes. Numeric payloads are held in native byte order; string payloads
/// are the blank padded slots as written on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    name: String,
    data_type: DataType,
    count: usize,
    data: Vec<u8>,
}

impl Keyword {
    /// Creates a keyword with default content: zeros for numeric types and
    /// blanks for string types.
    ///
    /// # Errors
    /// Returns [`ResdataError::Format`] if the name is longer than eight
    /// characters or not printable ASCII.
    pub fn new(name: &str, data_type: DataType, count: usize) -> Result<Self> {
        let name = validate_name(name)?;
        let fill = if data_type.is_string() { b' ' } else { 0 };
        Ok(Self {
            name,
            data_type,
            count,
            data: vec![fill; count * data_type.element_size()],
        })
    }

    /// Wraps an already laid out native-order payload.
    pub fn from_raw(name: &str, data_type: DataType, count: usize, data: Vec<u8>) -> Result<Self> {
        let name = validate_name(name)?;
        let expected = count * data_type.element_size();
        if data.len() != expected {
            return Err(ResdataError::size_mismatch(
                format!("payload of keyword '{}'", name),
                expected,
                data.len(),
            ));
        }
        Ok(Self {
            name,
            data_type,
            count,
            data,
        })
    }

    /// Builds a numeric keyword from a slice of values.
    pub fn from_values<T: Element>(name: &str, values: &[T]) -> Result<Self> {
        let mut keyword = Self::new(name, T::DATA_TYPE, values.len())?;
        let size = T::DATA_TYPE.element_size();
        for (slot, value) in keyword.data.chunks_exact_mut(size).zip(values) {
            value.write_native(slot);
        }
        Ok(keyword)
    }

    /// Builds a `CHAR` keyword; every string must fit in eight characters.
    pub fn from_strings<S: AsRef<str>>(name: &str, values: &[S]) -> Result<Self> {
        Self::from_string_slots(name, DataType::Char, values)
    }

    /// Builds a `Cnnn` keyword of fixed width strings.
    pub fn from_strings_with_width<S: AsRef<str>>(
        name: &str,
        width: u16,
        values: &[S],
    ) -> Result<Self> {
        if width == 0 || width > 999 {
            return Err(ResdataError::Format(format!(
                "String width {} is outside 1..=999",
                width
            )));
        }
        Self::from_string_slots(name, DataType::CharN(width), values)
    }

    fn from_string_slots<S: AsRef<str>>(name: &str, data_type: DataType, values: &[S]) -> Result<Self> {
        let name = validate_name(name)?;
        let width = data_type.element_size();
        let mut data = Vec::with_capacity(width * values.len());
        for value in values {
            data.extend(pad_ascii(value.as_ref(), width)?);
        }
        Ok(Self {
            name,
            data_type,
            count: values.len(),
            data,
        })
    }

    /// Name without blank padding.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The raw payload: native byte order for numeric types.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn header(&self) -> KeywordHeader {
        KeywordHeader {
            name: self.name.clone(),
            data_type: self.data_type,
            count: self.count,
        }
    }

    /// Whether name, type and count match `other`, ignoring the payload.
    pub fn equal_header(&self, other: &Keyword) -> bool {
        self.name == other.name && self.data_type == other.data_type && self.count == other.count
    }

    fn check_type(&self, expected: DataType) -> Result<()> {
        if self.data_type == expected {
            Ok(())
        } else {
            Err(self.type_mismatch(&expected.to_string()))
        }
    }

    fn type_mismatch(&self, expected: &str) -> ResdataError {
        ResdataError::TypeMismatch {
            keyword: self.name.clone(),
            expected: expected.to_string(),
            found: self.data_type.to_string(),
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.count {
            Ok(())
        } else {
            Err(ResdataError::IndexOutOfRange {
                what: "element",
                index,
                len: self.count,
            })
        }
    }

    fn slot(&self, index: usize) -> &[u8] {
        let size = self.data_type.element_size();
        &self.data[index * size..(index + 1) * size]
    }

    /// All elements as `T`.
    ///
    /// # Errors
    /// Returns [`ResdataError::TypeMismatch`] if the keyword does not hold `T`.
    pub fn values<T: Element>(&self) -> Result<Vec<T>> {
        self.check_type(T::DATA_TYPE)?;
        let size = T::DATA_TYPE.element_size();
        Ok(self.data.chunks_exact(size).map(T::read_native).collect())
    }

    /// Element `index` as `T`.
    pub fn iget<T: Element>(&self, index: usize) -> Result<T> {
        self.check_type(T::DATA_TYPE)?;
        self.check_index(index)?;
        Ok(T::read_native(self.slot(index)))
    }

    /// Overwrites element `index`.
    pub fn iset<T: Element>(&mut self, index: usize, value: T) -> Result<()> {
        self.check_type(T::DATA_TYPE)?;
        self.check_index(index)?;
        let size = self.data_type.element_size();
        value.write_native(&mut self.data[index * size..(index + 1) * size]);
        Ok(())
    }

    /// String element `index` with trailing blanks removed.
    pub fn iget_string(&self, index: usize) -> Result<String> {
        if !self.data_type.is_string() {
            return Err(self.type_mismatch("CHAR"));
        }
        self.check_index(index)?;
        Ok(trim_slot(self.slot(index)))
    }

    /// Overwrites string element `index`, blank padding it to the slot width.
    pub fn iset_string(&mut self, index: usize, value: &str) -> Result<()> {
        if !self.data_type.is_string() {
            return Err(self.type_mismatch("CHAR"));
        }
        self.check_index(index)?;
        let size = self.data_type.element_size();
        let padded = pad_ascii(value, size)?;
        self.data[index * size..(index + 1) * size].copy_from_slice(&padded);
        Ok(())
    }

    /// All string elements with trailing blanks removed.
    pub fn strings(&self) -> Result<Vec<String>> {
        if !self.data_type.is_string() {
            return Err(self.type_mismatch("CHAR"));
        }
        let size = self.data_type.element_size();
        Ok(self.data.chunks_exact(size).map(trim_slot).collect())
    }

    /// Compares string element `index` with `other`, ignoring trailing blanks
    /// on both sides.
    pub fn string_eq(&self, index: usize, other: &str) -> Result<bool> {
        Ok(self.iget_string(index)? == other.trim_end_matches(' '))
    }

    /// Widening copy to `f64`. Accepts `REAL` and `DOUB` keywords.
    pub fn to_f64_vec(&self) -> Result<Vec<f64>> {
        match self.data_type {
            DataType::Real => Ok(self.values::<f32>()?.into_iter().map(f64::from).collect()),
            DataType::Double => self.values::<f64>(),
            _ => Err(self.type_mismatch("REAL or DOUB")),
        }
    }

    /// Element `index` of a `REAL` or `DOUB` keyword, widened to `f64`.
    pub fn iget_f64(&self, index: usize) -> Result<f64> {
        match self.data_type {
            DataType::Real => Ok(f64::from(self.iget::<f32>(index)?)),
            DataType::Double => self.iget::<f64>(index),
            _ => Err(self.type_mismatch("REAL or DOUB")),
        }
    }

    /// Explicit narrowing copy to `f32`. Precision is lost for `DOUB` data.
    pub fn to_f32_lossy(&self) -> Result<Vec<f32>> {
        match self.data_type {
            DataType::Real => self.values::<f32>(),
            DataType::Double => Ok(self.values::<f64>()?.into_iter().map(|v| v as f32).collect()),
            _ => Err(self.type_mismatch("REAL or DOUB")),
        }
    }

    /// Returns a copy of this keyword under a new name.
    pub fn renamed(&self, name: &str) -> Result<Self> {
        Ok(Self {
            name: validate_name(name)?,
            ..self.clone()
        })
    }
}
