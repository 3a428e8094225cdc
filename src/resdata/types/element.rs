//! Typed access to keyword payloads.

use byteorder::{ByteOrder, NativeEndian};

use super::models::DataType;

/// Integer written for a true LOGI element.
pub const BOOL_TRUE_INT: i32 = -1;
/// Integer written for a false LOGI element.
pub const BOOL_FALSE_INT: i32 = 0;

/// A scalar type that a numeric keyword can be viewed as.
///
/// Payloads are kept in native byte order, so implementations only convert
/// between a fixed-size byte slot and the Rust value.
pub trait Element: Copy + std::fmt::Debug {
    /// The keyword element type holding values of this Rust type.
    const DATA_TYPE: DataType;

    /// Reads one value from a native-order slot of `DATA_TYPE.element_size()` bytes.
    fn read_native(bytes: &[u8]) -> Self;

    /// Writes one value into a native-order slot.
    fn write_native(self, out: &mut [u8]);
}

impl Element for i32 {
    const DATA_TYPE: DataType = DataType::Int;

    fn read_native(bytes: &[u8]) -> Self {
        NativeEndian::read_i32(bytes)
    }

    fn write_native(self, out: &mut [u8]) {
        NativeEndian::write_i32(out, self)
    }
}

impl Element for f32 {
    const DATA_TYPE: DataType = DataType::Real;

    fn read_native(bytes: &[u8]) -> Self {
        NativeEndian::read_f32(bytes)
    }

    fn write_native(self, out: &mut [u8]) {
        NativeEndian::write_f32(out, self)
    }
}

impl Element for f64 {
    const DATA_TYPE: DataType = DataType::Double;

    fn read_native(bytes: &[u8]) -> Self {
        NativeEndian::read_f64(bytes)
    }

    fn write_native(self, out: &mut [u8]) {
        NativeEndian::write_f64(out, self)
    }
}

impl Element for bool {
    const DATA_TYPE: DataType = DataType::Bool;

    // Some writers use 1 for true; anything nonzero counts.
    fn read_native(bytes: &[u8]) -> Self {
        NativeEndian::read_i32(bytes) != BOOL_FALSE_INT
    }

    fn write_native(self, out: &mut [u8]) {
        let value = if self { BOOL_TRUE_INT } else { BOOL_FALSE_INT };
        NativeEndian::write_i32(out, value)
    }
}
