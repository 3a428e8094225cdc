//! Formatted (text) wire encoding.
//!
//! A formatted keyword is one header line followed by data lines:
//!
//! ```text
//!  'PORO    '           4 'REAL'
//!    0.100000000E+00   0.200000000E+00   0.300000000E+00   0.400000000E+00
//! ```
//!
//! Each element type has a fixed number of columns per line, and lines are
//! also broken at the same element blocks as the unformatted records. The
//! number of data lines is therefore a function of type and count only.
//!
//! Floating point mantissas carry enough digits (9 for `REAL`, 17 for
//! `DOUB`) to read back the exact value that was written.

use std::fmt::LowerExp;
use std::io::Write;

use crate::resdata::types::element::Element;
use crate::resdata::types::error::{ResdataError, Result};
use crate::resdata::types::keyword::Keyword;
use crate::resdata::types::models::{DataType, KeywordHeader};
use crate::resdata::utils::{pad_ascii, validate_name};

/// Mantissa digits written for `REAL` elements.
const REAL_DECIMALS: usize = 9;
/// Mantissa digits written for `DOUB` elements.
const DOUBLE_DECIMALS: usize = 17;

/// Renders the header line of a keyword, without the newline.
pub fn header_line(header: &KeywordHeader) -> String {
    format!(
        " '{:<8}' {:>11} '{:<4}'",
        header.name,
        header.count,
        header.data_type.type_code()
    )
}

/// Parses a header line written by [`header_line`].
///
/// # Errors
/// Returns [`ResdataError::Format`] unless the line holds a quoted name, an
/// element count and a quoted, recognized type code.
pub fn parse_header_line(line: &str) -> Result<KeywordHeader> {
    let tokens = tokenize(line)?;
    match tokens.as_slice() {
        [Token::Quoted(name), Token::Bare(count), Token::Quoted(code)] => {
            let name = validate_name(name)?;
            let count = count.parse::<usize>().map_err(|_| {
                ResdataError::Format(format!("Invalid element count '{}' for '{}'", count, name))
            })?;
            let data_type = DataType::from_type_code(code.trim_end())?;
            Ok(KeywordHeader {
                name,
                data_type,
                count,
            })
        }
        _ => Err(ResdataError::Format(format!(
            "Line does not parse as a keyword header: {:?}",
            line.trim_end()
        ))),
    }
}

/// Number of elements on each data line of a keyword.
pub fn line_lengths(data_type: DataType, count: usize) -> impl Iterator<Item = usize> {
    let block = data_type.block_size();
    let columns = data_type.formatted_columns();
    let blocks = if data_type.element_size() == 0 {
        0
    } else {
        count.div_ceil(block)
    };
    (0..blocks).flat_map(move |b| {
        let in_block = block.min(count - b * block);
        (0..in_block.div_ceil(columns)).map(move |l| columns.min(in_block - l * columns))
    })
}

/// Number of data lines following the header line.
pub fn data_line_count(data_type: DataType, count: usize) -> usize {
    line_lengths(data_type, count).count()
}

/// Writes the data lines of `keyword`.
pub fn write_data(writer: &mut impl Write, keyword: &Keyword) -> Result<()> {
    let data_type = keyword.data_type();
    let size = data_type.element_size();
    let mut slots = keyword.data().chunks_exact(size.max(1));
    let mut line = String::new();
    for len in line_lengths(data_type, keyword.len()) {
        line.clear();
        for slot in slots.by_ref().take(len) {
            push_element(&mut line, data_type, slot);
        }
        line.push('\n');
        writer.write_all(line.as_bytes())?;
    }
    Ok(())
}

fn push_element(line: &mut String, data_type: DataType, slot: &[u8]) {
    match data_type {
        DataType::Int => line.push_str(&format!(" {:>11}", i32::read_native(slot))),
        DataType::Real => {
            line.push_str("  ");
            line.push_str(&format_exponent(f32::read_native(slot), REAL_DECIMALS, 'E'));
        }
        DataType::Double => {
            line.push_str("  ");
            line.push_str(&format_exponent(f64::read_native(slot), DOUBLE_DECIMALS, 'D'));
        }
        DataType::Bool => line.push_str(if bool::read_native(slot) { "  T" } else { "  F" }),
        DataType::Char | DataType::CharN(_) => {
            line.push_str(" '");
            line.push_str(&String::from_utf8_lossy(slot));
            line.push('\'');
        }
        DataType::Mess => {}
    }
}

/// Formats `value` as `0.dddd` mantissa times a power of ten.
///
/// The mantissa digits are the shortest decimal that reads back as `value`,
/// zero padded to `decimals` digits and right aligned in `decimals + 3`
/// columns; `marker` separates the signed two digit exponent.
pub fn format_exponent<T: LowerExp>(value: T, decimals: usize, marker: char) -> String {
    let width = decimals + 3;
    let shortest = format!("{:e}", value);
    // `inf`, `-inf` and `NaN` have no exponent.
    let Some((significand, exponent)) = shortest.split_once('e') else {
        return format!("{:>width$}", shortest, width = width + 4);
    };
    let (sign, significand) = match significand.strip_prefix('-') {
        Some(unsigned) => ("-", unsigned),
        None => ("", significand),
    };
    let digits: String = significand.chars().filter(char::is_ascii_digit).collect();
    let exponent = if digits.bytes().all(|d| d == b'0') {
        0
    } else {
        exponent.parse::<i32>().map_or(0, |e| e + 1)
    };
    format!(
        "{:>width$}{}{:+03}",
        format!("{}0.{:0<decimals$}", sign, digits, decimals = decimals),
        marker,
        exponent,
        width = width
    )
}

/// Decodes the data lines of a keyword into a native-order payload.
///
/// # Errors
/// Returns [`ResdataError::Format`] if a value does not parse or the number
/// of values differs from the header count.
pub fn parse_data(header: &KeywordHeader, lines: &[String]) -> Result<Vec<u8>> {
    let data_type = header.data_type;
    if matches!(data_type, DataType::Char | DataType::CharN(_)) {
        return parse_char_data(header, lines);
    }
    let size = data_type.element_size();
    let mut data = Vec::with_capacity(header.count * size);
    let mut found = 0usize;
    for line in lines {
        for token in tokenize(line)? {
            found += 1;
            if found > header.count {
                continue;
            }
            let mut slot = vec![0u8; size];
            match (data_type, token) {
                (DataType::Int, Token::Bare(text)) => {
                    parse_number::<i32>(text, header)?.write_native(&mut slot)
                }
                (DataType::Real, Token::Bare(text)) => {
                    parse_number::<f32>(&text.replace(['D', 'd'], "E"), header)?.write_native(&mut slot)
                }
                (DataType::Double, Token::Bare(text)) => {
                    parse_number::<f64>(&text.replace(['D', 'd'], "E"), header)?.write_native(&mut slot)
                }
                (DataType::Bool, Token::Bare(text)) => match text {
                    "T" | "t" => true.write_native(&mut slot),
                    "F" | "f" => false.write_native(&mut slot),
                    _ => return Err(bad_value(text, header)),
                },
                (_, Token::Bare(text) | Token::Quoted(text)) => return Err(bad_value(text, header)),
            }
            data.extend_from_slice(&slot);
        }
    }
    if size > 0 && found != header.count {
        return Err(ResdataError::size_mismatch(
            format!("formatted data of '{}'", header.name),
            header.count,
            found,
        ));
    }
    Ok(data)
}

/// Character data is read slot by slot: a quote, exactly one slot width of
/// text, and a closing quote. Quotes inside the text are kept.
fn parse_char_data(header: &KeywordHeader, lines: &[String]) -> Result<Vec<u8>> {
    let width = header.data_type.element_size();
    let mut data = Vec::with_capacity(header.count * width);
    let mut found = 0usize;
    for line in lines {
        let mut rest = line.trim_end_matches(['\n', '\r']);
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            let text = rest
                .strip_prefix('\'')
                .and_then(|quoted| quoted.get(..width).map(|text| (text, &quoted[width..])))
                .and_then(|(text, tail)| tail.strip_prefix('\'').map(|tail| (text, tail)));
            let Some((text, tail)) = text else {
                return Err(ResdataError::Format(format!(
                    "Expected a quoted {} character value in keyword '{}': {:?}",
                    width, header.name, line
                )));
            };
            found += 1;
            if found <= header.count {
                data.extend_from_slice(&pad_ascii(text, width)?);
            }
            rest = tail;
        }
    }
    if found != header.count {
        return Err(ResdataError::size_mismatch(
            format!("formatted data of '{}'", header.name),
            header.count,
            found,
        ));
    }
    Ok(data)
}

fn parse_number<T: std::str::FromStr>(text: &str, header: &KeywordHeader) -> Result<T> {
    text.parse::<T>().map_err(|_| bad_value(text, header))
}

fn bad_value(text: &str, header: &KeywordHeader) -> ResdataError {
    ResdataError::Format(format!(
        "Invalid {} value '{}' in keyword '{}'",
        header.data_type, text, header.name
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Bare(&'a str),
    Quoted(&'a str),
}

fn tokenize(line: &str) -> Result<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut rest = line.trim_end_matches(['\n', '\r']);
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Ok(tokens);
        }
        if let Some(quoted) = rest.strip_prefix('\'') {
            let end = quoted.find('\'').ok_or_else(|| {
                ResdataError::Format(format!("Unterminated quoted string in line {:?}", line))
            })?;
            tokens.push(Token::Quoted(&quoted[..end]));
            rest = &quoted[end + 1..];
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            tokens.push(Token::Bare(&rest[..end]));
            rest = &rest[end..];
        }
    }
}
