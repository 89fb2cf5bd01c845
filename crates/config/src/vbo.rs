//! Vertex data tables
//!
//! A vertex data block starts with a header line naming one column per attribute,
//! followed by rows of whitespace-separated numbers:
//!
//! ```text
//! 0/R32G32_SFLOAT   1/ubyte/uvec4
//! -0.5 -0.5         255 0 0 255
//! ```
//!
//! A column is either `LOCATION/FORMAT` or `LOCATION/GL_TYPE/GLSL_TYPE`. The parser lays
//! the attributes out with natural alignment and packs every row into a little-endian
//! byte buffer.

use crate::format::{Format, Mode};
use crate::numbers;
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing a vertex data block
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VboError {
    /// The column header line is malformed
    #[error("line {line}: {message}")]
    InvalidHeader { line: usize, message: String },
    /// A data row is malformed
    #[error("line {line}: {message}")]
    InvalidData { line: usize, message: String },
}

/// One vertex attribute of the table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attrib {
    pub format: &'static Format,
    /// Shader input location
    pub location: u32,
    /// Byte offset of the attribute within a row
    pub offset: usize,
}

/// A parsed vertex buffer and its layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vbo {
    attribs: Vec<Attrib>,
    #[serde(skip)]
    raw_data: Vec<u8>,
    stride: usize,
    num_rows: usize,
}

impl Vbo {
    /// Attributes in column order
    pub fn attribs(&self) -> &[Attrib] {
        &self.attribs
    }

    /// Packed rows, `stride * num_rows` bytes long
    pub fn raw_data(&self) -> &[u8] {
        &self.raw_data
    }

    /// Size of one row in bytes
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }
}

impl FromStr for Vbo {
    type Err = VboError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser::new();
        for line in s.lines() {
            parser.parse_line(line)?;
        }
        parser.into_vbo()
    }
}

/// Column layout established by the header line
#[derive(Debug)]
struct Layout {
    attribs: Vec<Attrib>,
    stride: usize,
}

/// Incremental parser fed one line at a time
#[derive(Debug, Default)]
pub struct Parser {
    layout: Option<Layout>,
    raw_data: Vec<u8>,
    num_rows: usize,
    line_num: usize,
}

fn align(offset: usize, alignment: usize) -> usize {
    offset.div_ceil(alignment) * alignment
}

/// Strips a trailing `#` comment and surrounding whitespace
fn trim_line(line: &str) -> &str {
    let line = match line.find('#') {
        Some(end) => &line[..end],
        None => line,
    };
    line.trim()
}

fn lookup_gl_type(gl_type: &str) -> Option<(Mode, usize)> {
    let found = match gl_type {
        "byte" => (Mode::Sint, 8),
        "ubyte" => (Mode::Uint, 8),
        "short" => (Mode::Sint, 16),
        "ushort" => (Mode::Uint, 16),
        "int" => (Mode::Sint, 32),
        "uint" => (Mode::Uint, 32),
        "half" => (Mode::Sfloat, 16),
        "float" => (Mode::Sfloat, 32),
        "double" => (Mode::Sfloat, 64),
        _ => return None,
    };
    Some(found)
}

/// Returns true if every component of `format` can be read from a data line
///
/// Packed formats are read as one integer. Other formats need byte-sized
/// components of 8, 16, 32 or 64 bits, and float components of 16 bits or more.
fn has_parseable_components(format: &Format) -> bool {
    if format.packed_size().is_some() {
        return true;
    }

    format.parts().iter().all(|part| match part.mode {
        Mode::Sfloat => matches!(part.bits, 16 | 32 | 64),
        Mode::Ufloat => false,
        _ => matches!(part.bits, 8 | 16 | 32 | 64),
    })
}

/// Runs a number parser and stores the value little-endian at the start of `data`
macro_rules! store {
    ($parse:path, $text:expr, $data:expr) => {
        $parse($text).map(|(value, tail)| {
            let bytes = value.to_le_bytes();
            $data[..bytes.len()].copy_from_slice(&bytes);
            tail
        })
    };
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    fn header_error<T>(&self, message: impl Into<String>) -> Result<T, VboError> {
        Err(VboError::InvalidHeader { line: self.line_num, message: message.into() })
    }

    fn data_error<T>(&self, message: impl Into<String>) -> Result<T, VboError> {
        Err(VboError::InvalidData { line: self.line_num, message: message.into() })
    }

    fn components_for_glsl_type(&self, glsl_type: &str) -> Result<usize, VboError> {
        if ["int", "uint", "float", "double"].contains(&glsl_type) {
            return Ok(1);
        }

        let vec_part = glsl_type.strip_prefix(['i', 'u', 'd']).unwrap_or(glsl_type);
        let Some(size) = vec_part.strip_prefix("vec") else {
            return self.header_error(format!("Unknown GLSL type: {glsl_type}"));
        };

        match size.parse::<usize>() {
            Ok(n) if (2..=4).contains(&n) => Ok(n),
            _ => self.header_error(format!("Invalid vec size: {glsl_type}")),
        }
    }

    fn decode_type(&self, gl_type: &str, glsl_type: &str) -> Result<&'static Format, VboError> {
        let Some((mode, bits)) = lookup_gl_type(gl_type) else {
            return self.header_error(format!("Unknown GL type: {gl_type}"));
        };
        let n_components = self.components_for_glsl_type(glsl_type)?;

        match Format::lookup_by_details(bits, mode, n_components) {
            Some(format) => Ok(format),
            None => self.header_error(format!("Invalid type combo: {gl_type}/{glsl_type}")),
        }
    }

    fn parse_attrib(&self, column: &str, offset: usize) -> Result<Attrib, VboError> {
        let mut parts = column.split('/');

        let Some(location) = parts.next().and_then(|part| part.parse::<u32>().ok()) else {
            return self.header_error(format!("Invalid attrib location in {column}"));
        };

        let Some(format_name) = parts.next() else {
            return self.header_error(format!("Column headers must be in the form location/format. Got: {column}"));
        };

        let format = match parts.next() {
            None => match Format::lookup_by_name(format_name) {
                Some(format) => format,
                None => return self.header_error(format!("Unknown format: {format_name}")),
            },
            Some(glsl_type) => {
                if parts.next().is_some() {
                    return self.header_error(format!("Extra data at end of column header: {column}"));
                }
                self.decode_type(format_name, glsl_type)?
            }
        };

        if !has_parseable_components(format) {
            return self.header_error(format!("Unsupported vertex format: {}", format.name));
        }

        Ok(Attrib {
            format,
            location,
            offset: align(offset, format.alignment()),
        })
    }

    fn parse_header_line(&self, line: &str) -> Result<Layout, VboError> {
        let mut attribs = Vec::new();
        let mut end = 0;
        let mut max_alignment = 1;

        for column in line.split_whitespace() {
            let attrib = self.parse_attrib(column, end)?;
            end = attrib.offset + attrib.format.size();
            max_alignment = max_alignment.max(attrib.format.alignment());
            attribs.push(attrib);
        }

        Ok(Layout {
            attribs,
            stride: align(end, max_alignment),
        })
    }

    fn parse_unsigned_datum<'a>(&self, bits: usize, text: &'a str, data: &mut [u8]) -> Result<&'a str, VboError> {
        let parsed = match bits {
            8 => store!(numbers::parse_u8, text, data),
            16 => store!(numbers::parse_u16, text, data),
            32 => store!(numbers::parse_u32, text, data),
            64 => store!(numbers::parse_u64, text, data),
            _ => unreachable!("unexpected bit size {bits}"),
        };

        match parsed {
            Ok(tail) => Ok(tail),
            Err(_) => self.data_error(format!("Couldn’t parse as unsigned {}", integer_name(bits))),
        }
    }

    fn parse_signed_datum<'a>(&self, bits: usize, text: &'a str, data: &mut [u8]) -> Result<&'a str, VboError> {
        let parsed = match bits {
            8 => store!(numbers::parse_i8, text, data),
            16 => store!(numbers::parse_i16, text, data),
            32 => store!(numbers::parse_i32, text, data),
            64 => store!(numbers::parse_i64, text, data),
            _ => unreachable!("unexpected bit size {bits}"),
        };

        match parsed {
            Ok(tail) => Ok(tail),
            Err(_) => self.data_error(format!("Couldn’t parse as signed {}", integer_name(bits))),
        }
    }

    fn parse_float_datum<'a>(&self, bits: usize, text: &'a str, data: &mut [u8]) -> Result<&'a str, VboError> {
        let (parsed, name) = match bits {
            16 => (store!(numbers::parse_half, text, data), "half float"),
            32 => (store!(numbers::parse_f32, text, data), "float"),
            64 => (store!(numbers::parse_f64, text, data), "double"),
            _ => unreachable!("unexpected bit size {bits}"),
        };

        match parsed {
            Ok(tail) => Ok(tail),
            Err(_) => self.data_error(format!("Couldn’t parse as {name}")),
        }
    }

    /// Parses one scalar into the start of `data` and returns the unparsed text
    fn parse_datum<'a>(&self, mode: Mode, bits: usize, text: &'a str, data: &mut [u8]) -> Result<&'a str, VboError> {
        match mode {
            Mode::Sfloat => self.parse_float_datum(bits, text, data),
            Mode::Unorm | Mode::Uscaled | Mode::Uint | Mode::Srgb => self.parse_unsigned_datum(bits, text, data),
            Mode::Snorm | Mode::Sscaled | Mode::Sint => self.parse_signed_datum(bits, text, data),
            // Every UFLOAT format is packed, so its data arrives as one integer
            Mode::Ufloat => unreachable!("unexpected UFLOAT component"),
        }
    }

    fn parse_data_line(&mut self, mut line: &str) -> Result<(), VboError> {
        let Some(layout) = self.layout.as_ref() else {
            unreachable!("data line parsed before the header");
        };

        let mut row = vec![0u8; layout.stride];

        for attrib in &layout.attribs {
            let data = &mut row[attrib.offset..];

            line = match attrib.format.packed_size() {
                Some(packed_size) => self.parse_unsigned_datum(packed_size, line, data)?,
                None => {
                    let mut data = data;
                    for part in attrib.format.parts() {
                        line = self.parse_datum(part.mode, part.bits, line, data)?;
                        data = &mut data[part.bits / 8..];
                    }
                    line
                }
            };
        }

        if !line.trim_end().is_empty() {
            return self.data_error("Extra data at end of line");
        }

        self.raw_data.extend_from_slice(&row);
        self.num_rows += 1;

        Ok(())
    }

    /// Adds one line of the table
    ///
    /// The first non-blank line is the column header; every following one is a row.
    ///
    /// # Arguments
    /// * `line` - One physical line, `#` starts a comment
    pub fn parse_line(&mut self, line: &str) -> Result<(), VboError> {
        self.line_num += 1;

        let line = trim_line(line);
        if line.is_empty() {
            return Ok(());
        }

        if self.layout.is_none() {
            let layout = self.parse_header_line(line)?;
            tracing::trace!(columns = layout.attribs.len(), stride = layout.stride, "parsed vertex data header");
            self.layout = Some(layout);
            Ok(())
        } else {
            self.parse_data_line(line)
        }
    }

    /// Finishes parsing
    ///
    /// Fails if no header line was seen.
    pub fn into_vbo(self) -> Result<Vbo, VboError> {
        let Some(layout) = self.layout else {
            return self.header_error("Missing header line");
        };

        Ok(Vbo {
            attribs: layout.attribs,
            raw_data: self.raw_data,
            stride: layout.stride,
            num_rows: self.num_rows,
        })
    }
}

fn integer_name(bits: usize) -> &'static str {
    match bits {
        8 => "byte",
        16 => "short",
        32 => "int",
        _ => "long",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_floats() {
        let vbo: Vbo = "0/R32G32_SFLOAT\n0.5 -0.5\n".parse().unwrap();

        assert_eq!(vbo.stride(), 8);
        assert_eq!(vbo.num_rows(), 1);
        assert_eq!(vbo.attribs().len(), 1);
        assert_eq!(vbo.attribs()[0].location, 0);
        assert_eq!(vbo.attribs()[0].offset, 0);
        assert_eq!(vbo.attribs()[0].format.name, "R32G32_SFLOAT");

        let mut expected = Vec::new();
        expected.extend_from_slice(&0.5f32.to_le_bytes());
        expected.extend_from_slice(&(-0.5f32).to_le_bytes());
        assert_eq!(vbo.raw_data(), expected.as_slice());
    }

    #[test]
    fn test_offsets_and_stride_are_aligned() {
        let headers = [
            "0/R8_UNORM 1/R32_SFLOAT",
            "0/R8G8B8_UINT 1/R16_SINT 2/R64_SFLOAT",
            "0/ubyte/uvec3 1/double/dvec2 2/half/float",
            "0/A2B10G10R10_UNORM_PACK32 1/R8_SNORM",
            "3/R16G16B16_SFLOAT",
        ];

        for header in headers {
            let vbo: Vbo = header.parse().unwrap();
            let max_alignment = vbo.attribs().iter().map(|a| a.format.alignment()).max().unwrap();

            assert_eq!(vbo.stride() % max_alignment, 0, "{header}");
            for attrib in vbo.attribs() {
                assert_eq!(attrib.offset % attrib.format.alignment(), 0, "{header}");
            }
        }
    }

    #[test]
    fn test_mixed_layout() {
        let vbo: Vbo = "0/R8_UNORM 1/R32_SFLOAT\n255 1.0\n0x7f 2".parse().unwrap();

        assert_eq!(vbo.attribs()[1].offset, 4);
        assert_eq!(vbo.stride(), 8);
        assert_eq!(vbo.num_rows(), 2);
        assert_eq!(vbo.raw_data().len(), 16);
        assert_eq!(vbo.raw_data()[0], 255);
        assert_eq!(&vbo.raw_data()[4..8], &1.0f32.to_le_bytes());
        assert_eq!(vbo.raw_data()[8], 0x7f);
        assert_eq!(&vbo.raw_data()[12..16], &2.0f32.to_le_bytes());
    }

    #[test]
    fn test_gl_type_columns() {
        let vbo: Vbo = "1/ubyte/uvec4 2/int/int\n1 2 3 4 -7".parse().unwrap();

        assert_eq!(vbo.attribs()[0].format.name, "R8G8B8A8_UINT");
        assert_eq!(vbo.attribs()[0].location, 1);
        assert_eq!(vbo.attribs()[1].format.name, "R32_SINT");
        assert_eq!(vbo.attribs()[1].offset, 4);
        assert_eq!(&vbo.raw_data()[0..4], &[1, 2, 3, 4]);
        assert_eq!(&vbo.raw_data()[4..8], &(-7i32).to_le_bytes());
    }

    #[test]
    fn test_packed_format() {
        let vbo: Vbo = "0/A2B10G10R10_UNORM_PACK32\n0xc0000001".parse().unwrap();

        assert_eq!(vbo.stride(), 4);
        assert_eq!(vbo.raw_data(), &0xc000_0001u32.to_le_bytes());
    }

    #[test]
    fn test_half_and_hex_floats() {
        let vbo: Vbo = "0/R16_SFLOAT 1/R32_SFLOAT\n1.0 0x3f800000".parse().unwrap();

        assert_eq!(&vbo.raw_data()[0..2], &0x3c00u16.to_le_bytes());
        assert_eq!(&vbo.raw_data()[4..8], &1.0f32.to_le_bytes());
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let text = "# leading comment\n\n0/R32_SFLOAT # position\n\n1.5 # first\n   \n# nothing\n2.5\n";
        let vbo: Vbo = text.parse().unwrap();

        assert_eq!(vbo.num_rows(), 2);
        assert_eq!(&vbo.raw_data()[4..8], &2.5f32.to_le_bytes());
    }

    #[test]
    fn test_header_errors() {
        let cases = [
            ("x/R32_SFLOAT", "Invalid attrib location in x/R32_SFLOAT"),
            ("0", "Column headers must be in the form location/format. Got: 0"),
            ("0/R99_SFLOAT", "Unknown format: R99_SFLOAT"),
            ("0/float/vec2/x", "Extra data at end of column header: 0/float/vec2/x"),
            ("0/long/vec2", "Unknown GL type: long"),
            ("0/float/mat4", "Unknown GLSL type: mat4"),
            ("0/float/vec5", "Invalid vec size: vec5"),
            ("0/float/vec", "Invalid vec size: vec"),
            ("0/D24_UNORM_S8_UINT", "Unsupported vertex format: D24_UNORM_S8_UINT"),
            ("0/R32_SFLOAT 1/D24_UNORM_S8_UINT", "Unsupported vertex format: D24_UNORM_S8_UINT"),
        ];

        for (header, message) in cases {
            let error = header.parse::<Vbo>().unwrap_err();
            assert_eq!(error, VboError::InvalidHeader { line: 1, message: message.to_string() }, "{header}");
        }
    }

    #[test]
    fn test_unsupported_format_fails_before_data() {
        let error = "0/D24_UNORM_S8_UINT\n1 2".parse::<Vbo>().unwrap_err();
        assert_eq!(error, VboError::InvalidHeader { line: 1, message: "Unsupported vertex format: D24_UNORM_S8_UINT".to_string() });

        let vbo: Vbo = "0/D32_SFLOAT_S8_UINT\n1.0 2".parse().unwrap();
        assert_eq!(vbo.attribs()[0].offset, 0);
        assert_eq!(&vbo.raw_data()[0..4], &1.0f32.to_le_bytes());
        assert_eq!(vbo.raw_data()[4], 2);
    }

    #[test]
    fn test_data_errors() {
        let error = "0/R8_UINT\n256".parse::<Vbo>().unwrap_err();
        assert_eq!(error, VboError::InvalidData { line: 2, message: "Couldn’t parse as unsigned byte".to_string() });

        let error = "0/R16_SINT\n\nfoo".parse::<Vbo>().unwrap_err();
        assert_eq!(error, VboError::InvalidData { line: 3, message: "Couldn’t parse as signed short".to_string() });

        let error = "0/R32_SFLOAT\n1.0 2.0".parse::<Vbo>().unwrap_err();
        assert_eq!(error, VboError::InvalidData { line: 2, message: "Extra data at end of line".to_string() });
        assert_eq!(error.to_string(), "line 2: Extra data at end of line");
    }

    #[test]
    fn test_missing_header() {
        let error = "# only a comment\n".parse::<Vbo>().unwrap_err();
        assert!(matches!(error, VboError::InvalidHeader { ref message, .. } if message == "Missing header line"));
    }
}
