//! Image and vertex attribute formats
//!
//! Formats are identified by their API names (`R32G32_SFLOAT`, `A2B10G10R10_UNORM_PACK32`).
//! The bit layout of each format is derived from its name once, on first use, so the
//! static table only needs to list names and their integer values.

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// The channel a part of a format stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    R,
    G,
    B,
    A,
    /// Depth
    D,
    /// Stencil
    S,
    /// Unused padding bits
    X,
}

impl Component {
    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'R' => Some(Self::R),
            'G' => Some(Self::G),
            'B' => Some(Self::B),
            'A' => Some(Self::A),
            'D' => Some(Self::D),
            'S' => Some(Self::S),
            'X' => Some(Self::X),
            _ => None,
        }
    }
}

/// How the bits of a part are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Unorm,
    Snorm,
    Uscaled,
    Sscaled,
    Uint,
    Sint,
    Ufloat,
    Sfloat,
    Srgb,
}

impl Mode {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "UNORM" => Some(Self::Unorm),
            "SNORM" => Some(Self::Snorm),
            "USCALED" => Some(Self::Uscaled),
            "SSCALED" => Some(Self::Sscaled),
            "UINT" => Some(Self::Uint),
            "SINT" => Some(Self::Sint),
            "UFLOAT" => Some(Self::Ufloat),
            "SFLOAT" => Some(Self::Sfloat),
            "SRGB" => Some(Self::Srgb),
            _ => None,
        }
    }

    /// Returns true for modes whose values carry a sign
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::Snorm | Self::Sscaled | Self::Sint | Self::Sfloat)
    }
}

/// One component of a format with its bit width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    /// Width of the part in bits
    pub bits: usize,
    /// Channel stored in the part
    pub component: Component,
    /// Numeric interpretation of the bits
    pub mode: Mode,
}

/// A format with its derived bit layout
#[derive(Debug, Clone)]
pub struct Format {
    /// Name without the `VK_FORMAT_` prefix
    pub name: &'static str,
    /// The API's integer value for the format
    pub vk_format: i32,
    packed_size: Option<usize>,
    parts: Vec<Part>,
}

/// Format names and their integer values, in value order
static FORMAT_NAMES: [(&str, i32); 129] = [
    ("R4G4_UNORM_PACK8", 1),
    ("R4G4B4A4_UNORM_PACK16", 2),
    ("B4G4R4A4_UNORM_PACK16", 3),
    ("R5G6B5_UNORM_PACK16", 4),
    ("B5G6R5_UNORM_PACK16", 5),
    ("R5G5B5A1_UNORM_PACK16", 6),
    ("B5G5R5A1_UNORM_PACK16", 7),
    ("A1R5G5B5_UNORM_PACK16", 8),
    ("R8_UNORM", 9),
    ("R8_SNORM", 10),
    ("R8_USCALED", 11),
    ("R8_SSCALED", 12),
    ("R8_UINT", 13),
    ("R8_SINT", 14),
    ("R8_SRGB", 15),
    ("R8G8_UNORM", 16),
    ("R8G8_SNORM", 17),
    ("R8G8_USCALED", 18),
    ("R8G8_SSCALED", 19),
    ("R8G8_UINT", 20),
    ("R8G8_SINT", 21),
    ("R8G8_SRGB", 22),
    ("R8G8B8_UNORM", 23),
    ("R8G8B8_SNORM", 24),
    ("R8G8B8_USCALED", 25),
    ("R8G8B8_SSCALED", 26),
    ("R8G8B8_UINT", 27),
    ("R8G8B8_SINT", 28),
    ("R8G8B8_SRGB", 29),
    ("B8G8R8_UNORM", 30),
    ("B8G8R8_SNORM", 31),
    ("B8G8R8_USCALED", 32),
    ("B8G8R8_SSCALED", 33),
    ("B8G8R8_UINT", 34),
    ("B8G8R8_SINT", 35),
    ("B8G8R8_SRGB", 36),
    ("R8G8B8A8_UNORM", 37),
    ("R8G8B8A8_SNORM", 38),
    ("R8G8B8A8_USCALED", 39),
    ("R8G8B8A8_SSCALED", 40),
    ("R8G8B8A8_UINT", 41),
    ("R8G8B8A8_SINT", 42),
    ("R8G8B8A8_SRGB", 43),
    ("B8G8R8A8_UNORM", 44),
    ("B8G8R8A8_SNORM", 45),
    ("B8G8R8A8_USCALED", 46),
    ("B8G8R8A8_SSCALED", 47),
    ("B8G8R8A8_UINT", 48),
    ("B8G8R8A8_SINT", 49),
    ("B8G8R8A8_SRGB", 50),
    ("A8B8G8R8_UNORM_PACK32", 51),
    ("A8B8G8R8_SNORM_PACK32", 52),
    ("A8B8G8R8_USCALED_PACK32", 53),
    ("A8B8G8R8_SSCALED_PACK32", 54),
    ("A8B8G8R8_UINT_PACK32", 55),
    ("A8B8G8R8_SINT_PACK32", 56),
    ("A8B8G8R8_SRGB_PACK32", 57),
    ("A2R10G10B10_UNORM_PACK32", 58),
    ("A2R10G10B10_SNORM_PACK32", 59),
    ("A2R10G10B10_USCALED_PACK32", 60),
    ("A2R10G10B10_SSCALED_PACK32", 61),
    ("A2R10G10B10_UINT_PACK32", 62),
    ("A2R10G10B10_SINT_PACK32", 63),
    ("A2B10G10R10_UNORM_PACK32", 64),
    ("A2B10G10R10_SNORM_PACK32", 65),
    ("A2B10G10R10_USCALED_PACK32", 66),
    ("A2B10G10R10_SSCALED_PACK32", 67),
    ("A2B10G10R10_UINT_PACK32", 68),
    ("A2B10G10R10_SINT_PACK32", 69),
    ("R16_UNORM", 70),
    ("R16_SNORM", 71),
    ("R16_USCALED", 72),
    ("R16_SSCALED", 73),
    ("R16_UINT", 74),
    ("R16_SINT", 75),
    ("R16_SFLOAT", 76),
    ("R16G16_UNORM", 77),
    ("R16G16_SNORM", 78),
    ("R16G16_USCALED", 79),
    ("R16G16_SSCALED", 80),
    ("R16G16_UINT", 81),
    ("R16G16_SINT", 82),
    ("R16G16_SFLOAT", 83),
    ("R16G16B16_UNORM", 84),
    ("R16G16B16_SNORM", 85),
    ("R16G16B16_USCALED", 86),
    ("R16G16B16_SSCALED", 87),
    ("R16G16B16_UINT", 88),
    ("R16G16B16_SINT", 89),
    ("R16G16B16_SFLOAT", 90),
    ("R16G16B16A16_UNORM", 91),
    ("R16G16B16A16_SNORM", 92),
    ("R16G16B16A16_USCALED", 93),
    ("R16G16B16A16_SSCALED", 94),
    ("R16G16B16A16_UINT", 95),
    ("R16G16B16A16_SINT", 96),
    ("R16G16B16A16_SFLOAT", 97),
    ("R32_UINT", 98),
    ("R32_SINT", 99),
    ("R32_SFLOAT", 100),
    ("R32G32_UINT", 101),
    ("R32G32_SINT", 102),
    ("R32G32_SFLOAT", 103),
    ("R32G32B32_UINT", 104),
    ("R32G32B32_SINT", 105),
    ("R32G32B32_SFLOAT", 106),
    ("R32G32B32A32_UINT", 107),
    ("R32G32B32A32_SINT", 108),
    ("R32G32B32A32_SFLOAT", 109),
    ("R64_UINT", 110),
    ("R64_SINT", 111),
    ("R64_SFLOAT", 112),
    ("R64G64_UINT", 113),
    ("R64G64_SINT", 114),
    ("R64G64_SFLOAT", 115),
    ("R64G64B64_UINT", 116),
    ("R64G64B64_SINT", 117),
    ("R64G64B64_SFLOAT", 118),
    ("R64G64B64A64_UINT", 119),
    ("R64G64B64A64_SINT", 120),
    ("R64G64B64A64_SFLOAT", 121),
    ("B10G11R11_UFLOAT_PACK32", 122),
    ("D16_UNORM", 124),
    ("X8_D24_UNORM_PACK32", 125),
    ("D32_SFLOAT", 126),
    ("S8_UINT", 127),
    ("D16_UNORM_S8_UINT", 128),
    ("D24_UNORM_S8_UINT", 129),
    ("D32_SFLOAT_S8_UINT", 130),
];

/// Formats with a layout that can be derived from the name, sorted by name
static FORMATS: LazyLock<Vec<Format>> = LazyLock::new(|| {
    let mut formats = FORMAT_NAMES.iter().filter_map(|&(name, vk_format)| Format::from_name(name, vk_format)).collect::<Vec<_>>();
    formats.sort_by(|a, b| a.name.cmp(b.name));
    formats
});

/// Splits a name part like `R8G8B8` into its (letter, bits) pairs
fn split_components(part: &str) -> Option<Vec<(char, usize)>> {
    let mut components = Vec::new();
    let mut chars = part.char_indices().peekable();

    while let Some((start, letter)) = chars.next() {
        if !letter.is_ascii_uppercase() {
            return None;
        }
        let digits_start = start + letter.len_utf8();
        let mut digits_end = digits_start;
        while let Some(&(index, c)) = chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            digits_end = index + 1;
            chars.next();
        }
        let bits = part[digits_start..digits_end].parse::<usize>().ok()?;
        components.push((letter, bits));
    }

    (!components.is_empty()).then_some(components)
}

impl Format {
    /// Derives the layout of a format from its name
    ///
    /// Returns None for names that do not describe a plain per-component layout,
    /// such as block-compressed or shared-exponent formats.
    fn from_name(name: &'static str, vk_format: i32) -> Option<Self> {
        let words = name.split('_').collect::<Vec<_>>();
        let mut parts = Vec::new();
        let mut packed_size = None;
        let mut i = 0;

        while i < words.len() {
            let word = words[i];

            if let Some(bits) = word.strip_prefix("PACK") {
                packed_size = Some(bits.parse::<usize>().ok()?);
                i += 1;
                continue;
            }

            let components = split_components(word)?;

            // A lone padding component carries no mode word
            if let [('X', bits)] = components.as_slice() {
                parts.push(Part { bits: *bits, component: Component::X, mode: Mode::Unorm });
                i += 1;
                continue;
            }

            let mode = Mode::from_name(words.get(i + 1)?)?;
            for (letter, bits) in components {
                parts.push(Part { bits, component: Component::from_letter(letter)?, mode });
            }
            i += 2;
        }

        if parts.is_empty() {
            return None;
        }

        Some(Self { name, vk_format, packed_size, parts })
    }

    /// Looks up a format by name
    ///
    /// # Arguments
    /// * `name` - Format name without the `VK_FORMAT_` prefix
    pub fn lookup_by_name(name: &str) -> Option<&'static Format> {
        FORMATS.binary_search_by(|format| format.name.cmp(name)).ok().map(|index| &FORMATS[index])
    }

    /// Looks up a format by its integer value
    pub fn lookup_by_vk_format(vk_format: i32) -> Option<&'static Format> {
        FORMATS.iter().find(|format| format.vk_format == vk_format)
    }

    /// Finds the unpacked RGBA-ordered format with the given per-component layout
    ///
    /// # Arguments
    /// * `bits` - Width of every component
    /// * `mode` - Numeric mode of every component
    /// * `n_components` - Number of components, starting from R
    pub fn lookup_by_details(bits: usize, mode: Mode, n_components: usize) -> Option<&'static Format> {
        const ORDER: [Component; 4] = [Component::R, Component::G, Component::B, Component::A];

        FORMATS.iter().find(|format| {
            format.packed_size.is_none()
                && format.parts.len() == n_components
                && format.parts.iter().zip(ORDER.iter()).all(|(part, &component)| part.bits == bits && part.mode == mode && part.component == component)
        })
    }

    /// Components of the format in memory order
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Size in bits of the whole format when it is packed into one integer
    pub fn packed_size(&self) -> Option<usize> {
        self.packed_size
    }

    /// Size of one element in bytes
    pub fn size(&self) -> usize {
        match self.packed_size {
            Some(bits) => bits / 8,
            None => self.parts.iter().map(|part| part.bits).sum::<usize>() / 8,
        }
    }

    /// Natural alignment of one element in bytes, at least 1
    pub fn alignment(&self) -> usize {
        let bits = match self.packed_size {
            Some(bits) => bits,
            None => self.parts.iter().map(|part| part.bits).max().unwrap_or(8),
        };
        (bits / 8).max(1)
    }

    /// Returns true if the format has a depth or stencil component
    pub fn is_depth_stencil(&self) -> bool {
        self.parts.iter().any(|part| matches!(part.component, Component::D | Component::S))
    }
}

impl PartialEq for Format {
    fn eq(&self, other: &Self) -> bool {
        self.vk_format == other.vk_format
    }
}

impl Eq for Format {}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl Serialize for Format {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_format_is_derived() {
        assert_eq!(FORMATS.len(), FORMAT_NAMES.len());
        for pair in FORMATS.windows(2) {
            assert!(pair[0].name < pair[1].name);
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let format = Format::lookup_by_name("R32G32_SFLOAT").unwrap();
        assert_eq!(format.vk_format, 103);
        assert_eq!(format.size(), 8);
        assert_eq!(format.alignment(), 4);
        assert_eq!(format.parts().len(), 2);
        assert_eq!(format.parts()[1], Part { bits: 32, component: Component::G, mode: Mode::Sfloat });
        assert!(Format::lookup_by_name("R9_UNORM").is_none());
        assert!(Format::lookup_by_name("VK_FORMAT_R8_UNORM").is_none());
    }

    #[test]
    fn test_packed_formats() {
        let format = Format::lookup_by_name("A2B10G10R10_UNORM_PACK32").unwrap();
        assert_eq!(format.packed_size(), Some(32));
        assert_eq!(format.size(), 4);
        assert_eq!(format.alignment(), 4);
        assert_eq!(format.parts()[0].component, Component::A);

        let format = Format::lookup_by_name("R4G4_UNORM_PACK8").unwrap();
        assert_eq!(format.size(), 1);
        assert_eq!(format.alignment(), 1);
    }

    #[test]
    fn test_depth_stencil_formats() {
        let format = Format::lookup_by_name("X8_D24_UNORM_PACK32").unwrap();
        assert_eq!(format.parts()[0], Part { bits: 8, component: Component::X, mode: Mode::Unorm });
        assert!(format.is_depth_stencil());

        let format = Format::lookup_by_name("D16_UNORM_S8_UINT").unwrap();
        assert_eq!(format.size(), 3);
        assert_eq!(format.alignment(), 2);
        assert_eq!(format.parts()[1].mode, Mode::Uint);
        assert!(!Format::lookup_by_name("R8_UNORM").unwrap().is_depth_stencil());
    }

    #[test]
    fn test_lookup_by_details() {
        assert_eq!(Format::lookup_by_details(8, Mode::Sint, 3).unwrap().name, "R8G8B8_SINT");
        assert_eq!(Format::lookup_by_details(16, Mode::Sfloat, 1).unwrap().name, "R16_SFLOAT");
        assert_eq!(Format::lookup_by_details(64, Mode::Sfloat, 4).unwrap().name, "R64G64B64A64_SFLOAT");
        assert!(Format::lookup_by_details(8, Mode::Sfloat, 1).is_none());
    }

    #[test]
    fn test_lookup_by_value() {
        assert_eq!(Format::lookup_by_vk_format(44).unwrap().name, "B8G8R8A8_UNORM");
        assert!(Format::lookup_by_vk_format(0).is_none());
    }
}
