//! The `[require]` section of a script
//!
//! Each line of the section is one of:
//!
//! ```text
//! framebuffer R8G8B8A8_UNORM
//! depthstencil D24_UNORM_S8_UINT
//! fbsize 64 32
//! vulkan 1.1
//! shaderFloat64
//! VK_KHR_16bit_storage
//! ```
//!
//! The first four adjust the window format or the required API version; anything else
//! that looks like an identifier is added to the requirement set.

use crate::format::Format;
use crate::numbers;
use crate::requirements::Requirements;
use crate::window_format::WindowFormat;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Errors produced by a malformed `[require]` line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequireError {
    #[error("Unknown format: {0}")]
    UnknownFormat(String),
    #[error("Missing format name")]
    MissingFormatName,
    #[error("Invalid fbsize")]
    InvalidFbsize,
    #[error("Invalid Vulkan version")]
    InvalidVersion,
    #[error("Invalid require line")]
    InvalidLine,
}

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(framebuffer|depthstencil|fbsize|vulkan)(?:\s+(.*))?$").unwrap());
static VERSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?$").unwrap());
static NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

fn parse_format(argument: &str) -> Result<&'static Format, RequireError> {
    if argument.is_empty() {
        return Err(RequireError::MissingFormatName);
    }
    Format::lookup_by_name(argument).ok_or_else(|| RequireError::UnknownFormat(argument.to_string()))
}

fn parse_fbsize(argument: &str) -> Result<(usize, usize), RequireError> {
    let (width, tail) = numbers::parse_u32(argument).map_err(|_| RequireError::InvalidFbsize)?;
    let (height, tail) = numbers::parse_u32(tail).map_err(|_| RequireError::InvalidFbsize)?;

    if !tail.trim().is_empty() || width == 0 || height == 0 {
        return Err(RequireError::InvalidFbsize);
    }

    Ok((width as usize, height as usize))
}

fn parse_version(argument: &str) -> Result<(u32, u32, u32), RequireError> {
    let captures = VERSION.captures(argument).ok_or(RequireError::InvalidVersion)?;

    let part = |index: usize| -> Result<u32, RequireError> {
        match captures.get(index) {
            Some(m) => m.as_str().parse::<u32>().map_err(|_| RequireError::InvalidVersion),
            None => Ok(0),
        }
    };

    Ok((part(1)?, part(2)?, part(3)?))
}

/// Applies one line of a `[require]` section
///
/// # Arguments
/// * `line` - The line with comments already stripped; blank lines are ignored
/// * `requirements` - Receives feature, extension and version requests
/// * `window_format` - Receives framebuffer format and size requests
pub fn process_require_line(line: &str, requirements: &mut Requirements, window_format: &mut WindowFormat) -> Result<(), RequireError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }

    if let Some(captures) = DIRECTIVE.captures(line) {
        let argument = captures.get(2).map_or("", |m| m.as_str().trim());

        match &captures[1] {
            "framebuffer" => window_format.color_format = parse_format(argument)?,
            "depthstencil" => window_format.depth_stencil_format = Some(parse_format(argument)?),
            "fbsize" => (window_format.width, window_format.height) = parse_fbsize(argument)?,
            _ => {
                let (major, minor, patch) = parse_version(argument)?;
                requirements.add_version(major, minor, patch);
            }
        }
        return Ok(());
    }

    if NAME.is_match(line) {
        requirements.add(line);
        return Ok(());
    }

    Err(RequireError::InvalidLine)
}
