//! Pipeline keys
//!
//! A [`PipelineKey`] is a flat value describing all fixed-function state of one
//! pipeline plus the entry point of every shader stage. Scripts mutate it through
//! textual `name value` assignments; two keys compare equal exactly when they would
//! produce the same pipeline, which makes the key usable as cache identity.

use crate::enums;
use crate::native::{ColorBlendAttachmentState, ColorBlendState, GraphicsPipelineState, TessellationState, VertexSource};
use crate::numbers;
use crate::properties::{N_PROPERTIES, PROPERTIES, PropertyType, PropertyValue, find_property};
use crate::stage::{N_STAGES, Stage, StageSet};
use thiserror::Error;

/// Entry point used for stages without an explicit one
pub const DEFAULT_ENTRY_POINT: &str = "main";

/// Kind of pipeline a key describes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    #[default]
    Graphics,
    Compute,
}

/// Errors returned when assigning a property
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetPropertyError {
    /// No property has the given name
    #[error("Unknown property: {0}")]
    NotFound(String),
    /// The value text could not be parsed for the property's type
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Fixed-function state and entry points of one pipeline
#[derive(Debug, Clone)]
pub struct PipelineKey {
    kind: PipelineKind,
    vertex_source: VertexSource,
    values: [PropertyValue; N_PROPERTIES],
    entry_points: [Option<String>; N_STAGES],
}

impl Default for PipelineKey {
    fn default() -> Self {
        Self {
            kind: PipelineKind::Graphics,
            vertex_source: VertexSource::Rectangle,
            values: std::array::from_fn(|index| PROPERTIES[index].default),
            entry_points: Default::default(),
        }
    }
}

impl PipelineKey {
    /// Creates a graphics key with every property at its baseline value
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: PipelineKind) {
        self.kind = kind;
    }

    pub fn vertex_source(&self) -> VertexSource {
        self.vertex_source
    }

    pub fn set_vertex_source(&mut self, source: VertexSource) {
        self.vertex_source = source;
    }

    /// Current value of a property, or None if no property has that name
    pub fn get(&self, name: &str) -> Option<PropertyValue> {
        find_property(name).map(|(index, _)| self.values[index])
    }

    /// Assigns a property from its textual form
    ///
    /// The value is trimmed and parsed according to the property's type:
    /// * Bool: `true`, `false` or an integer, where any non-zero integer is true
    /// * Int: one or more `|`-separated integers or symbolic names, combined with bitwise OR
    /// * Float: a decimal literal or a `0x` bit pattern
    ///
    /// # Arguments
    /// * `name` - Property name such as `cullMode` or `front.compareOp`
    /// * `value` - Value text
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), SetPropertyError> {
        let (index, property) = find_property(name).ok_or_else(|| SetPropertyError::NotFound(name.to_string()))?;
        let value = value.trim();

        let parsed = match property.value_type() {
            PropertyType::Bool => parse_bool(value).map(PropertyValue::Bool),
            PropertyType::Int => parse_int(property.enum_prefix, value).map(PropertyValue::Int),
            PropertyType::Float => parse_float(value).map(PropertyValue::Float),
        };

        self.values[index] = parsed.ok_or_else(|| SetPropertyError::InvalidValue(value.to_string()))?;
        Ok(())
    }

    /// Sets the entry point of a shader stage
    pub fn set_entrypoint(&mut self, stage: Stage, entry_point: impl Into<String>) {
        self.entry_points[stage.index()] = Some(entry_point.into());
    }

    /// Entry point of a shader stage, `main` unless one was set
    pub fn entrypoint(&self, stage: Stage) -> &str {
        self.entry_points[stage.index()].as_deref().unwrap_or(DEFAULT_ENTRY_POINT)
    }

    /// Builds the native state description of a graphics pipeline
    ///
    /// # Arguments
    /// * `stages` - Stages that have a shader; tessellation state is only produced when
    ///   both tessellation stages are present
    /// * `color_attachment_count` - Number of color attachments, each gets its own blend record
    pub fn materialize(&self, stages: StageSet, color_attachment_count: usize) -> GraphicsPipelineState {
        let mut state = GraphicsPipelineState {
            vertex_source: self.vertex_source,
            entry_points: stages.iter().filter(|&stage| stage != Stage::Compute).map(|stage| (stage, self.entrypoint(stage).to_string())).collect(),
            input_assembly: Default::default(),
            tessellation: Some(TessellationState::default()),
            rasterization: Default::default(),
            color_blend: ColorBlendState {
                attachments: vec![ColorBlendAttachmentState::default(); color_attachment_count],
                ..Default::default()
            },
            depth_stencil: Default::default(),
        };

        for (property, value) in PROPERTIES.iter().zip(self.values.iter()) {
            property.apply(*value, &mut state);
        }

        if !(stages.contains(Stage::TessCtrl) && stages.contains(Stage::TessEval)) {
            state.tessellation = None;
        }

        state
    }
}

impl PartialEq for PipelineKey {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind {
            return false;
        }

        match self.kind {
            PipelineKind::Graphics => {
                self.vertex_source == other.vertex_source
                    && self.values == other.values
                    && Stage::ALL.iter().filter(|&&stage| stage != Stage::Compute).all(|&stage| self.entrypoint(stage) == other.entrypoint(stage))
            }
            PipelineKind::Compute => self.entrypoint(Stage::Compute) == other.entrypoint(Stage::Compute),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => match numbers::parse_i32(value) {
            Ok((v, "")) => Some(v != 0),
            _ => None,
        },
    }
}

/// Parses `term | term | ...` where each term is an integer or a symbolic name
fn parse_int(enum_prefix: Option<&str>, value: &str) -> Option<i32> {
    let mut rest = value;
    let mut result = 0i32;

    loop {
        rest = rest.trim_start();

        if let Ok((v, tail)) = numbers::parse_i32(rest) {
            result |= v;
            rest = tail;
        } else {
            let length = rest.find(|c: char| !c.is_ascii_alphanumeric() && c != '_').unwrap_or(rest.len());
            if length == 0 {
                return None;
            }
            result |= enums::lookup_scoped(enum_prefix, &rest[..length])?;
            rest = &rest[length..];
        }

        rest = rest.trim_start();

        if rest.is_empty() {
            return Some(result);
        }

        rest = rest.strip_prefix('|')?;
    }
}

fn parse_float(value: &str) -> Option<f32> {
    match numbers::parse_f32(value) {
        Ok((v, "")) => Some(v),
        _ => None,
    }
}
