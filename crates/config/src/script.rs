//! Test scripts
//!
//! A [`Script`] holds everything the engine needs from one test: its device
//! requirements, the framebuffer it renders into, the pipeline keys it uses, its
//! vertex data and its SPIR-V shaders. Scripts are assembled with a [`ScriptBuilder`]
//! or loaded from the sectioned text format:
//!
//! ```text
//! [require]
//! shaderFloat64
//! framebuffer R8G8B8A8_UNORM
//!
//! [vertex shader spirv binary]
//! 07230203 00010000 ...
//!
//! [vertex data]
//! 0/R32G32_SFLOAT
//! -1 -1
//!
//! [pipeline]
//! topology VK_PRIMITIVE_TOPOLOGY_TRIANGLE_LIST
//! cullMode BACK
//!
//! lineWidth 2.0
//! entrypoint fragment shade
//! ```
//!
//! In a `[pipeline]` section each block of assignments separated by blank lines
//! describes one pipeline key.

use crate::pipeline_key::{PipelineKey, PipelineKind, SetPropertyError};
use crate::native::VertexSource;
use crate::require::{RequireError, process_require_line};
use crate::requirements::Requirements;
use crate::stage::{Stage, StageSet};
use crate::vbo::{self, Vbo, VboError};
use crate::window_format::WindowFormat;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Errors produced while loading a script
#[derive(Debug, Error)]
pub enum LoadError {
    /// Malformed script structure
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    /// Malformed `[require]` line
    #[error("line {line}: {source}")]
    Require { line: usize, source: RequireError },
    /// Unknown property or malformed value in a `[pipeline]` section
    #[error("line {line}: {source}")]
    Property { line: usize, source: SetPropertyError },
    /// Malformed vertex data; the line number is relative to the script
    #[error(transparent)]
    VertexData(VboError),
    /// The script file could not be read
    #[error("{}: {}", .path.display(), .source)]
    Io { path: PathBuf, source: std::io::Error },
}

/// A SPIR-V module for one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shader {
    pub stage: Stage,
    pub words: Vec<u32>,
}

/// Everything one test needs from the engine
#[derive(Debug, Clone)]
pub struct Script {
    requirements: Requirements,
    window_format: WindowFormat,
    pipeline_keys: Vec<PipelineKey>,
    vertex_data: Option<Vbo>,
    shaders: Vec<Shader>,
}

impl Script {
    /// Loads a script from text
    ///
    /// # Arguments
    /// * `source` - The whole script
    ///
    /// # Returns
    /// The script, or the first error with its line number
    pub fn load(source: &str) -> Result<Script, LoadError> {
        let mut loader = Loader::default();

        for (index, line) in source.lines().enumerate() {
            loader.line_num = index + 1;
            loader.process_line(line)?;
        }

        loader.end_section()?;
        Ok(loader.builder.build())
    }

    /// Loads a script from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Script, LoadError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
        tracing::debug!(path = %path.display(), "loading script");
        Script::load(&source)
    }

    pub fn requirements(&self) -> &Requirements {
        &self.requirements
    }

    pub fn window_format(&self) -> &WindowFormat {
        &self.window_format
    }

    /// Pipeline keys in the order the script declares them
    pub fn pipeline_keys(&self) -> &[PipelineKey] {
        &self.pipeline_keys
    }

    pub fn vertex_data(&self) -> Option<&Vbo> {
        self.vertex_data.as_ref()
    }

    pub fn shaders(&self) -> &[Shader] {
        &self.shaders
    }

    /// SPIR-V words of a stage's shader, if the script has one
    pub fn shader(&self, stage: Stage) -> Option<&[u32]> {
        self.shaders.iter().find(|shader| shader.stage == stage).map(|shader| shader.words.as_slice())
    }

    /// Stages that have a shader
    pub fn stages(&self) -> StageSet {
        self.shaders.iter().map(|shader| shader.stage).collect()
    }
}

/// Assembles a [`Script`] piece by piece
///
/// This is the interface a script source uses to hand the engine its pipeline
/// assignments, capability names, vertex data and shaders.
#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder {
    requirements: Requirements,
    window_format: WindowFormat,
    pipeline_keys: Vec<PipelineKey>,
    vertex_data: Option<Vbo>,
    shaders: Vec<Shader>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a feature or extension by name
    pub fn require(mut self, name: &str) -> Self {
        self.requirements.add(name);
        self
    }

    /// Requests a minimum API version
    pub fn require_version(mut self, major: u32, minor: u32, patch: u32) -> Self {
        self.requirements.add_version(major, minor, patch);
        self
    }

    pub fn window_format(mut self, window_format: WindowFormat) -> Self {
        self.window_format = window_format;
        self
    }

    /// Adds a pipeline key built from `name value` assignments applied in order
    pub fn pipeline<'a>(mut self, assignments: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self, SetPropertyError> {
        let mut key = PipelineKey::new();
        for (name, value) in assignments {
            key.set(name, value)?;
        }
        self.pipeline_keys.push(key);
        Ok(self)
    }

    /// Adds a ready-made pipeline key
    pub fn pipeline_key(mut self, key: PipelineKey) -> Self {
        self.pipeline_keys.push(key);
        self
    }

    /// Parses and sets the vertex data table
    pub fn vertex_data(mut self, text: &str) -> Result<Self, VboError> {
        self.vertex_data = Some(text.parse()?);
        Ok(self)
    }

    /// Sets the shader of a stage, replacing any earlier one
    pub fn shader(mut self, stage: Stage, words: Vec<u32>) -> Self {
        self.shaders.retain(|shader| shader.stage != stage);
        self.shaders.push(Shader { stage, words });
        self
    }

    /// Finishes the script
    ///
    /// A script without pipeline keys gets one default key, a compute key when
    /// the only shader is a compute shader.
    pub fn build(mut self) -> Script {
        if self.pipeline_keys.is_empty() {
            let mut key = PipelineKey::new();
            if !self.shaders.is_empty() && self.shaders.iter().all(|shader| shader.stage == Stage::Compute) {
                key.set_kind(PipelineKind::Compute);
            }
            self.pipeline_keys.push(key);
        }

        self.shaders.sort_by_key(|shader| shader.stage);

        Script {
            requirements: self.requirements,
            window_format: self.window_format,
            pipeline_keys: self.pipeline_keys,
            vertex_data: self.vertex_data,
            shaders: self.shaders,
        }
    }
}

static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[([^\]]*)\](.*)$").unwrap());
static SHADER_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+?)\s+shader\s+spirv\s+binary$").unwrap());
static ENTRYPOINT: LazyLock<Regex> = LazyLock::new(|| {
    let stages = Stage::ALL.iter().map(|stage| stage.name()).collect::<Vec<_>>().join("|");
    Regex::new(&format!(r"^entrypoint\s+({stages})\s+(\S+)$")).unwrap()
});

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Section {
    #[default]
    None,
    Comment,
    Require,
    VertexData,
    Shader(Stage),
    Pipeline,
}

/// Strips a `#` comment and surrounding whitespace, None for blank lines
fn trim_line_or_skip(line: &str) -> Option<&str> {
    let line = line.split_once('#').map_or(line, |(line, _)| line).trim();
    (!line.is_empty()).then_some(line)
}

#[derive(Debug, Default)]
struct Loader {
    builder: ScriptBuilder,
    section: Section,
    had_sections: bool,
    line_num: usize,
    vbo_parser: Option<(vbo::Parser, usize)>,
    shader_words: Vec<u32>,
    key: PipelineKey,
    key_dirty: bool,
    keys_in_section: usize,
}

impl Loader {
    fn syntax_error<T>(&self, message: impl Into<String>) -> Result<T, LoadError> {
        Err(LoadError::Syntax { line: self.line_num, message: message.into() })
    }

    fn process_line(&mut self, line: &str) -> Result<(), LoadError> {
        if line.starts_with('[') {
            return self.process_section_header(line);
        }

        match self.section {
            Section::None => match trim_line_or_skip(line) {
                Some(_) => self.syntax_error("expected empty line"),
                None => Ok(()),
            },
            Section::Comment => Ok(()),
            Section::Require => match trim_line_or_skip(line) {
                Some(line) => {
                    process_require_line(line, &mut self.builder.requirements, &mut self.builder.window_format).map_err(|source| LoadError::Require { line: self.line_num, source })
                }
                None => Ok(()),
            },
            Section::VertexData => self.process_vertex_data_line(line),
            Section::Shader(_) => self.process_shader_line(line),
            Section::Pipeline => self.process_pipeline_line(line),
        }
    }

    fn process_section_header(&mut self, line: &str) -> Result<(), LoadError> {
        self.end_section()?;

        let Some(captures) = SECTION_HEADER.captures(line.trim_end()) else {
            return self.syntax_error("Missing ‘]’");
        };
        if !captures[2].trim().is_empty() {
            return self.syntax_error("Trailing data after ‘]’");
        }

        let name = captures[1].trim();
        let section = self.section_for_name(name)?;

        if section != Section::Comment {
            self.had_sections = true;
        }
        self.section = section;

        tracing::trace!(line = self.line_num, section = name, "entering section");
        Ok(())
    }

    fn section_for_name(&mut self, name: &str) -> Result<Section, LoadError> {
        if let Some(captures) = SHADER_HEADER.captures(name) {
            let stage = match captures[1].parse::<Stage>() {
                Ok(stage) => stage,
                Err(error) => return self.syntax_error(error.to_string()),
            };
            if self.builder.shaders.iter().any(|shader| shader.stage == stage) {
                return self.syntax_error(format!("Duplicate {stage} shader"));
            }
            self.shader_words.clear();
            return Ok(Section::Shader(stage));
        }

        match name {
            "comment" => Ok(Section::Comment),
            "require" => {
                if self.had_sections {
                    return self.syntax_error("[require] must be the first section");
                }
                Ok(Section::Require)
            }
            "vertex data" => {
                if self.builder.vertex_data.is_some() {
                    return self.syntax_error("Duplicate vertex data section");
                }
                self.vbo_parser = Some((vbo::Parser::new(), self.line_num));
                Ok(Section::VertexData)
            }
            "pipeline" => {
                self.key = PipelineKey::new();
                self.key_dirty = false;
                self.keys_in_section = 0;
                Ok(Section::Pipeline)
            }
            _ => self.syntax_error(format!("Unknown section “{name}”")),
        }
    }

    fn end_section(&mut self) -> Result<(), LoadError> {
        match self.section {
            Section::VertexData => {
                if let Some((parser, header_line)) = self.vbo_parser.take() {
                    let vbo = parser.into_vbo().map_err(|error| relocate(error, header_line))?;
                    self.builder.vertex_data = Some(vbo);
                }
            }
            Section::Shader(stage) => {
                let words = std::mem::take(&mut self.shader_words);
                self.builder.shaders.push(Shader { stage, words });
            }
            Section::Pipeline => {
                if self.key_dirty || self.keys_in_section == 0 {
                    self.finish_key();
                }
            }
            Section::None | Section::Comment | Section::Require => {}
        }

        self.section = Section::None;
        Ok(())
    }

    fn process_vertex_data_line(&mut self, line: &str) -> Result<(), LoadError> {
        let Some((parser, header_line)) = self.vbo_parser.as_mut() else {
            return Ok(());
        };
        let header_line = *header_line;
        parser.parse_line(line).map_err(|error| relocate(error, header_line))
    }

    fn process_shader_line(&mut self, line: &str) -> Result<(), LoadError> {
        let Some(line) = trim_line_or_skip(line) else {
            return Ok(());
        };

        for word in line.split_whitespace() {
            match u32::from_str_radix(word, 16) {
                Ok(value) => self.shader_words.push(value),
                Err(_) => return self.syntax_error(format!("Invalid hex value: {word}")),
            }
        }

        Ok(())
    }

    fn finish_key(&mut self) {
        let key = std::mem::take(&mut self.key);
        self.builder.pipeline_keys.push(key);
        self.key_dirty = false;
        self.keys_in_section += 1;
    }

    fn process_pipeline_line(&mut self, line: &str) -> Result<(), LoadError> {
        let Some(line) = trim_line_or_skip(line) else {
            // A blank line closes the current key
            if self.key_dirty {
                self.finish_key();
            }
            return Ok(());
        };

        self.key_dirty = true;

        if let Some(captures) = ENTRYPOINT.captures(line) {
            let stage = captures[1].parse::<Stage>().map_err(|error| LoadError::Syntax { line: self.line_num, message: error.to_string() })?;
            self.key.set_entrypoint(stage, &captures[2]);
            return Ok(());
        }

        let (name, value) = line.split_once(char::is_whitespace).map_or((line, ""), |(name, value)| (name, value.trim()));

        match name {
            "entrypoint" => self.syntax_error("Invalid entrypoint line"),
            "kind" => {
                let kind = match value {
                    "graphics" => PipelineKind::Graphics,
                    "compute" => PipelineKind::Compute,
                    _ => return self.syntax_error(format!("Invalid pipeline kind: {value}")),
                };
                self.key.set_kind(kind);
                Ok(())
            }
            "vertexSource" => {
                let source = match value {
                    "rectangle" => VertexSource::Rectangle,
                    "vertex_data" => VertexSource::VertexData,
                    _ => return self.syntax_error(format!("Invalid vertex source: {value}")),
                };
                self.key.set_vertex_source(source);
                Ok(())
            }
            _ => self.key.set(name, value).map_err(|source| LoadError::Property { line: self.line_num, source }),
        }
    }
}

/// Turns a section-relative vertex data error into a script-relative one
fn relocate(error: VboError, header_line: usize) -> LoadError {
    LoadError::VertexData(match error {
        VboError::InvalidHeader { line, message } => VboError::InvalidHeader { line: header_line + line, message },
        VboError::InvalidData { line, message } => VboError::InvalidData { line: header_line + line, message },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::PropertyValue;
    use crate::requirements::make_version;

    #[test]
    fn test_line_patterns() {
        assert_eq!(&SECTION_HEADER.captures("[vertex data] x").unwrap()[2], " x");
        assert_eq!(&SHADER_HEADER.captures("tessellation control shader spirv binary").unwrap()[1], "tessellation control");
        let entrypoint = ENTRYPOINT.captures("entrypoint tessellation evaluation te_main").unwrap();
        assert_eq!((&entrypoint[1], &entrypoint[2]), ("tessellation evaluation", "te_main"));
    }

    #[test]
    fn test_load_full_script() {
        let script = Script::load(
            "# leading comment\n\
             [comment]\n\
             anything goes here\n\
             [require]\n\
             framebuffer R8G8B8A8_UNORM\n\
             depthstencil D24_UNORM_S8_UINT\n\
             vulkan 1.1\n\
             shaderFloat64\n\
             \n\
             [vertex shader spirv binary]\n\
             07230203 00010000\n\
             0000000b\n\
             [fragment shader spirv binary]\n\
             07230203\n\
             [vertex data]\n\
             0/R32G32_SFLOAT\n\
             0.5 -0.5\n\
             1 1\n\
             [pipeline]\n\
             topology VK_PRIMITIVE_TOPOLOGY_TRIANGLE_LIST\n\
             cullMode BACK\n\
             vertexSource vertex_data\n\
             \n\
             \n\
             lineWidth 2.0\n\
             entrypoint fragment shade\n",
        )
        .unwrap();

        assert_eq!(script.window_format().color_format.name, "R8G8B8A8_UNORM");
        assert_eq!(script.window_format().depth_stencil_format.map(|f| f.name), Some("D24_UNORM_S8_UINT"));
        assert_eq!(script.requirements().version(), make_version(1, 1, 0));
        assert!(script.requirements().feature_names().any(|name| name == "shaderFloat64"));

        assert_eq!(script.shader(Stage::Vertex), Some([0x0723_0203, 0x0001_0000, 0x0000_000b].as_slice()));
        assert_eq!(script.shader(Stage::Fragment), Some([0x0723_0203].as_slice()));
        assert_eq!(script.stages().iter().collect::<Vec<_>>(), vec![Stage::Vertex, Stage::Fragment]);

        let vbo = script.vertex_data().unwrap();
        assert_eq!(vbo.num_rows(), 2);
        assert_eq!(vbo.stride(), 8);

        let keys = script.pipeline_keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].get("topology"), Some(PropertyValue::Int(3)));
        assert_eq!(keys[0].get("cullMode"), Some(PropertyValue::Int(2)));
        assert_eq!(keys[0].vertex_source(), VertexSource::VertexData);
        assert_eq!(keys[1].get("lineWidth"), Some(PropertyValue::Float(2.0)));
        assert_eq!(keys[1].entrypoint(Stage::Fragment), "shade");
        assert_eq!(keys[1].entrypoint(Stage::Vertex), "main");
    }

    #[test]
    fn test_empty_pipeline_section_gives_default_key() {
        let script = Script::load("[pipeline]\n[comment]\n").unwrap();
        assert_eq!(script.pipeline_keys(), [PipelineKey::new()]);
    }

    #[test]
    fn test_compute_only_script() {
        let script = Script::load("[compute shader spirv binary]\n07230203\n").unwrap();

        assert_eq!(script.pipeline_keys().len(), 1);
        assert_eq!(script.pipeline_keys()[0].kind(), PipelineKind::Compute);
        assert!(script.vertex_data().is_none());
    }

    #[test]
    fn test_explicit_compute_key() {
        let script = Script::load("[pipeline]\nkind compute\nentrypoint compute run\n").unwrap();

        let key = &script.pipeline_keys()[0];
        assert_eq!(key.kind(), PipelineKind::Compute);
        assert_eq!(key.entrypoint(Stage::Compute), "run");
    }

    #[test]
    fn test_builder() {
        let script = ScriptBuilder::new()
            .require("VK_KHR_multiview")
            .require_version(1, 2, 0)
            .pipeline([("cullMode", "FRONT|BACK"), ("depthTestEnable", "true")])
            .unwrap()
            .vertex_data("0/R8_UINT\n1\n2")
            .unwrap()
            .shader(Stage::Fragment, vec![1])
            .shader(Stage::Vertex, vec![2])
            .build();

        assert_eq!(script.requirements().extensions(), ["VK_KHR_multiview"]);
        assert_eq!(script.pipeline_keys()[0].get("cullMode"), Some(PropertyValue::Int(3)));
        assert_eq!(script.vertex_data().map(Vbo::num_rows), Some(2));
        assert_eq!(script.shaders()[0].stage, Stage::Vertex);
    }

    #[test]
    fn test_builder_rejects_unknown_property() {
        let error = ScriptBuilder::new().pipeline([("bogus", "1")]).unwrap_err();
        assert_eq!(error, SetPropertyError::NotFound("bogus".to_string()));
    }

    fn error_text(source: &str) -> String {
        Script::load(source).unwrap_err().to_string()
    }

    #[test]
    fn test_errors() {
        assert_eq!(error_text("stray text"), "line 1: expected empty line");
        assert_eq!(error_text("[require"), "line 1: Missing ‘]’");
        assert_eq!(error_text("[require] extra"), "line 1: Trailing data after ‘]’");
        assert_eq!(error_text("[bogus]"), "line 1: Unknown section “bogus”");
        assert_eq!(error_text("[pipeline]\n[require]"), "line 2: [require] must be the first section");
        assert_eq!(error_text("[require]\nframebuffer R9_UNORM"), "line 2: Unknown format: R9_UNORM");
        assert_eq!(error_text("[pipeline]\n\ncullMode bogus"), "line 3: Invalid value: bogus");
        assert_eq!(error_text("[pipeline]\nnotAProperty 1"), "line 2: Unknown property: notAProperty");
        assert_eq!(error_text("[pipeline]\nkind sideways"), "line 2: Invalid pipeline kind: sideways");
        assert_eq!(error_text("[pipeline]\nentrypoint somewhere main"), "line 2: Invalid entrypoint line");
        assert_eq!(error_text("[vertex shader spirv binary]\nxyz"), "line 2: Invalid hex value: xyz");
        assert_eq!(error_text("[pixel shader spirv binary]"), "line 1: Unknown shader stage: pixel");
        assert_eq!(error_text("[vertex shader spirv binary]\n[vertex shader spirv binary]"), "line 2: Duplicate vertex shader");
        assert_eq!(error_text("[vertex data]\n0/R8_UINT\n[vertex data]"), "line 3: Duplicate vertex data section");
        assert_eq!(error_text("[comment]\n[vertex data]\n0/R8_UINT\n\n300"), "line 5: Couldn’t parse as unsigned byte");
        assert_eq!(error_text("[vertex data]\n0/R8_BOGUS"), "line 2: Unknown format: R8_BOGUS");
    }
}
