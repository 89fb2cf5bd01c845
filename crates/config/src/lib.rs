//! Configuration compiler for script-driven GPU tests
//!
//! This crate turns the declarative parts of a test script into typed, comparable
//! values: pipeline keys built from `name value` assignments, device requirement sets
//! built from capability names, and packed vertex buffers built from text tables. It
//! never talks to a device; the runner crate negotiates these values against one.

pub mod enums;
pub mod features;
pub mod format;
pub mod native;
pub mod numbers;
pub mod pipeline_key;
pub mod pipeline_set;
pub mod properties;
pub mod require;
pub mod requirements;
pub mod result;
pub mod script;
pub mod stage;
pub mod vbo;
pub mod window_format;

pub use format::Format;
pub use native::{GraphicsPipelineState, VertexSource};
pub use pipeline_key::{PipelineKey, PipelineKind, SetPropertyError};
pub use pipeline_set::PipelineSet;
pub use requirements::{CheckError, DeviceCapabilities, Requirements};
pub use result::TestResult;
pub use script::{LoadError, Script, ScriptBuilder, Shader};
pub use stage::{Stage, StageSet};
pub use vbo::{Vbo, VboError};
pub use window_format::WindowFormat;
