//! Native fixed-function pipeline state
//!
//! These records mirror the API's pipeline-state sub-structures field for field and
//! hold raw API values (`VK_COMPARE_OP_LESS` is stored as `1`). They are produced by
//! materializing a [`PipelineKey`](crate::PipelineKey) and consumed by whatever creates
//! the pipeline object.

use crate::stage::Stage;
use serde::Serialize;

/// Primitive assembly state
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct InputAssemblyState {
    pub topology: i32,
    pub primitive_restart_enable: bool,
}

/// Tessellation state, only present when both tessellation stages are
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TessellationState {
    pub patch_control_points: u32,
}

/// Rasterizer state
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RasterizationState {
    pub depth_clamp_enable: bool,
    pub rasterizer_discard_enable: bool,
    pub polygon_mode: i32,
    pub cull_mode: i32,
    pub front_face: i32,
    pub depth_bias_enable: bool,
    pub depth_bias_constant_factor: f32,
    pub depth_bias_clamp: f32,
    pub depth_bias_slope_factor: f32,
    pub line_width: f32,
}

/// Blend state of a single color attachment
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ColorBlendAttachmentState {
    pub blend_enable: bool,
    pub src_color_blend_factor: i32,
    pub dst_color_blend_factor: i32,
    pub color_blend_op: i32,
    pub src_alpha_blend_factor: i32,
    pub dst_alpha_blend_factor: i32,
    pub alpha_blend_op: i32,
    pub color_write_mask: i32,
}

/// Blend state shared by all color attachments plus one record per attachment
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ColorBlendState {
    pub logic_op_enable: bool,
    pub logic_op: i32,
    pub attachments: Vec<ColorBlendAttachmentState>,
}

/// Stencil operations for one face
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct StencilOpState {
    pub fail_op: i32,
    pub pass_op: i32,
    pub depth_fail_op: i32,
    pub compare_op: i32,
    pub compare_mask: u32,
    pub write_mask: u32,
    pub reference: u32,
}

/// Depth and stencil test state
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: i32,
    pub depth_bounds_test_enable: bool,
    pub stencil_test_enable: bool,
    pub front: StencilOpState,
    pub back: StencilOpState,
    pub min_depth_bounds: f32,
    pub max_depth_bounds: f32,
}

/// Where a graphics pipeline takes its vertices from
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexSource {
    /// A generated rectangle with positions only
    #[default]
    Rectangle,
    /// The script's vertex data table
    VertexData,
}

/// Everything needed to create one graphics pipeline apart from the shader modules
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphicsPipelineState {
    pub vertex_source: VertexSource,
    /// Entry point of every stage that has a shader, in pipeline order
    pub entry_points: Vec<(Stage, String)>,
    pub input_assembly: InputAssemblyState,
    pub tessellation: Option<TessellationState>,
    pub rasterization: RasterizationState,
    pub color_blend: ColorBlendState,
    pub depth_stencil: DepthStencilState,
}
