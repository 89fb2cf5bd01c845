//! Translation of materialized pipeline state into wgpu descriptors
//!
//! The state carries raw enum values. Values wgpu cannot express are reported as
//! [`WgpuError::UnsupportedState`] instead of being approximated.

use super::WgpuError;
use super::formats;
use vkscript_config::native::{ColorBlendAttachmentState, StencilOpState};
use vkscript_config::{GraphicsPipelineState, Vbo, VertexSource};

/// Byte stride of the generated rectangle vertices
pub const RECTANGLE_STRIDE: u64 = 3 * std::mem::size_of::<f32>() as u64;

/// Corners of the generated rectangle, drawn as a triangle strip
pub const RECTANGLE_VERTICES: [[f32; 3]; 4] = [[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [-1.0, 1.0, 0.0], [1.0, 1.0, 0.0]];

fn unsupported(what: &str, value: impl std::fmt::Display) -> WgpuError {
    WgpuError::UnsupportedState(format!("{what} {value}"))
}

/// Layout of the single vertex buffer a graphics pipeline reads
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    pub stride: u64,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

impl VertexLayout {
    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

/// Builds the vertex buffer layout for a pipeline's vertex source
///
/// # Arguments
/// * `source` - Where the pipeline takes its vertices from
/// * `vbo` - The script's vertex data, if it has any
pub fn vertex_layout(source: VertexSource, vbo: Option<&Vbo>) -> Result<VertexLayout, WgpuError> {
    match source {
        VertexSource::Rectangle => Ok(VertexLayout {
            stride: RECTANGLE_STRIDE,
            attributes: vec![wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            }],
        }),
        VertexSource::VertexData => {
            let vbo = vbo.ok_or_else(|| WgpuError::UnsupportedState("vertex data pipeline without vertex data".to_string()))?;
            let attributes = vbo
                .attribs()
                .iter()
                .map(|attrib| {
                    let format = formats::vertex_format(attrib.format).ok_or(WgpuError::UnsupportedFormat(attrib.format.name))?;
                    Ok(wgpu::VertexAttribute {
                        format,
                        offset: attrib.offset as u64,
                        shader_location: attrib.location,
                    })
                })
                .collect::<Result<Vec<_>, WgpuError>>()?;

            Ok(VertexLayout { stride: vbo.stride() as u64, attributes })
        }
    }
}

fn topology(value: i32) -> Result<wgpu::PrimitiveTopology, WgpuError> {
    Ok(match value {
        0 => wgpu::PrimitiveTopology::PointList,
        1 => wgpu::PrimitiveTopology::LineList,
        2 => wgpu::PrimitiveTopology::LineStrip,
        3 => wgpu::PrimitiveTopology::TriangleList,
        4 => wgpu::PrimitiveTopology::TriangleStrip,
        _ => return Err(unsupported("topology", value)),
    })
}

/// Primitive assembly and rasterization state
pub fn primitive_state(state: &GraphicsPipelineState) -> Result<wgpu::PrimitiveState, WgpuError> {
    let rasterization = &state.rasterization;

    if rasterization.rasterizer_discard_enable {
        return Err(WgpuError::UnsupportedState("rasterizer discard".to_string()));
    }
    if rasterization.line_width != 1.0 {
        return Err(unsupported("line width", rasterization.line_width));
    }

    let topology = topology(state.input_assembly.topology)?;
    let strip_index_format = match (state.input_assembly.primitive_restart_enable, topology.is_strip()) {
        (true, true) => Some(wgpu::IndexFormat::Uint32),
        (true, false) => return Err(WgpuError::UnsupportedState("primitive restart on a list topology".to_string())),
        (false, _) => None,
    };

    let front_face = match rasterization.front_face {
        0 => wgpu::FrontFace::Ccw,
        1 => wgpu::FrontFace::Cw,
        value => return Err(unsupported("front face", value)),
    };
    let cull_mode = match rasterization.cull_mode {
        0 => None,
        1 => Some(wgpu::Face::Front),
        2 => Some(wgpu::Face::Back),
        value => return Err(unsupported("cull mode", value)),
    };
    let polygon_mode = match rasterization.polygon_mode {
        0 => wgpu::PolygonMode::Fill,
        1 => wgpu::PolygonMode::Line,
        2 => wgpu::PolygonMode::Point,
        value => return Err(unsupported("polygon mode", value)),
    };

    Ok(wgpu::PrimitiveState {
        topology,
        strip_index_format,
        front_face,
        cull_mode,
        unclipped_depth: rasterization.depth_clamp_enable,
        polygon_mode,
        conservative: false,
    })
}

/// Maps a compare op value onto a wgpu compare function
pub fn compare_function(value: i32) -> Result<wgpu::CompareFunction, WgpuError> {
    Ok(match value {
        0 => wgpu::CompareFunction::Never,
        1 => wgpu::CompareFunction::Less,
        2 => wgpu::CompareFunction::Equal,
        3 => wgpu::CompareFunction::LessEqual,
        4 => wgpu::CompareFunction::Greater,
        5 => wgpu::CompareFunction::NotEqual,
        6 => wgpu::CompareFunction::GreaterEqual,
        7 => wgpu::CompareFunction::Always,
        _ => return Err(unsupported("compare op", value)),
    })
}

fn stencil_operation(value: i32) -> Result<wgpu::StencilOperation, WgpuError> {
    Ok(match value {
        0 => wgpu::StencilOperation::Keep,
        1 => wgpu::StencilOperation::Zero,
        2 => wgpu::StencilOperation::Replace,
        3 => wgpu::StencilOperation::IncrementClamp,
        4 => wgpu::StencilOperation::DecrementClamp,
        5 => wgpu::StencilOperation::Invert,
        6 => wgpu::StencilOperation::IncrementWrap,
        7 => wgpu::StencilOperation::DecrementWrap,
        _ => return Err(unsupported("stencil op", value)),
    })
}

fn stencil_face(state: &StencilOpState) -> Result<wgpu::StencilFaceState, WgpuError> {
    Ok(wgpu::StencilFaceState {
        compare: compare_function(state.compare_op)?,
        fail_op: stencil_operation(state.fail_op)?,
        depth_fail_op: stencil_operation(state.depth_fail_op)?,
        pass_op: stencil_operation(state.pass_op)?,
    })
}

/// Depth/stencil state for a window with the given attachment format
///
/// Returns `None` when the window has no depth/stencil attachment. wgpu takes one
/// read and one write mask for both faces, so the faces must agree on them.
pub fn depth_stencil_state(state: &GraphicsPipelineState, format: Option<wgpu::TextureFormat>) -> Result<Option<wgpu::DepthStencilState>, WgpuError> {
    let Some(format) = format else {
        return Ok(None);
    };
    let depth_stencil = &state.depth_stencil;
    let rasterization = &state.rasterization;

    if depth_stencil.depth_bounds_test_enable {
        return Err(WgpuError::UnsupportedState("depth bounds test".to_string()));
    }

    let (depth_write_enabled, depth_compare) = if depth_stencil.depth_test_enable {
        (depth_stencil.depth_write_enable, compare_function(depth_stencil.depth_compare_op)?)
    } else {
        (false, wgpu::CompareFunction::Always)
    };

    let stencil = if depth_stencil.stencil_test_enable {
        let (front, back) = (&depth_stencil.front, &depth_stencil.back);
        if front.compare_mask != back.compare_mask || front.write_mask != back.write_mask {
            return Err(WgpuError::UnsupportedState("different stencil masks per face".to_string()));
        }
        wgpu::StencilState {
            front: stencil_face(front)?,
            back: stencil_face(back)?,
            read_mask: front.compare_mask,
            write_mask: front.write_mask,
        }
    } else {
        wgpu::StencilState::default()
    };

    let bias = if rasterization.depth_bias_enable {
        wgpu::DepthBiasState {
            constant: rasterization.depth_bias_constant_factor as i32,
            slope_scale: rasterization.depth_bias_slope_factor,
            clamp: rasterization.depth_bias_clamp,
        }
    } else {
        wgpu::DepthBiasState::default()
    };

    Ok(Some(wgpu::DepthStencilState {
        format,
        depth_write_enabled,
        depth_compare,
        stencil,
        bias,
    }))
}

fn blend_factor(value: i32) -> Result<wgpu::BlendFactor, WgpuError> {
    Ok(match value {
        0 => wgpu::BlendFactor::Zero,
        1 => wgpu::BlendFactor::One,
        2 => wgpu::BlendFactor::Src,
        3 => wgpu::BlendFactor::OneMinusSrc,
        4 => wgpu::BlendFactor::Dst,
        5 => wgpu::BlendFactor::OneMinusDst,
        6 => wgpu::BlendFactor::SrcAlpha,
        7 => wgpu::BlendFactor::OneMinusSrcAlpha,
        8 => wgpu::BlendFactor::DstAlpha,
        9 => wgpu::BlendFactor::OneMinusDstAlpha,
        10 => wgpu::BlendFactor::Constant,
        11 => wgpu::BlendFactor::OneMinusConstant,
        14 => wgpu::BlendFactor::SrcAlphaSaturated,
        15 => wgpu::BlendFactor::Src1,
        16 => wgpu::BlendFactor::OneMinusSrc1,
        17 => wgpu::BlendFactor::Src1Alpha,
        18 => wgpu::BlendFactor::OneMinusSrc1Alpha,
        _ => return Err(unsupported("blend factor", value)),
    })
}

fn blend_operation(value: i32) -> Result<wgpu::BlendOperation, WgpuError> {
    Ok(match value {
        0 => wgpu::BlendOperation::Add,
        1 => wgpu::BlendOperation::Subtract,
        2 => wgpu::BlendOperation::ReverseSubtract,
        3 => wgpu::BlendOperation::Min,
        4 => wgpu::BlendOperation::Max,
        _ => return Err(unsupported("blend op", value)),
    })
}

fn color_target(attachment: &ColorBlendAttachmentState, format: wgpu::TextureFormat) -> Result<wgpu::ColorTargetState, WgpuError> {
    let blend = if attachment.blend_enable {
        Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: blend_factor(attachment.src_color_blend_factor)?,
                dst_factor: blend_factor(attachment.dst_color_blend_factor)?,
                operation: blend_operation(attachment.color_blend_op)?,
            },
            alpha: wgpu::BlendComponent {
                src_factor: blend_factor(attachment.src_alpha_blend_factor)?,
                dst_factor: blend_factor(attachment.dst_alpha_blend_factor)?,
                operation: blend_operation(attachment.alpha_blend_op)?,
            },
        })
    } else {
        None
    };

    Ok(wgpu::ColorTargetState {
        format,
        blend,
        write_mask: wgpu::ColorWrites::from_bits_truncate(attachment.color_write_mask as u32),
    })
}

/// Color targets, one per blend attachment of the state
pub fn color_target_states(state: &GraphicsPipelineState, format: wgpu::TextureFormat) -> Result<Vec<Option<wgpu::ColorTargetState>>, WgpuError> {
    if state.color_blend.logic_op_enable {
        return Err(WgpuError::UnsupportedState("logic op".to_string()));
    }

    state.color_blend.attachments.iter().map(|attachment| color_target(attachment, format).map(Some)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vkscript_config::{PipelineKey, Stage, StageSet};

    fn materialize(assignments: &[(&str, &str)]) -> GraphicsPipelineState {
        let mut key = PipelineKey::new();
        for (name, value) in assignments {
            key.set(name, value).unwrap();
        }
        let stages: StageSet = [Stage::Vertex, Stage::Fragment].into_iter().collect();
        key.materialize(stages, 1)
    }

    #[test]
    fn test_default_state() {
        let state = materialize(&[]);

        let primitive = primitive_state(&state).unwrap();
        assert_eq!(primitive.topology, wgpu::PrimitiveTopology::TriangleStrip);
        assert_eq!(primitive.cull_mode, None);
        assert_eq!(primitive.polygon_mode, wgpu::PolygonMode::Fill);
        assert_eq!(primitive.strip_index_format, None);

        assert_eq!(depth_stencil_state(&state, None).unwrap(), None);

        let targets = color_target_states(&state, wgpu::TextureFormat::Bgra8Unorm).unwrap();
        assert_eq!(targets.len(), 1);
        let target = targets[0].as_ref().unwrap();
        assert_eq!(target.blend, None);
        assert_eq!(target.write_mask, wgpu::ColorWrites::ALL);
    }

    #[test]
    fn test_rasterization() {
        let state = materialize(&[("topology", "VK_PRIMITIVE_TOPOLOGY_TRIANGLE_LIST"), ("cullMode", "VK_CULL_MODE_BACK_BIT"), ("frontFace", "VK_FRONT_FACE_CLOCKWISE"), ("depthClampEnable", "true")]);

        let primitive = primitive_state(&state).unwrap();
        assert_eq!(primitive.topology, wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(primitive.cull_mode, Some(wgpu::Face::Back));
        assert_eq!(primitive.front_face, wgpu::FrontFace::Cw);
        assert!(primitive.unclipped_depth);
    }

    #[test]
    fn test_unsupported_rasterization() {
        assert!(matches!(primitive_state(&materialize(&[("topology", "VK_PRIMITIVE_TOPOLOGY_PATCH_LIST")])), Err(WgpuError::UnsupportedState(_))));
        assert!(matches!(primitive_state(&materialize(&[("cullMode", "VK_CULL_MODE_FRONT_AND_BACK")])), Err(WgpuError::UnsupportedState(_))));
        assert!(matches!(primitive_state(&materialize(&[("lineWidth", "2.0")])), Err(WgpuError::UnsupportedState(_))));
        assert!(matches!(primitive_state(&materialize(&[("rasterizerDiscardEnable", "true")])), Err(WgpuError::UnsupportedState(_))));
    }

    #[test]
    fn test_depth_stencil() {
        let state = materialize(&[
            ("depthTestEnable", "true"),
            ("depthWriteEnable", "true"),
            ("depthCompareOp", "VK_COMPARE_OP_LESS_OR_EQUAL"),
            ("stencilTestEnable", "true"),
            ("front.passOp", "VK_STENCIL_OP_REPLACE"),
            ("front.compareOp", "VK_COMPARE_OP_ALWAYS"),
            ("back.compareOp", "VK_COMPARE_OP_NEVER"),
        ]);

        let depth_stencil = depth_stencil_state(&state, Some(wgpu::TextureFormat::Depth24PlusStencil8)).unwrap().unwrap();
        assert!(depth_stencil.depth_write_enabled);
        assert_eq!(depth_stencil.depth_compare, wgpu::CompareFunction::LessEqual);
        assert_eq!(depth_stencil.stencil.front.pass_op, wgpu::StencilOperation::Replace);
        assert_eq!(depth_stencil.stencil.front.compare, wgpu::CompareFunction::Always);
        assert_eq!(depth_stencil.stencil.back.compare, wgpu::CompareFunction::Never);
    }

    #[test]
    fn test_depth_test_disabled_ignores_write() {
        let state = materialize(&[("depthWriteEnable", "true")]);
        let depth_stencil = depth_stencil_state(&state, Some(wgpu::TextureFormat::Depth32Float)).unwrap().unwrap();
        assert!(!depth_stencil.depth_write_enabled);
        assert_eq!(depth_stencil.depth_compare, wgpu::CompareFunction::Always);
    }

    #[test]
    fn test_mismatched_stencil_masks() {
        let state = materialize(&[("stencilTestEnable", "true"), ("front.writeMask", "1"), ("back.writeMask", "2")]);
        assert!(matches!(depth_stencil_state(&state, Some(wgpu::TextureFormat::Stencil8)), Err(WgpuError::UnsupportedState(_))));
    }

    #[test]
    fn test_blending() {
        let state = materialize(&[
            ("blendEnable", "true"),
            ("srcColorBlendFactor", "VK_BLEND_FACTOR_SRC_ALPHA"),
            ("dstColorBlendFactor", "VK_BLEND_FACTOR_ONE_MINUS_SRC_ALPHA"),
            ("colorBlendOp", "VK_BLEND_OP_ADD"),
            ("alphaBlendOp", "VK_BLEND_OP_MAX"),
            ("colorWriteMask", "VK_COLOR_COMPONENT_R_BIT|VK_COLOR_COMPONENT_A_BIT"),
        ]);

        let targets = color_target_states(&state, wgpu::TextureFormat::Rgba8Unorm).unwrap();
        let target = targets[0].as_ref().unwrap();
        let blend = target.blend.unwrap();
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert_eq!(blend.alpha.operation, wgpu::BlendOperation::Max);
        assert_eq!(target.write_mask, wgpu::ColorWrites::RED | wgpu::ColorWrites::ALPHA);
    }

    #[test]
    fn test_unsupported_blend_state() {
        let state = materialize(&[("blendEnable", "true"), ("srcColorBlendFactor", "VK_BLEND_FACTOR_CONSTANT_ALPHA")]);
        assert!(matches!(color_target_states(&state, wgpu::TextureFormat::Rgba8Unorm), Err(WgpuError::UnsupportedState(_))));

        let state = materialize(&[("logicOpEnable", "true")]);
        assert!(matches!(color_target_states(&state, wgpu::TextureFormat::Rgba8Unorm), Err(WgpuError::UnsupportedState(_))));
    }

    #[test]
    fn test_vertex_layouts() {
        let rectangle = vertex_layout(VertexSource::Rectangle, None).unwrap();
        assert_eq!(rectangle.stride, 12);
        assert_eq!(rectangle.attributes.len(), 1);

        assert!(vertex_layout(VertexSource::VertexData, None).is_err());

        let vbo: Vbo = "0/R32G32_SFLOAT 1/R8G8B8A8_UNORM\n0 0 1 2 3 4\n".parse().unwrap();
        let layout = vertex_layout(VertexSource::VertexData, Some(&vbo)).unwrap();
        assert_eq!(layout.stride, vbo.stride() as u64);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(layout.attributes[1].format, wgpu::VertexFormat::Unorm8x4);
        assert_eq!(layout.attributes[1].offset, 8);
        assert_eq!(layout.attributes[1].shader_location, 1);
    }
}
