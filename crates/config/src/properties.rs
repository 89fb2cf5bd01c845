//! Pipeline property table
//!
//! Every fixed-function setting a script can change is declared once here, with its
//! name, its default, the native sub-structure it belongs to and an accessor that
//! writes a value into that sub-structure. The pipeline key stores one value per entry
//! and drives both parsing and materialization from this table.

use crate::native::{ColorBlendAttachmentState, GraphicsPipelineState};
use serde::Serialize;
use std::fmt;

/// Value type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Bool,
    Int,
    Float,
}

/// A typed property value
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl PropertyValue {
    /// Type of the value
    pub fn value_type(&self) -> PropertyType {
        match self {
            Self::Bool(_) => PropertyType::Bool,
            Self::Int(_) => PropertyType::Int,
            Self::Float(_) => PropertyType::Float,
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            // Numeric: 0.0 equals -0.0 and NaN never equals anything
            (Self::Float(a), Self::Float(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Native sub-structure a property is materialized into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateGroup {
    InputAssembly,
    Tessellation,
    Rasterization,
    ColorBlend,
    /// Repeated once per color attachment
    ColorBlendAttachment,
    DepthStencil,
}

/// Writes a property value into its native field
#[derive(Clone, Copy)]
pub enum Accessor {
    Bool(fn(&mut GraphicsPipelineState, bool)),
    Int(fn(&mut GraphicsPipelineState, i32)),
    Float(fn(&mut GraphicsPipelineState, f32)),
    AttachmentBool(fn(&mut ColorBlendAttachmentState, bool)),
    AttachmentInt(fn(&mut ColorBlendAttachmentState, i32)),
}

/// Declaration of one settable pipeline property
#[derive(Clone, Copy)]
pub struct PropertyDescriptor {
    /// Name used in scripts
    pub name: &'static str,
    /// Native sub-structure the property belongs to
    pub group: StateGroup,
    /// Baseline value of every new key
    pub default: PropertyValue,
    /// Family prefix for symbolic values, so `BACK` can stand for `VK_CULL_MODE_BACK_BIT`
    pub enum_prefix: Option<&'static str>,
    accessor: Accessor,
}

impl PropertyDescriptor {
    /// Value type accepted by the property
    pub fn value_type(&self) -> PropertyType {
        self.default.value_type()
    }

    /// Writes `value` into the property's field of `state`
    ///
    /// Per-attachment properties are written into every attachment record.
    pub fn apply(&self, value: PropertyValue, state: &mut GraphicsPipelineState) {
        match (self.accessor, value) {
            (Accessor::Bool(write), PropertyValue::Bool(v)) => write(state, v),
            (Accessor::Int(write), PropertyValue::Int(v)) => write(state, v),
            (Accessor::Float(write), PropertyValue::Float(v)) => write(state, v),
            (Accessor::AttachmentBool(write), PropertyValue::Bool(v)) => state.color_blend.attachments.iter_mut().for_each(|attachment| write(attachment, v)),
            (Accessor::AttachmentInt(write), PropertyValue::Int(v)) => state.color_blend.attachments.iter_mut().for_each(|attachment| write(attachment, v)),
            _ => unreachable!("property {} holds a {:?} value", self.name, value.value_type()),
        }
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor").field("name", &self.name).field("group", &self.group).field("default", &self.default).finish()
    }
}

/// Number of pipeline properties
pub const N_PROPERTIES: usize = 44;

/// All pipeline properties, sorted by name
pub static PROPERTIES: [PropertyDescriptor; N_PROPERTIES] = [
    PropertyDescriptor {
        name: "alphaBlendOp",
        group: StateGroup::ColorBlendAttachment,
        default: PropertyValue::Int(0),
        enum_prefix: Some("VK_BLEND_OP_"),
        accessor: Accessor::AttachmentInt(|a, v| a.alpha_blend_op = v),
    },
    PropertyDescriptor {
        name: "back.compareMask",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Int(-1),
        enum_prefix: None,
        accessor: Accessor::Int(|s, v| s.depth_stencil.back.compare_mask = v as u32),
    },
    PropertyDescriptor {
        name: "back.compareOp",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Int(7),
        enum_prefix: Some("VK_COMPARE_OP_"),
        accessor: Accessor::Int(|s, v| s.depth_stencil.back.compare_op = v),
    },
    PropertyDescriptor {
        name: "back.depthFailOp",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Int(0),
        enum_prefix: Some("VK_STENCIL_OP_"),
        accessor: Accessor::Int(|s, v| s.depth_stencil.back.depth_fail_op = v),
    },
    PropertyDescriptor {
        name: "back.failOp",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Int(0),
        enum_prefix: Some("VK_STENCIL_OP_"),
        accessor: Accessor::Int(|s, v| s.depth_stencil.back.fail_op = v),
    },
    PropertyDescriptor {
        name: "back.passOp",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Int(0),
        enum_prefix: Some("VK_STENCIL_OP_"),
        accessor: Accessor::Int(|s, v| s.depth_stencil.back.pass_op = v),
    },
    PropertyDescriptor {
        name: "back.reference",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Int(0),
        enum_prefix: None,
        accessor: Accessor::Int(|s, v| s.depth_stencil.back.reference = v as u32),
    },
    PropertyDescriptor {
        name: "back.writeMask",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Int(-1),
        enum_prefix: None,
        accessor: Accessor::Int(|s, v| s.depth_stencil.back.write_mask = v as u32),
    },
    PropertyDescriptor {
        name: "blendEnable",
        group: StateGroup::ColorBlendAttachment,
        default: PropertyValue::Bool(false),
        enum_prefix: None,
        accessor: Accessor::AttachmentBool(|a, v| a.blend_enable = v),
    },
    PropertyDescriptor {
        name: "colorBlendOp",
        group: StateGroup::ColorBlendAttachment,
        default: PropertyValue::Int(0),
        enum_prefix: Some("VK_BLEND_OP_"),
        accessor: Accessor::AttachmentInt(|a, v| a.color_blend_op = v),
    },
    PropertyDescriptor {
        name: "colorWriteMask",
        group: StateGroup::ColorBlendAttachment,
        default: PropertyValue::Int(15),
        enum_prefix: Some("VK_COLOR_COMPONENT_"),
        accessor: Accessor::AttachmentInt(|a, v| a.color_write_mask = v),
    },
    PropertyDescriptor {
        name: "cullMode",
        group: StateGroup::Rasterization,
        default: PropertyValue::Int(0),
        enum_prefix: Some("VK_CULL_MODE_"),
        accessor: Accessor::Int(|s, v| s.rasterization.cull_mode = v),
    },
    PropertyDescriptor {
        name: "depthBiasClamp",
        group: StateGroup::Rasterization,
        default: PropertyValue::Float(0.0),
        enum_prefix: None,
        accessor: Accessor::Float(|s, v| s.rasterization.depth_bias_clamp = v),
    },
    PropertyDescriptor {
        name: "depthBiasConstantFactor",
        group: StateGroup::Rasterization,
        default: PropertyValue::Float(0.0),
        enum_prefix: None,
        accessor: Accessor::Float(|s, v| s.rasterization.depth_bias_constant_factor = v),
    },
    PropertyDescriptor {
        name: "depthBiasEnable",
        group: StateGroup::Rasterization,
        default: PropertyValue::Bool(false),
        enum_prefix: None,
        accessor: Accessor::Bool(|s, v| s.rasterization.depth_bias_enable = v),
    },
    PropertyDescriptor {
        name: "depthBiasSlopeFactor",
        group: StateGroup::Rasterization,
        default: PropertyValue::Float(0.0),
        enum_prefix: None,
        accessor: Accessor::Float(|s, v| s.rasterization.depth_bias_slope_factor = v),
    },
    PropertyDescriptor {
        name: "depthBoundsTestEnable",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Bool(false),
        enum_prefix: None,
        accessor: Accessor::Bool(|s, v| s.depth_stencil.depth_bounds_test_enable = v),
    },
    PropertyDescriptor {
        name: "depthClampEnable",
        group: StateGroup::Rasterization,
        default: PropertyValue::Bool(false),
        enum_prefix: None,
        accessor: Accessor::Bool(|s, v| s.rasterization.depth_clamp_enable = v),
    },
    PropertyDescriptor {
        name: "depthCompareOp",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Int(1),
        enum_prefix: Some("VK_COMPARE_OP_"),
        accessor: Accessor::Int(|s, v| s.depth_stencil.depth_compare_op = v),
    },
    PropertyDescriptor {
        name: "depthTestEnable",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Bool(false),
        enum_prefix: None,
        accessor: Accessor::Bool(|s, v| s.depth_stencil.depth_test_enable = v),
    },
    PropertyDescriptor {
        name: "depthWriteEnable",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Bool(false),
        enum_prefix: None,
        accessor: Accessor::Bool(|s, v| s.depth_stencil.depth_write_enable = v),
    },
    PropertyDescriptor {
        name: "dstAlphaBlendFactor",
        group: StateGroup::ColorBlendAttachment,
        default: PropertyValue::Int(7),
        enum_prefix: Some("VK_BLEND_FACTOR_"),
        accessor: Accessor::AttachmentInt(|a, v| a.dst_alpha_blend_factor = v),
    },
    PropertyDescriptor {
        name: "dstColorBlendFactor",
        group: StateGroup::ColorBlendAttachment,
        default: PropertyValue::Int(7),
        enum_prefix: Some("VK_BLEND_FACTOR_"),
        accessor: Accessor::AttachmentInt(|a, v| a.dst_color_blend_factor = v),
    },
    PropertyDescriptor {
        name: "front.compareMask",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Int(-1),
        enum_prefix: None,
        accessor: Accessor::Int(|s, v| s.depth_stencil.front.compare_mask = v as u32),
    },
    PropertyDescriptor {
        name: "front.compareOp",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Int(7),
        enum_prefix: Some("VK_COMPARE_OP_"),
        accessor: Accessor::Int(|s, v| s.depth_stencil.front.compare_op = v),
    },
    PropertyDescriptor {
        name: "front.depthFailOp",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Int(0),
        enum_prefix: Some("VK_STENCIL_OP_"),
        accessor: Accessor::Int(|s, v| s.depth_stencil.front.depth_fail_op = v),
    },
    PropertyDescriptor {
        name: "front.failOp",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Int(0),
        enum_prefix: Some("VK_STENCIL_OP_"),
        accessor: Accessor::Int(|s, v| s.depth_stencil.front.fail_op = v),
    },
    PropertyDescriptor {
        name: "front.passOp",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Int(0),
        enum_prefix: Some("VK_STENCIL_OP_"),
        accessor: Accessor::Int(|s, v| s.depth_stencil.front.pass_op = v),
    },
    PropertyDescriptor {
        name: "front.reference",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Int(0),
        enum_prefix: None,
        accessor: Accessor::Int(|s, v| s.depth_stencil.front.reference = v as u32),
    },
    PropertyDescriptor {
        name: "front.writeMask",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Int(-1),
        enum_prefix: None,
        accessor: Accessor::Int(|s, v| s.depth_stencil.front.write_mask = v as u32),
    },
    PropertyDescriptor {
        name: "frontFace",
        group: StateGroup::Rasterization,
        default: PropertyValue::Int(0),
        enum_prefix: Some("VK_FRONT_FACE_"),
        accessor: Accessor::Int(|s, v| s.rasterization.front_face = v),
    },
    PropertyDescriptor {
        name: "lineWidth",
        group: StateGroup::Rasterization,
        default: PropertyValue::Float(1.0),
        enum_prefix: None,
        accessor: Accessor::Float(|s, v| s.rasterization.line_width = v),
    },
    PropertyDescriptor {
        name: "logicOp",
        group: StateGroup::ColorBlend,
        default: PropertyValue::Int(15),
        enum_prefix: Some("VK_LOGIC_OP_"),
        accessor: Accessor::Int(|s, v| s.color_blend.logic_op = v),
    },
    PropertyDescriptor {
        name: "logicOpEnable",
        group: StateGroup::ColorBlend,
        default: PropertyValue::Bool(false),
        enum_prefix: None,
        accessor: Accessor::Bool(|s, v| s.color_blend.logic_op_enable = v),
    },
    PropertyDescriptor {
        name: "maxDepthBounds",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Float(0.0),
        enum_prefix: None,
        accessor: Accessor::Float(|s, v| s.depth_stencil.max_depth_bounds = v),
    },
    PropertyDescriptor {
        name: "minDepthBounds",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Float(0.0),
        enum_prefix: None,
        accessor: Accessor::Float(|s, v| s.depth_stencil.min_depth_bounds = v),
    },
    PropertyDescriptor {
        name: "patchControlPoints",
        group: StateGroup::Tessellation,
        default: PropertyValue::Int(0),
        enum_prefix: None,
        accessor: Accessor::Int(|s, v| if let Some(t) = s.tessellation.as_mut() { t.patch_control_points = v as u32 }),
    },
    PropertyDescriptor {
        name: "polygonMode",
        group: StateGroup::Rasterization,
        default: PropertyValue::Int(0),
        enum_prefix: Some("VK_POLYGON_MODE_"),
        accessor: Accessor::Int(|s, v| s.rasterization.polygon_mode = v),
    },
    PropertyDescriptor {
        name: "primitiveRestartEnable",
        group: StateGroup::InputAssembly,
        default: PropertyValue::Bool(false),
        enum_prefix: None,
        accessor: Accessor::Bool(|s, v| s.input_assembly.primitive_restart_enable = v),
    },
    PropertyDescriptor {
        name: "rasterizerDiscardEnable",
        group: StateGroup::Rasterization,
        default: PropertyValue::Bool(false),
        enum_prefix: None,
        accessor: Accessor::Bool(|s, v| s.rasterization.rasterizer_discard_enable = v),
    },
    PropertyDescriptor {
        name: "srcAlphaBlendFactor",
        group: StateGroup::ColorBlendAttachment,
        default: PropertyValue::Int(6),
        enum_prefix: Some("VK_BLEND_FACTOR_"),
        accessor: Accessor::AttachmentInt(|a, v| a.src_alpha_blend_factor = v),
    },
    PropertyDescriptor {
        name: "srcColorBlendFactor",
        group: StateGroup::ColorBlendAttachment,
        default: PropertyValue::Int(6),
        enum_prefix: Some("VK_BLEND_FACTOR_"),
        accessor: Accessor::AttachmentInt(|a, v| a.src_color_blend_factor = v),
    },
    PropertyDescriptor {
        name: "stencilTestEnable",
        group: StateGroup::DepthStencil,
        default: PropertyValue::Bool(false),
        enum_prefix: None,
        accessor: Accessor::Bool(|s, v| s.depth_stencil.stencil_test_enable = v),
    },
    PropertyDescriptor {
        name: "topology",
        group: StateGroup::InputAssembly,
        default: PropertyValue::Int(4),
        enum_prefix: Some("VK_PRIMITIVE_TOPOLOGY_"),
        accessor: Accessor::Int(|s, v| s.input_assembly.topology = v),
    },
];

/// Finds a property by name
///
/// # Returns
/// The property's index in [`PROPERTIES`] and its descriptor
pub fn find_property(name: &str) -> Option<(usize, &'static PropertyDescriptor)> {
    PROPERTIES.binary_search_by(|property| property.name.cmp(name)).ok().map(|index| (index, &PROPERTIES[index]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted_and_unique() {
        for pair in PROPERTIES.windows(2) {
            assert!(pair[0].name < pair[1].name, "{} must sort before {}", pair[0].name, pair[1].name);
        }
    }

    #[test]
    fn test_find_property() {
        let (index, property) = find_property("lineWidth").unwrap();
        assert_eq!(PROPERTIES[index].name, "lineWidth");
        assert_eq!(property.value_type(), PropertyType::Float);
        assert_eq!(property.default, PropertyValue::Float(1.0));
        assert_eq!(find_property("front.compareOp").unwrap().1.group, StateGroup::DepthStencil);
        assert!(find_property("lineWidthX").is_none());
        assert!(find_property("").is_none());
    }

    #[test]
    fn test_value_counts_per_type() {
        let count = |value_type| PROPERTIES.iter().filter(|property| property.value_type() == value_type).count();
        assert_eq!(count(PropertyType::Bool), 10);
        assert_eq!(count(PropertyType::Int), 28);
        assert_eq!(count(PropertyType::Float), 6);
    }

    #[test]
    fn test_float_values_compare_bitwise() {
        assert_eq!(PropertyValue::Float(f32::NAN), PropertyValue::Float(f32::NAN));
        assert_ne!(PropertyValue::Float(0.0), PropertyValue::Float(-0.0));
        assert_ne!(PropertyValue::Int(1), PropertyValue::Bool(true));
    }
}
