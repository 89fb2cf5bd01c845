//! Device feature tables
//!
//! Base features are the booleans of the core device-features record, in their API
//! order. Extension features live in per-extension records that are chained onto a
//! features2 query; each extension lists its booleans in record order.

use serde::Serialize;
use std::fmt;

/// Number of base device features
pub const N_BASE_FEATURES: usize = 55;

/// An extension that contributes its own feature record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extension {
    /// Extension name as reported by the device
    pub name: &'static str,
    /// Name of the feature record the extension chains onto a features2 query
    pub structure: &'static str,
    /// Feature booleans of the record, in record order
    pub features: &'static [&'static str],
}

/// Base feature names in record order
pub static BASE_FEATURES: [&str; N_BASE_FEATURES] = [
    "robustBufferAccess",
    "fullDrawIndexUint32",
    "imageCubeArray",
    "independentBlend",
    "geometryShader",
    "tessellationShader",
    "sampleRateShading",
    "dualSrcBlend",
    "logicOp",
    "multiDrawIndirect",
    "drawIndirectFirstInstance",
    "depthClamp",
    "depthBiasClamp",
    "fillModeNonSolid",
    "depthBounds",
    "wideLines",
    "largePoints",
    "alphaToOne",
    "multiViewport",
    "samplerAnisotropy",
    "textureCompressionETC2",
    "textureCompressionASTC_LDR",
    "textureCompressionBC",
    "occlusionQueryPrecise",
    "pipelineStatisticsQuery",
    "vertexPipelineStoresAndAtomics",
    "fragmentStoresAndAtomics",
    "shaderTessellationAndGeometryPointSize",
    "shaderImageGatherExtended",
    "shaderStorageImageExtendedFormats",
    "shaderStorageImageMultisample",
    "shaderStorageImageReadWithoutFormat",
    "shaderStorageImageWriteWithoutFormat",
    "shaderUniformBufferArrayDynamicIndexing",
    "shaderSampledImageArrayDynamicIndexing",
    "shaderStorageBufferArrayDynamicIndexing",
    "shaderStorageImageArrayDynamicIndexing",
    "shaderClipDistance",
    "shaderCullDistance",
    "shaderFloat64",
    "shaderInt64",
    "shaderInt16",
    "shaderResourceResidency",
    "shaderResourceMinLod",
    "sparseBinding",
    "sparseResidencyBuffer",
    "sparseResidencyImage2D",
    "sparseResidencyImage3D",
    "sparseResidency2Samples",
    "sparseResidency4Samples",
    "sparseResidency8Samples",
    "sparseResidency16Samples",
    "sparseResidencyAliased",
    "variableMultisampleRate",
    "inheritedQueries",
];

/// Extensions whose features live in their own query structure
pub static EXTENSIONS: [Extension; 27] = [
    Extension {
        name: "VK_KHR_16bit_storage",
        structure: "VkPhysicalDevice16BitStorageFeaturesKHR",
        features: &["storageBuffer16BitAccess", "uniformAndStorageBuffer16BitAccess", "storagePushConstant16", "storageInputOutput16"],
    },
    Extension {
        name: "VK_KHR_8bit_storage",
        structure: "VkPhysicalDevice8BitStorageFeaturesKHR",
        features: &["storageBuffer8BitAccess", "uniformAndStorageBuffer8BitAccess", "storagePushConstant8"],
    },
    Extension {
        name: "VK_EXT_astc_decode_mode",
        structure: "VkPhysicalDeviceASTCDecodeFeaturesEXT",
        features: &["decodeModeSharedExponent"],
    },
    Extension {
        name: "VK_EXT_blend_operation_advanced",
        structure: "VkPhysicalDeviceBlendOperationAdvancedFeaturesEXT",
        features: &["advancedBlendCoherentOperations"],
    },
    Extension {
        name: "VK_EXT_buffer_device_address",
        structure: "VkPhysicalDeviceBufferDeviceAddressFeaturesEXT",
        features: &["bufferDeviceAddress", "bufferDeviceAddressCaptureReplay", "bufferDeviceAddressMultiDevice"],
    },
    Extension {
        name: "VK_NV_compute_shader_derivatives",
        structure: "VkPhysicalDeviceComputeShaderDerivativesFeaturesNV",
        features: &["computeDerivativeGroupQuads", "computeDerivativeGroupLinear"],
    },
    Extension {
        name: "VK_EXT_conditional_rendering",
        structure: "VkPhysicalDeviceConditionalRenderingFeaturesEXT",
        features: &["conditionalRendering", "inheritedConditionalRendering"],
    },
    Extension {
        name: "VK_NV_corner_sampled_image",
        structure: "VkPhysicalDeviceCornerSampledImageFeaturesNV",
        features: &["cornerSampledImage"],
    },
    Extension {
        name: "VK_EXT_descriptor_indexing",
        structure: "VkPhysicalDeviceDescriptorIndexingFeaturesEXT",
        features: &[
            "shaderInputAttachmentArrayDynamicIndexing",
            "shaderUniformTexelBufferArrayDynamicIndexing",
            "shaderStorageTexelBufferArrayDynamicIndexing",
            "shaderUniformBufferArrayNonUniformIndexing",
            "shaderSampledImageArrayNonUniformIndexing",
            "shaderStorageBufferArrayNonUniformIndexing",
            "shaderStorageImageArrayNonUniformIndexing",
            "shaderInputAttachmentArrayNonUniformIndexing",
            "shaderUniformTexelBufferArrayNonUniformIndexing",
            "shaderStorageTexelBufferArrayNonUniformIndexing",
            "descriptorBindingUniformBufferUpdateAfterBind",
            "descriptorBindingSampledImageUpdateAfterBind",
            "descriptorBindingStorageImageUpdateAfterBind",
            "descriptorBindingStorageBufferUpdateAfterBind",
            "descriptorBindingUniformTexelBufferUpdateAfterBind",
            "descriptorBindingStorageTexelBufferUpdateAfterBind",
            "descriptorBindingUpdateUnusedWhilePending",
            "descriptorBindingPartiallyBound",
            "descriptorBindingVariableDescriptorCount",
            "runtimeDescriptorArray",
        ],
    },
    Extension {
        name: "VK_NV_scissor_exclusive",
        structure: "VkPhysicalDeviceExclusiveScissorFeaturesNV",
        features: &["exclusiveScissor"],
    },
    Extension {
        name: "VK_KHR_shader_float16_int8",
        structure: "VkPhysicalDeviceShaderFloat16Int8FeaturesKHR",
        features: &["shaderFloat16", "shaderInt8"],
    },
    Extension {
        name: "VK_EXT_fragment_density_map",
        structure: "VkPhysicalDeviceFragmentDensityMapFeaturesEXT",
        features: &["fragmentDensityMap", "fragmentDensityMapDynamic", "fragmentDensityMapNonSubsampledImages"],
    },
    Extension {
        name: "VK_NV_fragment_shader_barycentric",
        structure: "VkPhysicalDeviceFragmentShaderBarycentricFeaturesNV",
        features: &["fragmentShaderBarycentric"],
    },
    Extension {
        name: "VK_EXT_inline_uniform_block",
        structure: "VkPhysicalDeviceInlineUniformBlockFeaturesEXT",
        features: &["inlineUniformBlock", "descriptorBindingInlineUniformBlockUpdateAfterBind"],
    },
    Extension {
        name: "VK_EXT_memory_priority",
        structure: "VkPhysicalDeviceMemoryPriorityFeaturesEXT",
        features: &["memoryPriority"],
    },
    Extension {
        name: "VK_NV_mesh_shader",
        structure: "VkPhysicalDeviceMeshShaderFeaturesNV",
        features: &["taskShader", "meshShader"],
    },
    Extension {
        name: "VK_KHR_multiview",
        structure: "VkPhysicalDeviceMultiviewFeaturesKHR",
        features: &["multiview", "multiviewGeometryShader", "multiviewTessellationShader"],
    },
    Extension {
        name: "VK_NV_representative_fragment_test",
        structure: "VkPhysicalDeviceRepresentativeFragmentTestFeaturesNV",
        features: &["representativeFragmentTest"],
    },
    Extension {
        name: "VK_KHR_sampler_ycbcr_conversion",
        structure: "VkPhysicalDeviceSamplerYcbcrConversionFeaturesKHR",
        features: &["samplerYcbcrConversion"],
    },
    Extension {
        name: "VK_EXT_scalar_block_layout",
        structure: "VkPhysicalDeviceScalarBlockLayoutFeaturesEXT",
        features: &["scalarBlockLayout"],
    },
    Extension {
        name: "VK_KHR_shader_atomic_int64",
        structure: "VkPhysicalDeviceShaderAtomicInt64FeaturesKHR",
        features: &["shaderBufferInt64Atomics", "shaderSharedInt64Atomics"],
    },
    Extension {
        name: "VK_NV_shader_image_footprint",
        structure: "VkPhysicalDeviceShaderImageFootprintFeaturesNV",
        features: &["imageFootprint"],
    },
    Extension {
        name: "VK_NV_shading_rate_image",
        structure: "VkPhysicalDeviceShadingRateImageFeaturesNV",
        features: &["shadingRateImage", "shadingRateCoarseSampleOrder"],
    },
    Extension {
        name: "VK_EXT_transform_feedback",
        structure: "VkPhysicalDeviceTransformFeedbackFeaturesEXT",
        features: &["transformFeedback", "geometryStreams"],
    },
    Extension {
        name: "VK_KHR_variable_pointers",
        structure: "VkPhysicalDeviceVariablePointersFeaturesKHR",
        features: &["variablePointersStorageBuffer", "variablePointers"],
    },
    Extension {
        name: "VK_EXT_vertex_attribute_divisor",
        structure: "VkPhysicalDeviceVertexAttributeDivisorFeaturesEXT",
        features: &["vertexAttributeInstanceRateDivisor", "vertexAttributeInstanceRateZeroDivisor"],
    },
    Extension {
        name: "VK_KHR_vulkan_memory_model",
        structure: "VkPhysicalDeviceVulkanMemoryModelFeaturesKHR",
        features: &["vulkanMemoryModel", "vulkanMemoryModelDeviceScope"],
    },
];

/// Where a named feature bit lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureLocation {
    /// Index into [`BASE_FEATURES`]
    Base(usize),
    /// Index into [`EXTENSIONS`] and into that extension's feature list
    Extension { extension: usize, feature: usize },
}

/// Looks up a feature bit by name
///
/// Extension records are searched before the base features.
pub fn find_feature(name: &str) -> Option<FeatureLocation> {
    EXTENSIONS
        .iter()
        .enumerate()
        .find_map(|(extension, ext)| ext.features.iter().position(|&feature| feature == name).map(|feature| FeatureLocation::Extension { extension, feature }))
        .or_else(|| BASE_FEATURES.iter().position(|&feature| feature == name).map(FeatureLocation::Base))
}

/// Looks up an extension by name
pub fn find_extension(name: &str) -> Option<usize> {
    EXTENSIONS.iter().position(|extension| extension.name == name)
}

/// A set of base feature bits
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaseFeatures([bool; N_BASE_FEATURES]);

impl Default for BaseFeatures {
    fn default() -> Self {
        Self([false; N_BASE_FEATURES])
    }
}

impl BaseFeatures {
    /// Creates a set with no feature enabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set with every feature enabled
    pub fn all() -> Self {
        Self([true; N_BASE_FEATURES])
    }

    /// Creates a set from feature names, ignoring names that are not base features
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut features = Self::new();
        for name in names {
            if let Some(index) = BASE_FEATURES.iter().position(|&feature| feature == name) {
                features.set(index, true);
            }
        }
        features
    }

    pub fn get(&self, index: usize) -> bool {
        self.0[index]
    }

    pub fn set(&mut self, index: usize, enabled: bool) {
        self.0[index] = enabled;
    }

    /// Returns true if every feature of `required` is enabled in `self`
    pub fn contains(&self, required: &BaseFeatures) -> bool {
        self.first_missing(required).is_none()
    }

    /// Index of the first feature enabled in `required` but not in `self`
    pub fn first_missing(&self, required: &BaseFeatures) -> Option<usize> {
        (0..N_BASE_FEATURES).find(|&index| required.0[index] && !self.0[index])
    }

    /// Names of the enabled features, in record order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        BASE_FEATURES.iter().zip(self.0.iter()).filter(|(_, enabled)| **enabled).map(|(name, _)| *name)
    }

    /// Returns true if no feature is enabled
    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|&enabled| enabled)
    }
}

impl fmt::Debug for BaseFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

impl Serialize for BaseFeatures {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.names())
    }
}

/// Feature bits of one extension record
///
/// The record is tagged with its extension, and always holds exactly as many bits as
/// the extension declares.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FeatureRecord {
    extension: usize,
    bits: Box<[bool]>,
}

impl FeatureRecord {
    /// Creates a record for an extension with every bit cleared
    ///
    /// # Arguments
    /// * `extension` - Index into [`EXTENSIONS`]
    pub fn new(extension: usize) -> Self {
        Self {
            extension,
            bits: vec![false; EXTENSIONS[extension].features.len()].into_boxed_slice(),
        }
    }

    /// Index of the record's extension in [`EXTENSIONS`]
    pub fn extension_index(&self) -> usize {
        self.extension
    }

    /// The record's extension
    pub fn extension(&self) -> &'static Extension {
        &EXTENSIONS[self.extension]
    }

    pub fn get(&self, feature: usize) -> bool {
        self.bits.get(feature).copied().unwrap_or(false)
    }

    pub fn set(&mut self, feature: usize, enabled: bool) {
        self.bits[feature] = enabled;
    }

    /// Sets a bit by feature name; returns false if the extension has no such feature
    pub fn set_by_name(&mut self, name: &str, enabled: bool) -> bool {
        match self.extension().features.iter().position(|&feature| feature == name) {
            Some(feature) => {
                self.set(feature, enabled);
                true
            }
            None => false,
        }
    }

    /// Names of the enabled features, in record order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.extension().features.iter().zip(self.bits.iter()).filter(|(_, enabled)| **enabled).map(|(name, _)| *name)
    }
}

impl fmt::Debug for FeatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureRecord").field("structure", &self.extension().structure).field("enabled", &self.names().collect::<Vec<_>>()).finish()
    }
}

impl Serialize for FeatureRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut record = serializer.serialize_struct("FeatureRecord", 2)?;
        record.serialize_field("structure", self.extension().structure)?;
        record.serialize_field("enabled", &self.names().collect::<Vec<_>>())?;
        record.end()
    }
}

/// A features2 query: the base features followed by chained extension records
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeatureChain {
    pub base: BaseFeatures,
    pub records: Vec<FeatureRecord>,
}
