//! Mapping of requirement names onto wgpu features
//!
//! wgpu exposes a much smaller, portable feature set than the API the scripts are
//! written against. A requirement is supported when it maps onto wgpu features the
//! adapter reports, or when wgpu guarantees it on every adapter.

use vkscript_config::Requirements;
use vkscript_config::features::{BASE_FEATURES, BaseFeatures, EXTENSIONS, FeatureChain};
use vkscript_config::requirements::DeviceCapabilities;

/// Base or extension feature names and the wgpu features that provide them
static FEATURE_MAP: [(&str, wgpu::Features); 20] = [
    ("depthClamp", wgpu::Features::DEPTH_CLIP_CONTROL),
    ("drawIndirectFirstInstance", wgpu::Features::INDIRECT_FIRST_INSTANCE),
    ("dualSrcBlend", wgpu::Features::DUAL_SOURCE_BLENDING),
    ("fillModeNonSolid", wgpu::Features::POLYGON_MODE_LINE),
    ("multiview", wgpu::Features::MULTIVIEW),
    ("pipelineStatisticsQuery", wgpu::Features::PIPELINE_STATISTICS_QUERY),
    ("shaderBufferInt64Atomics", wgpu::Features::SHADER_INT64_ATOMIC_ALL_OPS),
    ("shaderFloat16", wgpu::Features::SHADER_F16),
    ("shaderFloat64", wgpu::Features::SHADER_F64),
    ("shaderInt16", wgpu::Features::SHADER_I16),
    ("shaderInt64", wgpu::Features::SHADER_INT64),
    ("shaderSampledImageArrayDynamicIndexing", wgpu::Features::TEXTURE_BINDING_ARRAY),
    ("shaderSharedInt64Atomics", wgpu::Features::SHADER_INT64_ATOMIC_ALL_OPS),
    ("shaderStorageBufferArrayDynamicIndexing", wgpu::Features::BUFFER_BINDING_ARRAY),
    ("shaderStorageImageArrayDynamicIndexing", wgpu::Features::STORAGE_RESOURCE_BINDING_ARRAY),
    ("textureCompressionASTC_LDR", wgpu::Features::TEXTURE_COMPRESSION_ASTC),
    ("textureCompressionBC", wgpu::Features::TEXTURE_COMPRESSION_BC),
    ("textureCompressionETC2", wgpu::Features::TEXTURE_COMPRESSION_ETC2),
    ("vertexPipelineStoresAndAtomics", wgpu::Features::VERTEX_WRITABLE_STORAGE),
    ("shaderClipDistance", wgpu::Features::CLIP_DISTANCES),
];

/// Base features every wgpu adapter provides
static ALWAYS_AVAILABLE: [&str; 6] = ["fullDrawIndexUint32", "imageCubeArray", "independentBlend", "sampleRateShading", "samplerAnisotropy", "fragmentStoresAndAtomics"];

/// Extensions reported as present when the adapter has the given wgpu features
static EXTENSION_MAP: [(&str, wgpu::Features); 3] = [
    ("VK_KHR_multiview", wgpu::Features::MULTIVIEW),
    ("VK_KHR_shader_atomic_int64", wgpu::Features::SHADER_INT64_ATOMIC_ALL_OPS),
    ("VK_KHR_shader_float16_int8", wgpu::Features::SHADER_F16),
];

/// wgpu features providing a feature name, if any
pub fn wgpu_features_for(name: &str) -> Option<wgpu::Features> {
    FEATURE_MAP.iter().find(|(mapped, _)| *mapped == name).map(|(_, features)| *features)
}

/// wgpu features to enable on a device created for `requirements`
pub fn required_features(requirements: &Requirements) -> wgpu::Features {
    requirements.feature_names().filter_map(wgpu_features_for).fold(wgpu::Features::empty(), |all, features| all | features)
}

/// Capabilities of an adapter or device as seen through its wgpu feature set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSupport {
    features: wgpu::Features,
}

impl FeatureSupport {
    pub fn new(features: wgpu::Features) -> Self {
        Self { features }
    }

    pub fn from_adapter(adapter: &wgpu::Adapter) -> Self {
        Self::new(adapter.features())
    }

    fn supports(&self, name: &str) -> bool {
        if ALWAYS_AVAILABLE.contains(&name) {
            return true;
        }
        wgpu_features_for(name).is_some_and(|features| self.features.contains(features))
    }
}

impl DeviceCapabilities for FeatureSupport {
    fn base_features(&self) -> BaseFeatures {
        BaseFeatures::from_names(BASE_FEATURES.iter().copied().filter(|name| self.supports(name)))
    }

    fn extension_names(&self) -> Vec<String> {
        EXTENSION_MAP.iter().filter(|(_, features)| self.features.contains(*features)).map(|(name, _)| name.to_string()).collect()
    }

    fn chained_features(&self, request: &FeatureChain) -> Option<FeatureChain> {
        let mut chain = request.clone();
        chain.base = self.base_features();

        for record in chain.records.iter_mut() {
            let extension = &EXTENSIONS[record.extension_index()];
            for (index, name) in extension.features.iter().enumerate() {
                record.set(index, self.supports(name));
            }
        }

        Some(chain)
    }
}
